//! Call inlining with scope wrapping.
//!
//! A call site is replaced by a clone of its callee body, wrapped in
//! `AllocaScope { ExecuteRegion { .. yield } scope_return }` so the
//! callee's stack allocations stay bounded by the former call. Before a
//! body is cloned it is flattened in place: every call nested inside it
//! is inlined first, so one `inline_call` leaves no transitive direct
//! calls behind. High-level `Call` and low-level direct `RawCall` sites
//! go through the same path; indirect raw calls never match.
//!
//! Flattening carries the set of functions currently being expanded;
//! hitting one again means the call graph is recursive, and that edge is
//! left alone with a warning instead of diverging.

use std::collections::{HashMap, HashSet};

use parlow_ir::{Module, OpId, OpKind, Type, ValueId};

/// Inline one call site. Returns false (leaving the module untouched)
/// when the site is not a direct call to a function with a body.
pub fn inline_call(module: &mut Module, site: OpId) -> bool {
    let mut in_progress = HashSet::new();
    inline_call_guarded(module, site, &mut in_progress)
}

fn inline_call_guarded(module: &mut Module, site: OpId, in_progress: &mut HashSet<String>) -> bool {
    let Some(callee) = module.kind(site).callee().map(str::to_owned) else {
        return false;
    };
    let Some(func) = module.symbol(&callee) else {
        return false;
    };
    let body = module.regions_of(func)[0];
    if module.region_blocks(body).is_empty() {
        // External declaration.
        return false;
    }
    if !in_progress.insert(callee.clone()) {
        tracing::warn!(callee = %callee, "recursive call graph; leaving the recursive call site alone");
        return false;
    }

    flatten_function(module, func, in_progress);

    let result_tys: Vec<Type> = module.results(site).iter().map(|&r| module.value_ty(r).clone()).collect();

    // Wrap the site: alloca_scope { execute_region { site; yield } scope_return }.
    let scope = module.create_op(OpKind::AllocaScope, &[], &result_tys);
    module.insert_op_before(site, scope);
    let scope_block = module.add_block(module.regions_of(scope)[0]);
    let exec = module.create_op(OpKind::ExecuteRegion, &[], &result_tys);
    module.append_op(scope_block, exec);
    let exec_block = module.add_block(module.regions_of(exec)[0]);
    module.remove_from_parent(site);
    module.append_op(exec_block, site);
    for i in 0..result_tys.len() {
        let from = module.result(site, i);
        let to = module.result(scope, i);
        module.replace_all_uses(from, to);
    }
    let site_results: Vec<ValueId> = module.results(site).to_vec();
    let yield_op = module.create_op(OpKind::Yield, &site_results, &[]);
    module.append_op(exec_block, yield_op);
    let exec_results: Vec<ValueId> = module.results(exec).to_vec();
    let scope_ret = module.create_op(OpKind::ScopeReturn, &exec_results, &[]);
    module.append_op(scope_block, scope_ret);

    splice_body(module, func, site, yield_op, &result_tys);

    in_progress.remove(&callee);
    true
}

/// Inline every direct call nested in `func`, `RawCall` sites first,
/// matching the order launch lowering expects.
fn flatten_function(module: &mut Module, func: OpId, in_progress: &mut HashSet<String>) {
    for site in collect_call_sites(module, func) {
        if !module.is_erased(site) {
            inline_call_guarded(module, site, in_progress);
        }
    }
}

pub(crate) fn collect_call_sites(module: &Module, root: OpId) -> Vec<OpId> {
    let mut sites = module.matching_ops_in(root, |k| matches!(k, OpKind::RawCall { callee: Some(_) }));
    sites.extend(module.matching_ops_in(root, |k| matches!(k, OpKind::Call { .. })));
    sites
}

/// Clone the (already flattened) body of `func` in place of `site`. The
/// site sits alone before `yield_op` in an execute-region block; callee
/// returns feed the yield.
fn splice_body(module: &mut Module, func: OpId, site: OpId, yield_op: OpId, result_tys: &[Type]) {
    let body = module.regions_of(func)[0];
    let operands: Vec<ValueId> = module.operands(site).to_vec();
    let exec_block = module.parent_block(site).expect("site was placed in the wrapper");
    let src_blocks: Vec<_> = module.region_blocks(body).to_vec();

    if let [entry] = src_blocks.as_slice() {
        // Single block: splice ops directly before the site, dropping the
        // return and wiring its operands into the yield.
        let mut value_map: HashMap<ValueId, ValueId> = HashMap::new();
        for (&arg, &operand) in module.block_args(*entry).to_vec().iter().zip(&operands) {
            value_map.insert(arg, operand);
        }
        for op in module.block_ops(*entry).to_vec() {
            if matches!(module.kind(op), OpKind::Return) {
                for (i, &ret) in module.operands(op).to_vec().iter().enumerate() {
                    let mapped = value_map.get(&ret).copied().unwrap_or(ret);
                    module.set_operand(yield_op, i, mapped);
                }
            } else {
                clone_op_before(module, op, site, &mut value_map);
            }
        }
    } else {
        // Multi block: split off an exit block receiving the results,
        // clone the whole body into the region, turn returns into
        // branches to the exit, and merge the cloned entry into the
        // block holding the site.
        let exec_region = module.block_parent_region(exec_block);
        let exit = module.split_block(exec_block, yield_op);
        let mut exit_args = Vec::with_capacity(result_tys.len());
        for ty in result_tys {
            exit_args.push(module.add_block_arg(exit, ty.clone()));
        }
        for (i, &arg) in exit_args.iter().enumerate() {
            module.set_operand(yield_op, i, arg);
        }
        let mut value_map = HashMap::new();
        let block_map = module.clone_region_into(body, exec_region, &mut value_map);
        for &src in &src_blocks {
            let cloned = block_map[&src];
            if let Some(ret) = module.terminator(cloned) {
                if matches!(module.kind(ret), OpKind::Return) {
                    let ret_operands: Vec<ValueId> = module.operands(ret).to_vec();
                    let branch = module.create_op(OpKind::Branch { dest: exit }, &ret_operands, &[]);
                    module.insert_op_before(ret, branch);
                    module.erase_op(ret);
                }
            }
        }
        let entry_clone = block_map[&src_blocks[0]];
        module.merge_block_before(entry_clone, site, &operands);
    }

    module.erase_op(site);
}

fn clone_op_before(
    module: &mut Module,
    op: OpId,
    anchor: OpId,
    value_map: &mut HashMap<ValueId, ValueId>,
) -> OpId {
    let kind = module.kind(op).clone();
    let operands: Vec<ValueId> =
        module.operands(op).iter().map(|v| value_map.get(v).copied().unwrap_or(*v)).collect();
    let result_tys: Vec<Type> = module.results(op).iter().map(|&r| module.value_ty(r).clone()).collect();
    let new = module.create_op(kind, &operands, &result_tys);
    module.insert_op_before(anchor, new);
    for i in 0..result_tys.len() {
        value_map.insert(module.result(op, i), module.result(new, i));
    }
    let src_regions = module.regions_of(op).to_vec();
    let dst_regions = module.regions_of(new).to_vec();
    for (src, dst) in src_regions.into_iter().zip(dst_regions) {
        module.clone_region_into(src, dst, value_map);
    }
    new
}
