//! Structural lowering of one GPU launch into nested parallel loops.
//!
//! The launch body moves, in place, into
//!
//! ```text
//! [async_execute {]              when the launch has async dependencies
//!   [gpu_wrapper(sizes) {]       when `wrap_parallel` is set
//!     parallel<3> (0..grid, step 1) (%bx %by %bz) {
//!       [block structure marker]
//!       parallel<3> (0..block, step 1) (%tx %ty %tz) {
//!         [thread structure marker]
//!         ..kernel body..
//!       }
//!     }
//! ```
//!
//! followed by the body rewrites: block/thread id intrinsics become the
//! induction variables, grid/block dim intrinsics become the launch size
//! operands, device barriers become explicit barriers over the thread
//! induction variables, shared-memory allocations hoist to the head of
//! the grid block in address space 0 behind a cast, and affine accesses
//! expand into per-dimension applies plus plain loads/stores.

use parlow_ir::{Module, OpId, OpKind, Type, ValueId, SHARED_ADDR_SPACE};

use crate::inline::{collect_call_sites, inline_call};
use crate::{GpuStructureMode, LowerOptions};

pub fn lower_launch(module: &mut Module, launch: OpId, opts: &LowerOptions) {
    for site in collect_call_sites(module, launch) {
        if !module.is_erased(site) {
            inline_call(module, site);
        }
    }

    let operands = module.operands(launch).to_vec();
    let sizes: [ValueId; 6] = operands[..6].try_into().expect("launch carries six size operands");
    let deps = &operands[6..];

    let zero_op = emit(module, launch, OpKind::Constant { value: parlow_ir::ConstValue::Index(0) }, &[], &[Type::Index]);
    let one_op = emit(module, launch, OpKind::Constant { value: parlow_ir::ConstValue::Index(1) }, &[], &[Type::Index]);
    let zero = module.result(zero_op, 0);
    let one = module.result(one_op, 0);

    // Everything below inserts before `cursor`, which tracks the
    // terminator of the innermost wrapper built so far.
    let mut cursor = launch;

    if !deps.is_empty() {
        let mut tokens = Vec::with_capacity(deps.len());
        for &dep in deps {
            let def = module.defining_op(dep).expect("async dependency is an op result");
            assert!(
                matches!(module.kind(def), OpKind::StreamToToken),
                "launch async dependency must come from a stream-to-token conversion"
            );
            let source = module.operands(def)[0];
            let conv = emit(module, cursor, OpKind::StreamToToken, &[source], &[Type::Token]);
            tokens.push(module.result(conv, 0));
        }
        let exec = emit(module, cursor, OpKind::AsyncExecute, &tokens, &[]);
        cursor = empty_body_terminator(module, exec);
    }

    if opts.wrap_parallel {
        let wrapper = emit(module, cursor, OpKind::GpuWrapper, &sizes, &[]);
        cursor = empty_body_terminator(module, wrapper);
    }

    let grid_bounds =
        [zero, zero, zero, sizes[0], sizes[1], sizes[2], one, one, one];
    let grid = emit(module, cursor, OpKind::Parallel { dims: 3 }, &grid_bounds, &[]);
    let grid_block = module.add_block(module.regions_of(grid)[0]);
    let block_ivs: Vec<ValueId> = (0..3).map(|_| module.add_block_arg(grid_block, Type::Index)).collect();
    let grid_yield = module.create_op(OpKind::Yield, &[], &[]);
    module.append_op(grid_block, grid_yield);
    cursor = grid_yield;

    match opts.structure {
        GpuStructureMode::BlockThreadWrappers => {
            let scope = emit(module, cursor, OpKind::GpuBlockScope, &block_ivs, &[]);
            cursor = empty_body_terminator(module, scope);
        }
        GpuStructureMode::BlockThreadNoops => {
            emit(module, cursor, OpKind::Noop { tag: Some("gpu_kernel.block".to_owned()) }, &block_ivs, &[]);
        }
        GpuStructureMode::None | GpuStructureMode::ThreadNoop => {}
    }

    let block_bounds =
        [zero, zero, zero, sizes[3], sizes[4], sizes[5], one, one, one];
    let threads = emit(module, cursor, OpKind::Parallel { dims: 3 }, &block_bounds, &[]);
    let thread_block = module.add_block(module.regions_of(threads)[0]);
    let thread_ivs: Vec<ValueId> = (0..3).map(|_| module.add_block_arg(thread_block, Type::Index)).collect();
    let thread_yield = module.create_op(OpKind::Yield, &[], &[]);
    module.append_op(thread_block, thread_yield);

    let merge_anchor = match opts.structure {
        GpuStructureMode::BlockThreadWrappers => {
            let scope = emit(module, thread_yield, OpKind::GpuThreadScope, &thread_ivs, &[]);
            empty_body_terminator(module, scope)
        }
        GpuStructureMode::BlockThreadNoops => {
            emit(module, thread_yield, OpKind::Noop { tag: Some("gpu_kernel.thread".to_owned()) }, &thread_ivs, &[]);
            thread_yield
        }
        GpuStructureMode::ThreadNoop => {
            emit(
                module,
                thread_yield,
                OpKind::Noop { tag: Some("gpu_kernel.thread_only".to_owned()) },
                &thread_ivs,
                &[],
            );
            thread_yield
        }
        GpuStructureMode::None => thread_yield,
    };

    // Splice the kernel body in, substituting the twelve block arguments:
    // block ids, thread ids, then the six launch sizes.
    let body_block = module.region_blocks(module.regions_of(launch)[0])[0];
    if let Some(term) = module.terminator(body_block) {
        module.erase_op(term);
    }
    let mut substitutions = Vec::with_capacity(12);
    substitutions.extend_from_slice(&block_ivs);
    substitutions.extend_from_slice(&thread_ivs);
    substitutions.extend_from_slice(&sizes);
    module.merge_block_before(body_block, merge_anchor, &substitutions);

    rewrite_body(module, grid, grid_block, &block_ivs, &thread_ivs, &sizes);

    module.erase_op(launch);
}

/// Add a single empty block with a `Yield` to the op's region and return
/// the yield, which serves as the insertion anchor for the body.
fn empty_body_terminator(module: &mut Module, op: OpId) -> OpId {
    let block = module.add_block(module.regions_of(op)[0]);
    let term = module.create_op(OpKind::Yield, &[], &[]);
    module.append_op(block, term);
    term
}

fn emit(module: &mut Module, before: OpId, kind: OpKind, operands: &[ValueId], result_tys: &[Type]) -> OpId {
    let op = module.create_op(kind, operands, result_tys);
    module.insert_op_before(before, op);
    op
}

fn rewrite_body(
    module: &mut Module,
    grid: OpId,
    grid_block: parlow_ir::BlockId,
    block_ivs: &[ValueId],
    thread_ivs: &[ValueId],
    sizes: &[ValueId; 6],
) {
    for op in module.matching_ops_in(grid, |k| matches!(k, OpKind::BlockIdx { .. })) {
        let &OpKind::BlockIdx { dim } = module.kind(op) else { unreachable!() };
        let result = module.result(op, 0);
        module.replace_all_uses(result, block_ivs[dim.index()]);
        module.erase_op(op);
    }

    // Shared-memory allocations become per-block allocations: hoisted to
    // the head of the grid block in address space 0, original type
    // recovered through a cast at the old position.
    for op in module.matching_ops_in(grid, |k| matches!(k, OpKind::Alloca | OpKind::RawAlloca)) {
        let old_ty = module.value_ty(module.result(op, 0)).clone();
        if old_ty.addr_space() != Some(SHARED_ADDR_SPACE) {
            continue;
        }
        let flat_ty = old_ty.with_addr_space(0).expect("alloca result is pointer-like");
        let kind = module.kind(op).clone();
        let operands = module.operands(op).to_vec();
        let head = module.block_ops(grid_block)[0];
        let hoisted = emit(module, head, kind, &operands, &[flat_ty]);
        let cast_kind = match module.kind(op) {
            OpKind::Alloca => OpKind::MemRefCast,
            _ => OpKind::AddrSpaceCast,
        };
        let hoisted_result = module.result(hoisted, 0);
        let cast = emit(module, op, cast_kind, &[hoisted_result], &[old_ty]);
        let from = module.result(op, 0);
        let to = module.result(cast, 0);
        module.replace_all_uses(from, to);
        module.erase_op(op);
    }

    for op in module.matching_ops_in(grid, |k| matches!(k, OpKind::ThreadIdx { .. })) {
        let &OpKind::ThreadIdx { dim } = module.kind(op) else { unreachable!() };
        let result = module.result(op, 0);
        module.replace_all_uses(result, thread_ivs[dim.index()]);
        module.erase_op(op);
    }

    for op in module.matching_ops_in(grid, |k| matches!(k, OpKind::DeviceBarrier { .. })) {
        emit(module, op, OpKind::Barrier, thread_ivs, &[]);
        module.erase_op(op);
    }

    for op in module.matching_ops_in(grid, |k| matches!(k, OpKind::GridDim { .. })) {
        let &OpKind::GridDim { dim } = module.kind(op) else { unreachable!() };
        let result = module.result(op, 0);
        module.replace_all_uses(result, sizes[dim.index()]);
        module.erase_op(op);
    }

    for op in module.matching_ops_in(grid, |k| matches!(k, OpKind::BlockDim { .. })) {
        let &OpKind::BlockDim { dim } = module.kind(op) else { unreachable!() };
        let result = module.result(op, 0);
        module.replace_all_uses(result, sizes[3 + dim.index()]);
        module.erase_op(op);
    }

    for op in module.matching_ops_in(grid, |k| matches!(k, OpKind::AffineStore { .. })) {
        expand_affine_store(module, op);
    }
    for op in module.matching_ops_in(grid, |k| matches!(k, OpKind::AffineLoad { .. })) {
        expand_affine_load(module, op);
    }
}

fn expand_affine_indices(
    module: &mut Module,
    op: OpId,
    map: &parlow_ir::AffineMap,
    map_operands: &[ValueId],
) -> Vec<ValueId> {
    (0..map.results.len())
        .map(|i| {
            let apply =
                emit(module, op, OpKind::AffineApply { map: map.single_result(i) }, map_operands, &[Type::Index]);
            module.result(apply, 0)
        })
        .collect()
}

fn expand_affine_store(module: &mut Module, op: OpId) {
    let OpKind::AffineStore { map } = module.kind(op).clone() else { unreachable!() };
    let operands = module.operands(op).to_vec();
    let (value, buffer) = (operands[0], operands[1]);
    let indices = expand_affine_indices(module, op, &map, &operands[2..]);
    let mut store_operands = vec![value, buffer];
    store_operands.extend(indices);
    emit(module, op, OpKind::Store, &store_operands, &[]);
    module.erase_op(op);
}

fn expand_affine_load(module: &mut Module, op: OpId) {
    let OpKind::AffineLoad { map } = module.kind(op).clone() else { unreachable!() };
    let operands = module.operands(op).to_vec();
    let buffer = operands[0];
    let indices = expand_affine_indices(module, op, &map, &operands[1..]);
    let mut load_operands = vec![buffer];
    load_operands.extend(indices);
    let result_ty = module.value_ty(module.result(op, 0)).clone();
    let load = emit(module, op, OpKind::Load, &load_operands, &[result_ty]);
    let from = module.result(op, 0);
    let to = module.result(load, 0);
    module.replace_all_uses(from, to);
    module.erase_op(op);
}
