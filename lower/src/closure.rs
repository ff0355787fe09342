//! Device-intrinsic inlining closure.
//!
//! Launch lowering substitutes thread/block intrinsics only inside launch
//! bodies, so every function that touches an intrinsic and is callable
//! from a kernel must be inlined away first. Starting from all intrinsic
//! ops, the work list resolves each to its enclosing function (unless the
//! op already sits lexically inside a launch), marks that function for
//! inlining, and queues its call sites as further intrinsic carriers.
//! Functions whose address escapes through `GetFunc` feed a second work
//! list: each followed value has its indirect call sites resolved back to
//! direct calls where possible, its direct call sites inlined, and is
//! re-queued as long as progress is made.

use std::collections::HashSet;

use parlow_ir::{Module, OpId, OpKind, ValueId};

use crate::inline::inline_call;

pub fn inline_device_closure(module: &mut Module) {
    let mut intrinsic_ops = module.matching_ops(is_device_intrinsic);
    let mut to_follow: Vec<ValueId> = Vec::new();
    let mut to_inline: Vec<OpId> = Vec::new();
    let mut marked: HashSet<OpId> = HashSet::new();

    while let Some(op) = intrinsic_ops.pop() {
        if module.is_erased(op) {
            continue;
        }
        let Some(func) = module.enclosing(op, |k| matches!(k, OpKind::Func { .. })) else {
            continue;
        };
        let launch = module.enclosing(op, |k| matches!(k, OpKind::Launch { .. }));
        if launch.is_some() {
            // Already lexically inside a launch; the launch rewrite
            // handles it in place.
            continue;
        }
        if !marked.insert(func) {
            continue;
        }
        to_inline.push(func);
        let name = module.func_name(func).expect("enclosing op is a func").to_owned();
        for user in module.symbol_users(&name) {
            match module.kind(user) {
                OpKind::Call { .. } | OpKind::RawCall { .. } => intrinsic_ops.push(user),
                OpKind::GetFunc { .. } => to_follow.push(module.result(user, 0)),
                _ => {}
            }
        }
    }

    for func in to_inline {
        let name = module.func_name(func).expect("marked op is a func").to_owned();
        let users = module.symbol_users(&name);
        let raw_sites: Vec<OpId> =
            users.iter().copied().filter(|&u| matches!(module.kind(u), OpKind::RawCall { .. })).collect();
        let call_sites: Vec<OpId> =
            users.iter().copied().filter(|&u| matches!(module.kind(u), OpKind::Call { .. })).collect();
        for site in raw_sites.into_iter().chain(call_sites) {
            if !module.is_erased(site) {
                inline_call(module, site);
            }
        }
    }

    while let Some(value) = to_follow.pop() {
        let mut raw_sites = Vec::new();
        let mut call_sites = Vec::new();
        let mut progressed = false;
        for use_edge in module.uses(value).to_vec() {
            let user = use_edge.op;
            match module.kind(user).clone() {
                OpKind::RawCall { callee: None } if use_edge.index == 0 => {
                    if fixup_get_func(module, user) {
                        progressed = true;
                        break;
                    }
                }
                OpKind::RawCall { callee: Some(_) } => raw_sites.push(user),
                OpKind::Call { .. } => call_sites.push(user),
                _ => {
                    // The pointer flowed through another op; chase its
                    // results.
                    to_follow.extend(module.results(user).iter().copied());
                }
            }
        }
        for site in raw_sites.into_iter().chain(call_sites) {
            if !module.is_erased(site) && inline_call(module, site) {
                progressed = true;
            }
        }
        if progressed {
            to_follow.push(value);
        }
    }
}

pub(crate) fn is_device_intrinsic(kind: &OpKind) -> bool {
    matches!(
        kind,
        OpKind::ThreadIdx { .. }
            | OpKind::BlockIdx { .. }
            | OpKind::GridDim { .. }
            | OpKind::BlockDim { .. }
            | OpKind::DeviceBarrier { .. }
    )
}

/// Turn an indirect raw call whose callee operand is a `GetFunc` result
/// into a direct raw call. Returns true when the rewrite applied.
fn fixup_get_func(module: &mut Module, site: OpId) -> bool {
    let pointer = module.operands(site)[0];
    let Some(def) = module.defining_op(pointer) else {
        return false;
    };
    let OpKind::GetFunc { name } = module.kind(def).clone() else {
        return false;
    };
    if module.symbol(&name).is_none() {
        return false;
    }
    let args: Vec<ValueId> = module.operands(site)[1..].to_vec();
    let result_tys: Vec<parlow_ir::Type> =
        module.results(site).iter().map(|&r| module.value_ty(r).clone()).collect();
    let direct = module.create_op(OpKind::RawCall { callee: Some(name) }, &args, &result_tys);
    module.insert_op_before(site, direct);
    for i in 0..result_tys.len() {
        let from = module.result(site, i);
        let to = module.result(direct, i);
        module.replace_all_uses(from, to);
    }
    module.erase_op(site);
    true
}
