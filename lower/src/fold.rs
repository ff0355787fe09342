//! Cleanup sweep run after inlining and launch lowering.
//!
//! Two rules, iterated to a fixed point:
//!
//! - identity simplification: casts whose operand already has the result
//!   type, and single-dim identity affine applies, forward their operand;
//! - dead-op elimination: side-effect-free ops with no remaining result
//!   uses are erased, including scoping wrappers whose bodies contain
//!   nothing but other removable ops and terminators.
//!
//! Ops are visited in reverse pre-order so users die before their
//! definitions within one sweep; anything uncovered by an erasure is
//! picked up by the next iteration.

use parlow_ir::{Module, OpId, OpKind};

pub fn canonicalize(module: &mut Module) {
    loop {
        let mut changed = false;

        for op in module.matching_ops(|k| {
            matches!(k, OpKind::MemRefCast | OpKind::AddrSpaceCast | OpKind::AffineApply { .. })
        }) {
            if module.is_erased(op) {
                continue;
            }
            if let Some(forward) = identity_operand(module, op) {
                let result = module.result(op, 0);
                module.replace_all_uses(result, forward);
                module.erase_op(op);
                changed = true;
            }
        }

        for op in module.matching_ops(|_| true).into_iter().rev() {
            if module.is_erased(op) {
                continue;
            }
            if is_trivially_dead(module, op) {
                module.erase_op(op);
                changed = true;
            }
        }

        if !changed {
            break;
        }
    }
}

/// Operand the op forwards unchanged, when it simplifies to nothing.
fn identity_operand(module: &Module, op: OpId) -> Option<parlow_ir::ValueId> {
    match module.kind(op) {
        OpKind::MemRefCast | OpKind::AddrSpaceCast => {
            let src = module.operands(op)[0];
            (module.value_ty(src) == module.value_ty(module.result(op, 0))).then_some(src)
        }
        OpKind::AffineApply { map } if map.is_single_dim_identity() => Some(module.operands(op)[0]),
        _ => None,
    }
}

fn is_trivially_dead(module: &Module, op: OpId) -> bool {
    if module.results(op).iter().any(|&r| !module.uses(r).is_empty()) {
        return false;
    }
    match module.kind(op) {
        k if k.is_pure() => true,
        OpKind::AllocaScope | OpKind::ExecuteRegion => region_contents_removable(module, op),
        _ => false,
    }
}

/// Whether everything inside the op's regions could be erased with it.
fn region_contents_removable(module: &Module, op: OpId) -> bool {
    module
        .matching_ops_in(op, |_| true)
        .into_iter()
        .all(|inner| {
            let kind = module.kind(inner);
            kind.is_pure()
                || kind.is_terminator()
                || matches!(kind, OpKind::AllocaScope | OpKind::ExecuteRegion)
        })
}
