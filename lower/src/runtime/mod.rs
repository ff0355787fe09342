//! Device-runtime call retargeting policies.
//!
//! Two independent whole-module rewrites over direct call sites:
//! [`cpu::convert_cudart_to_cpu`] maps device memory/synchronization
//! calls onto generic heap and memory ops, and
//! [`hip::convert_cudart_to_hip`] renames recognized runtime entry points
//! to their HIP counterparts. Both treat the runtime's status result as a
//! success constant once the call is replaced.

pub mod cpu;
pub mod hip;
pub mod symbols;

use parlow_ir::{Module, OpId, OpKind};

/// Replace every use of the call's status result with a zero constant of
/// the result's width, then erase the call. Calls without results are
/// just erased.
pub(crate) fn replace_call_with_success(module: &mut Module, call: OpId) {
    if let Some(&status) = module.results(call).first() {
        let width = module
            .value_ty(status)
            .int_width()
            .expect("runtime call status result is an integer");
        let zero = module.create_op(
            OpKind::Constant { value: parlow_ir::ConstValue::Int { value: 0, width } },
            &[],
            &[parlow_ir::Type::Int(width)],
        );
        module.insert_op_before(call, zero);
        let success = module.result(zero, 0);
        module.replace_all_uses(status, success);
    }
    module.erase_op(call);
}

/// All direct call sites in the module, both call flavors.
pub(crate) fn direct_call_sites(module: &Module) -> Vec<OpId> {
    module.matching_ops(|k| k.callee().is_some())
}
