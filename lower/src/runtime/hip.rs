//! CUDA-runtime-to-HIP retargeting.
//!
//! Direct calls to recognized runtime entry points are renamed by prefix
//! substitution (`cuda` becomes `hip`), cloning the callee declaration
//! under the new name on first use. `cudaThreadSynchronize` is the one
//! hard-coded exception: its HIP counterpart is `hipDeviceSynchronize`.
//! Recognized calls with no usable HIP equivalent are dropped with a
//! warning and their status result replaced by success. Device barrier
//! intrinsics are retargeted to the HIP vendor as well.

use parlow_ir::{Module, OpKind, Vendor};

use super::symbols::{INEQUIVALENT_SYMBOLS, SORTED_CUDART_SYMBOLS};
use super::{direct_call_sites, replace_call_with_success};

pub fn convert_cudart_to_hip(module: &mut Module) {
    for call in direct_call_sites(module) {
        if module.is_erased(call) {
            continue;
        }
        let callee = module.kind(call).callee().expect("site is a direct call").to_owned();
        if !is_cudart_call(&callee) {
            continue;
        }
        if INEQUIVALENT_SYMBOLS.contains(&callee.as_str()) {
            tracing::warn!(callee = %callee, "CUDA runtime call has no HIP equivalent; substituting success");
            replace_call_with_success(module, call);
            continue;
        }
        let func = module.symbol(&callee).expect("recognized runtime call has a declaration");
        let renamed = hip_name(&callee);
        if module.symbol(&renamed).is_none() {
            module.clone_func(func, &renamed).expect("symbol table has no entry for the hip name");
        }
        set_callee(module, call, &renamed);
    }

    for barrier in module.matching_ops(|k| matches!(k, OpKind::DeviceBarrier { vendor: Vendor::Cuda })) {
        let hip = module.create_op(OpKind::DeviceBarrier { vendor: Vendor::Hip }, &[], &[]);
        module.insert_op_before(barrier, hip);
        module.erase_op(barrier);
    }
}

pub(crate) fn is_cudart_call(name: &str) -> bool {
    SORTED_CUDART_SYMBOLS.binary_search_by(|probe| probe.cmp(&name)).is_ok()
}

pub(crate) fn hip_name(name: &str) -> String {
    if name == "cudaThreadSynchronize" {
        "hipDeviceSynchronize".to_owned()
    } else {
        name.replace("cuda", "hip")
    }
}

fn set_callee(module: &mut Module, call: parlow_ir::OpId, new_name: &str) {
    let kind = match module.kind(call) {
        OpKind::Call { .. } => OpKind::Call { callee: new_name.to_owned() },
        OpKind::RawCall { .. } => OpKind::RawCall { callee: Some(new_name.to_owned()) },
        other => panic!("set_callee on non-call op {other:?}"),
    };
    let operands = module.operands(call).to_vec();
    let result_tys: Vec<parlow_ir::Type> =
        module.results(call).iter().map(|&r| module.value_ty(r).clone()).collect();
    let renamed = module.create_op(kind, &operands, &result_tys);
    module.insert_op_before(call, renamed);
    for i in 0..result_tys.len() {
        let from = module.result(call, i);
        let to = module.result(renamed, i);
        module.replace_all_uses(from, to);
    }
    module.erase_op(call);
}
