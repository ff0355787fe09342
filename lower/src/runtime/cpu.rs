//! CUDA-runtime-to-CPU retargeting.
//!
//! Memory traffic calls become plain memory ops over raw pointers,
//! allocation calls become `malloc`/`free` calls against lazily declared
//! externs, and synchronization/error-query calls collapse to success
//! constants. Buffer-typed arguments are reinterpreted as raw pointers
//! first; byte counts narrower than 64 bits are zero-extended before
//! reaching `malloc`.

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use parlow_ir::{FuncSig, Module, OpBuilder, OpId, OpKind, Type, ValueId};

use super::{direct_call_sites, replace_call_with_success};
use crate::fold;

pub fn convert_cudart_to_cpu(module: &mut Module) {
    for call in direct_call_sites(module) {
        if module.is_erased(call) {
            continue;
        }
        let callee = module.kind(call).callee().expect("site is a direct call").to_owned();
        rewrite_call(module, call, &callee);
    }
    fold::canonicalize(module);
}

fn rewrite_call(module: &mut Module, call: OpId, callee: &str) {
    match callee {
        "cudaMemcpy" | "cudaMemcpyAsync" => {
            let args = module.operands(call).to_vec();
            let dst = as_pointer(module, call, args[0]);
            let src = as_pointer(module, call, args[1]);
            let not_volatile = bool_false(module, call);
            let copy = module.create_op(OpKind::Memcpy, &[dst, src, args[2], not_volatile], &[]);
            module.insert_op_before(call, copy);
            replace_call_with_success(module, call);
        }
        "cudaMemcpyToSymbol" => {
            // (symbol, src, count, offset, ..): destination is the symbol
            // address advanced by the byte offset.
            let args = module.operands(call).to_vec();
            let base = as_pointer(module, call, args[0]);
            let src = as_pointer(module, call, args[1]);
            let dst_ty = module.value_ty(base).clone();
            let gep = module.create_op(OpKind::GetElementPtr, &[base, args[3]], &[dst_ty]);
            module.insert_op_before(call, gep);
            let dst = module.result(gep, 0);
            let not_volatile = bool_false(module, call);
            let copy = module.create_op(OpKind::Memcpy, &[dst, src, args[2], not_volatile], &[]);
            module.insert_op_before(call, copy);
            replace_call_with_success(module, call);
        }
        "cudaMemset" => {
            let args = module.operands(call).to_vec();
            let dst = as_pointer(module, call, args[0]);
            let byte = module.create_op(OpKind::Trunc, &[args[1]], &[Type::Int(8)]);
            module.insert_op_before(call, byte);
            let byte = module.result(byte, 0);
            let not_volatile = bool_false(module, call);
            let set = module.create_op(OpKind::Memset, &[dst, byte, args[2], not_volatile], &[]);
            module.insert_op_before(call, set);
            replace_call_with_success(module, call);
        }
        "cudaMalloc" | "cudaMallocHost" => {
            // (out pointer, byte count).
            let args = module.operands(call).to_vec();
            let size = widen_to_i64(module, call, args[1]);
            let allocated = call_malloc(module, call, size);
            let store = module.create_op(OpKind::RawStore, &[allocated, args[0]], &[]);
            module.insert_op_before(call, store);
            replace_call_with_success(module, call);
        }
        "cudaFree" | "cudaFreeHost" => {
            let pointer = module.operands(call)[0];
            get_or_create_free(module);
            let mut b = OpBuilder::before(module, call);
            b.raw_call("free", &[pointer], &[]);
            replace_call_with_success(module, call);
        }
        "cudaDeviceSynchronize" | "cudaThreadSynchronize" | "cudaGetLastError" | "cudaPeekAtLastError" => {
            replace_call_with_success(module, call);
        }
        _ => {}
    }
}

/// Reinterpret a buffer argument as a raw pointer to its element type.
fn as_pointer(module: &mut Module, call: OpId, value: ValueId) -> ValueId {
    match module.value_ty(value).clone() {
        Type::MemRef { elem, space, .. } => {
            let ptr_ty = Type::Ptr { elem, space };
            let op = module.create_op(OpKind::MemRefToPtr, &[value], &[ptr_ty]);
            module.insert_op_before(call, op);
            module.result(op, 0)
        }
        _ => value,
    }
}

fn bool_false(module: &mut Module, call: OpId) -> ValueId {
    let mut b = OpBuilder::before(module, call);
    b.const_int(0, 1)
}

fn widen_to_i64(module: &mut Module, call: OpId, value: ValueId) -> ValueId {
    match module.value_ty(value).int_width() {
        Some(width) if width < 64 => {
            let ext = module.create_op(OpKind::ExtU, &[value], &[Type::Int(64)]);
            module.insert_op_before(call, ext);
            module.result(ext, 0)
        }
        _ => value,
    }
}

// Declaration synthesis is the one piece of shared state between
// conversions: concurrent rewrites over different modules must not
// interleave their lookup-or-declare sequences with anything else
// synthesizing the same names.
static DECL_SYNTHESIS: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

/// Emit a call to `malloc(size) -> i8*` before `call`, declaring the
/// extern on first use. Idempotent: an existing declaration is reused.
pub(crate) fn call_malloc(module: &mut Module, call: OpId, size: ValueId) -> ValueId {
    let _guard = DECL_SYNTHESIS.lock();
    if module.symbol("malloc").is_none() {
        module
            .declare_extern("malloc", FuncSig { params: vec![Type::Int(64)], results: vec![Type::i8_ptr()] })
            .expect("symbol table has no malloc entry");
    }
    let mut b = OpBuilder::before(module, call);
    let site = b.raw_call("malloc", &[size], &[Type::i8_ptr()]);
    module.result(site, 0)
}

/// Declare `free(i8*)` on first use. Idempotent.
pub(crate) fn get_or_create_free(module: &mut Module) -> OpId {
    let _guard = DECL_SYNTHESIS.lock();
    match module.symbol("free") {
        Some(func) => func,
        None => module
            .declare_extern("free", FuncSig { params: vec![Type::i8_ptr()], results: vec![] })
            .expect("symbol table has no free entry"),
    }
}
