use parlow_ir::{assert_valid, Dim, Module, OpBuilder, OpKind, Type};

use crate::closure::inline_device_closure;
use crate::test::helpers::{launch_fixture, no_args, sig, store_thread_idx, terminate};

/// `helper() -> index { return threadIdx.x }`.
fn define_intrinsic_helper(m: &mut Module) {
    let (_helper, entry) = m.define_func("helper", sig(vec![], vec![Type::Index])).unwrap();
    let tid = m.create_op(OpKind::ThreadIdx { dim: Dim::X }, &[], &[Type::Index]);
    m.append_op(entry, tid);
    let t = m.result(tid, 0);
    let ret = m.create_op(OpKind::Return, &[t], &[]);
    m.append_op(entry, ret);
}

#[test]
fn kernel_helper_calls_are_inlined() {
    let mut fx = launch_fixture([1, 1, 1], [4, 1, 1]);
    define_intrinsic_helper(&mut fx.module);

    // Kernel body: t = helper(); affine_store t, buffer[t].
    let m = &mut fx.module;
    let call = m.create_op(OpKind::Call { callee: "helper".to_owned() }, &[], &[Type::Index]);
    m.append_op(fx.body, call);
    let t = m.result(call, 0);
    let map = parlow_ir::AffineMap::identity(1);
    let store = m.create_op(OpKind::AffineStore { map }, &[t, fx.buffer, t], &[]);
    m.append_op(fx.body, store);
    terminate(m, fx.body);

    inline_device_closure(m);
    assert_valid(m);

    let main = m.symbol("main").unwrap();
    assert!(m.matching_ops_in(main, |k| matches!(k, OpKind::Call { .. })).is_empty());
    // The intrinsic now sits lexically inside the launch, ready for the
    // structural rewrite.
    assert_eq!(m.matching_ops_in(fx.launch, |k| matches!(k, OpKind::ThreadIdx { .. })).len(), 1);
}

#[test]
fn intrinsics_already_inside_launches_are_exempt() {
    let mut fx = launch_fixture([1, 1, 1], [4, 1, 1]);
    let buffer = fx.buffer;
    store_thread_idx(&mut fx.module, fx.body, buffer);

    inline_device_closure(&mut fx.module);
    assert_valid(&fx.module);
    // Nothing to inline: no wrapper scopes appear.
    assert!(fx.module.matching_ops(|k| matches!(k, OpKind::AllocaScope)).is_empty());
    assert!(!fx.module.is_erased(fx.launch));
}

#[test]
fn host_calls_to_intrinsic_functions_are_inlined() {
    let mut m = Module::new();
    define_intrinsic_helper(&mut m);

    let sink_ty = Type::Ptr { elem: Box::new(Type::Index), space: 0 };
    let (main, entry) = m.define_func("main", sig(vec![sink_ty], vec![])).unwrap();
    let sink = m.block_args(entry)[0];
    let ret = m.create_op(OpKind::Return, &[], &[]);
    m.append_op(entry, ret);
    let mut b = OpBuilder::before(&mut m, ret);
    let call = b.call("helper", &[], &[Type::Index]);
    drop(b);
    let t = m.result(call, 0);
    let store = m.create_op(OpKind::RawStore, &[t, sink], &[]);
    m.insert_op_before(ret, store);

    inline_device_closure(&mut m);
    assert_valid(&m);
    assert!(m.matching_ops_in(main, |k| matches!(k, OpKind::Call { .. })).is_empty());
    assert_eq!(m.matching_ops_in(main, |k| matches!(k, OpKind::ThreadIdx { .. })).len(), 1);
}

#[test]
fn direct_raw_calls_to_intrinsic_functions_are_inlined() {
    let mut m = Module::new();
    define_intrinsic_helper(&mut m);

    let sink_ty = Type::Ptr { elem: Box::new(Type::Index), space: 0 };
    let (main, entry) = m.define_func("main", sig(vec![sink_ty], vec![])).unwrap();
    let sink = m.block_args(entry)[0];
    let ret = m.create_op(OpKind::Return, &[], &[]);
    m.append_op(entry, ret);
    let mut b = OpBuilder::before(&mut m, ret);
    let call = b.raw_call("helper", &[], &[Type::Index]);
    drop(b);
    let t = m.result(call, 0);
    let store = m.create_op(OpKind::RawStore, &[t, sink], &[]);
    m.insert_op_before(ret, store);

    inline_device_closure(&mut m);
    assert_valid(&m);
    assert!(m.matching_ops_in(main, |k| matches!(k, OpKind::RawCall { .. })).is_empty());
    assert_eq!(m.matching_ops_in(main, |k| matches!(k, OpKind::ThreadIdx { .. })).len(), 1);
}

#[test]
fn function_pointer_calls_resolve_to_direct_calls() {
    let mut m = Module::new();
    define_intrinsic_helper(&mut m);

    let sink_ty = Type::Ptr { elem: Box::new(Type::Index), space: 0 };
    let (main, entry) = m.define_func("main", sig(vec![sink_ty], vec![])).unwrap();
    let sink = m.block_args(entry)[0];
    let ret = m.create_op(OpKind::Return, &[], &[]);
    m.append_op(entry, ret);

    let fn_ptr_ty = Type::Ptr { elem: Box::new(Type::Int(8)), space: 0 };
    let get = m.create_op(OpKind::GetFunc { name: "helper".to_owned() }, &[], &[fn_ptr_ty]);
    m.insert_op_before(ret, get);
    let pointer = m.result(get, 0);
    let indirect = m.create_op(OpKind::RawCall { callee: None }, &[pointer], &[Type::Index]);
    m.insert_op_before(ret, indirect);
    let t = m.result(indirect, 0);
    let store = m.create_op(OpKind::RawStore, &[t, sink], &[]);
    m.insert_op_before(ret, store);

    inline_device_closure(&mut m);
    assert_valid(&m);
    // The indirect call is gone; its replacement is a direct raw call
    // to the followed function (left for later inlining stages).
    assert!(m.matching_ops_in(main, |k| matches!(k, OpKind::RawCall { callee: None })).is_empty());
    let direct = m.matching_ops_in(main, |k| matches!(k, OpKind::RawCall { callee: Some(_) }));
    assert_eq!(direct.len(), 1);
    assert_eq!(m.kind(direct[0]).callee(), Some("helper"));
    assert_eq!(m.operands(store)[0], m.result(direct[0], 0));
}

#[test]
fn intrinsic_free_modules_are_untouched() {
    let mut m = Module::new();
    let (_main, entry) = m.define_func("main", no_args()).unwrap();
    let ret = m.create_op(OpKind::Return, &[], &[]);
    m.append_op(entry, ret);
    inline_device_closure(&mut m);
    assert_valid(&m);
    assert!(m.matching_ops(|k| matches!(k, OpKind::AllocaScope)).is_empty());
}
