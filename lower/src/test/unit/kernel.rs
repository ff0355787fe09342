use parlow_ir::{assert_valid, AffineExpr, AffineMap, ConstValue, Dim, Module, OpId, OpKind, Type, ValueId};
use test_case::test_case;

use crate::test::helpers::{index_grid, launch_fixture, shared_index_buffer, store_thread_idx, terminate};
use crate::{parallel_lower, GpuStructureMode, LowerOptions};

fn lowered(mut fx: crate::test::helpers::LaunchFixture, opts: &LowerOptions) -> crate::test::helpers::LaunchFixture {
    parallel_lower(&mut fx.module, opts);
    assert_valid(&fx.module);
    fx
}

/// Outer and inner parallel nests, in that order.
fn parallel_nests(m: &Module) -> (OpId, OpId) {
    let nests = m.matching_ops(|k| matches!(k, OpKind::Parallel { .. }));
    assert_eq!(nests.len(), 2, "expected a grid nest and a block nest");
    (nests[0], nests[1])
}

fn induction_vars(m: &Module, nest: OpId) -> Vec<ValueId> {
    m.block_args(m.region_blocks(m.regions_of(nest)[0])[0]).to_vec()
}

fn is_index_const(m: &Module, value: ValueId, expected: i64) -> bool {
    m.defining_op(value)
        .map(|op| matches!(m.kind(op), OpKind::Constant { value: ConstValue::Index(v) } if *v == expected))
        .unwrap_or(false)
}

#[test]
fn launch_becomes_two_parallel_nests() {
    let mut fx = launch_fixture([2, 1, 1], [4, 1, 1]);
    let buffer = fx.buffer;
    store_thread_idx(&mut fx.module, fx.body, buffer);
    let sizes = fx.sizes.clone();
    let fx = lowered(fx, &LowerOptions::default());
    let m = &fx.module;

    assert!(m.matching_ops(|k| matches!(k, OpKind::Launch { .. })).is_empty());
    let (grid, block) = parallel_nests(m);
    // Grid nest: 0..gridSize step 1 on each axis, and the block nest
    // nested right inside it.
    let grid_ops = m.operands(grid);
    assert_eq!(&grid_ops[3..6], &sizes[..3]);
    for &lb in &grid_ops[..3] {
        assert!(is_index_const(m, lb, 0));
    }
    for &step in &grid_ops[6..9] {
        assert!(is_index_const(m, step, 1));
    }
    let block_ops = m.operands(block);
    assert_eq!(&block_ops[3..6], &sizes[3..]);
    assert_eq!(
        m.enclosing(block, |k| matches!(k, OpKind::Parallel { .. })),
        Some(grid),
        "block nest must be nested in the grid nest"
    );
}

#[test]
fn thread_store_resolves_to_inner_induction_variable() {
    let mut fx = launch_fixture([2, 1, 1], [4, 1, 1]);
    let buffer = fx.buffer;
    store_thread_idx(&mut fx.module, fx.body, buffer);
    let fx = lowered(fx, &LowerOptions::default());
    let m = &fx.module;

    assert!(m.matching_ops(|k| matches!(k, OpKind::ThreadIdx { .. })).is_empty());
    assert!(m.matching_ops(|k| matches!(k, OpKind::AffineStore { .. })).is_empty());
    let (_, block) = parallel_nests(m);
    let tx = induction_vars(m, block)[0];
    let stores = m.matching_ops(|k| matches!(k, OpKind::Store));
    assert_eq!(stores.len(), 1);
    // store tx, buffer[tx]: the identity affine map folded away.
    assert_eq!(m.operands(stores[0]), &[tx, fx.buffer, tx]);
}

#[test]
fn device_barrier_lowers_over_thread_induction_variables() {
    let mut fx = launch_fixture([1, 1, 1], [8, 1, 1]);
    let m = &mut fx.module;
    let bar = m.create_op(OpKind::DeviceBarrier { vendor: parlow_ir::Vendor::Cuda }, &[], &[]);
    m.append_op(fx.body, bar);
    terminate(m, fx.body);
    let fx = lowered(fx, &LowerOptions::default());
    let m = &fx.module;

    assert!(m.matching_ops(|k| matches!(k, OpKind::DeviceBarrier { .. })).is_empty());
    let (_, block) = parallel_nests(m);
    let barrier = m.matching_ops(|k| matches!(k, OpKind::Barrier));
    assert_eq!(barrier.len(), 1);
    assert_eq!(m.operands(barrier[0]), induction_vars(m, block).as_slice());
}

#[test_case(Dim::X, 0; "x")]
#[test_case(Dim::Y, 1; "y")]
#[test_case(Dim::Z, 2; "z")]
fn grid_dim_reads_become_size_operands(dim: Dim, size_index: usize) {
    let mut fx = launch_fixture([2, 3, 4], [5, 6, 7]);
    let m = &mut fx.module;
    let gd = m.create_op(OpKind::GridDim { dim }, &[], &[Type::Index]);
    m.append_op(fx.body, gd);
    let g = m.result(gd, 0);
    let map = parlow_ir::AffineMap::identity(1);
    let tid = m.create_op(OpKind::ThreadIdx { dim: Dim::X }, &[], &[Type::Index]);
    m.append_op(fx.body, tid);
    let t = m.result(tid, 0);
    let buffer = fx.buffer;
    let store = m.create_op(OpKind::AffineStore { map }, &[g, buffer, t], &[]);
    m.append_op(fx.body, store);
    terminate(m, fx.body);
    let sizes = fx.sizes.clone();
    let fx = lowered(fx, &LowerOptions::default());
    let m = &fx.module;

    let stores = m.matching_ops(|k| matches!(k, OpKind::Store));
    assert_eq!(m.operands(stores[0])[0], sizes[size_index]);
}

#[test_case(Dim::X, 3; "x")]
#[test_case(Dim::Y, 4; "y")]
#[test_case(Dim::Z, 5; "z")]
fn block_dim_reads_become_size_operands(dim: Dim, size_index: usize) {
    let mut fx = launch_fixture([2, 3, 4], [5, 6, 7]);
    let m = &mut fx.module;
    let bd = m.create_op(OpKind::BlockDim { dim }, &[], &[Type::Index]);
    m.append_op(fx.body, bd);
    let v = m.result(bd, 0);
    let tid = m.create_op(OpKind::ThreadIdx { dim: Dim::X }, &[], &[Type::Index]);
    m.append_op(fx.body, tid);
    let t = m.result(tid, 0);
    let buffer = fx.buffer;
    let map = parlow_ir::AffineMap::identity(1);
    let store = m.create_op(OpKind::AffineStore { map }, &[v, buffer, t], &[]);
    m.append_op(fx.body, store);
    terminate(m, fx.body);
    let sizes = fx.sizes.clone();
    let fx = lowered(fx, &LowerOptions::default());
    let m = &fx.module;

    let stores = m.matching_ops(|k| matches!(k, OpKind::Store));
    assert_eq!(m.operands(stores[0])[0], sizes[size_index]);
}

#[test]
fn block_idx_reads_become_outer_induction_variables() {
    let mut fx = launch_fixture([4, 1, 1], [2, 1, 1]);
    let m = &mut fx.module;
    let bi = m.create_op(OpKind::BlockIdx { dim: Dim::X }, &[], &[Type::Index]);
    m.append_op(fx.body, bi);
    let v = m.result(bi, 0);
    let buffer = fx.buffer;
    let map = parlow_ir::AffineMap::identity(1);
    let store = m.create_op(OpKind::AffineStore { map }, &[v, buffer, v], &[]);
    m.append_op(fx.body, store);
    terminate(m, fx.body);
    let fx = lowered(fx, &LowerOptions::default());
    let m = &fx.module;

    assert!(m.matching_ops(|k| matches!(k, OpKind::BlockIdx { .. })).is_empty());
    let (grid, _) = parallel_nests(m);
    let bx = induction_vars(m, grid)[0];
    let stores = m.matching_ops(|k| matches!(k, OpKind::Store));
    assert_eq!(m.operands(stores[0]), &[bx, fx.buffer, bx]);
}

#[test]
fn shared_alloca_hoists_to_grid_block_in_space_zero() {
    let mut fx = launch_fixture([2, 1, 1], [4, 1, 1]);
    let m = &mut fx.module;
    let shared = m.create_op(OpKind::Alloca, &[], &[shared_index_buffer(4)]);
    m.append_op(fx.body, shared);
    let s = m.result(shared, 0);
    let tid = m.create_op(OpKind::ThreadIdx { dim: Dim::X }, &[], &[Type::Index]);
    m.append_op(fx.body, tid);
    let t = m.result(tid, 0);
    let store = m.create_op(OpKind::Store, &[t, s, t], &[]);
    m.append_op(fx.body, store);
    terminate(m, fx.body);
    let fx = lowered(fx, &LowerOptions::default());
    let m = &fx.module;

    let (grid, _) = parallel_nests(m);
    let grid_block = m.region_blocks(m.regions_of(grid)[0])[0];
    // One alloca was hoisted to the head of the grid block, in space 0;
    // the kernel body reaches it only through the recovering cast.
    let allocas: Vec<OpId> = m
        .matching_ops_in(grid, |k| matches!(k, OpKind::Alloca))
        .into_iter()
        .collect();
    assert_eq!(allocas.len(), 1);
    assert_eq!(m.parent_block(allocas[0]), Some(grid_block));
    assert_eq!(m.block_ops(grid_block)[0], allocas[0]);
    let hoisted = m.result(allocas[0], 0);
    assert_eq!(m.value_ty(hoisted).addr_space(), Some(0));
    let cast = only_use(m, hoisted);
    assert!(matches!(m.kind(cast), OpKind::MemRefCast));
    assert_eq!(m.value_ty(m.result(cast, 0)).addr_space(), Some(parlow_ir::SHARED_ADDR_SPACE));
    let store = only_use(m, m.result(cast, 0));
    assert!(matches!(m.kind(store), OpKind::Store));
}

#[test]
fn multi_result_affine_accesses_expand_per_dimension() {
    let mut fx = launch_fixture([1, 1, 1], [4, 4, 1]);
    let m = &mut fx.module;
    let grid_alloca = m.create_op(OpKind::Alloca, &[], &[index_grid(4, 8)]);
    m.insert_op_before(fx.launch, grid_alloca);
    let grid_buf = m.result(grid_alloca, 0);

    // (d0, d1) -> (d1, d0 + 1): neither result folds away as an identity.
    let swapped = AffineMap {
        num_dims: 2,
        num_syms: 0,
        results: vec![
            AffineExpr::Dim(1),
            AffineExpr::Add(Box::new(AffineExpr::Dim(0)), Box::new(AffineExpr::Const(1))),
        ],
    };
    let tx_op = m.create_op(OpKind::ThreadIdx { dim: Dim::X }, &[], &[Type::Index]);
    m.append_op(fx.body, tx_op);
    let tx = m.result(tx_op, 0);
    let ty_op = m.create_op(OpKind::ThreadIdx { dim: Dim::Y }, &[], &[Type::Index]);
    m.append_op(fx.body, ty_op);
    let ty = m.result(ty_op, 0);
    let store = m.create_op(OpKind::AffineStore { map: swapped.clone() }, &[tx, grid_buf, tx, ty], &[]);
    m.append_op(fx.body, store);
    let load = m.create_op(OpKind::AffineLoad { map: swapped }, &[grid_buf, tx, ty], &[Type::Index]);
    m.append_op(fx.body, load);
    let loaded = m.result(load, 0);
    let keep = m.create_op(OpKind::Store, &[loaded, grid_buf, tx, ty], &[]);
    m.append_op(fx.body, keep);
    terminate(m, fx.body);

    let fx = lowered(fx, &LowerOptions::default());
    let m = &fx.module;

    assert!(m
        .matching_ops(|k| matches!(k, OpKind::AffineStore { .. } | OpKind::AffineLoad { .. }))
        .is_empty());
    let (_, block) = parallel_nests(m);
    let ivs = induction_vars(m, block);
    let (tx, ty) = (ivs[0], ivs[1]);

    // One apply per map result, each a single-expression slice keeping
    // the full two-dim signature and fed by both induction variables.
    let applies = m.matching_ops(|k| matches!(k, OpKind::AffineApply { .. }));
    assert_eq!(applies.len(), 4, "two per expanded access");
    for &apply in &applies {
        let OpKind::AffineApply { map } = m.kind(apply) else { unreachable!() };
        assert_eq!(map.num_dims, 2);
        assert_eq!(map.results.len(), 1);
        assert_eq!(m.operands(apply), &[tx, ty]);
    }

    let stores = m.matching_ops(|k| matches!(k, OpKind::Store));
    assert_eq!(stores.len(), 2);
    let expanded = stores.iter().copied().find(|&s| m.operands(s)[0] == tx).unwrap();
    let indices = &m.operands(expanded)[2..];
    assert_eq!(indices.len(), 2);
    let OpKind::AffineApply { map } = m.kind(m.defining_op(indices[0]).unwrap()) else {
        panic!("first index must come from an apply")
    };
    assert_eq!(map.results, vec![AffineExpr::Dim(1)]);
    let OpKind::AffineApply { map } = m.kind(m.defining_op(indices[1]).unwrap()) else {
        panic!("second index must come from an apply")
    };
    assert_eq!(
        map.results,
        vec![AffineExpr::Add(Box::new(AffineExpr::Dim(0)), Box::new(AffineExpr::Const(1)))]
    );

    let loads = m.matching_ops(|k| matches!(k, OpKind::Load));
    assert_eq!(loads.len(), 1);
    assert_eq!(m.operands(loads[0]).len(), 3, "buffer plus one index per map result");
    assert_eq!(m.operands(loads[0])[0], grid_buf);
    let plain = stores.iter().copied().find(|&s| m.operands(s)[0] == m.result(loads[0], 0)).unwrap();
    assert_eq!(m.operands(plain)[1], grid_buf);
}

#[test]
fn shared_raw_alloca_recovers_through_an_addr_space_cast() {
    let mut fx = launch_fixture([2, 1, 1], [4, 1, 1]);
    let m = &mut fx.module;
    let size = m.create_op(OpKind::Constant { value: ConstValue::Index(64) }, &[], &[Type::Index]);
    m.insert_op_before(fx.launch, size);
    let shared_ptr = Type::Ptr { elem: Box::new(Type::Index), space: parlow_ir::SHARED_ADDR_SPACE };
    let raw = m.create_op(OpKind::RawAlloca, &[m.result(size, 0)], &[shared_ptr]);
    m.append_op(fx.body, raw);
    let p = m.result(raw, 0);
    let tid = m.create_op(OpKind::ThreadIdx { dim: Dim::X }, &[], &[Type::Index]);
    m.append_op(fx.body, tid);
    let t = m.result(tid, 0);
    let store = m.create_op(OpKind::RawStore, &[t, p], &[]);
    m.append_op(fx.body, store);
    terminate(m, fx.body);
    let fx = lowered(fx, &LowerOptions::default());
    let m = &fx.module;

    let (grid, _) = parallel_nests(m);
    let grid_block = m.region_blocks(m.regions_of(grid)[0])[0];
    let allocas = m.matching_ops_in(grid, |k| matches!(k, OpKind::RawAlloca));
    assert_eq!(allocas.len(), 1);
    assert_eq!(m.parent_block(allocas[0]), Some(grid_block));
    assert_eq!(m.block_ops(grid_block)[0], allocas[0]);
    let hoisted = m.result(allocas[0], 0);
    assert_eq!(m.value_ty(hoisted).addr_space(), Some(0));
    let cast = only_use(m, hoisted);
    assert!(matches!(m.kind(cast), OpKind::AddrSpaceCast));
    assert_eq!(m.value_ty(m.result(cast, 0)).addr_space(), Some(parlow_ir::SHARED_ADDR_SPACE));
    let store = only_use(m, m.result(cast, 0));
    assert!(matches!(m.kind(store), OpKind::RawStore));
}

fn only_use(m: &Module, value: ValueId) -> OpId {
    let uses = m.uses(value);
    assert_eq!(uses.len(), 1, "expected a single use");
    uses[0].op
}

#[test]
fn async_dependencies_wrap_the_nests() {
    let mut m = Module::new();
    let (_main, entry) = m
        .define_func("main", crate::test::helpers::sig(vec![Type::DeviceToken], vec![]))
        .unwrap();
    let stream = m.block_args(entry)[0];
    let ret = m.create_op(OpKind::Return, &[], &[]);
    m.append_op(entry, ret);

    let mut b = parlow_ir::OpBuilder::before(&mut m, ret);
    let conv = b.op(OpKind::StreamToToken, &[stream], &[Type::DeviceToken]);
    drop(b);
    let dep = m.result(conv, 0);
    let mut b = parlow_ir::OpBuilder::before(&mut m, ret);
    let mut operands = Vec::new();
    for v in [1i64, 1, 1, 4, 1, 1] {
        operands.push(b.const_index(v));
    }
    operands.push(dep);
    let launch = b.op(OpKind::Launch { num_async_deps: 1 }, &operands, &[]);
    drop(b);
    let body = m.add_block(m.regions_of(launch)[0]);
    for _ in 0..12 {
        m.add_block_arg(body, Type::Index);
    }
    let tid = m.create_op(OpKind::ThreadIdx { dim: Dim::X }, &[], &[Type::Index]);
    m.append_op(body, tid);
    let t = m.result(tid, 0);
    let alloca = m.create_op(OpKind::Alloca, &[], &[crate::test::helpers::index_buffer(4)]);
    m.insert_op_before(launch, alloca);
    let buffer = m.result(alloca, 0);
    let store = m.create_op(OpKind::Store, &[t, buffer, t], &[]);
    m.append_op(body, store);
    terminate(&mut m, body);

    parallel_lower(&mut m, &LowerOptions::default());
    assert_valid(&m);

    let exec = m.matching_ops(|k| matches!(k, OpKind::AsyncExecute));
    assert_eq!(exec.len(), 1);
    // Dependencies were reconverted to plain tokens feeding the wrapper.
    for &tok in m.operands(exec[0]) {
        assert_eq!(m.value_ty(tok), &Type::Token);
    }
    let (grid, _) = parallel_nests(&m);
    assert_eq!(
        m.enclosing(grid, |k| matches!(k, OpKind::AsyncExecute)),
        Some(exec[0]),
        "nests must sit inside the async region"
    );
}

#[test_case(GpuStructureMode::None; "none")]
#[test_case(GpuStructureMode::BlockThreadWrappers; "wrappers")]
#[test_case(GpuStructureMode::BlockThreadNoops; "noops")]
#[test_case(GpuStructureMode::ThreadNoop; "thread_only")]
fn structure_modes_emit_their_markers(structure: GpuStructureMode) {
    let mut fx = launch_fixture([2, 1, 1], [4, 1, 1]);
    let buffer = fx.buffer;
    store_thread_idx(&mut fx.module, fx.body, buffer);
    let opts = LowerOptions { wrap_parallel: false, structure };
    let fx = lowered(fx, &opts);
    let m = &fx.module;

    let noop_tags: Vec<String> = m
        .matching_ops(|k| matches!(k, OpKind::Noop { .. }))
        .into_iter()
        .map(|op| match m.kind(op) {
            OpKind::Noop { tag: Some(tag) } => tag.clone(),
            _ => String::new(),
        })
        .collect();
    let block_scopes = m.matching_ops(|k| matches!(k, OpKind::GpuBlockScope)).len();
    let thread_scopes = m.matching_ops(|k| matches!(k, OpKind::GpuThreadScope)).len();

    match structure {
        GpuStructureMode::None => {
            assert!(noop_tags.is_empty());
            assert_eq!((block_scopes, thread_scopes), (0, 0));
        }
        GpuStructureMode::BlockThreadWrappers => {
            assert!(noop_tags.is_empty());
            assert_eq!((block_scopes, thread_scopes), (1, 1));
        }
        GpuStructureMode::BlockThreadNoops => {
            assert_eq!(noop_tags, vec!["gpu_kernel.block".to_owned(), "gpu_kernel.thread".to_owned()]);
        }
        GpuStructureMode::ThreadNoop => {
            assert_eq!(noop_tags, vec!["gpu_kernel.thread_only".to_owned()]);
        }
    }
}

#[test]
fn gpu_wrapper_carries_the_sizes() {
    let mut fx = launch_fixture([2, 1, 1], [4, 1, 1]);
    let buffer = fx.buffer;
    store_thread_idx(&mut fx.module, fx.body, buffer);
    let sizes = fx.sizes.clone();
    let opts = LowerOptions { wrap_parallel: true, structure: GpuStructureMode::None };
    let fx = lowered(fx, &opts);
    let m = &fx.module;

    let wrappers = m.matching_ops(|k| matches!(k, OpKind::GpuWrapper));
    assert_eq!(wrappers.len(), 1);
    assert_eq!(m.operands(wrappers[0]), sizes.as_slice());
    let (grid, _) = parallel_nests(m);
    assert_eq!(m.enclosing(grid, |k| matches!(k, OpKind::GpuWrapper)), Some(wrappers[0]));
}
