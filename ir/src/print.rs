//! Compact textual rendering of a module, for debugging and test
//! diagnostics. Values print as `%N` using their arena index; the form is
//! not meant to be parsed back.

use std::fmt::Write;

use crate::module::{BlockId, Module, OpId};
use crate::op::OpKind;

pub fn print_module(module: &Module) -> String {
    let mut out = String::new();
    out.push_str("module {\n");
    for &op in module.block_ops(module.top_block()) {
        print_op(module, op, 1, &mut out);
    }
    out.push_str("}\n");
    out
}

fn print_op(module: &Module, op: OpId, depth: usize, out: &mut String) {
    let pad = "  ".repeat(depth);
    out.push_str(&pad);
    let results = module.results(op);
    if !results.is_empty() {
        let names: Vec<String> = results.iter().map(|r| format!("%{}", r.index())).collect();
        let _ = write!(out, "{} = ", names.join(", "));
    }
    out.push_str(&kind_name(module.kind(op)));
    let operands = module.operands(op);
    if !operands.is_empty() {
        let names: Vec<String> = operands.iter().map(|v| format!("%{}", v.index())).collect();
        let _ = write!(out, "({})", names.join(", "));
    }
    let regions = module.regions_of(op);
    if regions.is_empty() {
        out.push('\n');
        return;
    }
    out.push_str(" {\n");
    for &region in regions {
        for &block in module.region_blocks(region) {
            print_block(module, block, depth + 1, out);
        }
    }
    out.push_str(&pad);
    out.push_str("}\n");
}

fn print_block(module: &Module, block: BlockId, depth: usize, out: &mut String) {
    let pad = "  ".repeat(depth);
    let args = module.block_args(block);
    if args.is_empty() {
        let _ = writeln!(out, "{pad}^b{}:", block.index());
    } else {
        let names: Vec<String> = args.iter().map(|a| format!("%{}", a.index())).collect();
        let _ = writeln!(out, "{pad}^b{}({}):", block.index(), names.join(", "));
    }
    for &op in module.block_ops(block) {
        print_op(module, op, depth + 1, out);
    }
}

fn kind_name(kind: &OpKind) -> String {
    match kind {
        OpKind::Func { name, .. } => format!("func @{name}"),
        OpKind::Call { callee } => format!("call @{callee}"),
        OpKind::RawCall { callee: Some(callee) } => format!("raw_call @{callee}"),
        OpKind::RawCall { callee: None } => "raw_call indirect".to_owned(),
        OpKind::GetFunc { name } => format!("get_func @{name}"),
        OpKind::Return => "return".to_owned(),
        OpKind::Branch { dest } => format!("br ^b{}", dest.index()),
        OpKind::Yield => "yield".to_owned(),
        OpKind::ScopeReturn => "scope_return".to_owned(),
        OpKind::AllocaScope => "alloca_scope".to_owned(),
        OpKind::ExecuteRegion => "execute_region".to_owned(),
        OpKind::Parallel { dims } => format!("parallel<{dims}>"),
        OpKind::Launch { num_async_deps } => format!("launch<deps={num_async_deps}>"),
        OpKind::ThreadIdx { dim } => format!("thread_idx.{dim:?}"),
        OpKind::BlockIdx { dim } => format!("block_idx.{dim:?}"),
        OpKind::GridDim { dim } => format!("grid_dim.{dim:?}"),
        OpKind::BlockDim { dim } => format!("block_dim.{dim:?}"),
        OpKind::DeviceBarrier { vendor } => format!("device_barrier.{vendor:?}"),
        OpKind::Barrier => "barrier".to_owned(),
        OpKind::GpuBlockScope => "gpu_block_scope".to_owned(),
        OpKind::GpuThreadScope => "gpu_thread_scope".to_owned(),
        OpKind::GpuWrapper => "gpu_wrapper".to_owned(),
        OpKind::Noop { tag: Some(tag) } => format!("noop[{tag}]"),
        OpKind::Noop { tag: None } => "noop".to_owned(),
        OpKind::AsyncExecute => "async_execute".to_owned(),
        OpKind::StreamToToken => "stream_to_token".to_owned(),
        OpKind::Alloca => "alloca".to_owned(),
        OpKind::RawAlloca => "raw_alloca".to_owned(),
        OpKind::Load => "load".to_owned(),
        OpKind::Store => "store".to_owned(),
        OpKind::RawStore => "raw_store".to_owned(),
        OpKind::AffineLoad { .. } => "affine_load".to_owned(),
        OpKind::AffineStore { .. } => "affine_store".to_owned(),
        OpKind::AffineApply { .. } => "affine_apply".to_owned(),
        OpKind::MemRefCast => "memref_cast".to_owned(),
        OpKind::AddrSpaceCast => "addr_space_cast".to_owned(),
        OpKind::MemRefToPtr => "memref_to_ptr".to_owned(),
        OpKind::GetElementPtr => "gep".to_owned(),
        OpKind::Memcpy => "memcpy".to_owned(),
        OpKind::Memset => "memset".to_owned(),
        OpKind::Constant { value } => format!("const {value:?}"),
        OpKind::Trunc => "trunc".to_owned(),
        OpKind::ExtU => "extu".to_owned(),
    }
}
