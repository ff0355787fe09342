//! The closed operation vocabulary.
//!
//! Every operation the lowering passes construct or match is a variant of
//! [`OpKind`]. Operand/result/region payloads live in the module arena;
//! the kind only carries static attributes (callee names, dims, maps).
//!
//! Operand conventions, where an op has a fixed layout:
//!
//! - `Call`/`RawCall` (direct): the call arguments. Indirect `RawCall`
//!   (`callee: None`): operand 0 is the function pointer, the rest are
//!   arguments.
//! - `Launch`: six launch sizes `gridX gridY gridZ blockX blockY blockZ`,
//!   then `num_async_deps` dependency tokens. The single body block takes
//!   twelve arguments: block ids, thread ids, then the six sizes.
//! - `Parallel { dims: n }`: `n` lower bounds, `n` upper bounds, `n` steps;
//!   the body block takes `n` induction variables.
//! - `Store`: value, buffer, indices. `Load`: buffer, indices.
//!   `RawStore`: value, pointer.
//! - `AffineStore`: value, buffer, map operands. `AffineLoad`: buffer, map
//!   operands. `AffineApply`: map operands.
//! - `Memcpy`: dst, src, byte length, is-volatile flag.
//!   `Memset`: dst, byte value (i8), byte length, is-volatile flag.
//! - `Barrier`: the three thread induction variables it synchronizes.

use crate::module::BlockId;
use crate::types::{AffineMap, ConstValue, Dim, Type, Vendor};

/// Function signature attached to a `Func` op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncSig {
    pub params: Vec<Type>,
    pub results: Vec<Type>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OpKind {
    /// Module-level function. An empty body region marks an external
    /// declaration.
    Func { name: String, sig: FuncSig },
    /// Direct high-level call.
    Call { callee: String },
    /// Low-level call; `None` callee means indirect through operand 0.
    RawCall { callee: Option<String> },
    /// Materialize the address of a module-level function.
    GetFunc { name: String },

    Return,
    Branch { dest: BlockId },
    /// Terminator yielding values out of a wrapping region.
    Yield,
    /// Terminator of an `AllocaScope` body.
    ScopeReturn,

    /// Stack-allocation scope; frees its allocations on exit.
    AllocaScope,
    /// Single-entry wrapper region executed in place.
    ExecuteRegion,

    /// `dims`-dimensional parallel loop nest.
    Parallel { dims: usize },
    /// GPU kernel launch, pre-lowering.
    Launch { num_async_deps: usize },
    ThreadIdx { dim: Dim },
    BlockIdx { dim: Dim },
    GridDim { dim: Dim },
    BlockDim { dim: Dim },
    /// Vendor barrier intrinsic inside a kernel body.
    DeviceBarrier { vendor: Vendor },
    /// Lowered barrier over the thread induction variables.
    Barrier,
    /// Structure marker regions around the lowered grid/block nests.
    GpuBlockScope,
    GpuThreadScope,
    /// Wrapper region carrying the six launch sizes.
    GpuWrapper,
    /// Structure marker op; the tag names what it stands in for.
    Noop { tag: Option<String> },
    /// Asynchronous execution region over dependency tokens.
    AsyncExecute,
    /// Convert a device stream value into a dependency token.
    StreamToToken,

    /// Buffer stack allocation producing a `MemRef`.
    Alloca,
    /// Raw stack allocation producing a `Ptr`; operand 0 is the size.
    RawAlloca,
    Load,
    Store,
    RawStore,
    AffineLoad { map: AffineMap },
    AffineStore { map: AffineMap },
    AffineApply { map: AffineMap },
    MemRefCast,
    AddrSpaceCast,
    /// Reinterpret a buffer as a raw pointer to its element type.
    MemRefToPtr,
    GetElementPtr,
    Memcpy,
    Memset,

    Constant { value: ConstValue },
    /// Integer truncation.
    Trunc,
    /// Zero-extension.
    ExtU,
}

impl OpKind {
    pub fn is_terminator(&self) -> bool {
        matches!(self, OpKind::Return | OpKind::Branch { .. } | OpKind::Yield | OpKind::ScopeReturn)
    }

    /// Number of regions the op owns.
    pub fn num_regions(&self) -> usize {
        match self {
            OpKind::Func { .. }
            | OpKind::AllocaScope
            | OpKind::ExecuteRegion
            | OpKind::Parallel { .. }
            | OpKind::Launch { .. }
            | OpKind::GpuBlockScope
            | OpKind::GpuThreadScope
            | OpKind::GpuWrapper
            | OpKind::AsyncExecute => 1,
            _ => 0,
        }
    }

    /// Callee of a direct call site.
    pub fn callee(&self) -> Option<&str> {
        match self {
            OpKind::Call { callee } => Some(callee),
            OpKind::RawCall { callee } => callee.as_deref(),
            _ => None,
        }
    }

    /// Ops that are removable once their results are unused. Allocations
    /// and loads count: they only matter through their value.
    pub fn is_pure(&self) -> bool {
        matches!(
            self,
            OpKind::Constant { .. }
                | OpKind::GetFunc { .. }
                | OpKind::ThreadIdx { .. }
                | OpKind::BlockIdx { .. }
                | OpKind::GridDim { .. }
                | OpKind::BlockDim { .. }
                | OpKind::AffineApply { .. }
                | OpKind::MemRefCast
                | OpKind::AddrSpaceCast
                | OpKind::MemRefToPtr
                | OpKind::GetElementPtr
                | OpKind::Trunc
                | OpKind::ExtU
                | OpKind::StreamToToken
                | OpKind::Alloca
                | OpKind::RawAlloca
                | OpKind::Load
                | OpKind::AffineLoad { .. }
        )
    }
}
