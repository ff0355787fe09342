//! GPU launch lowering and device-runtime retargeting.
//!
//! Three entry points over a [`parlow_ir::Module`]:
//!
//! - [`parallel_lower`] inlines everything reachable from device
//!   intrinsics, rewrites every kernel launch into nested parallel
//!   loops, and cleans up the scaffolding;
//! - [`convert_cudart_to_cpu`] retargets CUDA runtime calls to generic
//!   heap and memory operations;
//! - [`convert_cudart_to_hip`] renames CUDA runtime calls to their HIP
//!   counterparts.
//!
//! The runtime conversions are independent of launch lowering and of
//! each other; a driver picks the combination its target needs.

pub mod closure;
pub mod fold;
pub mod inline;
pub mod kernel;
pub mod runtime;

#[cfg(test)]
mod test;

use parlow_ir::{Module, OpKind};

pub use runtime::cpu::convert_cudart_to_cpu;
pub use runtime::hip::convert_cudart_to_hip;

/// What launch lowering materializes around the two parallel nests, for
/// consumers that need to recover the original grid/block structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GpuStructureMode {
    /// Bare parallel loops.
    #[default]
    None,
    /// Marker region ops wrapping the block and thread bodies.
    BlockThreadWrappers,
    /// Marker noops tagged `gpu_kernel.block` / `gpu_kernel.thread`.
    BlockThreadNoops,
    /// A single marker noop tagged `gpu_kernel.thread_only`.
    ThreadNoop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LowerOptions {
    /// Wrap each lowered launch in a `GpuWrapper` carrying the sizes.
    pub wrap_parallel: bool,
    pub structure: GpuStructureMode,
}

/// Lower every GPU launch in the module to nested parallel loops.
pub fn parallel_lower(module: &mut Module, opts: &LowerOptions) {
    closure::inline_device_closure(module);
    for launch in module.matching_ops(|k| matches!(k, OpKind::Launch { .. })) {
        if !module.is_erased(launch) {
            kernel::lower_launch(module, launch, opts);
        }
    }
    fold::canonicalize(module);
}
