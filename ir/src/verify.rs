//! Structural invariant checks, used by tests after every pass.

use crate::error::{self, Result};
use crate::module::{BlockId, Module};

/// Check the use-edge mirror, parent links and terminator placement for
/// every live op in the module.
pub fn verify(module: &Module) -> Result<()> {
    for op in module.live_ops() {
        // Every operand slot must be mirrored by a use edge.
        for (index, &value) in module.operands(op).iter().enumerate() {
            let mirrored = module.uses(value).iter().any(|u| u.op == op && u.index == index);
            if !mirrored {
                return error::BrokenUseEdgeSnafu { op: op.index(), index, value: value.index() }.fail();
            }
        }
        // Every result use edge must point at a live op holding the value.
        for &result in module.results(op) {
            for u in module.uses(result) {
                if module.is_erased(u.op) || module.operands(u.op).get(u.index) != Some(&result) {
                    return error::StaleUseEdgeSnafu { op: u.op.index(), index: u.index, value: result.index() }
                        .fail();
                }
            }
        }
        // Parent link must be mutual.
        if let Some(block) = module.parent_block(op) {
            if !module.block_ops(block).contains(&op) {
                return error::BrokenParentLinkSnafu { op: op.index() }.fail();
            }
        }
    }

    for op in module.live_ops() {
        for &region in module.regions_of(op) {
            for &block in module.region_blocks(region) {
                check_block(module, block)?;
                // Block argument uses must be live too.
                for &arg in module.block_args(block) {
                    for u in module.uses(arg) {
                        if module.is_erased(u.op) || module.operands(u.op).get(u.index) != Some(&arg) {
                            return error::StaleUseEdgeSnafu { op: u.op.index(), index: u.index, value: arg.index() }
                                .fail();
                        }
                    }
                }
            }
        }
    }
    Ok(())
}

fn check_block(module: &Module, block: BlockId) -> Result<()> {
    let ops = module.block_ops(block);
    for (i, &op) in ops.iter().enumerate() {
        if module.kind(op).is_terminator() && i + 1 != ops.len() {
            return error::MisplacedTerminatorSnafu { block: block.index() }.fail();
        }
    }
    if let Some(&last) = ops.last() {
        if !module.kind(last).is_terminator() {
            return error::MissingTerminatorSnafu { block: block.index() }.fail();
        }
    }
    Ok(())
}

/// Verify and panic with the formatted error on failure. Test helper.
pub fn assert_valid(module: &Module) {
    if let Err(err) = verify(module) {
        panic!("module failed verification: {err}");
    }
}
