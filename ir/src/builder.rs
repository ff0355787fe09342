//! Insertion-point op builder.
//!
//! Thin convenience layer over [`Module::create_op`]: holds a block and an
//! optional anchor op, inserts each created op before the anchor (or at
//! the block's end), and offers shorthand constructors for the common
//! ops. Scoped mutable borrow of the module; drop it to go back to raw
//! module surgery.

use crate::module::{BlockId, Module, OpId, ValueId};
use crate::op::OpKind;
use crate::types::{ConstValue, Type};

pub struct OpBuilder<'m> {
    module: &'m mut Module,
    block: BlockId,
    /// Insert before this op; `None` appends at the end of the block.
    before: Option<OpId>,
}

impl<'m> OpBuilder<'m> {
    pub fn at_end(module: &'m mut Module, block: BlockId) -> Self {
        OpBuilder { module, block, before: None }
    }

    /// Insert before `anchor`, in its block.
    pub fn before(module: &'m mut Module, anchor: OpId) -> Self {
        let block = module.parent_block(anchor).expect("anchor op is detached");
        OpBuilder { module, block, before: Some(anchor) }
    }

    /// Insert at the start of `block`. Ops created in sequence keep their
    /// creation order (each goes before the block's original first op).
    pub fn at_start(module: &'m mut Module, block: BlockId) -> Self {
        let before = module.block_ops(block).first().copied();
        OpBuilder { module, block, before }
    }

    /// Insert before the block's terminator; appends when there is none.
    pub fn at_terminator(module: &'m mut Module, block: BlockId) -> Self {
        let before = module.terminator(block);
        OpBuilder { module, block, before }
    }

    pub fn module(&mut self) -> &mut Module {
        self.module
    }

    pub fn block(&self) -> BlockId {
        self.block
    }

    pub fn set_insertion_before(&mut self, anchor: OpId) {
        self.block = self.module.parent_block(anchor).expect("anchor op is detached");
        self.before = Some(anchor);
    }

    /// Create and insert an op at the current point.
    pub fn op(&mut self, kind: OpKind, operands: &[ValueId], result_tys: &[Type]) -> OpId {
        let op = self.module.create_op(kind, operands, result_tys);
        match self.before {
            Some(anchor) => self.module.insert_op_before(anchor, op),
            None => self.module.append_op(self.block, op),
        }
        op
    }

    pub fn const_index(&mut self, value: i64) -> ValueId {
        let op = self.op(OpKind::Constant { value: ConstValue::Index(value) }, &[], &[Type::Index]);
        self.module.result(op, 0)
    }

    pub fn const_int(&mut self, value: i64, width: u32) -> ValueId {
        let op = self.op(OpKind::Constant { value: ConstValue::Int { value, width } }, &[], &[Type::Int(width)]);
        self.module.result(op, 0)
    }

    pub fn call(&mut self, callee: &str, args: &[ValueId], result_tys: &[Type]) -> OpId {
        self.op(OpKind::Call { callee: callee.to_owned() }, args, result_tys)
    }

    pub fn raw_call(&mut self, callee: &str, args: &[ValueId], result_tys: &[Type]) -> OpId {
        self.op(OpKind::RawCall { callee: Some(callee.to_owned()) }, args, result_tys)
    }
}
