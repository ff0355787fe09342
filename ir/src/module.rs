//! Arena-backed module: op/value/block/region tables plus the mutation API.
//!
//! All structural state lives in `Vec` tables addressed by typed index
//! handles. Ops and blocks are tombstoned on erasure so stale handles can
//! be detected. Every def-use edge is mirrored in an explicit per-value
//! use list; the list is maintained exclusively by the methods here, so a
//! pass can enumerate the users of a value without rescanning the module.
//!
//! Traversal discipline: walks borrow the module immutably and return
//! handle snapshots; passes collect first, then mutate, checking
//! [`Module::is_erased`] before touching an op another rewrite may have
//! removed.

use std::collections::HashMap;

use smallvec::SmallVec;

use crate::error::{self, Result};
use crate::op::{FuncSig, OpKind};
use crate::types::Type;

macro_rules! handle {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub(crate) u32);

        impl $name {
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

handle!(
    /// Handle of an operation in the module arena.
    OpId
);
handle!(
    /// Handle of an SSA value (op result or block argument).
    ValueId
);
handle!(
    /// Handle of a block.
    BlockId
);
handle!(
    /// Handle of a region.
    RegionId
);

/// One use of a value: which op, at which operand slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Use {
    pub op: OpId,
    pub index: usize,
}

/// Where a value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueDef {
    Result { op: OpId, index: usize },
    BlockArg { block: BlockId, index: usize },
}

#[derive(Debug)]
pub struct OpData {
    pub kind: OpKind,
    operands: SmallVec<[ValueId; 4]>,
    results: SmallVec<[ValueId; 2]>,
    regions: SmallVec<[RegionId; 1]>,
    parent: Option<BlockId>,
}

#[derive(Debug)]
struct ValueData {
    ty: Type,
    def: ValueDef,
    uses: Vec<Use>,
}

#[derive(Debug)]
struct BlockData {
    parent: RegionId,
    args: SmallVec<[ValueId; 4]>,
    ops: Vec<OpId>,
}

#[derive(Debug)]
struct RegionData {
    parent: Option<OpId>,
    blocks: SmallVec<[BlockId; 1]>,
}

/// A compilation unit: one top-level block of `Func` ops plus the arenas
/// behind every nested structure.
pub struct Module {
    ops: Vec<Option<OpData>>,
    values: Vec<ValueData>,
    blocks: Vec<Option<BlockData>>,
    regions: Vec<RegionData>,
    top: BlockId,
    symbols: HashMap<String, OpId>,
}

impl Default for Module {
    fn default() -> Self {
        Self::new()
    }
}

impl Module {
    pub fn new() -> Self {
        let root_region = RegionId(0);
        let top = BlockId(0);
        Module {
            ops: Vec::new(),
            values: Vec::new(),
            blocks: vec![Some(BlockData { parent: root_region, args: SmallVec::new(), ops: Vec::new() })],
            regions: vec![RegionData { parent: None, blocks: SmallVec::from_slice(&[top]) }],
            top,
            symbols: HashMap::new(),
        }
    }

    // ------------------------------------------------------------------
    // Read access
    // ------------------------------------------------------------------

    pub fn top_block(&self) -> BlockId {
        self.top
    }

    fn op_data(&self, op: OpId) -> &OpData {
        self.ops[op.index()].as_ref().expect("access to erased op")
    }

    fn op_data_mut(&mut self, op: OpId) -> &mut OpData {
        self.ops[op.index()].as_mut().expect("access to erased op")
    }

    fn block_data(&self, block: BlockId) -> &BlockData {
        self.blocks[block.index()].as_ref().expect("access to erased block")
    }

    fn block_data_mut(&mut self, block: BlockId) -> &mut BlockData {
        self.blocks[block.index()].as_mut().expect("access to erased block")
    }

    pub fn is_erased(&self, op: OpId) -> bool {
        self.ops[op.index()].is_none()
    }

    pub fn kind(&self, op: OpId) -> &OpKind {
        &self.op_data(op).kind
    }

    pub fn operands(&self, op: OpId) -> &[ValueId] {
        &self.op_data(op).operands
    }

    pub fn results(&self, op: OpId) -> &[ValueId] {
        &self.op_data(op).results
    }

    pub fn result(&self, op: OpId, index: usize) -> ValueId {
        self.op_data(op).results[index]
    }

    pub fn regions_of(&self, op: OpId) -> &[RegionId] {
        &self.op_data(op).regions
    }

    pub fn parent_block(&self, op: OpId) -> Option<BlockId> {
        self.op_data(op).parent
    }

    /// The op owning the region that owns `op`'s block.
    pub fn parent_op(&self, op: OpId) -> Option<OpId> {
        let block = self.op_data(op).parent?;
        self.regions[self.block_data(block).parent.index()].parent
    }

    /// Nearest ancestor op (excluding `op` itself) whose kind matches.
    pub fn enclosing(&self, op: OpId, pred: impl Fn(&OpKind) -> bool) -> Option<OpId> {
        let mut cur = self.parent_op(op);
        while let Some(p) = cur {
            if pred(self.kind(p)) {
                return Some(p);
            }
            cur = self.parent_op(p);
        }
        None
    }

    pub fn value_ty(&self, value: ValueId) -> &Type {
        &self.values[value.index()].ty
    }

    pub fn value_def(&self, value: ValueId) -> ValueDef {
        self.values[value.index()].def
    }

    /// The op defining `value`, when it is an op result.
    pub fn defining_op(&self, value: ValueId) -> Option<OpId> {
        match self.values[value.index()].def {
            ValueDef::Result { op, .. } => Some(op),
            ValueDef::BlockArg { .. } => None,
        }
    }

    pub fn uses(&self, value: ValueId) -> &[Use] {
        &self.values[value.index()].uses
    }

    pub fn block_args(&self, block: BlockId) -> &[ValueId] {
        &self.block_data(block).args
    }

    pub fn block_ops(&self, block: BlockId) -> &[OpId] {
        &self.block_data(block).ops
    }

    pub fn block_parent_region(&self, block: BlockId) -> RegionId {
        self.block_data(block).parent
    }

    pub fn region_blocks(&self, region: RegionId) -> &[BlockId] {
        &self.regions[region.index()].blocks
    }

    pub fn region_parent_op(&self, region: RegionId) -> Option<OpId> {
        self.regions[region.index()].parent
    }

    /// Final op of a block, when it is a terminator.
    pub fn terminator(&self, block: BlockId) -> Option<OpId> {
        let last = *self.block_data(block).ops.last()?;
        self.kind(last).is_terminator().then_some(last)
    }

    // ------------------------------------------------------------------
    // Op construction and placement
    // ------------------------------------------------------------------

    /// Allocate a detached op. Result values and empty regions (one per
    /// `kind.num_regions()`) are created eagerly; operand use edges are
    /// registered.
    pub fn create_op(&mut self, kind: OpKind, operands: &[ValueId], result_tys: &[Type]) -> OpId {
        let op = OpId(self.ops.len() as u32);
        let mut results = SmallVec::new();
        for (index, ty) in result_tys.iter().enumerate() {
            let v = ValueId(self.values.len() as u32);
            self.values.push(ValueData { ty: ty.clone(), def: ValueDef::Result { op, index }, uses: Vec::new() });
            results.push(v);
        }
        let mut regions = SmallVec::new();
        for _ in 0..kind.num_regions() {
            let r = RegionId(self.regions.len() as u32);
            self.regions.push(RegionData { parent: Some(op), blocks: SmallVec::new() });
            regions.push(r);
        }
        for (index, &v) in operands.iter().enumerate() {
            self.values[v.index()].uses.push(Use { op, index });
        }
        self.ops.push(Some(OpData {
            kind,
            operands: SmallVec::from_slice(operands),
            results,
            regions,
            parent: None,
        }));
        op
    }

    pub fn append_op(&mut self, block: BlockId, op: OpId) {
        debug_assert!(self.op_data(op).parent.is_none(), "op is already attached");
        self.block_data_mut(block).ops.push(op);
        self.op_data_mut(op).parent = Some(block);
    }

    pub fn insert_op_before(&mut self, anchor: OpId, op: OpId) {
        debug_assert!(self.op_data(op).parent.is_none(), "op is already attached");
        let block = self.op_data(anchor).parent.expect("anchor op is detached");
        let pos = self.op_position(block, anchor);
        self.block_data_mut(block).ops.insert(pos, op);
        self.op_data_mut(op).parent = Some(block);
    }

    pub fn remove_from_parent(&mut self, op: OpId) {
        if let Some(block) = self.op_data(op).parent {
            self.block_data_mut(block).ops.retain(|&o| o != op);
            self.op_data_mut(op).parent = None;
        }
    }

    /// Detach `op` and reinsert it before `anchor`.
    pub fn move_op_before(&mut self, anchor: OpId, op: OpId) {
        self.remove_from_parent(op);
        self.insert_op_before(anchor, op);
    }

    fn op_position(&self, block: BlockId, op: OpId) -> usize {
        self.block_data(block).ops.iter().position(|&o| o == op).expect("op is not in its parent block")
    }

    // ------------------------------------------------------------------
    // Blocks and regions
    // ------------------------------------------------------------------

    pub fn add_block(&mut self, region: RegionId) -> BlockId {
        let block = BlockId(self.blocks.len() as u32);
        self.blocks.push(Some(BlockData { parent: region, args: SmallVec::new(), ops: Vec::new() }));
        self.regions[region.index()].blocks.push(block);
        block
    }

    pub fn add_block_arg(&mut self, block: BlockId, ty: Type) -> ValueId {
        let index = self.block_data(block).args.len();
        let v = ValueId(self.values.len() as u32);
        self.values.push(ValueData { ty, def: ValueDef::BlockArg { block, index }, uses: Vec::new() });
        self.block_data_mut(block).args.push(v);
        v
    }

    /// Split `block` in two: ops from `from` (inclusive) onward move into
    /// a fresh argument-less block placed right after `block` in its
    /// region.
    pub fn split_block(&mut self, block: BlockId, from: OpId) -> BlockId {
        let region = self.block_data(block).parent;
        let at = self.op_position(block, from);
        let moved = self.block_data_mut(block).ops.split_off(at);
        let new = BlockId(self.blocks.len() as u32);
        self.blocks.push(Some(BlockData { parent: region, args: SmallVec::new(), ops: Vec::new() }));
        let pos = self.regions[region.index()].blocks.iter().position(|&b| b == block).expect("block not in region");
        self.regions[region.index()].blocks.insert(pos + 1, new);
        for &op in &moved {
            self.ops[op.index()].as_mut().expect("moved op erased").parent = Some(new);
        }
        self.blocks[new.index()].as_mut().expect("fresh block").ops = moved;
        new
    }

    /// Inline the ops of `src` before `anchor`, substituting `src`'s block
    /// arguments with `arg_values`, then delete the emptied block.
    pub fn merge_block_before(&mut self, src: BlockId, anchor: OpId, arg_values: &[ValueId]) {
        let args = self.block_data(src).args.to_vec();
        assert_eq!(args.len(), arg_values.len(), "argument substitution arity mismatch");
        for (&arg, &repl) in args.iter().zip(arg_values) {
            self.replace_all_uses(arg, repl);
        }
        for op in self.block_data(src).ops.clone() {
            self.op_data_mut(op).parent = None;
            self.insert_op_before(anchor, op);
        }
        self.block_data_mut(src).ops.clear();
        self.erase_block(src);
    }

    /// Delete a block and everything in it.
    pub fn erase_block(&mut self, block: BlockId) {
        for op in self.block_data(block).ops.clone().into_iter().rev() {
            self.erase_op(op);
        }
        let region = self.block_data(block).parent;
        self.regions[region.index()].blocks.retain(|b| *b != block);
        self.blocks[block.index()] = None;
    }

    // ------------------------------------------------------------------
    // Use-edge mutation
    // ------------------------------------------------------------------

    fn unlink_use(&mut self, value: ValueId, op: OpId, index: usize) {
        self.values[value.index()].uses.retain(|u| !(u.op == op && u.index == index));
    }

    pub fn set_operand(&mut self, op: OpId, index: usize, value: ValueId) {
        let old = self.op_data(op).operands[index];
        if old == value {
            return;
        }
        self.unlink_use(old, op, index);
        self.op_data_mut(op).operands[index] = value;
        self.values[value.index()].uses.push(Use { op, index });
    }

    pub fn replace_all_uses(&mut self, old: ValueId, new: ValueId) {
        if old == new {
            return;
        }
        for u in self.values[old.index()].uses.clone() {
            self.set_operand(u.op, u.index, new);
        }
    }

    /// Delete an op, its nested regions, and its operand use edges. The
    /// op's results must be unused.
    pub fn erase_op(&mut self, op: OpId) {
        let operands: Vec<(usize, ValueId)> = self.op_data(op).operands.iter().copied().enumerate().collect();
        for (index, v) in operands {
            self.unlink_use(v, op, index);
        }
        for region in self.op_data(op).regions.to_vec() {
            for block in self.regions[region.index()].blocks.to_vec().into_iter().rev() {
                self.erase_block(block);
            }
        }
        if let OpKind::Func { name, .. } = &self.op_data(op).kind {
            let name = name.clone();
            if self.symbols.get(&name) == Some(&op) {
                self.symbols.remove(&name);
            }
        }
        debug_assert!(
            self.op_data(op).results.iter().all(|r| self.values[r.index()].uses.is_empty()),
            "erasing op with live result uses"
        );
        self.remove_from_parent(op);
        self.ops[op.index()] = None;
    }

    // ------------------------------------------------------------------
    // Cloning
    // ------------------------------------------------------------------

    /// Deep-clone the blocks of `src` into `dst`, appending them in
    /// order. `value_map` maps original values to their clones; operands
    /// absent from the map (defined outside `src`) are kept as-is. Branch
    /// destinations inside `src` are retargeted to the cloned blocks.
    /// Returns the source-to-clone block mapping.
    pub fn clone_region_into(
        &mut self,
        src: RegionId,
        dst: RegionId,
        value_map: &mut HashMap<ValueId, ValueId>,
    ) -> HashMap<BlockId, BlockId> {
        let src_blocks = self.regions[src.index()].blocks.to_vec();
        let mut block_map = HashMap::new();
        for &sb in &src_blocks {
            let nb = self.add_block(dst);
            for arg in self.block_data(sb).args.to_vec() {
                let ty = self.values[arg.index()].ty.clone();
                let na = self.add_block_arg(nb, ty);
                value_map.insert(arg, na);
            }
            block_map.insert(sb, nb);
        }
        for &sb in &src_blocks {
            let nb = block_map[&sb];
            for op in self.block_data(sb).ops.clone() {
                self.clone_op_into(op, nb, value_map, &block_map);
            }
        }
        block_map
    }

    fn clone_op_into(
        &mut self,
        op: OpId,
        dst: BlockId,
        value_map: &mut HashMap<ValueId, ValueId>,
        block_map: &HashMap<BlockId, BlockId>,
    ) -> OpId {
        let mut kind = self.op_data(op).kind.clone();
        if let OpKind::Branch { dest } = &mut kind {
            if let Some(&nd) = block_map.get(dest) {
                *dest = nd;
            }
        }
        let operands: Vec<ValueId> =
            self.op_data(op).operands.iter().map(|v| value_map.get(v).copied().unwrap_or(*v)).collect();
        let result_tys: Vec<Type> =
            self.op_data(op).results.iter().map(|r| self.values[r.index()].ty.clone()).collect();
        let new = self.create_op(kind, &operands, &result_tys);
        self.append_op(dst, new);
        for i in 0..result_tys.len() {
            value_map.insert(self.op_data(op).results[i], self.op_data(new).results[i]);
        }
        for i in 0..self.op_data(op).regions.len() {
            let src_r = self.op_data(op).regions[i];
            let dst_r = self.op_data(new).regions[i];
            self.clone_region_into(src_r, dst_r, value_map);
        }
        new
    }

    // ------------------------------------------------------------------
    // Symbols
    // ------------------------------------------------------------------

    pub fn symbol(&self, name: &str) -> Option<OpId> {
        self.symbols.get(name).copied()
    }

    fn insert_func(&mut self, name: String, sig: FuncSig) -> Result<OpId> {
        if self.symbols.contains_key(&name) {
            return error::DuplicateSymbolSnafu { name }.fail();
        }
        let op = self.create_op(OpKind::Func { name: name.clone(), sig }, &[], &[]);
        self.append_op(self.top, op);
        self.symbols.insert(name, op);
        Ok(op)
    }

    /// Declare an external function: a `Func` with an empty body region.
    pub fn declare_extern(&mut self, name: &str, sig: FuncSig) -> Result<OpId> {
        self.insert_func(name.to_owned(), sig)
    }

    /// Define a function with an entry block carrying one argument per
    /// parameter. Returns the op and its entry block.
    pub fn define_func(&mut self, name: &str, sig: FuncSig) -> Result<(OpId, BlockId)> {
        let params = sig.params.clone();
        let op = self.insert_func(name.to_owned(), sig)?;
        let body = self.op_data(op).regions[0];
        let entry = self.add_block(body);
        for ty in params {
            self.add_block_arg(entry, ty);
        }
        Ok((op, entry))
    }

    pub fn func_name(&self, op: OpId) -> Option<&str> {
        match self.kind(op) {
            OpKind::Func { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn func_sig(&self, op: OpId) -> Option<&FuncSig> {
        match self.kind(op) {
            OpKind::Func { sig, .. } => Some(sig),
            _ => None,
        }
    }

    /// Clone a function under a new name, body included.
    pub fn clone_func(&mut self, src: OpId, new_name: &str) -> Result<OpId> {
        let sig = self.func_sig(src).expect("clone_func on a non-func op").clone();
        let new = self.insert_func(new_name.to_owned(), sig)?;
        let src_body = self.op_data(src).regions[0];
        let new_body = self.op_data(new).regions[0];
        let mut value_map = HashMap::new();
        self.clone_region_into(src_body, new_body, &mut value_map);
        Ok(new)
    }

    /// All ops referencing `name`: direct calls and `GetFunc`s.
    pub fn symbol_users(&self, name: &str) -> Vec<OpId> {
        self.matching_ops(|k| match k {
            OpKind::GetFunc { name: n } => n == name,
            other => other.callee() == Some(name),
        })
    }

    // ------------------------------------------------------------------
    // Walks
    // ------------------------------------------------------------------

    /// Pre-order scan of the whole module; returns matching op handles.
    pub fn matching_ops(&self, pred: impl Fn(&OpKind) -> bool) -> Vec<OpId> {
        let mut out = Vec::new();
        for &op in self.block_data(self.top).ops.iter() {
            self.visit(op, &pred, &mut out);
        }
        out
    }

    /// Pre-order scan of everything nested under `root` (exclusive).
    pub fn matching_ops_in(&self, root: OpId, pred: impl Fn(&OpKind) -> bool) -> Vec<OpId> {
        let mut out = Vec::new();
        for &region in self.op_data(root).regions.iter() {
            for &block in self.regions[region.index()].blocks.iter() {
                for &op in self.block_data(block).ops.iter() {
                    self.visit(op, &pred, &mut out);
                }
            }
        }
        out
    }

    fn visit(&self, op: OpId, pred: &impl Fn(&OpKind) -> bool, out: &mut Vec<OpId>) {
        if pred(&self.op_data(op).kind) {
            out.push(op);
        }
        for &region in self.op_data(op).regions.iter() {
            for &block in self.regions[region.index()].blocks.iter() {
                for &inner in self.block_data(block).ops.iter() {
                    self.visit(inner, pred, out);
                }
            }
        }
    }

    pub(crate) fn live_ops(&self) -> impl Iterator<Item = OpId> + '_ {
        self.ops.iter().enumerate().filter(|(_, o)| o.is_some()).map(|(i, _)| OpId(i as u32))
    }
}
