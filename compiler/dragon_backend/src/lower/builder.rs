//! Basic-block builder used by the lowering walk.

use crate::llir::{next_raw, BasicBlock, BlockId, FunctionBody, InstId, Terminator, Value};

/// In-progress basic block.
struct BlockBuilder {
    id: BlockId,
    name: String,
    insts: Vec<InstId>,
    terminator: Option<Terminator>,
}

impl BlockBuilder {
    fn new(id: BlockId, name: String) -> Self {
        Self {
            id,
            name,
            insts: Vec::new(),
            terminator: None,
        }
    }
}

/// Builder for the block graph of one function.
///
/// Position at a block, append instructions, terminate. The entry block is
/// allocated up front and is always block 0.
pub(crate) struct IrBuilder {
    blocks: Vec<BlockBuilder>,
    current_block: BlockId,
}

impl IrBuilder {
    pub(crate) fn new() -> Self {
        Self {
            blocks: vec![BlockBuilder::new(BlockId::new(0), "entry".to_owned())],
            current_block: BlockId::new(0),
        }
    }

    // Block management

    /// Allocate a new empty block.
    pub(crate) fn new_block(&mut self, name: String) -> BlockId {
        let id = BlockId::new(next_raw(self.blocks.len(), "blocks"));
        self.blocks.push(BlockBuilder::new(id, name));
        id
    }

    /// Set the insertion point.
    pub(crate) fn position_at(&mut self, block: BlockId) {
        debug_assert!(
            block.index() < self.blocks.len(),
            "BlockId {} out of bounds (have {} blocks)",
            block.raw(),
            self.blocks.len(),
        );
        self.current_block = block;
    }

    #[inline]
    pub(crate) fn block_count(&self) -> usize {
        self.blocks.len()
    }

    // Instructions

    /// Append instructions to the current block.
    pub(crate) fn append(&mut self, insts: impl IntoIterator<Item = InstId>) {
        let block = &mut self.blocks[self.current_block.index()];
        debug_assert!(
            block.terminator.is_none(),
            "append to terminated block {}",
            self.current_block.raw()
        );
        block.insts.extend(insts);
    }

    // Terminators

    fn terminate(&mut self, terminator: Terminator) {
        let block = &mut self.blocks[self.current_block.index()];
        debug_assert!(
            block.terminator.is_none(),
            "block {} already terminated",
            self.current_block.raw()
        );
        block.terminator = Some(terminator);
    }

    pub(crate) fn terminate_jump(&mut self, target: BlockId) {
        self.terminate(Terminator::Jump { target });
    }

    pub(crate) fn terminate_branch(&mut self, cond: Value, then_block: BlockId, else_block: BlockId) {
        self.terminate(Terminator::Branch {
            cond,
            then_block,
            else_block,
        });
    }

    pub(crate) fn terminate_return(&mut self, value: Option<Value>) {
        self.terminate(Terminator::Return { value });
    }

    // Finalization

    /// Consume the builder and produce the finished body.
    ///
    /// Blocks still open get `Return` of nothing when the function returns
    /// void and `Unreachable` otherwise.
    pub(crate) fn finish(self, result_is_void: bool) -> FunctionBody {
        let blocks = self
            .blocks
            .into_iter()
            .map(|bb| {
                let terminator = bb.terminator.unwrap_or_else(|| {
                    if result_is_void {
                        Terminator::Return { value: None }
                    } else {
                        tracing::trace!(block = %bb.name, "open block closed with Unreachable");
                        Terminator::Unreachable
                    }
                });
                BasicBlock {
                    id: bb.id,
                    name: bb.name,
                    insts: bb.insts,
                    terminator,
                }
            })
            .collect();

        FunctionBody {
            blocks,
            entry: BlockId::new(0),
        }
    }
}
