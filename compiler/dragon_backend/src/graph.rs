//! CFG queries over a lowered [`FunctionBody`].

use rustc_hash::FxHashSet;
use smallvec::{smallvec, SmallVec};

use crate::llir::{BlockId, FunctionBody, Terminator};

/// Compute the predecessor list for each block (deduplicated).
///
/// Returns a vector indexed by block index, where each entry lists the
/// distinct predecessor blocks in block order.
pub(crate) fn compute_predecessors(body: &FunctionBody) -> Vec<Vec<BlockId>> {
    let num_blocks = body.blocks.len();
    let mut predecessors: Vec<Vec<BlockId>> = vec![Vec::new(); num_blocks];

    for block in &body.blocks {
        let mut seen = FxHashSet::default();
        for succ in successor_block_ids(&block.terminator) {
            if succ.index() < num_blocks && seen.insert(succ) {
                predecessors[succ.index()].push(block.id);
            }
        }
    }

    predecessors
}

/// Extract successor block IDs from a terminator.
pub(crate) fn successor_block_ids(terminator: &Terminator) -> SmallVec<[BlockId; 2]> {
    match terminator {
        Terminator::Return { .. } | Terminator::Unreachable => SmallVec::new(),
        Terminator::Jump { target } => smallvec![*target],
        Terminator::Branch {
            then_block,
            else_block,
            ..
        } => smallvec![*then_block, *else_block],
    }
}
