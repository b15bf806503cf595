//! The block model produced by the Block Lexer (spec §4.1), grounded on
//! `original_source/src/lexer.h`'s `liq_blk_e`/block struct. Blocks are
//! stored in a flat arena and referenced by index rather than through a
//! pointer graph, per spec §9's arena guidance and the teacher's own
//! newtype-index idiom (`FltrPtr`, `CacheKey` in `lib.rs`).

use std::fmt;
use std::ops::{Index, IndexMut};

/// The three lexer states a block can be produced in (spec §4.1): plain
/// template text, an object interpolation (`{{ ... }}`), or a tag
/// (`{% ... %}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockType {
    Data,
    Object,
    Tag,
}

/// Index of a [`Block`] inside a [`BlockArena`]. Opaque outside this
/// module's arena bookkeeping; never dereferenced directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(usize);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One lexed block. `content` is the verbatim source slice the block
/// spans (including its delimiters for `Object`/`Tag`); `start` is the
/// byte offset of `content`'s first byte in the original buffer, used to
/// recover [`crate::util::Position`] for diagnostics. The Token Stage
/// trims delimiters and inner whitespace out of `content` when it
/// extracts a tag or object's token text (spec §4.2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub kind: BlockType,
    pub content: String,
    pub start: usize,
}

impl Block {
    pub fn new(kind: BlockType, content: impl Into<String>, start: usize) -> Self {
        Self {
            kind,
            content: content.into(),
            start,
        }
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// Flat storage for a template's blocks. The lexer appends in source
/// order; nothing removes a block once pushed, so `BlockId`s stay valid
/// for the arena's whole lifetime.
#[derive(Debug, Default, Clone)]
pub struct BlockArena {
    blocks: Vec<Block>,
}

impl BlockArena {
    pub fn new() -> Self {
        Self { blocks: Vec::new() }
    }

    pub fn push(&mut self, block: Block) -> BlockId {
        let id = BlockId(self.blocks.len());
        self.blocks.push(block);
        id
    }

    pub fn get(&self, id: BlockId) -> &Block {
        &self.blocks[id.0]
    }

    pub fn get_mut(&mut self, id: BlockId) -> &mut Block {
        &mut self.blocks[id.0]
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = BlockId> {
        (0..self.blocks.len()).map(BlockId)
    }

    pub fn iter(&self) -> impl Iterator<Item = (BlockId, &Block)> {
        self.blocks.iter().enumerate().map(|(i, b)| (BlockId(i), b))
    }

    /// Reassemble the original buffer by concatenating every block's
    /// `content` in order. Used by the lossless-reconstruction test
    /// (spec §4.1's invariant).
    pub fn reconstruct(&self) -> String {
        self.blocks.iter().map(|b| b.content.as_str()).collect()
    }

    /// Remove a run of blocks (by their `BlockId`s) and splice in a
    /// replacement sequence, used when the Preprocessor coalesces
    /// adjacent `Data` blocks or when `include` splices a sub-template's
    /// blocks into the outer sequence. Returns the `BlockId`s of the
    /// inserted blocks.
    ///
    /// `Vec::splice` gives us the ownership transfer spec §9's Open
    /// Question asked about "for free" — no separate teardown pass is
    /// needed the way the original's head/tail pointer surgery required.
    pub fn splice(&mut self, start: BlockId, end: BlockId, replacement: Vec<Block>) -> Vec<BlockId> {
        let range = start.0..end.0 + 1;
        let first_new = start.0;
        let inserted_count = replacement.len();
        self.blocks.splice(range, replacement);
        (0..inserted_count).map(|i| BlockId(first_new + i)).collect()
    }
}

impl Index<BlockId> for BlockArena {
    type Output = Block;
    fn index(&self, id: BlockId) -> &Block {
        self.get(id)
    }
}

impl IndexMut<BlockId> for BlockArena {
    fn index_mut(&mut self, id: BlockId) -> &mut Block {
        self.get_mut(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arena_preserves_insertion_order_ids() {
        let mut arena = BlockArena::new();
        let a = arena.push(Block::new(BlockType::Data, "hello ", 0));
        let b = arena.push(Block::new(BlockType::Object, "{{ name }}", 6));
        assert_eq!(arena[a].kind, BlockType::Data);
        assert_eq!(arena[b].kind, BlockType::Object);
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn reconstruct_concatenates_content_losslessly() {
        let mut arena = BlockArena::new();
        arena.push(Block::new(BlockType::Data, "hi ", 0));
        arena.push(Block::new(BlockType::Object, "{{ x }}", 3));
        arena.push(Block::new(BlockType::Data, "!", 10));
        assert_eq!(arena.reconstruct(), "hi {{ x }}!");
    }

    #[test]
    fn splice_replaces_a_run_and_returns_new_ids() {
        let mut arena = BlockArena::new();
        let a = arena.push(Block::new(BlockType::Data, "a", 0));
        let b = arena.push(Block::new(BlockType::Data, "b", 1));
        let c = arena.push(Block::new(BlockType::Data, "c", 2));
        let new_ids = arena.splice(
            b,
            b,
            vec![
                Block::new(BlockType::Data, "x", 1),
                Block::new(BlockType::Data, "y", 1),
            ],
        );
        assert_eq!(new_ids.len(), 2);
        assert_eq!(arena.reconstruct(), "axyc");
        assert_eq!(arena[a].content, "a");
        assert_eq!(arena[c].content, "c");
    }
}
