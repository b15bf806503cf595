//! The Block Lexer (spec §4.1): a two-character-lookahead state machine
//! that splits a template buffer into `Data`/`Object`/`Tag` blocks,
//! grounded on `original_source/src/lexer.c`'s `lexer_lex_blocks`. The
//! original walks the buffer with `buf[i]`/`buf[i+1]` lookahead and three
//! states (`DATA`, `TAG`, `OBJECT`); this keeps that structure exactly,
//! trading raw pointer arithmetic for a byte-slice index.

use crate::block::{Block, BlockArena, BlockType};
use crate::error::FluidError;
use crate::util::Code;

const OBJECT_OPEN: &str = "{{";
const OBJECT_CLOSE: &str = "}}";
const TAG_OPEN: &str = "{%";
const TAG_CLOSE: &str = "%}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Data,
    Tag,
    Object,
}

/// Lex `source` into a fresh [`BlockArena`]. Concatenating every
/// resulting block's `content` always reproduces `source` exactly (spec
/// §4.1's lossless invariant) — enforced even on the error paths, since
/// an unterminated tag/object still yields the blocks lexed before the
/// failure.
pub fn lex(source: &str) -> Result<BlockArena, FluidError> {
    let bytes = source.as_bytes();
    let code = Code::from(source);
    let mut arena = BlockArena::new();
    let mut state = State::Data;
    let mut block_start = 0usize;
    let mut i = 0usize;

    while i < bytes.len() {
        let two = peek2(bytes, i);
        match state {
            State::Data => {
                if two == TAG_OPEN || two == OBJECT_OPEN {
                    if i > block_start {
                        arena.push(Block::new(
                            BlockType::Data,
                            &source[block_start..i],
                            block_start,
                        ));
                    }
                    block_start = i;
                    state = if two == TAG_OPEN {
                        State::Tag
                    } else {
                        State::Object
                    };
                    i += 2;
                } else {
                    i += 1;
                }
            }
            State::Tag => {
                if two == TAG_CLOSE {
                    i += 2;
                    arena.push(Block::new(
                        BlockType::Tag,
                        &source[block_start..i],
                        block_start,
                    ));
                    block_start = i;
                    state = State::Data;
                } else {
                    i += 1;
                }
            }
            State::Object => {
                if two == OBJECT_CLOSE {
                    i += 2;
                    arena.push(Block::new(
                        BlockType::Object,
                        &source[block_start..i],
                        block_start,
                    ));
                    block_start = i;
                    state = State::Data;
                } else {
                    i += 1;
                }
            }
        }
    }

    match state {
        State::Data => {
            if block_start < bytes.len() {
                arena.push(Block::new(
                    BlockType::Data,
                    &source[block_start..],
                    block_start,
                ));
            }
            Ok(arena)
        }
        State::Tag => Err(FluidError::UnterminatedDirective {
            kind: "tag",
            position: code.position_at(block_start),
        }),
        State::Object => Err(FluidError::UnterminatedDirective {
            kind: "object",
            position: code.position_at(block_start),
        }),
    }
}

/// Two-byte lookahead starting at `i`, truncated at the buffer's end so
/// the comparison against a two-byte delimiter never panics.
fn peek2(bytes: &[u8], i: usize) -> &str {
    let end = (i + 2).min(bytes.len());
    std::str::from_utf8(&bytes[i..end]).unwrap_or("")
}
