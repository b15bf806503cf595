//! The Preprocessor (spec §4.3): resolves `comment`/`raw` spans down to
//! literal text, expands `include` tags by recursively running the whole
//! pipeline over the referenced sub-template, and coalesces adjacent
//! `Data` blocks the splicing leaves behind. Grounded on spec §4.3 and,
//! for `include`, on `original_source/src/fluid.c`'s top-level
//! `lexer_lex`-then-`parser_check` recursion being the only shape the
//! original gives this collaborator.

use crate::block::{Block, BlockArena, BlockType};
use crate::error::FluidError;
use crate::include::IncludeLoader;
use crate::keyword::{BlockKind, Keyword};
use crate::lexer::lex;
use crate::token::tokenize_tag;
use crate::util::Code;

/// Run the full preprocessing pass: strip comment/raw spans, expand
/// includes, then coalesce adjacent data. Each stage rebuilds the arena
/// rather than mutating in place, since splicing shifts every later
/// `BlockId` and a fresh `Vec<Block>` sidesteps that bookkeeping
/// entirely.
pub fn preprocess(arena: BlockArena, loader: &dyn IncludeLoader) -> Result<BlockArena, FluidError> {
    let code = Code::from(arena.reconstruct().as_str());
    let arena = strip_comments_and_raw(arena, &code)?;
    let arena = expand_includes(arena, loader)?;
    Ok(coalesce_data(arena))
}

/// Text between a `{%`/`%}` tag's delimiters, trimmed. Used instead of
/// [`tokenize_tag`] while scanning for a `raw`/`comment` span's closer,
/// since the span's interior can contain delimiter-shaped text that
/// isn't meant to resolve as a real keyword.
fn tag_body(content: &str) -> &str {
    content
        .strip_prefix("{%")
        .and_then(|s| s.strip_suffix("%}"))
        .map(str::trim)
        .unwrap_or(content)
}

fn tag_literal_is(block: &Block, literal: &str) -> bool {
    block.kind == BlockType::Tag && tag_body(&block.content) == literal
}

fn strip_comments_and_raw(arena: BlockArena, code: &Code<'_>) -> Result<BlockArena, FluidError> {
    let blocks: Vec<Block> = arena.iter().map(|(_, b)| b.clone()).collect();
    let mut out = BlockArena::new();
    let mut i = 0;

    while i < blocks.len() {
        let block = &blocks[i];
        let opener = if block.kind == BlockType::Tag {
            tokenize_tag(&block.content, block.start, code)
                .ok()
                .map(|t| t.keyword)
                .filter(|kw| matches!(kw, Keyword::Comment | Keyword::Raw))
        } else {
            None
        };

        let Some(keyword) = opener else {
            out.push(block.clone());
            i += 1;
            continue;
        };

        let closer_literal = BlockKind::for_opener(keyword)
            .expect("comment and raw are registered block kinds")
            .closer
            .literal();

        let closer_index = (i + 1..blocks.len()).find(|&j| tag_literal_is(&blocks[j], closer_literal));
        let Some(closer_index) = closer_index else {
            return Err(FluidError::MissingTerminator {
                opener: keyword.literal().to_string(),
                position: code.position_at(block.start),
            });
        };

        match keyword {
            Keyword::Raw => {
                let inner: String = blocks[i + 1..closer_index]
                    .iter()
                    .map(|b| b.content.as_str())
                    .collect();
                // An empty raw span (`{% raw %}{% endraw %}`) would
                // otherwise push a zero-length Data block, violating
                // spec §3 invariant (d): "a Data block is non-empty."
                if !inner.is_empty() {
                    out.push(Block::new(BlockType::Data, inner, block.start));
                }
            }
            Keyword::Comment => {
                // Removed entirely (spec §4.3: "remove every block from
                // comment-start through endcomment inclusive"), not
                // replaced with an empty Data block — pushing one would
                // violate invariant (d) and, if the comment isn't
                // adjacent to other Data, survive coalescing as a
                // spurious empty Text node.
            }
            _ => unreachable!("opener is filtered to Comment | Raw above"),
        }

        i = closer_index + 1;
    }

    Ok(out)
}

fn trim_quotes(literal: &str) -> &str {
    let bytes = literal.as_bytes();
    if bytes.len() >= 2 {
        let (open, close) = (bytes[0], bytes[bytes.len() - 1]);
        if (open == b'"' && close == b'"') || (open == b'\'' && close == b'\'') {
            return &literal[1..literal.len() - 1];
        }
    }
    literal
}

fn expand_includes(arena: BlockArena, loader: &dyn IncludeLoader) -> Result<BlockArena, FluidError> {
    let code = Code::from(arena.reconstruct().as_str());
    let mut out = BlockArena::new();

    for (_, block) in arena.iter() {
        if block.kind != BlockType::Tag {
            out.push(block.clone());
            continue;
        }

        let token = tokenize_tag(&block.content, block.start, &code)?;
        if token.keyword != Keyword::Include {
            out.push(block.clone());
            continue;
        }

        let operand = token
            .words
            .first()
            .ok_or(FluidError::IncludeMissingOperand {
                position: token.position,
            })?;
        let name = trim_quotes(operand).to_string();

        let sub_blocks = load_and_preprocess(&name, loader)?;
        for sub_block in sub_blocks {
            out.push(sub_block);
        }
    }

    Ok(out)
}

fn load_and_preprocess(name: &str, loader: &dyn IncludeLoader) -> Result<Vec<Block>, FluidError> {
    let wrap = |source: FluidError| FluidError::IncludeLoadFailure {
        name: name.to_string(),
        source: Box::new(source),
    };

    let source = loader.load(name).map_err(wrap)?;
    let arena = lex(&source).map_err(wrap)?;
    let arena = preprocess(arena, loader).map_err(wrap)?;
    Ok(arena.iter().map(|(_, b)| b.clone()).collect())
}

fn coalesce_data(arena: BlockArena) -> BlockArena {
    let mut out = BlockArena::new();
    for (_, block) in arena.iter() {
        if block.kind == BlockType::Data {
            if let Some(last) = out.ids().last() {
                if out.get(last).kind == BlockType::Data {
                    out.get_mut(last).content.push_str(&block.content);
                    continue;
                }
            }
        }
        out.push(block.clone());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::include::MapIncludeLoader;

    fn run(source: &str, loader: &dyn IncludeLoader) -> BlockArena {
        preprocess(lex(source).unwrap(), loader).unwrap()
    }

    #[test]
    fn comment_span_is_removed_not_left_as_empty_data() {
        let loader = MapIncludeLoader::new();
        let arena = run("a{% comment %}{{ broken ! %}b{% endcomment %}c", &loader);
        assert_eq!(arena.reconstruct(), "ac");
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn comment_not_adjacent_to_data_leaves_no_empty_block() {
        let loader = MapIncludeLoader::new();
        let arena = run(
            "{% if a == 1 %}{% comment %}x{% endcomment %}{% endif %}",
            &loader,
        );
        assert_eq!(arena.reconstruct(), "{% if a == 1 %}{% endif %}");
        assert!(arena.iter().all(|(_, b)| !b.content.is_empty()));
    }

    #[test]
    fn comment_only_template_yields_no_blocks() {
        let loader = MapIncludeLoader::new();
        let arena = run("{% comment %}drop{% endcomment %}", &loader);
        assert!(arena.is_empty());
    }

    #[test]
    fn empty_raw_span_leaves_no_empty_block() {
        let loader = MapIncludeLoader::new();
        let arena = run("a{% raw %}{% endraw %}b", &loader);
        assert_eq!(arena.reconstruct(), "ab");
        assert!(arena.iter().all(|(_, b)| !b.content.is_empty()));
    }

    #[test]
    fn raw_span_preserves_literal_text() {
        let loader = MapIncludeLoader::new();
        let arena = run("a{% raw %}{{ not.interpolated }}{% endraw %}b", &loader);
        assert_eq!(arena.reconstruct(), "a{{ not.interpolated }}b");
    }

    #[test]
    fn missing_endraw_is_an_error() {
        let loader = MapIncludeLoader::new();
        let err = preprocess(lex("{% raw %}stuck").unwrap(), &loader).unwrap_err();
        assert!(matches!(err, FluidError::MissingTerminator { .. }));
    }

    #[test]
    fn include_splices_loaded_template_blocks() {
        let loader = MapIncludeLoader::new().with("greeting", "hi {{ name }}");
        let arena = run("before {% include \"greeting\" %} after", &loader);
        assert_eq!(arena.reconstruct(), "before hi {{ name }} after");
    }

    #[test]
    fn include_missing_operand_is_an_error() {
        let loader = MapIncludeLoader::new();
        let err = preprocess(lex("{% include %}").unwrap(), &loader).unwrap_err();
        assert!(matches!(err, FluidError::IncludeMissingOperand { .. }));
    }

    #[test]
    fn include_failure_wraps_with_the_template_name() {
        let loader = MapIncludeLoader::new();
        let err = preprocess(lex("{% include \"missing\" %}").unwrap(), &loader).unwrap_err();
        match err {
            FluidError::IncludeLoadFailure { name, .. } => assert_eq!(name, "missing"),
            other => panic!("expected IncludeLoadFailure, got {other:?}"),
        }
    }

    #[test]
    fn adjacent_data_blocks_coalesce_after_splicing() {
        let loader = MapIncludeLoader::new().with("mid", "MID");
        let arena = run("a{% include \"mid\" %}b", &loader);
        let data_blocks: Vec<_> = arena
            .iter()
            .filter(|(_, b)| b.kind == BlockType::Data)
            .collect();
        assert_eq!(data_blocks.len(), 1);
        assert_eq!(data_blocks[0].1.content, "aMIDb");
    }
}
