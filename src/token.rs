//! The Token Stage (spec §4.2): turns a lexed `Tag`/`Object` block's raw
//! `content` into a keyword plus argument words, or an expression plus a
//! filter pipeline. Grounded on `original_source/src/lexer.c`'s
//! `lexer_tokenize_tag`/`lexer_tokenize_object` (whitespace/`|` splitting)
//! and `original_source/src/liquid.c`'s `liquid_get_optor` (operator
//! table).

use crate::error::FluidError;
use crate::filter::{parse_filter, Filter};
use crate::keyword::Keyword;
use crate::util::{Code, Position};

/// Comparison/logical operators recognized inside tag expressions,
/// mirroring `liq_optor[]` in `liquid.c`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Lt,
    Le,
    Gt,
    Ge,
    Ne,
    Eq,
    And,
    Or,
    Contains,
}

/// Directive body length bound (spec §7: "block too large (>256 bytes
/// for directive body)"), checked once the delimiters and surrounding
/// whitespace are stripped off.
const DIRECTIVE_MAX_LEN: usize = 256;

const OPERATORS: &[(&str, Operator)] = &[
    ("<=", Operator::Le),
    (">=", Operator::Ge),
    ("!=", Operator::Ne),
    ("==", Operator::Eq),
    ("&&", Operator::And),
    ("||", Operator::Or),
    ("<", Operator::Lt),
    (">", Operator::Gt),
    ("contains", Operator::Contains),
];

impl Operator {
    pub fn literal(&self) -> &'static str {
        OPERATORS.iter().find(|(_, op)| op == self).unwrap().0
    }

    /// Resolve a word to an [`Operator`]. Longer symbols (`<=`, `==`, ...)
    /// are listed before their single-character prefixes so a caller
    /// matching whole words never needs to worry about the shared
    /// leading byte.
    pub fn resolve(word: &str) -> Option<Operator> {
        OPERATORS
            .iter()
            .find(|(literal, _)| *literal == word)
            .map(|(_, op)| *op)
    }
}

/// A tokenized tag: its resolved [`Keyword`], an optional trailing
/// filter (spec §3: "a tag may carry at most one trailing filter"), and
/// the remaining whitespace-separated operand words (spec §4.2's "Tag
/// tokens").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagToken {
    pub keyword: Keyword,
    pub words: Vec<String>,
    pub filter: Option<Filter>,
    pub position: Position,
}

/// A tokenized object: the expression word(s) before the first `|`, plus
/// the ordered filter pipeline after it (spec §4.2's "Object tokens").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectToken {
    pub expression: String,
    pub filters: Vec<Filter>,
    pub position: Position,
}

/// Strip a block's delimiters (`{%`/`%}` or `{{`/`}}`) and surrounding
/// whitespace, returning the inner text plus the byte offset (within the
/// original buffer) of that inner text's first byte.
fn inner(content: &str, block_start: usize, open_len: usize, close_len: usize) -> (&str, usize) {
    let stripped = &content[open_len..content.len() - close_len];
    let trimmed = stripped.trim_start();
    let leading_ws = stripped.len() - trimmed.len();
    let trimmed = trimmed.trim_end();
    (trimmed, block_start + open_len + leading_ws)
}

/// Tokenize a lexed `Tag` block's `content` (including its `{%`/`%}`
/// delimiters) into a [`TagToken`].
pub fn tokenize_tag(content: &str, block_start: usize, code: &Code<'_>) -> Result<TagToken, FluidError> {
    let (body, body_start) = inner(content, block_start, 2, 2);
    let position = code.position_at(body_start);
    if body.is_empty() {
        return Err(FluidError::EmptyDirectiveContent {
            what: "tag",
            position,
        });
    }
    if body.len() > DIRECTIVE_MAX_LEN {
        return Err(FluidError::BlockTooLarge {
            max: DIRECTIVE_MAX_LEN,
            position,
        });
    }

    let first_word_len = body.find(char::is_whitespace).unwrap_or(body.len());
    let (first, rest) = body.split_at(first_word_len);
    let keyword = Keyword::resolve(first).ok_or_else(|| FluidError::UnknownKeyword {
        word: first.to_string(),
        position,
    })?;

    let (rest, filter) = match rest.find('|') {
        Some(idx) => {
            let filter = parse_filter(&rest[idx + 1..], position)?;
            (&rest[..idx], Some(filter))
        }
        None => (rest, None),
    };

    Ok(TagToken {
        keyword,
        words: rest.split_whitespace().map(|w| w.to_string()).collect(),
        filter,
        position,
    })
}

/// Tokenize a lexed `Object` block's `content` (including its `{{`/`}}`
/// delimiters) into an [`ObjectToken`], parsing any `|`-separated filter
/// pipeline via [`parse_filter`].
pub fn tokenize_object(
    content: &str,
    block_start: usize,
    code: &Code<'_>,
) -> Result<ObjectToken, FluidError> {
    let (body, body_start) = inner(content, block_start, 2, 2);
    let position = code.position_at(body_start);
    if body.is_empty() {
        return Err(FluidError::EmptyDirectiveContent {
            what: "object",
            position,
        });
    }
    if body.len() > DIRECTIVE_MAX_LEN {
        return Err(FluidError::BlockTooLarge {
            max: DIRECTIVE_MAX_LEN,
            position,
        });
    }

    let mut segments = body.split('|');
    let expression = segments.next().unwrap().trim().to_string();
    if expression.is_empty() {
        return Err(FluidError::EmptyDirectiveContent {
            what: "object",
            position,
        });
    }

    let filters = segments
        .map(|segment| parse_filter(segment, position))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ObjectToken {
        expression,
        filters,
        position,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_a_bare_tag() {
        let code = Code::from("{% assign x = 1 %}");
        let token = tokenize_tag("{% assign x = 1 %}", 0, &code).unwrap();
        assert_eq!(token.keyword, Keyword::Assign);
        assert_eq!(token.words, vec!["x", "=", "1"]);
    }

    #[test]
    fn tokenizes_end_tag_through_resolve() {
        let code = Code::from("{% endif %}");
        let token = tokenize_tag("{% endif %}", 0, &code).unwrap();
        assert_eq!(token.keyword, Keyword::EndIf);
        assert!(token.words.is_empty());
    }

    #[test]
    fn unknown_tag_keyword_is_an_error() {
        let code = Code::from("{% bogus %}");
        let err = tokenize_tag("{% bogus %}", 0, &code).unwrap_err();
        assert!(matches!(err, FluidError::UnknownKeyword { .. }));
    }

    #[test]
    fn empty_tag_is_an_error() {
        let code = Code::from("{%   %}");
        let err = tokenize_tag("{%   %}", 0, &code).unwrap_err();
        assert!(matches!(err, FluidError::EmptyDirectiveContent { .. }));
    }

    #[test]
    fn over_long_directive_body_is_an_error() {
        let body = "x".repeat(DIRECTIVE_MAX_LEN + 1);
        let content = format!("{{% assign y = {body} %}}");
        let code = Code::from(content.as_str());
        let err = tokenize_tag(&content, 0, &code).unwrap_err();
        assert!(matches!(err, FluidError::BlockTooLarge { .. }));
    }

    #[test]
    fn tag_with_trailing_filter_separates_operands_from_filter() {
        let code = Code::from("{% assign name | append:! %}");
        let token = tokenize_tag("{% assign name | append:! %}", 0, &code).unwrap();
        assert_eq!(token.keyword, Keyword::Assign);
        assert_eq!(token.words, vec!["name"]);
        let filter = token.filter.expect("trailing filter parsed");
        assert_eq!(filter.id, crate::filter::FilterId::Append);
        assert_eq!(filter.arg(0), Some("!"));
    }

    #[test]
    fn tag_without_filter_has_none() {
        let code = Code::from("{% if a == 1 %}");
        let token = tokenize_tag("{% if a == 1 %}", 0, &code).unwrap();
        assert!(token.filter.is_none());
    }

    #[test]
    fn tokenizes_object_without_filters() {
        let code = Code::from("{{ user.name }}");
        let token = tokenize_object("{{ user.name }}", 0, &code).unwrap();
        assert_eq!(token.expression, "user.name");
        assert!(token.filters.is_empty());
    }

    #[test]
    fn tokenizes_object_with_filter_pipeline() {
        let code = Code::from("{{ name | strip | append:! }}");
        let token = tokenize_object("{{ name | strip | append:! }}", 0, &code).unwrap();
        assert_eq!(token.expression, "name");
        assert_eq!(token.filters.len(), 2);
    }

    #[test]
    fn operator_resolves_longest_symbols_correctly() {
        assert_eq!(Operator::resolve("<="), Some(Operator::Le));
        assert_eq!(Operator::resolve("<"), Some(Operator::Lt));
        assert_eq!(Operator::resolve("contains"), Some(Operator::Contains));
        assert_eq!(Operator::resolve("nope"), None);
    }
}
