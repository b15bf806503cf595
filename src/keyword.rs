//! The closed keyword enumeration (spec §3) and its attribute table,
//! grounded on `original_source/src/liquid.c`'s `liq_kw`/`liq_blk` tables.
//! Keyword predicates are table lookups, not cascaded `if`/`match` chains,
//! per spec §9's "keyword attributes as data" guidance.

use std::fmt;

/// Every tag keyword the lexer/parser recognize, including the synthesized
/// `end*` closing keywords (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Keyword {
    Assign,
    Decrement,
    Increment,
    Include,
    If,
    Unless,
    For,
    Case,
    Capture,
    Comment,
    Raw,
    EndIf,
    EndUnless,
    EndFor,
    EndCase,
    EndCapture,
    EndComment,
    EndRaw,
    Elsif,
    Else,
    When,
    Break,
    Continue,
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.literal())
    }
}

/// Per-keyword attribute bits, mirroring `LIQ_KW_F_*` in `liquid.c`. A
/// small hand-rolled bitset rather than a dependency: five fixed flags
/// don't earn a crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeywordAttrs(u8);

impl KeywordAttrs {
    pub const BARE: KeywordAttrs = KeywordAttrs(0b0000_0001);
    pub const END_TAG: KeywordAttrs = KeywordAttrs(0b0000_0010);
    pub const ENCLOSED: KeywordAttrs = KeywordAttrs(0b0000_0100);
    pub const LONE: KeywordAttrs = KeywordAttrs(0b0000_1000);
    pub const ENCLOSING: KeywordAttrs = KeywordAttrs(0b0001_0000);

    pub const fn union(self, other: KeywordAttrs) -> KeywordAttrs {
        KeywordAttrs(self.0 | other.0)
    }

    pub fn contains(&self, flag: KeywordAttrs) -> bool {
        self.0 & flag.0 == flag.0
    }
}

/// One row of the keyword table: literal spelling and attribute bits.
struct KeywordRow {
    keyword: Keyword,
    literal: &'static str,
    attrs: KeywordAttrs,
}

const fn row(keyword: Keyword, literal: &'static str, attrs: KeywordAttrs) -> KeywordRow {
    KeywordRow {
        keyword,
        literal,
        attrs,
    }
}

const KEYWORDS: &[KeywordRow] = &[
    row(Keyword::Assign, "assign", KeywordAttrs::BARE),
    row(Keyword::Decrement, "decrement", KeywordAttrs::BARE),
    row(Keyword::Increment, "increment", KeywordAttrs::BARE),
    row(Keyword::Include, "include", KeywordAttrs::BARE),
    row(Keyword::If, "if", KeywordAttrs::ENCLOSING),
    row(Keyword::Unless, "unless", KeywordAttrs::ENCLOSING),
    row(Keyword::For, "for", KeywordAttrs::ENCLOSING),
    row(Keyword::Case, "case", KeywordAttrs::ENCLOSING),
    row(Keyword::Capture, "capture", KeywordAttrs::ENCLOSING),
    row(
        Keyword::Comment,
        "comment",
        KeywordAttrs::LONE.union(KeywordAttrs::ENCLOSING),
    ),
    row(
        Keyword::Raw,
        "raw",
        KeywordAttrs::LONE.union(KeywordAttrs::ENCLOSING),
    ),
    row(Keyword::EndIf, "endif", KeywordAttrs::END_TAG),
    row(Keyword::EndUnless, "endunless", KeywordAttrs::END_TAG),
    row(Keyword::EndFor, "endfor", KeywordAttrs::END_TAG),
    row(Keyword::EndCase, "endcase", KeywordAttrs::END_TAG),
    row(Keyword::EndCapture, "endcapture", KeywordAttrs::END_TAG),
    row(Keyword::EndComment, "endcomment", KeywordAttrs::END_TAG),
    row(Keyword::EndRaw, "endraw", KeywordAttrs::END_TAG),
    row(
        Keyword::Elsif,
        "elsif",
        KeywordAttrs::ENCLOSED.union(KeywordAttrs::ENCLOSING),
    ),
    row(
        Keyword::Else,
        "else",
        KeywordAttrs::ENCLOSED.union(KeywordAttrs::ENCLOSING),
    ),
    row(
        Keyword::When,
        "when",
        KeywordAttrs::ENCLOSED.union(KeywordAttrs::ENCLOSING),
    ),
    row(
        Keyword::Break,
        "break",
        KeywordAttrs::LONE.union(KeywordAttrs::ENCLOSED),
    ),
    row(
        Keyword::Continue,
        "continue",
        KeywordAttrs::LONE.union(KeywordAttrs::ENCLOSED),
    ),
];

fn find_row(keyword: Keyword) -> &'static KeywordRow {
    KEYWORDS
        .iter()
        .find(|r| r.keyword == keyword)
        .expect("every Keyword variant has a row in KEYWORDS")
}

impl Keyword {
    pub fn literal(&self) -> &'static str {
        find_row(*self).literal
    }

    fn attrs(&self) -> KeywordAttrs {
        find_row(*self).attrs
    }

    pub fn is_bare(&self) -> bool {
        self.attrs().contains(KeywordAttrs::BARE)
    }

    pub fn is_end_tag(&self) -> bool {
        self.attrs().contains(KeywordAttrs::END_TAG)
    }

    pub fn is_enclosed_only(&self) -> bool {
        self.attrs().contains(KeywordAttrs::ENCLOSED)
    }

    pub fn is_lone(&self) -> bool {
        self.attrs().contains(KeywordAttrs::LONE)
    }

    pub fn is_enclosing(&self) -> bool {
        self.attrs().contains(KeywordAttrs::ENCLOSING)
    }

    /// Resolve a leading word from a tag's token text to a [`Keyword`].
    /// A word prefixed with `end` is resolved through [`BlockKind`]'s
    /// registry to its paired closing keyword; an unmatched `end...` word
    /// (e.g. `endfoo`) returns `None`, matching `liquid_get_kw`.
    pub fn resolve(word: &str) -> Option<Keyword> {
        if let Some(rest) = word.strip_prefix("end") {
            let opener = KEYWORDS
                .iter()
                .find(|r| r.literal == rest && !r.attrs.contains(KeywordAttrs::END_TAG))
                .map(|r| r.keyword)?;
            return BlockKind::for_opener(opener).map(|bk| bk.closer);
        }
        KEYWORDS
            .iter()
            .find(|r| r.literal == word && !r.attrs.contains(KeywordAttrs::END_TAG))
            .map(|r| r.keyword)
    }
}

/// Pairs an opening keyword with its closing keyword and the set of
/// keywords permitted directly inside it, mirroring `liq_blk_t` in
/// `liquid.c`.
#[derive(Debug, Clone, Copy)]
pub struct BlockKind {
    pub opener: Keyword,
    pub closer: Keyword,
    pub enclosed: &'static [Keyword],
}

const BLOCK_REGISTRY: &[BlockKind] = &[
    BlockKind {
        opener: Keyword::If,
        closer: Keyword::EndIf,
        enclosed: &[Keyword::Elsif, Keyword::Else],
    },
    BlockKind {
        opener: Keyword::Unless,
        closer: Keyword::EndUnless,
        enclosed: &[],
    },
    BlockKind {
        opener: Keyword::For,
        closer: Keyword::EndFor,
        enclosed: &[Keyword::Else, Keyword::Break, Keyword::Continue],
    },
    BlockKind {
        opener: Keyword::Case,
        closer: Keyword::EndCase,
        enclosed: &[Keyword::When, Keyword::Else],
    },
    BlockKind {
        opener: Keyword::Capture,
        closer: Keyword::EndCapture,
        enclosed: &[],
    },
    BlockKind {
        opener: Keyword::Comment,
        closer: Keyword::EndComment,
        enclosed: &[],
    },
    BlockKind {
        opener: Keyword::Raw,
        closer: Keyword::EndRaw,
        enclosed: &[],
    },
];

impl BlockKind {
    pub fn for_opener(opener: Keyword) -> Option<&'static BlockKind> {
        BLOCK_REGISTRY.iter().find(|bk| bk.opener == opener)
    }

    pub fn for_closer(closer: Keyword) -> Option<&'static BlockKind> {
        BLOCK_REGISTRY.iter().find(|bk| bk.closer == closer)
    }
}

/// `break`/`continue` are enclosed at *any* nesting depth inside a `for`,
/// not just its immediate parent (spec §4.4's structural validation and
/// §3's "Enclosed" note on `break`/`continue`). Everything else enclosed
/// only requires its *direct* parent to be the right opener.
pub fn is_valid(parent: Option<Keyword>, keyword: Keyword, any_ancestor_is_for: bool) -> bool {
    match parent {
        None => BlockKind::for_opener(keyword).is_some() || keyword.is_bare(),
        Some(parent_kw) => {
            if !keyword.is_enclosed_only() {
                return true;
            }
            if matches!(keyword, Keyword::Break | Keyword::Continue) {
                return any_ancestor_is_for;
            }
            match BlockKind::for_opener(parent_kw) {
                Some(bk) => bk.enclosed.contains(&keyword),
                None => false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_bare_and_opening_keywords() {
        assert_eq!(Keyword::resolve("assign"), Some(Keyword::Assign));
        assert_eq!(Keyword::resolve("if"), Some(Keyword::If));
        assert_eq!(Keyword::resolve("case"), Some(Keyword::Case));
    }

    #[test]
    fn resolves_end_keywords_through_registry() {
        assert_eq!(Keyword::resolve("endif"), Some(Keyword::EndIf));
        assert_eq!(Keyword::resolve("endfor"), Some(Keyword::EndFor));
        assert_eq!(Keyword::resolve("endcase"), Some(Keyword::EndCase));
    }

    #[test]
    fn unmatched_end_keyword_is_none() {
        assert_eq!(Keyword::resolve("endfoo"), None);
        assert_eq!(Keyword::resolve("endassign"), None);
    }

    #[test]
    fn top_level_allows_openers_and_bare_keywords() {
        assert!(is_valid(None, Keyword::If, false));
        assert!(is_valid(None, Keyword::Assign, false));
        assert!(!is_valid(None, Keyword::Else, false));
        assert!(!is_valid(None, Keyword::Break, false));
    }

    #[test]
    fn enclosed_keywords_require_their_enclosing_block() {
        assert!(is_valid(Some(Keyword::If), Keyword::Elsif, false));
        assert!(is_valid(Some(Keyword::If), Keyword::Else, false));
        assert!(!is_valid(Some(Keyword::Case), Keyword::Elsif, false));
        assert!(is_valid(Some(Keyword::Case), Keyword::When, false));
    }

    #[test]
    fn break_and_continue_need_a_for_ancestor_at_any_depth() {
        assert!(is_valid(Some(Keyword::If), Keyword::Break, true));
        assert!(!is_valid(Some(Keyword::If), Keyword::Break, false));
    }
}
