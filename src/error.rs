//! Error taxonomy for the pipeline (spec §7). Each component returns a
//! single typed error code; the category a variant belongs to is derived
//! from the variant itself rather than a separate range check, unlike
//! `original_source/src/ferrors.c`'s `ferror_type()` which tested an enum
//! value against ranges.

use crate::util::Position;
use std::path::PathBuf;
use thiserror::Error;

/// Coarse category a [`FluidError`] belongs to, used only for the
/// "category, originating component, message" diagnostic line the CLI
/// prints (spec §7). Carries no data of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Generic,
    Object,
    Config,
    Lex,
    Parse,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorCategory::Generic => "GenericError",
            ErrorCategory::Object => "ObjectError",
            ErrorCategory::Config => "ConfigError",
            ErrorCategory::Lex => "LexError",
            ErrorCategory::Parse => "ParseError",
        };
        write!(f, "{name}")
    }
}

/// The crate's one error type. Every fallible public function returns
/// `Result<T, FluidError>`; nothing downstream reinterprets an error it
/// didn't originate (spec §7's propagation policy).
#[derive(Debug, Error)]
pub enum FluidError {
    #[error("unknown error")]
    Unknown,

    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("invalid parameter: {message}")]
    InvalidParameter { message: String },

    #[error("invalid value literal: {literal}")]
    InvalidValueLiteral { literal: String },

    #[error("identifier too long: {identifier} ({len} bytes)")]
    IdentifierTooLong { identifier: String, len: usize },

    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("config parser error: {message}")]
    ConfigParser { message: String },

    #[error("unexpected configuration event for state {state}: {event}")]
    ConfigUnexpectedEvent { state: String, event: String },

    #[error("invalid ascend: already at the root container")]
    ConfigInvalidAscend,

    #[error("unterminated {kind} at {position}")]
    UnterminatedDirective {
        kind: &'static str,
        position: Position,
    },

    #[error("directive body exceeds {max} bytes at {position}")]
    BlockTooLarge { max: usize, position: Position },

    #[error("empty {what} at {position}")]
    EmptyDirectiveContent {
        what: &'static str,
        position: Position,
    },

    #[error("unknown keyword '{word}' at {position}")]
    UnknownKeyword { word: String, position: Position },

    #[error("unknown filter '{name}' at {position}")]
    UnknownFilter { name: String, position: Position },

    #[error("filter '{name}' expects {expected} argument(s), found {found} at {position}")]
    FilterArityMismatch {
        name: String,
        expected: usize,
        found: usize,
        position: Position,
    },

    #[error("filter argument exceeds {max} bytes at {position}")]
    FilterArgumentTooLong { max: usize, position: Position },

    #[error("unrecognized text after filter list at {position}")]
    TrailingFilterContent { position: Position },

    #[error("invalid nesting: '{keyword}' at {position}")]
    InvalidNesting { keyword: String, position: Position },

    #[error("missing terminator for '{opener}' opened at {position}")]
    MissingTerminator { opener: String, position: Position },

    #[error("'include' with no operand at {position}")]
    IncludeMissingOperand { position: Position },

    #[error("failed to load include '{name}': {source}")]
    IncludeLoadFailure {
        name: String,
        #[source]
        source: Box<FluidError>,
    },
}

impl FluidError {
    pub fn category(&self) -> ErrorCategory {
        use FluidError::*;
        match self {
            Unknown | FileNotFound { .. } | InvalidParameter { .. } => ErrorCategory::Generic,
            InvalidValueLiteral { .. } | IdentifierTooLong { .. } | TypeMismatch { .. } => {
                ErrorCategory::Object
            }
            ConfigParser { .. } | ConfigUnexpectedEvent { .. } | ConfigInvalidAscend => {
                ErrorCategory::Config
            }
            UnterminatedDirective { .. }
            | BlockTooLarge { .. }
            | EmptyDirectiveContent { .. }
            | UnknownKeyword { .. }
            | UnknownFilter { .. }
            | FilterArityMismatch { .. }
            | FilterArgumentTooLong { .. }
            | TrailingFilterContent { .. } => ErrorCategory::Lex,
            InvalidNesting { .. }
            | MissingTerminator { .. }
            | IncludeMissingOperand { .. }
            | IncludeLoadFailure { .. } => ErrorCategory::Parse,
        }
    }
}

pub type FluidResult<T> = Result<T, FluidError>;
