//! Filter identifiers and the per-filter argument parser (spec §3, §4.2),
//! grounded on `original_source/src/filter.c`/`filter.h`. The original
//! wires up three arity-0 filters (`strip`/`lstrip`/`rstrip`); this
//! expansion adds four more to exercise the arity-1/2 argument parsing the
//! original's own `liq_filter_arg_count` plumbing already supports (see
//! `SPEC_FULL.md` §4.2).

use crate::util::Position;
use crate::FluidError;

/// Filter argument bound from `filter.h`'s `LIQ_FILTER_ARG_MAXLEN`.
pub const FILTER_ARG_MAXLEN: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterId {
    Strip,
    LStrip,
    RStrip,
    Append,
    Prepend,
    Default,
    Replace,
}

struct FilterRow {
    id: FilterId,
    name: &'static str,
    arity: usize,
}

const FILTERS: &[FilterRow] = &[
    FilterRow {
        id: FilterId::Strip,
        name: "strip",
        arity: 0,
    },
    FilterRow {
        id: FilterId::LStrip,
        name: "lstrip",
        arity: 0,
    },
    FilterRow {
        id: FilterId::RStrip,
        name: "rstrip",
        arity: 0,
    },
    FilterRow {
        id: FilterId::Append,
        name: "append",
        arity: 1,
    },
    FilterRow {
        id: FilterId::Prepend,
        name: "prepend",
        arity: 1,
    },
    FilterRow {
        id: FilterId::Default,
        name: "default",
        arity: 1,
    },
    FilterRow {
        id: FilterId::Replace,
        name: "replace",
        arity: 2,
    },
];

impl FilterId {
    pub fn name(&self) -> &'static str {
        FILTERS.iter().find(|r| r.id == *self).unwrap().name
    }

    pub fn arity(&self) -> usize {
        FILTERS.iter().find(|r| r.id == *self).unwrap().arity
    }

    fn lookup(name: &str) -> Option<FilterId> {
        FILTERS.iter().find(|r| r.name == name).map(|r| r.id)
    }
}

/// A parsed filter: identifier plus its (already arity-checked)
/// arguments, each bounded to [`FILTER_ARG_MAXLEN`] bytes (spec §3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub id: FilterId,
    pub args: [Option<String>; 2],
}

impl Filter {
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).and_then(|a| a.as_deref())
    }
}

/// Parse one `|`-separated filter segment of the form `name[:arg1[,arg2]]`
/// (spec §4.2's "Filter parser"). `position` is used only for error
/// reporting and should point at the start of the segment.
pub fn parse_filter(segment: &str, position: Position) -> Result<Filter, FluidError> {
    let segment = segment.trim();
    let (name, rest) = match segment.find(':') {
        Some(idx) => (segment[..idx].trim(), Some(segment[idx + 1..].trim())),
        None => (segment.trim(), None),
    };

    let id = FilterId::lookup(name).ok_or_else(|| FluidError::UnknownFilter {
        name: name.to_string(),
        position,
    })?;
    let arity = id.arity();

    // The filter grammar is `name[:arg1[,arg2]]` (spec §3): a second `:`
    // inside the argument list is content trailing the recognized
    // grammar, not a third argument.
    if let Some(r) = rest {
        if r.contains(':') {
            return Err(FluidError::TrailingFilterContent { position });
        }
    }

    let raw_args: Vec<&str> = match rest {
        Some(r) if arity > 0 => r.split(',').map(|a| a.trim()).collect(),
        Some(_) if arity == 0 => {
            return Err(FluidError::FilterArityMismatch {
                name: name.to_string(),
                expected: 0,
                found: 1,
                position,
            })
        }
        None if arity > 0 => {
            return Err(FluidError::FilterArityMismatch {
                name: name.to_string(),
                expected: arity,
                found: 0,
                position,
            })
        }
        _ => Vec::new(),
    };

    if raw_args.len() != arity {
        return Err(FluidError::FilterArityMismatch {
            name: name.to_string(),
            expected: arity,
            found: raw_args.len(),
            position,
        });
    }

    for arg in &raw_args {
        if arg.len() > FILTER_ARG_MAXLEN {
            return Err(FluidError::FilterArgumentTooLong {
                max: FILTER_ARG_MAXLEN,
                position,
            });
        }
    }

    let mut args: [Option<String>; 2] = [None, None];
    for (slot, arg) in args.iter_mut().zip(raw_args.iter()) {
        *slot = Some((*arg).to_string());
    }

    Ok(Filter { id, args })
}
