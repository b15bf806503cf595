//! Sub-template loading for the `include` tag (spec §5's include
//! semantics). The original reopens a file with `fopen`/`file_read_all`
//! and recurses the whole pipeline over its contents (`fluid.c`); here
//! that collaborator is abstracted behind a trait so the Preprocessor
//! can be tested against an in-memory map instead of the filesystem.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::FluidError;

/// Resolves an `include` operand (a bare template name) to its source
/// text. Implementations decide how the name maps to storage.
pub trait IncludeLoader {
    fn load(&self, name: &str) -> Result<String, FluidError>;
}

/// Loads includes from a directory on disk, appending a `.liquid`
/// extension the same way the original's CLI driver treats its single
/// command-line template argument as a bare path.
pub struct FilesystemIncludeLoader {
    root: PathBuf,
}

impl FilesystemIncludeLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, name: &str) -> PathBuf {
        let mut path: PathBuf = self.root.join(name);
        if path.extension().is_none() {
            path.set_extension("liquid");
        }
        path
    }
}

impl IncludeLoader for FilesystemIncludeLoader {
    fn load(&self, name: &str) -> Result<String, FluidError> {
        let path = self.resolve(name);
        fs::read_to_string(&path).map_err(|_| FluidError::FileNotFound { path })
    }
}

/// An in-memory loader for unit and CLI tests, keyed by template name.
#[derive(Debug, Default, Clone)]
pub struct MapIncludeLoader {
    templates: HashMap<String, String>,
}

impl MapIncludeLoader {
    pub fn new() -> Self {
        Self {
            templates: HashMap::new(),
        }
    }

    pub fn with(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.templates.insert(name.into(), source.into());
        self
    }
}

impl IncludeLoader for MapIncludeLoader {
    fn load(&self, name: &str) -> Result<String, FluidError> {
        self.templates
            .get(name)
            .cloned()
            .ok_or_else(|| FluidError::FileNotFound {
                path: Path::new(name).to_path_buf(),
            })
    }
}
