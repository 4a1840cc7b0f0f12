//! Template sources

use std::collections::HashMap;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("template not found: {name}")]
    NotFound { name: String },

    #[error("error reading template file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Resolves a template name to its source text
pub trait TemplateLoader: Send + Sync {
    fn load(&self, name: &str) -> Result<String, LoadError>;
}

/// Templates held in memory, keyed by name
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    templates: HashMap<String, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_template(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.insert(name, source);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, source: impl Into<String>) {
        self.templates.insert(name.into(), source.into());
    }
}

impl TemplateLoader for MemoryLoader {
    fn load(&self, name: &str) -> Result<String, LoadError> {
        self.templates
            .get(name)
            .cloned()
            .ok_or_else(|| LoadError::NotFound {
                name: name.to_string(),
            })
    }
}

/// Templates read from files below a base directory
#[derive(Debug, Clone)]
pub struct FileLoader {
    base: PathBuf,
}

impl FileLoader {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Resolve a template name to a path
    pub fn resolve_path(&self, name: &str) -> PathBuf {
        self.base.join(name)
    }
}

impl TemplateLoader for FileLoader {
    fn load(&self, name: &str) -> Result<String, LoadError> {
        let path = self.resolve_path(name);
        if !path.is_file() {
            return Err(LoadError::NotFound {
                name: name.to_string(),
            });
        }
        std::fs::read_to_string(&path).map_err(|source| LoadError::Io { path, source })
    }
}
