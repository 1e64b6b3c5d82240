//! Kind-keyed registry of default templates

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::builtin;

/// Errors that can occur during template registry operations
#[derive(Debug, Error)]
pub enum TemplateError {
    /// No templates registered for a kind
    #[error("no templates registered for kind: {kind}")]
    NotFound { kind: String },

    /// Duplicate registration for a kind
    #[error("duplicate template registration for kind: {kind}")]
    Duplicate { kind: String },

    /// Error writing a built-in template to disk
    #[error("error installing template {path}: {source}")]
    Install {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Templates and defaults for one node kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindTemplates {
    /// Node kind these templates apply to
    pub kind: String,
    /// Default startup config template, used when the user gives no override
    pub startup_config: PathBuf,
    /// SSH daemon config copied into every node of this kind
    pub sshd_config: PathBuf,
    /// Image used when neither node, kind nor defaults name one
    pub default_image: Option<String>,
}

impl KindTemplates {
    /// Templates for `kind` laid out as `<root>/<kind>/<file>`
    pub fn under_root(kind: impl Into<String>, root: &Path) -> Self {
        let kind = kind.into();
        let dir = root.join(&kind);
        Self {
            startup_config: dir.join(builtin::STARTUP_CONFIG_FILE),
            sshd_config: dir.join(builtin::SSHD_CONFIG_FILE),
            default_image: None,
            kind,
        }
    }

    /// Set the fallback image
    pub fn with_default_image(mut self, image: impl Into<String>) -> Self {
        self.default_image = Some(image.into());
        self
    }
}

/// Read-only lookup of per-kind templates.
///
/// Built once at start-up and shared by reference between nodes.
#[derive(Debug, Default)]
pub struct TemplateRegistry {
    kinds: HashMap<String, KindTemplates>,
}

impl TemplateRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in kind registered below `root`
    pub fn builtin(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let mut registry = Self::new();
        for templates in builtin::kinds(&root) {
            // kinds() yields each kind once
            registry.kinds.insert(templates.kind.clone(), templates);
        }
        registry
    }

    /// Register templates for a kind
    pub fn register(&mut self, templates: KindTemplates) -> Result<(), TemplateError> {
        if self.kinds.contains_key(&templates.kind) {
            return Err(TemplateError::Duplicate {
                kind: templates.kind,
            });
        }
        self.kinds.insert(templates.kind.clone(), templates);
        Ok(())
    }

    /// Get the templates of a kind
    pub fn get(&self, kind: &str) -> Option<&KindTemplates> {
        self.kinds.get(kind)
    }

    /// Get the templates of a kind, failing for unknown kinds
    pub fn lookup(&self, kind: &str) -> Result<&KindTemplates, TemplateError> {
        self.get(kind).ok_or_else(|| TemplateError::NotFound {
            kind: kind.to_string(),
        })
    }

    /// Get all registered kinds
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.kinds.keys().map(|s| s.as_str())
    }
}
