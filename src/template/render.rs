//! Startup config generation

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tera::{Context, Tera};
use thiserror::Error;
use tracing::debug;

use crate::node::Node;

/// Errors that can occur while generating a node's startup config
#[derive(Debug, Error)]
pub enum ConfigGenerationError {
    /// The node was never given a config source
    #[error("node {node} has no startup config source")]
    NoSource { node: String },

    /// Node attributes could not be turned into a template context
    #[error("failed to build template context for node {node}: {source}")]
    Context {
        node: String,
        #[source]
        source: tera::Error,
    },

    /// Template file could not be read
    #[error("failed to read config template {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Template could not be rendered
    #[error("failed to render config template {path}: {}", render_chain(.source))]
    Render {
        path: PathBuf,
        #[source]
        source: tera::Error,
    },

    /// Rendered config could not be written
    #[error("failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// What `generate_config` did with the destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Generated {
    /// Template rendered and written
    Rendered { bytes: usize },
    /// Destination exists and the default template is in use; left alone
    Kept,
}

/// Render the node's config source into `dst`.
///
/// When `dst` already exists and the node uses the kind's default template,
/// the existing file wins so that changes made inside a running lab survive
/// a re-deploy. A user-supplied config is always re-rendered.
pub fn generate_config(
    node: &Node,
    dst: &Path,
    default_template: &Path,
) -> Result<Generated, ConfigGenerationError> {
    let source = node
        .config
        .as_deref()
        .ok_or_else(|| ConfigGenerationError::NoSource {
            node: node.short_name.clone(),
        })?;

    if dst.exists() && source == default_template {
        debug!(
            node = %node.short_name,
            path = %dst.display(),
            "config file already exists and will not be generated"
        );
        return Ok(Generated::Kept);
    }

    debug!(node = %node.short_name, template = %source.display(), "generating config");

    let template = fs::read_to_string(source).map_err(|e| ConfigGenerationError::Read {
        path: source.to_path_buf(),
        source: e,
    })?;

    let rendered = render(node, source, &template)?;

    fs::write(dst, &rendered).map_err(|e| ConfigGenerationError::Write {
        path: dst.to_path_buf(),
        source: e,
    })?;

    Ok(Generated::Rendered {
        bytes: rendered.len(),
    })
}

/// Render template text with the node's attributes as context
pub fn render(node: &Node, path: &Path, template: &str) -> Result<String, ConfigGenerationError> {
    let context = Context::from_serialize(node).map_err(|source| ConfigGenerationError::Context {
        node: node.short_name.clone(),
        source,
    })?;

    Tera::one_off(template, &context, false).map_err(|source| ConfigGenerationError::Render {
        path: path.to_path_buf(),
        source,
    })
}

/// tera keeps the useful part of a failure in the source chain
fn render_chain(err: &tera::Error) -> String {
    let mut parts = vec![err.to_string()];
    let mut cause = std::error::Error::source(err);
    while let Some(e) = cause {
        parts.push(e.to_string());
        cause = e.source();
    }
    parts.join(": ")
}
