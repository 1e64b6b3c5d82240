//! Error types for materialization

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::node::NodeState;
use crate::template::TemplateError;

use super::Stage;

/// Fatal errors that abort a node's materialization
#[derive(Debug, Error)]
pub enum MaterializeError {
    /// Materialization needs a resolved node
    #[error("node {node} is {state}, only resolved nodes can be materialized")]
    NotResolved { node: String, state: NodeState },

    #[error("node {node} has no lab directory")]
    MissingLabDir { node: String },

    /// No templates for the node's kind
    #[error("node {node}: {source}")]
    UnknownKind {
        node: String,
        #[source]
        source: TemplateError,
    },

    /// A stage was about to run on a tree it does not expect
    #[error("stage {stage} cannot run: {reason}")]
    Precondition { stage: Stage, reason: String },

    #[error("failed to create directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("file copy [src {src} -> dst {dst}] failed: {source}")]
    FileCopy {
        stage: Stage,
        src: PathBuf,
        dst: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl MaterializeError {
    /// Stage the error belongs to, if it was raised by one
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Precondition { stage, .. } | Self::FileCopy { stage, .. } => Some(*stage),
            Self::CreateDirectory { .. } => Some(Stage::CreateDirectories),
            _ => None,
        }
    }
}
