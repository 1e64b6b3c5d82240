//! Lab directory materialization
//!
//! Turns a resolved [`Node`] into the tree its container mounts:
//!
//! ```text
//! <LabDir>/config/juniper.conf    rendered startup config
//! <LabDir>/config/sshd_config     copied from the kind's templates
//! <LabDir>/config/license.conf    copied, only with a license
//! <LabDir>/log/                   empty
//! ```
//!
//! Work happens in the fixed [`Stage::PIPELINE`] order. Every stage checks
//! its precondition before running, so a reordering shows up as a
//! [`MaterializeError::Precondition`] instead of a confusing I/O error.
//! Config generation is the only stage allowed to fail softly; its failure
//! lands in the returned [`Report`].

mod error;
pub mod files;
mod report;

pub use error::MaterializeError;
pub use report::{Report, Stage, StageOutcome, Warning};

use std::path::Path;

use tracing::{debug, info, instrument, warn};

use crate::node::{Node, NodeLayout, NodeState};
use crate::template::{generate_config, Generated, KindTemplates, TemplateRegistry};

use files::DIR_MODE;

/// Populate the node's lab directory.
///
/// Runs on nodes that are [`NodeState::Resolved`], or already
/// [`NodeState::Materialized`]: running twice yields the same file set and
/// outcome. On success the node becomes `Materialized`.
#[instrument(skip_all, fields(node = %node.short_name), err)]
pub fn materialize(
    node: &mut Node,
    registry: &TemplateRegistry,
) -> Result<Report, MaterializeError> {
    if !matches!(node.state, NodeState::Resolved | NodeState::Materialized) {
        return Err(MaterializeError::NotResolved {
            node: node.short_name.clone(),
            state: node.state,
        });
    }
    let layout = node.layout().ok_or_else(|| MaterializeError::MissingLabDir {
        node: node.short_name.clone(),
    })?;
    let templates = registry
        .lookup(&node.kind)
        .map_err(|source| MaterializeError::UnknownKind {
            node: node.short_name.clone(),
            source,
        })?;

    let mut report = Report::new(node.short_name.clone());
    for stage in Stage::PIPELINE {
        check_precondition(stage, &layout)?;
        let outcome = run_stage(stage, node, templates, &layout)?;
        if let StageOutcome::Degraded { message } = &outcome {
            warn!(%stage, "{}", message);
        }
        report.record(stage, outcome);
    }

    node.state = NodeState::Materialized;
    info!(
        lab_dir = %layout.lab_dir().display(),
        degraded = report.is_degraded(),
        "node files created"
    );
    Ok(report)
}

fn check_precondition(stage: Stage, layout: &NodeLayout) -> Result<(), MaterializeError> {
    let failed = |reason: String| -> Result<(), MaterializeError> {
        Err(MaterializeError::Precondition { stage, reason })
    };

    match stage {
        Stage::CreateDirectories => {
            if !layout.lab_dir().is_absolute() {
                return failed(format!(
                    "lab directory {} is not absolute",
                    layout.lab_dir().display()
                ));
            }
        }
        Stage::GenerateConfig | Stage::CopySshdConfig | Stage::CopyLicense => {
            let config_dir = layout.config_dir();
            if !config_dir.is_dir() {
                return failed(format!(
                    "config directory {} does not exist",
                    config_dir.display()
                ));
            }
        }
    }
    Ok(())
}

fn run_stage(
    stage: Stage,
    node: &Node,
    templates: &KindTemplates,
    layout: &NodeLayout,
) -> Result<StageOutcome, MaterializeError> {
    match stage {
        Stage::CreateDirectories => {
            for dir in [layout.config_dir(), layout.log_dir()] {
                files::create_dir(&dir, DIR_MODE).map_err(|source| {
                    MaterializeError::CreateDirectory {
                        path: dir.clone(),
                        source,
                    }
                })?;
            }
            Ok(StageOutcome::Done)
        }
        Stage::GenerateConfig => {
            let dst = layout.startup_config();
            Ok(
                match generate_config(node, &dst, &templates.startup_config) {
                    Ok(Generated::Rendered { .. }) => StageOutcome::Done,
                    Ok(Generated::Kept) => StageOutcome::Skipped {
                        reason: format!("{} already exists", dst.display()),
                    },
                    Err(e) => StageOutcome::Degraded {
                        message: e.to_string(),
                    },
                },
            )
        }
        Stage::CopySshdConfig => copy(stage, &templates.sshd_config, &layout.sshd_config()),
        Stage::CopyLicense => match &node.license {
            Some(license) => copy(stage, license, &layout.license()),
            None => Ok(StageOutcome::Skipped {
                reason: "no license configured".to_string(),
            }),
        },
    }
}

fn copy(stage: Stage, src: &Path, dst: &Path) -> Result<StageOutcome, MaterializeError> {
    let bytes = files::copy_file(src, dst).map_err(|source| MaterializeError::FileCopy {
        stage,
        src: src.to_path_buf(),
        dst: dst.to_path_buf(),
        source,
    })?;
    debug!(src = %src.display(), dst = %dst.display(), bytes, "file copy succeeded");
    Ok(StageOutcome::Done)
}
