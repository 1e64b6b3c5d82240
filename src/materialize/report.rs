//! Per-stage outcome of a materialization

use std::fmt;

/// Named steps of materialization, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    CreateDirectories,
    GenerateConfig,
    CopySshdConfig,
    CopyLicense,
}

impl Stage {
    /// Execution order. The sshd copy precedes the license copy.
    pub const PIPELINE: [Stage; 4] = [
        Stage::CreateDirectories,
        Stage::GenerateConfig,
        Stage::CopySshdConfig,
        Stage::CopyLicense,
    ];
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::CreateDirectories => write!(f, "create-directories"),
            Stage::GenerateConfig => write!(f, "generate-config"),
            Stage::CopySshdConfig => write!(f, "copy-sshd-config"),
            Stage::CopyLicense => write!(f, "copy-license"),
        }
    }
}

/// What happened in one stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    Done,
    /// Nothing to do
    Skipped { reason: String },
    /// Failed without aborting; the node runs with a possibly incomplete setup
    Degraded { message: String },
}

/// A non-fatal problem found during materialization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub stage: Stage,
    pub message: String,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.stage, self.message)
    }
}

/// Result of a successful materialization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// Short name of the node
    pub node: String,
    pub stages: Vec<(Stage, StageOutcome)>,
}

impl Report {
    pub fn new(node: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            stages: Vec::with_capacity(Stage::PIPELINE.len()),
        }
    }

    pub fn record(&mut self, stage: Stage, outcome: StageOutcome) {
        self.stages.push((stage, outcome));
    }

    /// Outcome of a stage, if it ran
    pub fn outcome(&self, stage: Stage) -> Option<&StageOutcome> {
        self.stages
            .iter()
            .find(|(s, _)| *s == stage)
            .map(|(_, o)| o)
    }

    /// All degraded stages as warnings
    pub fn warnings(&self) -> Vec<Warning> {
        self.stages
            .iter()
            .filter_map(|(stage, outcome)| match outcome {
                StageOutcome::Degraded { message } => Some(Warning {
                    stage: *stage,
                    message: message.clone(),
                }),
                _ => None,
            })
            .collect()
    }

    /// True if any stage degraded
    pub fn is_degraded(&self) -> bool {
        self.stages
            .iter()
            .any(|(_, o)| matches!(o, StageOutcome::Degraded { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sshd_copy_precedes_license_copy() {
        let pos = |stage: Stage| Stage::PIPELINE.iter().position(|s| *s == stage).unwrap();
        assert!(pos(Stage::CreateDirectories) < pos(Stage::GenerateConfig));
        assert!(pos(Stage::CopySshdConfig) < pos(Stage::CopyLicense));
    }

    #[test]
    fn test_report_warnings() {
        let mut report = Report::new("node1");
        report.record(Stage::CreateDirectories, StageOutcome::Done);
        report.record(
            Stage::GenerateConfig,
            StageOutcome::Degraded {
                message: "template missing".to_string(),
            },
        );

        assert!(report.is_degraded());
        let warnings = report.warnings();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].to_string(), "generate-config: template missing");
        assert_eq!(report.outcome(Stage::CreateDirectories), Some(&StageOutcome::Done));
        assert_eq!(report.outcome(Stage::CopyLicense), None);
    }
}
