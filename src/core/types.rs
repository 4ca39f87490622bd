//! Shared types used across harness modules
//!
//! Contains agent records, test annotations, step records and call options.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Annotation kind holding the serialized agent dump of a test
pub const DUMP_ANNOTATION_TYPE: &str = "MIDSCENE_DUMP_ANNOTATION";

/// Construction parameters for one page-bound agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentRecord {
    /// `<driverTag>-<testId>-<pageId>`
    pub test_id: String,
    /// `<taskFile>(<taskTitle>)`
    pub cache_id: String,
    /// Innermost title of the test
    pub group_name: String,
    /// Enclosing titles joined with `" > "`
    pub group_description: String,
    /// Always false; reports are assembled by the outer reporter
    pub generate_report: bool,
}

/// Grouping metadata derived from a test's title hierarchy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskGroup {
    pub task_file: String,
    pub task_title: String,
}

impl TaskGroup {
    const UNNAMED: &'static str = "unnamed";

    /// Derive file and title from an outermost-first title path
    pub fn from_title_path(title_path: &[String]) -> Self {
        match title_path {
            [] => Self {
                task_file: Self::UNNAMED.to_string(),
                task_title: Self::UNNAMED.to_string(),
            },
            [only] => Self {
                task_file: only.clone(),
                task_title: only.clone(),
            },
            [outer @ .., last] => Self {
                task_file: outer.join(" > "),
                task_title: last.clone(),
            },
        }
    }

    /// Cache identifier used by the agent
    pub fn cache_id(&self) -> String {
        format!("{}({})", self.task_file, self.task_title)
    }
}

/// A `{type, description}` entry on a test record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Annotation {
    /// Create an annotation of the given kind
    pub fn new(kind: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            description: Some(description.into()),
        }
    }
}

/// Semantics of a generic `ai` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    #[default]
    Action,
    Query,
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionType::Action => write!(f, "action"),
            ActionType::Query => write!(f, "query"),
        }
    }
}

/// Options for the generic `ai` operation
#[derive(Debug, Clone, Copy, Default)]
pub struct AiOptions {
    /// Defaults to [`ActionType::Action`]
    pub kind: Option<ActionType>,
}

impl AiOptions {
    pub fn query() -> Self {
        Self {
            kind: Some(ActionType::Query),
        }
    }
}

/// Bounds for `aiWaitFor`, enforced by the agent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitForOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_interval_ms: Option<u64>,
}

/// How a test step ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "status", content = "error")]
pub enum StepOutcome {
    Passed,
    Failed(String),
}

/// A finished step recorded on the test
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub title: String,
    pub outcome: StepOutcome,
    pub duration: Duration,
}

impl StepRecord {
    pub fn passed(&self) -> bool {
        self.outcome == StepOutcome::Passed
    }
}
