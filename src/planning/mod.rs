//! Planning module - the UI-TARS planning protocol
//!
//! Prompt construction, action grammar and response parsing.

pub mod action;
pub mod prompt;
pub mod summary;

pub use action::{parse_action, Action, ActionKind, BoundingBox, ScrollDirection, WAIT_DURATION};
pub use prompt::{resolve_timezone, Language, PromptBuilder, TimeZoneInfo};
pub use summary::{get_summary, PlanningResponse};
