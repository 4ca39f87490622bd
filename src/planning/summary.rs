//! Model output parsing
//!
//! Strips the reflective part of a raw planning response and splits the rest
//! into thought and actions.

use serde::Serialize;

use crate::core::Result;
use crate::planning::action::{parse_action, Action};

const REFLECTION_MARKER: &str = "Reflection:";
const THOUGHT_MARKER: &str = "Thought:";
const ACTION_SUMMARY_MARKER: &str = "Action_Summary:";
const ACTION_MARKER: &str = "Action:";

/// Position of the earliest `Action_Summary:` or `Action:` in `text`
fn next_action_marker(text: &str) -> Option<usize> {
    [ACTION_SUMMARY_MARKER, ACTION_MARKER]
        .iter()
        .filter_map(|marker| text.find(marker))
        .min()
}

/// Remove every `Reflection:` segment and trim the result.
///
/// A segment runs from the marker up to the next `Action_Summary:` or
/// `Action:`, or to the end of the text. Text without the marker comes back
/// trimmed and otherwise untouched.
pub fn get_summary(prediction: &str) -> String {
    let mut summary = String::with_capacity(prediction.len());
    let mut rest = prediction;

    while let Some(start) = rest.find(REFLECTION_MARKER) {
        summary.push_str(&rest[..start]);
        let after = &rest[start + REFLECTION_MARKER.len()..];
        let end = next_action_marker(after).unwrap_or(after.len());
        rest = &after[end..];
    }
    summary.push_str(rest);

    summary.trim().to_string()
}

/// A planning response split into its parts
#[derive(Debug, Clone, Serialize)]
pub struct PlanningResponse {
    pub thought: Option<String>,
    pub reflection: Option<String>,
    pub action_summary: Option<String>,
    /// Raw text with reflection removed
    pub summary: String,
    pub actions: Vec<Action>,
}

impl PlanningResponse {
    /// Split raw model output. Fails only when an action line does not
    /// match the action grammar.
    pub fn parse(raw: &str) -> Result<Self> {
        let summary = get_summary(raw);
        let actions = match action_block(&summary) {
            Some(block) => block
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(parse_action)
                .collect::<Result<Vec<_>>>()?,
            None => Vec::new(),
        };

        Ok(Self {
            thought: segment(raw, THOUGHT_MARKER, &[REFLECTION_MARKER, ACTION_SUMMARY_MARKER, ACTION_MARKER]),
            reflection: segment(raw, REFLECTION_MARKER, &[ACTION_SUMMARY_MARKER, ACTION_MARKER]),
            action_summary: segment(raw, ACTION_SUMMARY_MARKER, &[ACTION_MARKER]),
            summary,
            actions,
        })
    }

    /// Whether the model signalled completion or asked for help
    pub fn is_terminal(&self) -> bool {
        self.actions.iter().any(Action::is_terminal)
    }
}

/// Text after the first line that opens with `Action:`. Markers inside
/// argument values are never at the start of a line.
fn action_block(summary: &str) -> Option<&str> {
    let mut offset = 0;
    for line in summary.split_inclusive('\n') {
        let trimmed = line.trim_start();
        if trimmed.starts_with(ACTION_MARKER) {
            let start = offset + (line.len() - trimmed.len()) + ACTION_MARKER.len();
            return Some(&summary[start..]);
        }
        offset += line.len();
    }
    None
}

/// Trimmed text after `marker` up to the first of `until`
fn segment(raw: &str, marker: &str, until: &[&str]) -> Option<String> {
    let start = raw.find(marker)? + marker.len();
    let body = &raw[start..];
    let end = until
        .iter()
        .filter_map(|m| body.find(m))
        .min()
        .unwrap_or(body.len());
    let text = body[..end].trim();
    (!text.is_empty()).then(|| text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planning::action::ActionKind;

    #[test]
    fn test_removes_reflection_before_action() {
        let raw = "Reflection: the last click missed.\nIt hit the header.\nAction: click(start_box='[1, 2, 3, 4]')";
        assert_eq!(get_summary(raw), "Action: click(start_box='[1, 2, 3, 4]')");
    }

    #[test]
    fn test_stops_at_first_following_marker() {
        let raw = "Thought: ok\nReflection: hmm\nAction_Summary: press the button\nAction: click(start_box='[1, 2, 3, 4]')";
        assert_eq!(
            get_summary(raw),
            "Thought: ok\nAction_Summary: press the button\nAction: click(start_box='[1, 2, 3, 4]')"
        );
    }

    #[test]
    fn test_reflection_without_action_runs_to_end() {
        assert_eq!(get_summary("Thought: done\nReflection: nothing more"), "Thought: done");
    }

    #[test]
    fn test_every_reflection_is_removed() {
        let raw = "Reflection: a\nAction: wait()\nReflection: b\nAction: finished()";
        let summary = get_summary(raw);
        assert_eq!(summary, "Action: wait()\nAction: finished()");
        assert!(!summary.contains("Reflection:"));
    }

    #[test]
    fn test_without_marker_returns_trimmed_input() {
        assert_eq!(get_summary("  Thought: go\nAction: finished()\n\n"), "Thought: go\nAction: finished()");
        assert_eq!(get_summary(""), "");
        assert_eq!(get_summary("no markers at all"), "no markers at all");
    }

    #[test]
    fn test_parse_response_parts() {
        let raw = "Thought: The search box is at the top.\nReflection: previous typing was lost\nAction_Summary: type the query\nAction: type(content='rust\\n')";
        let response = PlanningResponse::parse(raw).unwrap();
        assert_eq!(response.thought.as_deref(), Some("The search box is at the top."));
        assert_eq!(response.reflection.as_deref(), Some("previous typing was lost"));
        assert_eq!(response.action_summary.as_deref(), Some("type the query"));
        assert_eq!(response.actions.len(), 1);
        assert_eq!(response.actions[0].kind(), ActionKind::Type);
        assert!(response.actions[0].submits());
        assert!(!response.summary.contains("Reflection:"));
        assert!(!response.is_terminal());
    }

    #[test]
    fn test_parse_response_multiple_actions() {
        let raw = "Thought: drag then finish\nAction: drag(start_box='[0, 0, 1, 1]', end_box='[5, 5, 6, 6]')\nfinished()";
        let response = PlanningResponse::parse(raw).unwrap();
        assert_eq!(response.actions.len(), 2);
        assert!(response.is_terminal());
    }

    #[test]
    fn test_parse_response_without_action() {
        let response = PlanningResponse::parse("just talking").unwrap();
        assert!(response.actions.is_empty());
        assert!(response.thought.is_none());
        assert_eq!(response.summary, "just talking");
    }

    #[test]
    fn test_marker_inside_typed_content() {
        let raw = "Thought: fill the note field\nAction: type(content='Action: call mom')";
        let response = PlanningResponse::parse(raw).unwrap();
        assert_eq!(response.actions.len(), 1);
        assert_eq!(response.actions[0].text(), Some("Action: call mom"));
    }

    #[test]
    fn test_marker_inside_reflection_is_ignored() {
        let raw = "Thought: retry\nReflection: last time I wrote Action: wait()\nAction: hotkey(key='Action:')";
        let response = PlanningResponse::parse(raw).unwrap();
        assert_eq!(
            response.actions,
            vec![Action::Hotkey {
                key: "Action:".to_string()
            }]
        );
    }

    #[test]
    fn test_parse_response_bad_action() {
        assert!(PlanningResponse::parse("Thought: x\nAction: fly()").is_err());
    }
}
