//! Action space of the planning model
//!
//! Each verb the model may emit, the literal signature line shown to it in the
//! prompt, and a parser for the call expressions it writes back.

use serde::Serialize;
use std::str::FromStr;
use std::time::Duration;

use crate::core::{HarnessError, Result};

/// Fixed pause behind the `wait()` verb
pub const WAIT_DURATION: Duration = Duration::from_secs(5);

/// The verbs of the action space, in prompt order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Click,
    LeftDouble,
    RightSingle,
    Drag,
    Hotkey,
    Type,
    Scroll,
    Wait,
    Finished,
    CallUser,
}

impl ActionKind {
    pub const ALL: [ActionKind; 10] = [
        ActionKind::Click,
        ActionKind::LeftDouble,
        ActionKind::RightSingle,
        ActionKind::Drag,
        ActionKind::Hotkey,
        ActionKind::Type,
        ActionKind::Scroll,
        ActionKind::Wait,
        ActionKind::Finished,
        ActionKind::CallUser,
    ];

    /// Verb as written by the model
    pub fn name(&self) -> &'static str {
        match self {
            ActionKind::Click => "click",
            ActionKind::LeftDouble => "left_double",
            ActionKind::RightSingle => "right_single",
            ActionKind::Drag => "drag",
            ActionKind::Hotkey => "hotkey",
            ActionKind::Type => "type",
            ActionKind::Scroll => "scroll",
            ActionKind::Wait => "wait",
            ActionKind::Finished => "finished",
            ActionKind::CallUser => "call_user",
        }
    }

    /// Exact line of the `## Action Space` section
    pub fn prompt_line(&self) -> &'static str {
        match self {
            ActionKind::Click => "click(start_box='[x1, y1, x2, y2]')",
            ActionKind::LeftDouble => "left_double(start_box='[x1, y1, x2, y2]')",
            ActionKind::RightSingle => "right_single(start_box='[x1, y1, x2, y2]')",
            ActionKind::Drag => {
                "drag(start_box='[x1, y1, x2, y2]', end_box='[x3, y3, x4, y4]')"
            }
            ActionKind::Hotkey => "hotkey(key='')",
            ActionKind::Type => {
                r#"type(content='') #If you want to submit your input, use "\n" at the end of `content`."#
            }
            ActionKind::Scroll => {
                "scroll(start_box='[x1, y1, x2, y2]', direction='down or up or right or left')"
            }
            ActionKind::Wait => {
                "wait() #Sleep for 5s and take a screenshot to check for any changes."
            }
            ActionKind::Finished => "finished()",
            ActionKind::CallUser => {
                "call_user() # Submit the task and call the user when the task is unsolvable, or when you need the user's help."
            }
        }
    }

    /// Terminal signals end the planning loop
    pub fn is_terminal(&self) -> bool {
        matches!(self, ActionKind::Finished | ActionKind::CallUser)
    }
}

impl FromStr for ActionKind {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self> {
        ActionKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| HarnessError::action_parse(s, "unknown action verb"))
    }
}

/// Screen region `[x1, y1, x2, y2]` in model coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl BoundingBox {
    pub fn center(&self) -> (f64, f64) {
        ((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }
}

impl FromStr for BoundingBox {
    type Err = HarnessError;

    /// Accepts `[x1, y1, x2, y2]`, `(x1,y1,x2,y2)` or a bare point `(x, y)`
    fn from_str(s: &str) -> Result<Self> {
        let inner = s
            .trim()
            .trim_start_matches(['[', '('])
            .trim_end_matches([']', ')']);

        let numbers = inner
            .split(',')
            .map(|part| part.trim().parse::<f64>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| HarnessError::action_parse(s, format!("bad coordinate: {}", e)))?;

        match numbers.as_slice() {
            [x1, y1, x2, y2] => Ok(Self {
                x1: *x1,
                y1: *y1,
                x2: *x2,
                y2: *y2,
            }),
            [x, y] => Ok(Self {
                x1: *x,
                y1: *y,
                x2: *x,
                y2: *y,
            }),
            _ => Err(HarnessError::action_parse(
                s,
                format!("expected 2 or 4 coordinates, got {}", numbers.len()),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollDirection {
    Up,
    Down,
    Left,
    Right,
}

impl FromStr for ScrollDirection {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "up" => Ok(ScrollDirection::Up),
            "down" => Ok(ScrollDirection::Down),
            "left" => Ok(ScrollDirection::Left),
            "right" => Ok(ScrollDirection::Right),
            _ => Err(HarnessError::action_parse(s, "direction must be up, down, left or right")),
        }
    }
}

/// One parsed GUI action
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action_type", rename_all = "snake_case")]
pub enum Action {
    Click { start_box: BoundingBox },
    LeftDouble { start_box: BoundingBox },
    RightSingle { start_box: BoundingBox },
    Drag { start_box: BoundingBox, end_box: BoundingBox },
    Hotkey { key: String },
    Type { content: String },
    Scroll { start_box: BoundingBox, direction: ScrollDirection },
    Wait,
    Finished,
    CallUser,
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Click { .. } => ActionKind::Click,
            Action::LeftDouble { .. } => ActionKind::LeftDouble,
            Action::RightSingle { .. } => ActionKind::RightSingle,
            Action::Drag { .. } => ActionKind::Drag,
            Action::Hotkey { .. } => ActionKind::Hotkey,
            Action::Type { .. } => ActionKind::Type,
            Action::Scroll { .. } => ActionKind::Scroll,
            Action::Wait => ActionKind::Wait,
            Action::Finished => ActionKind::Finished,
            Action::CallUser => ActionKind::CallUser,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.kind().is_terminal()
    }

    /// How long the agent should pause, for `wait()`
    pub fn pause(&self) -> Option<Duration> {
        matches!(self, Action::Wait).then_some(WAIT_DURATION)
    }

    /// Whether typed content ends with a submit newline
    pub fn submits(&self) -> bool {
        match self {
            Action::Type { content } => content.ends_with('\n') || content.ends_with("\\n"),
            _ => false,
        }
    }

    /// Typed content without the trailing submit newline
    pub fn text(&self) -> Option<&str> {
        match self {
            Action::Type { content } => Some(
                content
                    .strip_suffix("\\n")
                    .or_else(|| content.strip_suffix('\n'))
                    .unwrap_or(content),
            ),
            _ => None,
        }
    }
}

impl FromStr for Action {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self> {
        parse_action(s)
    }
}

/// Parse a call expression such as `click(start_box='[10, 20, 30, 40]')`
pub fn parse_action(text: &str) -> Result<Action> {
    let text = text.trim();

    let open = text
        .find('(')
        .ok_or_else(|| HarnessError::action_parse(text, "missing '('"))?;
    let body = text[open + 1..]
        .strip_suffix(')')
        .ok_or_else(|| HarnessError::action_parse(text, "missing closing ')'"))?;

    let kind: ActionKind = text[..open].trim().parse()?;
    let args = Arguments::parse(text, body)?;

    let action = match kind {
        ActionKind::Click => Action::Click {
            start_box: args.bounding_box("start_box")?,
        },
        ActionKind::LeftDouble => Action::LeftDouble {
            start_box: args.bounding_box("start_box")?,
        },
        ActionKind::RightSingle => Action::RightSingle {
            start_box: args.bounding_box("start_box")?,
        },
        ActionKind::Drag => Action::Drag {
            start_box: args.bounding_box("start_box")?,
            end_box: args.bounding_box("end_box")?,
        },
        ActionKind::Hotkey => Action::Hotkey {
            key: args.required("key")?.to_string(),
        },
        ActionKind::Type => Action::Type {
            content: args.required("content")?.to_string(),
        },
        ActionKind::Scroll => Action::Scroll {
            start_box: args.bounding_box("start_box")?,
            direction: args.required("direction")?.parse()?,
        },
        ActionKind::Wait => Action::Wait,
        ActionKind::Finished => Action::Finished,
        ActionKind::CallUser => Action::CallUser,
    };

    Ok(action)
}

/// Keyword arguments of one call
struct Arguments<'a> {
    source: &'a str,
    pairs: Vec<(String, String)>,
}

impl<'a> Arguments<'a> {
    fn parse(source: &'a str, body: &str) -> Result<Self> {
        let mut pairs = Vec::new();
        let mut rest = body.trim_start();

        while !rest.is_empty() {
            let eq = rest
                .find('=')
                .ok_or_else(|| HarnessError::action_parse(source, "expected key='value'"))?;
            let key = rest[..eq].trim().to_string();
            let after = rest[eq + 1..].trim_start();

            let quote = after
                .chars()
                .next()
                .filter(|c| *c == '\'' || *c == '"')
                .ok_or_else(|| HarnessError::action_parse(source, format!("unquoted value for {}", key)))?;

            let (value, consumed) = read_quoted(&after[1..], quote)
                .ok_or_else(|| HarnessError::action_parse(source, format!("unterminated value for {}", key)))?;

            pairs.push((key, value));
            rest = after[1 + consumed..].trim_start();
            rest = rest.strip_prefix(',').unwrap_or(rest).trim_start();
        }

        Ok(Self { source, pairs })
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn required(&self, key: &str) -> Result<&str> {
        self.get(key)
            .ok_or_else(|| HarnessError::action_parse(self.source, format!("missing {}", key)))
    }

    fn bounding_box(&self, key: &str) -> Result<BoundingBox> {
        self.required(key)?.parse()
    }
}

/// Read up to the closing quote; returns the value and bytes consumed
/// including the closing quote. Only escaped quotes are unescaped so that a
/// literal `\n` survives as the submit marker.
fn read_quoted(input: &str, quote: char) -> Option<(String, usize)> {
    let mut value = String::new();
    let mut chars = input.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if c == '\\' {
            if let Some(&(_, next)) = chars.peek() {
                if next == quote {
                    value.push(next);
                    chars.next();
                    continue;
                }
            }
            value.push(c);
        } else if c == quote {
            return Some((value, i + c.len_utf8()));
        } else {
            value.push(c);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_click() {
        let action = parse_action("click(start_box='[10, 20, 30, 40]')").unwrap();
        assert_eq!(
            action,
            Action::Click {
                start_box: BoundingBox {
                    x1: 10.0,
                    y1: 20.0,
                    x2: 30.0,
                    y2: 40.0
                }
            }
        );
        if let Action::Click { start_box } = action {
            assert_eq!(start_box.center(), (20.0, 30.0));
        }
    }

    #[test]
    fn test_parse_point_widens_to_box() {
        let action = parse_action("left_double(start_box='(100,200)')").unwrap();
        let Action::LeftDouble { start_box } = action else {
            panic!("expected left_double");
        };
        assert_eq!(start_box.x1, start_box.x2);
        assert_eq!(start_box.center(), (100.0, 200.0));
    }

    #[test]
    fn test_parse_drag_and_scroll() {
        let drag =
            parse_action("drag(start_box='[1, 2, 3, 4]', end_box='[5, 6, 7, 8]')").unwrap();
        assert_eq!(drag.kind(), ActionKind::Drag);

        let scroll =
            parse_action("scroll(start_box='[0, 0, 10, 10]', direction='down')").unwrap();
        assert!(matches!(
            scroll,
            Action::Scroll {
                direction: ScrollDirection::Down,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_type_submit() {
        let action = parse_action(r"type(content='hello world\n')").unwrap();
        assert!(action.submits());
        assert_eq!(action.text(), Some("hello world"));

        let action = parse_action(r"type(content='it\'s fine')").unwrap();
        assert!(!action.submits());
        assert_eq!(action.text(), Some("it's fine"));
    }

    #[test]
    fn test_parse_value_with_comma_and_paren() {
        let action = parse_action("type(content='a, b (c)')").unwrap();
        assert_eq!(action.text(), Some("a, b (c)"));
    }

    #[test]
    fn test_parse_terminal_and_wait() {
        assert!(parse_action("finished()").unwrap().is_terminal());
        assert!(parse_action("call_user()").unwrap().is_terminal());

        let wait = parse_action("wait()").unwrap();
        assert!(!wait.is_terminal());
        assert_eq!(wait.pause(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            parse_action("teleport(to='moon')"),
            Err(HarnessError::ActionParse { .. })
        ));
        assert!(parse_action("click").is_err());
        assert!(parse_action("click(start_box='[1, 2, 3]')").is_err());
        assert!(parse_action("hotkey()").is_err());
        assert!(parse_action("scroll(start_box='[1, 2, 3, 4]', direction='sideways')").is_err());
        assert!(parse_action("hotkey(key='ctrl c)").is_err());
    }

    #[test]
    fn test_prompt_lines_start_with_verb() {
        for kind in ActionKind::ALL {
            assert!(kind.prompt_line().starts_with(&format!("{}(", kind.name())));
            assert_eq!(kind.name().parse::<ActionKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_action_serializes_with_tag() {
        let json = serde_json::to_value(Action::Hotkey {
            key: "enter".to_string(),
        })
        .unwrap();
        assert_eq!(json["action_type"], "hotkey");
        assert_eq!(json["key"], "enter");
    }
}
