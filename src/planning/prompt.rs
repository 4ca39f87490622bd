//! UI-TARS planning prompt
//!
//! The text produced here is the grammar a fine-tuned vision model was trained
//! on. Headings, the `Thought:`/`Action:` shape and every action signature must
//! stay byte-for-byte identical.

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

use crate::core::{HarnessError, PlanningConfig};
use crate::planning::action::ActionKind;

/// Timezone whose users get a Chinese `Thought` part
pub const CHINA_TIMEZONE: &str = "Asia/Shanghai";

/// Path segment preceding the zone name in a `TZ` file path
const ZONEINFO_DIR: &str = "zoneinfo/";

const PROMPT_HEADER: &str = concat!(
    "\nYou are a GUI agent. You are given a task and your action history, with screenshots. ",
    "You need to perform the next action to complete the task. \n",
    r#"
## Output Format
```
Thought: ...
Action: ...
```

## Action Space
"#
);

const USER_INSTRUCTION_HEADING: &str = "## User Instruction\n";

/// Language the model should think in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    Chinese,
    English,
}

impl Language {
    /// Chinese for `Asia/Shanghai`, English for anything else
    pub fn from_timezone(timezone: Option<&str>) -> Self {
        match timezone {
            Some(CHINA_TIMEZONE) => Language::Chinese,
            _ => Language::English,
        }
    }

    /// Resolve the language from the current system timezone.
    ///
    /// Recomputed on every call, so a long-running process picks up a changed
    /// `TZ` the next time a prompt builder is created.
    pub fn detect() -> Self {
        Self::from_timezone(resolve_timezone().as_deref())
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Language::Chinese => write!(f, "Chinese"),
            Language::English => write!(f, "English"),
        }
    }
}

impl FromStr for Language {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "chinese" | "zh" | "zh-cn" => Ok(Language::Chinese),
            "english" | "en" | "en-us" => Ok(Language::English),
            other => Err(HarnessError::config(format!("Unknown language: {}", other))),
        }
    }
}

/// IANA name of the host timezone.
///
/// `TZ` wins when set; otherwise the platform zone database is asked.
pub fn resolve_timezone() -> Option<String> {
    timezone_from(env::var("TZ").ok().as_deref(), || iana_time_zone::get_timezone().ok())
}

/// Zone name from a `TZ` value, falling back to `host` when it is unset or
/// blank. Accepts the POSIX `:` prefix and zoneinfo file paths.
fn timezone_from(tz_env: Option<&str>, host: impl FnOnce() -> Option<String>) -> Option<String> {
    let tz = tz_env.map(str::trim).unwrap_or_default();
    let tz = tz.strip_prefix(':').unwrap_or(tz);
    let tz = match tz.rfind(ZONEINFO_DIR) {
        Some(idx) => &tz[idx + ZONEINFO_DIR.len()..],
        None => tz,
    };
    if tz.is_empty() {
        host()
    } else {
        Some(tz.to_string())
    }
}

/// Snapshot of the host timezone
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeZoneInfo {
    /// Resolved IANA name, if any
    pub name: Option<String>,
    /// Current offset as `UTC+8`, `UTC-5`, `UTC+5.5`
    pub timezone: String,
    pub is_china: bool,
}

impl TimeZoneInfo {
    pub fn current() -> Self {
        let name = resolve_timezone();
        let offset_secs = chrono::Local::now().offset().local_minus_utc();
        Self {
            is_china: name.as_deref() == Some(CHINA_TIMEZONE),
            timezone: format_utc_offset(offset_secs),
            name,
        }
    }

    pub fn language(&self) -> Language {
        if self.is_china {
            Language::Chinese
        } else {
            Language::English
        }
    }
}

fn format_utc_offset(offset_secs: i32) -> String {
    let hours = offset_secs as f64 / 3600.0;
    let sign = if hours >= 0.0 { "+" } else { "" };
    format!("UTC{}{}", sign, hours)
}

/// Builds the planning prompt for one language
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    language: Language,
}

impl PromptBuilder {
    pub fn new(language: Language) -> Self {
        Self { language }
    }

    /// Use the configured language, or detect it from the timezone now
    pub fn from_config(config: &PlanningConfig) -> Self {
        Self::new(config.language.unwrap_or_else(Language::detect))
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// The complete planning prompt, ending with the user instruction heading
    pub fn planning_prompt(&self) -> String {
        let mut prompt = String::from(PROMPT_HEADER);

        for kind in ActionKind::ALL {
            prompt.push_str(kind.prompt_line());
            prompt.push('\n');
        }

        prompt.push_str("\n## Note\n");
        prompt.push_str(&format!("- Use {} in `Thought` part.\n", self.language));
        prompt.push_str("- Write a small plan and finally summarize your next action (with its target element) in one sentence in `Thought` part.\n");
        prompt.push('\n');
        prompt.push_str(USER_INSTRUCTION_HEADING);

        prompt
    }

    /// Planning prompt followed by the task
    pub fn instruction_prompt(&self, task: &str) -> String {
        let mut prompt = self.planning_prompt();
        prompt.push_str(task);
        prompt
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(Language::detect())
    }
}
