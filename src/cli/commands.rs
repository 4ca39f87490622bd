//! CLI commands
//!
//! Each command renders its output as a string; `main` prints it.

use clap::Subcommand;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use tracing::debug;

use crate::core::{Config, Result};
use crate::planning::{Language, PlanningResponse, PromptBuilder, TimeZoneInfo};

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the planning prompt
    Prompt {
        /// Thought language; defaults to config, then the system timezone
        #[arg(long, short = 'l')]
        language: Option<Language>,
        /// Task to append after the user instruction heading
        #[arg(long, short = 'i')]
        instruction: Option<String>,
    },
    /// Strip reflection from model output read from FILE or stdin
    Summary {
        file: Option<PathBuf>,
        /// Also print the parsed actions as JSON
        #[arg(long)]
        actions: bool,
    },
    /// Show the resolved timezone and the language it selects
    Timezone,
    /// Show the effective configuration
    Config {
        /// Write it to the config file
        #[arg(long)]
        save: bool,
    },
}

/// Execute a command against the effective configuration
pub fn run_command(command: Command, config: &Config) -> Result<String> {
    match command {
        Command::Prompt {
            language,
            instruction,
        } => {
            let builder = match language {
                Some(language) => PromptBuilder::new(language),
                None => PromptBuilder::from_config(&config.planning),
            };
            Ok(match instruction {
                Some(task) => builder.instruction_prompt(&task),
                None => builder.planning_prompt(),
            })
        }

        Command::Summary { file, actions } => {
            let raw = match file {
                Some(path) => fs::read_to_string(path)?,
                None => {
                    let mut buf = String::new();
                    io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };
            render_summary(&raw, actions, config.planning.debug)
        }

        Command::Timezone => {
            let info = TimeZoneInfo::current();
            Ok(format!(
                "Timezone: {}\nOffset:   {}\nLanguage: {}",
                info.name.as_deref().unwrap_or("unknown"),
                info.timezone,
                info.language()
            ))
        }

        Command::Config { save } => {
            let mut output = config.to_toml()?;
            if save {
                let path = config.save()?;
                output.push_str(&format!("\n# Saved to {}", path.display()));
            }
            Ok(output)
        }
    }
}

fn render_summary(raw: &str, with_actions: bool, log_raw: bool) -> Result<String> {
    if log_raw {
        debug!(bytes = raw.len(), raw = %raw, "Raw model output");
    }

    if !with_actions {
        return Ok(crate::planning::get_summary(raw));
    }

    let response = PlanningResponse::parse(raw)?;
    let actions = serde_json::to_string_pretty(&response.actions)?;
    Ok(format!("{}\n\n{}", response.summary, actions))
}
