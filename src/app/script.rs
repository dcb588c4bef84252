//! Line-oriented scripts that drive a [`Session`].
//!
//! ```text
//! # comments and blank lines are ignored
//! navigate top https://example.com/
//! frame ad top
//! navigate ad https://ads.example/1
//! back
//! settle
//! dump
//! ```

use super::session::Session;
use crate::frame::FrameTreeError;
use std::io::Write;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("Frame error: {0}")]
    Frame(#[from] FrameTreeError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Frame { name: String, parent: Option<String> },
    Remove { name: String },
    Navigate { frame: String, url: String },
    Fragment { frame: String, url: String },
    Push { frame: String, url: String, state: String },
    Replace { frame: String, url: String },
    Reload { frame: String },
    Back,
    Forward,
    Go(i64),
    GoTo(i64),
    Settle,
    Dump,
}

/// A parsed command and the 1-based line it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptLine {
    pub line: usize,
    pub command: Command,
}

pub fn parse_script(text: &str) -> Result<Vec<ScriptLine>, ScriptError> {
    let mut lines = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        // URLs carry fragments, so only a leading '#' starts a comment.
        if raw.trim_start().starts_with('#') {
            continue;
        }
        let words: Vec<&str> = raw.split_whitespace().collect();
        let Some((&name, args)) = words.split_first() else {
            continue;
        };

        let command = parse_command(name, args).map_err(|message| ScriptError::Parse { line, message })?;
        lines.push(ScriptLine { line, command });
    }

    Ok(lines)
}

fn parse_command(name: &str, args: &[&str]) -> Result<Command, String> {
    let arg = |i: usize, what: &str| -> Result<String, String> {
        args.get(i)
            .map(|s| s.to_string())
            .ok_or_else(|| format!("`{}` needs a {}", name, what))
    };
    let number = |what: &str| -> Result<i64, String> {
        let text = arg(0, what)?;
        text.parse()
            .map_err(|_| format!("`{}` expects an integer, got `{}`", name, text))
    };

    let (command, max_args) = match name {
        "frame" => (
            Command::Frame {
                name: arg(0, "frame name")?,
                parent: args.get(1).map(|s| s.to_string()),
            },
            2,
        ),
        "remove" => (
            Command::Remove {
                name: arg(0, "frame name")?,
            },
            1,
        ),
        "navigate" => (
            Command::Navigate {
                frame: arg(0, "frame name")?,
                url: arg(1, "URL")?,
            },
            2,
        ),
        "fragment" => (
            Command::Fragment {
                frame: arg(0, "frame name")?,
                url: arg(1, "URL")?,
            },
            2,
        ),
        // The state object may contain spaces; it takes the rest of the line.
        "push" => {
            arg(2, "state object")?;
            (
                Command::Push {
                    frame: arg(0, "frame name")?,
                    url: arg(1, "URL")?,
                    state: args[2..].join(" "),
                },
                args.len(),
            )
        }
        "replace" => (
            Command::Replace {
                frame: arg(0, "frame name")?,
                url: arg(1, "URL")?,
            },
            2,
        ),
        "reload" => (
            Command::Reload {
                frame: arg(0, "frame name")?,
            },
            1,
        ),
        "back" => (Command::Back, 0),
        "forward" => (Command::Forward, 0),
        "go" => (Command::Go(number("offset")?), 1),
        "goto" => (Command::GoTo(number("index")?), 1),
        "settle" => (Command::Settle, 0),
        "dump" => (Command::Dump, 0),
        other => return Err(format!("unknown command `{}`", other)),
    };

    if args.len() > max_args {
        return Err(format!("`{}` given too many arguments", name));
    }
    Ok(command)
}

/// Runs `script` against `session`, writing `dump` output to `out`.
pub fn run_script(session: &Session, script: &[ScriptLine], out: &mut dyn Write) -> Result<(), ScriptError> {
    let top = session
        .tree()
        .name(session.tree().top())
        .unwrap_or_default();

    for ScriptLine { line, command } in script {
        log::debug!("line {}: {:?}", line, command);
        match command {
            Command::Frame { name, parent } => {
                session.add_frame(parent.as_deref().unwrap_or(&top), name)?;
            }
            Command::Remove { name } => session.remove_frame(name)?,
            Command::Navigate { frame, url } => {
                session.navigate(frame, url)?;
            }
            Command::Fragment { frame, url } => {
                session.navigate_fragment(frame, url)?;
            }
            Command::Push { frame, url, state } => {
                session.push_state(frame, url, state)?;
            }
            Command::Replace { frame, url } => {
                session.replace_state(frame, url)?;
            }
            Command::Reload { frame } => session.reload(frame)?,
            Command::Back => report_ignored(session.back(), *line),
            Command::Forward => report_ignored(session.forward(), *line),
            Command::Go(offset) => report_ignored(session.go(*offset), *line),
            Command::GoTo(index) => report_ignored(session.go_to(*index), *line),
            Command::Settle => {
                let loads = session.settle();
                log::debug!("line {}: settled {} loads", line, loads);
            }
            Command::Dump => write!(out, "{}", session.describe())?,
        }
    }

    Ok(())
}

fn report_ignored(scheduled: bool, line: usize) {
    if !scheduled {
        log::info!("line {}: traversal out of range, ignored", line);
    }
}
