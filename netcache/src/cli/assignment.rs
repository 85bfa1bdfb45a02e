//! `KEY=VALUE` pairs, used for static rules and backend seeds.

use std::fs;
use std::num::ParseIntError;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use netcache_common::{Key, Value};
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Assignment {
    pub key: Key,
    pub value: Value,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("expected KEY=VALUE, got {0:?}")]
    MissingSeparator(String),
    #[error("invalid key {0:?}: {1}")]
    InvalidKey(String, ParseIntError),
    #[error("invalid value {0:?}: {1}")]
    InvalidValue(String, ParseIntError),
    #[error("line {line}: {reason}")]
    Line { line: usize, reason: Box<ConfigError> },
}

impl FromStr for Assignment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, value) = s
            .split_once('=')
            .ok_or_else(|| ConfigError::MissingSeparator(s.to_string()))?;
        let (key, value) = (key.trim(), value.trim());
        Ok(Assignment {
            key: key
                .parse()
                .map_err(|err| ConfigError::InvalidKey(key.to_string(), err))?,
            value: value
                .parse()
                .map_err(|err| ConfigError::InvalidValue(value.to_string(), err))?,
        })
    }
}

impl From<Assignment> for (Key, Value) {
    fn from(assignment: Assignment) -> Self {
        (assignment.key, assignment.value)
    }
}

/// clap value parser for `KEY=VALUE` arguments.
pub fn parse_assignment(s: &str) -> Result<Assignment, ConfigError> {
    s.parse()
}

/// One assignment per line. Blank lines and `#` comments are skipped.
pub fn parse_rules(text: &str) -> Result<Vec<Assignment>, ConfigError> {
    text.lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line.split('#').next().unwrap_or("").trim()))
        .filter(|(_, line)| !line.is_empty())
        .map(|(line, content)| {
            content.parse().map_err(|reason| ConfigError::Line {
                line,
                reason: Box::new(reason),
            })
        })
        .collect()
}

pub fn load_rules_file(path: &Path) -> Result<Vec<Assignment>> {
    let text = fs::read_to_string(path)
        .context(format!("Failed to read rules file {}", path.display()))?;
    parse_rules(&text).context(format!("Invalid rules file {}", path.display()))
}
