//! Startup configuration read from the environment

use crate::domain::{AssistantRoster, LevelLabels};
use crate::state_machine::state::DEFAULT_ALL_LABEL;
use crate::state_machine::IntakeContext;
use std::collections::HashSet;
use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_ASSISTANTS: &str = "Katerina,Avelina";
const DEFAULT_LEVEL_LABELS: &str = "1 — minor,2 — moderate,3 — serious";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("INTAKE_PORT is not a valid port: {0}")]
    InvalidPort(String),
    #[error("At least one assistant must be configured")]
    EmptyRoster,
    #[error("Assistant listed twice: {0}")]
    DuplicateAssistant(String),
    #[error("Assistant label collides with the all-assistants label: {0}")]
    AssistantIsAllLabel(String),
    #[error("Expected exactly 3 distinct level labels, got: {0:?}")]
    LevelLabels(Vec<String>),
    #[error("The all-assistants label cannot be empty")]
    EmptyAllLabel,
}

#[derive(Debug, Clone)]
pub struct IntakeConfig {
    pub db_path: PathBuf,
    pub port: u16,
    pub assistants: Vec<String>,
    pub level_labels: [String; 3],
    pub all_label: String,
}

impl IntakeConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup so tests need not touch the process env
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let db_path = lookup("INTAKE_DB_PATH").map_or_else(
            || {
                let home = lookup("HOME").unwrap_or_else(|| "/tmp".to_string());
                PathBuf::from(format!("{home}/.incident-intake/records.db"))
            },
            PathBuf::from,
        );

        let port = match lookup("INTAKE_PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort(raw.clone()))?,
            None => DEFAULT_PORT,
        };

        let assistants = split_list(
            &lookup("INTAKE_ASSISTANTS").unwrap_or_else(|| DEFAULT_ASSISTANTS.to_string()),
        );
        let levels = split_list(
            &lookup("INTAKE_LEVEL_LABELS").unwrap_or_else(|| DEFAULT_LEVEL_LABELS.to_string()),
        );
        let all_label = lookup("INTAKE_ALL_LABEL")
            .map_or_else(|| DEFAULT_ALL_LABEL.to_string(), |l| l.trim().to_string());

        let config = Self {
            db_path,
            port,
            assistants,
            level_labels: level_array(levels)?,
            all_label,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.all_label.is_empty() {
            return Err(ConfigError::EmptyAllLabel);
        }
        if self.assistants.is_empty() {
            return Err(ConfigError::EmptyRoster);
        }

        let mut seen = HashSet::new();
        for name in &self.assistants {
            if *name == self.all_label {
                return Err(ConfigError::AssistantIsAllLabel(name.clone()));
            }
            if !seen.insert(name.as_str()) {
                return Err(ConfigError::DuplicateAssistant(name.clone()));
            }
        }
        Ok(())
    }

    /// Dialogue context built from the configured labels
    pub fn intake_context(&self) -> IntakeContext {
        let [minor, moderate, serious] = self.level_labels.clone();
        IntakeContext::new(
            AssistantRoster::new(self.assistants.iter().cloned()),
            LevelLabels::new(minor, moderate, serious),
            self.all_label.clone(),
        )
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn level_array(labels: Vec<String>) -> Result<[String; 3], ConfigError> {
    let distinct: HashSet<&str> = labels.iter().map(String::as_str).collect();
    if distinct.len() != 3 {
        return Err(ConfigError::LevelLabels(labels));
    }
    <[String; 3]>::try_from(labels).map_err(ConfigError::LevelLabels)
}
