use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use crate::error::StateError;
use crate::models::PendingMap;

/// Last known state of one watched account
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountState {
    #[serde(default)]
    pub last_known_hash: Option<String>,
    #[serde(default)]
    pub last_known_pending: PendingMap,
}

/// Last known state of every watched account, keyed by account
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotifierState {
    #[serde(default)]
    pub accounts: HashMap<String, AccountState>,
}

impl NotifierState {
    pub fn account(&self, account: &str) -> AccountState {
        self.accounts.get(account).cloned().unwrap_or_default()
    }

    pub fn update(&mut self, account: &str, state: AccountState) {
        self.accounts.insert(account.to_string(), state);
    }
}

/// JSON file holding [`NotifierState`] between polls
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read the state file; a missing file is an empty state
    pub fn load(&self) -> Result<NotifierState, StateError> {
        if !self.path.exists() {
            return Ok(NotifierState::default());
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(NotifierState::default());
        }
        Ok(serde_json::from_str(&content)?)
    }

    /// Write the state file, replacing the old one only once the new one is complete
    pub fn save(&self, state: &NotifierState) -> Result<(), StateError> {
        let content = serde_json::to_string_pretty(state)?;

        let mut tmp_path = self.path.clone().into_os_string();
        tmp_path.push(".tmp");
        let tmp_path = PathBuf::from(tmp_path);

        fs::write(&tmp_path, content)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}
