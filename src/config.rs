//! Persisted API credential record

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default file name of the credential record
pub const CONFIG_FILE: &str = "api_config.json";

/// The account's API credentials: numeric ID plus secret hash
#[derive(Debug, Clone, PartialEq)]
pub struct ApiCredentials {
    /// Numeric application ID
    pub api_id: i64,
    /// Application secret
    pub api_hash: String,
}

// On-disk form: a flat two-field document with the ID kept as a string,
// compatible with config files written by earlier versions of the panel.
#[derive(Serialize, Deserialize)]
struct StoredCredentials {
    api_id: String,
    api_hash: String,
}

impl ApiCredentials {
    /// Create a credential record
    pub fn new(api_id: i64, api_hash: impl Into<String>) -> Self {
        Self {
            api_id,
            api_hash: api_hash.into(),
        }
    }

    /// Parse the panel's form fields into a credential record
    ///
    /// # Errors
    /// Returns error if the ID is not numeric or the hash is blank
    pub fn parse(api_id: &str, api_hash: &str) -> Result<Self> {
        let api_id = api_id
            .trim()
            .parse::<i64>()
            .map_err(|_| Error::invalid_config("api_id must be numeric"))?;
        let api_hash = api_hash.trim();
        if api_hash.is_empty() {
            return Err(Error::invalid_config("api_hash must not be empty"));
        }
        Ok(Self::new(api_id, api_hash))
    }

    /// Load the record from `path`; `None` when no record exists yet
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(path)?;
        let stored: StoredCredentials = serde_json::from_str(&raw)?;
        let api_id = stored
            .api_id
            .trim()
            .parse::<i64>()
            .map_err(|_| Error::invalid_config("stored api_id is not numeric"))?;
        Ok(Some(Self {
            api_id,
            api_hash: stored.api_hash,
        }))
    }

    /// Persist the record to `path`
    ///
    /// # Errors
    /// Returns error if the file cannot be written
    pub fn save(&self, path: &Path) -> Result<()> {
        let stored = StoredCredentials {
            api_id: self.api_id.to_string(),
            api_hash: self.api_hash.clone(),
        };
        std::fs::write(path, serde_json::to_string(&stored)?)?;
        Ok(())
    }
}
