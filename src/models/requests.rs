//! Request DTOs for the key-value API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

use crate::error::{KvError, Result};

/// Request body for create/update (POST /kv)
///
/// Both fields are optional at the serde level so a missing field is
/// reported as a 400 by `into_pair` rather than a deserialization rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PutRequest {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

impl PutRequest {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            value: Some(value.into()),
        }
    }

    /// Validates the request and returns the key and value.
    pub fn into_pair(self) -> Result<(String, String)> {
        let key = match self.key {
            Some(key) if !key.is_empty() => key,
            Some(_) => return Err(KvError::InvalidRequest("Key cannot be empty".to_string())),
            None => return Err(KvError::InvalidRequest("Missing key".to_string())),
        };
        let value = self
            .value
            .ok_or_else(|| KvError::InvalidRequest("Missing value".to_string()))?;
        Ok((key, value))
    }
}
