//! Input validation for the provisioning core
//!
//! Secure validation for user-supplied identifiers and feature maps before
//! they reach storage or the message bus.

use crate::error::{Result, TenancyError};
use std::collections::HashMap;

/// Maximum number of entries in a feature map
const MAX_FEATURE_KEYS: usize = 256;

/// Maximum length of a feature key
const MAX_FEATURE_KEY_LENGTH: usize = 128;

/// Maximum length of a user-chosen tenant code
const MAX_CODE_LENGTH: usize = 64;

/// Check whether a string is a safe identifier: non-empty, alphanumerics,
/// underscore, and dash only. Shared by request validation and the
/// database provisioner's DDL guard.
pub fn is_valid_identifier(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Validates a user-chosen tenant code
pub fn validate_code(code: &str) -> Result<()> {
    if code.len() > MAX_CODE_LENGTH {
        return Err(TenancyError::InvalidInput(format!(
            "Code too long: {} chars (max: {MAX_CODE_LENGTH})",
            code.len()
        )));
    }

    if !is_valid_identifier(code) {
        return Err(TenancyError::InvalidInput(format!(
            "Code {code:?} must contain only alphanumerics, underscore, and dash"
        )));
    }

    Ok(())
}

/// Validates a tenant display name
pub fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(TenancyError::InvalidInput(
            "Name must not be blank".to_string(),
        ));
    }

    Ok(())
}

/// Validates a feature map (custom overrides or a full active-feature set)
pub fn validate_feature_map(features: &HashMap<String, bool>) -> Result<()> {
    if features.len() > MAX_FEATURE_KEYS {
        return Err(TenancyError::InvalidInput(format!(
            "Too many feature keys: {} (max: {MAX_FEATURE_KEYS})",
            features.len()
        )));
    }

    for key in features.keys() {
        if key.is_empty() {
            return Err(TenancyError::InvalidInput(
                "Feature keys must not be empty".to_string(),
            ));
        }
        if key.len() > MAX_FEATURE_KEY_LENGTH {
            return Err(TenancyError::InvalidInput(format!(
                "Feature key too long: {} chars (max: {MAX_FEATURE_KEY_LENGTH})",
                key.len()
            )));
        }
    }

    Ok(())
}
