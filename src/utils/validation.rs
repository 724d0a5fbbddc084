use crate::utils::error::{DoctorError, Result};
use std::collections::HashSet;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(DoctorError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(DoctorError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(DoctorError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(DoctorError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

/// Parses a permission mode written as octal digits, e.g. "600" or "0o600".
pub fn parse_octal_mode(field_name: &str, value: &str) -> Result<u32> {
    let digits = value.trim().trim_start_matches("0o");
    let mode = u32::from_str_radix(digits, 8).map_err(|e| DoctorError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: value.to_string(),
        reason: format!("Not an octal mode: {}", e),
    })?;
    if mode > 0o777 {
        return Err(DoctorError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Mode must not exceed 777".to_string(),
        });
    }
    Ok(mode)
}

pub fn validate_env_key(field_name: &str, key: &str) -> Result<()> {
    let valid = key
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(DoctorError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: key.to_string(),
            reason: "Environment variable names must match [A-Za-z_][A-Za-z0-9_]*".to_string(),
        });
    }
    Ok(())
}

pub fn validate_unique_ports(field_name: &str, ports: &[u16]) -> Result<()> {
    let mut seen = HashSet::new();
    for port in ports {
        if *port == 0 {
            return Err(DoctorError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: port.to_string(),
                reason: "Port 0 is not a fixed port".to_string(),
            });
        }
        if !seen.insert(*port) {
            return Err(DoctorError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: port.to_string(),
                reason: "Port is listed more than once".to_string(),
            });
        }
    }
    Ok(())
}
