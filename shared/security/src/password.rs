//! Password hashing, verification, and validation utilities
//!
//! This module provides secure password operations using bcrypt for hashing
//! and configurable password strength requirements.

use bcrypt::{hash, verify, DEFAULT_COST};
use std::fmt;

/// Default cost factor for bcrypt hashing
pub const DEFAULT_BCRYPT_COST: u32 = DEFAULT_COST;

/// Version prefixes a stored hash must carry to be treated as BCrypt.
const BCRYPT_PREFIXES: [&str; 3] = ["$2a$", "$2b$", "$2y$"];

/// Configuration for password requirements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordRequirements {
    /// Minimum password length
    pub min_length: usize,
    /// Maximum password length
    pub max_length: usize,
    /// Require at least one uppercase letter
    pub require_uppercase: bool,
    /// Require at least one lowercase letter
    pub require_lowercase: bool,
    /// Require at least one digit
    pub require_digit: bool,
}

impl Default for PasswordRequirements {
    fn default() -> Self {
        Self {
            min_length: 8,
            max_length: 128,
            require_uppercase: true,
            require_lowercase: true,
            require_digit: true,
        }
    }
}

/// Errors that can occur during password operations
#[derive(Debug, Clone, thiserror::Error, serde::Serialize)]
pub enum PasswordError {
    /// Error during password hashing
    #[error("Password hashing error: {0}")]
    HashError(String),

    /// The stored value is not a recognised BCrypt hash
    #[error("Stored credential is not a BCrypt hash")]
    NotBcrypt,

    /// Error during password verification
    #[error("Password verification error: {0}")]
    VerifyError(String),

    /// Password does not meet strength requirements
    #[error("Password does not meet requirements: {0}")]
    WeakPassword(String),

    /// Password exceeds maximum allowed length
    #[error("Password exceeds maximum length of {0} characters")]
    TooLong(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PasswordValidationError {
    TooShort(usize),
    TooLong(usize),
    MissingUppercase,
    MissingLowercase,
    MissingDigit,
}

impl fmt::Display for PasswordValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PasswordValidationError::TooShort(min) => {
                write!(f, "Password must be at least {} characters", min)
            }
            PasswordValidationError::TooLong(max) => {
                write!(f, "Password must not exceed {} characters", max)
            }
            PasswordValidationError::MissingUppercase => {
                write!(f, "Password must contain at least one uppercase letter")
            }
            PasswordValidationError::MissingLowercase => {
                write!(f, "Password must contain at least one lowercase letter")
            }
            PasswordValidationError::MissingDigit => {
                write!(f, "Password must contain at least one number")
            }
        }
    }
}

/// Returns true when `value` begins with a recognised BCrypt version prefix.
pub fn is_bcrypt_hash(value: &str) -> bool {
    BCRYPT_PREFIXES.iter().any(|p| value.starts_with(p))
}

/// Hash a password using bcrypt
///
/// # Errors
///
/// Returns `PasswordError::HashError` if hashing fails, or
/// `PasswordError::TooLong` for oversized input.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    hash_password_with_cost(password, DEFAULT_BCRYPT_COST)
}

/// Hash a password with a custom cost factor (4-31). Low costs are useful in
/// test fixtures where hashing latency matters.
pub fn hash_password_with_cost(password: &str, cost: u32) -> Result<String, PasswordError> {
    let requirements = PasswordRequirements::default();
    if password.len() > requirements.max_length {
        return Err(PasswordError::TooLong(requirements.max_length));
    }

    hash(password, cost).map_err(|e| PasswordError::HashError(e.to_string()))
}

/// Verify a password against a stored BCrypt hash
///
/// Returns `Ok(true)` when the password matches. A stored value without a
/// BCrypt version prefix is rejected before bcrypt is invoked so that a
/// corrupted credential row surfaces as an error rather than a silent
/// mismatch.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, PasswordError> {
    if !is_bcrypt_hash(stored_hash) {
        return Err(PasswordError::NotBcrypt);
    }
    verify(password, stored_hash).map_err(|e| PasswordError::VerifyError(e.to_string()))
}

/// Validate password strength against requirements
pub fn validate_password_strength_with_requirements(
    password: &str,
    requirements: &PasswordRequirements,
) -> Result<(), PasswordError> {
    let mut errors = Vec::new();

    if password.len() < requirements.min_length {
        errors.push(PasswordValidationError::TooShort(requirements.min_length).to_string());
    }

    if password.len() > requirements.max_length {
        errors.push(PasswordValidationError::TooLong(requirements.max_length).to_string());
    }

    if requirements.require_uppercase && !password.chars().any(|c| c.is_uppercase()) {
        errors.push(PasswordValidationError::MissingUppercase.to_string());
    }

    if requirements.require_lowercase && !password.chars().any(|c| c.is_lowercase()) {
        errors.push(PasswordValidationError::MissingLowercase.to_string());
    }

    if requirements.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push(PasswordValidationError::MissingDigit.to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(PasswordError::WeakPassword(errors.join(", ")))
    }
}

/// Validate password strength with default requirements
pub fn validate_password_strength(password: &str) -> Result<(), PasswordError> {
    validate_password_strength_with_requirements(password, &PasswordRequirements::default())
}
