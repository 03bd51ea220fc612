//! Shared security utilities for the organizer backend.
//!
//! This crate provides common security-related functionality including:
//! - Password hashing and verification (BCrypt)
//! - Password strength validation
//! - BCrypt hash-format recognition

pub mod password;

pub use password::{
    hash_password,
    hash_password_with_cost,
    is_bcrypt_hash,
    validate_password_strength,
    validate_password_strength_with_requirements,
    verify_password,
    PasswordError,
    PasswordRequirements,
    DEFAULT_BCRYPT_COST,
};
