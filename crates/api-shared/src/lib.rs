//! # API Shared
//!
//! Shared utilities and definitions for the symbot HTTP surface.
//!
//! Contains:
//! - Webhook signature verification (`auth` module)
//! - Shared services like `HealthService`
//!
//! Used by `api-rest` and the `symbot` CLI.

pub mod auth;
pub mod health;

pub use auth::{check_signature, sign, verify_signature, SignatureError, SignatureMethod};
pub use health::{HealthRes, HealthService};
