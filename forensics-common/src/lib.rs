//! # Forensics Common Library
//!
//! Shared code for the forensics fusion services including:
//! - JSON wire types for the fuse endpoint
//! - Bootstrap configuration loading
//! - Common error types

pub mod api;
pub mod config;
pub mod error;

pub use error::{Error, Result};
