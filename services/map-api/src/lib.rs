//! Worksite map viewer service library.
//!
//! This module exposes the internal modules for testing purposes.

pub mod config;
pub mod handlers;
pub mod metrics;
pub mod state;
