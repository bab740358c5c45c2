//! Common types and utilities shared across Hoverscout crates.
//!
//! This crate defines the shared error taxonomy and observability helpers
//! used throughout the Hoverscout workspace. It is intentionally lightweight
//! and dependency-minimal so that all crates can depend on it without
//! introducing heavy transitive costs.
//!
//! # Overview
//!
//! - [`observability`]: Centralised tracing/logging initialisation
//! - [`ScoutError`] and [`Result`]: Shared error handling
use serde::{Deserialize, Serialize};

pub mod observability;

/// Viewport dimensions in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 800,
        }
    }
}

impl Viewport {
    /// Smaller of the two dimensions, used for radial exploration bounds.
    pub fn min_dimension(&self) -> u32 {
        self.width.min(self.height)
    }
}

/// Error types used across the Hoverscout system.
///
/// The variants mirror the phase boundaries of an exploration run: only
/// navigation loss is fatal for a run; every other failure is recorded and
/// the run continues with partial data.
#[derive(thiserror::Error, Debug)]
pub enum ScoutError {
    /// The initial page load could not complete. Fatal for the run.
    #[error("navigation failed: {0}")]
    Navigation(String),

    /// Script injection failed; exploration continues without capture.
    #[error("instrumentation failed: {0}")]
    Instrumentation(String),

    /// A single pointer move or scroll failed. Swallowed per-attempt.
    #[error("pointer move failed: {0}")]
    Move(String),

    /// A DOM query during aggregation or popup detection failed.
    #[error("DOM query failed: {0}")]
    Query(String),

    /// An isolated-context navigation failed or timed out.
    #[error("link verification failed: {0}")]
    Verification(String),

    /// A driver (browser, WebDriver endpoint) reported an error.
    #[error("driver error: {0}")]
    Driver(#[from] anyhow::Error),
}

/// Convenient alias for results that use [`ScoutError`].
pub type Result<T> = std::result::Result<T, ScoutError>;
