//! Error types for the task completion protocol.
//!
//! This module defines [`ResolverError`], the set of completion-protocol
//! violations a [`Resolver`](crate::Resolver) can detect:
//!
//! - a delivery arrived before the matching handler was registered;
//! - a second delivery arrived on a resolver that already completed.
//!
//! All of these are programmer errors, not runtime computation failures, so
//! they surface as panics carrying the error's display message rather than as
//! values on the error channel (the error channel's type belongs to the user).
//! The enum exists so that panic messages stay stable and so tests and panic
//! hooks can match on them.

use thiserror::Error;

/// # Violations of the one-shot completion protocol.
///
/// A [`Resolver`](crate::Resolver) must have the relevant handler registered
/// before a delivery reaches it, and must be driven at most once. Breaking
/// either rule yields one of these.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverError {
    /// `resolve` was called but no `on_success` handler was registered.
    #[error("missing on_success handler")]
    MissingSuccess,

    /// `reject` was called but no `on_error` handler was registered.
    #[error("missing on_error handler")]
    MissingError,

    /// A second delivery reached a resolver that had already completed.
    #[error("resolver already completed")]
    AlreadyCompleted,
}

impl ResolverError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use taskling::ResolverError;
    ///
    /// assert_eq!(ResolverError::MissingSuccess.as_label(), "missing_on_success");
    /// assert_eq!(ResolverError::AlreadyCompleted.as_label(), "already_completed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ResolverError::MissingSuccess => "missing_on_success",
            ResolverError::MissingError => "missing_on_error",
            ResolverError::AlreadyCompleted => "already_completed",
        }
    }
}
