//! # One-shot success/error sink handed to running computations.
//!
//! A [`Resolver`] is how a computation reports its outcome: exactly one call
//! to [`resolve`](Resolver::resolve), [`reject`](Resolver::reject), or
//! [`attempt`](Resolver::attempt). Before the computation runs, the caller of
//! [`Task::fork`](crate::Task::fork) registers callbacks via
//! [`on_success`](Resolver::on_success) / [`on_error`](Resolver::on_error).
//!
//! ## Rules
//! - **Registration is last-write-wins**: registering a handler twice silently
//!   replaces the previous one; there is no accumulation.
//! - **Delivery is at-most-once**: the first `resolve`/`reject` wins; a second
//!   delivery (possible only through a cloned handle) panics with
//!   [`ResolverError::AlreadyCompleted`].
//! - **Delivery requires a handler**: driving a channel whose handler was
//!   never registered panics with the matching [`ResolverError`]. Registering
//!   only one branch is fine as long as only that branch can fire.
//!
//! Handles are cheap clones of one shared cell, so combinator plumbing can
//! hand the success and error paths to two different callbacks while the
//! at-most-once discipline still holds across both.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::ResolverError;

type SuccessHandler<T> = Box<dyn FnOnce(T) + Send + 'static>;
type ErrorHandler<E> = Box<dyn FnOnce(E) + Send + 'static>;

/// Shared registration/delivery state behind a resolver handle.
struct Cell<T, E> {
    on_success: Option<SuccessHandler<T>>,
    on_error: Option<ErrorHandler<E>>,
    delivered: bool,
}

/// # One-shot outcome sink for a single task execution.
///
/// Created fresh per execution call, handed to the computation, and consumed
/// by exactly one delivery. Cloning produces another handle to the same
/// underlying cell; the delivery guard spans all clones.
///
/// # Example
/// ```
/// use taskling::Task;
///
/// let task: Task<i32, String> = Task::new(|resolver| {
///     // a computation may also stash the resolver and deliver later,
///     // from another thread
///     resolver.resolve(42);
/// });
/// # let _ = task;
/// ```
pub struct Resolver<T, E> {
    cell: Arc<Mutex<Cell<T, E>>>,
}

impl<T, E> Clone for Resolver<T, E> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<T, E> Resolver<T, E> {
    pub(crate) fn new() -> Self {
        Self {
            cell: Arc::new(Mutex::new(Cell {
                on_success: None,
                on_error: None,
                delivered: false,
            })),
        }
    }

    /// Registers the callback invoked on [`resolve`](Resolver::resolve).
    ///
    /// Replaces any previously registered success handler (last write wins).
    pub fn on_success<F>(&self, handler: F)
    where
        F: FnOnce(T) + Send + 'static,
    {
        self.cell.lock().on_success = Some(Box::new(handler));
    }

    /// Registers the callback invoked on [`reject`](Resolver::reject).
    ///
    /// Replaces any previously registered error handler (last write wins).
    pub fn on_error<F>(&self, handler: F)
    where
        F: FnOnce(E) + Send + 'static,
    {
        self.cell.lock().on_error = Some(Box::new(handler));
    }

    /// Delivers a success value to the registered success handler.
    ///
    /// # Panics
    /// - [`ResolverError::AlreadyCompleted`] if this resolver (through any
    ///   handle) already delivered an outcome.
    /// - [`ResolverError::MissingSuccess`] if no success handler is registered.
    pub fn resolve(self, value: T) {
        let handler = {
            let mut cell = self.cell.lock();
            if cell.delivered {
                panic!("{}", ResolverError::AlreadyCompleted);
            }
            cell.delivered = true;
            cell.on_success.take()
        };

        // Handler runs outside the lock: it is arbitrary user code and may
        // drive other resolvers.
        match handler {
            Some(handler) => handler(value),
            None => panic!("{}", ResolverError::MissingSuccess),
        }
    }

    /// Delivers an error value to the registered error handler.
    ///
    /// # Panics
    /// Symmetric to [`resolve`](Resolver::resolve), with
    /// [`ResolverError::MissingError`] for the missing-handler case.
    pub fn reject(self, error: E) {
        let handler = {
            let mut cell = self.cell.lock();
            if cell.delivered {
                panic!("{}", ResolverError::AlreadyCompleted);
            }
            cell.delivered = true;
            cell.on_error.take()
        };

        match handler {
            Some(handler) => handler(error),
            None => panic!("{}", ResolverError::MissingError),
        }
    }

    /// Runs a fallible computation and delivers its outcome.
    ///
    /// `Ok` goes to [`resolve`](Resolver::resolve), `Err` to
    /// [`reject`](Resolver::reject). This is the single boundary where
    /// fallibility is converted into the two-channel protocol.
    pub fn attempt<F>(self, computation: F)
    where
        F: FnOnce() -> Result<T, E>,
    {
        match computation() {
            Ok(value) => self.resolve(value),
            Err(error) => self.reject(error),
        }
    }
}
