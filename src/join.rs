//! # Race-safe accumulator behind [`Task::ap`](crate::Task::ap).
//!
//! The two operands of an applicative join run concurrently and report back
//! through four callbacks (two per operand), possibly from different threads
//! at the same instant. [`Joiner`] merges them into exactly one delivery on
//! the composite task's resolver.
//!
//! ## Rules
//! - All transitions go through one mutex-guarded read-modify-write; the call
//!   that observes readiness (or the first failure) takes ownership of the
//!   whole state and is the only one allowed to deliver.
//! - The first terminal transition wins. A later success or failure finds the
//!   state `Settled` and becomes a no-op; late errors are logged at debug
//!   level and dropped. This is first-to-complete-wins, decided by lock
//!   acquisition order, not by operand position.
//! - Delivery happens after the lock is released; the state is already
//!   `Settled` by then, so double-delivery is impossible.

use std::mem;

use log::debug;
use parking_lot::Mutex;

use crate::resolver::Resolver;

/// Tagged join state: still gathering operand outcomes, or settled.
enum JoinState<F, A, U, E> {
    Gathering {
        func: Option<F>,
        arg: Option<A>,
        output: Resolver<U, E>,
    },
    Settled,
}

/// Accumulator merging two concurrent operand outcomes into one delivery.
///
/// Created per `ap` invocation and shared by the four operand callbacks via
/// `Arc`; discarded once the composite resolver has been driven.
pub(crate) struct Joiner<F, A, U, E> {
    state: Mutex<JoinState<F, A, U, E>>,
}

impl<F, A, U, E> Joiner<F, A, U, E>
where
    F: FnOnce(A) -> U,
{
    pub(crate) fn new(output: Resolver<U, E>) -> Self {
        Self {
            state: Mutex::new(JoinState::Gathering {
                func: None,
                arg: None,
                output,
            }),
        }
    }

    /// Records the function operand's success value.
    pub(crate) fn supply_func(&self, value: F) {
        let ready = {
            let mut state = self.state.lock();
            match &mut *state {
                JoinState::Gathering { func, .. } => *func = Some(value),
                JoinState::Settled => return,
            }
            Self::take_if_ready(&mut *state)
        };

        if let Some((func, arg, output)) = ready {
            output.resolve(func(arg));
        }
    }

    /// Records the argument operand's success value.
    pub(crate) fn supply_arg(&self, value: A) {
        let ready = {
            let mut state = self.state.lock();
            match &mut *state {
                JoinState::Gathering { arg, .. } => *arg = Some(value),
                JoinState::Settled => return,
            }
            Self::take_if_ready(&mut *state)
        };

        if let Some((func, arg, output)) = ready {
            output.resolve(func(arg));
        }
    }

    /// Records a failure from either operand.
    ///
    /// The first failure (or a completed success) wins; anything after that
    /// is dropped.
    pub(crate) fn fail(&self, error: E) {
        let output = {
            let mut state = self.state.lock();
            match mem::replace(&mut *state, JoinState::Settled) {
                JoinState::Gathering { output, .. } => Some(output),
                JoinState::Settled => None,
            }
        };

        match output {
            Some(output) => output.reject(error),
            None => debug!("applicative join already settled; dropping late error"),
        }
    }

    /// Takes the full state when both slots are filled, leaving `Settled`.
    fn take_if_ready(state: &mut JoinState<F, A, U, E>) -> Option<(F, A, Resolver<U, E>)> {
        if !matches!(
            state,
            JoinState::Gathering {
                func: Some(_),
                arg: Some(_),
                ..
            }
        ) {
            return None;
        }

        match mem::replace(state, JoinState::Settled) {
            JoinState::Gathering {
                func: Some(func),
                arg: Some(arg),
                output,
            } => Some((func, arg, output)),
            _ => None,
        }
    }
}
