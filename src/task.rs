//! # The deferred-computation value and its combinators.
//!
//! A [`Task`] owns a single computation `Fn(Resolver<T, E>)` and describes
//! *how* to produce an outcome, not a cached result. Nothing runs until an
//! execution entry point is called:
//!
//! - [`fork`](Task::fork) — fire-and-forget: callbacks are registered up
//!   front, the computation is dispatched on a worker thread, control returns
//!   immediately;
//! - [`fork_wait`](Task::fork_wait) — blocking: the outcome is funneled
//!   through a one-slot channel and returned as an [`Either`].
//!
//! ## Lifecycle
//! ```text
//! Task::new / resolve / reject / attempt
//!        │
//!        ├── map / bind / ap ──► new Task closing over the original
//!        │
//!        └── fork / fork_wait ──► fresh Resolver ──► worker thread
//!                                       │
//!                                       └── resolve / reject (exactly once)
//! ```
//!
//! ## Rules
//! - A Task is immutable after construction; combinators return new Tasks.
//! - Re-forking re-runs the stored computation from scratch. Side effects
//!   repeat; Tasks are recipes, not memoized futures.
//! - `bind` chains are strictly sequenced and short-circuit on the first
//!   error. `ap` starts both operands concurrently; there is no ordering
//!   guarantee between its branches.
//! - There is no cancellation. A forked computation runs to completion even
//!   when nothing observes its outcome (e.g. the losing branch of `ap`).

use std::fmt;
use std::sync::Arc;
use std::thread;

use crossbeam_channel::bounded;
use either::Either;
use log::trace;

use crate::join::Joiner;
use crate::resolver::Resolver;

type Computation<T, E> = Arc<dyn Fn(Resolver<T, E>) + Send + Sync + 'static>;

/// # A deferred, re-runnable computation producing `T` or failing with `E`.
///
/// Cloning is cheap (the computation is shared behind an `Arc`); each
/// execution call runs the computation from scratch with a fresh
/// [`Resolver`].
///
/// # Example
/// ```
/// use taskling::{Either, Task};
///
/// let task: Task<i32, String> = Task::resolve(3).map(|n| n + 1);
/// assert_eq!(task.fork_wait(), Either::Right(4));
/// ```
pub struct Task<T, E> {
    computation: Computation<T, E>,
}

impl<T, E> Clone for Task<T, E> {
    fn clone(&self) -> Self {
        Self {
            computation: Arc::clone(&self.computation),
        }
    }
}

impl<T, E> fmt::Debug for Task<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task").finish_non_exhaustive()
    }
}

impl<T, E> Task<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Creates a task from an arbitrary computation.
    ///
    /// The computation receives a [`Resolver`] and must eventually call
    /// exactly one of [`Resolver::resolve`] / [`Resolver::reject`] — directly,
    /// from a thread it spawns itself, or via [`Resolver::attempt`]. Whether
    /// delivery is synchronous or deferred is entirely up to the computation;
    /// this is what lets synchronous and asynchronous producers share one
    /// abstraction.
    pub fn new<C>(computation: C) -> Self
    where
        C: Fn(Resolver<T, E>) + Send + Sync + 'static,
    {
        Self {
            computation: Arc::new(computation),
        }
    }

    /// Creates a task that immediately succeeds with `value`.
    ///
    /// `T: Clone` because the task can be re-forked and must produce the
    /// value again each run.
    pub fn resolve(value: T) -> Self
    where
        T: Clone + Sync,
    {
        Self::new(move |resolver| resolver.resolve(value.clone()))
    }

    /// Creates a task that immediately fails with `error`.
    pub fn reject(error: E) -> Self
    where
        E: Clone + Sync,
    {
        Self::new(move |resolver| resolver.reject(error.clone()))
    }

    /// Creates a task from a fallible computation.
    ///
    /// Each run calls the closure; `Ok` resolves, `Err` rejects.
    ///
    /// # Example
    /// ```
    /// use taskling::{Either, Task};
    ///
    /// let boom: Task<i32, &str> = Task::attempt(|| Err("boom"));
    /// assert_eq!(boom.fork_wait(), Either::Left("boom"));
    /// ```
    pub fn attempt<C>(computation: C) -> Self
    where
        C: Fn() -> Result<T, E> + Send + Sync + 'static,
    {
        Self::new(move |resolver| resolver.attempt(&computation))
    }

    /// Starts the task asynchronously with caller-supplied callbacks.
    ///
    /// The registrar receives the fresh [`Resolver`] before the computation
    /// runs and should register `on_success` / `on_error`; the computation is
    /// then dispatched on a worker thread and `fork` returns immediately. The
    /// callbacks may be invoked on a different thread than the caller.
    ///
    /// Registering only one branch is acceptable when only that branch can
    /// fire; a delivery whose handler is missing panics on the worker thread
    /// (see [`ResolverError`](crate::ResolverError)).
    pub fn fork<R>(&self, registrar: R)
    where
        R: FnOnce(&Resolver<T, E>),
    {
        let resolver = Resolver::new();
        registrar(&resolver);
        self.dispatch(resolver);
    }

    /// Starts the task and blocks the calling thread until its outcome.
    ///
    /// Equivalent to [`fork_wait_with`](Task::fork_wait_with) with identity
    /// transforms: `Right(value)` on success, `Left(error)` on failure.
    pub fn fork_wait(&self) -> Either<E, T> {
        self.fork_wait_with(|_| {})
    }

    /// Starts the task, blocks until its outcome, and returns it transformed.
    ///
    /// The registrar may overwrite the identity transforms on the given
    /// [`WaitHandlers`]; the chosen transform is applied to the value or
    /// error before it is pushed onto the one-slot wait channel. Blocking is
    /// real thread suspension — this entry point exists precisely to turn
    /// callback-style execution into a single synchronous return.
    ///
    /// Always returns for every delivered outcome: both channel handlers are
    /// installed before the computation runs, so the missing-handler case
    /// cannot occur in wait mode.
    ///
    /// # Panics
    /// If the computation drops its resolver without delivering, which would
    /// otherwise block the caller forever.
    ///
    /// # Example
    /// ```
    /// use taskling::{Either, Task};
    ///
    /// let outcome = Task::<String, String>::resolve("value".into()).fork_wait_with(|handlers| {
    ///     handlers.on_success(|v| format!("Success: {v}"));
    ///     handlers.on_error(|e| format!("Error: {e}"));
    /// });
    /// assert_eq!(outcome, Either::Right("Success: value".to_string()));
    /// ```
    pub fn fork_wait_with<R>(&self, registrar: R) -> Either<E, T>
    where
        R: FnOnce(&mut WaitHandlers<T, E>),
    {
        let mut handlers = WaitHandlers::identity();
        registrar(&mut handlers);
        let WaitHandlers { success, error } = handlers;

        let (tx, rx) = bounded(1);
        let tx_err = tx.clone();
        let resolver = Resolver::new();
        resolver.on_success(move |value| {
            let _ = tx.send(Either::Right(success(value)));
        });
        resolver.on_error(move |err| {
            let _ = tx_err.send(Either::Left(error(err)));
        });

        self.dispatch(resolver);
        match rx.recv() {
            Ok(outcome) => outcome,
            // Every sender lives inside the resolver; a disconnect means the
            // computation dropped it without delivering.
            Err(_) => panic!("computation dropped its resolver without resolving or rejecting"),
        }
    }

    /// Transforms the success value, leaving errors untouched.
    ///
    /// Builds a new task that forks this one and resolves downstream with
    /// `transform(value)`; a panic inside `transform` is not converted into a
    /// rejection — fallible transforms belong in [`bind`](Task::bind) over a
    /// [`Task::attempt`].
    pub fn map<U, F>(self, transform: F) -> Task<U, E>
    where
        U: Send + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        let transform = Arc::new(transform);
        Task::new(move |out: Resolver<U, E>| {
            let transform = Arc::clone(&transform);
            let on_error = out.clone();
            self.fork(move |this| {
                this.on_success(move |value| out.resolve(transform(value)));
                this.on_error(move |err| on_error.reject(err));
            });
        })
    }

    /// Sequences a task-producing continuation after this task.
    ///
    /// On success, `binder` is called with the value and the task it returns
    /// is forked, its outcome forwarded downstream. On error the continuation
    /// is never invoked and the error is forwarded directly — the first
    /// failure in a chain wins and later stages never start.
    pub fn bind<U, F>(self, binder: F) -> Task<U, E>
    where
        U: Send + 'static,
        F: Fn(T) -> Task<U, E> + Send + Sync + 'static,
    {
        let binder = Arc::new(binder);
        Task::new(move |out: Resolver<U, E>| {
            let binder = Arc::clone(&binder);
            let on_error = out.clone();
            self.fork(move |this| {
                this.on_success(move |first| {
                    let next = binder(first);
                    let ok = out.clone();
                    let err = out;
                    next.fork(move |other| {
                        other.on_success(move |second| ok.resolve(second));
                        other.on_error(move |error| err.reject(error));
                    });
                });
                this.on_error(move |err| on_error.reject(err));
            });
        })
    }

    /// Applies this task's function value to another task's value, running
    /// both concurrently.
    ///
    /// `self` must resolve to a single-argument callable and `argument` to
    /// its input; the composite resolves to the application result. Both
    /// operands are forked up front — `ap` never waits for one before
    /// starting the other, which is why `pure(f).ap(a).ap(b)` runs `a` and
    /// `b` concurrently instead of sequentially.
    ///
    /// When both operands fail, exactly one error is delivered: whichever
    /// failure reaches the join's serialization point first. That is a real
    /// scheduling order, not operand order — callers must not assume `self`'s
    /// error beats `argument`'s. The losing outcome is dropped; the losing
    /// computation itself keeps running unobserved.
    ///
    /// # Example
    /// ```
    /// use taskling::{Either, Task};
    ///
    /// let product = Task::<_, String>::resolve(|x: i32| x * 10).ap(Task::resolve(2));
    /// assert_eq!(product.fork_wait(), Either::Right(20));
    /// ```
    pub fn ap<A, U>(self, argument: Task<A, E>) -> Task<U, E>
    where
        T: FnOnce(A) -> U,
        A: Send + 'static,
        U: Send + 'static,
    {
        Task::new(move |out: Resolver<U, E>| {
            let joiner = Arc::new(Joiner::new(out));

            let on_func = Arc::clone(&joiner);
            let on_func_err = Arc::clone(&joiner);
            self.fork(move |this| {
                this.on_success(move |func| on_func.supply_func(func));
                this.on_error(move |error| on_func_err.fail(error));
            });

            let on_arg = Arc::clone(&joiner);
            let on_arg_err = joiner;
            argument.fork(move |other| {
                other.on_success(move |arg| on_arg.supply_arg(arg));
                other.on_error(move |error| on_arg_err.fail(error));
            });
        })
    }

    /// Runs the computation with the prepared resolver on a worker thread.
    fn dispatch(&self, resolver: Resolver<T, E>) {
        trace!("dispatching task computation on a worker thread");
        let computation = Arc::clone(&self.computation);
        // Detached worker: the resolver is the only channel back to observers.
        let _ = thread::spawn(move || computation(resolver));
    }
}

/// # Transform pair applied at the `fork_wait` boundary.
///
/// Defaults to identity on both channels; a registrar passed to
/// [`Task::fork_wait_with`] may overwrite either side (last write wins). The
/// success transform runs on the delivered value before it becomes
/// `Right(...)`, the error transform before `Left(...)`.
pub struct WaitHandlers<T, E> {
    success: Box<dyn FnOnce(T) -> T + Send + 'static>,
    error: Box<dyn FnOnce(E) -> E + Send + 'static>,
}

impl<T, E> WaitHandlers<T, E>
where
    T: 'static,
    E: 'static,
{
    fn identity() -> Self {
        Self {
            success: Box::new(|value| value),
            error: Box::new(|error| error),
        }
    }

    /// Overwrites the transform applied to a delivered success value.
    pub fn on_success<F>(&mut self, transform: F)
    where
        F: FnOnce(T) -> T + Send + 'static,
    {
        self.success = Box::new(transform);
    }

    /// Overwrites the transform applied to a delivered error value.
    pub fn on_error<F>(&mut self, transform: F)
    where
        F: FnOnce(E) -> E + Send + 'static,
    {
        self.error = Box::new(transform);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    use rand::Rng;

    fn slow_resolve(delay_ms: u64, value: i32) -> Task<i32, &'static str> {
        Task::new(move |resolver| {
            thread::sleep(Duration::from_millis(delay_ms));
            resolver.resolve(value);
        })
    }

    fn slow_reject(delay_ms: u64, error: &'static str) -> Task<i32, &'static str> {
        Task::new(move |resolver| {
            thread::sleep(Duration::from_millis(delay_ms));
            resolver.reject(error);
        })
    }

    #[test]
    fn test_resolve_yields_right() {
        let task: Task<i32, String> = Task::resolve(3);
        assert_eq!(task.fork_wait(), Either::Right(3));
    }

    #[test]
    fn test_reject_yields_left() {
        let task: Task<i32, &'static str> = Task::reject("error");
        assert_eq!(task.fork_wait(), Either::Left("error"));
    }

    #[test]
    fn test_attempt_ok_resolves() {
        let task: Task<i32, &'static str> = Task::attempt(|| Ok(11));
        assert_eq!(task.fork_wait(), Either::Right(11));
    }

    #[test]
    fn test_attempt_err_rejects() {
        let task: Task<i32, &'static str> = Task::attempt(|| Err("boom"));
        assert_eq!(task.fork_wait(), Either::Left("boom"));
    }

    #[test]
    fn test_fork_invokes_success_callback() {
        let (tx, rx) = bounded(1);
        slow_resolve(10, 5).fork(move |resolver| {
            resolver.on_success(move |value| {
                let _ = tx.send(value);
            });
        });
        assert_eq!(rx.recv_timeout(Duration::from_secs(2)), Ok(5));
    }

    #[test]
    fn test_fork_invokes_error_callback() {
        let (tx, rx) = bounded(1);
        slow_reject(10, "nope").fork(move |resolver| {
            resolver.on_error(move |error| {
                let _ = tx.send(error);
            });
        });
        assert_eq!(rx.recv_timeout(Duration::from_secs(2)), Ok("nope"));
    }

    #[test]
    fn test_fork_returns_before_completion() {
        let started = Instant::now();
        slow_resolve(300, 1).fork(|resolver| {
            resolver.on_success(|_| {});
            resolver.on_error(|_| {});
        });
        assert!(
            started.elapsed() < Duration::from_millis(150),
            "fork must not block on the computation"
        );
    }

    #[test]
    fn test_refork_reruns_computation() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        let task: Task<usize, &'static str> = Task::new(move |resolver| {
            resolver.resolve(counter.fetch_add(1, Ordering::SeqCst));
        });

        assert_eq!(task.fork_wait(), Either::Right(0));
        assert_eq!(task.fork_wait(), Either::Right(1));
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_fork_wait_with_transforms_success() {
        let task: Task<String, String> = Task::resolve("value".to_string());
        let outcome = task.fork_wait_with(|handlers| {
            handlers.on_success(|v| format!("Success: {v}"));
            handlers.on_error(|e| format!("Error: {e}"));
        });
        assert_eq!(outcome, Either::Right("Success: value".to_string()));
    }

    #[test]
    fn test_fork_wait_with_transforms_error() {
        let task: Task<String, String> = Task::reject("error".to_string());
        let outcome = task.fork_wait_with(|handlers| {
            handlers.on_success(|v| format!("Success: {v}"));
            handlers.on_error(|e| format!("Error: {e}"));
        });
        assert_eq!(outcome, Either::Left("Error: error".to_string()));
    }

    #[test]
    #[should_panic(expected = "without resolving")]
    fn test_fork_wait_panics_when_resolver_dropped() {
        let task: Task<i32, &'static str> = Task::new(|resolver| drop(resolver));
        let _ = task.fork_wait();
    }

    #[test]
    fn test_map_transforms_success() {
        let task: Task<i32, &'static str> = Task::resolve(3);
        assert_eq!(task.map(|x| x + 1).fork_wait(), Either::Right(4));
    }

    #[test]
    fn test_map_forwards_error_unchanged() {
        let task: Task<i32, &'static str> = Task::reject("error");
        assert_eq!(task.map(|x| x + 1).fork_wait(), Either::Left("error"));
    }

    #[test]
    fn test_map_identity_law() {
        let resolved: Task<i32, &'static str> = Task::resolve(3);
        assert_eq!(
            resolved.clone().map(|v| v).fork_wait(),
            resolved.fork_wait()
        );

        let rejected: Task<i32, &'static str> = Task::reject("error");
        assert_eq!(
            rejected.clone().map(|v| v).fork_wait(),
            rejected.fork_wait()
        );
    }

    #[test]
    fn test_bind_chains_tasks() {
        let task: Task<i32, &'static str> = Task::resolve(3);
        let outcome = task.bind(|n| Task::resolve(n * 2)).fork_wait();
        assert_eq!(outcome, Either::Right(6));
    }

    #[test]
    fn test_bind_forwards_inner_error() {
        let task: Task<i32, &'static str> = Task::resolve(3);
        let outcome = task.bind(|_| Task::<i32, _>::reject("inner")).fork_wait();
        assert_eq!(outcome, Either::Left("inner"));
    }

    #[test]
    fn test_bind_short_circuits_without_calling_continuation() {
        let called = Arc::new(AtomicBool::new(false));
        let probe = Arc::clone(&called);

        let outcome = Task::<i32, &'static str>::reject("first")
            .bind(move |n| {
                probe.store(true, Ordering::SeqCst);
                Task::resolve(n)
            })
            .fork_wait();

        assert_eq!(outcome, Either::Left("first"));
        assert!(!called.load(Ordering::SeqCst), "continuation must not run");
    }

    #[test]
    fn test_ap_applies_function_to_argument() {
        let product = Task::<_, &'static str>::resolve(|x: i32| x * 10).ap(Task::resolve(2));
        assert_eq!(product.fork_wait(), Either::Right(20));
    }

    #[test]
    fn test_ap_runs_operands_concurrently() {
        let func: Task<_, &'static str> = Task::new(|resolver| {
            thread::sleep(Duration::from_millis(200));
            resolver.resolve(|x: i32| x + 1);
        });
        let arg = slow_resolve(200, 41);

        let started = Instant::now();
        let outcome = func.ap(arg).fork_wait();
        let elapsed = started.elapsed();

        assert_eq!(outcome, Either::Right(42));
        // Two 200ms operands joined concurrently finish near 200ms, not 400ms.
        assert!(
            elapsed < Duration::from_millis(350),
            "ap ran its operands sequentially: {elapsed:?}"
        );
    }

    #[test]
    fn test_ap_immediate_double_failure_yields_one_error() {
        let func: Task<fn(i32) -> i32, &'static str> = Task::reject("E1");
        let outcome = func.ap(Task::reject("E2")).fork_wait();
        assert!(
            outcome == Either::Left("E1") || outcome == Either::Left("E2"),
            "unexpected outcome: {outcome:?}"
        );
    }

    #[test]
    fn test_ap_double_failure_tiebreak_randomized() {
        let mut rng = rand::thread_rng();
        for _ in 0..50 {
            let d1 = rng.gen_range(0..4);
            let d2 = rng.gen_range(0..4);

            let func: Task<fn(i32) -> i32, &'static str> = Task::new(move |resolver| {
                thread::sleep(Duration::from_millis(d1));
                resolver.reject("E1");
            });
            let arg: Task<i32, &'static str> = Task::new(move |resolver| {
                thread::sleep(Duration::from_millis(d2));
                resolver.reject("E2");
            });

            let outcome = func.ap(arg).fork_wait();
            assert!(
                outcome == Either::Left("E1") || outcome == Either::Left("E2"),
                "unexpected outcome: {outcome:?}"
            );
        }
    }

    #[test]
    fn test_ap_fast_failure_beats_slow_success() {
        let func: Task<fn(i32) -> i32, &'static str> = Task::new(|resolver| {
            thread::sleep(Duration::from_millis(100));
            resolver.resolve((|x: i32| x * 2) as fn(i32) -> i32);
        });
        let outcome = func.ap(slow_reject(5, "argument failed")).fork_wait();
        assert_eq!(outcome, Either::Left("argument failed"));
    }

    #[test]
    fn test_ap_slow_argument_still_resolves() {
        let func: Task<fn(i32) -> i32, &'static str> = Task::new(|resolver| {
            resolver.resolve((|x: i32| x * 2) as fn(i32) -> i32);
        });
        let outcome = func.ap(slow_resolve(50, 21)).fork_wait();
        assert_eq!(outcome, Either::Right(42));
    }
}
