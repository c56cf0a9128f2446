//! # taskling
//!
//! **Taskling** is a small deferred-computation library for Rust.
//!
//! A [`Task`] describes *how* to produce a value that eventually succeeds
//! with a result or fails with an error. Nothing runs until the task is
//! forked; combinators compose descriptions without forcing execution order.
//! The crate is designed as a building block: it prescribes no I/O and no
//! scheduler policy, and user computations are opaque.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  Task::new / resolve / reject / attempt        (construction)
//!        │
//!        ├── map / bind ──────────► sequential composition, short-circuit
//!        │                          on the first error
//!        ├── ap ──────────────────► concurrent composition through the
//!        │                          join accumulator (first terminal
//!        │                          transition wins)
//!        ▼
//!  fork(registrar)                 fork_wait()
//!        │                              │
//!   Resolver (callbacks          Resolver (one-slot channel
//!   registered up front)         handlers pre-installed)
//!        │                              │
//!   worker thread runs           worker thread runs the
//!   the computation;             computation; caller blocks
//!   control returns              in recv() until exactly one
//!   immediately                  Either<E, T> arrives
//! ```
//!
//! ### Completion discipline
//! Every execution call builds a fresh [`Resolver`], the one-shot sink the
//! computation drives via `resolve`/`reject` (or `attempt`, which converts a
//! `Result` at exactly one boundary). A resolver delivers at most once across
//! all of its handles, and a delivery without a registered handler is a
//! programmer error ([`ResolverError`]). Inside [`Task::ap`], the two
//! concurrently running operands are merged by a mutex-guarded accumulator:
//! exactly one terminal delivery reaches the composite resolver even when
//! both operands fail at the same instant, and the loser's outcome is
//! silently dropped (first-to-complete-wins, decided by real scheduling
//! order, never by operand position).
//!
//! ## Features
//! | Area            | Description                                                    | Key types                |
//! |-----------------|----------------------------------------------------------------|--------------------------|
//! | **Tasks**       | Deferred, re-runnable computations; cheap to clone and compose.| [`Task`]                 |
//! | **Execution**   | Fire-and-forget callbacks or a blocking two-variant result.    | [`Task::fork`], [`Task::fork_wait`], [`Either`] |
//! | **Combinators** | Sequential (`map`, `bind`) and concurrent (`ap`) composition.  | [`Task::map`], [`Task::bind`], [`Task::ap`] |
//! | **Protocol**    | One-shot resolution sink with typed misuse errors.             | [`Resolver`], [`ResolverError`] |
//!
//! ## Non-goals
//! No cancellation of in-flight computations, no concurrency throttling, no
//! retries. A forked computation always runs to completion, observed or not.
//!
//! ## Example
//! ```rust
//! use taskling::{Either, Task};
//!
//! // Sequential: the continuation only runs after the first task delivers.
//! let doubled: Task<i32, String> = Task::resolve(3).bind(|n| Task::resolve(n * 2));
//! assert_eq!(doubled.fork_wait(), Either::Right(6));
//!
//! // Concurrent: both operands start immediately; the join applies the
//! // function task's value to the argument task's value.
//! let applied = Task::<_, String>::resolve(|x: i32| x + 1).ap(Task::resolve(41));
//! assert_eq!(applied.fork_wait(), Either::Right(42));
//!
//! // Failures short-circuit and arrive on the Left channel.
//! let failed: Task<i32, String> = Task::<i32, String>::reject("boom".to_string()).map(|n| n + 1);
//! assert_eq!(failed.fork_wait(), Either::Left("boom".to_string()));
//! ```

mod error;
mod join;
mod resolver;
mod task;

// ---- Public re-exports ----

pub use error::ResolverError;
pub use resolver::Resolver;
pub use task::{Task, WaitHandlers};

// The two-variant result returned by `fork_wait`: `Right` wraps success,
// `Left` wraps failure.
pub use either::Either;
