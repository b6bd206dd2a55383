//! Services module - the pairwise job orchestration engine.
//!
//! The alignment itself is done by MUSTANG; everything around it lives here.
//!
//! # Components
//!
//! - [`inputs`]: finds structure files and expands them into the `N²` job set
//!   (every ordered pair, self pairs included)
//! - [`AlignmentInvoker`]: runs `mustang -i <a> <b> -o <stem> -F <format>` for one job
//! - [`OutputReconciler`]: validates MUSTANG's output files and moves them into
//!   the canonical directories (strict or lenient)
//! - [`JobDispatcher`]: bounded worker pool; results arrive in completion order
//! - [`aggregate`]: expected vs. actual counts, failure list
//! - [`BatchRunner`]: drives a whole batch
//!
//! # Failure handling
//!
//! A failing pair never aborts the batch; it becomes a failed
//! [`JobResult`](crate::models::JobResult). The exception is an executable that
//! cannot be started, which would fail every pair identically: the batch is
//! aborted with [`BatchError::ToolNotAvailable`](crate::error::BatchError::ToolNotAvailable).
//!
//! # Usage Example
//!
//! ```ignore
//! use mustang_align::services::{BatchInput, BatchRunner, NoProgress};
//!
//! let runner = BatchRunner::new(settings, "results")?;
//! let summary = runner
//!     .run(&BatchInput::Directory("structures".into()), &NoProgress)
//!     .await?;
//! println!("{}", summary.summary());
//! ```

pub mod aggregate;
pub mod batch;
pub mod dispatcher;
pub mod inputs;
pub mod invoker;
pub mod reconcile;

pub use aggregate::aggregate;
pub use batch::{BatchInput, BatchRunner};
pub use dispatcher::{JobDispatcher, NoProgress, ProgressBarSink, ProgressSink};
pub use inputs::{
    enumerate_inputs, ensure_unique_identifiers, ensure_unique_pair_ids, generate_pairs, plan_jobs,
};
pub use invoker::{AlignmentInvoker, InvocationOutput, InvokeError};
pub use reconcile::OutputReconciler;
