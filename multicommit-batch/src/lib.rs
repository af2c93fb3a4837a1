//! # multicommit-batch
//!
//! Copy, publish, and revert stages plus the [`Batch`] driver.
//!
//! Open a [`Batch`] over a projects directory, then run [`Batch::copy`],
//! [`Batch::publish`], and [`Batch::revert`] (or send [`Command`] values to
//! [`Batch::dispatch`]). Per-project failures are recorded on the records and
//! never abort the loop; a [`BatchError`] means nothing was touched.

pub mod copy;
pub mod error;
pub mod pipeline;
pub mod preview;
pub mod publish;
pub mod revert;

#[cfg(test)]
mod testing;

pub use copy::{copy_preserving, CopyOutcome, CopyResult};
pub use error::{BatchError, CopyError, PublishError, RevertError};
pub use pipeline::{Batch, Command, CommandOutcome};
pub use preview::{FilePreview, PreviewKind};
pub use publish::{PublishOutcome, PublishResult};
pub use revert::{RevertConfirmation, RevertOutcome, RevertPlan};
