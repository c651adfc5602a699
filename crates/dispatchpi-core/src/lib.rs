//! # dispatchpi-core
//!
//! Core delivery logic for `dispatchpi` photo frames.
//!
//! Two frames share one inbox. Photos mailed to it are queued per frame and
//! shown one per day:
//! - **Queues** - bounded FIFO queues that assign each photo its display day
//!   and persist as JSON between runs
//! - **Scheduler** - routes senders to frames, deduplicates attachments,
//!   evicts when full and picks the photo due today
//! - **Services** - the mail-source and renderer seams, with a Gmail REST
//!   implementation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod clock;
mod error;
pub mod queue;
pub mod scheduler;
pub mod service;

pub use clock::Clock;
pub use error::{Error, Result};
pub use queue::{EmailImage, FifoQueue};
pub use scheduler::{
    Admission, Candidate, DueImage, Scheduler, SchedulerConfig, SenderFilter, Target,
};
pub use service::{
    AttachmentPart, GmailClient, MailSource, MessageDetail, MessageRef, ProviderError,
    RawRenderer, Renderer,
};
