//! Bounded delivery queues.
//!
//! Each frame owns one queue of images. The queue decides on which day every
//! image is shown and persists itself as JSON between runs.

mod fifo;
mod model;
mod storage;

pub use fifo::FifoQueue;
pub use model::EmailImage;
