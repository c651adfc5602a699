//! Two-frame delivery scheduler.
//!
//! The scheduler owns one [`FifoQueue`] per [`Target`]. New attachments are
//! admitted into the queue of the frame their sender routes to, duplicates are
//! ignored, and the oldest image is evicted when a queue is full. On every
//! display request the first image whose day has come is returned and the
//! queue is written back to disk.
//!
//! Eviction can drop an image that was never shown. Bounded storage wins over
//! delivery; evictions are logged and counted per frame.

mod target;

use std::num::NonZeroUsize;
use std::path::PathBuf;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

pub use target::{SenderFilter, Target};

use crate::clock::Clock;
use crate::queue::{EmailImage, FifoQueue};
use crate::service::{MailSource, MessageDetail};
use crate::{Error, Result};

/// Settings fixed for the lifetime of a scheduler. Never persisted.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Maximum number of images held per frame.
    pub capacity: NonZeroUsize,
    /// Sender routing between the two frames.
    pub filter: SenderFilter,
    /// Directory holding one queue file per frame.
    pub queue_dir: PathBuf,
    /// Source of "today".
    pub clock: Clock,
}

/// An attachment offered for admission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Stable attachment identity, used for deduplication.
    pub unique_attachment_id: String,
    /// Provider handle for downloading the bytes.
    pub temporary_attachment_id: String,
    /// Message carrying the attachment.
    pub message_id: String,
    /// Caption text.
    pub text: String,
}

/// Outcome of admitting a candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// The attachment was already queued; nothing changed.
    Duplicate,
    /// The attachment was queued for `display_date`.
    Scheduled {
        /// Day the image will be shown.
        display_date: NaiveDate,
        /// Image dropped to make room, if the queue was full.
        evicted: Option<EmailImage>,
    },
}

/// Image selected for display, with everything needed to fetch its bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueImage {
    /// Position of the image in its queue.
    pub index: usize,
    /// The queued record.
    pub image: EmailImage,
}

impl DueImage {
    /// Caption to show with the image.
    #[must_use]
    pub fn caption(&self) -> &str {
        &self.image.text
    }
}

#[derive(Debug, Default)]
struct FrameState {
    queue: FifoQueue,
    evicted: u64,
}

impl FrameState {
    /// Drops the front image and records the eviction.
    fn evict_front(&mut self, target: Target) -> Result<EmailImage> {
        let dropped = self.queue.dequeue()?;
        self.evicted += 1;
        warn!(
            %target,
            unique_attachment_id = %dropped.unique_attachment_id,
            display_date = ?dropped.display_date,
            evicted_total = self.evicted,
            "Queue full, evicting oldest image"
        );
        Ok(dropped)
    }
}

/// Delivery scheduler for the satellite and earth frames.
#[derive(Debug)]
pub struct Scheduler {
    config: SchedulerConfig,
    satellite: FrameState,
    earth: FrameState,
}

impl Scheduler {
    /// Creates a scheduler with two empty queues. Nothing is read from disk.
    #[must_use]
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            satellite: FrameState::default(),
            earth: FrameState::default(),
        }
    }

    /// Creates a scheduler and hydrates both queues from `config.queue_dir`.
    ///
    /// A missing or corrupt queue file leaves that queue empty; corruption is logged.
    #[must_use]
    pub fn open(config: SchedulerConfig) -> Self {
        let mut scheduler = Self::new(config);
        for target in Target::ALL {
            scheduler.load(target);
        }
        scheduler
    }

    /// Re-reads the queue for `target` from disk, all or nothing.
    ///
    /// A file holding more images than the capacity of this scheduler is cut
    /// down from the front, counting each dropped image as an eviction.
    /// Returns true if a usable file was read or none existed.
    pub fn load(&mut self, target: Target) -> bool {
        let path = self.queue_path(target);
        let capacity = self.capacity();
        let state = self.frame_mut(target);
        match state.queue.load_from_storage(&path) {
            Ok(()) => {
                debug!(%target, len = state.queue.len(), "Queue loaded");
                while state.queue.len() > capacity {
                    // Length is above a non-zero capacity, so the queue is not empty.
                    if state.evict_front(target).is_err() {
                        break;
                    }
                }
                true
            }
            Err(e) => {
                warn!(%target, error = %e, "Discarding unreadable queue, starting empty");
                state.queue = FifoQueue::new();
                false
            }
        }
    }

    /// Writes the queue for `target` to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, target: Target) -> Result<()> {
        self.queue(target).save_to_storage(&self.queue_path(target))
    }

    /// Location of the persisted queue for `target`.
    #[must_use]
    pub fn queue_path(&self, target: Target) -> PathBuf {
        self.config.queue_dir.join(target.queue_file_name())
    }

    /// Maximum number of images per frame.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.config.capacity.get()
    }

    /// The calendar date the scheduler currently considers today.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.config.clock.today()
    }

    /// Read-only view of the queue for `target`.
    #[must_use]
    pub fn queue(&self, target: Target) -> &FifoQueue {
        &self.frame(target).queue
    }

    /// Number of images dropped from `target` to make room since this scheduler was created.
    #[must_use]
    pub fn evicted_count(&self, target: Target) -> u64 {
        self.frame(target).evicted
    }

    /// Returns true if a message from `sender` belongs on `target`.
    #[must_use]
    pub fn classify(&self, sender: &str, target: Target) -> bool {
        self.config.filter.classify(sender, target)
    }

    /// Queues an attachment for `target` unless it is already there.
    ///
    /// When the queue is full the front image is evicted first, even if it was
    /// never displayed.
    ///
    /// # Errors
    ///
    /// Returns `Error::DateOutOfRange` if no display date can be assigned.
    pub fn admit(&mut self, target: Target, candidate: Candidate) -> Result<Admission> {
        let today = self.today();
        let capacity = self.capacity();
        let state = self.frame_mut(target);

        if state.queue.contains(&candidate.unique_attachment_id) {
            debug!(
                %target,
                unique_attachment_id = %candidate.unique_attachment_id,
                "Image already queued"
            );
            return Ok(Admission::Duplicate);
        }

        // Fail before evicting so a full queue is never shortened for nothing.
        state.queue.next_display_date(today)?;

        let mut evicted = None;
        while state.queue.len() >= capacity {
            evicted = Some(state.evict_front(target)?);
        }

        let image = EmailImage::new(
            candidate.unique_attachment_id,
            candidate.temporary_attachment_id,
            candidate.message_id,
            candidate.text,
        );
        let unique_attachment_id = image.unique_attachment_id.clone();
        let display_date = state.queue.enqueue(image, today)?;
        info!(%target, %unique_attachment_id, %display_date, "Image scheduled");

        Ok(Admission::Scheduled {
            display_date,
            evicted,
        })
    }

    /// Admits every attachment of `message` if its sender routes to `target`.
    ///
    /// Returns the number of newly scheduled images.
    ///
    /// # Errors
    ///
    /// Returns an error if an admission fails.
    pub fn admit_and_schedule(&mut self, target: Target, message: &MessageDetail) -> Result<usize> {
        if !self.classify(&message.sender, target) {
            debug!(%target, message_id = %message.id, "Sender routes to the other frame");
            return Ok(0);
        }

        let mut scheduled = 0;
        for part in &message.attachments {
            let candidate = Candidate {
                unique_attachment_id: EmailImage::attachment_identity(&message.id, &part.part_id),
                temporary_attachment_id: part.attachment_handle.clone(),
                message_id: message.id.clone(),
                text: message.caption.clone(),
            };
            if matches!(self.admit(target, candidate)?, Admission::Scheduled { .. }) {
                scheduled += 1;
            }
        }
        Ok(scheduled)
    }

    /// Finds the first image in `target` whose display date is today or later.
    ///
    /// The queue is not modified; past images stay until evicted.
    ///
    /// # Errors
    ///
    /// Returns `Error::NoDueItem` if every image is in the past or the queue is empty.
    pub fn next_due(&self, target: Target) -> Result<DueImage> {
        self.queue(target)
            .first_due(self.today())
            .map(|(index, image)| DueImage {
                index,
                image: image.clone(),
            })
            .ok_or(Error::NoDueItem(target))
    }

    /// Pulls new attachments for `target` from `source` into its queue.
    ///
    /// Only the newest `capacity` messages are examined, oldest first. A failed
    /// listing means no new candidates this cycle; a failed message fetch skips
    /// that message. Returns the number of newly scheduled images.
    ///
    /// # Errors
    ///
    /// Returns an error if an admission fails.
    pub async fn pull_attachments<S: MailSource>(
        &mut self,
        target: Target,
        source: &S,
    ) -> Result<usize> {
        let Some(query) = self.config.filter.search_query(target) else {
            debug!(%target, "No sender can route to this frame");
            return Ok(0);
        };

        info!(%target, "Pulling attachments");
        let messages = match source.list_candidate_messages(&query).await {
            Ok(messages) => messages,
            Err(e) => {
                warn!(%target, error = %e, "Listing messages failed, no new candidates");
                return Ok(0);
            }
        };

        let mut scheduled = 0;
        for message in messages.iter().take(self.capacity()).rev() {
            let detail = match source.fetch_message_detail(&message.id).await {
                Ok(detail) => detail,
                Err(e) => {
                    warn!(%target, message_id = %message.id, error = %e, "Skipping message");
                    continue;
                }
            };
            scheduled += self.admit_and_schedule(target, &detail)?;
        }
        Ok(scheduled)
    }

    /// Selects today's image for `target`, persists the queue and downloads the image.
    ///
    /// The queue is written even when no image is due, so admissions made
    /// earlier in the cycle survive.
    ///
    /// # Errors
    ///
    /// Returns `Error::NoDueItem` if nothing is due, or an I/O or provider error.
    pub async fn get_due_image<S: MailSource>(
        &self,
        target: Target,
        source: &S,
    ) -> Result<(DueImage, Vec<u8>)> {
        let due = self.next_due(target);
        self.save(target)?;
        let due = due?;

        let bytes = source
            .fetch_attachment_bytes(&due.image.message_id, &due.image.temporary_attachment_id)
            .await?;
        info!(
            %target,
            unique_attachment_id = %due.image.unique_attachment_id,
            index = due.index,
            bytes = bytes.len(),
            "Image ready for display"
        );
        Ok((due, bytes))
    }

    /// Runs one full display cycle: pull, look up, persist, download.
    ///
    /// Taking `&mut self` serializes cycles, so a save never races an admission.
    ///
    /// # Errors
    ///
    /// See [`Scheduler::pull_attachments`] and [`Scheduler::get_due_image`].
    pub async fn display_cycle<S: MailSource>(
        &mut self,
        target: Target,
        source: &S,
    ) -> Result<(DueImage, Vec<u8>)> {
        self.pull_attachments(target, source).await?;
        self.get_due_image(target, source).await
    }

    const fn frame(&self, target: Target) -> &FrameState {
        match target {
            Target::SatelliteFrame => &self.satellite,
            Target::EarthFrame => &self.earth,
        }
    }

    const fn frame_mut(&mut self, target: Target) -> &mut FrameState {
        match target {
            Target::SatelliteFrame => &mut self.satellite,
            Target::EarthFrame => &mut self.earth,
        }
    }
}
