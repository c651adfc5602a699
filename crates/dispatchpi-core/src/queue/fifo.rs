//! Date-assigning first-in first-out queue.

use std::collections::VecDeque;

use chrono::{Days, NaiveDate};

use super::model::EmailImage;
use crate::{Error, Result};

/// First-in first-out queue of images, one display day per image.
///
/// Images are appended in arrival order and each one is given the day after the
/// previous image, or today when the queue has fallen behind. Display dates are
/// therefore strictly increasing from front to back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FifoQueue {
    elements: VecDeque<EmailImage>,
}

impl FifoQueue {
    /// Creates an empty queue.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            elements: VecDeque::new(),
        }
    }

    /// Number of queued images.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Returns true if the queue holds no images.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Iterates front to back.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &EmailImage> {
        self.elements.iter()
    }

    /// Returns the image at `index`, counting from the front.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&EmailImage> {
        self.elements.get(index)
    }

    /// Returns the most recently enqueued image.
    #[must_use]
    pub fn back(&self) -> Option<&EmailImage> {
        self.elements.back()
    }

    /// Returns true if an image with this attachment identity is queued.
    #[must_use]
    pub fn contains(&self, unique_attachment_id: &str) -> bool {
        self.elements
            .iter()
            .any(|e| e.unique_attachment_id == unique_attachment_id)
    }

    /// Computes the display date the next enqueued image would receive.
    ///
    /// # Errors
    ///
    /// Returns `Error::DateOutOfRange` if the day after the last date does not exist.
    pub fn next_display_date(&self, today: NaiveDate) -> Result<NaiveDate> {
        match self.elements.back().and_then(|last| last.display_date) {
            Some(last) if last >= today => last
                .checked_add_days(Days::new(1))
                .ok_or(Error::DateOutOfRange),
            _ => Ok(today),
        }
    }

    /// Assigns the next display date to `item` and appends it.
    ///
    /// Any display date already set on `item` is overwritten. Returns the assigned date.
    ///
    /// # Errors
    ///
    /// Returns `Error::DateOutOfRange` if no next date can be computed.
    pub fn enqueue(&mut self, mut item: EmailImage, today: NaiveDate) -> Result<NaiveDate> {
        let display_date = self.next_display_date(today)?;
        item.display_date = Some(display_date);
        self.elements.push_back(item);
        Ok(display_date)
    }

    /// Removes and returns the front image.
    ///
    /// # Errors
    ///
    /// Returns `Error::EmptyQueue` if the queue is empty.
    pub fn dequeue(&mut self) -> Result<EmailImage> {
        self.elements.pop_front().ok_or(Error::EmptyQueue)
    }

    /// Finds the first image whose display date is `today` or later.
    #[must_use]
    pub fn first_due(&self, today: NaiveDate) -> Option<(usize, &EmailImage)> {
        self.elements
            .iter()
            .enumerate()
            .find(|(_, e)| e.is_due_on_or_after(today))
    }

    /// Replaces the queue contents, keeping the given order.
    pub(crate) fn replace(&mut self, elements: impl IntoIterator<Item = EmailImage>) {
        self.elements = elements.into_iter().collect();
    }
}

impl<'a> IntoIterator for &'a FifoQueue {
    type Item = &'a EmailImage;
    type IntoIter = std::collections::vec_deque::Iter<'a, EmailImage>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

impl FromIterator<EmailImage> for FifoQueue {
    fn from_iter<I: IntoIterator<Item = EmailImage>>(iter: I) -> Self {
        Self {
            elements: iter.into_iter().collect(),
        }
    }
}
