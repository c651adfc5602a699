//! Property tests for queue scheduling invariants.

#![allow(clippy::unwrap_used)]

use std::collections::HashSet;
use std::num::NonZeroUsize;

use chrono::{Days, NaiveDate};
use proptest::prelude::*;

use dispatchpi_core::{Candidate, Clock, Scheduler, SchedulerConfig, SenderFilter, Target};

fn candidate(id: u8) -> Candidate {
    Candidate {
        unique_attachment_id: format!("m{id}_1"),
        temporary_attachment_id: format!("t{id}"),
        message_id: format!("m{id}"),
        text: String::new(),
    }
}

fn in_memory(capacity: usize, today: NaiveDate) -> Scheduler {
    // Never saved, so the directory is never created.
    Scheduler::new(SchedulerConfig {
        capacity: NonZeroUsize::new(capacity).unwrap(),
        filter: SenderFilter::default(),
        queue_dir: std::env::temp_dir().join("dispatchpi-unsaved"),
        clock: Clock::Fixed(today),
    })
}

proptest! {
    /// Dates stay strictly increasing and the queue stays bounded, across days.
    #[test]
    fn prop_dates_increase_and_size_bounded(
        capacity in 1usize..6,
        // (days to advance before admitting, attachment id)
        admissions in proptest::collection::vec((0u64..4, 0u8..12), 0..40),
    ) {
        let dir = tempfile::tempdir().unwrap();
        let mut day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let config = |today| SchedulerConfig {
            capacity: NonZeroUsize::new(capacity).unwrap(),
            filter: SenderFilter::default(),
            queue_dir: dir.path().to_path_buf(),
            clock: Clock::Fixed(today),
        };

        for (advance, id) in admissions {
            day = day + Days::new(advance);
            // Reopen so the clock reads the new day, as a restarted process would.
            let mut s = Scheduler::open(config(day));
            s.admit(Target::SatelliteFrame, candidate(id)).unwrap();
            s.save(Target::SatelliteFrame).unwrap();

            let queue = s.queue(Target::SatelliteFrame);
            prop_assert!(queue.len() <= capacity);
            let dates: Vec<_> = queue.iter().map(|e| e.display_date.unwrap()).collect();
            prop_assert!(dates.windows(2).all(|w| w[0] < w[1]));
            let mut seen = HashSet::new();
            prop_assert!(queue.iter().all(|e| seen.insert(e.unique_attachment_id.clone())));
        }
    }

    /// Admitting an already queued attachment changes nothing.
    #[test]
    fn prop_duplicate_admission_is_noop(
        ids in proptest::collection::vec(0u8..8, 1..20),
        pick in any::<prop::sample::Index>(),
    ) {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let mut s = in_memory(5, today);
        for id in &ids {
            s.admit(Target::EarthFrame, candidate(*id)).unwrap();
        }

        let before = s.queue(Target::EarthFrame).clone();
        let queued = before.get(pick.index(before.len())).unwrap().clone();
        let again = Candidate {
            unique_attachment_id: queued.unique_attachment_id.clone(),
            temporary_attachment_id: "refreshed-handle".to_string(),
            message_id: queued.message_id.clone(),
            text: "other".to_string(),
        };
        s.admit(Target::EarthFrame, again).unwrap();
        prop_assert_eq!(s.queue(Target::EarthFrame), &before);
    }
}
