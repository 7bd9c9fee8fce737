// ocarina-tutor -- fingering tutor and practice synthesizer for the 12-hole ocarina
// Copyright (C) 2024  The ocarina-tutor authors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Cancellable deadlines on the sample clock.

use std::collections::BTreeMap;

use crate::scheduler::SessionToken;
use crate::wave::Sample;

/// What a deadline wakes up.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Wakeup {
    /// The next event of a playback session is due.
    Playback { session: SessionToken },
    /// The fade after stopping a session is over.
    Settle { session: SessionToken },
    Metronome { generation: u64 },
    /// The next step of the rhythm drill.
    Rhythm { generation: u64 },
}

/// Identifies a scheduled deadline for cancellation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerHandle {
    deadline: Sample,
    id: u64,
}

impl TimerHandle {
    pub fn deadline(&self) -> Sample {
        self.deadline
    }
}

/// Deadlines ordered by time. Deadlines at the same sample fire in the order
/// they were scheduled.
pub struct Timers<T> {
    next_id: u64,
    queue: BTreeMap<TimerHandle, T>,
}

impl<T> Default for Timers<T> {
    fn default() -> Self {
        Timers::new()
    }
}

impl<T> Timers<T> {
    pub fn new() -> Self {
        Timers {
            next_id: 0,
            queue: BTreeMap::new(),
        }
    }

    pub fn schedule_at(&mut self, deadline: Sample, payload: T) -> TimerHandle {
        let handle = TimerHandle {
            deadline,
            id: self.next_id,
        };
        self.next_id += 1;
        self.queue.insert(handle, payload);
        handle
    }

    /// Remove a pending deadline. Returns `None` if it already fired or was cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> Option<T> {
        self.queue.remove(&handle)
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.queue.contains_key(&handle)
    }

    pub fn next_deadline(&self) -> Option<Sample> {
        self.queue.keys().next().map(|handle| handle.deadline)
    }

    /// Take the earliest deadline that is due at `now`.
    pub fn pop_due(&mut self, now: Sample) -> Option<(TimerHandle, T)> {
        let handle = *self.queue.keys().next()?;
        if handle.deadline > now {
            return None;
        }
        self.queue.remove(&handle).map(|payload| (handle, payload))
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_in_deadline_then_schedule_order() {
        let mut timers = Timers::new();
        timers.schedule_at(30, "c");
        timers.schedule_at(10, "a");
        timers.schedule_at(10, "b");
        assert_eq!(timers.next_deadline(), Some(10));

        assert!(timers.pop_due(9).is_none());
        let fired: Vec<_> = std::iter::from_fn(|| timers.pop_due(10))
            .map(|(_, name)| name)
            .collect();
        assert_eq!(fired, vec!["a", "b"]);
        assert_eq!(timers.len(), 1);
        assert_eq!(timers.pop_due(100).map(|(h, n)| (h.deadline(), n)), Some((30, "c")));
        assert!(timers.is_empty());
    }

    #[test]
    fn cancelled_deadlines_never_fire() {
        let mut timers = Timers::new();
        let early = timers.schedule_at(5, 1);
        timers.schedule_at(8, 2);
        assert!(timers.is_pending(early));
        assert_eq!(timers.cancel(early), Some(1));
        assert_eq!(timers.cancel(early), None);
        assert!(!timers.is_pending(early));
        assert_eq!(timers.pop_due(10).map(|(_, v)| v), Some(2));
        assert_eq!(timers.pop_due(10), None);
    }
}
