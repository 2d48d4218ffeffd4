//! Deferred one-shot timers keyed to participants
//!
//! A single min-heap ordered by (deadline, schedule sequence) replaces one
//! wall-clock timer per event. The clock is advanced by the simulation tick,
//! and due entries are handed back as a batch; callbacks run after the batch
//! is drained, so a callback may schedule new timers freely. Those land in the
//! heap and fire on a later advance, never in the batch that created them.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use serde::{Deserialize, Serialize};

use super::participant::ParticipantId;

/// What a timer asks its owner to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimerPayload {
    /// Lifetime ran out
    Expire,
    /// Alien saucer fire cadence
    Fire,
    /// Alien saucer direction change cadence
    ChangeDirection,
    /// Ship heartbeat sound
    Heartbeat,
    /// End of the ship's invulnerability window
    EndInvulnerability,
}

/// A due timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timer {
    pub owner: ParticipantId,
    pub payload: TimerPayload,
    pub deadline_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Entry {
    deadline_ms: u64,
    seq: u64,
    owner: ParticipantId,
    payload: TimerPayload,
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.deadline_ms, self.seq).cmp(&(other.deadline_ms, other.seq))
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Default)]
pub struct Scheduler {
    queue: BinaryHeap<Reverse<Entry>>,
    now_ms: u64,
    next_seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulation clock (ms since the scheduler was created)
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Fire `payload` on `owner` once `delay_ms` has elapsed
    pub fn schedule(&mut self, owner: ParticipantId, payload: TimerPayload, delay_ms: u64) {
        let entry = Entry {
            deadline_ms: self.now_ms.saturating_add(delay_ms),
            seq: self.next_seq,
            owner,
            payload,
        };
        self.next_seq += 1;
        self.queue.push(Reverse(entry));
    }

    /// Move the clock forward and return every timer now due, earliest
    /// deadline first, ties in schedule order.
    pub fn advance(&mut self, elapsed_ms: u64) -> Vec<Timer> {
        self.now_ms = self.now_ms.saturating_add(elapsed_ms);
        let mut due = Vec::new();
        while let Some(Reverse(entry)) = self.queue.peek() {
            if entry.deadline_ms > self.now_ms {
                break;
            }
            let Some(Reverse(entry)) = self.queue.pop() else { break };
            due.push(Timer {
                owner: entry.owner,
                payload: entry.payload,
                deadline_ms: entry.deadline_ms,
            });
        }
        due
    }

    /// Drop every timer owned by one of `owners`
    pub fn cancel_owners(&mut self, owners: &[ParticipantId]) {
        if owners.is_empty() {
            return;
        }
        self.queue.retain(|Reverse(e)| !owners.contains(&e.owner));
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.queue.peek().map(|Reverse(e)| e.deadline_ms)
    }

    /// Pending timers for one owner
    pub fn pending_for(&self, owner: ParticipantId) -> usize {
        self.queue.iter().filter(|Reverse(e)| e.owner == owner).count()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
