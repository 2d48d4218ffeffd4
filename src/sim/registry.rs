//! Participant registry ("pstate")
//!
//! Owns every participant. Additions made while a move/collide pass is running
//! are staged and only join the live set at the next sweep; removals are
//! mark-and-sweep, so a pass never sees the live vector shrink under it.
//! Live participants stay sorted by id (ids are handed out in increasing
//! order and never reused).

use super::participant::{Capabilities, Category, Participant, ParticipantId};

#[derive(Debug)]
pub struct ParticipantRegistry {
    live: Vec<Participant>,
    staged: Vec<Participant>,
    in_pass: bool,
    next_id: u64,
}

impl Default for ParticipantRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ParticipantRegistry {
    pub fn new() -> Self {
        Self {
            live: Vec::new(),
            staged: Vec::new(),
            in_pass: false,
            next_id: 1,
        }
    }

    /// Admit a participant, assigning its id
    pub fn add(&mut self, mut participant: Participant) -> ParticipantId {
        let id = ParticipantId(self.next_id);
        self.next_id += 1;
        participant.id = id;
        if self.in_pass {
            self.staged.push(participant);
        } else {
            self.live.push(participant);
        }
        id
    }

    /// Mark expired; idempotent. Returns true if the participant was newly expired.
    pub fn expire(&mut self, id: ParticipantId) -> bool {
        self.get_mut(id).map(|p| p.expire()).unwrap_or(false)
    }

    pub(crate) fn begin_pass(&mut self) {
        debug_assert!(!self.in_pass, "nested registry pass");
        self.in_pass = true;
    }

    pub(crate) fn end_pass(&mut self) {
        self.in_pass = false;
    }

    pub fn in_pass(&self) -> bool {
        self.in_pass
    }

    /// Drop expired participants and promote staged ones.
    /// Returns the ids that were removed.
    pub fn sweep(&mut self) -> Vec<ParticipantId> {
        debug_assert!(!self.in_pass, "sweep during a pass");
        let mut removed = Vec::new();
        self.live.retain(|p| {
            if p.is_expired() {
                removed.push(p.id());
                false
            } else {
                true
            }
        });
        for p in self.staged.drain(..) {
            if p.is_expired() {
                removed.push(p.id());
            } else {
                self.live.push(p);
            }
        }
        removed
    }

    pub fn get(&self, id: ParticipantId) -> Option<&Participant> {
        match self.live.binary_search_by_key(&id, |p| p.id()) {
            Ok(idx) => Some(&self.live[idx]),
            Err(_) => self.staged.iter().find(|p| p.id() == id),
        }
    }

    pub fn get_mut(&mut self, id: ParticipantId) -> Option<&mut Participant> {
        match self.live.binary_search_by_key(&id, |p| p.id()) {
            Ok(idx) => Some(&mut self.live[idx]),
            Err(_) => self.staged.iter_mut().find(|p| p.id() == id),
        }
    }

    /// Live, non-expired participants in id order. Staged additions are not
    /// included until the next sweep.
    pub fn iter_live(&self) -> impl Iterator<Item = &Participant> + '_ {
        self.live.iter().filter(|p| !p.is_expired())
    }

    /// Whole live vector (expired entries included until swept)
    pub(crate) fn live(&self) -> &[Participant] {
        &self.live
    }

    pub(crate) fn live_mut(&mut self) -> &mut [Participant] {
        &mut self.live
    }

    pub fn count_by_category(&self, category: Category) -> usize {
        self.iter_live().filter(|p| p.category() == category).count()
    }

    /// Count of live participants carrying every tag in `capabilities`
    pub fn count_with(&self, capabilities: Capabilities) -> usize {
        self.iter_live()
            .filter(|p| p.capabilities().contains(capabilities))
            .count()
    }

    /// First live participant of a category
    pub fn find(&self, category: Category) -> Option<&Participant> {
        self.iter_live().find(|p| p.category() == category)
    }

    pub fn len(&self) -> usize {
        self.iter_live().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove everything. Ids keep increasing.
    pub fn clear(&mut self) -> Vec<ParticipantId> {
        let removed = self
            .live
            .drain(..)
            .chain(self.staged.drain(..))
            .map(|p| p.id())
            .collect();
        self.in_pass = false;
        removed
    }
}
