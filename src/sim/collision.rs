//! Collision detection over the live participant set
//!
//! Every non-expired participant's outline is transformed once, then each
//! unordered pair is tested (bounding boxes first, then triangle overlap).
//! Pairs are returned as indices into the slice that was scanned, in a stable
//! order, so reactions can be dispatched without the set changing underneath.

use super::geometry::WorldOutline;
use super::participant::Participant;

/// An unordered colliding pair, as indices into the scanned slice (`first < second`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionPair {
    pub first: usize,
    pub second: usize,
}

/// Find all overlapping pairs among the non-expired participants
pub fn detect_collisions(participants: &[Participant]) -> Vec<CollisionPair> {
    let outlines: Vec<(usize, WorldOutline)> = participants
        .iter()
        .enumerate()
        .filter(|(_, p)| !p.is_expired())
        .map(|(i, p)| (i, p.transformed_outline()))
        .collect();

    let mut pairs = Vec::new();
    for (a, (first, outline_a)) in outlines.iter().enumerate() {
        for (second, outline_b) in &outlines[a + 1..] {
            if outline_a.overlaps(outline_b) {
                pairs.push(CollisionPair {
                    first: *first,
                    second: *second,
                });
            }
        }
    }
    pairs
}

/// Whether two participants' outlines overlap right now
pub fn participants_overlap(a: &Participant, b: &Participant) -> bool {
    if a.is_expired() || b.is_expired() {
        return false;
    }
    a.transformed_outline().overlaps(&b.transformed_outline())
}
