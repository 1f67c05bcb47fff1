// src/ranking.rs
use crate::models::scoreboard::{ClientRecord, Snapshot};

/// Orders the snapshot's clients by descending frags.
///
/// Clients are stored keyed by client number, so iteration starts in ascending
/// id order; the sort is stable and equal frags therefore keep that order.
pub fn rank(snapshot: &Snapshot) -> Vec<&ClientRecord> {
    let mut clients: Vec<&ClientRecord> = snapshot.clients.values().collect();
    clients.sort_by(|a, b| b.frags.cmp(&a.frags));
    clients
}
