// src/models/scoreboard.rs
use serde::Serialize;
use std::collections::BTreeMap;
use std::net::IpAddr;
use tokio::time::Instant;

use crate::ranking::rank;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ServerSummary {
    pub description: String,
    pub game_mode: String,
    pub map: String,
    pub max_clients: i32,
    pub secs_left: i32,
    pub num_clients: i32,
    pub protocol_version: i32,
    pub master_mode: String,
    pub paused: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientRecord {
    pub name: String,
    pub id: i32,
    pub ip: IpAddr,
    pub frags: i32,
    pub deaths: i32,
    pub teamkills: i32,
    pub accuracy: i32,
    pub health: i32,
    pub weapon: String,
    pub ping: i32,
    pub team: String,
    pub flags: i32,
    pub armour: i32,
}

/// One consistent view of the game server: summary and clients come from the
/// same fetch and are never modified after construction.
#[derive(Debug)]
pub struct Snapshot {
    pub summary: ServerSummary,
    pub clients: BTreeMap<i32, ClientRecord>,
    pub expiry: Instant,
}

impl Snapshot {
    pub fn new(summary: ServerSummary, clients: BTreeMap<i32, ClientRecord>, expiry: Instant) -> Self {
        Self { summary, clients, expiry }
    }

    /// Placeholder held before the first refresh. Already expired at `now`.
    pub fn empty(now: Instant) -> Self {
        Self::new(ServerSummary::default(), BTreeMap::new(), now)
    }

    pub fn is_fresh(&self, now: Instant) -> bool {
        now < self.expiry
    }
}

/// What the page template and the JSON endpoint get to see.
#[derive(Debug, Clone, Serialize)]
pub struct Scoreboard {
    pub description: String,
    pub mode: String,
    pub map: String,
    pub max_clients: i32,
    pub secs_left: i32,
    pub num_clients: i32,
    pub master_mode: String,
    pub paused: bool,
    pub clients: Vec<ClientRecord>,
}

impl From<&Snapshot> for Scoreboard {
    fn from(snapshot: &Snapshot) -> Self {
        let summary = &snapshot.summary;
        Self {
            description: summary.description.clone(),
            mode: summary.game_mode.clone(),
            map: summary.map.clone(),
            max_clients: summary.max_clients,
            secs_left: summary.secs_left,
            num_clients: summary.num_clients,
            master_mode: summary.master_mode.clone(),
            paused: summary.paused,
            clients: rank(snapshot).into_iter().cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use std::time::Duration;

    fn client(id: i32, name: &str, frags: i32) -> ClientRecord {
        ClientRecord {
            name: name.to_string(),
            id,
            ip: IpAddr::V4(Ipv4Addr::new(10, 0, 0, 0)),
            frags,
            deaths: 0,
            teamkills: 0,
            accuracy: 0,
            health: 100,
            weapon: "rifle".to_string(),
            ping: 0,
            team: "good".to_string(),
            flags: 0,
            armour: 0,
        }
    }

    #[test]
    fn empty_snapshot_is_already_stale() {
        let now = Instant::now();
        let snapshot = Snapshot::empty(now);
        assert!(!snapshot.is_fresh(now));
        assert!(snapshot.clients.is_empty());
    }

    #[test]
    fn snapshot_is_fresh_until_expiry() {
        let now = Instant::now();
        let snapshot = Snapshot::new(ServerSummary::default(), BTreeMap::new(), now + Duration::from_secs(1));
        assert!(snapshot.is_fresh(now + Duration::from_millis(999)));
        assert!(!snapshot.is_fresh(now + Duration::from_secs(1)));
    }

    #[test]
    fn scoreboard_carries_summary_and_ranked_clients() {
        let summary = ServerSummary {
            description: "public server".to_string(),
            game_mode: "insta ctf".to_string(),
            map: "reissen".to_string(),
            max_clients: 16,
            secs_left: 420,
            num_clients: 2,
            ..Default::default()
        };
        let clients = BTreeMap::from([(0, client(0, "alice", 3)), (4, client(4, "bob", 12))]);
        let snapshot = Snapshot::new(summary, clients, Instant::now());

        let board = Scoreboard::from(&snapshot);
        assert_eq!(board.mode, "insta ctf");
        assert_eq!(board.map, "reissen");
        assert_eq!(board.secs_left, 420);
        let names: Vec<&str> = board.clients.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["bob", "alice"]);
    }
}
