// src/query/mod.rs
pub mod codec;
pub mod extinfo;

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

use crate::models::scoreboard::{ClientRecord, ServerSummary};

/// Where the game server's info port lives and how long to wait for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    pub addr: SocketAddr,
    pub timeout: Duration,
}

impl Target {
    pub fn new(addr: SocketAddr, timeout: Duration) -> Self {
        Self { addr, timeout }
    }
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("i/o error talking to game server: {0}")]
    Io(#[from] std::io::Error),
    #[error("game server did not answer within {0:?}")]
    Timeout(Duration),
    #[error("malformed reply from game server: {0}")]
    Malformed(String),
    #[error("game server reported an extinfo error")]
    Rejected,
}

/// Access to the game server's status protocol.
#[async_trait]
pub trait ServerQuery: Send + Sync {
    async fn fetch_server_summary(&self, target: &Target) -> Result<ServerSummary, QueryError>;

    async fn fetch_all_client_records(
        &self,
        target: &Target,
    ) -> Result<BTreeMap<i32, ClientRecord>, QueryError>;
}
