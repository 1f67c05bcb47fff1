// src/query/extinfo.rs
use async_trait::async_trait;
use log::debug;
use std::collections::BTreeMap;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;
use tokio::net::UdpSocket;

use super::codec::{put_int, PacketReader};
use super::{QueryError, ServerQuery, Target};
use crate::models::scoreboard::{ClientRecord, ServerSummary};

const MAX_PACKET: usize = 5000;

const BASIC_INFO: i32 = 1;
const EXTENDED_INFO: i32 = 0;
const EXT_PLAYERSTATS: i32 = 1;
const ALL_CLIENTS: i32 = -1;

const EXT_ACK: i32 = -1;
const EXT_VERSION: i32 = 105;
const EXT_NO_ERROR: i32 = 0;
const EXT_PLAYERSTATS_RESP_IDS: i32 = -10;
const EXT_PLAYERSTATS_RESP_STATS: i32 = -11;

const GAME_MODES: [&str; 23] = [
    "ffa",
    "coop edit",
    "teamplay",
    "instagib",
    "instagib team",
    "efficiency",
    "efficiency team",
    "tactics",
    "tactics team",
    "capture",
    "regen capture",
    "ctf",
    "insta ctf",
    "protect",
    "insta protect",
    "hold",
    "insta hold",
    "efficiency ctf",
    "efficiency protect",
    "efficiency hold",
    "collect",
    "insta collect",
    "efficiency collect",
];

const WEAPONS: [&str; 7] = [
    "chainsaw",
    "shotgun",
    "chaingun",
    "rocket launcher",
    "rifle",
    "grenade launcher",
    "pistol",
];

fn game_mode_name(mode: i32) -> &'static str {
    usize::try_from(mode)
        .ok()
        .and_then(|i| GAME_MODES.get(i))
        .copied()
        .unwrap_or("unknown")
}

fn weapon_name(gun: i32) -> &'static str {
    usize::try_from(gun)
        .ok()
        .and_then(|i| WEAPONS.get(i))
        .copied()
        .unwrap_or("unknown")
}

fn master_mode_name(mode: i32) -> &'static str {
    match mode {
        -1 => "auth",
        0 => "open",
        1 => "veto",
        2 => "locked",
        3 => "private",
        4 => "password",
        _ => "unknown",
    }
}

fn basic_info_request() -> Vec<u8> {
    let mut buf = Vec::new();
    put_int(&mut buf, BASIC_INFO);
    buf
}

fn client_info_request() -> Vec<u8> {
    let mut buf = Vec::new();
    put_int(&mut buf, EXTENDED_INFO);
    put_int(&mut buf, EXT_PLAYERSTATS);
    put_int(&mut buf, ALL_CLIENTS);
    buf
}

/// Talks to a Sauerbraten server's info port over UDP. A fresh socket is
/// opened for every call, so one client can be shared between tasks.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExtInfoClient;

impl ExtInfoClient {
    pub fn new() -> Self {
        Self
    }

    async fn open(target: &Target) -> Result<UdpSocket, QueryError> {
        let local = if target.addr.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
        let socket = UdpSocket::bind(local).await?;
        socket.connect(target.addr).await?;
        Ok(socket)
    }

    async fn receive(socket: &UdpSocket, buf: &mut [u8], timeout: Duration) -> Result<usize, QueryError> {
        match tokio::time::timeout(timeout, socket.recv(buf)).await {
            Ok(received) => Ok(received?),
            Err(_) => Err(QueryError::Timeout(timeout)),
        }
    }
}

#[async_trait]
impl ServerQuery for ExtInfoClient {
    async fn fetch_server_summary(&self, target: &Target) -> Result<ServerSummary, QueryError> {
        let socket = Self::open(target).await?;
        let request = basic_info_request();
        socket.send(&request).await?;

        let mut buf = [0u8; MAX_PACKET];
        let len = Self::receive(&socket, &mut buf, target.timeout).await?;
        debug!("Basic info reply from {} ({} bytes)", target.addr, len);
        parse_basic_info(&request, &buf[..len])
    }

    async fn fetch_all_client_records(
        &self,
        target: &Target,
    ) -> Result<BTreeMap<i32, ClientRecord>, QueryError> {
        let socket = Self::open(target).await?;
        let request = client_info_request();
        socket.send(&request).await?;

        let mut buf = [0u8; MAX_PACKET];
        let len = Self::receive(&socket, &mut buf, target.timeout).await?;
        let ids = parse_client_ids(&request, &buf[..len])?;
        debug!("Server {} reports {} clients", target.addr, ids.len());

        let mut clients = BTreeMap::new();
        for _ in 0..ids.len() {
            let len = Self::receive(&socket, &mut buf, target.timeout).await?;
            let client = parse_client_stats(&request, &buf[..len])?;
            clients.insert(client.id, client);
        }
        Ok(clients)
    }
}

pub fn parse_basic_info(request: &[u8], packet: &[u8]) -> Result<ServerSummary, QueryError> {
    let mut p = PacketReader::new(packet);
    p.expect_echo(request)?;

    let num_clients = p.get_int()?;
    let num_attrs = p.get_int()?;
    if num_attrs < 5 {
        return Err(QueryError::Malformed(format!("expected at least 5 attributes, got {}", num_attrs)));
    }
    // every attribute takes at least one byte
    if num_attrs as usize > p.remaining() {
        return Err(QueryError::Malformed(format!("{} attributes announced in a {} byte reply", num_attrs, packet.len())));
    }
    let mut attrs = Vec::new();
    for _ in 0..num_attrs {
        attrs.push(p.get_int()?);
    }
    let map = p.get_string()?;
    let description = p.get_string()?;

    Ok(ServerSummary {
        description,
        game_mode: game_mode_name(attrs[1]).to_string(),
        map,
        max_clients: attrs[3],
        secs_left: attrs[2],
        num_clients,
        protocol_version: attrs[0],
        master_mode: master_mode_name(attrs[4]).to_string(),
        paused: attrs.get(5).is_some_and(|&paused| paused != 0),
    })
}

fn read_ext_header(p: &mut PacketReader<'_>, request: &[u8], kind: i32) -> Result<(), QueryError> {
    p.expect_echo(request)?;
    if p.get_int()? != EXT_ACK {
        return Err(QueryError::Malformed("missing extinfo ack".to_string()));
    }
    let version = p.get_int()?;
    if version != EXT_VERSION {
        return Err(QueryError::Malformed(format!("unsupported extinfo version {}", version)));
    }
    if p.get_int()? != EXT_NO_ERROR {
        return Err(QueryError::Rejected);
    }
    let found = p.get_int()?;
    if found != kind {
        return Err(QueryError::Malformed(format!("expected reply type {}, got {}", kind, found)));
    }
    Ok(())
}

pub fn parse_client_ids(request: &[u8], packet: &[u8]) -> Result<Vec<i32>, QueryError> {
    let mut p = PacketReader::new(packet);
    read_ext_header(&mut p, request, EXT_PLAYERSTATS_RESP_IDS)?;
    let mut ids = Vec::new();
    while p.remaining() > 0 {
        ids.push(p.get_int()?);
    }
    Ok(ids)
}

pub fn parse_client_stats(request: &[u8], packet: &[u8]) -> Result<ClientRecord, QueryError> {
    let mut p = PacketReader::new(packet);
    read_ext_header(&mut p, request, EXT_PLAYERSTATS_RESP_STATS)?;

    let id = p.get_int()?;
    let ping = p.get_int()?;
    let name = p.get_string()?;
    let team = p.get_string()?;
    let frags = p.get_int()?;
    let flags = p.get_int()?;
    let deaths = p.get_int()?;
    let teamkills = p.get_int()?;
    let accuracy = p.get_int()?;
    let health = p.get_int()?;
    let armour = p.get_int()?;
    let gun = p.get_int()?;
    let _privilege = p.get_int()?;
    let _state = p.get_int()?;
    // the server withholds the last octet
    let ip = p.get_bytes(3)?;

    Ok(ClientRecord {
        name,
        id,
        ip: IpAddr::V4(Ipv4Addr::new(ip[0], ip[1], ip[2], 0)),
        frags,
        deaths,
        teamkills,
        accuracy,
        health,
        weapon: weapon_name(gun).to_string(),
        ping,
        team,
        flags,
        armour,
    })
}
