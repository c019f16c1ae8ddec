use std::collections::HashMap;

use serde::Serialize;

use super::types::{Ballot, VoteType};
use crate::wire::{CodecError, MessageReader, MessageWriter};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectedClient {
    pub id: u8,
    pub name: String,
    pub in_game: bool,
    pub ballots: HashMap<VoteType, Ballot>,
}

impl ConnectedClient {
    pub fn new(id: u8, name: impl Into<String>, in_game: bool) -> Self {
        Self { id, name: name.into(), in_game, ballots: HashMap::new() }
    }

    pub fn vote(&self, vote_type: VoteType) -> Ballot {
        self.ballots.get(&vote_type).copied().unwrap_or_default()
    }

    pub fn is_ready(&self) -> bool {
        self.vote(VoteType::StartRound) == Ballot::Yes
    }
}

/// Clients currently connected to the server, in roster order.
#[derive(Debug, Default, Clone)]
pub struct ClientRegistry {
    clients: Vec<ConnectedClient>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find(&self, id: u8) -> Option<&ConnectedClient> {
        self.clients.iter().find(|c| c.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConnectedClient> {
        self.clients.iter()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Returns false when no client with `id` is connected.
    pub fn set_vote(&mut self, id: u8, vote_type: VoteType, ballot: Ballot) -> bool {
        match self.clients.iter_mut().find(|c| c.id == id) {
            Some(client) => {
                client.ballots.insert(vote_type, ballot);
                true
            }
            None => false,
        }
    }

    pub fn reset_votes(&mut self, vote_type: VoteType) {
        for client in &mut self.clients {
            client.ballots.insert(vote_type, Ballot::NotVoted);
        }
    }

    /// Swap in a new roster. Clients that stay connected keep their ballots.
    pub fn replace_all(&mut self, roster: Vec<ConnectedClient>) {
        let mut previous: HashMap<u8, ConnectedClient> =
            self.clients.drain(..).map(|c| (c.id, c)).collect();
        self.clients = roster
            .into_iter()
            .map(|mut client| {
                if let Some(old) = previous.remove(&client.id) {
                    client.ballots = old.ballots;
                }
                client
            })
            .collect();
    }

    pub fn clear(&mut self) {
        self.clients.clear();
    }
}

/// Roster body: byte count, then (byte id, bool in_game, string name) per client.
pub fn read_client_list(bytes: &[u8]) -> Result<Vec<ConnectedClient>, CodecError> {
    let mut reader = MessageReader::new(bytes);
    let count = reader.read_u8()?;
    let mut roster = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let id = reader.read_u8()?;
        let in_game = reader.read_bool()?;
        let name = reader.read_string()?;
        roster.push(ConnectedClient::new(id, name, in_game));
    }
    reader.read_pad_bits();
    Ok(roster)
}

pub fn write_client_list(roster: &[ConnectedClient]) -> Vec<u8> {
    let mut writer = MessageWriter::new();
    writer.write_u8(roster.len().min(u8::MAX as usize) as u8);
    for client in roster.iter().take(u8::MAX as usize) {
        writer.write_u8(client.id);
        writer.write_bool(client.in_game);
        writer.write_string(&client.name);
    }
    writer.write_pad_bits();
    writer.into_bytes()
}
