use std::collections::BTreeMap;

use serde::Serialize;

use super::clients::ClientRegistry;
use super::types::VotableKind;

/// What the lobby screen shows: vote counts next to each submarine and game
/// mode, and a ready marker per client. `revision` moves on every change so
/// a renderer knows when to redraw.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LobbyView {
    sub_votes: BTreeMap<String, u8>,
    mode_votes: BTreeMap<String, u8>,
    ready: BTreeMap<u8, bool>,
    revision: u64,
    updated_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(skip)]
    known_submarines: Vec<String>,
    #[serde(skip)]
    known_modes: Vec<String>,
}

impl LobbyView {
    pub fn new(known_submarines: Vec<String>, known_modes: Vec<String>) -> Self {
        Self { known_submarines, known_modes, ..Default::default() }
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Empty when nobody voted for it, like the lobby list.
    pub fn vote_text(&self, kind: VotableKind, name: &str) -> String {
        match self.counts(kind).get(name) {
            Some(&votes) if votes > 0 => votes.to_string(),
            _ => String::new(),
        }
    }

    pub fn is_ready(&self, client_id: u8) -> bool {
        self.ready.get(&client_id).copied().unwrap_or(false)
    }

    pub fn clear_votes(&mut self, kind: VotableKind) {
        self.counts_mut(kind).clear();
        self.mark_dirty();
    }

    /// Names not in the lobby list are ignored.
    pub fn set_vote_count(&mut self, kind: VotableKind, name: &str, votes: u8) {
        let known = match kind {
            VotableKind::Sub => &self.known_submarines,
            VotableKind::Mode => &self.known_modes,
        };
        if !known.iter().any(|k| k == name) {
            tracing::debug!("no lobby entry for {kind:?} votable \"{name}\"");
            return;
        }
        self.counts_mut(kind).insert(name.to_string(), votes);
        self.mark_dirty();
    }

    /// `None` clears every ready marker.
    pub fn update_ready(&mut self, clients: Option<&ClientRegistry>) {
        self.ready.clear();
        if let Some(clients) = clients {
            self.ready.extend(clients.iter().map(|c| (c.id, c.is_ready())));
        }
        self.mark_dirty();
    }

    pub fn mark_dirty(&mut self) {
        self.revision += 1;
        self.updated_at = Some(chrono::Utc::now());
    }

    pub fn reset(&mut self) {
        self.sub_votes.clear();
        self.mode_votes.clear();
        self.ready.clear();
        self.mark_dirty();
    }

    fn counts(&self, kind: VotableKind) -> &BTreeMap<String, u8> {
        match kind {
            VotableKind::Sub => &self.sub_votes,
            VotableKind::Mode => &self.mode_votes,
        }
    }

    fn counts_mut(&mut self, kind: VotableKind) -> &mut BTreeMap<String, u8> {
        match kind {
            VotableKind::Sub => &mut self.sub_votes,
            VotableKind::Mode => &mut self.mode_votes,
        }
    }
}
