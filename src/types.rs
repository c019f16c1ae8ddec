use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use crate::vote::host::HostRecord;
use crate::vote::projection::LobbyView;
use crate::vote::session::ActiveVoteSummary;
use crate::vote::tally::Tally;
use crate::vote::update::VoteSettings;
use crate::vote::{ConnectedClient, RecordingHost, VoteSession, VoteType};

/// Everything the transport task mutates and the status server reads.
#[derive(Debug)]
pub struct ClientState {
    pub session: VoteSession,
    pub host: RecordingHost,
    pub connected: bool,
}

pub type SharedState = Arc<Mutex<ClientState>>;

#[derive(Debug, Clone, Serialize)]
pub struct TallyEntry {
    pub vote_type: VoteType,
    #[serde(flatten)]
    pub tally: Tally,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub connected: bool,
    pub settings: VoteSettings,
    pub tallies: Vec<TallyEntry>,
    pub last_vote: Option<ActiveVoteSummary>,
    pub clients: Vec<ConnectedClient>,
    pub lobby: LobbyView,
    pub recent_events: Vec<HostRecord>,
    pub owned_submarines: Vec<String>,
    pub current_submarine: Option<String>,
    pub submarine_refresh_required: bool,
}

impl ClientState {
    pub fn new(session: VoteSession) -> Self {
        Self { session, host: RecordingHost::new(), connected: false }
    }

    pub fn shared(session: VoteSession) -> SharedState {
        Arc::new(Mutex::new(Self::new(session)))
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            connected: self.connected,
            settings: self.session.settings(),
            tallies: self
                .session
                .tallies()
                .snapshot()
                .into_iter()
                .map(|(vote_type, tally)| TallyEntry { vote_type, tally })
                .collect(),
            last_vote: self.session.last_vote().cloned(),
            clients: self.session.clients().iter().cloned().collect(),
            lobby: self.session.lobby().clone(),
            recent_events: self.host.recent_events(),
            owned_submarines: self.host.owned_submarines().to_vec(),
            current_submarine: self.host.current_submarine().map(str::to_string),
            submarine_refresh_required: self.session.submarine_refresh_required(),
        }
    }
}
