use std::time::Duration;

use serde::Serialize;

use super::clients::{ClientRegistry, ConnectedClient};
use super::host::VoteHost;
use super::projection::LobbyView;
use super::tally::{Tally, TallyStore};
use super::types::{Ballot, SubmarineInfo, VotableKind, VoteState, VoteType};
use super::update::{
    decode_vote_update, ActiveVote, Initiation, PendingSubmarineVote, VotableCount, VotePhase,
    VoteSettings, VoteUpdate,
};
use crate::error::VoteError;

/// Result of applying one update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Set when the vote's application was abandoned part way.
    pub aborted: Option<VoteError>,
    pub ready_applied: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActiveVoteSummary {
    pub state: VoteState,
    pub vote_type: VoteType,
    pub tally: Tally,
}

/// Vote state for one network session. Owned by the single task that reads
/// the connection; dropped or [`reset`](Self::reset) on disconnect.
#[derive(Debug, Default)]
pub struct VoteSession {
    local_client_id: u8,
    settings: VoteSettings,
    tallies: TallyStore,
    clients: ClientRegistry,
    server_submarines: Vec<SubmarineInfo>,
    lobby: LobbyView,
    last_vote: Option<ActiveVoteSummary>,
    submarine_refresh_required: bool,
}

impl VoteSession {
    pub fn new(local_client_id: u8, server_submarines: Vec<SubmarineInfo>, game_modes: Vec<String>) -> Self {
        let lobby = LobbyView::new(
            server_submarines.iter().map(|s| s.name.clone()).collect(),
            game_modes,
        );
        Self { local_client_id, server_submarines, lobby, ..Default::default() }
    }

    pub fn settings(&self) -> VoteSettings {
        self.settings
    }

    pub fn tallies(&self) -> &TallyStore {
        &self.tallies
    }

    pub fn clients(&self) -> &ClientRegistry {
        &self.clients
    }

    pub fn lobby(&self) -> &LobbyView {
        &self.lobby
    }

    pub fn last_vote(&self) -> Option<&ActiveVoteSummary> {
        self.last_vote.as_ref()
    }

    pub fn submarine_refresh_required(&self) -> bool {
        self.submarine_refresh_required
    }

    pub fn take_submarine_refresh(&mut self) -> bool {
        std::mem::take(&mut self.submarine_refresh_required)
    }

    pub fn set_yes(&mut self, vote_type: VoteType, value: u32) {
        self.tallies.set_yes(vote_type, value);
        self.lobby.mark_dirty();
    }

    pub fn set_no(&mut self, vote_type: VoteType, value: u32) {
        self.tallies.set_no(vote_type, value);
        self.lobby.mark_dirty();
    }

    pub fn set_max(&mut self, vote_type: VoteType, value: u32) {
        self.tallies.set_max(vote_type, value);
        self.lobby.mark_dirty();
    }

    pub fn set_clients(&mut self, roster: Vec<ConnectedClient>) {
        self.clients.replace_all(roster);
        self.lobby.update_ready(Some(&self.clients));
    }

    pub fn local_in_game(&self) -> bool {
        self.clients.find(self.local_client_id).is_some_and(|c| c.in_game)
    }

    /// Decode and apply one vote message. Malformed input is logged and
    /// dropped without touching state.
    pub fn receive(&mut self, bytes: &[u8], host: &mut dyn VoteHost) -> Result<ApplyReport, VoteError> {
        let update = decode_vote_update(bytes, self.local_in_game()).map_err(|e| {
            tracing::error!("failed to decode vote update ({} bytes): {e}", bytes.len());
            VoteError::from(e)
        })?;
        Ok(self.apply(&update, host))
    }

    pub fn apply(&mut self, update: &VoteUpdate, host: &mut dyn VoteHost) -> ApplyReport {
        self.settings = update.settings;

        if let Some(votables) = &update.sub_votes {
            self.apply_votables(VotableKind::Sub, votables);
        }
        if let Some(votables) = &update.mode_votes {
            self.apply_votables(VotableKind::Mode, votables);
        }
        if let Some(end_round) = update.end_round {
            self.set_yes(VoteType::EndRound, end_round.yes as u32);
            self.set_max(VoteType::EndRound, end_round.max as u32);
        }

        let mut report = ApplyReport::default();

        if let Some(active) = &update.active {
            if let Err(e) = self.apply_active_vote(active, host) {
                tracing::error!("{e}");
                report.aborted = Some(e);
                return report;
            }
        }

        if let Some(ready) = &update.ready_clients {
            self.clients.reset_votes(VoteType::StartRound);
            for &id in ready {
                self.clients.set_vote(id, VoteType::StartRound, Ballot::Yes);
            }
            self.lobby.update_ready(Some(&self.clients));
            report.ready_applied = true;
        }

        report
    }

    fn apply_votables(&mut self, kind: VotableKind, votables: &[VotableCount]) {
        self.lobby.clear_votes(kind);
        for votable in votables {
            self.lobby.set_vote_count(kind, &votable.name, votable.votes);
        }
    }

    fn apply_active_vote(&mut self, active: &ActiveVote, host: &mut dyn VoteHost) -> Result<(), VoteError> {
        let vote_type = active.vote_type;

        for &id in &active.yes_voters {
            self.clients.set_vote(id, vote_type, Ballot::Yes);
        }
        for &id in &active.no_voters {
            self.clients.set_vote(id, vote_type, Ballot::No);
        }

        let yes = active.yes_voters.len() as u8;
        let no = active.no_voters.len() as u8;
        self.set_yes(vote_type, yes as u32);
        self.set_no(vote_type, no as u32);
        self.set_max(vote_type, active.max_voters as u32);
        self.last_vote = Some(ActiveVoteSummary {
            state: active.state,
            vote_type,
            tally: self.tallies.get(vote_type),
        });

        match &active.phase {
            VotePhase::Started { starter, timeout_secs, initiation } => {
                let timeout = Duration::from_secs(*timeout_secs as u64);
                let starter = self.clients.find(*starter);
                match initiation {
                    Initiation::Submarine { name, transfer_items } => {
                        let info = self.find_server_submarine(name)?;
                        host.show_submarine_vote(starter, info, vote_type, *transfer_items, timeout);
                    }
                    Initiation::TransferMoney { from, to, amount } => {
                        let from = self.clients.find(*from);
                        let to = self.clients.find(*to);
                        host.show_money_transfer_vote(starter, from, *amount, to, timeout);
                    }
                    Initiation::None | Initiation::Skipped => {}
                }
            }
            VotePhase::Running => {}
            VotePhase::Concluded { passed, submarine } => {
                let resolved = match submarine {
                    Some(pending) => Some((self.find_server_submarine(&pending.name)?.clone(), pending)),
                    None => None,
                };

                host.end_vote(*passed, yes, no);

                if let (true, Some((info, pending))) = (*passed, resolved) {
                    apply_submarine_outcome(host, vote_type, &info, pending);
                    self.submarine_refresh_required = true;
                }
            }
        }

        Ok(())
    }

    fn find_server_submarine(&self, name: &str) -> Result<&SubmarineInfo, VoteError> {
        self.server_submarines
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| VoteError::UnknownSubmarine(name.to_string()))
    }

    /// Session teardown: forget every vote, client and tally.
    pub fn reset(&mut self) {
        self.settings = VoteSettings::default();
        self.tallies.clear();
        self.clients.clear();
        self.last_vote = None;
        self.submarine_refresh_required = false;
        self.lobby.reset();
    }
}

fn apply_submarine_outcome(
    host: &mut dyn VoteHost,
    vote_type: VoteType,
    info: &SubmarineInfo,
    pending: &PendingSubmarineVote,
) {
    match vote_type {
        VoteType::PurchaseAndSwitchSub => {
            host.purchase_submarine(info);
            host.switch_submarine(info, pending.transfer_items, 0);
        }
        VoteType::PurchaseSub => host.purchase_submarine(info),
        VoteType::SwitchSub => {
            host.switch_submarine(info, pending.transfer_items, pending.delivery_fee as i32)
        }
        _ => {}
    }
}
