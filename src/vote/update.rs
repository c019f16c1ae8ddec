//! Server -> client vote state message.
//!
//! Decoding is pure: it turns bytes into a [`VoteUpdate`] and never touches
//! session state. [`crate::vote::session::VoteSession::apply`] does the rest.
//!
//! Layout, in order:
//!
//! ```text
//! bool allowSub      [byte n, n x (byte votes, string name)]
//! bool allowMode     [byte n, n x (byte votes, string identifier)]
//! bool allowEndVote  [byte yes, byte max]
//! bool allowKick
//! byte voteState
//! if voteState != None:
//!     byte voteType
//!     byte n, n x byte yesClientId
//!     byte n, n x byte noClientId
//!     byte maxVoters
//!     Started:        byte starterId, byte timeoutSecs, [initiation payload]
//!     Running:        -
//!     Passed/Failed:  bool passed, [string sub, bool transferItems, i16 fee]
//! byte n, n x byte readyClientId
//! pad
//! ```

use serde::Serialize;

use super::types::{VoteState, VoteType};
use crate::wire::{CodecError, MessageReader, MessageWriter};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct VoteSettings {
    pub allow_sub_voting: bool,
    pub allow_mode_voting: bool,
    pub allow_end_voting: bool,
    pub allow_vote_kick: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VotableCount {
    pub votes: u8,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EndRoundTally {
    pub yes: u8,
    pub max: u8,
}

/// Submarine payload of a concluded purchase/switch vote. Used once, when
/// the update is applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingSubmarineVote {
    pub name: String,
    pub transfer_items: bool,
    pub delivery_fee: i16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Initiation {
    /// The vote type has no initiation payload.
    None,
    Submarine { name: String, transfer_items: bool },
    TransferMoney { from: u8, to: u8, amount: i32 },
    /// Local client is not in game; the rest of the message was not read.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum VotePhase {
    Started { starter: u8, timeout_secs: u8, initiation: Initiation },
    Running,
    Concluded { passed: bool, submarine: Option<PendingSubmarineVote> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveVote {
    pub state: VoteState,
    pub vote_type: VoteType,
    pub yes_voters: Vec<u8>,
    pub no_voters: Vec<u8>,
    pub max_voters: u8,
    pub phase: VotePhase,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VoteUpdate {
    pub settings: VoteSettings,
    pub sub_votes: Option<Vec<VotableCount>>,
    pub mode_votes: Option<Vec<VotableCount>>,
    pub end_round: Option<EndRoundTally>,
    pub active: Option<ActiveVote>,
    /// `None` when decoding stopped before the ready list.
    pub ready_clients: Option<Vec<u8>>,
}

pub fn decode_vote_update(bytes: &[u8], local_in_game: bool) -> Result<VoteUpdate, CodecError> {
    read_vote_update(&mut MessageReader::new(bytes), local_in_game)
}

pub fn read_vote_update(
    reader: &mut MessageReader<'_>,
    local_in_game: bool,
) -> Result<VoteUpdate, CodecError> {
    let mut update = VoteUpdate::default();

    update.settings.allow_sub_voting = reader.read_bool()?;
    if update.settings.allow_sub_voting {
        update.sub_votes = Some(read_votables(reader)?);
    }
    update.settings.allow_mode_voting = reader.read_bool()?;
    if update.settings.allow_mode_voting {
        update.mode_votes = Some(read_votables(reader)?);
    }
    update.settings.allow_end_voting = reader.read_bool()?;
    if update.settings.allow_end_voting {
        let yes = reader.read_u8()?;
        let max = reader.read_u8()?;
        update.end_round = Some(EndRoundTally { yes, max });
    }
    update.settings.allow_vote_kick = reader.read_bool()?;

    let state_tag = reader.read_u8()?;
    let state = VoteState::try_from(state_tag).unwrap_or_else(|e| {
        tracing::error!("failed to decode vote state: {e}");
        VoteState::None
    });

    if state != VoteState::None {
        let active = read_active_vote(reader, state, local_in_game)?;
        let skipped = matches!(
            active.phase,
            VotePhase::Started { initiation: Initiation::Skipped, .. }
        );
        update.active = Some(active);
        if skipped {
            return Ok(update);
        }
    }

    update.ready_clients = Some(read_id_list(reader)?);
    reader.read_pad_bits();
    Ok(update)
}

fn read_active_vote(
    reader: &mut MessageReader<'_>,
    state: VoteState,
    local_in_game: bool,
) -> Result<ActiveVote, CodecError> {
    let type_tag = reader.read_u8()?;
    let vote_type = VoteType::try_from(type_tag).unwrap_or_else(|e| {
        tracing::error!("failed to decode vote type: {e}");
        VoteType::Unknown
    });

    let yes_voters = read_id_list(reader)?;
    let no_voters = read_id_list(reader)?;
    let max_voters = reader.read_u8()?;

    let phase = match state {
        VoteState::Started => {
            let starter = reader.read_u8()?;
            let timeout_secs = reader.read_u8()?;
            let initiation = if !local_in_game {
                Initiation::Skipped
            } else if vote_type.is_submarine_change() {
                let name = reader.read_string()?;
                let transfer_items = reader.read_bool()?;
                Initiation::Submarine { name, transfer_items }
            } else if vote_type == VoteType::TransferMoney {
                let from = reader.read_u8()?;
                let to = reader.read_u8()?;
                let amount = reader.read_i32()?;
                Initiation::TransferMoney { from, to, amount }
            } else {
                Initiation::None
            };
            VotePhase::Started { starter, timeout_secs, initiation }
        }
        VoteState::Passed | VoteState::Failed => {
            let passed = reader.read_bool()?;
            let submarine = if vote_type.is_submarine_change() {
                let name = reader.read_string()?;
                let transfer_items = reader.read_bool()?;
                let delivery_fee = reader.read_i16()?;
                Some(PendingSubmarineVote { name, transfer_items, delivery_fee })
            } else {
                None
            };
            VotePhase::Concluded { passed, submarine }
        }
        VoteState::Running | VoteState::None => VotePhase::Running,
    };

    Ok(ActiveVote { state, vote_type, yes_voters, no_voters, max_voters, phase })
}

fn read_votables(reader: &mut MessageReader<'_>) -> Result<Vec<VotableCount>, CodecError> {
    let count = reader.read_u8()?;
    (0..count)
        .map(|_| {
            let votes = reader.read_u8()?;
            let name = reader.read_string()?;
            Ok(VotableCount { votes, name })
        })
        .collect()
}

fn read_id_list(reader: &mut MessageReader<'_>) -> Result<Vec<u8>, CodecError> {
    let count = reader.read_u8()?;
    (0..count).map(|_| reader.read_u8()).collect()
}

/// Server-side mirror of [`read_vote_update`]. Blocks whose allow flag is
/// off are not written even when present.
pub fn write_vote_update(writer: &mut MessageWriter, update: &VoteUpdate) {
    let settings = update.settings;

    writer.write_bool(settings.allow_sub_voting);
    if settings.allow_sub_voting {
        write_votables(writer, update.sub_votes.as_deref().unwrap_or_default());
    }
    writer.write_bool(settings.allow_mode_voting);
    if settings.allow_mode_voting {
        write_votables(writer, update.mode_votes.as_deref().unwrap_or_default());
    }
    writer.write_bool(settings.allow_end_voting);
    if settings.allow_end_voting {
        let tally = update.end_round.unwrap_or(EndRoundTally { yes: 0, max: 0 });
        writer.write_u8(tally.yes);
        writer.write_u8(tally.max);
    }
    writer.write_bool(settings.allow_vote_kick);

    match &update.active {
        None => writer.write_u8(VoteState::None.tag()),
        Some(active) => {
            writer.write_u8(active.state.tag());
            writer.write_u8(active.vote_type.tag());
            write_id_list(writer, &active.yes_voters);
            write_id_list(writer, &active.no_voters);
            writer.write_u8(active.max_voters);
            match &active.phase {
                VotePhase::Started { starter, timeout_secs, initiation } => {
                    writer.write_u8(*starter);
                    writer.write_u8(*timeout_secs);
                    match initiation {
                        Initiation::Submarine { name, transfer_items } => {
                            writer.write_string(name);
                            writer.write_bool(*transfer_items);
                        }
                        Initiation::TransferMoney { from, to, amount } => {
                            writer.write_u8(*from);
                            writer.write_u8(*to);
                            writer.write_i32(*amount);
                        }
                        Initiation::None | Initiation::Skipped => {}
                    }
                }
                VotePhase::Running => {}
                VotePhase::Concluded { passed, submarine } => {
                    writer.write_bool(*passed);
                    if let Some(sub) = submarine {
                        writer.write_string(&sub.name);
                        writer.write_bool(sub.transfer_items);
                        writer.write_i16(sub.delivery_fee);
                    }
                }
            }
        }
    }

    if let Some(ready) = &update.ready_clients {
        write_id_list(writer, ready);
    }
    writer.write_pad_bits();
}

pub fn encode_vote_update(update: &VoteUpdate) -> Vec<u8> {
    let mut writer = MessageWriter::new();
    write_vote_update(&mut writer, update);
    writer.into_bytes()
}

fn write_votables(writer: &mut MessageWriter, votables: &[VotableCount]) {
    let votables = &votables[..votables.len().min(u8::MAX as usize)];
    writer.write_u8(votables.len() as u8);
    for votable in votables {
        writer.write_u8(votable.votes);
        writer.write_string(&votable.name);
    }
}

fn write_id_list(writer: &mut MessageWriter, ids: &[u8]) {
    let ids = &ids[..ids.len().min(u8::MAX as usize)];
    writer.write_u8(ids.len() as u8);
    for &id in ids {
        writer.write_u8(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active(vote_type: VoteType, state: VoteState, phase: VotePhase) -> ActiveVote {
        ActiveVote {
            state,
            vote_type,
            yes_voters: vec![1, 2],
            no_voters: vec![3],
            max_voters: 4,
            phase,
        }
    }

    fn update_with(active: Option<ActiveVote>) -> VoteUpdate {
        VoteUpdate { active, ready_clients: Some(vec![2, 3]), ..Default::default() }
    }

    #[test]
    fn test_passed_end_round_hand_built() {
        let mut w = MessageWriter::new();
        w.write_bool(false); // sub
        w.write_bool(false); // mode
        w.write_bool(false); // end vote
        w.write_bool(false); // kick
        w.write_u8(VoteState::Passed.tag());
        w.write_u8(VoteType::EndRound.tag());
        w.write_u8(2);
        w.write_u8(1);
        w.write_u8(2);
        w.write_u8(1);
        w.write_u8(3);
        w.write_u8(3);
        w.write_bool(true); // passed
        w.write_u8(0); // ready list
        w.write_pad_bits();

        let update = decode_vote_update(&w.into_bytes(), true).unwrap();
        assert_eq!(update.settings, VoteSettings::default());
        let active = update.active.unwrap();
        assert_eq!(active.vote_type, VoteType::EndRound);
        assert_eq!(active.yes_voters, vec![1, 2]);
        assert_eq!(active.no_voters, vec![3]);
        assert_eq!(active.max_voters, 3);
        assert_eq!(active.phase, VotePhase::Concluded { passed: true, submarine: None });
        assert_eq!(update.ready_clients, Some(vec![]));
    }

    #[test]
    fn test_no_active_vote_still_reads_ready_list() {
        let bytes = encode_vote_update(&update_with(None));
        let update = decode_vote_update(&bytes, true).unwrap();
        assert!(update.active.is_none());
        assert_eq!(update.ready_clients, Some(vec![2, 3]));
    }

    #[test]
    fn test_out_of_range_state_falls_back_to_none() {
        let mut w = MessageWriter::new();
        for _ in 0..4 {
            w.write_bool(false);
        }
        w.write_u8(200);
        w.write_u8(1);
        w.write_u8(7);
        w.write_pad_bits();

        let update = decode_vote_update(&w.into_bytes(), true).unwrap();
        assert!(update.active.is_none());
        assert_eq!(update.ready_clients, Some(vec![7]));
    }

    #[test]
    fn test_out_of_range_vote_type_becomes_unknown() {
        let mut w = MessageWriter::new();
        for _ in 0..4 {
            w.write_bool(false);
        }
        w.write_u8(VoteState::Running.tag());
        w.write_u8(99);
        w.write_u8(0);
        w.write_u8(0);
        w.write_u8(2);
        w.write_u8(1);
        w.write_u8(5);
        w.write_pad_bits();

        let update = decode_vote_update(&w.into_bytes(), true).unwrap();
        let active = update.active.unwrap();
        assert_eq!(active.vote_type, VoteType::Unknown);
        assert_eq!(active.max_voters, 2);
        assert_eq!(update.ready_clients, Some(vec![5]));
    }

    #[test]
    fn test_settings_blocks_interleaved() {
        let update = VoteUpdate {
            settings: VoteSettings {
                allow_sub_voting: true,
                allow_mode_voting: true,
                allow_end_voting: true,
                allow_vote_kick: true,
            },
            sub_votes: Some(vec![VotableCount { votes: 2, name: "Humpback".into() }]),
            mode_votes: Some(vec![
                VotableCount { votes: 1, name: "sandbox".into() },
                VotableCount { votes: 0, name: "mission".into() },
            ]),
            end_round: Some(EndRoundTally { yes: 1, max: 4 }),
            active: None,
            ready_clients: Some(vec![]),
        };
        let bytes = encode_vote_update(&update);
        assert_eq!(decode_vote_update(&bytes, false).unwrap(), update);
    }

    #[test]
    fn test_disabled_blocks_not_written() {
        let update = VoteUpdate {
            sub_votes: Some(vec![VotableCount { votes: 9, name: "ignored".into() }]),
            ready_clients: Some(vec![]),
            ..Default::default()
        };
        let bytes = encode_vote_update(&update);
        // 4 flag bits + state byte + ready count byte, padded
        assert_eq!(bytes.len(), 3);
        assert!(decode_vote_update(&bytes, true).unwrap().sub_votes.is_none());
    }

    #[test]
    fn test_started_submarine_vote_in_game() {
        let phase = VotePhase::Started {
            starter: 1,
            timeout_secs: 30,
            initiation: Initiation::Submarine { name: "Typhon".into(), transfer_items: true },
        };
        let update = update_with(Some(active(VoteType::PurchaseSub, VoteState::Started, phase)));
        let bytes = encode_vote_update(&update);
        assert_eq!(decode_vote_update(&bytes, true).unwrap(), update);
    }

    #[test]
    fn test_started_money_transfer_in_game() {
        let phase = VotePhase::Started {
            starter: 2,
            timeout_secs: 20,
            initiation: Initiation::TransferMoney { from: 2, to: 3, amount: 1500 },
        };
        let update = update_with(Some(active(VoteType::TransferMoney, VoteState::Started, phase)));
        let bytes = encode_vote_update(&update);
        assert_eq!(decode_vote_update(&bytes, true).unwrap(), update);
    }

    #[test]
    fn test_started_kick_has_no_initiation_payload() {
        let phase = VotePhase::Started { starter: 1, timeout_secs: 10, initiation: Initiation::None };
        let update = update_with(Some(active(VoteType::Kick, VoteState::Started, phase)));
        let bytes = encode_vote_update(&update);
        assert_eq!(decode_vote_update(&bytes, true).unwrap(), update);
    }

    #[test]
    fn test_started_not_in_game_stops_before_payload() {
        let phase = VotePhase::Started {
            starter: 1,
            timeout_secs: 30,
            initiation: Initiation::Submarine { name: "Typhon".into(), transfer_items: false },
        };
        let update = update_with(Some(active(VoteType::SwitchSub, VoteState::Started, phase)));
        let bytes = encode_vote_update(&update);

        let decoded = decode_vote_update(&bytes, false).unwrap();
        let active = decoded.active.unwrap();
        assert_eq!(
            active.phase,
            VotePhase::Started { starter: 1, timeout_secs: 30, initiation: Initiation::Skipped }
        );
        assert_eq!(active.yes_voters, vec![1, 2]);
        assert!(decoded.ready_clients.is_none());
    }

    #[test]
    fn test_concluded_submarine_vote_reads_fee() {
        let phase = VotePhase::Concluded {
            passed: false,
            submarine: Some(PendingSubmarineVote {
                name: "Orca".into(),
                transfer_items: true,
                delivery_fee: -250,
            }),
        };
        let update = update_with(Some(active(VoteType::SwitchSub, VoteState::Failed, phase)));
        let bytes = encode_vote_update(&update);
        assert_eq!(decode_vote_update(&bytes, true).unwrap(), update);
    }

    #[test]
    fn test_truncated_message_errors() {
        let phase = VotePhase::Running;
        let bytes = encode_vote_update(&update_with(Some(active(
            VoteType::Kick,
            VoteState::Running,
            phase,
        ))));
        let cut = &bytes[..bytes.len() - 2];
        assert!(matches!(
            decode_vote_update(cut, true),
            Err(CodecError::EndOfMessage { .. })
        ));
    }

    #[test]
    fn test_empty_message_errors() {
        assert!(decode_vote_update(&[], true).is_err());
    }
}
