//! Client -> server vote messages. One request carries exactly one vote
//! type: the tag byte, that type's payload, then pad bits.

use serde::{Deserialize, Serialize};

use super::types::VoteType;
use crate::error::VoteError;
use crate::wire::{MessageReader, MessageWriter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmarineVoteKind {
    PurchaseAndSwitch,
    Purchase,
    Switch,
}

impl SubmarineVoteKind {
    pub fn vote_type(self) -> VoteType {
        match self {
            SubmarineVoteKind::PurchaseAndSwitch => VoteType::PurchaseAndSwitchSub,
            SubmarineVoteKind::Purchase => VoteType::PurchaseSub,
            SubmarineVoteKind::Switch => VoteType::SwitchSub,
        }
    }

    pub fn from_vote_type(vote_type: VoteType) -> Option<Self> {
        match vote_type {
            VoteType::PurchaseAndSwitchSub => Some(SubmarineVoteKind::PurchaseAndSwitch),
            VoteType::PurchaseSub => Some(SubmarineVoteKind::Purchase),
            VoteType::SwitchSub => Some(SubmarineVoteKind::Switch),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmarineAction {
    /// Start a new purchase/switch vote.
    Initiate { name: String, transfer_items: bool },
    /// Answer the running one.
    Ballot { choice: i32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VoteRequest {
    /// `hash` is only sent when the server-side equality check is 0.
    Sub {
        equality_check: i32,
        #[serde(default)]
        hash: Option<String>,
    },
    Mode {
        identifier: String,
    },
    EndRound {
        vote: bool,
    },
    Kick {
        client_id: u8,
    },
    StartRound {
        ready: bool,
    },
    SubmarineChange {
        kind: SubmarineVoteKind,
        action: SubmarineAction,
    },
    TransferMoney {
        amount: i32,
    },
}

impl VoteRequest {
    pub fn vote_type(&self) -> VoteType {
        match self {
            VoteRequest::Sub { .. } => VoteType::Sub,
            VoteRequest::Mode { .. } => VoteType::Mode,
            VoteRequest::EndRound { .. } => VoteType::EndRound,
            VoteRequest::Kick { .. } => VoteType::Kick,
            VoteRequest::StartRound { .. } => VoteType::StartRound,
            VoteRequest::SubmarineChange { kind, .. } => kind.vote_type(),
            VoteRequest::TransferMoney { .. } => VoteType::TransferMoney,
        }
    }
}

pub fn write_vote_request(writer: &mut MessageWriter, request: &VoteRequest) {
    writer.write_u8(request.vote_type().tag());

    match request {
        VoteRequest::Sub { equality_check, hash } => {
            writer.write_i32(*equality_check);
            if *equality_check == 0 {
                // sub is unknown to the server by value, identify it by hash
                writer.write_string(hash.as_deref().unwrap_or_default());
            }
        }
        VoteRequest::Mode { identifier } => writer.write_string(identifier),
        VoteRequest::EndRound { vote } => writer.write_bool(*vote),
        VoteRequest::Kick { client_id } => writer.write_u8(*client_id),
        VoteRequest::StartRound { ready } => writer.write_bool(*ready),
        VoteRequest::SubmarineChange { action, .. } => match action {
            SubmarineAction::Initiate { name, transfer_items } => {
                writer.write_bool(true);
                writer.write_string(name);
                writer.write_bool(*transfer_items);
            }
            SubmarineAction::Ballot { choice } => {
                writer.write_bool(false);
                writer.write_i32(*choice);
            }
        },
        VoteRequest::TransferMoney { amount } => {
            // clients never initiate a transfer vote through this path
            writer.write_bool(false);
            writer.write_i32(*amount);
        }
    }

    writer.write_pad_bits();
}

pub fn encode_vote_request(request: &VoteRequest) -> Vec<u8> {
    let mut writer = MessageWriter::new();
    write_vote_request(&mut writer, request);
    writer.into_bytes()
}

/// Server-side mirror of [`write_vote_request`].
pub fn read_vote_request(reader: &mut MessageReader<'_>) -> Result<VoteRequest, VoteError> {
    let tag = reader.read_u8()?;
    let vote_type = VoteType::try_from(tag).map_err(|_| VoteError::UnsupportedRequest(tag))?;

    let request = match vote_type {
        VoteType::Sub => {
            let equality_check = reader.read_i32()?;
            let hash = if equality_check == 0 { Some(reader.read_string()?) } else { None };
            VoteRequest::Sub { equality_check, hash }
        }
        VoteType::Mode => VoteRequest::Mode { identifier: reader.read_string()? },
        VoteType::EndRound => VoteRequest::EndRound { vote: reader.read_bool()? },
        VoteType::Kick => VoteRequest::Kick { client_id: reader.read_u8()? },
        VoteType::StartRound => VoteRequest::StartRound { ready: reader.read_bool()? },
        VoteType::PurchaseAndSwitchSub | VoteType::PurchaseSub | VoteType::SwitchSub => {
            let kind = SubmarineVoteKind::from_vote_type(vote_type)
                .ok_or(VoteError::UnsupportedRequest(tag))?;
            let action = if reader.read_bool()? {
                let name = reader.read_string()?;
                let transfer_items = reader.read_bool()?;
                SubmarineAction::Initiate { name, transfer_items }
            } else {
                SubmarineAction::Ballot { choice: reader.read_i32()? }
            };
            VoteRequest::SubmarineChange { kind, action }
        }
        VoteType::TransferMoney => {
            let _initiate = reader.read_bool()?;
            VoteRequest::TransferMoney { amount: reader.read_i32()? }
        }
        VoteType::Unknown => return Err(VoteError::UnsupportedRequest(tag)),
    };

    reader.read_pad_bits();
    Ok(request)
}

pub fn decode_vote_request(bytes: &[u8]) -> Result<VoteRequest, VoteError> {
    read_vote_request(&mut MessageReader::new(bytes))
}
