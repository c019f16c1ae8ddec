use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown tag {0}")]
pub struct UnknownTag(pub u8);

/// Vote category. The wire tag doubles as the discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum VoteType {
    Unknown = 0,
    Sub = 1,
    Mode = 2,
    EndRound = 3,
    Kick = 4,
    StartRound = 5,
    PurchaseAndSwitchSub = 6,
    PurchaseSub = 7,
    SwitchSub = 8,
    TransferMoney = 9,
}

impl VoteType {
    pub const ALL: [VoteType; 10] = [
        VoteType::Unknown,
        VoteType::Sub,
        VoteType::Mode,
        VoteType::EndRound,
        VoteType::Kick,
        VoteType::StartRound,
        VoteType::PurchaseAndSwitchSub,
        VoteType::PurchaseSub,
        VoteType::SwitchSub,
        VoteType::TransferMoney,
    ];

    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Purchase / switch votes carry a submarine name on the wire.
    pub fn is_submarine_change(self) -> bool {
        matches!(
            self,
            VoteType::PurchaseAndSwitchSub | VoteType::PurchaseSub | VoteType::SwitchSub
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            VoteType::Unknown => "unknown",
            VoteType::Sub => "sub",
            VoteType::Mode => "mode",
            VoteType::EndRound => "end_round",
            VoteType::Kick => "kick",
            VoteType::StartRound => "start_round",
            VoteType::PurchaseAndSwitchSub => "purchase_and_switch_sub",
            VoteType::PurchaseSub => "purchase_sub",
            VoteType::SwitchSub => "switch_sub",
            VoteType::TransferMoney => "transfer_money",
        }
    }
}

impl TryFrom<u8> for VoteType {
    type Error = UnknownTag;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        VoteType::ALL.get(tag as usize).copied().ok_or(UnknownTag(tag))
    }
}

/// Lifecycle stage of the active vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum VoteState {
    None = 0,
    Started = 1,
    Running = 2,
    Passed = 3,
    Failed = 4,
}

impl VoteState {
    pub fn tag(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for VoteState {
    type Error = UnknownTag;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        match tag {
            0 => Ok(VoteState::None),
            1 => Ok(VoteState::Started),
            2 => Ok(VoteState::Running),
            3 => Ok(VoteState::Passed),
            4 => Ok(VoteState::Failed),
            other => Err(UnknownTag(other)),
        }
    }
}

/// A single client's choice for one vote type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Ballot {
    #[default]
    NotVoted = 0,
    No = 1,
    Yes = 2,
}

/// Which lobby list a votable belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VotableKind {
    Sub,
    Mode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmarineInfo {
    pub name: String,
    #[serde(default)]
    pub price: i32,
}
