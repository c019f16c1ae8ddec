//! One websocket binary frame carries one packet: a kind prefix byte, then
//! the bit-packed body.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PacketKind {
    VoteUpdate = 0x01,
    VoteRequest = 0x02,
    ClientList = 0x03,
}

impl PacketKind {
    pub fn from_prefix(prefix: u8) -> Option<Self> {
        match prefix {
            0x01 => Some(Self::VoteUpdate),
            0x02 => Some(Self::VoteRequest),
            0x03 => Some(Self::ClientList),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PacketError {
    #[error("empty frame")]
    Empty,
    #[error("unknown packet prefix {0:#04x}")]
    UnknownPrefix(u8),
}

pub fn frame_packet(kind: PacketKind, body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + body.len());
    out.push(kind as u8);
    out.extend_from_slice(body);
    out
}

pub fn parse_packet(frame: &[u8]) -> Result<(PacketKind, &[u8]), PacketError> {
    let (&prefix, body) = frame.split_first().ok_or(PacketError::Empty)?;
    let kind = PacketKind::from_prefix(prefix).ok_or(PacketError::UnknownPrefix(prefix))?;
    Ok((kind, body))
}
