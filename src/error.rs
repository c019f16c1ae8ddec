use thiserror::Error;

use crate::wire::{CodecError, PacketError};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),
    #[error("transport error: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VoteError {
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
    #[error("packet error: {0}")]
    Packet(#[from] PacketError),
    #[error("unsupported vote request type {0}")]
    UnsupportedRequest(u8),
    #[error("failed to find a matching submarine \"{0}\", vote aborted")]
    UnknownSubmarine(String),
}
