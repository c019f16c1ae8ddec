pub mod message;
pub mod packet;

pub use message::{CodecError, MessageReader, MessageWriter};
pub use packet::{frame_packet, parse_packet, PacketError, PacketKind};
