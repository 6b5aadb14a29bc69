pub mod binary;
pub mod packet;

pub use binary::{BinaryAssembler, RawEvent};
pub use packet::{EnginePacket, SocketPacket, SocketPacketKind, MAX_ATTACHMENTS};
