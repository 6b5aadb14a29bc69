pub mod decode;
pub mod event_types;

pub use decode::{decode_event, decode_or_reject};
pub use event_types::{ImagePayload, InboundEvent, LifecycleEvent, OutboundMessage};
