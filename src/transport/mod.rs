pub mod channel;
pub mod link;
pub mod memory_link;
pub mod websocket_link;

pub use channel::{ConnectionState, EventHandler, OutboundSink, TransportChannel, TransportStats};
pub use link::{socket_url, Frame, Link};
pub use memory_link::{memory_pair, MemoryLink, MemoryServer};
pub use websocket_link::WebSocketLink;
