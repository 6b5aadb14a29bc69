pub mod error;
pub mod messages;
pub mod ring_buffer;

pub use error::{PanelError, PanelResult};
pub use messages::{Locale, MessageKey};
pub use ring_buffer::RingBuffer;
