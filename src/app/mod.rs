pub mod client;
pub mod context;

pub use client::{ClientStats, PanelClient};
pub use context::{ConsoleLevel, ConsoleLine, ContextStats, PanelContext};
