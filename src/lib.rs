// 核心模块
pub mod app;
pub mod config;
pub mod core;
pub mod events;
pub mod gesture;
pub mod protocol;
pub mod resources;
pub mod router;
pub mod session;
pub mod transport;
pub mod widgets;

// 重新导出主要类型
pub use app::{PanelClient, PanelContext};
pub use config::{ClientConfig, ConfigManager, LoggingConfig};
pub use core::{Locale, PanelError, PanelResult, RingBuffer};
pub use events::{InboundEvent, LifecycleEvent, OutboundMessage};
pub use router::{DataRouter, DispatchOutcome};
pub use session::{ExecutionSession, ExecutionState, StartOutcome};
pub use transport::{Link, MemoryLink, TransportChannel, WebSocketLink};
pub use widgets::{WidgetId, WidgetKind, WidgetRegistry};

/// 库的版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 初始化日志系统
///
/// 配置了日志文件时写入文件，否则写到标准错误；文件无法打开时回退到标准错误。
/// 重复调用时忽略后续初始化。
pub fn init_logging(config: &LoggingConfig) {
    use std::fs::OpenOptions;

    let mut builder = env_logger::Builder::from_default_env();
    builder.filter_level(config.level_filter());

    if let Some(path) = config.file.as_deref() {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => {
                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
            Err(e) => {
                eprintln!("无法打开日志文件 {}: {}，改为输出到标准错误", path, e);
                builder.target(env_logger::Target::Stderr);
            }
        }
    } else {
        builder.target(env_logger::Target::Stderr);
    }

    if builder.try_init().is_err() {
        log::debug!("日志系统已初始化");
    }
}
