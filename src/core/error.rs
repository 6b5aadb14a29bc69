// 面板客户端错误处理
//
// 所有组件共用 PanelError。任何一个错误只影响一次操作或一个组件，
// 路由器和传输层在错误之后仍然可用。

use thiserror::Error;

use crate::config::ConfigError;

/// 面板客户端统一错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PanelError {
    /// 用户输入错误（空程序、空白名称等）
    #[error("invalid input: {0}")]
    UserInput(String),

    /// 传输层未连接时发出的命令
    #[error("connection error: {0}")]
    Connection(String),

    /// 当前没有正在运行的程序
    #[error("no program is running")]
    NotRunning,

    /// 已经有程序在运行
    #[error("a program is already running")]
    AlreadyRunning,

    /// 图像/文本负载无法解码
    #[error("payload decode error for {widget_id}: {message}")]
    PayloadDecode { widget_id: String, message: String },

    /// 摄像头或模型等外部资源获取失败
    #[error("resource acquisition failed ({resource}): {message}")]
    ResourceAcquisition { resource: String, message: String },

    /// 单例组件已存在
    #[error("a {kind} widget already exists")]
    AlreadyExists { kind: String },

    /// 组件ID冲突
    #[error("widget id '{0}' is already in use")]
    DuplicateWidget(String),

    /// 未知组件ID
    #[error("unknown widget '{0}'")]
    UnknownWidget(String),

    /// 事件类型与组件类型不匹配
    #[error("widget '{widget_id}' is a {actual} widget, cannot accept {event}")]
    KindMismatch {
        widget_id: String,
        actual: String,
        event: String,
    },

    /// 协议层错误（格式错误的数据包）
    #[error("protocol error: {0}")]
    Protocol(String),

    /// 配置错误
    #[error("configuration error: {0}")]
    Config(String),
}

pub type PanelResult<T> = Result<T, PanelError>;

impl PanelError {
    pub fn decode(widget_id: impl Into<String>, message: impl Into<String>) -> Self {
        PanelError::PayloadDecode {
            widget_id: widget_id.into(),
            message: message.into(),
        }
    }

    pub fn acquisition(resource: impl Into<String>, message: impl Into<String>) -> Self {
        PanelError::ResourceAcquisition {
            resource: resource.into(),
            message: message.into(),
        }
    }

    /// 错误类别名称，用于日志统计
    pub fn category(&self) -> &'static str {
        match self {
            PanelError::UserInput(_) => "UserInputError",
            PanelError::Connection(_) => "ConnectionError",
            PanelError::NotRunning => "NotRunningError",
            PanelError::AlreadyRunning => "AlreadyRunningError",
            PanelError::PayloadDecode { .. } => "PayloadDecodeError",
            PanelError::ResourceAcquisition { .. } => "ResourceAcquisitionError",
            PanelError::AlreadyExists { .. } | PanelError::DuplicateWidget(_) => "DuplicateWidgetError",
            PanelError::UnknownWidget(_) => "UnknownWidget",
            PanelError::KindMismatch { .. } => "KindMismatch",
            PanelError::Protocol(_) => "ProtocolError",
            PanelError::Config(_) => "ConfigError",
        }
    }
}

impl From<ConfigError> for PanelError {
    fn from(err: ConfigError) -> Self {
        PanelError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for PanelError {
    fn from(err: serde_json::Error) -> Self {
        PanelError::Protocol(err.to_string())
    }
}
