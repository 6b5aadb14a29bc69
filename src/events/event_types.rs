use serde_json::{json, Value};

use crate::gesture::record::GesturePair;

/// 传输层与后端执行生命周期事件
#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleEvent {
    Connected,
    Disconnected { reason: String },
    Started,
    Stopped,
    Finished,
    Error { reason: String },
}

/// 图像负载（在传输边界上按内容识别后的规范形式）
#[derive(Debug, Clone, PartialEq)]
pub enum ImagePayload {
    /// 原始字节（二进制附件或数字数组）
    Bytes(Vec<u8>),
    /// 自带MIME类型的二进制对象
    Blob { mime: String, bytes: Vec<u8> },
    /// 旧版文本编码：base64字符串或 data: URL
    Legacy(String),
}

impl ImagePayload {
    pub fn is_empty(&self) -> bool {
        match self {
            ImagePayload::Bytes(bytes) => bytes.is_empty(),
            ImagePayload::Blob { bytes, .. } => bytes.is_empty(),
            ImagePayload::Legacy(text) => text.trim().is_empty(),
        }
    }

    pub fn shape_name(&self) -> &'static str {
        match self {
            ImagePayload::Bytes(_) => "bytes",
            ImagePayload::Blob { .. } => "blob",
            ImagePayload::Legacy(_) => "legacy-text",
        }
    }
}

/// 规范化的入站事件
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    Lifecycle(LifecycleEvent),
    Stdout { text: String },
    Stderr { text: String },
    Image {
        widget_id: String,
        payload: ImagePayload,
        format: Option<String>,
    },
    Text { widget_id: String, text: String },
    Custom { payload: Value },
    LlmAnswer { answer: String },
    /// 负载无法解码的组件数据事件，仅影响目标组件
    Rejected {
        event: String,
        widget_id: String,
        reason: String,
    },
    /// 未识别的事件，原样保留
    Other { name: String, payload: Value },
}

impl InboundEvent {
    /// 线路上的事件名，订阅时使用
    pub fn name(&self) -> &str {
        match self {
            InboundEvent::Lifecycle(LifecycleEvent::Connected) => "connect",
            InboundEvent::Lifecycle(LifecycleEvent::Disconnected { .. }) => "disconnect",
            InboundEvent::Lifecycle(LifecycleEvent::Started) => "execution_started",
            InboundEvent::Lifecycle(LifecycleEvent::Stopped) => "execution_stopped",
            InboundEvent::Lifecycle(LifecycleEvent::Finished) => "finished",
            InboundEvent::Lifecycle(LifecycleEvent::Error { .. }) => "execution_error",
            InboundEvent::Stdout { .. } => "stdout",
            InboundEvent::Stderr { .. } => "stderr",
            InboundEvent::Image { .. } => "image_data",
            InboundEvent::Text { .. } => "text_data",
            InboundEvent::Custom { .. } => "custom_data",
            InboundEvent::LlmAnswer { .. } => "llm_answer",
            InboundEvent::Rejected { event, .. } => event,
            InboundEvent::Other { name, .. } => name,
        }
    }

    pub fn is_lifecycle(&self) -> bool {
        matches!(self, InboundEvent::Lifecycle(_))
    }

    /// 检查是否为面向组件的数据事件
    pub fn is_widget_data(&self) -> bool {
        matches!(
            self,
            InboundEvent::Image { .. }
                | InboundEvent::Text { .. }
                | InboundEvent::Custom { .. }
                | InboundEvent::Rejected { .. }
        )
    }

    /// 目标组件ID（自定义事件从负载的 widget_id 字段读取）
    pub fn widget_id(&self) -> Option<&str> {
        match self {
            InboundEvent::Image { widget_id, .. }
            | InboundEvent::Text { widget_id, .. }
            | InboundEvent::Rejected { widget_id, .. } => Some(widget_id),
            InboundEvent::Custom { payload } => payload.get("widget_id").and_then(Value::as_str),
            _ => None,
        }
    }
}

/// 出站消息
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundMessage {
    ExecuteCode { code: String },
    StopExecution,
    GestureUpdate { data: GesturePair },
    SliderUpdate { widget_id: String, values: Vec<f64> },
    PidUpdate { widget_id: String, p: f64, i: f64, d: f64 },
    LlmAnswerUpdate { answer: String },
}

impl OutboundMessage {
    pub fn event_name(&self) -> &'static str {
        match self {
            OutboundMessage::ExecuteCode { .. } => "execute_code",
            OutboundMessage::StopExecution => "stop_execution",
            OutboundMessage::GestureUpdate { .. } => "gesture_update",
            OutboundMessage::SliderUpdate { .. } => "slider_update",
            OutboundMessage::PidUpdate { .. } => "pid_update",
            OutboundMessage::LlmAnswerUpdate { .. } => "llm_answer_update",
        }
    }

    pub fn payload(&self) -> Value {
        match self {
            OutboundMessage::ExecuteCode { code } => json!({ "code": code }),
            OutboundMessage::StopExecution => json!({}),
            OutboundMessage::GestureUpdate { data } => json!({ "data": data }),
            OutboundMessage::SliderUpdate { widget_id, values } => {
                json!({ "widget_id": widget_id, "values": values })
            }
            OutboundMessage::PidUpdate { widget_id, p, i, d } => {
                json!({ "widget_id": widget_id, "p": p, "i": i, "d": d })
            }
            OutboundMessage::LlmAnswerUpdate { answer } => json!({ "answer": answer }),
        }
    }
}
