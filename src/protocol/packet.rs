// Engine.IO v4 / Socket.IO v5 文本数据包编解码
//
// Engine.IO:  <type>[<data>]          0 open, 1 close, 2 ping, 3 pong, 4 message, 5 upgrade, 6 noop
// Socket.IO:  <type>[<n>-][<nsp>,][<ack id>][<json>]

use serde_json::Value;

use crate::core::{PanelError, PanelResult};

/// Engine.IO 层数据包
#[derive(Debug, Clone, PartialEq)]
pub enum EnginePacket {
    Open(Value),
    Close,
    Ping(String),
    Pong(String),
    Message(String),
    Upgrade,
    Noop,
}

impl EnginePacket {
    pub fn parse(text: &str) -> PanelResult<Self> {
        let mut chars = text.chars();
        let kind = chars
            .next()
            .ok_or_else(|| PanelError::Protocol("empty engine packet".to_string()))?;
        let rest = chars.as_str();

        match kind {
            '0' => {
                let handshake: Value = serde_json::from_str(rest)
                    .map_err(|e| PanelError::Protocol(format!("bad open handshake: {}", e)))?;
                Ok(EnginePacket::Open(handshake))
            }
            '1' => Ok(EnginePacket::Close),
            '2' => Ok(EnginePacket::Ping(rest.to_string())),
            '3' => Ok(EnginePacket::Pong(rest.to_string())),
            '4' => Ok(EnginePacket::Message(rest.to_string())),
            '5' => Ok(EnginePacket::Upgrade),
            '6' => Ok(EnginePacket::Noop),
            other => Err(PanelError::Protocol(format!("unknown engine packet type '{}'", other))),
        }
    }

    pub fn encode(&self) -> String {
        match self {
            EnginePacket::Open(handshake) => format!("0{}", handshake),
            EnginePacket::Close => "1".to_string(),
            EnginePacket::Ping(data) => format!("2{}", data),
            EnginePacket::Pong(data) => format!("3{}", data),
            EnginePacket::Message(data) => format!("4{}", data),
            EnginePacket::Upgrade => "5".to_string(),
            EnginePacket::Noop => "6".to_string(),
        }
    }
}

/// 单个二进制事件允许的最大附件数
pub const MAX_ATTACHMENTS: usize = 64;

/// Socket.IO 数据包类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketPacketKind {
    Connect,
    Disconnect,
    Event,
    Ack,
    ConnectError,
    BinaryEvent,
    BinaryAck,
}

impl SocketPacketKind {
    fn from_char(c: char) -> Option<Self> {
        match c {
            '0' => Some(SocketPacketKind::Connect),
            '1' => Some(SocketPacketKind::Disconnect),
            '2' => Some(SocketPacketKind::Event),
            '3' => Some(SocketPacketKind::Ack),
            '4' => Some(SocketPacketKind::ConnectError),
            '5' => Some(SocketPacketKind::BinaryEvent),
            '6' => Some(SocketPacketKind::BinaryAck),
            _ => None,
        }
    }

    fn as_char(&self) -> char {
        match self {
            SocketPacketKind::Connect => '0',
            SocketPacketKind::Disconnect => '1',
            SocketPacketKind::Event => '2',
            SocketPacketKind::Ack => '3',
            SocketPacketKind::ConnectError => '4',
            SocketPacketKind::BinaryEvent => '5',
            SocketPacketKind::BinaryAck => '6',
        }
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, SocketPacketKind::BinaryEvent | SocketPacketKind::BinaryAck)
    }
}

/// Socket.IO 层数据包
#[derive(Debug, Clone, PartialEq)]
pub struct SocketPacket {
    pub kind: SocketPacketKind,
    pub namespace: String,
    pub ack_id: Option<u64>,
    pub attachments: usize,
    pub data: Option<Value>,
}

impl SocketPacket {
    pub fn connect() -> Self {
        Self {
            kind: SocketPacketKind::Connect,
            namespace: "/".to_string(),
            ack_id: None,
            attachments: 0,
            data: None,
        }
    }

    pub fn disconnect() -> Self {
        Self {
            kind: SocketPacketKind::Disconnect,
            ..Self::connect()
        }
    }

    /// 构造事件包 `2["name", payload]`
    pub fn event(name: &str, payload: Value) -> Self {
        Self {
            kind: SocketPacketKind::Event,
            namespace: "/".to_string(),
            ack_id: None,
            attachments: 0,
            data: Some(Value::Array(vec![Value::String(name.to_string()), payload])),
        }
    }

    pub fn parse(text: &str) -> PanelResult<Self> {
        let first = text
            .chars()
            .next()
            .ok_or_else(|| PanelError::Protocol("empty socket packet".to_string()))?;
        let kind = SocketPacketKind::from_char(first)
            .ok_or_else(|| PanelError::Protocol(format!("unknown socket packet type '{}'", first)))?;
        let mut cursor = 1;

        // 二进制附件数量 "<n>-"
        let mut attachments = 0;
        if kind.is_binary() {
            let dash = text[cursor..]
                .find('-')
                .ok_or_else(|| PanelError::Protocol("binary packet without attachment count".to_string()))?;
            attachments = text[cursor..cursor + dash]
                .parse::<usize>()
                .map_err(|e| PanelError::Protocol(format!("bad attachment count: {}", e)))?;
            if attachments > MAX_ATTACHMENTS {
                return Err(PanelError::Protocol(format!(
                    "attachment count {} exceeds limit {}",
                    attachments, MAX_ATTACHMENTS
                )));
            }
            cursor += dash + 1;
        }

        // 命名空间 "/nsp,"
        let mut namespace = "/".to_string();
        if text[cursor..].starts_with('/') {
            match text[cursor..].find(',') {
                Some(comma) => {
                    namespace = text[cursor..cursor + comma].to_string();
                    cursor += comma + 1;
                }
                None => {
                    namespace = text[cursor..].to_string();
                    cursor = text.len();
                }
            }
        }

        // 应答ID
        let digits = text[cursor..].chars().take_while(|c| c.is_ascii_digit()).count();
        let ack_id = if digits > 0 {
            let id = text[cursor..cursor + digits]
                .parse::<u64>()
                .map_err(|e| PanelError::Protocol(format!("bad ack id: {}", e)))?;
            cursor += digits;
            Some(id)
        } else {
            None
        };

        let rest = &text[cursor..];
        let data = if rest.is_empty() {
            None
        } else {
            Some(
                serde_json::from_str(rest)
                    .map_err(|e| PanelError::Protocol(format!("bad packet payload: {}", e)))?,
            )
        };

        Ok(Self {
            kind,
            namespace,
            ack_id,
            attachments,
            data,
        })
    }

    pub fn encode(&self) -> String {
        let mut out = String::new();
        out.push(self.kind.as_char());
        if self.kind.is_binary() {
            out.push_str(&format!("{}-", self.attachments));
        }
        if self.namespace != "/" {
            out.push_str(&self.namespace);
            out.push(',');
        }
        if let Some(id) = self.ack_id {
            out.push_str(&id.to_string());
        }
        if let Some(data) = &self.data {
            out.push_str(&data.to_string());
        }
        out
    }

    /// 事件名与参数（仅对事件包有效）
    pub fn event_parts(&self) -> Option<(String, Vec<Value>)> {
        if !matches!(self.kind, SocketPacketKind::Event | SocketPacketKind::BinaryEvent) {
            return None;
        }
        let array = self.data.as_ref()?.as_array()?;
        let (name, args) = array.split_first()?;
        Some((name.as_str()?.to_string(), args.to_vec()))
    }
}
