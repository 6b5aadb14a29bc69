use serde_json::Value;

use super::packet::{SocketPacket, MAX_ATTACHMENTS};
use crate::core::{PanelError, PanelResult};

/// 组装完成的原始事件：事件名、JSON参数以及按序号排列的二进制附件
#[derive(Debug, Clone, PartialEq)]
pub struct RawEvent {
    pub name: String,
    pub args: Vec<Value>,
    pub attachments: Vec<Vec<u8>>,
}

impl RawEvent {
    pub fn new(name: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            args,
            attachments: Vec::new(),
        }
    }

    /// 第一个参数（Socket.IO 事件的负载）
    pub fn payload(&self) -> Option<&Value> {
        self.args.first()
    }

    /// 若值是附件占位符 `{"_placeholder":true,"num":k}`，返回对应附件
    pub fn resolve_placeholder(&self, value: &Value) -> Option<&[u8]> {
        let object = value.as_object()?;
        if object.get("_placeholder").and_then(Value::as_bool) != Some(true) {
            return None;
        }
        let index = object.get("num")?.as_u64()? as usize;
        self.attachments.get(index).map(Vec::as_slice)
    }
}

/// 二进制事件组装器
///
/// `5<n>-[...]` 文本包之后紧跟 n 个二进制帧，全部到齐后才产出事件。
#[derive(Debug, Default)]
pub struct BinaryAssembler {
    pending: Option<(SocketPacket, Vec<Vec<u8>>)>,
}

impl BinaryAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_waiting(&self) -> bool {
        self.pending.is_some()
    }

    /// 开始组装一个二进制事件包
    pub fn begin(&mut self, packet: SocketPacket) -> PanelResult<Option<RawEvent>> {
        if let Some((stale, received)) = self.pending.take() {
            log::warn!(
                "二进制事件未完成即被新事件替代: 已收到 {}/{} 个附件",
                received.len(),
                stale.attachments
            );
        }
        if packet.attachments == 0 {
            return Self::finish(packet, Vec::new()).map(Some);
        }
        if packet.attachments > MAX_ATTACHMENTS {
            return Err(PanelError::Protocol(format!(
                "attachment count {} exceeds limit {}",
                packet.attachments, MAX_ATTACHMENTS
            )));
        }
        self.pending = Some((packet, Vec::new()));
        Ok(None)
    }

    /// 接收一个二进制帧，附件到齐时返回事件
    pub fn push(&mut self, frame: Vec<u8>) -> PanelResult<Option<RawEvent>> {
        let (packet, mut received) = self
            .pending
            .take()
            .ok_or_else(|| PanelError::Protocol("unexpected binary frame".to_string()))?;
        received.push(frame);
        if received.len() < packet.attachments {
            self.pending = Some((packet, received));
            return Ok(None);
        }
        Self::finish(packet, received).map(Some)
    }

    pub fn reset(&mut self) {
        self.pending = None;
    }

    fn finish(packet: SocketPacket, attachments: Vec<Vec<u8>>) -> PanelResult<RawEvent> {
        let (name, args) = packet
            .event_parts()
            .ok_or_else(|| PanelError::Protocol("binary packet is not an event".to_string()))?;
        Ok(RawEvent {
            name,
            args,
            attachments,
        })
    }
}
