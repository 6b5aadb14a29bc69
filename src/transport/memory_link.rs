// 进程内链路
//
// MemoryLink 是客户端一侧，MemoryServer 是对端句柄。两者共享同一组队列，
// 用于测试和离线演示。

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use serde_json::{json, Value};
use url::Url;

use super::link::{Frame, Link};
use crate::core::{PanelError, PanelResult};
use crate::protocol::{EnginePacket, SocketPacket, SocketPacketKind};

#[derive(Debug, Default)]
struct MemoryState {
    open: bool,
    refuse_open: bool,
    open_count: u32,
    last_url: Option<Url>,
    inbound: VecDeque<Frame>,
    outbound: Vec<Frame>,
    /// 对端主动断开，下一次读取时报告
    dropped: bool,
}

/// 客户端侧内存链路
pub struct MemoryLink {
    state: Rc<RefCell<MemoryState>>,
}

/// 对端（服务器）句柄
#[derive(Clone)]
pub struct MemoryServer {
    state: Rc<RefCell<MemoryState>>,
}

/// 创建一对相连的内存链路
pub fn memory_pair() -> (MemoryLink, MemoryServer) {
    let state = Rc::new(RefCell::new(MemoryState::default()));
    (
        MemoryLink {
            state: Rc::clone(&state),
        },
        MemoryServer { state },
    )
}

impl Link for MemoryLink {
    fn open(&mut self, url: &Url) -> PanelResult<()> {
        let mut state = self.state.borrow_mut();
        if state.refuse_open {
            return Err(PanelError::Connection("connection refused".to_string()));
        }
        state.open = true;
        state.dropped = false;
        state.open_count += 1;
        state.last_url = Some(url.clone());
        Ok(())
    }

    fn send(&mut self, frame: Frame) -> PanelResult<()> {
        let mut state = self.state.borrow_mut();
        if !state.open {
            return Err(PanelError::Connection("link is closed".to_string()));
        }
        state.outbound.push(frame);
        Ok(())
    }

    fn recv(&mut self) -> PanelResult<Option<Frame>> {
        let mut state = self.state.borrow_mut();
        if state.dropped {
            state.dropped = false;
            state.open = false;
            state.inbound.clear();
            return Err(PanelError::Connection("connection reset by peer".to_string()));
        }
        if !state.open {
            return Ok(None);
        }
        Ok(state.inbound.pop_front())
    }

    fn close(&mut self) {
        let mut state = self.state.borrow_mut();
        state.open = false;
        state.inbound.clear();
    }

    fn is_open(&self) -> bool {
        self.state.borrow().open
    }
}

impl MemoryServer {
    /// 推送 Engine.IO 握手与 Socket.IO 连接确认
    pub fn accept(&self, sid: &str) {
        self.push_text(EnginePacket::Open(json!({
            "sid": sid,
            "upgrades": [],
            "pingInterval": 25000,
            "pingTimeout": 20000,
            "maxPayload": 1000000
        }))
        .encode());
        self.push_text(format!("40{}", json!({ "sid": sid })));
    }

    pub fn push_text(&self, text: impl Into<String>) {
        self.state.borrow_mut().inbound.push_back(Frame::Text(text.into()));
    }

    pub fn push_binary(&self, bytes: Vec<u8>) {
        self.state.borrow_mut().inbound.push_back(Frame::Binary(bytes));
    }

    /// 发送一个普通事件 `42["name", payload]`
    pub fn emit(&self, name: &str, payload: Value) {
        let packet = SocketPacket::event(name, payload);
        self.push_text(EnginePacket::Message(packet.encode()).encode());
    }

    /// 发送一个二进制事件，负载中用占位符引用附件
    pub fn emit_binary(&self, name: &str, payload: Value, attachments: Vec<Vec<u8>>) {
        let mut packet = SocketPacket::event(name, payload);
        packet.kind = SocketPacketKind::BinaryEvent;
        packet.attachments = attachments.len();
        self.push_text(EnginePacket::Message(packet.encode()).encode());
        for bytes in attachments {
            self.push_binary(bytes);
        }
    }

    pub fn ping(&self) {
        self.push_text(EnginePacket::Ping(String::new()).encode());
    }

    /// 模拟对端断开
    pub fn drop_connection(&self) {
        self.state.borrow_mut().dropped = true;
    }

    pub fn refuse_connections(&self, refuse: bool) {
        self.state.borrow_mut().refuse_open = refuse;
    }

    pub fn is_open(&self) -> bool {
        self.state.borrow().open
    }

    pub fn open_count(&self) -> u32 {
        self.state.borrow().open_count
    }

    pub fn last_url(&self) -> Option<Url> {
        self.state.borrow().last_url.clone()
    }

    pub fn sent_frames(&self) -> Vec<Frame> {
        self.state.borrow().outbound.clone()
    }

    /// 客户端发出的事件（事件名与第一个参数）
    pub fn sent_events(&self) -> Vec<(String, Value)> {
        self.state
            .borrow()
            .outbound
            .iter()
            .filter_map(|frame| match frame {
                Frame::Text(text) => Some(text.as_str()),
                Frame::Binary(_) => None,
            })
            .filter_map(|text| match EnginePacket::parse(text) {
                Ok(EnginePacket::Message(message)) => SocketPacket::parse(&message).ok(),
                _ => None,
            })
            .filter_map(|packet| packet.event_parts())
            .map(|(name, mut args)| {
                let payload = if args.is_empty() { Value::Null } else { args.remove(0) };
                (name, payload)
            })
            .collect()
    }

    pub fn clear_sent(&self) {
        self.state.borrow_mut().outbound.clear();
    }
}
