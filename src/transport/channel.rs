// 传输通道
//
// 单一持久连接，按事件名把规范事件分发给已注册的处理器。
// 所有 I/O 都在 poll() 中非阻塞完成，调用方提供当前时间，
// 断线重连按固定延迟调度，不阻塞调用方。

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use serde_json::Value;
use url::Url;

use super::link::{socket_url, Frame, Link};
use crate::config::ServerConfig;
use crate::core::{PanelError, PanelResult};
use crate::events::{decode_or_reject, InboundEvent, LifecycleEvent, OutboundMessage};
use crate::protocol::{BinaryAssembler, EnginePacket, RawEvent, SocketPacket, SocketPacketKind};

/// 事件处理器：收到事件时以可变上下文调用
pub type EventHandler<C> = Box<dyn FnMut(&InboundEvent, &mut C)>;

/// 出站命令的发送端（会话和手势循环只依赖这一接口）
pub trait OutboundSink {
    fn is_connected(&self) -> bool;

    fn emit(&mut self, message: &OutboundMessage) -> PanelResult<()>;
}

/// 连接状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
    Failed,
}

/// 通道统计信息
#[derive(Debug, Default, Clone)]
pub struct TransportStats {
    pub frames_received: u64,
    pub events_received: u64,
    pub events_delivered: u64,
    pub events_sent: u64,
    pub decode_errors: u64,
    pub disconnects: u64,
    pub reconnect_attempts: u32,
    pub last_error: Option<String>,
}

pub struct TransportChannel<C> {
    link: Box<dyn Link>,
    url: Url,
    settings: ServerConfig,
    state: ConnectionState,
    sid: Option<String>,
    assembler: BinaryAssembler,
    handlers: HashMap<String, Vec<EventHandler<C>>>,
    global_handlers: Vec<EventHandler<C>>,
    /// 主动断开等同步产生的事件，下一次 poll 时交出
    pending_events: VecDeque<InboundEvent>,
    /// 发送失败时记录，下一次 poll 时按断线处理
    pending_loss: Option<String>,
    wants_connection: bool,
    reconnect_attempts: u32,
    reconnect_scheduled: bool,
    last_reconnect_attempt: Option<Instant>,
    connect_started: Option<Instant>,
    connected_since: Option<Instant>,
    stats: TransportStats,
}

impl<C> TransportChannel<C> {
    pub fn new(link: Box<dyn Link>, settings: &ServerConfig) -> PanelResult<Self> {
        let url = socket_url(settings)?;
        Ok(Self {
            link,
            url,
            settings: settings.clone(),
            state: ConnectionState::Disconnected,
            sid: None,
            assembler: BinaryAssembler::new(),
            handlers: HashMap::new(),
            global_handlers: Vec::new(),
            pending_events: VecDeque::new(),
            pending_loss: None,
            wants_connection: false,
            reconnect_attempts: 0,
            reconnect_scheduled: false,
            last_reconnect_attempt: None,
            connect_started: None,
            connected_since: None,
            stats: TransportStats::default(),
        })
    }

    /// 建立连接（幂等：已连接或正在连接时直接返回）
    pub fn connect(&mut self, now: Instant) -> PanelResult<()> {
        if matches!(self.state, ConnectionState::Connected | ConnectionState::Connecting) {
            return Ok(());
        }
        self.wants_connection = true;
        self.reconnect_attempts = 0;
        self.reconnect_scheduled = false;
        self.open_link(now)
    }

    /// 主动断开，不再自动重连
    pub fn disconnect(&mut self) {
        self.wants_connection = false;
        self.reconnect_scheduled = false;
        if self.state == ConnectionState::Connected {
            let packet = EnginePacket::Message(SocketPacket::disconnect().encode());
            let _ = self.link.send(Frame::Text(packet.encode()));
            self.stats.disconnects += 1;
            self.pending_events
                .push_back(InboundEvent::Lifecycle(LifecycleEvent::Disconnected {
                    reason: "client disconnect".to_string(),
                }));
        }
        self.link.close();
        self.assembler.reset();
        self.state = ConnectionState::Disconnected;
        self.sid = None;
        self.connected_since = None;
        log::info!("传输通道已断开");
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn sid(&self) -> Option<&str> {
        self.sid.as_deref()
    }

    pub fn connection_duration(&self, now: Instant) -> Option<Duration> {
        self.connected_since.map(|since| now.saturating_duration_since(since))
    }

    pub fn stats(&self) -> TransportStats {
        let mut stats = self.stats.clone();
        stats.reconnect_attempts = self.reconnect_attempts;
        stats
    }

    /// 发送一个命名事件；未连接时返回 Connection 错误，不排队
    pub fn send(&mut self, event: &str, payload: Value) -> PanelResult<()> {
        if self.state != ConnectionState::Connected {
            log::debug!("未连接，丢弃出站事件: {}", event);
            return Err(PanelError::Connection(format!("not connected, cannot send {}", event)));
        }
        let packet = EnginePacket::Message(SocketPacket::event(event, payload).encode());
        match self.link.send(Frame::Text(packet.encode())) {
            Ok(()) => {
                self.stats.events_sent += 1;
                Ok(())
            }
            Err(e) => {
                self.pending_loss = Some(e.to_string());
                Err(e)
            }
        }
    }

    pub fn emit(&mut self, message: &OutboundMessage) -> PanelResult<()> {
        self.send(message.event_name(), message.payload())
    }

    /// 订阅事件处理器，同一事件的处理器按注册顺序调用
    pub fn subscribe<F>(&mut self, event: &str, handler: F)
    where
        F: FnMut(&InboundEvent, &mut C) + 'static,
    {
        self.handlers
            .entry(event.to_string())
            .or_default()
            .push(Box::new(handler));
    }

    /// 订阅全局事件处理器（处理所有事件）
    pub fn subscribe_all<F>(&mut self, handler: F)
    where
        F: FnMut(&InboundEvent, &mut C) + 'static,
    {
        self.global_handlers.push(Box::new(handler));
    }

    pub fn handler_count(&self, event: &str) -> usize {
        self.handlers.get(event).map_or(0, Vec::len)
    }

    /// 把事件交给已注册的处理器
    pub fn deliver(&mut self, event: &InboundEvent, ctx: &mut C) {
        if let Some(handlers) = self.handlers.get_mut(event.name()) {
            for handler in handlers.iter_mut() {
                handler(event, ctx);
            }
        } else {
            log::debug!("事件没有处理器: {}", event.name());
        }
        for handler in self.global_handlers.iter_mut() {
            handler(event, ctx);
        }
        self.stats.events_delivered += 1;
    }

    /// 驱动连接：重连调度、读取所有可用帧、超时检查
    ///
    /// 返回按到达顺序排列的规范事件。
    pub fn poll(&mut self, now: Instant) -> Vec<InboundEvent> {
        let mut events: Vec<InboundEvent> = self.pending_events.drain(..).collect();

        if let Some(reason) = self.pending_loss.take() {
            self.handle_link_loss(reason, now, &mut events);
        }

        self.attempt_reconnect(now);

        while matches!(self.state, ConnectionState::Connecting | ConnectionState::Connected) {
            match self.link.recv() {
                Ok(Some(frame)) => {
                    self.stats.frames_received += 1;
                    self.handle_frame(frame, now, &mut events);
                }
                Ok(None) => break,
                Err(e) => {
                    self.handle_link_loss(e.to_string(), now, &mut events);
                    break;
                }
            }
        }

        if self.state == ConnectionState::Connecting {
            if let Some(started) = self.connect_started {
                let timeout = Duration::from_millis(self.settings.connect_timeout_ms);
                if now.saturating_duration_since(started) > timeout {
                    log::warn!("连接超时 ({}ms)", self.settings.connect_timeout_ms);
                    self.handle_link_loss("connect timeout".to_string(), now, &mut events);
                }
            }
        }

        events
    }

    fn open_link(&mut self, now: Instant) -> PanelResult<()> {
        self.state = ConnectionState::Connecting;
        match self.link.open(&self.url) {
            Ok(()) => {
                self.connect_started = Some(now);
                Ok(())
            }
            Err(e) => {
                log::error!("连接失败: {}", e);
                self.stats.last_error = Some(e.to_string());
                self.schedule_reconnect(now);
                Err(e)
            }
        }
    }

    /// 调度重连，次数用完后进入 Failed
    fn schedule_reconnect(&mut self, now: Instant) {
        if !self.wants_connection {
            self.state = ConnectionState::Disconnected;
            return;
        }
        if self.reconnect_attempts >= self.settings.max_reconnect_attempts {
            log::error!("重连次数已达上限: {}", self.settings.max_reconnect_attempts);
            self.reconnect_scheduled = false;
            self.state = ConnectionState::Failed;
            return;
        }
        self.reconnect_scheduled = true;
        self.last_reconnect_attempt = Some(now);
        self.state = ConnectionState::Reconnecting;
        log::info!(
            "调度重连 ({}/{}), 将在{}ms后执行",
            self.reconnect_attempts + 1,
            self.settings.max_reconnect_attempts,
            self.settings.reconnect_delay_ms
        );
    }

    fn attempt_reconnect(&mut self, now: Instant) {
        if self.state != ConnectionState::Reconnecting || !self.reconnect_scheduled {
            return;
        }
        if let Some(last_attempt) = self.last_reconnect_attempt {
            let delay = Duration::from_millis(self.settings.reconnect_delay_ms);
            if now.saturating_duration_since(last_attempt) < delay {
                return;
            }
        }

        self.reconnect_attempts += 1;
        self.reconnect_scheduled = false;
        log::info!(
            "执行重连 ({}/{})",
            self.reconnect_attempts,
            self.settings.max_reconnect_attempts
        );
        // 失败时 open_link 已重新调度
        let _ = self.open_link(now);
    }

    fn handle_link_loss(&mut self, reason: String, now: Instant, events: &mut Vec<InboundEvent>) {
        let was_connected = self.state == ConnectionState::Connected;
        log::warn!("连接丢失: {}", reason);

        self.link.close();
        self.assembler.reset();
        self.sid = None;
        self.connected_since = None;
        self.connect_started = None;
        self.stats.last_error = Some(reason.clone());

        if was_connected {
            self.stats.disconnects += 1;
            events.push(InboundEvent::Lifecycle(LifecycleEvent::Disconnected { reason }));
        }
        self.schedule_reconnect(now);
    }

    fn handle_frame(&mut self, frame: Frame, now: Instant, events: &mut Vec<InboundEvent>) {
        match frame {
            Frame::Text(text) => match EnginePacket::parse(&text) {
                Ok(EnginePacket::Open(handshake)) => {
                    log::info!(
                        "Engine.IO 握手完成: sid={}, pingInterval={}",
                        handshake["sid"],
                        handshake["pingInterval"]
                    );
                    self.write_engine(EnginePacket::Message(SocketPacket::connect().encode()));
                }
                Ok(EnginePacket::Ping(data)) => self.write_engine(EnginePacket::Pong(data)),
                Ok(EnginePacket::Close) => {
                    self.handle_link_loss("server closed the transport".to_string(), now, events)
                }
                Ok(EnginePacket::Message(message)) => self.handle_socket_packet(&message, now, events),
                Ok(_) => {}
                Err(e) => {
                    self.stats.decode_errors += 1;
                    log::warn!("无法解析的数据包: {}", e);
                }
            },
            Frame::Binary(bytes) => match self.assembler.push(bytes) {
                Ok(Some(raw)) => self.accept_raw(raw, events),
                Ok(None) => {}
                Err(e) => {
                    self.stats.decode_errors += 1;
                    log::warn!("二进制帧处理失败: {}", e);
                }
            },
        }
    }

    fn handle_socket_packet(&mut self, text: &str, now: Instant, events: &mut Vec<InboundEvent>) {
        let packet = match SocketPacket::parse(text) {
            Ok(packet) => packet,
            Err(e) => {
                self.stats.decode_errors += 1;
                log::warn!("无法解析的 Socket.IO 数据包: {}", e);
                return;
            }
        };

        match packet.kind {
            SocketPacketKind::Connect => {
                self.sid = packet
                    .data
                    .as_ref()
                    .and_then(|data| data.get("sid"))
                    .and_then(Value::as_str)
                    .map(str::to_string);
                self.state = ConnectionState::Connected;
                self.reconnect_attempts = 0;
                self.connect_started = None;
                self.connected_since = Some(now);
                self.stats.last_error = None;
                log::info!("已连接到服务器: sid={:?}", self.sid);
                events.push(InboundEvent::Lifecycle(LifecycleEvent::Connected));
            }
            SocketPacketKind::Disconnect => {
                self.handle_link_loss("server disconnected the namespace".to_string(), now, events)
            }
            SocketPacketKind::ConnectError => {
                let reason = packet
                    .data
                    .as_ref()
                    .and_then(|data| data.get("message"))
                    .and_then(Value::as_str)
                    .unwrap_or("connect error")
                    .to_string();
                log::error!("服务器拒绝连接: {}", reason);
                self.handle_link_loss(reason, now, events);
            }
            SocketPacketKind::Event => match packet.event_parts() {
                Some((name, args)) => self.accept_raw(RawEvent::new(name, args), events),
                None => {
                    self.stats.decode_errors += 1;
                    log::warn!("事件包缺少事件名");
                }
            },
            SocketPacketKind::BinaryEvent => match self.assembler.begin(packet) {
                Ok(Some(raw)) => self.accept_raw(raw, events),
                Ok(None) => {}
                Err(e) => {
                    self.stats.decode_errors += 1;
                    log::warn!("二进制事件处理失败: {}", e);
                }
            },
            SocketPacketKind::Ack | SocketPacketKind::BinaryAck => {
                log::debug!("忽略应答包: {:?}", packet.ack_id);
            }
        }
    }

    fn accept_raw(&mut self, raw: RawEvent, events: &mut Vec<InboundEvent>) {
        self.stats.events_received += 1;
        match decode_or_reject(&raw) {
            Ok(event) => events.push(event),
            Err(e) => {
                self.stats.decode_errors += 1;
                log::warn!("丢弃无法解析的事件 {}: {}", raw.name, e);
            }
        }
    }

    fn write_engine(&mut self, packet: EnginePacket) {
        if let Err(e) = self.link.send(Frame::Text(packet.encode())) {
            self.pending_loss = Some(e.to_string());
        }
    }
}

impl<C> OutboundSink for TransportChannel<C> {
    fn is_connected(&self) -> bool {
        TransportChannel::is_connected(self)
    }

    fn emit(&mut self, message: &OutboundMessage) -> PanelResult<()> {
        TransportChannel::emit(self, message)
    }
}
