// 程序执行会话状态机
//
// 状态只沿以下路径变化：
//   Idle -> Running (start)
//   Running -> Stopping (stop)
//   Running/Stopping -> Finished/Errored (后端生命周期事件或连接断开)
//   Finished/Errored -> Idle (下一次 start)
// 同一时间只有一个会话。未连接时 start 只安排一次延迟重试。

use std::fmt;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

use super::notice::{Notice, NoticeLevel};
use crate::config::SessionConfig;
use crate::core::messages::{self, Locale, MessageKey};
use crate::core::{PanelError, PanelResult, RingBuffer};
use crate::events::{LifecycleEvent, OutboundMessage};
use crate::transport::OutboundSink;

const NOTICE_HISTORY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionState {
    #[default]
    Idle,
    Running,
    Stopping,
    Finished,
    Errored,
}

impl ExecutionState {
    /// 会话是否占用中（不能再次 start）
    pub fn is_active(&self) -> bool {
        matches!(self, ExecutionState::Running | ExecutionState::Stopping)
    }
}

impl fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExecutionState::Idle => "Idle",
            ExecutionState::Running => "Running",
            ExecutionState::Stopping => "Stopping",
            ExecutionState::Finished => "Finished",
            ExecutionState::Errored => "Errored",
        };
        f.write_str(name)
    }
}

/// 推送给观察者的会话变化
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    StateChanged { state: ExecutionState, status: String },
    Notice(Notice),
}

pub type SessionObserver = Box<dyn FnMut(&SessionEvent)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// execute_code 已发出
    Sent,
    /// 未连接，已安排一次重试
    RetryScheduled,
}

struct PendingStart {
    code: String,
    due: Instant,
}

pub struct ExecutionSession {
    state: ExecutionState,
    status: String,
    last_error: Option<String>,
    pending: Option<PendingStart>,
    retry_delay: Duration,
    locale: Locale,
    observers: Vec<SessionObserver>,
    notices: RingBuffer<Notice>,
    started_at: Option<DateTime<Utc>>,
    runs_started: u64,
}

impl ExecutionSession {
    pub fn new(retry_delay: Duration, locale: Locale) -> Self {
        Self {
            state: ExecutionState::Idle,
            status: "idle".to_string(),
            last_error: None,
            pending: None,
            retry_delay,
            locale,
            observers: Vec::new(),
            notices: RingBuffer::new(NOTICE_HISTORY),
            started_at: None,
            runs_started: 0,
        }
    }

    pub fn from_config(config: &SessionConfig, locale: Locale) -> Self {
        Self::new(Duration::from_millis(config.start_retry_delay_ms), locale)
    }

    pub fn state(&self) -> ExecutionState {
        self.state
    }

    /// 给界面显示的状态文本
    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn has_pending_retry(&self) -> bool {
        self.pending.is_some()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn runs_started(&self) -> u64 {
        self.runs_started
    }

    /// 最近的提示（从旧到新）
    pub fn notices(&self) -> impl Iterator<Item = &Notice> + '_ {
        self.notices.iter()
    }

    pub fn subscribe<F>(&mut self, observer: F)
    where
        F: FnMut(&SessionEvent) + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    /// 提交程序
    pub fn start(&mut self, code: &str, sink: &mut dyn OutboundSink, now: Instant) -> PanelResult<StartOutcome> {
        if code.trim().is_empty() {
            self.notify(NoticeLevel::Warning, self.text(MessageKey::CodeEmpty));
            return Err(PanelError::UserInput("program is empty".to_string()));
        }
        if self.state.is_active() {
            log::warn!("已有程序在运行，忽略 start ({})", self.state);
            return Err(PanelError::AlreadyRunning);
        }

        if !sink.is_connected() {
            let due = match self.pending.take() {
                Some(pending) => pending.due,
                None => now + self.retry_delay,
            };
            self.pending = Some(PendingStart {
                code: code.to_string(),
                due,
            });
            log::warn!("连接未就绪，{:?} 后重试一次", self.retry_delay);
            self.notify(NoticeLevel::Warning, self.text(MessageKey::ConnectionNotReady));
            return Ok(StartOutcome::RetryScheduled);
        }

        self.pending = None;
        self.send_start(code, sink)
    }

    /// 执行到期的重试；没有到期的重试时返回 None
    pub fn tick(&mut self, now: Instant, sink: &mut dyn OutboundSink) -> Option<PanelResult<StartOutcome>> {
        if self.pending.as_ref().map_or(true, |pending| now < pending.due) {
            return None;
        }
        let pending = self.pending.take()?;

        if self.state.is_active() {
            return Some(Err(PanelError::AlreadyRunning));
        }
        if !sink.is_connected() {
            log::error!("重试时仍未连接，放弃本次执行");
            self.notify(NoticeLevel::Error, self.text(MessageKey::ConnectionFailed));
            return Some(Err(PanelError::Connection("still disconnected after retry".to_string())));
        }
        log::info!("重试提交程序");
        Some(self.send_start(&pending.code, sink))
    }

    /// 请求停止当前程序
    pub fn stop(&mut self, sink: &mut dyn OutboundSink) -> PanelResult<()> {
        if self.state != ExecutionState::Running {
            self.notify(NoticeLevel::Warning, self.text(MessageKey::ExecutionNotRunning));
            return Err(PanelError::NotRunning);
        }
        if let Err(e) = sink.emit(&OutboundMessage::StopExecution) {
            log::error!("stop_execution 发送失败: {}", e);
            self.notify(NoticeLevel::Error, self.text(MessageKey::ConnectionFailed));
            return Err(e);
        }
        self.transition(ExecutionState::Stopping, "stopping".to_string());
        self.notify(NoticeLevel::Info, self.text(MessageKey::ExecutionStopping));
        Ok(())
    }

    /// 处理后端和传输层的生命周期事件
    pub fn handle_lifecycle(&mut self, event: &LifecycleEvent) {
        match event {
            LifecycleEvent::Connected => {
                self.notify(NoticeLevel::Success, self.text(MessageKey::ServerConnected));
            }
            LifecycleEvent::Disconnected { reason } => {
                self.notify(NoticeLevel::Error, self.text(MessageKey::ServerDisconnected));
                if self.state.is_active() {
                    self.fail(format!("connection lost: {}", reason));
                }
            }
            LifecycleEvent::Started => {
                if !self.state.is_active() {
                    self.reset_to_idle();
                    self.transition(ExecutionState::Running, "running".to_string());
                }
                self.notify(NoticeLevel::Info, self.text(MessageKey::ExecutionStarted));
            }
            LifecycleEvent::Stopped => {
                if self.state.is_active() {
                    self.transition(ExecutionState::Finished, "stopped".to_string());
                } else {
                    log::debug!("收到 execution_stopped，但当前状态为 {}", self.state);
                }
                self.notify(NoticeLevel::Warning, self.text(MessageKey::ExecutionStopped));
            }
            LifecycleEvent::Finished => {
                if self.state.is_active() {
                    self.transition(ExecutionState::Finished, "finished".to_string());
                } else {
                    log::debug!("收到 finished，但当前状态为 {}", self.state);
                }
                self.notify(NoticeLevel::Success, self.text(MessageKey::ExecutionCompleted));
            }
            LifecycleEvent::Error { reason } => {
                if self.state.is_active() {
                    self.fail(reason.clone());
                } else {
                    log::warn!("会话外的执行错误: {}", reason);
                    self.notify(
                        NoticeLevel::Error,
                        format!("{}{}", self.text(MessageKey::ExecutionError), reason),
                    );
                }
            }
        }
    }

    fn send_start(&mut self, code: &str, sink: &mut dyn OutboundSink) -> PanelResult<StartOutcome> {
        let message = OutboundMessage::ExecuteCode { code: code.to_string() };
        if let Err(e) = sink.emit(&message) {
            log::error!("execute_code 发送失败: {}", e);
            self.notify(NoticeLevel::Error, self.text(MessageKey::ConnectionFailed));
            return Err(e);
        }
        self.reset_to_idle();
        self.started_at = Some(Utc::now());
        self.runs_started += 1;
        self.transition(ExecutionState::Running, "running".to_string());
        log::info!("程序已提交 ({} 字节)", code.len());
        Ok(StartOutcome::Sent)
    }

    fn fail(&mut self, reason: String) {
        log::error!("执行出错: {}", reason);
        self.notify(
            NoticeLevel::Error,
            format!("{}{}", self.text(MessageKey::ExecutionError), reason),
        );
        self.transition(ExecutionState::Errored, format!("error: {}", reason));
        self.last_error = Some(reason);
    }

    /// Finished/Errored 在下一次开始前回到 Idle
    fn reset_to_idle(&mut self) {
        if matches!(self.state, ExecutionState::Finished | ExecutionState::Errored) {
            self.last_error = None;
            self.transition(ExecutionState::Idle, "idle".to_string());
        }
    }

    fn transition(&mut self, state: ExecutionState, status: String) {
        log::info!("执行状态: {} -> {} ({})", self.state, state, status);
        self.state = state;
        self.status = status.clone();
        let event = SessionEvent::StateChanged { state, status };
        for observer in self.observers.iter_mut() {
            observer(&event);
        }
    }

    fn notify(&mut self, level: NoticeLevel, message: impl Into<String>) {
        let notice = Notice::new(level, message);
        self.notices.push(notice.clone());
        let event = SessionEvent::Notice(notice);
        for observer in self.observers.iter_mut() {
            observer(&event);
        }
    }

    fn text(&self, key: MessageKey) -> &'static str {
        messages::text(self.locale, key)
    }
}
