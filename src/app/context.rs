// 面板客户端的共享状态
//
// 注册表、资源、路由、会话和手势循环都由同一个上下文持有，
// 所有事件处理器都在单线程里按顺序拿到 `&mut PanelContext`。

use std::fmt;

use chrono::{DateTime, Utc};

use crate::config::ClientConfig;
use crate::core::messages::{self, Locale, MessageKey};
use crate::core::RingBuffer;
use crate::events::{InboundEvent, LifecycleEvent};
use crate::gesture::{FrameScheduler, GestureLoop, StepOutcome, VisionRuntimeLoader};
use crate::resources::ResourceLifecycleManager;
use crate::router::{DataRouter, DispatchOutcome};
use crate::session::{ExecutionSession, Notice, NoticeLevel};
use crate::transport::OutboundSink;
use crate::widgets::{WidgetKind, WidgetRegistry};

const CUSTOM_EVENT_HISTORY: usize = 128;
const NOTICE_HISTORY: usize = 64;

/// 控制台输出级别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleLevel {
    Info,
    Error,
    Success,
}

impl fmt::Display for ConsoleLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConsoleLevel::Info => "info",
            ConsoleLevel::Error => "error",
            ConsoleLevel::Success => "success",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConsoleLine {
    pub level: ConsoleLevel,
    pub text: String,
    pub at: DateTime<Utc>,
}

/// 处理事件的统计
#[derive(Debug, Default, Clone)]
pub struct ContextStats {
    pub events_handled: u64,
    pub frames_run: u64,
    pub last_event: Option<DateTime<Utc>>,
}

pub struct PanelContext {
    pub registry: WidgetRegistry,
    pub resources: ResourceLifecycleManager,
    pub router: DataRouter,
    pub session: ExecutionSession,
    pub gestures: GestureLoop,
    pub frames: FrameScheduler,
    console: RingBuffer<ConsoleLine>,
    notices: RingBuffer<Notice>,
    llm_answer: Option<String>,
    locale: Locale,
    stats: ContextStats,
}

impl PanelContext {
    pub fn new(config: &ClientConfig, loader: Box<dyn VisionRuntimeLoader>) -> Self {
        let locale = config.display.locale;
        Self {
            registry: WidgetRegistry::new(locale),
            resources: ResourceLifecycleManager::new(config.display.resource_history_capacity),
            router: DataRouter::new(&config.display.default_image_format, locale, CUSTOM_EVENT_HISTORY),
            session: ExecutionSession::from_config(&config.session, locale),
            gestures: GestureLoop::new(&config.gesture, loader),
            frames: FrameScheduler::new(),
            console: RingBuffer::new(config.display.console_capacity.max(1)),
            notices: RingBuffer::new(NOTICE_HISTORY),
            llm_answer: None,
            locale,
            stats: ContextStats::default(),
        }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn stats(&self) -> &ContextStats {
        &self.stats
    }

    /// 控制台输出（从旧到新）
    pub fn console(&self) -> impl Iterator<Item = &ConsoleLine> + '_ {
        self.console.iter()
    }

    /// 组件和摄像头相关的提示（会话提示见 `session.notices()`）
    pub fn notices(&self) -> impl Iterator<Item = &Notice> + '_ {
        self.notices.iter()
    }

    pub fn llm_answer(&self) -> Option<&str> {
        self.llm_answer.as_deref()
    }

    pub fn notify(&mut self, level: NoticeLevel, message: impl Into<String>) {
        let notice = Notice::new(level, message);
        match level {
            NoticeLevel::Error => log::error!("{}", notice.message),
            NoticeLevel::Warning => log::warn!("{}", notice.message),
            _ => log::info!("{}", notice.message),
        }
        self.notices.push(notice);
    }

    pub fn text(&self, key: MessageKey) -> &'static str {
        messages::text(self.locale, key)
    }

    /// 处理任意入站事件（默认处理器都委托到这里）
    pub fn handle_event(&mut self, event: &InboundEvent) {
        self.stats.events_handled += 1;
        self.stats.last_event = Some(Utc::now());
        match event {
            InboundEvent::Lifecycle(lifecycle) => self.apply_lifecycle(lifecycle),
            InboundEvent::Stdout { text } => self.append_console(ConsoleLevel::Info, text),
            InboundEvent::Stderr { text } => self.append_console(ConsoleLevel::Error, text),
            InboundEvent::LlmAnswer { answer } => self.show_llm_answer(answer),
            InboundEvent::Other { name, payload } => {
                if name == "connected" {
                    log::info!("服务端问候: {}", payload);
                } else {
                    log::debug!("未处理的事件: {}", name);
                }
            }
            _ => {
                self.route(event);
            }
        }
    }

    /// 把组件数据事件交给路由器
    pub fn route(&mut self, event: &InboundEvent) -> DispatchOutcome {
        self.router.dispatch(event, &mut self.registry, &mut self.resources)
    }

    pub fn apply_lifecycle(&mut self, event: &LifecycleEvent) {
        self.session.handle_lifecycle(event);
        if *event == LifecycleEvent::Finished {
            let ended = self.text(MessageKey::ExecutionEnded);
            self.append_console(ConsoleLevel::Success, ended);
        }
    }

    pub fn append_console(&mut self, level: ConsoleLevel, text: &str) {
        self.console.push(ConsoleLine {
            level,
            text: text.to_string(),
            at: Utc::now(),
        });
    }

    /// 记录最新回答并显示在助手面板上
    pub fn show_llm_answer(&mut self, answer: &str) {
        self.llm_answer = Some(answer.to_string());
        for id in self.registry.ids_of_kind(WidgetKind::Assistant) {
            if let Some(widget) = self.registry.lookup_mut(id.as_str()) {
                widget.surface.set_text(answer);
            }
        }
    }

    /// 执行本帧到期的手势步骤
    pub fn run_due_frames(&mut self, sink: &mut dyn OutboundSink) -> usize {
        let due = self.frames.take_due(&mut self.resources);
        let mut processed = 0;
        for widget_id in due {
            let outcome = self.gestures.step(
                &widget_id,
                &mut self.registry,
                &mut self.resources,
                &mut self.frames,
                sink,
            );
            if outcome == StepOutcome::Processed {
                processed += 1;
            }
        }
        self.stats.frames_run += processed as u64;
        processed
    }
}
