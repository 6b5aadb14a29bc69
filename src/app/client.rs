// 面板客户端
//
// 把传输通道和共享上下文组合在一起。宿主周期性调用 `pump` 处理网络事件，
// 在每次显示刷新时调用 `on_animation_frame` 驱动手势循环。

use std::time::Instant;

use crate::config::ClientConfig;
use crate::core::{MessageKey, PanelError, PanelResult};
use crate::events::{InboundEvent, OutboundMessage};
use crate::gesture::{
    open_with_fallback, CameraDevice, CameraProvider, GestureNotice, LatestGesture, ListenerId, VisionRuntimeLoader,
};
use crate::resources::{Resource, ResourceKind};
use crate::session::{ExecutionState, NoticeLevel, StartOutcome};
use crate::transport::{ConnectionState, Link, TransportChannel, TransportStats};
use crate::widgets::{Content, LayoutSnapshot, PidGains, WidgetId, WidgetKind};

use super::context::PanelContext;

/// 默认订阅的入站事件
const DEFAULT_EVENTS: [&str; 13] = [
    "connect",
    "disconnect",
    "connected",
    "execution_started",
    "execution_stopped",
    "finished",
    "execution_error",
    "stdout",
    "stderr",
    "image_data",
    "text_data",
    "custom_data",
    "llm_answer",
];

/// 客户端统计信息
#[derive(Debug, Clone, Default)]
pub struct ClientStats {
    pub connection: TransportStats,
    pub events_handled: u64,
    pub frames_run: u64,
    pub live_resources: usize,
    pub widgets: usize,
    pub session_state: ExecutionState,
}

pub struct PanelClient {
    transport: TransportChannel<PanelContext>,
    ctx: PanelContext,
    camera: Option<Box<dyn CameraProvider>>,
    pumps: u64,
}

impl PanelClient {
    pub fn new(config: &ClientConfig, link: Box<dyn Link>, loader: Box<dyn VisionRuntimeLoader>) -> PanelResult<Self> {
        let mut transport = TransportChannel::new(link, &config.server)?;
        for name in DEFAULT_EVENTS {
            transport.subscribe(name, |event: &InboundEvent, ctx: &mut PanelContext| ctx.handle_event(event));
        }
        Ok(Self {
            transport,
            ctx: PanelContext::new(config, loader),
            camera: None,
            pumps: 0,
        })
    }

    /// 设置摄像头提供者
    pub fn with_camera(mut self, camera: Box<dyn CameraProvider>) -> Self {
        self.camera = Some(camera);
        self
    }

    pub fn context(&self) -> &PanelContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut PanelContext {
        &mut self.ctx
    }

    // ---- 连接 ----

    pub fn connect(&mut self, now: Instant) -> PanelResult<()> {
        self.transport.connect(now)
    }

    pub fn disconnect(&mut self) {
        self.transport.disconnect();
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.transport.state()
    }

    /// 额外订阅一个入站事件，与默认处理器一起按注册顺序执行
    pub fn subscribe<F>(&mut self, event: &str, handler: F)
    where
        F: FnMut(&InboundEvent, &mut PanelContext) + 'static,
    {
        self.transport.subscribe(event, handler);
    }

    /// 读取并处理所有已到达的事件，然后执行到期的启动重试
    pub fn pump(&mut self, now: Instant) -> usize {
        self.pumps += 1;
        let events = self.transport.poll(now);
        let count = events.len();
        for event in &events {
            self.transport.deliver(event, &mut self.ctx);
        }
        if let Some(result) = self.ctx.session.tick(now, &mut self.transport) {
            match result {
                Ok(outcome) => log::info!("启动重试结果: {:?}", outcome),
                Err(e) => log::warn!("启动重试失败: {}", e),
            }
        }
        if count > 0 && self.pumps % 100 == 0 {
            log::debug!("第 {} 次轮询，本次处理 {} 个事件", self.pumps, count);
        }
        count
    }

    /// 显示刷新回调：执行到期的手势步骤
    pub fn on_animation_frame(&mut self, _now: Instant) -> usize {
        self.ctx.run_due_frames(&mut self.transport)
    }

    // ---- 会话 ----

    pub fn start(&mut self, code: &str, now: Instant) -> PanelResult<StartOutcome> {
        self.ctx.session.start(code, &mut self.transport, now)
    }

    pub fn stop(&mut self) -> PanelResult<()> {
        self.ctx.session.stop(&mut self.transport)
    }

    pub fn session_state(&self) -> ExecutionState {
        self.ctx.session.state()
    }

    pub fn status(&self) -> &str {
        self.ctx.session.status()
    }

    // ---- 组件 ----

    pub fn create_widget(&mut self, kind: WidgetKind, requested_id: Option<&str>) -> PanelResult<WidgetId> {
        match self.ctx.registry.create(kind, requested_id) {
            Ok(id) => Ok(id),
            Err(e) => {
                if kind == WidgetKind::Webcam && matches!(e, PanelError::AlreadyExists { .. }) {
                    let message = self.ctx.text(MessageKey::WebcamAlreadyExists);
                    self.ctx.notify(NoticeLevel::Warning, message);
                }
                Err(e)
            }
        }
    }

    pub fn rename_widget(&mut self, old_id: &str, new_id: &str) -> PanelResult<bool> {
        let renamed = self.ctx.registry.rename(old_id, new_id, &mut self.ctx.resources)?;
        if renamed {
            self.ctx.gestures.rename(old_id, new_id.trim());
        }
        Ok(renamed)
    }

    /// 删除组件：先停止它的手势循环，再同步释放全部资源
    pub fn remove_widget(&mut self, id: &str) -> PanelResult<()> {
        self.ctx.gestures.disable(id, &mut self.ctx.registry, &mut self.ctx.resources);
        self.ctx.gestures.forget(id);
        self.ctx.registry.remove(id, &mut self.ctx.resources)?;
        Ok(())
    }

    /// 更新滑块并通知后端；返回是否已发出
    pub fn set_slider_values(&mut self, id: &str, values: Vec<f64>) -> PanelResult<bool> {
        let widget = self
            .ctx
            .registry
            .lookup_mut(id)
            .ok_or_else(|| PanelError::UnknownWidget(id.to_string()))?;
        let Content::Slider { values: current, .. } = &mut widget.surface.content else {
            return Err(mismatch(id, widget.kind, "slider_update"));
        };
        *current = values.clone();
        self.emit_if_connected(&OutboundMessage::SliderUpdate {
            widget_id: id.to_string(),
            values,
        })
    }

    /// 更新 PID 增益并通知后端；返回是否已发出
    pub fn set_pid_gains(&mut self, id: &str, gains: PidGains) -> PanelResult<bool> {
        let widget = self
            .ctx
            .registry
            .lookup_mut(id)
            .ok_or_else(|| PanelError::UnknownWidget(id.to_string()))?;
        let Content::Pid { gains: current, .. } = &mut widget.surface.content else {
            return Err(mismatch(id, widget.kind, "pid_update"));
        };
        *current = gains;
        self.emit_if_connected(&OutboundMessage::PidUpdate {
            widget_id: id.to_string(),
            p: gains.p,
            i: gains.i,
            d: gains.d,
        })
    }

    /// 保存回答并发给后端
    pub fn publish_llm_answer(&mut self, answer: &str) -> PanelResult<bool> {
        self.ctx.show_llm_answer(answer);
        self.emit_if_connected(&OutboundMessage::LlmAnswerUpdate {
            answer: answer.to_string(),
        })
    }

    pub fn save_layout(&self) -> PanelResult<String> {
        LayoutSnapshot::capture(&self.ctx.registry).to_json()
    }

    pub fn restore_layout(&mut self, json: &str) -> PanelResult<Vec<WidgetId>> {
        let snapshot = LayoutSnapshot::from_json(json)?;
        Ok(snapshot.restore(&mut self.ctx.registry))
    }

    // ---- 摄像头与手势 ----

    pub fn list_cameras(&self) -> PanelResult<Vec<CameraDevice>> {
        let camera = self
            .camera
            .as_ref()
            .ok_or_else(|| PanelError::acquisition("camera", "no camera provider"))?;
        camera
            .devices()
            .map_err(|e| e.into_panel_error(self.ctx.locale()))
    }

    /// 打开（或切换）组件的摄像头；先停止旧的视频流
    pub fn start_webcam(&mut self, id: &str, device: Option<usize>) -> PanelResult<()> {
        let kind = self
            .ctx
            .registry
            .lookup(id)
            .map(|w| w.kind)
            .ok_or_else(|| PanelError::UnknownWidget(id.to_string()))?;
        if kind != WidgetKind::Webcam {
            return Err(mismatch(id, kind, "webcam"));
        }
        let Some(camera) = self.camera.as_mut() else {
            return Err(PanelError::acquisition("camera", "no camera provider"));
        };

        self.ctx.resources.release_kind(id, ResourceKind::CameraStream);
        match open_with_fallback(camera.as_mut(), device) {
            Ok(opened) => {
                self.ctx.resources.acquire(id, Resource::CameraStream(opened.stream));
                if let Some(widget) = self.ctx.registry.lookup_mut(id) {
                    widget.surface.show_content();
                    if let Some(webcam) = widget.surface.webcam_mut() {
                        webcam.streaming = true;
                        webcam.device = opened.device;
                    }
                }
                if opened.fell_back {
                    let message = self.ctx.text(MessageKey::CameraFallback);
                    self.ctx.notify(NoticeLevel::Warning, message);
                }
                log::info!("摄像头已打开: {} (设备 {:?})", id, opened.device);
                Ok(())
            }
            Err(e) => {
                let locale = self.ctx.locale();
                let guidance = e.guidance(locale);
                self.ctx.gestures.disable(id, &mut self.ctx.registry, &mut self.ctx.resources);
                if let Some(widget) = self.ctx.registry.lookup_mut(id) {
                    widget.surface.show_placeholder(guidance);
                    if let Some(webcam) = widget.surface.webcam_mut() {
                        webcam.streaming = false;
                    }
                }
                self.ctx.notify(NoticeLevel::Error, guidance);
                Err(e.into_panel_error(locale))
            }
        }
    }

    /// 停止组件的摄像头和手势识别；返回是否释放了视频流
    pub fn stop_webcam(&mut self, id: &str) -> bool {
        self.ctx.gestures.disable(id, &mut self.ctx.registry, &mut self.ctx.resources);
        let released = self.ctx.resources.release_kind(id, ResourceKind::CameraStream) > 0;
        let placeholder = self.ctx.text(MessageKey::WebcamPlaceholder);
        if let Some(widget) = self.ctx.registry.lookup_mut(id) {
            if let Some(webcam) = widget.surface.webcam_mut() {
                webcam.streaming = false;
            }
            if widget.kind == WidgetKind::Webcam {
                widget.surface.show_placeholder(placeholder);
            }
        }
        released
    }

    /// 关闭所有手势循环并停止所有视频流
    pub fn stop_all_webcams(&mut self) -> usize {
        let mut ids = self.ctx.registry.ids_of_kind(WidgetKind::Webcam);
        for id in self.ctx.gestures.enabled_widgets() {
            if !ids.iter().any(|existing| existing.as_str() == id) {
                ids.push(WidgetId::new(id));
            }
        }
        ids.iter().filter(|id| self.stop_webcam(id.as_str())).count()
    }

    pub async fn enable_gesture(&mut self, id: &str) -> PanelResult<bool> {
        let ctx = &mut self.ctx;
        let result = ctx
            .gestures
            .enable(id, &mut ctx.registry, &mut ctx.resources, &mut ctx.frames)
            .await;
        if let Err(PanelError::ResourceAcquisition { message, .. }) = &result {
            let notice = format!("{} ({})", ctx.text(MessageKey::GestureLoadFailed), message);
            ctx.notify(NoticeLevel::Error, notice);
        }
        result
    }

    pub fn disable_gesture(&mut self, id: &str) -> bool {
        self.ctx
            .gestures
            .disable(id, &mut self.ctx.registry, &mut self.ctx.resources)
    }

    pub fn recognize_once(&mut self, id: &str) -> PanelResult<Option<String>> {
        self.ctx.gestures.recognize_once(id, &mut self.ctx.resources)
    }

    pub fn latest_gesture(&self, id: &str) -> Option<&LatestGesture> {
        self.ctx.gestures.latest_gesture(id)
    }

    pub fn subscribe_gestures<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&GestureNotice) + 'static,
    {
        self.ctx.gestures.subscribe(listener)
    }

    pub fn unsubscribe_gestures(&mut self, id: ListenerId) -> bool {
        self.ctx.gestures.unsubscribe(id)
    }

    pub fn stats(&self) -> ClientStats {
        ClientStats {
            connection: self.transport.stats(),
            events_handled: self.ctx.stats().events_handled,
            frames_run: self.ctx.stats().frames_run,
            live_resources: self.ctx.resources.total_live(),
            widgets: self.ctx.registry.len(),
            session_state: self.ctx.session.state(),
        }
    }

    fn emit_if_connected(&mut self, message: &OutboundMessage) -> PanelResult<bool> {
        if !self.transport.is_connected() {
            log::debug!("未连接，{} 只在本地生效", message.event_name());
            return Ok(false);
        }
        self.transport.emit(message)?;
        Ok(true)
    }
}

impl Drop for PanelClient {
    fn drop(&mut self) {
        self.stop_all_webcams();
        if self.transport.is_connected() {
            self.transport.disconnect();
        }
    }
}

fn mismatch(id: &str, kind: WidgetKind, event: &str) -> PanelError {
    PanelError::KindMismatch {
        widget_id: id.to_string(),
        actual: kind.name().to_string(),
        event: event.to_string(),
    }
}
