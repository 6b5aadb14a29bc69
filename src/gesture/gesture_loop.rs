// 手势识别循环
//
// 每个摄像头组件一个循环：取帧 → 推理 → 绘制叠加层 → 打包结果 → 发往后端。
// 循环由帧令牌驱动，每一步结束时申请下一帧；禁用时释放令牌即取消，
// 最多还有一个已在执行的步骤完成。每一步开始时重新检查组件和视频流是否仍然存在。

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::OnceCell;

use super::frame::FrameScheduler;
use super::overlay::{LabelFont, OverlayStyle};
use super::record::{format_label, GesturePair};
use super::vision::{RecognitionResult, RecognizerOptions, VisionRuntime, VisionRuntimeLoader};
use crate::config::GestureConfig;
use crate::core::{PanelError, PanelResult};
use crate::events::OutboundMessage;
use crate::resources::{Resource, ResourceKind, ResourceLifecycleManager};
use crate::transport::OutboundSink;
use crate::widgets::WidgetRegistry;

/// 循环状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopState {
    #[default]
    Disabled,
    Loading,
    Enabled,
}

/// 本地通知：某个组件的最新标签
#[derive(Debug, Clone, PartialEq)]
pub struct GestureNotice {
    pub widget_id: String,
    pub label: String,
}

/// 组件最近一次的识别结果
#[derive(Debug, Clone, PartialEq)]
pub struct LatestGesture {
    pub label: String,
    pub pair: GesturePair,
    pub result: RecognitionResult,
}

pub type GestureListener = Box<dyn FnMut(&GestureNotice)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// 单步执行结果
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// 完成一帧并已重新调度
    Processed,
    /// 视频还没有可用帧，已重新调度
    NotReady,
    /// 循环已结束，不再调度
    Stopped,
    /// 推理失败，已重新调度
    Failed(PanelError),
}

#[derive(Debug, Default, Clone)]
pub struct GestureStats {
    pub frames_processed: u64,
    pub updates_emitted: u64,
    pub inference_errors: u64,
}

pub struct GestureLoop {
    loader: Box<dyn VisionRuntimeLoader>,
    runtime: OnceCell<Arc<dyn VisionRuntime>>,
    runtime_path: String,
    options: RecognizerOptions,
    style: OverlayStyle,
    font: LabelFont,
    states: HashMap<String, LoopState>,
    latest: HashMap<String, LatestGesture>,
    listeners: Vec<(ListenerId, GestureListener)>,
    next_listener: u64,
    stats: GestureStats,
}

impl GestureLoop {
    pub fn new(config: &GestureConfig, loader: Box<dyn VisionRuntimeLoader>) -> Self {
        Self {
            loader,
            runtime: OnceCell::new(),
            runtime_path: config.runtime_path.clone(),
            options: RecognizerOptions {
                model_asset_path: config.model_asset_path.clone(),
                num_hands: config.num_hands,
            },
            style: OverlayStyle::from(config),
            font: LabelFont::new(config.label_font_path.clone()),
            states: HashMap::new(),
            latest: HashMap::new(),
            listeners: Vec::new(),
            next_listener: 0,
            stats: GestureStats::default(),
        }
    }

    pub fn state(&self, widget_id: &str) -> LoopState {
        self.states.get(widget_id).copied().unwrap_or_default()
    }

    pub fn is_enabled(&self, widget_id: &str) -> bool {
        self.state(widget_id) == LoopState::Enabled
    }

    pub fn enabled_widgets(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .states
            .iter()
            .filter(|(_, state)| **state != LoopState::Disabled)
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    pub fn runtime_loaded(&self) -> bool {
        self.runtime.initialized()
    }

    pub fn stats(&self) -> &GestureStats {
        &self.stats
    }

    /// 开启组件的手势识别
    ///
    /// 已开启时返回 `Ok(false)`。运行时在整个进程中只加载一次；
    /// 加载或创建识别器失败时循环保持禁用。
    pub async fn enable(
        &mut self,
        widget_id: &str,
        registry: &mut WidgetRegistry,
        resources: &mut ResourceLifecycleManager,
        scheduler: &mut FrameScheduler,
    ) -> PanelResult<bool> {
        ensure_webcam(registry, widget_id)?;
        if self.state(widget_id) != LoopState::Disabled {
            return Ok(false);
        }
        self.states.insert(widget_id.to_string(), LoopState::Loading);

        let runtime = match self.load_runtime().await {
            Ok(runtime) => runtime,
            Err(e) => {
                log::error!("视觉运行时加载失败: {}", e);
                self.states.remove(widget_id);
                return Err(e);
            }
        };

        if let Err(e) = ensure_webcam(registry, widget_id) {
            self.states.remove(widget_id);
            return Err(e);
        }
        let recognizer = match runtime.create_recognizer(&self.options) {
            Ok(recognizer) => recognizer,
            Err(e) => {
                log::error!("创建手势识别器失败 {}: {}", widget_id, e);
                self.states.remove(widget_id);
                return Err(e);
            }
        };

        resources.release_kind(widget_id, ResourceKind::Recognizer);
        resources.acquire(widget_id, Resource::Recognizer(recognizer));
        if let Some(webcam) = registry.lookup_mut(widget_id).and_then(|w| w.surface.webcam_mut()) {
            webcam.gesture_enabled = true;
        }
        self.states.insert(widget_id.to_string(), LoopState::Enabled);
        scheduler.request(widget_id, resources);
        log::info!("手势识别已开启: {}", widget_id);
        Ok(true)
    }

    /// 关闭组件的手势识别：取消待执行的帧、释放识别器、清空叠加层
    pub fn disable(
        &mut self,
        widget_id: &str,
        registry: &mut WidgetRegistry,
        resources: &mut ResourceLifecycleManager,
    ) -> bool {
        if self.states.remove(widget_id).is_none() {
            return false;
        }
        resources.release_kind(widget_id, ResourceKind::FrameToken);
        resources.release_kind(widget_id, ResourceKind::Recognizer);
        reset_surface(registry, widget_id);
        log::info!("手势识别已关闭: {}", widget_id);
        true
    }

    /// 执行一帧
    pub fn step(
        &mut self,
        widget_id: &str,
        registry: &mut WidgetRegistry,
        resources: &mut ResourceLifecycleManager,
        scheduler: &mut FrameScheduler,
        sink: &mut dyn OutboundSink,
    ) -> StepOutcome {
        if !self.is_enabled(widget_id) {
            return StepOutcome::Stopped;
        }
        if registry.lookup(widget_id).and_then(|w| w.surface.webcam()).is_none() {
            log::debug!("组件已不存在，结束手势循环: {}", widget_id);
            self.states.remove(widget_id);
            resources.release_kind(widget_id, ResourceKind::Recognizer);
            return StepOutcome::Stopped;
        }

        let Some(stream) = resources.stream_mut(widget_id) else {
            scheduler.request(widget_id, resources);
            return StepOutcome::NotReady;
        };
        let captured = if stream.is_ready() {
            let (width, height) = stream.dimensions();
            let timestamp_ms = stream.current_time() * 1000.0;
            stream.frame().map(|frame| (frame, width, height, timestamp_ms))
        } else {
            None
        };
        let Some((frame, width, height, timestamp_ms)) = captured else {
            scheduler.request(widget_id, resources);
            return StepOutcome::NotReady;
        };

        if let Some(webcam) = registry.lookup_mut(widget_id).and_then(|w| w.surface.webcam_mut()) {
            webcam.overlay.resize(width, height);
        }

        let Some(recognizer) = resources.recognizer_mut(widget_id) else {
            log::warn!("识别器已释放，结束手势循环: {}", widget_id);
            self.states.remove(widget_id);
            reset_surface(registry, widget_id);
            return StepOutcome::Stopped;
        };
        let result = match recognizer.recognize_for_video(&frame, timestamp_ms) {
            Ok(result) => result,
            Err(e) => {
                self.stats.inference_errors += 1;
                log::warn!("手势推理失败 {}: {}", widget_id, e);
                scheduler.request(widget_id, resources);
                return StepOutcome::Failed(e);
            }
        };

        let label = format_label(&result);
        if let Some(webcam) = registry.lookup_mut(widget_id).and_then(|w| w.surface.webcam_mut()) {
            webcam
                .overlay
                .draw_frame(&result.landmarks, &label, &self.style, self.font.get());
            webcam.label = label.clone();
        }

        let pair = GesturePair::from_result(&result);
        if sink.is_connected() {
            match sink.emit(&OutboundMessage::GestureUpdate { data: pair.clone() }) {
                Ok(()) => self.stats.updates_emitted += 1,
                Err(e) => log::debug!("gesture_update 发送失败: {}", e),
            }
        }
        self.record(widget_id, label, pair, result);
        self.stats.frames_processed += 1;

        scheduler.request(widget_id, resources);
        StepOutcome::Processed
    }

    /// 立即识别一次并记录结果，不发往后端；没有检测到手时返回 None
    pub fn recognize_once(
        &mut self,
        widget_id: &str,
        resources: &mut ResourceLifecycleManager,
    ) -> PanelResult<Option<String>> {
        let Some(stream) = resources.stream_mut(widget_id) else {
            return Err(PanelError::acquisition("camera", format!("no stream for {}", widget_id)));
        };
        let timestamp_ms = stream.current_time() * 1000.0;
        let frame = if stream.is_ready() { stream.frame() } else { None };
        let Some(frame) = frame else {
            return Err(PanelError::acquisition("camera", format!("video not ready for {}", widget_id)));
        };
        let Some(recognizer) = resources.recognizer_mut(widget_id) else {
            return Err(PanelError::acquisition(
                "gesture recognizer",
                format!("recognizer not found for {}", widget_id),
            ));
        };

        let result = recognizer.recognize_for_video(&frame, timestamp_ms)?;
        if result.is_empty() {
            log::info!("未检测到手势: {}", widget_id);
            return Ok(None);
        }
        let label = format_label(&result);
        let pair = GesturePair::from_result(&result);
        self.record(widget_id, label.clone(), pair, result);
        log::info!("[hand_gesture] {}", label);
        Ok(Some(label))
    }

    pub fn latest_gesture(&self, widget_id: &str) -> Option<&LatestGesture> {
        self.latest.get(widget_id)
    }

    /// 订阅本地标签通知
    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&GestureNotice) + 'static,
    {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    /// 组件改名后迁移循环状态
    pub fn rename(&mut self, old_id: &str, new_id: &str) {
        if let Some(state) = self.states.remove(old_id) {
            self.states.insert(new_id.to_string(), state);
        }
        if let Some(latest) = self.latest.remove(old_id) {
            self.latest.insert(new_id.to_string(), latest);
        }
    }

    /// 组件删除时丢弃全部记录
    pub fn forget(&mut self, widget_id: &str) {
        self.states.remove(widget_id);
        self.latest.remove(widget_id);
    }

    async fn load_runtime(&self) -> PanelResult<Arc<dyn VisionRuntime>> {
        let runtime = self
            .runtime
            .get_or_try_init(|| async {
                log::info!("加载视觉运行时: {}", self.runtime_path);
                self.loader.load(&self.runtime_path).await
            })
            .await?;
        Ok(Arc::clone(runtime))
    }

    fn record(&mut self, widget_id: &str, label: String, pair: GesturePair, result: RecognitionResult) {
        let notice = GestureNotice {
            widget_id: widget_id.to_string(),
            label: label.clone(),
        };
        self.latest
            .insert(widget_id.to_string(), LatestGesture { label, pair, result });
        for (_, listener) in self.listeners.iter_mut() {
            listener(&notice);
        }
    }
}

/// 清空叠加层和标签，关闭界面上的手势开关
fn reset_surface(registry: &mut WidgetRegistry, widget_id: &str) {
    if let Some(webcam) = registry.lookup_mut(widget_id).and_then(|w| w.surface.webcam_mut()) {
        webcam.overlay.clear();
        webcam.label.clear();
        webcam.gesture_enabled = false;
    }
}

fn ensure_webcam(registry: &WidgetRegistry, widget_id: &str) -> PanelResult<()> {
    let widget = registry
        .lookup(widget_id)
        .ok_or_else(|| PanelError::UnknownWidget(widget_id.to_string()))?;
    if widget.surface.webcam().is_none() {
        return Err(PanelError::KindMismatch {
            widget_id: widget_id.to_string(),
            actual: widget.kind.name().to_string(),
            event: "hand_gesture".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use async_trait::async_trait;

    use crate::core::Locale;
    use crate::gesture::camera::{VideoFrame, VideoStream};
    use crate::gesture::record::Landmark;
    use crate::gesture::vision::{Category, GestureRecognizer};
    use crate::widgets::WidgetKind;

    struct Stream {
        ready: bool,
        time: f64,
    }

    impl VideoStream for Stream {
        fn is_ready(&self) -> bool {
            self.ready
        }
        fn dimensions(&self) -> (u32, u32) {
            (64, 48)
        }
        fn current_time(&self) -> f64 {
            self.time
        }
        fn frame(&mut self) -> Option<VideoFrame> {
            self.time += 0.033;
            Some(VideoFrame::blank(64, 48))
        }
        fn stop(&mut self) {}
    }

    struct Recognizer {
        closed: Rc<Cell<bool>>,
        timestamps: Rc<RefCell<Vec<f64>>>,
    }

    impl GestureRecognizer for Recognizer {
        fn recognize_for_video(&mut self, _frame: &VideoFrame, timestamp_ms: f64) -> PanelResult<RecognitionResult> {
            self.timestamps.borrow_mut().push(timestamp_ms);
            Ok(RecognitionResult {
                gestures: vec![vec![Category::new("Open_Palm", 0.9)]],
                landmarks: vec![(0..21).map(|i| Landmark::new(0.2 + i as f64 * 0.03, 0.5, 0.0)).collect()],
                world_landmarks: vec![vec![Landmark::new(0.0, 0.0, 0.0)]],
                handedness: vec![],
            })
        }
        fn close(&mut self) {
            self.closed.set(true);
        }
    }

    #[derive(Default)]
    struct Tracker {
        loads: Cell<u32>,
        closed: Rc<Cell<bool>>,
        timestamps: Rc<RefCell<Vec<f64>>>,
    }

    struct Runtime {
        tracker: Rc<Tracker>,
    }

    impl VisionRuntime for Runtime {
        fn create_recognizer(&self, _options: &RecognizerOptions) -> PanelResult<Box<dyn GestureRecognizer>> {
            Ok(Box::new(Recognizer {
                closed: Rc::clone(&self.tracker.closed),
                timestamps: Rc::clone(&self.tracker.timestamps),
            }))
        }
    }

    struct Loader {
        tracker: Rc<Tracker>,
        fail: bool,
    }

    #[async_trait(?Send)]
    impl VisionRuntimeLoader for Loader {
        async fn load(&self, _runtime_path: &str) -> PanelResult<Arc<dyn VisionRuntime>> {
            self.tracker.loads.set(self.tracker.loads.get() + 1);
            if self.fail {
                return Err(PanelError::acquisition("vision runtime", "offline"));
            }
            Ok(Arc::new(Runtime {
                tracker: Rc::clone(&self.tracker),
            }))
        }
    }

    #[derive(Default)]
    struct Sink {
        connected: bool,
        sent: Vec<OutboundMessage>,
    }

    impl OutboundSink for Sink {
        fn is_connected(&self) -> bool {
            self.connected
        }
        fn emit(&mut self, message: &OutboundMessage) -> PanelResult<()> {
            self.sent.push(message.clone());
            Ok(())
        }
    }

    struct Fixture {
        gestures: GestureLoop,
        registry: WidgetRegistry,
        resources: ResourceLifecycleManager,
        scheduler: FrameScheduler,
        tracker: Rc<Tracker>,
    }

    fn fixture(fail: bool, ready: bool) -> Fixture {
        let tracker = Rc::new(Tracker::default());
        let loader = Loader {
            tracker: Rc::clone(&tracker),
            fail,
        };
        let mut registry = WidgetRegistry::new(Locale::En);
        registry.create(WidgetKind::Webcam, None).unwrap();
        let mut resources = ResourceLifecycleManager::new(64);
        resources.acquire("Webcam_0", Resource::CameraStream(Box::new(Stream { ready, time: 1.0 })));
        Fixture {
            gestures: GestureLoop::new(&GestureConfig::default(), Box::new(loader)),
            registry,
            resources,
            scheduler: FrameScheduler::new(),
            tracker,
        }
    }

    impl Fixture {
        async fn enable(&mut self) -> PanelResult<bool> {
            self.gestures
                .enable("Webcam_0", &mut self.registry, &mut self.resources, &mut self.scheduler)
                .await
        }

        fn run_due(&mut self, sink: &mut Sink) -> Vec<StepOutcome> {
            let due = self.scheduler.take_due(&mut self.resources);
            due.iter()
                .map(|id| {
                    self.gestures
                        .step(id, &mut self.registry, &mut self.resources, &mut self.scheduler, sink)
                })
                .collect()
        }
    }

    #[tokio::test]
    async fn enable_is_idempotent_and_runtime_loads_once() {
        let mut fx = fixture(false, true);
        assert_eq!(fx.enable().await, Ok(true));
        assert_eq!(fx.enable().await, Ok(false));
        assert!(fx.gestures.disable("Webcam_0", &mut fx.registry, &mut fx.resources));
        assert_eq!(fx.enable().await, Ok(true));
        assert_eq!(fx.tracker.loads.get(), 1);
        assert!(fx.gestures.runtime_loaded());
        assert_eq!(fx.resources.live_count("Webcam_0", ResourceKind::Recognizer), 1);
    }

    #[tokio::test]
    async fn step_draws_overlay_and_emits_update() {
        let mut fx = fixture(false, true);
        let notices = Rc::new(RefCell::new(Vec::new()));
        let seen = Rc::clone(&notices);
        fx.gestures.subscribe(move |notice| seen.borrow_mut().push(notice.clone()));
        fx.enable().await.unwrap();

        let mut sink = Sink {
            connected: true,
            ..Sink::default()
        };
        assert_eq!(fx.run_due(&mut sink), vec![StepOutcome::Processed]);

        let webcam = fx.registry.lookup("Webcam_0").unwrap().surface.webcam().unwrap();
        assert_eq!((webcam.overlay.width(), webcam.overlay.height()), (64, 48));
        assert!(!webcam.overlay.is_blank());
        assert_eq!(webcam.label, "Hand 1: Open_Palm (90.0%)");

        assert_eq!(sink.sent.len(), 1);
        match &sink.sent[0] {
            OutboundMessage::GestureUpdate { data } => {
                assert!(data.hand1.is_exist);
                assert!(!data.hand2.is_exist);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(notices.borrow()[0].widget_id, "Webcam_0");
        assert_eq!(fx.tracker.timestamps.borrow()[0], 1000.0);
        assert_eq!(fx.scheduler.pending_count(&fx.resources), 1);
        assert_eq!(fx.gestures.latest_gesture("Webcam_0").unwrap().pair.hand1.gesture, "Open_Palm");
    }

    #[tokio::test]
    async fn disable_cancels_pending_frame_and_clears_overlay() {
        let mut fx = fixture(false, true);
        fx.enable().await.unwrap();
        let mut sink = Sink {
            connected: true,
            ..Sink::default()
        };
        fx.run_due(&mut sink);

        fx.gestures.disable("Webcam_0", &mut fx.registry, &mut fx.resources);
        assert!(fx.run_due(&mut sink).is_empty());
        assert_eq!(sink.sent.len(), 1);
        assert!(fx.tracker.closed.get());
        let webcam = fx.registry.lookup("Webcam_0").unwrap().surface.webcam().unwrap();
        assert!(webcam.overlay.is_blank());
        assert!(!webcam.gesture_enabled);
    }

    #[tokio::test]
    async fn removed_widget_ends_the_loop_quietly() {
        let mut fx = fixture(false, true);
        fx.enable().await.unwrap();
        let handle = fx.scheduler.request("Webcam_0", &mut fx.resources);
        fx.registry.remove("Webcam_0", &mut fx.resources).unwrap();
        assert!(!fx.resources.is_live(handle));

        let mut sink = Sink::default();
        let outcome = fx
            .gestures
            .step("Webcam_0", &mut fx.registry, &mut fx.resources, &mut fx.scheduler, &mut sink);
        assert_eq!(outcome, StepOutcome::Stopped);
        assert!(sink.sent.is_empty());
        assert_eq!(fx.gestures.state("Webcam_0"), LoopState::Disabled);
    }

    struct Broken;

    impl GestureRecognizer for Broken {
        fn recognize_for_video(&mut self, _frame: &VideoFrame, _timestamp_ms: f64) -> PanelResult<RecognitionResult> {
            Err(PanelError::acquisition("gesture recognizer", "inference backend crashed"))
        }
        fn close(&mut self) {}
    }

    #[tokio::test]
    async fn overlay_matches_video_before_inference() {
        let mut fx = fixture(false, true);
        fx.enable().await.unwrap();
        fx.resources.release_kind("Webcam_0", ResourceKind::Recognizer);
        fx.resources.acquire("Webcam_0", Resource::Recognizer(Box::new(Broken)));

        let mut sink = Sink {
            connected: true,
            ..Sink::default()
        };
        let outcomes = fx.run_due(&mut sink);
        assert!(matches!(outcomes.as_slice(), [StepOutcome::Failed(_)]));

        let webcam = fx.registry.lookup("Webcam_0").unwrap().surface.webcam().unwrap();
        assert_eq!((webcam.overlay.width(), webcam.overlay.height()), (64, 48));
        assert!(webcam.overlay.is_blank());
        assert!(sink.sent.is_empty());
        assert_eq!(fx.gestures.stats().inference_errors, 1);
        assert_eq!(fx.scheduler.pending_count(&fx.resources), 1);
    }

    #[tokio::test]
    async fn lost_recognizer_turns_the_toggle_off() {
        let mut fx = fixture(false, true);
        fx.enable().await.unwrap();
        let mut sink = Sink {
            connected: true,
            ..Sink::default()
        };
        fx.run_due(&mut sink);
        fx.resources.release_kind("Webcam_0", ResourceKind::Recognizer);

        assert_eq!(fx.run_due(&mut sink), vec![StepOutcome::Stopped]);
        assert_eq!(fx.gestures.state("Webcam_0"), LoopState::Disabled);
        let webcam = fx.registry.lookup("Webcam_0").unwrap().surface.webcam().unwrap();
        assert!(!webcam.gesture_enabled);
        assert!(webcam.label.is_empty());
        assert!(webcam.overlay.is_blank());
        assert_eq!(fx.scheduler.pending_count(&fx.resources), 0);
        assert_eq!(sink.sent.len(), 1);
    }

    #[tokio::test]
    async fn unready_video_keeps_the_loop_alive() {
        let mut fx = fixture(false, false);
        fx.enable().await.unwrap();
        let mut sink = Sink::default();
        assert_eq!(fx.run_due(&mut sink), vec![StepOutcome::NotReady]);
        assert_eq!(fx.scheduler.pending_count(&fx.resources), 1);
        assert!(fx.tracker.timestamps.borrow().is_empty());
    }

    #[tokio::test]
    async fn load_failure_leaves_loop_disabled() {
        let mut fx = fixture(true, true);
        assert!(matches!(
            fx.enable().await,
            Err(PanelError::ResourceAcquisition { .. })
        ));
        assert_eq!(fx.gestures.state("Webcam_0"), LoopState::Disabled);
        assert_eq!(fx.scheduler.pending_count(&fx.resources), 0);
    }

    #[tokio::test]
    async fn recognize_once_records_without_emitting() {
        let mut fx = fixture(false, true);
        fx.enable().await.unwrap();
        let label = fx.gestures.recognize_once("Webcam_0", &mut fx.resources).unwrap();
        assert_eq!(label.as_deref(), Some("Hand 1: Open_Palm (90.0%)"));
        assert!(fx.gestures.latest_gesture("Webcam_0").is_some());
        assert_eq!(fx.gestures.stats().updates_emitted, 0);
    }

    #[tokio::test]
    async fn enabling_requires_a_webcam_widget() {
        let mut fx = fixture(false, true);
        fx.registry.create(WidgetKind::Image, None).unwrap();
        let result = fx
            .gestures
            .enable("Image_0", &mut fx.registry, &mut fx.resources, &mut fx.scheduler)
            .await;
        assert!(matches!(result, Err(PanelError::KindMismatch { .. })));
        let result = fx
            .gestures
            .enable("ghost", &mut fx.registry, &mut fx.resources, &mut fx.scheduler)
            .await;
        assert_eq!(result, Err(PanelError::UnknownWidget("ghost".into())));
    }
}
