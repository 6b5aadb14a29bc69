// 摄像头与手势识别端到端测试（宿主侧摄像头和推理运行时用测试替身）
mod common;

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;

use async_trait::async_trait;
use panel_relay::gesture::{
    CameraDevice, CameraError, CameraProvider, Category, GestureRecognizer, Landmark, LoopState, RecognitionResult,
    RecognizerOptions, VideoFrame, VideoStream, VisionRuntime, VisionRuntimeLoader,
};
use panel_relay::resources::ResourceKind;
use panel_relay::session::NoticeLevel;
use panel_relay::{PanelClient, PanelError, PanelResult, WidgetKind};
use serde_json::json;

use common::{client_with, sent_names};

struct FakeStream {
    stopped: Rc<Cell<u32>>,
    time: f64,
}

impl VideoStream for FakeStream {
    fn is_ready(&self) -> bool {
        true
    }
    fn dimensions(&self) -> (u32, u32) {
        (320, 240)
    }
    fn current_time(&self) -> f64 {
        self.time
    }
    fn frame(&mut self) -> Option<VideoFrame> {
        self.time += 0.04;
        Some(VideoFrame::blank(320, 240))
    }
    fn stop(&mut self) {
        self.stopped.set(self.stopped.get() + 1);
    }
}

struct FakeCamera {
    devices: usize,
    deny: bool,
    stopped: Rc<Cell<u32>>,
}

impl CameraProvider for FakeCamera {
    fn devices(&self) -> Result<Vec<CameraDevice>, CameraError> {
        Ok((0..self.devices)
            .map(|index| CameraDevice {
                index,
                label: format!("camera {}", index),
            })
            .collect())
    }

    fn open(&mut self, device: Option<usize>) -> Result<Box<dyn VideoStream>, CameraError> {
        if self.deny {
            return Err(CameraError::PermissionDenied { secure_context: true });
        }
        if device.map_or(false, |index| index >= self.devices) {
            return Err(CameraError::NotFound);
        }
        Ok(Box::new(FakeStream {
            stopped: Rc::clone(&self.stopped),
            time: 0.0,
        }))
    }
}

struct ThumbsUp {
    closed: Rc<Cell<bool>>,
}

impl GestureRecognizer for ThumbsUp {
    fn recognize_for_video(&mut self, _frame: &VideoFrame, _timestamp_ms: f64) -> PanelResult<RecognitionResult> {
        Ok(RecognitionResult {
            gestures: vec![vec![Category::new("Thumb_Up", 0.87)]],
            landmarks: vec![(0..21).map(|i| Landmark::new(0.3 + i as f64 * 0.01, 0.4, 0.0)).collect()],
            world_landmarks: vec![vec![Landmark::new(0.01, 0.02, 0.03)]],
            handedness: vec![vec![Category::new("Right", 0.99)]],
        })
    }
    fn close(&mut self) {
        self.closed.set(true);
    }
}

struct FakeRuntime {
    closed: Rc<Cell<bool>>,
}

impl VisionRuntime for FakeRuntime {
    fn create_recognizer(&self, options: &RecognizerOptions) -> PanelResult<Box<dyn GestureRecognizer>> {
        assert_eq!(options.num_hands, 2);
        Ok(Box::new(ThumbsUp {
            closed: Rc::clone(&self.closed),
        }))
    }
}

struct FakeLoader {
    closed: Rc<Cell<bool>>,
    offline: bool,
}

#[async_trait(?Send)]
impl VisionRuntimeLoader for FakeLoader {
    async fn load(&self, _runtime_path: &str) -> PanelResult<Arc<dyn VisionRuntime>> {
        if self.offline {
            return Err(PanelError::acquisition("vision runtime", "model download failed"));
        }
        Ok(Arc::new(FakeRuntime {
            closed: Rc::clone(&self.closed),
        }))
    }
}

struct Rig {
    client: PanelClient,
    server: panel_relay::transport::MemoryServer,
    now: std::time::Instant,
    stopped: Rc<Cell<u32>>,
    closed: Rc<Cell<bool>>,
}

fn rig(devices: usize, deny: bool, offline: bool) -> Rig {
    let stopped = Rc::new(Cell::new(0));
    let closed = Rc::new(Cell::new(false));
    let loader = FakeLoader {
        closed: Rc::clone(&closed),
        offline,
    };
    let (client, server) = client_with(Box::new(loader));
    let mut client = client.with_camera(Box::new(FakeCamera {
        devices,
        deny,
        stopped: Rc::clone(&stopped),
    }));
    let now = std::time::Instant::now();
    client.connect(now).unwrap();
    server.accept("cam");
    client.pump(now);
    client.create_widget(WidgetKind::Webcam, None).unwrap();
    Rig {
        client,
        server,
        now,
        stopped,
        closed,
    }
}

fn gesture_updates(server: &panel_relay::transport::MemoryServer) -> usize {
    sent_names(server).iter().filter(|name| *name == "gesture_update").count()
}

#[tokio::test]
async fn recognized_gestures_are_sent_every_frame() {
    let mut rig = rig(2, false, false);
    rig.client.start_webcam("Webcam_0", Some(1)).unwrap();
    assert!(rig.client.enable_gesture("Webcam_0").await.unwrap());

    let notices = Rc::new(RefCell::new(Vec::new()));
    let seen = Rc::clone(&notices);
    rig.client.subscribe_gestures(move |notice| seen.borrow_mut().push(notice.label.clone()));

    assert_eq!(rig.client.on_animation_frame(rig.now), 1);
    assert_eq!(rig.client.on_animation_frame(rig.now), 1);
    assert_eq!(gesture_updates(&rig.server), 2);

    let (_, payload) = rig
        .server
        .sent_events()
        .into_iter()
        .find(|(name, _)| name == "gesture_update")
        .unwrap();
    assert_eq!(payload["data"]["Hand1"]["isExist"], json!(true));
    assert_eq!(payload["data"]["Hand1"]["gesture"], json!("Thumb_Up"));
    assert_eq!(payload["data"]["Hand2"]["isExist"], json!(false));

    let latest = rig.client.latest_gesture("Webcam_0").unwrap();
    assert!(latest.label.contains("Thumb_Up"));
    assert_eq!(notices.borrow().len(), 2);

    let webcam = rig.client.context().registry.lookup("Webcam_0").unwrap();
    assert!(webcam.surface.webcam().unwrap().label.contains("Thumb_Up"));
}

#[tokio::test]
async fn removing_the_widget_stops_the_loop() {
    let mut rig = rig(1, false, false);
    rig.client.start_webcam("Webcam_0", None).unwrap();
    rig.client.enable_gesture("Webcam_0").await.unwrap();
    rig.client.on_animation_frame(rig.now);

    rig.client.remove_widget("Webcam_0").unwrap();
    let before = gesture_updates(&rig.server);
    assert_eq!(rig.client.on_animation_frame(rig.now), 0);
    assert_eq!(gesture_updates(&rig.server), before);

    assert_eq!(rig.stopped.get(), 1);
    assert!(rig.closed.get());
    assert_eq!(rig.client.stats().live_resources, 0);
}

#[tokio::test]
async fn disabling_keeps_the_stream_but_stops_inference() {
    let mut rig = rig(1, false, false);
    rig.client.start_webcam("Webcam_0", None).unwrap();
    rig.client.enable_gesture("Webcam_0").await.unwrap();

    assert!(rig.client.disable_gesture("Webcam_0"));
    assert_eq!(rig.client.on_animation_frame(rig.now), 0);
    assert_eq!(gesture_updates(&rig.server), 0);

    let ctx = rig.client.context();
    assert_eq!(ctx.gestures.state("Webcam_0"), LoopState::Disabled);
    assert_eq!(ctx.resources.live_count("Webcam_0", ResourceKind::CameraStream), 1);
    assert_eq!(ctx.resources.live_count("Webcam_0", ResourceKind::Recognizer), 0);
}

#[tokio::test]
async fn stop_all_webcams_releases_every_stream() {
    let mut rig = rig(1, false, false);
    rig.client.start_webcam("Webcam_0", None).unwrap();
    rig.client.enable_gesture("Webcam_0").await.unwrap();

    assert_eq!(rig.client.stop_all_webcams(), 1);
    assert_eq!(rig.stopped.get(), 1);
    assert_eq!(rig.client.on_animation_frame(rig.now), 0);
    let webcam = rig.client.context().registry.lookup("Webcam_0").unwrap();
    assert!(!webcam.surface.webcam().unwrap().streaming);
    assert!(!webcam.surface.content_visible());
}

#[tokio::test]
async fn missing_device_falls_back_to_default() {
    let mut rig = rig(1, false, false);
    rig.client.start_webcam("Webcam_0", Some(3)).unwrap();

    let ctx = rig.client.context();
    let webcam = ctx.registry.lookup("Webcam_0").unwrap().surface.webcam().unwrap();
    assert!(webcam.streaming);
    assert_eq!(webcam.device, None);
    assert!(ctx
        .notices()
        .any(|n| n.level == NoticeLevel::Warning && n.message.contains("default device")));
}

#[tokio::test]
async fn denied_permission_shows_guidance() {
    let mut rig = rig(1, true, false);
    let err = rig.client.start_webcam("Webcam_0", None).unwrap_err();
    assert!(matches!(err, PanelError::ResourceAcquisition { .. }));

    let widget = rig.client.context().registry.lookup("Webcam_0").unwrap();
    assert!(!widget.surface.content_visible());
    assert!(widget.surface.placeholder.message.contains("permission"));
    assert_eq!(rig.client.stats().live_resources, 0);
}

#[tokio::test]
async fn runtime_load_failure_is_reported() {
    let mut rig = rig(1, false, true);
    rig.client.start_webcam("Webcam_0", None).unwrap();

    assert!(rig.client.enable_gesture("Webcam_0").await.is_err());
    assert_eq!(rig.client.context().gestures.state("Webcam_0"), LoopState::Disabled);
    assert!(rig
        .client
        .context()
        .notices()
        .any(|n| n.level == NoticeLevel::Error && n.message.contains("gesture recognizer")));
}

#[tokio::test]
async fn only_one_webcam_widget() {
    let mut rig = rig(1, false, false);
    assert!(matches!(
        rig.client.create_widget(WidgetKind::Webcam, None),
        Err(PanelError::AlreadyExists { .. })
    ));
    assert_eq!(rig.client.list_cameras().unwrap().len(), 1);
}
