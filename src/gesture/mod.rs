pub mod camera;
pub mod frame;
pub mod gesture_loop;
pub mod overlay;
pub mod record;
pub mod vision;

pub use camera::{open_with_fallback, CameraDevice, CameraError, CameraProvider, OpenedStream, VideoFrame, VideoStream};
pub use frame::{FrameScheduler, FrameToken};
pub use gesture_loop::{GestureListener, GestureLoop, GestureNotice, GestureStats, LatestGesture, ListenerId, LoopState, StepOutcome};
pub use overlay::{LabelFont, OverlayCanvas, OverlayStyle};
pub use record::{format_label, GesturePair, Landmark, PerHandRecord};
pub use vision::{
    Category, GestureRecognizer, RecognitionResult, RecognizerOptions, UnavailableRuntime, VisionRuntime, VisionRuntimeLoader,
};
