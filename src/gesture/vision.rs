// 视觉推理运行时接口
//
// 运行时（模型文件、推理后端）由宿主提供，这里只定义加载和识别的边界。

use std::sync::Arc;

use async_trait::async_trait;

use super::camera::VideoFrame;
use super::record::Landmark;
use crate::core::{PanelError, PanelResult};

/// 分类结果
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub name: String,
    pub score: f64,
}

impl Category {
    pub fn new(name: impl Into<String>, score: f64) -> Self {
        Self {
            name: name.into(),
            score,
        }
    }
}

/// 一帧的识别结果，各列表按手的序号对齐
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecognitionResult {
    /// 每只手的候选手势，按得分降序
    pub gestures: Vec<Vec<Category>>,
    /// 归一化图像坐标 [0,1]，用于绘制
    pub landmarks: Vec<Vec<Landmark>>,
    /// 世界坐标（米），随 gesture_update 发送
    pub world_landmarks: Vec<Vec<Landmark>>,
    pub handedness: Vec<Vec<Category>>,
}

impl RecognitionResult {
    pub fn is_empty(&self) -> bool {
        self.gestures.iter().all(Vec::is_empty)
    }

    /// 第 idx 只手的最高分手势
    pub fn top_gesture(&self, idx: usize) -> Option<&Category> {
        self.gestures.get(idx).and_then(|candidates| candidates.first())
    }
}

/// 识别器创建参数
#[derive(Debug, Clone, PartialEq)]
pub struct RecognizerOptions {
    pub model_asset_path: String,
    pub num_hands: usize,
}

/// 单个组件持有的手势识别器
pub trait GestureRecognizer {
    /// 以视频时间戳（毫秒）为键识别一帧
    fn recognize_for_video(&mut self, frame: &VideoFrame, timestamp_ms: f64) -> PanelResult<RecognitionResult>;

    fn close(&mut self);
}

/// 已加载的推理运行时
pub trait VisionRuntime {
    fn create_recognizer(&self, options: &RecognizerOptions) -> PanelResult<Box<dyn GestureRecognizer>>;
}

/// 运行时加载器（异步，整个进程只加载一次）
#[async_trait(?Send)]
pub trait VisionRuntimeLoader {
    async fn load(&self, runtime_path: &str) -> PanelResult<Arc<dyn VisionRuntime>>;
}

/// 没有推理后端的宿主使用的加载器，总是返回获取失败
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableRuntime;

#[async_trait(?Send)]
impl VisionRuntimeLoader for UnavailableRuntime {
    async fn load(&self, runtime_path: &str) -> PanelResult<Arc<dyn VisionRuntime>> {
        Err(PanelError::acquisition(
            "vision runtime",
            format!("no inference backend available for {}", runtime_path),
        ))
    }
}
