// 摄像头接口
//
// 设备枚举和视频流由宿主实现。打开指定设备失败（未找到/约束无法满足）时
// 回退到默认设备一次。

use thiserror::Error;

use crate::core::messages::{self, Locale, MessageKey};
use crate::core::PanelError;

/// 一帧视频图像（RGBA8）
#[derive(Debug, Clone, PartialEq)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl VideoFrame {
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            rgba: vec![0; width as usize * height as usize * 4],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraDevice {
    pub index: usize,
    pub label: String,
}

/// 已打开的视频流
pub trait VideoStream {
    /// 是否已有可用帧
    fn is_ready(&self) -> bool;

    /// 原生分辨率
    fn dimensions(&self) -> (u32, u32);

    /// 当前播放时间（秒）
    fn current_time(&self) -> f64;

    fn frame(&mut self) -> Option<VideoFrame>;

    /// 停止所有轨道
    fn stop(&mut self);
}

pub trait CameraProvider {
    fn devices(&self) -> Result<Vec<CameraDevice>, CameraError>;

    /// 打开指定设备，None 表示默认设备
    fn open(&mut self, device: Option<usize>) -> Result<Box<dyn VideoStream>, CameraError>;
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum CameraError {
    #[error("camera not found")]
    NotFound,

    #[error("camera constraints cannot be satisfied")]
    Overconstrained,

    #[error("camera permission denied")]
    PermissionDenied { secure_context: bool },

    #[error("camera is busy")]
    Busy,

    #[error("camera error: {0}")]
    Other(String),
}

impl CameraError {
    /// 是否可以回退到默认设备重试
    pub fn allows_fallback(&self) -> bool {
        matches!(self, CameraError::NotFound | CameraError::Overconstrained)
    }

    /// 给用户的处理建议
    pub fn guidance(&self, locale: Locale) -> &'static str {
        let key = match self {
            CameraError::NotFound | CameraError::Overconstrained => MessageKey::CameraNotFound,
            CameraError::PermissionDenied { secure_context: false } => MessageKey::CameraInsecureContext,
            CameraError::PermissionDenied { .. } => MessageKey::CameraPermissionDenied,
            CameraError::Busy => MessageKey::CameraBusy,
            CameraError::Other(_) => MessageKey::CameraGeneric,
        };
        messages::text(locale, key)
    }

    pub fn into_panel_error(self, locale: Locale) -> PanelError {
        PanelError::acquisition("camera", format!("{} ({})", self.guidance(locale), self))
    }
}

/// 打开的流以及是否发生了回退
pub struct OpenedStream {
    pub stream: Box<dyn VideoStream>,
    pub device: Option<usize>,
    pub fell_back: bool,
}

/// 打开设备，必要时回退到默认设备一次
pub fn open_with_fallback(
    provider: &mut dyn CameraProvider,
    device: Option<usize>,
) -> Result<OpenedStream, CameraError> {
    match provider.open(device) {
        Ok(stream) => Ok(OpenedStream {
            stream,
            device,
            fell_back: false,
        }),
        Err(e) if device.is_some() && e.allows_fallback() => {
            log::warn!("摄像头 {:?} 打开失败 ({})，回退到默认设备", device, e);
            let stream = provider.open(None)?;
            Ok(OpenedStream {
                stream,
                device: None,
                fell_back: true,
            })
        }
        Err(e) => Err(e),
    }
}
