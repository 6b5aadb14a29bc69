use std::fmt;

use chrono::{DateTime, Utc};

use crate::gesture::camera::VideoStream;
use crate::gesture::frame::FrameToken;
use crate::gesture::vision::GestureRecognizer;

/// 资源句柄，全局唯一且不复用
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId(pub(crate) u64);

impl HandleId {
    pub fn value(&self) -> u64 {
        self.0
    }

    /// 可撤销二进制对象的引用地址
    pub fn object_url(&self) -> String {
        format!("blob:panel_relay/{}", self.0)
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    ImageBlob,
    CameraStream,
    FrameToken,
    Recognizer,
}

/// 由组件独占的外部资源
pub enum Resource {
    /// 带类型的二进制图像对象
    ImageBlob { mime: String, bytes: Vec<u8> },
    CameraStream(Box<dyn VideoStream>),
    FrameToken(FrameToken),
    Recognizer(Box<dyn GestureRecognizer>),
}

impl Resource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::ImageBlob { .. } => ResourceKind::ImageBlob,
            Resource::CameraStream(_) => ResourceKind::CameraStream,
            Resource::FrameToken(_) => ResourceKind::FrameToken,
            Resource::Recognizer(_) => ResourceKind::Recognizer,
        }
    }

    /// 释放底层资源（停止视频轨道、关闭识别器）
    pub(crate) fn release(self) {
        match self {
            Resource::ImageBlob { .. } | Resource::FrameToken(_) => {}
            Resource::CameraStream(mut stream) => stream.stop(),
            Resource::Recognizer(mut recognizer) => recognizer.close(),
        }
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::ImageBlob { mime, bytes } => f
                .debug_struct("ImageBlob")
                .field("mime", mime)
                .field("len", &bytes.len())
                .finish(),
            Resource::CameraStream(_) => f.write_str("CameraStream"),
            Resource::FrameToken(token) => f.debug_tuple("FrameToken").field(token).finish(),
            Resource::Recognizer(_) => f.write_str("Recognizer"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleAction {
    Acquired,
    /// 图像已完成加载（成功或失败）
    Loaded,
    Released,
}

/// 资源生命周期日志记录
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceRecord {
    pub handle: HandleId,
    pub kind: ResourceKind,
    pub widget_id: String,
    pub action: LifecycleAction,
    pub at: DateTime<Utc>,
}
