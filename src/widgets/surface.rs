// 无界面的组件显示模型
//
// 每个组件有一个占位元素和一个内容元素，子元素ID按 `${prefix}_${id}` 派生。
// 界面层读取这里的状态进行渲染，核心只切换可见性和内容。

use image::RgbaImage;

use super::types::{PidGains, WidgetKind};
use crate::core::messages::{self, Locale, MessageKey};
use crate::gesture::overlay::OverlayCanvas;
use crate::resources::HandleId;

#[derive(Debug, Clone, PartialEq)]
pub struct Placeholder {
    pub element_id: String,
    pub visible: bool,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct ImageElement {
    pub element_id: String,
    /// 当前显示的资源引用（blob 地址或 data: URL）
    pub src: Option<String>,
    pub pixels: Option<RgbaImage>,
    /// 当前显示图像的可撤销句柄（内嵌引用时为 None）
    pub handle: Option<HandleId>,
    pub visible: bool,
}

#[derive(Debug, Clone, Default)]
pub struct WebcamElements {
    pub video_id: String,
    pub overlay_id: String,
    pub toggle_id: String,
    pub label_id: String,
    pub overlay: OverlayCanvas,
    pub label: String,
    pub streaming: bool,
    pub device: Option<usize>,
    pub gesture_enabled: bool,
}

#[derive(Debug, Clone)]
pub enum Content {
    Image(ImageElement),
    Text {
        element_id: String,
        text: String,
        visible: bool,
    },
    Slider {
        element_id: String,
        values: Vec<f64>,
    },
    Pid {
        element_id: String,
        gains: PidGains,
    },
    Webcam(Box<WebcamElements>),
    Assistant {
        element_id: String,
        answer: String,
    },
}

#[derive(Debug, Clone)]
pub struct WidgetSurface {
    pub placeholder: Placeholder,
    pub content: Content,
}

impl WidgetSurface {
    pub fn new(kind: WidgetKind, id: &str, locale: Locale) -> Self {
        let message = match kind {
            WidgetKind::Image => messages::text(locale, MessageKey::ImagePlaceholder),
            WidgetKind::Webcam => messages::text(locale, MessageKey::WebcamPlaceholder),
            _ => "",
        };
        let content = match kind {
            WidgetKind::Image => Content::Image(ImageElement::default()),
            WidgetKind::Text => Content::Text {
                element_id: String::new(),
                text: String::new(),
                visible: false,
            },
            WidgetKind::Slider => Content::Slider {
                element_id: String::new(),
                values: vec![0.0],
            },
            WidgetKind::Pid => Content::Pid {
                element_id: String::new(),
                gains: PidGains::default(),
            },
            WidgetKind::Webcam => Content::Webcam(Box::default()),
            WidgetKind::Assistant => Content::Assistant {
                element_id: String::new(),
                answer: String::new(),
            },
        };

        let mut surface = Self {
            placeholder: Placeholder {
                element_id: String::new(),
                visible: true,
                message: message.to_string(),
            },
            content,
        };
        surface.relink(id);
        surface
    }

    /// 重新派生全部子元素ID
    pub fn relink(&mut self, id: &str) {
        let derive = |prefix: &str| format!("{}_{}", prefix, id);
        match &mut self.content {
            Content::Image(image) => {
                image.element_id = derive("imageDisplay");
                self.placeholder.element_id = derive("imagePlaceholder");
            }
            Content::Text { element_id, .. } => {
                *element_id = derive("textDisplay");
                self.placeholder.element_id = derive("textPlaceholder");
            }
            Content::Slider { element_id, .. } => {
                *element_id = derive("sliderInput");
                self.placeholder.element_id = derive("sliderPlaceholder");
            }
            Content::Pid { element_id, .. } => {
                *element_id = derive("pidGains");
                self.placeholder.element_id = derive("pidPlaceholder");
            }
            Content::Webcam(webcam) => {
                webcam.video_id = derive("webcamVideo");
                webcam.overlay_id = derive("webcamOverlay");
                webcam.toggle_id = derive("handGestureToggle");
                webcam.label_id = derive("handGestureLabel");
                self.placeholder.element_id = derive("webcamDisplay");
            }
            Content::Assistant { element_id, .. } => {
                *element_id = derive("assistantAnswer");
                self.placeholder.element_id = derive("assistantPlaceholder");
            }
        }
    }

    /// 全部派生元素ID
    pub fn element_ids(&self) -> Vec<&str> {
        let mut ids = vec![self.placeholder.element_id.as_str()];
        match &self.content {
            Content::Image(image) => ids.push(&image.element_id),
            Content::Text { element_id, .. }
            | Content::Slider { element_id, .. }
            | Content::Pid { element_id, .. }
            | Content::Assistant { element_id, .. } => ids.push(element_id),
            Content::Webcam(webcam) => {
                ids.push(&webcam.video_id);
                ids.push(&webcam.overlay_id);
                ids.push(&webcam.toggle_id);
                ids.push(&webcam.label_id);
            }
        }
        ids
    }

    pub fn image(&self) -> Option<&ImageElement> {
        match &self.content {
            Content::Image(image) => Some(image),
            _ => None,
        }
    }

    pub fn image_mut(&mut self) -> Option<&mut ImageElement> {
        match &mut self.content {
            Content::Image(image) => Some(image),
            _ => None,
        }
    }

    pub fn webcam(&self) -> Option<&WebcamElements> {
        match &self.content {
            Content::Webcam(webcam) => Some(webcam),
            _ => None,
        }
    }

    pub fn webcam_mut(&mut self) -> Option<&mut WebcamElements> {
        match &mut self.content {
            Content::Webcam(webcam) => Some(webcam),
            _ => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.content {
            Content::Text { text, .. } => Some(text),
            Content::Assistant { answer, .. } => Some(answer),
            _ => None,
        }
    }

    /// 设置文本内容并显示
    pub fn set_text(&mut self, value: &str) -> bool {
        match &mut self.content {
            Content::Text { text, visible, .. } => {
                *text = value.to_string();
                *visible = true;
            }
            Content::Assistant { answer, .. } => *answer = value.to_string(),
            _ => return false,
        }
        self.placeholder.visible = false;
        true
    }

    /// 内容可见、占位隐藏
    pub fn show_content(&mut self) {
        self.placeholder.visible = false;
        if let Content::Image(image) = &mut self.content {
            image.visible = true;
        }
    }

    /// 占位可见（附带提示文本）、内容隐藏
    pub fn show_placeholder(&mut self, message: &str) {
        self.placeholder.visible = true;
        self.placeholder.message = message.to_string();
        match &mut self.content {
            Content::Image(image) => image.visible = false,
            Content::Text { visible, .. } => *visible = false,
            _ => {}
        }
    }

    pub fn content_visible(&self) -> bool {
        match &self.content {
            Content::Image(image) => image.visible,
            Content::Text { visible, .. } => *visible,
            _ => !self.placeholder.visible,
        }
    }
}
