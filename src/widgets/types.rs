use std::borrow::Borrow;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::surface::WidgetSurface;

/// 组件ID（用户可编辑，所有存活组件之间唯一）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WidgetId(String);

impl WidgetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for WidgetId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WidgetId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl PartialEq<str> for WidgetId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for WidgetId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// 组件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetKind {
    Image,
    Text,
    Slider,
    Pid,
    Webcam,
    Assistant,
}

impl WidgetKind {
    pub const ALL: [WidgetKind; 6] = [
        WidgetKind::Image,
        WidgetKind::Text,
        WidgetKind::Slider,
        WidgetKind::Pid,
        WidgetKind::Webcam,
        WidgetKind::Assistant,
    ];

    /// 自动生成ID的前缀：`${prefix}_${n}`
    pub fn prefix(&self) -> &'static str {
        match self {
            WidgetKind::Image => "Image",
            WidgetKind::Text => "Text",
            WidgetKind::Slider => "Slider",
            WidgetKind::Pid => "PID",
            WidgetKind::Webcam => "Webcam",
            WidgetKind::Assistant => "Assistant",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            WidgetKind::Image => "image",
            WidgetKind::Text => "text",
            WidgetKind::Slider => "slider",
            WidgetKind::Pid => "pid",
            WidgetKind::Webcam => "webcam",
            WidgetKind::Assistant => "assistant",
        }
    }

    /// 同一时间只能存在一个实例
    pub fn is_singleton(&self) -> bool {
        matches!(self, WidgetKind::Webcam | WidgetKind::Assistant)
    }

    pub fn accepts_image(&self) -> bool {
        matches!(self, WidgetKind::Image)
    }

    pub fn accepts_text(&self) -> bool {
        matches!(self, WidgetKind::Text | WidgetKind::Assistant)
    }
}

impl fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// PID 控制器增益
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PidGains {
    pub p: f64,
    pub i: f64,
    pub d: f64,
}

/// 注册表中的组件
#[derive(Debug, Clone)]
pub struct Widget {
    pub id: WidgetId,
    pub kind: WidgetKind,
    pub surface: WidgetSurface,
    pub created_at: DateTime<Utc>,
}

impl Widget {
    pub fn singleton(&self) -> bool {
        self.kind.is_singleton()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn widget_id_borrows_as_str() {
        let mut map: HashMap<WidgetId, u8> = HashMap::new();
        map.insert(WidgetId::new("Image_0"), 1);
        assert_eq!(map.get("Image_0"), Some(&1));
        assert_eq!(WidgetId::from("Image_0"), "Image_0");
    }

    #[test]
    fn kinds_serialize_lowercase() {
        assert_eq!(serde_json::to_string(&WidgetKind::Pid).unwrap(), "\"pid\"");
        assert_eq!(WidgetKind::Pid.prefix(), "PID");
        assert!(WidgetKind::Assistant.is_singleton());
        assert!(!WidgetKind::Slider.is_singleton());
    }
}
