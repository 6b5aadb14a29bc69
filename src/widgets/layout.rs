// 布局保存与恢复
//
// 只保存组件类型、ID和简单控件的状态。图像、摄像头流等运行时资源不保存。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::registry::WidgetRegistry;
use super::surface::Content;
use super::types::{PidGains, WidgetId, WidgetKind};
use crate::core::PanelResult;

const LAYOUT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetSnapshot {
    pub kind: WidgetKind,
    pub id: WidgetId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slider_values: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<PidGains>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterSnapshot {
    pub kind: WidgetKind,
    pub next: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutSnapshot {
    pub version: u32,
    pub saved_at: DateTime<Utc>,
    pub widgets: Vec<WidgetSnapshot>,
    #[serde(default)]
    pub counters: Vec<CounterSnapshot>,
}

impl LayoutSnapshot {
    /// 按创建顺序记录当前布局
    pub fn capture(registry: &WidgetRegistry) -> Self {
        let widgets = registry
            .iter()
            .map(|widget| {
                let mut snapshot = WidgetSnapshot {
                    kind: widget.kind,
                    id: widget.id.clone(),
                    slider_values: None,
                    pid: None,
                };
                match &widget.surface.content {
                    Content::Slider { values, .. } => snapshot.slider_values = Some(values.clone()),
                    Content::Pid { gains, .. } => snapshot.pid = Some(*gains),
                    _ => {}
                }
                snapshot
            })
            .collect();

        let counters = WidgetKind::ALL
            .iter()
            .map(|kind| CounterSnapshot {
                kind: *kind,
                next: registry.counter(*kind),
            })
            .filter(|counter| counter.next > 0)
            .collect();

        Self {
            version: LAYOUT_VERSION,
            saved_at: Utc::now(),
            widgets,
            counters,
        }
    }

    pub fn to_json(&self) -> PanelResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> PanelResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// 在注册表中重建组件，返回成功创建的ID；冲突的条目跳过
    pub fn restore(&self, registry: &mut WidgetRegistry) -> Vec<WidgetId> {
        for counter in &self.counters {
            registry.raise_counter(counter.kind, counter.next);
        }

        let mut restored = Vec::new();
        for snapshot in &self.widgets {
            let id = match registry.create(snapshot.kind, Some(snapshot.id.as_str())) {
                Ok(id) => id,
                Err(e) => {
                    log::warn!("跳过无法恢复的组件 {}: {}", snapshot.id, e);
                    continue;
                }
            };
            if let Some(widget) = registry.lookup_mut(id.as_str()) {
                match (&mut widget.surface.content, &snapshot.slider_values, &snapshot.pid) {
                    (Content::Slider { values, .. }, Some(saved), _) => *values = saved.clone(),
                    (Content::Pid { gains, .. }, _, Some(saved)) => *gains = *saved,
                    _ => {}
                }
            }
            restored.push(id);
        }
        log::info!("布局恢复完成: {}/{} 个组件", restored.len(), self.widgets.len());
        restored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Locale;

    #[test]
    fn capture_and_restore_simple_widgets() {
        let mut registry = WidgetRegistry::new(Locale::En);
        registry.create(WidgetKind::Slider, None).unwrap();
        registry.create(WidgetKind::Pid, Some("arm")).unwrap();
        registry.create(WidgetKind::Webcam, None).unwrap();
        if let Some(widget) = registry.lookup_mut("arm") {
            if let Content::Pid { gains, .. } = &mut widget.surface.content {
                *gains = PidGains { p: 1.0, i: 0.1, d: 0.01 };
            }
        }

        let json = LayoutSnapshot::capture(&registry).to_json().unwrap();
        let snapshot = LayoutSnapshot::from_json(&json).unwrap();

        let mut fresh = WidgetRegistry::new(Locale::En);
        let restored = snapshot.restore(&mut fresh);
        assert_eq!(restored.len(), 3);
        match &fresh.lookup("arm").unwrap().surface.content {
            Content::Pid { gains, .. } => assert_eq!(gains.p, 1.0),
            other => panic!("unexpected {:?}", other),
        }
        // 计数器不回退
        assert_eq!(fresh.create(WidgetKind::Slider, None).unwrap(), "Slider_1");
    }

    #[test]
    fn conflicting_entries_are_skipped() {
        let mut registry = WidgetRegistry::new(Locale::En);
        registry.create(WidgetKind::Webcam, None).unwrap();
        let snapshot = LayoutSnapshot::capture(&registry);

        // 目标注册表里已有摄像头组件
        let restored = snapshot.restore(&mut registry);
        assert!(restored.is_empty());
        assert_eq!(registry.len(), 1);
    }
}
