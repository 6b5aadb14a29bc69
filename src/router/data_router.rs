// 组件数据路由
//
// 按事件中的组件ID查找目标组件并更新其内容。未知ID直接丢弃并记录日志，
// 不会自动创建组件。同一组件的事件按到达顺序处理。

use serde_json::Value;

use super::image_decoder::ImagePayloadDecoder;
use crate::core::messages;
use crate::core::{Locale, MessageKey, PanelError, RingBuffer};
use crate::events::InboundEvent;
use crate::resources::ResourceLifecycleManager;
use crate::widgets::{Content, PidGains, WidgetKind, WidgetRegistry};

/// 分发结果
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    Applied,
    /// 未投递：未知ID、类型不匹配或缺少ID
    Dropped(PanelError),
    /// 已投递但负载无法解码，组件显示占位
    Failed(PanelError),
    /// 不是组件数据事件
    Ignored,
}

#[derive(Debug, Default, Clone)]
pub struct RouterStats {
    pub applied: u64,
    pub dropped: u64,
    pub failed: u64,
}

pub struct DataRouter {
    decoder: ImagePayloadDecoder,
    /// 没有组件ID的自定义事件
    custom_events: RingBuffer<Value>,
    locale: Locale,
    stats: RouterStats,
}

impl DataRouter {
    pub fn new(default_image_format: &str, locale: Locale, custom_capacity: usize) -> Self {
        Self {
            decoder: ImagePayloadDecoder::new(default_image_format, locale),
            custom_events: RingBuffer::new(custom_capacity),
            locale,
            stats: RouterStats::default(),
        }
    }

    pub fn decoder(&self) -> &ImagePayloadDecoder {
        &self.decoder
    }

    pub fn stats(&self) -> &RouterStats {
        &self.stats
    }

    pub fn custom_events(&self) -> impl Iterator<Item = &Value> + '_ {
        self.custom_events.iter()
    }

    /// 分发一个组件数据事件
    pub fn dispatch(
        &mut self,
        event: &InboundEvent,
        registry: &mut WidgetRegistry,
        resources: &mut ResourceLifecycleManager,
    ) -> DispatchOutcome {
        if !event.is_widget_data() {
            return DispatchOutcome::Ignored;
        }

        let Some(widget_id) = event.widget_id() else {
            if let InboundEvent::Custom { payload } = event {
                self.custom_events.push(payload.clone());
                log::debug!("记录无组件ID的自定义数据");
                return DispatchOutcome::Applied;
            }
            return self.drop_event(PanelError::Protocol(format!("{} without widget id", event.name())));
        };

        let Some(widget) = registry.lookup_mut(widget_id) else {
            log::warn!("丢弃发往未知组件的事件: {} -> {}", event.name(), widget_id);
            return self.drop_event(PanelError::UnknownWidget(widget_id.to_string()));
        };
        let kind = widget.kind;
        let surface = &mut widget.surface;

        let result = match event {
            InboundEvent::Image { payload, format, .. } => {
                if !kind.accepts_image() {
                    return self.mismatch(widget_id, kind, event);
                }
                self.decoder.apply(widget_id, payload, format.as_deref(), surface, resources)
            }
            InboundEvent::Text { text, .. } => {
                if !kind.accepts_text() {
                    return self.mismatch(widget_id, kind, event);
                }
                surface.set_text(text);
                Ok(())
            }
            InboundEvent::Custom { payload } => {
                if !apply_custom(&mut surface.content, payload) {
                    return self.mismatch(widget_id, kind, event);
                }
                if kind.accepts_text() {
                    surface.placeholder.visible = false;
                }
                Ok(())
            }
            InboundEvent::Rejected { reason, .. } => {
                let message = messages::text(self.locale, MessageKey::ImageLoadFailed);
                if let Some(image) = surface.image_mut() {
                    if let Some(prior) = image.handle.take() {
                        resources.release_handle(prior);
                    }
                    image.src = None;
                    image.pixels = None;
                    surface.show_placeholder(message);
                } else {
                    surface.show_placeholder(reason);
                }
                Err(PanelError::decode(widget_id, reason.clone()))
            }
            _ => return DispatchOutcome::Ignored,
        };

        match result {
            Ok(()) => {
                self.stats.applied += 1;
                DispatchOutcome::Applied
            }
            Err(e) => {
                self.stats.failed += 1;
                log::warn!("组件 {} 更新失败: {}", widget_id, e);
                DispatchOutcome::Failed(e)
            }
        }
    }

    fn mismatch(&mut self, widget_id: &str, kind: WidgetKind, event: &InboundEvent) -> DispatchOutcome {
        log::warn!("组件 {} 类型为 {}，不能接收 {}", widget_id, kind, event.name());
        self.drop_event(PanelError::KindMismatch {
            widget_id: widget_id.to_string(),
            actual: kind.name().to_string(),
            event: event.name().to_string(),
        })
    }

    fn drop_event(&mut self, error: PanelError) -> DispatchOutcome {
        self.stats.dropped += 1;
        DispatchOutcome::Dropped(error)
    }
}

/// 自定义数据：文本类显示内容，滑块读取 values，PID 读取 p/i/d
fn apply_custom(content: &mut Content, payload: &Value) -> bool {
    match content {
        Content::Text { text, visible, .. } => {
            *text = custom_text(payload);
            *visible = true;
            true
        }
        Content::Assistant { answer, .. } => {
            *answer = custom_text(payload);
            true
        }
        Content::Slider { values, .. } => match payload.get("values").and_then(Value::as_array) {
            Some(items) => {
                *values = items.iter().filter_map(Value::as_f64).collect();
                true
            }
            None => false,
        },
        Content::Pid { gains, .. } => {
            let field = |key: &str| payload.get(key).and_then(Value::as_f64);
            match (field("p"), field("i"), field("d")) {
                (Some(p), Some(i), Some(d)) => {
                    *gains = PidGains { p, i, d };
                    true
                }
                _ => false,
            }
        }
        Content::Image(_) | Content::Webcam(_) => false,
    }
}

fn custom_text(payload: &Value) -> String {
    match payload.get("text").or_else(|| payload.get("message")) {
        Some(Value::String(text)) => text.clone(),
        _ => payload.to_string(),
    }
}
