// 入站事件规范化
//
// 后端版本演进过程中，同一个事件出现过多种负载形态（长键/短键、
// 二进制附件/数字数组/base64文本）。这里按内容识别并统一转换，
// 路由层只看到 InboundEvent。

use serde_json::Value;

use super::event_types::{ImagePayload, InboundEvent, LifecycleEvent};
use crate::core::{PanelError, PanelResult};
use crate::protocol::RawEvent;

/// 将组装好的原始事件转换为规范事件
pub fn decode_event(raw: &RawEvent) -> PanelResult<InboundEvent> {
    let payload = raw.payload().cloned().unwrap_or(Value::Null);

    let event = match raw.name.as_str() {
        "execution_started" => InboundEvent::Lifecycle(LifecycleEvent::Started),
        "execution_stopped" => InboundEvent::Lifecycle(LifecycleEvent::Stopped),
        "finished" => InboundEvent::Lifecycle(LifecycleEvent::Finished),
        "execution_error" => InboundEvent::Lifecycle(LifecycleEvent::Error {
            reason: string_field(&payload, &["error", "message"]).unwrap_or_else(|| "unknown error".to_string()),
        }),
        "stdout" => InboundEvent::Stdout {
            text: output_text(&payload),
        },
        "stderr" => InboundEvent::Stderr {
            text: output_text(&payload),
        },
        "image_data" => decode_image(raw, &payload)?,
        "text_data" => {
            let widget_id = string_field(&payload, &["widget_id", "w"])
                .ok_or_else(|| PanelError::Protocol("text_data without widget id".to_string()))?;
            let text = payload
                .get("text")
                .or_else(|| payload.get("t"))
                .map(value_to_text)
                .ok_or_else(|| PanelError::decode(&widget_id, "text_data without text"))?;
            InboundEvent::Text { widget_id, text }
        }
        "custom_data" => InboundEvent::Custom { payload },
        "llm_answer" => InboundEvent::LlmAnswer {
            answer: payload.get("answer").map(value_to_text).unwrap_or_default(),
        },
        other => InboundEvent::Other {
            name: other.to_string(),
            payload,
        },
    };

    Ok(event)
}

/// 解码事件；负载错误转换为只影响目标组件的 Rejected 事件
pub fn decode_or_reject(raw: &RawEvent) -> PanelResult<InboundEvent> {
    match decode_event(raw) {
        Err(PanelError::PayloadDecode { widget_id, message }) => Ok(InboundEvent::Rejected {
            event: raw.name.clone(),
            widget_id,
            reason: message,
        }),
        other => other,
    }
}

fn decode_image(raw: &RawEvent, payload: &Value) -> PanelResult<InboundEvent> {
    let widget_id = string_field(payload, &["widget_id", "w"])
        .ok_or_else(|| PanelError::Protocol("image_data without widget id".to_string()))?;
    let format = string_field(payload, &["format", "f"]).map(|f| f.to_lowercase());

    let image = payload
        .get("image")
        .or_else(|| payload.get("i"))
        .ok_or_else(|| PanelError::decode(&widget_id, "image_data without image"))?;

    let image_payload = inspect_image_value(raw, image)
        .ok_or_else(|| PanelError::decode(&widget_id, "unrecognized image payload shape"))?;
    if image_payload.is_empty() {
        return Err(PanelError::decode(&widget_id, "empty image payload"));
    }

    Ok(InboundEvent::Image {
        widget_id,
        payload: image_payload,
        format,
    })
}

/// 按内容识别图像负载形态
fn inspect_image_value(raw: &RawEvent, value: &Value) -> Option<ImagePayload> {
    if let Some(bytes) = raw.resolve_placeholder(value) {
        return Some(ImagePayload::Bytes(bytes.to_vec()));
    }

    match value {
        Value::String(text) => Some(ImagePayload::Legacy(text.clone())),
        Value::Array(items) => byte_array(items).map(ImagePayload::Bytes),
        Value::Object(object) => {
            // {type|mime, data} 二进制对象；Node Buffer 的 JSON 形式 {type:"Buffer", data:[...]}
            let data = object.get("data")?;
            let bytes = match raw.resolve_placeholder(data) {
                Some(bytes) => bytes.to_vec(),
                None => byte_array(data.as_array()?)?,
            };
            let mime = object
                .get("mime")
                .or_else(|| object.get("type"))
                .and_then(Value::as_str)
                .filter(|mime| mime.starts_with("image/"));
            match mime {
                Some(mime) => Some(ImagePayload::Blob {
                    mime: mime.to_string(),
                    bytes,
                }),
                None => Some(ImagePayload::Bytes(bytes)),
            }
        }
        _ => None,
    }
}

fn byte_array(items: &[Value]) -> Option<Vec<u8>> {
    items
        .iter()
        .map(|item| item.as_u64().filter(|b| *b <= u8::MAX as u64).map(|b| b as u8))
        .collect()
}

fn string_field(payload: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| payload.get(*key))
        .find_map(|value| match value {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

fn output_text(payload: &Value) -> String {
    match payload.get("output") {
        Some(value) => value_to_text(value),
        None => value_to_text(payload),
    }
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
