use serde::{Deserialize, Serialize};

use super::vision::RecognitionResult;

/// 手部关键点
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// 单只手的识别记录（gesture_update 负载中的 Hand1/Hand2）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerHandRecord {
    pub is_exist: bool,
    pub gesture: String,
    pub confidence: f64,
    pub landmarks: Vec<Landmark>,
}

impl Default for PerHandRecord {
    fn default() -> Self {
        Self {
            is_exist: false,
            gesture: "-".to_string(),
            confidence: 0.0,
            landmarks: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GesturePair {
    #[serde(rename = "Hand1")]
    pub hand1: PerHandRecord,
    #[serde(rename = "Hand2")]
    pub hand2: PerHandRecord,
}

impl GesturePair {
    /// 由识别结果构造，前两只手分别填入 Hand1/Hand2
    pub fn from_result(result: &RecognitionResult) -> Self {
        let mut pair = GesturePair::default();
        for idx in 0..2 {
            let Some(top) = result.top_gesture(idx) else {
                continue;
            };
            let record = PerHandRecord {
                is_exist: true,
                gesture: gesture_name(&top.name).to_string(),
                confidence: top.score,
                landmarks: result.world_landmarks.get(idx).cloned().unwrap_or_default(),
            };
            match idx {
                0 => pair.hand1 = record,
                _ => pair.hand2 = record,
            }
        }
        pair
    }

    pub fn any_hand(&self) -> bool {
        self.hand1.is_exist || self.hand2.is_exist
    }
}

fn gesture_name(name: &str) -> &str {
    if name.is_empty() {
        "unknown"
    } else {
        name
    }
}

/// 叠加层标签：`Hand 1: Victory (93.2%) | Hand 2: ...`，无手时为 `-`
pub fn format_label(result: &RecognitionResult) -> String {
    let per_hand: Vec<String> = (0..result.gestures.len())
        .filter_map(|idx| {
            result.top_gesture(idx).map(|top| {
                format!("Hand {}: {} ({:.1}%)", idx + 1, gesture_name(&top.name), top.score * 100.0)
            })
        })
        .collect();

    if per_hand.is_empty() {
        "-".to_string()
    } else {
        per_hand.join(" | ")
    }
}
