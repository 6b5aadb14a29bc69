// 摄像头叠加层绘制
//
// 手部骨架（绿色连线 + 红色关键点）与左上角的半透明标签框。
// 标签文字只在配置了字体文件时光栅化。

use std::fs;

use ab_glyph::{point, Font, FontVec, PxScale, ScaleFont};
use once_cell::unsync::OnceCell;
use tiny_skia::{Color, FillRule, Paint, PathBuilder, Pixmap, PremultipliedColorU8, Rect, Stroke, Transform};

use super::record::Landmark;
use crate::config::GestureConfig;

/// 21 点手部模型的骨架连线
pub const HAND_CONNECTIONS: [(usize, usize); 21] = [
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 4),
    (0, 5),
    (5, 6),
    (6, 7),
    (7, 8),
    (5, 9),
    (9, 10),
    (10, 11),
    (11, 12),
    (9, 13),
    (13, 14),
    (14, 15),
    (15, 16),
    (13, 17),
    (0, 17),
    (17, 18),
    (18, 19),
    (19, 20),
];

const LABEL_ORIGIN: f32 = 8.0;
const LABEL_HEIGHT: f32 = 28.0;
const LABEL_PADDING: f32 = 8.0;

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayStyle {
    pub line_width: f32,
    pub landmark_radius: f32,
    pub font_size: f32,
}

impl From<&GestureConfig> for OverlayStyle {
    fn from(config: &GestureConfig) -> Self {
        Self {
            line_width: config.connection_line_width,
            landmark_radius: config.landmark_radius,
            font_size: config.label_font_size,
        }
    }
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self::from(&GestureConfig::default())
    }
}

/// 标签字体，首次使用时从文件加载
pub struct LabelFont {
    path: Option<String>,
    font: OnceCell<Option<FontVec>>,
}

impl LabelFont {
    pub fn new(path: Option<String>) -> Self {
        Self {
            path,
            font: OnceCell::new(),
        }
    }

    pub fn get(&self) -> Option<&FontVec> {
        self.font
            .get_or_init(|| {
                let path = self.path.as_ref()?;
                let bytes = match fs::read(path) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        log::warn!("无法读取标签字体 {}: {}", path, e);
                        return None;
                    }
                };
                match FontVec::try_from_vec(bytes) {
                    Ok(font) => Some(font),
                    Err(e) => {
                        log::warn!("无法解析标签字体 {}: {}", path, e);
                        None
                    }
                }
            })
            .as_ref()
    }
}

/// 组件的叠加层画布
#[derive(Debug, Clone, Default)]
pub struct OverlayCanvas {
    pixmap: Option<Pixmap>,
    frames_drawn: u64,
}

impl OverlayCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn width(&self) -> u32 {
        self.pixmap.as_ref().map_or(0, Pixmap::width)
    }

    pub fn height(&self) -> u32 {
        self.pixmap.as_ref().map_or(0, Pixmap::height)
    }

    /// 已完成绘制的帧数
    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    /// 调整到视频原生分辨率；尺寸为零时不改变
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            return false;
        }
        if self.width() == width && self.height() == height {
            return true;
        }
        match Pixmap::new(width, height) {
            Some(pixmap) => {
                self.pixmap = Some(pixmap);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        if let Some(pixmap) = self.pixmap.as_mut() {
            pixmap.fill(Color::TRANSPARENT);
        }
    }

    pub fn is_blank(&self) -> bool {
        self.pixmap
            .as_ref()
            .map_or(true, |pixmap| pixmap.pixels().iter().all(|p| p.alpha() == 0))
    }

    /// 读取像素（非预乘 RGBA）
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let color = self.pixmap.as_ref()?.pixel(x, y)?.demultiply();
        Some([color.red(), color.green(), color.blue(), color.alpha()])
    }

    pub fn rgba(&self) -> Vec<u8> {
        self.pixmap.as_ref().map(|p| p.data().to_vec()).unwrap_or_default()
    }

    /// 清空并绘制一帧：骨架 + 标签
    pub fn draw_frame(&mut self, hands: &[Vec<Landmark>], label: &str, style: &OverlayStyle, font: Option<&FontVec>) {
        self.clear();
        let Some(pixmap) = self.pixmap.as_mut() else {
            return;
        };
        for landmarks in hands {
            draw_connections(pixmap, landmarks, style);
            draw_landmarks(pixmap, landmarks, style);
        }
        draw_label(pixmap, label, style, font);
        self.frames_drawn += 1;
    }
}

fn to_canvas(pixmap: &Pixmap, landmark: &Landmark) -> (f32, f32) {
    (
        landmark.x as f32 * pixmap.width() as f32,
        landmark.y as f32 * pixmap.height() as f32,
    )
}

fn draw_connections(pixmap: &mut Pixmap, landmarks: &[Landmark], style: &OverlayStyle) {
    let mut builder = PathBuilder::new();
    for (a, b) in HAND_CONNECTIONS {
        let (Some(pa), Some(pb)) = (landmarks.get(a), landmarks.get(b)) else {
            continue;
        };
        let (x1, y1) = to_canvas(pixmap, pa);
        let (x2, y2) = to_canvas(pixmap, pb);
        builder.move_to(x1, y1);
        builder.line_to(x2, y2);
    }
    if let Some(path) = builder.finish() {
        let mut paint = Paint::default();
        paint.set_color_rgba8(0x00, 0xFF, 0x00, 0xFF);
        let stroke = Stroke {
            width: style.line_width,
            ..Stroke::default()
        };
        pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    }
}

fn draw_landmarks(pixmap: &mut Pixmap, landmarks: &[Landmark], style: &OverlayStyle) {
    let mut builder = PathBuilder::new();
    for landmark in landmarks {
        let (x, y) = to_canvas(pixmap, landmark);
        builder.push_circle(x, y, style.landmark_radius);
    }
    if let Some(path) = builder.finish() {
        let mut paint = Paint::default();
        paint.set_color_rgba8(0xFF, 0x00, 0x00, 0xFF);
        pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
    }
}

fn text_width(text: &str, style: &OverlayStyle, font: Option<&FontVec>) -> f32 {
    match font {
        Some(font) => {
            let scaled = font.as_scaled(PxScale::from(style.font_size));
            text.chars().map(|c| scaled.h_advance(scaled.glyph_id(c))).sum()
        }
        // 无字体时按平均字宽估算
        None => text.chars().count() as f32 * style.font_size * 0.55,
    }
}

fn draw_label(pixmap: &mut Pixmap, text: &str, style: &OverlayStyle, font: Option<&FontVec>) {
    let width = text_width(text, style, font) + LABEL_PADDING * 2.0;
    if let Some(rect) = Rect::from_xywh(LABEL_ORIGIN, LABEL_ORIGIN, width, LABEL_HEIGHT) {
        let mut paint = Paint::default();
        paint.set_color_rgba8(0, 0, 0, 128);
        pixmap.fill_rect(rect, &paint, Transform::identity(), None);
    }
    if let Some(font) = font {
        let baseline = LABEL_ORIGIN + LABEL_HEIGHT - 8.0;
        draw_text(pixmap, text, font, style.font_size, LABEL_ORIGIN + LABEL_PADDING, baseline);
    }
}

/// 以白色把文字混合到画布上
fn draw_text(pixmap: &mut Pixmap, text: &str, font: &FontVec, size: f32, x: f32, baseline: f32) {
    let scale = PxScale::from(size);
    let scaled = font.as_scaled(scale);
    let (width, height) = (pixmap.width() as i32, pixmap.height() as i32);
    let pixels = pixmap.pixels_mut();

    let mut caret = x;
    for c in text.chars() {
        let glyph_id = scaled.glyph_id(c);
        let glyph = glyph_id.with_scale_and_position(scale, point(caret, baseline));
        caret += scaled.h_advance(glyph_id);

        let Some(outlined) = font.outline_glyph(glyph) else {
            continue;
        };
        let bounds = outlined.px_bounds();
        outlined.draw(|gx, gy, coverage| {
            let px = bounds.min.x as i32 + gx as i32;
            let py = bounds.min.y as i32 + gy as i32;
            if px < 0 || py < 0 || px >= width || py >= height {
                return;
            }
            let index = (py * width + px) as usize;
            let dst = pixels[index];
            let src = (coverage.clamp(0.0, 1.0) * 255.0) as u16;
            let keep = 255 - src;
            let blend = |d: u8| (src + (d as u16 * keep) / 255).min(255) as u8;
            if let Some(color) = PremultipliedColorU8::from_rgba(
                blend(dst.red()),
                blend(dst.green()),
                blend(dst.blue()),
                blend(dst.alpha()),
            ) {
                pixels[index] = color;
            }
        });
    }
}
