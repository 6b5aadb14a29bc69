// 图像负载解码
//
// 二进制负载包装成带类型的 blob 资源（可撤销句柄），旧版文本负载转换成
// 内嵌 data: URL（无需撤销）。新图像加载完成（成功或失败）之后才撤销
// 该组件的上一个句柄，保证同一组件最多只有一个存活句柄。

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::{ImageFormat, RgbaImage};

use crate::core::messages::{self, Locale, MessageKey};
use crate::core::{PanelError, PanelResult};
use crate::events::ImagePayload;
use crate::resources::{HandleId, Resource, ResourceLifecycleManager};
use crate::widgets::WidgetSurface;

/// 解码后的可显示引用
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    /// 可撤销的二进制对象
    Blob { handle: HandleId, url: String },
    /// 内嵌引用
    Embedded { url: String },
}

impl ImageSource {
    pub fn url(&self) -> &str {
        match self {
            ImageSource::Blob { url, .. } | ImageSource::Embedded { url } => url,
        }
    }

    pub fn handle(&self) -> Option<HandleId> {
        match self {
            ImageSource::Blob { handle, .. } => Some(*handle),
            ImageSource::Embedded { .. } => None,
        }
    }
}

/// 准备好等待加载的图像
struct PendingImage {
    source: ImageSource,
    mime: String,
    bytes: Vec<u8>,
}

#[derive(Debug, Default, Clone)]
pub struct DecoderStats {
    pub loaded: u64,
    pub failed: u64,
}

pub struct ImagePayloadDecoder {
    default_format: String,
    locale: Locale,
    stats: DecoderStats,
}

impl ImagePayloadDecoder {
    pub fn new(default_format: &str, locale: Locale) -> Self {
        Self {
            default_format: default_format.to_lowercase(),
            locale,
            stats: DecoderStats::default(),
        }
    }

    pub fn stats(&self) -> &DecoderStats {
        &self.stats
    }

    /// 把负载转换为可显示的资源引用
    pub fn decode(
        &self,
        widget_id: &str,
        payload: &ImagePayload,
        format: Option<&str>,
        resources: &mut ResourceLifecycleManager,
    ) -> PanelResult<ImageSource> {
        Ok(self.prepare(widget_id, payload, format, resources)?.source)
    }

    /// 解码、加载并显示到组件上
    ///
    /// 失败时组件切换到占位状态并显示本地化错误文本，错误只返回给调用方记录。
    pub fn apply(
        &mut self,
        widget_id: &str,
        payload: &ImagePayload,
        format: Option<&str>,
        surface: &mut WidgetSurface,
        resources: &mut ResourceLifecycleManager,
    ) -> PanelResult<()> {
        let pending = match self.prepare(widget_id, payload, format, resources) {
            Ok(pending) => pending,
            Err(e) => {
                self.fail(surface, resources, None);
                return Err(e);
            }
        };

        let loaded = load_pixels(&pending.bytes, &pending.mime);
        let new_handle = pending.source.handle();
        if let Some(handle) = new_handle {
            resources.mark_loaded(handle);
        }

        match loaded {
            Ok(pixels) => {
                let Some(image) = surface.image_mut() else {
                    if let Some(handle) = new_handle {
                        resources.release_handle(handle);
                    }
                    return Err(PanelError::decode(widget_id, "widget has no image element"));
                };
                let prior = std::mem::replace(&mut image.handle, new_handle);
                image.src = Some(pending.source.url().to_string());
                image.pixels = Some(pixels);
                if let Some(prior) = prior {
                    resources.release_handle(prior);
                }
                surface.show_content();
                self.stats.loaded += 1;
                log::debug!("图像已更新: {} ({} 字节, {})", widget_id, pending.bytes.len(), pending.mime);
                Ok(())
            }
            Err(message) => {
                self.fail(surface, resources, new_handle);
                Err(PanelError::decode(widget_id, message))
            }
        }
    }

    /// 加载失败：撤销旧句柄和失败的新句柄，显示占位
    fn fail(&mut self, surface: &mut WidgetSurface, resources: &mut ResourceLifecycleManager, failed: Option<HandleId>) {
        if let Some(image) = surface.image_mut() {
            if let Some(prior) = image.handle.take() {
                resources.release_handle(prior);
            }
            image.src = None;
            image.pixels = None;
        }
        if let Some(handle) = failed {
            resources.release_handle(handle);
        }
        surface.show_placeholder(messages::text(self.locale, MessageKey::ImageLoadFailed));
        self.stats.failed += 1;
    }

    fn prepare(
        &self,
        widget_id: &str,
        payload: &ImagePayload,
        format: Option<&str>,
        resources: &mut ResourceLifecycleManager,
    ) -> PanelResult<PendingImage> {
        let format = format
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::to_lowercase)
            .unwrap_or_else(|| self.default_format.clone());

        match payload {
            ImagePayload::Bytes(bytes) => Ok(self.wrap_blob(widget_id, format!("image/{}", format), bytes, resources)),
            ImagePayload::Blob { mime, bytes } => Ok(self.wrap_blob(widget_id, mime.clone(), bytes, resources)),
            ImagePayload::Legacy(text) => {
                let url = to_data_url(text, &format);
                let (mime, bytes) = parse_data_url(&url).map_err(|message| PanelError::decode(widget_id, message))?;
                Ok(PendingImage {
                    source: ImageSource::Embedded { url },
                    mime,
                    bytes,
                })
            }
        }
    }

    fn wrap_blob(
        &self,
        widget_id: &str,
        mime: String,
        bytes: &[u8],
        resources: &mut ResourceLifecycleManager,
    ) -> PendingImage {
        let handle = resources.acquire(
            widget_id,
            Resource::ImageBlob {
                mime: mime.clone(),
                bytes: bytes.to_vec(),
            },
        );
        PendingImage {
            source: ImageSource::Blob {
                handle,
                url: handle.object_url(),
            },
            mime,
            bytes: bytes.to_vec(),
        }
    }
}

/// 旧版文本负载转换为 data: URL（已是 data: URL 时原样返回）
pub fn to_data_url(text: &str, format: &str) -> String {
    let text = text.trim();
    if text.starts_with("data:") {
        text.to_string()
    } else {
        format!("data:image/{};base64,{}", format, text)
    }
}

/// 解析 base64 data: URL，返回 MIME 类型和字节
pub fn parse_data_url(url: &str) -> Result<(String, Vec<u8>), String> {
    let rest = url.strip_prefix("data:").ok_or("not a data url")?;
    let (header, data) = rest.split_once(',').ok_or("data url without payload")?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or("only base64 data urls are supported")?
        .to_string();
    let compact: String = data.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| format!("invalid base64: {}", e))?;
    if bytes.is_empty() {
        return Err("empty image data".to_string());
    }
    Ok((mime, bytes))
}

/// 解码像素；内容识别优先，声明的类型作为后备
fn load_pixels(bytes: &[u8], mime: &str) -> Result<RgbaImage, String> {
    let declared = mime
        .strip_prefix("image/")
        .and_then(ImageFormat::from_extension);
    let format = image::guess_format(bytes)
        .ok()
        .or(declared)
        .ok_or_else(|| format!("unsupported image type {}", mime))?;
    image::load_from_memory_with_format(bytes, format)
        .map(|decoded| decoded.to_rgba8())
        .map_err(|e| format!("cannot decode image: {}", e))
}
