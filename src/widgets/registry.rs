// 组件注册表
//
// ID 在所有存活组件之间唯一。自动生成的ID使用按类型递增的计数器，
// 计数器永不回退，删除后也不会复用旧编号。

use std::collections::{HashMap, HashSet};

use chrono::Utc;

use super::surface::WidgetSurface;
use super::types::{Widget, WidgetId, WidgetKind};
use crate::core::{Locale, PanelError, PanelResult};
use crate::resources::ResourceLifecycleManager;

pub struct WidgetRegistry {
    widgets: HashMap<WidgetId, Widget>,
    /// 创建顺序
    order: Vec<WidgetId>,
    counters: HashMap<WidgetKind, u64>,
    /// 单例类型的存活标记
    singleton_guard: HashSet<WidgetKind>,
    locale: Locale,
}

impl WidgetRegistry {
    pub fn new(locale: Locale) -> Self {
        Self {
            widgets: HashMap::new(),
            order: Vec::new(),
            counters: HashMap::new(),
            singleton_guard: HashSet::new(),
            locale,
        }
    }

    /// 创建组件；未指定ID时自动分配 `${prefix}_${n}`
    pub fn create(&mut self, kind: WidgetKind, requested_id: Option<&str>) -> PanelResult<WidgetId> {
        if kind.is_singleton() && self.singleton_guard.contains(&kind) {
            log::warn!("单例组件已存在: {}", kind);
            return Err(PanelError::AlreadyExists {
                kind: kind.name().to_string(),
            });
        }

        let id = match requested_id.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) if self.widgets.contains_key(id) => {
                return Err(PanelError::DuplicateWidget(id.to_string()));
            }
            Some(id) => WidgetId::new(id),
            None => self.next_id(kind),
        };

        let widget = Widget {
            id: id.clone(),
            kind,
            surface: WidgetSurface::new(kind, id.as_str(), self.locale),
            created_at: Utc::now(),
        };
        self.widgets.insert(id.clone(), widget);
        self.order.push(id.clone());
        if kind.is_singleton() {
            self.singleton_guard.insert(kind);
        }
        log::info!("创建组件: {} ({})", id, kind);
        Ok(id)
    }

    /// 改名：新ID为空或与旧ID相同时不做任何事并返回 false
    pub fn rename(&mut self, old_id: &str, new_id: &str, resources: &mut ResourceLifecycleManager) -> PanelResult<bool> {
        let new_id = new_id.trim();
        if new_id.is_empty() || new_id == old_id {
            return Ok(false);
        }
        if !self.widgets.contains_key(old_id) {
            return Err(PanelError::UnknownWidget(old_id.to_string()));
        }
        if self.widgets.contains_key(new_id) {
            return Err(PanelError::DuplicateWidget(new_id.to_string()));
        }

        // 以下步骤不会失败，整体生效
        let Some(mut widget) = self.widgets.remove(old_id) else {
            return Err(PanelError::UnknownWidget(old_id.to_string()));
        };
        let renamed = WidgetId::new(new_id);
        widget.id = renamed.clone();
        widget.surface.relink(new_id);
        self.widgets.insert(renamed.clone(), widget);
        if let Some(slot) = self.order.iter_mut().find(|id| id.as_str() == old_id) {
            *slot = renamed;
        }
        resources.rename(old_id, new_id);

        log::info!("组件改名: {} -> {}", old_id, new_id);
        Ok(true)
    }

    /// 删除组件并同步释放其全部资源
    pub fn remove(&mut self, id: &str, resources: &mut ResourceLifecycleManager) -> PanelResult<Widget> {
        let widget = self
            .widgets
            .remove(id)
            .ok_or_else(|| PanelError::UnknownWidget(id.to_string()))?;
        self.order.retain(|existing| existing.as_str() != id);
        let released = resources.release(id);
        if widget.kind.is_singleton() {
            self.singleton_guard.remove(&widget.kind);
        }
        log::info!("删除组件: {} ({})，释放 {} 个资源", id, widget.kind, released);
        Ok(widget)
    }

    pub fn lookup(&self, id: &str) -> Option<&Widget> {
        self.widgets.get(id)
    }

    pub fn lookup_mut(&mut self, id: &str) -> Option<&mut Widget> {
        self.widgets.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.widgets.contains_key(id)
    }

    /// 按创建顺序排列的ID
    pub fn ids(&self) -> &[WidgetId] {
        &self.order
    }

    /// 按创建顺序遍历
    pub fn iter(&self) -> impl Iterator<Item = &Widget> + '_ {
        self.order.iter().filter_map(|id| self.widgets.get(id))
    }

    pub fn ids_of_kind(&self, kind: WidgetKind) -> Vec<WidgetId> {
        self.iter().filter(|w| w.kind == kind).map(|w| w.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// 下一个将被尝试的计数值
    pub fn counter(&self, kind: WidgetKind) -> u64 {
        self.counters.get(&kind).copied().unwrap_or(0)
    }

    /// 把计数器至少推进到 `floor`（恢复布局时使用）
    pub fn raise_counter(&mut self, kind: WidgetKind, floor: u64) {
        let counter = self.counters.entry(kind).or_insert(0);
        if *counter < floor {
            *counter = floor;
        }
    }

    fn next_id(&mut self, kind: WidgetKind) -> WidgetId {
        loop {
            let counter = self.counters.entry(kind).or_insert(0);
            let candidate = format!("{}_{}", kind.prefix(), *counter);
            *counter += 1;
            // 跳过被用户手动占用的编号
            if !self.widgets.contains_key(candidate.as_str()) {
                return WidgetId::new(candidate);
            }
        }
    }
}

impl Default for WidgetRegistry {
    fn default() -> Self {
        Self::new(Locale::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{Resource, ResourceKind};

    fn setup() -> (WidgetRegistry, ResourceLifecycleManager) {
        (WidgetRegistry::new(Locale::En), ResourceLifecycleManager::new(32))
    }

    #[test]
    fn generated_ids_are_never_reused() {
        let (mut registry, mut resources) = setup();
        let first = registry.create(WidgetKind::Image, None).unwrap();
        assert_eq!(first, "Image_0");
        registry.remove("Image_0", &mut resources).unwrap();
        let second = registry.create(WidgetKind::Image, None).unwrap();
        assert_eq!(second, "Image_1");
        assert_eq!(registry.create(WidgetKind::Pid, None).unwrap(), "PID_0");
    }

    #[test]
    fn generation_skips_manually_taken_ids() {
        let (mut registry, _) = setup();
        registry.create(WidgetKind::Text, Some("Text_0")).unwrap();
        assert_eq!(registry.create(WidgetKind::Text, None).unwrap(), "Text_1");
    }

    #[test]
    fn duplicate_requested_id_is_rejected() {
        let (mut registry, _) = setup();
        registry.create(WidgetKind::Image, Some("cam")).unwrap();
        assert_eq!(
            registry.create(WidgetKind::Text, Some("cam")),
            Err(PanelError::DuplicateWidget("cam".into()))
        );
    }

    #[test]
    fn singleton_guard_cleared_on_remove() {
        let (mut registry, mut resources) = setup();
        registry.create(WidgetKind::Webcam, None).unwrap();
        assert!(matches!(
            registry.create(WidgetKind::Webcam, None),
            Err(PanelError::AlreadyExists { .. })
        ));
        registry.remove("Webcam_0", &mut resources).unwrap();
        assert_eq!(registry.create(WidgetKind::Webcam, None).unwrap(), "Webcam_1");
    }

    #[test]
    fn rename_moves_entry_elements_and_resources() {
        let (mut registry, mut resources) = setup();
        registry.create(WidgetKind::Image, None).unwrap();
        let handle = resources.acquire(
            "Image_0",
            Resource::ImageBlob {
                mime: "image/jpeg".into(),
                bytes: vec![1],
            },
        );

        assert!(registry.rename("Image_0", " front ", &mut resources).unwrap());
        assert!(registry.lookup("Image_0").is_none());
        let widget = registry.lookup("front").unwrap();
        assert_eq!(widget.id, "front");
        assert!(widget.surface.element_ids().iter().all(|id| id.ends_with("_front")));
        assert_eq!(resources.owner(handle), Some("front"));
        assert_eq!(registry.ids(), &[WidgetId::new("front")]);
    }

    #[test]
    fn rename_noops_and_conflicts() {
        let (mut registry, mut resources) = setup();
        registry.create(WidgetKind::Image, None).unwrap();
        registry.create(WidgetKind::Image, None).unwrap();

        assert_eq!(registry.rename("Image_0", "  ", &mut resources), Ok(false));
        assert_eq!(registry.rename("Image_0", "Image_0", &mut resources), Ok(false));
        assert_eq!(
            registry.rename("Image_0", "Image_1", &mut resources),
            Err(PanelError::DuplicateWidget("Image_1".into()))
        );
        assert!(registry.contains("Image_0"));
        assert!(registry.contains("Image_1"));
        assert!(matches!(
            registry.rename("missing", "x", &mut resources),
            Err(PanelError::UnknownWidget(_))
        ));
    }

    #[test]
    fn remove_releases_owned_resources() {
        let (mut registry, mut resources) = setup();
        registry.create(WidgetKind::Image, None).unwrap();
        resources.acquire(
            "Image_0",
            Resource::ImageBlob {
                mime: "image/jpeg".into(),
                bytes: vec![1],
            },
        );
        registry.remove("Image_0", &mut resources).unwrap();
        assert_eq!(resources.live_count("Image_0", ResourceKind::ImageBlob), 0);
        assert!(registry.remove("Image_0", &mut resources).is_err());
    }
}
