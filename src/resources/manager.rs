// 资源生命周期管理
//
// 每个资源属于且仅属于一个组件ID。release 对每个句柄恰好执行一次：
// 显式释放、组件删除、管理器析构三条路径共用同一个入口。

use std::collections::HashMap;

use chrono::Utc;

use super::handle::{HandleId, LifecycleAction, Resource, ResourceKind, ResourceRecord};
use crate::core::RingBuffer;
use crate::gesture::camera::VideoStream;
use crate::gesture::vision::GestureRecognizer;

struct Entry {
    widget_id: String,
    resource: Resource,
}

pub struct ResourceLifecycleManager {
    next_id: u64,
    entries: HashMap<HandleId, Entry>,
    /// 组件ID -> 按获取顺序排列的句柄
    by_widget: HashMap<String, Vec<HandleId>>,
    journal: RingBuffer<ResourceRecord>,
    released_total: u64,
}

impl ResourceLifecycleManager {
    pub fn new(history_capacity: usize) -> Self {
        Self {
            next_id: 1,
            entries: HashMap::new(),
            by_widget: HashMap::new(),
            journal: RingBuffer::new(history_capacity),
            released_total: 0,
        }
    }

    /// 登记一个新资源，归属给指定组件
    pub fn acquire(&mut self, widget_id: &str, resource: Resource) -> HandleId {
        let handle = HandleId(self.next_id);
        self.next_id += 1;
        let kind = resource.kind();

        self.entries.insert(
            handle,
            Entry {
                widget_id: widget_id.to_string(),
                resource,
            },
        );
        self.by_widget.entry(widget_id.to_string()).or_default().push(handle);
        self.record(handle, kind, widget_id, LifecycleAction::Acquired);
        log::debug!("资源登记 {} {:?} -> {}", handle, kind, widget_id);
        handle
    }

    /// 记录图像加载完成
    pub fn mark_loaded(&mut self, handle: HandleId) {
        if let Some(entry) = self.entries.get(&handle) {
            let (kind, widget_id) = (entry.resource.kind(), entry.widget_id.clone());
            self.record(handle, kind, &widget_id, LifecycleAction::Loaded);
        }
    }

    /// 释放单个句柄；已释放或未知句柄返回 false
    pub fn release_handle(&mut self, handle: HandleId) -> bool {
        let Some(entry) = self.entries.remove(&handle) else {
            return false;
        };
        if let Some(handles) = self.by_widget.get_mut(&entry.widget_id) {
            handles.retain(|h| *h != handle);
            if handles.is_empty() {
                self.by_widget.remove(&entry.widget_id);
            }
        }
        let kind = entry.resource.kind();
        self.record(handle, kind, &entry.widget_id, LifecycleAction::Released);
        entry.resource.release();
        self.released_total += 1;
        log::debug!("资源释放 {} {:?} <- {}", handle, kind, entry.widget_id);
        true
    }

    /// 释放组件拥有的全部资源，返回释放数量
    pub fn release(&mut self, widget_id: &str) -> usize {
        let handles = self.by_widget.remove(widget_id).unwrap_or_default();
        // by_widget 已移除，release_handle 只负责 entries
        handles.into_iter().filter(|h| self.release_handle(*h)).count()
    }

    /// 释放组件拥有的某一类资源
    pub fn release_kind(&mut self, widget_id: &str, kind: ResourceKind) -> usize {
        self.handles_of(widget_id, kind)
            .into_iter()
            .filter(|h| self.release_handle(*h))
            .count()
    }

    /// 组件改名时转移全部资源
    pub fn rename(&mut self, old_id: &str, new_id: &str) {
        let Some(handles) = self.by_widget.remove(old_id) else {
            return;
        };
        for handle in &handles {
            if let Some(entry) = self.entries.get_mut(handle) {
                entry.widget_id = new_id.to_string();
            }
        }
        self.by_widget.entry(new_id.to_string()).or_default().extend(handles);
    }

    pub fn is_live(&self, handle: HandleId) -> bool {
        self.entries.contains_key(&handle)
    }

    pub fn owner(&self, handle: HandleId) -> Option<&str> {
        self.entries.get(&handle).map(|entry| entry.widget_id.as_str())
    }

    pub fn get(&self, handle: HandleId) -> Option<&Resource> {
        self.entries.get(&handle).map(|entry| &entry.resource)
    }

    pub fn handles_of(&self, widget_id: &str, kind: ResourceKind) -> Vec<HandleId> {
        self.by_widget
            .get(widget_id)
            .map(|handles| {
                handles
                    .iter()
                    .copied()
                    .filter(|h| self.entries.get(h).map(|e| e.resource.kind()) == Some(kind))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn live_count(&self, widget_id: &str, kind: ResourceKind) -> usize {
        self.handles_of(widget_id, kind).len()
    }

    pub fn total_live(&self) -> usize {
        self.entries.len()
    }

    pub fn released_total(&self) -> u64 {
        self.released_total
    }

    /// 组件当前的视频流
    pub fn stream_mut(&mut self, widget_id: &str) -> Option<&mut Box<dyn VideoStream>> {
        let handle = *self.handles_of(widget_id, ResourceKind::CameraStream).last()?;
        match self.entries.get_mut(&handle).map(|entry| &mut entry.resource) {
            Some(Resource::CameraStream(stream)) => Some(stream),
            _ => None,
        }
    }

    /// 组件当前的识别器
    pub fn recognizer_mut(&mut self, widget_id: &str) -> Option<&mut Box<dyn GestureRecognizer>> {
        let handle = *self.handles_of(widget_id, ResourceKind::Recognizer).last()?;
        match self.entries.get_mut(&handle).map(|entry| &mut entry.resource) {
            Some(Resource::Recognizer(recognizer)) => Some(recognizer),
            _ => None,
        }
    }

    /// 生命周期日志（从旧到新）
    pub fn journal(&self) -> impl Iterator<Item = &ResourceRecord> + '_ {
        self.journal.iter()
    }

    /// 释放全部资源
    pub fn release_all(&mut self) -> usize {
        let mut handles: Vec<HandleId> = self.entries.keys().copied().collect();
        handles.sort();
        self.by_widget.clear();
        handles.into_iter().filter(|h| self.release_handle(*h)).count()
    }

    fn record(&mut self, handle: HandleId, kind: ResourceKind, widget_id: &str, action: LifecycleAction) {
        self.journal.push(ResourceRecord {
            handle,
            kind,
            widget_id: widget_id.to_string(),
            action,
            at: Utc::now(),
        });
    }
}

impl Default for ResourceLifecycleManager {
    fn default() -> Self {
        Self::new(256)
    }
}

impl Drop for ResourceLifecycleManager {
    fn drop(&mut self) {
        let released = self.release_all();
        if released > 0 {
            log::debug!("资源管理器析构，释放剩余 {} 个资源", released);
        }
    }
}
