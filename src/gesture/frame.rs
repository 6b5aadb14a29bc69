use crate::resources::{HandleId, Resource, ResourceLifecycleManager};

/// 已调度的下一帧回调
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameToken {
    pub seq: u64,
}

/// 逐帧回调调度器
///
/// 每个令牌都作为资源登记在组件名下，释放即取消；
/// 宿主在每次刷新时调用 `take_due`，只有仍然有效的令牌会触发。
#[derive(Debug, Default)]
pub struct FrameScheduler {
    next_seq: u64,
    pending: Vec<HandleId>,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// 为组件请求下一帧回调
    pub fn request(&mut self, widget_id: &str, resources: &mut ResourceLifecycleManager) -> HandleId {
        let token = FrameToken { seq: self.next_seq };
        self.next_seq += 1;
        let handle = resources.acquire(widget_id, Resource::FrameToken(token));
        self.pending.push(handle);
        handle
    }

    /// 取出本帧要执行的组件ID（按请求顺序），令牌随之消耗
    pub fn take_due(&mut self, resources: &mut ResourceLifecycleManager) -> Vec<String> {
        let mut due = Vec::new();
        for handle in std::mem::take(&mut self.pending) {
            let Some(owner) = resources.owner(handle).map(str::to_string) else {
                // 已取消
                continue;
            };
            resources.release_handle(handle);
            due.push(owner);
        }
        due
    }

    pub fn pending_count(&self, resources: &ResourceLifecycleManager) -> usize {
        self.pending.iter().filter(|h| resources.is_live(**h)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::ResourceKind;

    #[test]
    fn cancelled_tokens_do_not_fire() {
        let mut resources = ResourceLifecycleManager::new(32);
        let mut scheduler = FrameScheduler::new();
        scheduler.request("Webcam_0", &mut resources);
        let cancelled = scheduler.request("Webcam_1", &mut resources);
        resources.release_handle(cancelled);

        assert_eq!(scheduler.pending_count(&resources), 1);
        assert_eq!(scheduler.take_due(&mut resources), vec!["Webcam_0".to_string()]);
        assert!(scheduler.take_due(&mut resources).is_empty());
        assert_eq!(resources.live_count("Webcam_0", ResourceKind::FrameToken), 0);
    }

    #[test]
    fn fires_under_the_current_owner_after_rename() {
        let mut resources = ResourceLifecycleManager::new(32);
        let mut scheduler = FrameScheduler::new();
        scheduler.request("Webcam_0", &mut resources);
        resources.rename("Webcam_0", "front");
        assert_eq!(scheduler.take_due(&mut resources), vec!["front".to_string()]);
    }
}
