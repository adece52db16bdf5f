use std::collections::VecDeque;

use crate::config::DashboardConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ToastKind {
    Success,
    Error,
    Info,
}

impl ToastKind {
    pub fn css_class(&self) -> &'static str {
        match self {
            ToastKind::Success => "notification notification-success",
            ToastKind::Error => "notification notification-error",
            ToastKind::Info => "notification notification-info",
        }
    }

    pub fn background(&self) -> &'static str {
        match self {
            ToastKind::Success => "#48bb78",
            ToastKind::Error => "#f56565",
            ToastKind::Info => "#4299e1",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ToastId(pub u64);

#[derive(Clone, Debug, PartialEq)]
pub struct Toast {
    pub id: ToastId,
    pub kind: ToastKind,
    pub message: String,
    pub expires_at_ms: i64,
}

/// Live toast stack. Bounded: pushing past `max_toasts` evicts the oldest.
#[derive(Debug)]
pub struct NotificationCenter {
    next_id: u64,
    live: VecDeque<Toast>,
    max_toasts: usize,
    duration_ms: i64,
}

/// Result of [`NotificationCenter::push`]: the new toast plus anything evicted for it.
#[derive(Debug)]
pub struct Pushed {
    pub toast: Toast,
    pub evicted: Vec<ToastId>,
}

impl NotificationCenter {
    pub fn new(config: &DashboardConfig) -> Self {
        Self {
            next_id: 1,
            live: VecDeque::new(),
            max_toasts: config.max_toasts.max(1),
            duration_ms: config.toast_duration_ms,
        }
    }

    pub fn push(&mut self, kind: ToastKind, message: &str, now_ms: i64) -> Pushed {
        let toast = Toast {
            id: ToastId(self.next_id),
            kind,
            message: message.to_string(),
            expires_at_ms: now_ms + self.duration_ms,
        };
        self.next_id += 1;
        self.live.push_back(toast.clone());

        let mut evicted = Vec::new();
        while self.live.len() > self.max_toasts {
            if let Some(oldest) = self.live.pop_front() {
                evicted.push(oldest.id);
            }
        }
        Pushed { toast, evicted }
    }

    /// Manual close. Returns false when the toast was already gone.
    pub fn dismiss(&mut self, id: ToastId) -> bool {
        let before = self.live.len();
        self.live.retain(|toast| toast.id != id);
        before != self.live.len()
    }

    /// Drops and returns every toast whose display time has elapsed.
    pub fn expire(&mut self, now_ms: i64) -> Vec<ToastId> {
        let mut expired = Vec::new();
        self.live.retain(|toast| {
            if toast.expires_at_ms <= now_ms {
                expired.push(toast.id);
                false
            } else {
                true
            }
        });
        expired
    }

    pub fn live(&self) -> impl Iterator<Item = &Toast> {
        self.live.iter()
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn center(max_toasts: usize) -> NotificationCenter {
        let config = DashboardConfig {
            max_toasts,
            ..DashboardConfig::default()
        };
        NotificationCenter::new(&config)
    }

    #[test]
    fn toasts_expire_after_display_time() {
        let mut center = center(8);
        let first = center.push(ToastKind::Error, "boom", 1_000).toast;
        let second = center.push(ToastKind::Info, "later", 3_000).toast;
        assert_eq!(first.expires_at_ms, 6_000);

        assert!(center.expire(5_999).is_empty());
        assert_eq!(center.expire(6_000), vec![first.id]);
        assert_eq!(center.live().map(|t| t.id).collect::<Vec<_>>(), vec![second.id]);
    }

    #[test]
    fn stack_is_bounded_oldest_first() {
        let mut center = center(2);
        let a = center.push(ToastKind::Error, "a", 0).toast.id;
        center.push(ToastKind::Error, "b", 0);
        let pushed = center.push(ToastKind::Error, "c", 0);
        assert_eq!(pushed.evicted, vec![a]);
        assert_eq!(center.len(), 2);
    }

    #[test]
    fn dismiss_is_idempotent() {
        let mut center = center(4);
        let id = center.push(ToastKind::Success, "saved", 0).toast.id;
        assert!(center.dismiss(id));
        assert!(!center.dismiss(id));
        assert!(center.is_empty());
    }
}
