//! In-process toast list with timed removal on the tokio runtime.

use crate::notification::{Notifier, ToastKind, ToastOptions};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: u64,
    pub message: String,
    pub kind: ToastKind,
    pub duration: Duration,
}

/// Toasts currently visible, newest last.
///
/// Each `show` schedules its own removal `duration + 500 ms` later. Cheap to
/// clone: clones share the list.
#[derive(Debug, Clone, Default)]
pub struct ToastBoard {
    toasts: Arc<Mutex<Vec<Toast>>>,
    next_id: Arc<AtomicU64>,
}

impl ToastBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the visible toasts.
    pub fn visible(&self) -> Vec<Toast> {
        self.toasts.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.toasts.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.lock().is_empty()
    }

    /// Remove a toast early. Returns whether it was still visible.
    pub fn dismiss(&self, id: u64) -> bool {
        let mut toasts = self.toasts.lock();
        let before = toasts.len();
        toasts.retain(|t| t.id != id);
        toasts.len() != before
    }

    pub fn clear(&self) {
        self.toasts.lock().clear();
    }
}

impl Notifier for ToastBoard {
    fn show(&self, message: &str, options: ToastOptions) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.toasts.lock().push(Toast {
            id,
            message: message.to_string(),
            kind: options.kind,
            duration: options.duration,
        });
        tracing::debug!(id, kind = %options.kind, "Toast shown: {}", message);

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let board = self.clone();
                let lifetime = options.lifetime();
                handle.spawn(async move {
                    tokio::time::sleep(lifetime).await;
                    board.dismiss(id);
                });
            }
            Err(_) => {
                tracing::warn!(id, "No tokio runtime; toast stays until dismissed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_toast_removed_after_duration_plus_grace() {
        let board = ToastBoard::new();
        board.show("Order 1 FILLED", ToastOptions::kind(ToastKind::Success));
        assert_eq!(board.len(), 1);
        assert_eq!(board.visible()[0].kind, ToastKind::Success);

        tokio::time::sleep(Duration::from_millis(3499)).await;
        tokio::task::yield_now().await;
        assert_eq!(board.len(), 1);

        tokio::time::sleep(Duration::from_millis(2)).await;
        tokio::task::yield_now().await;
        assert!(board.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_toasts_expire_independently() {
        let board = ToastBoard::new();
        board.show("short", ToastOptions::default().with_duration(Duration::from_millis(100)));
        board.show("long", ToastOptions::default());
        assert_eq!(board.len(), 2);

        tokio::time::sleep(Duration::from_millis(700)).await;
        tokio::task::yield_now().await;
        let visible = board.visible();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].message, "long");
    }

    #[test]
    fn test_show_without_runtime_keeps_toast() {
        let board = ToastBoard::new();
        board.show("no runtime", ToastOptions::default());
        let id = board.visible()[0].id;
        assert!(board.dismiss(id));
        assert!(!board.dismiss(id));
    }
}
