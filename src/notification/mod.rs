//! Transient notifications for private order updates.
//!
//! A [`Notifier`] shows one message for a while and then drops it. There is no
//! queue, no deduplication and no cap on simultaneous toasts.
//!
//! - [`ToastBoard`]: in-process list of visible toasts (`ws-native`).
//! - [`DomToaster`]: a DOM element per toast (`ws-wasm`).
//! - [`LogNotifier`]: writes each message to `tracing`.

#[cfg(feature = "ws-wasm")]
mod dom;
#[cfg(feature = "ws-native")]
mod toast;

#[cfg(feature = "ws-wasm")]
pub use dom::DomToaster;
#[cfg(feature = "ws-native")]
pub use toast::{Toast, ToastBoard};

use crate::shared::serde_util;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How long a toast stays visible unless overridden.
pub const DEFAULT_TOAST_DURATION: Duration = Duration::from_millis(3000);

/// Extra time after `duration` before a toast is removed (exit animation).
pub const DISMISS_GRACE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

impl ToastKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToastKind::Info => "info",
            ToastKind::Success => "success",
            ToastKind::Warning => "warning",
            ToastKind::Error => "error",
        }
    }
}

impl std::fmt::Display for ToastKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToastOptions {
    pub kind: ToastKind,
    pub duration: Duration,
}

impl Default for ToastOptions {
    fn default() -> Self {
        Self {
            kind: ToastKind::Info,
            duration: DEFAULT_TOAST_DURATION,
        }
    }
}

impl ToastOptions {
    pub fn kind(kind: ToastKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Time from `show` until the toast is removed.
    pub fn lifetime(&self) -> Duration {
        self.duration + DISMISS_GRACE
    }
}

/// A sink for short user-facing messages.
pub trait Notifier: Send + Sync {
    fn show(&self, message: &str, options: ToastOptions);
}

/// Logs each message at a level matching its kind.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn show(&self, message: &str, options: ToastOptions) {
        match options.kind {
            ToastKind::Error => tracing::error!("{}", message),
            ToastKind::Warning => tracing::warn!("{}", message),
            ToastKind::Info | ToastKind::Success => tracing::info!("{}", message),
        }
    }
}

// ─── Order notifications ─────────────────────────────────────────────────────

/// Payload pushed on `private:<userId>` when one of the user's orders changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderNotification {
    /// Usually `"orderUpdate"`.
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(deserialize_with = "serde_util::string_or_number::deserialize")]
    pub order_id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub reason: Option<String>,
}

impl OrderNotification {
    /// Toast text naming the order, its status as sent and the reason if any.
    pub fn message(&self) -> String {
        match self.reason.as_deref().filter(|r| !r.is_empty()) {
            Some(reason) => format!("Order {} {}: {}", self.order_id, self.status, reason),
            None => format!("Order {} {}", self.order_id, self.status),
        }
    }

    pub fn toast_kind(&self) -> ToastKind {
        match self.status.to_ascii_uppercase().as_str() {
            "FILLED" => ToastKind::Success,
            "CANCELED" | "CANCELLED" => ToastKind::Warning,
            "REJECTED" | "FAILED" => ToastKind::Error,
            _ => ToastKind::Info,
        }
    }

    pub fn toast_options(&self) -> ToastOptions {
        ToastOptions::kind(self.toast_kind())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_options() {
        let options = ToastOptions::default();
        assert_eq!(options.kind, ToastKind::Info);
        assert_eq!(options.duration, Duration::from_millis(3000));
        assert_eq!(options.lifetime(), Duration::from_millis(3500));
    }

    #[test]
    fn test_order_notification_from_private_push() {
        let n: OrderNotification = serde_json::from_value(json!({
            "type": "orderUpdate",
            "orderId": 1024,
            "status": "CANCELED",
            "reason": "Market order could not be filled"
        }))
        .unwrap();
        assert_eq!(n.order_id, "1024");
        assert_eq!(n.toast_kind(), ToastKind::Warning);
        let text = n.message();
        assert!(text.contains("1024"));
        assert!(text.contains("CANCELED"));
        assert!(text.contains("Market order could not be filled"));
    }

    #[test]
    fn test_toast_kind_mapping() {
        let with_status = |status: &str| OrderNotification {
            kind: None,
            order_id: "1".into(),
            status: status.into(),
            reason: None,
        };
        assert_eq!(with_status("FILLED").toast_kind(), ToastKind::Success);
        assert_eq!(with_status("REJECTED").toast_kind(), ToastKind::Error);
        assert_eq!(with_status("FAILED").toast_kind(), ToastKind::Error);
        assert_eq!(with_status("PARTIAL").toast_kind(), ToastKind::Info);
        assert_eq!(with_status("PARTIAL").message(), "Order 1 PARTIAL");
    }
}
