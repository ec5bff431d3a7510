//! Browser toasts: one `<div>` per message, appended to `document.body`.

use crate::notification::{Notifier, ToastOptions};
use gloo_timers::callback::Timeout;

/// Appends a fresh container per toast and removes it after
/// `duration + 500 ms`. Styling is left to the page via the CSS classes
/// `<class_prefix>` and `<class_prefix>-<kind>`.
#[derive(Debug, Clone)]
pub struct DomToaster {
    class_prefix: String,
}

impl Default for DomToaster {
    fn default() -> Self {
        Self {
            class_prefix: "cex-toast".to_string(),
        }
    }
}

impl DomToaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_class_prefix(prefix: impl Into<String>) -> Self {
        Self {
            class_prefix: prefix.into(),
        }
    }

    fn mount(&self, message: &str, options: ToastOptions) -> Option<()> {
        let document = web_sys::window()?.document()?;
        let body = document.body()?;
        let container = document.create_element("div").ok()?;
        container.set_class_name(&format!(
            "{prefix} {prefix}-{kind}",
            prefix = self.class_prefix,
            kind = options.kind
        ));
        container.set_attribute("role", "status").ok()?;
        container.set_text_content(Some(message));
        body.append_child(&container).ok()?;

        let millis = u32::try_from(options.lifetime().as_millis()).unwrap_or(u32::MAX);
        Timeout::new(millis, move || container.remove()).forget();
        Some(())
    }
}

impl Notifier for DomToaster {
    fn show(&self, message: &str, options: ToastOptions) {
        if self.mount(message, options).is_none() {
            tracing::warn!("No document available for toast: {}", message);
        }
    }
}
