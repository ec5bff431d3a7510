//! HTTP client layer: `CexHttp`, the response envelope and opt-in read retries.

pub mod client;
pub mod envelope;
pub mod retry;

pub use client::{CexHttp, DEFAULT_REQUEST_TIMEOUT};
pub use envelope::Envelope;
pub use retry::{RetryConfig, RetryPolicy};
