//! Network URL constants for the CEX SDK.

/// Default REST API base URL.
pub const DEFAULT_API_URL: &str = "http://localhost:8080";

/// Default WebSocket URL.
pub const DEFAULT_WS_URL: &str = "ws://localhost:8080/ws/v1";

/// Environment variable overriding the REST base URL (see `CexClientBuilder::from_env`).
pub const API_URL_ENV: &str = "CEX_API_URL";

/// Environment variable overriding the WebSocket URL.
pub const WS_URL_ENV: &str = "CEX_WS_URL";
