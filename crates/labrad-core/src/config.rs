//! Centralized configuration constants.

use std::time::Duration;

/// Framed JSON-RPC transport limits.
pub struct IpcConfig;

impl IpcConfig {
    /// Largest accepted frame payload (16 MB).
    pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
    pub const MAX_CONNECTIONS: usize = 256;
}

/// Directory service defaults.
pub struct ManagerConfig;

impl ManagerConfig {
    pub const DEFAULT_HOST: &'static str = "127.0.0.1";
    pub const DEFAULT_IPC_PORT: u16 = 7682;
    pub const DEFAULT_HTTP_PORT: u16 = 7683;
    /// In-flight HTTP requests before callers queue.
    pub const MAX_CONCURRENT_REQUESTS: usize = 64;
    /// First server ID handed out in a session.
    pub const FIRST_SERVER_ID: u32 = 1;
}
