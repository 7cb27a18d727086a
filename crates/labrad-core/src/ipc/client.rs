//! TCP IPC client.
//!
//! Holds one connection to an IPC server and exposes [`IpcClient::call`] for
//! JSON-RPC method invocation. The stream sits behind a tokio `Mutex`, so
//! concurrent callers are serialized request by request.

use super::protocol::{read_frame, write_frame, IpcRequest, IpcResponse};
use crate::config::IpcConfig;
use crate::error::{LabradError, Result};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Debug)]
pub struct IpcClient {
    stream: Mutex<TcpStream>,
    addr: SocketAddr,
    next_id: AtomicU64,
}

impl IpcClient {
    /// Connect using the configured timeout.
    pub async fn connect(addr: SocketAddr) -> Result<Self> {
        let lost = || LabradError::InstanceLost {
            addr: addr.to_string(),
        };
        let stream = tokio::time::timeout(IpcConfig::CONNECT_TIMEOUT, TcpStream::connect(addr))
            .await
            .map_err(|_| lost())?
            .map_err(|_| lost())?;

        debug!("IPC client connected to {}", addr);

        Ok(Self {
            stream: Mutex::new(stream),
            addr,
            next_id: AtomicU64::new(1),
        })
    }

    /// Call a method on the server.
    ///
    /// A remote error comes back as [`LabradError::Remote`] with the server's
    /// code and message; a broken connection as [`LabradError::InstanceLost`].
    pub async fn call(&self, method: &str, params: serde_json::Value) -> Result<serde_json::Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = IpcRequest::new(method, params, id);
        let request_bytes = serde_json::to_vec(&request)?;
        let lost = || LabradError::InstanceLost {
            addr: self.addr.to_string(),
        };

        let mut stream = self.stream.lock().await;
        let (mut reader, mut writer) = stream.split();

        write_frame(&mut writer, &request_bytes)
            .await
            .map_err(|_| lost())?;

        let response_bytes = read_frame(&mut reader)
            .await
            .map_err(|_| lost())?
            .ok_or_else(lost)?;

        let response: IpcResponse =
            serde_json::from_slice(&response_bytes).map_err(|e| LabradError::Json {
                message: format!("Failed to parse IPC response: {}", e),
                source: Some(e),
            })?;

        if let Some(err) = response.error {
            return Err(LabradError::Remote {
                code: err.code,
                message: err.message,
                data: err.data,
            });
        }

        response
            .result
            .ok_or_else(|| LabradError::Other("IPC response missing result".to_string()))
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}
