//! TCP IPC server.
//!
//! Each accepted client becomes a [`Connection`] task that answers its
//! framed requests in order. Open connections are bounded by a semaphore; a
//! client over the limit gets one error frame and is disconnected. A single
//! watch channel stops the accept loop and every open connection together.

use super::protocol::{read_frame, write_frame, IpcRequest, IpcResponse};
use crate::config::IpcConfig;
use crate::error::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{watch, Semaphore};
use tracing::{debug, error, info, warn};

/// JSON-RPC code sent to clients refused for lack of capacity.
const BUSY_CODE: i32 = -32000;

/// Handle to a running IPC server. Dropping shuts down the server.
pub struct IpcServerHandle {
    pub addr: SocketAddr,
    stop: watch::Sender<bool>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl IpcServerHandle {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stop accepting clients and close the open connections.
    pub fn shutdown(&mut self) {
        let _ = self.stop.send(true);
    }
}

impl Drop for IpcServerHandle {
    fn drop(&mut self) {
        self.shutdown();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Method dispatch behind the IPC server.
#[async_trait::async_trait]
pub trait IpcDispatch: Send + Sync + 'static {
    async fn dispatch(&self, method: &str, params: serde_json::Value) -> Result<serde_json::Value>;
}

/// IPC server that listens for client connections.
pub struct IpcServer;

impl IpcServer {
    /// Start on an OS-assigned local port.
    pub async fn start<D: IpcDispatch>(dispatch: Arc<D>) -> Result<IpcServerHandle> {
        Self::start_on(SocketAddr::from(([127, 0, 0, 1], 0)), dispatch).await
    }

    /// Start on a specific address.
    pub async fn start_on<D: IpcDispatch>(
        addr: SocketAddr,
        dispatch: Arc<D>,
    ) -> Result<IpcServerHandle> {
        let listener = TcpListener::bind(addr).await?;
        let addr = listener.local_addr()?;
        info!("IPC server listening on {}", addr);

        let (stop, stopped) = watch::channel(false);
        let slots = Arc::new(Semaphore::new(IpcConfig::MAX_CONNECTIONS));
        let task = tokio::spawn(accept_loop(listener, dispatch, slots, stopped));

        Ok(IpcServerHandle {
            addr,
            stop,
            task: Some(task),
        })
    }
}

async fn accept_loop<D: IpcDispatch>(
    listener: TcpListener,
    dispatch: Arc<D>,
    slots: Arc<Semaphore>,
    mut stopped: watch::Receiver<bool>,
) {
    loop {
        let (stream, peer) = tokio::select! {
            _ = stopped.changed() => break,
            accepted = listener.accept() => match accepted {
                Ok(accepted) => accepted,
                Err(e) => {
                    error!("IPC accept error: {}", e);
                    continue;
                }
            },
        };

        let Ok(permit) = Arc::clone(&slots).try_acquire_owned() else {
            warn!(
                "Refusing IPC client {}: all {} directory connections in use",
                peer,
                IpcConfig::MAX_CONNECTIONS
            );
            tokio::spawn(refuse(stream));
            continue;
        };

        let connection = Connection {
            stream,
            peer,
            dispatch: Arc::clone(&dispatch),
            stopped: stopped.clone(),
        };
        tokio::spawn(async move {
            if let Err(e) = connection.serve().await {
                debug!("IPC client {} dropped: {}", peer, e);
            }
            drop(permit);
        });
    }
    info!("IPC server stopped");
}

/// Tell a refused client why before hanging up.
async fn refuse(mut stream: TcpStream) {
    let response = IpcResponse::error(
        None,
        BUSY_CODE,
        "Directory at connection capacity".to_string(),
    );
    if let Ok(bytes) = serde_json::to_vec(&response) {
        let _ = write_frame(&mut stream, &bytes).await;
    }
}

/// One client connection.
struct Connection<D> {
    stream: TcpStream,
    peer: SocketAddr,
    dispatch: Arc<D>,
    stopped: watch::Receiver<bool>,
}

impl<D: IpcDispatch> Connection<D> {
    async fn serve(mut self) -> Result<()> {
        debug!("IPC client {} connected", self.peer);
        loop {
            let frame = tokio::select! {
                frame = read_frame(&mut self.stream) => match frame? {
                    Some(frame) => frame,
                    None => break,
                },
                _ = self.stopped.changed() => break,
            };

            let response = respond(self.dispatch.as_ref(), &frame).await;
            write_frame(&mut self.stream, &serde_json::to_vec(&response)?).await?;
        }
        debug!("IPC client {} disconnected", self.peer);
        Ok(())
    }
}

/// Decode one request frame and produce its response.
async fn respond<D: IpcDispatch>(dispatch: &D, frame: &[u8]) -> IpcResponse {
    let request: IpcRequest = match serde_json::from_slice(frame) {
        Ok(request) => request,
        Err(e) => return IpcResponse::error(None, -32700, format!("Parse error: {}", e)),
    };
    if request.jsonrpc != "2.0" {
        return IpcResponse::error(
            request.id,
            -32600,
            "Invalid Request: expected jsonrpc 2.0".to_string(),
        );
    }

    let params = request
        .params
        .unwrap_or_else(|| serde_json::Value::Object(Default::default()));
    match dispatch.dispatch(&request.method, params).await {
        Ok(result) => IpcResponse::success(request.id, result),
        Err(e) => {
            debug!("IPC method {} failed: {}", request.method, e);
            IpcResponse::from_error(request.id, &e)
        }
    }
}
