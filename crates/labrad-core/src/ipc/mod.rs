//! Framed JSON-RPC transport used to reach the directory.
//!
//! Length-prefixed JSON-RPC 2.0 over TCP.
//!
//! - **Server**: accepts connections, dispatches method calls
//! - **Client**: one connection, serialized calls
//! - **Protocol**: shared framing and JSON-RPC types

pub mod client;
pub mod protocol;
pub mod server;

pub use client::IpcClient;
pub use protocol::{IpcError, IpcRequest, IpcResponse};
pub use server::{IpcDispatch, IpcServer, IpcServerHandle};
