//! The directory collaborator.
//!
//! The directory hands out server IDs and answers name lookups. [`Registry`]
//! is an in-memory directory; [`DirectoryClient`] reaches a remote one over
//! IPC. Both implement [`Directory`], which is all the resolver needs.

mod client;
mod registry;

pub use client::DirectoryClient;
pub use registry::{Registry, ServerInfo, ServerSummary};

use crate::data::{ServerId, SettingId};
use crate::descriptor::RegistrationDescriptor;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Name lookups against the directory.
#[async_trait::async_trait]
pub trait Directory: Send + Sync {
    /// Server name to server ID.
    async fn lookup_server(&self, name: &str) -> Result<ServerId>;

    /// Setting names to setting IDs, in input order.
    async fn lookup_settings(&self, server: ServerId, names: &[String]) -> Result<Vec<SettingId>>;
}

/// Method names understood by the directory's IPC and HTTP endpoints.
pub mod methods {
    pub const LOOKUP_SERVER: &str = "lookup_server";
    pub const LOOKUP_SETTINGS: &str = "lookup_settings";
    pub const REGISTER_SERVER: &str = "register_server";
    pub const UNREGISTER_SERVER: &str = "unregister_server";
    pub const LIST_SERVERS: &str = "list_servers";
    pub const DESCRIBE_SERVER: &str = "describe_server";
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct LookupServerParams {
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct LookupSettingsParams {
    pub server: ServerId,
    pub names: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct RegisterServerParams {
    pub name: String,
    #[serde(default)]
    pub settings: Vec<RegistrationDescriptor>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ServerParams {
    pub server: ServerId,
}
