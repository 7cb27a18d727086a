//! Directory reached over IPC.

use super::{
    methods, Directory, LookupServerParams, LookupSettingsParams, RegisterServerParams,
    ServerInfo, ServerParams, ServerSummary,
};
use crate::data::{ServerId, SettingId};
use crate::descriptor::RegistrationDescriptor;
use crate::error::Result;
use crate::ipc::IpcClient;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::net::SocketAddr;

/// [`Directory`] backed by a remote directory process.
#[derive(Debug)]
pub struct DirectoryClient {
    client: IpcClient,
}

impl DirectoryClient {
    pub async fn connect(addr: SocketAddr) -> Result<Self> {
        Ok(Self {
            client: IpcClient::connect(addr).await?,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.client.addr()
    }

    async fn call<P: Serialize, R: DeserializeOwned>(&self, method: &str, params: P) -> Result<R> {
        let result = self
            .client
            .call(method, serde_json::to_value(params)?)
            .await?;
        Ok(serde_json::from_value(result)?)
    }

    /// Advertise a server and its settings; returns the assigned server ID.
    pub async fn register_server(
        &self,
        name: &str,
        settings: Vec<RegistrationDescriptor>,
    ) -> Result<ServerId> {
        self.call(
            methods::REGISTER_SERVER,
            RegisterServerParams {
                name: name.to_string(),
                settings,
            },
        )
        .await
    }

    pub async fn unregister_server(&self, server: ServerId) -> Result<String> {
        self.call(methods::UNREGISTER_SERVER, ServerParams { server })
            .await
    }

    pub async fn list_servers(&self) -> Result<Vec<ServerSummary>> {
        self.call(methods::LIST_SERVERS, serde_json::json!({})).await
    }

    pub async fn describe_server(&self, server: ServerId) -> Result<ServerInfo> {
        self.call(methods::DESCRIBE_SERVER, ServerParams { server })
            .await
    }
}

#[async_trait::async_trait]
impl Directory for DirectoryClient {
    async fn lookup_server(&self, name: &str) -> Result<ServerId> {
        self.call(
            methods::LOOKUP_SERVER,
            LookupServerParams {
                name: name.to_string(),
            },
        )
        .await
    }

    async fn lookup_settings(&self, server: ServerId, names: &[String]) -> Result<Vec<SettingId>> {
        self.call(
            methods::LOOKUP_SETTINGS,
            LookupSettingsParams {
                server,
                names: names.to_vec(),
            },
        )
        .await
    }
}
