//! In-memory directory.
//!
//! Assigns server IDs in registration order and keeps each server's setting
//! descriptors so names can be turned into IDs. IDs are only meaningful for
//! the lifetime of one `Registry`.

use super::{
    methods, Directory, LookupServerParams, LookupSettingsParams, RegisterServerParams,
    ServerParams,
};
use crate::config::ManagerConfig;
use crate::data::{ServerId, SettingId};
use crate::descriptor::RegistrationDescriptor;
use crate::error::{LabradError, Result};
use crate::ipc::IpcDispatch;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Short listing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSummary {
    pub id: ServerId,
    pub name: String,
}

/// Full record of a registered server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub id: ServerId,
    pub name: String,
    pub settings: Vec<RegistrationDescriptor>,
}

struct ServerEntry {
    info: ServerInfo,
    setting_ids: HashMap<String, SettingId>,
}

struct RegistryState {
    next_id: u32,
    by_name: HashMap<String, ServerId>,
    servers: BTreeMap<ServerId, ServerEntry>,
}

pub struct Registry {
    state: RwLock<RegistryState>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(RegistryState {
                next_id: ManagerConfig::FIRST_SERVER_ID,
                by_name: HashMap::new(),
                servers: BTreeMap::new(),
            }),
        }
    }

    /// Register a server and its settings, returning the assigned ID.
    pub async fn register_server(
        &self,
        name: &str,
        settings: Vec<RegistrationDescriptor>,
    ) -> Result<ServerId> {
        if name.trim().is_empty() {
            return Err(LabradError::Validation {
                field: "name".to_string(),
                message: "server name must not be empty".to_string(),
            });
        }

        let mut setting_ids = HashMap::with_capacity(settings.len());
        let mut seen_ids = HashSet::with_capacity(settings.len());
        for descriptor in &settings {
            if !seen_ids.insert(descriptor.id)
                || setting_ids
                    .insert(descriptor.name.clone(), descriptor.id)
                    .is_some()
            {
                return Err(LabradError::Validation {
                    field: descriptor.name.clone(),
                    message: format!("duplicate setting {} on server {}", descriptor.id, name),
                });
            }
        }

        let mut state = self.state.write().await;
        if state.by_name.contains_key(name) {
            return Err(LabradError::ServerAlreadyRegistered {
                name: name.to_string(),
            });
        }

        let id = ServerId(state.next_id);
        state.next_id += 1;
        state.by_name.insert(name.to_string(), id);
        state.servers.insert(
            id,
            ServerEntry {
                info: ServerInfo {
                    id,
                    name: name.to_string(),
                    settings,
                },
                setting_ids,
            },
        );

        info!("Registered server {} as {}", name, id);
        Ok(id)
    }

    /// Remove a server, returning its name.
    pub async fn unregister_server(&self, id: ServerId) -> Result<String> {
        let mut state = self.state.write().await;
        let entry = state
            .servers
            .remove(&id)
            .ok_or_else(|| LabradError::UnknownServer {
                name: id.to_string(),
            })?;
        state.by_name.remove(&entry.info.name);

        info!("Unregistered server {} ({})", entry.info.name, id);
        Ok(entry.info.name)
    }

    /// Registered servers in ID order.
    pub async fn list_servers(&self) -> Vec<ServerSummary> {
        let state = self.state.read().await;
        state
            .servers
            .values()
            .map(|entry| ServerSummary {
                id: entry.info.id,
                name: entry.info.name.clone(),
            })
            .collect()
    }

    pub async fn describe_server(&self, id: ServerId) -> Result<ServerInfo> {
        let state = self.state.read().await;
        state
            .servers
            .get(&id)
            .map(|entry| entry.info.clone())
            .ok_or_else(|| LabradError::UnknownServer {
                name: id.to_string(),
            })
    }
}

#[async_trait::async_trait]
impl Directory for Registry {
    async fn lookup_server(&self, name: &str) -> Result<ServerId> {
        let state = self.state.read().await;
        state
            .by_name
            .get(name)
            .copied()
            .ok_or_else(|| LabradError::UnknownServer {
                name: name.to_string(),
            })
    }

    /// Fails as a whole if any name is unknown.
    async fn lookup_settings(&self, server: ServerId, names: &[String]) -> Result<Vec<SettingId>> {
        let state = self.state.read().await;
        let entry = state
            .servers
            .get(&server)
            .ok_or_else(|| LabradError::UnknownServer {
                name: server.to_string(),
            })?;

        debug!("Looking up {} setting(s) on {}", names.len(), entry.info.name);

        names
            .iter()
            .map(|name| {
                entry
                    .setting_ids
                    .get(name)
                    .copied()
                    .ok_or_else(|| LabradError::UnknownSettingName {
                        server: server.0,
                        setting: name.clone(),
                    })
            })
            .collect()
    }
}

fn parse_params<P: DeserializeOwned>(params: serde_json::Value) -> Result<P> {
    serde_json::from_value(params).map_err(|e| LabradError::InvalidParams {
        message: e.to_string(),
    })
}

#[async_trait::async_trait]
impl IpcDispatch for Registry {
    async fn dispatch(&self, method: &str, params: serde_json::Value) -> Result<serde_json::Value> {
        match method {
            methods::LOOKUP_SERVER => {
                let p: LookupServerParams = parse_params(params)?;
                Ok(serde_json::to_value(self.lookup_server(&p.name).await?)?)
            }
            methods::LOOKUP_SETTINGS => {
                let p: LookupSettingsParams = parse_params(params)?;
                Ok(serde_json::to_value(
                    self.lookup_settings(p.server, &p.names).await?,
                )?)
            }
            methods::REGISTER_SERVER => {
                let p: RegisterServerParams = parse_params(params)?;
                Ok(serde_json::to_value(
                    self.register_server(&p.name, p.settings).await?,
                )?)
            }
            methods::UNREGISTER_SERVER => {
                let p: ServerParams = parse_params(params)?;
                Ok(serde_json::to_value(self.unregister_server(p.server).await?)?)
            }
            methods::LIST_SERVERS => Ok(serde_json::to_value(self.list_servers().await)?),
            methods::DESCRIBE_SERVER => {
                let p: ServerParams = parse_params(params)?;
                Ok(serde_json::to_value(self.describe_server(p.server).await?)?)
            }
            _ => Err(LabradError::InvalidParams {
                message: format!("Method not found: {}", method),
            }),
        }
    }
}
