//! Name to ID resolution for outgoing requests.
//!
//! Requests may address a server and its settings by name. Before a request
//! goes on the wire every name has to become an ID, which the directory
//! knows. The [`Resolver`] keeps a two-level cache in front of it:
//!
//! - server name to [`ServerId`]
//! - per server, setting name to [`SettingId`]
//!
//! [`Resolver::cache_only_resolve`] fills in what the cache knows without
//! blocking. [`Resolver::full_resolve`] makes at most one round trip for the
//! server and one batched round trip for all of its missing settings.
//!
//! Concurrent cold lookups of the same name are not coalesced; each caller
//! asks the directory and the last writer wins. The answers are identical so
//! the cache stays consistent.

use crate::data::{ServerId, SettingId, TaggedValue};
use crate::directory::Directory;
use crate::error::{LabradError, Result};
use dashmap::DashMap;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// Something addressed by name, by ID, or both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target<I> {
    pub name: Option<String>,
    pub id: Option<I>,
}

impl<I> Target<I> {
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            id: None,
        }
    }

    pub fn by_id(id: I) -> Self {
        Self {
            name: None,
            id: Some(id),
        }
    }

    /// True while the ID is unknown.
    pub fn needs_lookup(&self) -> bool {
        self.id.is_none()
    }
}

impl<I> From<&str> for Target<I> {
    fn from(name: &str) -> Self {
        Self::by_name(name)
    }
}

impl<I> From<String> for Target<I> {
    fn from(name: String) -> Self {
        Self::by_name(name)
    }
}

impl From<ServerId> for Target<ServerId> {
    fn from(id: ServerId) -> Self {
        Self::by_id(id)
    }
}

impl From<SettingId> for Target<SettingId> {
    fn from(id: SettingId) -> Self {
        Self::by_id(id)
    }
}

/// One setting call within a request.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub setting: Target<SettingId>,
    pub data: TaggedValue,
}

/// A pending request to one server.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub server: Target<ServerId>,
    pub records: Vec<Record>,
}

impl Request {
    pub fn new(server: impl Into<Target<ServerId>>) -> Self {
        Self {
            server: server.into(),
            records: Vec::new(),
        }
    }

    /// Append a record.
    pub fn record(mut self, setting: impl Into<Target<SettingId>>, data: TaggedValue) -> Self {
        self.records.push(Record {
            setting: setting.into(),
            data,
        });
        self
    }

    pub fn needs_lookup(&self) -> bool {
        self.server.needs_lookup() || self.records.iter().any(|r| r.setting.needs_lookup())
    }

    /// Setting IDs in record order, once every record is resolved.
    pub fn setting_ids(&self) -> Option<Vec<SettingId>> {
        self.records.iter().map(|r| r.setting.id).collect()
    }
}

type SettingCache = Arc<DashMap<String, SettingId>>;

/// Cached name resolution against a [`Directory`].
pub struct Resolver {
    directory: Arc<dyn Directory>,
    servers: DashMap<String, ServerId>,
    settings: DashMap<ServerId, SettingCache>,
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("servers", &self.servers.len())
            .field("setting_caches", &self.settings.len())
            .finish()
    }
}

impl Resolver {
    pub fn new(directory: Arc<dyn Directory>) -> Self {
        Self {
            directory,
            servers: DashMap::new(),
            settings: DashMap::new(),
        }
    }

    fn setting_cache(&self, server: ServerId) -> Option<SettingCache> {
        self.settings.get(&server).map(|cache| Arc::clone(cache.value()))
    }

    fn setting_cache_or_default(&self, server: ServerId) -> SettingCache {
        Arc::clone(self.settings.entry(server).or_default().value())
    }

    /// Fill in every ID the cache knows.
    ///
    /// Returns true if the request still needs a directory lookup.
    pub fn cache_only_resolve(&self, request: &mut Request) -> bool {
        if request.server.id.is_none() {
            if let Some(name) = &request.server.name {
                request.server.id = self.servers.get(name).map(|id| *id);
            }
        }

        let Some(server) = request.server.id else {
            return true;
        };

        if let Some(cache) = self.setting_cache(server) {
            for record in request.records.iter_mut() {
                if record.setting.id.is_some() {
                    continue;
                }
                if let Some(name) = &record.setting.name {
                    record.setting.id = cache.get(name).map(|id| *id);
                }
            }
        }

        request.needs_lookup()
    }

    /// Resolve every name in the request, asking the directory for what the
    /// cache lacks.
    ///
    /// Missing setting names are sent in one batch, deduplicated in the order
    /// they first appear. On failure the request may be partly filled in but
    /// nothing from the failed lookup is cached.
    pub async fn full_resolve(&self, request: &mut Request) -> Result<()> {
        if !self.cache_only_resolve(request) {
            return Ok(());
        }

        if let Some(index) = request
            .records
            .iter()
            .position(|r| r.setting.id.is_none() && r.setting.name.is_none())
        {
            return Err(LabradError::Resolution {
                message: format!("record {} has neither setting name nor ID", index),
            });
        }

        // A sub-cache exists only for servers whose name is cached, so an
        // ID-only server reuses one if present and otherwise caches nothing.
        let (server, cache) = match request.server.id {
            Some(id) => (id, self.setting_cache(id)),
            None => {
                let name = request.server.name.clone().ok_or_else(|| LabradError::Resolution {
                    message: "request has neither server name nor ID".to_string(),
                })?;
                debug!("Server cache miss for {}", name);
                let id = self.directory.lookup_server(&name).await?;
                self.servers.insert(name, id);
                request.server.id = Some(id);
                (id, Some(self.setting_cache_or_default(id)))
            }
        };

        let mut missing = Vec::new();
        let mut seen = HashSet::new();
        for record in request.records.iter_mut() {
            if record.setting.id.is_some() {
                continue;
            }
            let Some(name) = &record.setting.name else {
                continue;
            };
            let cached = cache.as_ref().and_then(|c| c.get(name).map(|id| *id));
            if cached.is_some() {
                record.setting.id = cached;
            } else if seen.insert(name.clone()) {
                missing.push(name.clone());
            }
        }

        if missing.is_empty() {
            return Ok(());
        }

        debug!(
            "Looking up {} setting name(s) on server {}",
            missing.len(),
            server
        );
        let ids = self.directory.lookup_settings(server, &missing).await?;
        if ids.len() != missing.len() {
            return Err(LabradError::Resolution {
                message: format!(
                    "directory returned {} setting ID(s) for {} name(s) on server {}",
                    ids.len(),
                    missing.len(),
                    server
                ),
            });
        }

        let resolved: HashMap<String, SettingId> = missing.into_iter().zip(ids).collect();
        if let Some(cache) = &cache {
            for (name, id) in &resolved {
                cache.insert(name.clone(), *id);
            }
        }
        for record in request.records.iter_mut() {
            if record.setting.id.is_none() {
                if let Some(name) = &record.setting.name {
                    record.setting.id = resolved.get(name).copied();
                }
            }
        }

        Ok(())
    }

    /// Drop every cached entry.
    pub fn clear_cache(&self) {
        self.servers.clear();
        self.settings.clear();
    }

    /// Forget a server name and its settings.
    pub fn clear_server(&self, name: &str) {
        if let Some((_, id)) = self.servers.remove(name) {
            self.settings.remove(&id);
            debug!("Cleared cache for server {} ({})", name, id);
        }
    }

    /// Forget a server by ID, e.g. after it disconnects.
    pub fn clear_server_id(&self, id: ServerId) {
        self.settings.remove(&id);
        self.servers.retain(|_, cached| *cached != id);
    }

    pub fn cached_server_id(&self, name: &str) -> Option<ServerId> {
        self.servers.get(name).map(|id| *id)
    }

    pub fn cached_setting_id(&self, server: ServerId, name: &str) -> Option<SettingId> {
        let cache = self.setting_cache(server)?;
        let id = cache.get(name).map(|id| *id);
        id
    }
}
