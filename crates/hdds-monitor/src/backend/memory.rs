// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! In-process statistics backend.
//!
//! Holds entities in memory and raises discovery callbacks synchronously on
//! the mutating thread. Ids are allocated monotonically, so enumeration
//! order is insertion order.

use super::{BackendError, StatisticsBackend};
use crate::config::ConfigError;
use crate::entity::{DomainStatus, EntityId, EntityInfo, EntityKind};
use crate::listener::DiscoveryListener;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

/// Static description of a domain, loadable from JSON.
///
/// ```json
/// { "entities": [
///     { "kind": "participant", "info": { "guid": "01.0f|0.0.1.c1", "name": "/" } },
///     { "kind": "data_reader", "info": { "name": "DataReader_rq/talker/get_parametersRequest_0.0.1.2" } }
/// ] }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Topology {
    #[serde(default)]
    pub entities: Vec<TopologyEntry>,
}

/// One entity of a [`Topology`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopologyEntry {
    pub kind: EntityKind,
    #[serde(default)]
    pub info: EntityInfo,
}

impl Topology {
    /// Load a topology from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Counts {
    total: u32,
    current: u32,
}

#[derive(Debug)]
struct Entry {
    kind: EntityKind,
    info: EntityInfo,
}

#[derive(Default)]
struct State {
    entities: BTreeMap<EntityId, Entry>,
    /// Monitor handle (the domain entity) -> domain id.
    monitors: BTreeMap<EntityId, u32>,
    counts: HashMap<EntityKind, Counts>,
    next_id: u64,
}

impl State {
    fn allocate(&mut self, kind: EntityKind, info: EntityInfo) -> EntityId {
        let id = EntityId::new(self.next_id);
        self.next_id += 1;
        self.entities.insert(id, Entry { kind, info });
        id
    }

    fn status(&self, kind: EntityKind, total_change: i32, current_change: i32) -> DomainStatus {
        let counts = self.counts.get(&kind).copied().unwrap_or_default();
        DomainStatus {
            total_count: counts.total,
            total_count_change: total_change,
            current_count: counts.current,
            current_count_change: current_change,
        }
    }

    fn domain(&self) -> EntityId {
        self.monitors
            .keys()
            .next()
            .copied()
            .unwrap_or(EntityId::INVALID)
    }
}

/// Statistics backend backed by an in-memory entity table.
#[derive(Default)]
pub struct MemoryBackend {
    state: RwLock<State>,
    listener: RwLock<Option<Arc<dyn DiscoveryListener>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity and raise a "discovered" callback for it.
    pub fn insert(&self, kind: EntityKind, info: EntityInfo) -> EntityId {
        let (id, status, domain) = {
            let mut state = self.state.write();
            let id = state.allocate(kind, info);
            let counts = state.counts.entry(kind).or_default();
            counts.total += 1;
            counts.current += 1;
            (id, state.status(kind, 1, 1), state.domain())
        };

        self.notify(kind, domain, id, status);
        id
    }

    /// Replace an entity's info and raise an "updated" callback.
    pub fn update(&self, id: EntityId, info: EntityInfo) -> Result<(), BackendError> {
        let (kind, status, domain) = {
            let mut state = self.state.write();
            let entry = state
                .entities
                .get_mut(&id)
                .ok_or(BackendError::UnknownEntity(id))?;
            entry.info = info;
            let kind = entry.kind;
            (kind, state.status(kind, 0, 0), state.domain())
        };

        self.notify(kind, domain, id, status);
        Ok(())
    }

    /// Raise a callback with a `-1` delta, then drop the entity.
    pub fn remove(&self, id: EntityId) -> Result<(), BackendError> {
        let (kind, status, domain) = {
            let state = self.state.read();
            let kind = state
                .entities
                .get(&id)
                .map(|entry| entry.kind)
                .ok_or(BackendError::UnknownEntity(id))?;
            let mut status = state.status(kind, 0, -1);
            status.current_count = status.current_count.saturating_sub(1);
            (kind, status, state.domain())
        };

        // Listeners look the entity up, so it must still exist here.
        self.notify(kind, domain, id, status);

        let mut state = self.state.write();
        if state.entities.remove(&id).is_some() {
            let counts = state.counts.entry(kind).or_default();
            counts.current = counts.current.saturating_sub(1);
        }
        Ok(())
    }

    /// Insert every entity of `topology`, in document order.
    pub fn load(&self, topology: &Topology) -> Vec<EntityId> {
        topology
            .entities
            .iter()
            .map(|entry| self.insert(entry.kind, entry.info.clone()))
            .collect()
    }

    /// Number of entities, domains included.
    pub fn len(&self) -> usize {
        self.state.read().entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn notify(&self, kind: EntityKind, domain: EntityId, id: EntityId, status: DomainStatus) {
        let listener = match self.listener.read().clone() {
            Some(listener) => listener,
            None => return,
        };

        match kind {
            EntityKind::Host => listener.on_host_discovery(self, id, status),
            EntityKind::User => listener.on_user_discovery(self, id, status),
            EntityKind::Process => listener.on_process_discovery(self, id, status),
            EntityKind::Topic => listener.on_topic_discovery(self, domain, id, status),
            EntityKind::Participant => listener.on_participant_discovery(self, domain, id, status),
            EntityKind::DataReader => listener.on_datareader_discovery(self, domain, id, status),
            EntityKind::DataWriter => listener.on_datawriter_discovery(self, domain, id, status),
            EntityKind::Domain | EntityKind::Locator => {}
        }
    }
}

impl StatisticsBackend for MemoryBackend {
    fn entities(&self, kind: EntityKind) -> Result<Vec<EntityId>, BackendError> {
        Ok(self
            .state
            .read()
            .entities
            .iter()
            .filter(|(_, entry)| entry.kind == kind)
            .map(|(&id, _)| id)
            .collect())
    }

    fn info(&self, id: EntityId) -> Result<EntityInfo, BackendError> {
        self.state
            .read()
            .entities
            .get(&id)
            .map(|entry| entry.info.clone())
            .ok_or(BackendError::UnknownEntity(id))
    }

    fn start_monitor(&self, domain: u32) -> Result<EntityId, BackendError> {
        let mut state = self.state.write();
        if state.monitors.values().any(|&d| d == domain) {
            return Err(BackendError::AlreadyMonitored(domain));
        }

        let info = EntityInfo::new().with("name", domain.to_string());
        let id = state.allocate(EntityKind::Domain, info);
        state.monitors.insert(id, domain);
        tracing::debug!(domain, monitor = %id, "Monitor started");
        Ok(id)
    }

    fn stop_monitor(&self, monitor: EntityId) -> Result<(), BackendError> {
        let mut state = self.state.write();
        let domain = state
            .monitors
            .remove(&monitor)
            .ok_or(BackendError::UnknownEntity(monitor))?;
        state.entities.remove(&monitor);
        tracing::debug!(domain, monitor = %monitor, "Monitor stopped");
        Ok(())
    }

    fn set_listener(&self, listener: Option<Arc<dyn DiscoveryListener>>) {
        *self.listener.write() = listener;
    }
}
