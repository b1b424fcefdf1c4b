// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Statistics backend gateway.
//!
//! The monitor never talks to the network itself. Everything it knows about
//! the domain comes through [`StatisticsBackend`]: entity enumeration by
//! kind, info lookup by id, monitor registration and the discovery callback
//! slot.

mod memory;

pub use memory::{MemoryBackend, Topology, TopologyEntry};

use crate::entity::{EntityId, EntityInfo, EntityKind};
use crate::listener::DiscoveryListener;
use std::sync::Arc;
use thiserror::Error;

/// Backend errors.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Unknown entity: {0}")]
    UnknownEntity(EntityId),

    #[error("Domain {0} is already monitored")]
    AlreadyMonitored(u32),

    #[error("Cannot monitor domain {domain}: {reason}")]
    MonitorUnavailable { domain: u32, reason: String },
}

/// Contract consumed by the monitor.
///
/// Implementations must be callable from the polling thread while discovery
/// callbacks run on a backend-owned thread.
pub trait StatisticsBackend: Send + Sync {
    /// Ids of every known entity of `kind`, in backend enumeration order.
    fn entities(&self, kind: EntityKind) -> Result<Vec<EntityId>, BackendError>;

    /// Descriptive info for one entity.
    fn info(&self, id: EntityId) -> Result<EntityInfo, BackendError>;

    /// Start monitoring `domain`. Returns the monitor handle.
    fn start_monitor(&self, domain: u32) -> Result<EntityId, BackendError>;

    /// Stop a monitor previously returned by [`start_monitor`](Self::start_monitor).
    fn stop_monitor(&self, monitor: EntityId) -> Result<(), BackendError>;

    /// Install (or clear, with `None`) the process-wide discovery listener.
    fn set_listener(&self, listener: Option<Arc<dyn DiscoveryListener>>);

    /// Id of the first topic named `name` carrying `data_type`.
    fn find_topic(&self, name: &str, data_type: &str) -> Option<EntityId> {
        let topics = match self.entities(EntityKind::Topic) {
            Ok(topics) => topics,
            Err(err) => {
                tracing::warn!("Topic enumeration failed: {}", err);
                return None;
            }
        };

        topics.into_iter().find(|&id| match self.info(id) {
            Ok(info) => {
                info.name().is_ok_and(|n| n == name)
                    && info.str_field("data_type").is_ok_and(|t| t == data_type)
            }
            Err(err) => {
                tracing::debug!("Skipping topic {}: {}", id, err);
                false
            }
        })
    }
}
