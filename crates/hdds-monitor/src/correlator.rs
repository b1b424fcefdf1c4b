// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Participant to node name correlation.
//!
//! ROS 2 nodes do not advertise their name on the participant itself, but
//! every node creates a parameter service whose request reader is named
//! `DataReader_rq/<node>/get_parametersRequest_<a.b.c.d>`. The reader and
//! its participant share a GUID prefix, which is what ties the two together.

use crate::backend::{BackendError, StatisticsBackend};
use crate::entity::{EntityId, EntityInfo, EntityKind, FieldError};
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;
use thiserror::Error;

const REQUEST_TOPIC_PATTERN: &str =
    r"^DataReader_rq/(.+)/get_parametersRequest_[0-9]+\.[0-9]+\.[0-9]+\.[0-9]+$";

fn request_topic_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(REQUEST_TOPIC_PATTERN).expect("request topic pattern is valid"))
}

/// Node name embedded in a parameter request reader name, if any.
pub fn node_name_from_topic(topic_name: &str) -> Option<&str> {
    request_topic_regex()
        .captures(topic_name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Identity-bearing part of a GUID string: everything before the first `|`.
pub fn guid_prefix(guid: &str) -> &str {
    match guid.find('|') {
        Some(pos) => &guid[..pos],
        None => guid,
    }
}

/// Outcome of [`NodeNameResolver::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Served from the cache, no scan.
    Cached(String),
    /// Found by this call's scan and now cached.
    Resolved(String),
    /// No request reader matched; try again next tick.
    Unresolved,
}

impl Resolution {
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Cached(name) | Self::Resolved(name) => Some(name),
            Self::Unresolved => None,
        }
    }
}

#[derive(Debug, Error)]
enum CandidateError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Field(#[from] FieldError),
}

/// Resolves and caches node names per participant.
///
/// Names are never evicted: once a participant is resolved it keeps its
/// name for the resolver's lifetime.
#[derive(Debug, Default)]
pub struct NodeNameResolver {
    cache: HashMap<EntityId, String>,
}

impl NodeNameResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached name for `participant`, without scanning.
    pub fn cached(&self, participant: EntityId) -> Option<&str> {
        self.cache.get(&participant).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Resolve the node name of `participant`.
    ///
    /// Scans every data reader on a cache miss; the first reader whose name
    /// matches the request pattern and whose GUID prefix equals the
    /// participant's wins. Ambiguous matches are not reported.
    pub fn resolve(
        &mut self,
        backend: &dyn StatisticsBackend,
        participant: EntityId,
        participant_info: &EntityInfo,
    ) -> Resolution {
        if let Some(name) = self.cache.get(&participant) {
            return Resolution::Cached(name.clone());
        }

        let participant_guid = match participant_info.guid() {
            Ok(guid) => guid,
            Err(err) => {
                tracing::warn!("Participant {}: {}", participant, err);
                return Resolution::Unresolved;
            }
        };
        let prefix = guid_prefix(participant_guid);

        let readers = match backend.entities(EntityKind::DataReader) {
            Ok(readers) => readers,
            Err(err) => {
                tracing::warn!("Data reader enumeration failed: {}", err);
                return Resolution::Unresolved;
            }
        };

        for reader in readers {
            match match_candidate(backend, reader, prefix) {
                Ok(Some(name)) => {
                    tracing::info!(
                        participant = %participant,
                        guid = participant_guid,
                        node = %name,
                        "Node name resolved"
                    );
                    self.cache.insert(participant, name.clone());
                    return Resolution::Resolved(name);
                }
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!("Skipping data reader {}: {}", reader, err);
                }
            }
        }

        tracing::debug!(participant = %participant, "No request reader matches");
        Resolution::Unresolved
    }
}

fn match_candidate(
    backend: &dyn StatisticsBackend,
    reader: EntityId,
    participant_prefix: &str,
) -> Result<Option<String>, CandidateError> {
    let info = backend.info(reader)?;
    let node = match node_name_from_topic(info.name()?) {
        Some(node) => node,
        None => return Ok(None),
    };

    if guid_prefix(info.guid()?) == participant_prefix {
        Ok(Some(node.to_string()))
    } else {
        Ok(None)
    }
}
