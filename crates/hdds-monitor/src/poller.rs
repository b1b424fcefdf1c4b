// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Periodic participant snapshot.
//!
//! Independent of the discovery callbacks: every tick pulls the current
//! participant set, resolves node names and reports locators. Both paths
//! may describe the same participant at different times.

use crate::backend::StatisticsBackend;
use crate::correlator::{NodeNameResolver, Resolution};
use crate::entity::{render_locators, serialize_locators, EntityId, EntityInfo, EntityKind};
use crate::report::{Record, Reporter};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Handle to stop a running [`MonitorLoop`] from another thread.
///
/// The loop only checks it between ticks, after the sleep.
#[derive(Debug, Clone)]
pub struct StopHandle {
    running: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Request the loop to stop.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Default for StopHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// First line of every tick.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TickHeader {
    pub participants: usize,
}

impl fmt::Display for TickHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Participants size: {}", self.participants)
    }
}

impl Record for TickHeader {
    const KIND: &'static str = "tick";
}

/// Emitted once, on the tick that first resolves a participant.
#[derive(Debug, Clone, Serialize)]
pub struct NodeResolved {
    pub id: EntityId,
    pub guid: String,
    pub node_name: String,
}

impl fmt::Display for NodeResolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Participant with GUID {} found with name {}",
            self.guid, self.node_name
        )
    }
}

impl Record for NodeResolved {
    const KIND: &'static str = "resolved";
}

/// Per-participant line of a tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticipantReport {
    pub id: EntityId,
    pub guid: String,
    /// Resolved node name, empty while unresolved.
    pub node_name: String,
    /// Name currently advertised by the backend. Only fetched for
    /// participants already resolved; empty otherwise.
    pub display_name: String,
    /// `None` when the backend did not report locators.
    #[serde(serialize_with = "serialize_locators")]
    pub locators: Option<Value>,
}

impl fmt::Display for ParticipantReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Participant with GUID {} ({}) ({})",
            self.guid, self.node_name, self.display_name
        )?;
        write!(
            f,
            "Participant locators: {}",
            render_locators(self.locators.as_ref())
        )
    }
}

impl Record for ParticipantReport {
    const KIND: &'static str = "participant";
}

/// Polling loop state: the node name cache and the tick counter.
pub struct MonitorLoop {
    resolver: NodeNameResolver,
    reporter: Arc<Reporter>,
    interval: Duration,
    ticks: u64,
}

impl MonitorLoop {
    pub fn new(reporter: Arc<Reporter>, interval: Duration) -> Self {
        Self {
            resolver: NodeNameResolver::new(),
            reporter,
            interval,
            ticks: 0,
        }
    }

    pub fn resolver(&self) -> &NodeNameResolver {
        &self.resolver
    }

    /// Ticks completed so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Take one snapshot of the participant set and report it.
    pub fn tick(&mut self, backend: &dyn StatisticsBackend) -> Vec<ParticipantReport> {
        let participants = backend
            .entities(EntityKind::Participant)
            .unwrap_or_else(|err| {
                tracing::warn!("Participant enumeration failed: {}", err);
                Vec::new()
            });

        self.reporter.emit(&TickHeader {
            participants: participants.len(),
        });

        let reports: Vec<_> = participants
            .into_iter()
            .map(|id| self.report_participant(backend, id))
            .collect();

        self.ticks += 1;
        reports
    }

    fn report_participant(
        &mut self,
        backend: &dyn StatisticsBackend,
        id: EntityId,
    ) -> ParticipantReport {
        let info = backend.info(id).unwrap_or_else(|err| {
            tracing::warn!("Info lookup failed for participant {}: {}", id, err);
            EntityInfo::new()
        });
        let guid = info.str_or_not_found("guid");

        let (node_name, display_name) = match self.resolver.resolve(backend, id, &info) {
            Resolution::Cached(name) => {
                let display = info.name().map(str::to_string).unwrap_or_else(|err| {
                    tracing::debug!("Participant {} display name: {}", id, err);
                    String::new()
                });
                (name, display)
            }
            Resolution::Resolved(name) => {
                self.reporter.emit(&NodeResolved {
                    id,
                    guid: guid.clone(),
                    node_name: name.clone(),
                });
                (name, String::new())
            }
            Resolution::Unresolved => (String::new(), String::new()),
        };

        let report = ParticipantReport {
            id,
            guid,
            node_name,
            display_name,
            locators: info.locators().cloned(),
        };
        self.reporter.emit(&report);
        report
    }

    /// Tick, sleep, repeat until `stop` trips or `max_ticks` is reached.
    ///
    /// Returns the number of ticks run by this call.
    pub fn run(
        &mut self,
        backend: &dyn StatisticsBackend,
        stop: &StopHandle,
        max_ticks: Option<u64>,
    ) -> u64 {
        let mut ticks = 0;

        while stop.is_running() {
            self.tick(backend);
            ticks += 1;

            if max_ticks.is_some_and(|max| ticks >= max) {
                break;
            }

            std::thread::sleep(self.interval);
        }

        ticks
    }
}
