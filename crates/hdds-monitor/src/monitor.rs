// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Monitor lifecycle.
//!
//! `Uninitialized -> Initialized -> Running`. [`Monitor::init`] registers
//! with the backend and installs the discovery listener;
//! [`Monitor::run`] drives the polling loop; teardown (explicit
//! [`Monitor::shutdown`] or `Drop`) releases the registration.

use crate::backend::{BackendError, StatisticsBackend};
use crate::config::{ConfigError, MonitorConfig};
use crate::correlator::NodeNameResolver;
use crate::entity::EntityId;
use crate::listener::{DiscoveryListener, ReportingListener};
use crate::poller::{MonitorLoop, ParticipantReport, StopHandle};
use crate::report::Reporter;
use std::sync::Arc;
use thiserror::Error;

/// Monitor errors.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Monitor already initialized (handle {0})")]
    AlreadyInitialized(EntityId),

    #[error("Monitor not initialized")]
    NotInitialized,

    #[error("Monitor already running")]
    AlreadyRunning,
}

/// Lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Uninitialized,
    Initialized,
    Running,
}

/// Live domain monitor.
///
/// The discovery listener is registered process-wide on the backend, so at
/// most one monitor per backend should be initialized at a time.
pub struct Monitor<B: StatisticsBackend> {
    config: MonitorConfig,
    backend: Arc<B>,
    listener: Arc<dyn DiscoveryListener>,
    poller: MonitorLoop,
    handle: EntityId,
    state: MonitorState,
    stop: StopHandle,
}

impl<B: StatisticsBackend> Monitor<B> {
    /// Create a monitor with an explicit discovery listener.
    pub fn new(
        config: MonitorConfig,
        backend: Arc<B>,
        listener: Arc<dyn DiscoveryListener>,
        reporter: Arc<Reporter>,
    ) -> Result<Self, MonitorError> {
        config.validate()?;
        let poller = MonitorLoop::new(reporter, config.interval());

        Ok(Self {
            config,
            backend,
            listener,
            poller,
            handle: EntityId::INVALID,
            state: MonitorState::Uninitialized,
            stop: StopHandle::new(),
        })
    }

    /// Create a monitor whose discovery events go to the same reporter as
    /// the polling loop.
    pub fn with_reporter(
        config: MonitorConfig,
        backend: Arc<B>,
        reporter: Arc<Reporter>,
    ) -> Result<Self, MonitorError> {
        let listener = Arc::new(ReportingListener::new(reporter.clone()));
        Self::new(config, backend, listener, reporter)
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// Backend monitor handle; invalid unless initialized.
    pub fn handle(&self) -> EntityId {
        self.handle
    }

    pub fn resolver(&self) -> &NodeNameResolver {
        self.poller.resolver()
    }

    /// Handle to stop [`run`](Self::run) from another thread.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Register with the backend for the configured domain.
    pub fn init(&mut self) -> Result<EntityId, MonitorError> {
        if self.handle.is_valid() {
            return Err(MonitorError::AlreadyInitialized(self.handle));
        }

        let handle = self.backend.start_monitor(self.config.domain)?;
        if !handle.is_valid() {
            return Err(BackendError::MonitorUnavailable {
                domain: self.config.domain,
                reason: "backend returned an invalid handle".into(),
            }
            .into());
        }

        self.backend.set_listener(Some(self.listener.clone()));
        self.handle = handle;
        self.state = MonitorState::Initialized;

        tracing::info!(
            domain = self.config.domain,
            handle = %handle,
            "Monitor initialized"
        );
        Ok(handle)
    }

    /// Run the polling loop until stopped or `max_ticks` is reached.
    ///
    /// Returns the number of ticks performed.
    pub fn run(&mut self) -> Result<u64, MonitorError> {
        match self.state {
            MonitorState::Uninitialized => return Err(MonitorError::NotInitialized),
            MonitorState::Running => return Err(MonitorError::AlreadyRunning),
            MonitorState::Initialized => {}
        }
        self.state = MonitorState::Running;

        tracing::info!(
            domain = self.config.domain,
            interval_secs = self.config.interval_secs,
            bins = self.config.bins,
            "Monitor running"
        );

        let ticks = self
            .poller
            .run(self.backend.as_ref(), &self.stop, self.config.max_ticks);

        tracing::info!(
            ticks,
            resolved = self.poller.resolver().len(),
            "Polling stopped"
        );
        Ok(ticks)
    }

    /// Single poll outside of [`run`](Self::run).
    pub fn tick(&mut self) -> Result<Vec<ParticipantReport>, MonitorError> {
        if self.state == MonitorState::Uninitialized {
            return Err(MonitorError::NotInitialized);
        }
        Ok(self.poller.tick(self.backend.as_ref()))
    }

    /// First topic with this name and data type.
    pub fn topic_id(&self, name: &str, data_type: &str) -> Option<EntityId> {
        self.backend.find_topic(name, data_type)
    }

    /// Clear the listener and stop backend monitoring. No-op when not
    /// initialized.
    pub fn shutdown(&mut self) -> Result<(), MonitorError> {
        if !self.handle.is_valid() {
            return Ok(());
        }

        let handle = std::mem::replace(&mut self.handle, EntityId::INVALID);
        self.state = MonitorState::Uninitialized;
        self.backend.set_listener(None);
        self.backend.stop_monitor(handle)?;

        tracing::info!(
            domain = self.config.domain,
            handle = %handle,
            "Monitor stopped"
        );
        Ok(())
    }
}

impl<B: StatisticsBackend> Drop for Monitor<B> {
    fn drop(&mut self) {
        if let Err(err) = self.shutdown() {
            tracing::warn!("Monitor teardown failed: {}", err);
        }
    }
}
