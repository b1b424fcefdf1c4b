// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! HDDS Domain Monitor
//!
//! Live view of a DDS domain built on top of a statistics backend:
//! participants, their locators, and the ROS 2 node name behind each
//! participant.
//!
//! # Features
//!
//! - **Node name correlation**: Match participants to ROS 2 node names via
//!   the GUID prefix of their parameter request readers
//! - **Discovery reporting**: One record per host, user, process, topic,
//!   participant, reader and writer discovery or update
//! - **Periodic snapshots**: Participant set, node names and locators every
//!   polling interval
//! - **Text or JSON output**
//!
//! # Quick Start
//!
//! ```bash
//! # Monitor domain 0 every 5 seconds
//! hdds-monitor --domain 0
//!
//! # Replay a recorded topology, three ticks, JSON output
//! hdds-monitor --topology domain.json --max-ticks 3 --format json
//!
//! # Using config file
//! hdds-monitor --config monitor.toml
//! ```
//!
//! # Library Usage
//!
//! ```rust
//! use hdds_monitor::{MemoryBackend, Monitor, MonitorConfig, OutputFormat, Reporter};
//! use std::sync::Arc;
//!
//! let backend = Arc::new(MemoryBackend::new());
//! let reporter = Arc::new(Reporter::stdout(OutputFormat::Text));
//! let mut config = MonitorConfig::for_domain(0);
//! config.max_ticks = Some(1);
//!
//! let mut monitor = Monitor::with_reporter(config, backend, reporter)?;
//! monitor.init()?;
//! monitor.run()?;
//! # Ok::<(), hdds_monitor::MonitorError>(())
//! ```

pub mod backend;
pub mod config;
pub mod correlator;
pub mod entity;
pub mod listener;
pub mod monitor;
pub mod poller;
pub mod report;

pub use backend::{BackendError, MemoryBackend, StatisticsBackend, Topology, TopologyEntry};
pub use config::{ConfigError, MonitorConfig};
pub use correlator::{guid_prefix, node_name_from_topic, NodeNameResolver, Resolution};
pub use entity::{
    DiscoveryEvent, DomainStatus, EntityId, EntityInfo, EntityKind, FieldError, NOT_FOUND,
};
pub use listener::{DiscoveryListener, DiscoveryRecord, ParticipantDetails, ReportingListener};
pub use monitor::{Monitor, MonitorError, MonitorState};
pub use poller::{MonitorLoop, NodeResolved, ParticipantReport, StopHandle, TickHeader};
pub use report::{BufferOutput, OutputFormat, Record, Reporter};
