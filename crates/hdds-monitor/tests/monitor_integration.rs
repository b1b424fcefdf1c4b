// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! End-to-end monitor tests against in-process backends.

use hdds_monitor::{
    BackendError, DiscoveryListener, EntityId, EntityInfo, EntityKind, MemoryBackend, Monitor,
    MonitorConfig, MonitorError, OutputFormat, Reporter, StatisticsBackend, Topology, NOT_FOUND,
};
use hdds_monitor::{BufferOutput, MonitorState};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn config(max_ticks: u64) -> MonitorConfig {
    MonitorConfig {
        interval_secs: 1,
        max_ticks: Some(max_ticks),
        ..MonitorConfig::for_domain(0)
    }
}

fn text_monitor(
    backend: Arc<MemoryBackend>,
    max_ticks: u64,
) -> (Monitor<MemoryBackend>, BufferOutput) {
    let buffer = BufferOutput::new();
    let reporter = Arc::new(Reporter::with_writer(OutputFormat::Text, buffer.clone()));
    let monitor = Monitor::with_reporter(config(max_ticks), backend, reporter).expect("monitor");
    (monitor, buffer)
}

#[test]
fn resolves_robot1_and_reuses_cached_name() {
    let backend = Arc::new(MemoryBackend::new());
    let participant = backend.insert(
        EntityKind::Participant,
        EntityInfo::new()
            .with("guid", "abc123|0.0.1.1")
            .with("name", "/"),
    );
    backend.insert(
        EntityKind::DataReader,
        EntityInfo::new()
            .with("name", "DataReader_rq/robot1/get_parametersRequest_1.2.3.4")
            .with("guid", "abc123|0.0.2.2"),
    );

    let (mut monitor, buffer) = text_monitor(backend, 1);
    monitor.init().expect("init");

    let first = monitor.tick().expect("tick");
    assert_eq!(first[0].node_name, "robot1");
    assert_eq!(monitor.resolver().cached(participant), Some("robot1"));

    let second = monitor.tick().expect("tick");
    assert_eq!(second[0].node_name, "robot1");

    let out = buffer.contents();
    assert_eq!(out.matches("found with name robot1").count(), 1);
    assert!(out.contains("Participant with GUID abc123|0.0.1.1 (robot1) (/)"));
}

#[test]
fn discovery_and_polling_share_one_output() {
    let backend = Arc::new(MemoryBackend::new());
    let (mut monitor, buffer) = text_monitor(backend.clone(), 2);
    monitor.init().expect("init");

    let topology = Topology::from_json(
        &json!({
            "entities": [
                { "kind": "host", "info": { "name": "robot-pc" } },
                { "kind": "user", "info": { "name": "ros" } },
                { "kind": "process", "info": { "name": "talker:1234" } },
                { "kind": "participant", "info": {
                    "guid": "01.0f.22.33|0.0.1.c1",
                    "name": "/",
                    "kind": "Participant",
                    "alias": "talker",
                    "locators": ["UDPv4:[192.168.1.10]:7412"]
                } },
                { "kind": "topic", "info": {
                    "name": "rq/talker/get_parametersRequest",
                    "data_type": "rcl_interfaces::srv::dds_::GetParameters_Request_"
                } },
                { "kind": "data_reader", "info": {
                    "name": "DataReader_rq/talker/get_parametersRequest_0.0.1.2",
                    "guid": "01.0f.22.33|0.0.12.4"
                } },
                { "kind": "data_writer", "info": { "guid": "01.0f.22.33|0.0.13.3" } }
            ]
        })
        .to_string(),
    )
    .expect("topology");
    backend.load(&topology);

    assert_eq!(monitor.run().expect("run"), 2);
    assert_eq!(monitor.state(), MonitorState::Running);

    let out = buffer.contents();
    assert!(out.contains("Host robot-pc discovered."));
    assert!(out.contains("User ros discovered."));
    assert!(out.contains("Process talker:1234 discovered."));
    assert!(out.contains("Participant with GUID 01.0f.22.33|0.0.1.c1 discovered."));
    assert!(out.contains("Participant alias: talker"));
    assert!(out.contains(
        "Topic rq/talker/get_parametersRequest [rcl_interfaces::srv::dds_::GetParameters_Request_] discovered."
    ));
    assert!(out.contains("DataReader with GUID 01.0f.22.33|0.0.12.4 discovered."));
    assert!(out.contains("DataWriter with GUID 01.0f.22.33|0.0.13.3 discovered."));

    assert_eq!(out.matches("Participants size: 1").count(), 2);
    assert!(out.contains("Participant with GUID 01.0f.22.33|0.0.1.c1 found with name talker"));
    assert!(out.contains("Participant with GUID 01.0f.22.33|0.0.1.c1 (talker) ()"));
    assert!(out.contains("Participant with GUID 01.0f.22.33|0.0.1.c1 (talker) (/)"));
    assert!(out.contains("192.168.1.10"));
}

#[test]
fn participant_leaving_is_reported_as_update() {
    let backend = Arc::new(MemoryBackend::new());
    let (mut monitor, buffer) = text_monitor(backend.clone(), 1);
    monitor.init().expect("init");

    let p = backend.insert(
        EntityKind::Participant,
        EntityInfo::new().with("guid", "aa|0.0.1.1"),
    );
    backend.remove(p).expect("remove");

    let out = buffer.contents();
    assert!(out.contains("Participant with GUID aa|0.0.1.1 discovered."));
    assert!(out.contains("Participant with GUID aa|0.0.1.1 updated info."));

    let reports = monitor.tick().expect("tick");
    assert!(reports.is_empty());
}

/// Backend that refuses every monitor request and counts teardown calls.
#[derive(Default)]
struct UnavailableBackend {
    stops: AtomicUsize,
    listener_sets: AtomicUsize,
}

impl StatisticsBackend for UnavailableBackend {
    fn entities(&self, _kind: EntityKind) -> Result<Vec<EntityId>, BackendError> {
        Ok(Vec::new())
    }

    fn info(&self, id: EntityId) -> Result<EntityInfo, BackendError> {
        Err(BackendError::UnknownEntity(id))
    }

    fn start_monitor(&self, domain: u32) -> Result<EntityId, BackendError> {
        Err(BackendError::MonitorUnavailable {
            domain,
            reason: "no participant".into(),
        })
    }

    fn stop_monitor(&self, _monitor: EntityId) -> Result<(), BackendError> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn set_listener(&self, _listener: Option<Arc<dyn DiscoveryListener>>) {
        self.listener_sets.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn init_failure_blocks_run_and_teardown() {
    let backend = Arc::new(UnavailableBackend::default());
    let buffer = BufferOutput::new();
    let reporter = Arc::new(Reporter::with_writer(OutputFormat::Text, buffer.clone()));

    {
        let mut monitor =
            Monitor::with_reporter(config(1), backend.clone(), reporter).expect("monitor");
        assert!(matches!(
            monitor.init(),
            Err(MonitorError::Backend(BackendError::MonitorUnavailable { domain: 0, .. }))
        ));
        assert!(matches!(monitor.run(), Err(MonitorError::NotInitialized)));
    }

    assert_eq!(backend.stops.load(Ordering::SeqCst), 0);
    assert_eq!(backend.listener_sets.load(Ordering::SeqCst), 0);
    assert!(buffer.contents().is_empty());
}

#[test]
fn json_output_end_to_end() {
    let backend = Arc::new(MemoryBackend::new());
    let buffer = BufferOutput::new();
    let reporter = Arc::new(Reporter::with_writer(OutputFormat::Json, buffer.clone()));
    let mut monitor =
        Monitor::with_reporter(config(1), backend.clone(), reporter).expect("monitor");
    monitor.init().expect("init");

    backend.insert(
        EntityKind::Participant,
        EntityInfo::new()
            .with("guid", "bb|0.0.1.1")
            .with("locators", json!(["SHM:[_]:1"])),
    );
    backend.insert(
        EntityKind::Participant,
        EntityInfo::new().with("guid", "cc|0.0.1.1"),
    );
    monitor.run().expect("run");

    let records: Vec<serde_json::Value> = buffer
        .contents()
        .lines()
        .map(|line| serde_json::from_str(line).expect("json line"))
        .collect();

    let kinds: Vec<&str> = records
        .iter()
        .filter_map(|r| r["record"].as_str())
        .collect();
    assert_eq!(
        kinds,
        vec!["discovery", "discovery", "tick", "participant", "participant"]
    );
    assert_eq!(records[0]["participant"]["locators"][0], "SHM:[_]:1");
    assert_eq!(records[1]["participant"]["locators"], NOT_FOUND);
    assert_eq!(records[2]["participants"], 2);
    assert_eq!(records[3]["node_name"], "");
    assert_eq!(records[3]["locators"][0], "SHM:[_]:1");
    assert_eq!(records[4]["guid"], "cc|0.0.1.1");
    assert_eq!(records[4]["locators"], NOT_FOUND);
}
