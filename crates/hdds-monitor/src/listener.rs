// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Discovery event handling.
//!
//! The backend pushes one callback per discovered or updated entity. The
//! [`ReportingListener`] turns each of them into a [`DiscoveryRecord`] and
//! writes it through the shared [`Reporter`].
//!
//! # Thread Safety
//!
//! Callbacks run on a backend-owned thread. Listeners must be `Send + Sync`
//! and must not panic: every lookup failure degrades to
//! [`NOT_FOUND`](crate::entity::NOT_FOUND).

use crate::backend::StatisticsBackend;
use crate::entity::{
    render_locators, serialize_locators, DiscoveryEvent, DomainStatus, EntityId, EntityInfo,
    EntityKind,
};
use crate::report::{Record, Reporter};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Listener for backend discovery events.
///
/// All methods have default no-op implementations. Each callback receives
/// the backend that raised it so info can be looked up without the listener
/// owning the backend.
pub trait DiscoveryListener: Send + Sync {
    fn on_host_discovery(
        &self,
        backend: &dyn StatisticsBackend,
        host: EntityId,
        status: DomainStatus,
    ) {
        let _ = (backend, host, status);
    }

    fn on_user_discovery(
        &self,
        backend: &dyn StatisticsBackend,
        user: EntityId,
        status: DomainStatus,
    ) {
        let _ = (backend, user, status);
    }

    fn on_process_discovery(
        &self,
        backend: &dyn StatisticsBackend,
        process: EntityId,
        status: DomainStatus,
    ) {
        let _ = (backend, process, status);
    }

    fn on_topic_discovery(
        &self,
        backend: &dyn StatisticsBackend,
        domain: EntityId,
        topic: EntityId,
        status: DomainStatus,
    ) {
        let _ = (backend, domain, topic, status);
    }

    fn on_participant_discovery(
        &self,
        backend: &dyn StatisticsBackend,
        domain: EntityId,
        participant: EntityId,
        status: DomainStatus,
    ) {
        let _ = (backend, domain, participant, status);
    }

    fn on_datareader_discovery(
        &self,
        backend: &dyn StatisticsBackend,
        domain: EntityId,
        datareader: EntityId,
        status: DomainStatus,
    ) {
        let _ = (backend, domain, datareader, status);
    }

    fn on_datawriter_discovery(
        &self,
        backend: &dyn StatisticsBackend,
        domain: EntityId,
        datawriter: EntityId,
        status: DomainStatus,
    ) {
        let _ = (backend, domain, datawriter, status);
    }
}

/// Participant-only fields of a [`DiscoveryRecord`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticipantDetails {
    pub kind: String,
    pub name: String,
    pub alias: String,
    /// `None` when the backend did not report locators.
    #[serde(serialize_with = "serialize_locators")]
    pub locators: Option<Value>,
}

/// One rendered discovery event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscoveryRecord {
    pub kind: EntityKind,
    pub id: EntityId,
    pub event: DiscoveryEvent,
    pub name: String,
    pub guid: String,
    pub data_type: String,
    /// Name of the owning domain, for topic and participant events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participant: Option<ParticipantDetails>,
}

impl DiscoveryRecord {
    /// Build a record from whatever the backend returns for `id`.
    pub fn describe(
        backend: &dyn StatisticsBackend,
        kind: EntityKind,
        id: EntityId,
        status: DomainStatus,
    ) -> Self {
        let info = lookup(backend, id);

        let participant = (kind == EntityKind::Participant).then(|| ParticipantDetails {
            kind: info.str_or_not_found("kind"),
            name: info.str_or_not_found("name"),
            alias: info.str_or_not_found("alias"),
            locators: info.locators().cloned(),
        });

        Self {
            kind,
            id,
            event: status.event(),
            name: info.str_or_not_found("name"),
            guid: info.str_or_not_found("guid"),
            data_type: info.str_or_not_found("data_type"),
            domain: None,
            participant,
        }
    }

    /// Attach the owning domain's name.
    pub fn in_domain(mut self, backend: &dyn StatisticsBackend, domain: EntityId) -> Self {
        self.domain = Some(lookup(backend, domain).str_or_not_found("name"));
        self
    }
}

fn lookup(backend: &dyn StatisticsBackend, id: EntityId) -> EntityInfo {
    backend.info(id).unwrap_or_else(|err| {
        tracing::warn!("Info lookup failed for entity {}: {}", id, err);
        EntityInfo::new()
    })
}

impl fmt::Display for DiscoveryRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phrase = self.event.phrase();
        match self.kind {
            EntityKind::Topic => write!(f, "Topic {} [{}] {}", self.name, self.data_type, phrase),
            EntityKind::Participant | EntityKind::DataReader | EntityKind::DataWriter => {
                write!(f, "{} with GUID {} {}", self.kind, self.guid, phrase)?;
                if let Some(ref p) = self.participant {
                    writeln!(f)?;
                    writeln!(f, "Participant id: {}", self.id)?;
                    writeln!(f, "Participant kind: {}", p.kind)?;
                    writeln!(f, "Participant name: {}", p.name)?;
                    writeln!(f, "Participant alias: {}", p.alias)?;
                    write!(
                        f,
                        "Participant locators: {}",
                        render_locators(p.locators.as_ref())
                    )?;
                }
                Ok(())
            }
            _ => write!(f, "{} {} {}", self.kind, self.name, phrase),
        }
    }
}

impl Record for DiscoveryRecord {
    const KIND: &'static str = "discovery";
}

/// Stateless listener that reports every discovery event.
pub struct ReportingListener {
    reporter: Arc<Reporter>,
}

impl ReportingListener {
    pub fn new(reporter: Arc<Reporter>) -> Self {
        Self { reporter }
    }

    fn report(&self, record: DiscoveryRecord) {
        tracing::debug!(
            kind = %record.kind,
            id = %record.id,
            event = ?record.event,
            "Discovery event"
        );
        self.reporter.emit(&record);
    }
}

impl DiscoveryListener for ReportingListener {
    fn on_host_discovery(
        &self,
        backend: &dyn StatisticsBackend,
        host: EntityId,
        status: DomainStatus,
    ) {
        self.report(DiscoveryRecord::describe(
            backend,
            EntityKind::Host,
            host,
            status,
        ));
    }

    fn on_user_discovery(
        &self,
        backend: &dyn StatisticsBackend,
        user: EntityId,
        status: DomainStatus,
    ) {
        self.report(DiscoveryRecord::describe(
            backend,
            EntityKind::User,
            user,
            status,
        ));
    }

    fn on_process_discovery(
        &self,
        backend: &dyn StatisticsBackend,
        process: EntityId,
        status: DomainStatus,
    ) {
        self.report(DiscoveryRecord::describe(
            backend,
            EntityKind::Process,
            process,
            status,
        ));
    }

    fn on_topic_discovery(
        &self,
        backend: &dyn StatisticsBackend,
        domain: EntityId,
        topic: EntityId,
        status: DomainStatus,
    ) {
        self.report(
            DiscoveryRecord::describe(backend, EntityKind::Topic, topic, status)
                .in_domain(backend, domain),
        );
    }

    fn on_participant_discovery(
        &self,
        backend: &dyn StatisticsBackend,
        domain: EntityId,
        participant: EntityId,
        status: DomainStatus,
    ) {
        self.report(
            DiscoveryRecord::describe(backend, EntityKind::Participant, participant, status)
                .in_domain(backend, domain),
        );
    }

    fn on_datareader_discovery(
        &self,
        backend: &dyn StatisticsBackend,
        _domain: EntityId,
        datareader: EntityId,
        status: DomainStatus,
    ) {
        self.report(DiscoveryRecord::describe(
            backend,
            EntityKind::DataReader,
            datareader,
            status,
        ));
    }

    fn on_datawriter_discovery(
        &self,
        backend: &dyn StatisticsBackend,
        _domain: EntityId,
        datawriter: EntityId,
        status: DomainStatus,
    ) {
        self.report(DiscoveryRecord::describe(
            backend,
            EntityKind::DataWriter,
            datawriter,
            status,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::report::{BufferOutput, OutputFormat};
    use serde_json::json;

    fn reporting_backend(format: OutputFormat) -> (MemoryBackend, BufferOutput) {
        let buffer = BufferOutput::new();
        let reporter = Arc::new(Reporter::with_writer(format, buffer.clone()));
        let backend = MemoryBackend::new();
        backend.start_monitor(0).expect("monitor");
        backend.set_listener(Some(Arc::new(ReportingListener::new(reporter))));
        (backend, buffer)
    }

    #[test]
    fn test_host_discovered_and_updated() {
        let (backend, buffer) = reporting_backend(OutputFormat::Text);
        let host = backend.insert(EntityKind::Host, EntityInfo::new().with("name", "robot-pc"));
        backend
            .update(host, EntityInfo::new().with("name", "robot-pc"))
            .expect("update");

        let out = buffer.contents();
        assert!(out.contains("Host robot-pc discovered."));
        assert!(out.contains("Host robot-pc updated info."));
    }

    #[test]
    fn test_topic_record_includes_type_and_domain() {
        let backend = MemoryBackend::new();
        let domain = backend.start_monitor(3).expect("monitor");
        let topic = backend.insert(
            EntityKind::Topic,
            EntityInfo::new()
                .with("name", "rt/chatter")
                .with("data_type", "std_msgs::msg::dds_::String_"),
        );

        let record = DiscoveryRecord::describe(
            &backend,
            EntityKind::Topic,
            topic,
            DomainStatus::with_change(1),
        )
        .in_domain(&backend, domain);

        assert_eq!(record.domain.as_deref(), Some("3"));
        assert_eq!(
            record.to_string(),
            "Topic rt/chatter [std_msgs::msg::dds_::String_] discovered."
        );
    }

    #[test]
    fn test_participant_record_without_locators() {
        let (backend, buffer) = reporting_backend(OutputFormat::Text);
        backend.insert(
            EntityKind::Participant,
            EntityInfo::new()
                .with("guid", "01.0f.aa.bb|0.0.1.c1")
                .with("name", "/talker")
                .with("kind", "Participant"),
        );

        let out = buffer.contents();
        assert!(out.contains("Participant with GUID 01.0f.aa.bb|0.0.1.c1 discovered."));
        assert!(out.contains("Participant name: /talker"));
        assert!(out.contains("Participant alias: Not found"));
        assert!(out.contains("Participant locators: Not found"));
    }

    #[test]
    fn test_participant_record_with_locators() {
        let backend = MemoryBackend::new();
        let id = backend.insert(
            EntityKind::Participant,
            EntityInfo::new()
                .with("guid", "aa|bb")
                .with("locators", json!(["UDPv4:[10.0.0.2]:7412"])),
        );

        let record = DiscoveryRecord::describe(
            &backend,
            EntityKind::Participant,
            id,
            DomainStatus::with_change(0),
        );
        let text = record.to_string();
        assert!(text.starts_with("Participant with GUID aa|bb updated info."));
        assert!(text.contains("UDPv4:[10.0.0.2]:7412"));
    }

    #[test]
    fn test_endpoint_records() {
        let backend = MemoryBackend::new();
        let reader = backend.insert(
            EntityKind::DataReader,
            EntityInfo::new().with("guid", "r1|0.0.1.4"),
        );
        let writer = backend.insert(EntityKind::DataWriter, EntityInfo::new().with("guid", 12));

        let reader_record = DiscoveryRecord::describe(
            &backend,
            EntityKind::DataReader,
            reader,
            DomainStatus::with_change(1),
        );
        let writer_record = DiscoveryRecord::describe(
            &backend,
            EntityKind::DataWriter,
            writer,
            DomainStatus::with_change(-1),
        );

        assert_eq!(
            reader_record.to_string(),
            "DataReader with GUID r1|0.0.1.4 discovered."
        );
        assert_eq!(
            writer_record.to_string(),
            "DataWriter with GUID Not found updated info."
        );
    }

    #[test]
    fn test_unknown_entity_degrades_to_not_found() {
        let backend = MemoryBackend::new();
        let record = DiscoveryRecord::describe(
            &backend,
            EntityKind::User,
            EntityId::new(999),
            DomainStatus::with_change(1),
        );
        assert_eq!(record.to_string(), "User Not found discovered.");
    }

    #[test]
    fn test_json_discovery_record() {
        let (backend, buffer) = reporting_backend(OutputFormat::Json);
        backend.insert(
            EntityKind::Process,
            EntityInfo::new().with("name", "talker:4242"),
        );

        let out = buffer.contents();
        let value: Value = serde_json::from_str(out.trim()).expect("json");
        assert_eq!(value["record"], "discovery");
        assert_eq!(value["kind"], "process");
        assert_eq!(value["event"], "discovered");
        assert_eq!(value["name"], "talker:4242");
    }
}
