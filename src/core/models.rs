// src/core/models.rs

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::{Display, EnumIter, EnumString};
use tokio::sync::mpsc;

// --- Reusable Result Types ---
// `Err` means the underlying lookup itself failed, `Ok(None)` means the
// lookup succeeded but the record is absent. The two must never be conflated:
// "failed to check" renders differently from "checked, not there".
pub type CheckResult<T> = Result<Option<T>, String>;

// --- DNS Records ---

/// The record types resolved for every audited domain, with their
/// DNS wire-format type codes as carried in DoH JSON answers.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    Serialize, Deserialize, Display, EnumString, EnumIter,
)]
pub enum RecordType {
    A,
    AAAA,
    NS,
    MX,
    SOA,
    CAA,
    TXT,
    DS,
}

impl RecordType {
    /// Numeric type code used on the wire and echoed back in DoH answers.
    pub fn code(self) -> u16 {
        match self {
            RecordType::A => 1,
            RecordType::NS => 2,
            RecordType::SOA => 6,
            RecordType::MX => 15,
            RecordType::TXT => 16,
            RecordType::AAAA => 28,
            RecordType::DS => 43,
            RecordType::CAA => 257,
        }
    }
}

/// One DNS-like answer as parsed from a provider response. Immutable once
/// produced; the `rtype` is the numeric code reported by the provider, which
/// for CNAME-chased answers may differ from the type that was queried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawAnswer {
    pub name: String,
    pub rtype: u16,
    pub data: String,
    pub ttl: u32,
}

// --- Derived Mail-Security Posture ---

/// The effective SPF record plus the two textual weaknesses checked for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpfReport {
    pub record: String,
    /// `+all` present: the policy authorizes every sender.
    pub permissive_all: bool,
    /// Neither `~all` nor `-all` present: no terminal qualifier.
    pub missing_terminal: bool,
}

/// Fields pattern-extracted from the `_dmarc` TXT record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DmarcReport {
    pub record: String,
    /// `p=` tag, lowercased; `"none?"` when absent or malformed.
    pub policy: String,
    /// `pct=` tag; `"100"` when absent.
    pub pct: String,
    /// `rua=` aggregate-report address, when present.
    pub rua: Option<String>,
    /// `aspf=` alignment mode (r/s); `"?"` when absent.
    pub aspf: String,
    /// `adkim=` alignment mode (r/s); `"?"` when absent.
    pub adkim: String,
}

// --- Domain Snapshot ---

/// The aggregate result of one audit's DNS phase.
///
/// `records` holds one entry per record type whose lookup settled
/// successfully (possibly with an empty answer list); types whose lookup
/// failed are simply absent. Derived fields follow the same discipline via
/// [`CheckResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainSnapshot {
    pub domain: String,
    pub records: BTreeMap<RecordType, Vec<RawAnswer>>,
    pub spf: CheckResult<SpfReport>,
    pub dmarc: CheckResult<DmarcReport>,
    /// `Some(true)` iff delegation signing was detected (non-empty DS answer
    /// or an authenticated-data flag from the resolver); `None` when the DS
    /// lookup failed and presence could not be determined.
    pub dnssec: Option<bool>,
}

impl DomainSnapshot {
    pub fn new(domain: &str) -> Self {
        Self {
            domain: domain.to_string(),
            records: BTreeMap::new(),
            spf: Ok(None),
            dmarc: Ok(None),
            dnssec: None,
        }
    }
}

// --- Side-Channel Results ---
// Each of these is independently nullable: `None` renders as "unavailable"
// with a manual link, never as an error.

/// Registration data summarized from an RDAP response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RdapSummary {
    pub ldh_name: Option<String>,
    pub registrar: Option<String>,
    pub registered: Option<String>,
    pub expires: Option<String>,
    pub updated: Option<String>,
    pub nameservers: Vec<String>,
}

/// HSTS preload list status for the domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreloadStatus {
    pub status: String,
    pub errors: Vec<String>,
}

/// HTTP Observatory scoring result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservatoryReport {
    pub grade: Option<String>,
    pub score: Option<i64>,
    pub tests_passed: Option<u32>,
    pub tests_failed: Option<u32>,
    pub tests_total: Option<u32>,
    pub scanned_at: Option<String>,
    pub details_url: String,
}

/// MTA-STS deployment: the `_mta-sts` TXT record and the fetched policy file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MtaStsReport {
    pub dns: Option<String>,
    pub policy: Option<String>,
}

impl MtaStsReport {
    pub fn is_empty(&self) -> bool {
        self.dns.is_none() && self.policy.is_none()
    }
}

/// A security.txt file and the host it was found on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityTxtFile {
    pub host: String,
    pub text: String,
}

/// Geolocation and network ownership for the domain's primary A record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IpInfo {
    pub ip: String,
    pub country: Option<String>,
    pub city: Option<String>,
    pub asn: Option<String>,
    pub org: Option<String>,
    pub isp: Option<String>,
}

/// One side-channel lookup settling, delivered as soon as it resolves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SideChannelUpdate {
    Rdap(Option<RdapSummary>),
    HstsPreload(Option<PreloadStatus>),
    Observatory(Option<ObservatoryReport>),
    MtaSts(Option<MtaStsReport>),
    TlsRpt(Option<String>),
    SecurityTxt(Option<SecurityTxtFile>),
    IpInfo(Option<IpInfo>),
}

// --- Findings ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

/// A machine-readable finding produced by snapshot analysis. The knowledge
/// base maps the code to human-readable title, description and remediation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnalysisFinding {
    pub severity: Severity,
    pub code: String,
}

impl AnalysisFinding {
    pub fn new(severity: Severity, code: &str) -> Self {
        Self {
            severity,
            code: code.to_string(),
        }
    }
}

// --- Audit Lifecycle ---

/// The aggregator's state machine. Reached exactly once per audit in order;
/// a new audit restarts from `NotStarted` under a fresh generation, and any
/// updates still arriving from the abandoned run are discarded by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditPhase {
    NotStarted,
    DnsInFlight,
    DnsSettled,
    SideChannelsInFlight,
    Complete,
}

/// Severity tags for the user-facing diagnostic log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum LogLevel {
    Ok,
    Info,
    Warn,
    Error,
}

/// One complete diagnostic log line. Entries are appended as independent
/// units; concurrent producers never interleave within an entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEvent {
    pub level: LogLevel,
    pub message: String,
    pub timestamp: DateTime<Local>,
}

/// Progressive-disclosure events emitted while an audit runs.
#[derive(Debug, Clone)]
pub enum AuditEvent {
    Phase(AuditPhase),
    Log(LogEvent),
    Dns(DomainSnapshot),
    Findings(Vec<AnalysisFinding>),
    SideChannel(SideChannelUpdate),
}

/// An [`AuditEvent`] tagged with the generation of the audit that produced
/// it, so the presentation layer can ignore stragglers from abandoned runs.
#[derive(Debug, Clone)]
pub struct AuditUpdate {
    pub generation: u64,
    pub event: AuditEvent,
}

// --- Reporter ---

/// Cloneable handle the audit tasks use to publish updates and log lines.
///
/// Sends are fire-and-forget: if the receiving side is gone (the audit was
/// abandoned) the update is silently dropped. Every log line is mirrored
/// into `tracing` for the file log.
#[derive(Debug, Clone)]
pub struct Reporter {
    tx: mpsc::UnboundedSender<AuditUpdate>,
    generation: u64,
}

impl Reporter {
    pub fn new(tx: mpsc::UnboundedSender<AuditUpdate>, generation: u64) -> Self {
        Self { tx, generation }
    }

    pub fn send(&self, event: AuditEvent) {
        let _ = self.tx.send(AuditUpdate {
            generation: self.generation,
            event,
        });
    }

    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            LogLevel::Ok | LogLevel::Info => tracing::info!("{message}"),
            LogLevel::Warn => tracing::warn!("{message}"),
            LogLevel::Error => tracing::error!("{message}"),
        }
        self.send(AuditEvent::Log(LogEvent {
            level,
            message,
            timestamp: Local::now(),
        }));
    }

    pub fn phase(&self, phase: AuditPhase) {
        self.send(AuditEvent::Phase(phase));
    }

    pub fn side_channel(&self, update: SideChannelUpdate) {
        self.send(AuditEvent::SideChannel(update));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_type_codes_match_wire_format() {
        assert_eq!(RecordType::A.code(), 1);
        assert_eq!(RecordType::AAAA.code(), 28);
        assert_eq!(RecordType::TXT.code(), 16);
        assert_eq!(RecordType::DS.code(), 43);
        assert_eq!(RecordType::CAA.code(), 257);
    }

    #[test]
    fn log_level_renders_uppercase() {
        assert_eq!(LogLevel::Warn.to_string(), "WARN");
        assert_eq!(LogLevel::Ok.to_string(), "OK");
    }

    #[test]
    fn fresh_snapshot_has_no_entries_and_unchecked_derived_fields() {
        let snapshot = DomainSnapshot::new("example.com");
        assert!(snapshot.records.is_empty());
        assert_eq!(snapshot.spf, Ok(None));
        assert_eq!(snapshot.dnssec, None);
    }
}
