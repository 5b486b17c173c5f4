// src/core/scanner/dns_scanner.rs

use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::debug;

use crate::core::config::AuditConfig;
use crate::core::error::AuditResult;
use crate::core::models::{
    AnalysisFinding, DomainSnapshot, LogLevel, RawAnswer, RecordType, Reporter, Severity,
};
use crate::core::providers::{DohResponse, ProviderRegistry};
use crate::core::resolver;
use crate::core::scanner::posture;

/// The record types fanned out for every audited domain.
pub const RECORD_TYPES: [RecordType; 8] = [
    RecordType::A,
    RecordType::AAAA,
    RecordType::NS,
    RecordType::MX,
    RecordType::SOA,
    RecordType::CAA,
    RecordType::TXT,
    RecordType::DS,
];

/// Resolve every record type for `domain` concurrently and merge the results
/// into one snapshot.
///
/// Each record type is an independent task running the full race/fallback
/// strategy; a failure on one type never cancels or blocks its siblings. The
/// fan-out settles only when every task has settled, then the `_dmarc` TXT
/// lookup result and the derived SPF/DMARC/DNSSEC fields are merged in.
pub async fn run_dns_fanout(
    registry: &Arc<ProviderRegistry>,
    config: &AuditConfig,
    reporter: &Reporter,
    domain: &str,
) -> DomainSnapshot {
    debug!(domain, "starting DNS fan-out");

    let mut tasks: JoinSet<(RecordType, AuditResult<DohResponse>)> = JoinSet::new();
    for rtype in RECORD_TYPES {
        let registry = Arc::clone(registry);
        let reporter = reporter.clone();
        let name = domain.to_string();
        let mode = config.mode;
        let timeout_ms = config.timeout_ms;
        tasks.spawn(async move {
            let outcome =
                resolver::resolve(&registry, mode, &reporter, &name, rtype, timeout_ms).await;
            (rtype, outcome)
        });
    }

    let dmarc_name = format!("_dmarc.{domain}");
    let dmarc_lookup = resolver::resolve(
        registry,
        config.mode,
        reporter,
        &dmarc_name,
        RecordType::TXT,
        config.timeout_ms,
    );

    let (outcomes, dmarc_outcome) = tokio::join!(drain_fanout(tasks, reporter), dmarc_lookup);

    let mut snapshot = DomainSnapshot::new(domain);
    let mut txt_error = None;
    let mut ds_error = None;
    let mut ds_authenticated = false;

    for (rtype, outcome) in outcomes {
        match outcome {
            Ok(response) => {
                if rtype == RecordType::DS {
                    ds_authenticated = response.authenticated;
                }
                log_answers(reporter, rtype, &response.answers);
                snapshot.records.insert(rtype, response.answers);
            }
            Err(err) => {
                // Address and delegation records are the primary signal;
                // everything else is reported at informational level and
                // simply left absent.
                let level = match rtype {
                    RecordType::A | RecordType::AAAA | RecordType::NS => LogLevel::Warn,
                    _ => LogLevel::Info,
                };
                reporter.log(level, format!("{rtype}: {err}"));
                match rtype {
                    RecordType::TXT => txt_error = Some(err.to_string()),
                    RecordType::DS => ds_error = Some(err.to_string()),
                    _ => {}
                }
            }
        }
    }

    merge_derived(&mut snapshot, reporter, txt_error, ds_error, ds_authenticated);
    merge_dmarc(&mut snapshot, reporter, dmarc_outcome);
    debug!(domain, "DNS fan-out settled");
    snapshot
}

async fn drain_fanout(
    mut tasks: JoinSet<(RecordType, AuditResult<DohResponse>)>,
    reporter: &Reporter,
) -> Vec<(RecordType, AuditResult<DohResponse>)> {
    let mut outcomes = Vec::with_capacity(RECORD_TYPES.len());
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(outcome) => outcomes.push(outcome),
            Err(join_err) => {
                reporter.log(LogLevel::Warn, format!("record lookup aborted: {join_err}"));
            }
        }
    }
    outcomes
}

fn log_answers(reporter: &Reporter, rtype: RecordType, answers: &[RawAnswer]) {
    let separator = if rtype == RecordType::MX { " | " } else { ", " };
    let joined = answers
        .iter()
        .map(|a| a.data.as_str())
        .collect::<Vec<_>>()
        .join(separator);
    let shown = if joined.is_empty() { "-" } else { joined.as_str() };
    reporter.log(LogLevel::Ok, format!("{rtype}: {shown}"));
}

/// Compute SPF and DNSSEC from the merged records. Derived fields stay
/// unknown (not "false") when the underlying lookup failed.
fn merge_derived(
    snapshot: &mut DomainSnapshot,
    reporter: &Reporter,
    txt_error: Option<String>,
    ds_error: Option<String>,
    ds_authenticated: bool,
) {
    snapshot.spf = match (snapshot.records.get(&RecordType::TXT), txt_error) {
        (Some(answers), _) => {
            let values = posture::txt_values(answers);
            let report = posture::extract_spf(&values);
            match &report {
                Some(spf) => {
                    reporter.log(LogLevel::Ok, format!("SPF: {}", spf.record));
                    if spf.permissive_all {
                        reporter.log(LogLevel::Warn, "SPF is wide open (+all)");
                    }
                    if spf.missing_terminal {
                        reporter
                            .log(LogLevel::Warn, "SPF has no terminal qualifier (~all or -all)");
                    }
                }
                None => reporter.log(LogLevel::Warn, "SPF: not found"),
            }
            Ok(report)
        }
        (None, Some(err)) => Err(err),
        (None, None) => Err("TXT lookup did not settle".to_string()),
    };

    snapshot.dnssec = match (snapshot.records.get(&RecordType::DS), ds_error) {
        (Some(answers), _) => {
            let detected = posture::dnssec_detected(answers, ds_authenticated);
            if detected {
                reporter.log(LogLevel::Ok, "DNSSEC: DS present");
            } else {
                reporter.log(LogLevel::Warn, "DNSSEC: not detected");
            }
            Some(detected)
        }
        (None, _) => None,
    };
}

fn merge_dmarc(
    snapshot: &mut DomainSnapshot,
    reporter: &Reporter,
    outcome: AuditResult<DohResponse>,
) {
    snapshot.dmarc = match outcome {
        Ok(response) => {
            let values = posture::txt_values(&response.answers);
            let report = posture::extract_dmarc(&values);
            match &report {
                Some(dmarc) => {
                    let rua = dmarc
                        .rua
                        .as_deref()
                        .map(|r| format!(", rua={r}"))
                        .unwrap_or_default();
                    reporter.log(
                        LogLevel::Ok,
                        format!(
                            "DMARC: p={}, pct={}{rua}, aspf={}, adkim={}",
                            dmarc.policy, dmarc.pct, dmarc.aspf, dmarc.adkim
                        ),
                    );
                    if dmarc.policy == "none" {
                        reporter.log(
                            LogLevel::Warn,
                            "DMARC is p=none, consider quarantine or reject",
                        );
                    }
                }
                None => reporter.log(LogLevel::Warn, "DMARC: not found"),
            }
            Ok(report)
        }
        Err(err) => {
            reporter.log(LogLevel::Info, format!("DMARC: {err}"));
            Err(err.to_string())
        }
    };
}

/// Analyze a settled snapshot into severity-tagged findings.
///
/// Findings are only raised for checks that actually settled: a failed
/// lookup is diagnostic noise, not evidence of a missing control.
pub fn analyze_snapshot(snapshot: &DomainSnapshot) -> Vec<AnalysisFinding> {
    let mut findings = Vec::new();

    if snapshot.dnssec == Some(false) {
        findings.push(AnalysisFinding::new(Severity::Warning, "DNS_DNSSEC_MISSING"));
    }

    if let Some(caa) = snapshot.records.get(&RecordType::CAA)
        && caa.is_empty()
    {
        findings.push(AnalysisFinding::new(Severity::Info, "DNS_CAA_MISSING"));
    }

    match &snapshot.spf {
        Ok(Some(spf)) => {
            if spf.permissive_all {
                findings.push(AnalysisFinding::new(
                    Severity::Warning,
                    "MAIL_SPF_ALL_PERMISSIVE",
                ));
            }
            if spf.missing_terminal {
                findings.push(AnalysisFinding::new(Severity::Warning, "MAIL_SPF_NO_TERMINAL"));
            }
        }
        Ok(None) => findings.push(AnalysisFinding::new(Severity::Warning, "MAIL_SPF_MISSING")),
        Err(_) => {}
    }

    match &snapshot.dmarc {
        Ok(Some(dmarc)) => {
            if dmarc.policy == "none" {
                findings.push(AnalysisFinding::new(
                    Severity::Warning,
                    "MAIL_DMARC_POLICY_NONE",
                ));
            }
        }
        Ok(None) => findings.push(AnalysisFinding::new(Severity::Critical, "MAIL_DMARC_MISSING")),
        Err(_) => {}
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::AuditError;
    use crate::core::models::AuditUpdate;
    use crate::core::providers::stub::{StubProvider, answer, response_with};
    use crate::core::providers::{DohProvider, ProviderId};
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn reporter() -> (Reporter, mpsc::UnboundedReceiver<AuditUpdate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Reporter::new(tx, 1), rx)
    }

    /// A single all-knowing provider answering every record type with fixed
    /// data, including the `_dmarc` subdomain.
    fn fixture_registry() -> Arc<ProviderRegistry> {
        let provider = StubProvider::new(
            ProviderId::Google,
            Duration::from_millis(1),
            |name, rtype, _| {
                if name.starts_with("_dmarc.") {
                    return Ok(response_with(vec![answer(
                        name,
                        RecordType::TXT,
                        "\"v=DMARC1; p=none; pct=50; rua=mailto:d@example.com\"",
                    )]));
                }
                let answers = match rtype {
                    RecordType::A => vec![answer(name, rtype, "93.184.216.34")],
                    RecordType::TXT => {
                        vec![answer(name, rtype, "\"v=spf1 include:_spf.example.com ~all\"")]
                    }
                    RecordType::DS => vec![],
                    _ => vec![answer(name, rtype, "stub-data")],
                };
                Ok(response_with(answers))
            },
        );
        Arc::new(ProviderRegistry::from_providers(vec![
            Arc::new(provider) as Arc<dyn DohProvider>,
        ]))
    }

    #[tokio::test(start_paused = true)]
    async fn fanout_merges_every_settled_record_type() {
        let registry = fixture_registry();
        let (reporter, _rx) = reporter();
        let config = AuditConfig::default();

        let snapshot = run_dns_fanout(&registry, &config, &reporter, "example.com").await;
        for rtype in RECORD_TYPES {
            assert!(snapshot.records.contains_key(&rtype), "{rtype} missing");
        }
        assert_eq!(snapshot.records[&RecordType::A][0].data, "93.184.216.34");
    }

    #[tokio::test(start_paused = true)]
    async fn empty_ds_answer_yields_dnssec_false_not_unknown() {
        let registry = fixture_registry();
        let (reporter, _rx) = reporter();
        let config = AuditConfig::default();

        let snapshot = run_dns_fanout(&registry, &config, &reporter, "example.com").await;
        assert_eq!(snapshot.dnssec, Some(false));
    }

    #[tokio::test(start_paused = true)]
    async fn fanout_is_idempotent_against_fixed_providers() {
        let registry = fixture_registry();
        let (reporter, _rx) = reporter();
        let config = AuditConfig::default();

        let first = run_dns_fanout(&registry, &config, &reporter, "example.com").await;
        let second = run_dns_fanout(&registry, &config, &reporter, "example.com").await;
        assert_eq!(first, second);
    }

    #[tokio::test(start_paused = true)]
    async fn one_failing_record_type_never_blocks_the_others() {
        let provider = StubProvider::new(
            ProviderId::Google,
            Duration::from_millis(1),
            |name, rtype, _| match rtype {
                RecordType::MX => Err(AuditError::Network("filtered".to_string())),
                _ => Ok(response_with(vec![answer(name, rtype, "stub-data")])),
            },
        );
        let registry = Arc::new(ProviderRegistry::from_providers(vec![
            Arc::new(provider) as Arc<dyn DohProvider>,
        ]));
        let (reporter, _rx) = reporter();
        let config = AuditConfig::default();

        let snapshot = run_dns_fanout(&registry, &config, &reporter, "example.com").await;
        assert!(!snapshot.records.contains_key(&RecordType::MX));
        for rtype in RECORD_TYPES.into_iter().filter(|t| *t != RecordType::MX) {
            assert!(snapshot.records.contains_key(&rtype), "{rtype} missing");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn failed_txt_lookup_leaves_spf_unknown() {
        let provider = StubProvider::new(
            ProviderId::Google,
            Duration::from_millis(1),
            |name, rtype, _| match (name.starts_with("_dmarc."), rtype) {
                (false, RecordType::TXT) => Err(AuditError::Timeout(9000)),
                _ => Ok(response_with(vec![answer(name, rtype, "stub-data")])),
            },
        );
        let registry = Arc::new(ProviderRegistry::from_providers(vec![
            Arc::new(provider) as Arc<dyn DohProvider>,
        ]));
        let (reporter, _rx) = reporter();
        let config = AuditConfig::default();

        let snapshot = run_dns_fanout(&registry, &config, &reporter, "example.com").await;
        assert!(snapshot.spf.is_err());
        // An unknown SPF must not produce a "missing SPF" finding.
        let codes: Vec<String> = analyze_snapshot(&snapshot)
            .into_iter()
            .map(|f| f.code)
            .collect();
        assert!(!codes.contains(&"MAIL_SPF_MISSING".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn fixture_snapshot_extracts_posture_and_advisories() {
        let registry = fixture_registry();
        let (reporter, _rx) = reporter();
        let config = AuditConfig::default();

        let snapshot = run_dns_fanout(&registry, &config, &reporter, "example.com").await;
        let spf = snapshot.spf.as_ref().unwrap().as_ref().unwrap();
        assert_eq!(spf.record, "v=spf1 include:_spf.example.com ~all");
        assert!(!spf.permissive_all);
        assert!(!spf.missing_terminal);

        let dmarc = snapshot.dmarc.as_ref().unwrap().as_ref().unwrap();
        assert_eq!(dmarc.policy, "none");
        assert_eq!(dmarc.pct, "50");

        let codes: Vec<String> = analyze_snapshot(&snapshot)
            .into_iter()
            .map(|f| f.code)
            .collect();
        assert!(codes.contains(&"MAIL_DMARC_POLICY_NONE".to_string()));
        assert!(codes.contains(&"DNS_DNSSEC_MISSING".to_string()));
    }
}
