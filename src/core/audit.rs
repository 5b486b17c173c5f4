// src/core/audit.rs
//
// Top-level audit orchestration: domain normalization, the phase state
// machine, and the soft deadline that keeps fast mode responsive while
// slow side channels finish in the background.

use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use tokio::task::JoinSet;
use tracing::debug;
use url::Url;

use crate::core::config::AuditConfig;
use crate::core::error::{AuditError, AuditResult};
use crate::core::models::{
    AuditEvent, AuditPhase, LogLevel, RecordType, Reporter, SideChannelUpdate,
};
use crate::core::providers::ProviderRegistry;
use crate::core::scanner::{dns_scanner, extras_scanner, ip_scanner, rdap_scanner};

static RE_DOMAIN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9.-]+\.[a-z]{2,}$").expect("domain regex"));

/// Turn whatever the user typed into a bare lowercase domain, or explain
/// why it cannot be audited. Accepts full URLs and strips scheme, path,
/// port, and a single trailing dot.
pub fn normalize_domain(input: &str) -> AuditResult<String> {
    let trimmed = input.trim().to_lowercase();
    if trimmed.is_empty() {
        return Err(AuditError::Validation("enter a domain to audit".into()));
    }

    let host = if trimmed.contains("://") {
        Url::parse(&trimmed)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .ok_or_else(|| AuditError::Validation(format!("cannot parse '{trimmed}' as a URL")))?
    } else {
        trimmed
            .split(['/', '?', '#'])
            .next()
            .unwrap_or_default()
            .split(':')
            .next()
            .unwrap_or_default()
            .to_string()
    };
    let host = host.strip_suffix('.').unwrap_or(&host);

    if RE_DOMAIN.is_match(host) {
        Ok(host.to_string())
    } else {
        Err(AuditError::Validation(format!(
            "'{host}' does not look like a registrable domain"
        )))
    }
}

/// Run one complete audit, publishing progress through the reporter.
///
/// Phase order is fixed: side channels launch immediately, the DNS fan-out
/// runs to completion, then the IP lookup (which needs an A record) joins
/// the side-channel set and everything is drained, subject to the fast-mode
/// deadline.
pub async fn run_audit(
    registry: Arc<ProviderRegistry>,
    client: Client,
    config: AuditConfig,
    domain: String,
    reporter: Reporter,
) {
    reporter.phase(AuditPhase::DnsInFlight);
    reporter.log(LogLevel::Info, format!("audit started for {domain}"));

    let mut side_channels: JoinSet<SideChannelUpdate> = JoinSet::new();
    spawn_side_channels(&mut side_channels, &registry, &client, &config, &domain, &reporter);

    let snapshot = dns_scanner::run_dns_fanout(&registry, &config, &reporter, &domain).await;
    reporter.phase(AuditPhase::DnsSettled);

    let findings = dns_scanner::analyze_snapshot(&snapshot);
    if findings.is_empty() {
        reporter.log(LogLevel::Ok, "analysis: no issues found");
    } else {
        reporter.log(
            LogLevel::Info,
            format!("analysis: {} finding(s)", findings.len()),
        );
    }

    let primary_a = snapshot
        .records
        .get(&RecordType::A)
        .and_then(|answers| answers.first())
        .map(|a| a.data.clone());
    reporter.send(AuditEvent::Dns(snapshot));
    reporter.send(AuditEvent::Findings(findings));

    match primary_a {
        Some(ip) => {
            let client = client.clone();
            let timeout_ms = config.timeout_ms;
            let reporter_ip = reporter.clone();
            side_channels.spawn(async move {
                let info = match ip_scanner::run_ip_scan(&client, timeout_ms, &ip).await {
                    Ok(info) => {
                        reporter_ip.log(
                            LogLevel::Ok,
                            format!(
                                "IP {}: {} ({})",
                                info.ip,
                                info.org.as_deref().unwrap_or("unknown org"),
                                info.asn.as_deref().unwrap_or("AS?")
                            ),
                        );
                        Some(info)
                    }
                    Err(e) => {
                        reporter_ip.log(LogLevel::Warn, format!("IP lookup failed: {e}"));
                        None
                    }
                };
                SideChannelUpdate::IpInfo(info)
            });
        }
        None => {
            reporter.send(AuditEvent::SideChannel(SideChannelUpdate::IpInfo(None)));
            reporter.log(LogLevel::Info, "no A record, skipping IP lookup");
        }
    }

    reporter.phase(AuditPhase::SideChannelsInFlight);
    let deadline = config
        .fast_mode
        .then(|| Duration::from_millis(config.fast_deadline_ms));
    drain_side_channels(side_channels, deadline, &reporter).await;

    reporter.phase(AuditPhase::Complete);
    reporter.log(LogLevel::Ok, format!("audit complete for {domain}"));
}

fn spawn_side_channels(
    set: &mut JoinSet<SideChannelUpdate>,
    registry: &Arc<ProviderRegistry>,
    client: &Client,
    config: &AuditConfig,
    domain: &str,
    reporter: &Reporter,
) {
    let timeout_ms = config.timeout_ms;
    let mode = config.mode;

    {
        let client = client.clone();
        let domain = domain.to_string();
        let reporter = reporter.clone();
        set.spawn(async move {
            let summary = match rdap_scanner::run_rdap_scan(&client, timeout_ms, &domain).await {
                Ok(summary) => {
                    reporter.log(LogLevel::Ok, "RDAP: registration data received");
                    Some(summary)
                }
                Err(e) => {
                    reporter.log(LogLevel::Warn, format!("RDAP unavailable: {e}"));
                    None
                }
            };
            SideChannelUpdate::Rdap(summary)
        });
    }

    {
        let client = client.clone();
        let domain = domain.to_string();
        let reporter = reporter.clone();
        set.spawn(async move {
            let status =
                match extras_scanner::run_hsts_preload(&client, timeout_ms, &domain).await {
                    Ok(status) => {
                        reporter.log(
                            LogLevel::Info,
                            format!("HSTS preload: {}", status.status),
                        );
                        Some(status)
                    }
                    Err(e) => {
                        reporter.log(LogLevel::Warn, format!("HSTS preload check failed: {e}"));
                        None
                    }
                };
            SideChannelUpdate::HstsPreload(status)
        });
    }

    {
        let client = client.clone();
        let domain = domain.to_string();
        let reporter = reporter.clone();
        set.spawn(async move {
            let report =
                match extras_scanner::run_observatory(&client, timeout_ms, &domain).await {
                    Ok(report) => {
                        if let Some(grade) = &report.grade {
                            reporter.log(LogLevel::Info, format!("Observatory grade: {grade}"));
                        }
                        Some(report)
                    }
                    Err(e) => {
                        reporter.log(LogLevel::Warn, format!("Observatory unavailable: {e}"));
                        None
                    }
                };
            SideChannelUpdate::Observatory(report)
        });
    }

    {
        let registry = Arc::clone(registry);
        let client = client.clone();
        let domain = domain.to_string();
        let reporter = reporter.clone();
        set.spawn(async move {
            let report = match extras_scanner::run_mta_sts(
                &registry, mode, &client, timeout_ms, &reporter, &domain,
            )
            .await
            {
                Ok(report) if !report.is_empty() => {
                    reporter.log(LogLevel::Ok, "MTA-STS: deployment detected");
                    Some(report)
                }
                Ok(_) => {
                    reporter.log(LogLevel::Info, "MTA-STS: not deployed");
                    None
                }
                Err(e) => {
                    reporter.log(LogLevel::Warn, format!("MTA-STS check failed: {e}"));
                    None
                }
            };
            SideChannelUpdate::MtaSts(report)
        });
    }

    {
        let registry = Arc::clone(registry);
        let domain = domain.to_string();
        let reporter = reporter.clone();
        set.spawn(async move {
            let record = match extras_scanner::run_tls_rpt(
                &registry, mode, timeout_ms, &reporter, &domain,
            )
            .await
            {
                Ok(Some(record)) => {
                    reporter.log(LogLevel::Ok, "TLS-RPT: policy published");
                    Some(record)
                }
                Ok(None) => {
                    reporter.log(LogLevel::Info, "TLS-RPT: no policy");
                    None
                }
                Err(e) => {
                    reporter.log(LogLevel::Warn, format!("TLS-RPT check failed: {e}"));
                    None
                }
            };
            SideChannelUpdate::TlsRpt(record)
        });
    }

    {
        let client = client.clone();
        let domain = domain.to_string();
        let reporter = reporter.clone();
        set.spawn(async move {
            let file =
                match extras_scanner::run_security_txt(&client, timeout_ms, &domain).await {
                    Ok(file) => {
                        reporter.log(
                            LogLevel::Ok,
                            format!("security.txt found on {}", file.host),
                        );
                        Some(file)
                    }
                    Err(e) => {
                        reporter.log(LogLevel::Info, format!("security.txt: {e}"));
                        None
                    }
                };
            SideChannelUpdate::SecurityTxt(file)
        });
    }
}

/// Forward side-channel results as they settle. With a deadline, whatever
/// has not settled by then is detached so it can still finish (and be
/// dropped) in the background while the audit reports complete.
async fn drain_side_channels(
    mut set: JoinSet<SideChannelUpdate>,
    deadline: Option<Duration>,
    reporter: &Reporter,
) {
    match deadline {
        None => {
            while let Some(joined) = set.join_next().await {
                match joined {
                    Ok(update) => reporter.side_channel(update),
                    Err(e) => debug!("side channel panicked: {e}"),
                }
            }
        }
        Some(limit) => {
            let cutoff = tokio::time::sleep(limit);
            tokio::pin!(cutoff);
            loop {
                tokio::select! {
                    joined = set.join_next() => match joined {
                        Some(Ok(update)) => reporter.side_channel(update),
                        Some(Err(e)) => debug!("side channel panicked: {e}"),
                        None => break,
                    },
                    () = &mut cutoff => {
                        let stragglers = set.len();
                        if stragglers > 0 {
                            reporter.log(
                                LogLevel::Info,
                                format!(
                                    "fast mode: {stragglers} slow check(s) left behind after {}ms",
                                    limit.as_millis()
                                ),
                            );
                        }
                        set.detach_all();
                        break;
                    }
                }
            }
        }
    }
}
