// src/core/scanner/extras_scanner.rs
//
// Side channels that go straight to well-known HTTP endpoints or to
// policy-specific DNS names: the HSTS preload list, the HTTP Observatory,
// MTA-STS, TLS-RPT, and security.txt.

use std::sync::Arc;

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::core::error::AuditResult;
use crate::core::fetch;
use crate::core::models::{
    MtaStsReport, ObservatoryReport, PreloadStatus, RecordType, Reporter, SecurityTxtFile,
};
use crate::core::providers::{ProviderRegistry, ResolveMode};
use crate::core::resolver;
use crate::core::scanner::posture;

const OBSERVATORY_API: &str = "https://http-observatory.security.mozilla.org/api/v1";

#[derive(Deserialize)]
struct PreloadWire {
    status: String,
    #[serde(default)]
    errors: Vec<PreloadIssue>,
}

#[derive(Deserialize)]
struct PreloadIssue {
    #[serde(default)]
    summary: String,
}

/// Check whether the domain is on (or eligible for) the Chromium HSTS
/// preload list.
pub async fn run_hsts_preload(
    client: &Client,
    timeout_ms: u64,
    domain: &str,
) -> AuditResult<PreloadStatus> {
    let url = format!("https://hstspreload.org/api/v2/status?domain={domain}");
    let wire: PreloadWire = fetch::fetch_json(client, &url, None, timeout_ms).await?;
    Ok(PreloadStatus {
        status: wire.status,
        errors: wire
            .errors
            .into_iter()
            .map(|e| e.summary)
            .filter(|s| !s.is_empty())
            .collect(),
    })
}

#[derive(Deserialize)]
struct ObservatoryWire {
    #[serde(default)]
    grade: Option<String>,
    #[serde(default)]
    score: Option<i64>,
    #[serde(default, alias = "tests_passed")]
    tests_passed: Option<u32>,
    #[serde(default, alias = "tests_failed")]
    tests_failed: Option<u32>,
    #[serde(default, alias = "tests_quantity")]
    tests_total: Option<u32>,
    #[serde(default, alias = "end_time")]
    scanned_at: Option<String>,
}

/// Ask the Mozilla HTTP Observatory for the domain's most recent scan.
///
/// A fresh analysis is kicked off first so a later audit sees current data,
/// but its outcome is ignored; only the cached `getHost` result is shown.
pub async fn run_observatory(
    client: &Client,
    timeout_ms: u64,
    domain: &str,
) -> AuditResult<ObservatoryReport> {
    let analyze = format!("{OBSERVATORY_API}/analyze?host={domain}");
    let _ = fetch::fetch_text(client, &analyze, timeout_ms).await;

    let url = format!("{OBSERVATORY_API}/getHost?host={domain}");
    let wire: ObservatoryWire = fetch::fetch_json(client, &url, None, timeout_ms).await?;
    Ok(ObservatoryReport {
        grade: wire.grade,
        score: wire.score,
        tests_passed: wire.tests_passed,
        tests_failed: wire.tests_failed,
        tests_total: wire.tests_total,
        scanned_at: wire.scanned_at,
        details_url: format!("https://observatory.mozilla.org/analyze/{domain}"),
    })
}

/// Look for an MTA-STS deployment: the `_mta-sts` TXT record plus the policy
/// file served from the `mta-sts` subdomain (with the apex as a fallback for
/// misconfigured hosts).
pub async fn run_mta_sts(
    registry: &Arc<ProviderRegistry>,
    mode: ResolveMode,
    client: &Client,
    timeout_ms: u64,
    reporter: &Reporter,
    domain: &str,
) -> AuditResult<MtaStsReport> {
    let mut report = MtaStsReport::default();

    let name = format!("_mta-sts.{domain}");
    match resolver::resolve(registry, mode, reporter, &name, RecordType::TXT, timeout_ms).await {
        Ok(response) => {
            report.dns = posture::txt_values(&response.answers)
                .into_iter()
                .find(|v| v.to_ascii_lowercase().starts_with("v=sts"));
        }
        Err(e) => debug!(domain, "MTA-STS TXT lookup failed: {e}"),
    }

    for host in [format!("mta-sts.{domain}"), domain.to_string()] {
        let url = format!("https://{host}/.well-known/mta-sts.txt");
        if let Ok(body) = fetch::fetch_text(client, &url, timeout_ms).await
            && body.to_ascii_lowercase().contains("version:")
        {
            report.policy = Some(body.trim().to_string());
            break;
        }
    }

    Ok(report)
}

/// Resolve the `_smtp._tls` TXT record carrying the TLS-RPT policy.
pub async fn run_tls_rpt(
    registry: &Arc<ProviderRegistry>,
    mode: ResolveMode,
    timeout_ms: u64,
    reporter: &Reporter,
    domain: &str,
) -> AuditResult<Option<String>> {
    let name = format!("_smtp._tls.{domain}");
    let response =
        resolver::resolve(registry, mode, reporter, &name, RecordType::TXT, timeout_ms).await?;
    let values = posture::txt_values(&response.answers);
    if values.is_empty() {
        Ok(None)
    } else {
        Ok(Some(values.join(" ")))
    }
}

/// Fetch `/.well-known/security.txt`, preferring the apex and falling back to
/// the `www` host.
pub async fn run_security_txt(
    client: &Client,
    timeout_ms: u64,
    domain: &str,
) -> AuditResult<SecurityTxtFile> {
    let mut last_err = None;
    for host in [domain.to_string(), format!("www.{domain}")] {
        let url = format!("https://{host}/.well-known/security.txt");
        match fetch::fetch_text(client, &url, timeout_ms).await {
            Ok(body) if looks_like_security_txt(&body) => {
                return Ok(SecurityTxtFile {
                    host,
                    text: body.trim().to_string(),
                });
            }
            Ok(_) => last_err = Some(crate::core::error::AuditError::Parse(
                "response is not a security.txt file".into(),
            )),
            Err(e) => last_err = Some(e),
        }
    }
    Err(last_err.unwrap_or_else(|| {
        crate::core::error::AuditError::Network("security.txt unreachable".into())
    }))
}

/// Some servers answer every path with an HTML landing page; require at
/// least one of the fields RFC 9116 defines.
fn looks_like_security_txt(body: &str) -> bool {
    let lower = body.to_ascii_lowercase();
    !lower.contains("<html")
        && ["contact:", "expires:", "policy:", "encryption:"]
            .iter()
            .any(|field| lower.contains(field))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn security_txt_detection_rejects_html_landing_pages() {
        assert!(looks_like_security_txt(
            "Contact: mailto:security@example.com\nExpires: 2027-01-01T00:00:00Z\n"
        ));
        assert!(!looks_like_security_txt(
            "<html><body>404 not found</body></html>"
        ));
        assert!(!looks_like_security_txt("hello world"));
    }

    #[tokio::test(start_paused = true)]
    async fn tls_rpt_absent_when_no_txt_answers() {
        use crate::core::providers::stub::{response_with, StubProvider};
        use crate::core::providers::ProviderId;
        use std::time::Duration;
        use tokio::sync::mpsc;

        let registry = Arc::new(ProviderRegistry::from_providers(vec![Arc::new(
            StubProvider::new(ProviderId::Google, Duration::ZERO, |_, _, _| {
                Ok(response_with(vec![]))
            }),
        )]));
        let (tx, _rx) = mpsc::unbounded_channel();
        let reporter = Reporter::new(tx, 1);

        let rpt = run_tls_rpt(&registry, ResolveMode::Auto, 1000, &reporter, "example.com")
            .await
            .unwrap();
        assert_eq!(rpt, None);
    }

    #[tokio::test(start_paused = true)]
    async fn tls_rpt_joins_txt_values() {
        use crate::core::providers::stub::{answer, response_with, StubProvider};
        use crate::core::providers::ProviderId;
        use std::time::Duration;
        use tokio::sync::mpsc;

        let registry = Arc::new(ProviderRegistry::from_providers(vec![Arc::new(
            StubProvider::new(ProviderId::Google, Duration::ZERO, |name, rtype, _| {
                Ok(response_with(vec![answer(
                    name,
                    rtype,
                    "\"v=TLSRPTv1; rua=mailto:tlsrpt@example.com\"",
                )]))
            }),
        )]));
        let (tx, _rx) = mpsc::unbounded_channel();
        let reporter = Reporter::new(tx, 1);

        let rpt = run_tls_rpt(&registry, ResolveMode::Auto, 1000, &reporter, "example.com")
            .await
            .unwrap();
        assert_eq!(
            rpt.as_deref(),
            Some("v=TLSRPTv1; rua=mailto:tlsrpt@example.com")
        );
    }
}
