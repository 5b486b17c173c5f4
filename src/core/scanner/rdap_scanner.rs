// src/core/scanner/rdap_scanner.rs

use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::core::error::AuditResult;
use crate::core::fetch;
use crate::core::models::RdapSummary;

/// Query the rdap.org bootstrap service for the domain's registration data
/// and summarize the interesting fields.
///
/// RDAP frequently fails from constrained clients (unsupported TLDs, rate
/// limits); the caller treats any failure as "unavailable" and offers the
/// manual link instead.
pub async fn run_rdap_scan(
    client: &Client,
    timeout_ms: u64,
    domain: &str,
) -> AuditResult<RdapSummary> {
    let url = format!("https://rdap.org/domain/{domain}");
    debug!(domain, "querying RDAP");
    let body: Value = fetch::fetch_json(client, &url, None, timeout_ms).await?;
    Ok(summarize_rdap(&body))
}

/// Pull the display fields out of a raw RDAP document. Tolerant of partial
/// documents: every field is independently optional.
pub fn summarize_rdap(rdap: &Value) -> RdapSummary {
    let ldh_name = rdap
        .get("ldhName")
        .or_else(|| rdap.get("handle"))
        .and_then(Value::as_str)
        .map(str::to_string);

    let registrar = rdap
        .get("entities")
        .and_then(Value::as_array)
        .and_then(|entities| {
            entities.iter().find(|e| {
                e.get("roles")
                    .and_then(Value::as_array)
                    .is_some_and(|roles| roles.iter().any(|r| r.as_str() == Some("registrar")))
            })
        })
        .and_then(|registrar| {
            vcard_full_name(registrar)
                .or_else(|| registrar.get("handle").and_then(Value::as_str).map(str::to_string))
        });

    let mut registered = None;
    let mut expires = None;
    let mut updated = None;
    if let Some(events) = rdap.get("events").and_then(Value::as_array) {
        for event in events {
            let action = event.get("eventAction").and_then(Value::as_str);
            let date = event
                .get("eventDate")
                .and_then(Value::as_str)
                .map(str::to_string);
            match action {
                Some("registration" | "registered") => registered = registered.or(date),
                Some("expiration" | "expire") => expires = expires.or(date),
                Some("last changed" | "lastchanged" | "last update of RDAP database") => {
                    updated = updated.or(date);
                }
                _ => {}
            }
        }
    }

    let nameservers = rdap
        .get("nameservers")
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(|ns| {
                    ns.get("ldhName")
                        .or_else(|| ns.get("handle"))
                        .and_then(Value::as_str)
                        .map(str::to_lowercase)
                })
                .collect()
        })
        .unwrap_or_default();

    RdapSummary {
        ldh_name,
        registrar,
        registered,
        expires,
        updated,
        nameservers,
    }
}

/// Dig the formatted name (`fn`) out of a jCard array:
/// `["vcard", [["fn", {}, "text", "Registrar Inc."], ...]]`.
fn vcard_full_name(entity: &Value) -> Option<String> {
    entity
        .get("vcardArray")
        .and_then(Value::as_array)?
        .get(1)
        .and_then(Value::as_array)?
        .iter()
        .find(|prop| {
            prop.as_array()
                .and_then(|p| p.first())
                .and_then(Value::as_str)
                == Some("fn")
        })
        .and_then(|prop| prop.get(3))
        .and_then(Value::as_str)
        .map(str::to_string)
}
