// src/core/scanner/ip_scanner.rs

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::core::error::{AuditError, AuditResult};
use crate::core::fetch;
use crate::core::models::IpInfo;

#[derive(Deserialize)]
struct IpwhoWire {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    ip: Option<String>,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    connection: Option<IpwhoConnection>,
}

#[derive(Deserialize, Default)]
struct IpwhoConnection {
    #[serde(default)]
    asn: Option<u64>,
    #[serde(default)]
    org: Option<String>,
    #[serde(default)]
    isp: Option<String>,
}

/// Look up geolocation and network ownership for an address via ipwho.is.
/// The free tier needs no key; `success: false` in the body signals refusal
/// (rate limit, bogon, reserved range).
pub async fn run_ip_scan(client: &Client, timeout_ms: u64, ip: &str) -> AuditResult<IpInfo> {
    let url = format!("https://ipwho.is/{ip}?fields=success,message,ip,country,city,connection");
    debug!(ip, "querying ipwho.is");
    let wire: IpwhoWire = fetch::fetch_json(client, &url, None, timeout_ms).await?;

    if !wire.success {
        let reason = wire.message.unwrap_or_else(|| "lookup refused".to_string());
        return Err(AuditError::Network(format!("ipwho.is: {reason}")));
    }

    let connection = wire.connection.unwrap_or_default();
    Ok(IpInfo {
        ip: wire.ip.unwrap_or_else(|| ip.to_string()),
        country: wire.country,
        city: wire.city,
        asn: connection.asn.map(|n| format!("AS{n}")),
        org: connection.org,
        isp: connection.isp,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_maps_to_ip_info() {
        let body = r#"{
            "success": true,
            "ip": "93.184.216.34",
            "country": "United States",
            "city": "Norwell",
            "connection": {"asn": 15133, "org": "Edgecast Inc.", "isp": "Verizon"}
        }"#;
        let wire: IpwhoWire = serde_json::from_str(body).unwrap();
        assert!(wire.success);
        let connection = wire.connection.unwrap();
        assert_eq!(connection.asn, Some(15133));
        assert_eq!(connection.org.as_deref(), Some("Edgecast Inc."));
    }

    #[test]
    fn refusal_carries_the_service_message() {
        let body = r#"{"success": false, "message": "Reserved range"}"#;
        let wire: IpwhoWire = serde_json::from_str(body).unwrap();
        assert!(!wire.success);
        assert_eq!(wire.message.as_deref(), Some("Reserved range"));
    }
}
