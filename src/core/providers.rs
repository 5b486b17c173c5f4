// src/core/providers.rs
//
// The fixed set of interchangeable DNS-over-HTTPS upstreams. Providers are
// stateless and registered once at startup; resolution strategy (racing,
// pinning, fallback) lives in `resolver.rs`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use url::Url;

use crate::core::error::{AuditError, AuditResult};
use crate::core::fetch;
use crate::core::models::{RawAnswer, RecordType};

/// Identifies one registered DoH upstream.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[strum(serialize_all = "lowercase")]
pub enum ProviderId {
    Google,
    Cloudflare,
    Quad9,
    AdGuard,
}

/// How a single resolution call selects among providers. Passed by value
/// into every call: changing the session's mode never affects requests
/// already in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveMode {
    /// Race every registered provider, first success wins.
    Auto,
    /// Call exactly one provider, with a single designated backup.
    Pinned(ProviderId),
}

impl ResolveMode {
    /// Step to the next mode: auto, then each provider in registration
    /// order, then back to auto.
    pub fn cycle(self) -> Self {
        match self {
            ResolveMode::Auto => ResolveMode::Pinned(ProviderId::Google),
            ResolveMode::Pinned(id) => {
                let mut ids = ProviderId::iter();
                ids.find(|candidate| *candidate == id);
                match ids.next() {
                    Some(next) => ResolveMode::Pinned(next),
                    None => ResolveMode::Auto,
                }
            }
        }
    }

    pub fn label(&self) -> String {
        match self {
            ResolveMode::Auto => "auto (race)".to_string(),
            ResolveMode::Pinned(id) => id.to_string(),
        }
    }
}

/// A parsed provider response: the answer section plus the resolver's
/// authenticated-data flag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DohResponse {
    pub answers: Vec<RawAnswer>,
    pub authenticated: bool,
}

/// One upstream implementation of the resolution capability.
#[async_trait]
pub trait DohProvider: Send + Sync {
    fn id(&self) -> ProviderId;

    /// Resolve `name`/`rtype` against this upstream, bounded by `timeout_ms`.
    async fn query(
        &self,
        name: &str,
        rtype: RecordType,
        timeout_ms: u64,
    ) -> AuditResult<DohResponse>;
}

// --- Wire format ---
// The Google/Cloudflare/Quad9/AdGuard JSON APIs all follow the same shape.

#[derive(Debug, Deserialize)]
struct DohWireResponse {
    #[serde(rename = "AD", default)]
    ad: bool,
    #[serde(rename = "Answer", default)]
    answer: Vec<DohWireAnswer>,
}

#[derive(Debug, Deserialize)]
struct DohWireAnswer {
    name: String,
    #[serde(rename = "type")]
    rtype: u16,
    data: String,
    #[serde(rename = "TTL", default)]
    ttl: u32,
}

impl From<DohWireResponse> for DohResponse {
    fn from(wire: DohWireResponse) -> Self {
        DohResponse {
            authenticated: wire.ad,
            answers: wire
                .answer
                .into_iter()
                .map(|a| RawAnswer {
                    name: a.name,
                    rtype: a.rtype,
                    data: a.data,
                    ttl: a.ttl,
                })
                .collect(),
        }
    }
}

// --- HTTP implementation ---

/// A DoH upstream speaking the `application/dns-json` GET API.
pub struct JsonDohProvider {
    id: ProviderId,
    endpoint: &'static str,
    client: reqwest::Client,
}

impl JsonDohProvider {
    pub fn new(id: ProviderId, endpoint: &'static str, client: reqwest::Client) -> Self {
        Self {
            id,
            endpoint,
            client,
        }
    }

    fn query_url(&self, name: &str, rtype: RecordType) -> AuditResult<Url> {
        Url::parse_with_params(
            self.endpoint,
            &[("name", name), ("type", &rtype.to_string())],
        )
        .map_err(|e| AuditError::Network(format!("bad query url: {e}")))
    }
}

#[async_trait]
impl DohProvider for JsonDohProvider {
    fn id(&self) -> ProviderId {
        self.id
    }

    async fn query(
        &self,
        name: &str,
        rtype: RecordType,
        timeout_ms: u64,
    ) -> AuditResult<DohResponse> {
        let url = self.query_url(name, rtype)?;
        let wire: DohWireResponse = fetch::fetch_json(
            &self.client,
            url.as_str(),
            Some("application/dns-json"),
            timeout_ms,
        )
        .await?;
        Ok(wire.into())
    }
}

// --- Registry ---

/// The process-wide provider set: read-only after construction, shared by
/// every in-flight resolution task.
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn DohProvider>>,
}

impl ProviderRegistry {
    /// The four public resolvers registered in fixed order. Registration
    /// order is also the sequential-sweep and backup order.
    pub fn standard(client: reqwest::Client) -> Self {
        let endpoints: [(ProviderId, &'static str); 4] = [
            (ProviderId::Google, "https://dns.google/resolve"),
            (ProviderId::Cloudflare, "https://cloudflare-dns.com/dns-query"),
            (ProviderId::Quad9, "https://dns.quad9.net:5053/dns-query"),
            (ProviderId::AdGuard, "https://dns.adguard-dns.com/resolve"),
        ];
        Self {
            providers: endpoints
                .into_iter()
                .map(|(id, endpoint)| {
                    Arc::new(JsonDohProvider::new(id, endpoint, client.clone()))
                        as Arc<dyn DohProvider>
                })
                .collect(),
        }
    }

    pub fn from_providers(providers: Vec<Arc<dyn DohProvider>>) -> Self {
        Self { providers }
    }

    pub fn all(&self) -> &[Arc<dyn DohProvider>] {
        &self.providers
    }

    pub fn get(&self, id: ProviderId) -> Option<Arc<dyn DohProvider>> {
        self.providers.iter().find(|p| p.id() == id).cloned()
    }

    /// The designated backup for a pinned provider: the next entry in
    /// registration order, wrapping around. `None` with fewer than two
    /// registered providers.
    pub fn backup_for(&self, id: ProviderId) -> Option<Arc<dyn DohProvider>> {
        if self.providers.len() < 2 {
            return None;
        }
        let index = self.providers.iter().position(|p| p.id() == id)?;
        let backup = &self.providers[(index + 1) % self.providers.len()];
        Some(Arc::clone(backup))
    }
}

// --- Test support ---

#[cfg(test)]
pub(crate) mod stub {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    type QueryFn =
        Box<dyn Fn(&str, RecordType, usize) -> AuditResult<DohResponse> + Send + Sync>;

    /// A scriptable provider for exercising resolution strategies without
    /// the network. The closure receives the query plus this provider's
    /// zero-based call count, so behavior may differ between attempts.
    pub struct StubProvider {
        id: ProviderId,
        delay: Duration,
        calls: AtomicUsize,
        respond: QueryFn,
    }

    impl StubProvider {
        pub fn new(
            id: ProviderId,
            delay: Duration,
            respond: impl Fn(&str, RecordType, usize) -> AuditResult<DohResponse>
            + Send
            + Sync
            + 'static,
        ) -> Self {
            Self {
                id,
                delay,
                calls: AtomicUsize::new(0),
                respond: Box::new(respond),
            }
        }
    }

    #[async_trait]
    impl DohProvider for StubProvider {
        fn id(&self) -> ProviderId {
            self.id
        }

        async fn query(
            &self,
            name: &str,
            rtype: RecordType,
            timeout_ms: u64,
        ) -> AuditResult<DohResponse> {
            let _ = timeout_ms;
            let attempt = self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            (self.respond)(name, rtype, attempt)
        }
    }

    pub fn answer(name: &str, rtype: RecordType, data: &str) -> RawAnswer {
        RawAnswer {
            name: name.to_string(),
            rtype: rtype.code(),
            data: data.to_string(),
            ttl: 300,
        }
    }

    pub fn response_with(answers: Vec<RawAnswer>) -> DohResponse {
        DohResponse {
            answers,
            authenticated: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_response_parses_answers_and_ad_flag() {
        let body = r#"{
            "Status": 0,
            "AD": true,
            "Answer": [
                {"name": "example.com.", "type": 1, "TTL": 3600, "data": "93.184.216.34"}
            ]
        }"#;
        let wire: DohWireResponse = serde_json::from_str(body).unwrap();
        let parsed: DohResponse = wire.into();
        assert!(parsed.authenticated);
        assert_eq!(parsed.answers.len(), 1);
        assert_eq!(parsed.answers[0].data, "93.184.216.34");
        assert_eq!(parsed.answers[0].ttl, 3600);
    }

    #[test]
    fn wire_response_tolerates_missing_answer_section() {
        let wire: DohWireResponse = serde_json::from_str(r#"{"Status": 3}"#).unwrap();
        let parsed: DohResponse = wire.into();
        assert!(parsed.answers.is_empty());
        assert!(!parsed.authenticated);
    }

    #[test]
    fn standard_registry_holds_four_providers_in_order() {
        let registry = ProviderRegistry::standard(reqwest::Client::new());
        let ids: Vec<ProviderId> = registry.all().iter().map(|p| p.id()).collect();
        assert_eq!(
            ids,
            vec![
                ProviderId::Google,
                ProviderId::Cloudflare,
                ProviderId::Quad9,
                ProviderId::AdGuard
            ]
        );
    }

    #[test]
    fn backup_is_next_in_registration_order_wrapping() {
        let registry = ProviderRegistry::standard(reqwest::Client::new());
        assert_eq!(
            registry.backup_for(ProviderId::Google).unwrap().id(),
            ProviderId::Cloudflare
        );
        assert_eq!(
            registry.backup_for(ProviderId::AdGuard).unwrap().id(),
            ProviderId::Google
        );
    }

    #[test]
    fn mode_cycle_walks_every_provider_then_returns_to_auto() {
        let mut mode = ResolveMode::Auto;
        let mut seen = Vec::new();
        for _ in 0..5 {
            mode = mode.cycle();
            seen.push(mode);
        }
        assert_eq!(seen.last(), Some(&ResolveMode::Auto));
        assert_eq!(seen[0], ResolveMode::Pinned(ProviderId::Google));
        assert_eq!(seen[3], ResolveMode::Pinned(ProviderId::AdGuard));
    }

    #[test]
    fn query_url_encodes_name_and_type() {
        let provider = JsonDohProvider::new(
            ProviderId::Google,
            "https://dns.google/resolve",
            reqwest::Client::new(),
        );
        let url = provider.query_url("example.com", RecordType::AAAA).unwrap();
        assert_eq!(
            url.as_str(),
            "https://dns.google/resolve?name=example.com&type=AAAA"
        );
    }
}
