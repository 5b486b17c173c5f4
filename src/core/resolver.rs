// src/core/resolver.rs
//
// Race/fallback resolution over the provider registry. "First success wins":
// a provider settling early with a failure never decides the outcome while
// other racers are still in flight.

use std::sync::Arc;
use tokio::task::JoinSet;

use crate::core::error::{AuditError, AuditResult};
use crate::core::models::{LogLevel, RecordType, Reporter};
use crate::core::providers::{DohProvider, DohResponse, ProviderRegistry, ResolveMode};

/// Resolve `name`/`rtype` according to `mode`.
///
/// Auto mode races every registered provider and returns the first
/// successful settlement; losers are discarded. If the whole race fails, a
/// final sequential sweep walks the full registry in registration order.
/// Pinned mode calls the named provider and, on failure, its single
/// designated backup.
pub async fn resolve(
    registry: &Arc<ProviderRegistry>,
    mode: ResolveMode,
    reporter: &Reporter,
    name: &str,
    rtype: RecordType,
    timeout_ms: u64,
) -> AuditResult<DohResponse> {
    match mode {
        ResolveMode::Auto => race_all(registry, reporter, name, rtype, timeout_ms).await,
        ResolveMode::Pinned(id) => {
            let provider = registry.get(id).ok_or_else(|| {
                AuditError::Validation(format!("unknown provider: {id}"))
            })?;
            match provider.query(name, rtype, timeout_ms).await {
                Ok(response) => Ok(response),
                Err(err) => {
                    reporter.log(
                        LogLevel::Info,
                        format!("{id} failed for {rtype} {name}: {err}"),
                    );
                    let Some(backup) = registry.backup_for(id) else {
                        return Err(err);
                    };
                    let backup_id = backup.id();
                    backup.query(name, rtype, timeout_ms).await.map_err(|e| {
                        reporter.log(
                            LogLevel::Warn,
                            format!("backup {backup_id} also failed for {rtype} {name}: {e}"),
                        );
                        e
                    })
                }
            }
        }
    }
}

async fn race_all(
    registry: &Arc<ProviderRegistry>,
    reporter: &Reporter,
    name: &str,
    rtype: RecordType,
    timeout_ms: u64,
) -> AuditResult<DohResponse> {
    let mut racers: JoinSet<(crate::core::providers::ProviderId, AuditResult<DohResponse>)> =
        JoinSet::new();
    for provider in registry.all() {
        let provider = Arc::clone(provider);
        let name = name.to_string();
        racers.spawn(async move {
            let outcome = provider.query(&name, rtype, timeout_ms).await;
            (provider.id(), outcome)
        });
    }

    let mut last_error = AuditError::Network("no providers registered".to_string());
    while let Some(joined) = racers.join_next().await {
        match joined {
            Ok((id, Ok(response))) => {
                reporter.log(LogLevel::Info, format!("{rtype} {name}: {id} won the race"));
                // Dropping the set aborts the remaining racers; their
                // results, had they arrived, would be discarded anyway.
                return Ok(response);
            }
            Ok((id, Err(err))) => {
                reporter.log(
                    LogLevel::Info,
                    format!("{id} lost the race for {rtype} {name}: {err}"),
                );
                last_error = err;
            }
            Err(join_err) => {
                reporter.log(
                    LogLevel::Warn,
                    format!("provider task for {rtype} {name} aborted: {join_err}"),
                );
                last_error = AuditError::Network(join_err.to_string());
            }
        }
    }

    // Every racer failed: one last-resort sweep over the full provider list,
    // sequentially, in registration order.
    reporter.log(
        LogLevel::Warn,
        format!("all providers failed the race for {rtype} {name}; sweeping sequentially"),
    );
    sweep(registry.all(), reporter, name, rtype, timeout_ms, last_error).await
}

async fn sweep(
    providers: &[Arc<dyn DohProvider>],
    reporter: &Reporter,
    name: &str,
    rtype: RecordType,
    timeout_ms: u64,
    mut last_error: AuditError,
) -> AuditResult<DohResponse> {
    for provider in providers {
        match provider.query(name, rtype, timeout_ms).await {
            Ok(response) => {
                reporter.log(
                    LogLevel::Info,
                    format!("{rtype} {name}: recovered by {} on sweep", provider.id()),
                );
                return Ok(response);
            }
            Err(err) => last_error = err,
        }
    }
    Err(last_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::AuditUpdate;
    use crate::core::providers::stub::{StubProvider, answer, response_with};
    use crate::core::providers::ProviderId;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn reporter() -> (Reporter, mpsc::UnboundedReceiver<AuditUpdate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Reporter::new(tx, 1), rx)
    }

    fn registry_of(providers: Vec<StubProvider>) -> Arc<ProviderRegistry> {
        Arc::new(ProviderRegistry::from_providers(
            providers
                .into_iter()
                .map(|p| Arc::new(p) as Arc<dyn DohProvider>)
                .collect(),
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn race_prefers_first_success_over_first_settlement() {
        // The fast provider fails at 10ms; the slow one succeeds at 50ms.
        // The race must wait out the early failure and return the success.
        let slow_ok = StubProvider::new(ProviderId::Google, Duration::from_millis(50), |n, t, _| {
            Ok(response_with(vec![answer(n, t, "93.184.216.34")]))
        });
        let fast_err =
            StubProvider::new(ProviderId::Cloudflare, Duration::from_millis(10), |_, _, _| {
                Err(AuditError::Http(503))
            });
        let registry = registry_of(vec![slow_ok, fast_err]);
        let (reporter, _rx) = reporter();

        let result = resolve(
            &registry,
            ResolveMode::Auto,
            &reporter,
            "example.com",
            RecordType::A,
            9000,
        )
        .await
        .unwrap();
        assert_eq!(result.answers[0].data, "93.184.216.34");
    }

    #[tokio::test(start_paused = true)]
    async fn failed_race_falls_back_to_sequential_sweep() {
        // Both providers fail their first attempt; the second provider
        // succeeds on retry. The sweep must recover the lookup.
        let always_err =
            StubProvider::new(ProviderId::Google, Duration::from_millis(5), |_, _, _| {
                Err(AuditError::Network("unreachable".to_string()))
            });
        let flaky =
            StubProvider::new(ProviderId::Cloudflare, Duration::from_millis(5), |n, t, call| {
                if call == 0 {
                    Err(AuditError::Timeout(9000))
                } else {
                    Ok(response_with(vec![answer(n, t, "2606:2800:220:1::1")]))
                }
            });
        let registry = registry_of(vec![always_err, flaky]);
        let (reporter, _rx) = reporter();

        let result = resolve(
            &registry,
            ResolveMode::Auto,
            &reporter,
            "example.com",
            RecordType::AAAA,
            9000,
        )
        .await
        .unwrap();
        assert_eq!(result.answers[0].data, "2606:2800:220:1::1");
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_sweep_surfaces_the_last_failure() {
        let registry = registry_of(vec![
            StubProvider::new(ProviderId::Google, Duration::from_millis(5), |_, _, _| {
                Err(AuditError::Http(429))
            }),
            StubProvider::new(ProviderId::Cloudflare, Duration::from_millis(5), |_, _, _| {
                Err(AuditError::Network("refused".to_string()))
            }),
        ]);
        let (reporter, _rx) = reporter();

        let err = resolve(
            &registry,
            ResolveMode::Auto,
            &reporter,
            "example.com",
            RecordType::NS,
            9000,
        )
        .await
        .unwrap_err();
        // Sweep order is registration order, so the last attempt is the
        // second provider's.
        assert_eq!(err, AuditError::Network("refused".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn every_provider_is_retried_by_the_sweep() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let counters: Vec<Arc<AtomicUsize>> =
            (0..3).map(|_| Arc::new(AtomicUsize::new(0))).collect();
        let ids = [ProviderId::Google, ProviderId::Cloudflare, ProviderId::Quad9];
        let providers: Vec<StubProvider> = ids
            .iter()
            .zip(&counters)
            .map(|(id, counter)| {
                let counter = Arc::clone(counter);
                StubProvider::new(*id, Duration::from_millis(5), move |_, _, _| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(AuditError::Http(500))
                })
            })
            .collect();
        let registry = registry_of(providers);
        let (reporter, _rx) = reporter();

        let result = resolve(
            &registry,
            ResolveMode::Auto,
            &reporter,
            "example.com",
            RecordType::TXT,
            9000,
        )
        .await;
        assert!(result.is_err());
        // One call from the race plus one from the sweep, for every
        // registered provider.
        for counter in &counters {
            assert_eq!(counter.load(Ordering::SeqCst), 2);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn pinned_mode_tries_the_designated_backup_once() {
        let pinned =
            StubProvider::new(ProviderId::Google, Duration::from_millis(5), |_, _, _| {
                Err(AuditError::Http(502))
            });
        let backup =
            StubProvider::new(ProviderId::Cloudflare, Duration::from_millis(5), |n, t, _| {
                Ok(response_with(vec![answer(n, t, "ns1.example.com.")]))
            });
        let untouched =
            StubProvider::new(ProviderId::Quad9, Duration::from_millis(5), |n, t, _| {
                Ok(response_with(vec![answer(n, t, "ns-wrong.example.com.")]))
            });
        let registry = registry_of(vec![pinned, backup, untouched]);
        let (reporter, _rx) = reporter();

        let result = resolve(
            &registry,
            ResolveMode::Pinned(ProviderId::Google),
            &reporter,
            "example.com",
            RecordType::NS,
            9000,
        )
        .await
        .unwrap();
        assert_eq!(result.answers[0].data, "ns1.example.com.");
    }

    #[tokio::test(start_paused = true)]
    async fn pinned_mode_success_never_touches_the_backup() {
        let pinned =
            StubProvider::new(ProviderId::Google, Duration::from_millis(5), |n, t, _| {
                Ok(response_with(vec![answer(n, t, "93.184.216.34")]))
            });
        let backup =
            StubProvider::new(ProviderId::Cloudflare, Duration::from_millis(5), |_, _, _| {
                Err(AuditError::Http(500))
            });
        let registry = registry_of(vec![pinned, backup]);
        let (reporter, _rx) = reporter();

        let result = resolve(
            &registry,
            ResolveMode::Pinned(ProviderId::Google),
            &reporter,
            "example.com",
            RecordType::A,
            9000,
        )
        .await;
        assert!(result.is_ok());
    }
}
