use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: OnceCell<()> = OnceCell::new();

#[derive(Debug, Default)]
pub struct AppMetrics {
    reports_total: AtomicU64,
    fallback_classifications_total: AtomicU64,
    protocol_matches_total: AtomicU64,
    persistence_failures_total: AtomicU64,
    total_latency_millis: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub reports_total: u64,
    pub fallback_classifications_total: u64,
    pub protocol_matches_total: u64,
    pub persistence_failures_total: u64,
    pub avg_latency_millis: f64,
}

impl AppMetrics {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_report(&self) {
        self.reports_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_fallback_classification(&self) {
        self.fallback_classifications_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_protocol_match(&self) {
        self.protocol_matches_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_persistence_failure(&self) {
        self.persistence_failures_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn observe_latency(&self, duration: Duration) {
        self.total_latency_millis
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let reports = self.reports_total.load(Ordering::Relaxed);
        let latency = self.total_latency_millis.load(Ordering::Relaxed);

        MetricsSnapshot {
            reports_total: reports,
            fallback_classifications_total: self
                .fallback_classifications_total
                .load(Ordering::Relaxed),
            protocol_matches_total: self.protocol_matches_total.load(Ordering::Relaxed),
            persistence_failures_total: self.persistence_failures_total.load(Ordering::Relaxed),
            avg_latency_millis: if reports == 0 {
                0.0
            } else {
                latency as f64 / reports as f64
            },
        }
    }
}

pub fn init_tracing(service_name: &str) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}=info,beacon_api=info,beacon_agents=info",
                service_name
            ))
        });

        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .with_span_list(true)
            .init();
    });
}
