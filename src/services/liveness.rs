//! Liveness probing: a fan-out over a named resource map with a short-lived
//! result cache so health endpoints do not hammer the probed resources.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{error, warn};

use crate::errors::ApiError;
use crate::repository::Db;
use crate::repository::session::SessionManager;

const PROBE_CACHE_TTL: Duration = Duration::from_secs(10);

#[async_trait]
pub trait LivenessProbe: Send + Sync {
    async fn is_alive(&self) -> bool;
}

/// Pings the database over a fresh session.
pub struct DatabaseProbe {
    sessions: Arc<SessionManager>,
}

impl DatabaseProbe {
    pub fn new(sessions: Arc<SessionManager>) -> Self {
        Self { sessions }
    }
}

#[async_trait]
impl LivenessProbe for DatabaseProbe {
    async fn is_alive(&self) -> bool {
        let mut session = match self.sessions.create_session().await {
            Ok(session) => session,
            Err(err) => {
                error!(error = %err, "could not open a session for the liveness probe");
                return false;
            }
        };
        let alive = Db::new(&mut session).is_alive().await;
        if let Err(err) = session.close().await {
            warn!(error = %err, "failed to close the liveness probe session");
        }
        alive
    }
}

pub struct LivenessProbeService {
    resources: HashMap<&'static str, Box<dyn LivenessProbe>>,
    cache: Mutex<HashMap<&'static str, (Instant, bool)>>,
    cache_ttl: Duration,
}

impl LivenessProbeService {
    pub fn new(resources: HashMap<&'static str, Box<dyn LivenessProbe>>) -> Self {
        Self {
            resources,
            cache: Mutex::new(HashMap::new()),
            cache_ttl: PROBE_CACHE_TTL,
        }
    }

    #[cfg(test)]
    fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn contains(&self, service: &str) -> bool {
        self.resources.contains_key(service)
    }

    /// Probe one named resource, serving a cached verdict when fresh.
    pub async fn is_alive(&self, service: &str) -> Result<bool, ApiError> {
        let (name, probe) = self
            .resources
            .get_key_value(service)
            .ok_or_else(|| ApiError::NotFound(format!("service {service} not found")))?;

        let mut cache = self.cache.lock().await;
        if let Some((probed_at, alive)) = cache.get(name) {
            if probed_at.elapsed() < self.cache_ttl {
                return Ok(*alive);
            }
        }
        let alive = probe.is_alive().await;
        cache.insert(name, (Instant::now(), alive));
        Ok(alive)
    }

    pub async fn all_alive(&self) -> bool {
        for service in self.resources.keys() {
            match self.is_alive(service).await {
                Ok(true) => {}
                _ => return false,
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticProbe {
        alive: bool,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl LivenessProbe for StaticProbe {
        async fn is_alive(&self) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.alive
        }
    }

    fn service_with(alive: bool, calls: Arc<AtomicUsize>) -> LivenessProbeService {
        let mut resources: HashMap<&'static str, Box<dyn LivenessProbe>> = HashMap::new();
        resources.insert("db", Box::new(StaticProbe { alive, calls }));
        LivenessProbeService::new(resources)
    }

    #[tokio::test]
    async fn test_probe_verdicts() {
        let calls = Arc::new(AtomicUsize::new(0));
        let service = service_with(true, calls.clone());
        assert!(service.contains("db"));
        assert!(!service.contains("cache"));
        assert!(service.is_alive("db").await.unwrap());
        assert!(service.all_alive().await);

        let down = service_with(false, Arc::new(AtomicUsize::new(0)));
        assert!(!down.is_alive("db").await.unwrap());
        assert!(!down.all_alive().await);
    }

    #[tokio::test]
    async fn test_unknown_service_is_not_found() {
        let service = service_with(true, Arc::new(AtomicUsize::new(0)));
        let err = service.is_alive("queue").await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)), "{err}");
    }

    #[tokio::test]
    async fn test_fresh_results_are_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let service = service_with(true, calls.clone());
        service.is_alive("db").await.unwrap();
        service.is_alive("db").await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cache_expires() {
        let calls = Arc::new(AtomicUsize::new(0));
        let service = service_with(true, calls.clone()).with_cache_ttl(Duration::ZERO);
        service.is_alive("db").await.unwrap();
        service.is_alive("db").await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
