//! The interception and cache manager.
//!
//! [`ServiceWorker`] owns the current generation label and reacts to
//! lifecycle events:
//!
//! - **install** pre-populates the current generation from the asset manifest
//! - **activate** deletes every other generation, then claims open clients
//! - **fetch** resolves GET http(s) requests cache-first, falling back to the
//!   network and finally to a synthesized 503
//! - **sync** / **periodicsync** run best-effort placeholder actions
//! - **push** displays a notification
//!
//! [`ServiceWorker::dispatch`] runs a handler and keeps the event alive
//! until all of its extended work settles.

pub mod event;
pub mod host;

use std::sync::Arc;

use futures_util::future::join_all;
use offcache_client::Network;
use offcache_core::{AppConfig, CacheDb, ConfigError, Error, Generation, Request, Response};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use url::Url;

pub use event::ExtendableEvent;
pub use host::{Host, Notification, RecordingHost};

/// Tag of the one-shot background sync signal.
pub const SYNC_TAG: &str = "sync-data";

/// Tag of the recurring periodic update signal.
pub const PERIODIC_SYNC_TAG: &str = "update-data";

/// Where the manager is in its lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    #[default]
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
}

/// How a fetch was answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    /// Found in the current generation before touching the network
    Cache,
    /// Live network response
    Network,
    /// Network failed; found in the cache on the second look
    CacheAfterNetworkError,
    /// Network failed and nothing was cached
    Fallback,
}

/// Resolution of an intercepted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    pub source: ResponseSource,
    pub response: Response,
}

/// A manifest asset that could not be cached during install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AssetFailure {
    pub url: String,
    pub reason: String,
}

/// Result of an install.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct InstallReport {
    pub generation: String,
    /// Assets stored, in manifest order.
    pub cached: Vec<String>,
    /// Assets skipped, in manifest order.
    pub failed: Vec<AssetFailure>,
}

/// Result of an activation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ActivateReport {
    pub generation: String,
    /// Stale generations removed.
    pub deleted: Vec<String>,
    /// Stale generations whose deletion failed, with the error.
    pub failed: Vec<AssetFailure>,
}

/// Point-in-time view of the manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct WorkerStatus {
    pub state: WorkerState,
    pub generation: String,
    pub generations: Vec<String>,
    pub entries: u64,
    /// URLs stored in the current generation, in insertion order.
    pub cached: Vec<String>,
    pub manifest: Vec<String>,
}

/// A lifecycle event delivered by the host.
#[derive(Debug, Clone)]
pub enum Event {
    Install,
    Activate,
    Fetch(Request),
    Sync(String),
    PeriodicSync(String),
    Push(Option<String>),
}

impl Event {
    pub fn kind(&self) -> &'static str {
        match self {
            Event::Install => "install",
            Event::Activate => "activate",
            Event::Fetch(_) => "fetch",
            Event::Sync(_) => "sync",
            Event::PeriodicSync(_) => "periodicsync",
            Event::Push(_) => "push",
        }
    }
}

/// What a settled event produced.
#[derive(Debug, Clone)]
pub enum EventOutcome {
    Installed(InstallReport),
    Activated(ActivateReport),
    /// `None` when the request was not intercepted.
    Fetched(Option<FetchOutcome>),
    Synced { tag: String, handled: bool },
    Notified(Notification),
}

/// The interception and cache manager.
pub struct ServiceWorker {
    db: CacheDb,
    cache_name: String,
    manifest: Vec<Url>,
    notification_title: String,
    network: Arc<dyn Network>,
    host: Arc<dyn Host>,
    state: RwLock<WorkerState>,
}

impl ServiceWorker {
    /// Build a manager from deployment configuration.
    pub fn new(
        config: &AppConfig, db: CacheDb, network: Arc<dyn Network>, host: Arc<dyn Host>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            db,
            cache_name: config.cache_name.clone(),
            manifest: config.asset_urls()?,
            notification_title: config.notification_title.clone(),
            network,
            host,
            state: RwLock::new(WorkerState::Parsed),
        })
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    async fn set_state(&self, state: WorkerState) {
        *self.state.write().await = state;
    }

    /// Run the handler for `event` and wait until its extended work settles.
    ///
    /// A fetch outcome is ready before its background cache write finishes,
    /// but it is returned only once that write has settled or failed.
    pub async fn dispatch(&self, event: Event) -> Result<EventOutcome, Error> {
        let mut lifetime = ExtendableEvent::new(event.kind());
        tracing::debug!(event = lifetime.kind(), "dispatching");

        let outcome = match event {
            Event::Install => self.install(&mut lifetime).await.map(EventOutcome::Installed),
            Event::Activate => self.activate(&mut lifetime).await.map(EventOutcome::Activated),
            Event::Fetch(request) => Ok(EventOutcome::Fetched(self.fetch(request, &mut lifetime).await)),
            Event::Sync(tag) => {
                let handled = self.sync(&tag, &mut lifetime);
                Ok(EventOutcome::Synced { tag, handled })
            }
            Event::PeriodicSync(tag) => {
                let handled = self.periodic_sync(&tag, &mut lifetime);
                Ok(EventOutcome::Synced { tag, handled })
            }
            Event::Push(payload) => self.push(payload.as_deref()).await.map(EventOutcome::Notified),
        };

        tracing::trace!(event = lifetime.kind(), pending = lifetime.pending(), "handler returned");
        lifetime.settled().await;
        outcome
    }

    /// Open the current generation and pre-populate it from the manifest.
    ///
    /// Individual assets that fail to fetch or store are reported and
    /// skipped; only a failure to open the generation fails the install.
    pub async fn install(&self, _event: &mut ExtendableEvent) -> Result<InstallReport, Error> {
        tracing::info!(generation = %self.cache_name, "installing");
        self.set_state(WorkerState::Installing).await;

        let cache = self.db.open_generation(&self.cache_name).await?;
        let report = self.add_all(&cache).await;

        if !report.failed.is_empty() {
            tracing::warn!(
                failed = report.failed.len(),
                cached = report.cached.len(),
                "some assets failed to cache"
            );
        }

        self.set_state(WorkerState::Installed).await;
        self.host.skip_waiting().await;

        Ok(report)
    }

    async fn add_all(&self, cache: &Generation) -> InstallReport {
        let fetches = self.manifest.iter().map(|url| {
            let request = Request::get_url(url.clone());
            async move {
                let result = self.network.fetch(&request).await;
                (request, result)
            }
        });

        let mut report = InstallReport { generation: cache.label().to_string(), ..Default::default() };

        for (request, result) in join_all(fetches).await {
            let url = request.url.to_string();
            let stored = match result {
                Ok(response) if response.is_ok() => cache.put(&request, &response).await,
                Ok(response) => Err(Error::Network(format!("status {}", response.status))),
                Err(e) => Err(e),
            };

            match stored {
                Ok(()) => {
                    tracing::debug!(%url, "cached asset");
                    report.cached.push(url);
                }
                Err(e) => {
                    tracing::warn!(%url, error = %e, "asset failed to cache");
                    report.failed.push(AssetFailure { url, reason: e.to_string() });
                }
            }
        }

        report
    }

    /// Delete every generation other than the current one, then claim clients.
    ///
    /// Deletions run concurrently. A failed deletion is reported and does not
    /// stop activation.
    pub async fn activate(&self, _event: &mut ExtendableEvent) -> Result<ActivateReport, Error> {
        tracing::info!(generation = %self.cache_name, "activating");
        self.set_state(WorkerState::Activating).await;

        if !self.db.has_generation(&self.cache_name).await? {
            tracing::warn!(generation = %self.cache_name, "activating before the current generation was installed");
        }

        let stale: Vec<String> = self
            .db
            .generation_labels()
            .await?
            .into_iter()
            .filter(|label| *label != self.cache_name)
            .collect();

        let deletions = stale.iter().map(|label| async move {
            tracing::info!(generation = %label, "deleting old cache");
            (label, self.db.delete_generation(label).await)
        });

        let mut report = ActivateReport { generation: self.cache_name.clone(), ..Default::default() };
        for (label, result) in join_all(deletions).await {
            match result {
                Ok(_) => report.deleted.push(label.clone()),
                Err(e) => {
                    tracing::warn!(generation = %label, error = %e, "failed to delete old cache");
                    report.failed.push(AssetFailure { url: label.clone(), reason: e.to_string() });
                }
            }
        }

        self.set_state(WorkerState::Activated).await;
        self.host.claim_clients().await;

        Ok(report)
    }

    /// Resolve an outgoing request.
    ///
    /// Returns `None` for requests that are not intercepted (anything other
    /// than GET over http or https); the host handles those itself.
    pub async fn fetch(&self, request: Request, event: &mut ExtendableEvent) -> Option<FetchOutcome> {
        if !request.is_get() || !request.is_http() {
            tracing::trace!(method = %request.method, url = %request.url, "not intercepted");
            return None;
        }

        Some(self.resolve(request, event).await)
    }

    async fn resolve(&self, request: Request, event: &mut ExtendableEvent) -> FetchOutcome {
        if let Some(response) = self.lookup(&request).await {
            tracing::debug!(url = %request.url, "serving from cache");
            return FetchOutcome { source: ResponseSource::Cache, response };
        }

        match self.network.fetch(&request).await {
            Ok(response) => {
                tracing::debug!(
                    url = %request.url,
                    status = response.status,
                    content_type = response.header("content-type").unwrap_or_default(),
                    "network response"
                );
                if response.is_cacheable() {
                    self.store_in_background(request, response.clone(), event);
                }
                FetchOutcome { source: ResponseSource::Network, response }
            }
            Err(e) => {
                tracing::info!(url = %request.url, error = %e, "network error, offline mode");
                match self.lookup(&request).await {
                    Some(response) => FetchOutcome { source: ResponseSource::CacheAfterNetworkError, response },
                    None => FetchOutcome { source: ResponseSource::Fallback, response: Response::offline_fallback() },
                }
            }
        }
    }

    /// Exact-key lookup in the current generation. Storage errors count as a miss.
    async fn lookup(&self, request: &Request) -> Option<Response> {
        match self.db.generation(&self.cache_name).match_request(request).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(url = %request.url, error = %e, "cache lookup failed");
                None
            }
        }
    }

    fn store_in_background(&self, request: Request, response: Response, event: &mut ExtendableEvent) {
        let db = self.db.clone();
        let label = self.cache_name.clone();
        event.wait_until(async move {
            let stored = match db.open_generation(&label).await {
                Ok(cache) => cache.put(&request, &response).await,
                Err(e) => Err(e),
            };
            if let Err(e) = stored {
                tracing::warn!(url = %request.url, error = %e, "failed to cache response");
            }
        });
    }

    /// Handle a one-shot background sync signal. Returns whether the tag matched.
    pub fn sync(&self, tag: &str, event: &mut ExtendableEvent) -> bool {
        if tag != SYNC_TAG {
            tracing::debug!(tag, "ignoring sync");
            return false;
        }
        event.wait_until(async {
            tracing::info!("syncing data");
        });
        true
    }

    /// Handle a periodic update signal. Returns whether the tag matched.
    pub fn periodic_sync(&self, tag: &str, event: &mut ExtendableEvent) -> bool {
        if tag != PERIODIC_SYNC_TAG {
            tracing::debug!(tag, "ignoring periodic sync");
            return false;
        }
        event.wait_until(async {
            tracing::info!("updating data periodically");
        });
        true
    }

    /// Display a notification for a push signal.
    pub async fn push(&self, payload: Option<&str>) -> Result<Notification, Error> {
        tracing::info!(has_payload = payload.is_some(), "push received");
        let notification = Notification::from_push(&self.notification_title, payload);
        self.host.show_notification(&notification).await?;
        Ok(notification)
    }

    /// Current state, known generations and the size of the current one.
    pub async fn status(&self) -> Result<WorkerStatus, Error> {
        let cached: Vec<String> = self
            .db
            .generation(&self.cache_name)
            .keys()
            .await?
            .into_iter()
            .map(|request| request.url.to_string())
            .collect();

        Ok(WorkerStatus {
            state: self.state().await,
            generation: self.cache_name.clone(),
            generations: self.db.generation_labels().await?,
            entries: cached.len() as u64,
            cached,
            manifest: self.manifest.iter().map(Url::to_string).collect(),
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Network double answering from a fixed table; unknown URLs fail.
    #[derive(Default)]
    pub struct ScriptedNetwork {
        routes: Mutex<HashMap<String, Response>>,
        calls: Mutex<Vec<String>>,
        offline: std::sync::atomic::AtomicBool,
    }

    impl ScriptedNetwork {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn route(self, url: &str, response: Response) -> Self {
            self.routes.lock().unwrap().insert(url.to_string(), response);
            self
        }

        pub fn set_offline(&self, offline: bool) {
            self.offline.store(offline, std::sync::atomic::Ordering::SeqCst);
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl Network for ScriptedNetwork {
        async fn fetch(&self, request: &Request) -> Result<Response, Error> {
            let url = request.url.to_string();
            self.calls.lock().unwrap().push(url.clone());
            if self.offline.load(std::sync::atomic::Ordering::SeqCst) {
                return Err(Error::Network("offline".into()));
            }
            self.routes
                .lock()
                .unwrap()
                .get(&url)
                .cloned()
                .ok_or_else(|| Error::Network(format!("connection refused: {url}")))
        }
    }

    pub struct Fixture {
        pub worker: ServiceWorker,
        pub db: CacheDb,
        pub network: Arc<ScriptedNetwork>,
        pub host: Arc<RecordingHost>,
    }

    pub async fn fixture_with(config: AppConfig, network: ScriptedNetwork) -> Fixture {
        let db = CacheDb::open_in_memory().await.unwrap();
        let network = Arc::new(network);
        let host = Arc::new(RecordingHost::new());
        let worker = ServiceWorker::new(&config, db.clone(), network.clone(), host.clone()).unwrap();
        Fixture { worker, db, network, host }
    }

    pub async fn fixture(network: ScriptedNetwork) -> Fixture {
        let config = AppConfig { cache_name: "v2".into(), scope_url: "https://coffee.test/".into(), ..Default::default() };
        fixture_with(config, network).await
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use offcache_core::ResponseType;

    const APP: &str = "https://coffee.test/app.js";

    async fn fetch(fx: &Fixture, request: Request) -> Option<FetchOutcome> {
        match fx.worker.dispatch(Event::Fetch(request)).await.unwrap() {
            EventOutcome::Fetched(outcome) => outcome,
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_cached_request_skips_network() {
        let fx = fixture(ScriptedNetwork::new()).await;
        let req = Request::get(APP).unwrap();
        fx.db.open_generation("v2").await.unwrap().put(&req, &Response::ok("cached")).await.unwrap();

        let outcome = fetch(&fx, req).await.unwrap();

        assert_eq!(outcome.source, ResponseSource::Cache);
        assert_eq!(outcome.response.body.as_ref(), b"cached");
        assert!(fx.network.calls().is_empty());
    }

    #[tokio::test]
    async fn test_network_200_is_returned_and_cached() {
        let fx = fixture(ScriptedNetwork::new().route(APP, Response::ok("fresh"))).await;

        let first = fetch(&fx, Request::get(APP).unwrap()).await.unwrap();
        assert_eq!(first.source, ResponseSource::Network);
        assert_eq!(first.response.body.as_ref(), b"fresh");

        let second = fetch(&fx, Request::get(APP).unwrap()).await.unwrap();
        assert_eq!(second.source, ResponseSource::Cache);
        assert_eq!(second.response, first.response);
        assert_eq!(fx.network.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_background_store_settles_with_event() {
        let fx = fixture(ScriptedNetwork::new().route(APP, Response::ok("fresh"))).await;
        let mut event = ExtendableEvent::new("fetch");

        let outcome = fx.worker.fetch(Request::get(APP).unwrap(), &mut event).await.unwrap();
        assert_eq!(outcome.source, ResponseSource::Network);
        assert_eq!(event.pending(), 1);

        event.settled().await;
        let hit = fx.db.generation("v2").match_request(&Request::get(APP).unwrap()).await.unwrap();
        assert_eq!(hit.unwrap().body.as_ref(), b"fresh");
    }

    #[tokio::test]
    async fn test_non_200_is_not_cached() {
        let fx = fixture(
            ScriptedNetwork::new()
                .route("https://coffee.test/missing", Response::new(404, "Not Found", "nope"))
                .route("https://coffee.test/created", Response::new(201, "Created", "")),
        )
        .await;

        for url in ["https://coffee.test/missing", "https://coffee.test/created"] {
            let outcome = fetch(&fx, Request::get(url).unwrap()).await.unwrap();
            assert_eq!(outcome.source, ResponseSource::Network);
        }

        assert!(fx.db.generation("v2").keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_error_type_response_is_not_cached() {
        let fx = fixture(
            ScriptedNetwork::new().route(APP, Response::ok("odd").with_type(ResponseType::Error)),
        )
        .await;

        let outcome = fetch(&fx, Request::get(APP).unwrap()).await.unwrap();

        assert_eq!(outcome.response.response_type, ResponseType::Error);
        assert!(fx.db.generation("v2").keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_non_get_and_non_http_pass_through() {
        let fx = fixture(ScriptedNetwork::new()).await;

        let post = Request::new("POST", APP).unwrap();
        let ext = Request::get("chrome-extension://abc/inject.js").unwrap();
        let data = Request::get("data:text/plain,hello").unwrap();

        for req in [post, ext, data] {
            assert!(fetch(&fx, req).await.is_none());
        }
        assert!(fx.network.calls().is_empty());
    }

    #[tokio::test]
    async fn test_offline_without_cache_returns_fallback() {
        let fx = fixture(ScriptedNetwork::new()).await;

        let outcome = fetch(&fx, Request::get(APP).unwrap()).await.unwrap();

        assert_eq!(outcome.source, ResponseSource::Fallback);
        assert_eq!(outcome.response.status, 503);
        assert_eq!(outcome.response.status_text, "Service Unavailable");
        assert_eq!(outcome.response.header("Content-Type"), Some("text/plain"));
        assert!(!outcome.response.body.is_empty());
        assert!(fx.db.generation("v2").keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_offline_serves_previously_cached_copy() {
        let fx = fixture(ScriptedNetwork::new().route(APP, Response::ok("fresh"))).await;
        let req = Request::get(APP).unwrap();
        fetch(&fx, req.clone()).await.unwrap();

        fx.network.set_offline(true);
        let outcome = fetch(&fx, req).await.unwrap();

        assert_eq!(outcome.source, ResponseSource::Cache);
        assert_eq!(outcome.response.body.as_ref(), b"fresh");
    }

    #[tokio::test]
    async fn test_background_store_recreates_deleted_generation() {
        let fx = fixture(ScriptedNetwork::new().route(APP, Response::ok("fresh"))).await;
        let mut event = ExtendableEvent::new("fetch");

        let outcome = fx.worker.fetch(Request::get(APP).unwrap(), &mut event).await.unwrap();
        fx.db.delete_generation("v2").await.unwrap();
        event.settled().await;

        assert_eq!(outcome.response.status, 200);
        assert!(fx.db.has_generation("v2").await.unwrap());
    }

    /// Stores an entry for the request, then fails, as when another event
    /// caches the same URL while the network request is in flight.
    struct RacingNetwork {
        db: CacheDb,
    }

    #[async_trait::async_trait]
    impl Network for RacingNetwork {
        async fn fetch(&self, request: &Request) -> Result<Response, Error> {
            self.db.open_generation("v2").await?.put(request, &Response::ok("raced")).await?;
            Err(Error::Network("connection reset".into()))
        }
    }

    /// Answers 200, closing the store first so the background write fails.
    struct ClosingNetwork {
        db: tokio::sync::Mutex<Option<CacheDb>>,
    }

    #[async_trait::async_trait]
    impl Network for ClosingNetwork {
        async fn fetch(&self, _request: &Request) -> Result<Response, Error> {
            if let Some(db) = self.db.lock().await.take() {
                db.close().await?;
            }
            Ok(Response::ok("fresh"))
        }
    }

    fn worker_with(db: &CacheDb, network: Arc<dyn Network>) -> ServiceWorker {
        let config = AppConfig { cache_name: "v2".into(), scope_url: "https://coffee.test/".into(), ..Default::default() };
        ServiceWorker::new(&config, db.clone(), network, Arc::new(RecordingHost::new())).unwrap()
    }

    #[tokio::test]
    async fn test_network_error_rechecks_cache() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let worker = worker_with(&db, Arc::new(RacingNetwork { db: db.clone() }));

        let outcome = match worker.dispatch(Event::Fetch(Request::get(APP).unwrap())).await.unwrap() {
            EventOutcome::Fetched(outcome) => outcome.unwrap(),
            other => panic!("unexpected outcome {other:?}"),
        };

        assert_eq!(outcome.source, ResponseSource::CacheAfterNetworkError);
        assert_eq!(outcome.response.body.as_ref(), b"raced");
    }

    #[tokio::test]
    async fn test_cache_write_failure_keeps_response() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let network = ClosingNetwork { db: tokio::sync::Mutex::new(Some(db.clone())) };
        let worker = worker_with(&db, Arc::new(network));

        let outcome = match worker.dispatch(Event::Fetch(Request::get(APP).unwrap())).await.unwrap() {
            EventOutcome::Fetched(outcome) => outcome.unwrap(),
            other => panic!("unexpected outcome {other:?}"),
        };

        assert_eq!(outcome.source, ResponseSource::Network);
        assert_eq!(outcome.response.status, 200);
        assert_eq!(outcome.response.body.as_ref(), b"fresh");
        assert!(db.generation_labels().await.is_err());
    }

    #[tokio::test]
    async fn test_query_string_is_part_of_key() {
        let fx = fixture(ScriptedNetwork::new().route("https://coffee.test/data?page=1", Response::ok("p1"))).await;
        fetch(&fx, Request::get("https://coffee.test/data?page=1").unwrap()).await.unwrap();

        fx.network.set_offline(true);
        let other = fetch(&fx, Request::get("https://coffee.test/data?page=2").unwrap()).await.unwrap();

        assert_eq!(other.source, ResponseSource::Fallback);
    }

    #[tokio::test]
    async fn test_install_tolerates_missing_asset() {
        let config = AppConfig {
            cache_name: "v1".into(),
            scope_url: "https://coffee.test/".into(),
            assets: vec!["./".into(), "./index.html".into(), "./manifest.json".into()],
            ..Default::default()
        };
        let network = ScriptedNetwork::new()
            .route("https://coffee.test/", Response::ok("shell"))
            .route("https://coffee.test/index.html", Response::ok("<html>"));
        let fx = fixture_with(config, network).await;

        let report = match fx.worker.dispatch(Event::Install).await.unwrap() {
            EventOutcome::Installed(report) => report,
            other => panic!("unexpected outcome {other:?}"),
        };

        assert_eq!(report.cached, vec!["https://coffee.test/", "https://coffee.test/index.html"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].url, "https://coffee.test/manifest.json");
        assert_eq!(fx.worker.state().await, WorkerState::Installed);
        assert!(fx.host.record().await.skip_waiting);

        fx.network.set_offline(true);
        for url in ["https://coffee.test/", "https://coffee.test/index.html"] {
            let outcome = fetch(&fx, Request::get(url).unwrap()).await.unwrap();
            assert_eq!(outcome.source, ResponseSource::Cache);
        }
    }

    #[tokio::test]
    async fn test_install_skips_non_ok_asset() {
        let config = AppConfig {
            cache_name: "v1".into(),
            scope_url: "https://coffee.test/".into(),
            assets: vec!["./index.html".into()],
            ..Default::default()
        };
        let network =
            ScriptedNetwork::new().route("https://coffee.test/index.html", Response::new(500, "Oops", ""));
        let fx = fixture_with(config, network).await;

        let report = fx.worker.install(&mut ExtendableEvent::new("install")).await.unwrap();

        assert!(report.cached.is_empty());
        assert!(report.failed[0].reason.contains("500"));
        assert!(fx.db.has_generation("v1").await.unwrap());
    }

    #[tokio::test]
    async fn test_activate_deletes_stale_generations() {
        let fx = fixture(ScriptedNetwork::new()).await;
        let old_only = Request::get("https://coffee.test/old.js").unwrap();
        fx.db.open_generation("v1").await.unwrap().put(&old_only, &Response::ok("old")).await.unwrap();
        fx.db.open_generation("v2").await.unwrap();

        let report = match fx.worker.dispatch(Event::Activate).await.unwrap() {
            EventOutcome::Activated(report) => report,
            other => panic!("unexpected outcome {other:?}"),
        };

        assert_eq!(report.deleted, vec!["v1".to_string()]);
        assert!(report.failed.is_empty());
        assert_eq!(fx.db.generation_labels().await.unwrap(), vec!["v2".to_string()]);
        assert!(fx.host.record().await.clients_claimed);
        assert_eq!(fx.worker.state().await, WorkerState::Activated);

        fx.network.set_offline(true);
        let outcome = fetch(&fx, old_only).await.unwrap();
        assert_eq!(outcome.source, ResponseSource::Fallback);
    }

    #[tokio::test]
    async fn test_activate_with_only_current_generation() {
        let fx = fixture(ScriptedNetwork::new()).await;
        fx.db.open_generation("v2").await.unwrap();

        let report = fx.worker.activate(&mut ExtendableEvent::new("activate")).await.unwrap();

        assert!(report.deleted.is_empty());
        assert!(fx.db.has_generation("v2").await.unwrap());
    }

    #[tokio::test]
    async fn test_sync_tags() {
        let fx = fixture(ScriptedNetwork::new()).await;

        for (event, expected) in [
            (Event::Sync("sync-data".into()), true),
            (Event::Sync("update-data".into()), false),
            (Event::PeriodicSync("update-data".into()), true),
            (Event::PeriodicSync("sync-data".into()), false),
        ] {
            match fx.worker.dispatch(event).await.unwrap() {
                EventOutcome::Synced { handled, .. } => assert_eq!(handled, expected),
                other => panic!("unexpected outcome {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_push_shows_notification() {
        let fx = fixture(ScriptedNetwork::new()).await;

        fx.worker.dispatch(Event::Push(Some("Refill time".into()))).await.unwrap();
        fx.worker.dispatch(Event::Push(None)).await.unwrap();

        let shown = fx.host.record().await.notifications;
        assert_eq!(shown.len(), 2);
        assert_eq!(shown[0].title, "Coffee Counter");
        assert_eq!(shown[0].body, "Refill time");
        assert_eq!(shown[1].body, "New notification");
    }

    #[tokio::test]
    async fn test_status() {
        let fx = fixture(ScriptedNetwork::new()).await;
        fx.db.open_generation("v1").await.unwrap();
        fx.db
            .open_generation("v2")
            .await
            .unwrap()
            .put(&Request::get(APP).unwrap(), &Response::ok("x"))
            .await
            .unwrap();

        let status = fx.worker.status().await.unwrap();

        assert_eq!(status.state, WorkerState::Parsed);
        assert_eq!(status.generation, "v2");
        assert_eq!(status.generations, vec!["v1".to_string(), "v2".to_string()]);
        assert_eq!(status.entries, 1);
        assert_eq!(status.cached, vec![APP.to_string()]);
        assert_eq!(status.manifest.len(), 3);
    }
}
