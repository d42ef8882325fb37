//! Cached, retrying request pipeline for the upstream REST APIs.
//!
//! ### Flow
//! 1. Resolve TLS: a pinned client-certificate transport when the request
//!    asks for a TLS version, otherwise the shared public-CA transport. Each
//!    pinned transport is built once, on first use.
//! 2. Flatten the request body into a parameter mapping.
//! 3. `cache_ttl == 0` bypasses the cache entirely (no read, no write).
//! 4. Otherwise look up the request key; a hit is parsed as status 200.
//! 5. On a miss, call the retrying transport, parse, and store the raw body
//!    only when the upstream answered 200.
//!
//! Cache failures are logged and never fail a request.

pub mod parse;
pub mod retry;
pub mod tls;
pub mod transport;

use std::path::PathBuf;
use std::sync::Arc;

pub use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tokio::sync::OnceCell;

use foldmcp_core::{AppConfig, Error, ResponseCache, cache::hash::compute_cache_key};

pub use parse::{ParsedResult, RequestError, parse_response, parse_typed};
pub use retry::{RetryPolicy, RetryingTransport, Sleeper, TokioSleeper};
pub use tls::{TlsContext, TlsVersion};
pub use transport::{HttpConfig, HttpTransport, Transport, TransportError, TransportResult};

/// Request parameters, decided at the call site.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// A mapping used exactly as given.
    Raw(Map<String, Value>),
    /// A serialized request struct with unset fields removed.
    Typed(Map<String, Value>),
}

impl RequestBody {
    /// Serialize a request struct, dropping fields that serialize to `null`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if `request` does not serialize to an object.
    pub fn typed<T: Serialize>(request: &T) -> Result<Self, Error> {
        match serde_json::to_value(request) {
            Ok(Value::Object(map)) => Ok(Self::Typed(map.into_iter().filter(|(_, v)| !v.is_null()).collect())),
            Ok(other) => Err(Error::InvalidInput(format!("request must serialize to an object, got {other}"))),
            Err(e) => Err(Error::InvalidInput(format!("failed to serialize request: {e}"))),
        }
    }

    fn into_params(self) -> Map<String, Value> {
        match self {
            RequestBody::Raw(map) | RequestBody::Typed(map) => map,
        }
    }
}

/// One upstream request.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub url: String,
    pub method: Method,
    pub body: Option<RequestBody>,
    /// Cache lifetime in seconds; `None` uses the client default, `Some(0)` bypasses the cache.
    pub cache_ttl: Option<u64>,
    /// Present a client certificate pinned to this protocol version.
    pub tls_version: Option<TlsVersion>,
}

impl ApiRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self { url: url.into(), method: Method::GET, body: None, cache_ttl: None, tls_version: None }
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self { method: Method::POST, ..Self::get(url) }
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_cache_ttl(mut self, ttl_seconds: u64) -> Self {
        self.cache_ttl = Some(ttl_seconds);
        self
    }

    pub fn with_tls(mut self, version: TlsVersion) -> Self {
        self.tls_version = Some(version);
        self
    }
}

/// Settings for [`ApiClient`], usually derived from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub http: HttpConfig,
    pub retry: RetryPolicy,
    pub default_cache_ttl: u64,
    pub ssl_cert_file: Option<PathBuf>,
    pub ssl_key_file: Option<PathBuf>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            retry: RetryPolicy::default(),
            default_cache_ttl: 86_400,
            ssl_cert_file: None,
            ssl_key_file: None,
        }
    }
}

impl From<&AppConfig> for ClientSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            http: HttpConfig { user_agent: config.user_agent.clone(), timeout: config.timeout() },
            retry: RetryPolicy {
                retries: config.max_retries,
                backoff_factor: config.backoff_factor,
                pre_delay: config.rate_limit_delay(),
            },
            default_cache_ttl: config.cache_ttl_secs,
            ssl_cert_file: config.ssl_cert_file.clone(),
            ssl_key_file: config.ssl_key_file.clone(),
        }
    }
}

/// Client-certificate transports, one slot per pinned version.
#[derive(Default)]
struct TlsTransports {
    tls12: OnceCell<RetryingTransport>,
    tls13: OnceCell<RetryingTransport>,
}

impl TlsTransports {
    fn slot(&self, version: TlsVersion) -> &OnceCell<RetryingTransport> {
        match version {
            TlsVersion::Tls12 => &self.tls12,
            TlsVersion::Tls13 => &self.tls13,
        }
    }
}

/// Entry point tying the cache, transport, and parser together.
#[derive(Clone)]
pub struct ApiClient {
    cache: Arc<dyn ResponseCache>,
    transport: RetryingTransport,
    tls: Arc<TlsTransports>,
    sleeper: Arc<dyn Sleeper>,
    settings: ClientSettings,
}

impl ApiClient {
    /// Build a client over the real network.
    pub fn from_config(config: &AppConfig, cache: Arc<dyn ResponseCache>) -> Result<Self, Error> {
        let settings = ClientSettings::from(config);
        let transport = Arc::new(HttpTransport::new(&settings.http)?);
        Ok(Self::new(cache, transport, Arc::new(TokioSleeper), settings))
    }

    /// Build a client from explicit parts.
    pub fn new(
        cache: Arc<dyn ResponseCache>, transport: Arc<dyn Transport>, sleeper: Arc<dyn Sleeper>,
        settings: ClientSettings,
    ) -> Self {
        let transport = RetryingTransport::new(transport, sleeper.clone());
        Self { cache, transport, tls: Arc::default(), sleeper, settings }
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Request and parse without a schema (JSON / CSV / text sniffing).
    ///
    /// The outer error is reserved for configuration failures raised before
    /// any network attempt.
    pub async fn request_json(&self, request: ApiRequest) -> Result<ParsedResult<Value>, Error> {
        self.execute(request, parse_response).await
    }

    /// Request and deserialize strictly into `T`.
    pub async fn request_typed<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<ParsedResult<T>, Error> {
        self.execute(request, parse_typed::<T>).await
    }

    async fn execute<T>(
        &self, request: ApiRequest, parse: fn(u16, &str) -> ParsedResult<T>,
    ) -> Result<ParsedResult<T>, Error> {
        let transport = self.resolve_transport(request.tls_version).await?;
        let params = request.body.map(RequestBody::into_params);
        let ttl = request.cache_ttl.unwrap_or(self.settings.default_cache_ttl);

        if ttl == 0 {
            let result = transport
                .call(&request.method, &request.url, params.as_ref(), &self.settings.retry)
                .await;
            return Ok(parse(result.status, &result.body));
        }

        let key = compute_cache_key(request.method.as_str(), &request.url, params.as_ref());

        match self.cache.get(&key).await {
            Ok(Some(body)) => {
                tracing::debug!("cache hit for {} {}", request.method, request.url);
                return Ok(parse(200, &body));
            }
            Ok(None) => tracing::debug!("cache miss for {} {}", request.method, request.url),
            Err(e) => tracing::warn!("cache read failed, treating as miss: {}", e),
        }

        let result = transport
            .call(&request.method, &request.url, params.as_ref(), &self.settings.retry)
            .await;
        let parsed = parse(result.status, &result.body);

        if result.status == 200
            && let Err(e) = self.cache.set(&key, &result.body, ttl).await
        {
            tracing::warn!("failed to cache response: {}", e);
        }

        Ok(parsed)
    }

    /// A failed build is not remembered; the next pinned request tries again.
    async fn resolve_transport(&self, tls_version: Option<TlsVersion>) -> Result<RetryingTransport, Error> {
        let Some(version) = tls_version else {
            return Ok(self.transport.clone());
        };

        let transport = self
            .tls
            .slot(version)
            .get_or_try_init(|| async {
                let defaults = (self.settings.ssl_cert_file.as_deref(), self.settings.ssl_key_file.as_deref());
                let tls = TlsContext::build(None, None, defaults, version).await?;
                let http = HttpTransport::with_tls(&self.settings.http, &tls)?;
                Ok::<_, Error>(RetryingTransport::new(Arc::new(http), self.sleeper.clone()))
            })
            .await?;

        Ok(transport.clone())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::retry::tests::{RecordingSleeper, ScriptedTransport};
    use super::tls::tests::write_self_signed;
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory cache that counts reads and writes.
    #[derive(Default)]
    pub(crate) struct CountingCache {
        entries: Mutex<HashMap<String, (String, u64)>>,
        pub(crate) gets: AtomicUsize,
        pub(crate) sets: AtomicUsize,
        pub(crate) fail_reads: bool,
    }

    #[async_trait]
    impl ResponseCache for CountingCache {
        async fn get(&self, key: &str) -> Result<Option<String>, Error> {
            self.gets.fetch_add(1, Ordering::SeqCst);
            if self.fail_reads {
                return Err(Error::MigrationFailed("cache unavailable".into()));
            }
            let entries = self.entries.lock().unwrap();
            Ok(entries.get(key).filter(|(_, ttl)| *ttl > 0).map(|(body, _)| body.clone()))
        }

        async fn set(&self, key: &str, body: &str, ttl_seconds: u64) -> Result<(), Error> {
            self.sets.fetch_add(1, Ordering::SeqCst);
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), (body.to_string(), ttl_seconds));
            Ok(())
        }
    }

    fn client(
        cache: Arc<CountingCache>, outcomes: Vec<Result<TransportResult, TransportError>>,
    ) -> (ApiClient, Arc<ScriptedTransport>) {
        let transport = Arc::new(ScriptedTransport::new(outcomes));
        let settings = ClientSettings { retry: RetryPolicy { retries: 2, ..Default::default() }, ..Default::default() };
        let client = ApiClient::new(cache, transport.clone(), Arc::new(RecordingSleeper::default()), settings);
        (client, transport)
    }

    #[tokio::test]
    async fn test_zero_ttl_bypasses_cache() {
        let cache = Arc::new(CountingCache::default());
        let (client, transport) = client(cache.clone(), vec![Ok(TransportResult::new(200, r#"{"a":1}"#))]);

        let parsed = client
            .request_json(ApiRequest::get("https://api.example.com/x").with_cache_ttl(0))
            .await
            .unwrap();

        assert_eq!(parsed, Ok(json!({"a": 1})));
        assert_eq!(transport.call_count(), 1);
        assert_eq!(cache.gets.load(Ordering::SeqCst), 0);
        assert_eq!(cache.sets.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let cache = Arc::new(CountingCache::default());
        let (client, transport) = client(cache.clone(), vec![Ok(TransportResult::new(200, r#"[{"id":1}]"#))]);
        let request = ApiRequest::get("https://api.example.com/items").with_cache_ttl(3600);

        let first = client.request_json(request.clone()).await.unwrap();
        let second = client.request_json(request).await.unwrap();

        assert_eq!(first, Ok(json!([{"id": 1}])));
        assert_eq!(second, first);
        assert_eq!(transport.call_count(), 1);
        assert_eq!(cache.gets.load(Ordering::SeqCst), 2);
        assert_eq!(cache.sets.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_default_ttl_applied() {
        let cache = Arc::new(CountingCache::default());
        let (client, _transport) = client(cache.clone(), vec![Ok(TransportResult::new(200, "ok"))]);

        client.request_json(ApiRequest::get("https://api.example.com/t")).await.unwrap();

        let entries = cache.entries.lock().unwrap();
        let (_, ttl) = entries.values().next().unwrap();
        assert_eq!(*ttl, 86_400);
    }

    #[tokio::test]
    async fn test_error_status_not_cached() {
        let cache = Arc::new(CountingCache::default());
        let (client, transport) = client(
            cache.clone(),
            vec![Ok(TransportResult::new(404, "missing")), Ok(TransportResult::new(404, "missing"))],
        );
        let request = ApiRequest::get("https://api.example.com/none");

        let first = client.request_json(request.clone()).await.unwrap();
        let second = client.request_json(request).await.unwrap();

        assert_eq!(first, Err(RequestError::new(404, "missing")));
        assert_eq!(second, first);
        assert_eq!(transport.call_count(), 2);
        assert_eq!(cache.sets.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_exhausted_retries_surface_599() {
        let cache = Arc::new(CountingCache::default());
        let (client, transport) = client(cache.clone(), vec![]);

        let parsed = client.request_json(ApiRequest::get("https://api.example.com/down")).await.unwrap();

        let err = parsed.unwrap_err();
        assert_eq!(err.code, 599);
        assert_eq!(transport.call_count(), 3);
        assert_eq!(cache.sets.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cache_read_failure_falls_through() {
        let cache = Arc::new(CountingCache { fail_reads: true, ..Default::default() });
        let (client, transport) = client(cache.clone(), vec![Ok(TransportResult::new(200, "hello"))]);

        let parsed = client.request_json(ApiRequest::get("https://api.example.com/t")).await.unwrap();

        assert_eq!(parsed, Ok(json!({"text": "hello"})));
        assert_eq!(transport.call_count(), 1);
        assert_eq!(cache.sets.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_typed_mismatch_is_500_but_still_cached() {
        #[derive(Debug, serde::Deserialize)]
        #[allow(dead_code)]
        struct Expected {
            accession: String,
        }

        let cache = Arc::new(CountingCache::default());
        let (client, _transport) = client(cache.clone(), vec![Ok(TransportResult::new(200, r#"{"other":1}"#))]);

        let parsed = client
            .request_typed::<Expected>(ApiRequest::get("https://api.example.com/t"))
            .await
            .unwrap();

        assert_eq!(parsed.unwrap_err().code, 500);
        assert_eq!(cache.sets.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_tls_without_files_fails_before_network() {
        let cache = Arc::new(CountingCache::default());
        let (client, transport) = client(cache.clone(), vec![Ok(TransportResult::new(200, "{}"))]);

        let result = client
            .request_json(ApiRequest::get("https://api.example.com/t").with_tls(TlsVersion::Tls13))
            .await;

        assert!(matches!(result, Err(Error::Config(_))));
        assert_eq!(transport.call_count(), 0);
        assert_eq!(cache.gets.load(Ordering::SeqCst), 0);
    }

    fn pinned_client(
        cache: Arc<CountingCache>, cert: PathBuf, key: PathBuf,
    ) -> (ApiClient, Arc<ScriptedTransport>) {
        let transport = Arc::new(ScriptedTransport::new(vec![]));
        let settings = ClientSettings { ssl_cert_file: Some(cert), ssl_key_file: Some(key), ..Default::default() };
        let client = ApiClient::new(cache, transport.clone(), Arc::new(RecordingSleeper::default()), settings);
        (client, transport)
    }

    #[tokio::test]
    async fn test_pinned_transport_built_once_per_version() {
        let dir = tempfile::tempdir().unwrap();
        let (cert, key) = write_self_signed(dir.path());
        let url = "https://api.example.com/pinned";
        let cache = Arc::new(CountingCache::default());
        cache
            .entries
            .lock()
            .unwrap()
            .insert(compute_cache_key("GET", url, None), (r#"{"ok":true}"#.to_string(), 3600));
        let (client, transport) = pinned_client(cache.clone(), cert.clone(), key.clone());
        let request = ApiRequest::get(url).with_tls(TlsVersion::Tls13);

        assert_eq!(client.request_json(request.clone()).await.unwrap(), Ok(json!({"ok": true})));

        std::fs::remove_file(&cert).unwrap();
        std::fs::remove_file(&key).unwrap();

        assert_eq!(client.request_json(request.clone()).await.unwrap(), Ok(json!({"ok": true})));
        assert_eq!(client.clone().request_json(request).await.unwrap(), Ok(json!({"ok": true})));

        let other = client.request_json(ApiRequest::get(url).with_tls(TlsVersion::Tls12)).await;
        assert!(matches!(other, Err(Error::FileNotFound(_))));
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_pinned_build_is_retried() {
        let dir = tempfile::tempdir().unwrap();
        let cert = dir.path().join("client-cert.pem");
        let key = dir.path().join("client-key.pem");
        let url = "https://api.example.com/pinned";
        let cache = Arc::new(CountingCache::default());
        cache
            .entries
            .lock()
            .unwrap()
            .insert(compute_cache_key("GET", url, None), ("cached".to_string(), 3600));
        let (client, _transport) = pinned_client(cache.clone(), cert, key);
        let request = ApiRequest::get(url).with_tls(TlsVersion::Tls12);

        let first = client.request_json(request.clone()).await;
        assert!(matches!(first, Err(Error::FileNotFound(_))));
        assert_eq!(cache.gets.load(Ordering::SeqCst), 0);

        write_self_signed(dir.path());

        let second = client.request_json(request).await.unwrap();
        assert_eq!(second, Ok(json!({"text": "cached"})));
    }

    #[tokio::test]
    async fn test_empty_typed_body_shares_entry_with_no_body() {
        #[derive(Serialize)]
        struct Lookup {
            sequence_checksum: Option<String>,
        }

        let cache = Arc::new(CountingCache::default());
        let (client, transport) = client(
            cache.clone(),
            vec![Ok(TransportResult::new(200, r#"{"n":1}"#)), Ok(TransportResult::new(200, r#"{"n":2}"#))],
        );
        let url = "https://api.example.com/prediction/Q5VSL9";

        let plain = client.request_json(ApiRequest::get(url)).await.unwrap();
        let typed = client
            .request_json(ApiRequest::get(url).with_body(RequestBody::typed(&Lookup { sequence_checksum: None }).unwrap()))
            .await
            .unwrap();

        assert_eq!(plain, Ok(json!({"n": 1})));
        assert_eq!(typed, plain);
        assert_eq!(transport.call_count(), 1);
        assert_eq!(cache.sets.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unsupported_method_not_cached() {
        let cache = Arc::new(CountingCache::default());
        let (client, transport) = client(cache.clone(), vec![]);

        let parsed = client
            .request_json(ApiRequest::get("https://api.example.com/t").with_method(Method::DELETE))
            .await
            .unwrap();

        assert_eq!(parsed.unwrap_err().code, 405);
        assert_eq!(transport.call_count(), 0);
        assert_eq!(cache.sets.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_body_changes_cache_key() {
        let cache = Arc::new(CountingCache::default());
        let (client, transport) = client(
            cache.clone(),
            vec![Ok(TransportResult::new(200, r#"{"n":1}"#)), Ok(TransportResult::new(200, r#"{"n":2}"#))],
        );

        let a = ApiRequest::post("https://api.example.com/q")
            .with_body(RequestBody::Raw(serde_json::from_value(json!({"id": 1})).unwrap()));
        let b = ApiRequest::post("https://api.example.com/q")
            .with_body(RequestBody::Raw(serde_json::from_value(json!({"id": 2})).unwrap()));

        assert_eq!(client.request_json(a).await.unwrap(), Ok(json!({"n": 1})));
        assert_eq!(client.request_json(b).await.unwrap(), Ok(json!({"n": 2})));
        assert_eq!(transport.call_count(), 2);
    }

    #[test]
    fn test_typed_body_drops_unset_fields() {
        #[derive(Serialize)]
        struct Search {
            query: String,
            size: Option<u32>,
            sort: Option<String>,
        }

        let body = RequestBody::typed(&Search { query: "insulin".into(), size: Some(5), sort: None }).unwrap();
        let expected: Map<String, Value> = serde_json::from_value(json!({"query": "insulin", "size": 5})).unwrap();
        assert_eq!(body, RequestBody::Typed(expected));
    }

    #[test]
    fn test_typed_body_rejects_non_object() {
        assert!(matches!(RequestBody::typed(&vec![1, 2]), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_settings_from_config() {
        let config = AppConfig { max_retries: 5, rate_limit_delay_ms: Some(100), ..Default::default() };
        let settings = ClientSettings::from(&config);
        assert_eq!(settings.retry.retries, 5);
        assert_eq!(settings.retry.pre_delay, Some(std::time::Duration::from_millis(100)));
        assert_eq!(settings.default_cache_ttl, 86_400);
        assert_eq!(settings.http.user_agent, "mcp-alphafold/0.1");
    }
}
