//! etcd v3 client over the JSON gateway.
//!
//! etcd serves its KV API as JSON on the client port (`/v3/kv/range`,
//! `/v3/kv/put`, `/v3/kv/deleterange`). Keys and values travel base64
//! encoded, and int64 fields are rendered as JSON strings.
//!
//! The store is driven from a single thread: every call blocks on a private
//! current-thread runtime until the request completes or fails.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use reqwest::Url;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Deserializer, Serialize};

use crate::config::ClientConfig;
use crate::entry::{Entry, GetOptions};
use crate::error::{StoreError, StoreResult};
use crate::range::{prefix_range_end, prefix_range_start};
use crate::traits::KvStore;

const RANGE_PATH: &str = "/v3/kv/range";
const PUT_PATH: &str = "/v3/kv/put";
const DELETE_RANGE_PATH: &str = "/v3/kv/deleterange";

/// etcd v3 store reached through its JSON gateway.
pub struct GatewayStore {
    runtime: tokio::runtime::Runtime,
    client: reqwest::Client,
    endpoints: Vec<Url>,
}

impl GatewayStore {
    /// Build a client for the configured endpoints.
    ///
    /// No request is made here; the first store call dials the first
    /// endpoint, falling through to the next ones on connection failures.
    pub fn connect(config: &ClientConfig) -> StoreResult<Self> {
        let endpoints = config
            .endpoints
            .iter()
            .map(|e| parse_endpoint(e))
            .collect::<StoreResult<Vec<_>>>()?;
        if endpoints.is_empty() {
            return Err(StoreError::InvalidEndpoint {
                endpoint: String::new(),
                reason: "no endpoints configured".into(),
            });
        }

        let client = reqwest::Client::builder()
            .connect_timeout(config.dial_timeout())
            .tcp_keepalive(config.keepalive_interval())
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        tracing::debug!(endpoints = ?config.endpoints, timeout = config.timeout_secs, "store client ready");
        Ok(Self {
            runtime,
            client,
            endpoints,
        })
    }

    /// Endpoints in the order they are tried.
    pub fn endpoints(&self) -> &[Url] {
        &self.endpoints
    }

    fn call<Req, Resp>(&self, path: &str, body: &Req) -> StoreResult<Resp>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let mut last = String::new();
        for endpoint in &self.endpoints {
            let url = endpoint.join(path).map_err(|e| StoreError::InvalidEndpoint {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })?;
            match self.runtime.block_on(self.post(url, body)) {
                Err(Attempt::Unreachable(reason)) => {
                    tracing::warn!("endpoint {} unreachable: {}", endpoint, reason);
                    last = reason;
                }
                Err(Attempt::Failed(err)) => return Err(err),
                Ok(resp) => return Ok(resp),
            }
        }
        Err(StoreError::Unreachable {
            tried: self.endpoints.len(),
            last,
        })
    }

    async fn post<Req, Resp>(&self, url: Url, body: &Req) -> Result<Resp, Attempt>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let resp = self.client.post(url).json(body).send().await.map_err(|e| {
            if e.is_connect() {
                Attempt::Unreachable(e.to_string())
            } else {
                Attempt::Failed(StoreError::Transport(e.to_string()))
            }
        })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(Attempt::Failed(StoreError::Server {
                status: status.as_u16(),
                message: error_message(&text),
            }));
        }
        resp.json::<Resp>()
            .await
            .map_err(|e| Attempt::Failed(StoreError::MalformedResponse(e.to_string())))
    }
}

enum Attempt {
    Unreachable(String),
    Failed(StoreError),
}

impl KvStore for GatewayStore {
    fn get(&self, key: &[u8], opts: GetOptions) -> StoreResult<Vec<Entry>> {
        let req = RangeRequest::new(key, opts.prefix)
            .keys_only(opts.keys_only)
            .ascending(opts.sort_ascending);
        let resp: RangeResponse = self.call(RANGE_PATH, &req)?;
        resp.kvs.into_iter().map(WireKeyValue::into_entry).collect()
    }

    fn put(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        let req = PutRequest {
            key: BASE64.encode(key),
            value: BASE64.encode(value),
        };
        let _: IgnoredAny = self.call(PUT_PATH, &req)?;
        Ok(())
    }

    fn delete(&self, key: &[u8], prefix: bool) -> StoreResult<u64> {
        let (key, range_end) = encode_range(key, prefix);
        let req = DeleteRangeRequest { key, range_end };
        let resp: DeleteRangeResponse = self.call(DELETE_RANGE_PATH, &req)?;
        Ok(resp.deleted.max(0) as u64)
    }

    fn count(&self, prefix: &[u8]) -> StoreResult<u64> {
        let mut req = RangeRequest::new(prefix, true);
        req.count_only = true;
        let resp: RangeResponse = self.call(RANGE_PATH, &req)?;
        Ok(resp.count.max(0) as u64)
    }
}

impl std::fmt::Debug for GatewayStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let endpoints: Vec<&str> = self.endpoints.iter().map(Url::as_str).collect();
        f.debug_struct("GatewayStore")
            .field("endpoints", &endpoints)
            .finish()
    }
}

/// Accepts `host:port` as well as full URLs; bare endpoints get `http://`.
fn parse_endpoint(raw: &str) -> StoreResult<Url> {
    let raw = raw.trim();
    let candidate = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("http://{raw}")
    };
    Url::parse(&candidate).map_err(|e| StoreError::InvalidEndpoint {
        endpoint: raw.to_string(),
        reason: e.to_string(),
    })
}

fn encode_range(key: &[u8], prefix: bool) -> (String, Option<String>) {
    if prefix {
        (
            BASE64.encode(prefix_range_start(key)),
            Some(BASE64.encode(prefix_range_end(key))),
        )
    } else {
        (BASE64.encode(key), None)
    }
}

/// Pull a human-readable message out of a gateway error body.
fn error_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        #[serde(default)]
        message: String,
        #[serde(default)]
        error: String,
    }
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(b) if !b.message.is_empty() => b.message,
        Ok(b) if !b.error.is_empty() => b.error,
        _ => body.trim().to_string(),
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct RangeRequest {
    key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    range_end: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    keys_only: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    count_only: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    sort_order: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sort_target: Option<&'static str>,
}

impl RangeRequest {
    fn new(key: &[u8], prefix: bool) -> Self {
        let (key, range_end) = encode_range(key, prefix);
        Self {
            key,
            range_end,
            keys_only: false,
            count_only: false,
            sort_order: None,
            sort_target: None,
        }
    }

    fn keys_only(mut self, on: bool) -> Self {
        self.keys_only = on;
        self
    }

    fn ascending(mut self, on: bool) -> Self {
        if on {
            self.sort_order = Some("ASCEND");
            self.sort_target = Some("KEY");
        }
        self
    }
}

#[derive(Debug, Deserialize)]
struct RangeResponse {
    #[serde(default)]
    kvs: Vec<WireKeyValue>,
    #[serde(default, deserialize_with = "int64")]
    count: i64,
}

#[derive(Debug, Deserialize)]
struct WireKeyValue {
    key: String,
    #[serde(default)]
    value: String,
    #[serde(default, deserialize_with = "int64")]
    create_revision: i64,
    #[serde(default, deserialize_with = "int64")]
    mod_revision: i64,
    #[serde(default, deserialize_with = "int64")]
    version: i64,
}

impl WireKeyValue {
    fn into_entry(self) -> StoreResult<Entry> {
        let key = BASE64
            .decode(&self.key)
            .map_err(|e| StoreError::MalformedResponse(format!("key: {e}")))?;
        let value = BASE64
            .decode(&self.value)
            .map_err(|e| StoreError::MalformedResponse(format!("value: {e}")))?;
        Ok(Entry {
            key,
            value,
            version: self.version,
            create_revision: self.create_revision,
            mod_revision: self.mod_revision,
        })
    }
}

#[derive(Debug, Serialize)]
struct PutRequest {
    key: String,
    value: String,
}

#[derive(Debug, Serialize)]
struct DeleteRangeRequest {
    key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    range_end: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DeleteRangeResponse {
    #[serde(default, deserialize_with = "int64")]
    deleted: i64,
}

/// int64 fields arrive as strings under the proto3 JSON mapping; accept
/// plain numbers too.
fn int64<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(i64),
        Text(String),
    }
    match Raw::deserialize(d)? {
        Raw::Num(n) => Ok(n),
        Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
    }
}
