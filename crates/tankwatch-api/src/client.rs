// Async HTTP client for the level service and the station order API.
//
// Two base URLs: the level service (`GET /get_level`, push channel on the
// same host) and the order API (`/orders/`, mail-dispatch endpoints).
// Both are normalized to end in `/` so relative joins append instead of
// replacing the last path segment.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;
use crate::types::{EmailBody, LevelPayload, Order, OrderRequest, Percent, StatusUpdate};

/// Default path of the "order placed" mail dispatch, relative to the API base.
pub const DEFAULT_NOTIFY_PATH: &str = "send-Order/";
const APPROVAL_NOTIFY_PATH: &str = "send-Order-Approved/";
const APPROVED_STATUS: &str = "Approved";
/// Longest server error body carried into an [`Error::Api`] message.
const MAX_ERROR_BODY: usize = 256;

// ── Endpoints ────────────────────────────────────────────────────────

/// Where the two services live.
#[derive(Debug, Clone)]
pub struct Endpoints {
    /// Level service root (e.g. `http://localhost:5000`).
    pub level_url: Url,
    /// Order API root (e.g. `http://localhost:8000/api/`).
    pub api_url: Url,
    /// Reorder mail-dispatch path relative to `api_url`.
    pub notify_path: String,
}

impl Endpoints {
    pub fn new(level_url: Url, api_url: Url) -> Self {
        Self {
            level_url,
            api_url,
            notify_path: DEFAULT_NOTIFY_PATH.into(),
        }
    }
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the level service and order API.
pub struct FuelApiClient {
    http: reqwest::Client,
    level_url: Url,
    api_url: Url,
    notify_path: String,
}

impl FuelApiClient {
    /// Build from endpoints and a transport config.
    pub fn new(endpoints: Endpoints, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, endpoints))
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, endpoints: Endpoints) -> Self {
        Self {
            http,
            level_url: with_trailing_slash(endpoints.level_url),
            api_url: with_trailing_slash(endpoints.api_url),
            notify_path: endpoints.notify_path.trim_start_matches('/').to_owned(),
        }
    }

    pub fn level_url(&self) -> &Url {
        &self.level_url
    }

    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    // ── Level service ────────────────────────────────────────────────

    /// `GET /get_level`. A missing or null `level` reads as 0.
    pub async fn fetch_level(&self) -> Result<Percent, Error> {
        let url = self.level_url.join("get_level")?;
        let payload: LevelPayload = self.get(url).await?;
        Percent::new(payload.level.unwrap_or(0.0))
    }

    // ── Orders ───────────────────────────────────────────────────────

    /// `POST /orders/`. Any 2xx (normally 201 Created) counts as success.
    pub async fn create_order(&self, order: &OrderRequest) -> Result<(), Error> {
        let url = self.api_url.join("orders/")?;
        self.send_json(reqwest::Method::POST, url, order).await
    }

    /// Mail the requester that an automatic order was filed.
    pub async fn send_reorder_notification(&self, email: &str) -> Result<(), Error> {
        let url = self.api_url.join(&self.notify_path)?;
        self.send_json(reqwest::Method::POST, url, &EmailBody { email })
            .await
    }

    /// `GET /orders/`.
    pub async fn list_orders(&self) -> Result<Vec<Order>, Error> {
        let url = self.api_url.join("orders/")?;
        self.get(url).await
    }

    /// `GET /orders/{id}/`.
    pub async fn get_order(&self, id: u64) -> Result<Order, Error> {
        let url = self.api_url.join(&format!("orders/{id}/"))?;
        self.get(url).await
    }

    /// `PATCH /orders/{id}/` with `{"status": "Approved"}`.
    pub async fn approve_order(&self, id: u64) -> Result<(), Error> {
        let url = self.api_url.join(&format!("orders/{id}/"))?;
        self.send_json(
            reqwest::Method::PATCH,
            url,
            &StatusUpdate {
                status: APPROVED_STATUS,
            },
        )
        .await
    }

    /// Mail the requester that their order was approved.
    pub async fn send_approval_notification(&self, email: &str) -> Result<(), Error> {
        let url = self.api_url.join(APPROVAL_NOTIFY_PATH)?;
        self.send_json(reqwest::Method::POST, url, &EmailBody { email })
            .await
    }

    // ── Request helpers ──────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {url}");
        let resp = self.http.get(url).send().await?;
        let body = check_status(resp).await?;
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }

    /// Send a JSON body and discard the response body on success.
    async fn send_json<B: Serialize + Sync>(
        &self,
        method: reqwest::Method,
        url: Url,
        body: &B,
    ) -> Result<(), Error> {
        debug!("{method} {url}");
        let resp = self.http.request(method, url).json(body).send().await?;
        check_status(resp).await.map(drop)
    }
}

/// Return the body of a 2xx response, or an [`Error::Api`] carrying the
/// (truncated) error body.
async fn check_status(resp: reqwest::Response) -> Result<String, Error> {
    let status = resp.status();
    let body = resp.text().await?;
    if status.is_success() {
        return Ok(body);
    }

    let mut message = body.trim().to_owned();
    if message.is_empty() {
        message = status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_owned();
    } else if message.len() > MAX_ERROR_BODY {
        let cut = (0..=MAX_ERROR_BODY)
            .rev()
            .find(|i| message.is_char_boundary(*i))
            .unwrap_or(0);
        message.truncate(cut);
        message.push('…');
    }

    Err(Error::Api {
        status: status.as_u16(),
        message,
    })
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
