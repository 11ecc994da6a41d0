// HomeSeer JSON API HTTP client
//
// Wraps `reqwest::Client` with HomeSeer-specific URL construction and
// response unwrapping. Every request hits the single `/JSON` endpoint;
// the `request` query parameter selects the operation.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::channel::{QueryChannel, RawRef};
use crate::error::Error;
use crate::json::models::{
    ControlRecord, ControlResponse, EventRecord, EventsResponse, StatusRecord, StatusResponse,
};
use crate::transport::TransportConfig;

/// Raw HTTP client for the HomeSeer JSON API.
///
/// Handles basic auth and the `/JSON?request=...` request shape. All
/// methods return unwrapped record lists -- the `{"Devices": [...]}` /
/// `{"Events": [...]}` envelopes are stripped before the caller sees them.
pub struct JsonClient {
    http: reqwest::Client,
    base_url: Url,
    username: String,
    password: String,
}

impl JsonClient {
    /// Create a new JSON API client for `http://{host}:{port}/JSON`.
    pub fn new(
        host: &str,
        http_port: u16,
        username: &str,
        password: &str,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let base_url = Url::parse(&format!("http://{host}:{http_port}/JSON"))?;
        Ok(Self {
            http: transport.build_client()?,
            base_url,
            username: username.to_owned(),
            password: password.to_owned(),
        })
    }

    /// Create a client from a pre-parsed endpoint URL (tests, proxies).
    pub fn from_url(
        base_url: Url,
        username: &str,
        password: &str,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client()?,
            base_url,
            username: username.to_owned(),
            password: password.to_owned(),
        })
    }

    /// The JSON API endpoint URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Request plumbing ─────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, params: &[(&str, String)]) -> Result<T, Error> {
        let response = self
            .http
            .get(self.base_url.clone())
            .query(params)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::Authentication {
                message: "JSON API rejected credentials".into(),
            });
        }
        let response = response.error_for_status()?;

        let body = response.text().await?;
        trace!(bytes = body.len(), "JSON API response body");

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }

    async fn post(&self, json: &serde_json::Value) -> Result<(), Error> {
        let response = self
            .http
            .post(self.base_url.clone())
            .json(json)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::Authentication {
                message: "JSON API rejected credentials".into(),
            });
        }
        response.error_for_status()?;
        Ok(())
    }
}

#[async_trait]
impl QueryChannel for JsonClient {
    async fn get_status(&self, device_ref: Option<RawRef>) -> Result<Vec<StatusRecord>, Error> {
        let mut params = vec![("request", "getstatus".to_owned())];
        if let Some(r) = device_ref {
            params.push(("ref", r.to_string()));
        }
        debug!(device_ref, "requesting device status");
        let resp: StatusResponse = self.get(&params).await?;
        Ok(resp.devices)
    }

    async fn get_control(&self, device_ref: Option<RawRef>) -> Result<Vec<ControlRecord>, Error> {
        let mut params = vec![("request", "getcontrol".to_owned())];
        if let Some(r) = device_ref {
            params.push(("ref", r.to_string()));
        }
        debug!(device_ref, "requesting device control pairs");
        let resp: ControlResponse = self.get(&params).await?;
        Ok(resp.devices)
    }

    async fn get_events(&self) -> Result<Vec<EventRecord>, Error> {
        debug!("requesting automation events");
        let resp: EventsResponse = self.get(&[("request", "getevents".to_owned())]).await?;
        Ok(resp.events)
    }

    async fn control_by_value(&self, device_ref: RawRef, value: f64) -> Result<(), Error> {
        debug!(device_ref, value, "controlling device by value");
        // The control response body carries nothing actionable; success
        // is the HTTP status.
        let _: serde_json::Value = self
            .get(&[
                ("request", "controldevicebyvalue".to_owned()),
                ("ref", device_ref.to_string()),
                ("value", value.to_string()),
            ])
            .await?;
        Ok(())
    }

    async fn run_event(&self, group: &str, name: &str) -> Result<(), Error> {
        debug!(group, name, "running automation event");
        self.post(&serde_json::json!({
            "action": "runevent",
            "group": group,
            "name": name,
        }))
        .await
    }
}
