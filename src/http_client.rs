use crate::{config::DeviceConfig, error::SubmitError, schema::NormalizedConfig};
use anyhow::{Context, Result};
use reqwest::{
    Client, RequestBuilder, Response, Url,
    header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue},
};
use serde_json::Value;

/// Create the HTTP client used to reach the device
///
/// No timeout is applied unless one is configured.
///
/// # Examples
/// ```no_run
/// use esp32cfg_form::{config::DeviceConfig, http_client::device_client};
///
/// let client = device_client(&DeviceConfig::default()).expect("failed to create client");
/// ```
pub fn device_client(config: &DeviceConfig) -> Result<Client> {
    let mut builder = Client::builder();

    if let Some(timeout) = config.request_timeout {
        builder = builder.timeout(timeout);
    }

    builder.build().context("failed to create device HTTP client")
}

/// A JSON POST of a normalized config to the form's action URL.
///
/// The page issues this request with `mode: "cors"` and `keepalive: false`.
/// Neither has a native counterpart: the request lives only as long as the
/// submission awaiting it and no CORS headers are added.
#[derive(Clone, Debug)]
pub struct RequestEnvelope {
    pub url: Url,
    pub headers: HeaderMap,
    pub body: String,
}

impl RequestEnvelope {
    pub fn json_post(url: Url, config: &NormalizedConfig) -> Result<Self, SubmitError> {
        let body = config.to_json().map_err(SubmitError::Encode)?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Ok(Self { url, headers, body })
    }

    pub fn into_request(self, client: &Client) -> RequestBuilder {
        client.post(self.url).headers(self.headers).body(self.body)
    }
}

/// Turn a device response into the parsed JSON body
///
/// # Returns
/// * `Ok(Value)` - The parsed body of a 2xx response
/// * `Err(SubmitError::Status)` - Any other status, carrying the raw body as message
/// * `Err(SubmitError::Parse)` - A 2xx response whose body is not JSON
pub async fn handle_json_response(res: Response) -> Result<Value, SubmitError> {
    let status = res.status();

    if !status.is_success() {
        let message = res.text().await?;
        return Err(SubmitError::Status { status, message });
    }

    let body = res.bytes().await?;
    serde_json::from_slice(&body).map_err(SubmitError::Parse)
}
