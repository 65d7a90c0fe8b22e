//! Request building and transport.
//!
//! Every operation of the add-on is a GET to
//! `https://<host>/woocommerce/?wc-api=software-api&request=<op>&...`.
//! Parameters keep the order in which the call site lists them and are left
//! out entirely when absent or empty.

use reqwest::{Client, Response, Url};
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

use crate::client::errors::{ApiError, RemoteError};
use crate::client::responses::ApiResult;
use crate::errors::{LicenseError, LicenseResult};

/// Path of the WooCommerce API entry point on every host.
pub const API_PATH: &str = "/woocommerce/";

/// Value of the fixed `wc-api` selector.
pub const API_NAME: &str = "software-api";

/// The operations understood by the Software Add-on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    GenerateKey,
    Activation,
    ActivationReset,
    Deactivation,
    Check,
}

impl Request {
    /// Value of the `request` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Request::GenerateKey => "generate_key",
            Request::Activation => "activation",
            Request::ActivationReset => "activation_reset",
            Request::Deactivation => "deactivation",
            Request::Check => "check",
        }
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered request parameters. Absent and empty values are never sent.
#[derive(Debug, Clone, Default)]
pub struct QueryParams {
    pairs: Vec<(&'static str, Option<String>)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self, name: &'static str, value: &str) -> Self {
        self.pairs.push((name, Some(value.to_string())));
        self
    }

    pub fn optional(mut self, name: &'static str, value: Option<&str>) -> Self {
        self.pairs.push((name, value.map(str::to_string)));
        self
    }

    /// Parameters that will actually be sent, in insertion order.
    pub fn present(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        self.pairs.iter().filter_map(|(name, value)| match value {
            Some(v) if !v.is_empty() => Some((*name, v.as_str())),
            _ => None,
        })
    }
}

/// HTTP transport bound to one WooCommerce site.
#[derive(Debug, Clone)]
pub struct Transport {
    http: Client,
    endpoint: Url,
}

impl Transport {
    /// Transport for `https://<host>/woocommerce/` without a timeout.
    pub fn new(host: &str) -> LicenseResult<Self> {
        Self::for_host(host, None)
    }

    /// Transport for `https://<host>/woocommerce/`.
    pub fn for_host(host: &str, timeout: Option<Duration>) -> LicenseResult<Self> {
        let host = host.trim();
        if host.is_empty() || host.contains('/') {
            return Err(LicenseError::InvalidEndpoint(format!(
                "'{host}' is not a host name"
            )));
        }
        Self::from_base_url(&format!("https://{host}"), timeout)
    }

    /// Transport for an explicit base URL such as `http://127.0.0.1:8080`.
    ///
    /// Useful for staging sites served over plain HTTP and for tests.
    pub fn from_base_url(base_url: &str, timeout: Option<Duration>) -> LicenseResult<Self> {
        let base = Url::parse(base_url)
            .map_err(|e| LicenseError::InvalidEndpoint(format!("{base_url}: {e}")))?;
        if base.cannot_be_a_base() || base.host_str().is_none() {
            return Err(LicenseError::InvalidEndpoint(format!(
                "{base_url}: not an http(s) base URL"
            )));
        }
        // The API always lives at /woocommerce/ on the site root.
        if base.path() != "/" || base.query().is_some() {
            return Err(LicenseError::InvalidEndpoint(format!(
                "{base_url}: base URL must be scheme, host and port only"
            )));
        }
        let endpoint = base
            .join(API_PATH)
            .map_err(|e| LicenseError::InvalidEndpoint(format!("{base_url}: {e}")))?;

        let mut builder = Client::builder().user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            endpoint,
        })
    }

    /// The `/woocommerce/` URL requests are sent to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Full request URL, including the query string.
    pub fn request_url(&self, request: Request, params: &QueryParams) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("wc-api", API_NAME);
            query.append_pair("request", request.as_str());
            for (name, value) in params.present() {
                query.append_pair(name, value);
            }
        }
        url
    }

    /// Performs one request and normalizes the outcome.
    ///
    /// Never fails: transport, status, parse and remote errors are all
    /// reported through the returned [`ApiResult`].
    pub async fn get(&self, request: Request, params: &QueryParams) -> ApiResult {
        let url = self.request_url(request, params);
        let host = self.endpoint.host_str().unwrap_or_default();

        // The URL carries secrets (license and secret keys), so only the
        // parameter names are logged.
        let names: Vec<&str> = params.present().map(|(name, _)| name).collect();
        debug!(request = %request, host = %host, params = ?names, "Sending Software API request");

        // reqwest errors embed the request URL, which carries the keys.
        let response = match self.http.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                let e = e.without_url();
                warn!(request = %request, host = %host, error = %e, "Software API request failed");
                return ApiResult::transport_failure(e.to_string());
            }
        };

        let status = response.status().as_u16();
        let headers = response.headers().clone();

        if status != 200 {
            warn!(request = %request, host = %host, status, "Unexpected HTTP status");
            return ApiResult::status_failure(status, headers);
        }

        let body = match read_body(response).await {
            Ok(body) => body,
            Err(e) => {
                let e = e.without_url();
                warn!(request = %request, host = %host, error = %e, "Failed to read response body");
                return ApiResult::transport_failure(e.to_string());
            }
        };

        let value: Value = match serde_json::from_str(&body) {
            Ok(value) => value,
            Err(e) => {
                warn!(request = %request, host = %host, error = %e, "Response is not valid JSON");
                return ApiResult::invalid_json(status, headers, body, e.to_string());
            }
        };

        let result = ApiResult::json(status, headers, value);
        let remote = result.json_output().and_then(RemoteError::from_output);
        match remote {
            Some(remote) => {
                debug!(request = %request, code = %remote.raw_code, "Software API reported an error");
                result.fail_with(ApiError::Remote(remote))
            }
            None => result,
        }
    }
}

/// Collects the whole body before anything is parsed.
async fn read_body(mut response: Response) -> Result<String, reqwest::Error> {
    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        body.extend_from_slice(&chunk);
    }
    Ok(String::from_utf8_lossy(&body).into_owned())
}
