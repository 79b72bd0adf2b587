//! Gateway client configuration and the request send path.

use http::header::{HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CACHE_CONTROL, CONNECTION};

use super::error::GatewayError;
use super::request::GatewayRequest;

/// Explicit per-call metadata.
///
/// Carried as a plain value through the call chain instead of an ambient
/// request-scoped lookup, so every call site states what it sends. The
/// authorization value is injected as the `Authorization` header, replacing
/// any value the transport would otherwise send.
///
/// # Examples
///
/// ```
/// use gateway_client::CallMeta;
///
/// let meta = CallMeta::new()
///     .authorization("Bearer token")
///     .header("x-request-id", "abc-123");
/// ```
#[derive(Clone, Debug, Default)]
pub struct CallMeta {
    authorization: Option<String>,
    headers: Vec<(String, String)>,
}

impl CallMeta {
    /// Empty metadata — nothing extra is sent.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the `Authorization` header value for this call.
    #[must_use]
    pub fn authorization(mut self, value: impl Into<String>) -> Self {
        self.authorization = Some(value.into());
        self
    }

    /// Add an extra header for this call.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Apply the metadata to an outgoing request.
    ///
    /// Header names and values are validated here rather than at
    /// construction so [`CallMeta`] stays a plain data holder.
    pub(crate) fn apply(
        &self,
        mut builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::RequestBuilder, GatewayError> {
        if let Some(auth) = &self.authorization {
            let value = HeaderValue::from_str(auth).map_err(|_| {
                GatewayError::InvalidMetadata("authorization value is not a valid header".into())
            })?;
            builder = builder.header(AUTHORIZATION, value);
        }
        for (name, value) in &self.headers {
            let header_name = name.parse::<HeaderName>().map_err(|_| {
                GatewayError::InvalidMetadata(format!("invalid header name '{name}'"))
            })?;
            let header_value = HeaderValue::from_str(value).map_err(|_| {
                GatewayError::InvalidMetadata(format!("invalid value for header '{name}'"))
            })?;
            builder = builder.header(header_name, header_value);
        }
        Ok(builder)
    }
}

/// Configured gateway client: base URL plus the HTTP transport.
///
/// Cheap to clone; generated `{Service}GatewayClient` wrappers each own one.
///
/// # Examples
///
/// ```no_run
/// # fn main() -> Result<(), gateway_client::GatewayError> {
/// let gwc = gateway_client::GatewayClient::builder("https://api.example.com")
///     .skip_tls_verify(true)
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct GatewayClient {
    http: reqwest::Client,
    base_url: String,
}

impl GatewayClient {
    /// Create a client with the default transport.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: normalize_base_url(base_url.into()),
        }
    }

    /// Start building a client with a custom transport or TLS toggle.
    #[must_use]
    pub fn builder(base_url: impl Into<String>) -> GatewayClientBuilder {
        GatewayClientBuilder {
            base_url: base_url.into(),
            http_client: None,
            skip_tls_verify: false,
        }
    }

    /// Begin a request for `pattern` (may contain `{name}` placeholders).
    #[must_use]
    pub fn request(&self, method: http::Method, pattern: &str) -> GatewayRequest {
        GatewayRequest::new(method, pattern)
    }

    /// Send a constructed request, applying per-call metadata.
    ///
    /// Streaming sends advertise `text/event-stream` and leave the body
    /// unparsed for the caller.
    pub(crate) async fn send(
        &self,
        meta: &CallMeta,
        req: GatewayRequest,
        streaming: bool,
    ) -> Result<reqwest::Response, GatewayError> {
        let url = format!("{}{}", self.base_url, req.render_path());
        let (method, query, body) = req.into_parts();

        let mut builder = self.http.request(method, &url);
        if streaming {
            builder = builder
                .header(ACCEPT, "text/event-stream")
                .header(CACHE_CONTROL, "no-cache")
                .header(CONNECTION, "keep-alive");
        }
        if !query.is_empty() {
            builder = builder.query(&query);
        }
        if let Some(body) = body {
            builder = builder
                .header(http::header::CONTENT_TYPE, "application/json")
                .body(body);
        }
        builder = meta.apply(builder)?;
        Ok(builder.send().await?)
    }
}

/// Builder for [`GatewayClient`].
///
/// A caller-supplied HTTP client is used as-is (bring your own middleware,
/// pools, proxies); otherwise one is constructed honoring the
/// TLS-verification toggle.
#[derive(Debug)]
pub struct GatewayClientBuilder {
    base_url: String,
    http_client: Option<reqwest::Client>,
    skip_tls_verify: bool,
}

impl GatewayClientBuilder {
    /// Use a pre-configured HTTP client.
    ///
    /// The TLS toggle does not apply to a supplied client — configure TLS
    /// on the client itself.
    #[must_use]
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Skip TLS certificate verification (self-signed gateways, tests).
    #[must_use]
    pub fn skip_tls_verify(mut self, skip: bool) -> Self {
        self.skip_tls_verify = skip;
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Transport`] if the underlying HTTP client
    /// cannot be constructed.
    pub fn build(self) -> Result<GatewayClient, GatewayError> {
        let http = match self.http_client {
            Some(client) => client,
            None => reqwest::Client::builder()
                .danger_accept_invalid_certs(self.skip_tls_verify)
                .build()?,
        };
        Ok(GatewayClient {
            http,
            base_url: normalize_base_url(self.base_url),
        })
    }
}

fn normalize_base_url(mut base_url: String) -> String {
    while base_url.ends_with('/') {
        base_url.pop();
    }
    base_url
}
