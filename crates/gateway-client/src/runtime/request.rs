//! Request construction and the unary request engine.

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::body::HttpBody;
use super::client::{CallMeta, GatewayClient};
use super::error::{status_from_error_body, GatewayError};

/// One gateway request under construction.
///
/// Created by [`GatewayClient::request`]; generated bindings fill in path
/// substitutions, query parameters, and the JSON body before handing it to
/// one of the engine entry points.
#[derive(Debug)]
pub struct GatewayRequest {
    method: http::Method,
    pattern: String,
    path_params: Vec<(String, String)>,
    query: Vec<(String, String)>,
    body: Option<Vec<u8>>,
}

impl GatewayRequest {
    pub(crate) fn new(method: http::Method, pattern: &str) -> Self {
        Self {
            method,
            pattern: pattern.to_string(),
            path_params: Vec::new(),
            query: Vec::new(),
            body: None,
        }
    }

    /// Substitute the `{name}` placeholder with a percent-encoded value.
    pub fn path_param(&mut self, name: &str, value: impl Into<String>) {
        self.path_params.push((name.to_string(), value.into()));
    }

    /// Append query parameters.
    pub fn query(&mut self, pairs: Vec<(String, String)>) {
        self.query.extend(pairs);
    }

    /// Marshal `body` to JSON and attach it as the request body.
    ///
    /// This is the single marshalling choke point on the request side —
    /// swap the serde implementation on the message types to change the
    /// wire mapping.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Marshal`] if serialization fails.
    pub fn json_body<T: Serialize + ?Sized>(&mut self, body: &T) -> Result<(), GatewayError> {
        self.body = Some(serde_json::to_vec(body).map_err(GatewayError::Marshal)?);
        Ok(())
    }

    /// Render the URL path: every `{name}` placeholder replaced with its
    /// percent-encoded value. Placeholder/field agreement is enforced at
    /// generation time, so leftovers can only come from hand-built requests.
    pub(crate) fn render_path(&self) -> String {
        let mut path = self.pattern.clone();
        for (name, value) in &self.path_params {
            let needle = format!("{{{name}}}");
            if let Some(pos) = path.find(&needle) {
                path.replace_range(pos..pos + needle.len(), &urlencoding::encode(value));
            }
        }
        path
    }

    pub(crate) fn into_parts(
        self,
    ) -> (http::Method, Vec<(String, String)>, Option<Vec<u8>>) {
        (self.method, self.query, self.body)
    }
}

impl GatewayClient {
    /// Execute a unary call and JSON-decode the response into `T`.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::Transport`] — the request could not be sent or the
    ///   body could not be read
    /// - [`GatewayError::Status`] — the server returned a non-success
    ///   status, propagated from its status payload or synthesized from the
    ///   HTTP status code
    /// - [`GatewayError::Decode`] — the success payload did not match `T`
    pub async fn unary<T: DeserializeOwned>(
        &self,
        meta: CallMeta,
        req: GatewayRequest,
    ) -> Result<T, GatewayError> {
        let res = self.send(&meta, req, false).await?;
        let status = res.status();
        let bytes = res.bytes().await?;
        if !status.is_success() {
            return Err(status_from_error_body(status, &bytes));
        }
        serde_json::from_slice(&bytes).map_err(GatewayError::Decode)
    }

    /// Execute a unary call whose response carries no payload
    /// (`google.protobuf.Empty`). The body is checked for an error status
    /// and otherwise discarded.
    ///
    /// # Errors
    ///
    /// Same as [`GatewayClient::unary`], minus decoding.
    pub async fn unary_empty(
        &self,
        meta: CallMeta,
        req: GatewayRequest,
    ) -> Result<(), GatewayError> {
        let res = self.send(&meta, req, false).await?;
        let status = res.status();
        if !status.is_success() {
            let bytes = res.bytes().await?;
            return Err(status_from_error_body(status, &bytes));
        }
        Ok(())
    }

    /// Execute a unary call returning the raw response verbatim: bytes plus
    /// the `Content-Type` header, no JSON decoding. Used for binary/file
    /// downloads (`google.api.HttpBody` results).
    ///
    /// # Errors
    ///
    /// Same as [`GatewayClient::unary`], minus decoding.
    pub async fn unary_raw(
        &self,
        meta: CallMeta,
        req: GatewayRequest,
    ) -> Result<HttpBody, GatewayError> {
        let res = self.send(&meta, req, false).await?;
        let status = res.status();
        let content_type = content_type_of(&res);
        let bytes = res.bytes().await?;
        if !status.is_success() {
            return Err(status_from_error_body(status, &bytes));
        }
        Ok(HttpBody {
            content_type,
            data: bytes,
        })
    }
}

pub(crate) fn content_type_of(res: &reqwest::Response) -> String {
    res.headers()
        .get(http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn request(pattern: &str) -> GatewayRequest {
        GatewayRequest::new(http::Method::GET, pattern)
    }

    #[test]
    fn render_path_substitutes_placeholders() {
        let mut req = request("/v1/items/{item_id}");
        req.path_param("item_id", "abc-123");
        assert_eq!(req.render_path(), "/v1/items/abc-123");
    }

    #[test]
    fn render_path_percent_encodes() {
        let mut req = request("/v1/items/{item_id}");
        req.path_param("item_id", "a b/c");
        assert_eq!(req.render_path(), "/v1/items/a%20b%2Fc");
    }

    #[test]
    fn render_path_multiple_placeholders() {
        let mut req = request("/v1/{org}/items/{item_id}");
        req.path_param("org", "acme");
        req.path_param("item_id", "42");
        assert_eq!(req.render_path(), "/v1/acme/items/42");
    }

    #[test]
    fn render_path_without_params_is_identity() {
        assert_eq!(request("/v1/items").render_path(), "/v1/items");
    }

    #[test]
    fn json_body_marshals() {
        #[derive(serde::Serialize)]
        struct Req {
            email: String,
        }
        let mut req = GatewayRequest::new(http::Method::POST, "/v1/invitations");
        req.json_body(&Req {
            email: "a@b.c".to_string(),
        })
        .unwrap();
        let (_, _, body) = req.into_parts();
        assert_eq!(body.unwrap(), br#"{"email":"a@b.c"}"#);
    }

    #[test]
    fn query_pairs_accumulate() {
        let mut req = request("/v1/items");
        req.query(vec![("a".to_string(), "1".to_string())]);
        req.query(vec![("b".to_string(), "2".to_string())]);
        let (_, query, _) = req.into_parts();
        assert_eq!(
            query,
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "2".to_string()),
            ],
        );
    }
}
