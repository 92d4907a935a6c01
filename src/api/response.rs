//! The captured result of one HTTP exchange.

use serde_json::Value;

use crate::api::executor::{HttpResponse, Params};

/// Everything one exchange produced, kept together for inspection.
///
/// Built once per round trip and immutable afterwards. JSON decoding is
/// attempted exactly once, at construction; a body that is not valid JSON is
/// an expected state (an empty logout body, an HTML error page), not an
/// error.
#[derive(Debug, Clone)]
pub struct Response {
    url: String,
    parameters: Params,
    status: u16,
    content_type: Option<String>,
    headers: Vec<(String, String)>,
    body: String,
    json: Option<Value>,
}

impl Response {
    pub(crate) fn new(url: String, parameters: Params, raw: HttpResponse) -> Self {
        let content_type = raw
            .headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("content-type"))
            .map(|(_, value)| value.clone());
        let json = serde_json::from_str(&raw.body).ok();
        Self {
            url,
            parameters,
            status: raw.status,
            content_type,
            headers: raw.headers,
            body: raw.body,
            json,
        }
    }

    /// The URL the request actually went to, query string included.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The merged parameter set the request carried.
    pub fn parameters(&self) -> &Params {
        &self.parameters
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Decoded JSON body. `None` means the body was not valid JSON at all; a
    /// literal JSON `null` body decodes to `Some(Value::Null)`, so the two
    /// remain distinguishable.
    pub fn json(&self) -> Option<&Value> {
        self.json.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(status: u16, content_type: &str, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: vec![("Content-Type".to_string(), content_type.to_string())],
            body: body.to_string(),
        }
    }

    #[test]
    fn decodes_json_bodies() {
        let response = Response::new(
            "https://api.rabota.ru/v1/me.json".to_string(),
            Params::new(),
            raw(200, "application/json", r#"{"id":7}"#),
        );
        assert_eq!(response.status(), 200);
        assert_eq!(response.json().and_then(|json| json.get("id")).and_then(Value::as_u64), Some(7));
    }

    #[test]
    fn non_json_body_is_kept_with_no_decode() {
        let response = Response::new(
            "https://api.rabota.ru/oauth/logout.json".to_string(),
            Params::new(),
            raw(200, "text/plain", ""),
        );
        assert!(response.json().is_none());
        assert_eq!(response.body(), "");
    }

    #[test]
    fn literal_null_body_stays_distinguishable() {
        let response = Response::new(
            "https://api.rabota.ru/v1/x.json".to_string(),
            Params::new(),
            raw(200, "application/json", "null"),
        );
        assert_eq!(response.json(), Some(&Value::Null));
    }

    #[test]
    fn content_type_lookup_is_case_insensitive() {
        let response = Response::new(
            "https://api.rabota.ru/v1/x.json".to_string(),
            Params::new(),
            HttpResponse {
                status: 200,
                headers: vec![("content-type".to_string(), "application/json".to_string())],
                body: "{}".to_string(),
            },
        );
        assert_eq!(response.content_type(), Some("application/json"));
    }
}
