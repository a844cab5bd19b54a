//! Transport-neutral request and response types.
//!
//! `server` converts `tiny_http` requests into [`ApiRequest`] and writes
//! [`ApiResponse`] back; the router and handlers only see these types, which
//! is what lets the router tests run without a socket.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// HTTP methods the router distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Other,
}

impl Method {
    #[must_use]
    pub fn parse(method: &str) -> Self {
        match method.to_ascii_uppercase().as_str() {
            "GET" => Self::Get,
            "POST" => Self::Post,
            "PUT" => Self::Put,
            "PATCH" => Self::Patch,
            "DELETE" => Self::Delete,
            _ => Self::Other,
        }
    }
}

/// A fully read request.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Query,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl ApiRequest {
    /// Split a raw request target (`/api/cases?status=open`) into path and
    /// query.
    #[must_use]
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = target.split_once('?').unwrap_or((target, ""));
        Self {
            method,
            path: path.to_string(),
            query: Query::parse(query),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    #[must_use]
    pub fn with_json(self, value: &serde_json::Value) -> Self {
        self.with_header("Content-Type", "application/json")
            .with_body(value.to_string())
    }

    /// First header named `name`, ignoring case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Value of the cookie `name` from the `Cookie` header.
    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case("cookie"))
            .flat_map(|(_, v)| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.trim_matches('"'))
            .filter(|v| !v.is_empty())
    }

    /// Parse the body as JSON. An empty body is an error.
    ///
    /// # Errors
    ///
    /// Returns a 400 [`ApiError`] for a missing or malformed body.
    pub fn json_value(&self) -> Result<serde_json::Value, ApiError> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Err(ApiError::bad_request("request body is required"));
        }
        serde_json::from_slice(&self.body)
            .map_err(|e| ApiError::bad_request(format!("invalid JSON body: {e}")))
    }
}

/// Decoded query-string parameters, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pairs: Vec<(String, String)>,
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced).map_or(spaced.clone(), std::borrow::Cow::into_owned)
}

impl Query {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let pairs = raw
            .split('&')
            .filter(|p| !p.is_empty())
            .map(|pair| {
                let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
                (decode_component(k), decode_component(v))
            })
            .collect();
        Self { pairs }
    }

    /// Last non-empty value for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .rev()
            .find(|(k, v)| k == name && !v.trim().is_empty())
            .map(|(_, v)| v.trim())
    }

    /// Owned copy of [`Self::get`].
    #[must_use]
    pub fn string(&self, name: &str) -> Option<String> {
        self.get(name).map(str::to_string)
    }

    /// Parse a snake_case enum value.
    ///
    /// # Errors
    ///
    /// Returns 400 naming the parameter when the value is not a variant.
    pub fn enum_value<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, ApiError> {
        self.get(name)
            .map(|v| {
                serde_json::from_value(serde_json::Value::String(v.to_string())).map_err(|_| {
                    ApiError::bad_request(format!("invalid value '{v}' for query parameter {name}"))
                })
            })
            .transpose()
    }

    /// # Errors
    ///
    /// Returns 400 when the value is not a non-negative integer.
    pub fn u32_value(&self, name: &str) -> Result<Option<u32>, ApiError> {
        self.get(name)
            .map(|v| {
                v.parse::<u32>().map_err(|_| {
                    ApiError::bad_request(format!("query parameter {name} must be a number"))
                })
            })
            .transpose()
    }

    /// Accepts `true`/`false`/`1`/`0`; absent means `false`.
    ///
    /// # Errors
    ///
    /// Returns 400 for anything else.
    pub fn flag(&self, name: &str) -> Result<bool, ApiError> {
        match self.get(name) {
            None => Ok(false),
            Some(v) if v.eq_ignore_ascii_case("true") || v == "1" => Ok(true),
            Some(v) if v.eq_ignore_ascii_case("false") || v == "0" => Ok(false),
            Some(_) => Err(ApiError::bad_request(format!(
                "query parameter {name} must be true or false"
            ))),
        }
    }
}

/// A response ready to be written to the socket.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl ApiResponse {
    /// Serialize `value` as the JSON body.
    ///
    /// # Errors
    ///
    /// Returns 500 if serialization fails.
    pub fn json<T: Serialize>(status: u16, value: &T) -> Result<Self, ApiError> {
        let body = serde_json::to_vec(value).map_err(|e| ApiError::Internal(e.into()))?;
        Ok(Self {
            status,
            headers: vec![("Content-Type".into(), "application/json".into())],
            body,
        })
    }

    /// 200 with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`Self::json`].
    pub fn ok<T: Serialize>(value: &T) -> Result<Self, ApiError> {
        Self::json(200, value)
    }

    /// 201 with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`Self::json`].
    pub fn created<T: Serialize>(value: &T) -> Result<Self, ApiError> {
        Self::json(201, value)
    }

    #[must_use]
    pub const fn no_content() -> Self {
        Self {
            status: 204,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Body parsed as JSON, for tests and logging.
    ///
    /// # Errors
    ///
    /// Returns the serde error when the body is not JSON.
    pub fn body_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn query_decodes_plus_and_percent() {
        let query = Query::parse("q=shoulder+strain&case_id=cas-1&empty=&x=%C3%A9");
        assert_eq!(query.get("q"), Some("shoulder strain"));
        assert_eq!(query.get("case_id"), Some("cas-1"));
        assert_eq!(query.get("empty"), None);
        assert_eq!(query.get("x"), Some("é"));
    }

    #[test]
    fn query_last_value_wins() {
        let query = Query::parse("limit=5&limit=7");
        assert_eq!(query.u32_value("limit").unwrap(), Some(7));
    }

    #[test]
    fn query_rejects_bad_numbers_and_flags() {
        let query = Query::parse("limit=ten&overdue=maybe");
        assert_eq!(query.u32_value("limit").unwrap_err().status(), 400);
        assert_eq!(query.flag("overdue").unwrap_err().status(), 400);
        assert!(!Query::default().flag("overdue").unwrap());
    }

    #[test]
    fn query_enum_values() {
        use casewise_core::enums::CaseStatus;
        let query = Query::parse("status=on_hold&bad=paused");
        assert_eq!(
            query.enum_value::<CaseStatus>("status").unwrap(),
            Some(CaseStatus::OnHold)
        );
        assert!(query.enum_value::<CaseStatus>("bad").is_err());
        assert_eq!(query.enum_value::<CaseStatus>("missing").unwrap(), None);
    }

    #[test]
    fn request_splits_target() {
        let req = ApiRequest::new(Method::Get, "/api/cases?status=open");
        assert_eq!(req.path, "/api/cases");
        assert_eq!(req.query.get("status"), Some("open"));
    }

    #[test]
    fn cookie_lookup() {
        let req = ApiRequest::new(Method::Get, "/")
            .with_header("Cookie", "theme=dark; casewise_session=abc123; other=1");
        assert_eq!(req.cookie("casewise_session"), Some("abc123"));
        assert_eq!(req.cookie("missing"), None);
    }

    #[test]
    fn empty_body_is_rejected() {
        let req = ApiRequest::new(Method::Post, "/api/cases").with_body("  \n");
        assert_eq!(req.json_value().unwrap_err().status(), 400);
        let req = ApiRequest::new(Method::Post, "/api/cases").with_body("{oops");
        assert_eq!(req.json_value().unwrap_err().status(), 400);
    }

    #[test]
    fn method_parse_is_case_insensitive() {
        assert_eq!(Method::parse("patch"), Method::Patch);
        assert_eq!(Method::parse("OPTIONS"), Method::Other);
    }
}
