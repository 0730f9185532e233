//! Cursor pagination over JSON endpoints.
//!
//! [`Paginator`] pulls pages one at a time: each call to
//! [`Paginator::next_page`] issues a request through the owning
//! [`HttpDeliveryClient`], extracts the page's items, and remembers
//! the cursor for the next call. The stream ends when the response
//! carries no usable cursor or a request fails.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use http::Method;
use serde_json::Value;
use url::Url;

use super::{path, HttpDeliveryClient};

const DEFAULT_CURSOR_PATH: &str = "next";
const DEFAULT_ITEMS_PATH: &str = "results";
const DEFAULT_CURSOR_PARAM: &str = "page_token";

/// How to pull a value out of a page body: a nested path, or an
/// arbitrary function for response shapes a path cannot express.
#[derive(Clone)]
pub enum Extractor {
    Path(String),
    Func(Arc<dyn Fn(&Value) -> Option<Value> + Send + Sync>),
}

impl Extractor {
    fn extract(&self, page: &Value) -> Option<Value> {
        match self {
            Self::Path(p) => path::resolve(page, p).cloned(),
            Self::Func(f) => f(page),
        }
    }
}

impl fmt::Debug for Extractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(p) => f.debug_tuple("Path").field(p).finish(),
            Self::Func(_) => f.write_str("Func(..)"),
        }
    }
}

/// A paginated query: where to fetch, which params to carry, and how
/// to read the cursor and items out of each page.
#[derive(Debug, Clone)]
pub struct PageQuery {
    pub endpoint: Url,
    pub method: Method,
    pub params: HashMap<String, String>,
    pub next_cursor: Extractor,
    pub items: Extractor,
    pub cursor_param: String,
}

impl PageQuery {
    #[must_use]
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            method: Method::GET,
            params: HashMap::new(),
            next_cursor: Extractor::Path(DEFAULT_CURSOR_PATH.to_string()),
            items: Extractor::Path(DEFAULT_ITEMS_PATH.to_string()),
            cursor_param: DEFAULT_CURSOR_PARAM.to_string(),
        }
    }

    #[must_use]
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    #[must_use]
    pub fn with_params(mut self, params: HashMap<String, String>) -> Self {
        self.params = params;
        self
    }

    #[must_use]
    pub fn with_next_cursor(mut self, extractor: Extractor) -> Self {
        self.next_cursor = extractor;
        self
    }

    #[must_use]
    pub fn with_items(mut self, extractor: Extractor) -> Self {
        self.items = extractor;
        self
    }

    #[must_use]
    pub fn with_cursor_param(mut self, param: impl Into<String>) -> Self {
        self.cursor_param = param.into();
        self
    }
}

pub struct Paginator<'a> {
    client: &'a HttpDeliveryClient,
    query: PageQuery,
    cursor: Option<String>,
    exhausted: bool,
}

impl<'a> Paginator<'a> {
    pub(super) fn new(client: &'a HttpDeliveryClient, query: PageQuery) -> Self {
        Self {
            client,
            query,
            cursor: None,
            exhausted: false,
        }
    }

    /// Fetch the next page of items. Returns `None` once the endpoint
    /// stops handing out cursors or a request fails; a page whose
    /// response lacks a cursor is still returned before the stream
    /// ends.
    pub async fn next_page(&mut self) -> Option<Vec<Value>> {
        if self.exhausted {
            return None;
        }

        let url = self.page_url();
        let response = match self
            .client
            .request(self.query.method.clone(), &url, Bytes::new())
            .await
        {
            Ok(r) => r,
            Err(error) => {
                tracing::warn!(url = %url, error = %error, "pagination request failed, stopping");
                self.exhausted = true;
                return None;
            }
        };

        let page = response.json().unwrap_or(Value::Null);

        match self
            .query
            .next_cursor
            .extract(&page)
            .as_ref()
            .and_then(cursor_token)
        {
            Some(token) => self.cursor = Some(token),
            None => self.exhausted = true,
        }

        let items = match self.query.items.extract(&page) {
            Some(Value::Array(items)) => items,
            Some(other) => {
                tracing::warn!(url = %url, "items field is not an array, yielding it as one item");
                vec![other]
            }
            None => Vec::new(),
        };

        Some(items)
    }

    fn page_url(&self) -> Url {
        let mut url = self.query.endpoint.clone();
        {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in &self.query.params {
                pairs.append_pair(k, v);
            }
            if let Some(cursor) = &self.cursor {
                pairs.append_pair(&self.query.cursor_param, cursor);
            }
        }
        url
    }
}

/// A cursor counts as present only when it is a non-empty string or a
/// non-zero number. `""`, `0`, `null`, and anything else end the
/// stream.
fn cursor_token(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => {
            if n.as_f64() == Some(0.0) {
                None
            } else {
                Some(n.to_string())
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cursor_token_rules() {
        assert_eq!(cursor_token(&json!("abc")), Some("abc".to_string()));
        assert_eq!(cursor_token(&json!(7)), Some("7".to_string()));
        assert_eq!(cursor_token(&json!("")), None);
        assert_eq!(cursor_token(&json!(0)), None);
        assert_eq!(cursor_token(&json!(0.0)), None);
        assert_eq!(cursor_token(&json!(null)), None);
        assert_eq!(cursor_token(&json!(true)), None);
        assert_eq!(cursor_token(&json!({"t": 1})), None);
    }

    #[test]
    fn path_extractor_reads_nested_cursor() {
        let page = json!({"meta": {"next": "tok-2"}});
        let ex = Extractor::Path("meta.next".into());
        assert_eq!(ex.extract(&page), Some(json!("tok-2")));
    }

    #[test]
    fn func_extractor_runs_closure() {
        let page = json!({"a": 1, "b": 2});
        let ex = Extractor::Func(Arc::new(|v: &Value| {
            v.get("b").cloned()
        }));
        assert_eq!(ex.extract(&page), Some(json!(2)));
    }

    #[test]
    fn default_query_shape() {
        let q = PageQuery::new(Url::parse("https://api.example.com/items").unwrap());
        assert_eq!(q.method, Method::GET);
        assert_eq!(q.cursor_param, "page_token");
        assert!(matches!(&q.next_cursor, Extractor::Path(p) if p == "next"));
        assert!(matches!(&q.items, Extractor::Path(p) if p == "results"));
    }
}
