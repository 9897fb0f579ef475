use crate::models::{Layout, NodeMap, RouteRecord, Tree};
use crate::storage;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum ApiErrorKind {
    Unauthorized,
    Network,
    Http,
    Parse,
    NotFound,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    fn network(e: reqwest::Error) -> Self {
        Self {
            kind: ApiErrorKind::Network,
            message: e.to_string(),
        }
    }

    fn parse(e: impl std::fmt::Display) -> Self {
        Self {
            kind: ApiErrorKind::Parse,
            message: e.to_string(),
        }
    }

    fn unauthorized() -> Self {
        Self {
            kind: ApiErrorKind::Unauthorized,
            message: "Unauthorized".to_string(),
        }
    }

    pub(crate) fn not_found(what: &str) -> Self {
        Self {
            kind: ApiErrorKind::NotFound,
            message: format!("{what} not found"),
        }
    }

    pub(crate) fn http(status: reqwest::StatusCode, body: String, ctx: &str) -> Self {
        Self {
            kind: ApiErrorKind::Http,
            message: format!("{ctx} ({status}): {body}"),
        }
    }
}

pub(crate) type ApiResult<T> = Result<T, ApiError>;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct EnvConfig {
    pub api_url: String,
}

impl EnvConfig {
    pub fn new() -> Self {
        let default_api_url = "http://localhost:3333".to_string();

        // Both `window.ENV.API_URL` and the older `window.ENV.api_url` are honored.
        if let Some(window) = web_sys::window() {
            if let Some(env) = window.get("ENV") {
                if !env.is_undefined() && env.is_object() {
                    for key in ["API_URL", "api_url"] {
                        if let Ok(api_url) = js_sys::Reflect::get(&env, &key.into()) {
                            if let Some(url_str) = api_url.as_string() {
                                return Self { api_url: url_str };
                            }
                        }
                    }
                }
            }
        }

        Self {
            api_url: default_api_url,
        }
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Body of `PUT /renderers/{id}`. The backend replaces the whole node map.
#[derive(Serialize, Clone, Debug)]
pub(crate) struct SaveTreeRequest<'a> {
    pub items: &'a NodeMap,
}

/// Persistence collaborator for the editor session.
#[async_trait(?Send)]
pub(crate) trait TreeStore {
    async fn load_tree(&self, renderer_id: &str) -> ApiResult<Tree>;

    async fn save_tree(&self, renderer_id: &str, nodes: &NodeMap) -> ApiResult<()>;
}

#[derive(Clone, Debug)]
pub(crate) struct ApiClient {
    pub(crate) base_url: String,
    pub(crate) token: Option<String>,
}

impl ApiClient {
    pub fn load_from_storage() -> Self {
        Self {
            base_url: EnvConfig::new().api_url,
            token: storage::load_token(),
        }
    }

    pub(crate) fn get_auth_header(&self) -> Option<String> {
        self.token.as_ref().map(|t| format!("Bearer {t}"))
    }

    /// `{base}/{a}/{b}` with every segment percent-encoded.
    pub(crate) fn url(&self, segments: &[&str]) -> String {
        let mut url = self.base_url.trim_end_matches('/').to_string();
        for s in segments {
            url.push('/');
            url.push_str(&urlencoding::encode(s));
        }
        url
    }

    async fn send(
        &self,
        method: reqwest::Method,
        url: String,
        body: Option<&impl Serialize>,
        what: &str,
    ) -> ApiResult<reqwest::Response> {
        let client = reqwest::Client::new();
        let mut req = client.request(method, url);
        if let Some(header) = self.get_auth_header() {
            req = req.header("Authorization", header);
        }
        if let Some(b) = body {
            req = req.json(b);
        }

        let res = req.send().await.map_err(ApiError::network)?;
        let status = res.status();
        if status.is_success() {
            Ok(res)
        } else if status.as_u16() == 401 {
            Err(ApiError::unauthorized())
        } else if status.as_u16() == 404 {
            Err(ApiError::not_found(what))
        } else {
            let body = res.text().await.unwrap_or_default();
            Err(ApiError::http(status, body, what))
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        segments: &[&str],
        what: &str,
    ) -> ApiResult<T> {
        let res = self
            .send(reqwest::Method::GET, self.url(segments), None::<&()>, what)
            .await?;
        res.json().await.map_err(ApiError::parse)
    }

    pub async fn get_layout(&self, layout_id: &str) -> ApiResult<Layout> {
        self.get_json(&["layouts", layout_id], "Layout").await
    }

    pub async fn get_route(&self, route_id: &str) -> ApiResult<RouteRecord> {
        self.get_json(&["routes", route_id], "Route").await
    }
}

#[async_trait(?Send)]
impl TreeStore for ApiClient {
    async fn load_tree(&self, renderer_id: &str) -> ApiResult<Tree> {
        let tree: Tree = self.get_json(&["renderers", renderer_id], "Renderer").await?;
        tracing::debug!(renderer_id, nodes = tree.len(), "loaded tree");
        Ok(tree)
    }

    async fn save_tree(&self, renderer_id: &str, nodes: &NodeMap) -> ApiResult<()> {
        let body = SaveTreeRequest { items: nodes };
        self.send(
            reqwest::Method::PUT,
            self.url(&["renderers", renderer_id]),
            Some(&body),
            "Renderer",
        )
        .await?;
        tracing::debug!(renderer_id, nodes = nodes.len(), "saved tree");
        Ok(())
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn local_storage() -> web_sys::Storage {
        web_sys::window()
            .and_then(|w| w.local_storage().ok().flatten())
            .expect("localStorage")
    }

    #[wasm_bindgen_test]
    fn test_api_client_reads_token_from_storage() {
        let ls = local_storage();
        ls.remove_item(storage::TOKEN_KEY).expect("remove");
        assert!(ApiClient::load_from_storage().token.is_none());

        ls.set_item(storage::TOKEN_KEY, "t1").expect("set");
        let c = ApiClient::load_from_storage();
        assert_eq!(c.get_auth_header().as_deref(), Some("Bearer t1"));

        ls.remove_item(storage::TOKEN_KEY).expect("remove");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Attributes, Node, NodeKind};
    use std::sync::Arc;

    fn client(base_url: &str, token: Option<&str>) -> ApiClient {
        ApiClient {
            base_url: base_url.to_string(),
            token: token.map(str::to_string),
        }
    }

    #[test]
    fn test_api_client_auth_header() {
        assert!(client("http://localhost:3333", None).get_auth_header().is_none());
        assert_eq!(
            client("http://localhost:3333", Some("my-jwt-token")).get_auth_header().as_deref(),
            Some("Bearer my-jwt-token")
        );
    }

    #[test]
    fn test_url_encodes_segments() {
        let client = client("http://localhost:3333/", None);
        assert_eq!(
            client.url(&["renderers", "a b/c"]),
            "http://localhost:3333/renderers/a%20b%2Fc"
        );
    }

    #[test]
    fn test_save_tree_request_contract_serialize() {
        let mut nodes = NodeMap::new();
        nodes.insert(
            "root".to_string(),
            Arc::new(Node::with_id("root", NodeKind::Container, Attributes::new())),
        );
        let v = serde_json::to_value(SaveTreeRequest { items: &nodes }).expect("should serialize");
        assert_eq!(v["items"]["root"]["type"], "container");
        assert_eq!(v["items"]["root"]["children"], serde_json::json!([]));
    }

    #[test]
    fn test_layout_contract_deserialize() {
        let json = r#"{
            "id": "layout-1",
            "label": "Main",
            "renderer": {"id": "r-1", "default": "root", "items": {
                "root": {"id": "root", "type": "flex", "attributes": {}, "children": []}
            }}
        }"#;
        let parsed: Layout = serde_json::from_str(json).expect("layout should parse");
        assert_eq!(parsed.label, "Main");
        assert_eq!(parsed.renderer.root_id, "root");
    }

    #[test]
    fn test_not_found_kind() {
        let e = ApiError::not_found("Renderer");
        assert_eq!(e.kind, ApiErrorKind::NotFound);
        assert_eq!(e.to_string(), "Renderer not found");
    }
}
