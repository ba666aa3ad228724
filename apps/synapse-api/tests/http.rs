use std::sync::{Arc, Mutex};

use axum::{
	Router,
	body::{self, Body},
	http::{Method, Request, StatusCode},
};
use serde_json::Value;
use tower::util::ServiceExt;
use uuid::Uuid;

use synapse_api::{routes, state::AppState};
use synapse_config::{
	Config, EmbeddingProviderConfig, GenerationProviders, MetadataConfig, OcrProviderConfig,
};
use synapse_providers::metadata::{ImageRequest, PagePreview};
use synapse_service::{
	BoxFuture, EmbeddingProvider, Error, ItemStore, MetadataProvider, OcrProvider, Providers,
	Result, SynapseService, TextProvider, VectorIndex,
};
use synapse_storage::{
	models::{Item, ItemSearch, RelatedItem},
	qdrant::{Neighbor, VectorPayload},
};

const TEST_CONFIG: &str = r#"
[service]
http_bind = "127.0.0.1:0"
log_level = "info"

[storage.postgres]
dsn            = "postgres://unused"
pool_max_conns = 1

[storage.qdrant]
collection = "synapse_items"
url        = "http://127.0.0.1:6334"
vector_dim = 3

[providers.embedding]
api_base    = "http://127.0.0.1:1"
api_key     = "test-key"
dimensions  = 3
model       = "test"
path        = "/"
provider_id = "test"
timeout_ms  = 1000

[providers.generation]
api_base    = "http://127.0.0.1:1"
api_key     = "test-key"
models      = ["test"]
path        = "/"
provider_id = "test"
temperature = 0.0
timeout_ms  = 1000

[providers.ocr]
api_base    = "http://127.0.0.1:1"
api_key     = "test-key"
model       = "test"
path        = "/"
provider_id = "test"
timeout_ms  = 1000
"#;

fn unreachable_backend() -> Error {
	Error::Storage { message: "Backend is unreachable.".to_string() }
}

#[derive(Default)]
struct MemoryStore {
	items: Mutex<Vec<Item>>,
	offline: bool,
}
impl MemoryStore {
	fn find(&self, item_id: Uuid) -> Option<Item> {
		let items = self.items.lock().expect("Store lock poisoned.");

		items.iter().find(|item| item.item_id == item_id).cloned()
	}
}
impl ItemStore for MemoryStore {
	fn insert_item<'a>(&'a self, item: &'a Item) -> BoxFuture<'a, Result<()>> {
		self.items.lock().expect("Store lock poisoned.").push(item.clone());

		Box::pin(async { Ok(()) })
	}

	fn get_item<'a>(&'a self, item_id: Uuid) -> BoxFuture<'a, Result<Option<Item>>> {
		let item = self.find(item_id);

		Box::pin(async move { Ok(item) })
	}

	fn get_items<'a>(&'a self, item_ids: &'a [Uuid]) -> BoxFuture<'a, Result<Vec<Item>>> {
		let items = item_ids.iter().filter_map(|item_id| self.find(*item_id)).collect();

		Box::pin(async move { Ok(items) })
	}

	fn list_items<'a>(&'a self) -> BoxFuture<'a, Result<Vec<Item>>> {
		let mut items = self.items.lock().expect("Store lock poisoned.").clone();

		items.reverse();

		Box::pin(async move { Ok(items) })
	}

	fn delete_item<'a>(&'a self, item_id: Uuid) -> BoxFuture<'a, Result<bool>> {
		let mut items = self.items.lock().expect("Store lock poisoned.");
		let before = items.len();

		items.retain(|item| item.item_id != item_id);

		let deleted = items.len() < before;

		Box::pin(async move { Ok(deleted) })
	}

	fn update_summary<'a>(
		&'a self,
		_item_id: Uuid,
		_summary: &'a str,
	) -> BoxFuture<'a, Result<bool>> {
		Box::pin(async { Ok(true) })
	}

	fn update_ocr_text<'a>(
		&'a self,
		_item_id: Uuid,
		_ocr_text: &'a str,
	) -> BoxFuture<'a, Result<bool>> {
		Box::pin(async { Ok(true) })
	}

	fn update_image_url<'a>(
		&'a self,
		_item_id: Uuid,
		_image_url: Option<&'a str>,
	) -> BoxFuture<'a, Result<bool>> {
		Box::pin(async { Ok(true) })
	}

	fn search_items<'a>(&'a self, search: &'a ItemSearch) -> BoxFuture<'a, Result<Vec<Item>>> {
		if self.offline {
			return Box::pin(async { Err(unreachable_backend()) });
		}

		let needle = search.terms.to_lowercase();
		let items = self
			.items
			.lock()
			.expect("Store lock poisoned.")
			.iter()
			.filter(|item| item.title.to_lowercase().contains(&needle))
			.cloned()
			.collect();

		Box::pin(async move { Ok(items) })
	}

	fn upsert_relation<'a>(
		&'a self,
		_item_id: Uuid,
		_related_item_id: Uuid,
		_similarity_score: f32,
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(async { Ok(()) })
	}

	fn related_items<'a>(
		&'a self,
		_item_id: Uuid,
		_limit: u32,
	) -> BoxFuture<'a, Result<Vec<RelatedItem>>> {
		Box::pin(async { Ok(Vec::new()) })
	}
}

/// Accepts writes and never finds neighbours; offline mode fails every query.
#[derive(Default)]
struct EmptyIndex {
	offline: bool,
}
impl VectorIndex for EmptyIndex {
	fn upsert<'a>(
		&'a self,
		_item_id: Uuid,
		_vector: Vec<f32>,
		_payload: &'a VectorPayload,
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(async { Ok(()) })
	}

	fn query<'a>(
		&'a self,
		_vector: Vec<f32>,
		_limit: u32,
	) -> BoxFuture<'a, Result<Vec<Neighbor>>> {
		let offline = self.offline;

		Box::pin(async move {
			if offline {
				return Err(Error::Qdrant { message: "Qdrant is unreachable.".to_string() });
			}

			Ok(Vec::new())
		})
	}

	fn delete<'a>(&'a self, _item_id: Uuid) -> BoxFuture<'a, Result<()>> {
		Box::pin(async { Ok(()) })
	}
}

/// Constant embeddings; every other provider is offline.
struct OfflineProviders;
impl EmbeddingProvider for OfflineProviders {
	fn embed<'a>(
		&'a self,
		_cfg: &'a EmbeddingProviderConfig,
		_text: &'a str,
	) -> BoxFuture<'a, Result<Vec<f32>>> {
		Box::pin(async { Ok(vec![0.1, 0.2, 0.3]) })
	}
}
impl TextProvider for OfflineProviders {
	fn generate<'a>(
		&'a self,
		_cfg: &'a GenerationProviders,
		_prompt: &'a str,
		_max_tokens: u32,
	) -> BoxFuture<'a, Result<String>> {
		Box::pin(async { Err(Error::Provider { message: "Model is offline.".to_string() }) })
	}
}
impl OcrProvider for OfflineProviders {
	fn extract_text<'a>(
		&'a self,
		_cfg: &'a OcrProviderConfig,
		_image_url: &'a str,
	) -> BoxFuture<'a, Result<String>> {
		Box::pin(async { Err(Error::Provider { message: "OCR is offline.".to_string() }) })
	}
}
impl MetadataProvider for OfflineProviders {
	fn preview<'a>(
		&'a self,
		_cfg: &'a MetadataConfig,
		_url: &'a str,
	) -> BoxFuture<'a, Result<PagePreview>> {
		Box::pin(async { Err(Error::Provider { message: "Preview is offline.".to_string() }) })
	}

	fn find_image<'a>(
		&'a self,
		_cfg: &'a MetadataConfig,
		_request: ImageRequest<'a>,
	) -> BoxFuture<'a, Result<Option<String>>> {
		Box::pin(async { Ok(None) })
	}
}

fn test_router(store: MemoryStore, index: EmptyIndex) -> Router {
	let config: Config = toml::from_str(TEST_CONFIG).expect("Failed to parse test config.");
	let providers = Arc::new(OfflineProviders);
	let providers =
		Providers::new(providers.clone(), providers.clone(), providers.clone(), providers);
	let service = SynapseService::with_parts(config, Arc::new(store), Arc::new(index), providers);

	routes::router(AppState::new(service))
}

async fn send(
	app: &Router,
	method: Method,
	uri: &str,
	body: Option<Value>,
) -> (StatusCode, Value) {
	let mut request = Request::builder().method(method).uri(uri);
	let body = match body {
		Some(json) => {
			request = request.header("content-type", "application/json");

			Body::from(json.to_string())
		},
		None => Body::empty(),
	};
	let response = app
		.clone()
		.oneshot(request.body(body).expect("Failed to build request."))
		.await
		.expect("Failed to call the router.");
	let status = response.status();
	let bytes =
		body::to_bytes(response.into_body(), usize::MAX).await.expect("Failed to read body.");
	let json = if bytes.is_empty() {
		Value::Null
	} else {
		serde_json::from_slice(&bytes).expect("Response body is not JSON.")
	};

	(status, json)
}

#[tokio::test]
async fn health_ok() {
	let app = test_router(MemoryStore::default(), EmptyIndex::default());
	let response = app
		.oneshot(Request::builder().uri("/health").body(Body::empty()).expect("Failed to build."))
		.await
		.expect("Failed to call health endpoint.");

	assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn item_lifecycle_over_http() {
	let app = test_router(MemoryStore::default(), EmptyIndex::default());
	let (status, created) = send(
		&app,
		Method::POST,
		"/v1/items",
		Some(serde_json::json!({
			"title": "Gooseneck kettle",
			"content": "Pour over at 94C.",
			"type": "text"
		})),
	)
	.await;

	assert_eq!(status, StatusCode::CREATED);
	assert_eq!(created["type"], "text");
	assert_eq!(created["category"], "Notes & Ideas");

	let item_id = created["item_id"].as_str().expect("Missing item_id.").to_string();
	let (status, fetched) = send(&app, Method::GET, &format!("/v1/items/{item_id}"), None).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(fetched["title"], "Gooseneck kettle");

	let (status, listed) = send(&app, Method::GET, "/v1/items", None).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(listed["items"].as_array().map(Vec::len), Some(1));

	let (status, found) = send(&app, Method::GET, "/v1/search?q=kettle&limit=5", None).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(found["results"][0]["item_id"], item_id.as_str());
	assert_eq!(found["filters"]["search_terms"], "kettle");

	let (status, _) =
		send(&app, Method::POST, &format!("/v1/items/{item_id}/refresh-summary"), None).await;

	assert_eq!(status, StatusCode::ACCEPTED);

	let (status, _) = send(&app, Method::DELETE, &format!("/v1/items/{item_id}"), None).await;

	assert_eq!(status, StatusCode::NO_CONTENT);

	let (status, body) = send(&app, Method::GET, &format!("/v1/items/{item_id}"), None).await;

	assert_eq!(status, StatusCode::NOT_FOUND);
	assert_eq!(body["error_code"], "NOT_FOUND");
}

#[tokio::test]
async fn empty_items_are_rejected() {
	let app = test_router(MemoryStore::default(), EmptyIndex::default());
	let (status, body) =
		send(&app, Method::POST, "/v1/items", Some(serde_json::json!({ "title": "  " }))).await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body["error_code"], "INVALID_REQUEST");
}

#[tokio::test]
async fn related_lookup_for_unknown_item_is_not_found() {
	let app = test_router(MemoryStore::default(), EmptyIndex::default());
	let uri = format!("/v1/items/{}/related?limit=3", Uuid::new_v4());
	let (status, body) = send(&app, Method::GET, &uri, None).await;

	assert_eq!(status, StatusCode::NOT_FOUND);
	assert_eq!(body["error_code"], "NOT_FOUND");
}

#[tokio::test]
async fn search_errors_map_to_statuses() {
	let app = test_router(MemoryStore::default(), EmptyIndex::default());
	let (status, body) = send(&app, Method::GET, "/v1/search?q=%20%20", None).await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body["error_code"], "INVALID_REQUEST");

	let store = MemoryStore { offline: true, ..Default::default() };
	let app = test_router(store, EmptyIndex { offline: true });
	let (status, body) = send(&app, Method::GET, "/v1/search?q=kettle", None).await;

	assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
	assert_eq!(body["error_code"], "SEARCH_UNAVAILABLE");
}
