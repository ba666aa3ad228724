pub mod create_item;
pub mod items;
mod related;
pub mod search;
pub mod time_serde;

mod error;
mod prompts;
mod store;

pub use create_item::{CreateItemRequest, ItemMetadata};
pub use error::{Error, Result};
pub use items::{ItemView, ScoredItem};
pub use search::{FiltersView, SearchRequest, SearchResponse};

use std::{future::Future, pin::Pin, sync::Arc};

use uuid::Uuid;

use synapse_config::{
	Config, EmbeddingProviderConfig, GenerationProviders, MetadataConfig, OcrProviderConfig,
};
use synapse_providers::{
	embedding, generation,
	metadata::{self, ImageRequest, PagePreview},
	ocr,
};
use synapse_storage::{
	db::Db,
	models::{Item, ItemSearch, RelatedItem},
	qdrant::{Neighbor, QdrantStore, VectorPayload},
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		text: &'a str,
	) -> BoxFuture<'a, Result<Vec<f32>>>;
}

pub trait TextProvider
where
	Self: Send + Sync,
{
	fn generate<'a>(
		&'a self,
		cfg: &'a GenerationProviders,
		prompt: &'a str,
		max_tokens: u32,
	) -> BoxFuture<'a, Result<String>>;
}

pub trait OcrProvider
where
	Self: Send + Sync,
{
	fn extract_text<'a>(
		&'a self,
		cfg: &'a OcrProviderConfig,
		image_url: &'a str,
	) -> BoxFuture<'a, Result<String>>;
}

pub trait MetadataProvider
where
	Self: Send + Sync,
{
	fn preview<'a>(
		&'a self,
		cfg: &'a MetadataConfig,
		url: &'a str,
	) -> BoxFuture<'a, Result<PagePreview>>;

	fn find_image<'a>(
		&'a self,
		cfg: &'a MetadataConfig,
		request: ImageRequest<'a>,
	) -> BoxFuture<'a, Result<Option<String>>>;
}

/// Relational storage for items and the relation cache.
pub trait ItemStore
where
	Self: Send + Sync,
{
	fn insert_item<'a>(&'a self, item: &'a Item) -> BoxFuture<'a, Result<()>>;

	fn get_item<'a>(&'a self, item_id: Uuid) -> BoxFuture<'a, Result<Option<Item>>>;

	/// Order of the returned items is unspecified.
	fn get_items<'a>(&'a self, item_ids: &'a [Uuid]) -> BoxFuture<'a, Result<Vec<Item>>>;

	fn list_items<'a>(&'a self) -> BoxFuture<'a, Result<Vec<Item>>>;

	fn delete_item<'a>(&'a self, item_id: Uuid) -> BoxFuture<'a, Result<bool>>;

	fn update_summary<'a>(
		&'a self,
		item_id: Uuid,
		summary: &'a str,
	) -> BoxFuture<'a, Result<bool>>;

	fn update_ocr_text<'a>(
		&'a self,
		item_id: Uuid,
		ocr_text: &'a str,
	) -> BoxFuture<'a, Result<bool>>;

	fn update_image_url<'a>(
		&'a self,
		item_id: Uuid,
		image_url: Option<&'a str>,
	) -> BoxFuture<'a, Result<bool>>;

	fn search_items<'a>(&'a self, search: &'a ItemSearch) -> BoxFuture<'a, Result<Vec<Item>>>;

	fn upsert_relation<'a>(
		&'a self,
		item_id: Uuid,
		related_item_id: Uuid,
		similarity_score: f32,
	) -> BoxFuture<'a, Result<()>>;

	fn related_items<'a>(
		&'a self,
		item_id: Uuid,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<RelatedItem>>>;
}

/// Nearest-neighbour index over item embeddings, bound to one collection.
pub trait VectorIndex
where
	Self: Send + Sync,
{
	fn upsert<'a>(
		&'a self,
		item_id: Uuid,
		vector: Vec<f32>,
		payload: &'a VectorPayload,
	) -> BoxFuture<'a, Result<()>>;

	fn query<'a>(&'a self, vector: Vec<f32>, limit: u32) -> BoxFuture<'a, Result<Vec<Neighbor>>>;

	fn delete<'a>(&'a self, item_id: Uuid) -> BoxFuture<'a, Result<()>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub text: Arc<dyn TextProvider>,
	pub ocr: Arc<dyn OcrProvider>,
	pub metadata: Arc<dyn MetadataProvider>,
}
impl Providers {
	pub fn new(
		embedding: Arc<dyn EmbeddingProvider>,
		text: Arc<dyn TextProvider>,
		ocr: Arc<dyn OcrProvider>,
		metadata: Arc<dyn MetadataProvider>,
	) -> Self {
		Self { embedding, text, ocr, metadata }
	}
}
impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self {
			embedding: provider.clone(),
			text: provider.clone(),
			ocr: provider.clone(),
			metadata: provider,
		}
	}
}

/// Capture and retrieval over injected collaborators. Cloning is cheap; detached background
/// work holds its own clone.
#[derive(Clone)]
pub struct SynapseService {
	pub cfg: Arc<Config>,
	pub store: Arc<dyn ItemStore>,
	pub index: Arc<dyn VectorIndex>,
	pub providers: Providers,
}
impl SynapseService {
	pub fn new(cfg: Config, db: Db, qdrant: QdrantStore) -> Self {
		Self::with_providers(cfg, db, qdrant, Providers::default())
	}

	pub fn with_providers(cfg: Config, db: Db, qdrant: QdrantStore, providers: Providers) -> Self {
		Self::with_parts(cfg, Arc::new(db), Arc::new(qdrant), providers)
	}

	pub fn with_parts(
		cfg: Config,
		store: Arc<dyn ItemStore>,
		index: Arc<dyn VectorIndex>,
		providers: Providers,
	) -> Self {
		Self { cfg: Arc::new(cfg), store, index, providers }
	}

	pub(crate) async fn embed(&self, text: &str) -> Result<Vec<f32>> {
		let vector = self.providers.embedding.embed(&self.cfg.providers.embedding, text).await?;

		if vector.len() != self.cfg.storage.qdrant.vector_dim as usize {
			return Err(Error::Provider {
				message: format!(
					"Embedding has {} dimensions; expected {}.",
					vector.len(),
					self.cfg.storage.qdrant.vector_dim
				),
			});
		}

		Ok(vector)
	}

	pub(crate) async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String> {
		self.providers.text.generate(&self.cfg.providers.generation, prompt, max_tokens).await
	}

	pub(crate) async fn require_item(&self, item_id: Uuid) -> Result<Item> {
		self.store.get_item(item_id).await?.ok_or_else(|| Error::NotFound {
			message: format!("Item {item_id} does not exist."),
		})
	}
}

struct DefaultProviders;
impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		text: &'a str,
	) -> BoxFuture<'a, Result<Vec<f32>>> {
		Box::pin(async move { Ok(embedding::embed(cfg, text).await?) })
	}
}
impl TextProvider for DefaultProviders {
	fn generate<'a>(
		&'a self,
		cfg: &'a GenerationProviders,
		prompt: &'a str,
		max_tokens: u32,
	) -> BoxFuture<'a, Result<String>> {
		Box::pin(async move { Ok(generation::generate(cfg, prompt, max_tokens).await?) })
	}
}
impl OcrProvider for DefaultProviders {
	fn extract_text<'a>(
		&'a self,
		cfg: &'a OcrProviderConfig,
		image_url: &'a str,
	) -> BoxFuture<'a, Result<String>> {
		Box::pin(async move { Ok(ocr::extract_text(cfg, image_url).await?) })
	}
}
impl MetadataProvider for DefaultProviders {
	fn preview<'a>(
		&'a self,
		cfg: &'a MetadataConfig,
		url: &'a str,
	) -> BoxFuture<'a, Result<PagePreview>> {
		Box::pin(async move { Ok(metadata::preview(cfg, url).await?) })
	}

	fn find_image<'a>(
		&'a self,
		cfg: &'a MetadataConfig,
		request: ImageRequest<'a>,
	) -> BoxFuture<'a, Result<Option<String>>> {
		Box::pin(async move { Ok(metadata::find_image(cfg, &request).await?) })
	}
}
