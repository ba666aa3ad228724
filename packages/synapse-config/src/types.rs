use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub search: Search,
	#[serde(default)]
	pub relations: Relations,
	#[serde(default)]
	pub enrichment: Enrichment,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
	pub qdrant: Qdrant,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Qdrant {
	pub url: String,
	pub collection: String,
	pub vector_dim: u32,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub generation: GenerationProviders,
	pub ocr: OcrProviderConfig,
	#[serde(default)]
	pub metadata: MetadataConfig,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

/// Text generation endpoints. `fallback` is tried once when the primary provider reports a
/// quota or rate-limit failure.
#[derive(Debug, Deserialize)]
pub struct GenerationProviders {
	#[serde(flatten)]
	pub primary: LlmProviderConfig,
	pub fallback: Option<LlmProviderConfig>,
}

#[derive(Debug, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	/// Tried in order; the first model that answers wins.
	pub models: Vec<String>,
	pub temperature: f32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct OcrProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
	pub timeout_ms: u64,
	pub user_agent: String,
	pub book_cover_api_base: String,
	pub stock_image_base: String,
}
impl Default for MetadataConfig {
	fn default() -> Self {
		Self {
			timeout_ms: 10_000,
			user_agent: "Mozilla/5.0 (compatible; synapse/0.2)".to_string(),
			book_cover_api_base: "https://openlibrary.org".to_string(),
			stock_image_base: "https://source.unsplash.com/400x300/".to_string(),
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Search {
	pub default_limit: u32,
	pub max_limit: u32,
	/// Each retrieval channel fetches `limit * candidate_multiplier` candidates.
	pub candidate_multiplier: u32,
	pub rerank_window: u32,
	pub expansion: SearchExpansion,
}
impl Default for Search {
	fn default() -> Self {
		Self {
			default_limit: 10,
			max_limit: 50,
			candidate_multiplier: 2,
			rerank_window: 10,
			expansion: SearchExpansion::default(),
		}
	}
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SearchExpansion {
	pub enabled: bool,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Relations {
	pub default_limit: u32,
	pub neighbor_headroom: u32,
	pub source_chars: u32,
}
impl Default for Relations {
	fn default() -> Self {
		Self { default_limit: 5, neighbor_headroom: 10, source_chars: 1_000 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Enrichment {
	pub excerpt_chars: u32,
	pub categorize_chars: u32,
	pub tags_chars: u32,
	pub summary_chars: u32,
	pub video_summary_chars: u32,
}
impl Default for Enrichment {
	fn default() -> Self {
		Self {
			excerpt_chars: 200,
			categorize_chars: 1_500,
			tags_chars: 2_000,
			summary_chars: 3_000,
			video_summary_chars: 5_000,
		}
	}
}
