mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, EmbeddingProviderConfig, Enrichment, GenerationProviders, LlmProviderConfig,
	MetadataConfig, OcrProviderConfig, Postgres, Providers, Qdrant, Relations, Search,
	SearchExpansion, Service, Storage,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.storage.qdrant.collection.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.qdrant.collection must be non-empty.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions != cfg.storage.qdrant.vector_dim {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must match storage.qdrant.vector_dim."
				.to_string(),
		});
	}

	validate_llm("providers.generation", &cfg.providers.generation.primary)?;

	if let Some(fallback) = cfg.providers.generation.fallback.as_ref() {
		validate_llm("providers.generation.fallback", fallback)?;
	}

	for (label, key) in [
		("embedding", &cfg.providers.embedding.api_key),
		("generation", &cfg.providers.generation.primary.api_key),
		("ocr", &cfg.providers.ocr.api_key),
	] {
		if key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
	}
	for (label, value) in [
		("search.default_limit", cfg.search.default_limit),
		("search.max_limit", cfg.search.max_limit),
		("search.candidate_multiplier", cfg.search.candidate_multiplier),
		("search.rerank_window", cfg.search.rerank_window),
		("relations.default_limit", cfg.relations.default_limit),
		("relations.source_chars", cfg.relations.source_chars),
		("enrichment.excerpt_chars", cfg.enrichment.excerpt_chars),
		("enrichment.categorize_chars", cfg.enrichment.categorize_chars),
		("enrichment.tags_chars", cfg.enrichment.tags_chars),
		("enrichment.summary_chars", cfg.enrichment.summary_chars),
		("enrichment.video_summary_chars", cfg.enrichment.video_summary_chars),
	] {
		if value == 0 {
			return Err(Error::Validation {
				message: format!("{label} must be greater than zero."),
			});
		}
	}

	if cfg.search.default_limit > cfg.search.max_limit {
		return Err(Error::Validation {
			message: "search.default_limit must not exceed search.max_limit.".to_string(),
		});
	}
	if cfg.providers.metadata.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "providers.metadata.timeout_ms must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn validate_llm(label: &str, cfg: &LlmProviderConfig) -> Result<()> {
	if cfg.api_base.trim().is_empty() {
		return Err(Error::Validation { message: format!("{label}.api_base must be non-empty.") });
	}
	if cfg.models.is_empty() {
		return Err(Error::Validation {
			message: format!("{label}.models must contain at least one model."),
		});
	}
	if !cfg.temperature.is_finite() || cfg.temperature < 0.0 {
		return Err(Error::Validation {
			message: format!("{label}.temperature must be a finite number, zero or greater."),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	for provider in std::iter::once(&mut cfg.providers.generation.primary)
		.chain(cfg.providers.generation.fallback.as_mut())
	{
		provider.models = provider
			.models
			.iter()
			.map(|model| model.trim())
			.filter(|model| !model.is_empty())
			.map(str::to_string)
			.collect();
	}

	if cfg
		.providers
		.generation
		.fallback
		.as_ref()
		.map(|fallback| fallback.api_key.trim().is_empty())
		.unwrap_or(false)
	{
		cfg.providers.generation.fallback = None;
	}

	let base = &mut cfg.providers.metadata.stock_image_base;

	if !base.ends_with('/') {
		base.push('/');
	}
}
