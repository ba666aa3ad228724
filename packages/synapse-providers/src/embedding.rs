use serde_json::Value;

use synapse_config::EmbeddingProviderConfig;

use crate::{Error, Result};

/// Embeds one text with an OpenAI-compatible embeddings endpoint. The vector must have exactly
/// `cfg.dimensions` components.
pub async fn embed(cfg: &EmbeddingProviderConfig, text: &str) -> Result<Vec<f32>> {
	let client = crate::client(cfg.timeout_ms)?;
	let body = serde_json::json!({
		"model": cfg.model,
		"input": [text],
		"dimensions": cfg.dimensions,
	});
	let res = client
		.post(format!("{}{}", cfg.api_base, cfg.path))
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json = crate::json_or_error(res).await?;
	let vector = first_embedding(&json)?;

	if vector.len() != cfg.dimensions as usize {
		return Err(Error::InvalidResponse {
			message: format!(
				"Embedding has {} dimensions; the provider is configured for {}.",
				vector.len(),
				cfg.dimensions
			),
		});
	}

	Ok(vector)
}

/// Picks the entry with the lowest `index` (position when absent) from a `data` array.
fn first_embedding(json: &Value) -> Result<Vec<f32>> {
	let entry = json
		.get("data")
		.and_then(Value::as_array)
		.and_then(|data| {
			data.iter()
				.enumerate()
				.min_by_key(|(position, entry)| {
					entry.get("index").and_then(Value::as_u64).unwrap_or(*position as u64)
				})
				.map(|(_, entry)| entry)
		})
		.ok_or_else(|| Error::InvalidResponse {
			message: "Embedding response has no data entries.".to_string(),
		})?;
	let values = entry.get("embedding").and_then(Value::as_array).ok_or_else(|| {
		Error::InvalidResponse { message: "Embedding entry has no embedding array.".to_string() }
	})?;

	values
		.iter()
		.map(|value| {
			value.as_f64().map(|number| number as f32).ok_or_else(|| Error::InvalidResponse {
				message: "Embedding values must be numbers.".to_string(),
			})
		})
		.collect()
}
