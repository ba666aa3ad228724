use reqwest::Client;
use serde_json::Value;

use synapse_config::{GenerationProviders, LlmProviderConfig};

use crate::{Error, Result};

/// Runs a single-turn completion. Models of the primary provider are tried in order; if the
/// primary provider ends on a quota failure and a fallback provider is configured, the fallback
/// gets one pass over its own models.
pub async fn generate(cfg: &GenerationProviders, prompt: &str, max_tokens: u32) -> Result<String> {
	match complete(&cfg.primary, prompt, max_tokens).await {
		Err(err) if err.is_quota() => {
			let Some(fallback) = cfg.fallback.as_ref() else {
				return Err(err);
			};

			tracing::warn!(
				primary = %cfg.primary.provider_id,
				fallback = %fallback.provider_id,
				error = %err,
				"Primary generation provider is out of quota. Falling back."
			);

			complete(fallback, prompt, max_tokens).await
		},
		result => result,
	}
}

async fn complete(cfg: &LlmProviderConfig, prompt: &str, max_tokens: u32) -> Result<String> {
	let client = crate::client(cfg.timeout_ms)?;
	let mut last_err = None;

	for model in &cfg.models {
		match complete_with_model(&client, cfg, model, prompt, max_tokens).await {
			Ok(text) => return Ok(text),
			Err(err) => {
				tracing::debug!(
					provider = %cfg.provider_id,
					model = %model,
					error = %err,
					"Generation model failed."
				);

				last_err = Some(err);
			},
		}
	}

	Err(last_err.unwrap_or_else(|| Error::InvalidConfig {
		message: format!("Provider {} has no generation models.", cfg.provider_id),
	}))
}

async fn complete_with_model(
	client: &Client,
	cfg: &LlmProviderConfig,
	model: &str,
	prompt: &str,
	max_tokens: u32,
) -> Result<String> {
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": model,
		"temperature": cfg.temperature,
		"max_tokens": max_tokens,
		"messages": [{ "role": "user", "content": prompt }],
	});
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json = crate::json_or_error(res).await?;

	parse_chat_content(&json)
}

pub(crate) fn parse_chat_content(json: &Value) -> Result<String> {
	let content = json
		.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.and_then(|c| c.as_str())
		.map(str::trim)
		.ok_or_else(|| Error::InvalidResponse {
			message: "Completion response is missing message content.".to_string(),
		})?;

	if content.is_empty() {
		return Err(Error::InvalidResponse { message: "Completion response is empty.".to_string() });
	}

	Ok(content.to_string())
}
