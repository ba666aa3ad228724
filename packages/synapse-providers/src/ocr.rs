use crate::Result;

const OCR_PROMPT: &str =
	"Extract all text from this image. Return only the text content, no explanations or formatting.";
const OCR_MAX_TOKENS: u32 = 1_000;

/// Transcribes the text visible in an image through a vision chat model.
pub async fn extract_text(
	cfg: &synapse_config::OcrProviderConfig,
	image_url: &str,
) -> Result<String> {
	let client = crate::client(cfg.timeout_ms)?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = request_body(&cfg.model, image_url);
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json = crate::json_or_error(res).await?;

	crate::generation::parse_chat_content(&json)
}

fn request_body(model: &str, image_url: &str) -> serde_json::Value {
	serde_json::json!({
		"model": model,
		"max_tokens": OCR_MAX_TOKENS,
		"messages": [{
			"role": "user",
			"content": [
				{ "type": "text", "text": OCR_PROMPT },
				{ "type": "image_url", "image_url": { "url": image_url } }
			]
		}],
	})
}
