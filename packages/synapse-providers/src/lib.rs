pub mod embedding;
pub mod error;
pub mod generation;
pub mod metadata;
pub mod ocr;

pub use error::{Error, Result, is_quota_message};

use std::time::Duration;

use reqwest::{
	Client, Response,
	header::{AUTHORIZATION, HeaderMap, HeaderName},
};
use serde_json::{Map, Value};

pub fn auth_headers(api_key: &str, default_headers: &Map<String, Value>) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();

	headers.insert(AUTHORIZATION, format!("Bearer {api_key}").parse()?);

	for (key, value) in default_headers {
		let Some(raw) = value.as_str() else {
			return Err(Error::InvalidConfig {
				message: "Default header values must be strings.".to_string(),
			});
		};

		headers.insert(HeaderName::from_bytes(key.as_bytes())?, raw.parse()?);
	}

	Ok(headers)
}

pub(crate) fn client(timeout_ms: u64) -> Result<Client> {
	Ok(Client::builder().timeout(Duration::from_millis(timeout_ms)).build()?)
}

/// Reads a JSON body, turning non-success statuses into [`Error::Api`] or [`Error::Quota`].
pub(crate) async fn json_or_error(res: Response) -> Result<Value> {
	let status = res.status();

	if status.is_success() {
		return Ok(res.json().await?);
	}

	let body = res.text().await.unwrap_or_default();

	Err(Error::from_status(status.as_u16(), api_error_message(&body)))
}

fn api_error_message(body: &str) -> String {
	serde_json::from_str::<Value>(body)
		.ok()
		.and_then(|json| {
			let error = json.get("error")?;

			error
				.get("message")
				.and_then(Value::as_str)
				.or_else(|| error.as_str())
				.map(str::to_string)
		})
		.unwrap_or_else(|| body.trim().to_string())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn extracts_api_error_messages() {
		assert_eq!(
			api_error_message(r#"{"error":{"message":"Rate limit reached","code":"rate_limit"}}"#),
			"Rate limit reached"
		);
		assert_eq!(api_error_message(r#"{"error":"bad model"}"#), "bad model");
		assert_eq!(api_error_message(" upstream timeout \n"), "upstream timeout");
	}

	#[test]
	fn rejects_non_string_default_headers() {
		let mut headers = Map::new();

		headers.insert("x-retries".to_string(), Value::from(3));

		let err = auth_headers("key", &headers).expect_err("Expected header validation error.");

		assert!(err.to_string().contains("Default header values must be strings."));
	}
}
