pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Reqwest(#[from] reqwest::Error),
	#[error(transparent)]
	SerdeJson(#[from] serde_json::Error),
	#[error(transparent)]
	InvalidHeaderName(#[from] reqwest::header::InvalidHeaderName),
	#[error(transparent)]
	InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),
	#[error("{message}")]
	InvalidConfig { message: String },
	#[error("{message}")]
	InvalidResponse { message: String },
	#[error("Provider request failed with status {status}: {message}")]
	Api { status: u16, message: String },
	#[error("Provider quota exhausted with status {status}: {message}")]
	Quota { status: u16, message: String },
}
impl Error {
	pub fn is_quota(&self) -> bool {
		matches!(self, Error::Quota { .. })
	}

	pub(crate) fn from_status(status: u16, message: String) -> Self {
		if status == 429 || status == 503 || is_quota_message(&message) {
			Error::Quota { status, message }
		} else {
			Error::Api { status, message }
		}
	}
}

/// Whether an error message describes quota exhaustion or rate limiting.
pub fn is_quota_message(message: &str) -> bool {
	let lower = message.to_ascii_lowercase();

	["quota", "rate limit", "rate_limit", "429", "503"].iter().any(|marker| lower.contains(marker))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn classifies_quota_failures() {
		assert!(Error::from_status(429, "Too many requests".to_string()).is_quota());
		assert!(Error::from_status(400, "You exceeded your current quota".to_string()).is_quota());
		assert!(!Error::from_status(401, "Invalid API key".to_string()).is_quota());
		assert!(is_quota_message(&Error::from_status(503, "busy".to_string()).to_string()));
	}
}
