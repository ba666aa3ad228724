pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Search unavailable: semantic channel failed ({semantic}); lexical channel failed ({lexical}).")]
	SearchUnavailable { semantic: String, lexical: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
	#[error("Qdrant error: {message}")]
	Qdrant { message: String },
}
impl Error {
	/// Provider failures caused by quota exhaustion or rate limiting.
	pub fn is_quota(&self) -> bool {
		match self {
			Self::Provider { message } => synapse_providers::is_quota_message(message),
			_ => false,
		}
	}
}

impl From<synapse_storage::Error> for Error {
	fn from(err: synapse_storage::Error) -> Self {
		match err {
			synapse_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			synapse_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			synapse_storage::Error::Qdrant(inner) => Self::Qdrant { message: inner.to_string() },
		}
	}
}

impl From<synapse_providers::Error> for Error {
	fn from(err: synapse_providers::Error) -> Self {
		Self::Provider { message: err.to_string() }
	}
}
