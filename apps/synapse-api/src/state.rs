use std::sync::Arc;

use synapse_service::SynapseService;
use synapse_storage::{db::Db, qdrant::QdrantStore};

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<SynapseService>,
}
impl AppState {
	pub fn new(service: SynapseService) -> Self {
		Self { service: Arc::new(service) }
	}

	/// Connects to Postgres and Qdrant and makes sure the schema and collection exist.
	pub async fn connect(config: synapse_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		let qdrant = QdrantStore::new(&config.storage.qdrant)?;

		qdrant.ensure_collection().await?;

		Ok(Self::new(SynapseService::new(config, db, qdrant)))
	}
}
