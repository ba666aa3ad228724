use std::collections::HashMap;

use qdrant_client::{
	Payload, Qdrant,
	qdrant::{
		CreateCollectionBuilder, DeletePointsBuilder, Distance, PointId, PointStruct,
		PointsIdsList, Query, QueryPointsBuilder, UpsertPointsBuilder, Value, VectorParamsBuilder,
		point_id::PointIdOptions,
	},
};
use uuid::Uuid;

use crate::{Error, Result};

/// Payload stored next to each item vector.
#[derive(Debug, Clone)]
pub struct VectorPayload {
	pub title: String,
	pub item_type: String,
	pub category: String,
}

/// A nearest-neighbour hit. `distance` is cosine distance, `1 - similarity`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
	pub item_id: Uuid,
	pub distance: f32,
}

pub struct QdrantStore {
	pub client: Qdrant,
	pub collection: String,
	pub vector_dim: u32,
}
impl QdrantStore {
	pub fn new(cfg: &synapse_config::Qdrant) -> Result<Self> {
		let client = Qdrant::from_url(&cfg.url).build()?;

		Ok(Self { client, collection: cfg.collection.clone(), vector_dim: cfg.vector_dim })
	}

	pub async fn ensure_collection(&self) -> Result<()> {
		let existing = self.client.list_collections().await?;

		if existing.collections.iter().any(|collection| collection.name == self.collection) {
			return Ok(());
		}

		self.client
			.create_collection(
				CreateCollectionBuilder::new(self.collection.clone()).vectors_config(
					VectorParamsBuilder::new(u64::from(self.vector_dim), Distance::Cosine),
				),
			)
			.await?;

		tracing::info!(collection = %self.collection, "Created vector collection.");

		Ok(())
	}

	/// Writes or replaces the vector keyed by the item id.
	pub async fn upsert(
		&self,
		item_id: Uuid,
		vector: Vec<f32>,
		payload: &VectorPayload,
	) -> Result<()> {
		if vector.len() != self.vector_dim as usize {
			return Err(Error::InvalidArgument(format!(
				"Vector has {} dimensions; the collection expects {}.",
				vector.len(),
				self.vector_dim
			)));
		}

		let mut fields = HashMap::new();

		fields.insert("item_id".to_string(), Value::from(item_id.to_string()));
		fields.insert("title".to_string(), Value::from(payload.title.clone()));
		fields.insert("type".to_string(), Value::from(payload.item_type.clone()));
		fields.insert("category".to_string(), Value::from(payload.category.clone()));

		let point = PointStruct::new(item_id.to_string(), vector, Payload::from(fields));

		let upsert = UpsertPointsBuilder::new(self.collection.clone(), vec![point]).wait(true);

		self.client.upsert_points(upsert).await?;

		Ok(())
	}

	/// Returns up to `limit` neighbours, closest first.
	pub async fn nearest(&self, vector: Vec<f32>, limit: u64) -> Result<Vec<Neighbor>> {
		let search = QueryPointsBuilder::new(self.collection.clone())
			.query(Query::new_nearest(vector))
			.limit(limit)
			.with_payload(false);
		let response = self.client.query(search).await?;
		let neighbors = response
			.result
			.into_iter()
			.filter_map(|point| {
				let item_id = point_id_to_uuid(point.id.as_ref()?)?;

				Some(Neighbor { item_id, distance: 1.0 - point.score })
			})
			.collect();

		Ok(neighbors)
	}

	pub async fn delete(&self, item_id: Uuid) -> Result<()> {
		let ids = PointsIdsList { ids: vec![PointId::from(item_id.to_string())] };

		self.client
			.delete_points(DeletePointsBuilder::new(self.collection.clone()).points(ids).wait(true))
			.await?;

		Ok(())
	}
}

fn point_id_to_uuid(point_id: &PointId) -> Option<Uuid> {
	match point_id.point_id_options.as_ref()? {
		PointIdOptions::Uuid(raw) => Uuid::parse_str(raw).ok(),
		PointIdOptions::Num(_) => None,
	}
}
