use uuid::Uuid;

use synapse_domain::text;
use synapse_storage::qdrant::Neighbor;

use crate::{Result, ScoredItem, SynapseService};

impl SynapseService {
	/// Items similar to `item_id`. Cached relation edges are returned as they are; without any,
	/// neighbours are computed from the item's embedding and written back as edges. Concurrent
	/// computations for the same item both upsert and the last write wins.
	pub async fn find_related(&self, item_id: Uuid, limit: Option<u32>) -> Result<Vec<ScoredItem>> {
		let relations = &self.cfg.relations;
		let limit = limit
			.filter(|limit| *limit > 0)
			.unwrap_or(relations.default_limit)
			.min(self.cfg.search.max_limit);

		match self.store.related_items(item_id, limit).await {
			Ok(cached) if !cached.is_empty() => {
				return Ok(cached
					.into_iter()
					.map(|related| ScoredItem::new(related.item, related.similarity_score))
					.collect());
			},
			Ok(_) => {},
			Err(err) => {
				tracing::warn!(error = %err, item_id = %item_id, "Relation cache read failed.");
			},
		}

		let item = self.require_item(item_id).await?;
		let source = format!("{} {}", item.title, item.content);
		let vector =
			self.embed(text::truncate_chars(&source, relations.source_chars as usize)).await?;
		let neighbors = self
			.index
			.query(vector, limit + relations.neighbor_headroom)
			.await?
			.into_iter()
			.filter(|neighbor| neighbor.item_id != item_id)
			.take(limit as usize)
			.collect::<Vec<Neighbor>>();
		let related = self.hydrate(&neighbors).await?;

		for candidate in &related {
			if let Err(err) =
				self.store.upsert_relation(item_id, candidate.item.item_id, candidate.score).await
			{
				tracing::warn!(
					error = %err,
					item_id = %item_id,
					related_item_id = %candidate.item.item_id,
					"Failed to cache item relation."
				);
			}
		}

		tracing::debug!(item_id = %item_id, related = related.len(), "Computed related items.");

		Ok(related
			.into_iter()
			.map(|candidate| ScoredItem::new(candidate.item, candidate.score))
			.collect())
	}
}
