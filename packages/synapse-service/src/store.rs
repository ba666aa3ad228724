use uuid::Uuid;

use synapse_storage::{
	db::Db,
	models::{Item, ItemSearch, RelatedItem},
	qdrant::{Neighbor, QdrantStore, VectorPayload},
	queries,
};

use crate::{BoxFuture, ItemStore, Result, VectorIndex};

impl ItemStore for Db {
	fn insert_item<'a>(&'a self, item: &'a Item) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move { Ok(queries::insert_item(self, item).await?) })
	}

	fn get_item<'a>(&'a self, item_id: Uuid) -> BoxFuture<'a, Result<Option<Item>>> {
		Box::pin(async move { Ok(queries::get_item(self, item_id).await?) })
	}

	fn get_items<'a>(&'a self, item_ids: &'a [Uuid]) -> BoxFuture<'a, Result<Vec<Item>>> {
		Box::pin(async move { Ok(queries::get_items_by_ids(self, item_ids).await?) })
	}

	fn list_items<'a>(&'a self) -> BoxFuture<'a, Result<Vec<Item>>> {
		Box::pin(async move { Ok(queries::list_items(self).await?) })
	}

	fn delete_item<'a>(&'a self, item_id: Uuid) -> BoxFuture<'a, Result<bool>> {
		Box::pin(async move { Ok(queries::delete_item(self, item_id).await?) })
	}

	fn update_summary<'a>(
		&'a self,
		item_id: Uuid,
		summary: &'a str,
	) -> BoxFuture<'a, Result<bool>> {
		Box::pin(async move { Ok(queries::update_summary(self, item_id, summary).await?) })
	}

	fn update_ocr_text<'a>(
		&'a self,
		item_id: Uuid,
		ocr_text: &'a str,
	) -> BoxFuture<'a, Result<bool>> {
		Box::pin(async move { Ok(queries::update_ocr_text(self, item_id, ocr_text).await?) })
	}

	fn update_image_url<'a>(
		&'a self,
		item_id: Uuid,
		image_url: Option<&'a str>,
	) -> BoxFuture<'a, Result<bool>> {
		Box::pin(async move { Ok(queries::update_image_url(self, item_id, image_url).await?) })
	}

	fn search_items<'a>(&'a self, search: &'a ItemSearch) -> BoxFuture<'a, Result<Vec<Item>>> {
		Box::pin(async move { Ok(queries::search_items(self, search).await?) })
	}

	fn upsert_relation<'a>(
		&'a self,
		item_id: Uuid,
		related_item_id: Uuid,
		similarity_score: f32,
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			Ok(queries::upsert_relation(self, item_id, related_item_id, similarity_score).await?)
		})
	}

	fn related_items<'a>(
		&'a self,
		item_id: Uuid,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<RelatedItem>>> {
		Box::pin(async move { Ok(queries::related_items(self, item_id, i64::from(limit)).await?) })
	}
}

impl VectorIndex for QdrantStore {
	fn upsert<'a>(
		&'a self,
		item_id: Uuid,
		vector: Vec<f32>,
		payload: &'a VectorPayload,
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move { Ok(QdrantStore::upsert(self, item_id, vector, payload).await?) })
	}

	fn query<'a>(&'a self, vector: Vec<f32>, limit: u32) -> BoxFuture<'a, Result<Vec<Neighbor>>> {
		Box::pin(async move { Ok(self.nearest(vector, u64::from(limit)).await?) })
	}

	fn delete<'a>(&'a self, item_id: Uuid) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move { Ok(QdrantStore::delete(self, item_id).await?) })
	}
}
