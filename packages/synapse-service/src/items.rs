use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use synapse_domain::{
	media,
	taxonomy::{self, Category, ItemType},
};
use synapse_storage::models::Item;

use crate::{
	Error, Result, SynapseService,
	create_item::{MediaInput, SummaryJob},
};

#[derive(Debug, Clone, Serialize)]
pub struct ItemView {
	pub item_id: Uuid,
	pub title: String,
	pub content: String,
	pub summary: String,
	pub source_url: Option<String>,
	#[serde(rename = "type")]
	pub item_type: String,
	pub category: String,
	pub tags: Vec<String>,
	pub embedding_id: Option<String>,
	pub image_url: Option<String>,
	pub embed_html: Option<String>,
	pub ocr_text: Option<String>,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
}
impl From<Item> for ItemView {
	fn from(item: Item) -> Self {
		Self {
			item_id: item.item_id,
			title: item.title,
			content: item.content,
			summary: item.summary,
			source_url: item.source_url,
			item_type: item.r#type,
			category: item.category,
			tags: item.tags,
			embedding_id: item.embedding_id,
			image_url: item.image_url,
			embed_html: item.embed_html,
			ocr_text: item.ocr_text,
			created_at: item.created_at,
		}
	}
}

/// An item with a similarity or relevance score in `[0, 1]`.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredItem {
	#[serde(flatten)]
	pub item: ItemView,
	pub score: f32,
}
impl ScoredItem {
	pub(crate) fn new(item: Item, score: f32) -> Self {
		Self { item: item.into(), score: score.clamp(0.0, 1.0) }
	}
}

impl SynapseService {
	pub async fn get_item(&self, item_id: Uuid) -> Result<ItemView> {
		Ok(self.require_item(item_id).await?.into())
	}

	/// Every item, newest first.
	pub async fn list_items(&self) -> Result<Vec<ItemView>> {
		let items = self.store.list_items().await?;

		Ok(items.into_iter().map(ItemView::from).collect())
	}

	/// Deletes the row, which cascades to its relation edges, then drops the vector. A failed
	/// vector delete leaves an orphan point that semantic search skips.
	pub async fn delete_item(&self, item_id: Uuid) -> Result<()> {
		if !self.store.delete_item(item_id).await? {
			return Err(Error::NotFound { message: format!("Item {item_id} does not exist.") });
		}
		if let Err(err) = self.index.delete(item_id).await {
			tracing::warn!(error = %err, item_id = %item_id, "Failed to delete item vector.");
		}

		tracing::info!(item_id = %item_id, "Deleted item.");

		Ok(())
	}

	/// Re-resolves the image of an item that has none or only a stock placeholder.
	pub async fn refresh_image(&self, item_id: Uuid) -> Result<ItemView> {
		let mut item = self.require_item(item_id).await?;
		let stock_base = &self.cfg.providers.metadata.stock_image_base;
		let replaceable = item
			.image_url
			.as_deref()
			.map(|image_url| media::is_stock_placeholder(image_url, stock_base))
			.unwrap_or(true);

		if !replaceable {
			return Ok(item.into());
		}

		let item_type = ItemType::parse(&item.r#type);
		let category = Category::from_label(&item.category)
			.unwrap_or_else(|| taxonomy::default_category(item_type));
		let resolved = self
			.resolve_media(&MediaInput {
				title: &item.title,
				content: &item.content,
				item_type,
				category,
				source_url: item.source_url.as_deref(),
				image_url: None,
				metadata: None,
			})
			.await;

		if let Some(image_url) = resolved.image_url
			&& item.image_url.as_deref() != Some(image_url.as_str())
		{
			self.store.update_image_url(item_id, Some(&image_url)).await?;

			item.image_url = Some(image_url);
		}

		Ok(item.into())
	}

	/// Schedules summary refinement and returns without waiting for it.
	pub async fn refresh_summary(&self, item_id: Uuid) -> Result<()> {
		let item = self.require_item(item_id).await?;
		let is_video = ItemType::parse(&item.r#type).is_some_and(ItemType::is_video)
			|| item.source_url.as_deref().is_some_and(media::is_youtube_url);

		self.spawn_summary_refinement(SummaryJob {
			item_id,
			title: item.title,
			content: item.content,
			is_video,
		});

		Ok(())
	}
}
