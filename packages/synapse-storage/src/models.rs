use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Item {
	pub item_id: Uuid,
	pub title: String,
	pub content: String,
	pub summary: String,
	pub source_url: Option<String>,
	pub r#type: String,
	pub category: String,
	pub tags: Vec<String>,
	pub embedding_id: Option<String>,
	pub image_url: Option<String>,
	pub embed_html: Option<String>,
	pub ocr_text: Option<String>,
	pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RelatedItem {
	#[sqlx(flatten)]
	pub item: Item,
	pub similarity_score: f32,
}

/// Lexical search predicates. Empty `terms` means no text predicate.
#[derive(Debug, Clone, Default)]
pub struct ItemSearch {
	pub terms: String,
	pub item_type: Option<String>,
	pub date_from: Option<OffsetDateTime>,
	pub date_to: Option<OffsetDateTime>,
	pub tags: Vec<String>,
	pub author: Option<String>,
	pub category: Option<String>,
	pub limit: i64,
}
