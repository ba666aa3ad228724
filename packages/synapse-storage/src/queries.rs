use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
	Error, Result,
	db::Db,
	models::{Item, ItemSearch, RelatedItem},
};

const ITEM_COLUMNS: &str = "\
item_id,
	title,
	content,
	summary,
	source_url,
	type,
	category,
	tags,
	embedding_id,
	image_url,
	embed_html,
	ocr_text,
	created_at";
const TEXT_COLUMNS: [&str; 4] = ["title", "content", "summary", "COALESCE(ocr_text, '')"];
const MIN_WORD_CHARS: usize = 2;

pub async fn insert_item(db: &Db, item: &Item) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO items (
	item_id,
	title,
	content,
	summary,
	source_url,
	type,
	category,
	tags,
	embedding_id,
	image_url,
	embed_html,
	ocr_text,
	created_at
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
	)
	.bind(item.item_id)
	.bind(item.title.as_str())
	.bind(item.content.as_str())
	.bind(item.summary.as_str())
	.bind(item.source_url.as_deref())
	.bind(item.r#type.as_str())
	.bind(item.category.as_str())
	.bind(&item.tags)
	.bind(item.embedding_id.as_deref())
	.bind(item.image_url.as_deref())
	.bind(item.embed_html.as_deref())
	.bind(item.ocr_text.as_deref())
	.bind(item.created_at)
	.execute(&db.pool)
	.await?;

	Ok(())
}

pub async fn get_item(db: &Db, item_id: Uuid) -> Result<Option<Item>> {
	let sql = format!("SELECT {ITEM_COLUMNS}\nFROM items\nWHERE item_id = $1");
	let item = sqlx::query_as::<_, Item>(&sql).bind(item_id).fetch_optional(&db.pool).await?;

	Ok(item)
}

/// Rows come back in no particular order; callers re-order by their own ranking.
pub async fn get_items_by_ids(db: &Db, item_ids: &[Uuid]) -> Result<Vec<Item>> {
	if item_ids.is_empty() {
		return Ok(Vec::new());
	}

	let sql = format!("SELECT {ITEM_COLUMNS}\nFROM items\nWHERE item_id = ANY($1)");
	let items = sqlx::query_as::<_, Item>(&sql).bind(item_ids).fetch_all(&db.pool).await?;

	Ok(items)
}

pub async fn list_items(db: &Db) -> Result<Vec<Item>> {
	let sql = format!("SELECT {ITEM_COLUMNS}\nFROM items\nORDER BY created_at DESC, item_id");
	let items = sqlx::query_as::<_, Item>(&sql).fetch_all(&db.pool).await?;

	Ok(items)
}

/// Relations of the item go with it through the foreign key cascade.
pub async fn delete_item(db: &Db, item_id: Uuid) -> Result<bool> {
	let result = sqlx::query("DELETE FROM items WHERE item_id = $1")
		.bind(item_id)
		.execute(&db.pool)
		.await?;

	Ok(result.rows_affected() > 0)
}

pub async fn update_summary(db: &Db, item_id: Uuid, summary: &str) -> Result<bool> {
	let result = sqlx::query("UPDATE items SET summary = $1 WHERE item_id = $2")
		.bind(summary)
		.bind(item_id)
		.execute(&db.pool)
		.await?;

	Ok(result.rows_affected() > 0)
}

pub async fn update_ocr_text(db: &Db, item_id: Uuid, ocr_text: &str) -> Result<bool> {
	let result = sqlx::query("UPDATE items SET ocr_text = $1 WHERE item_id = $2")
		.bind(ocr_text)
		.bind(item_id)
		.execute(&db.pool)
		.await?;

	Ok(result.rows_affected() > 0)
}

pub async fn update_image_url(db: &Db, item_id: Uuid, image_url: Option<&str>) -> Result<bool> {
	let result = sqlx::query("UPDATE items SET image_url = $1 WHERE item_id = $2")
		.bind(image_url)
		.bind(item_id)
		.execute(&db.pool)
		.await?;

	Ok(result.rows_affected() > 0)
}

pub async fn search_items(db: &Db, search: &ItemSearch) -> Result<Vec<Item>> {
	let mut query = build_lexical_query(search)?;
	let items = query.build_query_as::<Item>().fetch_all(&db.pool).await?;

	Ok(items)
}

/// Builds the keyword query: one OR group over every searchable column for each term of at
/// least two characters plus the whole phrase, narrowed by the structured filters, newest first.
pub fn build_lexical_query(search: &ItemSearch) -> Result<QueryBuilder<'static, Postgres>> {
	if search.limit <= 0 {
		return Err(Error::InvalidArgument("Search limit must be greater than zero.".to_string()));
	}

	let mut query = QueryBuilder::new(format!("SELECT {ITEM_COLUMNS}\nFROM items\nWHERE TRUE"));
	let terms = search.terms.trim();

	if !terms.is_empty() {
		let mut patterns = terms
			.split_whitespace()
			.filter(|word| word.chars().count() >= MIN_WORD_CHARS)
			.map(like_pattern)
			.collect::<Vec<_>>();
		let phrase = like_pattern(terms);

		if !patterns.contains(&phrase) {
			patterns.push(phrase);
		}

		query.push("\n\tAND (");

		for (i, pattern) in patterns.iter().enumerate() {
			if i > 0 {
				query.push(" OR ");
			}

			for (j, column) in TEXT_COLUMNS.iter().enumerate() {
				if j > 0 {
					query.push(" OR ");
				}

				query.push(format!("{column} ILIKE ")).push_bind(pattern.clone());
			}
		}

		query.push(")");
	} else if let Some(item_type) = search.item_type.as_ref() {
		query.push("\n\tAND type = ").push_bind(item_type.clone());
	}
	if let Some(date_from) = search.date_from {
		query.push("\n\tAND created_at >= ").push_bind(date_from);
	}
	if let Some(date_to) = search.date_to {
		query.push("\n\tAND created_at < ").push_bind(date_to);
	}
	if !search.tags.is_empty() {
		query.push("\n\tAND tags && ").push_bind(search.tags.clone());
	}
	if let Some(author) = search.author.as_ref() {
		let pattern = like_pattern(author);

		query
			.push("\n\tAND (content ILIKE ")
			.push_bind(pattern.clone())
			.push(" OR title ILIKE ")
			.push_bind(pattern)
			.push(")");
	}
	if let Some(category) = search.category.as_ref() {
		query.push("\n\tAND category = ").push_bind(category.clone());
	}

	query.push("\nORDER BY created_at DESC, item_id\nLIMIT ").push_bind(search.limit);

	Ok(query)
}

/// Inserting an existing pair overwrites its score and refreshes its timestamp.
pub async fn upsert_relation(
	db: &Db,
	item_id: Uuid,
	related_item_id: Uuid,
	similarity_score: f32,
) -> Result<()> {
	if item_id == related_item_id {
		return Err(Error::InvalidArgument("An item cannot be related to itself.".to_string()));
	}
	if !(0.0..=1.0).contains(&similarity_score) {
		return Err(Error::InvalidArgument(format!(
			"Similarity score {similarity_score} is outside [0, 1]."
		)));
	}

	sqlx::query(
		"\
INSERT INTO item_relations (item_id, related_item_id, similarity_score)
VALUES ($1, $2, $3)
ON CONFLICT (item_id, related_item_id) DO UPDATE
SET
	similarity_score = EXCLUDED.similarity_score,
	created_at = now()",
	)
	.bind(item_id)
	.bind(related_item_id)
	.bind(similarity_score)
	.execute(&db.pool)
	.await?;

	Ok(())
}

pub async fn related_items(db: &Db, item_id: Uuid, limit: i64) -> Result<Vec<RelatedItem>> {
	let sql = format!(
		"\
SELECT
	{},
	r.similarity_score
FROM item_relations r
JOIN items i ON i.item_id = r.related_item_id
WHERE r.item_id = $1
ORDER BY r.similarity_score DESC, i.item_id
LIMIT $2",
		qualified_columns("i")
	);
	let rows = sqlx::query_as::<_, RelatedItem>(&sql)
		.bind(item_id)
		.bind(limit)
		.fetch_all(&db.pool)
		.await?;

	Ok(rows)
}

fn qualified_columns(alias: &str) -> String {
	ITEM_COLUMNS
		.split(',')
		.map(|column| format!("{alias}.{}", column.trim()))
		.collect::<Vec<_>>()
		.join(",\n\t")
}

fn like_pattern(raw: &str) -> String {
	let mut escaped = String::with_capacity(raw.len() + 2);

	escaped.push('%');

	for c in raw.chars() {
		if matches!(c, '%' | '_' | '\\') {
			escaped.push('\\');
		}

		escaped.push(c);
	}

	escaped.push('%');

	escaped
}
