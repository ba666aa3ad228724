//! Page previews and image lookup for captured items.

use std::sync::LazyLock;

use regex::Regex;
use reqwest::{Client, header::USER_AGENT};
use scraper::{Html, Selector};
use serde_json::Value;

use synapse_config::MetadataConfig;
use synapse_domain::{
	media,
	taxonomy::{Category, ItemType},
};

use crate::Result;

const COVERS_BASE: &str = "https://covers.openlibrary.org/b";
const MAX_TITLE_KEYWORDS: usize = 5;
const STOP_WORDS: &[&str] = &[
	"the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by", "from",
	"as", "is", "are", "was", "were", "be", "been", "have", "has", "had", "do", "does", "did",
	"will", "would", "should", "could", "may", "might", "must", "this", "that", "these", "those",
	"i", "you", "he", "she", "it", "we", "they",
];

static ISBN_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
	[
		r"(?i)ISBN[-\s]*(?:13)?[:\s]*([0-9]{13})",
		r"(?i)ISBN[-\s]*(?:10)?[:\s]*([0-9X]{10})",
		r"\b(97[89][- ]?[0-9]{10})\b",
	]
	.into_iter()
	.filter_map(|pattern| Regex::new(pattern).ok())
	.collect()
});
static URL_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"https?://[^\s]+").ok());

/// What a page advertises about itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PagePreview {
	pub image_url: Option<String>,
	pub embed_html: Option<String>,
	pub description: Option<String>,
}

/// Inputs for picking an illustrative image.
#[derive(Debug, Clone, Copy)]
pub struct ImageRequest<'a> {
	pub title: &'a str,
	pub content: &'a str,
	pub item_type: Option<ItemType>,
	pub category: Category,
}

pub async fn preview(cfg: &MetadataConfig, url: &str) -> Result<PagePreview> {
	if media::is_pdf_url(url) {
		return Ok(PagePreview {
			embed_html: Some(media::pdf_embed_html(url)),
			..Default::default()
		});
	}

	let html = fetch_page(&crate::client(cfg.timeout_ms)?, cfg, url).await?;

	Ok(parse_preview(&html))
}

/// Finds an image for an item that has none. Books try a cover lookup first; recipes and
/// everything else get a stock image keyed by category and title keywords.
pub async fn find_image(cfg: &MetadataConfig, req: &ImageRequest<'_>) -> Result<Option<String>> {
	match req.item_type {
		Some(ItemType::Video | ItemType::Youtube | ItemType::Amazon) => return Ok(None),
		Some(ItemType::Book) => {
			let client = crate::client(cfg.timeout_ms)?;

			if let Some(cover) = book_cover(&client, cfg, req.title, req.content).await? {
				return Ok(Some(cover));
			}
		},
		Some(ItemType::Recipe) => {
			return Ok(Some(stock_image_url(&cfg.stock_image_base, "recipe", req.title, 2)));
		},
		Some(ItemType::Blog | ItemType::Url) => {
			if let Some(page_url) = URL_RE.as_ref().and_then(|re| re.find(req.content)) {
				let client = crate::client(cfg.timeout_ms)?;

				match fetch_page(&client, cfg, page_url.as_str()).await {
					Ok(html) =>
						if let Some(image_url) = parse_preview(&html).image_url {
							return Ok(Some(image_url));
						},
					Err(err) => {
						tracing::debug!(
							error = %err,
							url = page_url.as_str(),
							"Preview fetch failed."
						);
					},
				}
			}
		},
		_ => {},
	}

	let term = category_search_term(req.category);

	Ok(Some(stock_image_url(&cfg.stock_image_base, term, req.title, 3)))
}

async fn fetch_page(client: &Client, cfg: &MetadataConfig, url: &str) -> Result<String> {
	let res = client.get(url).header(USER_AGENT, &cfg.user_agent).send().await?;

	Ok(res.error_for_status()?.text().await?)
}

async fn book_cover(
	client: &Client,
	cfg: &MetadataConfig,
	title: &str,
	content: &str,
) -> Result<Option<String>> {
	if let Some(isbn) = extract_isbn(content) {
		let url = format!("{COVERS_BASE}/isbn/{isbn}-L.jpg?default=false");
		let res = client.head(&url).header(USER_AGENT, &cfg.user_agent).send().await?;

		if res.status().is_success() {
			return Ok(Some(format!("{COVERS_BASE}/isbn/{isbn}-L.jpg")));
		}
	}

	let url = format!("{}/search.json", cfg.book_cover_api_base.trim_end_matches('/'));
	let res = client
		.get(url)
		.query(&[("title", title), ("limit", "1")])
		.header(USER_AGENT, &cfg.user_agent)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	Ok(parse_cover_search(&json))
}

fn parse_preview(html: &str) -> PagePreview {
	let Ok(meta_selector) = Selector::parse("meta") else {
		return PagePreview::default();
	};
	let document = Html::parse_document(html);
	let mut og_image = None;
	let mut twitter_image = None;
	let mut description = None;

	for element in document.select(&meta_selector) {
		let key = element.attr("property").or_else(|| element.attr("name")).unwrap_or_default();
		let Some(content) = element.attr("content").map(str::trim).filter(|c| !c.is_empty())
		else {
			continue;
		};
		let slot = match key.to_ascii_lowercase().as_str() {
			"og:image" => &mut og_image,
			"twitter:image" => &mut twitter_image,
			"og:description" => &mut description,
			_ => continue,
		};

		slot.get_or_insert_with(|| content.to_string());
	}

	let image_url = og_image.or(twitter_image);
	let embed_html = image_url.as_ref().map(|image_url| {
		format!(
			r#"<div class="url-preview"><img src="{}" alt="Preview" style="max-width: 100%; border-radius: 8px;" /></div>"#,
			image_url.replace('&', "&amp;").replace('"', "&quot;")
		)
	});

	PagePreview { image_url, embed_html, description }
}

fn parse_cover_search(json: &Value) -> Option<String> {
	let cover_id = json
		.get("docs")
		.and_then(Value::as_array)
		.and_then(|docs| docs.first())
		.and_then(|doc| doc.get("cover_i"))
		.and_then(Value::as_i64)
		.filter(|id| *id > 0)?;

	Some(format!("{COVERS_BASE}/id/{cover_id}-L.jpg"))
}

fn extract_isbn(content: &str) -> Option<String> {
	ISBN_RES
		.iter()
		.find_map(|re| re.captures(content))
		.and_then(|caps| caps.get(1))
		.map(|m| m.as_str().chars().filter(|c| !matches!(c, '-' | ' ')).collect())
}

fn category_search_term(category: Category) -> &'static str {
	match category {
		Category::Technology => "technology",
		Category::FoodRecipes => "food",
		Category::BooksReading => "books",
		Category::VideosEntertainment => "entertainment",
		Category::ShoppingProducts => "product",
		Category::ArticlesNews => "news",
		Category::NotesIdeas => "notebook",
		Category::DesignInspiration => "design",
		Category::Travel => "travel",
		Category::HealthFitness => "fitness",
		Category::EducationLearning => "education",
		Category::Other => "abstract",
	}
}

fn stock_image_url(base: &str, term: &str, title: &str, max_keywords: usize) -> String {
	let mut parts = vec![term.to_string()];

	parts.extend(title_keywords(title).into_iter().take(max_keywords));

	format!("{base}?{}", parts.join(",").replace(' ', "+"))
}

fn title_keywords(title: &str) -> Vec<String> {
	title
		.to_lowercase()
		.split_whitespace()
		.map(|word| word.trim_matches(|c: char| !c.is_alphanumeric()).to_string())
		.filter(|word| word.chars().count() > 2 && !STOP_WORDS.contains(&word.as_str()))
		.take(MAX_TITLE_KEYWORDS)
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn reads_open_graph_image_in_either_attribute_order() {
		let html = r#"<head><meta property="og:image" content="https://cdn.test/a.png"></head>"#;

		assert_eq!(parse_preview(html).image_url.as_deref(), Some("https://cdn.test/a.png"));

		let html = r#"<meta content='https://cdn.test/b.png' property='og:image' />"#;

		assert_eq!(parse_preview(html).image_url.as_deref(), Some("https://cdn.test/b.png"));

		let html = r#"<meta name="twitter:image" content="https://cdn.test/c.png">"#;
		let preview = parse_preview(html);

		assert_eq!(preview.image_url.as_deref(), Some("https://cdn.test/c.png"));
		assert!(preview.embed_html.is_some_and(|html| html.contains("https://cdn.test/c.png")));
	}

	#[test]
	fn decodes_entities_in_meta_content() {
		let html = r#"<head>
			<meta property="og:image" content="https://cdn.test/a.jpg?w=1&amp;h=2">
			<meta property="og:description" content="Don't miss it">
		</head>"#;
		let preview = parse_preview(html);

		assert_eq!(preview.image_url.as_deref(), Some("https://cdn.test/a.jpg?w=1&h=2"));
		assert_eq!(preview.description.as_deref(), Some("Don't miss it"));
		assert!(preview.embed_html.is_some_and(|html| html.contains("a.jpg?w=1&amp;h=2")));
	}

	#[test]
	fn open_graph_image_wins_over_twitter_image() {
		let html = r#"<meta name="twitter:image" content="https://cdn.test/t.png">
			<meta property="og:image" content="https://cdn.test/og.png">"#;

		assert_eq!(parse_preview(html).image_url.as_deref(), Some("https://cdn.test/og.png"));
	}

	#[test]
	fn pages_without_images_have_no_embed() {
		let preview = parse_preview("<html><title>Plain</title></html>");

		assert_eq!(preview, PagePreview::default());
	}

	#[test]
	fn extracts_isbns() {
		assert_eq!(extract_isbn("ISBN-13: 9780441013593"), Some("9780441013593".to_string()));
		assert_eq!(extract_isbn("isbn 044101359X"), Some("044101359X".to_string()));
		assert_eq!(extract_isbn("printed as 978-0441013593"), Some("9780441013593".to_string()));
		assert_eq!(extract_isbn("no identifiers"), None);
	}

	#[test]
	fn parses_cover_search_results() {
		let json = serde_json::json!({ "docs": [{ "cover_i": 240726 }] });

		assert_eq!(
			parse_cover_search(&json).as_deref(),
			Some("https://covers.openlibrary.org/b/id/240726-L.jpg")
		);
		assert_eq!(parse_cover_search(&serde_json::json!({ "docs": [{ "cover_i": -1 }] })), None);
	}

	#[test]
	fn stock_images_use_category_and_title_keywords() {
		let url = stock_image_url(
			"https://source.unsplash.com/400x300/",
			"recipe",
			"The Best Chocolate Chip Cookies",
			2,
		);

		assert_eq!(url, "https://source.unsplash.com/400x300/?recipe,best,chocolate");
		assert_eq!(category_search_term(Category::Other), "abstract");
	}
}
