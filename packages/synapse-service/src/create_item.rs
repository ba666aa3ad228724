use serde::Deserialize;
use time::OffsetDateTime;
use uuid::Uuid;

use synapse_domain::{
	media,
	taxonomy::{self, Category, ItemType},
	text,
};
use synapse_providers::metadata::ImageRequest;
use synapse_storage::{models::Item, qdrant::VectorPayload};

use crate::{Error, ItemView, Result, SynapseService, prompts};

const MAX_DERIVED_TITLE_CHARS: usize = 100;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreateItemRequest {
	pub title: String,
	pub content: String,
	/// Blank means "infer from the content".
	#[serde(rename = "type")]
	pub item_type: String,
	pub source_url: Option<String>,
	pub image_url: Option<String>,
	pub metadata: ItemMetadata,
}

/// Page metadata captured client-side alongside the item.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ItemMetadata {
	pub image: Option<String>,
	pub thumbnail: Option<String>,
	pub description: Option<String>,
}

pub(crate) struct MediaInput<'a> {
	pub(crate) title: &'a str,
	pub(crate) content: &'a str,
	pub(crate) item_type: Option<ItemType>,
	pub(crate) category: Category,
	pub(crate) source_url: Option<&'a str>,
	pub(crate) image_url: Option<&'a str>,
	pub(crate) metadata: Option<&'a ItemMetadata>,
}

#[derive(Debug, Default)]
pub(crate) struct Media {
	pub(crate) image_url: Option<String>,
	pub(crate) embed_html: Option<String>,
	pub(crate) description: Option<String>,
}
impl Media {
	fn is_complete(&self) -> bool {
		self.image_url.is_some() && self.embed_html.is_some()
	}
}

pub(crate) struct SummaryJob {
	pub(crate) item_id: Uuid,
	pub(crate) title: String,
	pub(crate) content: String,
	pub(crate) is_video: bool,
}

impl SynapseService {
	/// Captures an item. Category, tags and the embedding are requested concurrently; only a
	/// missing embedding fails the call. Summary refinement and OCR run detached after the row
	/// is written.
	pub async fn create_item(&self, req: CreateItemRequest) -> Result<ItemView> {
		let title = req.title.trim();
		let content = req.content.trim();

		if title.is_empty() && content.is_empty() {
			return Err(Error::InvalidRequest {
				message: "title or content must not be empty.".to_string(),
			});
		}

		let content = if content.is_empty() { title } else { content };
		let title = if title.is_empty() { derived_title(content) } else { title };
		let source_url = req.source_url.as_deref().map(str::trim).filter(|url| !url.is_empty());
		let raw_type = req.item_type.trim().to_lowercase();
		let (item_type, type_name) = if raw_type.is_empty() {
			let inferred = taxonomy::infer_item_type(title, content);

			(Some(inferred), inferred.as_str().to_string())
		} else {
			(ItemType::parse(&raw_type), raw_type)
		};
		let embed_text = format!("{title} {content}");
		let (category, tags, vector) = tokio::join!(
			self.categorize(title, &type_name, content, item_type),
			self.generate_tags(content),
			self.embed(&embed_text),
		);
		let vector = vector?;
		let category = taxonomy::forced_category(item_type, source_url).unwrap_or(category);
		let item_id = Uuid::new_v4();
		let payload = VectorPayload {
			title: title.to_string(),
			item_type: type_name.clone(),
			category: category.label().to_string(),
		};
		let media_input = MediaInput {
			title,
			content,
			item_type,
			category,
			source_url,
			image_url: req.image_url.as_deref(),
			metadata: Some(&req.metadata),
		};
		let (stored, resolved) = tokio::join!(
			self.index.upsert(item_id, vector, &payload),
			self.resolve_media(&media_input)
		);

		if let Err(err) = stored {
			tracing::warn!(
				error = %err,
				item_id = %item_id,
				"Failed to store item vector. The item is saved without semantic coverage."
			);
		}

		let is_video = item_type.is_some_and(ItemType::is_video)
			|| source_url.is_some_and(media::is_youtube_url);
		let summary = initial_summary(
			content,
			is_video,
			resolved.description.as_deref(),
			self.cfg.enrichment.excerpt_chars as usize,
		);
		let item = Item {
			item_id,
			title: title.to_string(),
			content: content.to_string(),
			summary,
			source_url: source_url.map(str::to_string),
			r#type: type_name,
			category: category.label().to_string(),
			tags,
			embedding_id: Some(item_id.to_string()),
			image_url: resolved.image_url,
			embed_html: resolved.embed_html,
			ocr_text: None,
			created_at: OffsetDateTime::now_utc(),
		};

		self.store.insert_item(&item).await?;

		tracing::info!(
			item_id = %item_id,
			item_type = %item.r#type,
			category = %item.category,
			"Created item."
		);

		if item_type.is_some_and(ItemType::wants_ocr)
			&& let Some(image_url) = item.image_url.clone()
		{
			self.spawn_ocr(item_id, image_url);
		}

		self.spawn_summary_refinement(SummaryJob {
			item_id,
			title: item.title.clone(),
			content: item.content.clone(),
			is_video,
		});

		Ok(item.into())
	}

	async fn categorize(
		&self,
		title: &str,
		type_name: &str,
		content: &str,
		item_type: Option<ItemType>,
	) -> Category {
		let prompt = prompts::categorize(
			title,
			type_name,
			content,
			self.cfg.enrichment.categorize_chars as usize,
		);

		match self.generate(&prompt, prompts::CATEGORIZE_MAX_TOKENS).await {
			Ok(answer) => Category::from_label(&answer).unwrap_or_else(|| {
				tracing::debug!(answer = %answer, "Category answer is outside the taxonomy.");

				taxonomy::default_category(item_type)
			}),
			Err(err) => {
				tracing::warn!(error = %err, "Categorization failed. Using the type default.");

				taxonomy::default_category(item_type)
			},
		}
	}

	async fn generate_tags(&self, content: &str) -> Vec<String> {
		let prompt = prompts::tags(content, self.cfg.enrichment.tags_chars as usize);

		match self.generate(&prompt, prompts::TAGS_MAX_TOKENS).await {
			Ok(answer) => prompts::parse_tags(&answer),
			Err(err) => {
				tracing::warn!(error = %err, "Tag generation failed. Saving without tags.");

				Vec::new()
			},
		}
	}

	/// Finds an image and inline embed for an item. Lookup failures only cost the media.
	pub(crate) async fn resolve_media(&self, input: &MediaInput<'_>) -> Media {
		let cfg = &self.cfg.providers.metadata;
		let mut resolved = Media {
			description: input
				.metadata
				.and_then(|metadata| metadata.description.clone())
				.filter(|description| !description.trim().is_empty()),
			..Default::default()
		};

		if let Some(video_id) = input.source_url.and_then(media::youtube_video_id) {
			resolved.embed_html = Some(media::youtube_embed_html(video_id));
			resolved.image_url = Some(media::youtube_thumbnail_url(video_id));

			return resolved;
		}

		resolved.image_url = input
			.image_url
			.map(str::trim)
			.filter(|url| !url.is_empty())
			.map(str::to_string)
			.or_else(|| {
				let metadata = input.metadata?;

				match input.item_type {
					Some(ItemType::Amazon | ItemType::Blog) => metadata.image.clone(),
					Some(ItemType::Video | ItemType::Youtube) => metadata.thumbnail.clone(),
					_ => None,
				}
			});

		if let Some(url) = input.source_url
			&& !resolved.is_complete()
		{
			match self.providers.metadata.preview(cfg, url).await {
				Ok(preview) => {
					resolved.image_url = resolved.image_url.or(preview.image_url);
					resolved.embed_html = resolved.embed_html.or(preview.embed_html);
					resolved.description = resolved.description.or(preview.description);
				},
				Err(err) => {
					tracing::debug!(error = %err, url = %url, "Page preview failed.");
				},
			}
		}
		if resolved.image_url.is_none() {
			let request = ImageRequest {
				title: input.title,
				content: input.content,
				item_type: input.item_type,
				category: input.category,
			};

			match self.providers.metadata.find_image(cfg, request).await {
				Ok(image_url) => resolved.image_url = image_url,
				Err(err) => {
					tracing::debug!(error = %err, "Image lookup failed.");
				},
			}
		}

		resolved
	}

	pub(crate) fn spawn_summary_refinement(&self, job: SummaryJob) {
		let service = self.clone();

		tokio::spawn(async move {
			match service.refine_summary(&job).await {
				Ok(Some(summary)) => {
					let updated = service.store.update_summary(job.item_id, &summary).await;

					match updated {
						Ok(true) => {
							tracing::debug!(item_id = %job.item_id, "Refined item summary.")
						},
						Ok(false) => tracing::debug!(
							item_id = %job.item_id,
							"Item disappeared before its summary was refined."
						),
						Err(err) => tracing::warn!(
							error = %err,
							item_id = %job.item_id,
							"Failed to store refined summary."
						),
					}
				},
				Ok(None) => {},
				Err(err) => {
					tracing::warn!(
						error = %err,
						item_id = %job.item_id,
						"Summary refinement failed."
					);
				},
			}
		});
	}

	async fn refine_summary(&self, job: &SummaryJob) -> Result<Option<String>> {
		let enrichment = &self.cfg.enrichment;

		if job.is_video
			&& let Some(description) = text::video_description(&job.content)
		{
			let prompt = prompts::video_summary(
				&job.title,
				description,
				enrichment.video_summary_chars as usize,
			);

			match self.generate(&prompt, prompts::VIDEO_SUMMARY_MAX_TOKENS).await {
				Ok(summary) => return Ok(non_empty(summary)),
				Err(err) if err.is_quota() => {
					tracing::warn!(
						error = %err,
						item_id = %job.item_id,
						"Video summary hit a provider quota. Keeping the excerpt."
					);

					return Ok(None);
				},
				Err(err) => {
					tracing::debug!(
						error = %err,
						item_id = %job.item_id,
						"Video summary failed. Falling back to the generic prompt."
					);
				},
			}
		}

		let prompt = prompts::summary(&job.title, &job.content, enrichment.summary_chars as usize);
		let summary = self.generate(&prompt, prompts::SUMMARY_MAX_TOKENS).await?;

		Ok(non_empty(summary))
	}

	fn spawn_ocr(&self, item_id: Uuid, image_url: String) {
		let service = self.clone();

		tokio::spawn(async move {
			let extracted =
				service.providers.ocr.extract_text(&service.cfg.providers.ocr, &image_url).await;
			let text = match extracted {
				Ok(text) => text,
				Err(err) => {
					tracing::warn!(error = %err, item_id = %item_id, "OCR extraction failed.");

					return;
				},
			};
			let text = text.trim();

			if text.is_empty() {
				return;
			}
			if let Err(err) = service.store.update_ocr_text(item_id, text).await {
				tracing::warn!(error = %err, item_id = %item_id, "Failed to store OCR text.");
			}
		});
	}
}

fn derived_title(content: &str) -> &str {
	let first_line =
		content.lines().map(str::trim).find(|line| !line.is_empty()).unwrap_or(content);

	text::truncate_chars(first_line, MAX_DERIVED_TITLE_CHARS)
}

/// Summary stored before refinement: the description of a video when one is known, otherwise an
/// excerpt of the content.
fn initial_summary(
	content: &str,
	is_video: bool,
	metadata_description: Option<&str>,
	max_chars: usize,
) -> String {
	if is_video
		&& let Some(description) = text::video_description(content).or(metadata_description)
	{
		return text::excerpt(description, max_chars);
	}

	text::excerpt(content, max_chars)
}

fn non_empty(answer: String) -> Option<String> {
	let trimmed = answer.trim();

	(!trimmed.is_empty()).then(|| trimmed.to_string())
}
