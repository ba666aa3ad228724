use std::sync::LazyLock;

use regex::Regex;

static YOUTUBE_ID_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
	[
		r"youtube\.com/watch\?(?:[^#\s]*&)?v=([a-zA-Z0-9_-]+)",
		r"youtu\.be/([a-zA-Z0-9_-]+)",
		r"youtube\.com/embed/([a-zA-Z0-9_-]+)",
		r"youtube\.com/shorts/([a-zA-Z0-9_-]+)",
	]
	.into_iter()
	.filter_map(|pattern| Regex::new(pattern).ok())
	.collect()
});

pub fn youtube_video_id(url: &str) -> Option<&str> {
	YOUTUBE_ID_RES
		.iter()
		.find_map(|re| re.captures(url))
		.and_then(|caps| caps.get(1))
		.map(|id| id.as_str())
}

pub fn is_youtube_url(url: &str) -> bool {
	url.contains("youtube.com") || url.contains("youtu.be")
}

pub fn youtube_embed_html(video_id: &str) -> String {
	format!(
		r#"<iframe width="100%" height="315" src="https://www.youtube.com/embed/{video_id}?rel=0" frameborder="0" allow="accelerometer; autoplay; clipboard-write; encrypted-media; gyroscope; picture-in-picture" allowfullscreen></iframe>"#
	)
}

pub fn youtube_thumbnail_url(video_id: &str) -> String {
	format!("https://img.youtube.com/vi/{video_id}/maxresdefault.jpg")
}

pub fn is_pdf_url(url: &str) -> bool {
	let path = url.split(['?', '#']).next().unwrap_or(url);

	path.to_ascii_lowercase().ends_with(".pdf")
}

pub fn pdf_embed_html(url: &str) -> String {
	let escaped = url.replace('&', "&amp;").replace('"', "&quot;");

	format!(r#"<iframe src="{escaped}" width="100%" height="600" frameborder="0"></iframe>"#)
}

/// Placeholder stock images are replaced when an item's image is refreshed.
pub fn is_stock_placeholder(image_url: &str, stock_image_base: &str) -> bool {
	let host = stock_image_base
		.trim_start_matches("https://")
		.trim_start_matches("http://")
		.split('/')
		.next()
		.unwrap_or_default();

	!host.is_empty() && image_url.contains(host)
}
