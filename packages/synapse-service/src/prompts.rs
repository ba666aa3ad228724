use synapse_domain::{taxonomy::Category, text};
use synapse_storage::models::Item;

pub(crate) const CATEGORIZE_MAX_TOKENS: u32 = 20;
pub(crate) const TAGS_MAX_TOKENS: u32 = 50;
pub(crate) const SUMMARY_MAX_TOKENS: u32 = 200;
pub(crate) const VIDEO_SUMMARY_MAX_TOKENS: u32 = 150;
pub(crate) const RERANK_MAX_TOKENS: u32 = 50;
pub(crate) const EXPANSION_MAX_TOKENS: u32 = 150;

const MAX_TAGS: usize = 5;

pub(crate) fn categorize(title: &str, item_type: &str, content: &str, max_chars: usize) -> String {
	let labels =
		Category::ALL.iter().map(|category| format!("- {}", category.label())).collect::<Vec<_>>();

	format!(
		"Categorize this content into exactly one of these sections:\n{}\n\nTitle: {title}\nType: {item_type}\nContent: {}\n\nAnswer with the section name only.",
		labels.join("\n"),
		text::truncate_chars(content, max_chars),
	)
}

pub(crate) fn tags(content: &str, max_chars: usize) -> String {
	format!(
		"Extract 3-5 relevant lowercase tags for this content. Answer with the tags separated by commas, without numbering or explanations:\n\n{}",
		text::truncate_chars(content, max_chars),
	)
}

pub(crate) fn summary(title: &str, content: &str, max_chars: usize) -> String {
	format!(
		"Write a concise summary (2-3 sentences) of this content covering its key concepts, topics and ideas. The summary is used for search, so keep the important keywords.\n\nTitle: {title}\nContent: {}\n\nSummary:",
		text::truncate_chars(content, max_chars),
	)
}

pub(crate) fn video_summary(title: &str, description: &str, max_chars: usize) -> String {
	format!(
		"Write a short summary (at most 2-3 sentences) of this YouTube video. Cover only the main topic and key points.\n\nVideo title: {title}\nVideo description: {}\n\nSummary:",
		text::truncate_chars(description, max_chars),
	)
}

pub(crate) fn expand_query(query: &str) -> String {
	format!(
		"Rewrite the search query below so it finds relevant saved content even when the content uses different words. Keep the original meaning and add synonyms, related terms and alternative phrasings.\n\nExamples:\n- \"things about AI\" -> \"artificial intelligence machine learning neural networks AI\"\n- \"cooking ideas\" -> \"recipes cooking food preparation ingredients\"\n- \"workout tips\" -> \"exercise fitness training health workout\"\n\nAnswer with the rewritten query only.\n\nQuery: \"{query}\"\n\nRewritten query:"
	)
}

pub(crate) fn rerank(query: &str, candidates: &[&Item]) -> String {
	let mut listing = String::new();

	for (i, item) in candidates.iter().enumerate() {
		listing.push_str(&format!(
			"{}. Title: {}\n   Summary: {}\n   Type: {}\n",
			i + 1,
			item.title,
			text::truncate_chars(&item.summary, 200),
			item.r#type,
		));
	}

	format!(
		"Rank these search results by relevance to the query.\n\nSearch query: {query}\n\nSearch results:\n{listing}\nAnswer with a comma-separated list of the result numbers, most relevant first, for example \"3,1,2\".\n\nRanked order:"
	)
}

/// Splits a tag answer on commas. Tags are trimmed, stripped of `#` and quotes, lower-cased and
/// deduplicated; at most five are kept.
pub(crate) fn parse_tags(answer: &str) -> Vec<String> {
	let mut tags: Vec<String> = Vec::new();

	for raw in answer.split([',', '\n']) {
		let tag = raw
			.trim()
			.trim_matches(|c: char| matches!(c, '#' | '"' | '\'' | '`' | '*' | '-'))
			.trim()
			.to_lowercase();

		if tag.is_empty() || tags.contains(&tag) {
			continue;
		}

		tags.push(tag);

		if tags.len() == MAX_TAGS {
			break;
		}
	}

	tags
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn tag_answers_are_normalized() {
		assert_eq!(
			parse_tags(" #Baking, \"Cookies\", baking ,, dessert\n chocolate, sweets, extra"),
			vec!["baking", "cookies", "dessert", "chocolate", "sweets"]
		);
		assert!(parse_tags("  ").is_empty());
	}

	#[test]
	fn categorize_prompt_lists_every_label_and_truncates_content() {
		let prompt = categorize("Cookies", "recipe", &"x".repeat(40), 10);

		for category in Category::ALL {
			assert!(prompt.contains(&format!("- {}\n", category.label())));
		}

		assert!(prompt.contains(&format!("Content: {}\n", "x".repeat(10))));
	}
}
