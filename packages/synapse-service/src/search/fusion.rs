//! Merging and rescoring of retrieval candidates.

use std::collections::{HashMap, HashSet};

use synapse_domain::intent::{self, PriceRange};
use synapse_storage::models::Item;

/// Score of an item only the lexical channel found.
pub const LEXICAL_ONLY_SCORE: f32 = 0.5;
/// Weight kept from the semantic score when the lexical channel confirms an item.
pub const CONFIRMED_SEMANTIC_WEIGHT: f32 = 0.7;
pub const CONTENT_MATCH_BOOST: f32 = 0.2;
pub const TITLE_MATCH_BOOST: f32 = 0.1;

#[derive(Debug, Clone)]
pub struct Candidate {
	pub item: Item,
	pub score: f32,
}

/// Seeds with the semantic candidates, then folds in lexical hits: a confirmed item scores
/// `0.7 * s + 0.3`, a lexical-only item `0.5`. Sorted by descending score and truncated.
pub fn fuse(semantic: Vec<Candidate>, lexical: Vec<Item>, limit: usize) -> Vec<Candidate> {
	let mut fused: Vec<Candidate> = Vec::with_capacity(semantic.len() + lexical.len());
	let mut positions = HashMap::new();
	let mut confirmed = HashSet::new();

	for candidate in semantic {
		if positions.contains_key(&candidate.item.item_id) {
			continue;
		}

		positions.insert(candidate.item.item_id, fused.len());
		fused.push(Candidate { score: candidate.score.clamp(0.0, 1.0), ..candidate });
	}
	for item in lexical {
		if !confirmed.insert(item.item_id) {
			continue;
		}

		match positions.get(&item.item_id) {
			Some(&idx) => {
				let existing = &mut fused[idx];

				existing.score = CONFIRMED_SEMANTIC_WEIGHT * existing.score
					+ (1.0 - CONFIRMED_SEMANTIC_WEIGHT);
			},
			None => {
				positions.insert(item.item_id, fused.len());
				fused.push(Candidate { item, score: LEXICAL_ONLY_SCORE });
			},
		}
	}

	sort_descending(&mut fused);
	fused.truncate(limit);

	fused
}

/// Rewards candidates containing the search terms verbatim: `+0.2` anywhere in the text fields,
/// a further `+0.1` in the title. Scores are capped at 1.0 and never lowered.
pub fn boost(candidates: &mut [Candidate], search_terms: &str) {
	let needle = search_terms.trim().to_lowercase();

	if needle.is_empty() {
		return;
	}

	for candidate in candidates.iter_mut() {
		let item = &candidate.item;
		let title = item.title.to_lowercase();
		let haystack = format!(
			"{title} {} {} {}",
			item.content.to_lowercase(),
			item.summary.to_lowercase(),
			item.ocr_text.as_deref().unwrap_or_default().to_lowercase()
		);
		let mut score = candidate.score;

		if haystack.contains(&needle) {
			score = (score + CONTENT_MATCH_BOOST).min(1.0);
		}
		if title.contains(&needle) {
			score = (score + TITLE_MATCH_BOOST).min(1.0);
		}

		candidate.score = score.max(candidate.score);
	}

	sort_descending(candidates);
}

/// Drops candidates whose listed price falls outside `price`. Unpriced candidates stay.
pub fn post_filter(mut candidates: Vec<Candidate>, price: &PriceRange) -> Vec<Candidate> {
	if price.is_unbounded() {
		return candidates;
	}

	candidates.retain(|candidate| {
		intent::listed_price(&candidate.item.content)
			.map(|listed| price.contains(listed))
			.unwrap_or(true)
	});

	candidates
}

fn sort_descending(candidates: &mut [Candidate]) {
	candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
}
