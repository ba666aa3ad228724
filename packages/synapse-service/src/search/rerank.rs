use super::fusion::Candidate;

/// Reads a ranking answer such as `"3, 1, 2"` into 0-based positions. Numbers outside
/// `1..=window` are discarded and repeats keep their first occurrence.
pub fn parse_ranked_indices(answer: &str, window: usize) -> Vec<usize> {
	let mut order = Vec::new();

	for raw in answer.split(|c: char| !c.is_ascii_digit()).filter(|raw| !raw.is_empty()) {
		let Ok(position) = raw.parse::<usize>() else {
			continue;
		};

		if position == 0 || position > window {
			continue;
		}

		let idx = position - 1;

		if !order.contains(&idx) {
			order.push(idx);
		}
	}

	order
}

/// Moves the ranked candidates to the front in the given order; the rest follow in their prior
/// relative order.
pub fn apply(candidates: Vec<Candidate>, order: &[usize]) -> Vec<Candidate> {
	let mut slots = candidates.into_iter().map(Some).collect::<Vec<_>>();
	let mut ranked = Vec::with_capacity(slots.len());

	for &idx in order {
		if let Some(candidate) = slots.get_mut(idx).and_then(Option::take) {
			ranked.push(candidate);
		}
	}

	ranked.extend(slots.into_iter().flatten());

	ranked
}

#[cfg(test)]
mod tests {
	use time::OffsetDateTime;
	use uuid::Uuid;

	use synapse_storage::models::Item;

	use super::*;

	fn candidate(title: &str) -> Candidate {
		Candidate {
			item: Item {
				item_id: Uuid::new_v4(),
				title: title.to_string(),
				content: String::new(),
				summary: String::new(),
				source_url: None,
				r#type: "text".to_string(),
				category: "Other".to_string(),
				tags: Vec::new(),
				embedding_id: None,
				image_url: None,
				embed_html: None,
				ocr_text: None,
				created_at: OffsetDateTime::UNIX_EPOCH,
			},
			score: 0.5,
		}
	}

	fn titles(candidates: &[Candidate]) -> Vec<&str> {
		candidates.iter().map(|c| c.item.title.as_str()).collect()
	}

	#[test]
	fn tolerates_noisy_answers() {
		assert_eq!(parse_ranked_indices("\"3,1,2\"", 3), vec![2, 0, 1]);
		assert_eq!(parse_ranked_indices("Ranked order: 2, 2, 9, 0, 1.", 3), vec![1, 0]);
		assert_eq!(parse_ranked_indices("1\n3", 3), vec![0, 2]);
		assert!(parse_ranked_indices("none of them", 3).is_empty());
		assert!(parse_ranked_indices("99999999999999999999999", 3).is_empty());
	}

	#[test]
	fn unranked_candidates_follow_in_prior_order() {
		let candidates = ["a", "b", "c", "d", "e"].map(candidate).to_vec();
		let reordered = apply(candidates, &[3, 1]);

		assert_eq!(titles(&reordered), vec!["d", "b", "a", "c", "e"]);
	}

	#[test]
	fn empty_order_keeps_everything() {
		let candidates = ["a", "b"].map(candidate).to_vec();

		assert_eq!(titles(&apply(candidates, &[])), vec!["a", "b"]);
	}
}
