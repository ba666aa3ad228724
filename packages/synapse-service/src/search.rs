pub mod fusion;
pub mod rerank;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use synapse_domain::{
	intent::{self, QueryFilters},
	taxonomy::{Category, ItemType},
};
use synapse_storage::{
	models::{Item, ItemSearch},
	qdrant::Neighbor,
};

use crate::{Error, Result, ScoredItem, SynapseService, prompts};
use fusion::Candidate;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchRequest {
	pub query: String,
	pub limit: Option<u32>,
}

/// The structured reading of a query, echoed back to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct FiltersView {
	pub search_terms: String,
	pub quote: bool,
	#[serde(rename = "type")]
	pub item_type: Option<ItemType>,
	#[serde(with = "crate::time_serde::option")]
	pub date_from: Option<OffsetDateTime>,
	#[serde(with = "crate::time_serde::option")]
	pub date_to: Option<OffsetDateTime>,
	pub price_min: Option<f64>,
	pub price_max: Option<f64>,
	pub author: Option<String>,
	pub category: Option<Category>,
	pub tags: Vec<String>,
}
impl From<&QueryFilters> for FiltersView {
	fn from(filters: &QueryFilters) -> Self {
		Self {
			search_terms: filters.search_terms.clone(),
			quote: filters.quote,
			item_type: filters.item_type,
			date_from: filters.date_from,
			date_to: filters.date_to,
			price_min: filters.price.min,
			price_max: filters.price.max,
			author: filters.author.clone(),
			category: filters.category,
			tags: filters.tags.clone(),
		}
	}
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
	pub query: String,
	pub filters: FiltersView,
	pub results: Vec<ScoredItem>,
}

impl SynapseService {
	/// Hybrid search: semantic and lexical retrieval run concurrently, then fusion, exact-match
	/// boosting, the price post-filter and a model re-rank of the head of the list. Fails only
	/// when both retrieval channels fail.
	pub async fn search(&self, req: SearchRequest) -> Result<SearchResponse> {
		let query = req.query.trim();

		if query.is_empty() {
			return Err(Error::InvalidRequest { message: "query must not be empty.".to_string() });
		}

		let limit = self.search_limit(req.limit);
		let candidate_limit = limit * self.cfg.search.candidate_multiplier.max(1) as usize;
		let filters = intent::parse(query);
		let semantic_text = self.semantic_text(query).await;
		let lexical_search = lexical_search(&filters, candidate_limit);
		let (semantic, lexical) = tokio::join!(
			self.semantic_channel(&semantic_text, candidate_limit),
			self.store.search_items(&lexical_search),
		);
		let (semantic, lexical) = match (semantic, lexical) {
			(Err(semantic), Err(lexical)) => {
				return Err(Error::SearchUnavailable {
					semantic: semantic.to_string(),
					lexical: lexical.to_string(),
				});
			},
			(semantic, lexical) => (
				semantic.unwrap_or_else(|err| {
					tracing::warn!(error = %err, "Semantic channel failed. Using lexical results.");

					Vec::new()
				}),
				lexical.unwrap_or_else(|err| {
					tracing::warn!(error = %err, "Lexical channel failed. Using semantic results.");

					Vec::new()
				}),
			),
		};
		let mut results = fusion::fuse(semantic, lexical, candidate_limit);

		fusion::boost(&mut results, &filters.search_terms);

		let results = fusion::post_filter(results, &filters.price);
		let mut results =
			if results.len() > 1 { self.rerank(query, results).await } else { results };

		results.truncate(limit);

		tracing::debug!(query = %query, results = results.len(), "Search finished.");

		Ok(SearchResponse {
			query: query.to_string(),
			filters: FiltersView::from(&filters),
			results: results
				.into_iter()
				.map(|candidate| ScoredItem::new(candidate.item, candidate.score))
				.collect(),
		})
	}

	/// Loads the items behind `neighbors`, in neighbour order, with similarity
	/// `max(0, 1 - distance)`. Ids without a stored item are skipped.
	pub(crate) async fn hydrate(&self, neighbors: &[Neighbor]) -> Result<Vec<Candidate>> {
		let item_ids = neighbors.iter().map(|neighbor| neighbor.item_id).collect::<Vec<_>>();
		let mut items = self
			.store
			.get_items(&item_ids)
			.await?
			.into_iter()
			.map(|item| (item.item_id, item))
			.collect::<HashMap<_, _>>();
		let candidates = neighbors
			.iter()
			.filter_map(|neighbor| {
				let item = items.remove(&neighbor.item_id)?;

				Some(Candidate { item, score: similarity(neighbor.distance) })
			})
			.collect();

		Ok(candidates)
	}

	fn search_limit(&self, requested: Option<u32>) -> usize {
		let search = &self.cfg.search;
		let limit = requested
			.filter(|limit| (1..=search.max_limit).contains(limit))
			.unwrap_or(search.default_limit);

		limit as usize
	}

	async fn semantic_text(&self, query: &str) -> String {
		if !self.cfg.search.expansion.enabled {
			return query.to_string();
		}

		match self.generate(&prompts::expand_query(query), prompts::EXPANSION_MAX_TOKENS).await {
			Ok(expanded) if !expanded.trim().is_empty() => expanded.trim().to_string(),
			Ok(_) => query.to_string(),
			Err(err) => {
				tracing::debug!(error = %err, "Query expansion failed. Using the raw query.");

				query.to_string()
			},
		}
	}

	async fn semantic_channel(&self, text: &str, limit: usize) -> Result<Vec<Candidate>> {
		let vector = self.embed(text).await?;
		let neighbors = self.index.query(vector, limit as u32).await?;

		self.hydrate(&neighbors).await
	}

	async fn rerank(&self, query: &str, results: Vec<Candidate>) -> Vec<Candidate> {
		let window = (self.cfg.search.rerank_window as usize).min(results.len());
		let head =
			results[..window].iter().map(|candidate| &candidate.item).collect::<Vec<&Item>>();
		let prompt = prompts::rerank(query, &head);

		match self.generate(&prompt, prompts::RERANK_MAX_TOKENS).await {
			Ok(answer) => {
				let order = rerank::parse_ranked_indices(&answer, window);

				if order.is_empty() {
					tracing::debug!(answer = %answer, "Re-rank answer had no usable positions.");

					return results;
				}

				rerank::apply(results, &order)
			},
			Err(err) => {
				tracing::warn!(error = %err, "Re-rank failed. Keeping the fused order.");

				results
			},
		}
	}
}

pub(crate) fn similarity(distance: f32) -> f32 {
	(1.0 - distance).clamp(0.0, 1.0)
}

fn lexical_search(filters: &QueryFilters, limit: usize) -> ItemSearch {
	ItemSearch {
		terms: filters.search_terms.clone(),
		item_type: filters.item_type.map(|item_type| item_type.as_str().to_string()),
		date_from: filters.date_from,
		date_to: filters.date_to,
		tags: filters.tags.clone(),
		author: filters.author.clone(),
		category: filters.category.map(|category| category.label().to_string()),
		limit: limit as i64,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn similarity_is_clamped() {
		assert_eq!(similarity(0.25), 0.75);
		assert_eq!(similarity(1.4), 0.0);
		assert_eq!(similarity(-0.2), 1.0);
	}

	#[test]
	fn lexical_search_carries_every_filter() {
		let filters = intent::parse("show me #rust articles by Jane Doe");
		let search = lexical_search(&filters, 20);

		assert_eq!(search.item_type.as_deref(), Some("blog"));
		assert_eq!(search.tags, vec!["rust".to_string()]);
		assert_eq!(search.author.as_deref(), Some("Jane Doe"));
		assert_eq!(search.category.as_deref(), Some("Articles & News"));
		assert_eq!(search.limit, 20);
	}
}
