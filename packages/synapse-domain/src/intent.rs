//! Natural-language query intent.
//!
//! [`parse`] turns a free-text query such as "show me videos from last week under $20" into
//! [`QueryFilters`]: the structured constraints the lexical channel and post-filter apply, and
//! the residual search terms both retrieval channels match against.

use std::sync::LazyLock;

use regex::Regex;
use time::{Date, Duration, Month, OffsetDateTime};

use crate::taxonomy::{self, CATEGORY_KEYWORDS, Category, ItemType, TYPE_KEYWORDS};

const CONTEXT_MARKERS: &[&str] = &["show me", "my ", "i saved", "find ", "get ", "list of", "all "];
const MIN_TYPE_QUERY_WORDS: usize = 3;
const MIN_SEARCH_TERM_CHARS: usize = 2;
const SECONDS_PER_DAY: i64 = 86_400;

static QUOTE_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
	compile_all(&[
		r"(?i)that quote about (.+)",
		r"(?i)quote about (.+)",
		r"(?i)find that quote (.+)",
		r"(?i)the quote (.+)",
		r"(?i)quote (.+)",
	])
});
static DAYS_AGO_RE: LazyLock<Option<Regex>> =
	LazyLock::new(|| Regex::new(r"(\d+)\s*days?\s*ago").ok());
static PRICE_MAX_RE: LazyLock<Option<Regex>> =
	LazyLock::new(|| Regex::new(r"(?:under|below|less than)\s*\$?(\d+(?:\.\d+)?)").ok());
static PRICE_MIN_RE: LazyLock<Option<Regex>> =
	LazyLock::new(|| Regex::new(r"(?:over|above|more than)\s*\$?(\d+(?:\.\d+)?)").ok());
static PRICE_RANGE_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
	Regex::new(r"\$?(\d+(?:\.\d+)?)\s*(?:to|-)\s*\$?(\d+(?:\.\d+)?)").ok()
});
static AUTHOR_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
	compile_all(&[
		r"\b[Ff]rom\s+([A-Z][a-z]+(?:\s+[A-Z][a-z]+)?)",
		r"\b[Bb]y\s+([A-Z][a-z]+(?:\s+[A-Z][a-z]+)?)",
		r"\b([A-Z][a-z]+(?:\s+[A-Z][a-z]+)?)\s+said\b",
	])
});
static TAG_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"#(\w+)").ok());
static LISTED_PRICE_RE: LazyLock<Option<Regex>> =
	LazyLock::new(|| Regex::new(r"(?i)price[:\s]+\$?(\d+(?:\.\d+)?)").ok());
static CLEANUP_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
	compile_all(&[
		r"\b(?:last month|yesterday|last week|this month|last year)\b",
		r"\b\d+\s*(?:days?|weeks?|months?)\s*ago\b",
		r"(?:under|below|over|above|less than|more than)\s*\$?\d+(?:\.\d+)?",
		r"\$?\d+(?:\.\d+)?\s*(?:to|-)\s*\$?\d+(?:\.\d+)?",
	])
});
static WHITESPACE_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\s+").ok());

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PriceRange {
	pub min: Option<f64>,
	pub max: Option<f64>,
}
impl PriceRange {
	pub fn is_unbounded(&self) -> bool {
		self.min.is_none() && self.max.is_none()
	}

	pub fn contains(&self, price: f64) -> bool {
		self.min.map(|min| price >= min).unwrap_or(true)
			&& self.max.map(|max| price <= max).unwrap_or(true)
	}
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryFilters {
	pub search_terms: String,
	/// Set when the query asked for a remembered passage; `search_terms` then holds the passage
	/// verbatim.
	pub quote: bool,
	pub item_type: Option<ItemType>,
	pub date_from: Option<OffsetDateTime>,
	pub date_to: Option<OffsetDateTime>,
	pub price: PriceRange,
	pub author: Option<String>,
	pub category: Option<Category>,
	pub tags: Vec<String>,
}

pub fn parse(query: &str) -> QueryFilters {
	parse_at(query, OffsetDateTime::now_utc())
}

/// Same as [`parse`], with relative dates anchored at `now`.
pub fn parse_at(query: &str, now: OffsetDateTime) -> QueryFilters {
	let query = query.trim();
	let lower = query.to_lowercase();
	let quote = extract_quote(query);
	let (date_from, date_to) = extract_date_range(&lower, now);
	let item_type = extract_type(&lower);
	let price = extract_price_range(&lower);
	let author = extract_author(query);
	let category = taxonomy::match_keyword(&lower, CATEGORY_KEYWORDS);
	let tags = extract_tags(&lower);
	let search_terms = match quote.as_ref() {
		Some(passage) => passage.clone(),
		None => clean_search_terms(query, item_type),
	};

	QueryFilters {
		search_terms,
		quote: quote.is_some(),
		item_type,
		date_from,
		date_to,
		price,
		author,
		category,
		tags,
	}
}

/// Price listed in item content as "price: $N".
pub fn listed_price(text: &str) -> Option<f64> {
	let re = LISTED_PRICE_RE.as_ref()?;

	re.captures(text)?.get(1)?.as_str().parse().ok()
}

fn extract_quote(query: &str) -> Option<String> {
	QUOTE_RES.iter().find_map(|re| {
		let passage = re.captures(query)?.get(1)?.as_str().trim();

		(!passage.is_empty()).then(|| passage.to_string())
	})
}

fn extract_date_range(
	lower: &str,
	now: OffsetDateTime,
) -> (Option<OffsetDateTime>, Option<OffsetDateTime>) {
	let mut range = None;

	if lower.contains("last month") {
		range = last_month(now).or(range);
	}
	if lower.contains("yesterday") {
		range = yesterday(now).or(range);
	}
	if lower.contains("last week") {
		range = now.checked_sub(Duration::days(7)).map(|from| (from, now)).or(range);
	}
	if lower.contains("this month") {
		range = month_start(now.year(), now.month(), now).map(|from| (from, now)).or(range);
	}
	if lower.contains("last year") {
		range = month_start(now.year() - 1, Month::January, now)
			.zip(month_start(now.year(), Month::January, now))
			.or(range);
	}
	if let Some(days) = DAYS_AGO_RE
		.as_ref()
		.and_then(|re| re.captures(lower))
		.and_then(|caps| caps.get(1))
		.and_then(|days| days.as_str().parse::<i64>().ok())
		.and_then(|days| days.checked_mul(SECONDS_PER_DAY))
	{
		range = now.checked_sub(Duration::seconds(days)).map(|from| (from, now)).or(range);
	}

	match range {
		Some((from, to)) => (Some(from), Some(to)),
		None => (None, None),
	}
}

fn last_month(now: OffsetDateTime) -> Option<(OffsetDateTime, OffsetDateTime)> {
	let previous = now.month().previous();
	let year = if previous == Month::December { now.year() - 1 } else { now.year() };

	month_start(year, previous, now).zip(month_start(now.year(), now.month(), now))
}

fn yesterday(now: OffsetDateTime) -> Option<(OffsetDateTime, OffsetDateTime)> {
	let today = now.date();
	let from = today.previous_day()?.midnight().assume_offset(now.offset());
	let to = today.with_hms(23, 59, 59).ok()?.assume_offset(now.offset());

	Some((from, to))
}

fn month_start(year: i32, month: Month, now: OffsetDateTime) -> Option<OffsetDateTime> {
	Date::from_calendar_date(year, month, 1)
		.ok()
		.map(|date| date.midnight().assume_offset(now.offset()))
}

/// Type keywords only become a filter for descriptive queries; a bare "video" stays a search
/// term.
fn extract_type(lower: &str) -> Option<ItemType> {
	let has_context = CONTEXT_MARKERS.iter().any(|marker| lower.contains(marker));

	if lower.split_whitespace().count() < MIN_TYPE_QUERY_WORDS && !has_context {
		return None;
	}

	taxonomy::match_keyword(lower, TYPE_KEYWORDS)
}

fn extract_price_range(lower: &str) -> PriceRange {
	let mut range = PriceRange::default();

	if let Some(max) = capture_price(PRICE_MAX_RE.as_ref(), lower, 1) {
		range.max = Some(max);
	}
	if let Some(min) = capture_price(PRICE_MIN_RE.as_ref(), lower, 1) {
		range.min = Some(min);
	}
	if let (Some(first), Some(second)) = (
		capture_price(PRICE_RANGE_RE.as_ref(), lower, 1),
		capture_price(PRICE_RANGE_RE.as_ref(), lower, 2),
	) {
		range.min = Some(first.min(second));
		range.max = Some(first.max(second));
	}
	if let (Some(min), Some(max)) = (range.min, range.max)
		&& min > max
	{
		range = PriceRange { min: Some(max), max: Some(min) };
	}

	range
}

fn capture_price(re: Option<&Regex>, text: &str, group: usize) -> Option<f64> {
	let price = re?.captures(text)?.get(group)?.as_str().parse::<f64>().ok()?;

	(price > 0.0).then_some(price)
}

fn extract_author(query: &str) -> Option<String> {
	AUTHOR_RES
		.iter()
		.find_map(|re| re.captures(query)?.get(1).map(|name| name.as_str().to_string()))
}

fn extract_tags(lower: &str) -> Vec<String> {
	let Some(re) = TAG_RE.as_ref() else {
		return Vec::new();
	};
	let mut tags: Vec<String> = Vec::new();

	for caps in re.captures_iter(lower) {
		if let Some(tag) = caps.get(1)
			&& !tags.iter().any(|seen| seen == tag.as_str())
		{
			tags.push(tag.as_str().to_string());
		}
	}

	tags
}

fn clean_search_terms(query: &str, item_type: Option<ItemType>) -> String {
	let mut cleaned = AUTHOR_RES
		.iter()
		.fold(query.to_string(), |text, re| re.replace_all(&text, "").into_owned())
		.to_lowercase();

	for re in CLEANUP_RES.iter() {
		cleaned = re.replace_all(&cleaned, " ").into_owned();
	}

	if let Some(item_type) = item_type
		&& let Some(re) = phrase_regex(item_type.cleanup_phrases())
	{
		cleaned = re.replace_all(&cleaned, " ").into_owned();
	}

	cleaned = cleaned.replace('#', " ");

	if let Some(re) = WHITESPACE_RE.as_ref() {
		cleaned = re.replace_all(&cleaned, " ").into_owned();
	}

	let cleaned = cleaned.trim();

	if cleaned.chars().count() < MIN_SEARCH_TERM_CHARS {
		return query.to_string();
	}

	cleaned.to_string()
}

fn phrase_regex(phrases: &[&str]) -> Option<Regex> {
	if phrases.is_empty() {
		return None;
	}

	let alternation = phrases.iter().map(|phrase| regex::escape(phrase)).collect::<Vec<_>>();

	Regex::new(&format!(r"\b(?:{})\b", alternation.join("|"))).ok()
}

fn compile_all(patterns: &[&str]) -> Vec<Regex> {
	patterns.iter().filter_map(|pattern| Regex::new(pattern).ok()).collect()
}

#[cfg(test)]
mod tests {
	use time::macros::datetime;

	use super::*;

	const NOW: OffsetDateTime = datetime!(2024-03-15 12:00 UTC);

	#[test]
	fn quote_queries_keep_the_passage_verbatim() {
		let filters = parse_at("that quote about resilience", NOW);

		assert_eq!(filters.search_terms, "resilience");
		assert!(filters.quote);

		let filters = parse_at("Find that quote about New Beginnings from last week", NOW);

		assert_eq!(filters.search_terms, "New Beginnings from last week");
		assert!(filters.date_from.is_some());
	}

	#[test]
	fn single_type_word_stays_a_search_term() {
		let filters = parse_at("video", NOW);

		assert_eq!(filters.item_type, None);
		assert_eq!(filters.search_terms, "video");
	}

	#[test]
	fn descriptive_queries_extract_type_and_strip_it() {
		let filters = parse_at("rust async recipes", NOW);

		assert_eq!(filters.item_type, Some(ItemType::Recipe));
		assert_eq!(filters.search_terms, "rust async");

		let filters = parse_at("show me videos", NOW);

		assert_eq!(filters.item_type, Some(ItemType::Video));
		assert_eq!(filters.search_terms, "show me");
	}

	#[test]
	fn only_the_matched_type_phrases_are_removed() {
		let filters = parse_at("my notes about a book", NOW);

		assert_eq!(filters.item_type, Some(ItemType::Text));
		assert_eq!(filters.search_terms, "my about a book");
	}

	#[test]
	fn price_upper_bound() {
		let filters = parse_at("under $50 headphones", NOW);

		assert_eq!(filters.price, PriceRange { min: None, max: Some(50.0) });
		assert_eq!(filters.search_terms, "headphones");
	}

	#[test]
	fn descending_price_range_is_normalized() {
		let filters = parse_at("$300 to $100 laptops", NOW);

		assert_eq!(filters.price, PriceRange { min: Some(100.0), max: Some(300.0) });
		assert_eq!(filters.search_terms, "laptops");

		let filters = parse_at("over $80 below $20 shoes", NOW);

		assert!(filters.price.min <= filters.price.max);
	}

	#[test]
	fn zero_prices_are_ignored() {
		let filters = parse_at("under $0 gadgets", NOW);

		assert!(filters.price.is_unbounded());
	}

	#[test]
	fn last_month_spans_previous_calendar_month() {
		let filters = parse_at("articles from last month", NOW);

		assert_eq!(filters.date_from, Some(datetime!(2024-02-01 0:00 UTC)));
		assert_eq!(filters.date_to, Some(datetime!(2024-03-01 0:00 UTC)));

		let filters = parse_at("last month", datetime!(2024-01-10 08:00 UTC));

		assert_eq!(filters.date_from, Some(datetime!(2023-12-01 0:00 UTC)));
		assert_eq!(filters.date_to, Some(datetime!(2024-01-01 0:00 UTC)));
	}

	#[test]
	fn yesterday_covers_through_end_of_today() {
		let filters = parse_at("what did I save yesterday", NOW);

		assert_eq!(filters.date_from, Some(datetime!(2024-03-14 0:00 UTC)));
		assert_eq!(filters.date_to, Some(datetime!(2024-03-15 23:59:59 UTC)));
	}

	#[test]
	fn later_date_rules_overwrite_earlier_ones() {
		let filters = parse_at("last month or 2 days ago", NOW);

		assert_eq!(filters.date_from, Some(datetime!(2024-03-13 12:00 UTC)));
		assert_eq!(filters.date_to, Some(NOW));
	}

	#[test]
	fn huge_day_counts_leave_the_range_unset() {
		let filters = parse_at("notes from 200000000000000 days ago", NOW);

		assert_eq!(filters.date_from, None);
		assert_eq!(filters.date_to, None);

		let filters = parse_at("notes from 99999999999999999999 days ago", NOW);

		assert_eq!(filters.date_from, None);

		let filters = parse_at("last month or 5000000 days ago", NOW);

		assert_eq!(filters.date_from, Some(datetime!(2024-02-01 0:00 UTC)));
	}

	#[test]
	fn last_week_is_the_trailing_seven_days() {
		let filters = parse_at("links from last week", NOW);

		assert_eq!(filters.date_from, Some(datetime!(2024-03-08 12:00 UTC)));
		assert_eq!(filters.date_to, Some(NOW));
	}

	#[test]
	fn this_month_starts_on_the_first() {
		let filters = parse_at("recipes saved this month", NOW);

		assert_eq!(filters.date_from, Some(datetime!(2024-03-01 0:00 UTC)));
		assert_eq!(filters.date_to, Some(NOW));
	}

	#[test]
	fn last_year_is_previous_calendar_year() {
		let filters = parse_at("travel plans last year", NOW);

		assert_eq!(filters.date_from, Some(datetime!(2023-01-01 0:00 UTC)));
		assert_eq!(filters.date_to, Some(datetime!(2024-01-01 0:00 UTC)));
		assert_eq!(filters.category, Some(Category::Travel));
		assert_eq!(filters.search_terms, "travel plans");
	}

	#[test]
	fn author_patterns_use_original_case() {
		let filters = parse_at("Karpathy said something about tokenizers", NOW);

		assert_eq!(filters.author.as_deref(), Some("Karpathy"));
		assert_eq!(filters.search_terms, "something about tokenizers");

		let filters = parse_at("essays by Paul Graham", NOW);

		assert_eq!(filters.author.as_deref(), Some("Paul Graham"));
		assert_eq!(filters.search_terms, "essays");

		assert_eq!(parse_at("stuff by someone", NOW).author, None);
	}

	#[test]
	fn tags_are_lowercased_and_deduplicated() {
		let filters = parse_at("#Rust and #async tips #rust", NOW);

		assert_eq!(filters.tags, vec!["rust".to_string(), "async".to_string()]);
		assert_eq!(filters.search_terms, "rust and async tips rust");
	}

	#[test]
	fn short_residual_falls_back_to_original_query() {
		let filters = parse_at("yesterday", NOW);

		assert_eq!(filters.search_terms, "yesterday");
		assert!(filters.date_from.is_some());
	}

	#[test]
	fn listed_price_is_case_insensitive() {
		assert_eq!(listed_price("Sony WH-1000XM5\nPrice: $349.99"), Some(349.99));
		assert_eq!(listed_price("PRICE 40"), Some(40.0));
		assert_eq!(listed_price("no price here"), None);
	}

	#[test]
	fn price_range_bounds_are_inclusive() {
		let range = PriceRange { min: Some(10.0), max: Some(50.0) };

		assert!(range.contains(10.0));
		assert!(range.contains(50.0));
		assert!(!range.contains(50.01));
		assert!(PriceRange::default().contains(1_000.0));
	}
}
