use std::sync::LazyLock;

use regex::Regex;

use crate::media;

/// Content kinds an item can be captured as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
	Text,
	Url,
	Image,
	Screenshot,
	Video,
	Youtube,
	Book,
	Recipe,
	Amazon,
	Blog,
}
impl ItemType {
	pub const ALL: [ItemType; 10] = [
		ItemType::Text,
		ItemType::Url,
		ItemType::Image,
		ItemType::Screenshot,
		ItemType::Video,
		ItemType::Youtube,
		ItemType::Book,
		ItemType::Recipe,
		ItemType::Amazon,
		ItemType::Blog,
	];

	pub fn as_str(self) -> &'static str {
		match self {
			ItemType::Text => "text",
			ItemType::Url => "url",
			ItemType::Image => "image",
			ItemType::Screenshot => "screenshot",
			ItemType::Video => "video",
			ItemType::Youtube => "youtube",
			ItemType::Book => "book",
			ItemType::Recipe => "recipe",
			ItemType::Amazon => "amazon",
			ItemType::Blog => "blog",
		}
	}

	pub fn parse(raw: &str) -> Option<Self> {
		let raw = raw.trim();

		Self::ALL.into_iter().find(|item_type| item_type.as_str().eq_ignore_ascii_case(raw))
	}

	pub fn is_video(self) -> bool {
		matches!(self, ItemType::Video | ItemType::Youtube)
	}

	pub fn wants_ocr(self) -> bool {
		matches!(self, ItemType::Image | ItemType::Screenshot)
	}

	pub fn default_category(self) -> Category {
		match self {
			ItemType::Video | ItemType::Youtube => Category::VideosEntertainment,
			ItemType::Book => Category::BooksReading,
			ItemType::Recipe => Category::FoodRecipes,
			ItemType::Amazon => Category::ShoppingProducts,
			ItemType::Blog | ItemType::Url => Category::ArticlesNews,
			ItemType::Text | ItemType::Screenshot => Category::NotesIdeas,
			ItemType::Image => Category::DesignInspiration,
		}
	}

	/// Words removed from search terms once this type has been extracted as a filter.
	pub fn cleanup_phrases(self) -> &'static [&'static str] {
		match self {
			ItemType::Blog => &["blog post", "articles", "article", "blogs", "blog"],
			ItemType::Text => &[
				"handwritten",
				"to-do",
				"to do",
				"notes",
				"note",
				"todos",
				"todo",
				"lists",
				"list",
			],
			ItemType::Video => &["youtube", "videos", "video"],
			ItemType::Amazon => &["products", "product", "amazon"],
			ItemType::Book => &["books", "book"],
			ItemType::Recipe => &["recipes", "recipe"],
			ItemType::Image => &["screenshots", "screenshot", "images", "image"],
			ItemType::Url | ItemType::Screenshot | ItemType::Youtube => &[],
		}
	}
}

/// The fixed category taxonomy items are filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
	Technology,
	FoodRecipes,
	BooksReading,
	VideosEntertainment,
	ShoppingProducts,
	ArticlesNews,
	NotesIdeas,
	DesignInspiration,
	Travel,
	HealthFitness,
	EducationLearning,
	Other,
}
impl Category {
	pub const ALL: [Category; 12] = [
		Category::Technology,
		Category::FoodRecipes,
		Category::BooksReading,
		Category::VideosEntertainment,
		Category::ShoppingProducts,
		Category::ArticlesNews,
		Category::NotesIdeas,
		Category::DesignInspiration,
		Category::Travel,
		Category::HealthFitness,
		Category::EducationLearning,
		Category::Other,
	];

	pub fn label(self) -> &'static str {
		match self {
			Category::Technology => "Technology",
			Category::FoodRecipes => "Food & Recipes",
			Category::BooksReading => "Books & Reading",
			Category::VideosEntertainment => "Videos & Entertainment",
			Category::ShoppingProducts => "Shopping & Products",
			Category::ArticlesNews => "Articles & News",
			Category::NotesIdeas => "Notes & Ideas",
			Category::DesignInspiration => "Design & Inspiration",
			Category::Travel => "Travel",
			Category::HealthFitness => "Health & Fitness",
			Category::EducationLearning => "Education & Learning",
			Category::Other => "Other",
		}
	}

	/// Matches a label case-insensitively, tolerating surrounding quotes, bullets and a trailing
	/// period the way model answers tend to arrive.
	pub fn from_label(raw: &str) -> Option<Self> {
		let first_line = raw.lines().find(|line| !line.trim().is_empty()).unwrap_or_default();
		let cleaned = first_line
			.trim()
			.trim_start_matches(['-', '*', ' '])
			.trim_matches(['"', '\'', '`', '.', ' ']);

		Self::ALL.into_iter().find(|category| category.label().eq_ignore_ascii_case(cleaned))
	}
}
impl serde::Serialize for Category {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: serde::Serializer,
	{
		serializer.serialize_str(self.label())
	}
}

/// Query keywords that select a content type filter.
pub const TYPE_KEYWORDS: &[(&str, ItemType)] = &[
	("article", ItemType::Blog),
	("articles", ItemType::Blog),
	("blog", ItemType::Blog),
	("blog post", ItemType::Blog),
	("note", ItemType::Text),
	("notes", ItemType::Text),
	("handwritten", ItemType::Text),
	("todo", ItemType::Text),
	("to-do", ItemType::Text),
	("to do", ItemType::Text),
	("list", ItemType::Text),
	("video", ItemType::Video),
	("videos", ItemType::Video),
	("youtube", ItemType::Video),
	("product", ItemType::Amazon),
	("amazon", ItemType::Amazon),
	("book", ItemType::Book),
	("books", ItemType::Book),
	("recipe", ItemType::Recipe),
	("recipes", ItemType::Recipe),
	("image", ItemType::Image),
	("screenshot", ItemType::Image),
];

/// Query keywords that select a category filter.
pub const CATEGORY_KEYWORDS: &[(&str, Category)] = &[
	("technology", Category::Technology),
	("tech", Category::Technology),
	("food", Category::FoodRecipes),
	("recipe", Category::FoodRecipes),
	("cooking", Category::FoodRecipes),
	("book", Category::BooksReading),
	("books", Category::BooksReading),
	("reading", Category::BooksReading),
	("video", Category::VideosEntertainment),
	("videos", Category::VideosEntertainment),
	("entertainment", Category::VideosEntertainment),
	("shopping", Category::ShoppingProducts),
	("product", Category::ShoppingProducts),
	("products", Category::ShoppingProducts),
	("article", Category::ArticlesNews),
	("articles", Category::ArticlesNews),
	("news", Category::ArticlesNews),
	("note", Category::NotesIdeas),
	("notes", Category::NotesIdeas),
	("idea", Category::NotesIdeas),
	("ideas", Category::NotesIdeas),
	("design", Category::DesignInspiration),
	("inspiration", Category::DesignInspiration),
	("travel", Category::Travel),
	("health", Category::HealthFitness),
	("fitness", Category::HealthFitness),
	("education", Category::EducationLearning),
	("learning", Category::EducationLearning),
];

const RECIPE_KEYWORDS: &[&str] = &[
	"recipe",
	"ingredients",
	"cook",
	"bake",
	"prep time",
	"servings",
	"cups",
	"tablespoons",
	"tsp",
	"tbsp",
];
const BOOK_KEYWORDS: &[&str] = &["book", "author", "published", "isbn", "chapter", "novel"];

static RECIPE_RE: LazyLock<Option<Regex>> = LazyLock::new(|| keyword_regex(RECIPE_KEYWORDS));
static BOOK_RE: LazyLock<Option<Regex>> = LazyLock::new(|| keyword_regex(BOOK_KEYWORDS));

/// Finds the first keyword contained in `lower_query`, trying longer keywords first so that
/// "blog post" wins over "blog" and "videos" over "video".
pub fn match_keyword<T>(lower_query: &str, table: &[(&'static str, T)]) -> Option<T>
where
	T: Copy,
{
	let mut entries = table.iter().collect::<Vec<_>>();

	entries.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(b.0)));

	entries.into_iter().find(|(keyword, _)| lower_query.contains(keyword)).map(|(_, value)| *value)
}

pub fn looks_like_recipe(text: &str) -> bool {
	RECIPE_RE.as_ref().map(|re| re.is_match(text)).unwrap_or(false)
}

pub fn looks_like_book(text: &str) -> bool {
	BOOK_RE.as_ref().map(|re| re.is_match(text)).unwrap_or(false)
}

/// Infers a type for items submitted without one.
pub fn infer_item_type(title: &str, content: &str) -> ItemType {
	let text = format!("{title} {content}");

	if looks_like_recipe(&text) {
		ItemType::Recipe
	} else if looks_like_book(&text) {
		ItemType::Book
	} else {
		ItemType::Text
	}
}

/// Category used when the model gives no usable answer. Unknown types fall back to
/// [`Category::Other`].
pub fn default_category(item_type: Option<ItemType>) -> Category {
	item_type.map(ItemType::default_category).unwrap_or(Category::Other)
}

/// Video sources always land in the videos category, whatever the model says.
pub fn forced_category(item_type: Option<ItemType>, source_url: Option<&str>) -> Option<Category> {
	let is_video = item_type.map(ItemType::is_video).unwrap_or(false);
	let is_youtube = source_url.map(media::is_youtube_url).unwrap_or(false);

	(is_video || is_youtube).then_some(Category::VideosEntertainment)
}

fn keyword_regex(keywords: &[&str]) -> Option<Regex> {
	let alternation =
		keywords.iter().map(|keyword| regex::escape(keyword)).collect::<Vec<_>>().join("|");

	Regex::new(&format!(r"(?i)\b(?:{alternation})\b")).ok()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn type_defaults_cover_every_type() {
		assert_eq!(ItemType::Youtube.default_category(), Category::VideosEntertainment);
		assert_eq!(ItemType::Url.default_category(), Category::ArticlesNews);
		assert_eq!(ItemType::Screenshot.default_category(), Category::NotesIdeas);
		assert_eq!(ItemType::Image.default_category(), Category::DesignInspiration);
		assert_eq!(default_category(None), Category::Other);
	}

	#[test]
	fn parses_model_category_answers() {
		assert_eq!(Category::from_label("Food & Recipes"), Some(Category::FoodRecipes));
		assert_eq!(Category::from_label("  \"technology\".\n"), Some(Category::Technology));
		assert_eq!(Category::from_label("- Travel\nBecause..."), Some(Category::Travel));
		assert_eq!(Category::from_label("Cooking"), None);
	}

	#[test]
	fn longest_keyword_wins() {
		assert_eq!(match_keyword("my favourite blog post", TYPE_KEYWORDS), Some(ItemType::Blog));
		assert_eq!(
			match_keyword("all my videos", CATEGORY_KEYWORDS),
			Some(Category::VideosEntertainment)
		);
		assert_eq!(match_keyword("technology news", CATEGORY_KEYWORDS), Some(Category::Technology));
		assert_eq!(match_keyword("nothing here", TYPE_KEYWORDS), None);
	}

	#[test]
	fn infers_recipe_and_book_by_whole_words() {
		assert_eq!(
			infer_item_type("Chocolate Chip Cookies", "Recipe: mix 2 cups flour, bake 350F"),
			ItemType::Recipe
		);
		assert_eq!(infer_item_type("Dune", "A novel by Frank Herbert"), ItemType::Book);
		assert_eq!(infer_item_type("Sourdough", "bread starter feeding schedule"), ItemType::Text);
	}

	#[test]
	fn video_sources_force_category() {
		assert_eq!(
			forced_category(Some(ItemType::Text), Some("https://youtu.be/abc123")),
			Some(Category::VideosEntertainment)
		);
		assert_eq!(
			forced_category(Some(ItemType::Video), None),
			Some(Category::VideosEntertainment)
		);
		assert_eq!(forced_category(Some(ItemType::Text), Some("https://example.com")), None);
	}
}
