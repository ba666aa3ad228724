/// Returns at most `max_chars` characters of `text`, never splitting a UTF-8 sequence.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
	match text.char_indices().nth(max_chars) {
		Some((idx, _)) => &text[..idx],
		None => text,
	}
}

/// First `max_chars` characters followed by "..." when anything was cut.
pub fn excerpt(text: &str, max_chars: usize) -> String {
	let cut = truncate_chars(text, max_chars);

	if cut.len() < text.len() { format!("{cut}...") } else { cut.to_string() }
}

/// Text following a "Description:" marker, as produced by video captures.
pub fn video_description(content: &str) -> Option<&str> {
	let (_, rest) = content.split_once("Description:")?;
	let rest = rest.trim();

	(!rest.is_empty()).then_some(rest)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn truncation_respects_char_boundaries() {
		assert_eq!(truncate_chars("héllo", 2), "hé");
		assert_eq!(truncate_chars("abc", 10), "abc");
		assert_eq!(excerpt("abcdef", 3), "abc...");
		assert_eq!(excerpt("abc", 3), "abc");
	}

	#[test]
	fn finds_video_description() {
		assert_eq!(
			video_description("Channel: Foo\nDescription: A deep dive into Rust."),
			Some("A deep dive into Rust.")
		);
		assert_eq!(video_description("Description:   "), None);
		assert_eq!(video_description("no marker"), None);
	}
}
