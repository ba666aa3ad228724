pub fn render_schema() -> String {
	expand_includes(include_str!("../../../sql/init.sql"))
}

fn expand_includes(sql: &str) -> String {
	let mut out = String::new();

	for line in sql.lines() {
		let trimmed = line.trim();

		if let Some(path) = trimmed.strip_prefix("\\ir ") {
			match path.trim() {
				"tables/001_items.sql" =>
					out.push_str(include_str!("../../../sql/tables/001_items.sql")),
				"tables/002_item_relations.sql" =>
					out.push_str(include_str!("../../../sql/tables/002_item_relations.sql")),
				_ => out.push_str(line),
			}
		} else {
			out.push_str(line);
		}

		out.push('\n');
	}

	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn expands_every_table_include() {
		let sql = render_schema();

		assert!(!sql.contains("\\ir "));
		assert!(sql.contains("CREATE TABLE IF NOT EXISTS items ("));
		assert!(sql.contains("CREATE TABLE IF NOT EXISTS item_relations ("));
		assert!(sql.contains("PRIMARY KEY (item_id, related_item_id)"));
	}
}
