//! Identifier helpers and hash-based auto-naming.

/// Length cap applied to generated index and constraint names.
pub const MAX_IDENTIFIER_LENGTH: usize = 64;

/// `authorId` -> `author_id`, `BookAuthor` -> `book_author`.
pub fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for c in name.chars() {
        if c.is_uppercase() {
            if prev_lower {
                out.push('_');
            }
            out.extend(c.to_lowercase());
            prev_lower = false;
        } else {
            prev_lower = c.is_alphanumeric();
            out.push(c);
        }
    }
    out
}

/// `author_id` -> `AuthorId`, `id` -> `Id`.
pub fn studly_case(name: &str) -> String {
    name.split(['_', '-', ' '])
        .filter(|part| !part.is_empty())
        .map(ucfirst)
        .collect()
}

pub fn ucfirst(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn lcfirst(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Deterministic generated name: `[table_]prefix` + six hex chars of the md5
/// of the lower-cased, colon-joined parts, capped at `max_len`.
///
/// Only the table part is shortened, so the hash always survives.
pub fn hashed_name(table: Option<&str>, prefix: &str, parts: &[String], max_len: usize) -> String {
    let hash = format!("{:x}", md5::compute(parts.join(":").to_lowercase()));
    let mut tail = format!("{}{}", prefix, &hash[..6]);
    let Some(table) = table.filter(|t| !t.is_empty()) else {
        truncate(&mut tail, max_len);
        return tail;
    };
    let mut head = table.to_string();
    truncate(&mut head, max_len.saturating_sub(tail.len() + 1));
    if head.is_empty() {
        truncate(&mut tail, max_len);
        return tail;
    }
    format!("{}_{}", head, tail)
}

/// Cut `name` to at most `max_len` bytes on a char boundary.
pub fn truncate(name: &mut String, max_len: usize) {
    if name.len() > max_len {
        let mut cut = max_len;
        while !name.is_char_boundary(cut) {
            cut -= 1;
        }
        name.truncate(cut);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_conversions() {
        assert_eq!(snake_case("authorId"), "author_id");
        assert_eq!(snake_case("BookAuthor"), "book_author");
        assert_eq!(snake_case("title"), "title");
        assert_eq!(studly_case("author_id"), "AuthorId");
        assert_eq!(studly_case("id"), "Id");
        assert_eq!(lcfirst("Author"), "author");
    }

    #[test]
    fn test_hashed_name_is_deterministic() {
        let parts = vec!["title:".to_string()];
        let a = hashed_name(Some("book"), "i_", &parts, MAX_IDENTIFIER_LENGTH);
        let b = hashed_name(Some("book"), "i_", &parts, MAX_IDENTIFIER_LENGTH);
        assert_eq!(a, b);
        assert!(a.starts_with("book_i_"));
        assert_eq!(a.len(), "book_i_".len() + 6);
    }

    #[test]
    fn test_hashed_name_truncates() {
        let table = "t".repeat(70);
        let name = hashed_name(Some(&table), "fk_", &[], 64);
        assert_eq!(name.len(), 64);
    }

    #[test]
    fn test_hashed_name_keeps_hash_on_long_tables() {
        let table = "t".repeat(70);
        let title = hashed_name(Some(&table), "i_", &["title:".to_string()], 63);
        let isbn = hashed_name(Some(&table), "i_", &["isbn:".to_string()], 63);
        assert_eq!(title.len(), 63);
        assert_eq!(isbn.len(), 63);
        assert_ne!(title, isbn);
        let short = hashed_name(None, "i_", &["title:".to_string()], 63);
        assert!(title.ends_with(&short));
    }
}
