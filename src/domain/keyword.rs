use super::comment::Comment;

/// Case-insensitive substring test. An empty keyword matches every text.
pub fn contains_keyword(text: &str, keyword: &str) -> bool {
    if keyword.is_empty() {
        return true;
    }
    text.to_lowercase().contains(&keyword.to_lowercase())
}

/// Keyword half of the spam predicate. A blank keyword flags nothing.
pub fn keyword_flags(text: &str, keyword: &str) -> bool {
    !keyword.trim().is_empty() && contains_keyword(text, keyword)
}

/// Returns the comments whose text contains `keyword`, in input order.
pub fn filter_by_keyword(comments: &[Comment], keyword: &str) -> Vec<Comment> {
    comments
        .iter()
        .filter(|comment| contains_keyword(&comment.text, keyword))
        .cloned()
        .collect()
}
