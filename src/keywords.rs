use std::collections::BTreeSet;

/// Case-insensitive substring check against every keyword in the list.
pub fn matches<S: AsRef<str>>(comment: &str, keywords: &[S]) -> bool {
    let comment = comment.to_lowercase();
    keywords
        .iter()
        .any(|keyword| comment.contains(&keyword.as_ref().to_lowercase()))
}

/// Every keyword the comment contains, kept in its configured spelling.
pub fn extract_categories<S: AsRef<str>>(comment: &str, keywords: &[S]) -> BTreeSet<String> {
    let comment = comment.to_lowercase();
    keywords
        .iter()
        .map(|keyword| keyword.as_ref())
        .filter(|keyword| comment.contains(&keyword.to_lowercase()))
        .map(str::to_string)
        .collect()
}
