//! Post search filter.

/// Filter applied to the post listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostFilter {
    /// Case-insensitive substring matched against the title.
    pub title_contains: Option<String>,
}

impl PostFilter {
    /// Build a filter from the raw `q` query parameter. Only a missing or
    /// empty query lists everything; whitespace is part of the substring.
    pub fn from_query(q: Option<&str>) -> Self {
        let title_contains = q.filter(|s| !s.is_empty()).map(String::from);

        Self { title_contains }
    }

    /// In-process equivalent of the SQL filter.
    pub fn matches(&self, title: &str) -> bool {
        match &self.title_contains {
            Some(needle) => title.to_lowercase().contains(&needle.to_lowercase()),
            None => true,
        }
    }

    /// `LIKE` pattern for the title search, lower-cased, with `\` as the escape
    /// character so `%` and `_` in the query match literally.
    pub fn like_pattern(&self) -> Option<String> {
        self.title_contains.as_ref().map(|needle| {
            let mut pattern = String::with_capacity(needle.len() + 2);
            pattern.push('%');
            for c in needle.to_lowercase().chars() {
                if matches!(c, '%' | '_' | '\\') {
                    pattern.push('\\');
                }
                pattern.push(c);
            }
            pattern.push('%');
            pattern
        })
    }
}
