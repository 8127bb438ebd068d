//! Page-number pagination for listings.
//!
//! Out-of-range input never fails: a `page` value that is not an integer
//! selects the first page, and an integer outside `1..=num_pages` selects the
//! last page. An empty result set still has one (empty) page.

use serde::Serialize;

/// Number of posts shown per page of the listing.
pub const POSTS_PER_PAGE: u64 = 5;

/// A requested page, before the total item count is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    requested: i64,
    per_page: u64,
}

impl PageRequest {
    pub fn new(requested: i64, per_page: u64) -> Self {
        Self {
            requested,
            per_page: per_page.max(1),
        }
    }

    /// Parse the raw `page` query parameter.
    pub fn parse(raw: Option<&str>, per_page: u64) -> Self {
        let requested = raw.and_then(parse_page_number).unwrap_or(1);
        Self::new(requested, per_page)
    }

    pub fn per_page(&self) -> u64 {
        self.per_page
    }

    /// Clamp the request against `total` items.
    pub fn resolve(&self, total: u64) -> PageBounds {
        let num_pages = total.div_ceil(self.per_page).max(1);
        let number = match u64::try_from(self.requested) {
            Ok(n) if (1..=num_pages).contains(&n) => n,
            _ => num_pages,
        };

        PageBounds {
            number,
            num_pages,
            total,
            per_page: self.per_page,
        }
    }
}

/// An integer too large for `i64` is still an integer: it saturates so it
/// resolves as out of range instead of as garbage.
fn parse_page_number(raw: &str) -> Option<i64> {
    let s = raw.trim();
    if let Ok(n) = s.parse::<i64>() {
        return Some(n);
    }

    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    Some(if negative { i64::MIN } else { i64::MAX })
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, POSTS_PER_PAGE)
    }
}

/// A resolved page position within a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageBounds {
    /// 1-based page number.
    pub number: u64,
    pub num_pages: u64,
    pub total: u64,
    pub per_page: u64,
}

impl PageBounds {
    /// Zero-based index of the page, as used by offset paginators.
    pub fn index(&self) -> u64 {
        self.number - 1
    }

    pub fn offset(&self) -> u64 {
        self.index() * self.per_page
    }

    pub fn into_page<T>(self, items: Vec<T>) -> Page<T> {
        Page {
            items,
            number: self.number,
            num_pages: self.num_pages,
            total: self.total,
            per_page: self.per_page,
        }
    }
}

/// One page of results plus the metadata needed to render page links.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub num_pages: u64,
    pub total: u64,
    pub per_page: u64,
}

impl<T> Page<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_other_pages(&self) -> bool {
        self.has_next() || self.has_previous()
    }

    pub fn next_page_number(&self) -> Option<u64> {
        self.has_next().then(|| self.number + 1)
    }

    pub fn previous_page_number(&self) -> Option<u64> {
        self.has_previous().then(|| self.number - 1)
    }

    /// 1-based index of the first item on this page, 0 when empty.
    pub fn start_index(&self) -> u64 {
        if self.total == 0 {
            0
        } else {
            (self.number - 1) * self.per_page + 1
        }
    }

    /// 1-based index of the last item on this page, 0 when empty.
    pub fn end_index(&self) -> u64 {
        if self.number == self.num_pages {
            self.total
        } else {
            self.number * self.per_page
        }
    }
}
