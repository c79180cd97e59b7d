//! Page-number pagination for feeds.
//!
//! Requested page numbers come straight from the `page` query parameter.
//! Anything that does not parse resolves to the first page, and numbers
//! outside `1..=num_pages` clamp to the nearest valid page.

use serde::{Deserialize, Serialize};

/// Posts shown per feed page.
pub const POSTS_PER_PAGE: u64 = 10;

/// `?page=` query parameter, kept as a string so junk never fails extraction.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    pub fn requested(&self) -> i64 {
        self.page
            .as_deref()
            .and_then(|p| p.trim().parse::<i64>().ok())
            .unwrap_or(1)
    }
}

/// Offset/limit slice of a result set for one resolved page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: u64,
    pub offset: u64,
    pub limit: u64,
}

impl PageWindow {
    /// Apply the window to an already ordered in-memory sequence.
    pub fn slice<T>(&self, items: Vec<T>) -> Vec<T> {
        items
            .into_iter()
            .skip(self.offset as usize)
            .take(self.limit as usize)
            .collect()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    total: u64,
    per_page: u64,
}

impl Paginator {
    pub fn new(total: u64, per_page: u64) -> Self {
        Self {
            total,
            per_page: per_page.max(1),
        }
    }

    /// An empty result set still has one (empty) page.
    pub fn num_pages(&self) -> u64 {
        if self.total == 0 {
            1
        } else {
            self.total.div_ceil(self.per_page)
        }
    }

    pub fn window(&self, requested: i64) -> PageWindow {
        let last = self.num_pages();
        let number = if requested < 1 {
            1
        } else {
            (requested as u64).min(last)
        };

        PageWindow {
            number,
            offset: (number - 1) * self.per_page,
            limit: self.per_page,
        }
    }

    pub fn page<T>(&self, window: PageWindow, items: Vec<T>) -> Page<T> {
        Page {
            items,
            number: window.number,
            num_pages: self.num_pages(),
            total: self.total,
        }
    }
}

/// One page of an ordered sequence plus the numbers needed for prev/next links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub num_pages: u64,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn previous_page_number(&self) -> Option<u64> {
        self.has_previous().then(|| self.number - 1)
    }

    pub fn next_page_number(&self) -> Option<u64> {
        self.has_next().then(|| self.number + 1)
    }
}

/// Slice an in-memory ordered sequence.
#[cfg(test)]
fn paginate<T>(items: Vec<T>, per_page: u64, requested: i64) -> Page<T> {
    let paginator = Paginator::new(items.len() as u64, per_page);
    let window = paginator.window(requested);
    paginator.page(window, window.slice(items))
}
