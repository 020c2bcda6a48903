use crate::feed::Article;

/// Articles per page when nothing else is configured.
pub const DEFAULT_PAGE_SIZE: usize = 9;

/// Page sizes offered by the page-size picker.
pub const PAGE_SIZE_OPTIONS: [usize; 4] = [6, 9, 12, 18];

/// 1-based page position plus page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationState {
    /// Always ≥ 1.
    pub page_index: usize,
    /// Always > 0.
    pub page_size: usize,
}

impl Default for PaginationState {
    fn default() -> Self {
        Self {
            page_index: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PaginationState {
    /// Page 1 with the given size. A zero size falls back to the default.
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            page_index: 1,
            page_size: if page_size == 0 { DEFAULT_PAGE_SIZE } else { page_size },
        }
    }

    /// Clamps `page_index` into `1..=total_pages(total_items)`.
    pub fn clamped(self, total_items: usize) -> Self {
        let total = total_pages(total_items, self.page_size);
        Self {
            page_index: self.page_index.clamp(1, total),
            ..self
        }
    }
}

/// `ceil(count / page_size)`, never less than 1.
pub fn total_pages(count: usize, page_size: usize) -> usize {
    count.div_ceil(page_size.max(1)).max(1)
}

/// One page of an ordered article sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Page<'a> {
    pub items: &'a [Article],
    pub page_index: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

impl Page<'_> {
    /// 1-based `(first, last, total)` for a "Showing X to Y of Z" line.
    /// `(0, 0, total)` when the page is empty.
    pub fn showing_range(&self) -> (usize, usize, usize) {
        if self.items.is_empty() {
            return (0, 0, self.total_items);
        }
        let first = (self.page_index - 1) * self.page_size + 1;
        (first, first + self.items.len() - 1, self.total_items)
    }

    pub fn has_prev(&self) -> bool {
        self.page_index > 1
    }

    pub fn has_next(&self) -> bool {
        self.page_index < self.total_pages
    }
}

/// Slices `articles[(page_index-1)*page_size .. page_index*page_size]`.
///
/// Out-of-range pages give an empty slice rather than an error. A zero
/// `page_index` is read as page 1 and a zero `page_size` as 1.
pub fn paginate(articles: &[Article], page_index: usize, page_size: usize) -> Page<'_> {
    let page_size = page_size.max(1);
    let page_index = page_index.max(1);
    let start = (page_index - 1).saturating_mul(page_size).min(articles.len());
    let end = start.saturating_add(page_size).min(articles.len());
    Page {
        items: &articles[start..end],
        page_index,
        page_size,
        total_pages: total_pages(articles.len(), page_size),
        total_items: articles.len(),
    }
}

/// An entry in the page-number strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageMarker {
    Page(usize),
    /// Elided run of pages.
    Gap,
}

/// Page numbers to show around `current`: first, last, and two either side.
pub fn visible_pages(current: usize, total: usize) -> Vec<PageMarker> {
    let total = total.max(1);
    let current = current.clamp(1, total);
    let lo = current.saturating_sub(2).max(1);
    let hi = (current + 2).min(total);

    let mut markers = Vec::with_capacity(9);
    if lo > 1 {
        markers.push(PageMarker::Page(1));
        if lo > 2 {
            markers.push(PageMarker::Gap);
        }
    }
    markers.extend((lo..=hi).map(PageMarker::Page));
    if hi < total {
        if hi < total - 1 {
            markers.push(PageMarker::Gap);
        }
        markers.push(PageMarker::Page(total));
    }
    markers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::article::test_support::article;
    use pretty_assertions::assert_eq;
    use super::PageMarker::{Gap, Page as P};

    fn articles(n: usize) -> Vec<Article> {
        (1..=n).map(|i| article(&i.to_string(), "S", None)).collect()
    }

    fn ids(page: &Page<'_>) -> Vec<String> {
        page.items.iter().map(|a| a.id.to_string()).collect()
    }

    #[test]
    fn test_twelve_articles_nine_per_page() {
        let input = articles(12);
        let first = paginate(&input, 1, 9);
        assert_eq!(first.total_pages, 2);
        assert_eq!(ids(&first), (1..=9).map(|i| i.to_string()).collect::<Vec<_>>());
        assert_eq!(first.showing_range(), (1, 9, 12));

        let second = paginate(&input, 2, 9);
        assert_eq!(ids(&second), vec!["10", "11", "12"]);
        assert_eq!(second.showing_range(), (10, 12, 12));
        assert!(second.has_prev());
        assert!(!second.has_next());
    }

    #[test]
    fn test_page_beyond_end_is_empty() {
        let input = articles(5);
        let page = paginate(&input, 7, 9);
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.showing_range(), (0, 0, 5));
    }

    #[test]
    fn test_empty_input_has_one_page() {
        let page = paginate(&[], 1, 9);
        assert_eq!(page.total_pages, 1);
        assert!(page.items.is_empty());
        assert_eq!(total_pages(0, 9), 1);
    }

    #[test]
    fn test_clamp_on_page_size_change() {
        let state = PaginationState {
            page_index: 4,
            page_size: 6,
        };
        // 20 items: 4 pages of 6, but only 2 pages of 18
        assert_eq!(state.clamped(20).page_index, 4);
        let bigger = PaginationState {
            page_size: 18,
            ..state
        };
        assert_eq!(bigger.clamped(20).page_index, 2);
        assert_eq!(bigger.clamped(0).page_index, 1);
    }

    #[test]
    fn test_zero_page_size_falls_back() {
        assert_eq!(PaginationState::with_page_size(0).page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(paginate(&articles(3), 1, 0).items.len(), 1);
    }

    #[test]
    fn test_visible_pages_small() {
        assert_eq!(visible_pages(1, 1), vec![P(1)]);
        assert_eq!(visible_pages(2, 4), vec![P(1), P(2), P(3), P(4)]);
    }

    #[test]
    fn test_visible_pages_with_gaps() {
        assert_eq!(visible_pages(1, 10), vec![P(1), P(2), P(3), Gap, P(10)]);
        assert_eq!(
            visible_pages(6, 10),
            vec![P(1), Gap, P(4), P(5), P(6), P(7), P(8), Gap, P(10)]
        );
        assert_eq!(visible_pages(10, 10), vec![P(1), Gap, P(8), P(9), P(10)]);
    }

    #[test]
    fn test_visible_pages_no_gap_for_adjacent_edges() {
        // Window 2..=6 touches page 1 directly, so no gap before it
        assert_eq!(
            visible_pages(4, 7),
            vec![P(1), P(2), P(3), P(4), P(5), P(6), P(7)]
        );
    }
}
