//! The view pipeline: filter → sort → paginate, driven by a reducer.
//!
//! Every stage is a pure function over an article slice. [`compute_view`]
//! runs the first two stages and clamps the page index; the resulting
//! [`View`] hands out the current [`Page`] on demand.

mod filter;
mod paginate;
mod sort;
mod state;

use chrono::{DateTime, TimeZone};

use crate::feed::Article;

pub use filter::{filter, DateRange, FilterState};
pub use paginate::{
    paginate, total_pages, visible_pages, Page, PageMarker, PaginationState, DEFAULT_PAGE_SIZE,
    PAGE_SIZE_OPTIONS,
};
pub use sort::{sort, SortMode};
pub use state::{reduce, ViewAction, ViewState};

/// The filtered, sorted working set plus a pagination state that is valid
/// for it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct View {
    pub articles: Vec<Article>,
    pub pagination: PaginationState,
}

impl View {
    pub fn page(&self) -> Page<'_> {
        paginate(
            &self.articles,
            self.pagination.page_index,
            self.pagination.page_size,
        )
    }

    pub fn total_pages(&self) -> usize {
        total_pages(self.articles.len(), self.pagination.page_size)
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }
}

/// Recomputes the derived view for `state` over `articles`.
///
/// The returned pagination has `page_index` clamped into
/// `1..=total_pages`; callers write it back into their [`ViewState`].
pub fn compute_view<Tz: TimeZone>(articles: &[Article], state: &ViewState, now: &DateTime<Tz>) -> View {
    let filtered = filter(articles, &state.filter, now);
    let sorted = sort(filtered, state.filter.sort_mode, &state.filter.query);
    let pagination = state.pagination.clamped(sorted.len());
    View {
        articles: sorted,
        pagination,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::article::test_support::article;
    use chrono::{Duration, Utc};

    #[test]
    fn test_compute_view_clamps_page() {
        let now = Utc::now();
        let articles: Vec<Article> = (0..12)
            .map(|i| article(&i.to_string(), "S", Some(now - Duration::hours(i))))
            .collect();
        let state = ViewState {
            pagination: PaginationState {
                page_index: 7,
                page_size: 9,
            },
            ..ViewState::default()
        };
        let view = compute_view(&articles, &state, &now);
        assert_eq!(view.pagination.page_index, 2);
        assert_eq!(view.total_pages(), 2);
        assert_eq!(view.page().items.len(), 3);
    }

    #[test]
    fn test_compute_view_sorts_filtered_set() {
        let now = Utc::now();
        let articles = vec![
            article("old", "Reuters", Some(now - Duration::days(2))),
            article("skip", "STAT", Some(now)),
            article("new", "Reuters", Some(now - Duration::hours(1))),
        ];
        let state = reduce(
            &ViewState::default(),
            ViewAction::ToggleSource("Reuters".to_string()),
        );
        let view = compute_view(&articles, &state, &now);
        let ids: Vec<&str> = view.articles.iter().map(|a| &*a.id).collect();
        assert_eq!(ids, vec!["new", "old"]);
    }
}
