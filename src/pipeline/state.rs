use super::filter::{DateRange, FilterState};
use super::paginate::PaginationState;
use super::sort::SortMode;
use crate::util::MAX_SEARCH_QUERY_LENGTH;

/// Everything that determines which slice of the working set is on screen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    pub filter: FilterState,
    pub pagination: PaginationState,
}

/// A user intent that changes the [`ViewState`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewAction {
    SetQuery(String),
    /// Adds the source to the selection, or removes it if already selected.
    ToggleSource(String),
    ClearSources,
    SetDateRange(DateRange),
    CycleDateRange,
    SetSortMode(SortMode),
    CycleSortMode,
    /// Resets query, sources, date range and sort mode.
    ClearFilters,
    NextPage,
    PrevPage,
    GoToPage(usize),
    /// Zero is ignored.
    SetPageSize(usize),
    /// Back to page 1 without touching filters (used when the working set is
    /// replaced by a fetch).
    FirstPage,
}

impl ViewAction {
    /// Whether this action changes [`FilterState`].
    pub fn is_filter_change(&self) -> bool {
        !matches!(
            self,
            ViewAction::NextPage
                | ViewAction::PrevPage
                | ViewAction::GoToPage(_)
                | ViewAction::SetPageSize(_)
                | ViewAction::FirstPage
        )
    }
}

impl ViewState {
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            filter: FilterState::default(),
            pagination: PaginationState::with_page_size(page_size),
        }
    }

    pub fn has_active_filters(&self) -> bool {
        self.filter.has_active_filters()
    }
}

/// Applies `action` to `state`, returning the next state.
///
/// Every filter change puts the view back on page 1. Page moves are not
/// bounded here: the next recompute clamps `page_index` to the page count,
/// which is also how a larger page size pulls the index back into range.
pub fn reduce(state: &ViewState, action: ViewAction) -> ViewState {
    let mut next = state.clone();
    let resets_page = action.is_filter_change();

    match action {
        ViewAction::SetQuery(query) => {
            next.filter.query = query.chars().take(MAX_SEARCH_QUERY_LENGTH).collect();
        }
        ViewAction::ToggleSource(source) => {
            if !next.filter.selected_sources.remove(&source) {
                next.filter.selected_sources.insert(source);
            }
        }
        ViewAction::ClearSources => next.filter.selected_sources.clear(),
        ViewAction::SetDateRange(range) => next.filter.date_range = range,
        ViewAction::CycleDateRange => next.filter.date_range = next.filter.date_range.next(),
        ViewAction::SetSortMode(mode) => next.filter.sort_mode = mode,
        ViewAction::CycleSortMode => next.filter.sort_mode = next.filter.sort_mode.next(),
        ViewAction::ClearFilters => next.filter = FilterState::default(),
        ViewAction::NextPage => {
            next.pagination.page_index = next.pagination.page_index.saturating_add(1);
        }
        ViewAction::PrevPage => {
            next.pagination.page_index = next.pagination.page_index.saturating_sub(1).max(1);
        }
        ViewAction::GoToPage(page) => next.pagination.page_index = page.max(1),
        ViewAction::SetPageSize(size) => {
            if size > 0 {
                next.pagination.page_size = size;
            }
        }
        ViewAction::FirstPage => next.pagination.page_index = 1,
    }

    if resets_page {
        next.pagination.page_index = 1;
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn on_page(page: usize) -> ViewState {
        ViewState {
            pagination: PaginationState {
                page_index: page,
                page_size: 9,
            },
            ..ViewState::default()
        }
    }

    #[test]
    fn test_filter_actions_reset_page() {
        let actions = [
            ViewAction::SetQuery("fda".to_string()),
            ViewAction::ToggleSource("Reuters".to_string()),
            ViewAction::ClearSources,
            ViewAction::SetDateRange(DateRange::Week),
            ViewAction::CycleDateRange,
            ViewAction::SetSortMode(SortMode::Oldest),
            ViewAction::CycleSortMode,
            ViewAction::ClearFilters,
        ];
        for action in actions {
            let next = reduce(&on_page(3), action.clone());
            assert_eq!(next.pagination.page_index, 1, "{:?} should reset page", action);
        }
    }

    #[test]
    fn test_page_size_keeps_index() {
        let next = reduce(&on_page(3), ViewAction::SetPageSize(18));
        assert_eq!(next.pagination, PaginationState { page_index: 3, page_size: 18 });
    }

    #[test]
    fn test_zero_page_size_ignored() {
        let next = reduce(&on_page(2), ViewAction::SetPageSize(0));
        assert_eq!(next.pagination.page_size, 9);
    }

    #[test]
    fn test_page_navigation() {
        let state = on_page(1);
        let state = reduce(&state, ViewAction::PrevPage);
        assert_eq!(state.pagination.page_index, 1);
        let state = reduce(&state, ViewAction::NextPage);
        assert_eq!(state.pagination.page_index, 2);
        let state = reduce(&state, ViewAction::GoToPage(0));
        assert_eq!(state.pagination.page_index, 1);
        let state = reduce(&state, ViewAction::GoToPage(5));
        assert_eq!(state.pagination.page_index, 5);
        let state = reduce(&state, ViewAction::FirstPage);
        assert_eq!(state.pagination.page_index, 1);
    }

    #[test]
    fn test_toggle_source_twice_restores_selection() {
        let state = ViewState::default();
        let once = reduce(&state, ViewAction::ToggleSource("STAT".to_string()));
        assert!(once.filter.selected_sources.contains("STAT"));
        let twice = reduce(&once, ViewAction::ToggleSource("STAT".to_string()));
        assert_eq!(twice.filter, state.filter);
    }

    #[test]
    fn test_clear_filters_restores_defaults() {
        let mut state = ViewState::default();
        for action in [
            ViewAction::SetQuery("trial".to_string()),
            ViewAction::ToggleSource("Reuters".to_string()),
            ViewAction::SetDateRange(DateRange::Today),
            ViewAction::SetSortMode(SortMode::Relevance),
        ] {
            state = reduce(&state, action);
        }
        assert!(state.has_active_filters());
        let cleared = reduce(&state, ViewAction::ClearFilters);
        assert_eq!(cleared.filter, FilterState::default());
        assert!(!cleared.has_active_filters());
    }

    #[test]
    fn test_query_length_capped() {
        let long = "x".repeat(MAX_SEARCH_QUERY_LENGTH + 50);
        let next = reduce(&ViewState::default(), ViewAction::SetQuery(long));
        assert_eq!(next.filter.query.chars().count(), MAX_SEARCH_QUERY_LENGTH);
    }

    #[test]
    fn test_reduce_does_not_mutate_input() {
        let state = on_page(4);
        let _ = reduce(&state, ViewAction::SetQuery("x".to_string()));
        assert_eq!(state, on_page(4));
    }
}
