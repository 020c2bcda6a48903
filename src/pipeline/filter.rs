use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use super::sort::SortMode;
use crate::feed::Article;
use crate::util::fold_case;

/// Publication window applied by the date stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DateRange {
    #[default]
    All,
    /// Same calendar day as "now", in the caller's timezone.
    Today,
    /// The last 7 days.
    Week,
    /// The last 30 days.
    Month,
}

impl DateRange {
    pub const ALL: [DateRange; 4] = [DateRange::All, DateRange::Today, DateRange::Week, DateRange::Month];

    /// The next range in the cycle All → Today → Week → Month → All.
    pub fn next(self) -> Self {
        match self {
            DateRange::All => DateRange::Today,
            DateRange::Today => DateRange::Week,
            DateRange::Week => DateRange::Month,
            DateRange::Month => DateRange::All,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DateRange::All => "all",
            DateRange::Today => "today",
            DateRange::Week => "week",
            DateRange::Month => "month",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DateRange::All => "All time",
            DateRange::Today => "Today",
            DateRange::Week => "This week",
            DateRange::Month => "This month",
        }
    }

    /// Whether `published` falls inside this range relative to `now`.
    ///
    /// Articles without a parsable date only pass `All`.
    pub fn contains<Tz: TimeZone>(self, published: Option<DateTime<Utc>>, now: &DateTime<Tz>) -> bool {
        if self == DateRange::All {
            return true;
        }
        let Some(published) = published else {
            return false;
        };
        match self {
            DateRange::All => true,
            DateRange::Today => {
                published.with_timezone(&now.timezone()).date_naive() == now.date_naive()
            }
            DateRange::Week => published >= now.with_timezone(&Utc) - Duration::days(7),
            DateRange::Month => published >= now.with_timezone(&Utc) - Duration::days(30),
        }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DateRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(DateRange::All),
            "today" => Ok(DateRange::Today),
            "week" => Ok(DateRange::Week),
            "month" => Ok(DateRange::Month),
            other => Err(format!(
                "unknown date range '{}' (expected all, today, week or month)",
                other
            )),
        }
    }
}

/// Every user-controlled criterion that narrows or orders the working set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    /// Free-text search, matched case-insensitively. Not trimmed.
    pub query: String,
    /// Empty means "every source".
    pub selected_sources: BTreeSet<String>,
    pub date_range: DateRange,
    pub sort_mode: SortMode,
}

impl FilterState {
    /// True when sources, date range or sort mode differ from the defaults.
    ///
    /// The query is shown in its own input and is not counted here.
    pub fn has_active_filters(&self) -> bool {
        !self.selected_sources.is_empty()
            || self.date_range != DateRange::All
            || self.sort_mode != SortMode::Newest
    }
}

/// Narrows `articles` by search text, then source, then date range.
///
/// Each stage is a no-op at its default value, and the result keeps the
/// input order. `now` decides both the "today" calendar day and the
/// week/month cut-offs.
pub fn filter<Tz: TimeZone>(articles: &[Article], state: &FilterState, now: &DateTime<Tz>) -> Vec<Article> {
    let needle = fold_case(&state.query);

    articles
        .iter()
        .filter(|a| needle.is_empty() || matches_query(a, &needle))
        .filter(|a| {
            state.selected_sources.is_empty() || state.selected_sources.contains(&*a.source_name)
        })
        .filter(|a| state.date_range.contains(a.published_at, now))
        .cloned()
        .collect()
}

/// Case-insensitive match against title, description, content or source.
/// `needle` must already be folded with [`fold_case`].
fn matches_query(article: &Article, needle: &str) -> bool {
    let hit = |field: &str| fold_case(field).contains(needle);
    hit(&article.title)
        || hit(&article.description)
        || article.content.as_deref().is_some_and(hit)
        || hit(&article.source_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::article::test_support::article;
    use chrono::{FixedOffset, TimeZone};
    use std::sync::Arc;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 20, 15, 0, 0).unwrap()
    }

    fn days_ago(days: i64) -> Option<DateTime<Utc>> {
        Some(now() - Duration::days(days))
    }

    fn ids(articles: &[Article]) -> Vec<&str> {
        articles.iter().map(|a| &*a.id).collect()
    }

    #[test]
    fn test_default_state_keeps_everything() {
        let input = vec![article("a", "Reuters", None), article("b", "", days_ago(400))];
        assert_eq!(filter(&input, &FilterState::default(), &now()), input);
    }

    #[test]
    fn test_search_matches_any_field_case_insensitively() {
        let mut by_title = article("title", "S", None);
        by_title.title = Arc::from("Vaccine rollout");
        let mut by_desc = article("desc", "S", None);
        by_desc.description = Arc::from("A new VACCINE study");
        let mut by_content = article("content", "S", None);
        by_content.content = Some(Arc::from("...vaccines..."));
        let by_source = article("source", "Vaccine Weekly", None);
        let miss = article("miss", "S", None);

        let state = FilterState {
            query: "vAcCiNe".to_string(),
            ..FilterState::default()
        };
        let out = filter(&[by_title, by_desc, by_content, by_source, miss], &state, &now());
        assert_eq!(ids(&out), vec!["title", "desc", "content", "source"]);
    }

    #[test]
    fn test_greek_prefix_query_matches_whatever_the_longer_one_does() {
        let mut a = article("a", "S", None);
        a.title = Arc::from("ΑΣΒ news");
        let input = [a];
        let run = |query: &str| {
            let state = FilterState {
                query: query.to_string(),
                ..FilterState::default()
            };
            filter(&input, &state, &now()).len()
        };
        assert_eq!(run("ΑΣΒ"), 1);
        assert_eq!(run("ΑΣ"), 1);
        assert_eq!(run("ασ"), 1);
    }

    #[test]
    fn test_query_is_not_trimmed() {
        let mut a = article("a", "S", None);
        a.title = Arc::from("gene therapy");
        let state = FilterState {
            query: " therapy".to_string(),
            ..FilterState::default()
        };
        assert_eq!(filter(&[a.clone()], &state, &now()).len(), 1);
        let state = FilterState {
            query: "gene  ".to_string(),
            ..FilterState::default()
        };
        assert!(filter(&[a], &state, &now()).is_empty());
    }

    #[test]
    fn test_source_selection() {
        let mut input = Vec::new();
        for i in 0..5 {
            input.push(article(&format!("r{}", i), "Reuters", None));
        }
        for i in 0..3 {
            input.push(article(&format!("o{}", i), "STAT", None));
        }
        let state = FilterState {
            selected_sources: BTreeSet::from(["Reuters".to_string()]),
            ..FilterState::default()
        };
        let out = filter(&input, &state, &now());
        assert_eq!(out.len(), 5);
        assert!(out.iter().all(|a| &*a.source_name == "Reuters"));
    }

    #[test]
    fn test_date_ranges() {
        let input = vec![
            article("today", "S", days_ago(0)),
            article("three", "S", days_ago(3)),
            article("twenty", "S", days_ago(20)),
            article("ninety", "S", days_ago(90)),
            article("undated", "S", None),
        ];
        let run = |range| {
            let state = FilterState {
                date_range: range,
                ..FilterState::default()
            };
            filter(&input, &state, &now())
                .iter()
                .map(|a| a.id.to_string())
                .collect::<Vec<_>>()
        };
        assert_eq!(run(DateRange::Today), vec!["today"]);
        assert_eq!(run(DateRange::Week), vec!["today", "three"]);
        assert_eq!(run(DateRange::Month), vec!["today", "three", "twenty"]);
        assert_eq!(run(DateRange::All).len(), 5);
    }

    #[test]
    fn test_today_uses_callers_calendar_day() {
        // 23:30 UTC on the 19th is already the 20th at UTC+2
        let published = Utc.with_ymd_and_hms(2024, 5, 19, 23, 30, 0).unwrap();
        let a = article("late", "S", Some(published));
        let state = FilterState {
            date_range: DateRange::Today,
            ..FilterState::default()
        };

        let utc_now = Utc.with_ymd_and_hms(2024, 5, 20, 9, 0, 0).unwrap();
        assert!(filter(&[a.clone()], &state, &utc_now).is_empty());

        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        let local_now = plus_two.with_ymd_and_hms(2024, 5, 20, 11, 0, 0).unwrap();
        assert_eq!(filter(&[a], &state, &local_now).len(), 1);
    }

    #[test]
    fn test_stages_compose() {
        let mut hit = article("hit", "Reuters", days_ago(1));
        hit.title = Arc::from("Oncology drug approved");
        let mut wrong_source = article("wrong-source", "STAT", days_ago(1));
        wrong_source.title = Arc::from("Oncology drug approved");
        let mut too_old = article("too-old", "Reuters", days_ago(60));
        too_old.title = Arc::from("Oncology drug approved");

        let state = FilterState {
            query: "oncology".to_string(),
            selected_sources: BTreeSet::from(["Reuters".to_string()]),
            date_range: DateRange::Month,
            sort_mode: SortMode::Newest,
        };
        let out = filter(&[hit, wrong_source, too_old], &state, &now());
        assert_eq!(ids(&out), vec!["hit"]);
    }

    #[test]
    fn test_filter_is_idempotent() {
        let input = vec![
            article("a", "Reuters", days_ago(2)),
            article("b", "STAT", days_ago(10)),
        ];
        let state = FilterState {
            date_range: DateRange::Week,
            ..FilterState::default()
        };
        let once = filter(&input, &state, &now());
        assert_eq!(filter(&once, &state, &now()), once);
    }

    #[test]
    fn test_has_active_filters() {
        let mut state = FilterState::default();
        assert!(!state.has_active_filters());
        state.query = "fda".to_string();
        assert!(!state.has_active_filters());
        state.sort_mode = SortMode::Relevance;
        assert!(state.has_active_filters());
    }

    #[test]
    fn test_date_range_parse_and_cycle() {
        assert_eq!("Week".parse::<DateRange>().unwrap(), DateRange::Week);
        assert!("fortnight".parse::<DateRange>().is_err());
        let mut range = DateRange::All;
        for expected in [DateRange::Today, DateRange::Week, DateRange::Month, DateRange::All] {
            range = range.next();
            assert_eq!(range, expected);
        }
        assert_eq!(DateRange::Month.to_string(), "month");
    }
}
