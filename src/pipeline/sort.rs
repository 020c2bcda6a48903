use std::cmp::Reverse;
use std::fmt;
use std::str::FromStr;

use crate::feed::Article;
use crate::util::fold_case;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortMode {
    #[default]
    Newest,
    Oldest,
    /// Articles whose title contains the query first; fetch order otherwise.
    Relevance,
}

impl SortMode {
    pub const ALL: [SortMode; 3] = [SortMode::Newest, SortMode::Oldest, SortMode::Relevance];

    pub fn next(self) -> Self {
        match self {
            SortMode::Newest => SortMode::Oldest,
            SortMode::Oldest => SortMode::Relevance,
            SortMode::Relevance => SortMode::Newest,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortMode::Newest => "newest",
            SortMode::Oldest => "oldest",
            SortMode::Relevance => "relevance",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortMode::Newest => "Newest first",
            SortMode::Oldest => "Oldest first",
            SortMode::Relevance => "Most relevant",
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "newest" => Ok(SortMode::Newest),
            "oldest" => Ok(SortMode::Oldest),
            "relevance" => Ok(SortMode::Relevance),
            other => Err(format!(
                "unknown sort mode '{}' (expected newest, oldest or relevance)",
                other
            )),
        }
    }
}

/// Orders `articles` by `mode`. Stable: ties keep their input order.
///
/// Undated articles sort as the oldest. `query` only matters for
/// [`SortMode::Relevance`]; with an empty query that mode leaves the order
/// untouched.
pub fn sort(mut articles: Vec<Article>, mode: SortMode, query: &str) -> Vec<Article> {
    match mode {
        SortMode::Newest => articles.sort_by_key(|a| Reverse(a.sort_key())),
        SortMode::Oldest => articles.sort_by_key(Article::sort_key),
        SortMode::Relevance => {
            let needle = fold_case(query);
            if !needle.is_empty() {
                // false sorts before true, so title matches come first
                articles.sort_by_cached_key(|a| !fold_case(&a.title).contains(&needle));
            }
        }
    }
    articles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::article::test_support::article;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    fn day(d: u32) -> Option<chrono::DateTime<Utc>> {
        Some(Utc.with_ymd_and_hms(2024, 5, d, 12, 0, 0).unwrap())
    }

    fn ids(articles: &[Article]) -> Vec<&str> {
        articles.iter().map(|a| &*a.id).collect()
    }

    fn sample() -> Vec<Article> {
        vec![
            article("mid", "S", day(10)),
            article("undated", "S", None),
            article("new", "S", day(20)),
            article("tie-a", "S", day(5)),
            article("tie-b", "S", day(5)),
        ]
    }

    #[test]
    fn test_newest_first_with_undated_last() {
        let out = sort(sample(), SortMode::Newest, "");
        assert_eq!(ids(&out), vec!["new", "mid", "tie-a", "tie-b", "undated"]);
    }

    #[test]
    fn test_oldest_first_with_undated_first() {
        let out = sort(sample(), SortMode::Oldest, "");
        assert_eq!(ids(&out), vec!["undated", "tie-a", "tie-b", "mid", "new"]);
    }

    #[test]
    fn test_relevance_title_matches_first_stable() {
        let mut input = sample();
        input[2].title = Arc::from("FDA clears NEW drug");
        input[4].title = Arc::from("New trial data");
        // Description matches do not count
        input[0].description = Arc::from("new");

        let out = sort(input, SortMode::Relevance, "new");
        assert_eq!(ids(&out), vec!["new", "tie-b", "mid", "undated", "tie-a"]);
    }

    #[test]
    fn test_relevance_folds_sigma_in_titles() {
        let mut input = sample();
        input[3].title = Arc::from("ΦΑΡΜΑΚΑΣ update");

        let out = sort(input, SortMode::Relevance, "φαρμακασ");
        assert_eq!(ids(&out)[0], "tie-a");
    }

    #[test]
    fn test_relevance_without_query_is_noop() {
        let input = sample();
        assert_eq!(sort(input.clone(), SortMode::Relevance, ""), input);
    }

    #[test]
    fn test_sort_mode_parse_and_cycle() {
        assert_eq!("Relevance".parse::<SortMode>().unwrap(), SortMode::Relevance);
        assert!("popular".parse::<SortMode>().is_err());
        assert_eq!(SortMode::Relevance.next(), SortMode::Newest);
        assert_eq!(SortMode::default(), SortMode::Newest);
    }
}
