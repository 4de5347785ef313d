//! Title prefix search over a title-sorted snapshot.
//!
//! Titles are compared by their lowercase form, both when sorting and
//! while searching, so every title sharing a prefix forms one contiguous
//! run in the sorted array. Finding the first element of that run is a
//! binary search; collecting the rest is a forward scan.

use serde::Serialize;

use super::model::PollSnapshot;

/// Copy of `snapshots` sorted ascending by lowercase title.
///
/// Stable: polls with equal titles keep their input order. Ordering is by
/// lowercase code point, so accented or punctuated titles do not sort as
/// a locale-aware collation would.
#[must_use]
pub fn sort_by_title(snapshots: &[PollSnapshot]) -> Vec<PollSnapshot> {
    let mut sorted = snapshots.to_vec();
    sorted.sort_by_cached_key(|p| p.title.to_lowercase());
    sorted
}

/// Index of the first poll in `sorted` whose title starts with `query`.
///
/// `sorted` must be ordered as by [`sort_by_title`]. O(log n).
#[must_use]
pub fn find_first_prefix(sorted: &[PollSnapshot], query: &str) -> Option<usize> {
    let query = query.to_lowercase();
    let mut left = 0;
    let mut right = sorted.len();
    let mut first = None;

    while left < right {
        let mid = left + (right - left) / 2;
        let title = sorted[mid].title.to_lowercase();

        if title.starts_with(&query) {
            // keep looking left for an earlier match
            first = Some(mid);
            right = mid;
        } else if title < query {
            left = mid + 1;
        } else {
            right = mid;
        }
    }

    first
}

/// Every poll in `sorted` whose title starts with `query`, in title order.
///
/// O(log n + k) for k matches. Empty when nothing matches.
#[must_use]
pub fn find_all_with_prefix<'a>(sorted: &'a [PollSnapshot], query: &str) -> &'a [PollSnapshot] {
    let Some(first) = find_first_prefix(sorted, query) else {
        return &[];
    };

    let query = query.to_lowercase();
    let len = sorted[first..]
        .iter()
        .take_while(|p| p.title.to_lowercase().starts_with(&query))
        .count();

    &sorted[first..first + len]
}

/// The poll whose lowercase title equals `title`'s lowercase form.
#[must_use]
pub fn find_exact<'a>(sorted: &'a [PollSnapshot], title: &str) -> Option<&'a PollSnapshot> {
    let title = title.to_lowercase();
    let mut left = 0;
    let mut right = sorted.len();

    while left < right {
        let mid = left + (right - left) / 2;
        let current = sorted[mid].title.to_lowercase();

        match current.cmp(&title) {
            std::cmp::Ordering::Equal => return Some(&sorted[mid]),
            std::cmp::Ordering::Less => left = mid + 1,
            std::cmp::Ordering::Greater => right = mid,
        }
    }

    None
}

/// Result of [`search`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOutcome {
    /// Matching polls; title-sorted unless the query was blank.
    pub results: Vec<PollSnapshot>,
    /// Number of matches.
    pub total_found: usize,
    /// Number of polls searched.
    pub total_polls: usize,
}

/// Prefix search over an unsorted snapshot.
///
/// A blank query filters nothing and returns `polls` as given.
#[must_use]
pub fn search(polls: &[PollSnapshot], query: &str) -> SearchOutcome {
    let query = query.trim();
    let results = if query.is_empty() {
        polls.to_vec()
    } else {
        PrefixIndex::new(polls).with_prefix(query).to_vec()
    };

    SearchOutcome {
        total_found: results.len(),
        total_polls: polls.len(),
        results,
    }
}

/// A title-sorted copy of a snapshot, ready for repeated lookups.
#[derive(Debug, Clone, Default)]
pub struct PrefixIndex {
    sorted: Vec<PollSnapshot>,
}

impl PrefixIndex {
    /// Sort a copy of `snapshots` by title.
    #[must_use]
    pub fn new(snapshots: &[PollSnapshot]) -> Self {
        Self {
            sorted: sort_by_title(snapshots),
        }
    }

    /// The sorted polls.
    #[must_use]
    pub fn as_slice(&self) -> &[PollSnapshot] {
        &self.sorted
    }

    /// Number of indexed polls.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    /// Whether the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    /// See [`find_first_prefix`].
    #[must_use]
    pub fn first_prefix(&self, query: &str) -> Option<usize> {
        find_first_prefix(&self.sorted, query)
    }

    /// See [`find_all_with_prefix`].
    #[must_use]
    pub fn with_prefix(&self, query: &str) -> &[PollSnapshot] {
        find_all_with_prefix(&self.sorted, query)
    }

    /// See [`find_exact`].
    #[must_use]
    pub fn exact(&self, title: &str) -> Option<&PollSnapshot> {
        find_exact(&self.sorted, title)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn polls(titles: &[&str]) -> Vec<PollSnapshot> {
        let now = Utc::now();
        titles
            .iter()
            .enumerate()
            .map(|(i, t)| PollSnapshot::new(format!("p{i}"), *t, now))
            .collect()
    }

    fn titles(polls: &[PollSnapshot]) -> Vec<&str> {
        polls.iter().map(|p| p.title.as_str()).collect()
    }

    #[test]
    fn test_sort_is_case_insensitive_and_leaves_input() {
        let input = polls(&["banana", "Apple", "cherry", "apricot"]);
        let sorted = sort_by_title(&input);

        assert_eq!(titles(&sorted), vec!["Apple", "apricot", "banana", "cherry"]);
        assert_eq!(input[0].title, "banana");
    }

    #[test]
    fn test_accented_titles_sort_by_code_point() {
        let index = PrefixIndex::new(&polls(&["Écran", "zebra", "eclair"]));

        assert_eq!(titles(index.as_slice()), vec!["eclair", "zebra", "Écran"]);
        assert_eq!(titles(index.with_prefix("éc")), vec!["Écran"]);
    }

    #[test]
    fn test_best_prefix_example() {
        let index = PrefixIndex::new(&polls(&["Best Pizza", "Best Movie", "Worst Pizza"]));

        assert_eq!(titles(index.with_prefix("best")), vec!["Best Movie", "Best Pizza"]);
        assert_eq!(index.first_prefix("BEST"), Some(0));
    }

    #[test]
    fn test_prefix_matches_linear_filter() {
        let index = PrefixIndex::new(&polls(&[
            "Rust or Go",
            "rustaceans unite",
            "Ruby",
            "R",
            "Python",
            "rust",
            "Rusty nails",
            "zebra",
            "",
        ]));

        for query in ["r", "ru", "rust", "RUST ", "rusty", "py", "z", "q", "rustaceans unite!"] {
            let expected: Vec<&str> = index
                .as_slice()
                .iter()
                .filter(|p| p.title.to_lowercase().starts_with(&query.to_lowercase()))
                .map(|p| p.title.as_str())
                .collect();
            assert_eq!(titles(index.with_prefix(query)), expected, "query {query:?}");
        }
    }

    #[test]
    fn test_no_match_is_empty_not_error() {
        let index = PrefixIndex::new(&polls(&["Alpha", "Beta"]));
        assert!(index.with_prefix("gamma").is_empty());
        assert_eq!(index.first_prefix("gamma"), None);
        assert!(PrefixIndex::default().with_prefix("a").is_empty());
    }

    #[test]
    fn test_find_exact() {
        let index = PrefixIndex::new(&polls(&["Best Pizza", "Best Movie", "Worst Pizza"]));

        assert_eq!(index.exact("worst pizza").unwrap().id, "p2");
        assert!(index.exact("Best").is_none());
    }

    #[test]
    fn test_search_blank_query_returns_input() {
        let input = polls(&["b", "a"]);
        let outcome = search(&input, "   ");

        assert_eq!(titles(&outcome.results), vec!["b", "a"]);
        assert_eq!(outcome.total_found, 2);
        assert_eq!(outcome.total_polls, 2);
    }

    #[test]
    fn test_search_trims_query() {
        let outcome = search(&polls(&["Best Pizza", "Best Movie", "Worst Pizza"]), "  worst ");
        assert_eq!(titles(&outcome.results), vec!["Worst Pizza"]);
        assert_eq!(outcome.total_polls, 3);
    }
}
