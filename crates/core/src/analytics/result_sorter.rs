//! Leaderboard ordering of option tallies.
//!
//! Numeric keys go through a three-way quicksort with a median-of-three
//! pivot; labels use the standard stable sort so equal labels keep their
//! input order.

use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;

use super::model::OptionTally;

/// Field to order tallies by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    /// Raw vote count.
    #[default]
    VoteCount,
    /// Share of the poll's votes.
    Percentage,
    /// Option label, case-insensitive.
    Label,
}

impl SortKey {
    /// Parse a key name, falling back to [`SortKey::VoteCount`] for anything
    /// unrecognized.
    #[must_use]
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim() {
            "percentage" => Self::Percentage,
            "label" | "option_text" | "optionText" => Self::Label,
            _ => Self::VoteCount,
        }
    }

    /// Canonical name of the key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::VoteCount => "voteCount",
            Self::Percentage => "percentage",
            Self::Label => "label",
        }
    }

    fn numeric(self, tally: &OptionTally) -> f64 {
        match self {
            Self::Percentage => tally.percentage,
            _ => tally.vote_count as f64,
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ascending or descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Smallest first.
    Asc,
    /// Largest first.
    #[default]
    Desc,
}

impl SortDirection {
    /// `"asc"` (any case) is ascending; everything else is descending.
    #[must_use]
    pub fn parse_lenient(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("asc") {
            Self::Asc
        } else {
            Self::Desc
        }
    }

    const fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Asc => ordering,
            Self::Desc => ordering.reverse(),
        }
    }
}

/// `tallies` ordered by `key` in `direction`. The input is left untouched.
#[must_use]
pub fn sort(tallies: &[OptionTally], key: SortKey, direction: SortDirection) -> Vec<OptionTally> {
    match key {
        SortKey::Label => {
            let mut sorted = tallies.to_vec();
            sorted.sort_by(|a, b| direction.apply(compare_labels(&a.label, &b.label)));
            sorted
        }
        SortKey::VoteCount | SortKey::Percentage => {
            quicksort(tallies.to_vec(), &|a: &OptionTally, b: &OptionTally| {
                direction.apply(key.numeric(a).total_cmp(&key.numeric(b)))
            })
        }
    }
}

/// Lowercase code-point order, not locale collation; accented or punctuated
/// labels may order differently than a locale-aware compare.
fn compare_labels(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

fn quicksort<F>(mut items: Vec<OptionTally>, cmp: &F) -> Vec<OptionTally>
where
    F: Fn(&OptionTally, &OptionTally) -> Ordering,
{
    if items.len() <= 1 {
        return items;
    }

    let pivot_index = median_of_three(&items, cmp);
    let pivot = items.swap_remove(pivot_index);

    let mut less = Vec::new();
    let mut equal = Vec::new();
    let mut greater = Vec::new();
    for item in items {
        match cmp(&item, &pivot) {
            Ordering::Less => less.push(item),
            Ordering::Equal => equal.push(item),
            Ordering::Greater => greater.push(item),
        }
    }

    let mut sorted = quicksort(less, cmp);
    sorted.push(pivot);
    sorted.extend(equal);
    sorted.extend(quicksort(greater, cmp));
    sorted
}

/// Index of the median of the first, middle and last elements.
fn median_of_three<F>(items: &[OptionTally], cmp: &F) -> usize
where
    F: Fn(&OptionTally, &OptionTally) -> Ordering,
{
    let (lo, mid, hi) = (0, items.len() / 2, items.len() - 1);
    let (a, b, c) = (&items[lo], &items[mid], &items[hi]);

    if cmp(a, b).is_le() {
        if cmp(b, c).is_le() {
            mid
        } else if cmp(a, c).is_le() {
            hi
        } else {
            lo
        }
    } else if cmp(a, c).is_le() {
        lo
    } else if cmp(b, c).is_le() {
        hi
    } else {
        mid
    }
}

/// The option with the most votes, if any.
#[must_use]
pub fn winner(tallies: &[OptionTally]) -> Option<OptionTally> {
    sort(tallies, SortKey::VoteCount, SortDirection::Desc)
        .into_iter()
        .next()
}

/// A sorted leaderboard together with how it was produced.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SortedResults {
    /// Tallies in the requested order.
    pub results: Vec<OptionTally>,
    /// Key actually used after lenient parsing.
    pub sorted_by: SortKey,
    /// Direction actually used.
    pub direction: SortDirection,
    /// Top option by vote count.
    pub winner: Option<OptionTally>,
}

/// Sort `tallies` by the given raw key and direction names.
#[must_use]
pub fn sort_results(tallies: &[OptionTally], sort_by: &str, order: &str) -> SortedResults {
    let key = SortKey::parse_lenient(sort_by);
    let direction = SortDirection::parse_lenient(order);

    SortedResults {
        results: sort(tallies, key, direction),
        sorted_by: key,
        direction,
        winner: winner(tallies),
    }
}
