//! A shared engine for filtering cached record lists client-side.
//!
//! Every list view (directory, events, files, story review) fetches its
//! records once per request and then narrows them with the same three
//! filters: a case-insensitive text search, an exact-match category, and an
//! inclusive date range. The engine also classifies the result so views can
//! show the right empty-state message: "add your first record" when the
//! collection was empty to begin with, "no matches" when the filters removed
//! everything.

use time::Date;

/// The active filters for a list view.
///
/// Default values are identity filters: an empty search term, no category,
/// and no date bounds leave the record list unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListFilter {
    /// Case-insensitive substring search. Empty means no search filter.
    pub search: String,
    /// Exact-match category. `None` means no category filter.
    pub category: Option<String>,
    /// Inclusive lower bound on the record date.
    pub date_from: Option<Date>,
    /// Inclusive upper bound on the record date.
    pub date_to: Option<Date>,
}

impl ListFilter {
    /// A filter that retains only records containing `term`.
    pub fn search(term: &str) -> Self {
        Self {
            search: term.to_owned(),
            ..Default::default()
        }
    }

    /// Parse the category value from a query string, where an absent value or
    /// the literal "all" means no category filter.
    pub fn parse_category(raw: Option<String>) -> Option<String> {
        raw.filter(|category| !category.is_empty() && category != "all")
    }
}

/// How a filtered list should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListOutcome {
    /// At least one record is visible.
    Populated,
    /// The collection has records but the filters matched none of them.
    EmptyFiltered,
    /// The collection itself is empty; filters are irrelevant.
    EmptyInitial,
}

/// The visible subset of a record list plus its presentation outcome.
#[derive(Debug, PartialEq)]
pub struct FilteredList<'a, T> {
    /// References to the matching records, in their original order.
    pub visible: Vec<&'a T>,
    /// Which empty-state (if any) the view should render.
    pub outcome: ListOutcome,
}

/// A record that can be narrowed by [apply_filters].
pub trait Filterable {
    /// Whether the record matches a search term. The term is already
    /// lowercased; implementations should lowercase their own fields.
    fn matches_search(&self, term: &str) -> bool;

    /// The record's category for exact-match filtering. Records without a
    /// category concept can return the empty string, which only matches the
    /// identity filter.
    fn category(&self) -> &str {
        ""
    }

    /// The record date used for range filtering. Returning `None` excludes
    /// the record whenever a date bound is set (exclude-on-ambiguity).
    fn date(&self) -> Option<Date> {
        None
    }
}

/// Narrow `records` to the subset matching `filter`.
///
/// Filters compose as a logical AND. The input is not mutated and the
/// relative order of records is preserved.
pub fn apply_filters<'a, T: Filterable>(records: &'a [T], filter: &ListFilter) -> FilteredList<'a, T> {
    if records.is_empty() {
        return FilteredList {
            visible: Vec::new(),
            outcome: ListOutcome::EmptyInitial,
        };
    }

    let term = filter.search.trim().to_lowercase();

    let visible: Vec<&T> = records
        .iter()
        .filter(|record| match &filter.category {
            Some(category) => record.category() == category,
            None => true,
        })
        .filter(|record| term.is_empty() || record.matches_search(&term))
        .filter(|record| matches_date_range(record.date(), filter.date_from, filter.date_to))
        .collect();

    let outcome = if visible.is_empty() {
        ListOutcome::EmptyFiltered
    } else {
        ListOutcome::Populated
    };

    FilteredList { visible, outcome }
}

fn matches_date_range(date: Option<Date>, from: Option<Date>, to: Option<Date>) -> bool {
    if from.is_none() && to.is_none() {
        return true;
    }

    // A record without a usable date cannot prove it is in range.
    let Some(date) = date else {
        return false;
    };

    if let Some(from) = from
        && date < from
    {
        return false;
    }

    if let Some(to) = to
        && date > to
    {
        return false;
    }

    true
}
