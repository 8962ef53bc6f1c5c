use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;

// ---------------------------------------------------------------------------
// Field access
// ---------------------------------------------------------------------------

/// Named, string-valued fields an entity exposes for filtering and sorting.
pub trait Fields {
    /// Value of `name`, or `None` when the entity has no such field.
    fn field(&self, name: &str) -> Option<&str>;
}

// ---------------------------------------------------------------------------
// Criteria
// ---------------------------------------------------------------------------

/// Keyword accepted by [`MatchValue::parse`] to mean "no filtering".
pub const ALL_KEYWORD: &str = "ALL";

/// What a field must equal for an entity to be kept.
///
/// `All` is a variant rather than a magic string, so an entity whose field
/// value happens to be `"ALL"` still filters as an ordinary value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum MatchValue {
    #[default]
    All,
    Equals(String),
}

impl MatchValue {
    /// Parse user input: the bare keyword `ALL` selects everything, `\ALL`
    /// matches the literal string `"ALL"`, anything else is taken verbatim.
    pub fn parse(input: &str) -> Self {
        if input == ALL_KEYWORD {
            Self::All
        } else if let Some(rest) = input.strip_prefix('\\')
            && rest == ALL_KEYWORD
        {
            Self::Equals(rest.to_owned())
        } else {
            Self::Equals(input.to_owned())
        }
    }

    /// Inverse of [`MatchValue::parse`].
    pub fn to_input(&self) -> String {
        match self {
            Self::All => ALL_KEYWORD.to_owned(),
            Self::Equals(v) if v == ALL_KEYWORD => format!("\\{v}"),
            Self::Equals(v) => v.clone(),
        }
    }
}

impl fmt::Display for MatchValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("All"),
            Self::Equals(v) => f.write_str(v),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCriteria {
    pub field: String,
    pub value: MatchValue,
}

impl FilterCriteria {
    pub fn all(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: MatchValue::All,
        }
    }

    pub fn equals(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: MatchValue::Equals(value.into()),
        }
    }

    fn matches<T: Fields>(&self, item: &T) -> bool {
        match &self.value {
            MatchValue::All => true,
            MatchValue::Equals(v) => item.field(&self.field) == Some(v.as_str()),
        }
    }
}

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

/// Keep the items matching `criteria`, in source order.
///
/// `MatchValue::All` returns the items unchanged. The source slice is never
/// modified, and projecting an already projected list again is a no-op.
pub fn project<T: Fields + Clone>(items: &[T], criteria: &FilterCriteria) -> Vec<T> {
    if criteria.value == MatchValue::All {
        return items.to_vec();
    }
    items
        .iter()
        .filter(|item| criteria.matches(*item))
        .cloned()
        .collect()
}

/// Distinct values of `field`, in first-seen order.
pub fn distinct_values<T: Fields>(items: &[T], field: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .iter()
        .filter_map(|item| item.field(field))
        .filter(|v| seen.insert(*v))
        .map(str::to_owned)
        .collect()
}

/// Choices for a filter selector: `All` first, then every distinct value.
pub fn filter_options<T: Fields>(items: &[T], field: &str) -> Vec<MatchValue> {
    std::iter::once(MatchValue::All)
        .chain(
            distinct_values(items, field)
                .into_iter()
                .map(MatchValue::Equals),
        )
        .collect()
}

/// Next option after `current`, wrapping around. Falls back to `All` when
/// `current` is no longer offered (its last entity disappeared).
pub fn cycle_option(options: &[MatchValue], current: &MatchValue, forward: bool) -> MatchValue {
    let Some(pos) = options.iter().position(|o| o == current) else {
        return MatchValue::All;
    };
    let len = options.len();
    let next = if forward {
        (pos + 1) % len
    } else {
        (pos + len - 1) % len
    };
    options[next].clone()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// Stable sort by a field's value. Items lacking the field sort last.
pub fn sort_by_field<T: Fields + Clone>(items: &[T], field: &str, dir: SortDirection) -> Vec<T> {
    let mut sorted = items.to_vec();
    sorted.sort_by(|a, b| match (a.field(field), b.field(field)) {
        (Some(x), Some(y)) => match dir {
            SortDirection::Ascending => x.cmp(y),
            SortDirection::Descending => y.cmp(x),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        id: &'static str,
        service: &'static str,
    }

    impl Fields for Item {
        fn field(&self, name: &str) -> Option<&str> {
            match name {
                "id" => Some(self.id),
                "service" => Some(self.service),
                _ => None,
            }
        }
    }

    fn items() -> Vec<Item> {
        vec![
            Item { id: "d1", service: "api" },
            Item { id: "d2", service: "web" },
            Item { id: "d3", service: "api" },
            Item { id: "d4", service: "ALL" },
        ]
    }

    #[test]
    fn all_returns_items_unchanged() {
        let src = items();
        assert_eq!(project(&src, &FilterCriteria::all("service")), src);
    }

    #[test]
    fn equals_keeps_matching_items_in_order() {
        let out = project(&items(), &FilterCriteria::equals("service", "api"));
        let ids: Vec<_> = out.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["d1", "d3"]);
        assert!(out.iter().all(|i| i.service == "api"));
    }

    #[test]
    fn projection_is_idempotent() {
        let criteria = FilterCriteria::equals("service", "web");
        let once = project(&items(), &criteria);
        assert_eq!(project(&once, &criteria), once);
    }

    #[test]
    fn literal_all_value_is_an_ordinary_match() {
        let out = project(&items(), &FilterCriteria::equals("service", "ALL"));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "d4");
    }

    #[test]
    fn unknown_field_matches_nothing() {
        assert!(project(&items(), &FilterCriteria::equals("region", "eu")).is_empty());
    }

    #[test]
    fn parse_keyword_and_escape() {
        assert_eq!(MatchValue::parse("ALL"), MatchValue::All);
        assert_eq!(
            MatchValue::parse("\\ALL"),
            MatchValue::Equals("ALL".to_owned())
        );
        assert_eq!(
            MatchValue::parse("api"),
            MatchValue::Equals("api".to_owned())
        );
        assert_eq!(MatchValue::Equals("ALL".to_owned()).to_input(), "\\ALL");
    }

    #[test]
    fn distinct_values_first_seen_order() {
        assert_eq!(distinct_values(&items(), "service"), vec!["api", "web", "ALL"]);
    }

    #[test]
    fn cycle_wraps_and_recovers() {
        let opts = filter_options(&items(), "service");
        assert_eq!(opts.len(), 4);
        let last = opts[3].clone();
        assert_eq!(cycle_option(&opts, &last, true), MatchValue::All);
        assert_eq!(cycle_option(&opts, &MatchValue::All, false), last);
        let gone = MatchValue::Equals("worker".to_owned());
        assert_eq!(cycle_option(&opts, &gone, true), MatchValue::All);
    }

    #[test]
    fn sort_is_stable() {
        let sorted = sort_by_field(&items(), "service", SortDirection::Ascending);
        let ids: Vec<_> = sorted.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["d4", "d1", "d3", "d2"]);
    }
}
