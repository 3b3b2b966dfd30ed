//! Operator scope: which failed records a run considers.
//!
//! [`ScopeFilter`] is the parsed, typed form of the operator's inputs. The
//! Filter Builder ([`build_predicate`]) validates it and turns it into a
//! [`ScopePredicate`] the record store can evaluate or bind.

pub mod predicate;

pub use predicate::{Clause, ScopePredicate, build_predicate};

use crate::core::{RequeueError, Result};

/// Conjunction of optional predicates over failed records.
///
/// Empty lists and `None` bounds are inactive. A filter with nothing active
/// matches every record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeFilter {
    pub error_types: Vec<i64>,
    pub event_names: Vec<String>,
    pub date_from: Option<i64>,
    pub date_to: Option<i64>,
}

impl ScopeFilter {
    /// Filter that matches everything.
    pub fn all() -> Self {
        Self::default()
    }

    /// Parse the raw operator inputs.
    ///
    /// `error_types` and `event_names` are comma separated lists (newlines are
    /// accepted as separators too). Items are trimmed, blanks skipped and
    /// duplicates dropped. Date bounds are not cross-checked here; that is the
    /// Filter Builder's job.
    pub fn parse(
        error_types: Option<&str>,
        event_names: Option<&str>,
        date_from: Option<i64>,
        date_to: Option<i64>,
    ) -> Result<Self> {
        let error_types = match error_types {
            Some(raw) => parse_error_types(raw)?,
            None => Vec::new(),
        };
        let event_names = event_names.map(split_list).unwrap_or_default();

        Ok(Self {
            error_types,
            event_names,
            date_from,
            date_to,
        })
    }

    pub fn error_types(mut self, error_types: impl IntoIterator<Item = i64>) -> Self {
        self.error_types = dedup(error_types.into_iter().collect());
        self
    }

    pub fn event_names<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.event_names = dedup(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn date_from(mut self, from: i64) -> Self {
        self.date_from = Some(from);
        self
    }

    pub fn date_to(mut self, to: i64) -> Self {
        self.date_to = Some(to);
        self
    }

    pub fn is_unscoped(&self) -> bool {
        self.error_types.is_empty()
            && self.event_names.is_empty()
            && self.date_from.is_none()
            && self.date_to.is_none()
    }
}

fn split_list(raw: &str) -> Vec<String> {
    let items = raw
        .split([',', '\n'])
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect();
    dedup(items)
}

fn parse_error_types(raw: &str) -> Result<Vec<i64>> {
    let parsed = split_list(raw)
        .into_iter()
        .map(|item| {
            item.parse::<i64>().map_err(|_| {
                RequeueError::invalid_parameter(
                    "errortype",
                    format!("'{}' is not an integer error type", item),
                )
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(dedup(parsed))
}

fn dedup<T: PartialEq>(items: Vec<T>) -> Vec<T> {
    let mut unique = Vec::with_capacity(items.len());
    for item in items {
        if !unique.contains(&item) {
            unique.push(item);
        }
    }
    unique
}
