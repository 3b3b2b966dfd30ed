use super::ScopeFilter;
use crate::core::{FailedRecord, RequeueError, Result, Value};
use std::fmt;

/// One activated condition of a scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clause {
    ErrorTypeIn(Vec<i64>),
    EventNameIn(Vec<String>),
    CreatedFrom(i64),
    CreatedTo(i64),
    /// Explicit match-everything, used when no other clause is active.
    Always,
}

impl Clause {
    pub fn matches(&self, record: &FailedRecord) -> bool {
        match self {
            Self::ErrorTypeIn(types) => types.contains(&record.error_type),
            Self::EventNameIn(names) => names.iter().any(|name| *name == record.event_name),
            Self::CreatedFrom(from) => record.time_created >= *from,
            Self::CreatedTo(to) => record.time_created <= *to,
            Self::Always => true,
        }
    }

    fn scope_name(&self) -> &'static str {
        match self {
            Self::ErrorTypeIn(_) => "errortype",
            Self::EventNameIn(_) => "eventname",
            Self::CreatedFrom(_) => "datefrom",
            Self::CreatedTo(_) => "dateto",
            Self::Always => "all",
        }
    }
}

/// A validated scope in store-ready form.
///
/// Carries the typed clauses (for stores that filter in memory), a WHERE
/// fragment over alias `x` with named placeholders plus their bindings (for
/// relational stores), and the operator-facing activation lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopePredicate {
    clauses: Vec<Clause>,
    where_sql: String,
    params: Vec<(String, Value)>,
    activations: Vec<String>,
}

impl ScopePredicate {
    /// WHERE fragment, e.g. `x.errortype IN (:errt0, :errt1) AND x.timecreated >= :datefrom`.
    pub fn where_sql(&self) -> &str {
        &self.where_sql
    }

    /// Named parameter bindings in placeholder order.
    pub fn params(&self) -> &[(String, Value)] {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params
            .iter()
            .find(|(param, _)| param == name)
            .map(|(_, value)| value)
    }

    /// One line per activated clause, in activation order.
    pub fn activations(&self) -> &[String] {
        &self.activations
    }

    pub fn matches(&self, record: &FailedRecord) -> bool {
        self.clauses.iter().all(|clause| clause.matches(record))
    }

    /// The identifier-ordered id query a relational store would run.
    pub fn select_ids_sql(&self, table: &str) -> String {
        format!(
            "SELECT x.id FROM {} x WHERE {} ORDER BY x.id",
            table, self.where_sql
        )
    }

    /// WHERE fragment with every placeholder replaced by its literal.
    pub fn render_inline(&self) -> String {
        // Longest names first so `:errt1` never clobbers `:errt10`.
        let mut params: Vec<&(String, Value)> = self.params.iter().collect();
        params.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

        let mut rendered = self.where_sql.clone();
        for (name, value) in params {
            rendered = rendered.replace(&format!(":{}", name), &value.to_sql_literal());
        }
        rendered
    }
}

impl fmt::Display for ScopePredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.where_sql)
    }
}

/// Filter Builder: validate a scope and translate it into a predicate.
///
/// Fails with [`RequeueError::InvalidScope`] when both date bounds are set and
/// `from > to`. Never produces an empty predicate: a scope with nothing
/// active yields [`Clause::Always`] rendered as `1 = 1`.
pub fn build_predicate(scope: &ScopeFilter) -> Result<ScopePredicate> {
    if let (Some(from), Some(to)) = (scope.date_from, scope.date_to)
        && from > to
    {
        return Err(RequeueError::InvalidScope { from, to });
    }

    let mut clauses = Vec::new();
    let mut fragments = Vec::new();
    let mut params = Vec::new();
    let mut activations = Vec::new();

    if !scope.error_types.is_empty() {
        let placeholders = bind_list(
            "errt",
            scope.error_types.iter().map(|code| Value::Integer(*code)),
            &mut params,
        );
        fragments.push(format!("x.errortype {}", in_or_equal(&placeholders)));
        clauses.push(Clause::ErrorTypeIn(scope.error_types.clone()));
    }

    if !scope.event_names.is_empty() {
        let placeholders = bind_list(
            "evt",
            scope.event_names.iter().map(|name| Value::Text(name.clone())),
            &mut params,
        );
        fragments.push(format!("x.eventname {}", in_or_equal(&placeholders)));
        clauses.push(Clause::EventNameIn(scope.event_names.clone()));
    }

    if let Some(from) = scope.date_from {
        fragments.push("x.timecreated >= :datefrom".to_string());
        params.push(("datefrom".to_string(), Value::Integer(from)));
        clauses.push(Clause::CreatedFrom(from));
    }

    if let Some(to) = scope.date_to {
        fragments.push("x.timecreated <= :dateto".to_string());
        params.push(("dateto".to_string(), Value::Integer(to)));
        clauses.push(Clause::CreatedTo(to));
    }

    for clause in &clauses {
        activations.push(format!("Applied scope for {} ...", clause.scope_name()));
    }

    if clauses.is_empty() {
        fragments.push("1 = 1".to_string());
        clauses.push(Clause::Always);
        activations.push("No scope applied, moving all records ...".to_string());
    }

    Ok(ScopePredicate {
        clauses,
        where_sql: fragments.join(" AND "),
        params,
        activations,
    })
}

fn bind_list(
    prefix: &str,
    values: impl Iterator<Item = Value>,
    params: &mut Vec<(String, Value)>,
) -> Vec<String> {
    values
        .enumerate()
        .map(|(index, value)| {
            let name = format!("{}{}", prefix, index);
            params.push((name.clone(), value));
            name
        })
        .collect()
}

fn in_or_equal(placeholders: &[String]) -> String {
    match placeholders {
        [single] => format!("= :{}", single),
        many => {
            let list = many
                .iter()
                .map(|name| format!(":{}", name))
                .collect::<Vec<_>>()
                .join(", ");
            format!("IN ({})", list)
        }
    }
}
