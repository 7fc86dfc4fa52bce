// Query Plan: filter -> order -> skip -> take

use crate::domain::entity::Entity;
use crate::domain::value::Value;
use crate::error::{RepositoryError, Result};
use std::cmp::Ordering;
use std::sync::Arc;

/// Client-side filter closure
pub type Predicate<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// Comparison operator of a [`Criterion`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    IsNull,
    IsNotNull,
}

impl CompareOp {
    pub fn as_sql(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::NotEq => "<>",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::IsNull => "IS NULL",
            CompareOp::IsNotNull => "IS NOT NULL",
        }
    }

    /// True when the operator takes no right-hand value
    pub fn is_unary(&self) -> bool {
        matches!(self, CompareOp::IsNull | CompareOp::IsNotNull)
    }
}

/// Field comparison every backend can translate natively
#[derive(Debug, Clone, PartialEq)]
pub struct Criterion {
    pub field: &'static str,
    pub op: CompareOp,
    pub value: Value,
}

impl Criterion {
    pub fn new(field: &'static str, op: CompareOp, value: impl Into<Value>) -> Self {
        Self {
            field,
            op,
            value: value.into(),
        }
    }

    pub fn eq(field: &'static str, value: impl Into<Value>) -> Self {
        Self::new(field, CompareOp::Eq, value)
    }

    pub fn is_null(field: &'static str) -> Self {
        Self::new(field, CompareOp::IsNull, Value::Null)
    }

    /// SQL semantics: any comparison against NULL is false
    pub fn matches(&self, actual: &Value) -> bool {
        match self.op {
            CompareOp::IsNull => actual.is_null(),
            CompareOp::IsNotNull => !actual.is_null(),
            _ if actual.is_null() || self.value.is_null() => false,
            CompareOp::Eq => actual == &self.value,
            CompareOp::NotEq => actual != &self.value,
            CompareOp::Lt => actual < &self.value,
            CompareOp::Le => actual <= &self.value,
            CompareOp::Gt => actual > &self.value,
            CompareOp::Ge => actual >= &self.value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// One ordering key: a single entity field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: &'static str,
    pub direction: SortDirection,
}

/// Accepts only a bare identifier naming one of `T::FIELDS`
pub fn member_field<T: Entity>(selector: &str) -> Result<&'static str> {
    let trimmed = selector.trim();
    let is_identifier = trimmed
        .chars()
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_')
        .unwrap_or(false)
        && trimmed.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

    if !is_identifier {
        return Err(RepositoryError::member_expected());
    }

    T::FIELDS
        .iter()
        .copied()
        .find(|field| *field == trimmed)
        .ok_or_else(RepositoryError::member_expected)
}

/// Accumulated filter, ordering and paging state
///
/// Whatever order the builder calls arrive in, evaluation is always
/// filter -> order -> skip -> take. Ordering keys accumulate: the first key
/// is primary, later keys break ties.
pub struct Query<T> {
    criteria: Vec<Criterion>,
    predicates: Vec<Predicate<T>>,
    ordering: Vec<SortKey>,
    offset: usize,
    limit: Option<usize>,
}

impl<T> Clone for Query<T> {
    fn clone(&self) -> Self {
        Self {
            criteria: self.criteria.clone(),
            predicates: self.predicates.clone(),
            ordering: self.ordering.clone(),
            offset: self.offset,
            limit: self.limit,
        }
    }
}

impl<T> Default for Query<T> {
    fn default() -> Self {
        Self {
            criteria: Vec::new(),
            predicates: Vec::new(),
            ordering: Vec::new(),
            offset: 0,
            limit: None,
        }
    }
}

impl<T> std::fmt::Debug for Query<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Query")
            .field("criteria", &self.criteria)
            .field("predicates", &self.predicates.len())
            .field("ordering", &self.ordering)
            .field("offset", &self.offset)
            .field("limit", &self.limit)
            .finish()
    }
}

impl<T: Entity> Query<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn criteria(&self) -> &[Criterion] {
        &self.criteria
    }

    pub fn ordering(&self) -> &[SortKey] {
        &self.ordering
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Closure filters can only run client-side
    pub fn has_predicates(&self) -> bool {
        !self.predicates.is_empty()
    }

    pub fn add_criterion(&mut self, criterion: Criterion) {
        self.criteria.push(criterion);
    }

    pub fn add_predicate(&mut self, predicate: Predicate<T>) {
        self.predicates.push(predicate);
    }

    pub fn order_by(&mut self, selector: &str, direction: SortDirection) -> Result<()> {
        let field = member_field::<T>(selector)?;
        self.ordering.push(SortKey { field, direction });
        Ok(())
    }

    /// Caps the number of results
    pub fn take(&mut self, count: usize) {
        self.limit = Some(self.limit.map_or(count, |limit| limit.min(count)));
    }

    /// Skips results; composes with an earlier `take` the way sequence
    /// operators do (`take(5).skip(2)` yields three elements)
    pub fn skip(&mut self, count: usize) {
        self.offset = self.offset.saturating_add(count);
        self.limit = self.limit.map(|limit| limit.saturating_sub(count));
    }

    pub fn matches(&self, entity: &T) -> bool {
        self.criteria
            .iter()
            .all(|c| c.matches(&entity.field(c.field).unwrap_or(Value::Null)))
            && self.predicates.iter().all(|p| p(entity))
    }

    pub fn compare(&self, a: &T, b: &T) -> Ordering {
        for key in &self.ordering {
            let left = a.field(key.field).unwrap_or(Value::Null);
            let right = b.field(key.field).unwrap_or(Value::Null);
            let ordering = match key.direction {
                SortDirection::Ascending => left.cmp(&right),
                SortDirection::Descending => right.cmp(&left),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }

    /// Runs the whole plan client-side over materialized rows
    pub fn evaluate(&self, rows: Vec<T>) -> Vec<T> {
        let mut matched: Vec<T> = rows.into_iter().filter(|e| self.matches(e)).collect();
        if !self.ordering.is_empty() {
            // stable sort keeps storage order for ties
            matched.sort_by(|a, b| self.compare(a, b));
        }
        let paged = matched.into_iter().skip(self.offset);
        match self.limit {
            Some(limit) => paged.take(limit).collect(),
            None => paged.collect(),
        }
    }
}
