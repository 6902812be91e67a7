//! Backend-neutral query description
//!
//! A `Query` is a conjunction of field conditions plus ordering and limit.
//! The memory store evaluates it directly against JSON records; the Mongo
//! store translates it into a filter document and find options.

use serde::Serialize;
use serde_json::Value;
use std::cmp::Ordering;

/// A single field condition
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(String, Value),
    Ne(String, Value),
    Lt(String, Value),
    Gte(String, Value),
    /// Case-insensitive substring match on a string field
    Contains(String, String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub conditions: Vec<Condition>,
    pub sort: Vec<(String, SortOrder)>,
    pub limit: Option<usize>,
}

fn to_json(value: impl Serialize) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: &str, value: impl Serialize) -> Self {
        self.conditions.push(Condition::Eq(field.to_string(), to_json(value)));
        self
    }

    /// Add an equality condition only when a value is given
    pub fn eq_opt<T: Serialize>(self, field: &str, value: Option<T>) -> Self {
        match value {
            Some(v) => self.eq(field, v),
            None => self,
        }
    }

    pub fn ne(mut self, field: &str, value: impl Serialize) -> Self {
        self.conditions.push(Condition::Ne(field.to_string(), to_json(value)));
        self
    }

    pub fn lt(mut self, field: &str, value: impl Serialize) -> Self {
        self.conditions.push(Condition::Lt(field.to_string(), to_json(value)));
        self
    }

    pub fn gte(mut self, field: &str, value: impl Serialize) -> Self {
        self.conditions.push(Condition::Gte(field.to_string(), to_json(value)));
        self
    }

    pub fn contains(mut self, field: &str, needle: &str) -> Self {
        self.conditions
            .push(Condition::Contains(field.to_string(), needle.to_string()));
        self
    }

    pub fn sort_by(mut self, field: &str, order: SortOrder) -> Self {
        self.sort.push((field.to_string(), order));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether a record satisfies every condition
    pub fn matches(&self, record: &Value) -> bool {
        self.conditions.iter().all(|condition| match condition {
            Condition::Eq(field, value) => field_value(record, field) == value,
            Condition::Ne(field, value) => field_value(record, field) != value,
            Condition::Lt(field, value) => {
                compare_present(field_value(record, field), value) == Some(Ordering::Less)
            }
            Condition::Gte(field, value) => matches!(
                compare_present(field_value(record, field), value),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Condition::Contains(field, needle) => match field_value(record, field) {
                Value::String(s) => s.to_lowercase().contains(&needle.to_lowercase()),
                _ => false,
            },
        })
    }

    /// Order records by the sort keys, falling back to `id`
    pub fn compare(&self, a: &Value, b: &Value) -> Ordering {
        for (field, order) in &self.sort {
            let ord = compare_values(field_value(a, field), field_value(b, field));
            let ord = match order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        compare_values(field_value(a, "id"), field_value(b, "id"))
    }
}

static NULL: Value = Value::Null;

fn field_value<'a>(record: &'a Value, field: &str) -> &'a Value {
    record.get(field).unwrap_or(&NULL)
}

/// Ordering between two non-null values of the same kind
fn compare_present(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn type_rank(v: &Value) -> u8 {
    match v {
        Value::Null => 0,
        Value::Number(_) => 1,
        Value::String(_) => 2,
        Value::Object(_) => 3,
        Value::Array(_) => 4,
        Value::Bool(_) => 5,
    }
}

/// Total order used for sorting: nulls first, then numbers, then strings
fn compare_values(a: &Value, b: &Value) -> Ordering {
    compare_present(a, b).unwrap_or_else(|| type_rank(a).cmp(&type_rank(b)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_conditions() {
        let record = json!({"id": 3, "status": "open", "score": 6, "area": "Treasury Ops", "due": "2026-01-31"});

        assert!(Query::new().eq("status", "open").matches(&record));
        assert!(!Query::new().eq("status", "closed").matches(&record));
        assert!(Query::new().ne("status", "closed").matches(&record));
        assert!(Query::new().gte("score", 6).lt("score", 7).matches(&record));
        assert!(!Query::new().lt("score", 6).matches(&record));
        assert!(Query::new().contains("area", "treasury").matches(&record));
        assert!(Query::new().lt("due", "2026-02-01").matches(&record));
        assert!(Query::new().eq("missing", Value::Null).matches(&record));
        assert!(!Query::new().lt("missing", 10).matches(&record));
    }

    #[test]
    fn test_eq_opt_skips_none() {
        let query = Query::new().eq_opt::<i64>("year", None).eq_opt("plan", Some(2));
        assert_eq!(query.conditions.len(), 1);
    }

    #[test]
    fn test_sorting_with_id_tiebreak() {
        let mut records = vec![
            json!({"id": 1, "score": 3}),
            json!({"id": 2, "score": 9}),
            json!({"id": 3, "score": 3}),
            json!({"id": 4}),
        ];
        let query = Query::new().sort_by("score", SortOrder::Desc);
        records.sort_by(|a, b| query.compare(a, b));
        let ids: Vec<i64> = records.iter().map(|r| r["id"].as_i64().unwrap()).collect();
        assert_eq!(ids, vec![2, 1, 3, 4]);
    }
}
