//! Query model and evaluation shared by the store backends.

use std::cmp::Ordering;

use serde_json::Value;

use super::Snapshot;
use crate::path::{CollectionPath, DocPath};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Filter {
    /// A document matches only if the field exists and holds a value of the
    /// same JSON type as the filter value.
    pub fn matches(&self, doc: &Value) -> bool {
        let Some(actual) = field_value(doc, &self.field) else {
            return false;
        };
        if type_rank(actual) != type_rank(&self.value) {
            return false;
        }
        let ord = compare_values(actual, &self.value);
        match self.op {
            FilterOp::Eq => ord == Ordering::Equal,
            FilterOp::Lt => ord == Ordering::Less,
            FilterOp::Le => ord != Ordering::Greater,
            FilterOp::Gt => ord == Ordering::Greater,
            FilterOp::Ge => ord != Ordering::Less,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// Opaque position of a snapshot within an ordered query.
///
/// Holds the snapshot's order-by values and its document ID; `start_after`
/// resumes strictly after this position.
#[derive(Debug, Clone, PartialEq)]
pub struct Cursor {
    values: Vec<Value>,
    id: String,
}

impl Cursor {
    pub(crate) fn at(snapshot: &Snapshot, order_by: &[OrderBy]) -> Self {
        Self {
            values: order_by
                .iter()
                .map(|o| field_value(&snapshot.data, &o.field).cloned().unwrap_or(Value::Null))
                .collect(),
            id: snapshot.id().to_string(),
        }
    }

    pub fn document_id(&self) -> &str {
        &self.id
    }
}

/// A query over the documents directly inside one collection.
///
/// Without `order_by`, results come back in document-ID order.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: CollectionPath,
    pub filters: Vec<Filter>,
    pub order_by: Vec<OrderBy>,
    pub limit: Option<usize>,
    pub start_after: Option<Cursor>,
}

impl Query {
    pub fn new(collection: CollectionPath) -> Self {
        Self {
            collection,
            filters: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            start_after: None,
        }
    }

    pub fn filter(mut self, field: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            field: field.into(),
            op,
            value: value.into(),
        });
        self
    }

    pub fn where_eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(field, FilterOp::Eq, value)
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by.push(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn start_after(mut self, cursor: Option<Cursor>) -> Self {
        self.start_after = cursor;
        self
    }

    /// Compares two snapshots by this query's ordering, ties broken by
    /// document ID in the direction of the last order-by clause.
    fn compare(&self, a_values: &[Value], a_id: &str, b_values: &[Value], b_id: &str) -> Ordering {
        for (i, order) in self.order_by.iter().enumerate() {
            let null = Value::Null;
            let a = a_values.get(i).unwrap_or(&null);
            let b = b_values.get(i).unwrap_or(&null);
            let ord = compare_values(a, b);
            if ord != Ordering::Equal {
                return apply_direction(ord, order.direction);
            }
        }
        let tie_direction = self.order_by.last().map(|o| o.direction).unwrap_or_default();
        apply_direction(a_id.cmp(b_id), tie_direction)
    }
}

fn apply_direction(ord: Ordering, direction: Direction) -> Ordering {
    match direction {
        Direction::Asc => ord,
        Direction::Desc => ord.reverse(),
    }
}

/// Evaluates `query` over a set of documents.
///
/// Documents outside the query's collection are ignored, so backends may
/// pass a superset.
pub fn evaluate<I>(query: &Query, docs: I) -> Vec<Snapshot>
where
    I: IntoIterator<Item = (DocPath, Value)>,
{
    let mut rows: Vec<(Vec<Value>, Snapshot)> = docs
        .into_iter()
        .filter(|(path, _)| query.collection.contains(path))
        .filter(|(_, data)| query.filters.iter().all(|f| f.matches(data)))
        .map(|(path, data)| {
            let snapshot = Snapshot { path, data };
            (snapshot.cursor(&query.order_by).values, snapshot)
        })
        .collect();

    rows.sort_by(|(a_values, a), (b_values, b)| query.compare(a_values, a.id(), b_values, b.id()));

    let after = query.start_after.as_ref();
    let results = rows.into_iter().filter(|(values, snapshot)| match after {
        Some(cursor) => {
            query.compare(values, snapshot.id(), &cursor.values, &cursor.id) == Ordering::Greater
        }
        None => true,
    });

    match query.limit {
        Some(limit) => results.take(limit).map(|(_, s)| s).collect(),
        None => results.map(|(_, s)| s).collect(),
    }
}

/// Reads a top-level field, or a nested one with dotted notation.
fn field_value<'a>(doc: &'a Value, field: &str) -> Option<&'a Value> {
    field
        .split('.')
        .try_fold(doc, |value, key| value.as_object()?.get(key))
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Total order over JSON values: null < bool < number < string < array <
/// object, then by value within a type.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => {
            for (xa, ya) in x.iter().zip(y.iter()) {
                let ord = compare_values(xa, ya);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        (Value::Object(x), Value::Object(y)) => {
            Value::Object(x.clone()).to_string().cmp(&Value::Object(y.clone()).to_string())
        }
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn collection() -> CollectionPath {
        CollectionPath::parse("users/u1/sets").unwrap()
    }

    fn docs() -> Vec<(DocPath, Value)> {
        vec![
            (collection().doc("a").unwrap(), json!({"n": 3, "lunch": true})),
            (collection().doc("b").unwrap(), json!({"n": 1, "lunch": false})),
            (collection().doc("c").unwrap(), json!({"n": 2, "lunch": true})),
            (collection().doc("d").unwrap(), json!({"n": 2})),
            (
                CollectionPath::parse("users/u2/sets").unwrap().doc("e").unwrap(),
                json!({"n": 0}),
            ),
        ]
    }

    fn ids(snapshots: &[Snapshot]) -> Vec<&str> {
        snapshots.iter().map(|s| s.id()).collect()
    }

    #[test]
    fn test_default_order_is_document_id() {
        let results = evaluate(&Query::new(collection()), docs());
        assert_eq!(ids(&results), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_order_desc_with_id_tiebreak() {
        let query = Query::new(collection()).order_by("n", Direction::Desc);
        let results = evaluate(&query, docs());
        assert_eq!(ids(&results), vec!["a", "d", "c", "b"]);
    }

    #[test]
    fn test_filter_requires_field_and_type() {
        let query = Query::new(collection()).where_eq("lunch", true);
        assert_eq!(ids(&evaluate(&query, docs())), vec!["a", "c"]);

        let query = Query::new(collection()).where_eq("lunch", "true");
        assert!(evaluate(&query, docs()).is_empty());

        let query = Query::new(collection()).filter("n", FilterOp::Ge, 2);
        assert_eq!(ids(&evaluate(&query, docs())), vec!["a", "c", "d"]);
    }

    #[test]
    fn test_start_after_cursor() {
        let query = Query::new(collection())
            .order_by("n", Direction::Desc)
            .limit(2);
        let first = evaluate(&query, docs());
        assert_eq!(ids(&first), vec!["a", "d"]);

        let cursor = first.last().map(|s| s.cursor(&query.order_by));
        let second = evaluate(&query.clone().start_after(cursor), docs());
        assert_eq!(ids(&second), vec!["c", "b"]);
    }

    #[test]
    fn test_dotted_field() {
        let coll = collection();
        let docs = vec![
            (coll.doc("x").unwrap(), json!({"food": {"name": "Rice"}})),
            (coll.doc("y").unwrap(), json!({"food": {"name": "Natto"}})),
        ];
        let query = Query::new(coll).where_eq("food.name", "Natto");
        assert_eq!(ids(&evaluate(&query, docs)), vec!["y"]);
    }

    #[test]
    fn test_compare_values_across_types() {
        assert_eq!(compare_values(&json!(null), &json!(false)), Ordering::Less);
        assert_eq!(compare_values(&json!(10), &json!("1")), Ordering::Less);
        assert_eq!(compare_values(&json!(1.5), &json!(1)), Ordering::Greater);
    }
}
