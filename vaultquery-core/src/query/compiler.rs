//! Renders [`Expression`] trees into the store's nested-map query language.
//!
//! ```text
//! True, And([]), Or([])    -> {}
//! And([a, b])              -> {"$and": [a, b]}
//! Not(a)                   -> {"$not": a}
//! Compare(f, Eq, v)        -> {f: v}
//! Compare(f, Gte, v)       -> {f: {"$gte": v}}
//! InSet(f, [v, w])         -> {f: {"$in": [v, w]}}
//! ```

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use super::expression::{ComparisonOp, Expression};

const AND: &str = "$and";
const OR: &str = "$or";
const NOT: &str = "$not";

/// A compiled filter, ready to be handed to the record store.
///
/// Keys are kept in lexicographic order, so rendering the same expression
/// always yields the same bytes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct CompiledFilter(Map<String, Value>);

impl CompiledFilter {
    /// Borrow the top-level mapping.
    #[must_use]
    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// `true` for the filter that matches every record.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Wire rendering of the filter.
    #[must_use]
    pub fn to_json(&self) -> String {
        Value::Object(self.0.clone()).to_string()
    }

    fn single(key: impl Into<String>, value: Value) -> Self {
        let mut map = Map::new();
        map.insert(key.into(), value);
        Self(map)
    }

    fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl fmt::Display for CompiledFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json())
    }
}

impl From<&Expression> for CompiledFilter {
    fn from(expression: &Expression) -> Self {
        compile(expression)
    }
}

/// Compiles `expression` into its canonical filter. Never fails.
#[must_use]
pub fn compile(expression: &Expression) -> CompiledFilter {
    match expression {
        Expression::True => CompiledFilter::default(),
        Expression::And(children) => composite(AND, children),
        Expression::Or(children) => composite(OR, children),
        Expression::Not(child) => CompiledFilter::single(NOT, compile(child).into_value()),
        Expression::Compare { field, op, value } => comparison(field, *op, value),
        Expression::InSet { field, values } => in_set(field, values),
    }
}

// An empty composite is vacuously true and renders like `True`.
fn composite(keyword: &str, children: &[Expression]) -> CompiledFilter {
    if children.is_empty() {
        return CompiledFilter::default();
    }
    let rendered = children
        .iter()
        .map(|child| compile(child).into_value())
        .collect();
    CompiledFilter::single(keyword, Value::Array(rendered))
}

fn comparison(field: &str, op: ComparisonOp, value: &str) -> CompiledFilter {
    match op {
        ComparisonOp::Eq => CompiledFilter::single(field, Value::String(value.to_owned())),
        ComparisonOp::In => in_set(field, &[value.to_owned()]),
        ComparisonOp::Neq
        | ComparisonOp::Lt
        | ComparisonOp::Lte
        | ComparisonOp::Gt
        | ComparisonOp::Gte
        | ComparisonOp::Like => CompiledFilter::single(
            field,
            CompiledFilter::single(op.keyword(), Value::String(value.to_owned())).into_value(),
        ),
    }
}

fn in_set(field: &str, values: &[String]) -> CompiledFilter {
    let values = values.iter().cloned().map(Value::String).collect();
    CompiledFilter::single(
        field,
        CompiledFilter::single(ComparisonOp::In.keyword(), Value::Array(values)).into_value(),
    )
}
