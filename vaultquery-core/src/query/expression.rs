//! Boolean filter trees over record tags.

use strum::IntoStaticStr;

/// Comparison applied between a tag and a single value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum ComparisonOp {
    /// Tag equals the value.
    Eq,
    /// Tag differs from the value.
    Neq,
    /// Tag sorts before the value.
    Lt,
    /// Tag sorts before or equal to the value.
    Lte,
    /// Tag sorts after the value.
    Gt,
    /// Tag sorts after or equal to the value.
    Gte,
    /// Tag matches the value as a SQL `LIKE` pattern (`%` and `_` wildcards).
    Like,
    /// Tag is the value. Rendered as a one-element `$in` list.
    In,
}

impl ComparisonOp {
    /// Operator keyword used on the wire, e.g. `"$gte"`.
    #[must_use]
    pub fn keyword(self) -> String {
        let name: &'static str = self.into();
        format!("${name}")
    }
}

/// A filter over the tags of stored records.
///
/// Tags whose name starts with `~` are stored unencrypted and support every
/// operator. Encrypted tags only support exact matching (`Eq`, `Neq`, `In`).
/// Names are passed to the store verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Expression {
    /// Matches every record.
    #[default]
    True,
    /// Matches when every child matches. Empty matches everything.
    And(Vec<Expression>),
    /// Matches when any child matches. Empty matches everything.
    Or(Vec<Expression>),
    /// Matches when the child does not.
    Not(Box<Expression>),
    /// Compares a tag with a single value.
    Compare {
        /// Tag name.
        field: String,
        /// Comparison to apply.
        op: ComparisonOp,
        /// Value to compare against.
        value: String,
    },
    /// Matches when the tag equals one of the values.
    InSet {
        /// Tag name.
        field: String,
        /// Accepted values, passed on unchanged (order and duplicates kept).
        values: Vec<String>,
    },
}

impl Expression {
    /// Conjunction of `children`.
    #[must_use]
    pub fn and(children: impl IntoIterator<Item = Self>) -> Self {
        Self::And(children.into_iter().collect())
    }

    /// Disjunction of `children`.
    #[must_use]
    pub fn or(children: impl IntoIterator<Item = Self>) -> Self {
        Self::Or(children.into_iter().collect())
    }

    /// Negation of `child`.
    #[must_use]
    pub fn not(child: Self) -> Self {
        Self::Not(Box::new(child))
    }

    /// `field` compared with `value` using `op`.
    #[must_use]
    pub fn compare(field: impl Into<String>, op: ComparisonOp, value: impl Into<String>) -> Self {
        Self::Compare {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    /// `field == value`.
    #[must_use]
    pub fn equal(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::compare(field, ComparisonOp::Eq, value)
    }

    /// `field != value`.
    #[must_use]
    pub fn unequal(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::compare(field, ComparisonOp::Neq, value)
    }

    /// `field < value`.
    #[must_use]
    pub fn less(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::compare(field, ComparisonOp::Lt, value)
    }

    /// `field <= value`.
    #[must_use]
    pub fn less_equal(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::compare(field, ComparisonOp::Lte, value)
    }

    /// `field > value`.
    #[must_use]
    pub fn greater(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::compare(field, ComparisonOp::Gt, value)
    }

    /// `field >= value`.
    #[must_use]
    pub fn greater_equal(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::compare(field, ComparisonOp::Gte, value)
    }

    /// `field LIKE pattern`.
    #[must_use]
    pub fn like(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::compare(field, ComparisonOp::Like, pattern)
    }

    /// `field IN values`.
    #[must_use]
    pub fn in_set<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        Self::InSet {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}
