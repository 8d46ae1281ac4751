//! Parses and evaluates wire filters against record tags.

use serde_json::{Map, Value};

use crate::error::{VaultQueryResult, WalletError};
use crate::records::types::Tags;

const UNENCRYPTED_PREFIX: char = '~';

/// A parsed filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum TagQuery {
    And(Vec<TagQuery>),
    Or(Vec<TagQuery>),
    Not(Box<TagQuery>),
    Tag { name: String, predicate: Predicate },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Predicate {
    Eq(String),
    Neq(String),
    Gt(String),
    Gte(String),
    Lt(String),
    Lte(String),
    Like(String),
    In(Vec<String>),
}

impl Predicate {
    /// Only exact matching works on encrypted tag values.
    const fn allowed_on_encrypted(&self) -> bool {
        matches!(self, Self::Eq(_) | Self::Neq(_) | Self::In(_))
    }

    fn matches(&self, actual: &str) -> bool {
        match self {
            Self::Eq(expected) => actual == expected,
            Self::Neq(expected) => actual != expected,
            Self::Gt(bound) => actual > bound.as_str(),
            Self::Gte(bound) => actual >= bound.as_str(),
            Self::Lt(bound) => actual < bound.as_str(),
            Self::Lte(bound) => actual <= bound.as_str(),
            Self::Like(pattern) => {
                let pattern: Vec<char> = pattern.chars().collect();
                let actual: Vec<char> = actual.chars().collect();
                like(&pattern, &actual)
            }
            Self::In(values) => values.iter().any(|value| value == actual),
        }
    }
}

impl TagQuery {
    /// Parses the JSON rendering of a filter.
    ///
    /// Fails with `Wallet(QueryError)` for malformed filters and for range or
    /// pattern operators on encrypted tags.
    pub(super) fn parse(query_json: &str) -> VaultQueryResult<Self> {
        let value: Value = serde_json::from_str(query_json).map_err(|err| {
            log::debug!("filter is not valid JSON: {err}");
            WalletError::QueryError
        })?;
        match value {
            Value::Object(map) => Ok(Self::from_map(&map)?),
            _ => Err(WalletError::QueryError.into()),
        }
    }

    /// Whether a record carrying `tags` satisfies the filter. A missing tag
    /// satisfies no predicate.
    pub(super) fn matches(&self, tags: &Tags) -> bool {
        match self {
            Self::And(children) => children.iter().all(|child| child.matches(tags)),
            Self::Or(children) => children.iter().any(|child| child.matches(tags)),
            Self::Not(child) => !child.matches(tags),
            Self::Tag { name, predicate } => tags
                .get(name)
                .is_some_and(|actual| predicate.matches(actual)),
        }
    }

    // Sibling keys of one mapping are conjoined.
    fn from_map(map: &Map<String, Value>) -> Result<Self, WalletError> {
        let mut clauses = map
            .iter()
            .map(|(key, value)| Self::from_entry(key, value))
            .collect::<Result<Vec<_>, _>>()?;
        if clauses.len() == 1 {
            return Ok(clauses.remove(0));
        }
        Ok(Self::And(clauses))
    }

    fn from_entry(key: &str, value: &Value) -> Result<Self, WalletError> {
        match key {
            "$and" => Ok(Self::And(Self::from_list(value)?)),
            "$or" => Ok(Self::Or(Self::from_list(value)?)),
            "$not" => match value {
                Value::Object(map) => Ok(Self::Not(Box::new(Self::from_map(map)?))),
                _ => Err(WalletError::QueryError),
            },
            name if name.starts_with('$') => Err(WalletError::QueryError),
            name => {
                let predicate = Predicate::from_value(value)?;
                if !name.starts_with(UNENCRYPTED_PREFIX) && !predicate.allowed_on_encrypted() {
                    log::debug!("operator not supported on encrypted tag `{name}`");
                    return Err(WalletError::QueryError);
                }
                Ok(Self::Tag {
                    name: name.to_owned(),
                    predicate,
                })
            }
        }
    }

    fn from_list(value: &Value) -> Result<Vec<Self>, WalletError> {
        let Value::Array(items) = value else {
            return Err(WalletError::QueryError);
        };
        items
            .iter()
            .map(|item| match item {
                Value::Object(map) => Self::from_map(map),
                _ => Err(WalletError::QueryError),
            })
            .collect()
    }
}

impl Predicate {
    fn from_value(value: &Value) -> Result<Self, WalletError> {
        let operator = match value {
            Value::String(expected) => return Ok(Self::Eq(expected.clone())),
            Value::Object(operator) if operator.len() == 1 => operator,
            _ => return Err(WalletError::QueryError),
        };
        let Some((keyword, operand)) = operator.iter().next() else {
            return Err(WalletError::QueryError);
        };
        if keyword == "$in" {
            let Value::Array(values) = operand else {
                return Err(WalletError::QueryError);
            };
            return values
                .iter()
                .map(|value| value.as_str().map(str::to_owned))
                .collect::<Option<Vec<_>>>()
                .map(Self::In)
                .ok_or(WalletError::QueryError);
        }
        let Value::String(operand) = operand else {
            return Err(WalletError::QueryError);
        };
        let operand = operand.clone();
        match keyword.as_str() {
            "$eq" => Ok(Self::Eq(operand)),
            "$neq" => Ok(Self::Neq(operand)),
            "$gt" => Ok(Self::Gt(operand)),
            "$gte" => Ok(Self::Gte(operand)),
            "$lt" => Ok(Self::Lt(operand)),
            "$lte" => Ok(Self::Lte(operand)),
            "$like" => Ok(Self::Like(operand)),
            _ => Err(WalletError::QueryError),
        }
    }
}

/// SQL `LIKE`: `%` matches any run of characters, `_` exactly one. ASCII
/// letters match regardless of case, as in SQLite.
///
/// Backtracks only to the most recent `%`, so the cost is bounded by
/// `pattern.len() * text.len()`.
fn like(pattern: &[char], text: &[char]) -> bool {
    let (mut p, mut t) = (0, 0);
    // Pattern position after the last `%` and the text position it resumes from.
    let mut resume: Option<(usize, usize)> = None;
    while t < text.len() {
        match pattern.get(p).copied() {
            Some('%') => {
                p += 1;
                resume = Some((p, t));
            }
            Some(expected) if expected == '_' || expected.eq_ignore_ascii_case(&text[t]) => {
                p += 1;
                t += 1;
            }
            _ => match resume {
                Some((after_wildcard, from)) => {
                    p = after_wildcard;
                    t = from + 1;
                    resume = Some((after_wildcard, t));
                }
                None => return false,
            },
        }
    }
    pattern[p..].iter().all(|&c| c == '%')
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use test_case::test_case;

    use super::*;
    use crate::error::ErrorKind;
    use crate::query::{compile, Expression};

    fn tags(pairs: &[(&str, &str)]) -> Tags {
        pairs
            .iter()
            .map(|(name, value)| ((*name).to_string(), (*value).to_string()))
            .collect()
    }

    fn matches(expression: &Expression, tags: &Tags) -> bool {
        TagQuery::parse(&compile(expression).to_json())
            .unwrap()
            .matches(tags)
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let query = TagQuery::parse("{}").unwrap();
        assert_eq!(query, TagQuery::And(vec![]));
        assert!(query.matches(&Tags::new()));
    }

    #[test]
    fn test_sibling_keys_are_conjoined() {
        let query = TagQuery::parse(r#"{"~a":"1","~b":"2"}"#).unwrap();
        assert!(query.matches(&tags(&[("~a", "1"), ("~b", "2")])));
        assert!(!query.matches(&tags(&[("~a", "1"), ("~b", "3")])));
    }

    #[test_case("abc", "abc", true)]
    #[test_case("a%", "abc", true)]
    #[test_case("%c", "abc", true)]
    #[test_case("%b%", "abc", true)]
    #[test_case("a_c", "abc", true)]
    #[test_case("a_c", "ac", false)]
    #[test_case("%", "", true)]
    #[test_case("_", "", false)]
    #[test_case("ab", "abc", false)]
    #[test_case("ABC", "abc", true)]
    #[test_case("a%C", "AbC", true)]
    #[test_case("é", "É", false)]
    #[test_case("%%", "x", true)]
    #[test_case("a%b%c", "aXbYc", true)]
    #[test_case("a%b%c", "aXcYb", false)]
    fn test_like(pattern: &str, text: &str, expected: bool) {
        let pattern: Vec<char> = pattern.chars().collect();
        let text: Vec<char> = text.chars().collect();
        assert_eq!(like(&pattern, &text), expected);
    }

    #[test]
    fn test_like_with_many_wildcards_is_not_exponential() {
        let pattern: Vec<char> = "%a%a%a%a%a%a%a%a%a%a%b".chars().collect();
        let text: Vec<char> = "a".repeat(200).chars().collect();
        let started = Instant::now();
        assert!(!like(&pattern, &text));

        let text: Vec<char> = format!("{}b", "a".repeat(200)).chars().collect();
        assert!(like(&pattern, &text));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_operators_compare_as_strings() {
        let record = tags(&[("~score", "20")]);
        assert!(matches(&Expression::greater("~score", "10"), &record));
        assert!(matches(&Expression::greater_equal("~score", "20"), &record));
        assert!(!matches(&Expression::less("~score", "100"), &record));
        assert!(matches(&Expression::less_equal("~score", "20"), &record));
        assert!(matches(&Expression::unequal("~score", "2"), &record));
        assert!(matches(&Expression::in_set("~score", ["1", "20"]), &record));
        assert!(matches(&Expression::like("~score", "2%"), &record));
    }

    #[test]
    fn test_missing_tag_satisfies_no_predicate() {
        let record = tags(&[("other", "x")]);
        assert!(!matches(&Expression::equal("name", "x"), &record));
        assert!(!matches(&Expression::unequal("name", "x"), &record));
        assert!(matches(&Expression::not(Expression::equal("name", "x")), &record));
    }

    #[test]
    fn test_boolean_composition() {
        let record = tags(&[("~status", "active"), ("tier", "gold")]);
        let expression = Expression::or([
            Expression::equal("~status", "retired"),
            Expression::and([
                Expression::equal("tier", "gold"),
                Expression::not(Expression::equal("~status", "blocked")),
            ]),
        ]);
        assert!(matches(&expression, &record));
        assert!(!matches(&Expression::not(Expression::True), &record));
    }

    #[test_case(Expression::greater("secret", "1"))]
    #[test_case(Expression::less_equal("secret", "1"))]
    #[test_case(Expression::like("secret", "%"))]
    fn test_range_on_encrypted_tag_is_rejected(expression: Expression) {
        let result = TagQuery::parse(&compile(&expression).to_json());
        assert_eq!(result, Err(ErrorKind::Wallet(WalletError::QueryError)));
    }

    #[test]
    fn test_exact_match_on_encrypted_tag_is_allowed() {
        let record = tags(&[("secret", "1")]);
        assert!(matches(&Expression::equal("secret", "1"), &record));
        assert!(matches(&Expression::unequal("secret", "2"), &record));
        assert!(matches(&Expression::in_set("secret", ["1"]), &record));
    }

    #[test_case("[]")]
    #[test_case("not json")]
    #[test_case(r#"{"$and":{}}"#)]
    #[test_case(r#"{"$not":[]}"#)]
    #[test_case(r#"{"$xor":[]}"#)]
    #[test_case(r#"{"~a":1}"#)]
    #[test_case(r#"{"~a":{"$gt":"1","$lt":"2"}}"#)]
    #[test_case(r#"{"~a":{"$in":"1"}}"#)]
    #[test_case(r#"{"~a":{"$in":[1]}}"#)]
    #[test_case(r#"{"~a":{"$between":"1"}}"#)]
    fn test_malformed_filters_are_rejected(query: &str) {
        assert_eq!(
            TagQuery::parse(query),
            Err(ErrorKind::Wallet(WalletError::QueryError))
        );
    }
}
