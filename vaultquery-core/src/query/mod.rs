//! Query DSL for tag-based record search.
//!
//! Build an [`Expression`] with the helper constructors and turn it into the
//! store's filter language with [`compile`].
//!
//! ```
//! use vaultquery_core::query::{compile, Expression};
//!
//! let filter = compile(&Expression::and([
//!     Expression::equal("~status", "active"),
//!     Expression::greater_equal("~score", "10"),
//! ]));
//! assert_eq!(
//!     filter.to_json(),
//!     r#"{"$and":[{"~status":"active"},{"~score":{"$gte":"10"}}]}"#
//! );
//! ```

mod compiler;
mod expression;

pub use compiler::{compile, CompiledFilter};
pub use expression::{ComparisonOp, Expression};
