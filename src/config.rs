//! Query configuration.
//!
//! `QueryOptions` is plain data with serde support so callers can keep it in
//! a JSON file next to their scripts. Missing keys take their defaults.

use crate::result_error::ResultSieveError;

/// What happens when one entity of a query cannot be reduced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureMode {
    /// Record the failure next to the rows of the other entities.
    #[default]
    Collect,
    /// Fail the whole query on the first entity failure.
    Abort,
}

/// Row order of query results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelOrder {
    /// Order in which the set declares its members.
    #[default]
    Declaration,
    /// Ascending node/element label.
    Ascending,
}

/// Options shared by every query of a [`ResultQuery`](crate::query::ResultQuery).
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct QueryOptions {
    pub failure_mode: FailureMode,
    pub label_order: LabelOrder,
    /// Upper-case set and field names before lookup.
    pub normalize_names: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            failure_mode: FailureMode::Collect,
            label_order: LabelOrder::Declaration,
            normalize_names: true,
        }
    }
}

impl QueryOptions {
    /// Parses options from JSON text.
    ///
    /// ```rust
    /// use result_sieve::config::{FailureMode, QueryOptions};
    /// let opts = QueryOptions::from_json_str(r#"{ "failure_mode": "abort" }"#).unwrap();
    /// assert_eq!(opts.failure_mode, FailureMode::Abort);
    /// assert!(opts.normalize_names);
    /// ```
    pub fn from_json_str(text: &str) -> Result<Self, ResultSieveError> {
        serde_json::from_str(text)
            .map_err(|e| ResultSieveError::MeshIoParse(format!("invalid query options: {e}")))
    }

    /// Applies the naming convention to a set or field name.
    pub fn normalize(&self, name: &str) -> String {
        if self.normalize_names {
            name.trim().to_ascii_uppercase()
        } else {
            name.to_string()
        }
    }
}
