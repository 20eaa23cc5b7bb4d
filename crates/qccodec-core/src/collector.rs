//! Write-once collection of parsed values.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{CollectorError, DecodeError};
use crate::models::{CalcType, Results};

/// Nested, insertion-ordered mapping of parsed values.
///
/// Every path can be written exactly once. Intermediate tables are created
/// on demand.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DataCollector {
    data: Map<String, Value>,
}

impl DataCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write `value` at `path`.
    pub fn add<S: AsRef<str>>(&mut self, path: &[S], value: Value) -> Result<(), CollectorError> {
        let (last, parents) = path.split_last().ok_or(CollectorError::EmptyPath)?;

        let mut table = &mut self.data;
        for (depth, segment) in parents.iter().enumerate() {
            let entry = table
                .entry(segment.as_ref().to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            table = match entry {
                Value::Object(map) => map,
                _ => {
                    return Err(CollectorError::NotATable {
                        path: join(&path[..=depth]),
                    });
                }
            };
        }

        if table.contains_key(last.as_ref()) {
            return Err(CollectorError::Conflict { path: join(path) });
        }
        table.insert(last.as_ref().to_string(), value);
        Ok(())
    }

    /// Value at `path`, if written.
    pub fn get<S: AsRef<str>>(&self, path: &[S]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        rest.iter()
            .try_fold(self.data.get(first.as_ref())?, |value, segment| {
                value.as_object()?.get(segment.as_ref())
            })
    }

    pub fn contains<S: AsRef<str>>(&self, path: &[S]) -> bool {
        self.get(path).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The collected mapping.
    pub fn into_inner(self) -> Map<String, Value> {
        self.data
    }

    /// Build the typed result for `calc_type`.
    pub fn into_results(self, calc_type: CalcType) -> Result<Results, DecodeError> {
        Results::from_collected(calc_type, self.data)
    }
}

fn join<S: AsRef<str>>(path: &[S]) -> String {
    path.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(".")
}
