//! Named metrics extracted from a status response.

use serde_json::Value;

/// Describes one metric a check knows about: its name in messages and metric lines, and the
/// prefix of the four threshold flags which configure it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MetricDef {
    pub name: &'static str,
    pub flag: &'static str,
    pub help: &'static str,
}

impl MetricDef {
    pub const fn new(name: &'static str, flag: &'static str, help: &'static str) -> Self {
        MetricDef { name, flag, help }
    }
}

/// An ordered mapping from metric name to value. A metric may be present but unset, which
/// happens when the service did not report it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MetricRecord {
    values: Vec<(String, Option<f64>)>,
}

impl MetricRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name` to `value`, replacing an earlier value but keeping its position.
    pub fn insert(&mut self, name: &str, value: Option<f64>) {
        match self.values.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value,
            None => self.values.push((name.to_owned(), value)),
        }
    }

    pub fn with(mut self, name: &str, value: Option<f64>) -> Self {
        self.insert(name, value);
        self
    }

    /// The value of `name`, None if it is unknown or unset.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| *v)
    }

    /// Iterates the set metrics in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values
            .iter()
            .filter_map(|(n, v)| v.map(|v| (n.as_str(), v)))
    }
}

/// Reads the number at `pointer` (a JSON pointer like `/queue_totals/messages`).
///
/// An absent segment, a null or a non-numeric leaf all yield None.
pub fn number_at(document: &Value, pointer: &str) -> Option<f64> {
    document.pointer(pointer).and_then(Value::as_f64)
}
