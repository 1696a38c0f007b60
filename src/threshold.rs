//! Threshold evaluation.
//!
//! A [ThresholdSet] holds up to four bounds. They are always evaluated in the same order,
//! critical before warning and minimum before maximum, and the first violated bound decides the
//! outcome. Comparisons are inclusive: a value equal to a bound violates it.

use std::fmt;

use crate::{CheckResult, ServiceState};

/// One of the four bounds of a [ThresholdSet].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bound {
    MinCritical,
    MaxCritical,
    MinWarning,
    MaxWarning,
}

impl Bound {
    /// The order in which bounds are evaluated.
    pub const EVALUATION_ORDER: [Bound; 4] = [
        Bound::MinCritical,
        Bound::MaxCritical,
        Bound::MinWarning,
        Bound::MaxWarning,
    ];

    /// The state raised when this bound is violated.
    pub fn state(&self) -> ServiceState {
        match self {
            Bound::MinCritical | Bound::MaxCritical => ServiceState::Critical,
            Bound::MinWarning | Bound::MaxWarning => ServiceState::Warning,
        }
    }

    /// Suffix of the command line flag which sets this bound, e.g. `messages-max-c`.
    pub fn flag_suffix(&self) -> &'static str {
        match self {
            Bound::MinWarning => "min-w",
            Bound::MinCritical => "min-c",
            Bound::MaxWarning => "max-w",
            Bound::MaxCritical => "max-c",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Bound::MinWarning => "min warning",
            Bound::MinCritical => "min critical",
            Bound::MaxWarning => "max warning",
            Bound::MaxCritical => "max critical",
        }
    }

    fn is_violated_by(&self, value: f64, limit: f64) -> bool {
        match self {
            Bound::MinCritical | Bound::MinWarning => value <= limit,
            Bound::MaxCritical | Bound::MaxWarning => value >= limit,
        }
    }

    fn relation(&self) -> &'static str {
        match self {
            Bound::MinCritical | Bound::MinWarning => "lower or equal than",
            Bound::MaxCritical | Bound::MaxWarning => "higher or equal than",
        }
    }
}

/// Four optional bounds for a single metric. An unset bound is not checked.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ThresholdSet {
    pub min_warning: Option<f64>,
    pub min_critical: Option<f64>,
    pub max_warning: Option<f64>,
    pub max_critical: Option<f64>,
}

impl ThresholdSet {
    /// True if no bound is set, in which case the metric is not checked at all.
    pub fn is_empty(&self) -> bool {
        Bound::EVALUATION_ORDER.iter().all(|b| self.get(*b).is_none())
    }

    pub fn get(&self, bound: Bound) -> Option<f64> {
        match bound {
            Bound::MinWarning => self.min_warning,
            Bound::MinCritical => self.min_critical,
            Bound::MaxWarning => self.max_warning,
            Bound::MaxCritical => self.max_critical,
        }
    }

    pub fn set(&mut self, bound: Bound, limit: Option<f64>) {
        let slot = match bound {
            Bound::MinWarning => &mut self.min_warning,
            Bound::MinCritical => &mut self.min_critical,
            Bound::MaxWarning => &mut self.max_warning,
            Bound::MaxCritical => &mut self.max_critical,
        };
        *slot = limit;
    }

    /// Returns the first bound violated by `value`, or None if the value passes.
    pub fn check(&self, value: f64) -> Option<Violation> {
        Bound::EVALUATION_ORDER.iter().find_map(|bound| {
            self.get(*bound)
                .filter(|limit| bound.is_violated_by(value, *limit))
                .map(|limit| Violation {
                    bound: *bound,
                    value,
                    limit,
                })
        })
    }
}

/// A value which crossed one of the bounds of a [ThresholdSet].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Violation {
    pub bound: Bound,
    pub value: f64,
    pub limit: f64,
}

impl Violation {
    pub fn state(&self) -> ServiceState {
        self.bound.state()
    }

    /// Builds the result reported for this violation of `metric`. `context` names the entity
    /// the value belongs to, if any.
    pub fn to_result(&self, metric: &str, context: Option<&str>) -> CheckResult {
        let mut message = format!("metric {} = {}", metric, self);
        if let Some(context) = context {
            message.push(' ');
            message.push_str(context);
        }
        CheckResult::new(self.state(), message)
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} is {} {}",
            self.value,
            self.bound.relation(),
            self.limit
        )
    }
}

/// Evaluates a single metric value against its thresholds.
///
/// Returns None if no threshold is configured. Otherwise the result is the first violation in
/// evaluation order, or OK with the value.
///
/// ```rust
/// # #[macro_use]
/// # extern crate service_checks;
/// # use service_checks::{evaluate, ServiceState};
/// # fn main() {
/// let thresholds = thresholds![max_critical = 100];
/// let result = evaluate("queue_totals.messages.count", 120.0, &thresholds, None).unwrap();
/// assert_eq!(result.state(), ServiceState::Critical);
/// assert_eq!(
///     result.message(),
///     "metric queue_totals.messages.count = 120 is higher or equal than 100"
/// );
/// # }
/// ```
pub fn evaluate(
    metric: &str,
    value: f64,
    thresholds: &ThresholdSet,
    context: Option<&str>,
) -> Option<CheckResult> {
    if thresholds.is_empty() {
        return None;
    }

    let result = match thresholds.check(value) {
        Some(violation) => violation.to_result(metric, context),
        None => CheckResult::ok(format!("metric {} = {}", metric, value)),
    };
    Some(result)
}
