/// Lets you simply create a threshold set from named bounds. Bounds which are not named stay
/// unset.
/// ```rust
/// # #[macro_use]
/// # extern crate service_checks;
/// #
/// # use service_checks::ServiceState;
/// #
/// # fn main() {
/// let thresholds = thresholds![max_warning = 10, max_critical = 100.0];
/// assert_eq!(thresholds.min_critical, None);
/// assert_eq!(thresholds.max_critical, Some(100.0));
///
/// let violation = thresholds.check(10.0).unwrap();
/// assert_eq!(violation.state(), ServiceState::Warning);
/// # }
/// ```
#[macro_export]
macro_rules! thresholds {
    ($( $bound:ident = $limit:expr ), * $(,)?) => {
        {
            #[allow(unused_mut)]
            let mut t = $crate::ThresholdSet::default();
            $(
                t.$bound = Some($limit as f64);
            )*
            t
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::ThresholdSet;

    #[test]
    fn test_thresholds_macro() {
        let empty = thresholds![];
        assert_eq!(empty, ThresholdSet::default());
        assert!(empty.is_empty());

        let t = thresholds![min_critical = 1, max_warning = 2.5,];
        assert_eq!(t.min_critical, Some(1.0));
        assert_eq!(t.max_warning, Some(2.5));
        assert_eq!(t.min_warning, None);
        assert_eq!(t.max_critical, None);
    }
}
