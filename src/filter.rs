//! Restricting per-entity checks to the entities an operator cares about.

use regex::{Regex, RegexBuilder};

use crate::CheckError;

/// Something a multi-entity check evaluates on its own, e.g. a queue inside a vhost.
pub trait Entity {
    fn vhost(&self) -> &str;
    fn name(&self) -> &str;
}

/// Compiles a filter pattern. Matching is case-insensitive and anchored at the start of the
/// field, the end is left open.
pub fn compile_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(&format!("^(?:{})", pattern))
        .case_insensitive(true)
        .build()
}

/// Optional vhost and queue name patterns. An unset pattern lets everything through.
#[derive(Clone, Debug, Default)]
pub struct EntityFilter {
    vhost: Option<Regex>,
    name: Option<Regex>,
}

impl EntityFilter {
    pub fn new(vhost: Option<Regex>, name: Option<Regex>) -> Self {
        EntityFilter { vhost, name }
    }

    pub fn matches<E: Entity>(&self, entity: &E) -> bool {
        let vhost_ok = self
            .vhost
            .as_ref()
            .map_or(true, |re| re.is_match(entity.vhost()));
        let name_ok = self
            .name
            .as_ref()
            .map_or(true, |re| re.is_match(entity.name()));
        vhost_ok && name_ok
    }

    /// Keeps the matching entities, in order. Fails if none is left.
    pub fn apply<E: Entity>(&self, entities: Vec<E>) -> Result<Vec<E>, CheckError> {
        let total = entities.len();
        let kept: Vec<E> = entities.into_iter().filter(|e| self.matches(e)).collect();
        log::debug!("entity filter kept {} of {} entities", kept.len(), total);

        if kept.is_empty() {
            return Err(CheckError::NoEntities);
        }
        Ok(kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Queue(&'static str, &'static str);

    impl Entity for Queue {
        fn vhost(&self) -> &str {
            self.0
        }

        fn name(&self) -> &str {
            self.1
        }
    }

    fn queues() -> Vec<Queue> {
        vec![
            Queue("/", "jobs"),
            Queue("/", "Jobs.retry"),
            Queue("billing", "invoices"),
            Queue("staging-billing", "invoices"),
        ]
    }

    fn names(queues: &[Queue]) -> Vec<String> {
        queues.iter().map(|q| format!("{}:{}", q.0, q.1)).collect()
    }

    #[test]
    fn test_no_patterns_keeps_everything() {
        let kept = EntityFilter::default().apply(queues()).unwrap();
        assert_eq!(kept.len(), 4);
    }

    #[test]
    fn test_patterns_are_case_insensitive_and_anchored() {
        let filter = EntityFilter::new(None, Some(compile_pattern("jobs").unwrap()));
        let kept = filter.apply(queues()).unwrap();
        assert_eq!(names(&kept), vec!["/:jobs", "/:Jobs.retry"]);

        let filter = EntityFilter::new(Some(compile_pattern("billing").unwrap()), None);
        let kept = filter.apply(queues()).unwrap();
        assert_eq!(names(&kept), vec!["billing:invoices"]);
    }

    #[test]
    fn test_both_patterns_must_match() {
        let filter = EntityFilter::new(
            Some(compile_pattern("/").unwrap()),
            Some(compile_pattern("jobs\\.").unwrap()),
        );
        let kept = filter.apply(queues()).unwrap();
        assert_eq!(names(&kept), vec!["/:Jobs.retry"]);
    }

    #[test]
    fn test_empty_result_is_an_error() {
        let filter = EntityFilter::new(Some(compile_pattern("prod").unwrap()), None);
        let err = filter.apply(queues()).unwrap_err();
        assert!(matches!(err, CheckError::NoEntities));

        let err = EntityFilter::default().apply(Vec::<Queue>::new()).unwrap_err();
        assert!(matches!(err, CheckError::NoEntities));
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(compile_pattern("jobs(").is_err());
        assert!(compile_pattern("a|b").unwrap().is_match("b-queue"));
    }
}
