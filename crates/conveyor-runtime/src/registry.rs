use std::collections::HashMap;

use conveyor_core::{ConveyorConfig, ConveyorError, Executor, ExportType, JobType, Result};

/// Immutable job-type to executor mapping.
///
/// Built exactly once per worker from the registered export-type
/// definitions and fully populated before any dispatch occurs. No mutating
/// method exists, so concurrent reads need no locking.
#[derive(Debug)]
pub struct ExecutorRegistry {
    executors: HashMap<JobType, Executor>,
}

impl ExecutorRegistry {
    /// Build the registry by invoking each definition's executor factory
    /// with the shared server configuration.
    ///
    /// Fails with [`ConveyorError::DuplicateJobType`] when two definitions
    /// claim the same job type. That is a startup-time configuration fault
    /// and must prevent the worker from being registered at all.
    pub fn build(config: &ConveyorConfig, export_types: &[Box<dyn ExportType>]) -> Result<Self> {
        let mut executors = HashMap::with_capacity(export_types.len());

        for export_type in export_types {
            let job_type = export_type.job_type();
            let executor = export_type.build_executor(config);

            if executors.insert(job_type.clone(), executor).is_some() {
                return Err(ConveyorError::DuplicateJobType(job_type));
            }

            tracing::debug!(job_type = %job_type, "Registered job executor");
        }

        Ok(Self { executors })
    }

    /// Resolve the executor registered for a job type.
    ///
    /// Fails with [`ConveyorError::UnknownJobType`]; callers surface this
    /// through the execution-error path rather than swallowing it.
    pub fn resolve(&self, job_type: &JobType) -> Result<&Executor> {
        self.executors
            .get(job_type)
            .ok_or_else(|| ConveyorError::UnknownJobType {
                job_type: job_type.clone(),
                job_id: None,
            })
    }

    /// Check whether a job type is registered.
    pub fn contains(&self, job_type: &JobType) -> bool {
        self.executors.contains_key(job_type)
    }

    /// Registered job types.
    pub fn job_types(&self) -> impl Iterator<Item = &JobType> {
        self.executors.keys()
    }

    /// Number of registered executors.
    pub fn len(&self) -> usize {
        self.executors.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.executors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conveyor_core::Executor;
    use serde_json::json;

    struct StaticExport {
        job_type: &'static str,
    }

    impl ExportType for StaticExport {
        fn job_type(&self) -> JobType {
            JobType::new(self.job_type)
        }

        fn build_executor(&self, _config: &ConveyorConfig) -> Executor {
            let job_type = self.job_type;
            Executor::queued(move |_, _, _| async move { Ok(json!({ "by": job_type })) })
        }
    }

    fn exports(types: &[&'static str]) -> Vec<Box<dyn ExportType>> {
        types
            .iter()
            .map(|t| Box::new(StaticExport { job_type: t }) as Box<dyn ExportType>)
            .collect()
    }

    #[test]
    fn test_build_and_resolve() {
        let registry =
            ExecutorRegistry::build(&ConveyorConfig::default(), &exports(&["pdf", "csv"]))
                .unwrap();

        assert_eq!(registry.len(), 2);
        assert!(registry.contains(&JobType::new("pdf")));
        assert!(registry.resolve(&JobType::new("csv")).is_ok());
    }

    #[test]
    fn test_resolve_unknown_type_fails() {
        let registry =
            ExecutorRegistry::build(&ConveyorConfig::default(), &exports(&["pdf"])).unwrap();

        let err = registry.resolve(&JobType::new("png")).unwrap_err();
        assert!(matches!(
            err,
            ConveyorError::UnknownJobType { job_type, job_id: None } if job_type.as_str() == "png"
        ));
    }

    #[test]
    fn test_duplicate_job_type_rejected_at_build() {
        let err = ExecutorRegistry::build(
            &ConveyorConfig::default(),
            &exports(&["pdf", "csv", "pdf"]),
        )
        .unwrap_err();

        assert!(matches!(
            err,
            ConveyorError::DuplicateJobType(job_type) if job_type.as_str() == "pdf"
        ));
    }

    #[test]
    fn test_empty_registry() {
        let registry = ExecutorRegistry::build(&ConveyorConfig::default(), &[]).unwrap();
        assert!(registry.is_empty());
        assert_eq!(registry.job_types().count(), 0);
    }
}
