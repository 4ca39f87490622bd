//! Test record shared between the runner and the fixture

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::core::{Annotation, StepRecord, TaskGroup};

/// What the runner knows about the running test
#[derive(Debug)]
pub struct TestInfo {
    test_id: String,
    title_path: Vec<String>,
    annotations: Mutex<Vec<Annotation>>,
    steps: Mutex<Vec<StepRecord>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl TestInfo {
    /// `title_path` runs from the outermost suite to the test title
    pub fn new<I, S>(test_id: impl Into<String>, title_path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            test_id: test_id.into(),
            title_path: title_path.into_iter().map(Into::into).collect(),
            annotations: Mutex::new(Vec::new()),
            steps: Mutex::new(Vec::new()),
        }
    }

    pub fn test_id(&self) -> &str {
        &self.test_id
    }

    pub fn title_path(&self) -> &[String] {
        &self.title_path
    }

    pub fn task_group(&self) -> TaskGroup {
        TaskGroup::from_title_path(&self.title_path)
    }

    /// Snapshot of the annotations in insertion order
    pub fn annotations(&self) -> Vec<Annotation> {
        lock(&self.annotations).clone()
    }

    /// First annotation of the given kind
    pub fn annotation(&self, kind: &str) -> Option<Annotation> {
        lock(&self.annotations)
            .iter()
            .find(|a| a.kind == kind)
            .cloned()
    }

    pub fn push_annotation(&self, annotation: Annotation) {
        lock(&self.annotations).push(annotation);
    }

    /// Replace the description of the first annotation of `kind`, or append one
    pub fn upsert_annotation(&self, kind: &str, description: impl Into<String>) {
        let description = description.into();
        let mut annotations = lock(&self.annotations);
        match annotations.iter_mut().find(|a| a.kind == kind) {
            Some(existing) => existing.description = Some(description),
            None => annotations.push(Annotation::new(kind, description)),
        }
    }

    pub fn steps(&self) -> Vec<StepRecord> {
        lock(&self.steps).clone()
    }

    pub fn record_step(&self, step: StepRecord) {
        lock(&self.steps).push(step);
    }
}
