use std::collections::HashMap;

use async_trait::async_trait;

use super::error::StorageResult;
use super::workout::{Routine, WorkoutProgram, WorkoutStore};

/// In-memory store, used for tests and for running without a storage path.
#[derive(Debug, Default, Clone)]
pub struct InMemoryWorkoutStore {
    routines: HashMap<String, Vec<Routine>>,
    programs: HashMap<String, Vec<WorkoutProgram>>,
}

impl InMemoryWorkoutStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_routine(mut self, user_id: &str, routine: Routine) -> Self {
        self.routines
            .entry(user_id.to_string())
            .or_default()
            .push(routine);
        self
    }

    #[must_use]
    pub fn with_program(mut self, user_id: &str, program: WorkoutProgram) -> Self {
        self.programs
            .entry(user_id.to_string())
            .or_default()
            .push(program);
        self
    }
}

#[async_trait]
impl WorkoutStore for InMemoryWorkoutStore {
    async fn list_routines(&self, user_id: &str) -> StorageResult<Vec<Routine>> {
        let mut routines = self.routines.get(user_id).cloned().unwrap_or_default();
        routines.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(routines)
    }

    async fn list_programs(&self, user_id: &str) -> StorageResult<Vec<WorkoutProgram>> {
        let mut programs = self.programs.get(user_id).cloned().unwrap_or_default();
        programs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(programs)
    }
}
