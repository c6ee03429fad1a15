//! Workout storage.

mod error;
mod file;
mod memory;
mod workout;

pub use error::{StorageError, StorageResult};
pub use file::FileWorkoutStore;
pub use memory::InMemoryWorkoutStore;
pub use workout::{Exercise, Routine, WorkoutProgram, WorkoutStore};
