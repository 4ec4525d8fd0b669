//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod allocation_repo;
pub mod office_repo;
pub mod person_repo;
pub mod project_repo;
pub mod stage_repo;

pub use allocation_repo::AllocationRepo;
pub use office_repo::OfficeRepo;
pub use person_repo::PersonRepo;
pub use project_repo::ProjectRepo;
pub use stage_repo::ProjectStageRepo;
