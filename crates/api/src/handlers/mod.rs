pub mod allocation;
pub mod import;
pub mod office;
pub mod person;
pub mod project;
pub mod stage;
pub mod utilization;
