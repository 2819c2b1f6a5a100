//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` (or `&mut PgConnection` inside a transaction) as the
//! first argument.

pub mod instructor_repo;
pub mod job_repo;
pub mod swing_repo;

pub use instructor_repo::InstructorRepo;
pub use job_repo::JobRepo;
pub use swing_repo::SwingRepo;
