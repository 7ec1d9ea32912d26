//! Git plumbing: staged change collection, staging, committing and pushing.

pub mod ops;
pub mod staged;

pub use ops::{create_commit, push_origin, stage_all};
pub use staged::{StagedChanges, collect_staged};
