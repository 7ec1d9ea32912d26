//! AI-generated commit messages: diff sizing, generation and cleanup.

pub mod diff;
pub mod message;
pub mod normalize;
pub mod sizer;

pub use diff::{ChangeSet, ChangedFile, DiffLine, DiffLines, DiffStats, FileStatus};
pub use message::{
    CommitMessage, CommitType, GeneratedMessage, generate_commit_message, prepare_prompt,
};
pub use normalize::normalize;
pub use sizer::{DiffPayload, DiffStrategy};
