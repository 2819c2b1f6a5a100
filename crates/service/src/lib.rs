//! Locker orchestration: listing, creation, assignment, review and the
//! streaming upload pipeline.
//!
//! Every operation takes the acting [`Actor`](locker_core::roles::Actor)
//! explicitly; nothing here reads ambient request state.

pub mod error;
pub mod locker;
pub mod queue;
pub mod upload;
pub mod view;

pub use error::{LockerError, LockerResult};
pub use locker::{CreatedItem, LockerQuery, LockerService, ReviewOutcome};
pub use queue::{PgTaskQueue, TaskKind, TaskQueue, ThumbnailTask};
pub use upload::{UploadOutcome, UploadPipeline, UploadRequest, UploadSettings};
pub use view::{AnalysisVideoView, SwingView, ViewContext};
