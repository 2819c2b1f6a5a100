//! Pure domain logic for the swing locker: errors, roles, the swing status
//! machine, authorization policy, and the upload contract.

pub mod civil_time;
pub mod error;
pub mod ffmpeg;
pub mod media_url;
pub mod pagination;
pub mod policy;
pub mod roles;
pub mod swing_status;
pub mod types;
pub mod upload;
