//! Background thumbnail worker.
//!
//! Drains `thumbnail` tasks from the `jobs` table: fetches the uploaded
//! swing video, extracts a still frame with ffmpeg and stores it next to the
//! video. Media that ffmpeg cannot read moves the swing to `rejected`.

pub mod config;
pub mod runner;
pub mod thumbnail;

pub use config::WorkerConfig;
pub use runner::ThumbnailRunner;
pub use thumbnail::{FfmpegExtractor, FrameExtractor, ThumbnailOutcome, ThumbnailProcessor};
