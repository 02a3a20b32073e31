pub mod batch;
pub mod classify;
pub mod cleanup;
pub mod config;
pub mod engine;
pub mod error;
pub mod index;
pub mod matcher;
pub mod orphans;
pub mod progress;
pub mod scanner;

pub use batch::{BatchMatcher, CancelToken, MatchStats};
pub use cleanup::{CleanupReport, SidecarCleaner};
pub use config::AppConfig;
pub use engine::{MatchRun, OrphanRun, TakeoutEngine};
pub use error::{Error, Result};
pub use index::DirectoryIndex;
pub use matcher::{MatchKind, MatchResult, SidecarMatcher, SidecarSuffixSet};
pub use orphans::OrphanDetector;
pub use progress::{ProgressReporter, SilentReporter};
