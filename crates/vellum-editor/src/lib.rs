pub mod commands;
pub mod engine;
pub mod error;
pub mod history;
pub mod patch;
pub mod session;

pub use commands::Command;
pub use engine::{Applied, PatchPair, apply, apply_command, command_patches};
pub use error::CommandError;
pub use history::{History, HistoryConfig, HistoryEntry};
pub use patch::{Patch, PatchOp, apply_patch, diff};
pub use session::Session;
