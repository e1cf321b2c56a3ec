pub mod hasher;
pub mod monitor;
pub mod walker;

pub use monitor::FolderMonitor;
pub use walker::{FolderWalker, WalkedFile};
