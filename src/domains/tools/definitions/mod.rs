//! Tool definitions module.
//!
//! One module per backend integration. Each exposes a `*Tool` type
//! implementing the `Tool` capability trait; the server registers them at
//! bootstrap.

pub mod browser;
pub mod github;
pub mod gitlab;
pub mod gmaps;
pub mod memory;

pub use browser::PuppeteerTool;
pub use github::GithubTool;
pub use gitlab::GitlabTool;
pub use gmaps::GmapsTool;
pub use memory::{MemoryItem, MemoryStore, MemoryTool, SqliteMemoryStore, StoreError};
