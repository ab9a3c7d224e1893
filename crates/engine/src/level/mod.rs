mod hashing;
mod layout;
mod source;

pub use hashing::level_fingerprint;
pub use layout::build_level_world;
pub use source::{DirLevelSource, InMemoryLevelSource, LevelSource};
