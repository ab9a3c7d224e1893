use std::fs;
use std::path::{Path, PathBuf};

use crate::config::ConfigError;

/// Supplies map text for levels numbered `1..=level_count()`.
pub trait LevelSource {
    fn level_count(&self) -> u32;
    fn level_text(&self, level: u32) -> Result<String, ConfigError>;
}

/// `level1.txt`, `level2.txt`, ... in one directory. Numbering must be
/// contiguous; discovery stops at the first gap.
#[derive(Debug, Clone)]
pub struct DirLevelSource {
    dir: PathBuf,
    count: u32,
}

impl DirLevelSource {
    pub fn discover(dir: &Path) -> Result<Self, ConfigError> {
        let mut count = 0;
        while level_path(dir, count + 1).is_file() {
            count += 1;
        }
        if count == 0 {
            return Err(ConfigError::MissingLevel {
                level: 1,
                available: 0,
            });
        }
        Ok(Self {
            dir: dir.to_path_buf(),
            count,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn level_path(&self, level: u32) -> PathBuf {
        level_path(&self.dir, level)
    }
}

fn level_path(dir: &Path, level: u32) -> PathBuf {
    dir.join(format!("level{level}.txt"))
}

impl LevelSource for DirLevelSource {
    fn level_count(&self) -> u32 {
        self.count
    }

    fn level_text(&self, level: u32) -> Result<String, ConfigError> {
        check_level(level, self.count)?;
        let path = self.level_path(level);
        fs::read_to_string(&path).map_err(|source| ConfigError::ReadLevel { path, source })
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryLevelSource {
    levels: Vec<String>,
}

impl InMemoryLevelSource {
    pub fn new(levels: Vec<String>) -> Self {
        Self { levels }
    }
}

impl LevelSource for InMemoryLevelSource {
    fn level_count(&self) -> u32 {
        self.levels.len() as u32
    }

    fn level_text(&self, level: u32) -> Result<String, ConfigError> {
        check_level(level, self.level_count())?;
        Ok(self.levels[(level - 1) as usize].clone())
    }
}

fn check_level(level: u32, available: u32) -> Result<(), ConfigError> {
    if level == 0 || level > available {
        return Err(ConfigError::MissingLevel { level, available });
    }
    Ok(())
}
