use std::{
    fmt::Display,
    path::PathBuf,
    sync::{LazyLock, RwLock},
};

use nu_ansi_term::Color;
use plinth_utils::path::resolve_path;

use crate::error::{CliError, CliResult};

pub static COLOR: LazyLock<RwLock<bool>> = LazyLock::new(|| RwLock::new(true));
pub static PROGRESS: LazyLock<RwLock<bool>> = LazyLock::new(|| RwLock::new(true));

pub fn progress_enabled() -> bool {
    PROGRESS.read().map(|enabled| *enabled).unwrap_or(false)
}

pub struct Colored<T: Display>(pub Color, pub T);

impl<T: Display> Display for Colored<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let color = COLOR.read().map(|color| *color).unwrap_or(false);
        if color {
            write!(f, "{}", self.0.prefix())?;
            self.1.fmt(f)?;
            write!(f, "{}", self.0.suffix())
        } else {
            self.1.fmt(f)
        }
    }
}

pub fn pluralize(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{count} {word}")
    } else {
        format!("{count} {word}s")
    }
}

/// Resolves a directory given on the command line the same way configured
/// paths are resolved.
pub fn resolve_dir(path: &str) -> CliResult<PathBuf> {
    resolve_path(path).map_err(|err| CliError::Config(err.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pluralize() {
        assert_eq!(pluralize(0, "provider"), "0 providers");
        assert_eq!(pluralize(1, "provider"), "1 provider");
        assert_eq!(pluralize(7, "artifact"), "7 artifacts");
    }
}
