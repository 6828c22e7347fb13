// SPDX-License-Identifier: GPL-3.0-or-later

use crate::flags::Platform;
use anyhow::{Context as AnyhowContext, Result};
use directories::BaseDirs;
use std::env;
use std::fmt;
use std::path::PathBuf;

/// Application context containing runtime environment information.
///
/// Captured once at startup, so the configuration and resolution phases
/// don't need to query the environment again.
#[derive(Debug, Clone)]
pub struct Context {
    /// Current working directory when the program was invoked
    pub current_directory: PathBuf,
    /// Home directory of the user, `~` when it can't be determined
    pub home_directory: PathBuf,
    /// The platform which selects the flag template
    pub platform: Platform,
}

impl Context {
    /// Capture the current application context.
    pub fn capture() -> Result<Self> {
        let current_directory =
            env::current_dir().with_context(|| "Failed to get current working directory")?;

        let home_directory = BaseDirs::new()
            .map(|dirs| dirs.home_dir().to_path_buf())
            .unwrap_or_else(|| {
                log::warn!("Home directory is not known, using '~' in include paths.");
                PathBuf::from("~")
            });

        Ok(Context { current_directory, home_directory, platform: Platform::host() })
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Application Context:")?;
        writeln!(f, "Current Directory: {}", self.current_directory.display())?;
        writeln!(f, "Home Directory: {}", self.home_directory.display())?;
        write!(f, "Platform: {}", self.platform)
    }
}
