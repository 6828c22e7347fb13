// SPDX-License-Identifier: GPL-3.0-or-later

//! The default compiler flags used when no compilation database is set.
//!
//! The flag list depends on the host platform. On Windows the MSVC and Windows
//! SDK headers are added as system includes, and the language standard is left
//! to clang (it selects `c++14` for MSVC 2015 or later). On other platforms
//! the generic include paths are used with an explicit `-std=c++14`.
//!
//! Both variants point to the Node.js headers under the user's home directory
//! and to the `node-addon-api` package of the project.

use std::fmt;
use std::path::Path;

/// The language flag which takes the language name as the next argument.
const LANGUAGE_FLAG: &str = "-x";
const LANGUAGE_CXX: &str = "c++";
const LANGUAGE_OBJECTIVE_CXX: &str = "objective-c++";
const OBJECTIVE_CXX_EXTENSION: &str = ".mm";

/// The operating system family which selects the flag template.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Platform {
    Windows,
    Posix,
}

impl Platform {
    /// The platform this program was built for.
    pub fn host() -> Self {
        if cfg!(windows) { Platform::Windows } else { Platform::Posix }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Windows => write!(f, "windows"),
            Platform::Posix => write!(f, "posix"),
        }
    }
}

/// The immutable, platform specific flag list.
///
/// The template is never modified after construction. Per file adjustments
/// are made on a copy by [`FlagTemplate::flags_for`].
#[derive(Clone, Debug, PartialEq)]
pub struct FlagTemplate {
    flags: Vec<String>,
}

impl FlagTemplate {
    /// Builds the template for the given platform.
    ///
    /// The `home_dir` is used to locate the Node.js headers, the `project_root`
    /// to locate the project's `node_modules` directory.
    pub fn new(platform: Platform, home_dir: &Path, project_root: &Path) -> Self {
        let addon_api = project_root.join("node_modules/node-addon-api/");

        #[rustfmt::skip]
        let flags: Vec<String> = match platform {
            Platform::Windows => {
                let node_headers = home_dir.join(r".node-gyp\12.13.1\include\node");
                vec![
                    "-Wall".into(),
                    "-Wextra".into(),
                    "-Werror".into(),
                    "-Wno-long-long".into(),
                    "-Wno-variadic-macros".into(),
                    "-fexceptions".into(),
                    "-DNDEBUG".into(),
                    "-DUNICODE".into(),
                    "-D_UNICODE".into(),
                    "-DWIN32".into(),
                    "-D_WIN32".into(),
                    LANGUAGE_FLAG.into(), LANGUAGE_CXX.into(),
                    "-isystem".into(), r"C:\Program Files (x86)\Microsoft Visual Studio 14.0\VC\atlmfc\include".into(),
                    "-isystem".into(), r"C:\Program Files (x86)\Microsoft Visual Studio 14.0\VC\include".into(),
                    "-isystem".into(), r"C:\Program Files (x86)\Microsoft Visual Studio 14.0\VC\crt\src\concrt".into(),
                    "-isystem".into(), r"C:\Program Files (x86)\Windows Kits\10\Include\10.0.17763.0\ucrt".into(),
                    format!("-I{}", node_headers.display()),
                    "-I".into(), addon_api.display().to_string(),
                    "-isystem".into(), r"C:\Program Files (x86)\Windows Kits\10\Include\10.0.17763.0\um".into(),
                    "-isystem".into(), r"C:\Program Files (x86)\Windows Kits\10\Include\10.0.17763.0\shared".into(),
                ]
            }
            Platform::Posix => {
                let node_headers = home_dir.join(".nvm/versions/node/v12.0.0/include/node");
                vec![
                    "-Wall".into(),
                    "-Wextra".into(),
                    "-Werror".into(),
                    "-Wno-long-long".into(),
                    "-Wno-variadic-macros".into(),
                    "-fexceptions".into(),
                    "-DNDEBUG".into(),
                    LANGUAGE_FLAG.into(), LANGUAGE_CXX.into(),
                    "-I".into(), "/usr/local/include".into(),
                    "-I".into(), node_headers.display().to_string(),
                    "-I".into(), addon_api.display().to_string(),
                    "-std=c++14".into(),
                ]
            }
        };

        FlagTemplate { flags }
    }

    /// The flags of the template, as they were built.
    pub fn flags(&self) -> &[String] {
        &self.flags
    }

    /// Returns the flags to compile the given translation unit.
    ///
    /// Objective-C++ sources (`.mm`) get `objective-c++` as the language,
    /// everything else keeps the template's `c++`.
    pub fn flags_for(&self, filename: &Path) -> Vec<String> {
        let mut flags = self.flags.clone();
        if is_objective_cxx(filename) {
            let positions: Vec<usize> = flags
                .iter()
                .enumerate()
                .filter(|(_, flag)| flag.as_str() == LANGUAGE_FLAG)
                .map(|(idx, _)| idx + 1)
                .collect();
            for idx in positions {
                if let Some(language) = flags.get_mut(idx) {
                    *language = LANGUAGE_OBJECTIVE_CXX.to_string();
                }
            }
        }
        flags
    }
}

fn is_objective_cxx(filename: &Path) -> bool {
    filename.to_string_lossy().ends_with(OBJECTIVE_CXX_EXTENSION)
}
