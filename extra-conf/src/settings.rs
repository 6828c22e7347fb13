// SPDX-License-Identifier: GPL-3.0-or-later

//! Resolves the compilation settings of a single file.
//!
//! The completion engine asks for the settings of the file it is about to parse.
//! The answer is the compiler flags, the directory to resolve relative include
//! paths against, and the file which should be parsed instead (the translation
//! unit of a header). When nothing is known about the file, no settings are
//! returned and the engine falls back to its own defaults.

use crate::database::CompilationDatabase;
use crate::flags::FlagTemplate;
use crate::source;
use serde::Serialize;
use std::convert::Infallible;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// The flag which the completion engine can't handle from the database.
const STDLIB_FLAG: &str = "-stdlib=libc++";

/// The language family of the requested file.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Language {
    /// C, C++, Objective-C and Objective-C++.
    CFamily,
    /// Any other language tag, these are not handled.
    Other(String),
}

impl Language {
    const CFAMILY_TAG: &'static str = "cfamily";
}

impl FromStr for Language {
    type Err = Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value == Self::CFAMILY_TAG {
            Ok(Language::CFamily)
        } else {
            Ok(Language::Other(value.to_string()))
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::CFamily => write!(f, "{}", Self::CFAMILY_TAG),
            Language::Other(tag) => write!(f, "{tag}"),
        }
    }
}

/// The question from the completion engine.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Request {
    pub filename: PathBuf,
    pub language: Language,
}

impl Request {
    pub fn new(filename: impl Into<PathBuf>, language: Language) -> Self {
        Self { filename: filename.into(), language }
    }
}

/// The compilation settings of a file.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Settings {
    pub flags: Vec<String>,
    pub include_paths_relative_to_dir: PathBuf,
    pub override_filename: PathBuf,
}

/// Computes the settings from the flag template or from a compilation database.
pub struct FlagResolver {
    template: FlagTemplate,
    project_root: PathBuf,
    database: Option<Box<dyn CompilationDatabase>>,
}

impl FlagResolver {
    /// Creates a resolver.
    ///
    /// Without a database, every file gets the flags of the template, and the
    /// include paths are relative to the `project_root`.
    pub fn new(
        template: FlagTemplate,
        project_root: impl Into<PathBuf>,
        database: Option<Box<dyn CompilationDatabase>>,
    ) -> Self {
        Self { template, project_root: project_root.into(), database }
    }

    /// Returns the settings for the requested file.
    ///
    /// Returns `Ok(None)` when the language is not handled, or when the database
    /// has no flags for the file. File system errors while looking for the
    /// translation unit are returned as errors.
    pub fn resolve_settings(&self, request: &Request) -> io::Result<Option<Settings>> {
        if request.language != Language::CFamily {
            log::debug!("Language '{}' is not handled", request.language);
            return Ok(None);
        }

        // Databases have no entries for headers, use the source file instead.
        // This also makes the definitions in the source reachable from the header.
        let filename = source::find_corresponding_source(&request.filename)?;

        match &self.database {
            None => {
                log::debug!("Using the flag template for {}", filename.display());
                Ok(Some(Settings {
                    flags: self.template.flags_for(&filename),
                    include_paths_relative_to_dir: self.project_root.clone(),
                    override_filename: filename,
                }))
            }
            Some(database) => Ok(Self::from_database(database.as_ref(), filename)),
        }
    }

    fn from_database(database: &dyn CompilationDatabase, filename: PathBuf) -> Option<Settings> {
        let info = database.compilation_info(&filename).unwrap_or_default();
        if info.compiler_flags.is_empty() {
            log::debug!("No compilation database entry for {}", filename.display());
            return None;
        }
        log::debug!("Using the compilation database entry for {}", filename.display());

        Some(Settings {
            flags: remove_first(info.compiler_flags, STDLIB_FLAG),
            include_paths_relative_to_dir: info.compiler_working_dir,
            override_filename: filename,
        })
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn has_database(&self) -> bool {
        self.database.is_some()
    }
}

/// Removes the first occurrence of the flag, the order of the others is kept.
fn remove_first(mut flags: Vec<String>, flag: &str) -> Vec<String> {
    if let Some(idx) = flags.iter().position(|candidate| candidate == flag) {
        flags.remove(idx);
    }
    flags
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::database::CompilationInfo;
    use crate::flags::Platform;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::tempdir;

    struct FakeDatabase {
        entries: HashMap<PathBuf, CompilationInfo>,
    }

    impl FakeDatabase {
        fn boxed(entries: Vec<(PathBuf, Vec<&str>, &str)>) -> Option<Box<dyn CompilationDatabase>> {
            let entries = entries
                .into_iter()
                .map(|(file, flags, directory)| {
                    let info = CompilationInfo {
                        compiler_flags: flags.into_iter().map(String::from).collect(),
                        compiler_working_dir: PathBuf::from(directory),
                    };
                    (file, info)
                })
                .collect();
            Some(Box::new(FakeDatabase { entries }))
        }
    }

    impl CompilationDatabase for FakeDatabase {
        fn compilation_info(&self, file: &Path) -> Option<CompilationInfo> {
            self.entries.get(file).cloned()
        }
    }

    fn template() -> FlagTemplate {
        FlagTemplate::new(Platform::Posix, Path::new("/home/user"), Path::new("/opt/project"))
    }

    fn language_of(flags: &[String]) -> Option<&str> {
        flags
            .iter()
            .position(|flag| flag == "-x")
            .and_then(|idx| flags.get(idx + 1))
            .map(String::as_str)
    }

    #[test]
    fn test_language_from_str() {
        assert_eq!("cfamily".parse::<Language>().unwrap(), Language::CFamily);
        assert_eq!(
            "python".parse::<Language>().unwrap(),
            Language::Other("python".to_string())
        );
        assert_eq!(Language::CFamily.to_string(), "cfamily");
    }

    #[test]
    fn test_other_language_is_not_handled() {
        let sut = FlagResolver::new(template(), "/opt/project", None);

        let result = sut
            .resolve_settings(&Request::new("x.cc", Language::Other("python".into())))
            .unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn test_template_flags_without_database() {
        let sut = FlagResolver::new(template(), "/opt/project", None);

        let result = sut.resolve_settings(&Request::new("x.cc", Language::CFamily)).unwrap().unwrap();

        assert!(result.flags.contains(&"-std=c++14".to_string()));
        assert_eq!(language_of(&result.flags), Some("c++"));
        assert_eq!(result.include_paths_relative_to_dir, PathBuf::from("/opt/project"));
        assert_eq!(result.override_filename, PathBuf::from("x.cc"));
    }

    #[test]
    fn test_objective_cxx_language_does_not_stick() {
        let sut = FlagResolver::new(template(), "/opt/project", None);

        let result = sut.resolve_settings(&Request::new("x.mm", Language::CFamily)).unwrap().unwrap();
        assert_eq!(language_of(&result.flags), Some("objective-c++"));

        let result = sut.resolve_settings(&Request::new("x.cc", Language::CFamily)).unwrap().unwrap();
        assert_eq!(language_of(&result.flags), Some("c++"));
    }

    #[test]
    fn test_header_is_replaced_by_source() {
        let dir = tempdir().unwrap();
        let header = dir.path().join("view.h");
        let source = dir.path().join("view.mm");
        fs::write(&header, "").unwrap();
        fs::write(&source, "").unwrap();

        let sut = FlagResolver::new(template(), dir.path(), None);
        let result = sut.resolve_settings(&Request::new(&header, Language::CFamily)).unwrap().unwrap();

        assert_eq!(result.override_filename, source);
        assert_eq!(language_of(&result.flags), Some("objective-c++"));
        assert_eq!(result.include_paths_relative_to_dir, dir.path());
    }

    #[test]
    #[cfg(unix)]
    fn test_source_lookup_error_is_reported() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("plain.txt"), "").unwrap();

        let sut = FlagResolver::new(template(), dir.path(), None);
        let result = sut.resolve_settings(&Request::new(dir.path().join("plain.txt/view.h"), Language::CFamily));
        assert!(result.is_err());
    }

    #[test]
    fn test_database_without_entry() {
        let database = FakeDatabase::boxed(vec![(
            PathBuf::from("/project/other.cc"),
            vec!["c++", "-c", "other.cc"],
            "/project",
        )]);
        let sut = FlagResolver::new(template(), "/opt/project", database);

        let result = sut
            .resolve_settings(&Request::new("/project/x.cc", Language::CFamily))
            .unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn test_database_with_empty_flags() {
        let database = FakeDatabase::boxed(vec![(PathBuf::from("/project/x.cc"), vec![], "/project")]);
        let sut = FlagResolver::new(template(), "/opt/project", database);

        let result = sut
            .resolve_settings(&Request::new("/project/x.cc", Language::CFamily))
            .unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn test_database_flags_without_stdlib() {
        let database = FakeDatabase::boxed(vec![(
            PathBuf::from("/project/x.cc"),
            vec!["c++", "-Wall", "-c", "x.cc"],
            "/project/build",
        )]);
        let sut = FlagResolver::new(template(), "/opt/project", database);

        let result = sut
            .resolve_settings(&Request::new("/project/x.cc", Language::CFamily))
            .unwrap()
            .unwrap();

        assert_eq!(result.flags, vec!["c++", "-Wall", "-c", "x.cc"]);
        assert_eq!(result.include_paths_relative_to_dir, PathBuf::from("/project/build"));
        assert_eq!(result.override_filename, PathBuf::from("/project/x.cc"));
    }

    #[test]
    fn test_database_flags_stdlib_removed_once() {
        let database = FakeDatabase::boxed(vec![(
            PathBuf::from("/project/x.cc"),
            vec!["c++", "-stdlib=libc++", "-Wall", "-stdlib=libc++", "-c", "x.cc"],
            "/project",
        )]);
        let sut = FlagResolver::new(template(), "/opt/project", database);

        let result = sut
            .resolve_settings(&Request::new("/project/x.cc", Language::CFamily))
            .unwrap()
            .unwrap();

        assert_eq!(result.flags, vec!["c++", "-Wall", "-stdlib=libc++", "-c", "x.cc"]);
    }

    #[test]
    fn test_database_lookup_uses_source_of_header() {
        let dir = tempdir().unwrap();
        let header = dir.path().join("util.hpp");
        let source = dir.path().join("util.cpp");
        fs::write(&source, "").unwrap();

        let database = FakeDatabase::boxed(vec![(source.clone(), vec!["c++", "-c", "util.cpp"], "/build")]);
        let sut = FlagResolver::new(template(), dir.path(), database);

        let result = sut.resolve_settings(&Request::new(&header, Language::CFamily)).unwrap().unwrap();

        assert_eq!(result.flags, vec!["c++", "-c", "util.cpp"]);
        assert_eq!(result.override_filename, source);
    }

    #[test]
    fn test_remove_first() {
        let flags = vec!["-a".to_string(), "-b".to_string()];
        assert_eq!(remove_first(flags.clone(), "-c"), flags);
        assert_eq!(remove_first(flags, "-a"), vec!["-b"]);
    }

    #[test]
    fn test_settings_serialization() {
        let settings = Settings {
            flags: vec!["-Wall".into()],
            include_paths_relative_to_dir: PathBuf::from("/project"),
            override_filename: PathBuf::from("/project/x.cc"),
        };

        let value = serde_json::to_value(&settings).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "flags": ["-Wall"],
                "include_paths_relative_to_dir": "/project",
                "override_filename": "/project/x.cc"
            })
        );
    }
}
