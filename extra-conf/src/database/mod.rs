// SPDX-License-Identifier: GPL-3.0-or-later

//! This module provides read access to compilation databases.
//!
//! A compilation database is a set of records which describe the compilation of the
//! source files in a given project. Each record tells the compiler invocation and the
//! working directory used to build a single source file.
//!
//! The resolver only needs a lookup by file name, which is expressed by the
//! [`CompilationDatabase`] trait. The JSON compilation database format, defined in the
//! LLVM project [documentation](https://clang.llvm.org/docs/JSONCompilationDatabase.html),
//! is implemented by [`JsonCompilationDatabase`].

mod json;
mod type_de;

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// The file name of the JSON compilation database inside its folder.
pub const DATABASE_FILE_NAME: &str = "compile_commands.json";

/// The compilation details of a single translation unit.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CompilationInfo {
    /// The full compiler invocation, the compiler executable included.
    pub compiler_flags: Vec<String>,
    /// The working directory of the compilation.
    pub compiler_working_dir: PathBuf,
}

/// A read-only lookup of compilation details by file name.
pub trait CompilationDatabase: Send + Sync {
    /// Returns the compilation details of the given file.
    ///
    /// Returns `None` when the file is unknown to the database.
    fn compilation_info(&self, file: &Path) -> Option<CompilationInfo>;
}

/// Represents an entry of the JSON compilation database.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Entry {
    /// The main translation unit source processed by this compilation step.
    /// This is used as the key into the compilation database.
    pub file: PathBuf,
    /// The compile command argv. Entries written with the `command` field are
    /// split into arguments while reading.
    pub arguments: Vec<String>,
    /// The working directory of the compilation. Relative `file` values are
    /// relative to this directory.
    pub directory: PathBuf,
    /// The name of the output created by this compilation step.
    pub output: Option<PathBuf>,
}

impl Entry {
    /// Semantic validation of the entry.
    pub fn validate(self) -> Result<Self, EntryError> {
        if self.file.as_os_str().is_empty() {
            return Err(EntryError::EmptyFileName);
        }
        if self.directory.as_os_str().is_empty() {
            return Err(EntryError::EmptyDirectory);
        }
        if self.arguments.is_empty() {
            return Err(EntryError::EmptyArguments);
        }
        Ok(self)
    }

    /// The absolute and normalized path of the source file.
    fn source_path(&self) -> PathBuf {
        normalize(&self.directory.join(&self.file))
    }
}

/// Represents the possible errors that can occur when validating an entry.
#[derive(Debug, Error)]
pub enum EntryError {
    #[error("Entry has an empty file field")]
    EmptyFileName,
    #[error("Entry has an empty directory field")]
    EmptyDirectory,
    #[error("Entry has an empty compiler invocation")]
    EmptyArguments,
}

/// Errors while loading a compilation database.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Failed to access compilation database '{path}': {source}")]
    FileAccess {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to parse entry #{index} in compilation database '{path}': {source}")]
    Parse {
        path: PathBuf,
        index: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to get current working directory: {0}")]
    CurrentDirectory(#[source] io::Error),
    #[error("Invalid entry #{index} in compilation database '{path}': {source}")]
    InvalidEntry {
        path: PathBuf,
        index: usize,
        #[source]
        source: EntryError,
    },
}

/// A compilation database read from a `compile_commands.json` file.
///
/// The entries are kept in memory, and indexed by their source file. When a file
/// was compiled multiple times, the first entry is used.
#[derive(Debug)]
pub struct JsonCompilationDatabase {
    entries: Vec<Entry>,
    index: HashMap<PathBuf, usize>,
    current_directory: PathBuf,
}

impl JsonCompilationDatabase {
    /// Loads the database from the given folder.
    pub fn load(directory: &Path) -> Result<Self, DatabaseError> {
        let path = directory.join(DATABASE_FILE_NAME);
        log::info!("Loading compilation database: {}", path.display());

        let file = OpenOptions::new()
            .read(true)
            .open(&path)
            .map_err(|source| DatabaseError::FileAccess { path: path.clone(), source })?;
        let reader = io::BufReader::new(file);

        let current_directory = std::env::current_dir().map_err(DatabaseError::CurrentDirectory)?;

        let entries = json::deserialize_seq::<Entry, _>(reader)
            .enumerate()
            .map(|(index, entry)| {
                let entry =
                    entry.map_err(|source| DatabaseError::Parse { path: path.clone(), index, source })?;
                entry
                    .validate()
                    .map_err(|source| DatabaseError::InvalidEntry { path: path.clone(), index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let database = Self::from_entries(entries, current_directory);
        log::debug!("Compilation database has {} entries", database.entries.len());
        Ok(database)
    }

    /// Builds the database from already parsed entries.
    ///
    /// Relative queries are resolved against `current_directory`.
    pub fn from_entries(entries: Vec<Entry>, current_directory: PathBuf) -> Self {
        let mut index = HashMap::with_capacity(entries.len());
        for (idx, entry) in entries.iter().enumerate() {
            index.entry(entry.source_path()).or_insert(idx);
        }
        Self { entries, index, current_directory }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CompilationDatabase for JsonCompilationDatabase {
    fn compilation_info(&self, file: &Path) -> Option<CompilationInfo> {
        let key = normalize(&self.current_directory.join(file));
        let entry = self.index.get(&key).and_then(|idx| self.entries.get(*idx))?;

        Some(CompilationInfo {
            compiler_flags: entry.arguments.clone(),
            compiler_working_dir: entry.directory.clone(),
        })
    }
}

/// Lexical normalization of a path: drops `.` components and resolves `..`
/// against the previous component. The file system is not accessed.
fn normalize(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let last = result.components().next_back();
                let at_name = matches!(last, Some(Component::Normal(_)));
                let at_root = matches!(last, Some(Component::RootDir | Component::Prefix(_)));
                if at_name {
                    result.pop();
                } else if !at_root {
                    result.push(component);
                }
            }
            other => result.push(other),
        }
    }
    result
}
