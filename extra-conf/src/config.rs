// SPDX-License-Identifier: GPL-3.0-or-later

//! This module defines the configuration of the application.
//!
//! The configuration is either loaded from a file or used with default
//! values, which are defined in the code.
//!
//! The configuration file syntax is based on the YAML format.
//! The default configuration file name is `extra-conf.yml`.
//!
//! The configuration file location is searched in the following order:
//! 1. The current working directory
//! 2. The local configuration directory of the user
//! 3. The configuration directory of the user
//! 4. The local configuration directory of the application
//! 5. The configuration directory of the application
//!
//! ```yaml
//! schema: 1.0
//!
//! project:
//!   root: /opt/project
//!
//! compilation_database:
//!   directory: build
//! ```
//!
//! Relative paths are resolved against the folder of the configuration file
//! (project root), and against the project root (database directory).

// Re-Export the types and the loader module content.
pub use loader::{ConfigError, Loader};
pub use types::*;
pub use validation::Validator;

mod types {
    use serde::Deserialize;
    use std::fmt;
    use std::path::{Path, PathBuf};

    /// Represents the application configuration.
    #[derive(Debug, PartialEq, serde::Deserialize, serde::Serialize)]
    pub struct Main {
        #[serde(deserialize_with = "validate_schema_version", default = "default_schema")]
        pub schema: String,
        #[serde(default)]
        pub project: Project,
        #[serde(default)]
        pub compilation_database: DatabaseLocation,
    }

    impl Default for Main {
        fn default() -> Self {
            Self {
                schema: default_schema(),
                project: Project::default(),
                compilation_database: DatabaseLocation::default(),
            }
        }
    }

    impl Main {
        /// The folder which the default include paths are relative to.
        ///
        /// Falls back to the current working directory when not configured.
        pub fn project_root(&self, current_directory: &Path) -> PathBuf {
            match &self.project.root {
                Some(root) => current_directory.join(root),
                None => current_directory.to_path_buf(),
            }
        }

        /// The folder of the `compile_commands.json` file, if configured.
        pub fn database_directory(&self, project_root: &Path) -> Option<PathBuf> {
            self.compilation_database.directory.as_ref().map(|directory| project_root.join(directory))
        }
    }

    impl fmt::Display for Main {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            writeln!(f, "Configuration:")?;
            let yaml_string = serde_yml::to_string(self).map_err(|_| fmt::Error)?;
            for line in yaml_string.lines() {
                writeln!(f, "{}", line)?;
            }
            Ok(())
        }
    }

    /// Project level settings.
    #[derive(Debug, Default, PartialEq, serde::Deserialize, serde::Serialize)]
    pub struct Project {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub root: Option<PathBuf>,
    }

    /// Location of the JSON compilation database.
    #[derive(Debug, Default, PartialEq, serde::Deserialize, serde::Serialize)]
    pub struct DatabaseLocation {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub directory: Option<PathBuf>,
    }

    pub(super) const SUPPORTED_SCHEMA_VERSION: &str = "1.0";

    fn default_schema() -> String {
        String::from(SUPPORTED_SCHEMA_VERSION)
    }

    // Custom deserialization function to validate the schema version
    fn validate_schema_version<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let schema: String = Deserialize::deserialize(deserializer)?;
        if schema != SUPPORTED_SCHEMA_VERSION {
            use serde::de::Error;
            Err(Error::custom(format!(
                "Unsupported schema version: {schema}. Expected: {SUPPORTED_SCHEMA_VERSION}"
            )))
        } else {
            Ok(schema)
        }
    }
}

pub mod validation {

    use super::types::*;
    use std::path::Path;
    use thiserror::Error;

    /// Trait for validating configuration objects
    pub trait Validator<T> {
        type Error: std::error::Error;

        fn validate(config: &T) -> Result<(), Self::Error>;
    }

    /// Validation errors for configuration
    #[derive(Debug, Error)]
    pub enum ValidationError {
        #[error("Empty path value for field '{field}'")]
        EmptyPath { field: &'static str },
        #[error("Multiple validation errors: {errors:?}")]
        Multiple { errors: Vec<ValidationError> },
    }

    /// Combinator for collecting and handling validation errors
    #[derive(Default)]
    struct ValidationCollector {
        errors: Vec<ValidationError>,
    }

    impl ValidationCollector {
        fn add_result(&mut self, result: Result<(), ValidationError>) {
            if let Err(error) = result {
                match error {
                    ValidationError::Multiple { errors } => self.errors.extend(errors),
                    single_error => self.errors.push(single_error),
                }
            }
        }

        fn finish(mut self) -> Result<(), ValidationError> {
            match self.errors.len() {
                0 => Ok(()),
                1 => Err(self.errors.remove(0)),
                _ => Err(ValidationError::Multiple { errors: self.errors }),
            }
        }
    }

    fn non_empty(field: &'static str, path: Option<&Path>) -> Result<(), ValidationError> {
        match path {
            Some(path) if path.as_os_str().is_empty() => Err(ValidationError::EmptyPath { field }),
            _ => Ok(()),
        }
    }

    impl Validator<Main> for Main {
        type Error = ValidationError;

        fn validate(config: &Main) -> Result<(), Self::Error> {
            let mut collector = ValidationCollector::default();
            collector.add_result(Project::validate(&config.project));
            collector.add_result(DatabaseLocation::validate(&config.compilation_database));
            collector.finish()
        }
    }

    impl Validator<Project> for Project {
        type Error = ValidationError;

        fn validate(config: &Project) -> Result<(), Self::Error> {
            non_empty("project.root", config.root.as_deref())
        }
    }

    impl Validator<DatabaseLocation> for DatabaseLocation {
        type Error = ValidationError;

        fn validate(config: &DatabaseLocation) -> Result<(), Self::Error> {
            non_empty("compilation_database.directory", config.directory.as_deref())
        }
    }

    #[cfg(test)]
    mod test {
        use super::*;
        use std::path::PathBuf;

        #[test]
        fn test_validate_default() {
            assert!(Main::validate(&Main::default()).is_ok());
        }

        #[test]
        fn test_validate_empty_root() {
            let config = Project { root: Some(PathBuf::new()) };

            match Project::validate(&config).unwrap_err() {
                ValidationError::EmptyPath { field } => assert_eq!(field, "project.root"),
                _ => panic!("Expected EmptyPath validation error"),
            }
        }

        #[test]
        fn test_validate_multiple_errors() {
            let config = Main {
                schema: String::from("1.0"),
                project: Project { root: Some(PathBuf::new()) },
                compilation_database: DatabaseLocation { directory: Some(PathBuf::new()) },
            };

            match Main::validate(&config).unwrap_err() {
                ValidationError::Multiple { errors } => assert_eq!(errors.len(), 2),
                _ => panic!("Expected multiple validation errors"),
            }
        }
    }
}

pub mod loader {
    use super::{Main, Validator};
    use crate::context::Context;
    use directories::{BaseDirs, ProjectDirs};
    use log::{debug, info};
    use std::fs::OpenOptions;
    use std::path::{Path, PathBuf};
    use thiserror::Error;

    /// The default configuration file name.
    pub const CONFIG_FILE_NAME: &str = "extra-conf.yml";

    pub struct Loader {}

    impl Loader {
        /// Loads the configuration from the specified file or the default locations.
        ///
        /// If the configuration file is not found, the default configuration is returned.
        pub fn load(context: &Context, filename: &Option<String>) -> Result<Main, ConfigError> {
            if let Some(path) = filename {
                return Self::from_file(&context.current_directory.join(path));
            }
            for location in Self::file_locations(context) {
                debug!("Checking configuration file: {}", location.display());
                if location.exists() {
                    return Self::from_file(location.as_path());
                }
            }
            debug!("Configuration file not found. Using the default configuration.");
            Ok(Main::default())
        }

        fn file_locations(context: &Context) -> Vec<PathBuf> {
            let mut locations = Vec::new();

            locations.push(context.current_directory.clone());
            if let Some(base_dirs) = BaseDirs::new() {
                locations.push(base_dirs.config_local_dir().to_path_buf());
                locations.push(base_dirs.config_dir().to_path_buf());
            }
            if let Some(proj_dirs) = ProjectDirs::from("com.github", "extra-conf", "extra-conf") {
                locations.push(proj_dirs.config_local_dir().to_path_buf());
                locations.push(proj_dirs.config_dir().to_path_buf());
            }
            locations.dedup();
            locations.iter().map(|p| p.join(CONFIG_FILE_NAME)).collect()
        }

        /// Loads the configuration from the specified file.
        ///
        /// The project root is anchored to the folder of the file.
        pub fn from_file(path: &Path) -> Result<Main, ConfigError> {
            info!("Loading configuration file: {}", path.display());

            let reader = OpenOptions::new()
                .read(true)
                .open(path)
                .map_err(|source| ConfigError::FileAccess { path: path.to_path_buf(), source })?;

            let mut content: Main = Self::from_reader(reader)
                .map_err(|source| ConfigError::ParseError { path: path.to_path_buf(), source })?;

            Main::validate(&content)
                .map_err(|source| ConfigError::ValidationError { path: path.to_path_buf(), source })?;

            let folder = path.parent().unwrap_or_else(|| Path::new("."));
            content.project.root = Some(match content.project.root.take() {
                Some(root) => folder.join(root),
                None => folder.to_path_buf(),
            });

            Ok(content)
        }

        /// Define the deserialization format of the config file.
        fn from_reader<R, T>(rdr: R) -> serde_yml::Result<T>
        where
            R: std::io::Read,
            T: serde::de::DeserializeOwned,
        {
            serde_yml::from_reader(rdr)
        }
    }

    /// Represents all possible configuration-related errors.
    #[derive(Debug, Error)]
    pub enum ConfigError {
        /// Error when opening or reading a configuration file.
        #[error("Failed to access configuration file '{path}': {source}")]
        FileAccess {
            path: PathBuf,
            #[source]
            source: std::io::Error,
        },
        /// Error when parsing the configuration file format.
        #[error("Failed to parse configuration from file '{path}': {source}")]
        ParseError {
            path: PathBuf,
            #[source]
            source: serde_yml::Error,
        },
        /// Error when configuration validation fails.
        #[error("Configuration validation failed in '{path}': {source}")]
        ValidationError {
            path: PathBuf,
            #[source]
            source: crate::config::validation::ValidationError,
        },
    }

}
