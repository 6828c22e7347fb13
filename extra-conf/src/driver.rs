// SPDX-License-Identifier: GPL-3.0-or-later

//! Wires the components together for a single command line invocation.
//!
//! The configuration phase builds the resolver from the captured context, the
//! command line arguments and the configuration file. The run phase resolves
//! the settings of the requested file and prints them.

use crate::args::{Arguments, OutputFormat};
use crate::config;
use crate::context::Context;
use crate::database::{CompilationDatabase, DATABASE_FILE_NAME, JsonCompilationDatabase};
use crate::flags::FlagTemplate;
use crate::settings::{FlagResolver, Request, Settings};
use anyhow::{Context as AnyhowContext, Result};
use std::io;
use std::path::Path;
use std::process::ExitCode;

/// A configured invocation, ready to run.
pub struct Application {
    resolver: FlagResolver,
    request: Request,
    format: OutputFormat,
}

impl Application {
    /// Builds the resolver and the request.
    ///
    /// The database folder from the command line takes precedence over the one
    /// in the configuration. A folder without a database file is ignored, but a
    /// database which can't be read is an error.
    pub fn configure(context: Context, arguments: Arguments, configuration: config::Main) -> Result<Self> {
        let project_root = configuration.project_root(&context.current_directory);

        let database_directory = match arguments.database {
            Some(directory) => Some(context.current_directory.join(directory)),
            None => configuration.database_directory(&project_root),
        };
        let database = match database_directory {
            Some(directory) => open_database(&directory)?,
            None => None,
        };

        let template = FlagTemplate::new(context.platform, &context.home_directory, &project_root);
        let resolver = FlagResolver::new(template, project_root, database);
        log::debug!(
            "Project root: {}, compilation database: {}",
            resolver.project_root().display(),
            if resolver.has_database() { "in use" } else { "none" }
        );
        let request = Request::new(context.current_directory.join(arguments.filename), arguments.language);

        Ok(Self { resolver, request, format: arguments.format })
    }

    /// The file the settings are resolved for.
    pub fn filename(&self) -> &Path {
        &self.request.filename
    }

    /// Resolves the settings and prints them to the standard output.
    pub fn run(self) -> Result<ExitCode> {
        let stdout = io::stdout();
        self.write(&mut stdout.lock())
    }

    /// Resolves the settings and writes them to the given output.
    ///
    /// In text mode there is nothing to print without settings, which is
    /// reported with a failure exit code.
    pub fn write(self, output: &mut impl io::Write) -> Result<ExitCode> {
        let settings = self
            .resolver
            .resolve_settings(&self.request)
            .with_context(|| format!("Failed to resolve settings for {}", self.request.filename.display()))?;

        match (self.format, settings) {
            (OutputFormat::Text, Some(settings)) => {
                writeln!(output, "{}", settings.flags.join(" "))?;
                Ok(ExitCode::SUCCESS)
            }
            (OutputFormat::Text, None) => {
                log::error!("No flags available for {}", self.request.filename.display());
                Ok(ExitCode::FAILURE)
            }
            (OutputFormat::Json, settings) => {
                write_json(output, settings.as_ref())?;
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}

fn open_database(directory: &Path) -> Result<Option<Box<dyn CompilationDatabase>>> {
    let file = directory.join(DATABASE_FILE_NAME);
    if !file.exists() {
        log::warn!("No compilation database in {}, using the default flags.", directory.display());
        return Ok(None);
    }
    let database = JsonCompilationDatabase::load(directory)?;
    Ok(Some(Box::new(database)))
}

/// Writes the settings as a JSON object, the empty object when there are none.
fn write_json(output: &mut impl io::Write, settings: Option<&Settings>) -> Result<()> {
    let value = match settings {
        Some(settings) => serde_json::to_value(settings)?,
        None => serde_json::Value::Object(serde_json::Map::new()),
    };
    serde_json::to_writer_pretty(&mut *output, &value)?;
    writeln!(output)?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::flags::Platform;
    use crate::settings::Language;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn context(current_directory: &Path) -> Context {
        Context {
            current_directory: current_directory.to_path_buf(),
            home_directory: PathBuf::from("/home/user"),
            platform: Platform::Posix,
        }
    }

    fn arguments(filename: &str, database: Option<&str>, format: OutputFormat) -> Arguments {
        Arguments {
            config: None,
            database: database.map(PathBuf::from),
            filename: PathBuf::from(filename),
            language: Language::CFamily,
            format,
            verbose: 0,
        }
    }

    fn run_to_string(application: Application) -> (ExitCode, String) {
        let mut buffer = Vec::new();
        let code = application.write(&mut buffer).unwrap();
        (code, String::from_utf8(buffer).unwrap())
    }

    #[test]
    fn test_text_output_with_template() {
        let dir = tempdir().unwrap();
        let sut = Application::configure(
            context(dir.path()),
            arguments("main.cc", None, OutputFormat::Text),
            config::Main::default(),
        )
        .unwrap();
        assert_eq!(sut.filename(), dir.path().join("main.cc"));

        let (code, output) = run_to_string(sut);
        assert_eq!(code, ExitCode::SUCCESS);
        assert!(output.starts_with("-Wall -Wextra"));
        assert!(output.trim_end().ends_with("-std=c++14"));
    }

    #[test]
    fn test_text_output_without_settings() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(DATABASE_FILE_NAME), "[]").unwrap();

        let sut = Application::configure(
            context(dir.path()),
            arguments("main.cc", Some("."), OutputFormat::Text),
            config::Main::default(),
        )
        .unwrap();

        let (code, output) = run_to_string(sut);
        assert_eq!(code, ExitCode::FAILURE);
        assert!(output.is_empty());
    }

    #[test]
    fn test_json_output_without_settings() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(DATABASE_FILE_NAME), "[]").unwrap();

        let sut = Application::configure(
            context(dir.path()),
            arguments("main.cc", Some("."), OutputFormat::Json),
            config::Main::default(),
        )
        .unwrap();

        let (code, output) = run_to_string(sut);
        assert_eq!(code, ExitCode::SUCCESS);
        assert_eq!(output.trim(), "{}");
    }

    #[test]
    fn test_json_output_from_configured_database() {
        let dir = tempdir().unwrap();
        let build = dir.path().join("build");
        fs::create_dir(&build).unwrap();
        let content = serde_json::json!([
            {
                "directory": build,
                "file": "../main.cc",
                "arguments": ["c++", "-stdlib=libc++", "-c", "../main.cc"]
            }
        ]);
        fs::write(build.join(DATABASE_FILE_NAME), content.to_string()).unwrap();

        let configuration = config::Main {
            compilation_database: config::DatabaseLocation { directory: Some(PathBuf::from("build")) },
            ..config::Main::default()
        };
        let sut = Application::configure(
            context(dir.path()),
            arguments("main.cc", None, OutputFormat::Json),
            configuration,
        )
        .unwrap();

        let (code, output) = run_to_string(sut);
        assert_eq!(code, ExitCode::SUCCESS);

        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["flags"], serde_json::json!(["c++", "-c", "../main.cc"]));
        assert_eq!(value["include_paths_relative_to_dir"], serde_json::json!(build));
    }

    #[test]
    fn test_missing_database_file_is_ignored() {
        let dir = tempdir().unwrap();

        let sut = Application::configure(
            context(dir.path()),
            arguments("main.cc", Some("build"), OutputFormat::Text),
            config::Main::default(),
        )
        .unwrap();

        let (code, output) = run_to_string(sut);
        assert_eq!(code, ExitCode::SUCCESS);
        assert!(output.contains("-x c++"));
    }

    #[test]
    fn test_resolver_reports_database_use() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(DATABASE_FILE_NAME), "[]").unwrap();

        let with_database = Application::configure(
            context(dir.path()),
            arguments("main.cc", Some("."), OutputFormat::Text),
            config::Main::default(),
        )
        .unwrap();
        assert!(with_database.resolver.has_database());
        assert_eq!(with_database.resolver.project_root(), dir.path());

        let without_database = Application::configure(
            context(dir.path()),
            arguments("main.cc", None, OutputFormat::Text),
            config::Main::default(),
        )
        .unwrap();
        assert!(!without_database.resolver.has_database());
    }

    #[test]
    fn test_json_override_filename_is_absolute() {
        let dir = tempdir().unwrap();
        let sut = Application::configure(
            context(dir.path()),
            arguments("main.cc", None, OutputFormat::Json),
            config::Main::default(),
        )
        .unwrap();

        let (code, output) = run_to_string(sut);
        assert_eq!(code, ExitCode::SUCCESS);

        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["override_filename"], serde_json::json!(dir.path().join("main.cc")));
    }

    #[test]
    fn test_broken_database_is_an_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(DATABASE_FILE_NAME), "{").unwrap();

        let result = Application::configure(
            context(dir.path()),
            arguments("main.cc", Some("."), OutputFormat::Text),
            config::Main::default(),
        );
        assert!(result.is_err());
    }
}
