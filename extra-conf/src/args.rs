// SPDX-License-Identifier: GPL-3.0-or-later

//! This module contains the command line interface of the application.
//!
//! The command line parsing is implemented using the `clap` library.
//! The `Arguments` type represents a structured form of the program invocation.

use crate::settings::Language;
use anyhow::anyhow;
use clap::{ArgAction, ArgMatches, Command, arg, command, value_parser};
use std::fmt;
use std::path::PathBuf;

/// Common constants used in the module.
const DEFAULT_LANGUAGE: &str = "cfamily";
const FORMAT_TEXT: &str = "text";
const FORMAT_JSON: &str = "json";

/// Represents the command line arguments of the application.
#[derive(Debug, PartialEq)]
pub struct Arguments {
    // The path of the configuration file.
    pub config: Option<String>,
    // The folder of the compilation database, overrides the configuration.
    pub database: Option<PathBuf>,
    // The file to resolve the settings for.
    pub filename: PathBuf,
    // The language of the file.
    pub language: Language,
    // How to print the result.
    pub format: OutputFormat,
    // The requested verbosity level.
    pub verbose: u8,
}

/// Represents the output format of the result.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OutputFormat {
    /// The flags joined by spaces.
    Text,
    /// The whole settings record as a JSON object.
    Json,
}

impl TryFrom<ArgMatches> for Arguments {
    type Error = anyhow::Error;

    fn try_from(matches: ArgMatches) -> Result<Self, Self::Error> {
        let config = matches.get_one::<String>("config").map(String::to_string);
        let database = matches.get_one::<PathBuf>("database").cloned();
        let filename = matches
            .get_one::<PathBuf>("FILE")
            .cloned()
            .ok_or_else(|| anyhow!("missing file name"))?;
        let language = matches
            .get_one::<String>("language")
            .map(|tag| tag.parse::<Language>())
            .transpose()?
            .unwrap_or(Language::CFamily);
        let format = match matches.get_one::<String>("format").map(String::as_str) {
            Some(FORMAT_JSON) => OutputFormat::Json,
            Some(FORMAT_TEXT) | None => OutputFormat::Text,
            Some(other) => return Err(anyhow!("unrecognized output format: {other}")),
        };
        let verbose = matches.get_count("verbose");

        Ok(Arguments { config, database, filename, language, format, verbose })
    }
}

impl fmt::Display for Arguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Arguments:")?;
        writeln!(f, "File: {}", self.filename.display())?;
        writeln!(f, "Language: {}", self.language)?;
        writeln!(f, "Format: {:?}", self.format)?;
        if let Some(config) = &self.config {
            writeln!(f, "Config: {config}")?;
        }
        if let Some(database) = &self.database {
            writeln!(f, "Database: {}", database.display())?;
        }
        write!(f, "Verbosity: {}", self.verbose)
    }
}

/// Represents the command line interface of the application.
pub fn cli() -> Command {
    command!()
        .arg_required_else_help(true)
        .args(&[
            arg!(-v --verbose ... "Sets the level of verbosity").action(ArgAction::Count),
            arg!(-c --config <FILE> "Path of the config file"),
            arg!(-d --database <DIR> "Folder of the compile_commands.json file")
                .value_parser(value_parser!(PathBuf)),
            arg!(-l --language <LANG> "Language of the file")
                .default_value(DEFAULT_LANGUAGE)
                .hide_default_value(false),
            arg!(-f --format <FORMAT> "Output format")
                .value_parser([FORMAT_TEXT, FORMAT_JSON])
                .default_value(FORMAT_TEXT),
            arg!(<FILE> "Source or header file to resolve the flags for")
                .value_parser(value_parser!(PathBuf)),
        ])
}
