// SPDX-License-Identifier: GPL-3.0-or-later

//! Implements deserialization of the `Entry` struct.
//!
//! An entry carries the compiler invocation either as an `arguments` array or
//! as a shell escaped `command` string. Exactly one of them must be present.
//! The command string is split into arguments here, so the rest of the crate
//! only sees the argument vector.

use serde::de::{self, Deserialize, Deserializer, MapAccess, Visitor};
use std::fmt;
use std::path::PathBuf;

use super::Entry;

impl<'de> Deserialize<'de> for Entry {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_struct("Entry", FIELDS, EntryVisitor)
    }
}

enum Field {
    Directory,
    File,
    Command,
    Arguments,
    Output,
    Ignored,
}

const FIELDS: &[&str] = &["directory", "file", "command", "arguments", "output"];

impl<'de> Deserialize<'de> for Field {
    fn deserialize<D>(deserializer: D) -> Result<Field, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_identifier(FieldVisitor)
    }
}

struct FieldVisitor;

impl Visitor<'_> for FieldVisitor {
    type Value = Field;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "one of {:?}", FIELDS)
    }

    fn visit_str<E>(self, value: &str) -> Result<Field, E>
    where
        E: de::Error,
    {
        // Other tools extend the format, unknown keys are skipped.
        let field = match value {
            "directory" => Field::Directory,
            "file" => Field::File,
            "command" => Field::Command,
            "arguments" => Field::Arguments,
            "output" => Field::Output,
            _ => Field::Ignored,
        };
        Ok(field)
    }
}

struct EntryVisitor;

impl<'de> Visitor<'de> for EntryVisitor {
    type Value = Entry;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("compilation database entry")
    }

    fn visit_map<V>(self, mut map: V) -> Result<Entry, V::Error>
    where
        V: MapAccess<'de>,
    {
        let mut directory: Option<PathBuf> = None;
        let mut file: Option<PathBuf> = None;
        let mut command: Option<String> = None;
        let mut arguments: Option<Vec<String>> = None;
        let mut output: Option<PathBuf> = None;

        while let Some(key) = map.next_key()? {
            match key {
                Field::Directory => directory = Some(map.next_value()?),
                Field::File => file = Some(map.next_value()?),
                Field::Command => command = Some(map.next_value()?),
                Field::Arguments => arguments = Some(map.next_value()?),
                Field::Output => output = Some(map.next_value()?),
                Field::Ignored => {
                    map.next_value::<de::IgnoredAny>()?;
                }
            }
        }

        let arguments = match (arguments, command) {
            (None, None) => Err(de::Error::missing_field("`command` or `arguments`")),
            (Some(_), Some(_)) => Err(de::Error::custom(
                "only one of the `command` and `arguments` fields can be present",
            )),
            (Some(args), None) => Ok(args),
            (None, Some(cmd)) => shell_words::split(cmd.as_str()).map_err(|_| {
                de::Error::invalid_value(
                    de::Unexpected::Str(cmd.as_str()),
                    &"shell command with proper escaping",
                )
            }),
        }?;

        Ok(Entry {
            directory: directory.ok_or_else(|| de::Error::missing_field("directory"))?,
            file: file.ok_or_else(|| de::Error::missing_field("file"))?,
            arguments,
            output,
        })
    }
}
