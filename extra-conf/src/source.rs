// SPDX-License-Identifier: GPL-3.0-or-later

//! Maps header files to the source file which includes them.
//!
//! Compilation databases don't have entries for header files, and the
//! completion engine works better when the header is parsed in the context
//! of its implementation file. This module finds that file next to the header.

use std::io;
use std::path::{Path, PathBuf};

/// Header extensions (without the leading dot).
const HEADER_EXTENSIONS: [&str; 4] = ["h", "hxx", "hpp", "hh"];

/// Source extensions in the order they are probed.
const SOURCE_EXTENSIONS: [&str; 6] = ["cpp", "cxx", "cc", "c", "m", "mm"];

/// Checks if the given file name refers to a header file.
///
/// Only the extension is checked, the file does not need to exist.
pub fn is_header_file(filename: &Path) -> bool {
    filename
        .extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| HEADER_EXTENSIONS.contains(&extension))
}

/// Finds the translation unit for the given file.
///
/// For non-header files this is the file itself. For headers, the source files
/// with the same base name are probed in priority order, and the first one
/// which exists is returned. A header without an implementation file is its
/// own translation unit.
///
/// Errors from the file system checks are returned to the caller.
pub fn find_corresponding_source(filename: &Path) -> io::Result<PathBuf> {
    if !is_header_file(filename) {
        return Ok(filename.to_path_buf());
    }
    for extension in SOURCE_EXTENSIONS {
        let candidate = filename.with_extension(extension);
        if candidate.try_exists()? {
            log::debug!(
                "Header {} resolved to source {}",
                filename.display(),
                candidate.display()
            );
            return Ok(candidate);
        }
    }
    log::debug!("No source file found for header {}", filename.display());
    Ok(filename.to_path_buf())
}
