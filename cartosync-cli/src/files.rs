//! Shared input loading and report writing for CLI commands.

use std::io::{ErrorKind, Write};

use camino::Utf8Path;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::CliError;

/// Fail unless `path` names an existing regular file.
pub(crate) fn require_existing(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
    match cartosync_fs::is_file(path) {
        Ok(true) => Ok(()),
        Ok(false) if path.exists() => Err(CliError::SourcePathNotFile {
            field,
            path: path.to_path_buf(),
        }),
        Ok(false) => Err(CliError::MissingSourceFile {
            field,
            path: path.to_path_buf(),
        }),
        Err(source) if source.kind() == ErrorKind::NotFound => Err(CliError::MissingSourceFile {
            field,
            path: path.to_path_buf(),
        }),
        Err(source) => Err(CliError::ReadInput {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Read and decode a JSON document.
pub(crate) fn load_json<T: DeserializeOwned>(path: &Utf8Path) -> Result<T, CliError> {
    let contents = cartosync_fs::read_string(path).map_err(|source| CliError::ReadInput {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| CliError::ParseInput {
        path: path.to_path_buf(),
        source,
    })
}

/// Pretty-print `report` to `output` when given, otherwise to `writer`.
pub(crate) fn write_report<T: Serialize>(
    writer: &mut dyn Write,
    output: Option<&Utf8Path>,
    report: &T,
) -> Result<(), CliError> {
    let mut payload = serde_json::to_string_pretty(report).map_err(CliError::SerialiseReport)?;
    payload.push('\n');
    match output {
        Some(path) => {
            cartosync_fs::write_string(path, &payload).map_err(|source| {
                CliError::WriteReportFile {
                    path: path.to_path_buf(),
                    source,
                }
            })
        }
        None => writer
            .write_all(payload.as_bytes())
            .map_err(CliError::WriteReport),
    }
}
