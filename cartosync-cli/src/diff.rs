//! Diff command: show how one marker list reconciles into another.

use std::io::Write;

use camino::Utf8PathBuf;
use cartosync_core::{FieldChange, Marker, MarkerDiff, MarkerStyle, diff};
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::files::{load_json, require_existing, write_report};
use crate::{ARG_DIFF_NEW, ARG_DIFF_OLD, CliError, ENV_DIFF_NEW, ENV_DIFF_OLD};

/// CLI arguments for the `diff` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Compare two JSON marker lists and print which markers \
                 would be added, patched in place or removed, with the \
                 changed fields of every patch.",
    about = "Diff two marker lists"
)]
#[ortho_config(prefix = "CARTOSYNC")]
pub(crate) struct DiffArgs {
    /// Marker list currently on the map.
    #[arg(value_name = "old")]
    #[serde(default)]
    pub(crate) old: Option<Utf8PathBuf>,
    /// Marker list to apply.
    #[arg(value_name = "new")]
    #[serde(default)]
    pub(crate) new: Option<Utf8PathBuf>,
}

impl DiffArgs {
    pub(crate) fn into_config(self) -> Result<DiffConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        DiffConfig::try_from(merged)
    }
}

/// Resolved `diff` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DiffConfig {
    pub(crate) old: Utf8PathBuf,
    pub(crate) new: Utf8PathBuf,
}

impl TryFrom<DiffArgs> for DiffConfig {
    type Error = CliError;

    fn try_from(args: DiffArgs) -> Result<Self, Self::Error> {
        let old = args.old.ok_or(CliError::MissingArgument {
            field: ARG_DIFF_OLD,
            env: ENV_DIFF_OLD,
        })?;
        let new = args.new.ok_or(CliError::MissingArgument {
            field: ARG_DIFF_NEW,
            env: ENV_DIFF_NEW,
        })?;
        Ok(Self { old, new })
    }
}

/// Identifier and style of a marker entering or leaving the map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct MarkerRef {
    pub(crate) id: String,
    pub(crate) style: MarkerStyle,
}

impl From<&Marker> for MarkerRef {
    fn from(marker: &Marker) -> Self {
        Self {
            id: marker.id.clone(),
            style: marker.style,
        }
    }
}

/// A marker patched in place.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct PatchedMarker {
    pub(crate) id: String,
    pub(crate) changes: Vec<FieldChange>,
}

/// Marker diff in reconciliation order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DiffReport {
    pub(crate) to_remove: Vec<MarkerRef>,
    pub(crate) to_update: Vec<PatchedMarker>,
    pub(crate) to_add: Vec<MarkerRef>,
}

impl DiffReport {
    pub(crate) fn between(old: &[Marker], new: &[Marker]) -> Self {
        let result = diff(old, new, &MarkerDiff);
        Self {
            to_remove: result.to_remove.into_iter().map(MarkerRef::from).collect(),
            to_update: result
                .to_update
                .into_iter()
                .map(|update| PatchedMarker {
                    id: update.new.id.clone(),
                    changes: update.changes,
                })
                .collect(),
            to_add: result.to_add.into_iter().map(MarkerRef::from).collect(),
        }
    }
}

pub(crate) fn run_diff(args: DiffArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = args.into_config()?;
    run_diff_with(&config, writer)
}

pub(crate) fn run_diff_with(config: &DiffConfig, writer: &mut dyn Write) -> Result<(), CliError> {
    require_existing(&config.old, ARG_DIFF_OLD)?;
    require_existing(&config.new, ARG_DIFF_NEW)?;
    let old: Vec<Marker> = load_json(&config.old)?;
    let new: Vec<Marker> = load_json(&config.new)?;
    write_report(writer, None, &DiffReport::between(&old, &new))
}
