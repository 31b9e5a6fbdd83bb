//! Replay command: drive the engine through a scripted sequence of inputs.

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;
use std::time::Duration;

use camino::Utf8PathBuf;
use cartosync_assets::{AssetLoader, AssetLoaderConfig, AssetPipeline, ImageCache};
use cartosync_core::reconcile::ReconcileSummary;
use cartosync_core::recording::{
    OverlayId, OverlayKind, RecordedImage, RecordedOverlay, RecordingAssetSink, RecordingSurface,
};
use cartosync_core::{
    AssetCompletion, AssetSink, ClusterRepresentative, ClusterSummary, MapController, MapEvent,
    Marker, Polyline, Region, RegionAttribute, RegionClusteringOptions,
};
use clap::Parser;
use log::warn;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::files::{load_json, require_existing, write_report};
use crate::{
    ARG_REPLAY_ASSET_TIMEOUT, ARG_REPLAY_LOAD_ASSETS, ARG_REPLAY_OUTPUT, ARG_REPLAY_SCRIPT,
    ARG_REPLAY_VIEWPORT_HEIGHT, ARG_REPLAY_VIEWPORT_WIDTH, CliError, ENV_REPLAY_SCRIPT,
};

/// Viewport assumed when neither flags nor configuration name one.
pub(crate) const DEFAULT_VIEWPORT: Viewport = Viewport {
    width: 400,
    height: 800,
};

/// CLI arguments for the `replay` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Apply a JSON scene script (marker and polyline lists, \
                 clustering rules, zoom changes, taps and region changes) \
                 to an in-memory map and report every step. Options can come \
                 from CLI flags, configuration files, or environment \
                 variables.",
    about = "Replay a scene script against an in-memory map"
)]
#[ortho_config(prefix = "CARTOSYNC")]
pub(crate) struct ReplayArgs {
    /// Path to the JSON scene script.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) script: Option<Utf8PathBuf>,
    /// Write the report here instead of stdout.
    #[arg(long = ARG_REPLAY_OUTPUT, value_name = "path")]
    #[serde(default)]
    pub(crate) output: Option<Utf8PathBuf>,
    /// Viewport width in pixels, used to turn regions into zoom levels.
    #[arg(long = ARG_REPLAY_VIEWPORT_WIDTH, value_name = "px")]
    #[serde(default)]
    pub(crate) viewport_width: Option<u32>,
    /// Viewport height in pixels.
    #[arg(long = ARG_REPLAY_VIEWPORT_HEIGHT, value_name = "px")]
    #[serde(default)]
    pub(crate) viewport_height: Option<u32>,
    /// Resolve marker images and polyline textures while replaying.
    #[arg(long = ARG_REPLAY_LOAD_ASSETS, value_name = "bool")]
    #[serde(default)]
    pub(crate) load_assets: Option<bool>,
    /// Timeout for each image load and for waiting on them after a step.
    #[arg(long = ARG_REPLAY_ASSET_TIMEOUT, value_name = "secs")]
    #[serde(default)]
    pub(crate) asset_timeout_secs: Option<u64>,
}

impl ReplayArgs {
    pub(crate) fn into_config(self) -> Result<ReplayConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ReplayConfig::try_from(merged)
    }
}

/// Pixel size of the simulated map view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Viewport {
    pub(crate) width: u32,
    pub(crate) height: u32,
}

/// Resolved `replay` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ReplayConfig {
    pub(crate) script: Utf8PathBuf,
    pub(crate) output: Option<Utf8PathBuf>,
    pub(crate) viewport: Viewport,
    pub(crate) load_assets: bool,
    pub(crate) asset_timeout: Duration,
}

impl TryFrom<ReplayArgs> for ReplayConfig {
    type Error = CliError;

    fn try_from(args: ReplayArgs) -> Result<Self, Self::Error> {
        let script = args.script.ok_or(CliError::MissingArgument {
            field: ARG_REPLAY_SCRIPT,
            env: ENV_REPLAY_SCRIPT,
        })?;
        let viewport = Viewport {
            width: args.viewport_width.unwrap_or(DEFAULT_VIEWPORT.width),
            height: args.viewport_height.unwrap_or(DEFAULT_VIEWPORT.height),
        };
        let asset_timeout = args.asset_timeout_secs.map_or_else(
            || AssetLoaderConfig::default().timeout,
            Duration::from_secs,
        );
        Ok(Self {
            script,
            output: args.output,
            viewport,
            load_assets: args.load_assets.unwrap_or(false),
            asset_timeout,
        })
    }
}

/// A scene script: an optional starting zoom and the steps to apply.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ReplayScript {
    #[serde(default)]
    pub(crate) initial_zoom: Option<f64>,
    #[serde(default)]
    pub(crate) steps: Vec<ReplayStep>,
}

/// One scripted input.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub(crate) enum ReplayStep {
    /// Replace the marker list.
    SetMarkers { markers: Vec<Marker> },
    /// Replace the polyline list.
    SetPolylines { polylines: Vec<Polyline> },
    /// Replace the clustering configuration.
    SetRegionClusteringOptions { options: RegionClusteringOptions },
    /// The map settles at a new zoom level.
    Zoom { zoom_level: f64 },
    /// The user taps the live overlay of `kind` with `id`.
    Tap { kind: OverlayKind, id: String },
    /// The visible region changes; the zoom follows from the viewport.
    RegionChanged { region: Region },
}

impl ReplayStep {
    const fn name(&self) -> &'static str {
        match self {
            Self::SetMarkers { .. } => "setMarkers",
            Self::SetPolylines { .. } => "setPolylines",
            Self::SetRegionClusteringOptions { .. } => "setRegionClusteringOptions",
            Self::Zoom { .. } => "zoom",
            Self::Tap { .. } => "tap",
            Self::RegionChanged { .. } => "regionChanged",
        }
    }
}

/// What one step did.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StepReport {
    pub(crate) index: usize,
    pub(crate) step: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) reconcile: Option<ReconcileSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) clusters: Option<ClusterSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) zoom_level: Option<f64>,
    pub(crate) active_rule: Option<RegionAttribute>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) event: Option<MapEvent>,
    pub(crate) images_applied: usize,
}

/// Outcome of a whole replay.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ReplayReport {
    pub(crate) steps: Vec<StepReport>,
    pub(crate) events: Vec<MapEvent>,
    pub(crate) overlays: Vec<RecordedOverlay>,
    pub(crate) clusters: Vec<ClusterRepresentative>,
    pub(crate) active_rule: Option<RegionAttribute>,
}

/// An asset sink whose finished loads can be collected after each step.
pub(crate) trait SettleAssets: AssetSink<OverlayId> {
    /// Completed loads ready to hand to the controller.
    fn settle(&self) -> Vec<AssetCompletion<OverlayId, RecordedImage>>;
}

impl SettleAssets for RecordingAssetSink<OverlayId> {
    fn settle(&self) -> Vec<AssetCompletion<OverlayId, RecordedImage>> {
        // Requests are counted in the step summaries; nothing ever loads.
        drop(self.take());
        Vec::new()
    }
}

impl SettleAssets for AssetPipeline<OverlayId> {
    fn settle(&self) -> Vec<AssetCompletion<OverlayId, RecordedImage>> {
        self.drain_blocking(self.loader().config().timeout)
            .into_iter()
            .map(|completion| {
                completion.map_image(|image| RecordedImage {
                    width: image.width(),
                    height: image.height(),
                })
            })
            .collect()
    }
}

pub(crate) fn run_replay(args: ReplayArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = args.into_config()?;
    run_replay_with(&config, writer)
}

pub(crate) fn run_replay_with(config: &ReplayConfig, writer: &mut dyn Write) -> Result<(), CliError> {
    require_existing(&config.script, ARG_REPLAY_SCRIPT)?;
    let script: ReplayScript = load_json(&config.script)?;
    let report = if config.load_assets {
        let loader_config = AssetLoaderConfig::new().with_timeout(config.asset_timeout);
        let loader = AssetLoader::with_config(ImageCache::new(), loader_config)
            .map_err(CliError::BuildAssets)?;
        let pipeline = AssetPipeline::new(loader).map_err(CliError::BuildAssets)?;
        replay(&script, pipeline, config.viewport)
    } else {
        replay(&script, RecordingAssetSink::new(), config.viewport)
    };
    write_report(writer, config.output.as_deref(), &report)
}

/// Apply every step of `script` to a fresh recording surface.
pub(crate) fn replay<A: SettleAssets>(
    script: &ReplayScript,
    assets: A,
    viewport: Viewport,
) -> ReplayReport {
    let mut surface = RecordingSurface::new();
    if let Some(zoom_level) = script.initial_zoom {
        surface.set_zoom_level(zoom_level);
    }
    let mut controller = MapController::new(surface, assets);
    let events = Rc::new(RefCell::new(Vec::new()));
    let listener_events = Rc::clone(&events);
    controller.subscribe(move |event| listener_events.borrow_mut().push(event.clone()));

    let steps = script
        .steps
        .iter()
        .enumerate()
        .map(|(index, step)| {
            let mut report = apply_step(&mut controller, step, viewport);
            report.index = index;
            report.images_applied = apply_settled(&mut controller);
            report
        })
        .collect();

    let overlays = controller
        .surface()
        .overlays()
        .map(|(_, overlay)| overlay.clone())
        .collect();
    let clusters = controller.clusters().cloned().collect();
    let active_rule = controller.active_rule();
    let emitted = events.borrow().clone();
    ReplayReport {
        steps,
        events: emitted,
        overlays,
        clusters,
        active_rule,
    }
}

fn apply_step<A: SettleAssets>(
    controller: &mut MapController<RecordingSurface, A>,
    step: &ReplayStep,
    viewport: Viewport,
) -> StepReport {
    let mut report = StepReport {
        step: step.name(),
        ..StepReport::default()
    };
    match step {
        ReplayStep::SetMarkers { markers } => {
            report.reconcile = Some(controller.set_markers(markers.clone()));
        }
        ReplayStep::SetPolylines { polylines } => {
            report.reconcile = Some(controller.set_polylines(polylines));
        }
        ReplayStep::SetRegionClusteringOptions { options } => {
            report.clusters = Some(controller.set_region_clustering_options(options.clone()));
        }
        ReplayStep::Zoom { zoom_level } => {
            report.zoom_level = Some(zoom_to(controller, *zoom_level));
        }
        ReplayStep::Tap { kind, id } => {
            report.event = tap(controller, *kind, id);
        }
        ReplayStep::RegionChanged { region } => {
            controller.handle_region_changed(*region);
            let zoom_level = region.zoom_level(viewport.width, viewport.height);
            if zoom_level.is_finite() {
                report.zoom_level = Some(zoom_to(controller, zoom_level));
            } else {
                warn!("region span {:?} has no finite zoom level", region.span);
            }
        }
    }
    report.active_rule = controller.active_rule();
    report
}

fn zoom_to<A: SettleAssets>(
    controller: &mut MapController<RecordingSurface, A>,
    zoom_level: f64,
) -> f64 {
    controller.surface_mut().set_zoom_level(zoom_level);
    controller.handle_zoom_changed()
}

fn tap<A: SettleAssets>(
    controller: &mut MapController<RecordingSurface, A>,
    kind: OverlayKind,
    id: &str,
) -> Option<MapEvent> {
    let Some(handle) = controller.surface().handle_of(kind, id) else {
        warn!("tap on {kind:?} '{id}' matched no live overlay");
        return None;
    };
    controller.handle_tap(handle)
}

fn apply_settled<A: SettleAssets>(controller: &mut MapController<RecordingSurface, A>) -> usize {
    let completions = controller.assets().settle();
    completions
        .into_iter()
        .map(|completion| controller.apply_asset(completion))
        .filter(|applied| *applied)
        .count()
}
