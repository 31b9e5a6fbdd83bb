//! Polyline records and their resolved drawing style.

use geo::Coord;
use thiserror::Error;

use crate::style::Rgba;

/// Stroke width used when a polyline style omits one.
pub const DEFAULT_LINE_WIDTH: f64 = 5.0;

/// How consecutive segments are joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum LineJoin {
    /// Sharp corner.
    #[default]
    Miter,
    /// Flattened corner.
    Bevel,
    /// Rounded corner.
    Round,
}

/// How the ends of a line are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum LineCap {
    /// Flat end at the last vertex.
    #[default]
    Butt,
    /// Square end extending past the last vertex.
    Square,
    /// Arrow head.
    Arrow,
    /// Rounded end.
    Round,
}

/// Dash pattern of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum LineDash {
    /// Continuous line.
    #[default]
    Solid,
    /// Square dashes.
    Square,
    /// Round dots.
    Dot,
}

/// Style attributes supplied with a polyline. Absent values fall back to the
/// defaults applied by [`PolylineStyle::resolve`].
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct PolylineStyle {
    /// Stroke colour as `#RRGGBB[AA]`.
    pub stroke_color: Option<String>,
    /// Fill colour as `#RRGGBB[AA]`.
    pub fill_color: Option<String>,
    /// Stroke width in points.
    pub line_width: Option<f64>,
    /// Segment join.
    pub line_join: Option<LineJoin>,
    /// End cap.
    pub line_cap: Option<LineCap>,
    /// Dash pattern.
    pub line_dash: Option<LineDash>,
    /// Miter limit for [`LineJoin::Miter`].
    pub miter_limit: Option<f64>,
    /// Texture image reference, loaded like a marker image.
    pub texture_image: Option<String>,
    /// Whether the line responds to taps.
    pub user_interaction_enabled: Option<bool>,
}

/// A [`PolylineStyle`] with every default applied.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ResolvedPolylineStyle {
    /// Stroke colour.
    pub stroke: Rgba,
    /// Fill colour, if any.
    pub fill: Option<Rgba>,
    /// Stroke width in points.
    pub line_width: f64,
    /// Segment join.
    pub line_join: LineJoin,
    /// End cap.
    pub line_cap: LineCap,
    /// Dash pattern.
    pub line_dash: LineDash,
    /// Miter limit, if any.
    pub miter_limit: Option<f64>,
    /// Texture image reference, if any.
    pub texture_image: Option<String>,
    /// Whether the line responds to taps.
    pub interactive: bool,
}

impl PolylineStyle {
    /// Apply defaults: black stroke, width [`DEFAULT_LINE_WIDTH`], miter
    /// join, butt cap, solid line and interaction enabled.
    ///
    /// # Examples
    /// ```
    /// use cartosync_core::{PolylineStyle, Rgba};
    ///
    /// let resolved = PolylineStyle::default().resolve();
    /// assert_eq!(resolved.stroke, Rgba::BLACK);
    /// assert_eq!(resolved.line_width, 5.0);
    /// assert!(resolved.interactive);
    /// ```
    #[must_use]
    pub fn resolve(&self) -> ResolvedPolylineStyle {
        ResolvedPolylineStyle {
            stroke: Rgba::parse_or(self.stroke_color.as_deref(), Rgba::BLACK, "strokeColor"),
            fill: self
                .fill_color
                .as_deref()
                .and_then(|raw| match Rgba::from_hex(raw) {
                    Ok(colour) => Some(colour),
                    Err(err) => {
                        log::warn!("fillColor: {err}; leaving unfilled");
                        None
                    }
                }),
            line_width: self
                .line_width
                .filter(|width| width.is_finite() && *width > 0.0)
                .unwrap_or(DEFAULT_LINE_WIDTH),
            line_join: self.line_join.unwrap_or_default(),
            line_cap: self.line_cap.unwrap_or_default(),
            line_dash: self.line_dash.unwrap_or_default(),
            miter_limit: self.miter_limit,
            texture_image: self.texture_image.clone(),
            interactive: self.user_interaction_enabled.unwrap_or(true),
        }
    }
}

/// Declarative description of one polyline overlay.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct Polyline {
    /// Caller-chosen identifier.
    pub id: String,
    /// Vertices in drawing order.
    #[cfg_attr(feature = "serde", serde(with = "crate::geometry::lat_lng::vec"))]
    pub coordinates: Vec<Coord<f64>>,
    /// Drawing style.
    pub style: PolylineStyle,
}

/// Errors returned by [`Polyline::validate`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PolylineError {
    /// A line needs at least two vertices.
    #[error("polyline '{id}' has {count} coordinate(s); at least 2 are required")]
    TooFewCoordinates {
        /// Offending polyline.
        id: String,
        /// Number of vertices supplied.
        count: usize,
    },
}

impl Polyline {
    /// Construct a polyline with the default style.
    #[must_use]
    pub fn new(id: impl Into<String>, coordinates: Vec<Coord<f64>>) -> Self {
        Self {
            id: id.into(),
            coordinates,
            style: PolylineStyle::default(),
        }
    }

    /// Replace the style.
    #[must_use]
    pub fn with_style(mut self, style: PolylineStyle) -> Self {
        self.style = style;
        self
    }

    /// Check that the polyline can be drawn.
    ///
    /// # Errors
    ///
    /// Returns [`PolylineError::TooFewCoordinates`] for fewer than two
    /// vertices.
    pub fn validate(&self) -> Result<(), PolylineError> {
        if self.coordinates.len() < 2 {
            return Err(PolylineError::TooFewCoordinates {
                id: self.id.clone(),
                count: self.coordinates.len(),
            });
        }
        Ok(())
    }
}
