//! Marker records and field-level change detection.
//!
//! A [`Marker`] is an immutable snapshot of what the host wants rendered.
//! [`marker_changes`] compares two snapshots field by field over the closed
//! list in [`MarkerField::ALL`], producing the patch the reconciler forwards
//! to the surface.

use geo::Coord;

use crate::clustering::RegionAttribute;
use crate::diff::DiffStrategy;
use crate::geometry::{Point, Size};
use crate::style::{MarkerStyle, PinColor, Rgba, TeardropFill, TextStyle};

/// Remote, local or inline image shown by a custom marker.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MarkerImage {
    /// `http(s)://` URL, `data:image` URI or local path.
    pub url: String,
    /// Display size in points.
    pub size: Size,
}

impl MarkerImage {
    /// Construct an image reference.
    #[must_use]
    pub fn new(url: impl Into<String>, size: Size) -> Self {
        Self {
            url: url.into(),
            size,
        }
    }
}

/// Administrative region names used to group markers into clusters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GroupingAttributes {
    /// Province name.
    pub province: Option<String>,
    /// City name.
    pub city: Option<String>,
    /// District name.
    pub district: Option<String>,
}

impl GroupingAttributes {
    /// Value of `attribute`, treating blank strings as absent.
    #[must_use]
    pub fn get(&self, attribute: RegionAttribute) -> Option<&str> {
        let value = match attribute {
            RegionAttribute::Province => self.province.as_deref(),
            RegionAttribute::City => self.city.as_deref(),
            RegionAttribute::District => self.district.as_deref(),
        };
        value.filter(|name| !name.trim().is_empty())
    }
}

/// Declarative description of one marker overlay.
///
/// # Examples
/// ```
/// use cartosync_core::{Marker, MarkerStyle};
/// use geo::Coord;
///
/// let marker = Marker::new("cafe", Coord { x: 116.39, y: 39.9 })
///     .with_style(MarkerStyle::Pin)
///     .with_title("Cafe");
/// assert_eq!(marker.title.as_deref(), Some("Cafe"));
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct Marker {
    /// Caller-chosen identifier, unique within one marker list.
    pub id: String,
    /// Geographic position.
    #[cfg_attr(feature = "serde", serde(with = "crate::geometry::lat_lng"))]
    pub coordinate: Coord<f64>,
    /// Presentation family.
    pub style: MarkerStyle,
    /// Callout title.
    pub title: Option<String>,
    /// Callout subtitle.
    pub subtitle: Option<String>,
    /// Offset of the view centre from the coordinate.
    pub center_offset: Option<Point>,
    /// Offset of the callout bubble.
    pub callout_offset: Option<Point>,
    /// Offset of the custom text label.
    pub text_offset: Option<Point>,
    /// Custom marker image.
    pub image: Option<MarkerImage>,
    /// Custom marker text styling.
    pub text_style: Option<TextStyle>,
    /// Pin colour.
    pub pin_color: Option<PinColor>,
    /// Teardrop label text.
    pub teardrop_label: Option<String>,
    /// Teardrop fill colour as `#RRGGBB[AA]`.
    pub teardrop_fill_color: Option<String>,
    /// Seed for a host-derived teardrop fill.
    pub teardrop_fill_color_seed: Option<String>,
    /// Secondary text shown below the teardrop badge.
    pub teardrop_info_text: Option<String>,
    /// Whether the marker responds to taps.
    pub enabled: Option<bool>,
    /// Whether the marker is drawn highlighted.
    pub highlighted: Option<bool>,
    /// Whether tapping shows a callout.
    pub can_show_callout: Option<bool>,
    /// Whether the marker can be dragged.
    pub draggable: Option<bool>,
    /// Whether the host may nudge the marker to avoid overlaps.
    pub can_adjust_position: Option<bool>,
    /// Region names used for clustering.
    pub grouping_attributes: GroupingAttributes,
}

impl Marker {
    /// Create a custom-style marker at `coordinate` with every optional field
    /// unset.
    #[must_use]
    pub fn new(id: impl Into<String>, coordinate: Coord<f64>) -> Self {
        Self {
            id: id.into(),
            coordinate,
            ..Self::default()
        }
    }

    /// Set the presentation family.
    #[must_use]
    pub const fn with_style(mut self, style: MarkerStyle) -> Self {
        self.style = style;
        self
    }

    /// Set the callout title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the custom marker image.
    #[must_use]
    pub fn with_image(mut self, image: MarkerImage) -> Self {
        self.image = Some(image);
        self
    }

    /// Set the clustering region names.
    #[must_use]
    pub fn with_grouping(mut self, grouping: GroupingAttributes) -> Self {
        self.grouping_attributes = grouping;
        self
    }

    /// Fill for a teardrop marker.
    ///
    /// An explicit colour wins, then the seed, then
    /// [`Rgba::TEARDROP_DEFAULT`]. An unparsable explicit colour is logged
    /// and skipped.
    #[must_use]
    pub fn teardrop_fill(&self) -> TeardropFill {
        if let Some(raw) = self.teardrop_fill_color.as_deref() {
            match Rgba::from_hex(raw) {
                Ok(colour) => return TeardropFill::Solid(colour),
                Err(err) => log::warn!("marker {}: teardropFillColor: {err}", self.id),
            }
        }
        self.teardrop_fill_color_seed.as_ref().map_or(
            TeardropFill::Solid(Rgba::TEARDROP_DEFAULT),
            |seed| TeardropFill::Seeded(seed.clone()),
        )
    }
}

/// Closed set of marker fields compared by [`marker_changes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum MarkerField {
    /// [`Marker::coordinate`].
    Coordinate,
    /// [`Marker::title`].
    Title,
    /// [`Marker::subtitle`].
    Subtitle,
    /// [`Marker::center_offset`].
    CenterOffset,
    /// [`Marker::callout_offset`].
    CalloutOffset,
    /// [`Marker::text_offset`].
    TextOffset,
    /// [`Marker::image`].
    Image,
    /// [`Marker::text_style`].
    TextStyle,
    /// [`Marker::pin_color`].
    PinColor,
    /// [`Marker::teardrop_label`].
    TeardropLabel,
    /// [`Marker::teardrop_fill_color`].
    TeardropFillColor,
    /// [`Marker::teardrop_fill_color_seed`].
    TeardropFillColorSeed,
    /// [`Marker::teardrop_info_text`].
    TeardropInfoText,
    /// [`Marker::enabled`].
    Enabled,
    /// [`Marker::highlighted`].
    Highlighted,
    /// [`Marker::can_show_callout`].
    CanShowCallout,
    /// [`Marker::draggable`].
    Draggable,
    /// [`Marker::can_adjust_position`].
    CanAdjustPosition,
    /// [`Marker::grouping_attributes`].
    GroupingAttributes,
}

impl MarkerField {
    /// Every comparable field in patch order.
    pub const ALL: [Self; 19] = [
        Self::Coordinate,
        Self::Title,
        Self::Subtitle,
        Self::CenterOffset,
        Self::CalloutOffset,
        Self::TextOffset,
        Self::Image,
        Self::TextStyle,
        Self::PinColor,
        Self::TeardropLabel,
        Self::TeardropFillColor,
        Self::TeardropFillColorSeed,
        Self::TeardropInfoText,
        Self::Enabled,
        Self::Highlighted,
        Self::CanShowCallout,
        Self::Draggable,
        Self::CanAdjustPosition,
        Self::GroupingAttributes,
    ];

    /// Wire name of the field.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Coordinate => "coordinate",
            Self::Title => "title",
            Self::Subtitle => "subtitle",
            Self::CenterOffset => "centerOffset",
            Self::CalloutOffset => "calloutOffset",
            Self::TextOffset => "textOffset",
            Self::Image => "image",
            Self::TextStyle => "textStyle",
            Self::PinColor => "pinColor",
            Self::TeardropLabel => "teardropLabel",
            Self::TeardropFillColor => "teardropFillColor",
            Self::TeardropFillColorSeed => "teardropFillColorSeed",
            Self::TeardropInfoText => "teardropInfoText",
            Self::Enabled => "enabled",
            Self::Highlighted => "highlighted",
            Self::CanShowCallout => "canShowCallout",
            Self::Draggable => "draggable",
            Self::CanAdjustPosition => "canAdjustPosition",
            Self::GroupingAttributes => "groupingAttributes",
        }
    }

    /// Whether a live view of `style` renders this field.
    ///
    /// Style-specific fields are dropped for the other styles. Grouping
    /// attributes only feed clustering and never reach a view.
    #[must_use]
    pub const fn applies_to(self, style: MarkerStyle) -> bool {
        match self {
            Self::TextOffset | Self::TextStyle | Self::Image => {
                matches!(style, MarkerStyle::Custom)
            }
            Self::PinColor => matches!(style, MarkerStyle::Pin),
            Self::TeardropLabel
            | Self::TeardropFillColor
            | Self::TeardropFillColorSeed
            | Self::TeardropInfoText => matches!(style, MarkerStyle::Teardrop),
            Self::GroupingAttributes => false,
            Self::Coordinate
            | Self::Title
            | Self::Subtitle
            | Self::CenterOffset
            | Self::CalloutOffset
            | Self::Enabled
            | Self::Highlighted
            | Self::CanShowCallout
            | Self::Draggable
            | Self::CanAdjustPosition => true,
        }
    }

    /// Snapshot this field's value from `marker`.
    #[must_use]
    pub fn value_of(self, marker: &Marker) -> FieldValue {
        match self {
            Self::Coordinate => FieldValue::Coordinate(marker.coordinate),
            Self::Title => FieldValue::Text(marker.title.clone()),
            Self::Subtitle => FieldValue::Text(marker.subtitle.clone()),
            Self::CenterOffset => FieldValue::Offset(marker.center_offset),
            Self::CalloutOffset => FieldValue::Offset(marker.callout_offset),
            Self::TextOffset => FieldValue::Offset(marker.text_offset),
            Self::Image => FieldValue::Image(marker.image.clone()),
            Self::TextStyle => FieldValue::TextStyle(marker.text_style.clone()),
            Self::PinColor => FieldValue::PinColor(marker.pin_color),
            Self::TeardropLabel => FieldValue::Text(marker.teardrop_label.clone()),
            Self::TeardropFillColor => FieldValue::Text(marker.teardrop_fill_color.clone()),
            Self::TeardropFillColorSeed => {
                FieldValue::Text(marker.teardrop_fill_color_seed.clone())
            }
            Self::TeardropInfoText => FieldValue::Text(marker.teardrop_info_text.clone()),
            Self::Enabled => FieldValue::Flag(marker.enabled),
            Self::Highlighted => FieldValue::Flag(marker.highlighted),
            Self::CanShowCallout => FieldValue::Flag(marker.can_show_callout),
            Self::Draggable => FieldValue::Flag(marker.draggable),
            Self::CanAdjustPosition => FieldValue::Flag(marker.can_adjust_position),
            Self::GroupingAttributes => FieldValue::Grouping(marker.grouping_attributes.clone()),
        }
    }
}

/// Value of one [`MarkerField`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum FieldValue {
    /// Geographic position.
    Coordinate(
        #[cfg_attr(
            feature = "serde",
            serde(serialize_with = "crate::geometry::lat_lng::serialize")
        )]
        Coord<f64>,
    ),
    /// Optional text.
    Text(Option<String>),
    /// Optional screen offset.
    Offset(Option<Point>),
    /// Optional image reference.
    Image(Option<MarkerImage>),
    /// Optional text styling.
    TextStyle(Option<TextStyle>),
    /// Optional pin colour.
    PinColor(Option<PinColor>),
    /// Optional boolean flag.
    Flag(Option<bool>),
    /// Region names.
    Grouping(GroupingAttributes),
}

/// A single field that differs between two snapshots of the same marker.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct FieldChange {
    /// Which field changed.
    pub key: MarkerField,
    /// Value before the change.
    pub old_value: FieldValue,
    /// Value after the change.
    pub new_value: FieldValue,
}

/// Compare every field in [`MarkerField::ALL`] and report the differences.
///
/// The identity and style are not compared; records that differ there are
/// never matched by [`MarkerDiff`].
#[must_use]
pub fn marker_changes(old: &Marker, new: &Marker) -> Vec<FieldChange> {
    MarkerField::ALL
        .iter()
        .filter_map(|&key| {
            let old_value = key.value_of(old);
            let new_value = key.value_of(new);
            (old_value != new_value).then_some(FieldChange {
                key,
                old_value,
                new_value,
            })
        })
        .collect()
}

/// Diff strategy pairing markers by `id` and `style`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkerDiff;

impl DiffStrategy<Marker> for MarkerDiff {
    type Change = FieldChange;

    fn is_same(&self, old: &Marker, new: &Marker) -> bool {
        old.id == new.id && old.style == new.style
    }

    fn changes(&self, old: &Marker, new: &Marker) -> Vec<FieldChange> {
        marker_changes(old, new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn base() -> Marker {
        Marker::new("m1", Coord { x: 1.0, y: 1.0 }).with_title("A")
    }

    #[rstest]
    fn identical_markers_have_no_changes(base: Marker) {
        assert!(marker_changes(&base, &base.clone()).is_empty());
    }

    #[rstest]
    fn title_change_is_reported_with_both_values(base: Marker) {
        let new = base.clone().with_title("B");
        let changes = marker_changes(&base, &new);
        assert_eq!(
            changes,
            vec![FieldChange {
                key: MarkerField::Title,
                old_value: FieldValue::Text(Some("A".into())),
                new_value: FieldValue::Text(Some("B".into())),
            }]
        );
    }

    #[rstest]
    fn changes_follow_field_order(base: Marker) {
        let mut new = base.clone().with_title("B");
        new.coordinate = Coord { x: 2.0, y: 2.0 };
        new.draggable = Some(true);
        let keys: Vec<_> = marker_changes(&base, &new).iter().map(|c| c.key).collect();
        assert_eq!(
            keys,
            vec![
                MarkerField::Coordinate,
                MarkerField::Title,
                MarkerField::Draggable
            ]
        );
    }

    #[rstest]
    #[case(MarkerField::Image, MarkerStyle::Custom, true)]
    #[case(MarkerField::Image, MarkerStyle::Pin, false)]
    #[case(MarkerField::PinColor, MarkerStyle::Pin, true)]
    #[case(MarkerField::PinColor, MarkerStyle::Teardrop, false)]
    #[case(MarkerField::TeardropLabel, MarkerStyle::Teardrop, true)]
    #[case(MarkerField::TeardropLabel, MarkerStyle::Custom, false)]
    #[case(MarkerField::Title, MarkerStyle::Teardrop, true)]
    #[case(MarkerField::GroupingAttributes, MarkerStyle::Custom, false)]
    fn field_applicability(
        #[case] field: MarkerField,
        #[case] style: MarkerStyle,
        #[case] expected: bool,
    ) {
        assert_eq!(field.applies_to(style), expected);
    }

    #[rstest]
    fn same_requires_matching_style(base: Marker) {
        let restyled = base.clone().with_style(MarkerStyle::Pin);
        assert!(MarkerDiff.is_same(&base, &base));
        assert!(!MarkerDiff.is_same(&base, &restyled));
    }

    #[rstest]
    #[case(Some("#112233"), None, TeardropFill::Solid(Rgba::opaque(0x11, 0x22, 0x33)))]
    #[case(Some("bogus"), Some("shop"), TeardropFill::Seeded("shop".into()))]
    #[case(None, Some("shop"), TeardropFill::Seeded("shop".into()))]
    #[case(None, None, TeardropFill::Solid(Rgba::TEARDROP_DEFAULT))]
    fn teardrop_fill_precedence(
        base: Marker,
        #[case] colour: Option<&str>,
        #[case] seed: Option<&str>,
        #[case] expected: TeardropFill,
    ) {
        let marker = Marker {
            teardrop_fill_color: colour.map(str::to_owned),
            teardrop_fill_color_seed: seed.map(str::to_owned),
            ..base
        };
        assert_eq!(marker.teardrop_fill(), expected);
    }

    #[rstest]
    fn blank_grouping_values_are_absent() {
        let grouping = GroupingAttributes {
            province: Some("Shanxi".into()),
            city: Some("  ".into()),
            district: None,
        };
        assert_eq!(grouping.get(RegionAttribute::Province), Some("Shanxi"));
        assert_eq!(grouping.get(RegionAttribute::City), None);
        assert_eq!(grouping.get(RegionAttribute::District), None);
    }

    #[cfg(feature = "serde")]
    #[rstest]
    fn deserialises_camel_case_record() {
        let json = r##"{
            "id": "t1",
            "coordinate": {"latitude": 37.8, "longitude": 112.5},
            "style": "teardrop",
            "teardropLabel": "7",
            "teardropFillColor": "#FF0000",
            "groupingAttributes": {"city": "Taiyuan"}
        }"##;
        let marker: Marker = serde_json::from_str(json).expect("valid marker json");
        assert_eq!(marker.coordinate, Coord { x: 112.5, y: 37.8 });
        assert_eq!(marker.style, MarkerStyle::Teardrop);
        assert_eq!(marker.teardrop_label.as_deref(), Some("7"));
        assert_eq!(
            marker.grouping_attributes.get(RegionAttribute::City),
            Some("Taiyuan")
        );

        let written = serde_json::to_value(&marker).expect("serialisable marker");
        assert_eq!(written["coordinate"]["latitude"], 37.8);
        assert_eq!(written["coordinate"]["longitude"], 112.5);
        let reread: Marker = serde_json::from_value(written).expect("round trip");
        assert_eq!(reread, marker);
    }

    #[cfg(feature = "serde")]
    #[rstest]
    fn coordinate_change_serialises_as_latitude_longitude() {
        let old = Marker::new("m", Coord { x: 1.0, y: 2.0 });
        let new = Marker::new("m", Coord { x: 3.0, y: 4.0 });
        let changes = marker_changes(&old, &new);
        let json = serde_json::to_value(&changes).expect("serialisable changes");
        assert_eq!(json[0]["key"], "coordinate");
        assert_eq!(json[0]["oldValue"]["latitude"], 2.0);
        assert_eq!(json[0]["newValue"]["latitude"], 4.0);
        assert_eq!(json[0]["newValue"]["longitude"], 3.0);
    }
}
