//! Screen-space and map-space value types shared by overlay records.
//!
//! Map positions use [`geo::Coord`] with `x = longitude` and `y = latitude`
//! in WGS84 degrees. On the wire they are `{"latitude", "longitude"}`
//! objects. Screen positions and sizes are expressed in points.

use geo::Coord;

/// Screen-space offset or position in points.
///
/// # Examples
/// ```
/// use cartosync_core::Point;
///
/// let offset = Point::new(0.0, -12.0);
/// assert_eq!(offset.y, -12.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    /// Horizontal component.
    pub x: f64,
    /// Vertical component.
    pub y: f64,
}

impl Point {
    /// Construct a point from its components.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Width and height in points.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Size {
    /// Horizontal extent.
    pub width: f64,
    /// Vertical extent.
    pub height: f64,
}

impl Size {
    /// Construct a size from width and height.
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Visible extent of a map region in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct RegionSpan {
    /// North-south extent.
    pub latitude_delta: f64,
    /// East-west extent.
    pub longitude_delta: f64,
}

impl RegionSpan {
    /// Approximate the span shown at `zoom` by a viewport of
    /// `width` x `height` pixels.
    ///
    /// One world width (360 degrees) is visible at zoom 0 and the span halves
    /// with every zoom level. The longitude span is scaled by the viewport
    /// aspect ratio; a zero height is treated as a square viewport.
    ///
    /// # Examples
    /// ```
    /// use cartosync_core::RegionSpan;
    ///
    /// let span = RegionSpan::for_zoom(1.0, 200, 100);
    /// assert_eq!(span.latitude_delta, 180.0);
    /// assert_eq!(span.longitude_delta, 360.0);
    /// ```
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        reason = "span derivation is inherently floating-point"
    )]
    pub fn for_zoom(zoom: f64, width: u32, height: u32) -> Self {
        let scale = 360.0 / zoom.exp2();
        Self {
            latitude_delta: scale,
            longitude_delta: scale * aspect_ratio(width, height),
        }
    }
}

/// A map region described by its centre and span.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Region {
    /// Centre of the visible area.
    #[cfg_attr(feature = "serde", serde(with = "lat_lng"))]
    pub center: Coord<f64>,
    /// Extent of the visible area.
    pub span: RegionSpan,
}

impl Region {
    /// Construct a region from its centre and span.
    #[must_use]
    pub const fn new(center: Coord<f64>, span: RegionSpan) -> Self {
        Self { center, span }
    }

    /// Zoom level at which the whole region fits a `width` x `height`
    /// viewport.
    ///
    /// The tighter of the latitude and longitude constraints wins.
    ///
    /// # Examples
    /// ```
    /// use cartosync_core::{Region, RegionSpan};
    /// use geo::Coord;
    ///
    /// let span = RegionSpan::for_zoom(4.0, 100, 100);
    /// let region = Region::new(Coord { x: 0.0, y: 0.0 }, span);
    /// assert!((region.zoom_level(100, 100) - 4.0).abs() < 1e-9);
    /// ```
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        reason = "zoom derivation is inherently floating-point"
    )]
    pub fn zoom_level(&self, width: u32, height: u32) -> f64 {
        let zoom_lat = (360.0 / self.span.latitude_delta).log2();
        let zoom_lng = (360.0 * aspect_ratio(width, height) / self.span.longitude_delta).log2();
        zoom_lat.min(zoom_lng)
    }
}

/// Serde adapters writing [`Coord`] as `{"latitude": y, "longitude": x}`.
///
/// Use with `#[serde(with = "...")]` on a single coordinate, or the `vec`
/// and `option` submodules for sequences and optional positions.
#[cfg(feature = "serde")]
pub(crate) mod lat_lng {
    use geo::Coord;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct LatLng {
        latitude: f64,
        longitude: f64,
    }

    impl From<Coord<f64>> for LatLng {
        fn from(coord: Coord<f64>) -> Self {
            Self {
                latitude: coord.y,
                longitude: coord.x,
            }
        }
    }

    impl From<LatLng> for Coord<f64> {
        fn from(position: LatLng) -> Self {
            Self {
                x: position.longitude,
                y: position.latitude,
            }
        }
    }

    pub(crate) fn serialize<S: Serializer>(
        coord: &Coord<f64>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        LatLng::from(*coord).serialize(serializer)
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Coord<f64>, D::Error> {
        LatLng::deserialize(deserializer).map(Coord::from)
    }

    pub(crate) mod vec {
        use super::LatLng;
        use geo::Coord;
        use serde::{Deserialize, Deserializer, Serializer};

        pub(crate) fn serialize<S: Serializer>(
            coords: &[Coord<f64>],
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            serializer.collect_seq(coords.iter().copied().map(LatLng::from))
        }

        pub(crate) fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Vec<Coord<f64>>, D::Error> {
            let positions = Vec::<LatLng>::deserialize(deserializer)?;
            Ok(positions.into_iter().map(Coord::from).collect())
        }
    }

    pub(crate) mod option {
        use super::LatLng;
        use geo::Coord;
        use serde::{Serialize, Serializer};

        pub(crate) fn serialize<S: Serializer>(
            coord: &Option<Coord<f64>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            coord.map(LatLng::from).serialize(serializer)
        }
    }
}

#[expect(
    clippy::float_arithmetic,
    reason = "aspect ratio is a floating-point quotient"
)]
fn aspect_ratio(width: u32, height: u32) -> f64 {
    if height == 0 {
        return 1.0;
    }
    f64::from(width) / f64::from(height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn zero_zoom_shows_whole_world() {
        let span = RegionSpan::for_zoom(0.0, 100, 100);
        assert_eq!(span.latitude_delta, 360.0);
        assert_eq!(span.longitude_delta, 360.0);
    }

    #[rstest]
    fn zero_height_is_treated_as_square() {
        let span = RegionSpan::for_zoom(2.0, 640, 0);
        assert_eq!(span.latitude_delta, span.longitude_delta);
    }

    #[rstest]
    #[case(3.0, 1080, 1920)]
    #[case(9.5, 1920, 1080)]
    #[case(15.25, 400, 400)]
    fn zoom_level_inverts_span(#[case] zoom: f64, #[case] width: u32, #[case] height: u32) {
        let region = Region::new(
            Coord { x: 112.5, y: 37.8 },
            RegionSpan::for_zoom(zoom, width, height),
        );
        assert!((region.zoom_level(width, height) - zoom).abs() < 1e-9);
    }

    #[rstest]
    fn zoom_level_uses_tighter_axis() {
        let region = Region::new(
            Coord { x: 0.0, y: 0.0 },
            RegionSpan {
                latitude_delta: 45.0,
                longitude_delta: 11.25,
            },
        );
        // Latitude alone allows zoom 3; longitude forces zoom 5 for a square
        // viewport, so the smaller value wins.
        assert!((region.zoom_level(100, 100) - 3.0).abs() < 1e-9);
    }

    #[cfg(feature = "serde")]
    #[rstest]
    fn region_centre_uses_latitude_and_longitude() {
        let json = r#"{
            "center": {"latitude": 37.8, "longitude": 112.5},
            "span": {"latitudeDelta": 1.0, "longitudeDelta": 2.0}
        }"#;
        let region: Region = serde_json::from_str(json).expect("valid region json");
        assert_eq!(region.center, Coord { x: 112.5, y: 37.8 });

        let written = serde_json::to_value(region).expect("serialisable region");
        assert_eq!(written["center"]["latitude"], 37.8);
        assert_eq!(written["center"]["longitude"], 112.5);
        assert!(written["center"].get("x").is_none());
    }
}
