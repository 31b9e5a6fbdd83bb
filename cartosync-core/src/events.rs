//! Interaction events and the subscription list that delivers them.

use std::fmt;

use geo::Coord;

use crate::clustering::RegionAttribute;
use crate::geometry::{Point, RegionSpan};

/// Something the host should hear about.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")
)]
pub enum MapEvent {
    /// A marker was tapped.
    TapMarker {
        /// Marker identifier.
        id: String,
        /// Marker position.
        #[cfg_attr(feature = "serde", serde(with = "crate::geometry::lat_lng"))]
        coordinate: Coord<f64>,
        /// Marker position in view space.
        screen_point: Point,
    },
    /// A polyline was tapped.
    TapPolyline {
        /// Polyline identifier.
        id: String,
    },
    /// A cluster badge was tapped.
    TapCluster {
        /// Cluster identifier.
        id: String,
        /// Attribute the cluster groups by.
        by: RegionAttribute,
        /// Number of markers in the cluster.
        member_count: usize,
        /// Cluster centroid.
        #[cfg_attr(feature = "serde", serde(with = "crate::geometry::lat_lng"))]
        coordinate: Coord<f64>,
    },
    /// The zoom level changed.
    Zoom {
        /// New zoom level.
        zoom_level: f64,
    },
    /// The visible region changed.
    RegionChanged {
        /// Centre of the region.
        #[cfg_attr(feature = "serde", serde(with = "crate::geometry::lat_lng"))]
        center: Coord<f64>,
        /// Extent of the region.
        span: RegionSpan,
    },
}

/// Token returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&MapEvent)>;

/// Ordered list of event listeners.
///
/// # Examples
/// ```
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use cartosync_core::{EventBus, MapEvent};
///
/// let seen = Rc::new(RefCell::new(Vec::new()));
/// let sink = Rc::clone(&seen);
/// let mut bus = EventBus::new();
/// let id = bus.subscribe(move |event| sink.borrow_mut().push(event.clone()));
/// bus.emit(&MapEvent::Zoom { zoom_level: 4.0 });
/// assert!(bus.unsubscribe(id));
/// bus.emit(&MapEvent::Zoom { zoom_level: 5.0 });
/// assert_eq!(seen.borrow().len(), 1);
/// ```
#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    listeners: Vec<(SubscriptionId, Listener)>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl EventBus {
    /// Create a bus without listeners.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener`; it runs for every later event until
    /// unsubscribed.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&MapEvent) + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener, reporting whether it was registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    /// Deliver `event` to every listener in subscription order.
    pub fn emit(&mut self, event: &MapEvent) {
        for (_, listener) in &mut self.listeners {
            listener(event);
        }
    }

    /// Number of listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Whether no listeners are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[rstest]
    fn listeners_run_in_subscription_order() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();
        for tag in ["first", "second"] {
            let log = Rc::clone(&order);
            bus.subscribe(move |_| log.borrow_mut().push(tag));
        }
        bus.emit(&MapEvent::TapPolyline { id: "p".into() });
        assert_eq!(*order.borrow(), vec!["first", "second"]);
    }

    #[rstest]
    fn unknown_subscription_is_reported() {
        let mut bus = EventBus::new();
        let id = bus.subscribe(|_| {});
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        assert!(bus.is_empty());
    }

    #[cfg(feature = "serde")]
    #[rstest]
    fn events_serialise_with_type_tag() {
        let event = MapEvent::TapMarker {
            id: "m".into(),
            coordinate: Coord { x: 1.0, y: 2.0 },
            screen_point: Point::new(3.0, 4.0),
        };
        let json = serde_json::to_value(&event).expect("serialisable event");
        assert_eq!(json["type"], "tapMarker");
        assert_eq!(json["screenPoint"]["x"], 3.0);
        assert_eq!(json["coordinate"]["latitude"], 2.0);
        assert_eq!(json["coordinate"]["longitude"], 1.0);

        let reread: MapEvent = serde_json::from_value(json).expect("round trip");
        assert_eq!(reread, event);
    }
}
