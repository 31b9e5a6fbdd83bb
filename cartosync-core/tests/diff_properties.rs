//! Property tests for the list diff and marker reconciliation.

use std::collections::HashMap;

use cartosync_core::recording::{OverlayId, RecordingAssetSink, RecordingSurface};
use cartosync_core::reconcile::MarkerReconciler;
use cartosync_core::{Marker, MarkerDiff, MarkerStyle, diff};
use geo::Coord;
use proptest::prelude::*;

fn style() -> impl Strategy<Value = MarkerStyle> {
    prop_oneof![
        Just(MarkerStyle::Custom),
        Just(MarkerStyle::Pin),
        Just(MarkerStyle::Teardrop),
    ]
}

/// Small id alphabet so lists routinely share and repeat identifiers.
fn marker() -> impl Strategy<Value = Marker> {
    (
        0_u8..6,
        style(),
        prop::option::of("[a-c]{1,2}"),
        -5_i32..5,
    )
        .prop_map(|(id, style, title, x)| Marker {
            title,
            ..Marker::new(format!("m{id}"), Coord {
                x: f64::from(x),
                y: 0.0,
            })
            .with_style(style)
        })
}

fn markers() -> impl Strategy<Value = Vec<Marker>> {
    prop::collection::vec(marker(), 0..12)
}

fn unique_by_id(list: Vec<Marker>) -> Vec<Marker> {
    let mut seen = std::collections::HashSet::new();
    list.into_iter()
        .filter(|marker| seen.insert(marker.id.clone()))
        .collect()
}

fn bump(hits: &mut [u32], index: Option<usize>) {
    let slot = index
        .and_then(|i| hits.get_mut(i))
        .expect("diff output refers into its input list");
    *slot += 1;
}

proptest! {
    #[test]
    fn diff_of_a_list_with_itself_is_empty(list in markers()) {
        let result = diff(&list, &list, &MarkerDiff);
        prop_assert!(result.to_add.is_empty());
        prop_assert!(result.to_remove.is_empty());
        prop_assert!(result.to_update.is_empty());
    }

    #[test]
    fn every_record_lands_in_exactly_one_bucket(old in markers(), new in markers()) {
        let result = diff(&old, &new, &MarkerDiff);

        let mut old_hits = vec![0_u32; old.len()];
        let mut new_hits = vec![0_u32; new.len()];
        let old_index = |record: &Marker| old.iter().position(|o| std::ptr::eq(o, record));
        let new_index = |record: &Marker| new.iter().position(|n| std::ptr::eq(n, record));

        for removed in &result.to_remove {
            bump(&mut old_hits, old_index(removed));
        }
        for added in &result.to_add {
            bump(&mut new_hits, new_index(added));
        }
        for update in &result.to_update {
            bump(&mut old_hits, old_index(update.old));
            bump(&mut new_hits, new_index(update.new));
            prop_assert!(!update.changes.is_empty());
        }

        // Matched pairs without changes are silent, so each record is
        // counted at most once.
        prop_assert!(old_hits.iter().all(|&hits| hits <= 1));
        prop_assert!(new_hits.iter().all(|&hits| hits <= 1));
        let silent_old = old_hits.iter().filter(|&&hits| hits == 0).count();
        let silent_new = new_hits.iter().filter(|&&hits| hits == 0).count();
        prop_assert_eq!(silent_old, silent_new);
    }

    #[test]
    fn reconciling_keeps_handles_for_same_identity(first in markers(), second in markers()) {
        let old = unique_by_id(first);
        let new = unique_by_id(second);
        let mut surface = RecordingSurface::new();
        let assets = RecordingAssetSink::<OverlayId>::new();
        let mut reconciler = MarkerReconciler::new();

        reconciler.apply(&mut surface, &assets, old.clone());
        let before: HashMap<String, OverlayId> = old
            .iter()
            .filter_map(|m| reconciler.handle_for(&m.id).map(|h| (m.id.clone(), h)))
            .collect();

        reconciler.apply(&mut surface, &assets, new.clone());

        for marker in &new {
            let kept = old
                .iter()
                .any(|previous| previous.id == marker.id && previous.style == marker.style);
            if kept {
                prop_assert_eq!(reconciler.handle_for(&marker.id), before.get(&marker.id).copied());
            } else {
                prop_assert!(reconciler.handle_for(&marker.id).is_some());
            }
        }
        prop_assert_eq!(reconciler.len(), new.len());
    }
}
