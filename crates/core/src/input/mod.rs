use std::ops::RangeInclusive;

use crate::chart::{Chart, ItemId};

/// Slider bounds for the interactively editable controls. Typed entries
/// outside these ranges are clamped by the session; entries that fail to
/// parse are rejected outright, leaving the prior value in place.
pub const BPM_RANGE: RangeInclusive<u32> = 30..=300;
pub const BASE_SPEED_RANGE: RangeInclusive<f64> = 80.0..=800.0;
pub const PREVIEW_MULTIPLIER_RANGE: RangeInclusive<f64> = 0.25..=2.0;

/// Parses an interactive numeric entry. Returns `None` for anything that is
/// not a finite number, so the caller retains the prior value.
pub fn parse_entry(text: &str) -> Option<f64> {
    match text.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Some(value),
        _ => None,
    }
}

/// Conversion between pointer coordinates and timeline time. The host passes
/// the timeline content origin and current scroll offset with each pointer
/// event; times are clamped to `[0, duration]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelineMetrics {
    pub pixels_per_second: f64,
    /// Screen x of the timeline content's left edge.
    pub origin_x: f64,
    pub scroll_left: f64,
}

impl TimelineMetrics {
    pub fn time_at(&self, pointer_x: f64, duration: f64) -> f64 {
        let x = pointer_x - self.origin_x + self.scroll_left;
        (x / self.pixels_per_second).clamp(0.0, duration)
    }
}

/// Which entity a drag gesture is moving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragTarget {
    Note(ItemId),
    Effect(ItemId),
}

impl DragTarget {
    pub fn id(&self) -> ItemId {
        match self {
            Self::Note(id) | Self::Effect(id) => *id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum DragState {
    Idle,
    Dragging { target: DragTarget, start_x: f64 },
}

/// Pointer-drag state machine for repositioning notes and effects.
///
/// While a gesture is active the dragged entity's time is updated in place
/// through [`Chart::set_time`] without re-sorting; releasing the pointer
/// commits the final order. A click event that the host delivers right after
/// a drag release is swallowed once instead of inserting a stray note.
#[derive(Debug)]
pub struct DragController {
    state: DragState,
    suppress_click: bool,
}

impl Default for DragController {
    fn default() -> Self {
        Self {
            state: DragState::Idle,
            suppress_click: false,
        }
    }
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    /// Pointer x recorded when the active gesture began.
    pub fn origin_x(&self) -> Option<f64> {
        match self.state {
            DragState::Dragging { start_x, .. } => Some(start_x),
            DragState::Idle => None,
        }
    }

    /// Pointer-down on an entity. The caller is expected to have captured the
    /// pointer so later moves keep arriving during fast drags.
    pub fn begin(&mut self, target: DragTarget, pointer_x: f64) {
        self.state = DragState::Dragging {
            target,
            start_x: pointer_x,
        };
        self.suppress_click = false;
    }

    /// Pointer-move while dragging: moves the entity to the pointer's time.
    /// Returns false when no gesture is active or the entity vanished.
    pub fn update(&mut self, chart: &mut Chart, metrics: &TimelineMetrics, pointer_x: f64) -> bool {
        let DragState::Dragging { target, .. } = self.state else {
            return false;
        };
        let time = metrics.time_at(pointer_x, chart.duration());
        chart.set_time(target.id(), time)
    }

    /// Pointer-up: releases the gesture and commits the collection order.
    pub fn finish(&mut self, chart: &mut Chart) -> Option<DragTarget> {
        let DragState::Dragging { target, .. } = self.state else {
            return None;
        };
        self.state = DragState::Idle;
        self.suppress_click = true;
        chart.commit_order();
        Some(target)
    }

    /// Click on the timeline. Empty space adds a note at the clicked time;
    /// clicks on entities and the one click following a drag release do
    /// nothing.
    pub fn timeline_click(
        &mut self,
        chart: &mut Chart,
        metrics: &TimelineMetrics,
        pointer_x: f64,
        on_entity: bool,
    ) -> Option<ItemId> {
        if self.suppress_click {
            self.suppress_click = false;
            return None;
        }
        if on_entity || self.is_dragging() {
            return None;
        }
        let time = metrics.time_at(pointer_x, chart.duration());
        Some(chart.add_note(time))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics() -> TimelineMetrics {
        TimelineMetrics {
            pixels_per_second: 120.0,
            origin_x: 0.0,
            scroll_left: 0.0,
        }
    }

    #[test]
    fn pointer_x_maps_through_scroll_and_origin() {
        let metrics = TimelineMetrics {
            pixels_per_second: 120.0,
            origin_x: 10.0,
            scroll_left: 240.0,
        };
        assert_eq!(metrics.time_at(10.0, 100.0), 2.0);
        assert_eq!(metrics.time_at(130.0, 100.0), 3.0);
    }

    #[test]
    fn times_clamp_to_the_timeline_extent() {
        let metrics = metrics();
        assert_eq!(metrics.time_at(-50.0, 10.0), 0.0);
        assert_eq!(metrics.time_at(100_000.0, 10.0), 10.0);
    }

    #[test]
    fn drag_moves_in_place_and_commits_on_release() {
        let mut chart = Chart::default();
        let id = chart.notes[0].id;
        let mut drag = DragController::new();

        drag.begin(DragTarget::Note(id), 60.0);
        assert!(drag.is_dragging());
        assert_eq!(drag.origin_x(), Some(60.0));

        assert!(drag.update(&mut chart, &metrics(), 360.0));
        // Moved to 3.0 s but still in first position until release.
        assert_eq!(chart.notes[0].time, 3.0);

        assert_eq!(drag.finish(&mut chart), Some(DragTarget::Note(id)));
        assert!(!drag.is_dragging());
        let times: Vec<f64> = chart.notes.iter().map(|n| n.time).collect();
        assert_eq!(times, vec![1.0, 2.0, 3.0, 3.5]);
    }

    #[test]
    fn drag_clamps_to_the_timeline() {
        let mut chart = Chart::default();
        let id = chart.notes[0].id;
        let mut drag = DragController::new();

        drag.begin(DragTarget::Note(id), 0.0);
        assert!(drag.update(&mut chart, &metrics(), -500.0));
        assert_eq!(chart.notes[0].time, 0.0);

        // Timeline extent at the moment of the move: last note 3.5 s + 2 s.
        assert!(drag.update(&mut chart, &metrics(), 1_000_000.0));
        assert_eq!(chart.notes[0].time, 5.5);
    }

    #[test]
    fn update_without_a_gesture_does_nothing() {
        let mut chart = Chart::default();
        let before = chart.clone();
        let mut drag = DragController::new();
        assert!(!drag.update(&mut chart, &metrics(), 100.0));
        assert_eq!(chart, before);
        assert!(drag.finish(&mut chart).is_none());
    }

    #[test]
    fn click_adds_a_note_on_empty_space_only() {
        let mut chart = Chart::default();
        let mut drag = DragController::new();

        assert!(drag
            .timeline_click(&mut chart, &metrics(), 60.0, true)
            .is_none());
        assert_eq!(chart.notes.len(), 4);

        let added = drag.timeline_click(&mut chart, &metrics(), 60.0, false);
        assert!(added.is_some());
        assert_eq!(chart.notes[0].time, 0.5);
        assert_eq!(chart.notes.len(), 5);
    }

    #[test]
    fn the_click_following_a_release_is_swallowed_once() {
        let mut chart = Chart::default();
        let id = chart.notes[0].id;
        let mut drag = DragController::new();

        drag.begin(DragTarget::Note(id), 60.0);
        drag.update(&mut chart, &metrics(), 120.0);
        drag.finish(&mut chart);

        assert!(drag
            .timeline_click(&mut chart, &metrics(), 120.0, false)
            .is_none());
        assert!(drag
            .timeline_click(&mut chart, &metrics(), 120.0, false)
            .is_some());
    }

    #[test]
    fn effects_drag_through_the_same_machine() {
        let mut chart = Chart::default();
        let id = chart.add_effect(crate::chart::EffectKind::Flash, 1.0);
        let mut drag = DragController::new();

        drag.begin(DragTarget::Effect(id), 120.0);
        assert!(drag.update(&mut chart, &metrics(), 240.0));
        drag.finish(&mut chart);
        assert_eq!(chart.effects[0].time, 2.0);
    }

    #[test]
    fn entries_that_do_not_parse_are_rejected() {
        assert_eq!(parse_entry("1.5"), Some(1.5));
        assert_eq!(parse_entry(" 2 "), Some(2.0));
        assert_eq!(parse_entry(""), None);
        assert_eq!(parse_entry("abc"), None);
        assert_eq!(parse_entry("1.2.3"), None);
        assert_eq!(parse_entry("inf"), None);
        assert_eq!(parse_entry("NaN"), None);
    }
}
