use crate::chart::{Chart, EffectKind, ItemId};
use crate::config::ViewConfig;
use crate::driver::{AnimationDriver, DriverState, FrameSnapshot, Viewport};
use crate::input::{
    parse_entry, DragController, DragTarget, TimelineMetrics, BASE_SPEED_RANGE, BPM_RANGE,
    PREVIEW_MULTIPLIER_RANGE,
};
use crate::media::{MediaSession, MediaSource, MediaTransport};
use crate::playback::PlaybackControls;
use crate::trigger::{EffectScheduler, TriggeredEffect};
use crate::Result;

/// Which interactive surface is shown. Switching does not reset the chart or
/// the loaded media.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Player,
    Editor,
}

/// One editing/playback session: the chart, the playback controls, both
/// per-frame loops and the drag state, behind a single facade.
///
/// The session owns no thread and schedules nothing itself; the host calls
/// [`Session::tick`] and [`Session::sample_effects`] from its frame callback
/// and forwards transport events. [`Session::teardown`] cancels both loops
/// together so no per-frame work outlives the owning view.
#[derive(Debug, Default)]
pub struct Session {
    mode: ViewMode,
    chart: Chart,
    controls: PlaybackControls,
    view: ViewConfig,
    driver: AnimationDriver,
    triggers: EffectScheduler,
    drag: DragController,
    media: MediaSession,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ViewMode) {
        if self.mode != mode {
            tracing::debug!(?mode, "switching view");
            self.mode = mode;
        }
    }

    pub fn chart(&self) -> &Chart {
        &self.chart
    }

    pub fn controls(&self) -> &PlaybackControls {
        &self.controls
    }

    pub fn view(&self) -> &ViewConfig {
        &self.view
    }

    pub fn is_animating(&self) -> bool {
        self.driver.is_running()
    }

    pub fn driver_state(&self) -> DriverState {
        self.driver.state()
    }

    // ---- playback controls -------------------------------------------------

    pub fn set_preview_multiplier(&mut self, multiplier: f64) {
        self.controls.preview_multiplier = multiplier
            .clamp(*PREVIEW_MULTIPLIER_RANGE.start(), *PREVIEW_MULTIPLIER_RANGE.end());
    }

    pub fn set_forced_rate(&mut self, rate: Option<f64>) {
        self.controls.forced_rate = rate;
    }

    pub fn set_base_speed(&mut self, base_speed: f64) {
        self.controls.base_speed =
            base_speed.clamp(*BASE_SPEED_RANGE.start(), *BASE_SPEED_RANGE.end());
    }

    pub fn set_bpm(&mut self, bpm: u32) {
        self.chart
            .set_bpm(bpm.clamp(*BPM_RANGE.start(), *BPM_RANGE.end()));
    }

    // ---- chart operations --------------------------------------------------

    pub fn add_note_at(&mut self, time: f64) -> ItemId {
        self.chart.add_note(time)
    }

    /// The toolbar's quick-add: half a second after the current last note.
    pub fn add_note_after_last(&mut self) -> ItemId {
        let last = self.chart.notes.iter().map(|n| n.time).fold(0.0, f64::max);
        self.chart.add_note(last + 0.5)
    }

    pub fn remove_note(&mut self, id: ItemId) -> bool {
        self.chart.remove_note(id)
    }

    pub fn add_effect_at(&mut self, kind: EffectKind, time: f64) -> ItemId {
        self.chart.add_effect(kind, time)
    }

    /// Adds an effect at the media's current playback position.
    pub fn add_effect_now<M: MediaTransport>(&mut self, kind: EffectKind, media: &M) -> ItemId {
        self.chart.add_effect(kind, media.current_time())
    }

    pub fn remove_effect(&mut self, id: ItemId) -> bool {
        self.chart.remove_effect(id)
    }

    /// Typed section entry. Rejects anything non-numeric or out of domain
    /// without touching the chart.
    pub fn enter_section(&mut self, start_entry: &str, rate_entry: &str) -> Option<ItemId> {
        let start = parse_entry(start_entry)?;
        let rate = parse_entry(rate_entry)?;
        if start < 0.0 || rate <= 0.0 {
            return None;
        }
        Some(self.chart.add_section(start, rate))
    }

    /// Typed rate entry on an existing section; the prior rate is retained
    /// when the entry does not parse to a positive number.
    pub fn enter_section_rate(&mut self, id: ItemId, entry: &str) -> bool {
        match parse_entry(entry) {
            Some(rate) if rate > 0.0 => self.chart.set_section_rate(id, rate),
            _ => false,
        }
    }

    pub fn clear_chart(&mut self) {
        self.chart.clear();
        self.triggers.reset();
    }

    // ---- document exchange -------------------------------------------------

    /// Serializes the whole chart for export.
    pub fn export_document(&self) -> Result<String> {
        self.chart.to_json()
    }

    /// Replaces the chart from an imported document, all-or-nothing: on any
    /// parse or validation error the current chart stays in effect and the
    /// error is returned for the host to surface.
    pub fn import_document(&mut self, text: &str) -> Result<()> {
        match Chart::from_json(text) {
            Ok(chart) => {
                self.chart = chart;
                self.triggers.reset();
                Ok(())
            }
            Err(err) => {
                tracing::warn!(%err, "import rejected");
                Err(err)
            }
        }
    }

    /// Live edit from the raw document panel. Invalid text is silently
    /// ignored and the last valid chart retained; returns whether the edit
    /// applied.
    pub fn edit_document_text(&mut self, text: &str) -> bool {
        match Chart::from_json(text) {
            Ok(chart) => {
                self.chart = chart;
                self.triggers.reset();
                true
            }
            Err(_) => false,
        }
    }

    // ---- media lifecycle ---------------------------------------------------

    pub fn media_source(&self) -> Option<&MediaSource> {
        self.media.source()
    }

    pub fn media_is_ready(&self) -> bool {
        self.media.is_ready()
    }

    /// Attaches a new media resource, returning the released previous handle.
    /// The new resource carries a new time base, so both per-frame loops are
    /// reset until the host reports readiness.
    pub fn load_media(&mut self, source: MediaSource) -> Option<MediaSource> {
        self.driver.stop();
        self.triggers.reset();
        self.media.load(source)
    }

    /// The host reports the loaded resource ready: draw the first frame.
    pub fn media_ready<M: MediaTransport>(
        &mut self,
        media: &M,
        viewport: Option<&Viewport>,
    ) -> Option<FrameSnapshot> {
        if !self.media.mark_ready() {
            return None;
        }
        let viewport = self.editor_viewport(viewport);
        self.driver.handle_media_ready(
            media,
            &self.chart,
            &self.controls,
            &self.view,
            Some(&self.view.surface),
            viewport,
        )
    }

    // ---- transport events & per-frame loops --------------------------------

    pub fn handle_play<M: MediaTransport>(&mut self, media: &mut M) {
        if self.media.is_ready() {
            self.driver.handle_play(media, &self.chart, &self.controls);
        }
    }

    pub fn handle_pause(&mut self) {
        self.driver.handle_pause();
    }

    pub fn handle_seeked<M: MediaTransport>(
        &mut self,
        media: &mut M,
        viewport: Option<&Viewport>,
    ) -> Option<FrameSnapshot> {
        if !self.media.is_ready() {
            return None;
        }
        let viewport = self.editor_viewport(viewport);
        self.driver.handle_seeked(
            media,
            &self.chart,
            &self.controls,
            &self.view,
            Some(&self.view.surface),
            viewport,
        )
    }

    /// One animation frame. No-ops (returning nothing) while no media is
    /// ready or the driver is idle.
    pub fn tick<M: MediaTransport>(
        &mut self,
        media: Option<&mut M>,
        viewport: Option<&Viewport>,
    ) -> Option<FrameSnapshot> {
        if !self.media.is_ready() {
            return None;
        }
        let viewport = self.editor_viewport(viewport);
        self.driver.tick(
            media,
            &self.chart,
            &self.controls,
            &self.view,
            Some(&self.view.surface),
            viewport,
        )
    }

    /// The independent effect-trigger scan, driven off the same time source
    /// as [`Session::tick`] but scheduled separately by the host.
    pub fn sample_effects<M: MediaTransport>(&mut self, media: &M) -> Vec<TriggeredEffect> {
        if !self.media.is_ready() {
            return Vec::new();
        }
        self.triggers.sample(&self.chart.effects, media.current_time())
    }

    // Timeline auto-scroll only happens on the editor surface.
    fn editor_viewport<'a>(&self, viewport: Option<&'a Viewport>) -> Option<&'a Viewport> {
        match self.mode {
            ViewMode::Editor => viewport,
            ViewMode::Player => None,
        }
    }

    /// Cancels both per-frame loops. Called when the owning view goes away;
    /// afterwards no scheduled work remains.
    pub fn teardown(&mut self) {
        self.driver.stop();
        self.triggers.reset();
        tracing::debug!("session torn down");
    }

    // ---- direct manipulation -----------------------------------------------

    /// Metrics for converting this session's timeline coordinates, at the
    /// host-reported content origin and scroll offset.
    pub fn timeline_metrics(&self, origin_x: f64, scroll_left: f64) -> TimelineMetrics {
        TimelineMetrics {
            pixels_per_second: self.view.pixels_per_second,
            origin_x,
            scroll_left,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    pub fn pointer_down(&mut self, target: DragTarget, pointer_x: f64) {
        self.drag.begin(target, pointer_x);
    }

    pub fn pointer_move(&mut self, metrics: &TimelineMetrics, pointer_x: f64) -> bool {
        self.drag.update(&mut self.chart, metrics, pointer_x)
    }

    pub fn pointer_up(&mut self) -> Option<DragTarget> {
        self.drag.finish(&mut self.chart)
    }

    pub fn timeline_click(
        &mut self,
        metrics: &TimelineMetrics,
        pointer_x: f64,
        on_entity: bool,
    ) -> Option<ItemId> {
        self.drag
            .timeline_click(&mut self.chart, metrics, pointer_x, on_entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::ScriptedMedia;

    fn ready_session(duration: f64) -> (Session, ScriptedMedia) {
        let mut session = Session::new();
        let media = ScriptedMedia::new(duration);
        session.load_media(MediaSource::new("blob:test"));
        session.media_ready(&media, None);
        (session, media)
    }

    #[test]
    fn mode_switch_preserves_chart_and_media() {
        let (mut session, _media) = ready_session(10.0);
        session.add_note_at(7.0);
        let before = session.chart().clone();

        session.set_mode(ViewMode::Editor);
        session.set_mode(ViewMode::Player);
        assert_eq!(session.chart(), &before);
        assert!(session.media_is_ready());
        assert_eq!(
            session.media_source().map(|s| s.locator()),
            Some("blob:test")
        );
    }

    #[test]
    fn failed_import_leaves_the_chart_unchanged() {
        let mut session = Session::new();
        let before = session.chart().clone();
        assert!(session.import_document("{not json").is_err());
        assert_eq!(session.chart(), &before);
    }

    #[test]
    fn import_replaces_wholesale() {
        let mut session = Session::new();
        let text = r#"{"bpm":90,"sections":[{"start":0,"playbackRate":1}],"notes":[{"time":1.0}],"effects":[]}"#;
        session.import_document(text).unwrap();
        assert_eq!(session.chart().bpm, 90);
        assert_eq!(session.chart().notes.len(), 1);
    }

    #[test]
    fn live_text_edit_fails_silently() {
        let mut session = Session::new();
        let before = session.chart().clone();
        assert!(!session.edit_document_text("{\"bpm\": "));
        assert_eq!(session.chart(), &before);

        let valid = session.export_document().unwrap();
        assert!(session.edit_document_text(&valid));
        assert_eq!(session.chart(), &before);
    }

    #[test]
    fn exported_documents_round_trip() {
        let mut session = Session::new();
        session.add_effect_at(EffectKind::Heart, 1.25);
        let text = session.export_document().unwrap();

        let mut other = Session::new();
        other.import_document(&text).unwrap();
        assert_eq!(other.chart(), session.chart());
    }

    #[test]
    fn effects_default_to_the_current_playback_position() {
        let (mut session, mut media) = ready_session(10.0);
        media.play();
        media.advance(2.5);
        session.add_effect_now(EffectKind::Flash, &media);
        assert_eq!(session.chart().effects[0].time, 2.5);
    }

    #[test]
    fn nothing_renders_before_the_media_reports_ready() {
        let mut session = Session::new();
        let mut media = ScriptedMedia::new(10.0);
        session.load_media(MediaSource::new("blob:test"));

        media.play();
        session.handle_play(&mut media);
        assert!(!session.is_animating());
        assert!(session.tick(Some(&mut media), None).is_none());
        assert!(session.sample_effects(&media).is_empty());

        let first = session.media_ready(&media, None);
        assert!(first.is_some());
        session.handle_play(&mut media);
        assert!(session.is_animating());
        assert!(session.tick(Some(&mut media), None).is_some());
    }

    #[test]
    fn loading_new_media_releases_the_old_handle_and_stops_the_loops() {
        let (mut session, mut media) = ready_session(10.0);
        media.play();
        session.handle_play(&mut media);
        assert!(session.is_animating());

        let released = session.load_media(MediaSource::new("blob:next"));
        assert_eq!(released, Some(MediaSource::new("blob:test")));
        assert!(!session.is_animating());
        assert!(!session.media_is_ready());
    }

    #[test]
    fn teardown_cancels_both_loops_together() {
        let (mut session, mut media) = ready_session(10.0);
        session.add_effect_at(EffectKind::Flash, 1.0);
        media.play();
        session.handle_play(&mut media);
        media.advance(2.0);
        assert_eq!(session.sample_effects(&media).len(), 1);

        session.teardown();
        assert!(!session.is_animating());
        // The trigger pass was forgotten along with the animation loop.
        assert_eq!(session.sample_effects(&media).len(), 1);
    }

    #[test]
    fn rejected_numeric_entries_retain_prior_values() {
        let mut session = Session::new();
        let section = session.chart().sections[0].id;

        assert!(!session.enter_section_rate(section, "fast"));
        assert!(!session.enter_section_rate(section, "-2"));
        assert_eq!(session.chart().sections[0].playback_rate, 1.0);
        assert!(session.enter_section_rate(section, "0.5"));
        assert_eq!(session.chart().sections[0].playback_rate, 0.5);

        assert!(session.enter_section("2", "1.5").is_some());
        assert!(session.enter_section("x", "1").is_none());
        assert_eq!(session.chart().sections.len(), 2);
    }

    #[test]
    fn control_setters_clamp_to_their_ranges() {
        let mut session = Session::new();
        session.set_preview_multiplier(9.0);
        assert_eq!(session.controls().preview_multiplier, 2.0);
        session.set_base_speed(10.0);
        assert_eq!(session.controls().base_speed, 80.0);
        session.set_bpm(1000);
        assert_eq!(session.chart().bpm, 300);
        session.set_forced_rate(Some(8.0));
        assert_eq!(session.controls().forced_rate, Some(8.0));
    }

    #[test]
    fn auto_scroll_only_runs_on_the_editor_surface() {
        let (mut session, mut media) = ready_session(100.0);
        media.play();
        session.handle_play(&mut media);
        media.seek(10.0);
        let viewport = Viewport {
            scroll_left: 0.0,
            width: 600.0,
        };

        let frame = session.tick(Some(&mut media), Some(&viewport)).unwrap();
        assert_eq!(frame.scroll_to, None);

        session.set_mode(ViewMode::Editor);
        let frame = session.tick(Some(&mut media), Some(&viewport)).unwrap();
        assert!(frame.scroll_to.is_some());
    }

    #[test]
    fn scripted_playback_drives_frames_and_triggers_end_to_end() {
        let (mut session, mut media) = ready_session(8.0);
        session.enter_section("2", "0.5").unwrap();
        session.add_effect_at(EffectKind::Flash, 1.0);
        session.add_effect_at(
            EffectKind::Text {
                text: "NICE!".to_string(),
            },
            3.0,
        );

        media.play();
        session.handle_play(&mut media);

        let mut fired = Vec::new();
        let mut frames = 0;
        while session.is_animating() {
            if let Some(frame) = session.tick(Some(&mut media), None) {
                frames += 1;
                if let Some(rate) = frame.applied_rate {
                    assert!(rate > 0.0);
                }
            }
            fired.extend(session.sample_effects(&media));
            media.advance(1.0 / 30.0);
        }

        assert!(frames > 0);
        assert!(media.has_ended());
        assert_eq!(fired.len(), 2);
        // Past the 2 s section boundary the corrected rate stuck.
        assert_eq!(media.playback_rate(), 0.5);
    }
}
