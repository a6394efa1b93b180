use crate::chart::{Chart, ItemId};
use crate::config::{SurfaceConfig, ViewConfig};
use crate::media::MediaTransport;
use crate::playback::{rate_at, PlaybackControls};

/// Scheduling state of the per-frame animation loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DriverState {
    /// Not scheduled: no media, paused, or finished.
    #[default]
    Idle,
    /// Rescheduled every display frame while the media plays.
    Running,
}

/// Screen placement of one note for the current frame.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteMarker {
    pub id: ItemId,
    /// Horizontal position on the gameplay surface.
    pub x: f64,
    /// Signed distance from the target centre, in pixels.
    pub offset: f64,
    /// Within the hit window this frame. Purely cosmetic and re-derived every
    /// frame; no note carries persistent hit state.
    pub on_target: bool,
}

/// Everything a painting backend needs for one frame, as plain data.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSnapshot {
    /// Playback time the frame was derived from.
    pub time: f64,
    /// Visible note markers; notes outside the surface margin are culled.
    pub markers: Vec<NoteMarker>,
    /// True when any marker is on target, lighting the target ring.
    pub target_hit: bool,
    /// Playhead position on the editor timeline, in pixels.
    pub playhead_px: f64,
    /// New timeline scroll offset keeping the playhead in view, when the
    /// caller supplied a viewport and the playhead drifted too close to an
    /// edge.
    pub scroll_to: Option<f64>,
    /// Rate pushed to the media element this frame, when the loop is live.
    pub applied_rate: Option<f64>,
}

/// Visible portion of the editor timeline, supplied by the host on editor
/// frames so the playhead can be kept in view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub scroll_left: f64,
    pub width: f64,
}

/// The per-frame animation loop.
///
/// The media element's clock is the single source of truth: every tick
/// samples it, lays out the gameplay markers and playhead for that instant,
/// and pushes the freshly composed playback rate back to the element so the
/// rate self-corrects even if something outside this driver changed it. The
/// driver demotes itself to [`DriverState::Idle`] when the media reports
/// paused or ended; the caller keeps scheduling frames only while
/// [`AnimationDriver::is_running`] holds.
#[derive(Debug, Default)]
pub struct AnimationDriver {
    state: DriverState,
}

impl AnimationDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == DriverState::Running
    }

    /// Playback started: apply the current rate and begin scheduling.
    pub fn handle_play<M: MediaTransport>(
        &mut self,
        media: &mut M,
        chart: &Chart,
        controls: &PlaybackControls,
    ) {
        let rate = controls.target_rate_at(&chart.sections, media.current_time());
        media.set_playback_rate(rate);
        if self.state != DriverState::Running {
            tracing::debug!("animation driver running");
            self.state = DriverState::Running;
        }
    }

    /// Playback paused: stop scheduling.
    pub fn handle_pause(&mut self) {
        self.stop();
    }

    /// Deterministically stops the loop, e.g. on view teardown.
    pub fn stop(&mut self) {
        if self.state != DriverState::Idle {
            tracing::debug!("animation driver idle");
            self.state = DriverState::Idle;
        }
    }

    /// A seek completed: recompute the rate once and, while paused, draw a
    /// single frame without scheduling a continuation.
    pub fn handle_seeked<M: MediaTransport>(
        &mut self,
        media: &mut M,
        chart: &Chart,
        controls: &PlaybackControls,
        view: &ViewConfig,
        surface: Option<&SurfaceConfig>,
        viewport: Option<&Viewport>,
    ) -> Option<FrameSnapshot> {
        let t = media.current_time();
        let rate = controls.target_rate_at(&chart.sections, t);
        media.set_playback_rate(rate);
        if media.is_paused() {
            let surface = surface?;
            return Some(render_frame(t, chart, controls, view, surface, viewport));
        }
        None
    }

    /// The media just became available: draw one frame without scheduling.
    pub fn handle_media_ready<M: MediaTransport>(
        &mut self,
        media: &M,
        chart: &Chart,
        controls: &PlaybackControls,
        view: &ViewConfig,
        surface: Option<&SurfaceConfig>,
        viewport: Option<&Viewport>,
    ) -> Option<FrameSnapshot> {
        let surface = surface?;
        Some(render_frame(
            media.current_time(),
            chart,
            controls,
            view,
            surface,
            viewport,
        ))
    }

    /// One scheduled frame. A missing transport or surface makes the tick a
    /// no-op; it neither fails nor reschedules on its own.
    pub fn tick<M: MediaTransport>(
        &mut self,
        media: Option<&mut M>,
        chart: &Chart,
        controls: &PlaybackControls,
        view: &ViewConfig,
        surface: Option<&SurfaceConfig>,
        viewport: Option<&Viewport>,
    ) -> Option<FrameSnapshot> {
        if self.state != DriverState::Running {
            return None;
        }
        let media = media?;
        let surface = surface?;

        let t = media.current_time();
        let mut snapshot = render_frame(t, chart, controls, view, surface, viewport);

        if media.is_paused() || media.has_ended() {
            self.stop();
        } else {
            let rate = controls.target_rate_at(&chart.sections, t);
            media.set_playback_rate(rate);
            snapshot.applied_rate = Some(rate);
        }
        Some(snapshot)
    }
}

fn render_frame(
    t: f64,
    chart: &Chart,
    controls: &PlaybackControls,
    view: &ViewConfig,
    surface: &SurfaceConfig,
    viewport: Option<&Viewport>,
) -> FrameSnapshot {
    let speed_px = controls.base_speed * rate_at(&chart.sections, t) * controls.preview_multiplier;
    let cx = surface.center_x();

    let mut markers = Vec::new();
    let mut target_hit = false;
    for note in &chart.notes {
        let offset = (note.time - t) * speed_px;
        let x = cx + offset;
        if x < -view.cull_margin_px || x > surface.width + view.cull_margin_px {
            continue;
        }
        let on_target = offset.abs() < view.hit_window_px;
        target_hit |= on_target;
        markers.push(NoteMarker {
            id: note.id,
            x,
            offset,
            on_target,
        });
    }

    let playhead_px = t * view.pixels_per_second;
    let scroll_to = viewport.and_then(|vp| {
        let visible_left = vp.scroll_left;
        let visible_right = visible_left + vp.width;
        if playhead_px < visible_left + view.scroll_margin_px {
            Some((playhead_px - view.scroll_margin_px).max(0.0))
        } else if playhead_px > visible_right - view.scroll_margin_px {
            Some(playhead_px - (vp.width - view.scroll_margin_px))
        } else {
            None
        }
    });

    FrameSnapshot {
        time: t,
        markers,
        target_hit,
        playhead_px,
        scroll_to,
        applied_rate: None,
    }
}
