/// Seam over the host media element that owns the authoritative playback
/// clock. The core never decodes or renders media; it only samples time,
/// pushes a corrected playback rate back, and reacts to transport state.
pub trait MediaTransport {
    /// Current playback position in seconds.
    fn current_time(&self) -> f64;
    /// Total media length, when known.
    fn duration(&self) -> Option<f64>;
    fn is_paused(&self) -> bool;
    fn has_ended(&self) -> bool;
    fn playback_rate(&self) -> f64;
    fn set_playback_rate(&mut self, rate: f64);
    fn seek(&mut self, time: f64);
}

/// Opaque reference to a loadable media resource, such as a blob URL handed
/// out by the host environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaSource {
    locator: String,
}

impl MediaSource {
    pub fn new(locator: impl Into<String>) -> Self {
        Self {
            locator: locator.into(),
        }
    }

    pub fn locator(&self) -> &str {
        &self.locator
    }
}

/// Lifecycle of the single active media resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MediaState {
    /// No resource loaded.
    #[default]
    Empty,
    /// A resource is attached but the host has not reported it ready.
    Loading,
    /// The host signalled readiness; frames may be drawn.
    Ready,
}

/// Tracks which media resource is active and whether it is ready.
///
/// Exactly one resource is active at a time: loading a new one hands the
/// previous handle back so the host can release it. Readiness is an explicit
/// notification from the media-loading collaborator, not a fixed delay; no
/// frame is produced for a resource that has not reported ready.
#[derive(Debug, Default)]
pub struct MediaSession {
    source: Option<MediaSource>,
    state: MediaState,
}

impl MediaSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MediaState {
        self.state
    }

    pub fn source(&self) -> Option<&MediaSource> {
        self.source.as_ref()
    }

    pub fn is_ready(&self) -> bool {
        self.state == MediaState::Ready
    }

    /// Attaches a new resource, returning the previous handle (if any) for
    /// the host to release. Readiness resets until the host reports it.
    pub fn load(&mut self, source: MediaSource) -> Option<MediaSource> {
        let previous = self.source.replace(source);
        if let Some(old) = &previous {
            tracing::debug!(locator = old.locator(), "releasing previous media handle");
        }
        self.state = MediaState::Loading;
        previous
    }

    /// Records the host's readiness notification. Returns true on the
    /// transition into the ready state.
    pub fn mark_ready(&mut self) -> bool {
        match self.state {
            MediaState::Loading => {
                self.state = MediaState::Ready;
                true
            }
            _ => false,
        }
    }

    /// Detaches the active resource, returning its handle for release.
    pub fn release(&mut self) -> Option<MediaSource> {
        self.state = MediaState::Empty;
        self.source.take()
    }
}

/// Deterministic [`MediaTransport`] driven by explicit wall-clock steps.
///
/// Stands in for the host media element in tests and in the headless preview:
/// each [`ScriptedMedia::advance`] call moves the playback position by the
/// elapsed wall time multiplied by the current playback rate, exactly as a
/// real element's clock would.
#[derive(Debug, Clone)]
pub struct ScriptedMedia {
    time: f64,
    duration: f64,
    rate: f64,
    paused: bool,
    ended: bool,
}

impl ScriptedMedia {
    pub fn new(duration: f64) -> Self {
        Self {
            time: 0.0,
            duration,
            rate: 1.0,
            paused: true,
            ended: false,
        }
    }

    pub fn play(&mut self) {
        if self.time < self.duration {
            self.ended = false;
        }
        self.paused = false;
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Advances the clock by `wall_seconds` of real time. Playback stops at
    /// the end of the media.
    pub fn advance(&mut self, wall_seconds: f64) {
        if self.paused || self.ended {
            return;
        }
        self.time += wall_seconds * self.rate;
        if self.time >= self.duration {
            self.time = self.duration;
            self.ended = true;
            self.paused = true;
        }
    }
}

impl MediaTransport for ScriptedMedia {
    fn current_time(&self) -> f64 {
        self.time
    }

    fn duration(&self) -> Option<f64> {
        Some(self.duration)
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn has_ended(&self) -> bool {
        self.ended
    }

    fn playback_rate(&self) -> f64 {
        self.rate
    }

    fn set_playback_rate(&mut self, rate: f64) {
        self.rate = rate;
    }

    fn seek(&mut self, time: f64) {
        self.time = time.clamp(0.0, self.duration);
        self.ended = self.time >= self.duration;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loading_a_new_source_releases_the_previous_one() {
        let mut session = MediaSession::new();
        assert!(session.load(MediaSource::new("blob:a")).is_none());
        session.mark_ready();

        let released = session.load(MediaSource::new("blob:b"));
        assert_eq!(released, Some(MediaSource::new("blob:a")));
        assert_eq!(session.state(), MediaState::Loading);
        assert!(!session.is_ready());
    }

    #[test]
    fn readiness_is_an_explicit_transition() {
        let mut session = MediaSession::new();
        assert!(!session.mark_ready());

        session.load(MediaSource::new("blob:a"));
        assert!(session.mark_ready());
        assert!(!session.mark_ready());
        assert!(session.is_ready());

        assert_eq!(session.release(), Some(MediaSource::new("blob:a")));
        assert_eq!(session.state(), MediaState::Empty);
    }

    #[test]
    fn scripted_clock_scales_with_playback_rate() {
        let mut media = ScriptedMedia::new(10.0);
        media.play();
        media.set_playback_rate(2.0);
        media.advance(1.5);
        assert_eq!(media.current_time(), 3.0);
    }

    #[test]
    fn scripted_clock_stops_at_the_end() {
        let mut media = ScriptedMedia::new(2.0);
        media.play();
        media.advance(5.0);
        assert_eq!(media.current_time(), 2.0);
        assert!(media.has_ended());
        assert!(media.is_paused());

        media.seek(0.5);
        assert!(!media.has_ended());
        media.play();
        media.advance(0.25);
        assert_eq!(media.current_time(), 0.75);
    }

    #[test]
    fn paused_clock_does_not_advance() {
        let mut media = ScriptedMedia::new(10.0);
        media.advance(3.0);
        assert_eq!(media.current_time(), 0.0);
    }
}
