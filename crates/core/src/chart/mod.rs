use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{BeatsyncError, Result};

/// Stable identity for a note, section or effect within one [`Chart`].
///
/// Ids are allocated from a per-chart counter when an item is created and are
/// never reused, so removal and trigger deduplication stay correct even when
/// a re-sort shifts list positions between a render and a user action. They
/// are runtime-only: exported documents never contain them and imported items
/// receive fresh ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ItemId(u64);

/// A single timed gameplay marker with no duration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    #[serde(skip)]
    pub id: ItemId,
    pub time: f64,
}

impl PartialEq for Note {
    // Identity is runtime-only and excluded from document equality.
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time
    }
}

/// A half-open interval `[start, next.start)` of constant playback rate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    #[serde(skip)]
    pub id: ItemId,
    pub start: f64,
    pub playback_rate: f64,
}

impl PartialEq for Section {
    fn eq(&self, other: &Self) -> bool {
        self.start == other.start && self.playback_rate == other.playback_rate
    }
}

/// Kind of a one-shot visual trigger, tagged in the document as
/// `"heart" | "flash" | "text"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EffectKind {
    Heart,
    Flash,
    Text { text: String },
}

impl EffectKind {
    /// How long the presentation element for this kind stays on screen.
    pub fn display_duration(&self) -> Duration {
        match self {
            Self::Heart => Duration::from_millis(1000),
            Self::Flash => Duration::from_millis(400),
            Self::Text { .. } => Duration::from_millis(1500),
        }
    }
}

/// A one-shot timed presentation trigger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Effect {
    #[serde(skip)]
    pub id: ItemId,
    pub time: f64,
    #[serde(flatten)]
    pub kind: EffectKind,
}

impl PartialEq for Effect {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.kind == other.kind
    }
}

/// The full editable document describing one playable session.
///
/// All collections are kept sorted ascending by time after each structural
/// mutation. A drag gesture may leave an item transiently out of order via
/// [`Chart::set_time`]; [`Chart::commit_order`] restores the invariant when
/// the gesture ends. Sorting is stable, so items sharing a timestamp keep
/// their insertion order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chart {
    pub bpm: u32,
    pub sections: Vec<Section>,
    pub notes: Vec<Note>,
    pub effects: Vec<Effect>,
    #[serde(skip)]
    next_id: u64,
    #[serde(skip)]
    revision: u64,
}

impl Default for Chart {
    fn default() -> Self {
        let mut chart = Self {
            bpm: 120,
            sections: Vec::new(),
            notes: Vec::new(),
            effects: Vec::new(),
            next_id: 0,
            revision: 0,
        };
        let section = chart.alloc();
        chart.sections.push(Section {
            id: section,
            start: 0.0,
            playback_rate: 1.0,
        });
        for time in [0.5, 1.0, 2.0, 3.5] {
            let id = chart.alloc();
            chart.notes.push(Note { id, time });
        }
        chart
    }
}

impl PartialEq for Chart {
    // Document content only; ids and the revision counter are transient.
    fn eq(&self, other: &Self) -> bool {
        self.bpm == other.bpm
            && self.sections == other.sections
            && self.notes == other.notes
            && self.effects == other.effects
    }
}

impl Chart {
    /// Monotonic counter bumped by every mutation. Observers compare it to
    /// decide whether derived state must be rebuilt; it replaces any reliance
    /// on reference identity.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Appends a note and restores ascending time order. Duplicate times are
    /// permitted and not coalesced.
    pub fn add_note(&mut self, time: f64) -> ItemId {
        let id = self.alloc();
        self.notes.push(Note { id, time });
        self.notes.sort_by(|a, b| a.time.total_cmp(&b.time));
        self.touched();
        id
    }

    /// Removes the note with the given id. Returns false when no such note
    /// exists (for example because a stale view raced a previous removal).
    pub fn remove_note(&mut self, id: ItemId) -> bool {
        let before = self.notes.len();
        self.notes.retain(|n| n.id != id);
        let removed = self.notes.len() != before;
        if removed {
            self.touched();
        }
        removed
    }

    /// Appends a section and restores ascending start order. Duplicate starts
    /// are not merged; the stable sort keeps them in insertion order.
    pub fn add_section(&mut self, start: f64, playback_rate: f64) -> ItemId {
        let id = self.alloc();
        self.sections.push(Section {
            id,
            start,
            playback_rate,
        });
        self.sections.sort_by(|a, b| a.start.total_cmp(&b.start));
        self.touched();
        id
    }

    /// Replaces the playback rate of one section in place.
    pub fn set_section_rate(&mut self, id: ItemId, playback_rate: f64) -> bool {
        match self.sections.iter_mut().find(|s| s.id == id) {
            Some(section) => {
                section.playback_rate = playback_rate;
                self.touched();
                true
            }
            None => false,
        }
    }

    pub fn set_bpm(&mut self, bpm: u32) {
        self.bpm = bpm;
        self.touched();
    }

    /// Appends an effect and restores ascending time order.
    pub fn add_effect(&mut self, kind: EffectKind, time: f64) -> ItemId {
        let id = self.alloc();
        self.effects.push(Effect { id, time, kind });
        self.effects.sort_by(|a, b| a.time.total_cmp(&b.time));
        self.touched();
        id
    }

    pub fn remove_effect(&mut self, id: ItemId) -> bool {
        let before = self.effects.len();
        self.effects.retain(|e| e.id != id);
        let removed = self.effects.len() != before;
        if removed {
            self.touched();
        }
        removed
    }

    /// Resets to one section at start 0 with rate 1, BPM 120 and no notes or
    /// effects. Nothing else is preserved.
    pub fn clear(&mut self) {
        self.bpm = 120;
        self.sections.clear();
        self.notes.clear();
        self.effects.clear();
        let id = self.alloc();
        self.sections.push(Section {
            id,
            start: 0.0,
            playback_rate: 1.0,
        });
        self.touched();
    }

    /// Scoped in-progress mutation used while a drag gesture is active: moves
    /// the identified note or effect without re-sorting, so the visual order
    /// may be transiently stale until [`Chart::commit_order`] runs.
    pub fn set_time(&mut self, id: ItemId, time: f64) -> bool {
        if let Some(note) = self.notes.iter_mut().find(|n| n.id == id) {
            note.time = time;
            self.touched();
            return true;
        }
        if let Some(effect) = self.effects.iter_mut().find(|e| e.id == id) {
            effect.time = time;
            self.touched();
            return true;
        }
        false
    }

    /// Restores ascending order on every collection, committing the final
    /// order of a finished gesture.
    pub fn commit_order(&mut self) {
        self.sort_all();
        self.touched();
    }

    /// Total timeline extent in seconds: always at least two seconds past the
    /// last scheduled item and never below four seconds.
    pub fn duration(&self) -> f64 {
        let last_note = self.notes.iter().map(|n| n.time).fold(0.0, f64::max);
        let last_section = self.sections.iter().map(|s| s.start).fold(0.0, f64::max);
        (last_note + 2.0).max(last_section + 2.0).max(4.0)
    }

    /// Serializes the whole document as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses a document, all-or-nothing: structured parsing and schema
    /// validation must both succeed or the previous chart (held by the
    /// caller) stays in effect. Imported collections are re-sorted and every
    /// item receives a fresh id.
    pub fn from_json(text: &str) -> Result<Self> {
        let mut chart: Chart = serde_json::from_str(text)?;
        chart.validate()?;
        chart.sort_all();
        chart.reassign_ids();
        Ok(chart)
    }

    /// Schema rules applied on import, beyond what structured parsing
    /// guarantees.
    pub fn validate(&self) -> Result<()> {
        if self.bpm == 0 {
            return Err(BeatsyncError::invalid("bpm must be a positive integer"));
        }
        if self.sections.is_empty() {
            return Err(BeatsyncError::invalid("at least one section is required"));
        }
        let mut earliest = f64::INFINITY;
        for section in &self.sections {
            if !section.start.is_finite() || section.start < 0.0 {
                return Err(BeatsyncError::invalid(format!(
                    "section start {} is not a non-negative number",
                    section.start
                )));
            }
            if !section.playback_rate.is_finite() || section.playback_rate <= 0.0 {
                return Err(BeatsyncError::invalid(format!(
                    "section playback rate {} is not a positive number",
                    section.playback_rate
                )));
            }
            earliest = earliest.min(section.start);
        }
        if earliest != 0.0 {
            return Err(BeatsyncError::invalid(
                "a section starting at 0 is required so the rate is defined at time 0",
            ));
        }
        for note in &self.notes {
            if !note.time.is_finite() || note.time < 0.0 {
                return Err(BeatsyncError::invalid(format!(
                    "note time {} is not a non-negative number",
                    note.time
                )));
            }
        }
        for effect in &self.effects {
            if !effect.time.is_finite() || effect.time < 0.0 {
                return Err(BeatsyncError::invalid(format!(
                    "effect time {} is not a non-negative number",
                    effect.time
                )));
            }
        }
        Ok(())
    }

    fn alloc(&mut self) -> ItemId {
        self.next_id += 1;
        ItemId(self.next_id)
    }

    fn touched(&mut self) {
        self.revision += 1;
    }

    fn sort_all(&mut self) {
        self.sections.sort_by(|a, b| a.start.total_cmp(&b.start));
        self.notes.sort_by(|a, b| a.time.total_cmp(&b.time));
        self.effects.sort_by(|a, b| a.time.total_cmp(&b.time));
    }

    fn reassign_ids(&mut self) {
        self.next_id = 0;
        self.revision = 0;
        let mut next = 0;
        for section in &mut self.sections {
            next += 1;
            section.id = ItemId(next);
        }
        for note in &mut self.notes {
            next += 1;
            note.id = ItemId(next);
        }
        for effect in &mut self.effects {
            next += 1;
            effect.id = ItemId(next);
        }
        self.next_id = next;
    }
}
