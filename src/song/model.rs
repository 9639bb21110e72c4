//! The compiled-song output data model: one struct per entity in the
//! resolved song (notes, chords, phrase iterations, sections, anchors,
//! metadata), plus the derived fields the compiler populates on top of
//! whatever the attributed input tree provided.

#[derive(Debug, Clone, Default)]
pub struct BendValue32 {
    pub time: f64,
    pub step: f32,
}

#[derive(Debug, Clone)]
pub struct ChordNoteBend {
    pub used_count: u32,
    pub bend_values: [BendValue32; 32],
}

impl Default for ChordNoteBend {
    fn default() -> Self {
        ChordNoteBend {
            used_count: 0,
            bend_values: std::array::from_fn(|_| BendValue32::default()),
        }
    }
}

/// The interned per-chord aggregate (`chordNotes[i]`), six-entry per-string
/// arrays plus a 6x32 bend-values matrix. Equality is the deep,
/// field-by-field comparison the interner needs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChordNote {
    pub mask: [u32; 6],
    pub slide_to: [i32; 6],
    pub slide_unpitch_to: [i32; 6],
    pub vibrato: [i32; 6],
    pub bend_values32: [ChordNoteBendEq; 6],
}

/// Wraps `ChordNoteBend` with the float-by-bit-pattern equality the
/// interner's value comparison needs (bend steps/times are never NaN in
/// practice, but `f64`/`f32` don't implement `Eq`).
#[derive(Debug, Clone, Default)]
pub struct ChordNoteBendEq(pub ChordNoteBend);

impl PartialEq for ChordNoteBendEq {
    fn eq(&self, other: &Self) -> bool {
        self.0.used_count == other.0.used_count
            && self
                .0
                .bend_values
                .iter()
                .zip(other.0.bend_values.iter())
                .all(|(a, b)| a.time.to_bits() == b.time.to_bits() && a.step.to_bits() == b.step.to_bits())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Note {
    pub time: f64,
    pub string: i32,
    pub fret: i32,
    pub sustain: f64,
    pub mask: u32,
    pub flags: u32,
    pub anchor_fret: i32,
    pub anchor_width: i32,
    pub chord_id: i32,
    pub chord_note_id: i32,
    pub finger_print_id: [i32; 2],
    pub next_iter_note: i32,
    pub prev_iter_note: i32,
    pub parent_prev_note: i32,
    pub phrase_iteration_id: i32,
    pub phrase_id: i32,
    pub hash: u32,
    pub ignore: i32,
    pub slide_to: i32,
}

#[derive(Debug, Clone, Default)]
pub struct Chord {
    pub time: f64,
    pub chord_id: i32,
    pub flags: u32,
    pub string: i32,
    pub fret: i32,
    pub anchor_fret: i32,
    pub anchor_width: i32,
    pub chord_note_id: i32,
    pub finger_print_id: [i32; 2],
    pub next_iter_note: i32,
    pub prev_iter_note: i32,
    pub parent_prev_note: i32,
    pub sustain: f64,
    pub mask: u32,
    pub phrase_iteration_id: i32,
    pub phrase_id: i32,
    pub hash: u32,
}

/// A note or a chord merged into a level's unified, time-sorted sequence,
/// mirroring the Python source's practice of appending chords onto
/// `level.notes` after tagging them as note-shaped records.
#[derive(Debug, Clone)]
pub enum LevelEvent {
    Note(Note),
    Chord(Chord),
}

impl LevelEvent {
    pub fn time(&self) -> f64 {
        match self {
            LevelEvent::Note(n) => n.time,
            LevelEvent::Chord(c) => c.time,
        }
    }

    pub fn is_chord(&self) -> bool {
        matches!(self, LevelEvent::Chord(_))
    }

    pub fn sustain(&self) -> f64 {
        match self {
            LevelEvent::Note(n) => n.sustain,
            LevelEvent::Chord(c) => c.sustain,
        }
    }

    pub fn chord_id(&self) -> i32 {
        match self {
            LevelEvent::Note(n) => n.chord_id,
            LevelEvent::Chord(c) => c.chord_id,
        }
    }

    pub fn string(&self) -> i32 {
        match self {
            LevelEvent::Note(n) => n.string,
            LevelEvent::Chord(c) => c.string,
        }
    }

    pub fn fret(&self) -> i32 {
        match self {
            LevelEvent::Note(n) => n.fret,
            LevelEvent::Chord(_) => -1,
        }
    }

    pub fn ignore(&self) -> i32 {
        match self {
            LevelEvent::Note(n) => n.ignore,
            LevelEvent::Chord(_) => 0,
        }
    }

    pub fn mask(&self) -> u32 {
        match self {
            LevelEvent::Note(n) => n.mask,
            LevelEvent::Chord(c) => c.mask,
        }
    }

    pub fn mask_mut(&mut self) -> &mut u32 {
        match self {
            LevelEvent::Note(n) => &mut n.mask,
            LevelEvent::Chord(c) => &mut c.mask,
        }
    }

    pub fn flags_mut(&mut self) -> &mut u32 {
        match self {
            LevelEvent::Note(n) => &mut n.flags,
            LevelEvent::Chord(c) => &mut c.flags,
        }
    }

    pub fn flags(&self) -> u32 {
        match self {
            LevelEvent::Note(n) => n.flags,
            LevelEvent::Chord(c) => c.flags,
        }
    }

    pub fn finger_print_id_mut(&mut self) -> &mut [i32; 2] {
        match self {
            LevelEvent::Note(n) => &mut n.finger_print_id,
            LevelEvent::Chord(c) => &mut c.finger_print_id,
        }
    }

    pub fn anchor_fret_mut(&mut self) -> &mut i32 {
        match self {
            LevelEvent::Note(n) => &mut n.anchor_fret,
            LevelEvent::Chord(c) => &mut c.anchor_fret,
        }
    }

    pub fn anchor_width_mut(&mut self) -> &mut i32 {
        match self {
            LevelEvent::Note(n) => &mut n.anchor_width,
            LevelEvent::Chord(c) => &mut c.anchor_width,
        }
    }

    pub fn next_iter_note_mut(&mut self) -> &mut i32 {
        match self {
            LevelEvent::Note(n) => &mut n.next_iter_note,
            LevelEvent::Chord(c) => &mut c.next_iter_note,
        }
    }

    pub fn prev_iter_note_mut(&mut self) -> &mut i32 {
        match self {
            LevelEvent::Note(n) => &mut n.prev_iter_note,
            LevelEvent::Chord(c) => &mut c.prev_iter_note,
        }
    }

    pub fn parent_prev_note_mut(&mut self) -> &mut i32 {
        match self {
            LevelEvent::Note(n) => &mut n.parent_prev_note,
            LevelEvent::Chord(c) => &mut c.parent_prev_note,
        }
    }

    pub fn slide_to(&self) -> i32 {
        match self {
            LevelEvent::Note(n) => n.slide_to,
            LevelEvent::Chord(_) => -1,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Anchor {
    pub time: f64,
    pub end_time: f64,
    pub fret: i32,
    pub width: i32,
    pub phrase_iteration_id: i32,
    pub unk_time: f64,
    pub unk_time2: f64,
}

#[derive(Debug, Clone, Default)]
pub struct AnchorExtension {
    pub fret: i32,
    pub time: f64,
}

#[derive(Debug, Clone, Default)]
pub struct Fingerprint {
    pub chord_id: i32,
    pub start_time: f64,
    pub end_time: f64,
    pub unk_start_time: f64,
    pub unk_end_time: f64,
}

#[derive(Debug, Clone, Default)]
pub struct Level {
    pub difficulty: i32,
    pub anchors: Vec<Anchor>,
    pub anchor_extensions: Vec<AnchorExtension>,
    /// `fingerprints[0]` = non-arpeggio hand-shapes, `fingerprints[1]` = arpeggio.
    pub fingerprints: [Vec<Fingerprint>; 2],
    pub notes: Vec<LevelEvent>,
    pub notes_in_iter_count: Vec<u32>,
    pub notes_in_iter_count_no_ignored: Vec<u32>,
    pub average_notes_per_iter: Vec<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct Beat {
    pub time: f64,
    pub measure: i32,
    pub beat: i32,
    pub mask: u32,
    pub phrase_iteration: i32,
}

#[derive(Debug, Clone, Default)]
pub struct ChordTemplate {
    pub display_name: String,
    pub frets: [i32; 6],
    pub mask: u32,
    pub notes: [i32; 6],
}

#[derive(Debug, Clone, Default)]
pub struct Phrase {
    pub max_difficulty: i32,
    pub phrase_iteration_links: u32,
}

#[derive(Debug, Clone, Default)]
pub struct PhraseIteration {
    pub time: f64,
    pub end_time: f64,
    pub phrase_id: i32,
    pub difficulty: [i32; 3],
}

#[derive(Debug, Clone, Default)]
pub struct NewLinkedDiff {
    pub phrase_ids: Vec<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct Dna {
    pub time: f64,
    pub id: i32,
}

#[derive(Debug, Clone)]
pub struct Section {
    pub name: String,
    pub start_time: f64,
    pub end_time: f64,
    pub start_phrase_iteration_id: i32,
    pub end_phrase_iteration_id: i32,
    pub string_mask: [u32; 36],
}

impl Default for Section {
    fn default() -> Self {
        Section {
            name: String::new(),
            start_time: 0.0,
            end_time: 0.0,
            start_phrase_iteration_id: 0,
            end_phrase_iteration_id: 0,
            string_mask: [0u32; 36],
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Metadata {
    pub max_score: f64,
    pub max_notes: f64,
    pub max_notes_no_ignored: f64,
    pub points_per_note: f64,
    pub first_beat_length: f64,
    pub start_time: f64,
    pub capo: i32,
    pub last_conversion_date_time: String,
    pub part: i32,
    pub song_length: f64,
    pub tuning: [i32; 6],
    pub first_note_time: f64,
    pub first_note_time2: f64,
    pub max_difficulty: i32,
}

#[derive(Debug, Clone, Default)]
pub struct CompiledSong {
    pub arrangement: String,
    pub beats: Vec<Beat>,
    pub phrases: Vec<Phrase>,
    pub phrase_iterations: Vec<PhraseIteration>,
    pub chord_templates: Vec<ChordTemplate>,
    pub new_linked_diffs: Vec<NewLinkedDiff>,
    pub dnas: Vec<Dna>,
    pub sections: Vec<Section>,
    pub levels: Vec<Level>,
    pub chord_notes: Vec<ChordNote>,
    pub metadata: Metadata,
}
