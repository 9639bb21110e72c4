//! The attributed-tree input to the song compiler.
//!
//! One typed struct per XML entity (beat, phrase, chord template, note,
//! section, ...) instead of a dynamic attribute dict. A thin mapper from a
//! parsed XML document into these structs is expected to sit in front of
//! `compile`; that parsing step is out of scope for this crate.

#[derive(Debug, Clone, Default)]
pub struct RawBendValue {
    pub time: f64,
    pub step: f32,
}

#[derive(Debug, Clone)]
pub struct RawNote {
    pub time: f64,
    pub string: i32,
    pub fret: i32,
    pub sustain: f64,
    pub accent: i32,
    pub bend: f32,
    pub hammer_on: i32,
    pub harmonic: i32,
    pub harmonic_pinch: i32,
    pub ignore: i32,
    pub left_hand: i32,
    pub link_next: i32,
    pub mute: i32,
    pub palm_mute: i32,
    pub pluck: i32,
    pub pull_off: i32,
    pub right_hand: i32,
    pub slap: i32,
    pub slide_to: i32,
    pub slide_unpitch_to: i32,
    pub tap: i32,
    pub tremolo: i32,
    pub vibrato: i32,
    pub bend_values: Vec<RawBendValue>,
}

impl Default for RawNote {
    /// `pluck`/`slap`/`left_hand`/`right_hand`/`slide_to`/`slide_unpitch_to`
    /// use `-1` as "absent", not `0` — `note_mask` tests each against `-1`.
    fn default() -> Self {
        RawNote {
            time: 0.0,
            string: 0,
            fret: 0,
            sustain: 0.0,
            accent: 0,
            bend: 0.0,
            hammer_on: 0,
            harmonic: 0,
            harmonic_pinch: 0,
            ignore: 0,
            left_hand: -1,
            link_next: 0,
            mute: 0,
            palm_mute: 0,
            pluck: -1,
            pull_off: 0,
            right_hand: -1,
            slap: -1,
            slide_to: -1,
            slide_unpitch_to: -1,
            tap: 0,
            tremolo: 0,
            vibrato: 0,
            bend_values: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RawChordNoteEntry {
    pub string: i32,
    pub mask: u32,
    pub sustain: f64,
    pub vibrato: i32,
    pub slide_to: i32,
    pub slide_unpitch_to: i32,
    pub bend_values: Vec<RawBendValue>,
}

#[derive(Debug, Clone, Default)]
pub struct RawChord {
    pub time: f64,
    pub chord_id: i32,
    pub link_next: i32,
    pub accent: i32,
    pub fret_hand_mute: i32,
    pub high_density: i32,
    pub ignore: i32,
    pub palm_mute: i32,
    pub chord_note: Vec<RawChordNoteEntry>,
}

#[derive(Debug, Clone, Default)]
pub struct RawChordTemplate {
    pub display_name: String,
    pub frets: [i32; 6],
}

#[derive(Debug, Clone, Default)]
pub struct RawEbeat {
    pub time: f64,
    pub measure: i32,
}

#[derive(Debug, Clone, Default)]
pub struct RawHeroLevel {
    pub hero: i32,
    pub difficulty: i32,
}

#[derive(Debug, Clone, Default)]
pub struct RawPhrase {
    pub max_difficulty: i32,
}

#[derive(Debug, Clone, Default)]
pub struct RawPhraseIteration {
    pub time: f64,
    pub phrase_id: i32,
    pub hero_levels: Vec<RawHeroLevel>,
}

#[derive(Debug, Clone, Default)]
pub struct RawNewLinkedDiff {
    pub phrase_ids: Vec<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct RawEvent {
    pub time: f64,
    pub code: String,
}

#[derive(Debug, Clone, Default)]
pub struct RawSection {
    pub name: String,
    pub start_time: f64,
}

#[derive(Debug, Clone, Default)]
pub struct RawAnchor {
    pub time: f64,
    pub fret: i32,
    pub width: f64,
}

#[derive(Debug, Clone, Default)]
pub struct RawHandShape {
    pub chord_id: i32,
    pub start_time: f64,
    pub end_time: f64,
}

#[derive(Debug, Clone, Default)]
pub struct RawLevel {
    pub difficulty: i32,
    pub notes: Vec<RawNote>,
    pub chords: Vec<RawChord>,
    pub anchors: Vec<RawAnchor>,
    pub hand_shapes: Vec<RawHandShape>,
}

#[derive(Debug, Clone, Default)]
pub struct RawTuning {
    pub strings: [i32; 6],
}

/// Top-level attributed-tree input consumed by `compile::compile`.
#[derive(Debug, Clone, Default)]
pub struct SongInput {
    pub arrangement: String,
    pub part: i32,
    pub capo: i32,
    pub offset: f64,
    pub song_length: f64,
    pub last_conversion_date_time: String,
    pub tuning: RawTuning,
    pub ebeats: Vec<RawEbeat>,
    pub phrases: Vec<RawPhrase>,
    pub phrase_iterations: Vec<RawPhraseIteration>,
    pub new_linked_diffs: Vec<RawNewLinkedDiff>,
    pub chord_templates: Vec<RawChordTemplate>,
    pub events: Vec<RawEvent>,
    pub sections: Vec<RawSection>,
    pub levels: Vec<RawLevel>,
}
