//! Bitmask tables for per-note and per-chord-note technique flags, and the
//! functions that derive a mask from a raw note or chord-note entry.

use super::input::RawNote;

pub const CHORD_MASK_ARPEGGIO: u32 = 0x0000_0001;
pub const CHORD_MASK_NOP: u32 = 0x0000_0002;

pub const NOTE_FLAGS_NUMBERED: u32 = 0x0000_0001;

pub const NOTE_MASK_CHORD: u32 = 0x0000_0002;
pub const NOTE_MASK_OPEN: u32 = 0x0000_0004;
pub const NOTE_MASK_FRETHANDMUTE: u32 = 0x0000_0008;
pub const NOTE_MASK_TREMOLO: u32 = 0x0000_0010;
pub const NOTE_MASK_HARMONIC: u32 = 0x0000_0020;
pub const NOTE_MASK_PALMMUTE: u32 = 0x0000_0040;
pub const NOTE_MASK_SLAP: u32 = 0x0000_0080;
pub const NOTE_MASK_PLUCK: u32 = 0x0000_0100;
pub const NOTE_MASK_HAMMERON: u32 = 0x0000_0200;
pub const NOTE_MASK_PULLOFF: u32 = 0x0000_0400;
pub const NOTE_MASK_SLIDE: u32 = 0x0000_0800;
pub const NOTE_MASK_BEND: u32 = 0x0000_1000;
pub const NOTE_MASK_SUSTAIN: u32 = 0x0000_2000;
pub const NOTE_MASK_TAP: u32 = 0x0000_4000;
pub const NOTE_MASK_PINCHHARMONIC: u32 = 0x0000_8000;
pub const NOTE_MASK_VIBRATO: u32 = 0x0001_0000;
pub const NOTE_MASK_MUTE: u32 = 0x0002_0000;
pub const NOTE_MASK_IGNORE: u32 = 0x0004_0000;
pub const NOTE_MASK_LEFTHAND: u32 = 0x0008_0000;
pub const NOTE_MASK_RIGHTHAND: u32 = 0x0010_0000;
pub const NOTE_MASK_HIGHDENSITY: u32 = 0x0020_0000;
pub const NOTE_MASK_SLIDEUNPITCHEDTO: u32 = 0x0040_0000;
pub const NOTE_MASK_SINGLE: u32 = 0x0080_0000;
pub const NOTE_MASK_CHORDNOTES: u32 = 0x0100_0000;
pub const NOTE_MASK_DOUBLESTOP: u32 = 0x0200_0000;
pub const NOTE_MASK_ACCENT: u32 = 0x0400_0000;
pub const NOTE_MASK_PARENT: u32 = 0x0800_0000;
pub const NOTE_MASK_CHILD: u32 = 0x1000_0000;
pub const NOTE_MASK_ARPEGGIO: u32 = 0x2000_0000;
pub const NOTE_MASK_STRUM: u32 = 0x8000_0000;

/// Computes a standalone-note or chord-note bitmask.
/// `single` is true for standalone notes and false for notes embedded in a
/// chord (chord-notes never set IGNORE/LEFTHAND, and always omit SINGLE).
pub fn note_mask(note: &RawNote, single: bool) -> u32 {
    let mut mask = 0u32;
    if single {
        mask |= NOTE_MASK_SINGLE;
    }
    if note.fret == 0 {
        mask |= NOTE_MASK_OPEN;
    }
    if note.link_next != 0 {
        mask |= NOTE_MASK_PARENT;
    }
    if note.accent != 0 {
        mask |= NOTE_MASK_ACCENT;
    }
    if note.bend != 0.0 {
        mask |= NOTE_MASK_BEND;
    }
    if note.hammer_on != 0 {
        mask |= NOTE_MASK_HAMMERON;
    }
    if note.harmonic != 0 {
        mask |= NOTE_MASK_HARMONIC;
    }
    if single && note.ignore != 0 {
        mask |= NOTE_MASK_IGNORE;
    }
    if single && note.left_hand != -1 {
        mask |= NOTE_MASK_LEFTHAND;
    }
    if note.mute != 0 {
        mask |= NOTE_MASK_MUTE;
    }
    if note.palm_mute != 0 {
        mask |= NOTE_MASK_PALMMUTE;
    }
    if note.pluck != -1 {
        mask |= NOTE_MASK_PLUCK;
    }
    if note.pull_off != 0 {
        mask |= NOTE_MASK_PULLOFF;
    }
    if note.slap != -1 {
        mask |= NOTE_MASK_SLAP;
    }
    if note.slide_to != -1 {
        mask |= NOTE_MASK_SLIDE;
    }
    if note.sustain != 0.0 {
        mask |= NOTE_MASK_SUSTAIN;
    }
    if note.tremolo != 0 {
        mask |= NOTE_MASK_TREMOLO;
    }
    if note.harmonic_pinch != 0 {
        mask |= NOTE_MASK_PINCHHARMONIC;
    }
    if note.right_hand != -1 {
        mask |= NOTE_MASK_RIGHTHAND;
    }
    if note.slide_unpitch_to != -1 {
        mask |= NOTE_MASK_SLIDEUNPITCHEDTO;
    }
    if note.tap != 0 {
        mask |= NOTE_MASK_TAP;
    }
    if note.vibrato != 0 {
        mask |= NOTE_MASK_VIBRATO;
    }
    mask
}

/// Computes a chord mask from flags already resolved onto the chord
/// (the CHORD and conditionally CHORDNOTES/DOUBLESTOP bits are added by the
/// caller, which knows `chordNoteId` and the fretted-string count).
#[allow(clippy::too_many_arguments)]
pub fn chord_mask(
    chord_note_id: i32,
    link_next: i32,
    accent: i32,
    fret_hand_mute: i32,
    high_density: i32,
    ignore: i32,
    palm_mute: i32,
    sustain: f64,
    fretted_string_count: u32,
) -> u32 {
    let mut mask = NOTE_MASK_CHORD;
    if chord_note_id > -1 {
        mask |= NOTE_MASK_CHORDNOTES;
    }
    if link_next != 0 {
        mask |= NOTE_MASK_PARENT;
    }
    if accent != 0 {
        mask |= NOTE_MASK_ACCENT;
    }
    if fret_hand_mute != 0 {
        mask |= NOTE_MASK_FRETHANDMUTE;
    }
    if high_density != 0 {
        mask |= NOTE_MASK_HIGHDENSITY;
    }
    if ignore != 0 {
        mask |= NOTE_MASK_IGNORE;
    }
    if palm_mute != 0 {
        mask |= NOTE_MASK_PALMMUTE;
    }
    if sustain > 0.0 {
        mask |= NOTE_MASK_SUSTAIN;
    }
    if fretted_string_count == 2 {
        mask |= NOTE_MASK_DOUBLESTOP;
    }
    mask
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(fret: i32) -> RawNote {
        RawNote {
            time: 0.0,
            string: 0,
            fret,
            sustain: 0.0,
            ..RawNote::default()
        }
    }

    #[test]
    fn open_string_note_sets_single_and_open() {
        let mask = note_mask(&note(0), true);
        assert_eq!(mask, NOTE_MASK_SINGLE | NOTE_MASK_OPEN);
    }

    #[test]
    fn chord_note_never_sets_single_ignore_or_lefthand() {
        let mut n = note(3);
        n.ignore = 1;
        n.left_hand = 2;
        let mask = note_mask(&n, false);
        assert_eq!(mask & NOTE_MASK_SINGLE, 0);
        assert_eq!(mask & NOTE_MASK_IGNORE, 0);
        assert_eq!(mask & NOTE_MASK_LEFTHAND, 0);
    }

    #[test]
    fn s6_three_fretted_strings_chord_has_no_doublestop() {
        // frets [0,2,2,-1,-1,-1]: three fretted strings.
        let mask = chord_mask(-1, 0, 0, 0, 0, 0, 0, 0.0, 3);
        assert_eq!(mask & NOTE_MASK_DOUBLESTOP, 0);
        assert_eq!(mask & NOTE_MASK_CHORDNOTES, 0);
        assert_ne!(mask & NOTE_MASK_CHORD, 0);
    }
}
