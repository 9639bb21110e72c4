//! The song compiler: a nine-pass semantic transform from an attributed-tree
//! arrangement into the fully resolved structure a binary SNG writer would
//! expect — beat timing, phrase-iteration links, chord-template interning,
//! window bounds, new-linked-diffs, DNA tagging, section string masks,
//! per-level compilation, and whole-song metadata aggregation.

use std::collections::HashMap;

use super::input::*;
use super::masks::{self, chord_mask, note_mask, CHORD_MASK_ARPEGGIO, NOTE_FLAGS_NUMBERED};
use super::model::*;

const MIDI_NOTES: [i32; 6] = [40, 45, 50, 55, 59, 64];

fn dna_id(code: &str) -> Option<i32> {
    match code {
        "dna_none" => Some(0),
        "dna_solo" => Some(1),
        "dna_riff" => Some(2),
        "dna_chord" => Some(3),
        _ => None,
    }
}

/// The phrase-iteration lookup used throughout: given a time `t`,
/// returns the index of the latest iteration whose `time` is ≤ `t` (with
/// `include_end` making equality count toward the *next* iteration too, so
/// the returned index can be one past what `time <= t` alone would give).
fn get_phrase_iteration(iterations: &[PhraseIteration], time: f64, include_end: bool) -> i32 {
    for (i, piter) in iterations.iter().enumerate().skip(1) {
        if piter.time > time || (include_end && piter.time == time) {
            return (i - 1) as i32;
        }
    }
    (iterations.len() - 1) as i32
}

fn midi(arrangement: &str, tuning: &RawTuning, string: usize, fret: i32) -> i32 {
    if fret == -1 {
        return -1;
    }
    let mut base = MIDI_NOTES[string] + tuning.strings[string];
    if arrangement == "Bass" {
        base -= 12;
    }
    base + fret
}

fn process_ebeats(input: &SongInput, phrase_iterations: &[PhraseIteration]) -> Vec<Beat> {
    let mut beats: Vec<Beat> = Vec::with_capacity(input.ebeats.len());
    let mut prev_measure = 0;
    let mut prev_beat = 0;

    for (i, eb) in input.ebeats.iter().enumerate() {
        let (measure, beat) = if i == 0 {
            (eb.measure, 0)
        } else if eb.measure > -1 {
            (eb.measure, 0)
        } else {
            (prev_measure, prev_beat + 1)
        };
        prev_measure = measure;
        prev_beat = beat;

        let mask = if beat != 0 {
            0
        } else if measure % 2 != 0 {
            1
        } else {
            3
        };

        beats.push(Beat {
            time: eb.time,
            measure,
            beat,
            mask,
            phrase_iteration: get_phrase_iteration(phrase_iterations, eb.time, true),
        });
    }

    beats
}

fn process_chord_template(arrangement: &str, tuning: &RawTuning, t: &RawChordTemplate) -> ChordTemplate {
    let mut mask = 0u32;
    if t.display_name.ends_with("arp") {
        mask |= masks::CHORD_MASK_ARPEGGIO;
    }
    if t.display_name.ends_with("nop") {
        mask |= masks::CHORD_MASK_NOP;
    }

    let mut notes = [0i32; 6];
    for (k, n) in notes.iter_mut().enumerate() {
        *n = midi(arrangement, tuning, k, t.frets[k]);
    }

    ChordTemplate {
        display_name: t.display_name.clone(),
        frets: t.frets,
        mask,
        notes,
    }
}

fn process_phrase_iterations(input: &SongInput, phrases: &[Phrase]) -> Vec<PhraseIteration> {
    let n = input.phrase_iterations.len();
    let mut out = Vec::with_capacity(n);

    for (i, pi) in input.phrase_iterations.iter().enumerate() {
        let end_time = if i + 1 < n {
            input.phrase_iterations[i + 1].time
        } else {
            input.song_length
        };

        let max_difficulty = phrases[pi.phrase_id as usize].max_difficulty;
        let mut difficulty = [0, 0, max_difficulty];
        for hero in &pi.hero_levels {
            difficulty[(hero.hero - 1) as usize] = hero.difficulty;
        }

        out.push(PhraseIteration {
            time: pi.time,
            end_time,
            phrase_id: pi.phrase_id,
            difficulty,
        });
    }

    out
}

fn process_sections(
    input: &SongInput,
    phrase_iterations: &[PhraseIteration],
    levels: &[(i32, &RawLevel)],
    chord_templates: &[ChordTemplate],
) -> Vec<Section> {
    let n = input.sections.len();
    let max_difficulty = levels.iter().map(|(d, _)| *d).max().unwrap_or(0);

    let mut out = Vec::with_capacity(n);
    for (i, s) in input.sections.iter().enumerate() {
        let end_time = if i + 1 < n {
            input.sections[i + 1].start_time
        } else {
            input.song_length
        };

        let mut stack = [0u32; 36];
        for level_idx in (0..=max_difficulty).rev() {
            let level = levels.iter().find(|(d, _)| *d == level_idx).map(|(_, l)| *l);
            let mut mask = 0u32;
            if let Some(level) = level {
                for note in &level.notes {
                    if note.time >= s.start_time && note.time < end_time {
                        mask |= 1 << note.string;
                    }
                }
                for chord in &level.chords {
                    if chord.time >= s.start_time && chord.time < end_time {
                        let template = &chord_templates[chord.chord_id as usize];
                        for (i, &fret) in template.frets.iter().enumerate() {
                            if fret > -1 {
                                mask |= 1 << i;
                            }
                        }
                    }
                }
            }
            if mask == 0 && level_idx < max_difficulty {
                mask = stack[(level_idx + 1) as usize];
            }
            stack[level_idx as usize] = mask;
        }

        out.push(Section {
            name: s.name.clone(),
            start_time: s.start_time,
            end_time,
            start_phrase_iteration_id: get_phrase_iteration(phrase_iterations, s.start_time, false),
            end_phrase_iteration_id: get_phrase_iteration(phrase_iterations, end_time, true),
            string_mask: stack,
        });
    }

    out
}

fn process_note(
    raw: &RawNote,
    single: bool,
    phrase_iterations: &[PhraseIteration],
) -> Note {
    let phrase_iteration_id = get_phrase_iteration(phrase_iterations, raw.time, false);
    let phrase_id = phrase_iterations[phrase_iteration_id as usize].phrase_id;
    let mask = note_mask(raw, single);

    Note {
        time: raw.time,
        string: raw.string,
        fret: raw.fret,
        sustain: raw.sustain,
        mask,
        flags: 0,
        anchor_fret: -1,
        anchor_width: -1,
        chord_id: -1,
        chord_note_id: -1,
        finger_print_id: [-1, -1],
        next_iter_note: -1,
        prev_iter_note: -1,
        parent_prev_note: -1,
        phrase_iteration_id,
        phrase_id,
        hash: note_hash(raw, mask),
        ignore: raw.ignore,
        slide_to: raw.slide_to,
    }
}

/// Stand-in for the Python source's `crc32(str(note.values()))`: a
/// deterministic hash over the fields that drive the record's identity, in
/// the order they're declared in the original XML schema.
fn note_hash(raw: &RawNote, mask: u32) -> u32 {
    let mut buf = Vec::new();
    buf.extend_from_slice(&raw.time.to_le_bytes());
    buf.extend_from_slice(&raw.string.to_le_bytes());
    buf.extend_from_slice(&raw.fret.to_le_bytes());
    buf.extend_from_slice(&raw.sustain.to_le_bytes());
    buf.extend_from_slice(&mask.to_le_bytes());
    crc32fast::hash(&buf)
}

fn chord_note_hash(time: f64, chord_id: i32, mask: u32) -> u32 {
    let mut buf = Vec::new();
    buf.extend_from_slice(&time.to_le_bytes());
    buf.extend_from_slice(&chord_id.to_le_bytes());
    buf.extend_from_slice(&mask.to_le_bytes());
    crc32fast::hash(&buf)
}

fn process_chord_note(raw: &RawChord) -> ChordNote {
    let mut mask = [0u32; 6];
    let mut slide_to = [-1i32; 6];
    let mut slide_unpitch_to = [-1i32; 6];
    let mut vibrato = [0i32; 6];
    let mut bend_values32: [ChordNoteBendEq; 6] = Default::default();

    for entry in &raw.chord_note {
        let s = entry.string as usize;
        mask[s] = entry.mask;
        vibrato[s] = entry.vibrato;
        slide_to[s] = entry.slide_to;
        slide_unpitch_to[s] = entry.slide_unpitch_to;

        let mut bend = ChordNoteBend {
            used_count: entry.bend_values.len() as u32,
            ..ChordNoteBend::default()
        };
        for (dst, src) in bend.bend_values.iter_mut().zip(entry.bend_values.iter()) {
            *dst = BendValue32 {
                time: src.time,
                step: src.step,
            };
        }
        bend_values32[s] = ChordNoteBendEq(bend);
    }

    ChordNote {
        mask,
        slide_to,
        slide_unpitch_to,
        vibrato,
        bend_values32,
    }
}

fn process_chord(
    raw: &RawChord,
    phrase_iterations: &[PhraseIteration],
    chord_templates: &[ChordTemplate],
    chord_notes: &mut Vec<ChordNote>,
) -> Chord {
    let cn = process_chord_note(raw);
    let technique = cn.mask.iter().any(|&m| m != 0);

    let chord_note_id = if technique {
        match chord_notes.iter().position(|existing| existing == &cn) {
            Some(idx) => idx as i32,
            None => {
                chord_notes.push(cn);
                (chord_notes.len() - 1) as i32
            }
        }
    } else {
        -1
    };

    let sustain = raw
        .chord_note
        .iter()
        .map(|n| n.sustain)
        .fold(0.0f64, f64::max);

    let phrase_iteration_id = get_phrase_iteration(phrase_iterations, raw.time, false);
    let phrase_id = phrase_iterations[phrase_iteration_id as usize].phrase_id;

    let fretted_string_count = chord_templates[raw.chord_id as usize]
        .frets
        .iter()
        .filter(|&&f| f != -1)
        .count() as u32;

    let mask = chord_mask(
        chord_note_id,
        raw.link_next,
        raw.accent,
        raw.fret_hand_mute,
        raw.high_density,
        raw.ignore,
        raw.palm_mute,
        sustain,
        fretted_string_count,
    );

    Chord {
        time: raw.time,
        chord_id: raw.chord_id,
        flags: 0,
        string: -1,
        fret: -1,
        anchor_fret: -1,
        anchor_width: -1,
        chord_note_id,
        finger_print_id: [-1, -1],
        next_iter_note: -1,
        prev_iter_note: -1,
        parent_prev_note: -1,
        sustain,
        mask,
        phrase_iteration_id,
        phrase_id,
        hash: chord_note_hash(raw.time, raw.chord_id, mask),
    }
}

#[allow(clippy::too_many_arguments)]
fn process_level(
    raw: &RawLevel,
    phrase_iterations: &[PhraseIteration],
    chord_templates: &[ChordTemplate],
    chord_notes: &mut Vec<ChordNote>,
    phrases: &[Phrase],
    first_note_time: &mut f64,
) -> Level {
    let last_iter_time = phrase_iterations.last().map(|p| p.time).unwrap_or(0.0);

    let mut anchors: Vec<Anchor> = Vec::with_capacity(raw.anchors.len());
    let n_anchors = raw.anchors.len();
    for (i, a) in raw.anchors.iter().enumerate() {
        let end_time = if i + 1 < n_anchors {
            raw.anchors[i + 1].time
        } else {
            last_iter_time
        };
        anchors.push(Anchor {
            time: a.time,
            end_time,
            fret: a.fret,
            width: a.width as i32,
            phrase_iteration_id: get_phrase_iteration(phrase_iterations, a.time, false),
            unk_time: 0.0,
            unk_time2: 0.0,
        });
    }

    let is_arpeggio = |chord_id: i32| -> bool {
        chord_templates[chord_id as usize].mask & CHORD_MASK_ARPEGGIO != 0
    };
    let mut fingerprints: [Vec<Fingerprint>; 2] = [Vec::new(), Vec::new()];
    for hs in &raw.hand_shapes {
        let fp = Fingerprint {
            chord_id: hs.chord_id,
            start_time: hs.start_time,
            end_time: hs.end_time,
            unk_start_time: 0.0,
            unk_end_time: 0.0,
        };
        if is_arpeggio(hs.chord_id) {
            fingerprints[1].push(fp);
        } else {
            fingerprints[0].push(fp);
        }
    }

    let mut notes: Vec<LevelEvent> = Vec::with_capacity(raw.notes.len() + raw.chords.len());
    for n in &raw.notes {
        notes.push(LevelEvent::Note(process_note(n, true, phrase_iterations)));
    }
    for c in &raw.chords {
        notes.push(LevelEvent::Chord(process_chord(
            c,
            phrase_iterations,
            chord_templates,
            chord_notes,
        )));
    }
    notes.sort_by(|a, b| a.time().partial_cmp(&b.time()).unwrap());

    if let Some(first) = notes.first() {
        if first.time() < *first_note_time {
            *first_note_time = first.time();
        }
    }

    for note in notes.iter_mut() {
        for j in 0..2 {
            let fp_count = fingerprints[j].len();
            for i in 0..fp_count {
                let (start, end) = (fingerprints[j][i].start_time, fingerprints[j][i].end_time);
                if start <= note.time() && note.time() < end {
                    note.finger_print_id_mut()[j] = i as i32;
                    if j == 1 {
                        *note.mask_mut() |= masks::NOTE_MASK_ARPEGGIO;
                    }
                    if start == note.time() && note.is_chord() {
                        *note.mask_mut() |= masks::NOTE_MASK_STRUM;
                    }
                    let fp = &mut fingerprints[j][i];
                    if fp.unk_start_time == 0.0 {
                        fp.unk_start_time = note.time();
                    }
                    fp.unk_end_time = note.time();
                    if note.time() + note.sustain() < fp.end_time {
                        fp.unk_end_time += note.sustain();
                    }
                }
            }
        }

        for anchor in anchors.iter_mut() {
            if anchor.time <= note.time() && note.time() < anchor.end_time {
                *note.anchor_width_mut() = anchor.width;
                *note.anchor_fret_mut() = anchor.fret;
                if anchor.unk_time == 0.0 {
                    anchor.unk_time = note.time();
                }
                anchor.unk_time2 = note.time();
                if note.time() + note.sustain() < anchor.end_time - 0.1 {
                    anchor.unk_time2 += note.sustain();
                }
            }
        }
    }

    for anchor in anchors.iter_mut() {
        if anchor.unk_time == 0.0 {
            anchor.unk_time = anchor.time;
            anchor.unk_time2 = anchor.time + 0.1;
        }
    }

    // Prev/next iteration chaining.
    for piter in phrase_iterations {
        let mut count = 0usize;
        let mut last_j = 0usize;
        for (j, note) in notes.iter_mut().enumerate() {
            if note.time() < piter.time {
                continue;
            }
            if piter.end_time <= note.time() {
                break;
            }
            *note.next_iter_note_mut() = j as i32 + 1;
            if count > 0 {
                *note.prev_iter_note_mut() = j as i32 - 1;
            }
            count += 1;
            last_j = j;
        }
        if count > 0 {
            *notes[last_j].next_iter_note_mut() = -1;
        }
    }

    // Parent-child linking.
    for j in 1..notes.len() {
        let note_time = notes[j].time();
        let note_string = notes[j].string();
        let note_chord_id = notes[j].chord_id();

        let mut prevnote = 1usize;
        if notes[j].time() != notes[j - 1].time() {
            prevnote = 1;
        } else {
            for i in 0..notes.len() {
                if j < i + 1 {
                    prevnote = i;
                    break;
                }
                let prv = &notes[j - i];
                if prv.time() != note_time && (prv.chord_id() != -1 || prv.string() == note_string) {
                    prevnote = i;
                    break;
                }
            }
        }

        if j < prevnote {
            continue;
        }
        let prev_flags_has_parent = notes[j - prevnote].mask() & masks::NOTE_MASK_PARENT != 0;
        let prev_next_iter = *notes[j - prevnote].next_iter_note_mut();
        if prev_flags_has_parent {
            *notes[j].parent_prev_note_mut() = prev_next_iter - 1;
            *notes[j].flags_mut() |= masks::NOTE_MASK_CHILD;
        }
    }

    // Anchor extensions.
    let mut anchor_extensions = Vec::new();
    for note in &notes {
        if note.slide_to() != -1 {
            anchor_extensions.push(AnchorExtension {
                fret: note.slide_to(),
                time: note.time() + note.sustain(),
            });
        }
    }

    // Per-iteration counters.
    let mut notes_in_iter_count = vec![0u32; phrase_iterations.len()];
    let mut notes_in_iter_count_no_ignored = vec![0u32; phrase_iterations.len()];
    for note in &notes {
        for (i, piter) in phrase_iterations.iter().enumerate().skip(1) {
            if piter.time > note.time() {
                if note.ignore() == 0 {
                    notes_in_iter_count_no_ignored[i - 1] += 1;
                }
                notes_in_iter_count[i - 1] += 1;
                break;
            }
        }
    }

    let mut average_notes_per_iter = vec![0.0f64; phrases.len()];
    let mut iter_count = vec![0u32; phrases.len()];
    for (i, piter) in phrase_iterations.iter().enumerate() {
        average_notes_per_iter[piter.phrase_id as usize] += notes_in_iter_count[i] as f64;
        iter_count[piter.phrase_id as usize] += 1;
    }
    for (i, count) in iter_count.iter().enumerate() {
        if *count > 0 {
            average_notes_per_iter[i] /= *count as f64;
        }
    }

    // Numbered-repeat flag.
    let mut p = 0usize;
    let mut i = 0usize;
    while i < notes.len() {
        if notes[i].fret() == 0 {
            i += 1;
            continue;
        }
        if p < phrase_iterations.len() && phrase_iterations[p].end_time <= notes[i].time() {
            p += 1;
            continue;
        }

        let start = i.saturating_sub(8);
        let mut repeat = false;
        let mut j = i as isize - 1;
        while j >= start as isize {
            let ju = j as usize;
            if notes[ju].time() + 2.0 < notes[i].time() {
                j -= 1;
                continue;
            }
            if p < phrase_iterations.len() && notes[ju].time() < phrase_iterations[p].time {
                j -= 1;
                continue;
            }
            let same = if notes[i].chord_id() == -1 {
                notes[ju].fret() == notes[i].fret()
            } else {
                notes[ju].chord_id() == notes[i].chord_id()
            };
            if same && notes[ju].flags() & NOTE_FLAGS_NUMBERED != 0 {
                repeat = true;
                break;
            }
            j -= 1;
        }

        if !repeat {
            *notes[i].flags_mut() |= NOTE_FLAGS_NUMBERED;
        }
        i += 1;
    }

    Level {
        difficulty: raw.difficulty,
        anchors,
        anchor_extensions,
        fingerprints,
        notes,
        notes_in_iter_count,
        notes_in_iter_count_no_ignored,
        average_notes_per_iter,
    }
}

fn process_metadata(input: &SongInput, phrases: &[Phrase], phrase_iterations: &[PhraseIteration], beats: &[Beat], levels: &[Level], first_note_time: f64) -> Metadata {
    let max_difficulty = phrases.iter().map(|p| p.max_difficulty).max().unwrap_or(0);

    let mut max_notes = 0.0f64;
    let mut max_notes_no_ignored = 0.0f64;
    for (i, piter) in phrase_iterations.iter().enumerate() {
        let j = phrases[piter.phrase_id as usize].max_difficulty;
        if let Some(level) = levels.get(j as usize) {
            max_notes += level.notes_in_iter_count[i] as f64;
            max_notes_no_ignored += level.notes_in_iter_count_no_ignored[i] as f64;
        }
    }

    let points_per_note = if max_notes > 0.0 {
        100_000.0 / max_notes
    } else {
        0.0
    };

    let first_beat_length = if beats.len() > 1 {
        beats[1].time - beats[0].time
    } else {
        0.0
    };

    Metadata {
        max_score: 100_000.0,
        max_notes,
        max_notes_no_ignored,
        points_per_note,
        first_beat_length,
        start_time: -input.offset,
        capo: if input.capo != 0 { input.capo } else { -1 },
        last_conversion_date_time: input.last_conversion_date_time.clone(),
        part: input.part,
        song_length: input.song_length,
        tuning: input.tuning.strings,
        first_note_time,
        first_note_time2: first_note_time,
        max_difficulty,
    }
}

/// Runs the full nine-pass compilation over an attributed-tree arrangement.
pub fn compile(input: &SongInput) -> CompiledSong {
    let mut phrases: Vec<Phrase> = input
        .phrases
        .iter()
        .map(|p| Phrase {
            max_difficulty: p.max_difficulty,
            phrase_iteration_links: 0,
        })
        .collect();

    let mut links: HashMap<usize, u32> = HashMap::new();
    for pi in &input.phrase_iterations {
        *links.entry(pi.phrase_id as usize).or_insert(0) += 1;
    }
    for (i, phrase) in phrases.iter_mut().enumerate() {
        phrase.phrase_iteration_links = *links.get(&i).unwrap_or(&0);
    }

    let phrase_iterations = process_phrase_iterations(input, &phrases);
    let beats = process_ebeats(input, &phrase_iterations);

    let chord_templates: Vec<ChordTemplate> = input
        .chord_templates
        .iter()
        .map(|t| process_chord_template(&input.arrangement, &input.tuning, t))
        .collect();

    let new_linked_diffs: Vec<NewLinkedDiff> = input
        .new_linked_diffs
        .iter()
        .map(|nld| NewLinkedDiff {
            phrase_ids: nld.phrase_ids.clone(),
        })
        .collect();

    let dnas: Vec<Dna> = input
        .events
        .iter()
        .filter_map(|e| dna_id(&e.code).map(|id| Dna { time: e.time, id }))
        .collect();

    let level_refs: Vec<(i32, &RawLevel)> = input.levels.iter().map(|l| (l.difficulty, l)).collect();
    let sections = process_sections(input, &phrase_iterations, &level_refs, &chord_templates);

    let mut chord_notes: Vec<ChordNote> = Vec::new();
    let mut first_note_time = 1.0e6f64;
    let mut levels: Vec<Level> = input
        .levels
        .iter()
        .map(|raw| {
            process_level(
                raw,
                &phrase_iterations,
                &chord_templates,
                &mut chord_notes,
                &phrases,
                &mut first_note_time,
            )
        })
        .collect();

    let metadata = process_metadata(input, &phrases, &phrase_iterations, &beats, &levels, first_note_time);

    let max_difficulty = metadata.max_difficulty;
    levels.truncate((max_difficulty + 1).max(0) as usize);

    CompiledSong {
        arrangement: input.arrangement.clone(),
        beats,
        phrases,
        phrase_iterations,
        chord_templates,
        new_linked_diffs,
        dnas,
        sections,
        levels,
        chord_notes,
        metadata,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_input() -> SongInput {
        SongInput {
            arrangement: "Lead".to_string(),
            part: 1,
            capo: 0,
            offset: 0.5,
            song_length: 10.0,
            last_conversion_date_time: "2024-01-01".to_string(),
            tuning: RawTuning { strings: [0; 6] },
            ebeats: vec![
                RawEbeat { time: 0.0, measure: 0 },
                RawEbeat { time: 1.0, measure: 1 },
            ],
            // Index 0 is the mandatory count-in iteration, index 1 is the
            // one real iteration the scenario describes, index 2 is the
            // trailing end-of-song marker every real arrangement carries
            // so the last real iteration's notes still get counted.
            phrases: vec![
                RawPhrase { max_difficulty: 0 },
                RawPhrase { max_difficulty: 0 },
                RawPhrase { max_difficulty: 0 },
            ],
            phrase_iterations: vec![
                RawPhraseIteration {
                    time: 0.0,
                    phrase_id: 0,
                    hero_levels: vec![],
                },
                RawPhraseIteration {
                    time: 0.0,
                    phrase_id: 1,
                    hero_levels: vec![],
                },
                RawPhraseIteration {
                    time: 4.0,
                    phrase_id: 2,
                    hero_levels: vec![],
                },
            ],
            new_linked_diffs: vec![],
            chord_templates: vec![],
            events: vec![],
            sections: vec![RawSection {
                name: "riff".to_string(),
                start_time: 0.0,
            }],
            levels: vec![RawLevel {
                difficulty: 0,
                notes: vec![RawNote {
                    time: 0.0,
                    string: 0,
                    fret: 3,
                    ..RawNote::default()
                }],
                chords: vec![],
                anchors: vec![],
                hand_shapes: vec![],
            }],
        }
    }

    #[test]
    fn s5_minimal_song_metadata() {
        let song = compile(&minimal_input());
        assert_eq!(song.metadata.max_notes, 1.0);
        assert_eq!(song.metadata.points_per_note, 100_000.0);
        assert_eq!(song.metadata.first_beat_length, 1.0);
        assert_eq!(song.metadata.start_time, -0.5);
    }

    #[test]
    fn invariant7_first_note_time_matches_metadata_duplicate() {
        let song = compile(&minimal_input());
        assert_eq!(song.metadata.first_note_time, song.metadata.first_note_time2);
        assert_eq!(song.metadata.first_note_time, 0.0);
    }

    #[test]
    fn invariant8_notes_in_iter_count_sums_to_note_count() {
        let song = compile(&minimal_input());
        let level = &song.levels[0];
        let total: u32 = level.notes_in_iter_count.iter().sum();
        assert_eq!(total as usize, level.notes.len());
    }

    #[test]
    fn s6_chord_with_zero_mask_chordnotes_has_no_chordnoteid() {
        let mut input = minimal_input();
        input.chord_templates = vec![RawChordTemplate {
            display_name: "Am".to_string(),
            frets: [0, 2, 2, -1, -1, -1],
        }];
        input.levels[0].notes.clear();
        input.levels[0].chords.push(RawChord {
            time: 0.0,
            chord_id: 0,
            chord_note: vec![
                RawChordNoteEntry {
                    string: 0,
                    ..Default::default()
                },
                RawChordNoteEntry {
                    string: 1,
                    ..Default::default()
                },
            ],
            ..Default::default()
        });

        let song = compile(&input);
        let chord = match &song.levels[0].notes[0] {
            LevelEvent::Chord(c) => c,
            LevelEvent::Note(_) => panic!("expected a chord"),
        };
        assert_eq!(chord.chord_note_id, -1);
        assert_eq!(chord.mask & masks::NOTE_MASK_DOUBLESTOP, 0);
        assert_eq!(chord.mask & masks::NOTE_MASK_CHORDNOTES, 0);
        assert_ne!(chord.mask & masks::NOTE_MASK_CHORD, 0);
    }

    #[test]
    fn chord_notes_contains_no_duplicate_aggregates() {
        let mut input = minimal_input();
        input.chord_templates = vec![RawChordTemplate {
            display_name: "Em".to_string(),
            frets: [0, 2, 2, 0, 0, 0],
        }];
        input.levels[0].notes.clear();
        let make_chord = || RawChord {
            time: 0.0,
            chord_id: 0,
            chord_note: vec![RawChordNoteEntry {
                string: 0,
                mask: 1,
                ..Default::default()
            }],
            ..Default::default()
        };
        input.levels[0].chords.push(make_chord());
        let mut second = make_chord();
        second.time = 1.0;
        input.levels[0].chords.push(second);

        let song = compile(&input);
        assert_eq!(song.chord_notes.len(), 1);
    }
}
