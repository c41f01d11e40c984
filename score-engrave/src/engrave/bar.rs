//! One bar of one part, filled by symbols in a single forward pass.
//!
//! The engraver keeps a cursor, the note fragments still to be written, the
//! accidentals shown so far, an open beam and an open tuplet. Every step
//! writes one rest or one chord of heads at the cursor and moves it by the
//! written duration. Heads lasting past their written value are tied, and
//! the remainder goes back to the queue (or to the next bar).

use std::{
    cmp::Reverse,
    collections::{HashMap, VecDeque},
};

use itertools::Itertools;
use log::{debug, warn};

use crate::{
    notation::{Articulation, PartSpec, Placement, Stave},
    primitives::{
        fraction_tools::{is_integer, round, to_f64},
        frac, key_scale, parse_note_name, spell_pitch_class, Bar, Beat,
        BeamSymbol, ChordSymbol, Diagnostic, Key, Letter, NoteSymbol, Pitch,
        RestSymbol, Symbol, TupletRatio, TupletSymbol,
    },
    settings::RenderSettings,
};

use super::{
    key_estimate::KeyEstimate,
    rhythm::fit_duration,
    tuplet::{detect, is_swing_window, swing_index, Onset, TupletMatch},
    RenderContext,
};

/// The part of a note still to be written, relative to the bar.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub start: Beat,
    pub duration: Beat,
    pub pitch: Pitch,
    pub velocity: f64,
    /// Continues a tied head.
    pub tied: bool,
}
impl Fragment {
    pub fn new(
        start: Beat,
        duration: Beat,
        pitch: Pitch,
        velocity: f64,
    ) -> Self {
        Self {
            start,
            duration,
            pitch,
            velocity,
            tied: false,
        }
    }
    pub fn stop(&self) -> Beat {
        self.start + self.duration
    }
}

/// Chord names and lyrics, relative to the bar.
#[derive(Debug, Clone, PartialEq)]
pub enum Annotation {
    Chord {
        beat: Beat,
        duration: Beat,
        root: String,
        extension: String,
    },
    Lyric {
        beat: Beat,
        duration: Beat,
        text: String,
    },
}
impl Annotation {
    pub fn beat(&self) -> Beat {
        match self {
            Self::Chord { beat, .. } | Self::Lyric { beat, .. } => *beat,
        }
    }
}

/// Grid of the step, written and actual.
#[derive(Debug, Clone, Copy)]
struct Grid {
    step: Beat,
    written: Beat,
    end: Beat,
    ratio: Option<TupletRatio>,
}

#[derive(Debug)]
struct OpenTuplet {
    found: TupletMatch,
    /// Swing pair written as straight halves, without a bracket.
    swung: bool,
    members: Vec<NoteSymbol>,
}
impl OpenTuplet {
    fn new(found: TupletMatch, swung: bool) -> Self {
        Self {
            found,
            swung,
            members: Vec::new(),
        }
    }
    fn beat(&self) -> Beat {
        self.found.beat
    }
    fn end(&self) -> Beat {
        self.found.end()
    }
    fn grid(&self) -> Grid {
        match self.swung {
            true => {
                let half = self.found.duration / frac(2, 1);
                Grid {
                    step: half,
                    written: half,
                    end: self.end(),
                    ratio: None,
                }
            }
            false => Grid {
                step: self.found.division(),
                written: self.found.written_division(),
                end: self.end(),
                ratio: Some(self.found.ratio()),
            },
        }
    }
    fn index(&self, position: Beat) -> i64 {
        round(&((position - self.found.beat) / self.found.division()))
    }
    fn position(&self, index: i64) -> Beat {
        let index = match self.swung {
            true => swing_index(index),
            false => index,
        };
        self.found.beat + self.grid().step * frac(index, 1)
    }
    /// Move starts and stops inside the window onto the division lines.
    fn snap(&self, pending: &mut Vec<Fragment>) {
        let divisor = self.found.divisor as i64;
        for fragment in pending
            .iter_mut()
            .filter(|f| f.start >= self.beat() && f.start < self.end())
        {
            let first = self.index(fragment.start).clamp(0, divisor - 1);
            let start = self.position(first);
            let stop = match fragment.stop() <= self.end() {
                true => {
                    let last =
                        self.index(fragment.stop()).clamp(first + 1, divisor);
                    self.position(last).max(start + self.grid().step)
                }
                false => fragment.stop(),
            };
            fragment.start = start;
            fragment.duration = stop - start;
        }
        pending.sort_by_key(|fragment| fragment.start);
    }
}

#[derive(Debug)]
struct OpenBeam {
    beat: Beat,
    end: Beat,
    members: Vec<NoteSymbol>,
}

/// Fills a single bar of a single part.
#[derive(Debug)]
pub struct BarEngraver<'a> {
    bar: Bar,
    part: usize,
    spec: &'a PartSpec,
    stave: &'a dyn Stave,
    settings: &'a RenderSettings,
    keys: &'a KeyEstimate,
    cursor: Beat,
    pending: Vec<Fragment>,
    annotations: VecDeque<Annotation>,
    /// Accidentals shown on (letter, octave) lines in this bar.
    accidentals: HashMap<(Letter, i32), i8>,
    signature: [i8; 7],
    beam: Option<OpenBeam>,
    tuplet: Option<OpenTuplet>,
    carry: Vec<Fragment>,
}
impl<'a> BarEngraver<'a> {
    pub fn new(
        bar: Bar,
        part: usize,
        stave: &'a dyn Stave,
        settings: &'a RenderSettings,
        keys: &'a KeyEstimate,
    ) -> Self {
        let signature = key_scale(bar.key);
        let spec = &stave.parts()[part];
        Self {
            bar,
            part,
            spec,
            stave,
            settings,
            keys,
            cursor: frac(0, 1),
            pending: Vec::new(),
            annotations: VecDeque::new(),
            accidentals: HashMap::new(),
            signature,
            beam: None,
            tuplet: None,
            carry: Vec::new(),
        }
    }
    /// Notes to write. Starts are relative to the bar.
    pub fn with_fragments(
        mut self,
        fragments: impl IntoIterator<Item = Fragment>,
    ) -> Self {
        self.pending.extend(fragments);
        self.pending.sort_by_key(|fragment| fragment.start);
        self
    }
    pub fn with_annotations(
        mut self,
        annotations: impl IntoIterator<Item = Annotation>,
    ) -> Self {
        self.annotations.extend(annotations);
        self.annotations
            .make_contiguous()
            .sort_by_key(|annotation| annotation.beat());
        self
    }

    /// Write the bar. Returns it with the fragments tied into the next bar,
    /// their starts moved to 0.
    pub fn engrave(
        mut self,
        context: &mut RenderContext,
    ) -> (Bar, Vec<Fragment>) {
        while self.cursor < self.bar.duration {
            self.close_reached_tuplet();
            if self.tuplet.is_none() {
                self.detect_tuplet();
            }
            self.flush_annotations(Some(self.cursor));
            self.close_beam_on_group();
            let grid = self.tuplet.as_ref().map(|t| (t.beat(), t.grid()));
            let step = match grid {
                Some((beat, grid)) if beat <= self.cursor => {
                    self.tuplet_step(grid, context)
                }
                Some((beat, _)) => self.straight_step(beat, context),
                None => self.straight_step(self.bar.duration, context),
            };
            self.cursor += step;
        }
        self.close_tuplet();
        self.close_beam();
        self.flush_annotations(None);
        if !self.pending.is_empty() {
            warn!(
                "bar {}: {} fragments were left unwritten",
                self.bar.index,
                self.pending.len()
            );
        }
        (self.bar, self.carry)
    }

    fn detect_tuplet(&mut self) {
        let onsets = self
            .pending
            .iter()
            .filter(|f| f.start >= self.cursor)
            .map(|f| Onset::new(f.start, f.stop()))
            .collect_vec();
        if onsets.is_empty() {
            return;
        }
        let found = match detect(
            &onsets,
            self.cursor,
            self.bar.duration - self.cursor,
            self.bar.is_compound(),
        ) {
            Some(found) => found,
            None => return,
        };
        let tuplet = match found.is_swing() && self.swing_straight(&found) {
            true => OpenTuplet::new(found, true),
            false if found.is_straight() => return,
            false => OpenTuplet::new(found, false),
        };
        debug!(
            "bar {}: {} over {} at {}{}",
            self.bar.index,
            tuplet.found.divisor,
            tuplet.found.duration,
            tuplet.found.beat,
            match tuplet.swung {
                true => ", written straight",
                false => "",
            }
        );
        self.close_beam();
        tuplet.snap(&mut self.pending);
        self.tuplet = Some(tuplet);
    }

    fn swing_straight(&self, found: &TupletMatch) -> bool {
        if !is_swing_window(&found.duration) {
            return false;
        }
        match found.duration == frac(1, 1) {
            true => self.settings.swing_as_straight_8ths,
            false => self.settings.swing_as_straight_16ths,
        }
    }

    /// Fragments starting at the cursor.
    fn take_cluster(&mut self) -> Vec<Fragment> {
        let split = self.pending.partition_point(|f| f.start <= self.cursor);
        self.pending.drain(..split).collect()
    }

    fn next_start(&self) -> Option<Beat> {
        self.pending.first().map(|fragment| fragment.start)
    }

    /// Report a value longer than its span and write the span instead.
    fn checked(&mut self, duration: Beat, span: Beat) -> Beat {
        match duration > span {
            true => {
                debug!(
                    "bar {}: {} does not fit {} at {}",
                    self.bar.index, duration, span, self.cursor
                );
                self.bar.diagnostics.push(Diagnostic::UnfittableDuration {
                    beat: self.cursor,
                    duration: span,
                });
                span
            }
            false => duration,
        }
    }

    fn straight_step(
        &mut self,
        limit: Beat,
        context: &mut RenderContext,
    ) -> Beat {
        let cluster = self.take_cluster();
        let next = self.next_start().filter(|next| *next < limit);
        let boundary = next.unwrap_or(limit);
        if cluster.is_empty() {
            let duration = fit_duration(
                &self.settings.rest_durations,
                &self.bar,
                self.cursor,
                boundary,
                None,
            );
            let duration = self.checked(duration, boundary - self.cursor);
            self.emit_rest(duration, None);
            return duration;
        }
        let stop = cluster
            .iter()
            .map(Fragment::stop)
            .min()
            .unwrap_or(boundary)
            .min(boundary);
        let duration = fit_duration(
            &self.settings.head_durations,
            &self.bar,
            self.cursor,
            stop,
            next,
        );
        let duration = self.checked(duration, stop - self.cursor);
        self.emit_cluster(cluster, duration, duration, None, context);
        duration
    }

    /// Steps inside the tuplet are whole divisions with legal written
    /// values.
    fn tuplet_step(
        &mut self,
        grid: Grid,
        context: &mut RenderContext,
    ) -> Beat {
        let cluster = self.take_cluster();
        let boundary = self
            .next_start()
            .map_or(grid.end, |next| next.min(grid.end));
        let stop = cluster
            .iter()
            .map(Fragment::stop)
            .min()
            .map_or(boundary, |stop| stop.min(boundary));
        let steps = round(&((stop - self.cursor) / grid.step).floor()).max(1);
        let steps = match cluster.is_empty() {
            true => self.legal_steps(steps, &grid, true),
            false => self.legal_steps(steps, &grid, false),
        };
        let duration = grid.step * frac(steps, 1);
        match cluster.is_empty() {
            true => self.emit_rest(duration, grid.ratio),
            false => self.emit_cluster(
                cluster,
                duration,
                grid.written * frac(steps, 1),
                grid.ratio,
                context,
            ),
        }
        duration
    }

    fn legal_steps(&mut self, steps: i64, grid: &Grid, rest: bool) -> i64 {
        let table = match rest {
            true => &self.settings.rest_durations,
            false => &self.settings.head_durations,
        };
        match (1..=steps)
            .rev()
            .find(|k| table.contains(&(grid.written * frac(*k, 1))))
        {
            Some(steps) => steps,
            None => {
                self.bar.diagnostics.push(Diagnostic::UnfittableDuration {
                    beat: self.cursor,
                    duration: grid.step,
                });
                1
            }
        }
    }

    fn emit_rest(&mut self, duration: Beat, ratio: Option<TupletRatio>) {
        let stop = self.cursor + duration;
        if duration >= frac(1, 2)
            || self.bar.crosses_division(self.cursor, stop)
        {
            self.close_beam();
        }
        self.bar.push(Symbol::Rest(RestSymbol {
            beat: self.cursor,
            duration,
            part: self.part,
            tuplet: ratio,
        }));
    }

    fn local_key(&self, beat: Beat) -> Key {
        match self.settings.estimate_keys {
            true => self
                .keys
                .key_at(self.bar.beat + beat)
                .map(|key| key.nearest_to(self.bar.key))
                .unwrap_or(self.bar.key),
            false => self.bar.key,
        }
    }

    fn emit_cluster(
        &mut self,
        cluster: Vec<Fragment>,
        duration: Beat,
        written: Beat,
        ratio: Option<TupletRatio>,
        context: &mut RenderContext,
    ) {
        let beat = self.cursor;
        let key = self.local_key(beat);
        let mut heads: Vec<(Fragment, Placement)> = Vec::new();
        for fragment in cluster {
            match self.stave.place(&fragment.pitch, key) {
                Some(placement) => heads.push((fragment, placement)),
                None => {
                    context.warn_unsupported(&fragment.pitch);
                    self.bar.diagnostics.push(Diagnostic::UnsupportedPitch {
                        beat,
                        pitch: fragment.pitch.name.clone(),
                    });
                }
            }
        }
        if heads.is_empty() {
            self.emit_rest(duration, ratio);
            return;
        }
        heads.sort_by_key(|(_, placement)| Reverse(placement.row));
        let stem_up = self
            .spec
            .stem_up(heads.iter().map(|(_, placement)| &placement.row));
        if self.stave.is_pitched() {
            for (_, placement) in heads.iter().filter(|(f, _)| !f.tied) {
                self.accidental(beat, placement);
            }
        }
        self.ledgers(beat, &heads);

        let last = heads.len() - 1;
        for (idx, (fragment, placement)) in heads.into_iter().enumerate() {
            let pitch = fragment
                .pitch
                .number
                .unwrap_or_else(|| placement.spelling.pitch());
            let tie_start = fragment.duration > duration;
            let note = NoteSymbol {
                beat,
                duration,
                pitch,
                spelling: placement.spelling,
                row: placement.row,
                part: self.part,
                stem_up,
                top: idx == 0,
                bottom: idx == last,
                tie_start,
                tie_stop: fragment.tied,
                head: placement.head,
                articulation: match fragment.tied {
                    true => None,
                    false => Articulation::from_velocity(
                        fragment.velocity,
                        self.settings,
                    ),
                },
                tuplet: ratio,
            };
            self.bar.push(Symbol::Note(note.clone()));
            if tie_start {
                self.bar.push(Symbol::Tie {
                    beat,
                    duration,
                    pitch,
                    part: self.part,
                });
                self.hold(Fragment {
                    start: beat + duration,
                    duration: fragment.duration - duration,
                    tied: true,
                    ..fragment
                });
            }
            self.group(note, written);
        }
    }

    fn accidental(&mut self, beat: Beat, placement: &Placement) {
        let spelling = placement.spelling;
        let line = (spelling.letter, spelling.octave);
        let shown = self
            .accidentals
            .get(&line)
            .copied()
            .unwrap_or(self.signature[spelling.letter.index()]);
        if spelling.accidental == shown {
            return;
        }
        self.accidentals.insert(line, spelling.accidental);
        self.bar.push(Symbol::Accidental {
            beat,
            pitch: spelling.pitch(),
            value: spelling.accidental,
            part: self.part,
        });
    }

    /// Ledger lines above the highest head and below the lowest one.
    fn ledgers(&mut self, beat: Beat, heads: &[(Fragment, Placement)]) {
        let extremes = [
            heads.first().filter(|(_, p)| p.row > self.spec.top_row),
            heads.last().filter(|(_, p)| p.row < self.spec.bottom_row),
        ];
        for (_, placement) in extremes.into_iter().flatten() {
            let rows = self.spec.ledger_rows(placement.row);
            if rows.is_empty() {
                continue;
            }
            self.bar.push(Symbol::Ledger {
                beat,
                pitch: placement.spelling.pitch(),
                rows,
                part: self.part,
            });
        }
    }

    /// Queue the tied remainder, or carry it over the barline.
    fn hold(&mut self, fragment: Fragment) {
        if fragment.start >= self.bar.duration {
            self.carry.push(Fragment {
                start: frac(0, 1),
                ..fragment
            });
            return;
        }
        let idx = self.pending.partition_point(|f| f.start <= fragment.start);
        self.pending.insert(idx, fragment);
    }

    /// Add the note to the open tuplet and beam.
    fn group(&mut self, note: NoteSymbol, written: Beat) {
        if let Some(tuplet) = self.tuplet.as_mut() {
            if note.beat >= tuplet.beat() {
                tuplet.members.push(note.clone());
            }
        }
        if written >= frac(1, 1) {
            self.close_beam();
            return;
        }
        let end = note.beat + note.duration;
        match self.beam.as_mut() {
            Some(beam) => {
                beam.end = beam.end.max(end);
                beam.members.push(note);
            }
            None => {
                self.beam = Some(OpenBeam {
                    beat: note.beat,
                    end,
                    members: vec![note],
                })
            }
        }
    }

    /// Beams break on beat groups outside of tuplets.
    fn close_beam_on_group(&mut self) {
        if self.tuplet.is_some() {
            return;
        }
        let on_group = is_integer(&(self.cursor / self.bar.divisor));
        if on_group
            && self.beam.as_ref().map_or(false, |b| b.beat < self.cursor)
        {
            self.close_beam();
        }
    }

    fn close_beam(&mut self) {
        let beam = match self.beam.take() {
            Some(beam) => beam,
            None => return,
        };
        let onsets = beam.members.iter().map(|note| note.beat).dedup().count();
        if onsets < 2 {
            return;
        }
        let (low, high) = beam
            .members
            .iter()
            .map(|note| note.row)
            .minmax()
            .into_option()
            .unwrap_or((self.spec.centre_row(), self.spec.centre_row()));
        let stem_up = self.spec.stem_up(beam.members.iter().map(|n| &n.row));
        self.bar.push(Symbol::Beam(BeamSymbol {
            beat: beam.beat,
            duration: beam.end - beam.beat,
            members: beam.members,
            range: (low, high),
            stem_up,
            part: self.part,
        }));
    }

    fn close_reached_tuplet(&mut self) {
        if self
            .tuplet
            .as_ref()
            .map_or(false, |tuplet| tuplet.end() <= self.cursor)
        {
            self.close_tuplet();
        }
    }

    fn close_tuplet(&mut self) {
        let tuplet = match self.tuplet.take() {
            Some(tuplet) => tuplet,
            None => return,
        };
        self.close_beam();
        if tuplet.swung {
            return;
        }
        let found = tuplet.found;
        let members = tuplet.members;
        let above = self.spec.stem_up(members.iter().map(|n| &n.row));
        let rows = members.iter().map(|note| note.row);
        let row = match above {
            true => rows.max(),
            false => rows.min(),
        }
        .unwrap_or_else(|| self.spec.centre_row());
        let angle = match (members.first(), members.last()) {
            (Some(first), Some(last)) => {
                (last.row - first.row) as f64 / to_f64(&found.duration)
            }
            _ => 0.0,
        };
        self.bar.push(Symbol::Tuplet(TupletSymbol {
            beat: found.beat,
            duration: found.duration,
            divisor: found.divisor,
            ratio: found.ratio(),
            rhythm: found.rhythm,
            members,
            above,
            row,
            angle,
            part: self.part,
        }));
    }

    /// Write annotations up to the beat, or all of them.
    fn flush_annotations(&mut self, until: Option<Beat>) {
        while let Some(annotation) = self.annotations.front() {
            if until.map_or(false, |until| annotation.beat() > until) {
                break;
            }
            let annotation = match self.annotations.pop_front() {
                Some(annotation) => annotation,
                None => break,
            };
            let symbol = match annotation {
                Annotation::Chord {
                    beat,
                    duration,
                    root,
                    extension,
                } => match self.chord(beat, duration, &root, &extension) {
                    Some(chord) => Symbol::Chord(chord),
                    None => continue,
                },
                Annotation::Lyric {
                    beat,
                    duration,
                    text,
                } => Symbol::Lyric {
                    beat,
                    duration: duration.min(self.bar.duration - beat),
                    text,
                },
            };
            self.bar.push(symbol);
        }
    }

    fn chord(
        &self,
        beat: Beat,
        duration: Beat,
        root: &str,
        extension: &str,
    ) -> Option<ChordSymbol> {
        let key = self.local_key(beat);
        let (extension, bass) = match extension.split_once('/') {
            Some((extension, bass)) => (extension, Some(bass)),
            None => (extension, None),
        };
        Some(ChordSymbol {
            beat,
            duration: duration.min(self.bar.duration - beat),
            root: self.chord_root(root, key)?,
            extension: extension.to_string(),
            bass: bass.and_then(|bass| self.chord_root(bass, key)),
        })
    }

    fn chord_root(&self, name: &str, key: Key) -> Option<(Letter, i8)> {
        let (letter, accidental) = match parse_note_name(name) {
            Ok(root) => root,
            Err(err) => {
                warn!("bar {}: chord skipped: {}", self.bar.index, err);
                return None;
            }
        };
        let pitch_class = letter.pitch_class() + accidental as i32;
        Some(
            self.settings
                .chord_root_rewrites()
                .apply(spell_pitch_class(pitch_class, key)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        notation::StaveKind,
        primitives::{Key, Meter},
    };

    fn engrave(
        meter: Meter,
        fragments: Vec<Fragment>,
        settings: &RenderSettings,
    ) -> (Bar, Vec<Fragment>) {
        let keys = KeyEstimate::default();
        let bar = Bar::from_meter(meter, Key::C);
        BarEngraver::new(bar, 0, StaveKind::Treble.stave(), settings, &keys)
            .with_fragments(fragments)
            .engrave(&mut RenderContext::default())
    }

    fn note(start: Beat, duration: Beat, pitch: i32) -> Fragment {
        Fragment::new(start, duration, Pitch::from_midi(pitch), 0.5)
    }

    #[test]
    fn test_empty_bar() {
        let (bar, carry) =
            engrave(Meter::common(), vec![], &RenderSettings::default());
        assert!(carry.is_empty());
        let rests = bar.rests().map(|r| r.duration).collect_vec();
        assert_eq!(rests, vec![frac(4, 1)]);
    }

    #[test]
    fn test_tie_over_barline() {
        let (bar, carry) = engrave(
            Meter::common(),
            vec![note(frac(2, 1), frac(4, 1), 64)],
            &RenderSettings::default(),
        );
        assert_eq!(bar.rhythm_total(), frac(4, 1));
        let notes = bar.notes().collect_vec();
        assert_eq!(notes.len(), 1);
        assert!(notes[0].tie_start);
        assert_eq!(carry.len(), 1);
        assert_eq!(carry[0].start, frac(0, 1));
        assert_eq!(carry[0].duration, frac(2, 1));
        assert!(carry[0].tied);
    }

    #[test]
    fn test_accidentals_once_per_line() {
        let (bar, _) = engrave(
            Meter::common(),
            vec![
                note(frac(0, 1), frac(1, 1), 66),
                note(frac(1, 1), frac(1, 1), 66),
                note(frac(2, 1), frac(1, 1), 65),
            ],
            &RenderSettings::default(),
        );
        let values = bar
            .symbols
            .iter()
            .filter_map(|symbol| match symbol {
                Symbol::Accidental { value, .. } => Some(*value),
                _ => None,
            })
            .collect_vec();
        assert_eq!(values, vec![1, 0]);
    }

    #[test]
    fn test_eighths_are_beamed_by_beat() {
        let fragments = (0..8)
            .map(|idx| note(frac(idx, 2), frac(1, 2), 67))
            .collect_vec();
        let (bar, _) =
            engrave(Meter::common(), fragments, &RenderSettings::default());
        let beams = bar
            .symbols
            .iter()
            .filter_map(|symbol| match symbol {
                Symbol::Beam(beam) => Some((beam.beat, beam.members.len())),
                _ => None,
            })
            .collect_vec();
        assert_eq!(
            beams,
            vec![
                (frac(0, 1), 2),
                (frac(1, 1), 2),
                (frac(2, 1), 2),
                (frac(3, 1), 2)
            ]
        );
    }

    #[test]
    fn test_triplet() {
        let fragments = [(0, 3), (1, 3), (2, 3)]
            .iter()
            .map(|(n, d)| note(frac(*n, *d), frac(1, 3), 72))
            .collect_vec();
        let (bar, _) =
            engrave(Meter::common(), fragments, &RenderSettings::default());
        let tuplet = bar
            .symbols
            .iter()
            .find_map(|symbol| match symbol {
                Symbol::Tuplet(tuplet) => Some(tuplet),
                _ => None,
            })
            .unwrap();
        assert_eq!(tuplet.divisor, 3);
        assert_eq!(tuplet.ratio, TupletRatio { actual: 3, normal: 2 });
        assert_eq!(tuplet.members.len(), 3);
        assert_eq!(tuplet.rhythm, 0b111);
        assert_eq!(bar.rhythm_total(), frac(4, 1));
        assert!(bar.notes().all(|n| n.tuplet == Some(tuplet.ratio)));
    }

    #[test]
    fn test_swing_written_straight() {
        let fragments = vec![
            note(frac(0, 1), frac(2, 3), 67),
            note(frac(2, 3), frac(1, 3), 69),
        ];
        let settings = RenderSettings {
            swing_as_straight_8ths: true,
            ..Default::default()
        };
        let (bar, _) = engrave(Meter::common(), fragments, &settings);
        let notes = bar
            .notes()
            .map(|n| (n.beat, n.duration, n.tuplet))
            .collect_vec();
        assert_eq!(
            notes,
            vec![
                (frac(0, 1), frac(1, 2), None),
                (frac(1, 2), frac(1, 2), None)
            ]
        );
        assert!(!bar.symbols.iter().any(|s| s.kind() == "tuplet"));
    }

    #[test]
    fn test_unsupported_drum() {
        let keys = KeyEstimate::default();
        let settings = RenderSettings::default();
        let bar = Bar::from_meter(Meter::common(), Key::C);
        let fragments = vec![Fragment::new(
            frac(0, 1),
            frac(1, 1),
            Pitch::from_name("gong"),
            0.5,
        )];
        let mut context = RenderContext::default();
        let drums = StaveKind::Drums.stave();
        let (bar, _) = BarEngraver::new(bar, 1, drums, &settings, &keys)
            .with_fragments(fragments)
            .engrave(&mut context);
        assert!(bar.is_approximate());
        assert_eq!(bar.notes().count(), 0);
        assert_eq!(bar.rhythm_total(), frac(4, 1));
    }
}
