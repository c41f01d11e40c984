//! A part is one voice of the stave, written bar after bar.

use log::{debug, warn};

use crate::{
    notation::{PartSpec, Stave},
    primitives::{zero, Bar, BarInfo, Event, Symbol, TimeMap},
    settings::RenderSettings,
};

use super::{
    bar::{Annotation, BarEngraver, Fragment},
    key_estimate::KeyEstimate,
    RenderContext,
};

#[derive(Debug)]
pub struct PartEngraver<'a> {
    stave: &'a dyn Stave,
    part: usize,
    settings: &'a RenderSettings,
    keys: &'a KeyEstimate,
}
impl<'a> PartEngraver<'a> {
    pub fn new(
        stave: &'a dyn Stave,
        part: usize,
        settings: &'a RenderSettings,
        keys: &'a KeyEstimate,
    ) -> Self {
        Self {
            stave,
            part,
            settings,
            keys,
        }
    }
    pub fn spec(&self) -> &'a PartSpec {
        &self.stave.parts()[self.part]
    }

    /// Notes of the part with absolute starts.
    fn fragments(&self, events: &[Event]) -> Vec<Fragment> {
        let mut fragments = Vec::new();
        for event in events {
            match event {
                Event::Note {
                    start,
                    pitch,
                    velocity,
                    duration,
                } => {
                    if self.stave.part_for(pitch) != self.part {
                        continue;
                    }
                    if *duration <= zero() {
                        warn!(
                            "note {} at {} has no duration",
                            pitch.name, start
                        );
                        continue;
                    }
                    fragments.push(Fragment::new(
                        *start,
                        *duration,
                        pitch.clone(),
                        *velocity,
                    ));
                }
                Event::Sequence { start, id, .. } if self.part == 0 => {
                    debug!("sequence `{}` at {} is not engraved", id, start)
                }
                _ => (),
            }
        }
        fragments.sort_by_key(|fragment| fragment.start);
        fragments
    }

    /// Chords and lyrics, written above the first part only.
    fn annotations(
        &self,
        events: &[Event],
        info: &BarInfo,
    ) -> Vec<Annotation> {
        if self.part != 0 {
            return Vec::new();
        }
        events
            .iter()
            .filter(|event| {
                event.start() >= info.beat && event.start() < info.end()
            })
            .filter_map(|event| match event {
                Event::Chord {
                    start,
                    root,
                    extension,
                    duration,
                } => Some(Annotation::Chord {
                    beat: *start - info.beat,
                    duration: *duration,
                    root: root.clone(),
                    extension: extension.clone(),
                }),
                Event::Lyric {
                    start,
                    text,
                    duration,
                } => Some(Annotation::Lyric {
                    beat: *start - info.beat,
                    duration: *duration,
                    text: text.clone(),
                }),
                _ => None,
            })
            .collect()
    }

    /// Clef on the first bar, time signature on the first and on changes.
    fn open_bar(&self, info: &BarInfo) -> Bar {
        let mut bar = Bar::new(info);
        if info.index == 0 {
            bar.push(Symbol::Clef {
                clef: self.spec().clef,
                part: self.part,
            });
        }
        if info.index == 0 || info.meter_changed {
            let (numerator, denominator) = info.meter.time_signature();
            bar.push(Symbol::TimeSignature {
                numerator,
                denominator,
            });
        }
        bar
    }

    pub fn engrave(
        &self,
        events: &[Event],
        time_map: &TimeMap,
        context: &mut RenderContext,
    ) -> Vec<Bar> {
        let notes = self.fragments(events);
        let mut next = 0;
        let mut carry: Vec<Fragment> = Vec::new();
        let mut bars = Vec::with_capacity(time_map.bars().len());
        for info in time_map.bars() {
            let mut fragments = std::mem::take(&mut carry);
            while next < notes.len() && notes[next].start < info.end() {
                let note = &notes[next];
                fragments.push(Fragment {
                    start: note.start - info.beat,
                    ..note.clone()
                });
                next += 1;
            }
            let (bar, tied) = BarEngraver::new(
                self.open_bar(info),
                self.part,
                self.stave,
                self.settings,
                self.keys,
            )
            .with_fragments(fragments)
            .with_annotations(self.annotations(events, info))
            .engrave(context);
            debug!(
                "{} bar {}: {} symbols",
                self.spec().name,
                bar.index,
                bar.symbols.len()
            );
            carry = tied;
            bars.push(bar);
        }
        if !carry.is_empty() {
            warn!(
                "{}: {} tied notes run past the last bar",
                self.spec().name,
                carry.len()
            );
        }
        bars
    }
}
