//! Chiptune sound effects built from short text definitions:
//!
//! - `notes`: `c d e f g a b` with an optional `#`/`-` and an octave `0`..`4`,
//!   or `r` for a rest. Whitespace is ignored.
//! - `tone`: `t`riangle, `s`quare, `p`ulse or `n`oise, one per note.
//! - `volume`: `0`..`7`, one per note.
//! - `effect`: `n`one, `s`lide, `v`ibrato or `f`ade-out, one per note.
//!
//! The last three repeat when shorter than the note list. Every note lasts
//! `speed` ticks of 1/120 s.

use std::f32::consts::TAU;
use std::io::Cursor;

use anyhow::{bail, ensure, Context, Result};
use fundsp::prelude32 as dsp;

pub const SAMPLE_RATE: u32 = 22_050;
const TICKS_PER_SECOND: u32 = 120;
const MAX_VOLUME: f32 = 7.0;
const MASTER_GAIN: f32 = 0.25;
const VIBRATO_HZ: f32 = 6.0;
const VIBRATO_DEPTH: f32 = 0.015;
const PULSE_WIDTH: f32 = 0.25;
/// Noise is low-passed this many times above the note, so higher notes hiss brighter.
const NOISE_CUTOFF_RATIO: f32 = 4.0;
/// Note number of `a2`.
const A440_NOTE: i32 = 33;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Tone {
    Triangle,
    Square,
    Pulse,
    Noise,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Effect {
    None,
    Slide,
    Vibrato,
    FadeOut,
}

#[derive(Clone, PartialEq, Debug)]
pub struct Sound {
    /// Note numbers counting semitones up from `c0`; `None` is a rest.
    pub notes: Vec<Option<i32>>,
    pub tones: Vec<Tone>,
    pub volumes: Vec<u8>,
    pub effects: Vec<Effect>,
    pub speed: u32,
}

impl Sound {
    pub fn parse(notes: &str, tone: &str, volume: &str, effect: &str, speed: u32) -> Result<Sound> {
        ensure!(speed > 0, "speed must be at least 1");
        let sound = Sound {
            notes: parse_notes(notes).context("bad note list")?,
            tones: parse_each(tone, |c| match c {
                't' => Some(Tone::Triangle),
                's' => Some(Tone::Square),
                'p' => Some(Tone::Pulse),
                'n' => Some(Tone::Noise),
                _ => None,
            })
            .context("bad tone list")?,
            volumes: parse_each(volume, |c| c.to_digit(8).map(|v| v as u8)).context("bad volume list")?,
            effects: parse_each(effect, |c| match c {
                'n' => Some(Effect::None),
                's' => Some(Effect::Slide),
                'v' => Some(Effect::Vibrato),
                'f' => Some(Effect::FadeOut),
                _ => None,
            })
            .context("bad effect list")?,
            speed,
        };
        ensure!(!sound.notes.is_empty(), "no notes");
        Ok(sound)
    }

    pub fn samples_per_note(&self) -> usize {
        (SAMPLE_RATE * self.speed / TICKS_PER_SECOND) as usize
    }

    /// Renders the whole sound as mono samples in -1..=1.
    pub fn render(&self) -> Vec<f32> {
        let per_note = self.samples_per_note();
        let mut out = Vec::with_capacity(per_note * self.notes.len());
        let mut prev_freq = None;

        for (i, note) in self.notes.iter().enumerate() {
            let Some(note) = *note else {
                out.resize(out.len() + per_note, 0.0);
                prev_freq = None;
                continue;
            };
            let freq = note_frequency(note);
            let voice = Voice {
                tone: cycle(&self.tones, i),
                effect: cycle(&self.effects, i),
                volume: cycle(&self.volumes, i) as f32 / MAX_VOLUME,
                from_freq: prev_freq.unwrap_or(freq),
                freq,
                duration: per_note as f32 / SAMPLE_RATE as f32,
            };
            let mut unit = voice.unit();
            out.extend(render_mono(&mut *unit, per_note));
            prev_freq = Some(freq);
        }
        out
    }

    /// The rendered sound as a 16-bit mono WAV file.
    pub fn to_wav(&self) -> Result<Vec<u8>> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: SAMPLE_RATE,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut wav = Cursor::new(Vec::new());
        let mut writer = hound::WavWriter::new(&mut wav, spec).context("starting WAV stream")?;
        for sample in self.render() {
            writer.write_sample((sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)?;
        }
        writer.finalize().context("finishing WAV stream")?;
        Ok(wav.into_inner())
    }
}

/// Everything needed to synthesize one sounding note.
#[derive(Copy, Clone, Debug)]
struct Voice {
    tone: Tone,
    effect: Effect,
    volume: f32,
    /// Pitch a slide starts from: the previous note, or this one after a rest.
    from_freq: f32,
    freq: f32,
    duration: f32,
}

impl Voice {
    fn unit(self) -> Box<dyn dsp::AudioUnit> {
        let Voice { tone, effect, volume, from_freq, freq, duration } = self;
        let pitch = dsp::lfo(move |t: f32| match effect {
            Effect::Slide => dsp::lerp(from_freq, freq, (t / duration).min(1.0)),
            Effect::Vibrato => freq * (1.0 + VIBRATO_DEPTH * (TAU * VIBRATO_HZ * t).sin()),
            Effect::None | Effect::FadeOut => freq,
        });
        let level = dsp::lfo(move |t: f32| {
            let gain = match effect {
                Effect::FadeOut => dsp::lerp(volume, 0.0, (t / duration).min(1.0)),
                _ => volume,
            };
            gain * MASTER_GAIN
        });
        match tone {
            Tone::Triangle => Box::new((pitch >> dsp::triangle()) * level),
            Tone::Square => Box::new((pitch >> dsp::square()) * level),
            Tone::Pulse => Box::new(((pitch | dsp::dc(PULSE_WIDTH)) >> dsp::pulse()) * level),
            Tone::Noise => {
                Box::new((dsp::noise() >> dsp::lowpass_hz(freq * NOISE_CUTOFF_RATIO, 1.0)) * level)
            }
        }
    }
}

fn render_mono(node: &mut dyn dsp::AudioUnit, sample_count: usize) -> Vec<f32> {
    node.set_sample_rate(SAMPLE_RATE as f64);
    node.reset();

    let mut samples = Vec::with_capacity(sample_count);
    for _ in 0..sample_count {
        samples.push(node.get_mono());
    }
    samples
}

pub fn note_frequency(note: i32) -> f32 {
    440.0 * 2.0_f32.powf((note - A440_NOTE) as f32 / 12.0)
}

fn cycle<T: Copy>(values: &[T], i: usize) -> T {
    values[i % values.len()]
}

fn parse_each<T>(s: &str, f: impl Fn(char) -> Option<T>) -> Result<Vec<T>> {
    let values = s
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| f(c.to_ascii_lowercase()).with_context(|| format!("unexpected {c:?}")))
        .collect::<Result<Vec<T>>>()?;
    ensure!(!values.is_empty(), "empty list");
    Ok(values)
}

fn parse_notes(s: &str) -> Result<Vec<Option<i32>>> {
    let mut chars = s
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_lowercase())
        .peekable();
    let mut notes = Vec::new();
    while let Some(c) = chars.next() {
        let semitone = match c {
            'r' => {
                notes.push(None);
                continue;
            }
            'c' => 0,
            'd' => 2,
            'e' => 4,
            'f' => 5,
            'g' => 7,
            'a' => 9,
            'b' => 11,
            _ => bail!("unexpected {c:?} in note {}", notes.len()),
        };
        let accidental = match chars.peek() {
            Some('#') => 1,
            Some('-') => -1,
            _ => 0,
        };
        if accidental != 0 {
            chars.next();
        }
        let octave = chars
            .next()
            .and_then(|o| o.to_digit(5))
            .with_context(|| format!("missing octave 0-4 in note {}", notes.len()))?;
        notes.push(Some(octave as i32 * 12 + semitone + accidental));
    }
    Ok(notes)
}
