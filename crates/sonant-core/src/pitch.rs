//! Pitch and frequency expressions.
//!
//! Frequency-unit signals accept Hz, note names (`"A4"`, `"C#3"`, `"Bb2"`),
//! explicit `"440hz"`, or any time term, which is read as the frequency of
//! that period (`"4n"` at 120 BPM is 2 Hz). A4 is 440 Hz and C4 is middle C
//! (MIDI 60).

use libm::{log2, pow, round};

use crate::error::{Result, SignalError};
use crate::time::Clock;

/// Reference pitch of A4 in Hz.
pub const A4_HZ: f64 = 440.0;

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Convert a (possibly fractional) MIDI note number to Hz.
///
/// ```rust
/// use sonant_core::midi_to_frequency;
///
/// assert_eq!(midi_to_frequency(69.0), 440.0);
/// assert!((midi_to_frequency(60.0) - 261.6256).abs() < 1e-3);
/// ```
#[inline]
pub fn midi_to_frequency(midi: f64) -> f64 {
    A4_HZ * pow(2.0, (midi - 69.0) / 12.0)
}

/// Convert a frequency in Hz to a fractional MIDI note number.
#[inline]
pub fn frequency_to_midi(frequency: f64) -> f64 {
    69.0 + 12.0 * log2(frequency / A4_HZ)
}

/// Parse a scientific-pitch note name into its MIDI number.
///
/// Accepts a letter `A`–`G` (any case), optional accidentals (`#`, `b`, `x`
/// for double sharp, `bb` for double flat) and a signed octave.
pub fn note_to_midi(name: &str) -> Option<i32> {
    let name = name.trim();
    let mut chars = name.char_indices();
    let (_, letter) = chars.next()?;
    let base = match letter.to_ascii_uppercase() {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };

    let rest = &name[letter.len_utf8()..];
    let octave_start = rest.find(|c: char| c == '-' || c.is_ascii_digit())?;
    let (accidentals, octave) = rest.split_at(octave_start);
    let shift = match accidentals {
        "" => 0,
        "#" => 1,
        "x" | "##" => 2,
        "b" => -1,
        "bb" => -2,
        _ => return None,
    };
    let octave: i32 = octave.parse().ok()?;
    Some((octave + 1) * 12 + base + shift)
}

/// Frequency of a note name in Hz, or `None` if it is not a note name.
///
/// ```rust
/// use sonant_core::note_to_frequency;
///
/// assert_eq!(note_to_frequency("A4"), Some(440.0));
/// assert_eq!(note_to_frequency("A5"), Some(880.0));
/// assert_eq!(note_to_frequency("H2"), None);
/// ```
pub fn note_to_frequency(name: &str) -> Option<f64> {
    note_to_midi(name).map(|midi| midi_to_frequency(f64::from(midi)))
}

/// Nearest note name for a frequency, using sharps (`"A4"`, `"C#5"`).
pub fn frequency_to_note(frequency: f64) -> String {
    let midi = round(frequency_to_midi(frequency)) as i32;
    let name = NOTE_NAMES[midi.rem_euclid(12) as usize];
    let octave = midi.div_euclid(12) - 1;
    format!("{name}{octave}")
}

impl Clock {
    /// Resolves a frequency expression to Hz.
    pub fn frequency(&self, expr: &str) -> Result<f64> {
        let trimmed = expr.trim();
        if let Ok(hz) = trimmed.parse::<f64>() {
            return Ok(hz);
        }
        if let Some(hz) = trimmed
            .to_ascii_lowercase()
            .strip_suffix("hz")
            .and_then(|n| n.trim().parse::<f64>().ok())
        {
            return Ok(hz);
        }
        if let Some(hz) = note_to_frequency(trimmed) {
            return Ok(hz);
        }
        match self.term_seconds(trimmed) {
            Some(period) if period > 0.0 => Ok(1.0 / period),
            _ => Err(SignalError::InvalidFrequency(expr.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn midi_round_trip() {
        for midi in [21.0, 60.0, 69.0, 108.0, 64.5] {
            let back = frequency_to_midi(midi_to_frequency(midi));
            assert!((back - midi).abs() < 1e-9, "midi {midi} -> {back}");
        }
    }

    #[test]
    fn note_names() {
        assert_eq!(note_to_midi("C4"), Some(60));
        assert_eq!(note_to_midi("c#4"), Some(61));
        assert_eq!(note_to_midi("Db4"), Some(61));
        assert_eq!(note_to_midi("Bb2"), Some(46));
        assert_eq!(note_to_midi("bb2"), Some(46));
        assert_eq!(note_to_midi("Cx4"), Some(62));
        assert_eq!(note_to_midi("C-1"), Some(0));
        assert_eq!(note_to_midi("A"), None);
        assert_eq!(note_to_midi("A?4"), None);
        assert_eq!(note_to_midi(""), None);
    }

    #[test]
    fn nearest_note_name() {
        assert_eq!(frequency_to_note(440.0), "A4");
        assert_eq!(frequency_to_note(261.63), "C4");
        assert_eq!(frequency_to_note(277.0), "C#4");
        assert_eq!(frequency_to_note(8.18), "C-1");
    }

    #[test]
    fn frequency_expressions() {
        let clock = Clock::default();
        assert_eq!(clock.frequency("220").unwrap(), 220.0);
        assert_eq!(clock.frequency("330hz").unwrap(), 330.0);
        assert_eq!(clock.frequency("A3").unwrap(), 220.0);
        // quarter note at 120 BPM lasts 0.5 s
        assert!((clock.frequency("4n").unwrap() - 2.0).abs() < 1e-12);
        assert!(matches!(
            clock.frequency("loud"),
            Err(SignalError::InvalidFrequency(_))
        ));
    }
}
