//! Hotkey specification parsing.
//!
//! A specification is a comma-separated sequence of chords, each chord a
//! `+`-separated list of modifiers ending in one non-modifier key, e.g.
//! `"alt+1"`, `"ctrl+shift+p"` or `"h,e,l,l,o"`.

use tracing::warn;

use crate::error::{MacroError, Result};
use crate::input::{canonical_modifier, is_recognized_key, KeyInfo};

/// Parse a hotkey specification into its chord sequence (oldest chord first,
/// most-recent-key-last, matching how it is compared against history).
///
/// Tokens are lowercased. Every token must be a recognized key or modifier,
/// each chord must end with a non-modifier key, and a modifier may appear at
/// most once per chord. A sequence whose adjacent chords differ is accepted
/// but logged, since it only fires when that exact sequence is typed.
pub fn parse_hotkey_spec(spec: &str) -> Result<Vec<KeyInfo>> {
    let chords = spec
        .split(',')
        .map(|chord| parse_chord(chord, spec))
        .collect::<Result<Vec<KeyInfo>>>()?;

    for pair in chords.windows(2) {
        if pair[0] != pair[1] {
            warn!(
                spec = spec,
                "hotkey mixes different chords and only fires on that exact sequence"
            );
            break;
        }
    }

    Ok(chords)
}

fn parse_chord(chord: &str, spec: &str) -> Result<KeyInfo> {
    let tokens: Vec<String> = chord.split('+').map(|t| t.trim().to_lowercase()).collect();
    let (key_token, modifier_tokens) = match tokens.split_last() {
        Some(parts) => parts,
        None => return Err(MacroError::invalid_hotkey(spec, "empty chord")),
    };

    if key_token.is_empty() {
        return Err(MacroError::invalid_hotkey(spec, "empty chord"));
    }
    if canonical_modifier(key_token).is_some() {
        return Err(MacroError::invalid_hotkey(
            spec,
            format!("chord '{chord}' must end with a non-modifier key"),
        ));
    }
    if !is_recognized_key(key_token) {
        return Err(MacroError::invalid_hotkey(
            spec,
            format!("unrecognized key '{key_token}'"),
        ));
    }

    let mut info = KeyInfo::new(key_token.as_str());
    for token in modifier_tokens {
        let name = match canonical_modifier(token) {
            Some(name) => name,
            None => {
                return Err(MacroError::invalid_hotkey(
                    spec,
                    format!("unrecognized modifier '{token}'"),
                ))
            }
        };
        let flag = match name {
            "ctrl" => &mut info.ctrl,
            "alt" => &mut info.alt,
            _ => &mut info.shift,
        };
        if flag.is_some() {
            return Err(MacroError::invalid_hotkey(
                spec,
                format!("duplicate modifier '{name}'"),
            ));
        }
        *flag = Some(true);
    }

    Ok(info)
}
