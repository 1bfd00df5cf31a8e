use std::collections::HashMap;
use std::process::Command;

use crate::inference::InferenceError;

/// Convert text to IPA phonemes using espeak-ng
pub fn phonemize(text: &str, language: &str) -> Result<String, InferenceError> {
    if text.is_empty() {
        return Ok(String::new());
    }

    let output = Command::new("espeak-ng")
        .args(["--ipa", "-q", "-v", language, text])
        .output()
        .map_err(|e| {
            InferenceError::Input(format!("Failed to run espeak-ng (is it installed?): {}", e))
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(InferenceError::Input(format!("espeak-ng failed: {}", stderr)));
    }

    // espeak prints one line per clause; the acoustic model wants one sequence
    let phonemes = String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    Ok(phonemes)
}

/// Map phonemes to token ids, framed by the start/end tokens of the map.
///
/// Symbols missing from the map are dropped.
pub fn phonemes_to_ids(phonemes: &str, id_map: &HashMap<String, Vec<i64>>) -> Vec<i64> {
    let mut ids = Vec::with_capacity(phonemes.len() + 2);

    match id_map.get("^") {
        Some(bos) => ids.extend(bos),
        None => ids.push(0),
    }

    let mut buf = [0u8; 4];
    for ch in phonemes.chars() {
        if let Some(mapped) = id_map.get(&*ch.encode_utf8(&mut buf)) {
            ids.extend(mapped);
        }
    }

    match id_map.get("$") {
        Some(eos) => ids.extend(eos),
        None => ids.push(0),
    }

    ids
}
