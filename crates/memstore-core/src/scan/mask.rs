//! Masking of detected secrets for human-facing output.
//!
//! Secrets longer than 10 characters keep their first 4 and last 3
//! characters with the interior replaced by at most 20 mask characters.
//! Shorter secrets are fully masked.

use std::ops::Range;

pub const MASK_CHAR: char = '*';
/// Longest run of mask characters emitted for one secret.
pub const MAX_MASK_RUN: usize = 20;
/// Secrets of this many characters or fewer are never partially revealed.
pub const SHORT_SECRET_LEN: usize = 10;
pub const FULL_MASK: &str = "****";

const REVEAL_HEAD: usize = 4;
const REVEAL_TAIL: usize = 3;

pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= SHORT_SECRET_LEN {
        return FULL_MASK.to_string();
    }

    let head: String = chars[..REVEAL_HEAD].iter().collect();
    let tail: String = chars[chars.len() - REVEAL_TAIL..].iter().collect();
    let run = (chars.len() - REVEAL_HEAD - REVEAL_TAIL).min(MAX_MASK_RUN);

    let masked = format!("{head}{}{tail}", MASK_CHAR.to_string().repeat(run));
    if masked.contains(secret) {
        return FULL_MASK.to_string();
    }
    masked
}

/// Replace every span in `text` with its masked rendering.
///
/// Overlapping or adjacent spans are merged first; replacement then runs
/// from the last span to the first so earlier offsets stay valid.
pub fn mask_spans(text: &str, mut spans: Vec<Range<usize>>) -> String {
    spans.retain(|s| s.start < s.end && s.end <= text.len());
    spans.sort_by_key(|s| (s.start, s.end));

    let mut merged: Vec<Range<usize>> = Vec::with_capacity(spans.len());
    for span in spans {
        match merged.last_mut() {
            Some(last) if span.start <= last.end => last.end = last.end.max(span.end),
            _ => merged.push(span),
        }
    }

    let mut out = text.to_string();
    for span in merged.into_iter().rev() {
        if let Some(secret) = text.get(span.clone()) {
            out.replace_range(span, &mask_secret(secret));
        }
    }
    out
}
