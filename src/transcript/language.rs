//! Language preference resolution.
//!
//! Human-authored captions beat generated ones, but a transcript is never
//! refused just because the exact language is missing while any track exists.

use thiserror::Error;

use super::models::{LanguagePreference, TranscriptTrack};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("No transcript tracks are available")]
pub struct NoTracksAvailable;

/// Full resolution order over `available`, best candidate first.
///
/// 1. manual tracks matching a requested tag, in priority order
/// 2. generated tracks matching a requested tag, in priority order
/// 3. any manual track, in advertised order
/// 4. any track, in advertised order
pub fn resolve(
    requested: &LanguagePreference,
    available: &[TranscriptTrack],
) -> Result<Vec<TranscriptTrack>, NoTracksAvailable> {
    if available.is_empty() {
        return Err(NoTracksAvailable);
    }

    let mut order: Vec<usize> = Vec::with_capacity(available.len());
    let push = |idx: usize, order: &mut Vec<usize>| {
        if !order.contains(&idx) {
            order.push(idx);
        }
    };

    for generated in [false, true] {
        for tag in requested.tags() {
            for (idx, track) in available.iter().enumerate() {
                if track.is_auto_generated == generated && track.language_code.eq_ignore_ascii_case(tag) {
                    push(idx, &mut order);
                }
            }
        }
    }

    for (idx, track) in available.iter().enumerate() {
        if !track.is_auto_generated {
            push(idx, &mut order);
        }
    }

    for idx in 0..available.len() {
        push(idx, &mut order);
    }

    Ok(order.into_iter().map(|idx| available[idx].clone()).collect())
}

/// First match of [`resolve`]
pub fn select(
    requested: &LanguagePreference,
    available: &[TranscriptTrack],
) -> Result<TranscriptTrack, NoTracksAvailable> {
    resolve(requested, available)?
        .into_iter()
        .next()
        .ok_or(NoTracksAvailable)
}
