//! Proportional current/maximum rescaling.
//!
//! Moving an attribute to a new maximum keeps the fraction the player had,
//! so a character at half health stays at half health after the template
//! maximum changes.

use tracing::trace;

use crate::types::{CurrentMaxPair, Health};

/// Rescale `pair` to `new_maximum`, preserving `current / maximum`.
///
/// `current' = floor(new_maximum × clamp(current / maximum, 0, 1))`.
/// Returns `false` and leaves the pair untouched when any input is absent,
/// the maximum is zero, or a value is not finite.
pub fn rescale(pair: &mut CurrentMaxPair, new_maximum: Option<f64>) -> bool {
    let (Some(current), Some(maximum), Some(new_maximum)) = (pair.current, pair.maximum, new_maximum)
    else {
        return false;
    };
    if maximum == 0.0 || !(current.is_finite() && maximum.is_finite() && new_maximum.is_finite()) {
        return false;
    }

    let ratio = (current / maximum).clamp(0.0, 1.0);
    let new_current = (new_maximum * ratio).floor().max(0.0);
    trace!(
        from = %pair,
        to = format!("{new_current}/{new_maximum}"),
        "Rescaled"
    );
    pair.current = Some(new_current);
    pair.maximum = Some(new_maximum);
    true
}

/// Rescale an optional pair in place. Absent pairs are skipped.
pub fn rescale_opt(pair: Option<&mut CurrentMaxPair>, new_maximum: Option<f64>) -> bool {
    pair.map(|p| rescale(p, new_maximum)).unwrap_or(false)
}

/// Rescale every attribute of `health` to the maxima found in `template`.
///
/// Body parts missing from the template are returned so the caller can
/// report them; they are left unchanged.
pub fn rescale_health(health: &mut Health, template: &Health) -> Vec<String> {
    rescale_opt(
        health.energy.as_mut(),
        template.energy.and_then(|e| e.maximum),
    );
    rescale_opt(
        health.hydration.as_mut(),
        template.hydration.and_then(|h| h.maximum),
    );

    let mut missing = Vec::new();
    for (name, part) in health.body_parts.iter_mut() {
        match template.body_parts.get(name) {
            Some(t) => {
                rescale_opt(part.health.as_mut(), t.health.and_then(|h| h.maximum));
            }
            None => missing.push(name.clone()),
        }
    }
    missing
}
