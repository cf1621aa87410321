// src/core/candidates.rs
use crate::core::types::{shifts_to_key, ShiftOption};

/// Upper bound on key combinations kept between positions.
pub const DEFAULT_CANDIDATE_CAP: usize = 500;

/// Expands per-position shift options into full keys, position by position.
///
/// After every position the running list is cut back to `cap` entries (first generated
/// wins), so the total work stays around `cap * options` instead of `options ^ length`.
/// Any position without options yields no keys at all.
pub fn generate_keys(options: &[Vec<ShiftOption>], cap: usize) -> Vec<String> {
    let cap = cap.max(1);
    if options.is_empty() || options.iter().any(|o| o.is_empty()) {
        return Vec::new();
    }

    let mut combinations: Vec<Vec<u8>> = vec![Vec::with_capacity(options.len())];
    for position in options {
        let mut next = Vec::with_capacity((combinations.len() * position.len()).min(cap));
        'expand: for combo in &combinations {
            for option in position {
                if next.len() == cap {
                    break 'expand;
                }
                let mut extended = combo.clone();
                extended.push(option.shift);
                next.push(extended);
            }
        }
        combinations = next;
    }

    combinations.iter().map(|shifts| shifts_to_key(shifts)).collect()
}
