// src/core/shifts.rs
use crate::core::cipher::caesar_decrypt;
use crate::core::frequency::{chi_squared, letter_frequencies, FrequencyTable};
use crate::core::types::{ShiftOption, ALPHABET_LEN};

/// How many shifts per key position the search keeps by default.
pub const DEFAULT_SHIFT_OPTIONS: usize = 8;

/// Rewards text that contains the letters the language uses most.
fn distribution_bonus(frequencies: &std::collections::HashMap<char, f64>, reference: &FrequencyTable) -> f64 {
    reference
        .iter()
        .filter_map(|(letter, expected)| frequencies.get(&letter).map(|seen| seen * expected * 100.0))
        .sum()
}

/// Scores one shift of a column: chi-squared minus half the distribution bonus.
pub fn shift_metric(sequence: &str, shift: u8, reference: &FrequencyTable) -> f64 {
    let decrypted = caesar_decrypt(sequence, shift);
    let frequencies = letter_frequencies(&decrypted);
    chi_squared(&frequencies, reference) - 0.5 * distribution_bonus(&frequencies, reference)
}

/// Tries all 26 shifts on a column and returns the `count` most plausible ones, lowest metric first.
/// Equal metrics keep ascending shift order, so the output is reproducible.
pub fn best_shifts(sequence: &str, count: usize, reference: &FrequencyTable) -> Vec<ShiftOption> {
    let mut options: Vec<ShiftOption> = (0..ALPHABET_LEN as u8)
        .map(|shift| ShiftOption {
            shift,
            metric: shift_metric(sequence, shift, reference),
        })
        .collect();

    options.sort_by(|a, b| a.metric.total_cmp(&b.metric));
    options.truncate(count.min(ALPHABET_LEN));
    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cipher::encrypt;
    use crate::core::frequency::ENGLISH;

    #[test]
    fn recovers_the_shift_of_a_caesar_column() {
        let plain = "defend the east wall of the castle at dawn and send more men to the gate";
        let cipher = encrypt(plain, "H");
        let options = best_shifts(&cipher, 3, &ENGLISH);
        assert_eq!(options.len(), 3);
        assert_eq!(options[0].shift, 7);
        assert_eq!(options[0].letter(), 'H');
    }

    #[test]
    fn metrics_are_ascending() {
        let options = best_shifts("WKLV LV D WHVW PHVVDJH", 26, &ENGLISH);
        assert_eq!(options.len(), 26);
        assert!(options.windows(2).all(|w| w[0].metric <= w[1].metric));
    }

    #[test]
    fn ties_keep_shift_order() {
        // no letters: every shift scores the same
        let options = best_shifts("12 34", 5, &ENGLISH);
        let shifts: Vec<u8> = options.iter().map(|o| o.shift).collect();
        assert_eq!(shifts, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn count_is_capped_at_the_alphabet() {
        assert_eq!(best_shifts("abc", 100, &ENGLISH).len(), 26);
        assert!(best_shifts("abc", 0, &ENGLISH).is_empty());
    }
}
