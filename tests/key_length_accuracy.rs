// tests/key_length_accuracy.rs
mod common;

use common::{letter_window, VILLAGE};
use vcrack_core::core::cipher::encrypt;
use vcrack_core::core::key_length::estimate_key_lengths;

const KEYS: [&str; 20] = [
    "LAMP", "RIVER", "CASTLE", "HARBOUR", "SALT", "OCEAN", "MARKET", "LANTERN", "WIND", "STONE",
    "BRIDGE", "QUIVERS", "COLD", "NORTH", "HUNTER", "PILGRIM", "MOTH", "CLOUD", "DRAGON", "CRYSTAL",
];

#[test]
fn true_length_is_usually_in_the_top_three() {
    let mut hits = 0;
    let mut misses = Vec::new();
    for (i, key) in KEYS.iter().enumerate() {
        let window = letter_window(VILLAGE, i * 70, 600);
        let cipher = encrypt(window, key);
        let top: Vec<usize> = estimate_key_lengths(&cipher, 10)
            .iter()
            .take(3)
            .map(|c| c.length)
            .collect();
        if top.contains(&key.len()) {
            hits += 1;
        } else {
            misses.push((*key, top));
        }
    }
    assert!(hits >= 16, "only {} of 20 hit, misses: {:?}", hits, misses);
}
