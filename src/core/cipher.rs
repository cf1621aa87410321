// src/core/cipher.rs
use crate::core::types::ALPHABET_LEN;

const N: u8 = ALPHABET_LEN as u8;

/// Rotates a single ASCII letter back by `shift`, keeping its case.
/// Anything that is not an ASCII letter comes back unchanged.
pub fn unshift_char(c: char, shift: u8) -> char {
    rotate(c, N - shift % N)
}

/// Rotates a single ASCII letter forward by `shift`, keeping its case.
pub fn shift_char(c: char, shift: u8) -> char {
    rotate(c, shift % N)
}

fn rotate(c: char, by: u8) -> char {
    let base = match c {
        'A'..='Z' => b'A',
        'a'..='z' => b'a',
        _ => return c,
    };
    (base + (c as u8 - base + by) % N) as char
}

/// Turns key text into shifts. Non-letters in the key are ignored.
pub fn key_shifts(key: &str) -> Vec<u8> {
    key.chars()
        .filter(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_uppercase() as u8 - b'A')
        .collect()
}

/// Decrypts a whole text with a single Caesar shift.
pub fn caesar_decrypt(text: &str, shift: u8) -> String {
    text.chars().map(|c| unshift_char(c, shift)).collect()
}

/// Vigenère decryption. Letters keep their case, everything else passes through
/// and does not advance the key. An empty key returns the text unchanged.
pub fn decrypt(text: &str, key: &str) -> String {
    apply(text, &key_shifts(key), unshift_char)
}

/// Vigenère encryption, the exact inverse of [`decrypt`].
pub fn encrypt(text: &str, key: &str) -> String {
    apply(text, &key_shifts(key), shift_char)
}

/// Decryption with shifts that were already parsed; the refinement loop calls this per move.
pub fn decrypt_with_shifts(text: &str, shifts: &[u8]) -> String {
    apply(text, shifts, unshift_char)
}

fn apply(text: &str, shifts: &[u8], op: fn(char, u8) -> char) -> String {
    if shifts.is_empty() {
        return text.to_string();
    }
    let mut result = String::with_capacity(text.len());
    let mut key_index = 0;
    for c in text.chars() {
        if c.is_ascii_alphabetic() {
            result.push(op(c, shifts[key_index % shifts.len()]));
            key_index += 1;
        } else {
            result.push(c);
        }
    }
    result
}
