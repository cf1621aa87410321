// tests/pipeline.rs
mod common;

use common::{dictionary_for, DICKENS, VILLAGE};
use std::sync::Arc;
use vcrack_core::core::cipher::{decrypt, encrypt};
use vcrack_core::progress::RecordingProgress;
use vcrack_core::{CancellationToken, CrackConfig, CrackEngine, CrackError, CrackOutcome, Dictionary};

fn engine_for(texts: &[&str]) -> CrackEngine {
    let config = CrackConfig { workers: Some(3), seed: Some(11), ..CrackConfig::default() };
    CrackEngine::new(config).with_dictionary(dictionary_for(texts))
}

#[test]
fn recovers_a_five_letter_key() {
    let engine = engine_for(&[DICKENS]);
    let cipher = encrypt(DICKENS, "CRANE");

    let outcome = engine.crack(&cipher).unwrap();
    let report = outcome.report().expect("a key should be found");
    assert_eq!(report.key, "CRANE");
    assert_eq!(report.plaintext, DICKENS);
    assert!(report.stats.percentage >= 90.0);
    assert!(!report.refined);
    assert!(report.key_lengths.iter().any(|k| k.length == 5));
    assert!(report.alternatives.iter().all(|a| a.key != "CRANE"));
    assert!(report.alternatives.len() <= 10);
    assert!(report.narrative.iter().any(|l| l.starts_with("Testing key lengths")));
}

#[test]
fn a_multiple_of_the_key_length_still_decrypts() {
    let engine = engine_for(&[VILLAGE]);
    let cipher = encrypt(VILLAGE, "MOTH");

    let outcome = engine.crack(&cipher).unwrap();
    let report = outcome.report().unwrap();
    assert_eq!(report.key.len() % 4, 0, "key was {}", report.key);
    assert!(report.key.starts_with("MOTH"));
    assert_eq!(report.plaintext, VILLAGE);
}

#[test]
fn seven_letter_key_over_a_long_text() {
    let engine = engine_for(&[VILLAGE]);
    let cipher = encrypt(VILLAGE, "LANTERN");

    let outcome = engine.crack(&cipher).unwrap();
    let report = outcome.report().unwrap();
    assert_eq!(report.key, "LANTERN");
    assert_eq!(decrypt(&cipher, &report.key), VILLAGE);
}

#[test]
fn refining_a_nearly_right_key() {
    let engine = engine_for(&[VILLAGE]);
    let cipher = encrypt(VILLAGE, "HARBOUR");
    let progress = Arc::new(RecordingProgress::default());

    let outcome = engine
        .refine_key(&cipher, "harboux", &CancellationToken::new(), progress.clone())
        .unwrap();
    assert_eq!(outcome.key, "HARBOUR");
    assert_eq!(outcome.plaintext, VILLAGE);
    assert!(outcome.improved);
    assert!(outcome.converged);
    assert!(progress
        .updates()
        .iter()
        .any(|u| u.message.starts_with("Refining key (iteration 1/25). Current recognition:")));
}

#[test]
fn gibberish_dictionary_gives_no_viable_result() {
    let dictionary = Dictionary::from_ranked_words(["qqqq", "zzxq"]);
    let engine = CrackEngine::new(CrackConfig { workers: Some(2), ..CrackConfig::default() })
        .with_dictionary(dictionary);
    let cipher = encrypt(DICKENS, "CRANE");

    match engine.crack(&cipher).unwrap() {
        CrackOutcome::NoViableResult { key_lengths, narrative } => {
            assert_eq!(key_lengths.len(), 3);
            assert!(narrative.last().unwrap().starts_with("No viable keys found"));
        }
        CrackOutcome::Solved(report) => panic!("unexpected key {}", report.key),
    }
}

#[test]
fn weak_predefined_keys_fall_through_to_analysis() {
    let mut engine = engine_for(&[DICKENS]);
    engine.config_mut().use_predefined_keys = true;
    engine.set_predefined_keys(vec!["WRONG".into(), "NOPE".into()]);
    let cipher = encrypt(DICKENS, "CRANE");

    let report = engine.crack(&cipher).unwrap().report().cloned().unwrap();
    assert_eq!(report.key, "CRANE");
    assert!(report
        .narrative
        .iter()
        .any(|l| l.starts_with("No strong matches found in predefined keys")));
}

#[test]
fn missing_dictionary_is_retryable() {
    let engine = CrackEngine::new(CrackConfig::default());
    let err = engine.crack("LXFOPVEFRNHR").unwrap_err();
    assert_eq!(err, CrackError::DictionaryUnavailable);
    assert!(err.is_retryable());
}
