#![no_main]

use libfuzzer_sys::fuzz_target;

use attest_verification::{passes_threshold, weighted_score, Direction};

// Threshold checks must never overflow, and a score can never pass both ways.
fuzz_target!(|input: (u128, u128, u16)| {
    let (t, f, raw) = input;
    let threshold = 5_001 + u32::from(raw) % 5_000;
    let score = weighted_score(t, f);
    assert!(score.as_bps() <= 10_000);
    let direction = passes_threshold(score, threshold);
    if t == 0 && f > 0 {
        assert_eq!(direction, Direction::False);
    }
    if f == 0 && t > 0 {
        assert_eq!(direction, Direction::True);
    }
});
