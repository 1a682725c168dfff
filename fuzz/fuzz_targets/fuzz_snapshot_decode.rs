#![no_main]

use libfuzzer_sys::fuzz_target;

use attest_nullables::NullClock;
use attest_stake::InMemoryLedger;
use attest_verification::{ClaimEngine, ClaimEvent, EngineSnapshot};

// Snapshot decoding must reject malformed bytes without panicking, and a
// decoded snapshot with valid parameters must rebuild an engine.
fuzz_target!(|data: &[u8]| {
    let Ok(snapshot) = EngineSnapshot::from_bytes(data) else {
        return;
    };
    let _ = ClaimEngine::restore(
        snapshot,
        InMemoryLedger::new(),
        NullClock::new(0),
        Vec::<ClaimEvent>::new(),
    );
    let _ = serde_json::from_slice::<attest_types::EngineParams>(data);
});
