#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use attest_nullables::NullClock;
use attest_stake::{InMemoryLedger, Ledger};
use attest_types::{ClaimId, EngineParams, ParticipantId};
use attest_verification::{ClaimEngine, ClaimEvent};

const PEOPLE: [&str; 4] = ["a", "b", "c", "d"];

#[derive(Arbitrary, Debug)]
enum Op {
    Submit { who: u8, bond: u16, window: Option<u8> },
    Verify { claim: u8, who: u8, asserted: bool, stake: u16 },
    Advance(u8),
    FinalizeVerification(u8),
    RaiseDispute { claim: u8, who: u8, stake: u16 },
    Vote { claim: u8, who: u8, uphold: bool },
    FinalizeDispute(u8),
    Settle(u8),
    Cancel { claim: u8, who: u8 },
    Seed { who: u8, score: i16 },
}

#[derive(Arbitrary, Debug)]
struct Input {
    threshold_bps: u16,
    ops: Vec<Op>,
}

fn who(i: u8) -> ParticipantId {
    ParticipantId::new(PEOPLE[i as usize % PEOPLE.len()])
}

// Drive the engine with arbitrary call sequences. It must never panic and
// must never create or destroy funds.
fuzz_target!(|input: Input| {
    let params = EngineParams {
        consensus_threshold_bps: 5_001 + u32::from(input.threshold_bps) % 5_000,
        verification_window_secs: 20,
        dispute_window_secs: 10,
        dispute_vote_window_secs: 10,
        reputation_decay_period_secs: 15,
        ..EngineParams::default()
    };
    let mut ledger = InMemoryLedger::new();
    for p in PEOPLE {
        let _ = ledger.credit(&ParticipantId::new(p), 100_000);
    }
    let clock = NullClock::new(0);
    let Ok(mut engine) = ClaimEngine::new(params, ledger, clock.clone(), Vec::<ClaimEvent>::new()) else {
        return;
    };
    let total = engine.ledger().total_balance();

    for op in input.ops.iter().take(256) {
        let id = |c: &u8| ClaimId::new(u64::from(*c % 8));
        let _ = match op {
            Op::Submit { who: w, bond, window } => engine
                .submit_claim(&who(*w), "fuzz", u128::from(*bond), window.map(u64::from))
                .map(|_| ()),
            Op::Verify { claim, who: w, asserted, stake } => {
                engine.verify(id(claim), &who(*w), *asserted, u128::from(*stake))
            }
            Op::Advance(secs) => {
                clock.advance(u64::from(*secs));
                Ok(())
            }
            Op::FinalizeVerification(claim) => engine.finalize_verification(id(claim)).map(|_| ()),
            Op::RaiseDispute { claim, who: w, stake } => {
                engine.raise_dispute(id(claim), &who(*w), u128::from(*stake))
            }
            Op::Vote { claim, who: w, uphold } => engine.cast_dispute_vote(id(claim), &who(*w), *uphold),
            Op::FinalizeDispute(claim) => engine.finalize_dispute(id(claim)).map(|_| ()),
            Op::Settle(claim) => engine.settle(id(claim)).map(|_| ()),
            Op::Cancel { claim, who: w } => engine.cancel_claim(id(claim), &who(*w)),
            Op::Seed { who: w, score } => {
                engine.seed_reputation(&who(*w), i64::from(*score));
                Ok(())
            }
        };
        let ledger = engine.ledger();
        assert_eq!(ledger.total_balance() + ledger.total_escrowed(), total);
    }
});
