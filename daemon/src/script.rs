//! Scenario scripts: JSON descriptions of funded participants and a
//! sequence of engine calls, replayed against an in-memory ledger and a
//! manually advanced clock.
//!
//! ```json
//! {
//!   "balances": { "alice": 1000, "bob": 500 },
//!   "reputation": { "bob": 800 },
//!   "steps": [
//!     { "op": "submit", "proposer": "alice", "payload": "sky is blue", "bond": 100 },
//!     { "op": "verify", "claim": 1, "verifier": "bob", "asserted": true, "stake": 10 },
//!     { "op": "advance", "secs": 259201 },
//!     { "op": "finalize_verification", "claim": 1 }
//!   ]
//! }
//! ```
//!
//! A rejected step is recorded in the report and the run continues, unless
//! the run is strict.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

use attest_nullables::NullClock;
use attest_stake::{InMemoryLedger, Ledger, StakeError};
use attest_types::{ClaimId, Clock, ParamsError, ParticipantId, Timestamp};
use attest_utils::OpCounters;
use attest_verification::{
    Claim, ClaimEngine, ClaimEvent, DisputeResult, Resolution, VerificationError,
};

use crate::config::HostConfig;

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("invalid scenario JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid engine parameters: {0}")]
    Params(#[from] ParamsError),

    #[error("cannot fund {participant}: {source}")]
    Funding {
        participant: ParticipantId,
        source: StakeError,
    },

    #[error("step {index} ({op}) failed: {source}")]
    StepFailed {
        index: usize,
        op: &'static str,
        source: VerificationError,
    },
}

/// A scenario file.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Scenario {
    /// Free balance credited to each participant before the first step.
    #[serde(default)]
    pub balances: BTreeMap<ParticipantId, u128>,
    /// Reputation seeded for participants before the first step.
    #[serde(default)]
    pub reputation: BTreeMap<ParticipantId, i64>,
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn from_json(s: &str) -> Result<Self, ScriptError> {
        Ok(serde_json::from_str(s)?)
    }

    fn participants(&self) -> BTreeSet<ParticipantId> {
        let mut all: BTreeSet<ParticipantId> = self.balances.keys().cloned().collect();
        all.extend(self.reputation.keys().cloned());
        all.extend(self.steps.iter().filter_map(Step::actor).cloned());
        all
    }
}

/// One engine call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Submit {
        proposer: ParticipantId,
        #[serde(default)]
        payload: String,
        bond: u128,
        #[serde(default)]
        window_secs: Option<u64>,
    },
    Verify {
        claim: ClaimId,
        verifier: ParticipantId,
        asserted: bool,
        stake: u128,
    },
    Advance {
        secs: u64,
    },
    FinalizeVerification {
        claim: ClaimId,
    },
    RaiseDispute {
        claim: ClaimId,
        disputer: ParticipantId,
        stake: u128,
    },
    DisputeVote {
        claim: ClaimId,
        voter: ParticipantId,
        upholds_challenger: bool,
    },
    FinalizeDispute {
        claim: ClaimId,
    },
    Settle {
        claim: ClaimId,
    },
    Cancel {
        claim: ClaimId,
        caller: ParticipantId,
    },
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Submit { .. } => "submit",
            Self::Verify { .. } => "verify",
            Self::Advance { .. } => "advance",
            Self::FinalizeVerification { .. } => "finalize_verification",
            Self::RaiseDispute { .. } => "raise_dispute",
            Self::DisputeVote { .. } => "dispute_vote",
            Self::FinalizeDispute { .. } => "finalize_dispute",
            Self::Settle { .. } => "settle",
            Self::Cancel { .. } => "cancel",
        }
    }

    fn actor(&self) -> Option<&ParticipantId> {
        match self {
            Self::Submit { proposer, .. } => Some(proposer),
            Self::Verify { verifier, .. } => Some(verifier),
            Self::RaiseDispute { disputer, .. } => Some(disputer),
            Self::DisputeVote { voter, .. } => Some(voter),
            Self::Cancel { caller, .. } => Some(caller),
            _ => None,
        }
    }
}

/// Return value of a successful step.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepResult {
    Submitted { claim: ClaimId },
    Advanced { now: Timestamp },
    Resolved { resolution: Resolution },
    DisputeResolved { result: DisputeResult, outcome: bool },
    Settled {
        outcome: Option<bool>,
        forfeited: u128,
        paid_out: u128,
    },
}

/// What happened at one step.
#[derive(Clone, Debug, Serialize)]
pub struct StepReport {
    pub index: usize,
    pub op: &'static str,
    pub at: Timestamp,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<StepResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Final state after a scenario run.
#[derive(Clone, Debug, Serialize)]
pub struct RunReport {
    pub steps: Vec<StepReport>,
    pub claims: Vec<Claim>,
    pub balances: BTreeMap<ParticipantId, u128>,
    pub reputation: BTreeMap<ParticipantId, i64>,
    pub total_escrowed: u128,
    pub finished_at: Timestamp,
    pub events: Vec<ClaimEvent>,
    /// `<op>.ok` / `<op>.<error kind>` tallies.
    pub counters: BTreeMap<String, u64>,
}

impl RunReport {
    pub fn failures(&self) -> usize {
        self.steps.iter().filter(|s| !s.ok).count()
    }

    /// Per-step outcomes and counters only.
    pub fn summary(&self) -> RunSummary<'_> {
        RunSummary {
            steps: &self.steps,
            counters: &self.counters,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RunSummary<'a> {
    pub steps: &'a [StepReport],
    pub counters: &'a BTreeMap<String, u64>,
}

type SimEngine = ClaimEngine<InMemoryLedger, NullClock, Vec<ClaimEvent>>;

/// Replay `scenario` under `config`. With `strict`, the first rejected step
/// aborts the run.
pub fn run(scenario: &Scenario, config: &HostConfig, strict: bool) -> Result<RunReport, ScriptError> {
    let clock = NullClock::new(config.start_time);
    let mut ledger = InMemoryLedger::new();
    for (participant, amount) in &scenario.balances {
        ledger
            .credit(participant, *amount)
            .map_err(|source| ScriptError::Funding {
                participant: participant.clone(),
                source,
            })?;
    }

    let mut engine: SimEngine = ClaimEngine::new(config.params.clone(), ledger, clock.clone(), Vec::new())?;
    for (participant, score) in &scenario.reputation {
        engine.seed_reputation(participant, *score);
    }

    let mut counters = OpCounters::new();
    let mut steps = Vec::with_capacity(scenario.steps.len());
    for (index, step) in scenario.steps.iter().enumerate() {
        let at = clock.now();
        let outcome = apply(&mut engine, &clock, step);
        let report = match outcome {
            Ok(result) => {
                counters.increment(format!("{}.ok", step.name()));
                StepReport {
                    index,
                    op: step.name(),
                    at,
                    ok: true,
                    result,
                    error_kind: None,
                    error: None,
                }
            }
            Err(source) => {
                counters.increment(format!("{}.{}", step.name(), source.kind_label()));
                tracing::warn!(index, op = step.name(), kind = source.kind_label(), error = %source, "step rejected");
                if strict {
                    return Err(ScriptError::StepFailed {
                        index,
                        op: step.name(),
                        source,
                    });
                }
                StepReport {
                    index,
                    op: step.name(),
                    at,
                    ok: false,
                    result: None,
                    error_kind: Some(source.kind_label()),
                    error: Some(source.to_string()),
                }
            }
        };
        steps.push(report);
    }

    let mut participants = scenario.participants();
    participants.insert(config.params.reward_pool.clone());
    let balances = participants
        .iter()
        .map(|p| (p.clone(), engine.ledger().balance(p)))
        .collect();
    let reputation = participants
        .iter()
        .filter(|p| **p != config.params.reward_pool)
        .map(|p| (p.clone(), engine.reputation(p)))
        .collect();

    Ok(RunReport {
        steps,
        claims: engine.registry().claims().cloned().collect(),
        balances,
        reputation,
        total_escrowed: engine.ledger().total_escrowed(),
        finished_at: clock.now(),
        events: engine.sink().clone(),
        counters: counters.snapshot(),
    })
}

fn apply(engine: &mut SimEngine, clock: &NullClock, step: &Step) -> Result<Option<StepResult>, VerificationError> {
    let result = match step {
        Step::Submit {
            proposer,
            payload,
            bond,
            window_secs,
        } => {
            let claim = engine.submit_claim(proposer, payload.clone(), *bond, *window_secs)?;
            Some(StepResult::Submitted { claim })
        }
        Step::Verify {
            claim,
            verifier,
            asserted,
            stake,
        } => {
            engine.verify(*claim, verifier, *asserted, *stake)?;
            None
        }
        Step::Advance { secs } => {
            clock.advance(*secs);
            Some(StepResult::Advanced { now: clock.now() })
        }
        Step::FinalizeVerification { claim } => Some(StepResult::Resolved {
            resolution: engine.finalize_verification(*claim)?,
        }),
        Step::RaiseDispute {
            claim,
            disputer,
            stake,
        } => {
            engine.raise_dispute(*claim, disputer, *stake)?;
            None
        }
        Step::DisputeVote {
            claim,
            voter,
            upholds_challenger,
        } => {
            engine.cast_dispute_vote(*claim, voter, *upholds_challenger)?;
            None
        }
        Step::FinalizeDispute { claim } => {
            let outcome = engine.finalize_dispute(*claim)?;
            Some(StepResult::DisputeResolved {
                result: outcome.result,
                outcome: outcome.outcome,
            })
        }
        Step::Settle { claim } => {
            let settlement = engine.settle(*claim)?;
            Some(StepResult::Settled {
                outcome: settlement.outcome,
                forfeited: settlement.forfeited_total,
                paid_out: settlement.paid_out,
            })
        }
        Step::Cancel { claim, caller } => {
            engine.cancel_claim(*claim, caller)?;
            None
        }
    };
    Ok(result)
}
