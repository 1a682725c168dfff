use proptest::prelude::*;

use attest_reputation::{DecayPolicy, ReputationStore};
use attest_types::{ParticipantId, Timestamp};

fn policy() -> DecayPolicy {
    DecayPolicy {
        min: -500,
        max: 1_000,
        initial: 100,
        points_per_period: 3,
        period_secs: 3_600,
    }
}

proptest! {
    /// Scores stay within bounds after every adjustment, whatever the deltas
    /// and however much time passes between them.
    #[test]
    fn adjust_keeps_score_in_bounds(
        steps in prop::collection::vec((any::<i64>(), 0u64..1_000_000), 1..64),
    ) {
        let mut store = ReputationStore::new(policy());
        let who = ParticipantId::new("p");
        let mut now = 0u64;
        for (delta, gap) in steps {
            now += gap;
            let change = store.adjust(&who, delta, Timestamp::new(now));
            prop_assert!((-500..=1_000).contains(&change.after));
            let score = store.get(&who, Timestamp::new(now));
            prop_assert!((-500..=1_000).contains(&score));
        }
    }

    /// Decay never raises a score and never goes below the floor.
    #[test]
    fn decay_is_monotone_and_floored(start in -500i64..=1_000, gaps in prop::collection::vec(0u64..100_000, 1..32)) {
        let mut store = ReputationStore::new(policy());
        let who = ParticipantId::new("p");
        store.set(&who, start, Timestamp::new(0));
        let mut now = 0u64;
        let mut last = start;
        for gap in gaps {
            now += gap;
            let score = store.get(&who, Timestamp::new(now));
            prop_assert!(score <= last);
            prop_assert!(score >= -500);
            last = score;
        }
    }

    /// Reading often decays exactly as much as reading once at the end.
    #[test]
    fn lazy_decay_is_path_independent(gaps in prop::collection::vec(0u64..10_000, 1..32)) {
        let who = ParticipantId::new("p");
        let mut chatty = ReputationStore::new(policy());
        let mut quiet = ReputationStore::new(policy());
        chatty.set(&who, 900, Timestamp::new(0));
        quiet.set(&who, 900, Timestamp::new(0));

        let mut now = 0u64;
        for gap in gaps {
            now += gap;
            chatty.get(&who, Timestamp::new(now));
        }
        prop_assert_eq!(chatty.get(&who, Timestamp::new(now)), quiet.get(&who, Timestamp::new(now)));
    }
}
