//! Property-based tests for registry invariants
//!
//! These tests use proptest to verify critical invariants over arbitrary
//! operation sequences:
//! - Tonnage conservation: Σ(owned balances) == Σ(non-retired credit amounts)
//! - Retirement is terminal: retired credits never reappear or transfer
//! - Funding consistency: current_funding == Σ(contribution map)
//! - Progress bound: current CO2 never exceeds the target

use proptest::prelude::*;
use registry_core::{Address, NullEngine, RegistryState};
use rust_decimal::Decimal;

const ADMIN: &str = "admin";
const PARTICIPANTS: &[&str] = &["alice", "bob", "carol", "dave"];

/// One step of a randomly generated workload
#[derive(Debug, Clone)]
enum Op {
    Issue {
        issuer: usize,
        tonnes: u64,
        price: u64,
    },
    Purchase {
        buyer: usize,
        credit_seq: u64,
        overpay: u64,
    },
    Retire {
        caller: usize,
        credit_seq: u64,
    },
    CreateProject {
        owner: usize,
        target: u64,
        goal: u64,
    },
    Fund {
        contributor: usize,
        project_seq: u64,
        amount: u64,
    },
    Progress {
        project_seq: u64,
        co2: u64,
    },
}

fn participant_idx() -> impl Strategy<Value = usize> {
    0..PARTICIPANTS.len()
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (participant_idx(), 1u64..100, 1u64..50)
            .prop_map(|(issuer, tonnes, price)| Op::Issue { issuer, tonnes, price }),
        (participant_idx(), 1u64..20, 0u64..30).prop_map(|(buyer, credit_seq, overpay)| {
            Op::Purchase { buyer, credit_seq, overpay }
        }),
        (participant_idx(), 1u64..20)
            .prop_map(|(caller, credit_seq)| Op::Retire { caller, credit_seq }),
        (participant_idx(), 1u64..200, 1u64..500)
            .prop_map(|(owner, target, goal)| Op::CreateProject { owner, target, goal }),
        (participant_idx(), 1u64..10, 1u64..200).prop_map(|(contributor, project_seq, amount)| {
            Op::Fund { contributor, project_seq, amount }
        }),
        (1u64..10, 0u64..250).prop_map(|(project_seq, co2)| Op::Progress { project_seq, co2 }),
    ]
}

fn addr(idx: usize) -> Address {
    Address::new(PARTICIPANTS[idx])
}

/// Registry with all test participants registered and everyone authorized to
/// issue, so random workloads exercise the lifecycle instead of bouncing off
/// the access layer.
fn seeded_state() -> RegistryState {
    let admin = Address::new(ADMIN);
    let mut state = RegistryState::new(admin.clone(), Address::new("ledger"));
    for who in PARTICIPANTS {
        state
            .register_participant(
                Address::new(*who),
                who.to_string(),
                "ngo".to_string(),
                "doc://kyc".to_string(),
            )
            .unwrap();
        state
            .set_issuer_authorization(&admin, Address::new(*who), true)
            .unwrap();
    }
    state
}

/// Apply one op, ignoring precondition rejections: invariants must hold
/// whether or not individual operations are accepted.
fn apply(state: &mut RegistryState, op: &Op) {
    let admin = Address::new(ADMIN);
    match op {
        Op::Issue { issuer, tonnes, price } => {
            let _ = state.issue_credit(
                addr(*issuer),
                "Offset Project".to_string(),
                *tonnes,
                Decimal::from(*price),
                "Qm123".to_string(),
                "VM0042".to_string(),
            );
        }
        Op::Purchase { buyer, credit_seq, overpay } => {
            let payment = state
                .credit(*credit_seq)
                .ok()
                .and_then(|c| c.total_price())
                .map(|price| price + Decimal::from(*overpay))
                .unwrap_or_default();
            let _ = state.purchase_credit(addr(*buyer), *credit_seq, payment, &NullEngine);
        }
        Op::Retire { caller, credit_seq } => {
            let _ = state.retire_credit(&addr(*caller), *credit_seq);
        }
        Op::CreateProject { owner, target, goal } => {
            let _ = state.create_project(
                addr(*owner),
                "Climate Project".to_string(),
                String::new(),
                String::new(),
                *target,
                Decimal::from(*goal),
            );
        }
        Op::Fund { contributor, project_seq, amount } => {
            let _ = state.fund_project(
                addr(*contributor),
                *project_seq,
                Decimal::from(*amount),
                &NullEngine,
            );
        }
        Op::Progress { project_seq, co2 } => {
            let _ = state.update_project_progress(&admin, *project_seq, *co2);
        }
    }
}

/// Σ credits_owned over all participants must equal Σ amount over all
/// non-retired credits; each non-retired credit must sit in exactly its
/// owner's owned set, each retired credit in none.
fn assert_conservation(state: &RegistryState) {
    let mut owned_total: u64 = 0;
    let mut live_total: u64 = 0;

    for who in PARTICIPANTS {
        let p = state.participant(&Address::new(*who)).unwrap();
        owned_total += p.credits_owned;

        for credit_id in &p.owned_credits {
            let credit = state.credit(*credit_id).unwrap();
            assert!(!credit.retired, "retired credit {credit_id} in an owned set");
            assert_eq!(
                credit.current_owner,
                Address::new(*who),
                "credit {credit_id} in the wrong owned set"
            );
        }
    }

    let mut credit_id = 1;
    while let Ok(credit) = state.credit(credit_id) {
        if !credit.retired {
            live_total += credit.amount_tonnes;
            let owner = state.participant(&credit.current_owner).unwrap();
            assert!(
                owner.owned_credits.contains(&credit_id),
                "credit {credit_id} missing from its owner's set"
            );
        }
        credit_id += 1;
    }

    assert_eq!(owned_total, live_total, "tonnage conservation violated");
}

fn assert_project_consistency(state: &RegistryState) {
    let mut project_id = 1;
    while let Ok(project) = state.project(project_id) {
        let map_total: Decimal = project.contributions.values().copied().sum();
        assert_eq!(
            project.current_funding, map_total,
            "project {project_id} funding does not match its contribution map"
        );

        let mut seen = std::collections::HashSet::new();
        for contributor in &project.contributor_list {
            assert!(
                seen.insert(contributor.clone()),
                "duplicate contributor in project {project_id}"
            );
            assert!(project.contributions.contains_key(contributor));
        }
        assert_eq!(seen.len(), project.contributions.len());

        assert!(
            project.current_co2_tonnes <= project.target_co2_tonnes,
            "project {project_id} progress exceeds its target"
        );

        project_id += 1;
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Invariants hold after every step of any operation sequence.
    #[test]
    fn prop_invariants_hold_for_all_sequences(ops in prop::collection::vec(op_strategy(), 1..60)) {
        let mut state = seeded_state();

        for op in &ops {
            apply(&mut state, op);
            assert_conservation(&state);
            assert_project_consistency(&state);
        }
    }

    /// A retired credit never transfers and never re-retires.
    #[test]
    fn prop_retirement_is_terminal(
        ops in prop::collection::vec(op_strategy(), 0..40),
        tonnes in 1u64..100,
        price in 1u64..50,
    ) {
        let mut state = seeded_state();

        let (credit_id, _) = state
            .issue_credit(
                addr(0),
                "Offset Project".to_string(),
                tonnes,
                Decimal::from(price),
                "Qm123".to_string(),
                "VM0042".to_string(),
            )
            .unwrap();
        state.retire_credit(&addr(0), credit_id).unwrap();

        for op in &ops {
            apply(&mut state, op);
        }

        let credit = state.credit(credit_id).unwrap();
        prop_assert!(credit.retired);
        prop_assert_eq!(&credit.current_owner, &addr(0));
        for who in PARTICIPANTS {
            let p = state.participant(&Address::new(*who)).unwrap();
            prop_assert!(!p.owned_credits.contains(&credit_id));
        }

        prop_assert!(matches!(
            state.retire_credit(&addr(0), credit_id),
            Err(registry_core::Error::AlreadyRetired(_))
        ));
        prop_assert!(matches!(
            state.purchase_credit(addr(1), credit_id, Decimal::from(10_000), &NullEngine),
            Err(registry_core::Error::AlreadyRetired(_))
        ));
    }

    /// Contributor lists preserve first-contribution order.
    #[test]
    fn prop_contributor_order_is_first_contribution(order in proptest::sample::subsequence(vec![0usize, 1, 2, 3], 1..=4)) {
        let mut state = seeded_state();
        let (project_id, _) = state
            .create_project(
                addr(0),
                "Climate Project".to_string(),
                String::new(),
                String::new(),
                100,
                Decimal::from(1_000_000),
            )
            .unwrap();

        // Each contributor funds twice; the list must record the first pass only.
        for idx in order.iter().chain(order.iter()) {
            state
                .fund_project(addr(*idx), project_id, Decimal::ONE, &NullEngine)
                .unwrap();
        }

        let expected: Vec<Address> = order.iter().map(|i| addr(*i)).collect();
        prop_assert_eq!(state.contributors(project_id).unwrap(), expected);
    }
}
