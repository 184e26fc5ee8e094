//! End-to-end integration tests for the veil market module.
//!
//! These tests exercise full lifecycles over a fresh in-memory store:
//!
//! 1. Genesis seeding
//! 2. Market creation and the batch pipeline
//!    (commit → reveal → submit proof → clear)
//! 3. AMM round trips
//! 4. VAI monetary invariants
//! 5. Treasury release cadence and dispute flow

#![cfg(test)]

use std::sync::Arc;

use parking_lot::Mutex;
use sha2::{Digest, Sha256};

use veil_module::actions::{
    AddLiquidity, AddLiquidityResult, BurnVai, ClearBatch, CommitOrder, CreateMarket,
    CreatePool, Dispute, MintVai, ReleaseColTranche, RemoveLiquidity, ResolveMarket,
    RevealBatch, RouteFees, SubmitBatchProof, SubmitBatchProofResult, SwapExactIn,
    SwapExactInResult, Transfer,
};
use veil_module::{Action, ActionError, ActionPayload, ExecContext};
use veil_storage::{self as storage, MemStore, StateError};
use veil_types::consts::{
    MARKET_STATUS_DISPUTED, MARKET_STATUS_RESOLVED, PROOF_CIRCUIT_CLEAR_HASH_V1,
    PROOF_TYPE_GROTH16,
};
use veil_types::{Address, MarketId, TxId, ADDRESS_LEN, ID_LEN};
use veil_zk::{
    batch_proof_verifier, build_proof_envelope_with_circuit, compute_clear_public_inputs_hash,
    configure_batch_proof_verifier, BatchProofVerifier,
};

/// Tests that install a process-wide verifier serialize through this lock.
static VERIFIER_GUARD: Mutex<()> = Mutex::new(());

const GOVERNANCE: Address = Address([1; ADDRESS_LEN]);
const TRADER: Address = Address([2; ADDRESS_LEN]);
const PROVER: Address = Address([3; ADDRESS_LEN]);

fn ctx(actor: Address, timestamp: i64) -> ExecContext {
    ExecContext::new(timestamp, actor, TxId([0xCA; ID_LEN]))
}

fn genesis_json() -> String {
    let governance: Vec<String> = GOVERNANCE.0.iter().map(|b| b.to_string()).collect();
    let trader: Vec<String> = TRADER.0.iter().map(|b| b.to_string()).collect();
    let prover: Vec<String> = PROVER.0.iter().map(|b| b.to_string()).collect();
    format!(
        r#"{{
            "customAllocation": [
                {{"address": [{}], "balance": 1000000000}},
                {{"address": [{}], "balance": 500000000}}
            ],
            "tokenomics": {{
                "totalSupply": 2400000000,
                "colVaultLocked": 900000000,
                "colVaultLive": 0,
                "vaiDebtCeiling": 2000000,
                "proverAuthority": [{}]
            }}
        }}"#,
        governance.join(","),
        trader.join(","),
        prover.join(",")
    )
}

fn seeded_store() -> MemStore {
    let genesis = veil_module::genesis::Genesis::from_json(genesis_json().as_bytes()).unwrap();
    genesis.validate().unwrap();
    let mut store = MemStore::new();
    genesis.initialize_state(&mut store).unwrap();
    store
}

fn market_id() -> MarketId {
    MarketId([0x11; ID_LEN])
}

fn create_market(store: &mut MemStore) {
    CreateMarket {
        market_id: market_id(),
        question: b"does the batch clear".to_vec(),
        outcomes: 2,
        resolution_time: 1_000_000,
        creator_bond: 1_000,
    }
    .execute(store, &ctx(TRADER, 1_000))
    .unwrap();
}

// ========================================
// Batch pipeline
// ========================================

#[test]
fn full_batch_window_lifecycle() {
    let _guard = VERIFIER_GUARD.lock();
    let (prev, prev_strict) = batch_proof_verifier();
    configure_batch_proof_verifier(None, false);

    let mut store = seeded_store();
    create_market(&mut store);

    // Phase 1: traders commit sealed orders into window 1.
    for (actor, window) in [(TRADER, 1u64), (GOVERNANCE, 1u64)] {
        CommitOrder {
            market_id: market_id(),
            window_id: window,
            envelope: vec![0xE0; 128],
            commitment: vec![0xC0; 32],
        }
        .execute(&mut store, &ctx(actor, 2_000))
        .unwrap();
    }

    // Phase 2: validators reveal decryption shares.
    for index in 0..3u32 {
        RevealBatch {
            market_id: market_id(),
            window_id: 1,
            decryption_share: vec![0xD0; 64],
            validator_index: index,
        }
        .execute(&mut store, &ctx(GOVERNANCE, 5_100))
        .unwrap();
    }

    // Phase 3: the prover registers a proof for the closed window.
    let fills_hash = vec![0x5C; 32];
    let inputs_hash =
        compute_clear_public_inputs_hash(&market_id(), 1, 1_025, 3_200, &fills_hash);
    let submit_out = SubmitBatchProof {
        market_id: market_id(),
        window_id: 1,
        window_close_at_ms: 5_000,
        proof_type: PROOF_TYPE_GROTH16,
        public_inputs_hash: inputs_hash.to_vec(),
        fills_hash: fills_hash.clone(),
        proof: vec![0xAB; 192],
    }
    .execute(&mut store, &ctx(PROVER, 6_000))
    .unwrap();
    let submit_result = SubmitBatchProofResult::decode(&submit_out).unwrap();
    let expected_commitment: [u8; 32] = Sha256::digest(vec![0xAB; 192]).into();
    assert_eq!(submit_result.proof_commitment, expected_commitment);

    // Phase 4: the clear is bound to the exact proven tuple.
    ClearBatch {
        market_id: market_id(),
        window_id: 1,
        clear_price: 1_025,
        total_volume: 3_200,
        fills_hash,
    }
    .execute(&mut store, &ctx(PROVER, 7_000))
    .unwrap();

    let batch = storage::get_batch(&store, &market_id(), 1).unwrap().unwrap();
    assert_eq!(batch.clear_price, 1_025);
    assert_eq!(batch.total_volume, 3_200);

    // Prover identity accrued.
    let bloodsworn = storage::get_bloodsworn(&store, &PROVER).unwrap();
    assert_eq!(bloodsworn.total_accepted_proofs, 1);
    let glyph = storage::get_glyph(&store, &market_id(), 1).unwrap();
    assert_eq!(glyph.prover, PROVER);

    configure_batch_proof_verifier(prev, prev_strict);
}

#[test]
fn clear_with_drifted_price_is_rejected() {
    let _guard = VERIFIER_GUARD.lock();
    let (prev, prev_strict) = batch_proof_verifier();
    configure_batch_proof_verifier(None, false);

    let mut store = seeded_store();
    create_market(&mut store);

    let fills_hash = vec![0x5C; 32];
    let inputs_hash =
        compute_clear_public_inputs_hash(&market_id(), 1, 1_025, 3_200, &fills_hash);
    SubmitBatchProof {
        market_id: market_id(),
        window_id: 1,
        window_close_at_ms: 5_000,
        proof_type: PROOF_TYPE_GROTH16,
        public_inputs_hash: inputs_hash.to_vec(),
        fills_hash: fills_hash.clone(),
        proof: vec![0xAB; 192],
    }
    .execute(&mut store, &ctx(PROVER, 6_000))
    .unwrap();

    let err = ClearBatch {
        market_id: market_id(),
        window_id: 1,
        clear_price: 1_026,
        total_volume: 3_200,
        fills_hash,
    }
    .execute(&mut store, &ctx(PROVER, 7_000))
    .unwrap_err();
    assert_eq!(
        err,
        ActionError::State(StateError::ProofPublicInputsMismatch)
    );
    assert!(storage::get_batch(&store, &market_id(), 1).unwrap().is_none());

    configure_batch_proof_verifier(prev, prev_strict);
}

#[test]
fn late_proof_misses_the_deadline() {
    let mut store = seeded_store();
    create_market(&mut store);

    let submit = SubmitBatchProof {
        market_id: market_id(),
        window_id: 2,
        window_close_at_ms: 10_000,
        proof_type: PROOF_TYPE_GROTH16,
        public_inputs_hash: vec![0x11; 32],
        fills_hash: vec![0x22; 32],
        proof: vec![0xAB; 64],
    };

    // window_close + deadline + 1
    assert_eq!(
        submit.execute(&mut store, &ctx(PROVER, 20_001)),
        Err(ActionError::State(StateError::ProofDeadlineMissed))
    );

    let snapshot = veil_module::metrics::snapshot(0, true);
    let window = snapshot
        .windows
        .iter()
        .find(|w| w.market_id.starts_with("11") && w.window_id == 2)
        .expect("window metrics recorded");
    assert!(window.missed_deadline);
    assert!(window.rejected);
}

#[test]
fn enveloped_proof_flows_through_installed_verifier() {
    let _guard = VERIFIER_GUARD.lock();
    let (prev, prev_strict) = batch_proof_verifier();

    struct CountingVerifier {
        calls: Mutex<u32>,
    }
    impl BatchProofVerifier for CountingVerifier {
        fn verify(
            &self,
            proof_type: u8,
            circuit_id: &str,
            _proof: &[u8],
            _public_inputs_hash: &[u8],
            public_witness: Option<&[u8]>,
        ) -> Result<(), StateError> {
            assert_eq!(proof_type, PROOF_TYPE_GROTH16);
            assert_eq!(circuit_id, PROOF_CIRCUIT_CLEAR_HASH_V1);
            assert!(public_witness.is_some());
            *self.calls.lock() += 1;
            Ok(())
        }
    }

    let verifier = Arc::new(CountingVerifier {
        calls: Mutex::new(0),
    });
    configure_batch_proof_verifier(Some(verifier.clone()), true);

    let mut store = seeded_store();
    create_market(&mut store);

    let fills_hash = vec![0x5C; 32];
    let inputs_hash =
        compute_clear_public_inputs_hash(&market_id(), 1, 1_025, 3_200, &fills_hash);
    let envelope = build_proof_envelope_with_circuit(
        PROOF_TYPE_GROTH16,
        PROOF_CIRCUIT_CLEAR_HASH_V1,
        &[0xAB; 128],
        &[0x07; 36],
    )
    .unwrap();

    SubmitBatchProof {
        market_id: market_id(),
        window_id: 1,
        window_close_at_ms: 5_000,
        proof_type: PROOF_TYPE_GROTH16,
        public_inputs_hash: inputs_hash.to_vec(),
        fills_hash: fills_hash.clone(),
        proof: envelope,
    }
    .execute(&mut store, &ctx(PROVER, 6_000))
    .unwrap();

    ClearBatch {
        market_id: market_id(),
        window_id: 1,
        clear_price: 1_025,
        total_volume: 3_200,
        fills_hash,
    }
    .execute(&mut store, &ctx(PROVER, 7_000))
    .unwrap();

    // Submit and clear both consult the verifier.
    assert_eq!(*verifier.calls.lock(), 2);

    configure_batch_proof_verifier(prev, prev_strict);
}

#[test]
fn strict_mode_without_verifier_blocks_submission() {
    let _guard = VERIFIER_GUARD.lock();
    let (prev, prev_strict) = batch_proof_verifier();
    configure_batch_proof_verifier(None, true);

    let mut store = seeded_store();
    create_market(&mut store);

    let err = SubmitBatchProof {
        market_id: market_id(),
        window_id: 1,
        window_close_at_ms: 5_000,
        proof_type: PROOF_TYPE_GROTH16,
        public_inputs_hash: vec![0x11; 32],
        fills_hash: vec![0x22; 32],
        proof: vec![0xAB; 16],
    }
    .execute(&mut store, &ctx(PROVER, 6_000))
    .unwrap_err();
    assert_eq!(err, ActionError::State(StateError::ProofVerifierUnavailable));

    configure_batch_proof_verifier(prev, prev_strict);
}

// ========================================
// AMM
// ========================================

#[test]
fn amm_round_trip() {
    let mut store = seeded_store();

    CreatePool {
        asset0: 0,
        asset1: 1,
        fee_bips: 30,
    }
    .execute(&mut store, &ctx(GOVERNANCE, 1_000))
    .unwrap();

    // Mint the trader some VAI to pair against native VEIL.
    MintVai {
        to: TRADER,
        amount: 100_000,
    }
    .execute(&mut store, &ctx(GOVERNANCE, 1_000))
    .unwrap();

    let add_out = AddLiquidity {
        asset0: 0,
        asset1: 1,
        amount0: 10_000,
        amount1: 10_000,
        min_lp: 1,
    }
    .execute(&mut store, &ctx(TRADER, 1_100))
    .unwrap();
    let add = AddLiquidityResult::decode(&add_out).unwrap();
    assert_eq!(add.minted_lp, 10_000);
    assert_eq!(add.reserve0, 10_000);
    assert_eq!(add.reserve1, 10_000);
    assert_eq!(add.total_lp, 10_000);

    let swap_out = SwapExactIn {
        asset_in: 0,
        asset_out: 1,
        amount_in: 100,
        min_amount_out: 1,
    }
    .execute(&mut store, &ctx(TRADER, 1_200))
    .unwrap();
    let swap = SwapExactInResult::decode(&swap_out).unwrap();
    assert_eq!(swap.amount_out, 98);
    assert_eq!(swap.reserve0, 10_100);
    assert_eq!(swap.reserve1, 9_902);

    RemoveLiquidity {
        asset0: 0,
        asset1: 1,
        lp_amount: 10_000,
        min_amount0: 1,
        min_amount1: 1,
    }
    .execute(&mut store, &ctx(TRADER, 1_300))
    .unwrap();

    let pool = storage::get_pool(&store, 0, 1).unwrap();
    assert_eq!(pool.total_lp, 0);
    assert_eq!(
        storage::get_lp_balance(&store, 0, 1, &TRADER).unwrap(),
        0
    );
}

// ========================================
// VAI / treasury / fees
// ========================================

#[test]
fn vai_backing_floor_blocks_overminting() {
    let mut store = seeded_store();

    // Shrink the attested reserve to half the ceiling.
    veil_module::actions::UpdateReserveState {
        exogenous_reserve: 1_000_000,
        vai_buffer: 0,
    }
    .execute(&mut store, &ctx(GOVERNANCE, 1_000))
    .unwrap();

    assert_eq!(
        MintVai {
            to: TRADER,
            amount: 1_500_000,
        }
        .execute(&mut store, &ctx(GOVERNANCE, 1_000)),
        Err(ActionError::State(StateError::BackingRatioViolation))
    );

    MintVai {
        to: TRADER,
        amount: 1_000_000,
    }
    .execute(&mut store, &ctx(GOVERNANCE, 1_000))
    .unwrap();

    // Burning restores headroom.
    BurnVai { amount: 400_000 }
        .execute(&mut store, &ctx(TRADER, 2_000))
        .unwrap();
    let state = storage::get_vai_state(&store).unwrap();
    assert_eq!(state.total_debt, 600_000);
}

#[test]
fn treasury_release_cadence_and_fee_routing() {
    let mut store = seeded_store();

    // Cap: 900e6 * 15 / 10_000 = 1_350_000.
    assert_eq!(
        ReleaseColTranche { amount: 1_500_000 }
            .execute(&mut store, &ctx(GOVERNANCE, 10_000)),
        Err(ActionError::State(StateError::ReleaseCapExceeded))
    );
    ReleaseColTranche { amount: 1_000_000 }
        .execute(&mut store, &ctx(GOVERNANCE, 10_000))
        .unwrap();
    assert_eq!(
        ReleaseColTranche { amount: 1 }.execute(&mut store, &ctx(GOVERNANCE, 20_000)),
        Err(ActionError::State(StateError::ReleaseTooEarly))
    );

    RouteFees { amount: 10_000 }
        .execute(&mut store, &ctx(TRADER, 30_000))
        .unwrap();
    let fee_state = storage::get_fee_router_state(&store).unwrap();
    assert_eq!(fee_state.msrb_budget, 7_000);
    assert_eq!(fee_state.col_budget, 2_000);
    assert_eq!(fee_state.ops_budget, 1_000);
}

// ========================================
// Market lifecycle
// ========================================

#[test]
fn resolve_then_dispute_flow() {
    let mut store = seeded_store();
    create_market(&mut store);

    ResolveMarket {
        market_id: market_id(),
        outcome: 1,
        signature: vec![0xAA; 96],
    }
    .execute(&mut store, &ctx(GOVERNANCE, 900_000))
    .unwrap();
    assert_eq!(
        storage::get_market(&store, &market_id()).unwrap().status,
        MARKET_STATUS_RESOLVED
    );

    Dispute {
        market_id: market_id(),
        bond: 10_000,
        evidence: b"resolution contradicts the published feed".to_vec(),
    }
    .execute(&mut store, &ctx(TRADER, 910_000))
    .unwrap();
    let market = storage::get_market(&store, &market_id()).unwrap();
    assert_eq!(market.status, MARKET_STATUS_DISPUTED);
    assert_eq!(market.resolved_outcome, 1);
}

// ========================================
// Wire dispatch
// ========================================

#[test]
fn action_payload_dispatch_round_trip() {
    let actions = vec![
        ActionPayload::Transfer(Transfer {
            to: TRADER,
            value: 5,
            memo: b"m".to_vec(),
        }),
        ActionPayload::CreateMarket(CreateMarket {
            market_id: market_id(),
            question: b"q".to_vec(),
            outcomes: 2,
            resolution_time: 1,
            creator_bond: 1,
        }),
        ActionPayload::CommitOrder(CommitOrder {
            market_id: market_id(),
            window_id: 1,
            envelope: vec![1],
            commitment: vec![2],
        }),
        ActionPayload::RevealBatch(RevealBatch {
            market_id: market_id(),
            window_id: 1,
            decryption_share: vec![3],
            validator_index: 0,
        }),
        ActionPayload::ClearBatch(ClearBatch {
            market_id: market_id(),
            window_id: 1,
            clear_price: 1,
            total_volume: 1,
            fills_hash: vec![0; 32],
        }),
        ActionPayload::SubmitBatchProof(SubmitBatchProof {
            market_id: market_id(),
            window_id: 1,
            window_close_at_ms: 5_000,
            proof_type: PROOF_TYPE_GROTH16,
            public_inputs_hash: vec![0; 32],
            fills_hash: vec![0; 32],
            proof: vec![1, 2, 3],
        }),
        ActionPayload::MintVai(MintVai {
            to: TRADER,
            amount: 1,
        }),
        ActionPayload::SwapExactIn(SwapExactIn {
            asset_in: 0,
            asset_out: 1,
            amount_in: 1,
            min_amount_out: 0,
        }),
    ];

    for action in actions {
        let bytes = action.encode();
        assert_eq!(bytes[0], action.type_id());
        let decoded = ActionPayload::decode(&bytes).unwrap();
        assert_eq!(decoded, action);
    }
}

#[test]
fn executes_through_payload_dispatch() {
    let mut store = seeded_store();
    let payload = ActionPayload::decode(
        &Transfer {
            to: PROVER,
            value: 250,
            memo: Vec::new(),
        }
        .encode(),
    )
    .unwrap();

    let keys = payload.state_keys(&TRADER);
    assert_eq!(keys.len(), 2);

    payload.execute(&mut store, &ctx(TRADER, 1_000)).unwrap();
    assert_eq!(storage::get_balance(&store, &PROVER).unwrap(), 250);
}

#[test]
fn unknown_type_id_rejected() {
    assert!(ActionPayload::decode(&[0xEE, 0, 0]).is_err());
    assert!(ActionPayload::decode(&[]).is_err());
}
