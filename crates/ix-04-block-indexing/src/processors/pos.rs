//! Proof-of-stake commands.

use ix_02_index_store::{IndexReader, IndexWriter, UnitOfWork};
use serde::Deserialize;
use serde_with::{serde_as, DisplayFromStr};
use shared_types::{
    AccountField, AccountPatch, Address, CommissionEntry, HexBytes, PublicKey, ValidatorRecord,
    MAX_COMMISSION,
};
use tracing::debug;

use super::params;
use crate::domain::{ProcessorContext, ProcessorError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterValidatorParams {
    name: String,
    bls_key: HexBytes,
    proof_of_possession: HexBytes,
    generator_key: PublicKey,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChangeCommissionParams {
    new_commission: u16,
}

#[serde_as]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StakeDelta {
    validator_address: Address,
    /// Negative amounts unstake.
    #[serde_as(as = "DisplayFromStr")]
    amount: i64,
}

#[derive(Debug, Deserialize)]
struct StakeParams {
    stakes: Vec<StakeDelta>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateGeneratorKeyParams {
    generator_key: PublicKey,
}

/// Fields `registerValidator` owns on the account row.
const VALIDATOR_ACCOUNT_FIELDS: [AccountField; 4] = [
    AccountField::Name,
    AccountField::BlsKey,
    AccountField::ProofOfPossession,
    AccountField::GeneratorKey,
];

// =============================================================================
// registerValidator
// =============================================================================

/// Create the validator, mark its account and open its commission history
/// at the maximum rate.
pub fn register_validator(
    ctx: &ProcessorContext<'_>,
    uow: &mut UnitOfWork<'_>,
) -> Result<(), ProcessorError> {
    let p: RegisterValidatorParams = params(ctx)?;
    let address = ctx.sender();
    if uow.validator(&address)?.is_some() {
        return Err(ProcessorError::AlreadyExists {
            kind: "validator",
            address,
        });
    }

    uow.put_validator(&ValidatorRecord {
        address,
        name: p.name.clone(),
        bls_key: p.bls_key.clone(),
        proof_of_possession: p.proof_of_possession.clone(),
        generator_key: p.generator_key,
        registration_height: ctx.height(),
        total_commission: 0,
        total_self_stake_rewards: 0,
        generator_key_history: Vec::new(),
    })?;
    uow.apply_account_patch(
        &address,
        &AccountPatch::new()
            .name(p.name.clone())
            .is_validator(true)
            .bls_key(p.bls_key)
            .proof_of_possession(p.proof_of_possession)
            .generator_key(p.generator_key),
    )?;
    uow.put_commission(&CommissionEntry {
        address,
        height: ctx.height(),
        commission: MAX_COMMISSION,
    })?;

    debug!(address = %address, name = %p.name, height = ctx.height(), "Validator registered");
    Ok(())
}

pub fn revert_register_validator(
    ctx: &ProcessorContext<'_>,
    uow: &mut UnitOfWork<'_>,
) -> Result<(), ProcessorError> {
    let address = ctx.sender();
    uow.delete_validator(&address)?;
    uow.delete_commission(&address, ctx.height())?;

    let mut patch = AccountPatch::new().is_validator(false);
    for field in VALIDATOR_ACCOUNT_FIELDS {
        patch = patch.clear(field);
    }
    uow.apply_account_patch(&address, &patch)?;
    Ok(())
}

// =============================================================================
// changeCommission
// =============================================================================

pub fn change_commission(
    ctx: &ProcessorContext<'_>,
    uow: &mut UnitOfWork<'_>,
) -> Result<(), ProcessorError> {
    let p: ChangeCommissionParams = params(ctx)?;
    if p.new_commission > MAX_COMMISSION {
        return Err(ProcessorError::InvalidParams {
            command: ctx.transaction.module_command(),
            reason: format!("commission {} exceeds {}", p.new_commission, MAX_COMMISSION),
        });
    }
    uow.put_commission(&CommissionEntry {
        address: ctx.sender(),
        height: ctx.height(),
        commission: p.new_commission,
    })?;
    Ok(())
}

/// Remove the entry at exactly this height; earlier history stays.
pub fn revert_change_commission(
    ctx: &ProcessorContext<'_>,
    uow: &mut UnitOfWork<'_>,
) -> Result<(), ProcessorError> {
    uow.delete_commission(&ctx.sender(), ctx.height())?;
    Ok(())
}

// =============================================================================
// stake
// =============================================================================

fn adjust_stake(
    uow: &mut UnitOfWork<'_>,
    staker: &Address,
    validator: &Address,
    delta: i64,
) -> Result<(), ProcessorError> {
    let current = uow.stake(staker, validator)?.map_or(0, |s| s.amount);
    let next = i128::from(current) + i128::from(delta);
    if next < 0 {
        return Err(ProcessorError::StakeUnderflow {
            staker: *staker,
            validator: *validator,
        });
    }
    let next = u64::try_from(next).map_err(|_| ProcessorError::Overflow("stake amount"))?;
    uow.set_stake(staker, validator, next)?;
    Ok(())
}

pub fn stake(ctx: &ProcessorContext<'_>, uow: &mut UnitOfWork<'_>) -> Result<(), ProcessorError> {
    let p: StakeParams = params(ctx)?;
    let staker = ctx.sender();
    for delta in &p.stakes {
        adjust_stake(uow, &staker, &delta.validator_address, delta.amount)?;
    }
    Ok(())
}

/// Negated deltas, last first.
pub fn revert_stake(
    ctx: &ProcessorContext<'_>,
    uow: &mut UnitOfWork<'_>,
) -> Result<(), ProcessorError> {
    let p: StakeParams = params(ctx)?;
    let staker = ctx.sender();
    for delta in p.stakes.iter().rev() {
        let negated = delta
            .amount
            .checked_neg()
            .ok_or(ProcessorError::Overflow("stake delta"))?;
        adjust_stake(uow, &staker, &delta.validator_address, negated)?;
    }
    Ok(())
}

// =============================================================================
// updateGeneratorKey
// =============================================================================

fn existing_validator(
    uow: &UnitOfWork<'_>,
    address: Address,
) -> Result<ValidatorRecord, ProcessorError> {
    uow.validator(&address)?.ok_or(ProcessorError::MissingRecord {
        kind: "validator",
        address,
    })
}

pub fn update_generator_key(
    ctx: &ProcessorContext<'_>,
    uow: &mut UnitOfWork<'_>,
) -> Result<(), ProcessorError> {
    let p: UpdateGeneratorKeyParams = params(ctx)?;
    let mut validator = existing_validator(uow, ctx.sender())?;

    validator.generator_key_history.push(validator.generator_key);
    validator.generator_key = p.generator_key;
    uow.put_validator(&validator)?;
    uow.apply_account_patch(
        &validator.address,
        &AccountPatch::new().generator_key(p.generator_key),
    )?;
    Ok(())
}

/// Restore the key that was replaced.
pub fn revert_update_generator_key(
    ctx: &ProcessorContext<'_>,
    uow: &mut UnitOfWork<'_>,
) -> Result<(), ProcessorError> {
    let mut validator = existing_validator(uow, ctx.sender())?;
    let previous = validator
        .generator_key_history
        .pop()
        .ok_or(ProcessorError::MissingRecord {
            kind: "generator key history",
            address: validator.address,
        })?;

    validator.generator_key = previous;
    uow.put_validator(&validator)?;
    uow.apply_account_patch(&validator.address, &AccountPatch::new().generator_key(previous))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processors::test_support::{assert_inverse, header, run, transaction};
    use ix_02_index_store::InMemoryKVStore;
    use serde_json::json;

    const ALICE: PublicKey = PublicKey([0x11; 32]);
    const BOB: PublicKey = PublicKey([0x22; 32]);

    fn registration(sender: PublicKey, name: &str) -> shared_types::Transaction {
        transaction(
            sender,
            "pos",
            "registerValidator",
            json!({
                "name": name,
                "blsKey": "aa".repeat(48),
                "proofOfPossession": "bb".repeat(96),
                "generatorKey": "cc".repeat(32),
            }),
        )
    }

    fn registered(store: &InMemoryKVStore, sender: PublicKey, height: u64) {
        run(store, register_validator, &header(height), &registration(sender, "alice")).unwrap();
    }

    #[test]
    fn test_register_validator_writes_every_table() {
        let store = InMemoryKVStore::new();
        registered(&store, ALICE, 7);

        let address = ALICE.address();
        let validator = store.validator(&address).unwrap().unwrap();
        assert_eq!(validator.name, "alice");
        assert_eq!(validator.registration_height, 7);

        let account = store.account(&address).unwrap().unwrap();
        assert!(account.is_validator);
        assert_eq!(account.generator_key, Some(validator.generator_key));
        assert_eq!(store.commission_at(&address, 7).unwrap(), Some(MAX_COMMISSION));
    }

    #[test]
    fn test_register_validator_inverse() {
        let store = InMemoryKVStore::new();
        assert_inverse(
            &store,
            register_validator,
            revert_register_validator,
            &header(7),
            &registration(ALICE, "alice"),
        );
    }

    #[test]
    fn test_register_validator_keeps_identity_fields() {
        let store = InMemoryKVStore::new();
        // Written by the account index before the block's unit of work.
        let uow_store: &dyn ix_02_index_store::KeyValueStore = &store;
        let mut uow = UnitOfWork::begin(uow_store);
        uow.apply_account_patch(&ALICE.address(), &AccountPatch::new().public_key(ALICE))
            .unwrap();
        uow.commit().unwrap();

        assert_inverse(
            &store,
            register_validator,
            revert_register_validator,
            &header(7),
            &registration(ALICE, "alice"),
        );
        assert_eq!(store.account(&ALICE.address()).unwrap().unwrap().public_key, Some(ALICE));
    }

    #[test]
    fn test_double_registration_rejected() {
        let store = InMemoryKVStore::new();
        registered(&store, ALICE, 7);
        let err = run(&store, register_validator, &header(8), &registration(ALICE, "again"))
            .unwrap_err();
        assert!(matches!(err, ProcessorError::AlreadyExists { kind: "validator", .. }));
    }

    #[test]
    fn test_change_commission_inverse_keeps_history() {
        let store = InMemoryKVStore::new();
        registered(&store, ALICE, 7);
        let tx = transaction(ALICE, "pos", "changeCommission", json!({ "newCommission": 1500 }));
        assert_inverse(&store, change_commission, revert_change_commission, &header(20), &tx);
        assert_eq!(store.commission_history(&ALICE.address()).unwrap().len(), 1);
    }

    #[test]
    fn test_change_commission_bounds() {
        let store = InMemoryKVStore::new();
        let tx = transaction(ALICE, "pos", "changeCommission", json!({ "newCommission": 10001 }));
        let err = run(&store, change_commission, &header(20), &tx).unwrap_err();
        assert!(matches!(err, ProcessorError::InvalidParams { .. }));
    }

    #[test]
    fn test_stake_inverse_with_mixed_deltas() {
        let store = InMemoryKVStore::new();
        let v1 = ALICE.address();
        let v2 = BOB.address();
        let setup = transaction(
            BOB,
            "pos",
            "stake",
            json!({ "stakes": [{ "validatorAddress": v1.to_string(), "amount": "500" }] }),
        );
        run(&store, stake, &header(3), &setup).unwrap();

        let tx = transaction(
            BOB,
            "pos",
            "stake",
            json!({ "stakes": [
                { "validatorAddress": v1.to_string(), "amount": "-500" },
                { "validatorAddress": v2.to_string(), "amount": "300" },
                { "validatorAddress": v2.to_string(), "amount": "-100" },
            ]}),
        );
        run(&store, stake, &header(4), &tx).unwrap();
        assert_eq!(store.stake(&BOB.address(), &v1).unwrap(), None);
        assert_eq!(store.stake(&BOB.address(), &v2).unwrap().unwrap().amount, 200);

        run(&store, revert_stake, &header(4), &tx).unwrap();
        assert_eq!(store.stake(&BOB.address(), &v1).unwrap().unwrap().amount, 500);
        assert_eq!(store.stake(&BOB.address(), &v2).unwrap(), None);

        assert_inverse(&store, stake, revert_stake, &header(4), &tx);
    }

    #[test]
    fn test_unstake_below_zero_fails() {
        let store = InMemoryKVStore::new();
        let tx = transaction(
            BOB,
            "pos",
            "stake",
            json!({
                "stakes": [{ "validatorAddress": ALICE.address().to_string(), "amount": "-1" }]
            }),
        );
        let err = run(&store, stake, &header(4), &tx).unwrap_err();
        assert!(matches!(err, ProcessorError::StakeUnderflow { .. }));
        assert!(store.is_empty());
    }

    #[test]
    fn test_update_generator_key_inverse() {
        let store = InMemoryKVStore::new();
        registered(&store, ALICE, 7);
        let tx = transaction(
            ALICE,
            "pos",
            "updateGeneratorKey",
            json!({ "generatorKey": "dd".repeat(32) }),
        );

        run(&store, update_generator_key, &header(9), &tx).unwrap();
        let validator = store.validator(&ALICE.address()).unwrap().unwrap();
        assert_eq!(validator.generator_key, PublicKey([0xdd; 32]));
        assert_eq!(validator.generator_key_history, vec![PublicKey([0xcc; 32])]);
        run(&store, revert_update_generator_key, &header(9), &tx).unwrap();

        assert_inverse(&store, update_generator_key, revert_update_generator_key, &header(9), &tx);
    }

    #[test]
    fn test_update_generator_key_requires_validator() {
        let store = InMemoryKVStore::new();
        let tx = transaction(
            BOB,
            "pos",
            "updateGeneratorKey",
            json!({ "generatorKey": "dd".repeat(32) }),
        );
        let err = run(&store, update_generator_key, &header(9), &tx).unwrap_err();
        assert!(matches!(err, ProcessorError::MissingRecord { kind: "validator", .. }));
    }

    #[test]
    fn test_malformed_params() {
        let store = InMemoryKVStore::new();
        let tx = transaction(ALICE, "pos", "stake", json!({ "stakes": "all of it" }));
        let err = run(&store, stake, &header(1), &tx).unwrap_err();
        assert!(matches!(
            err,
            ProcessorError::InvalidParams { ref command, .. } if command == "pos:stake"
        ));
    }
}
