//! # Key Layout
//!
//! | Table | Key | Value |
//! |-------|-----|-------|
//! | accounts | `account/` address(20) field-tag(1) | bincode `AccountFieldValue` |
//! | validators | `validator/` address(20) | bincode `ValidatorRecord` |
//! | commission history | `commission/` address(20) height(8, BE) | bincode `u16` |
//! | stakes | `stake/` validator(20) staker(20) | bincode `u64` |
//! | subscriptions | `subscription/` address(20) | bincode `SubscriptionRecord` |
//! | retry queue | `retry/` public-key(32) | bincode `RetryEntry` |
//! | indexed blocks | `block/` height(8, BE) | JSON `Block` |
//!
//! Heights are big-endian so byte order equals numeric order and "latest
//! entry below height" is a reverse seek.

use shared_types::{AccountField, Address, PublicKey, ADDRESS_LENGTH};

use super::errors::StoreError;

pub const ACCOUNT: &[u8] = b"account/";
pub const VALIDATOR: &[u8] = b"validator/";
pub const COMMISSION: &[u8] = b"commission/";
pub const STAKE: &[u8] = b"stake/";
pub const SUBSCRIPTION: &[u8] = b"subscription/";
pub const RETRY: &[u8] = b"retry/";
pub const BLOCK: &[u8] = b"block/";

fn join(parts: &[&[u8]]) -> Vec<u8> {
    let mut key = Vec::with_capacity(parts.iter().map(|p| p.len()).sum());
    for part in parts {
        key.extend_from_slice(part);
    }
    key
}

pub fn account_prefix(address: &Address) -> Vec<u8> {
    join(&[ACCOUNT, address.as_bytes()])
}

pub fn account_field(address: &Address, field: AccountField) -> Vec<u8> {
    join(&[ACCOUNT, address.as_bytes(), &[field.tag()]])
}

/// Split an account key into its address and field.
pub fn parse_account_field(key: &[u8]) -> Result<(Address, AccountField), StoreError> {
    let rest = strip(key, ACCOUNT)?;
    if rest.len() != ADDRESS_LENGTH + 1 {
        return Err(corrupt("account", key));
    }
    let address = Address::from_slice(&rest[..ADDRESS_LENGTH])?;
    let field =
        AccountField::from_tag(rest[ADDRESS_LENGTH]).ok_or_else(|| corrupt("account", key))?;
    Ok((address, field))
}

pub fn validator(address: &Address) -> Vec<u8> {
    join(&[VALIDATOR, address.as_bytes()])
}

pub fn commission_prefix(address: &Address) -> Vec<u8> {
    join(&[COMMISSION, address.as_bytes()])
}

pub fn commission(address: &Address, height: u64) -> Vec<u8> {
    join(&[COMMISSION, address.as_bytes(), &height.to_be_bytes()])
}

pub fn parse_commission(key: &[u8]) -> Result<(Address, u64), StoreError> {
    let rest = strip(key, COMMISSION)?;
    if rest.len() != ADDRESS_LENGTH + 8 {
        return Err(corrupt("commission", key));
    }
    let address = Address::from_slice(&rest[..ADDRESS_LENGTH])?;
    Ok((address, be_u64(&rest[ADDRESS_LENGTH..])))
}

pub fn stake_prefix(validator: &Address) -> Vec<u8> {
    join(&[STAKE, validator.as_bytes()])
}

pub fn stake(staker: &Address, validator: &Address) -> Vec<u8> {
    join(&[STAKE, validator.as_bytes(), staker.as_bytes()])
}

/// Returns `(staker, validator)`.
pub fn parse_stake(key: &[u8]) -> Result<(Address, Address), StoreError> {
    let rest = strip(key, STAKE)?;
    if rest.len() != 2 * ADDRESS_LENGTH {
        return Err(corrupt("stake", key));
    }
    let validator = Address::from_slice(&rest[..ADDRESS_LENGTH])?;
    let staker = Address::from_slice(&rest[ADDRESS_LENGTH..])?;
    Ok((staker, validator))
}

pub fn subscription(address: &Address) -> Vec<u8> {
    join(&[SUBSCRIPTION, address.as_bytes()])
}

pub fn retry(public_key: &PublicKey) -> Vec<u8> {
    join(&[RETRY, public_key.as_bytes()])
}

pub fn block(height: u64) -> Vec<u8> {
    join(&[BLOCK, &height.to_be_bytes()])
}

pub fn parse_block(key: &[u8]) -> Result<u64, StoreError> {
    let rest = strip(key, BLOCK)?;
    if rest.len() != 8 {
        return Err(corrupt("block", key));
    }
    Ok(be_u64(rest))
}

/// Smallest key greater than every key starting with `prefix`.
pub fn prefix_end(prefix: &[u8]) -> Vec<u8> {
    let mut end = prefix.to_vec();
    while let Some(last) = end.pop() {
        if last < u8::MAX {
            end.push(last + 1);
            return end;
        }
    }
    // All 0xff: only reachable for synthetic prefixes.
    let mut end = prefix.to_vec();
    end.push(u8::MAX);
    end
}

fn strip<'k>(key: &'k [u8], prefix: &[u8]) -> Result<&'k [u8], StoreError> {
    key.strip_prefix(prefix).ok_or_else(|| corrupt("prefix", key))
}

fn be_u64(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[..8]);
    u64::from_be_bytes(buf)
}

fn corrupt(table: &str, key: &[u8]) -> StoreError {
    StoreError::Corruption {
        message: format!("malformed {} key {:?}", table, key),
    }
}
