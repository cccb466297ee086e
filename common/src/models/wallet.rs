//! Token balances, kept under their own `tokens:<id>` integer keys so
//! grants and spends go through the store's atomic INCRBY/DECRBY instead of
//! read-modify-write on the profile document.

use redis::AsyncCommands;

use crate::models::errors::DataError;

const BALANCE_PREFIX: &str = "tokens:";

/// Every account starts with this many tokens; reads of a missing key fall
/// back to it as well.
pub const DEFAULT_BALANCE: i64 = 69;

pub fn key(user_id: i64) -> String {
    format!("{}{}", BALANCE_PREFIX, user_id)
}

/// Seeds the balance key if it does not exist yet.
pub async fn init(conn: &mut impl AsyncCommands, user_id: i64) -> Result<(), DataError> {
    let _: bool = conn.set_nx(key(user_id), DEFAULT_BALANCE).await?;
    Ok(())
}

pub async fn balance(conn: &mut impl AsyncCommands, user_id: i64) -> Result<i64, DataError> {
    let value: Option<i64> = conn.get(key(user_id)).await?;
    Ok(value.unwrap_or(DEFAULT_BALANCE))
}

pub async fn set_balance(
    conn: &mut impl AsyncCommands,
    user_id: i64,
    value: i64,
) -> Result<(), DataError> {
    let _: () = conn.set(key(user_id), value).await?;
    Ok(())
}

/// Atomically adds `amount` tokens and returns the new balance.
pub async fn add(
    conn: &mut impl AsyncCommands,
    user_id: i64,
    amount: i64,
) -> Result<i64, DataError> {
    init(conn, user_id).await?;
    let new_balance: i64 = conn.incr(key(user_id), amount).await?;
    Ok(new_balance)
}

/// Spends one token. A decrement that would drive the balance negative is
/// undone and reported as `false`.
pub async fn spend_one(conn: &mut impl AsyncCommands, user_id: i64) -> Result<bool, DataError> {
    init(conn, user_id).await?;
    let remaining: i64 = conn.decr(key(user_id), 1).await?;
    if remaining < 0 {
        let _: i64 = conn.incr(key(user_id), 1).await?;
        return Ok(false);
    }
    Ok(true)
}
