//! Wallet ledger service.
//!
//! Sole authority for reading and mutating member balances and appending
//! transaction records. Every mutation runs its read-check-write sequence
//! inside one database transaction; the insufficient-funds check is a
//! conditional UPDATE so two racing debits can never both pass against a
//! stale balance.

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite, Transaction};
use std::time::Duration;
use tracing::{info, warn};

use crate::database::db::queries;
use crate::database::models::{ExpenseCategory, IncomeCategory, TransactionKind, WalletTransaction};

pub mod error;
pub mod money;

pub use error::{LedgerError, LedgerResult};

pub const PAGE_SIZE: u32 = 50;

// Bounded retries for transactions that lose a lock race; anything past
// this surfaces as LedgerError::Persistence.
const MAX_TX_RETRIES: u32 = 3;

/// Balance snapshot for one member.
#[derive(Debug, Clone, Serialize)]
pub struct MemberBalance {
    pub member_id: i64,
    pub member_name: String,
    pub balance: Decimal,
}

/// A committed credit or debit: the appended record plus the new balance.
#[derive(Debug, Serialize)]
pub struct PostedTransaction {
    pub transaction: WalletTransaction,
    pub balance: Decimal,
}

/// A committed transfer: the single dual-reference record plus both new balances.
#[derive(Debug, Serialize)]
pub struct PostedTransfer {
    pub transaction: WalletTransaction,
    pub from_balance: Decimal,
    pub to_balance: Decimal,
}

/// Filter for transaction history reads. A pure function of its fields and
/// `page`; no cursor state is kept between calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionFilter {
    pub member_id: Option<i64>,
    pub kind: Option<TransactionKind>,
    pub page: u32,
}

/// Add funds to a member's balance and append one `credit` record.
pub async fn credit(
    pool: &Pool<Sqlite>,
    family_id: i64,
    member_id: i64,
    amount: Decimal,
    category: IncomeCategory,
    description: Option<&str>,
) -> LedgerResult<PostedTransaction> {
    let amount_cents = money::to_cents(amount)?;

    let mut attempt = 0;
    loop {
        let res = credit_once(pool, family_id, member_id, amount_cents, category, description).await;
        match res {
            Err(LedgerError::Persistence(ref e)) if attempt < MAX_TX_RETRIES && is_busy(e) => {
                attempt += 1;
                warn!(family_id, member_id, attempt, "credit hit a lock conflict, retrying");
                tokio::time::sleep(retry_delay(attempt)).await;
            }
            other => {
                if other.is_ok() {
                    info!(family_id, member_id, amount = %amount, "credit posted");
                }
                return other;
            }
        }
    }
}

/// Remove funds from a member's balance and append one `debit` record.
/// Fails with `InsufficientBalance` rather than letting the balance go negative.
pub async fn debit(
    pool: &Pool<Sqlite>,
    family_id: i64,
    member_id: i64,
    amount: Decimal,
    category: ExpenseCategory,
    description: Option<&str>,
) -> LedgerResult<PostedTransaction> {
    let amount_cents = money::to_cents(amount)?;

    let mut attempt = 0;
    loop {
        let res = debit_once(pool, family_id, member_id, amount_cents, category, description).await;
        match res {
            Err(LedgerError::Persistence(ref e)) if attempt < MAX_TX_RETRIES && is_busy(e) => {
                attempt += 1;
                warn!(family_id, member_id, attempt, "debit hit a lock conflict, retrying");
                tokio::time::sleep(retry_delay(attempt)).await;
            }
            other => {
                if other.is_ok() {
                    info!(family_id, member_id, amount = %amount, "debit posted");
                }
                return other;
            }
        }
    }
}

/// Move funds between two members of the same family, atomically: debit leg,
/// credit leg and exactly one `transfer` record, or nothing at all.
pub async fn transfer(
    pool: &Pool<Sqlite>,
    family_id: i64,
    from_member_id: i64,
    to_member_id: i64,
    amount: Decimal,
    description: Option<&str>,
) -> LedgerResult<PostedTransfer> {
    if from_member_id == to_member_id {
        return Err(LedgerError::SameMember);
    }
    let amount_cents = money::to_cents(amount)?;

    let mut attempt = 0;
    loop {
        let res = transfer_once(
            pool,
            family_id,
            from_member_id,
            to_member_id,
            amount_cents,
            description,
        )
        .await;
        match res {
            Err(LedgerError::Persistence(ref e)) if attempt < MAX_TX_RETRIES && is_busy(e) => {
                attempt += 1;
                warn!(
                    family_id,
                    from_member_id, to_member_id, attempt, "transfer hit a lock conflict, retrying"
                );
                tokio::time::sleep(retry_delay(attempt)).await;
            }
            other => {
                if other.is_ok() {
                    info!(family_id, from_member_id, to_member_id, amount = %amount, "transfer posted");
                }
                return other;
            }
        }
    }
}

/// Current balance of one member. Reads committed state only.
pub async fn get_balance(pool: &Pool<Sqlite>, family_id: i64, member_id: i64) -> LedgerResult<Decimal> {
    let member = queries::get_member_by_id(pool, family_id, member_id)
        .await?
        .ok_or(LedgerError::MemberNotFound { member_id })?;
    Ok(member.balance)
}

/// Balance snapshot of every member in the family, ordered by member id.
pub async fn list_balances(pool: &Pool<Sqlite>, family_id: i64) -> LedgerResult<Vec<MemberBalance>> {
    let members = queries::get_all_members(pool, family_id).await?;
    Ok(members
        .into_iter()
        .map(|m| MemberBalance {
            member_id: m.member_id,
            member_name: m.member_name,
            balance: m.balance,
        })
        .collect())
}

/// Transaction history, most recent first, ties broken by id descending.
/// A member filter matches the member on any leg of a transfer.
pub async fn list_transactions(
    pool: &Pool<Sqlite>,
    family_id: i64,
    filter: TransactionFilter,
) -> LedgerResult<Vec<WalletTransaction>> {
    let mut qb = sqlx::QueryBuilder::<Sqlite>::new(
        "SELECT transaction_id, family_id, kind, amount_cents, category, description, \
         member_id, from_member_id, to_member_id, trans_created_at \
         FROM wallet_transactions WHERE family_id = ",
    );
    qb.push_bind(family_id);

    if let Some(member_id) = filter.member_id {
        qb.push(" AND (member_id = ")
            .push_bind(member_id)
            .push(" OR from_member_id = ")
            .push_bind(member_id)
            .push(" OR to_member_id = ")
            .push_bind(member_id)
            .push(")");
    }
    if let Some(kind) = filter.kind {
        qb.push(" AND kind = ").push_bind(kind.as_str());
    }

    qb.push(" ORDER BY trans_created_at DESC, transaction_id DESC LIMIT ")
        .push_bind(PAGE_SIZE as i64)
        .push(" OFFSET ")
        .push_bind(filter.page as i64 * PAGE_SIZE as i64);

    let rows = qb.build().fetch_all(pool).await?;
    rows.iter().map(map_transaction_row).collect()
}

async fn credit_once(
    pool: &Pool<Sqlite>,
    family_id: i64,
    member_id: i64,
    amount_cents: i64,
    category: IncomeCategory,
    description: Option<&str>,
) -> LedgerResult<PostedTransaction> {
    let mut tx = pool.begin().await?;

    let updated = sqlx::query(
        r#"
        UPDATE members
        SET balance_cents = balance_cents + ?
        WHERE member_id = ? AND family_id = ?
        "#,
    )
    .bind(amount_cents)
    .bind(member_id)
    .bind(family_id)
    .execute(&mut *tx)
    .await?;

    if updated.rows_affected() == 0 {
        // dropping tx rolls everything back
        return Err(LedgerError::MemberNotFound { member_id });
    }

    let row = sqlx::query(
        r#"
        INSERT INTO wallet_transactions (
            family_id, kind, amount_cents, category,
            description, member_id, trans_created_at
        )
        VALUES (?, 'credit', ?, ?, ?, ?, datetime('now'))
        RETURNING transaction_id, family_id, kind, amount_cents, category,
            description, member_id, from_member_id, to_member_id, trans_created_at
        "#,
    )
    .bind(family_id)
    .bind(amount_cents)
    .bind(category.as_str())
    .bind(description)
    .bind(member_id)
    .fetch_one(&mut *tx)
    .await?;
    let transaction = map_transaction_row(&row)?;

    let balance_cents = fetch_balance_cents(&mut tx, family_id, member_id).await?;

    tx.commit().await?;

    Ok(PostedTransaction {
        transaction,
        balance: money::from_cents(balance_cents),
    })
}

async fn debit_once(
    pool: &Pool<Sqlite>,
    family_id: i64,
    member_id: i64,
    amount_cents: i64,
    category: ExpenseCategory,
    description: Option<&str>,
) -> LedgerResult<PostedTransaction> {
    let mut tx = pool.begin().await?;

    // Check-and-subtract in a single statement: the balance guard and the
    // write cannot be separated by a concurrent debit.
    let updated = sqlx::query(
        r#"
        UPDATE members
        SET balance_cents = balance_cents - ?
        WHERE member_id = ? AND family_id = ? AND balance_cents >= ?
        "#,
    )
    .bind(amount_cents)
    .bind(member_id)
    .bind(family_id)
    .bind(amount_cents)
    .execute(&mut *tx)
    .await?;

    if updated.rows_affected() == 0 {
        return Err(leg_failure(&mut tx, family_id, member_id).await?);
    }

    let row = sqlx::query(
        r#"
        INSERT INTO wallet_transactions (
            family_id, kind, amount_cents, category,
            description, member_id, trans_created_at
        )
        VALUES (?, 'debit', ?, ?, ?, ?, datetime('now'))
        RETURNING transaction_id, family_id, kind, amount_cents, category,
            description, member_id, from_member_id, to_member_id, trans_created_at
        "#,
    )
    .bind(family_id)
    .bind(amount_cents)
    .bind(category.as_str())
    .bind(description)
    .bind(member_id)
    .fetch_one(&mut *tx)
    .await?;
    let transaction = map_transaction_row(&row)?;

    let balance_cents = fetch_balance_cents(&mut tx, family_id, member_id).await?;

    tx.commit().await?;

    Ok(PostedTransaction {
        transaction,
        balance: money::from_cents(balance_cents),
    })
}

async fn transfer_once(
    pool: &Pool<Sqlite>,
    family_id: i64,
    from_member_id: i64,
    to_member_id: i64,
    amount_cents: i64,
    description: Option<&str>,
) -> LedgerResult<PostedTransfer> {
    let mut tx = pool.begin().await?;

    // Apply both legs in ascending member-id order so concurrent transfers
    // between the same pair acquire rows in a fixed global order.
    let legs = if from_member_id < to_member_id {
        [(from_member_id, -amount_cents), (to_member_id, amount_cents)]
    } else {
        [(to_member_id, amount_cents), (from_member_id, -amount_cents)]
    };

    for (member_id, delta) in legs {
        let updated = sqlx::query(
            r#"
            UPDATE members
            SET balance_cents = balance_cents + ?
            WHERE member_id = ? AND family_id = ? AND balance_cents + ? >= 0
            "#,
        )
        .bind(delta)
        .bind(member_id)
        .bind(family_id)
        .bind(delta)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            // missing member, or the debit leg would go negative
            return Err(leg_failure(&mut tx, family_id, member_id).await?);
        }
    }

    let row = sqlx::query(
        r#"
        INSERT INTO wallet_transactions (
            family_id, kind, amount_cents, description,
            from_member_id, to_member_id, trans_created_at
        )
        VALUES (?, 'transfer', ?, ?, ?, ?, datetime('now'))
        RETURNING transaction_id, family_id, kind, amount_cents, category,
            description, member_id, from_member_id, to_member_id, trans_created_at
        "#,
    )
    .bind(family_id)
    .bind(amount_cents)
    .bind(description)
    .bind(from_member_id)
    .bind(to_member_id)
    .fetch_one(&mut *tx)
    .await?;
    let transaction = map_transaction_row(&row)?;

    let from_cents = fetch_balance_cents(&mut tx, family_id, from_member_id).await?;
    let to_cents = fetch_balance_cents(&mut tx, family_id, to_member_id).await?;

    tx.commit().await?;

    Ok(PostedTransfer {
        transaction,
        from_balance: money::from_cents(from_cents),
        to_balance: money::from_cents(to_cents),
    })
}

/// Why did a conditional balance UPDATE touch no row: unknown member, or
/// a debit past the available balance.
async fn leg_failure(
    tx: &mut Transaction<'_, Sqlite>,
    family_id: i64,
    member_id: i64,
) -> Result<LedgerError, sqlx::Error> {
    let row = sqlx::query("SELECT balance_cents FROM members WHERE member_id = ? AND family_id = ?")
        .bind(member_id)
        .bind(family_id)
        .fetch_optional(&mut **tx)
        .await?;

    Ok(match row {
        None => LedgerError::MemberNotFound { member_id },
        Some(row) => LedgerError::InsufficientBalance {
            member_id,
            available: money::from_cents(row.get("balance_cents")),
        },
    })
}

async fn fetch_balance_cents(
    tx: &mut Transaction<'_, Sqlite>,
    family_id: i64,
    member_id: i64,
) -> Result<i64, sqlx::Error> {
    let row = sqlx::query("SELECT balance_cents FROM members WHERE member_id = ? AND family_id = ?")
        .bind(member_id)
        .bind(family_id)
        .fetch_one(&mut **tx)
        .await?;
    Ok(row.get("balance_cents"))
}

fn map_transaction_row(row: &SqliteRow) -> LedgerResult<WalletTransaction> {
    let kind_text: String = row.get("kind");
    let kind = kind_text
        .parse::<TransactionKind>()
        .map_err(|e| LedgerError::Persistence(sqlx::Error::Decode(e.into())))?;
    let amount_cents: i64 = row.get("amount_cents");

    Ok(WalletTransaction {
        transaction_id: row.get("transaction_id"),
        family_id: row.get("family_id"),
        kind,
        amount: money::from_cents(amount_cents),
        category: row.get("category"),
        description: row.get("description"),
        member_id: row.get("member_id"),
        from_member_id: row.get("from_member_id"),
        to_member_id: row.get("to_member_id"),
        trans_created_at: row.get("trans_created_at"),
    })
}

fn is_busy(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => {
            let msg = db.message();
            msg.contains("locked") || msg.contains("busy")
        }
        _ => false,
    }
}

fn retry_delay(attempt: u32) -> Duration {
    Duration::from_millis(50 * u64::from(attempt))
}
