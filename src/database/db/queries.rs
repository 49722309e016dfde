use sqlx::{Pool, Row, Sqlite};

use crate::database::models::Member;
use crate::ledger::money;

/*
Member administration queries. Balance-affecting writes live in the ledger
module; everything here either creates/removes members or reads them.
Every statement filters on family_id, the tenant boundary.
 */

// Create member. The wallet starts empty; funds arrive through credits.
pub async fn create_member(
    pool: &Pool<Sqlite>,
    family_id: i64,
    member_name: &str,
) -> Result<i64, sqlx::Error> {
    let row = sqlx::query(
        r#"
        INSERT INTO members (family_id, member_name, balance_cents, member_created_at)
        VALUES (?, ?, 0, datetime('now'))
        RETURNING member_id
        "#,
    )
    .bind(family_id)
    .bind(member_name)
    .fetch_one(pool)
    .await?;

    Ok(row.get("member_id"))
}

// Get member by id, scoped to the family. None when the id does not
// resolve inside the scope.
pub async fn get_member_by_id(
    pool: &Pool<Sqlite>,
    family_id: i64,
    member_id: i64,
) -> Result<Option<Member>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT
            member_id,
            family_id,
            member_name,
            balance_cents,
            member_created_at
        FROM members
        WHERE member_id = ? AND family_id = ?
        "#,
    )
    .bind(member_id)
    .bind(family_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| map_member_row(&row)))
}

// Get all members of one family
pub async fn get_all_members(
    pool: &Pool<Sqlite>,
    family_id: i64,
) -> Result<Vec<Member>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT
            member_id,
            family_id,
            member_name,
            balance_cents,
            member_created_at
        FROM members
        WHERE family_id = ?
        ORDER BY member_id ASC
        "#,
    )
    .bind(family_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(map_member_row).collect())
}

// Delete member. Wallet transactions referencing the member are retained;
// the ledger history outlives the member row.
pub async fn delete_member(
    pool: &Pool<Sqlite>,
    family_id: i64,
    member_id: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        DELETE FROM members
        WHERE member_id = ? AND family_id = ?
        "#,
    )
    .bind(member_id)
    .bind(family_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

fn map_member_row(row: &sqlx::sqlite::SqliteRow) -> Member {
    Member {
        member_id: row.get("member_id"),
        family_id: row.get("family_id"),
        member_name: row.get("member_name"),
        balance: money::from_cents(row.get("balance_cents")),
        member_created_at: row.get("member_created_at"),
    }
}
