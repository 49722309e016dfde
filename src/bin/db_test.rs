use dotenvy::dotenv;
use household_wallet::database::db::connection;
use household_wallet::database::db::queries;
use household_wallet::database::models::{ExpenseCategory, IncomeCategory, TransactionKind};
use household_wallet::ledger::{self, LedgerError, TransactionFilter};

use rust_decimal::Decimal;
use std::str::FromStr;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    /* ==========Smoke test against a throwaway database========== */
    let _ = std::fs::remove_file("./wallet_smoke.db");
    let pool = connection::connect("sqlite://./wallet_smoke.db").await?;

    connection::run_migrations(&pool).await?;
    println!("Migrations ran successfully!");

    let family_id = 1;

    // ----------------------------------------------------
    // TEST: CREATE MEMBERS
    // ----------------------------------------------------
    println!("\n--- Testing: create_member ---");
    let alice_id = queries::create_member(&pool, family_id, "Alice").await?;
    let bob_id = queries::create_member(&pool, family_id, "Bob").await?;
    println!("   > Members created: {} {}", alice_id, bob_id);
    assert!(alice_id > 0, "Failed to create member, ID invalid.");

    let alice = queries::get_member_by_id(&pool, family_id, alice_id)
        .await?
        .expect("Alice should exist");
    println!("   > Acquired member: {:?}", alice);
    assert_eq!(alice.balance, Decimal::from_str("0.00").unwrap(), "Initial balance is not zero!");

    // ----------------------------------------------------
    // TEST: CREDIT
    // ----------------------------------------------------
    println!("\n--- Testing: credit ---");
    let posted = ledger::credit(
        &pool,
        family_id,
        alice_id,
        Decimal::from_str("100.00").unwrap(),
        IncomeCategory::Allowance,
        Some("weekly allowance"),
    )
    .await?;
    println!("   > Credit posted: {:?}", posted.transaction.transaction_id);
    assert_eq!(posted.balance, Decimal::from_str("100.00").unwrap());

    // ----------------------------------------------------
    // TEST: DEBIT + INSUFFICIENT BALANCE
    // ----------------------------------------------------
    println!("\n--- Testing: debit ---");
    let posted = ledger::debit(
        &pool,
        family_id,
        alice_id,
        Decimal::from_str("30.00").unwrap(),
        ExpenseCategory::Purchase,
        Some("snacks"),
    )
    .await?;
    println!("   > Debit posted, new balance: {}", posted.balance);
    assert_eq!(posted.balance, Decimal::from_str("70.00").unwrap());

    let over = ledger::debit(
        &pool,
        family_id,
        alice_id,
        Decimal::from_str("500.00").unwrap(),
        ExpenseCategory::Purchase,
        None,
    )
    .await;
    assert!(
        matches!(over, Err(LedgerError::InsufficientBalance { .. })),
        "Overdraft was not rejected!"
    );
    println!("   > Overdraft rejected as expected");

    // ----------------------------------------------------
    // TEST: TRANSFER
    // ----------------------------------------------------
    println!("\n--- Testing: transfer ---");
    let posted = ledger::transfer(
        &pool,
        family_id,
        alice_id,
        bob_id,
        Decimal::from_str("20.00").unwrap(),
        Some("pocket money"),
    )
    .await?;
    println!(
        "   > Transfer posted: from_balance={} to_balance={}",
        posted.from_balance, posted.to_balance
    );
    assert_eq!(posted.from_balance, Decimal::from_str("50.00").unwrap());
    assert_eq!(posted.to_balance, Decimal::from_str("20.00").unwrap());

    // ----------------------------------------------------
    // TEST: BALANCES + HISTORY
    // ----------------------------------------------------
    println!("\n--- Testing: list_balances ---");
    let balances = ledger::list_balances(&pool, family_id).await?;
    println!("   > Balances: {:?}", balances);
    assert_eq!(balances.len(), 2);

    println!("\n--- Testing: list_transactions ---");
    let history = ledger::list_transactions(&pool, family_id, TransactionFilter::default()).await?;
    println!("   > {} transactions recorded", history.len());
    assert_eq!(history.len(), 3);
    assert_eq!(history[0].kind, TransactionKind::Transfer);

    println!("\nAll smoke checks passed!");
    Ok(())
}
