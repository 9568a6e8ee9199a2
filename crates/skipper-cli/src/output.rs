//! Output formatting utilities.

use colored::Colorize;
use serde::Serialize;
use skipper_runtime::{Outcome, TxRecord};
use skipper_types::{Address, Coins};
use tabled::{Table, Tabled};

/// Format address for display, with its label when it has one.
pub fn format_address(addr: &Address, label: Option<&str>) -> String {
    match label {
        Some(name) => format!("{} ({})", name, addr.short()),
        None => addr.short(),
    }
}

/// Format a native or token amount with its decimals.
pub fn format_coins(value: &Coins) -> String {
    value.to_decimal_string()
}

/// Print success message.
pub fn print_success(msg: &str) {
    println!("{}", format!("✓ {}", msg).green());
}

/// Print error message.
pub fn print_error(msg: &str) {
    eprintln!("{}", format!("✗ {}", msg).red());
}

/// Print warning message.
pub fn print_warning(msg: &str) {
    println!("{}", format!("⚠ {}", msg).yellow());
}

/// Print info message.
pub fn print_info(msg: &str) {
    println!("{}", format!("ℹ {}", msg).blue());
}

#[derive(Tabled)]
struct TxRow {
    #[tabled(rename = "#")]
    index: usize,
    from: String,
    to: String,
    op: String,
    value: String,
    status: String,
}

fn tx_row(index: usize, tx: &TxRecord, label: &dyn Fn(&Address) -> Option<String>) -> TxRow {
    let status = match (tx.success, tx.exit()) {
        (true, _) if tx.deployed => "deployed".to_string(),
        (true, _) => "ok".to_string(),
        (false, Some(code)) => format!("{} ({})", code, code.code()),
        (false, None) => format!("exit {}", tx.exit_code.unwrap_or_default()),
    };
    TxRow {
        index,
        from: format_address(&tx.from, label(&tx.from).as_deref()),
        to: format_address(&tx.to, label(&tx.to).as_deref()),
        op: tx.op.clone(),
        value: format_coins(&tx.value),
        status,
    }
}

/// Render the transaction table of one action.
pub fn outcome_table(outcome: &Outcome, label: &dyn Fn(&Address) -> Option<String>) -> String {
    let rows: Vec<TxRow> = outcome
        .transactions
        .iter()
        .enumerate()
        .map(|(i, tx)| tx_row(i, tx, label))
        .collect();
    Table::new(rows).to_string()
}

/// Print the transactions of one action and a status line.
pub fn print_outcome(title: &str, outcome: &Outcome, label: &dyn Fn(&Address) -> Option<String>) {
    println!("{}", title.bold());
    println!("{}", outcome_table(outcome, label));
    match outcome.first_failure() {
        None => print_success(&format!("{} transaction(s) processed", outcome.len())),
        Some(tx) => {
            let reason = tx
                .exit()
                .map(|code| code.to_string())
                .unwrap_or_else(|| format!("exit {}", tx.exit_code.unwrap_or_default()));
            print_warning(&format!("{} rejected {}: {}", tx.to.short(), tx.op, reason));
        }
    }
}

/// Print a queried actor state as pretty JSON.
pub fn print_state<T: Serialize>(title: &str, state: &T) -> anyhow::Result<()> {
    println!("{}", title.bold());
    println!("{}", "=".repeat(50));
    println!("{}", serde_json::to_string_pretty(state)?);
    Ok(())
}
