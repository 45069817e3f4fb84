//! Tables printed at the end of a command.

use comfy_table::{Table, presets::UTF8_FULL};
use mirror_deploy::{ActionState, GeneratedAddress, RunSummary};

const NONE: &str = "-";

/// One row per action: action, kind, outcome, address, transaction hash.
pub fn run_table(summary: &RunSummary) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Action", "Kind", "Outcome", "Address", "Tx hash"]);

    for action in &summary.actions {
        let outcome = match action.state {
            ActionState::Skipped => "skipped",
            _ => "applied",
        };
        table.add_row(vec![
            action.label.clone(),
            action.kind.to_string(),
            outcome.to_string(),
            action
                .contract_address
                .map_or_else(|| NONE.to_string(), |a| a.to_checksum(None)),
            action
                .transaction_hash
                .map_or_else(|| NONE.to_string(), |h| h.to_string()),
        ]);
    }

    table
}

/// One row per deployment with its address and, when mined now, the mining effort.
pub fn generated_table(generated: &[GeneratedAddress]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Contract", "Address", "Attempts", "Time"]);

    for entry in generated {
        let (attempts, elapsed) = match &entry.mined {
            Some(stats) => (
                stats.attempts.to_string(),
                format!("{:.2?}", stats.elapsed),
            ),
            None => (NONE.to_string(), NONE.to_string()),
        };
        table.add_row(vec![
            entry.name.clone(),
            entry.address.to_checksum(None),
            attempts,
            elapsed,
        ]);
    }

    table
}
