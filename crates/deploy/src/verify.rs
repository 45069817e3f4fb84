//! Source verification script for deployed contracts.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

use crate::{
    action::{Action, ActionFile, DeploymentAction},
    fs::FsHandler,
};

/// Default name of the generated script.
pub const DEFAULT_SCRIPT_NAME: &str = "verify.sh";

/// Render one `npx hardhat verify` entry per deployment below `directory`.
///
/// The script takes the network name as its first argument.
pub fn render_script(directory: &Path) -> Result<String> {
    let mut entries = Vec::new();

    for path in FsHandler::collect_action_files(directory)? {
        let file = ActionFile::load(&path)?;
        for action in file.iter() {
            let Action::Deployment(deployment) = action else {
                continue;
            };
            match render_entry(deployment) {
                Some(entry) => entries.push(entry),
                None => tracing::warn!(
                    name = %deployment.name,
                    path = %path.display(),
                    "Deployment has no address yet, run `mirror generate` first"
                ),
            }
        }
    }

    Ok(entries.join("\n"))
}

/// Write the script for `directory` to `output` and make it executable.
pub fn write_script(directory: &Path, output: &Path) -> Result<usize> {
    let script = render_script(directory)?;
    std::fs::write(output, &script)
        .with_context(|| format!("Failed to write verification script {}", output.display()))?;
    FsHandler::set_executable(output)?;

    let entries = script.matches("npx hardhat verify").count();
    tracing::info!(path = %output.display(), entries, "Verification script written");

    Ok(entries)
}

fn render_entry(deployment: &DeploymentAction) -> Option<String> {
    let address = deployment.contract_address?;

    let mut command = vec![
        "npx hardhat verify".to_string(),
        address.to_checksum(None),
    ];
    command.extend(deployment.parsed_arguments.iter().map(shell_argument));
    command.push("--network $1".to_string());

    Some(format!("#{}\n{}\n", deployment.name, command.join(" ")))
}

fn shell_argument(value: &Value) -> String {
    let text = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };

    if text.contains(' ') {
        format!("\"{text}\"")
    } else {
        text
    }
}
