//! Validate command implementation.

use crate::cli::ValidateArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use redline_domain::ContractChangeResult;
use std::path::Path;

/// Execute the validate command.
pub fn execute_validate(args: ValidateArgs, formatter: &Formatter) -> Result<()> {
    let result = validate_file(&args.json_file)?;
    println!("{}", formatter.success("Valid ContractChangeResult"));
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// Read a JSON file and check it against the change-result schema.
pub fn validate_file(path: &Path) -> Result<ContractChangeResult> {
    if !path.exists() {
        return Err(CliError::FileNotFound {
            what: "File",
            path: path.display().to_string(),
        });
    }

    let contents = std::fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&contents)?;
    Ok(ContractChangeResult::from_json_value(value)?)
}
