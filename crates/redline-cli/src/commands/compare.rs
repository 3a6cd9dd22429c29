//! Compare command implementation.

use crate::cli::CompareArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use redline_domain::ProgressUpdate;
use redline_service::{CompareRequest, PipelineFactory, Settings, SettingsFactory};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Execute the compare command.
///
/// The envelope JSON goes to stdout (or `--output`); progress and the summary
/// table go to stderr so stdout stays machine-readable.
pub async fn execute_compare(
    args: CompareArgs,
    config: Option<&Path>,
    mock: bool,
    formatter: &Formatter,
) -> Result<()> {
    ensure_local_exists("Original contract", &args.original)?;
    ensure_local_exists("Amendment", &args.amendment)?;

    let mut settings = Settings::load(config)?;
    if mock {
        settings = settings.offline();
    }
    debug!(parser = %settings.parser_type, agents = %settings.agent_type, "Building pipeline");
    let service = SettingsFactory::new(settings)?.build()?;

    let progress = {
        let formatter = *formatter;
        move |update: ProgressUpdate| eprintln!("{}", formatter.progress_line(&update))
    };
    let mut request = CompareRequest::new(args.original.as_str(), args.amendment.as_str())
        .with_progress(Arc::new(progress));
    if let Some(id) = args.contract_id.as_deref() {
        request = request.with_contract_id(id);
    }

    let envelope = service.compare(request).await;
    let json = formatter.envelope_json(&envelope, args.compact)?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, &json)?;
            eprintln!("{}", formatter.info(&format!("Output saved to: {}", path.display())));
        }
        None => println!("{}", json),
    }

    for warning in &envelope.warnings {
        eprintln!("{}", formatter.warning(warning));
    }

    match envelope.result() {
        Some(result) => {
            eprintln!("{}", formatter.change_table(&envelope, result));
            let done = format!("Processing complete. Contract ID: {}", envelope.contract_id);
            eprintln!("{}", formatter.success(&done));
            Ok(())
        }
        None => Err(CliError::ComparisonFailed(
            envelope.error().unwrap_or("unknown error").to_string(),
        )),
    }
}

/// Fail early on a missing local file; URLs and other schemes are left to the parser.
fn ensure_local_exists(what: &'static str, reference: &str) -> Result<()> {
    if reference.trim().is_empty() {
        return Err(CliError::InvalidInput(format!("{} must not be empty", what)));
    }
    if reference.contains("://") || Path::new(reference).exists() {
        return Ok(());
    }
    Err(CliError::FileNotFound {
        what,
        path: reference.to_string(),
    })
}
