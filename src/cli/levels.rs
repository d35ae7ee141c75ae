//! Levels command implementation.

use super::output::format_levels;
use super::{CliError, OutputFormat};
use knight_chase::LevelConfig;

/// Execute the levels command.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub(crate) fn execute(format: OutputFormat) -> Result<(), CliError> {
    let levels = LevelConfig::builtin_levels();
    match format {
        OutputFormat::Text => print!("{}", format_levels(&levels)),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&levels)
                .map_err(|e| CliError::new(format!("JSON serialization failed: {e}")))?;
            println!("{json}");
        }
    }
    Ok(())
}
