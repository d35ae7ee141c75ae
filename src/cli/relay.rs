//! Relay command implementation.

use super::CliError;
use knight_chase::online::{RelayPolicy, RelayServer};

/// Execute the relay command: serve rooms until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the runtime cannot start or the socket fails.
pub(crate) fn execute(listen: &str, strict: bool) -> Result<(), CliError> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let policy = RelayPolicy {
            reject_stale: strict,
        };
        let server = RelayServer::bind(listen, policy).await?;
        println!("Relay listening on {}", server.local_addr()?);
        if strict {
            println!("Stale submissions will be rejected");
        }
        tokio::select! {
            result = server.run() => result?,
            signal = tokio::signal::ctrl_c() => {
                signal?;
                println!("Shutting down");
            }
        }
        Ok::<(), CliError>(())
    })
}
