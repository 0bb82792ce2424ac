//! Handlers for the server state commands (`set server` / `clear server`).

use crate::cli::{ServerStateArgs, StateVerb};
use crate::client::{AppContext, CliError, CliResult};

/// Set or clear a named state on a server.
///
/// The state name goes to the server as given; there is no client-side
/// vocabulary, so an unknown state comes back as a remote rejection.
pub(crate) async fn handle_server_state(
    ctx: &AppContext,
    verb: StateVerb,
    args: ServerStateArgs,
) -> CliResult<()> {
    let server = args.server.trim();
    if server.is_empty() {
        return Err(CliError::validation("server name must not be empty"));
    }
    let state = args.state.trim();
    if state.is_empty() {
        return Err(CliError::validation("state name must not be empty"));
    }

    let path = format!("servers/{server}/{}", verb.as_str());
    ctx.put_empty(&path, &[("state", state)]).await?;
    println!("OK");
    Ok(())
}
