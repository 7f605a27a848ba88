use crate::cli::{
    actions::{Action, server},
    telemetry,
};
use anyhow::Result;

/// Execute the provided action.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action) -> Result<()> {
    let result = match action {
        Action::Server(args) => server::execute(args).await,
    };

    // Flush pending spans whether or not the action succeeded.
    telemetry::shutdown_tracer();

    result
}
