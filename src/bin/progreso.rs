use anyhow::Result;
use progreso::cli::{actions, actions::Action, start, telemetry};

// Main function
#[tokio::main]
async fn main() -> Result<()> {
    // Start the program
    let (action, globals) = start()?;

    // Handle the action
    match action {
        Action::Server { .. } => actions::server::handle(action, &globals).await?,
    }

    // Flush pending spans before exit
    telemetry::shutdown_tracer();

    Ok(())
}
