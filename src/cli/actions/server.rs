use crate::cli::{actions::Action, globals::GlobalArgs};
use crate::progreso::auth::AuthConfig;
use anyhow::Result;

/// Handle the server action
pub async fn handle(action: Action, globals: &GlobalArgs) -> Result<()> {
    match action {
        Action::Server {
            port,
            dsn,
            frontend_url,
            content_url,
            image_hosts,
        } => {
            let auth_config = AuthConfig::new(globals.token_secret.clone(), frontend_url);

            crate::progreso::new(port, dsn, auth_config, content_url, image_hosts).await?;
        }
    }

    Ok(())
}
