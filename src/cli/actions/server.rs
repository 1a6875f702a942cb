use crate::fxguard::{self, filter::FilterOptions, Gateway, GatewayConfig};
use anyhow::{Context, Result};
use secrecy::SecretString;
use tracing::{debug, warn};
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub origin_url: Url,
    pub login_url: Option<String>,
    pub jwt_secret: Option<SecretString>,
    pub omit_restricted: bool,
    pub reload_on_auth: bool,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the origin client cannot be built or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    if args.jwt_secret.is_none() {
        warn!("No JWT secret configured, every visitor will be treated as anonymous");
    }
    if args.login_url.is_none() {
        warn!("No login URL configured, anonymous visitors will not be redirected");
    }

    debug!("Gateway configuration: {:?}", args);

    let gateway = Gateway::new(GatewayConfig {
        origin_url: args.origin_url,
        login_url: args.login_url,
        jwt_secret: args.jwt_secret,
        filter: FilterOptions {
            omit_restricted: args.omit_restricted,
            reload_on_auth: args.reload_on_auth,
        },
    })
    .context("Failed to build origin HTTP client")?;

    fxguard::new(args.port, gateway).await
}
