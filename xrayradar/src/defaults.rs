use std::borrow::Cow;
use std::env;

use crate::ClientOptions;

/// Fills options not set by the caller from the process environment, and
/// injects the default transport factory so that a DSN-only configuration
/// gets working delivery.
pub fn apply_defaults(mut opts: ClientOptions) -> ClientOptions {
    #[cfg(feature = "transport")]
    if opts.transport_factory.is_none() {
        opts.transport_factory =
            Some(std::sync::Arc::new(crate::transports::DefaultTransportFactory));
    }
    if opts.dsn.is_none() {
        opts.dsn = env::var("XRAYRADAR_DSN")
            .ok()
            .and_then(|dsn| dsn.parse().ok());
    }
    if opts.auth_token.is_none() {
        opts.auth_token = env::var("XRAYRADAR_AUTH_TOKEN").ok();
    }
    if opts.environment.is_none() {
        opts.environment = env::var("XRAYRADAR_ENVIRONMENT")
            .ok()
            .map(Cow::Owned)
            .or(Some(Cow::Borrowed("development")));
    }
    if opts.release.is_none() {
        opts.release = env::var("XRAYRADAR_RELEASE").ok().map(Cow::Owned);
    }
    if opts.server_name.is_none() {
        opts.server_name = env::var("XRAYRADAR_SERVER_NAME").ok().map(Cow::Owned);
    }
    opts
}
