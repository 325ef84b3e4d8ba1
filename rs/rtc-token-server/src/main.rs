//! HTTP service issuing short-lived RTC channel tokens.
//!
//! Every request is authenticated by an [IdentityVerifier] before anything else runs,
//! then validated and signed by the [Issuer] with the process-wide [Credentials].
//!
//! Features:
//! - Callable endpoint: `POST /generateAgoraToken` with `{"data": {"channelName": ...}}`
//! - Authentication: bearer JWTs from an upstream identity provider via [JwtVerifier]
//! - HTTP API: health checks and request counters via [Web]

mod auth;
mod config;
mod error;
mod issue;
mod log;
mod metrics;
mod signer;
mod web;

pub use auth::*;
pub use config::*;
pub use error::*;
pub use issue::*;
pub use log::*;
pub use metrics::*;
pub use signer::*;
pub use web::*;

use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	// Only used when serving HTTPS, but there must be a single provider installed.
	rustls::crypto::aws_lc_rs::default_provider()
		.install_default()
		.map_err(|_| anyhow::anyhow!("failed to install default crypto provider"))?;

	let config = Config::load()?;
	config.log.init()?;
	tracing::trace!(?config, "final config");

	let verifier = config.auth.init()?;

	let credentials = config.credentials.init();
	match &credentials {
		Some(credentials) => tracing::info!(app_id = %credentials.app_id, "loaded server credentials"),
		None => tracing::warn!("APP_ID or APP_CERTIFICATE is not set; every token request will fail"),
	}

	let issuer = Issuer::new(credentials, Arc::new(AccessTokenSigner));

	let web = Web::new(
		WebState {
			verifier: Arc::new(verifier),
			issuer: Arc::new(issuer),
			metrics: MetricsTracker::new(),
		},
		config.web,
	);

	#[cfg(unix)]
	// Notify systemd that we're ready.
	let _ = sd_notify::notify(true, &[sd_notify::NotifyState::Ready]);

	web.run().await
}
