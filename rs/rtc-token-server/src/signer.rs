use clap::Args;
use rtc_token::{Role, RtcTokenBuilder};
use serde::Deserialize;

/// The platform credentials used to sign tokens.
#[derive(Clone)]
pub struct Credentials {
	pub app_id: String,
	pub app_certificate: String,
}

impl std::fmt::Debug for Credentials {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Credentials")
			.field("app_id", &self.app_id)
			.field("app_certificate", &"<redacted>")
			.finish()
	}
}

#[derive(Args, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct CredentialsConfig {
	/// The platform application identifier.
	#[arg(id = "app-id", long = "app-id", env = "APP_ID")]
	pub app_id: Option<String>,

	/// The shared signing secret. Never logged.
	#[arg(id = "app-certificate", long = "app-certificate", env = "APP_CERTIFICATE", hide_env_values = true)]
	pub app_certificate: Option<String>,
}

impl std::fmt::Debug for CredentialsConfig {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("CredentialsConfig")
			.field("app_id", &self.app_id)
			.field("app_certificate", &self.app_certificate.as_ref().map(|_| "<redacted>"))
			.finish()
	}
}

impl CredentialsConfig {
	/// Returns None unless both values are set and non-empty.
	pub fn init(&self) -> Option<Credentials> {
		let app_id = self.app_id.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
		let app_certificate = self.app_certificate.as_deref().map(str::trim).filter(|s| !s.is_empty())?;

		Some(Credentials {
			app_id: app_id.to_string(),
			app_certificate: app_certificate.to_string(),
		})
	}
}

/// Produces a signed, time-bounded credential for a channel member.
pub trait TokenSigner: Send + Sync {
	fn sign(
		&self,
		credentials: &Credentials,
		channel_name: &str,
		uid: &str,
		role: Role,
		issued_at: u64,
		expires_at: u64,
	) -> anyhow::Result<String>;
}

/// Signs AccessToken2 tokens where the token and every privilege expire together.
#[derive(Clone, Copy, Debug, Default)]
pub struct AccessTokenSigner;

impl TokenSigner for AccessTokenSigner {
	fn sign(
		&self,
		credentials: &Credentials,
		channel_name: &str,
		uid: &str,
		role: Role,
		issued_at: u64,
		expires_at: u64,
	) -> anyhow::Result<String> {
		let token = RtcTokenBuilder::build_token_expiring_at(
			&credentials.app_id,
			&credentials.app_certificate,
			channel_name,
			uid,
			role,
			issued_at,
			expires_at,
		)?;

		Ok(token)
	}
}
