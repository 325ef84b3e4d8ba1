use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use rtc_token::Role;
use serde::{Deserialize, Serialize};

use crate::{CallerIdentity, Credentials, IssueError, TokenSigner};

/// How long an issued token stays valid, in seconds.
pub const TOKEN_LIFETIME: u64 = 3600;

/// Every caller may both send and receive media.
pub const TOKEN_ROLE: Role = Role::Publisher;

/// The token format stores the channel name behind a `u16` length.
pub const MAX_CHANNEL_NAME_LEN: usize = rtc_token::coding::MAX_LEN;

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueRequest {
	pub channel_name: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct IssueResponse {
	pub token: String,
}

/// Validates a request and delegates signing.
///
/// Holds no mutable state; one instance is shared by every request.
pub struct Issuer {
	credentials: Option<Credentials>,
	signer: Arc<dyn TokenSigner>,
}

impl Issuer {
	pub fn new(credentials: Option<Credentials>, signer: Arc<dyn TokenSigner>) -> Self {
		Self { credentials, signer }
	}

	pub fn issue(
		&self,
		identity: Option<&CallerIdentity>,
		request: &IssueRequest,
	) -> Result<IssueResponse, IssueError> {
		self.issue_at(identity, request, now())
	}

	#[tracing::instrument("issue", skip_all, fields(uid, channel))]
	pub fn issue_at(
		&self,
		identity: Option<&CallerIdentity>,
		request: &IssueRequest,
		issued_at: u64,
	) -> Result<IssueResponse, IssueError> {
		let identity = identity.ok_or(IssueError::Unauthenticated)?;
		tracing::Span::current().record("uid", identity.as_str());

		let channel_name = match request.channel_name.as_deref() {
			Some(channel) if !channel.is_empty() && channel.len() <= MAX_CHANNEL_NAME_LEN => channel,
			_ => return Err(IssueError::InvalidArgument),
		};
		tracing::Span::current().record("channel", channel_name);

		let credentials = self.credentials.as_ref().ok_or_else(|| {
			tracing::error!("server credentials are not configured");
			IssueError::MissingCredentials
		})?;

		let expires_at = issued_at + TOKEN_LIFETIME;

		let token = self
			.signer
			.sign(credentials, channel_name, identity.as_str(), TOKEN_ROLE, issued_at, expires_at)
			.map_err(|err| {
				tracing::error!(%err, "failed to sign token");
				IssueError::SignerFailed
			})?;

		tracing::debug!(expires_at, "issued token");

		Ok(IssueResponse { token })
	}
}

fn now() -> u64 {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.map(|d| d.as_secs())
		.unwrap_or_default()
}
