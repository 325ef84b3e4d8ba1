use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Context;
use clap::Args;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;

/// The verified identity of the caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallerIdentity(String);

impl CallerIdentity {
	/// Returns None for an empty identity.
	pub fn new(uid: impl Into<String>) -> Option<Self> {
		let uid = uid.into();
		match uid.is_empty() {
			true => None,
			false => Some(Self(uid)),
		}
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl std::fmt::Display for CallerIdentity {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		self.0.fmt(f)
	}
}

/// Establishes who is calling before any other request logic runs.
///
/// The credential is whatever the hosting transport carried, typically a bearer token.
pub trait IdentityVerifier: Send + Sync {
	fn verify(&self, credential: Option<&str>) -> Option<CallerIdentity>;
}

#[derive(Args, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct AuthConfig {
	/// The JWT algorithm used by the identity provider, defaults to HS256.
	#[arg(id = "auth-algorithm", long = "auth-algorithm", env = "AUTH_ALGORITHM")]
	pub algorithm: Option<String>,

	/// A file containing the verification key.
	///
	/// A PEM public key for RSA/EC/EdDSA algorithms, or the raw shared secret for HMAC.
	#[arg(id = "auth-key", long = "auth-key", env = "AUTH_KEY")]
	pub key: Option<PathBuf>,

	/// The shared secret for HMAC algorithms, instead of --auth-key.
	#[arg(id = "auth-secret", long = "auth-secret", env = "AUTH_SECRET", hide_env_values = true)]
	pub secret: Option<String>,

	/// Require this `iss` claim.
	#[arg(id = "auth-issuer", long = "auth-issuer", env = "AUTH_ISSUER")]
	pub issuer: Option<String>,

	/// Require this `aud` claim.
	#[arg(id = "auth-audience", long = "auth-audience", env = "AUTH_AUDIENCE")]
	pub audience: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("AuthConfig")
			.field("algorithm", &self.algorithm)
			.field("key", &self.key)
			.field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
			.field("issuer", &self.issuer)
			.field("audience", &self.audience)
			.finish()
	}
}

impl AuthConfig {
	pub fn init(&self) -> anyhow::Result<JwtVerifier> {
		let algorithm = match &self.algorithm {
			Some(algorithm) => Algorithm::from_str(algorithm).context("unknown auth algorithm")?,
			None => Algorithm::HS256,
		};

		let key = match algorithm {
			Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => {
				let secret = match (&self.secret, &self.key) {
					(Some(secret), _) => secret.as_bytes().to_vec(),
					(None, Some(path)) => {
						let contents = std::fs::read_to_string(path).context("failed to read auth key")?;
						contents.trim().as_bytes().to_vec()
					}
					(None, None) => anyhow::bail!("missing --auth-secret or --auth-key"),
				};

				anyhow::ensure!(!secret.is_empty(), "empty auth secret");
				DecodingKey::from_secret(&secret)
			}
			_ => {
				let path = self.key.as_ref().context("missing --auth-key")?;
				let pem = std::fs::read(path).context("failed to read auth key")?;
				pem_key(algorithm, &pem)?
			}
		};

		let mut validation = Validation::new(algorithm);

		// `set_audience` and `set_issuer` only compare claims that are present.
		let mut required = vec!["exp"];
		match &self.audience {
			Some(audience) => {
				validation.set_audience(&[audience]);
				required.push("aud");
			}
			None => validation.validate_aud = false,
		}
		if let Some(issuer) = &self.issuer {
			validation.set_issuer(&[issuer]);
			required.push("iss");
		}
		validation.set_required_spec_claims(&required[..]);

		tracing::info!(?algorithm, issuer = ?self.issuer, audience = ?self.audience, "identity verifier configured");

		Ok(JwtVerifier { key, validation })
	}
}

fn pem_key(algorithm: Algorithm, pem: &[u8]) -> anyhow::Result<DecodingKey> {
	let key = match algorithm {
		Algorithm::RS256
		| Algorithm::RS384
		| Algorithm::RS512
		| Algorithm::PS256
		| Algorithm::PS384
		| Algorithm::PS512 => DecodingKey::from_rsa_pem(pem),
		Algorithm::ES256 | Algorithm::ES384 => DecodingKey::from_ec_pem(pem),
		Algorithm::EdDSA => DecodingKey::from_ed_pem(pem),
		other => anyhow::bail!("unsupported auth algorithm: {other:?}"),
	};

	key.context("invalid auth key")
}

#[derive(Deserialize)]
struct Claims {
	sub: String,
}

/// Verifies JWTs issued by an upstream identity provider; the `sub` claim is the identity.
pub struct JwtVerifier {
	key: DecodingKey,
	validation: Validation,
}

impl IdentityVerifier for JwtVerifier {
	fn verify(&self, credential: Option<&str>) -> Option<CallerIdentity> {
		let token = credential?;

		match jsonwebtoken::decode::<Claims>(token, &self.key, &self.validation) {
			Ok(data) => CallerIdentity::new(data.claims.sub),
			Err(err) => {
				tracing::debug!(%err, "rejected credential");
				None
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::testing::*;
	use super::*;

	use jsonwebtoken::{EncodingKey, Header};
	use std::io::Write;

	fn scoped_verifier() -> JwtVerifier {
		AuthConfig {
			secret: Some(SECRET.to_string()),
			issuer: Some("https://issuer.example".to_string()),
			audience: Some("rtc".to_string()),
			..Default::default()
		}
		.init()
		.unwrap()
	}

	#[test]
	fn test_valid() {
		let token = sign(&claims("user123"));
		let identity = verifier().verify(Some(&token)).unwrap();
		assert_eq!(identity.as_str(), "user123");
	}

	#[test]
	fn test_missing() {
		assert_eq!(verifier().verify(None), None);
	}

	#[test]
	fn test_garbage() {
		assert_eq!(verifier().verify(Some("not-a-jwt")), None);
	}

	#[test]
	fn test_wrong_secret() {
		let token = jsonwebtoken::encode(
			&Header::default(),
			&claims("user123"),
			&EncodingKey::from_secret(b"other-secret"),
		)
		.unwrap();
		assert_eq!(verifier().verify(Some(&token)), None);
	}

	#[test]
	fn test_expired() {
		let mut claims = claims("user123");
		claims.exp = now() - 3600;
		assert_eq!(verifier().verify(Some(&sign(&claims))), None);
	}

	#[test]
	fn test_empty_subject() {
		let token = sign(&claims(""));
		assert_eq!(verifier().verify(Some(&token)), None);
	}

	#[test]
	fn test_audience_and_issuer() {
		let verifier = scoped_verifier();

		let mut good = claims("user123");
		good.iss = Some("https://issuer.example");
		good.aud = Some("rtc");
		assert!(verifier.verify(Some(&sign(&good))).is_some());

		let mut bad = claims("user123");
		bad.iss = Some("https://issuer.example");
		bad.aud = Some("other");
		assert!(verifier.verify(Some(&sign(&bad))).is_none());

		let mut bad = claims("user123");
		bad.iss = Some("https://other.example");
		bad.aud = Some("rtc");
		assert!(verifier.verify(Some(&sign(&bad))).is_none());
	}

	#[test]
	fn test_audience_and_issuer_required() {
		let verifier = scoped_verifier();

		let neither = claims("mallory");
		assert_eq!(verifier.verify(Some(&sign(&neither))), None);

		let mut aud_only = claims("mallory");
		aud_only.aud = Some("rtc");
		assert_eq!(verifier.verify(Some(&sign(&aud_only))), None);

		let mut iss_only = claims("mallory");
		iss_only.iss = Some("https://issuer.example");
		assert_eq!(verifier.verify(Some(&sign(&iss_only))), None);
	}

	#[test]
	fn test_issuer_only() {
		let verifier = AuthConfig {
			secret: Some(SECRET.to_string()),
			issuer: Some("https://issuer.example".to_string()),
			..Default::default()
		}
		.init()
		.unwrap();

		let mut good = claims("user123");
		good.iss = Some("https://issuer.example");
		assert!(verifier.verify(Some(&sign(&good))).is_some());

		assert!(verifier.verify(Some(&sign(&claims("user123")))).is_none());
	}

	#[test]
	fn test_secret_from_file() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "{SECRET}").unwrap();

		let verifier = AuthConfig {
			key: Some(file.path().to_path_buf()),
			..Default::default()
		}
		.init()
		.unwrap();

		assert!(verifier.verify(Some(&sign(&claims("user123")))).is_some());
	}

	#[test]
	fn test_unconfigured() {
		assert!(AuthConfig::default().init().is_err());

		let config = AuthConfig {
			algorithm: Some("RS256".to_string()),
			secret: Some(SECRET.to_string()),
			..Default::default()
		};
		assert!(config.init().is_err());

		let config = AuthConfig {
			algorithm: Some("XX999".to_string()),
			secret: Some(SECRET.to_string()),
			..Default::default()
		};
		assert!(config.init().is_err());
	}

	#[test]
	fn test_debug_redacts_secret() {
		let config = AuthConfig {
			secret: Some(SECRET.to_string()),
			..Default::default()
		};
		assert!(!format!("{config:?}").contains(SECRET));
	}
}

#[cfg(test)]
pub(crate) mod testing {
	use super::*;
	use jsonwebtoken::{EncodingKey, Header};
	use serde::Serialize;
	use std::time::{SystemTime, UNIX_EPOCH};

	pub const SECRET: &str = "test-secret";

	#[derive(Serialize)]
	pub struct TestClaims<'a> {
		pub sub: &'a str,
		pub exp: u64,
		#[serde(skip_serializing_if = "Option::is_none")]
		pub iss: Option<&'a str>,
		#[serde(skip_serializing_if = "Option::is_none")]
		pub aud: Option<&'a str>,
	}

	pub fn now() -> u64 {
		SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs()
	}

	/// Claims for the given subject, expiring in ten minutes.
	pub fn claims(sub: &str) -> TestClaims<'_> {
		TestClaims {
			sub,
			exp: now() + 600,
			iss: None,
			aud: None,
		}
	}

	pub fn sign(claims: &TestClaims) -> String {
		jsonwebtoken::encode(&Header::default(), claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap()
	}

	/// Accepts tokens signed with [SECRET], without issuer or audience checks.
	pub fn verifier() -> JwtVerifier {
		AuthConfig {
			secret: Some(SECRET.to_string()),
			..Default::default()
		}
		.init()
		.unwrap()
	}

	/// A valid bearer token for the given subject.
	pub fn bearer(sub: &str) -> String {
		sign(&claims(sub))
	}
}
