use std::io::{Read, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::{Buf, BufMut, BytesMut};
use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use hmac::{Hmac, Mac};
use rand::Rng;
use serde::Serialize;
use sha2::Sha256;

use crate::coding::{Decode, Encode};
use crate::{Error, Result, Service};

type HmacSha256 = Hmac<Sha256>;

/// Prepended to every encoded token.
pub const VERSION: &str = "007";

/// The default token lifetime in seconds.
pub const DEFAULT_EXPIRE: u32 = 3600;

/// A signed credential granting one or more [Service]s.
///
/// Encoded as [VERSION] followed by base64(zlib(signature + signing info)).
/// The signature is an HMAC-SHA256 keyed by the app certificate, the issue time and a random salt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AccessToken {
	pub app_id: String,

	/// Unix timestamp in seconds.
	pub issue_ts: u32,

	/// Lifetime in seconds, relative to `issue_ts`.
	pub expire: u32,

	pub salt: u32,
	pub services: Vec<Service>,

	/// Only populated when parsed.
	#[serde(with = "hex::serde")]
	pub signature: Vec<u8>,

	#[serde(skip)]
	app_certificate: String,
}

impl AccessToken {
	pub fn new(app_id: impl Into<String>, app_certificate: impl Into<String>) -> Self {
		Self {
			app_id: app_id.into(),
			app_certificate: app_certificate.into(),
			issue_ts: now(),
			expire: DEFAULT_EXPIRE,
			salt: rand::rng().random_range(1..=99_999_999),
			services: Vec::new(),
			signature: Vec::new(),
		}
	}

	pub fn issued_at(mut self, issue_ts: u32) -> Self {
		self.issue_ts = issue_ts;
		self
	}

	pub fn expire(mut self, expire: u32) -> Self {
		self.expire = expire;
		self
	}

	pub fn salt(mut self, salt: u32) -> Self {
		self.salt = salt;
		self
	}

	pub fn add_service(mut self, service: impl Into<Service>) -> Self {
		self.services.push(service.into());
		self
	}

	/// The unix timestamp when the token stops being valid.
	pub fn expires_at(&self) -> u64 {
		self.issue_ts as u64 + self.expire as u64
	}

	/// Sign and encode the token.
	pub fn build(&self) -> Result<String> {
		if !is_hex32(&self.app_id) {
			return Err(Error::InvalidAppId);
		}

		if !is_hex32(&self.app_certificate) {
			return Err(Error::InvalidAppCertificate);
		}

		if self.services.is_empty() {
			return Err(Error::NoServices);
		}

		for service in &self.services {
			service.check()?;
		}

		let info = self.signing_info();
		let signature = sign(&self.app_certificate, self.issue_ts, self.salt, &info);

		let mut body = BytesMut::new();
		signature.encode(&mut body);
		body.put_slice(&info);

		let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
		encoder.write_all(&body).map_err(|_| Error::InvalidCompression)?;
		let compressed = encoder.finish().map_err(|_| Error::InvalidCompression)?;

		Ok(format!("{}{}", VERSION, STANDARD.encode(compressed)))
	}

	/// Decode a token without checking the signature.
	pub fn parse(token: &str) -> Result<Self> {
		let (version, encoded) = token.split_at_checked(VERSION.len()).unwrap_or((token, ""));
		if version != VERSION {
			return Err(Error::UnsupportedVersion(version.to_string()));
		}

		let compressed = STANDARD.decode(encoded).map_err(|_| Error::InvalidBase64)?;

		let mut body = Vec::new();
		ZlibDecoder::new(compressed.as_slice())
			.read_to_end(&mut body)
			.map_err(|_| Error::InvalidCompression)?;

		let mut buf = body.as_slice();
		let signature = Vec::<u8>::decode(&mut buf)?;
		let app_id = String::decode(&mut buf)?;
		let issue_ts = u32::decode(&mut buf)?;
		let expire = u32::decode(&mut buf)?;
		let salt = u32::decode(&mut buf)?;

		let count = u16::decode(&mut buf)?;
		let mut services = Vec::with_capacity(count as usize);
		for _ in 0..count {
			services.push(Service::decode(&mut buf)?);
		}

		if buf.has_remaining() {
			return Err(Error::TrailingData);
		}

		Ok(Self {
			app_id,
			app_certificate: String::new(),
			issue_ts,
			expire,
			salt,
			services,
			signature,
		})
	}

	/// Check the signature of a parsed token against the given certificate.
	pub fn verify(&self, app_certificate: &str) -> Result<()> {
		let info = self.signing_info();

		let mut mac = signing_mac(app_certificate, self.issue_ts, self.salt);
		mac.update(&info);
		mac.verify_slice(&self.signature).map_err(|_| Error::SignatureMismatch)
	}

	fn signing_info(&self) -> Vec<u8> {
		let mut buf = BytesMut::new();
		self.app_id.encode(&mut buf);
		self.issue_ts.encode(&mut buf);
		self.expire.encode(&mut buf);
		self.salt.encode(&mut buf);
		(self.services.len() as u16).encode(&mut buf);

		for service in &self.services {
			service.encode(&mut buf);
		}

		buf.to_vec()
	}
}

fn signing_mac(app_certificate: &str, issue_ts: u32, salt: u32) -> HmacSha256 {
	let key = hmac_sha256(&issue_ts.to_le_bytes(), app_certificate.as_bytes());
	let key = hmac_sha256(&salt.to_le_bytes(), &key);

	HmacSha256::new_from_slice(&key).expect("hmac accepts any key length")
}

fn sign(app_certificate: &str, issue_ts: u32, salt: u32, info: &[u8]) -> Vec<u8> {
	let mut mac = signing_mac(app_certificate, issue_ts, salt);
	mac.update(info);
	mac.finalize().into_bytes().to_vec()
}

fn hmac_sha256(key: &[u8], message: &[u8]) -> Vec<u8> {
	let mut mac = HmacSha256::new_from_slice(key).expect("hmac accepts any key length");
	mac.update(message);
	mac.finalize().into_bytes().to_vec()
}

fn is_hex32(value: &str) -> bool {
	value.len() == 32 && value.bytes().all(|b| b.is_ascii_hexdigit())
}

fn now() -> u32 {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.map(|d| d.as_secs() as u32)
		.unwrap_or_default()
}
