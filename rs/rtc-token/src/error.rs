use crate::coding::DecodeError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
	#[error("app id must be 32 hex characters")]
	InvalidAppId,

	#[error("app certificate must be 32 hex characters")]
	InvalidAppCertificate,

	#[error("token has no services")]
	NoServices,

	#[error("field longer than {} bytes", crate::coding::MAX_LEN)]
	FieldTooLong,

	#[error("unsupported version: {0}")]
	UnsupportedVersion(String),

	#[error("invalid base64")]
	InvalidBase64,

	#[error("invalid compression")]
	InvalidCompression,

	#[error("decode error: {0}")]
	Decode(#[from] DecodeError),

	#[error("trailing data")]
	TrailingData,

	#[error("signature mismatch")]
	SignatureMismatch,

	#[error("expiration before issue time")]
	InvalidExpiration,
}
