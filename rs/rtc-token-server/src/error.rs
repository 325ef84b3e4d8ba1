use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// A failure returned to the caller.
///
/// Internal causes are logged where they happen and never included in the message.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IssueError {
	#[error("the request must include valid credentials")]
	Unauthenticated,

	#[error("the request must include a non-empty \"channelName\" argument of at most 65535 bytes")]
	InvalidArgument,

	#[error("server credentials are not configured")]
	MissingCredentials,

	#[error("failed to generate token")]
	SignerFailed,
}

impl IssueError {
	/// The caller-visible error kind.
	pub fn status(&self) -> &'static str {
		match self {
			Self::Unauthenticated => "UNAUTHENTICATED",
			Self::InvalidArgument => "INVALID_ARGUMENT",
			Self::MissingCredentials | Self::SignerFailed => "INTERNAL",
		}
	}

	pub fn http_status(&self) -> StatusCode {
		match self {
			Self::Unauthenticated => StatusCode::UNAUTHORIZED,
			Self::InvalidArgument => StatusCode::BAD_REQUEST,
			Self::MissingCredentials | Self::SignerFailed => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}
}

#[derive(Serialize)]
struct ErrorBody {
	error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
	status: &'static str,
	message: String,
}

impl IntoResponse for IssueError {
	fn into_response(self) -> Response {
		let body = ErrorBody {
			error: ErrorDetail {
				status: self.status(),
				message: self.to_string(),
			},
		};

		(self.http_status(), Json(body)).into_response()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_kinds() {
		assert_eq!(IssueError::Unauthenticated.status(), "UNAUTHENTICATED");
		assert_eq!(IssueError::InvalidArgument.status(), "INVALID_ARGUMENT");
		assert_eq!(IssueError::MissingCredentials.status(), "INTERNAL");
		assert_eq!(IssueError::SignerFailed.status(), "INTERNAL");
	}

	#[tokio::test]
	async fn test_response() {
		let res = IssueError::InvalidArgument.into_response();
		assert_eq!(res.status(), StatusCode::BAD_REQUEST);

		let body = axum::body::to_bytes(res.into_body(), 1024).await.unwrap();
		let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
		assert_eq!(json["error"]["status"], "INVALID_ARGUMENT");
		assert!(json["error"]["message"].as_str().unwrap().contains("channelName"));
	}
}
