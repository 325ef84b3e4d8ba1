use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::State;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderMap, Method};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use clap::Args;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

use crate::{IdentityVerifier, IssueError, IssueRequest, IssueResponse, Issuer, MetricsSnapshot, MetricsTracker};

const DEFAULT_BIND: &str = "[::]:8080";

#[derive(Args, Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct WebConfig {
	/// Listen for HTTP requests on the given address, defaults to [::]:8080.
	#[arg(id = "web-bind", long = "web-bind", env = "WEB_BIND")]
	pub bind: Option<String>,

	/// Serve HTTPS using this PEM certificate chain.
	#[arg(id = "web-tls-cert", long = "web-tls-cert", requires = "web-tls-key")]
	pub tls_cert: Option<PathBuf>,

	/// The PEM private key for --web-tls-cert.
	#[arg(id = "web-tls-key", long = "web-tls-key", requires = "web-tls-cert")]
	pub tls_key: Option<PathBuf>,
}

#[derive(Clone)]
pub struct WebState {
	pub verifier: Arc<dyn IdentityVerifier>,
	pub issuer: Arc<Issuer>,
	pub metrics: MetricsTracker,
}

pub struct Web {
	app: Router,
	config: WebConfig,
}

impl Web {
	pub fn new(state: WebState, config: WebConfig) -> Self {
		Self {
			app: Self::router(state),
			config,
		}
	}

	pub fn router(state: WebState) -> Router {
		let cors = CorsLayer::new()
			.allow_origin(Any)
			.allow_methods([Method::GET, Method::POST])
			.allow_headers([AUTHORIZATION, CONTENT_TYPE]);

		Router::new()
			.route("/generateAgoraToken", post(serve_token))
			.route("/token", post(serve_token))
			.route("/health", get(serve_health))
			.route("/metrics", get(serve_metrics))
			.layer(cors)
			.with_state(state)
	}

	pub async fn run(self) -> anyhow::Result<()> {
		let bind = self.config.bind.as_deref().unwrap_or(DEFAULT_BIND);
		let listen = tokio::net::lookup_host(bind)
			.await
			.context("invalid listen address")?
			.next()
			.context("invalid listen address")?;

		let app = self.app.into_make_service();

		match (&self.config.tls_cert, &self.config.tls_key) {
			(Some(cert), Some(key)) => {
				let tls = axum_server::tls_rustls::RustlsConfig::from_pem_file(cert, key)
					.await
					.context("failed to load TLS certificate")?;

				tracing::info!(%listen, "listening (https)");
				axum_server::bind_rustls(listen, tls).serve(app).await?;
			}
			(None, None) => {
				tracing::info!(%listen, "listening (http)");
				axum_server::bind(listen).serve(app).await?;
			}
			_ => anyhow::bail!("both --web-tls-cert and --web-tls-key are required"),
		}

		Ok(())
	}
}

/// The callable envelope: arguments are nested under `data`.
#[derive(Default, Deserialize)]
#[serde(default)]
struct CallableRequest {
	data: IssueRequest,
}

/// The callable envelope: the return value is nested under `result`.
#[derive(Serialize)]
struct CallableResponse<T> {
	result: T,
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
	let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
	value
		.strip_prefix("Bearer ")
		.or_else(|| value.strip_prefix("bearer "))
		.map(str::trim)
}

async fn serve_token(
	State(state): State<WebState>,
	headers: HeaderMap,
	body: Bytes,
) -> Result<Json<CallableResponse<IssueResponse>>, IssueError> {
	let identity = state.verifier.verify(bearer(&headers));

	// A malformed body is reported as a missing argument, after authentication.
	let request = match serde_json::from_slice::<CallableRequest>(&body) {
		Ok(request) => request.data,
		Err(err) => {
			tracing::debug!(%err, "malformed request body");
			IssueRequest::default()
		}
	};

	let result = state.issuer.issue(identity.as_ref(), &request);
	state.metrics.record(&result);

	if let Err(err) = &result {
		tracing::info!(%err, status = err.status(), "rejected token request");
	}

	Ok(Json(CallableResponse { result: result? }))
}

async fn serve_health() -> &'static str {
	"ok"
}

async fn serve_metrics(State(state): State<WebState>) -> Json<MetricsSnapshot> {
	Json(state.metrics.snapshot())
}
