//! Minimal counters for issued and rejected requests.

use std::sync::{
	Arc,
	atomic::{AtomicU64, Ordering},
};

use serde::Serialize;

use crate::IssueError;

/// Thread-safe request counters, cheap to clone.
#[derive(Clone, Default)]
pub struct MetricsTracker {
	issued: Arc<AtomicU64>,
	unauthenticated: Arc<AtomicU64>,
	invalid_argument: Arc<AtomicU64>,
	internal: Arc<AtomicU64>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
	pub issued: u64,
	pub unauthenticated: u64,
	pub invalid_argument: u64,
	pub internal: u64,
}

impl MetricsTracker {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn record<T>(&self, result: &Result<T, IssueError>) {
		let counter = match result {
			Ok(_) => &self.issued,
			Err(IssueError::Unauthenticated) => &self.unauthenticated,
			Err(IssueError::InvalidArgument) => &self.invalid_argument,
			Err(IssueError::MissingCredentials | IssueError::SignerFailed) => &self.internal,
		};

		counter.fetch_add(1, Ordering::Relaxed);
	}

	pub fn snapshot(&self) -> MetricsSnapshot {
		MetricsSnapshot {
			issued: self.issued.load(Ordering::Relaxed),
			unauthenticated: self.unauthenticated.load(Ordering::Relaxed),
			invalid_argument: self.invalid_argument.load(Ordering::Relaxed),
			internal: self.internal.load(Ordering::Relaxed),
		}
	}
}
