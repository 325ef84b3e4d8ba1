use clap::Args;
use serde::Deserialize;
use serde_with::DisplayFromStr;
use tracing::Level;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

#[serde_with::serde_as]
#[derive(Args, Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Log {
	/// The level filter to use, defaults to info.
	///
	/// RUST_LOG directives are applied on top of this.
	#[serde_as(as = "Option<DisplayFromStr>")]
	#[arg(id = "log-level", long = "log-level", env = "LOG_LEVEL")]
	pub level: Option<Level>,

	/// Write logs as JSON lines instead of text.
	#[arg(id = "log-json", long = "log-json", num_args = 0..=1, default_missing_value = "true")]
	pub json: Option<bool>,
}

impl Log {
	pub fn level(&self) -> LevelFilter {
		LevelFilter::from_level(self.level.unwrap_or(Level::INFO))
	}

	pub fn init(&self) -> anyhow::Result<()> {
		let filter = EnvFilter::builder()
			.with_default_directive(self.level().into())
			.from_env_lossy()
			.add_directive("h2=warn".parse()?)
			.add_directive("hyper=info".parse()?)
			.add_directive("tokio=info".parse()?);

		let registry = tracing_subscriber::registry();

		if self.json.unwrap_or(false) {
			let fmt_layer = tracing_subscriber::fmt::layer()
				.json()
				.with_writer(std::io::stderr)
				.with_filter(filter);
			registry.with(fmt_layer).try_init()?;
		} else {
			let fmt_layer = tracing_subscriber::fmt::layer()
				.with_writer(std::io::stderr)
				.with_filter(filter);
			registry.with(fmt_layer).try_init()?;
		}

		Ok(())
	}
}
