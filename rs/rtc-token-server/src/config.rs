use std::ffi::OsString;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use serde::Deserialize;

use crate::{AuthConfig, CredentialsConfig, Log, WebConfig};

#[derive(Parser, Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields, default)]
#[command(version, about = "Issues short-lived RTC channel tokens to authenticated callers")]
pub struct Config {
	/// Load the given TOML file; command line arguments and environment variables take precedence.
	#[serde(skip)]
	#[arg(value_name = "FILE")]
	pub file: Option<PathBuf>,

	#[command(flatten)]
	pub log: Log,

	#[command(flatten)]
	pub web: WebConfig,

	#[command(flatten)]
	pub credentials: CredentialsConfig,

	#[command(flatten)]
	pub auth: AuthConfig,
}

impl Config {
	pub fn load() -> anyhow::Result<Self> {
		Self::load_from(std::env::args_os())
	}

	pub fn load_from<I, T>(args: I) -> anyhow::Result<Self>
	where
		I: IntoIterator<Item = T>,
		T: Into<OsString> + Clone,
	{
		let args: Vec<OsString> = args.into_iter().map(Into::into).collect();

		// Parse just the CLI arguments initially.
		let mut config = Config::try_parse_from(&args)?;

		// If a file is provided, load it and apply the CLI arguments on top.
		if let Some(file) = config.file.take() {
			let contents = std::fs::read_to_string(&file)
				.with_context(|| format!("failed to read config: {}", file.display()))?;

			config = toml::from_str(&contents).with_context(|| format!("invalid config: {}", file.display()))?;
			config.try_update_from(&args)?;
			config.file = Some(file);
		}

		Ok(config)
	}
}
