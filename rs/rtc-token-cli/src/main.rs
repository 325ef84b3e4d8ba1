use anyhow::Context;
use clap::{Parser, Subcommand};
use rtc_token::{AccessToken, Role, RtcTokenBuilder};

#[derive(Parser, Debug)]
#[command(name = "rtc-token", about = "Generate and inspect RTC channel access tokens")]
struct Cli {
	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Generate a signed token and print it to stdout.
	Generate {
		/// The application identifier (32 hex characters).
		#[arg(long, env = "APP_ID")]
		app_id: String,

		/// The shared signing secret (32 hex characters).
		#[arg(long, env = "APP_CERTIFICATE", hide_env_values = true)]
		app_certificate: String,

		/// The channel to grant access to.
		#[arg(long)]
		channel: String,

		/// A numeric user id; 0 allows any user.
		#[arg(long, conflicts_with = "account")]
		uid: Option<u32>,

		/// A string user account.
		#[arg(long)]
		account: Option<String>,

		#[arg(long, default_value_t = Role::Publisher)]
		role: Role,

		/// Token lifetime in seconds.
		#[arg(long, default_value_t = rtc_token::DEFAULT_EXPIRE)]
		expire: u32,

		/// Privilege lifetime in seconds, defaults to the token lifetime.
		#[arg(long)]
		privilege_expire: Option<u32>,
	},

	/// Decode a token and print it as JSON.
	Inspect {
		token: String,

		/// Verify the signature with this certificate.
		#[arg(long, env = "APP_CERTIFICATE", hide_env_values = true)]
		app_certificate: Option<String>,
	},
}

fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();

	match cli.command {
		Command::Generate {
			app_id,
			app_certificate,
			channel,
			uid,
			account,
			role,
			expire,
			privilege_expire,
		} => {
			let privilege_expire = privilege_expire.unwrap_or(expire);

			let token = match account {
				Some(account) => RtcTokenBuilder::build_token_with_user_account(
					&app_id,
					&app_certificate,
					&channel,
					&account,
					role,
					expire,
					privilege_expire,
				),
				None => RtcTokenBuilder::build_token_with_uid(
					&app_id,
					&app_certificate,
					&channel,
					uid.unwrap_or(0),
					role,
					expire,
					privilege_expire,
				),
			}
			.context("failed to build token")?;

			println!("{token}");
		}
		Command::Inspect { token, app_certificate } => {
			let token = AccessToken::parse(token.trim()).context("failed to parse token")?;

			if let Some(app_certificate) = app_certificate {
				token.verify(&app_certificate).context("failed to verify token")?;
				eprintln!("signature ok");
			}

			println!("{}", serde_json::to_string_pretty(&token)?);
		}
	}

	Ok(())
}
