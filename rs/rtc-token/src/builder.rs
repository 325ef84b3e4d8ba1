use serde::{Deserialize, Serialize};

use crate::{AccessToken, Error, Privilege, Result, ServiceRtc};

/// The privilege level of a channel member.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
	/// May send and receive media.
	#[default]
	Publisher = 1,

	/// May only receive media.
	Subscriber = 2,
}

impl std::fmt::Display for Role {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Publisher => write!(f, "publisher"),
			Self::Subscriber => write!(f, "subscriber"),
		}
	}
}

impl std::str::FromStr for Role {
	type Err = String;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		match s {
			"publisher" => Ok(Self::Publisher),
			"subscriber" => Ok(Self::Subscriber),
			other => Err(format!("unknown role: {other}")),
		}
	}
}

/// Builds tokens granting access to a single RTC channel.
///
/// Every duration is in seconds relative to the issue time.
pub struct RtcTokenBuilder;

impl RtcTokenBuilder {
	/// Build a token for a numeric uid, where 0 allows any user.
	pub fn build_token_with_uid(
		app_id: &str,
		app_certificate: &str,
		channel_name: &str,
		uid: u32,
		role: Role,
		token_expire: u32,
		privilege_expire: u32,
	) -> Result<String> {
		let service = ServiceRtc::with_uid(channel_name, uid);
		Self::build(app_id, app_certificate, service, role, token_expire, privilege_expire)
	}

	/// Build a token for a string account.
	pub fn build_token_with_user_account(
		app_id: &str,
		app_certificate: &str,
		channel_name: &str,
		account: &str,
		role: Role,
		token_expire: u32,
		privilege_expire: u32,
	) -> Result<String> {
		let service = ServiceRtc::new(channel_name, account);
		Self::build(app_id, app_certificate, service, role, token_expire, privilege_expire)
	}

	/// Build a token for a string account that expires at an absolute unix timestamp.
	///
	/// The token and every privilege share the same expiration.
	pub fn build_token_expiring_at(
		app_id: &str,
		app_certificate: &str,
		channel_name: &str,
		account: &str,
		role: Role,
		issued_at: u64,
		expires_at: u64,
	) -> Result<String> {
		let expire = expires_at
			.checked_sub(issued_at)
			.and_then(|expire| u32::try_from(expire).ok())
			.ok_or(Error::InvalidExpiration)?;
		let issued_at = u32::try_from(issued_at).map_err(|_| Error::InvalidExpiration)?;

		let mut service = ServiceRtc::new(channel_name, account);
		grant(&mut service, role, expire);

		AccessToken::new(app_id, app_certificate)
			.issued_at(issued_at)
			.expire(expire)
			.add_service(service)
			.build()
	}

	fn build(
		app_id: &str,
		app_certificate: &str,
		mut service: ServiceRtc,
		role: Role,
		token_expire: u32,
		privilege_expire: u32,
	) -> Result<String> {
		grant(&mut service, role, privilege_expire);

		AccessToken::new(app_id, app_certificate)
			.expire(token_expire)
			.add_service(service)
			.build()
	}
}

fn grant(service: &mut ServiceRtc, role: Role, expire: u32) {
	service.add_privilege(Privilege::JoinChannel, expire);

	if role == Role::Publisher {
		service
			.add_privilege(Privilege::PublishAudioStream, expire)
			.add_privilege(Privilege::PublishVideoStream, expire)
			.add_privilege(Privilege::PublishDataStream, expire);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::Service;

	const APP_ID: &str = "970CA35de60c44645bbae8a215061b33";
	const APP_CERTIFICATE: &str = "5CFd2fd1755d40ecb72977518be15d3b";

	fn rtc(token: &str) -> ServiceRtc {
		let token = AccessToken::parse(token).unwrap();
		token.verify(APP_CERTIFICATE).unwrap();

		match token.services.as_slice() {
			[Service::Rtc(rtc)] => rtc.clone(),
			other => panic!("unexpected services: {other:?}"),
		}
	}

	#[test]
	fn test_publisher() {
		let token =
			RtcTokenBuilder::build_token_with_uid(APP_ID, APP_CERTIFICATE, "room", 42, Role::Publisher, 600, 300)
				.unwrap();

		let rtc = rtc(&token);
		assert_eq!(rtc.channel_name, "room");
		assert_eq!(rtc.uid, "42");
		assert_eq!(rtc.privileges.len(), 4);
		assert_eq!(rtc.privilege(Privilege::JoinChannel), Some(300));
		assert_eq!(rtc.privilege(Privilege::PublishDataStream), Some(300));
	}

	#[test]
	fn test_subscriber() {
		let token = RtcTokenBuilder::build_token_with_user_account(
			APP_ID,
			APP_CERTIFICATE,
			"room",
			"alice",
			Role::Subscriber,
			600,
			0,
		)
		.unwrap();

		let rtc = rtc(&token);
		assert_eq!(rtc.uid, "alice");
		assert_eq!(rtc.privileges.len(), 1);
		assert_eq!(rtc.privilege(Privilege::PublishAudioStream), None);
	}

	#[test]
	fn test_expiring_at() {
		let token = RtcTokenBuilder::build_token_expiring_at(
			APP_ID,
			APP_CERTIFICATE,
			"room-42",
			"user123",
			Role::Publisher,
			1_700_000_000,
			1_700_003_600,
		)
		.unwrap();

		let parsed = AccessToken::parse(&token).unwrap();
		assert_eq!(parsed.issue_ts, 1_700_000_000);
		assert_eq!(parsed.expires_at(), 1_700_003_600);
		assert_eq!(rtc(&token).privilege(Privilege::PublishVideoStream), Some(3600));
	}

	#[test]
	fn test_expiring_before_issue() {
		let err = RtcTokenBuilder::build_token_expiring_at(
			APP_ID,
			APP_CERTIFICATE,
			"room",
			"user",
			Role::Publisher,
			100,
			50,
		);
		assert_eq!(err, Err(Error::InvalidExpiration));
	}

	#[test]
	fn test_role_parse() {
		assert_eq!("publisher".parse::<Role>(), Ok(Role::Publisher));
		assert_eq!("subscriber".parse::<Role>(), Ok(Role::Subscriber));
		assert!("admin".parse::<Role>().is_err());
		assert_eq!(Role::Subscriber.to_string(), "subscriber");
	}
}
