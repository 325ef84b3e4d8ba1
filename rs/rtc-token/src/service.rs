use std::collections::BTreeMap;

use bytes::{Buf, BufMut};
use serde::Serialize;

use crate::coding::{Decode, DecodeError, Encode, MAX_LEN};

/// Privileges granted inside an RTC channel.
///
/// The value stored alongside each privilege is its lifetime in seconds, relative to the token's issue time.
/// A lifetime of zero means the privilege lasts as long as the token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u16)]
pub enum Privilege {
	JoinChannel = 1,
	PublishAudioStream = 2,
	PublishVideoStream = 3,
	PublishDataStream = 4,
}

/// A set of privileges scoped to a single product.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Service {
	Rtc(ServiceRtc),
	Rtm(ServiceRtm),
}

impl Service {
	pub const RTC: u16 = 1;
	pub const RTM: u16 = 2;

	pub fn kind(&self) -> u16 {
		match self {
			Self::Rtc(_) => Self::RTC,
			Self::Rtm(_) => Self::RTM,
		}
	}

	pub fn privileges(&self) -> &BTreeMap<u16, u32> {
		match self {
			Self::Rtc(rtc) => &rtc.privileges,
			Self::Rtm(rtm) => &rtm.privileges,
		}
	}

	/// Every string field must fit its `u16` length prefix.
	pub(crate) fn check(&self) -> crate::Result<()> {
		let fits = match self {
			Self::Rtc(rtc) => rtc.channel_name.len() <= MAX_LEN && rtc.uid.len() <= MAX_LEN,
			Self::Rtm(rtm) => rtm.user_id.len() <= MAX_LEN,
		};

		match fits {
			true => Ok(()),
			false => Err(crate::Error::FieldTooLong),
		}
	}
}

impl From<ServiceRtc> for Service {
	fn from(rtc: ServiceRtc) -> Self {
		Self::Rtc(rtc)
	}
}

impl From<ServiceRtm> for Service {
	fn from(rtm: ServiceRtm) -> Self {
		Self::Rtm(rtm)
	}
}

impl Encode for Service {
	fn encode<W: BufMut>(&self, w: &mut W) {
		self.kind().encode(w);
		self.privileges().encode(w);

		match self {
			Self::Rtc(rtc) => {
				rtc.channel_name.encode(w);
				rtc.uid.encode(w);
			}
			Self::Rtm(rtm) => rtm.user_id.encode(w),
		}
	}
}

impl Decode for Service {
	fn decode<B: Buf>(r: &mut B) -> Result<Self, DecodeError> {
		let kind = u16::decode(r)?;
		let privileges = BTreeMap::decode(r)?;

		match kind {
			Self::RTC => Ok(Self::Rtc(ServiceRtc {
				privileges,
				channel_name: String::decode(r)?,
				uid: String::decode(r)?,
			})),
			Self::RTM => Ok(Self::Rtm(ServiceRtm {
				privileges,
				user_id: String::decode(r)?,
			})),
			_ => Err(DecodeError::UnknownService(kind)),
		}
	}
}

/// Access to a named audio/video channel.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ServiceRtc {
	pub channel_name: String,

	/// The user allowed to join, or empty for any user.
	pub uid: String,

	pub privileges: BTreeMap<u16, u32>,
}

impl ServiceRtc {
	/// Create a service for a user account (any string).
	pub fn new(channel_name: impl Into<String>, account: impl Into<String>) -> Self {
		Self {
			channel_name: channel_name.into(),
			uid: account.into(),
			privileges: BTreeMap::new(),
		}
	}

	/// Create a service for a numeric uid, where 0 allows any user.
	pub fn with_uid(channel_name: impl Into<String>, uid: u32) -> Self {
		let account = match uid {
			0 => String::new(),
			uid => uid.to_string(),
		};

		Self::new(channel_name, account)
	}

	pub fn add_privilege(&mut self, privilege: Privilege, expire: u32) -> &mut Self {
		self.privileges.insert(privilege as u16, expire);
		self
	}

	pub fn privilege(&self, privilege: Privilege) -> Option<u32> {
		self.privileges.get(&(privilege as u16)).copied()
	}
}

/// Access to the real-time messaging product.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ServiceRtm {
	pub user_id: String,
	pub privileges: BTreeMap<u16, u32>,
}

impl ServiceRtm {
	pub const PRIVILEGE_LOGIN: u16 = 1;

	pub fn new(user_id: impl Into<String>) -> Self {
		Self {
			user_id: user_id.into(),
			privileges: BTreeMap::new(),
		}
	}

	pub fn add_login(&mut self, expire: u32) -> &mut Self {
		self.privileges.insert(Self::PRIVILEGE_LOGIN, expire);
		self
	}
}
