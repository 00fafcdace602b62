//! WeChat mini-program identity headers.
//!
//! The WeChat gateway injects these on every forwarded request; the
//! identity middleware copies them into a request-scoped extension so
//! handlers never touch raw headers.

use serde::{Deserialize, Serialize};

pub const WX_OPEN_ID: &str = "X-WX-OPENID";
pub const WX_APP_ID: &str = "X-WX-APPID";
pub const WX_UNION_ID: &str = "X-WX-UNIONID";
pub const WX_ENV: &str = "X-WX-ENV";

/// Caller identity extracted from the WX headers.
///
/// Absent headers become empty strings — an anonymous caller, not an
/// error; handlers that need ownership checks compare against `user_id`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestIdentity {
    pub user_id: String,
    pub app_id: String,
    pub union_id: String,
    pub env: String,
}

impl RequestIdentity {
    pub fn is_anonymous(&self) -> bool {
        self.user_id.is_empty()
    }
}
