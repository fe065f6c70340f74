use lazy_static::lazy_static;

use crate::protocol::ClientSdkInfo;

/// The version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

lazy_static! {
    /// The user agent the SDK reports.
    pub static ref USER_AGENT: String = format!("xrayradar.rust/{}", VERSION);
    /// The SDK identification attached to every event.
    pub static ref SDK_INFO: ClientSdkInfo = ClientSdkInfo {
        name: "xrayradar.rust".into(),
        version: VERSION.into(),
    };
}
