//! Coarse device classification from the raw user-agent string.
//!
//! Parsed exactly once at session creation and persisted; reads never
//! re-derive these fields, so the parse must stay deterministic.

use serde::Serialize;

const UNKNOWN: &str = "unknown";

/// Device/browser/OS classification stored alongside a session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub device_type: String,
    pub browser: String,
    pub os: String,
}

impl DeviceInfo {
    /// Classify a user agent. `None` or an empty string yields all-unknown.
    #[must_use]
    pub fn from_user_agent(user_agent: Option<&str>) -> Self {
        let Some(ua) = user_agent.map(str::trim).filter(|ua| !ua.is_empty()) else {
            return Self::unknown();
        };

        Self {
            device_type: device_type(ua).to_string(),
            browser: browser(ua).to_string(),
            os: os(ua).to_string(),
        }
    }

    #[must_use]
    pub fn unknown() -> Self {
        Self {
            device_type: UNKNOWN.to_string(),
            browser: UNKNOWN.to_string(),
            os: UNKNOWN.to_string(),
        }
    }
}

fn device_type(ua: &str) -> &'static str {
    if ua.contains("iPad") || ua.contains("Tablet") {
        "tablet"
    } else if ua.contains("Mobi") || ua.contains("iPhone") || ua.contains("Android") {
        "mobile"
    } else if ua.contains("bot") || ua.contains("Bot") || ua.contains("crawler") {
        "bot"
    } else {
        "desktop"
    }
}

fn browser(ua: &str) -> &'static str {
    // Order matters: Chrome-family agents also advertise Safari, and
    // Edge/Opera also advertise Chrome.
    if ua.contains("Edg/") || ua.contains("Edge/") {
        "Edge"
    } else if ua.contains("OPR/") || ua.contains("Opera") {
        "Opera"
    } else if ua.contains("Firefox/") {
        "Firefox"
    } else if ua.contains("Chrome/") || ua.contains("CriOS") {
        "Chrome"
    } else if ua.contains("Safari/") {
        "Safari"
    } else if ua.contains("MSIE") || ua.contains("Trident/") {
        "Internet Explorer"
    } else {
        UNKNOWN
    }
}

fn os(ua: &str) -> &'static str {
    // iOS and Android checks come before the generic Mac/Linux tokens
    // their agents also carry.
    if ua.contains("iPhone") || ua.contains("iPad") || ua.contains("iOS") {
        "iOS"
    } else if ua.contains("Android") {
        "Android"
    } else if ua.contains("Windows") {
        "Windows"
    } else if ua.contains("Mac OS X") || ua.contains("Macintosh") {
        "macOS"
    } else if ua.contains("CrOS") {
        "ChromeOS"
    } else if ua.contains("Linux") {
        "Linux"
    } else {
        UNKNOWN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHROME_WINDOWS: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
        AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
    const SAFARI_IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) \
        AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";
    const FIREFOX_LINUX: &str =
        "Mozilla/5.0 (X11; Linux x86_64; rv:120.0) Gecko/20100101 Firefox/120.0";
    const EDGE_WINDOWS: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
        AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.0.0";
    const SAFARI_IPAD: &str = "Mozilla/5.0 (iPad; CPU OS 16_6 like Mac OS X) \
        AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.6 Mobile/15E148 Safari/604.1";

    #[test]
    fn chrome_on_windows_desktop() {
        let info = DeviceInfo::from_user_agent(Some(CHROME_WINDOWS));
        assert_eq!(info.device_type, "desktop");
        assert_eq!(info.browser, "Chrome");
        assert_eq!(info.os, "Windows");
    }

    #[test]
    fn safari_on_iphone_is_mobile() {
        let info = DeviceInfo::from_user_agent(Some(SAFARI_IPHONE));
        assert_eq!(info.device_type, "mobile");
        assert_eq!(info.browser, "Safari");
        assert_eq!(info.os, "iOS");
    }

    #[test]
    fn firefox_on_linux() {
        let info = DeviceInfo::from_user_agent(Some(FIREFOX_LINUX));
        assert_eq!(info.device_type, "desktop");
        assert_eq!(info.browser, "Firefox");
        assert_eq!(info.os, "Linux");
    }

    #[test]
    fn edge_wins_over_chrome_token() {
        let info = DeviceInfo::from_user_agent(Some(EDGE_WINDOWS));
        assert_eq!(info.browser, "Edge");
    }

    #[test]
    fn ipad_is_tablet() {
        let info = DeviceInfo::from_user_agent(Some(SAFARI_IPAD));
        assert_eq!(info.device_type, "tablet");
        assert_eq!(info.os, "iOS");
    }

    #[test]
    fn missing_or_empty_agent_is_unknown() {
        assert_eq!(DeviceInfo::from_user_agent(None), DeviceInfo::unknown());
        assert_eq!(DeviceInfo::from_user_agent(Some("  ")), DeviceInfo::unknown());
    }

    #[test]
    fn classification_is_deterministic() {
        let first = DeviceInfo::from_user_agent(Some(CHROME_WINDOWS));
        let second = DeviceInfo::from_user_agent(Some(CHROME_WINDOWS));
        assert_eq!(first, second);
    }
}
