//! Session enrichment via user agent parsing.
//!
//! Fills a session's device, browser and OS from `metadata.userAgent`, falling
//! back to the request's `User-Agent` header. String values the client put in
//! `metadata.device`, `metadata.browser` or `metadata.os` take precedence.

use collector_core::limits::MAX_USER_AGENT_LEN;
use collector_core::{DeviceInfo, Session, UNKNOWN};
use woothee::parser::Parser;

/// Parses user agents into [`DeviceInfo`] with woothee.
pub struct UserAgentEnricher {
    parser: Parser,
}

impl UserAgentEnricher {
    pub fn new() -> Self {
        Self {
            parser: Parser::new(),
        }
    }

    /// Parse one user agent string. Unrecognized parts stay "unknown".
    pub fn parse(&self, user_agent: &str) -> DeviceInfo {
        let mut info = DeviceInfo::default();
        let user_agent = user_agent.trim();
        if user_agent.is_empty() || user_agent.len() > MAX_USER_AGENT_LEN {
            return info;
        }

        if let Some(result) = self.parser.parse(user_agent) {
            if known(result.name) {
                info.browser = result.name.to_string();
            }
            if known(result.os) {
                info.os = result.os.to_string();
            }
            // woothee categories: pc, smartphone, mobilephone, crawler, appliance, misc
            info.device = match result.category {
                "pc" => "desktop",
                "smartphone" | "mobilephone" => "mobile",
                "crawler" => "bot",
                "appliance" => "other",
                _ => UNKNOWN,
            }
            .to_string();
        }

        info
    }

    /// Fill in the session's device fields.
    pub fn enrich(&self, session: &mut Session, header_user_agent: Option<&str>) {
        let user_agent = session
            .metadata_str("userAgent")
            .or(header_user_agent)
            .unwrap_or_default();
        let mut info = self.parse(user_agent);

        if let Some(device) = explicit(session, "device") {
            info.device = device;
        }
        if let Some(browser) = explicit(session, "browser") {
            info.browser = browser;
        }
        if let Some(os) = explicit(session, "os") {
            info.os = os;
        }

        session.device = info;
    }
}

impl Default for UserAgentEnricher {
    fn default() -> Self {
        Self::new()
    }
}

fn known(value: &str) -> bool {
    !value.is_empty() && value != "UNKNOWN"
}

fn explicit(session: &Session, key: &str) -> Option<String> {
    session
        .metadata_str(key)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
