//! Resolved links and their risk classification.

use std::net::Ipv4Addr;

use crate::link::code::{InviteCode, MIN_CODE_LEN};
use crate::link::record::{DirectoryRecord, Mode};

/// Base URL of a party link.
pub const LINK_BASE: &str = "http://diep.io/#";

/// A party code whose address is listed in the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLink {
    pub code: InviteCode,
    pub record: DirectoryRecord,
}

impl ResolvedLink {
    pub fn new(code: InviteCode, record: DirectoryRecord) -> Self {
        Self { code, record }
    }

    /// Full clickable link.
    pub fn link(&self) -> String {
        format!("{}{}", LINK_BASE, self.code)
    }

    pub fn code_length(&self) -> usize {
        self.code.len()
    }

    pub fn address(&self) -> Ipv4Addr {
        self.code.address()
    }

    pub fn mode(&self) -> Mode {
        self.record.mode()
    }

    pub fn classify(&self) -> Classification {
        classify(self)
    }
}

/// Risk flags for a resolved link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Classification {
    pub is_sandbox: bool,
    pub is_tdm: bool,
}

/// Classify a resolved link.
///
/// Any code longer than the minimum counts as sandbox, whatever the
/// server's mode. 24-digit codes from ordinary servers are flagged too;
/// moderation settings rely on that.
pub fn classify(link: &ResolvedLink) -> Classification {
    let mode = link.record.mode();
    Classification {
        is_sandbox: mode == Mode::Sandbox || link.code.len() > MIN_CODE_LEN,
        is_tdm: mode.name().ends_with("TDM"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(code: &str, name: &str) -> ResolvedLink {
        let code = InviteCode::parse(code).unwrap();
        let record = DirectoryRecord::new(format!("{}:443", code.address()), name).unwrap();
        ResolvedLink::new(code, record)
    }

    const CODE_20: &str = "0A141E28001122334455";
    const CODE_22: &str = "0A141E2800112233445566";
    const CODE_24: &str = "0A141E280011223344556677";

    #[test]
    fn test_sandbox_mode() {
        let c = classify(&link(CODE_20, "vultr-la:sandbox:"));
        assert!(c.is_sandbox);
        assert!(!c.is_tdm);
    }

    #[test]
    fn test_ffa_short_code_is_clean() {
        assert_eq!(classify(&link(CODE_20, "vultr-la::")), Classification::default());
    }

    #[test]
    fn test_long_codes_flag_sandbox_regardless_of_mode() {
        assert!(classify(&link(CODE_22, "vultr-la::")).is_sandbox);
        assert!(classify(&link(CODE_22, "vultr-la:maze:")).is_sandbox);
    }

    #[test]
    fn test_24_digit_code_over_fires() {
        // Known quirk: ordinary 24-digit codes are reported as sandbox
        let c = classify(&link(CODE_24, "vultr-la:teams:"));
        assert!(c.is_sandbox);
        assert!(c.is_tdm);
    }

    #[test]
    fn test_tdm_modes() {
        assert!(classify(&link(CODE_20, "vultr-la:teams:")).is_tdm);
        assert!(classify(&link(CODE_20, "vultr-la:4teams:")).is_tdm);
        assert!(!classify(&link(CODE_20, "vultr-la:dom:")).is_tdm);
        assert!(!classify(&link(CODE_20, "vultr-la:maze:")).is_tdm);
    }

    #[test]
    fn test_classify_is_pure() {
        let l = link(CODE_22, "vultr-la:4teams:");
        assert_eq!(classify(&l), classify(&l));
        assert_eq!(l.classify(), classify(&l));
    }

    #[test]
    fn test_link_rendering() {
        let l = link(CODE_20, "vultr-la::");
        assert_eq!(l.link(), "http://diep.io/#0A141E28001122334455");
        assert_eq!(l.code_length(), 20);
        assert_eq!(l.address().to_string(), "160.65.225.130");
    }
}
