//! diep.io party link detection.
//!
//! Message text flows through [`extract::LinkExtractor`], then each
//! candidate is validated and decoded ([`code`]), resolved against the
//! active [`directory::DirectorySnapshot`], classified ([`classify`])
//! and finally judged by [`decision::decide`].

pub mod classify;
pub mod code;
pub mod decision;
pub mod directory;
pub mod extract;
pub mod record;

pub use classify::{classify, Classification, ResolvedLink};
pub use code::InviteCode;
pub use decision::{decide, Action, GuildPolicy, NoticeKind};
pub use directory::{
    run_refresh_loop, DirectorySnapshot, DirectorySource, HttpDirectorySource, RefreshSettings,
    ServerDirectory,
};
pub use extract::LinkExtractor;
pub use record::{DirectoryRecord, Mode};

/// Resolve every party link in `text` against `snapshot`.
///
/// Invalid codes and codes whose server is not listed are dropped.
/// Order and duplicates follow the text.
pub fn scan(
    extractor: &LinkExtractor,
    text: &str,
    snapshot: &DirectorySnapshot,
) -> Vec<ResolvedLink> {
    resolve(&extractor.extract(text), snapshot)
}

/// Resolve already extracted candidates against `snapshot`.
pub fn resolve(candidates: &[String], snapshot: &DirectorySnapshot) -> Vec<ResolvedLink> {
    candidates
        .iter()
        .filter_map(|raw| InviteCode::parse(raw))
        .filter_map(|code| {
            let record = snapshot.lookup(&code.address().to_string())?.clone();
            Some(ResolvedLink::new(code, record))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn snapshot() -> DirectorySnapshot {
        DirectorySnapshot::new(
            vec![
                DirectoryRecord::new("160.65.225.130:443", "vultr-miami:teams:").unwrap(),
                DirectoryRecord::new("51.17.0.1:443", "ovh-fra:sandbox:").unwrap(),
            ],
            Utc::now(),
        )
    }

    #[test]
    fn test_scan_resolves_known_servers() {
        let extractor = LinkExtractor::new();
        // 33 11 00 10 -> 0x33 0x11 0x00 0x01 -> 51.17.0.1
        let text = "diep.io/#0A141E28001122334455 and http://diep.io/#33110010AABBCCDDEEFF";
        let links = scan(&extractor, text, &snapshot());

        assert_eq!(links.len(), 2);
        assert_eq!(links[0].record.location(), "miami");
        assert_eq!(links[0].mode(), Mode::TwoTeams);
        assert_eq!(links[1].record.company(), "Ovh");
        assert_eq!(links[1].mode(), Mode::Sandbox);
    }

    #[test]
    fn test_scan_drops_invalid_and_unknown() {
        let extractor = LinkExtractor::new();
        let text = concat!(
            "diep.io/#0A141E28 ",                   // too short
            "diep.io/#0A141E280011223344556 ",      // odd length
            "diep.io/#FFFFFFFF001122334455 ",       // not listed
            "diep.io/#0A141E28001122334455",
        );
        let links = scan(&extractor, text, &snapshot());

        assert_eq!(links.len(), 1);
        assert_eq!(links[0].code.as_str(), "0A141E28001122334455");
    }

    #[test]
    fn test_scan_keeps_duplicates() {
        let extractor = LinkExtractor::new();
        let text = "diep.io/#0A141E28001122334455 diep.io/#0A141E28001122334455";
        assert_eq!(scan(&extractor, text, &snapshot()).len(), 2);
    }

    #[test]
    fn test_scan_empty_directory() {
        let extractor = LinkExtractor::new();
        let text = "diep.io/#0A141E28001122334455";
        assert!(scan(&extractor, text, &DirectorySnapshot::empty()).is_empty());
    }

    #[test]
    fn test_end_to_end_decision() {
        let extractor = LinkExtractor::new();
        let text = "tdm time diep.io/#0A141E28001122334455";
        let links = scan(&extractor, text, &snapshot());
        let policy = GuildPolicy {
            tdm_delete: true,
            ..GuildPolicy::default()
        };

        match decide(links, &policy, false) {
            Action::DeleteWithNotice { kind, links } => {
                assert_eq!(kind, NoticeKind::Tdm);
                assert_eq!(links.len(), 1);
            }
            other => panic!("expected DeleteWithNotice, got {:?}", other),
        }
    }
}
