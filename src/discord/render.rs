//! Rendering of moderation actions into Discord messages.

use serenity::builder::{CreateEmbed, CreateMessage};

use crate::link::classify::ResolvedLink;
use crate::link::decision::NoticeKind;

/// Discord allows at most this many embeds per message.
const MAX_EMBEDS_PER_MESSAGE: usize = 10;

/// Notice posted when a message is deleted for its links.
pub fn notice_text(kind: NoticeKind, mention: &str) -> String {
    match kind {
        NoticeKind::Tdm => format!("{} TDM links are not allowed here.", mention),
        NoticeKind::Sandbox => format!(
            "{} Please DM (direct message) your sandbox links, unless you want Arena Closers",
            mention
        ),
    }
}

/// Headline for a detection announcement.
pub fn detection_header(count: usize) -> String {
    let plural = if count == 1 { "" } else { "S" };
    format!("**__PARTY LINK{} DETECTED!__**", plural)
}

/// Name/value pairs shown for a link, in display order.
pub fn link_fields(link: &ResolvedLink) -> Vec<(&'static str, String)> {
    vec![
        ("Code", link.code.to_string()),
        ("Code Length", link.code_length().to_string()),
        ("IP", link.address().to_string()),
        ("Mode", link.mode().to_string()),
        ("Company", link.record.company().to_string()),
        ("Location", link.record.location().to_string()),
    ]
}

pub fn link_embed(link: &ResolvedLink) -> CreateEmbed {
    let url = link.link();
    let embed = CreateEmbed::new()
        .title(&url)
        .url(&url)
        .colour(link.mode().colour());

    link_fields(link)
        .into_iter()
        .fold(embed, |embed, (name, value)| embed.field(name, value, true))
}

/// Detection announcement, split across messages when there are more
/// links than one message can carry. Only the first message has the
/// headline.
pub fn detection_messages(links: &[ResolvedLink]) -> Vec<CreateMessage> {
    links
        .chunks(MAX_EMBEDS_PER_MESSAGE)
        .enumerate()
        .map(|(i, chunk)| {
            let message = CreateMessage::new().embeds(chunk.iter().map(link_embed).collect());
            if i == 0 {
                message.content(detection_header(links.len()))
            } else {
                message
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::code::InviteCode;
    use crate::link::record::DirectoryRecord;

    fn link() -> ResolvedLink {
        let code = InviteCode::parse("0A141E28001122334455").unwrap();
        let record = DirectoryRecord::new("160.65.225.130:443", "vultr-miami:4teams:").unwrap();
        ResolvedLink::new(code, record)
    }

    #[test]
    fn test_notice_text() {
        assert_eq!(
            notice_text(NoticeKind::Tdm, "<@1>"),
            "<@1> TDM links are not allowed here."
        );
        assert!(notice_text(NoticeKind::Sandbox, "<@1>").starts_with("<@1> Please DM"));
    }

    #[test]
    fn test_detection_header() {
        assert_eq!(detection_header(1), "**__PARTY LINK DETECTED!__**");
        assert_eq!(detection_header(3), "**__PARTY LINKS DETECTED!__**");
    }

    #[test]
    fn test_link_fields() {
        let fields = link_fields(&link());
        assert_eq!(
            fields,
            vec![
                ("Code", "0A141E28001122334455".to_string()),
                ("Code Length", "20".to_string()),
                ("IP", "160.65.225.130".to_string()),
                ("Mode", "4-TDM".to_string()),
                ("Company", "Vultr".to_string()),
                ("Location", "miami".to_string()),
            ]
        );
    }

    #[test]
    fn test_detection_messages_chunked() {
        assert_eq!(detection_messages(&[link()]).len(), 1);
        assert_eq!(detection_messages(&vec![link(); 10]).len(), 1);
        assert_eq!(detection_messages(&vec![link(); 11]).len(), 2);
        assert!(detection_messages(&[]).is_empty());
    }
}
