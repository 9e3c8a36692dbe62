//! Moderation decisions for messages carrying party links.

use serde::{Deserialize, Serialize};

use crate::link::classify::ResolvedLink;

/// Per-guild party link settings.
///
/// Missing flags take their default value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuildPolicy {
    /// Announce detected links.
    pub detect: bool,
    /// Delete sandbox links.
    pub delete: bool,
    /// Delete team deathmatch links.
    pub tdm_delete: bool,
    /// Delete every party link without notice.
    pub all_delete: bool,
}

impl Default for GuildPolicy {
    fn default() -> Self {
        Self {
            detect: true,
            delete: true,
            tdm_delete: false,
            all_delete: false,
        }
    }
}

/// Why a message was deleted with a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Tdm,
    Sandbox,
}

/// What to do with a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    None,
    DeleteSilent,
    DeleteWithNotice {
        kind: NoticeKind,
        links: Vec<ResolvedLink>,
    },
    DetectNotify {
        links: Vec<ResolvedLink>,
    },
}

/// Decide on a message's resolved links.
///
/// Immune authors are never acted on. Otherwise the first matching rule
/// wins: delete everything, delete TDM, delete sandbox, announce.
pub fn decide(links: Vec<ResolvedLink>, policy: &GuildPolicy, is_author_immune: bool) -> Action {
    if is_author_immune {
        return Action::None;
    }

    if policy.all_delete {
        return Action::DeleteSilent;
    }

    let (any_tdm, any_sandbox) = links.iter().map(ResolvedLink::classify).fold(
        (false, false),
        |(tdm, sandbox), c| (tdm || c.is_tdm, sandbox || c.is_sandbox),
    );

    if policy.tdm_delete && any_tdm {
        Action::DeleteWithNotice {
            kind: NoticeKind::Tdm,
            links,
        }
    } else if policy.delete && any_sandbox {
        Action::DeleteWithNotice {
            kind: NoticeKind::Sandbox,
            links,
        }
    } else if policy.detect && !links.is_empty() {
        Action::DetectNotify { links }
    } else {
        Action::None
    }
}
