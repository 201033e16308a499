//! Provider identifiers

use std::fmt;

use serde::{Deserialize, Serialize};

/// The external systems touched during onboarding, in invocation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Organizational directory (account + default group)
    Directory,
    /// Video conferencing (account lookup + optional group)
    Conferencing,
    /// File sharing (shared folder membership)
    FileShare,
    /// Team chat (welcome announcement)
    Chat,
}

impl ProviderKind {
    /// Every provider, in the order the orchestrator runs them
    pub const ALL: [ProviderKind; 4] = [
        ProviderKind::Directory,
        ProviderKind::Conferencing,
        ProviderKind::FileShare,
        ProviderKind::Chat,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Directory => "directory",
            ProviderKind::Conferencing => "conferencing",
            ProviderKind::FileShare => "file_share",
            ProviderKind::Chat => "chat",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
