//! Per-run provider outcomes

use std::collections::BTreeMap;

use crate::error::ProvisionError;
use crate::models::ProviderKind;

/// Result of every provider call made during one onboarding run
///
/// Entries keep the order in which providers were invoked.
#[derive(Debug, Default)]
pub struct OutcomeRecord {
    outcomes: Vec<(ProviderKind, Result<(), ProvisionError>)>,
}

impl OutcomeRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the outcome of one provider, replacing an earlier entry for the same provider
    pub fn record(&mut self, kind: ProviderKind, result: Result<(), ProvisionError>) {
        if let Some(slot) = self.outcomes.iter_mut().find(|(k, _)| *k == kind) {
            slot.1 = result;
        } else {
            self.outcomes.push((kind, result));
        }
    }

    /// Whether `kind` ran and succeeded
    pub fn succeeded(&self, kind: ProviderKind) -> bool {
        self.get(kind).is_some_and(|result| result.is_ok())
    }

    pub fn get(&self, kind: ProviderKind) -> Option<&Result<(), ProvisionError>> {
        self.outcomes
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, result)| result)
    }

    /// Logical AND over every recorded outcome
    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(|(_, result)| result.is_ok())
    }

    /// Outcomes in invocation order
    pub fn iter(&self) -> impl Iterator<Item = (ProviderKind, &Result<(), ProvisionError>)> {
        self.outcomes.iter().map(|(kind, result)| (*kind, result))
    }

    pub fn failures(&self) -> impl Iterator<Item = (ProviderKind, &ProvisionError)> {
        self.outcomes
            .iter()
            .filter_map(|(kind, result)| result.as_ref().err().map(|err| (*kind, err)))
    }

    /// Boolean view keyed by provider name
    pub fn as_flags(&self) -> BTreeMap<&'static str, bool> {
        self.outcomes
            .iter()
            .map(|(kind, result)| (kind.as_str(), result.is_ok()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_succeeded_requires_every_provider() {
        let mut outcome = OutcomeRecord::new();
        for kind in ProviderKind::ALL {
            outcome.record(kind, Ok(()));
        }
        assert!(outcome.all_succeeded());

        outcome.record(
            ProviderKind::FileShare,
            Err(ProvisionError::transport("connection refused")),
        );
        assert!(!outcome.all_succeeded());
        assert!(outcome.succeeded(ProviderKind::Directory));
        assert!(!outcome.succeeded(ProviderKind::FileShare));
        assert_eq!(outcome.len(), 4);
    }

    #[test]
    fn preserves_invocation_order() {
        let mut outcome = OutcomeRecord::new();
        outcome.record(ProviderKind::Chat, Ok(()));
        outcome.record(ProviderKind::Directory, Ok(()));

        let order: Vec<_> = outcome.iter().map(|(kind, _)| kind).collect();
        assert_eq!(order, vec![ProviderKind::Chat, ProviderKind::Directory]);
    }

    #[test]
    fn unknown_provider_is_not_a_success() {
        let outcome = OutcomeRecord::new();
        assert!(!outcome.succeeded(ProviderKind::Conferencing));
        assert!(outcome.get(ProviderKind::Conferencing).is_none());
    }

    #[test]
    fn failures_and_flags_report_each_provider() {
        let mut outcome = OutcomeRecord::new();
        outcome.record(ProviderKind::Directory, Ok(()));
        outcome.record(
            ProviderKind::Chat,
            Err(ProvisionError::rejected(200, Some("channel_not_found"))),
        );

        let failures: Vec<_> = outcome.failures().map(|(kind, _)| kind).collect();
        assert_eq!(failures, vec![ProviderKind::Chat]);

        let flags = outcome.as_flags();
        assert_eq!(flags.get("directory"), Some(&true));
        assert_eq!(flags.get("chat"), Some(&false));
    }
}
