//! Running the extractor over many messages.
//!
//! Extraction has no shared state, so batches run in parallel. The
//! "newest message wins" policy lives here, outside the extractor.

use std::cmp::Reverse;

use rayon::prelude::*;
use tracing::debug;

use crate::extractor::Extractor;
use crate::model::{CodeMatch, EmailMessage};

/// Extracts from every message in parallel. Output order matches input order.
#[must_use]
pub fn extract_all(extractor: &Extractor, messages: &[EmailMessage]) -> Vec<Option<CodeMatch>> {
    messages.par_iter().map(|m| extractor.extract(m)).collect()
}

/// Evaluates messages newest first and stops at the first accepted code.
///
/// Messages with equal timestamps keep their input order.
#[must_use]
pub fn first_code<'a>(
    extractor: &Extractor,
    messages: &'a [EmailMessage],
) -> Option<(&'a EmailMessage, CodeMatch)> {
    let mut newest_first: Vec<&EmailMessage> = messages.iter().collect();
    newest_first.sort_by_key(|m| Reverse(m.timestamp));

    newest_first.into_iter().find_map(|message| {
        let found = extractor.extract(message)?;
        debug!(id = %message.id, timestamp = message.timestamp, code = %found.code, "code found");
        Some((message, found))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn extractor() -> Extractor {
        Extractor::with_default_tables().unwrap()
    }

    fn batch() -> Vec<EmailMessage> {
        vec![
            EmailMessage::new("Your verification code", "Your code is 918273")
                .with_timestamp(1_000)
                .with_id("old"),
            EmailMessage::new("Newsletter", "Nothing to see here")
                .with_timestamp(3_000)
                .with_id("newest"),
            EmailMessage::new("Your verification code", "Your code is 560471")
                .with_timestamp(2_000)
                .with_id("middle"),
        ]
    }

    #[test]
    fn test_extract_all_preserves_order() {
        let results = extract_all(&extractor(), &batch());
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().code, "918273");
        assert!(results[1].is_none());
        assert_eq!(results[2].as_ref().unwrap().code, "560471");
    }

    #[test]
    fn test_first_code_prefers_newest_accepted() {
        let messages = batch();
        let (message, found) = first_code(&extractor(), &messages).unwrap();
        assert_eq!(message.id, "middle");
        assert_eq!(found.code, "560471");
    }

    #[test]
    fn test_first_code_none_when_all_abstain() {
        let messages = vec![EmailMessage::new("Hello", "See you at 3:30pm")];
        assert!(first_code(&extractor(), &messages).is_none());
    }

    #[test]
    fn test_first_code_empty_batch() {
        assert!(first_code(&extractor(), &[]).is_none());
    }
}
