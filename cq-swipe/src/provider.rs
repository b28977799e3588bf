//! Candidate queue provider
//!
//! One fetch per session: ask the backend for the ranked list, drop
//! non-viable records, normalize identities and deduplicate.

use crate::candidate::Candidate;
use crate::client::MatchApi;
use crate::error::FetchError;
use cq_common::events::MatchMode;
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Fetch and filter the candidate queue for a session
///
/// Order is preserved. Records that are not JSON objects or have a
/// non-positive score are discarded. For repeated identities the first
/// occurrence wins. Placeholder identities are kept (each is its own card)
/// and reported to the caller through `Identity::is_placeholder`.
pub async fn fetch_queue(
    api: &dyn MatchApi,
    mode: MatchMode,
    related_context_id: Option<&str>,
) -> Result<Vec<Candidate>, FetchError> {
    let records = api.list_candidates(mode, related_context_id).await?;
    let received = records.len();

    let queue = build_queue(records);

    info!(
        mode = %mode,
        received,
        accepted = queue.len(),
        "Candidate queue ready"
    );
    Ok(queue)
}

/// Filter, normalize and deduplicate raw records
pub fn build_queue(records: Vec<Value>) -> Vec<Candidate> {
    let mut seen = HashSet::new();
    let mut queue = Vec::with_capacity(records.len());

    for record in records {
        let Value::Object(record) = record else {
            warn!("Skipping candidate record that is not an object");
            continue;
        };

        let Some(candidate) = Candidate::from_record(record) else {
            continue;
        };

        let identity = candidate.identity();
        if !identity.is_placeholder() && !seen.insert(identity.clone()) {
            debug!(identity = %identity, "Dropping duplicate candidate");
            continue;
        }

        queue.push(candidate);
    }

    queue
}
