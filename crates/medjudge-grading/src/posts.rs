//! Recover write calls from episode history.
//!
//! History records a write as an agent entry
//!
//! ```text
//! POST <base-url>/<resource_type>
//! <payload json>
//! ```
//!
//! answered by an environment entry carrying the write acknowledgment. Only
//! acknowledged writes count; an agent line that is not followed by the
//! acknowledgment, or whose payload does not parse, is skipped.

use serde_json::Value;

use medjudge_contracts::history::{HistoryEntry, Role};
use medjudge_ledger::WRITE_ACKNOWLEDGMENT;

/// One acknowledged write recovered from history.
#[derive(Debug, Clone, PartialEq)]
pub struct PostRecord {
    pub url: String,
    /// The path after `<base-url>/`, when the url is under `base_url`.
    pub resource_type: Option<String>,
    pub payload: Value,
}

/// Return every acknowledged write in `history`, in order.
pub fn extract_posts(history: &[HistoryEntry], base_url: &str) -> Vec<PostRecord> {
    let prefix = format!("{}/", base_url.trim_end_matches('/'));

    history
        .windows(2)
        .filter_map(|pair| {
            let (request, reply) = (&pair[0], &pair[1]);
            if request.role != Role::Agent
                || reply.role != Role::Environment
                || !reply.content.contains(WRITE_ACKNOWLEDGMENT)
            {
                return None;
            }

            let (first_line, body) = request.content.split_once('\n')?;
            let url = first_line.strip_prefix("POST ")?.trim().to_string();
            let payload: Value = serde_json::from_str(body).ok()?;
            let resource_type = url.strip_prefix(&prefix).map(str::to_string);

            Some(PostRecord {
                url,
                resource_type,
                payload,
            })
        })
        .collect()
}

/// True when `history` holds at least one acknowledged write.
pub fn has_post(history: &[HistoryEntry], base_url: &str) -> bool {
    !extract_posts(history, base_url).is_empty()
}
