//! Append-only audit log and comment thread
use crate::document::Document;
use crate::request::TimeStamp;
use crate::state::RequestState;
use chrono::Utc;

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryAction {
    #[n(0)]
    Create,
    #[n(1)]
    Approve,
    #[n(2)]
    Reject,
    #[n(3)]
    SubmitDocument,
    #[n(4)]
    RequestAppeal,
    #[n(5)]
    Close,
}

/// One record per accepted transition. Written once, never mutated.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    #[n(0)]
    pub timestamp: TimeStamp<Utc>,
    #[n(1)]
    pub actor: String,
    #[n(2)]
    pub action: HistoryAction,
    #[n(3)]
    pub description: String,
    #[n(4)]
    pub from_state: RequestState,
    #[n(5)]
    pub to_state: RequestState,
}

/// Free-text remark, independent of workflow state. Comments are not
/// deduplicated, two identical appends are two entries.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    #[n(0)]
    pub timestamp: TimeStamp<Utc>,
    #[n(1)]
    pub actor: String,
    #[n(2)]
    pub content: String,
    #[n(3)]
    pub attachments: Vec<Document>,
}

/// Where a `DocumentRejected` resubmission returns to: the `from_state` of
/// the most recent rejection that landed in `DocumentRejected`. The same
/// rejection state serves both the contract-review and deed-review loops, so
/// recency matters when a request was bounced from both.
pub fn last_rejection_target(history: &[HistoryEntry]) -> Option<RequestState> {
    history
        .iter()
        .rev()
        .find(|entry| {
            entry.action == HistoryAction::Reject
                && entry.to_state == RequestState::DocumentRejected
        })
        .map(|entry| entry.from_state)
}
