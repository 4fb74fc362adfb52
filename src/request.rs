//! The request aggregate and its persistence
use crate::details::RequestDetails;
use crate::document::{Document, DocumentKind};
use crate::error::WorkflowError;
use crate::history::{Comment, HistoryEntry};
use crate::state::RequestState;
use chrono::{DateTime, TimeZone, Utc};
use sled::{Db, IVec};

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    #[n(0)]
    Sale,
    #[n(1)]
    Lease,
}

/// Aggregate root for one sale-or-lease transaction moving through approval.
/// The engine is the only writer of `state`; `history` and `comments` are
/// append-only. Stored in sled as one CBOR blob keyed by `request_id`.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq)]
pub struct Request {
    #[n(0)]
    pub request_id: String, // uuid7, bech32 encoded with the request_ hrp
    #[n(1)]
    pub kind: RequestKind,
    #[n(2)]
    pub state: RequestState,
    #[n(3)]
    pub property_id: String,
    #[n(4)]
    pub requester: String,
    #[n(5)]
    pub reviewer: Option<String>, // last actor who approved or rejected
    #[n(6)]
    pub details: RequestDetails,
    #[n(7)]
    pub documents: Vec<Document>, // one slot per document kind
    #[n(8)]
    pub history: Vec<HistoryEntry>,
    #[n(9)]
    pub comments: Vec<Comment>,
    #[n(10)]
    pub appealed: bool,
    #[n(11)]
    pub version: u64,
    #[n(12)]
    pub created_at: TimeStamp<Utc>,
    #[n(13)]
    pub updated_at: TimeStamp<Utc>,
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone)]
pub struct TimeStamp<T: TimeZone>(DateTime<T>);

impl TimeStamp<Utc> {
    pub fn new() -> Self {
        Self(Utc::now())
    }
    pub fn new_with(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> Self {
        Utc.with_ymd_and_hms(year, month, day, hour, min, sec)
            .unwrap()
            .into()
    }
    pub fn to_datetime_utc(&self) -> DateTime<Utc> {
        self.0
    }
}

impl Default for TimeStamp<Utc> {
    fn default() -> Self {
        Self::new()
    }
}

impl Request {
    pub fn new(
        request_id: String,
        property_id: String,
        requester: String,
        details: RequestDetails,
    ) -> Self {
        let now = TimeStamp::new();
        Self {
            request_id,
            kind: details.kind(),
            state: RequestState::PendingCertificate,
            property_id,
            requester,
            reviewer: None,
            details,
            documents: vec![],
            history: vec![],
            comments: vec![],
            appealed: false,
            version: 0,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// The document currently attached under the given kind, if any.
    pub fn document(&self, kind: DocumentKind) -> Option<&Document> {
        self.documents.iter().find(|d| d.kind == kind)
    }

    /// Attach a document under its kind. Re-attaching overwrites the slot,
    /// the prior file stays in the document store untouched.
    pub fn attach_document(&mut self, document: Document) {
        match self.documents.iter_mut().find(|d| d.kind == document.kind) {
            Some(slot) => *slot = document,
            None => self.documents.push(document),
        }
    }

    pub fn append_history(&mut self, entry: HistoryEntry) {
        self.history.push(entry);
    }

    pub fn append_comment(&mut self, comment: Comment) {
        self.comments.push(comment);
    }

    /// Ordered readout of the audit log, one line per entry.
    pub fn view_history(&self) -> Vec<String> {
        self.history
            .iter()
            .map(|entry| {
                format!(
                    "{} {:?} by {}: {:?} -> {:?} ({})",
                    entry.timestamp.to_datetime_utc().to_rfc3339(),
                    entry.action,
                    entry.actor,
                    entry.from_state,
                    entry.to_state,
                    entry.description,
                )
            })
            .collect()
    }

    /// Load a request together with the raw bytes the decode came from. The
    /// bytes are what a later [`Request::save`] must swap against.
    pub fn load(db: &Db, request_id: &str) -> Result<(Self, IVec), WorkflowError> {
        let bytes = db
            .get(request_id.as_bytes())?
            .ok_or_else(|| WorkflowError::NotFound(request_id.to_owned()))?;
        let request = minicbor::decode(&bytes)?;
        Ok((request, bytes))
    }

    /// First insert. The slot must be vacant.
    pub fn insert_new(&self, db: &Db) -> Result<(), WorkflowError> {
        let encoded = minicbor::to_vec(self)?;
        db.compare_and_swap(self.request_id.as_bytes(), None as Option<&[u8]>, Some(encoded))?
            .map_err(|_| WorkflowError::ConcurrentModification(self.request_id.clone()))?;
        Ok(())
    }

    /// Persist against the snapshot read at load time. A writer holding a
    /// stale snapshot fails instead of clobbering the winner's history.
    pub fn save(&self, db: &Db, snapshot: &IVec) -> Result<(), WorkflowError> {
        let encoded = minicbor::to_vec(self)?;
        db.compare_and_swap(self.request_id.as_bytes(), Some(snapshot), Some(encoded))?
            .map_err(|_| WorkflowError::ConcurrentModification(self.request_id.clone()))?;
        Ok(())
    }
}

impl<T: TimeZone> From<DateTime<T>> for TimeStamp<T> {
    fn from(value: DateTime<T>) -> Self {
        TimeStamp(value)
    }
}

impl<C> minicbor::Encode<C> for TimeStamp<Utc> {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        if let Some(nsec) = self.0.timestamp_nanos_opt() {
            return e.i64(nsec)?.ok();
        }

        Err(minicbor::encode::Error::message(
            "failed to encode timestamp. timestamp_nanos_opt returned None",
        ))
    }
}

impl<'b, C> minicbor::Decode<'b, C> for TimeStamp<Utc> {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        let nsecs = d.i64()?;

        Ok(TimeStamp(DateTime::from_timestamp_nanos(nsecs)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::details::{LeaseDetails, RequestDetails};
    use crate::document::Document;

    fn lease_request() -> Request {
        let details = RequestDetails::Lease(
            LeaseDetails::new()
                .set_description("ground floor unit")
                .set_counterpart("Acme Ltd")
                .set_term_start(TimeStamp::new_with(2026, 1, 1, 0, 0, 0))
                .set_term_end(TimeStamp::new_with(2027, 1, 1, 0, 0, 0)),
        );
        Request::new(
            "request_test".into(),
            "property_test".into(),
            "user_test".into(),
            details,
        )
    }

    #[test]
    fn timestamp_encoding() {
        let original = TimeStamp::new();

        let encoding = minicbor::to_vec(original.clone()).unwrap();
        let decode: TimeStamp<Utc> = minicbor::decode(&encoding).unwrap();

        assert_eq!(original, decode);
    }

    #[test]
    fn request_encoding() {
        let original = lease_request();

        let encoding = minicbor::to_vec(&original).unwrap();
        let decode: Request = minicbor::decode(&encoding).unwrap();

        assert_eq!(original, decode);
    }

    #[test]
    fn kind_follows_details_variant() {
        let request = lease_request();
        assert_eq!(request.kind, RequestKind::Lease);
        assert_eq!(request.state, RequestState::PendingCertificate);
    }

    #[test]
    fn reattaching_overwrites_the_slot() {
        let mut request = lease_request();

        request.attach_document(Document {
            id: "doc_aaa".into(),
            kind: DocumentKind::LeaseContract,
            name: "contract-v1.pdf".into(),
            uploaded_at: TimeStamp::new(),
        });
        request.attach_document(Document {
            id: "doc_bbb".into(),
            kind: DocumentKind::LeaseContract,
            name: "contract-v2.pdf".into(),
            uploaded_at: TimeStamp::new(),
        });

        assert_eq!(request.documents.len(), 1);
        assert_eq!(
            request.document(DocumentKind::LeaseContract).unwrap().id,
            "doc_bbb"
        );
    }
}
