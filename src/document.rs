use crate::request::TimeStamp;
use chrono::Utc;

/// Labels a transition may gate on. The contract label splits per request
/// kind, everything else is kind-independent.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    #[n(0)]
    ExpenseCertificate,
    #[n(1)]
    PaymentPlan,
    #[n(2)]
    SaleContract,
    #[n(3)]
    LeaseContract,
    #[n(4)]
    Deed,
}

impl DocumentKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::ExpenseCertificate => "expense-certificate",
            Self::PaymentPlan => "payment-plan",
            Self::SaleContract => "sale-contract",
            Self::LeaseContract => "lease-contract",
            Self::Deed => "deed",
        }
    }
}

/// Stable reference to an uploaded file. The store owns the bytes, a request
/// only holds these.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct Document {
    #[n(0)]
    pub id: String, // doc_ prefixed sha256 digest of the file bytes
    #[n(1)]
    pub kind: DocumentKind,
    #[n(2)]
    pub name: String, // original file name
    #[n(3)]
    pub uploaded_at: TimeStamp<Utc>,
}
