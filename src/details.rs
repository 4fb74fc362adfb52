//! Kind-specific request details
use crate::error::ValidationError;
use crate::request::{RequestKind, TimeStamp};
use chrono::Utc;

/// Tagged union selected by the request kind. The variant *is* the kind, so
/// a sale request carrying lease fields is unrepresentable.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub enum RequestDetails {
    #[n(0)]
    Sale(#[n(0)] SaleDetails),
    #[n(1)]
    Lease(#[n(0)] LeaseDetails),
}

impl RequestDetails {
    pub fn kind(&self) -> RequestKind {
        match self {
            Self::Sale(_) => RequestKind::Sale,
            Self::Lease(_) => RequestKind::Lease,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::Sale(details) => details.validate(),
            Self::Lease(details) => details.validate(),
        }
    }
}

// Also used for constructing drafts, fields stay optional until validation
#[derive(minicbor::Encode, minicbor::Decode, Debug, Default, Clone, PartialEq, Eq)]
pub struct SaleDetails {
    #[n(0)]
    description: Option<String>,
    #[n(1)]
    counterpart: Option<String>, // buyer legal name
    #[n(2)]
    counterpart_tax_id: Option<String>,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Default, Clone, PartialEq, Eq)]
pub struct LeaseDetails {
    #[n(0)]
    description: Option<String>,
    #[n(1)]
    counterpart: Option<String>, // tenant legal name
    #[n(2)]
    term_start: Option<TimeStamp<Utc>>,
    #[n(3)]
    term_end: Option<TimeStamp<Utc>>,
    #[n(4)]
    special_conditions: Option<String>,
}

impl SaleDetails {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn set_description(mut self, text: &str) -> Self {
        self.description = Some(text.to_owned());
        self
    }
    pub fn set_counterpart(mut self, name: &str) -> Self {
        self.counterpart = Some(name.to_owned());
        self
    }
    pub fn set_counterpart_tax_id(mut self, tax_id: &str) -> Self {
        self.counterpart_tax_id = Some(tax_id.to_owned());
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.description.is_none() {
            return Err(ValidationError::MissingDescription);
        }
        if self.counterpart.is_none() {
            return Err(ValidationError::MissingCounterpart);
        }
        if self.counterpart_tax_id.is_none() {
            return Err(ValidationError::MissingTaxId);
        }
        Ok(())
    }
}

impl LeaseDetails {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn set_description(mut self, text: &str) -> Self {
        self.description = Some(text.to_owned());
        self
    }
    pub fn set_counterpart(mut self, name: &str) -> Self {
        self.counterpart = Some(name.to_owned());
        self
    }
    pub fn set_term_start(mut self, date: TimeStamp<Utc>) -> Self {
        self.term_start = Some(date);
        self
    }
    pub fn set_term_end(mut self, date: TimeStamp<Utc>) -> Self {
        self.term_end = Some(date);
        self
    }
    pub fn set_special_conditions(mut self, text: &str) -> Self {
        self.special_conditions = Some(text.to_owned());
        self
    }

    /// Checks the predicate `term_start <= term_end`
    pub fn validate_term(&self) -> bool {
        match (self.term_start.as_ref(), self.term_end.as_ref()) {
            (Some(start), Some(end)) => start.to_datetime_utc() <= end.to_datetime_utc(),
            _ => false,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.description.is_none() {
            return Err(ValidationError::MissingDescription);
        }
        if self.counterpart.is_none() {
            return Err(ValidationError::MissingCounterpart);
        }
        if self.term_start.is_none() {
            return Err(ValidationError::MissingTermStart);
        }
        if self.term_end.is_none() {
            return Err(ValidationError::MissingTermEnd);
        }
        if !self.validate_term() {
            return Err(ValidationError::InvalidTerm);
        }
        Ok(())
    }
}
