use crate::document::DocumentKind;
use crate::state::{Action, RequestState, Role};

/// Failures a single workflow call can surface. Every variant is local to
/// that call; nothing leaves the request half-updated except
/// [`WorkflowError::ContractBindingFailed`], where the approval is already
/// committed and only the property write remains outstanding.
#[derive(thiserror::Error, Debug)]
pub enum WorkflowError {
    #[error("{role:?} may not perform {action:?} while the request is {state:?}")]
    Unauthorized {
        role: Role,
        action: Action,
        state: RequestState,
    },
    #[error("no {action:?} transition out of {state:?}")]
    InvalidTransition {
        state: RequestState,
        action: Action,
    },
    #[error("transition requires a {required:?} document to be attached")]
    MissingDocument { required: DocumentKind },
    #[error("request {0} was modified concurrently, reload and retry")]
    ConcurrentModification(String),
    #[error(
        "request {request_id} is approved but binding the lease contract to \
         property {property_id} failed: {reason}"
    )]
    ContractBindingFailed {
        request_id: String,
        property_id: String,
        reason: String,
    },
    #[error("no record found under id {0}")]
    NotFound(String),
    #[error("failed to mint an identifier: {0}")]
    Identity(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Storage(#[from] sled::Error),
    #[error("failed to encode record: {0}")]
    Encode(#[from] minicbor::encode::Error<std::convert::Infallible>),
    #[error("failed to decode record: {0}")]
    Decode(#[from] minicbor::decode::Error),
}

impl WorkflowError {
    pub(crate) fn identity(err: anyhow::Error) -> Self {
        Self::Identity(err.to_string())
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("request description is not set")]
    MissingDescription,
    #[error("counterpart name is not set")]
    MissingCounterpart,
    #[error("sale counterpart tax id is not set")]
    MissingTaxId,
    #[error("lease term start date is not set")]
    MissingTermStart,
    #[error("lease term end date is not set")]
    MissingTermEnd,
    #[error("Term Start <= Term End failed")]
    InvalidTerm,
}
