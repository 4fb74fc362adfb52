//! Workflow engine: the transition table and every legality check.
//!
//! Callers never decide legality themselves. They hand [`evaluate`] the
//! request, the acting party, the action and the kind of any freshly
//! attached document; the engine answers with the [`Outcome`] to apply or a
//! typed refusal. The service layer applies outcomes, it never re-derives
//! the rules.
use crate::document::DocumentKind;
use crate::error::WorkflowError;
use crate::history::{HistoryAction, last_rejection_target};
use crate::request::{Request, RequestKind};

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    #[n(0)]
    PendingCertificate,
    #[n(1)]
    PendingBoardApproval,
    #[n(2)]
    BoardApproved,
    #[n(3)]
    Rejected,
    #[n(4)]
    PendingPaymentPlan,
    #[n(5)]
    UnderPaymentPlanReview,
    #[n(6)]
    PaymentPlanApproved,
    #[n(7)]
    UnderContractReview,
    #[n(8)]
    SaleContractApproved,
    #[n(9)]
    UnderDeedReview,
    #[n(10)]
    DocumentRejected,
    #[n(11)]
    Approved,
    #[n(12)]
    Closed,
}

impl RequestState {
    /// Terminal states accept no action at all.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Closed)
    }

    /// States where Board or Administrator sit on an approve/reject decision.
    pub fn is_review(&self) -> bool {
        matches!(
            self,
            Self::PendingBoardApproval
                | Self::UnderPaymentPlanReview
                | Self::UnderContractReview
                | Self::UnderDeedReview
        )
    }

    /// Where a rejection out of this state lands. A rejected certificate or
    /// payment plan is a process-level rejection with an appeal remedy; a
    /// rejected contract or deed is a document-quality problem with a
    /// resubmission remedy.
    pub fn rejection_target(&self) -> Option<RequestState> {
        match self {
            Self::PendingCertificate
            | Self::PendingBoardApproval
            | Self::UnderPaymentPlanReview => Some(Self::Rejected),
            Self::UnderContractReview | Self::UnderDeedReview => Some(Self::DocumentRejected),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Requester,
    Administrator,
    Board,
}

/// The acting party of one call: resolved address plus the role it acts
/// under. Role grants are resolved by the caller's auth layer; the engine
/// still pins `Requester` to the recorded requester address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub addr: String,
    pub role: Role,
}

impl Actor {
    pub fn new(addr: &str, role: Role) -> Self {
        Self {
            addr: addr.to_owned(),
            role,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Approve,
    Reject,
    SubmitDocument,
    RequestPaymentPlan,
    Close,
}

/// Everything the service must apply for one accepted transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub next: RequestState,
    pub recorded_as: HistoryAction,
    pub requires: Option<DocumentKind>,
    /// Set only on the lease-approval transition: the property record must
    /// be pointed at the attached lease contract.
    pub binds_contract: bool,
}

/// The contract label splits per kind, every other label is kind-independent.
pub fn contract_kind(kind: RequestKind) -> DocumentKind {
    match kind {
        RequestKind::Sale => DocumentKind::SaleContract,
        RequestKind::Lease => DocumentKind::LeaseContract,
    }
}

/// Decide one transition. Check order is fixed: terminal refusal, then
/// action lookup, then role, then document gating. A refusal leaves the
/// request untouched because nothing is mutated here at all.
pub fn evaluate(
    request: &Request,
    actor: &Actor,
    action: Action,
    attached: Option<DocumentKind>,
) -> Result<Outcome, WorkflowError> {
    use HistoryAction as H;
    use RequestState as S;

    let state = request.state;
    if state.is_terminal() {
        return Err(WorkflowError::InvalidTransition { state, action });
    }

    // (permitted role, required document, next state, audit action, binds)
    let (role, requires, next, recorded_as, binds_contract) = match (state, action) {
        (S::PendingCertificate, Action::SubmitDocument) => (
            Role::Administrator,
            Some(DocumentKind::ExpenseCertificate),
            S::PendingBoardApproval,
            H::SubmitDocument,
            false,
        ),
        (S::PendingCertificate, Action::Reject) => {
            (Role::Administrator, None, S::Rejected, H::Reject, false)
        }
        (S::PendingBoardApproval, Action::Approve) => {
            (Role::Board, None, S::BoardApproved, H::Approve, false)
        }
        (S::PendingBoardApproval, Action::Reject) => {
            (Role::Board, None, S::Rejected, H::Reject, false)
        }
        (S::BoardApproved, Action::SubmitDocument) => (
            Role::Requester,
            Some(contract_kind(request.kind)),
            S::UnderContractReview,
            H::SubmitDocument,
            false,
        ),
        (S::Rejected, Action::RequestPaymentPlan) => (
            Role::Requester,
            None,
            S::PendingPaymentPlan,
            H::RequestAppeal,
            false,
        ),
        (S::Rejected, Action::Close) => (Role::Requester, None, S::Closed, H::Close, false),
        (S::PendingPaymentPlan, Action::SubmitDocument) => (
            Role::Administrator,
            Some(DocumentKind::PaymentPlan),
            S::UnderPaymentPlanReview,
            H::SubmitDocument,
            false,
        ),
        (S::UnderPaymentPlanReview, Action::Approve) => {
            (Role::Board, None, S::PaymentPlanApproved, H::Approve, false)
        }
        (S::UnderPaymentPlanReview, Action::Reject) => {
            (Role::Board, None, S::Rejected, H::Reject, false)
        }
        (S::PaymentPlanApproved, Action::SubmitDocument) => (
            Role::Requester,
            Some(contract_kind(request.kind)),
            S::UnderContractReview,
            H::SubmitDocument,
            false,
        ),
        (S::UnderContractReview, Action::Approve) => match request.kind {
            RequestKind::Sale => (Role::Board, None, S::SaleContractApproved, H::Approve, false),
            // the one transition with an external write
            RequestKind::Lease => (Role::Board, None, S::Approved, H::Approve, true),
        },
        (S::UnderContractReview, Action::Reject) => {
            (Role::Board, None, S::DocumentRejected, H::Reject, false)
        }
        (S::SaleContractApproved, Action::SubmitDocument) => (
            Role::Requester,
            Some(DocumentKind::Deed),
            S::UnderDeedReview,
            H::SubmitDocument,
            false,
        ),
        (S::UnderDeedReview, Action::Approve) => {
            (Role::Board, None, S::Approved, H::Approve, false)
        }
        (S::UnderDeedReview, Action::Reject) => {
            (Role::Board, None, S::DocumentRejected, H::Reject, false)
        }
        (S::DocumentRejected, Action::SubmitDocument) => {
            // destination is computed from the audit log, not fixed
            let target = last_rejection_target(&request.history)
                .ok_or(WorkflowError::InvalidTransition { state, action })?;
            let required = match target {
                S::UnderDeedReview => DocumentKind::Deed,
                _ => contract_kind(request.kind),
            };
            (
                Role::Requester,
                Some(required),
                target,
                H::SubmitDocument,
                false,
            )
        }
        _ => return Err(WorkflowError::InvalidTransition { state, action }),
    };

    if actor.role != role {
        return Err(WorkflowError::Unauthorized {
            role: actor.role,
            action,
            state,
        });
    }
    if role == Role::Requester && actor.addr != request.requester {
        // a global-role actor may not stand in for someone else's requester
        return Err(WorkflowError::Unauthorized {
            role: actor.role,
            action,
            state,
        });
    }
    if let Some(required) = requires {
        if attached != Some(required) {
            return Err(WorkflowError::MissingDocument { required });
        }
    }

    Ok(Outcome {
        next,
        recorded_as,
        requires,
        binds_contract,
    })
}
