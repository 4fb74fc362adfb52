//! Service layer API for request workflow operations
use crate::details::RequestDetails;
use crate::document::Document;
use crate::error::WorkflowError;
use crate::history::{Comment, HistoryAction, HistoryEntry};
use crate::request::{Request, RequestKind, TimeStamp};
use crate::state::{Action, Actor, RequestState, Role, contract_kind, evaluate};
use crate::store::{Property, PropertyStore};
use crate::utils;
use sled::Db;
use std::sync::Arc;
use tracing::{debug, warn};

/// Single entry point for every request mutation. Each call is one
/// load-validate-apply-persist pass over a single aggregate; the property
/// store is only touched by the lease-approval side effect.
pub struct RequestService<P> {
    instance: Arc<Db>,
    properties: P,
}

impl<P: PropertyStore> RequestService<P> {
    pub fn new(instance: Arc<Db>, properties: P) -> Self {
        Self {
            instance,
            properties,
        }
    }

    /// Open a new request on a property. The kind is carried by the details
    /// variant. Always starts at PendingCertificate with one Create entry.
    pub fn create(
        &self,
        property_id: &str,
        requester: &str,
        details: RequestDetails,
        description: &str,
    ) -> Result<Request, WorkflowError> {
        details.validate()?;
        // the property must exist before a request can reference it
        self.properties.get(property_id)?;

        let request_id =
            utils::new_uuid_to_bech32("request_").map_err(WorkflowError::identity)?;
        let mut request = Request::new(
            request_id,
            property_id.to_owned(),
            requester.to_owned(),
            details,
        );
        request.append_history(HistoryEntry {
            timestamp: TimeStamp::new(),
            actor: requester.to_owned(),
            action: HistoryAction::Create,
            description: description.to_owned(),
            from_state: RequestState::PendingCertificate,
            to_state: RequestState::PendingCertificate,
        });
        request.insert_new(&self.instance)?;

        debug!(request_id = %request.request_id, kind = ?request.kind, "request opened");
        Ok(request)
    }

    /// Validate and apply one transition. On success the request comes back
    /// with the new state, a fresh history entry and a bumped version; on
    /// refusal nothing was written.
    pub fn transition(
        &self,
        request_id: &str,
        actor: &Actor,
        action: Action,
        document: Option<Document>,
        description: &str,
    ) -> Result<Request, WorkflowError> {
        let (mut request, snapshot) = Request::load(&self.instance, request_id)?;

        let attached = document.as_ref().map(|d| d.kind);
        let outcome = evaluate(&request, actor, action, attached)?;

        if let Some(required) = outcome.requires {
            let document = document.ok_or(WorkflowError::MissingDocument { required })?;
            request.attach_document(document);
        }

        let from = request.state;
        request.append_history(HistoryEntry {
            timestamp: TimeStamp::new(),
            actor: actor.addr.clone(),
            action: outcome.recorded_as,
            description: description.to_owned(),
            from_state: from,
            to_state: outcome.next,
        });
        request.state = outcome.next;
        if action == Action::RequestPaymentPlan {
            // latches on the first appeal, later rejections never reset it
            request.appealed = true;
        }
        if matches!(actor.role, Role::Administrator | Role::Board)
            && matches!(action, Action::Approve | Action::Reject)
        {
            request.reviewer = Some(actor.addr.clone());
        }
        request.version += 1;
        request.updated_at = TimeStamp::new();
        request.save(&self.instance, &snapshot)?;

        debug!(
            request_id,
            from = ?from,
            to = ?request.state,
            action = ?action,
            "transition committed"
        );

        if outcome.binds_contract {
            // the approval above is already committed, a binding failure
            // must not roll it back
            self.bind(&request)?;
        }

        Ok(request)
    }

    /// Append a remark. Legal in every state, terminals included. A racing
    /// transition only forces a re-read here, never a failure.
    pub fn comment(
        &self,
        request_id: &str,
        actor: &str,
        content: &str,
        attachments: Vec<Document>,
    ) -> Result<Request, WorkflowError> {
        loop {
            let (mut request, snapshot) = Request::load(&self.instance, request_id)?;
            request.append_comment(Comment {
                timestamp: TimeStamp::new(),
                actor: actor.to_owned(),
                content: content.to_owned(),
                attachments: attachments.clone(),
            });
            request.version += 1;
            match request.save(&self.instance, &snapshot) {
                Ok(()) => return Ok(request),
                Err(WorkflowError::ConcurrentModification(_)) => continue,
                Err(err) => return Err(err),
            }
        }
    }

    /// Retry the lease-contract binding for an already approved request,
    /// without repeating the approval.
    pub fn bind_lease_contract(&self, request_id: &str) -> Result<Property, WorkflowError> {
        let (request, _) = Request::load(&self.instance, request_id)?;
        if request.kind != RequestKind::Lease || request.state != RequestState::Approved {
            return Err(WorkflowError::ContractBindingFailed {
                request_id: request_id.to_owned(),
                property_id: request.property_id.clone(),
                reason: "request is not an approved lease".to_owned(),
            });
        }
        self.bind(&request)
    }

    fn bind(&self, request: &Request) -> Result<Property, WorkflowError> {
        let contract = contract_kind(request.kind);
        let document = request
            .document(contract)
            .ok_or(WorkflowError::MissingDocument { required: contract })?;

        self.properties
            .set_lease_contract(&request.property_id, &document.id)
            .map_err(|err| {
                warn!(
                    request_id = %request.request_id,
                    property_id = %request.property_id,
                    %err,
                    "lease contract binding failed after approval"
                );
                WorkflowError::ContractBindingFailed {
                    request_id: request.request_id.clone(),
                    property_id: request.property_id.clone(),
                    reason: err.to_string(),
                }
            })
    }

    /// Read-only audit log readout.
    pub fn view_history(&self, request_id: &str) -> Result<Vec<String>, WorkflowError> {
        let (request, _) = Request::load(&self.instance, request_id)?;
        Ok(request.view_history())
    }
}
