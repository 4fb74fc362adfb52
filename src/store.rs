//! External collaborators: the property record store and the uploaded-file
//! store. The engine consumes both through traits so the one transition with
//! an external write stays separately failable (and separately testable).
use crate::document::{Document, DocumentKind};
use crate::error::WorkflowError;
use crate::request::TimeStamp;
use sled::Db;
use std::sync::Arc;

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq)]
pub struct Property {
    #[n(0)]
    pub property_id: String, // uuid7, bech32 encoded with the property_ hrp
    #[n(1)]
    pub address: String,
    #[n(2)]
    pub owner: String,
    #[n(3)]
    pub lease_contract: Option<String>, // id of the active lease contract document
}

pub trait PropertyStore {
    fn get(&self, property_id: &str) -> Result<Property, WorkflowError>;

    /// Point the property's active lease contract at the given document.
    fn set_lease_contract(
        &self,
        property_id: &str,
        document_id: &str,
    ) -> Result<Property, WorkflowError>;
}

pub trait DocumentStore {
    /// Store file bytes and hand back the stable content-addressed reference.
    fn store_file(
        &self,
        name: &str,
        kind: DocumentKind,
        bytes: &[u8],
    ) -> Result<Document, WorkflowError>;

    fn get(&self, document_id: &str) -> Result<Vec<u8>, WorkflowError>;
}

pub struct SledPropertyStore {
    instance: Arc<Db>,
}

impl SledPropertyStore {
    pub fn new(instance: Arc<Db>) -> Self {
        Self { instance }
    }

    pub fn insert(&self, property: &Property) -> Result<(), WorkflowError> {
        self.instance
            .insert(property.property_id.as_bytes(), minicbor::to_vec(property)?)?;
        Ok(())
    }
}

impl PropertyStore for SledPropertyStore {
    fn get(&self, property_id: &str) -> Result<Property, WorkflowError> {
        let bytes = self
            .instance
            .get(property_id.as_bytes())?
            .ok_or_else(|| WorkflowError::NotFound(property_id.to_owned()))?;
        Ok(minicbor::decode(&bytes)?)
    }

    fn set_lease_contract(
        &self,
        property_id: &str,
        document_id: &str,
    ) -> Result<Property, WorkflowError> {
        let mut property = self.get(property_id)?;
        property.lease_contract = Some(document_id.to_owned());
        self.instance
            .insert(property_id.as_bytes(), minicbor::to_vec(&property)?)?;
        Ok(property)
    }
}

pub struct SledDocumentStore {
    instance: Arc<Db>,
}

impl SledDocumentStore {
    pub fn new(instance: Arc<Db>) -> Self {
        Self { instance }
    }
}

impl DocumentStore for SledDocumentStore {
    fn store_file(
        &self,
        name: &str,
        kind: DocumentKind,
        bytes: &[u8],
    ) -> Result<Document, WorkflowError> {
        // content-addressed: identical bytes land on the same key, so a
        // resubmitted file never orphans storage
        let id = format!("doc_{}", sha256::digest(bytes));
        self.instance.insert(id.as_bytes(), bytes)?;
        Ok(Document {
            id,
            kind,
            name: name.to_owned(),
            uploaded_at: TimeStamp::new(),
        })
    }

    fn get(&self, document_id: &str) -> Result<Vec<u8>, WorkflowError> {
        let bytes = self
            .instance
            .get(document_id.as_bytes())?
            .ok_or_else(|| WorkflowError::NotFound(document_id.to_owned()))?;
        Ok(bytes.to_vec())
    }
}
