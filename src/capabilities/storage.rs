//! Durable key-value storage on the shell (localStorage in the browser
//! shell). Only small string values pass through here; today that is the
//! session id.

use crux_core::capability::{CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum StorageOperation {
    Get { key: String },
    Set { key: String, value: String },
    Remove { key: String },
}

impl Operation for StorageOperation {
    type Output = StorageResult;
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum StorageOutput {
    Value { value: Option<String> },
    Written,
    Removed,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("durable storage unavailable: {reason}")]
    Unavailable { reason: String },
}

pub type StorageResult = Result<StorageOutput, StorageError>;

pub struct KeyStore<Ev> {
    context: CapabilityContext<StorageOperation, Ev>,
}

impl<Ev> crux_core::capability::Capability<Ev> for KeyStore<Ev> {
    type Operation = StorageOperation;
    type MappedSelf<MappedEv> = KeyStore<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        KeyStore::new(self.context.map_event(f))
    }
}

impl<Ev> KeyStore<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<StorageOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn get<F>(&self, key: &str, make_event: F)
    where
        F: FnOnce(StorageResult) -> Ev + Send + 'static,
    {
        self.request(StorageOperation::Get { key: key.to_owned() }, make_event);
    }

    pub fn set<F>(&self, key: &str, value: String, make_event: F)
    where
        F: FnOnce(StorageResult) -> Ev + Send + 'static,
    {
        self.request(
            StorageOperation::Set {
                key: key.to_owned(),
                value,
            },
            make_event,
        );
    }

    pub fn remove<F>(&self, key: &str, make_event: F)
    where
        F: FnOnce(StorageResult) -> Ev + Send + 'static,
    {
        self.request(StorageOperation::Remove { key: key.to_owned() }, make_event);
    }

    fn request<F>(&self, operation: StorageOperation, make_event: F)
    where
        F: FnOnce(StorageResult) -> Ev + Send + 'static,
    {
        let context = self.context.clone();
        self.context.spawn(async move {
            let result = context.request_from_shell(operation).await;
            context.update_app(make_event(result));
        });
    }
}
