//! Entity storage contract.
//!
//! The accounting core never owns its data. It reads and writes through
//! [`EntityStore`], which must make each single-entity mutation atomic and must
//! report "not found" (`None` / `false`) separately from transient failure
//! ([`StoreError::Unavailable`]). Serializing concurrent updates to one entity
//! is the store's job, not the ledgers'.

mod memory;

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::error::{AppError, LedgerError};
use crate::models::driver::Driver;
use crate::models::order::Order;
use crate::models::route::Route;

pub use memory::MemoryStore;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    #[error("{0}")]
    Unavailable(String),
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(reason) => LedgerError::StoreUnavailable(reason),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Ledger(err.into())
    }
}

/// Anything kept in a store: addressable by id and listed in creation order.
pub trait Entity: Clone + Send + Sync + 'static {
    fn id(&self) -> Uuid;
    fn created_at(&self) -> DateTime<Utc>;
}

/// Closure applied by [`EntityStore::update`] while the entity is locked.
pub type Mutation<'a, T> = &'a mut dyn FnMut(&mut T) -> Result<(), LedgerError>;

pub trait EntityStore<T: Entity>: Send + Sync {
    fn get(&self, id: Uuid) -> Result<Option<T>, StoreError>;

    /// Snapshot of every entity, oldest first.
    fn list(&self) -> Result<Vec<T>, StoreError>;

    fn put(&self, entity: T) -> Result<(), StoreError>;

    /// Returns whether anything was removed.
    fn delete(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Atomically applies `mutation` to the entity. `Ok(None)` when the id is
    /// unknown. If the mutation fails the stored entity is left untouched.
    ///
    /// Unlike the other methods this returns [`LedgerError`]: the mutation's
    /// own rejection (an invalid transition, an overflowing total) has to
    /// come back unchanged, and a store failure is reported as
    /// [`LedgerError::StoreUnavailable`] through `From<StoreError>`.
    fn update(&self, id: Uuid, mutation: Mutation<'_, T>) -> Result<Option<T>, LedgerError>;
}

impl Entity for Driver {
    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Entity for Order {
    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Entity for Route {
    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
