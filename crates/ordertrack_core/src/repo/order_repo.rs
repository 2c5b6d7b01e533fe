//! Order store contract, shared handle and in-memory implementation.
//!
//! # Responsibility
//! - Define the storage seam (`get/upsert/remove/list`) used by every service.
//! - Provide the default in-memory backend.
//! - Serialize all store access behind one mutex (`StoreHandle`).
//!
//! # Invariants
//! - `list()` returns an owned snapshot, newest order first.
//! - `upsert` of an existing id replaces it in place; a new id goes to the front.
//! - `upsert` enforces `Order::validate()` before mutation.
//! - `remove` of an absent id returns `Ok(false)` and changes nothing.

use crate::db::DbError;
use crate::model::order::{Order, OrderId, OrderValidationError};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, MutexGuard};

pub type RepoResult<T> = Result<T, RepoError>;

/// Store-level error for order persistence.
#[derive(Debug)]
pub enum RepoError {
    Validation(OrderValidationError),
    Db(DbError),
    NotFound(OrderId),
    InvalidData(String),
    LockPoisoned,
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "order not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted order data: {message}"),
            Self::LockPoisoned => write!(f, "order store lock poisoned"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) | Self::LockPoisoned => None,
        }
    }
}

impl From<OrderValidationError> for RepoError {
    fn from(value: OrderValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Storage interface for order records.
pub trait OrderStore {
    fn get(&self, id: &OrderId) -> RepoResult<Option<Order>>;
    fn upsert(&mut self, order: Order) -> RepoResult<()>;
    fn remove(&mut self, id: &OrderId) -> RepoResult<bool>;
    fn list(&self) -> RepoResult<Vec<Order>>;
    fn len(&self) -> RepoResult<usize>;

    fn is_empty(&self) -> RepoResult<bool> {
        Ok(self.len()? == 0)
    }
}

/// Vec-backed store kept in newest-first order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderStore {
    orders: Vec<Order>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, id: &OrderId) -> Option<usize> {
        self.orders.iter().position(|order| &order.order_id == id)
    }
}

impl OrderStore for InMemoryOrderStore {
    fn get(&self, id: &OrderId) -> RepoResult<Option<Order>> {
        Ok(self.position(id).map(|index| self.orders[index].clone()))
    }

    fn upsert(&mut self, order: Order) -> RepoResult<()> {
        order.validate()?;
        match self.position(&order.order_id) {
            Some(index) => self.orders[index] = order,
            None => self.orders.insert(0, order),
        }
        Ok(())
    }

    fn remove(&mut self, id: &OrderId) -> RepoResult<bool> {
        match self.position(id) {
            Some(index) => {
                self.orders.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn list(&self) -> RepoResult<Vec<Order>> {
        Ok(self.orders.clone())
    }

    fn len(&self) -> RepoResult<usize> {
        Ok(self.orders.len())
    }
}

/// Shared, mutex-serialized handle to one store.
///
/// Services clone the handle; every clone points at the same store.
pub struct StoreHandle<S> {
    inner: Arc<Mutex<S>>,
}

impl<S> Clone for StoreHandle<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: OrderStore> StoreHandle<S> {
    pub fn new(store: S) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    /// Locks the store for a find-then-mutate sequence.
    pub fn lock(&self) -> RepoResult<MutexGuard<'_, S>> {
        self.inner.lock().map_err(|_| RepoError::LockPoisoned)
    }

    /// Returns a consistent snapshot of all orders.
    pub fn snapshot(&self) -> RepoResult<Vec<Order>> {
        self.lock()?.list()
    }

    pub fn get(&self, id: &OrderId) -> RepoResult<Option<Order>> {
        self.lock()?.get(id)
    }

    pub fn len(&self) -> RepoResult<usize> {
        self.lock()?.len()
    }

    pub fn is_empty(&self) -> RepoResult<bool> {
        self.lock()?.is_empty()
    }
}
