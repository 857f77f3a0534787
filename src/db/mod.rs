//! Record store adapter.
//!
//! Services only see the [`EmployeeStore`] and [`UserStore`] traits. The
//! store is the source of truth for email uniqueness: `insert` and `update`
//! fail with [`AppError::Conflict`] when another record already owns the email.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::AppResult;
use crate::models::employee::{Employee, EmployeeFilter, EmployeeSort, NewEmployee, PageWindow};
use crate::models::user::{NewUser, User};

pub use memory::MemoryStore;
pub use postgres::{create_pool, PgStore};

#[async_trait]
pub trait EmployeeStore: Send + Sync {
    async fn find_employee(&self, id: Uuid) -> AppResult<Option<Employee>>;

    async fn find_employee_by_email(&self, email: &str) -> AppResult<Option<Employee>>;

    async fn find_employees(
        &self,
        filter: &EmployeeFilter,
        sort: EmployeeSort,
        window: Option<PageWindow>,
    ) -> AppResult<Vec<Employee>>;

    async fn count_employees(&self, filter: &EmployeeFilter) -> AppResult<u64>;

    /// Assigns the id and timestamps.
    async fn insert_employee(&self, employee: NewEmployee) -> AppResult<Employee>;

    /// Persists `employee.details` and refreshes `updated_at`.
    async fn update_employee(&self, employee: &Employee) -> AppResult<Employee>;

    /// Returns whether a record was removed.
    async fn delete_employee(&self, id: Uuid) -> AppResult<bool>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user(&self, id: Uuid) -> AppResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>>;

    async fn insert_user(&self, user: NewUser) -> AppResult<User>;
}

/// Both collections behind one connection.
#[async_trait]
pub trait Store: EmployeeStore + UserStore {
    /// Releases the connection; called once after the server stops.
    async fn close(&self) {}
}
