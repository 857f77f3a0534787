//! In-process store used when no `DATABASE_URL` is configured, and by tests.
//!
//! Records live in insertion order; each write takes the lock for the whole
//! check-and-write so the email uniqueness rule holds under concurrent requests.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{EmployeeStore, Store, UserStore};
use crate::errors::{AppError, AppResult};
use crate::models::employee::{Employee, EmployeeFilter, EmployeeSort, NewEmployee, PageWindow};
use crate::models::user::{NewUser, User};

#[derive(Default)]
pub struct MemoryStore {
    employees: RwLock<Vec<Employee>>,
    users: RwLock<Vec<User>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn select(employees: &[Employee], filter: &EmployeeFilter) -> Vec<Employee> {
    employees
        .iter()
        .filter(|e| match &filter.keyword {
            Some(needle) => e.matches_keyword(needle),
            None => true,
        })
        .cloned()
        .collect()
}

fn email_taken(employees: &[Employee], email: &str, except: Option<Uuid>) -> bool {
    employees
        .iter()
        .any(|e| Some(e.id) != except && e.details.email.eq_ignore_ascii_case(email))
}

#[async_trait]
impl EmployeeStore for MemoryStore {
    async fn find_employee(&self, id: Uuid) -> AppResult<Option<Employee>> {
        let employees = self.employees.read().await;
        Ok(employees.iter().find(|e| e.id == id).cloned())
    }

    async fn find_employee_by_email(&self, email: &str) -> AppResult<Option<Employee>> {
        let employees = self.employees.read().await;
        Ok(employees
            .iter()
            .find(|e| e.details.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_employees(
        &self,
        filter: &EmployeeFilter,
        sort: EmployeeSort,
        window: Option<PageWindow>,
    ) -> AppResult<Vec<Employee>> {
        let employees = self.employees.read().await;
        let mut matched = select(&employees, filter);

        if sort == EmployeeSort::NewestFirst {
            // stable: equal timestamps keep insertion order
            matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        }

        Ok(match window {
            Some(window) => matched
                .into_iter()
                .skip(window.offset as usize)
                .take(window.limit as usize)
                .collect(),
            None => matched,
        })
    }

    async fn count_employees(&self, filter: &EmployeeFilter) -> AppResult<u64> {
        let employees = self.employees.read().await;
        Ok(select(&employees, filter).len() as u64)
    }

    async fn insert_employee(&self, employee: NewEmployee) -> AppResult<Employee> {
        let mut employees = self.employees.write().await;
        if email_taken(&employees, &employee.details.email, None) {
            return Err(AppError::Conflict("Email already exists".to_string()));
        }

        let now = Utc::now();
        let stored = Employee {
            id: Uuid::new_v4(),
            details: employee.details,
            created_by: employee.created_by,
            created_at: now,
            updated_at: now,
        };
        employees.push(stored.clone());
        Ok(stored)
    }

    async fn update_employee(&self, employee: &Employee) -> AppResult<Employee> {
        let mut employees = self.employees.write().await;
        if email_taken(&employees, &employee.details.email, Some(employee.id)) {
            return Err(AppError::Conflict("Email already exists".to_string()));
        }

        let slot = employees
            .iter_mut()
            .find(|e| e.id == employee.id)
            .ok_or_else(|| AppError::NotFound("Employee not found".to_string()))?;
        slot.details = employee.details.clone();
        slot.updated_at = Utc::now();
        Ok(slot.clone())
    }

    async fn delete_employee(&self, id: Uuid) -> AppResult<bool> {
        let mut employees = self.employees.write().await;
        let before = employees.len();
        employees.retain(|e| e.id != id);
        Ok(employees.len() != before)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user(&self, id: Uuid) -> AppResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.user_id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.email.eq_ignore_ascii_case(email)).cloned())
    }

    async fn insert_user(&self, user: NewUser) -> AppResult<User> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email.eq_ignore_ascii_case(&user.email)) {
            return Err(AppError::Conflict("User already exists".to_string()));
        }

        let now = Utc::now();
        let stored = User {
            user_id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password: user.password,
            is_admin: user.is_admin,
            created_at: now,
            updated_at: now,
        };
        users.push(stored.clone());
        Ok(stored)
    }
}

#[async_trait]
impl Store for MemoryStore {}
