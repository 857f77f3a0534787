use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use super::{EmployeeStore, Store, UserStore};
use crate::errors::{AppError, AppResult};
use crate::models::employee::{
    Address, Education, EmergencyContact, Employee, EmployeeDetails, EmployeeFilter, EmployeeSort,
    EmployeeType, NewEmployee, PageWindow,
};
use crate::models::user::{NewUser, User};

const EMPLOYEE_COLUMNS: &str = "employee_id, first_name, last_name, email, phone, employee_type, \
     department, position, join_date, salary, profile_picture, address, skills, education, \
     emergency_contact, created_by, created_at, updated_at";

const USER_COLUMNS: &str = "user_id, name, email, password, is_admin, created_at, updated_at";

// $1 is NULL (no keyword) or a `%needle%` ILIKE pattern.
const KEYWORD_CLAUSE: &str = "($1::text IS NULL OR first_name ILIKE $1 OR last_name ILIKE $1 \
     OR email ILIKE $1 OR department ILIKE $1 OR position ILIKE $1)";

pub async fn create_pool(database_url: &str) -> AppResult<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|err| AppError::DatabaseError(err.to_string()))?;

    Ok(pool)
}

#[derive(sqlx::FromRow)]
struct EmployeeRow {
    employee_id: Uuid,
    first_name: String,
    last_name: String,
    email: String,
    phone: String,
    employee_type: EmployeeType,
    department: String,
    position: String,
    join_date: DateTime<Utc>,
    salary: f64,
    profile_picture: String,
    address: Json<Address>,
    skills: Vec<String>,
    education: Json<Vec<Education>>,
    emergency_contact: Option<Json<EmergencyContact>>,
    created_by: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<EmployeeRow> for Employee {
    fn from(row: EmployeeRow) -> Self {
        Employee {
            id: row.employee_id,
            details: EmployeeDetails {
                first_name: row.first_name,
                last_name: row.last_name,
                email: row.email,
                phone: row.phone,
                employee_type: row.employee_type,
                department: row.department,
                position: row.position,
                join_date: row.join_date,
                salary: row.salary,
                profile_picture: row.profile_picture,
                address: row.address.0,
                skills: row.skills,
                education: row.education.0,
                emergency_contact: row.emergency_contact.map(|c| c.0),
            },
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Escapes LIKE metacharacters so the keyword matches literally.
fn like_pattern(filter: &EmployeeFilter) -> Option<String> {
    filter.keyword.as_ref().map(|keyword| {
        let escaped = keyword
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        format!("%{}%", escaped)
    })
}

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EmployeeStore for PgStore {
    async fn find_employee(&self, id: Uuid) -> AppResult<Option<Employee>> {
        let sql = format!("SELECT {} FROM employees WHERE employee_id = $1", EMPLOYEE_COLUMNS);
        let row = sqlx::query_as::<_, EmployeeRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Employee::from))
    }

    async fn find_employee_by_email(&self, email: &str) -> AppResult<Option<Employee>> {
        let sql = format!(
            "SELECT {} FROM employees WHERE LOWER(email) = LOWER($1)",
            EMPLOYEE_COLUMNS
        );
        let row = sqlx::query_as::<_, EmployeeRow>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Employee::from))
    }

    async fn find_employees(
        &self,
        filter: &EmployeeFilter,
        sort: EmployeeSort,
        window: Option<PageWindow>,
    ) -> AppResult<Vec<Employee>> {
        let order = match sort {
            EmployeeSort::NewestFirst => "created_at DESC, seq ASC",
            EmployeeSort::Insertion => "seq ASC",
        };
        // LIMIT NULL means no limit.
        let sql = format!(
            "SELECT {} FROM employees WHERE {} ORDER BY {} LIMIT $2 OFFSET $3",
            EMPLOYEE_COLUMNS, KEYWORD_CLAUSE, order
        );
        let rows = sqlx::query_as::<_, EmployeeRow>(&sql)
            .bind(like_pattern(filter))
            .bind(window.map(|w| w.limit.min(i64::MAX as u64) as i64))
            .bind(window.map_or(0, |w| w.offset.min(i64::MAX as u64) as i64))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Employee::from).collect())
    }

    async fn count_employees(&self, filter: &EmployeeFilter) -> AppResult<u64> {
        let sql = format!("SELECT COUNT(*) FROM employees WHERE {}", KEYWORD_CLAUSE);
        let count: i64 = sqlx::query_scalar(&sql)
            .bind(like_pattern(filter))
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    async fn insert_employee(&self, employee: NewEmployee) -> AppResult<Employee> {
        let sql = format!(
            "INSERT INTO employees ({}) VALUES \
             ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $17) \
             RETURNING {}",
            EMPLOYEE_COLUMNS, EMPLOYEE_COLUMNS
        );
        let details = employee.details;
        let row = sqlx::query_as::<_, EmployeeRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(details.first_name)
            .bind(details.last_name)
            .bind(details.email)
            .bind(details.phone)
            .bind(details.employee_type)
            .bind(details.department)
            .bind(details.position)
            .bind(details.join_date)
            .bind(details.salary)
            .bind(details.profile_picture)
            .bind(Json(details.address))
            .bind(details.skills)
            .bind(Json(details.education))
            .bind(details.emergency_contact.map(Json))
            .bind(employee.created_by)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    async fn update_employee(&self, employee: &Employee) -> AppResult<Employee> {
        let sql = format!(
            "UPDATE employees SET first_name = $2, last_name = $3, email = $4, phone = $5, \
             employee_type = $6, department = $7, position = $8, join_date = $9, salary = $10, \
             profile_picture = $11, address = $12, skills = $13, education = $14, \
             emergency_contact = $15, updated_at = $16 \
             WHERE employee_id = $1 RETURNING {}",
            EMPLOYEE_COLUMNS
        );
        let details = employee.details.clone();
        let row = sqlx::query_as::<_, EmployeeRow>(&sql)
            .bind(employee.id)
            .bind(details.first_name)
            .bind(details.last_name)
            .bind(details.email)
            .bind(details.phone)
            .bind(details.employee_type)
            .bind(details.department)
            .bind(details.position)
            .bind(details.join_date)
            .bind(details.salary)
            .bind(details.profile_picture)
            .bind(Json(details.address))
            .bind(details.skills)
            .bind(Json(details.education))
            .bind(details.emergency_contact.map(Json))
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Employee::from)
            .ok_or_else(|| AppError::NotFound("Employee not found".to_string()))
    }

    async fn delete_employee(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM employees WHERE employee_id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_user(&self, id: Uuid) -> AppResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE user_id = $1", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE LOWER(email) = LOWER($1)", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn insert_user(&self, user: NewUser) -> AppResult<User> {
        let sql = format!(
            "INSERT INTO users ({}) VALUES ($1, $2, $3, $4, $5, $6, $6) RETURNING {}",
            USER_COLUMNS, USER_COLUMNS
        );
        let inserted = sqlx::query_as::<_, User>(&sql)
            .bind(Uuid::new_v4())
            .bind(user.name)
            .bind(user.email)
            .bind(user.password)
            .bind(user.is_admin)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await
            .map_err(|err| match AppError::from(err) {
                AppError::Conflict(_) => AppError::Conflict("User already exists".to_string()),
                other => other,
            })?;
        Ok(inserted)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn close(&self) {
        self.pool.close().await;
    }
}
