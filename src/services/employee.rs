use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::EmployeeStore;
use crate::errors::{AppError, AppResult};
use crate::models::employee::{
    AddressPatch, Employee, EmployeeDetails, EmployeeFilter, EmployeeInput, EmployeePage,
    EmployeeSort, NewEmployee, PageWindow, DEFAULT_PROFILE_PICTURE, PAGE_SIZE,
};
use crate::services::assets::{self, AssetStore, CheckedImage};
use crate::utils::validation::{
    into_result, parse_address, parse_education, parse_emergency_contact, parse_employee_type,
    parse_join_date, parse_salary, parse_skills, validate_details, Violation,
};

const DUPLICATE_EMAIL: &str = "Employee with this email already exists";

fn not_found() -> AppError {
    AppError::NotFound("Employee not found".to_string())
}

fn duplicate_email(err: AppError) -> AppError {
    match err {
        AppError::Conflict(_) => AppError::Conflict(DUPLICATE_EMAIL.to_string()),
        other => other,
    }
}

/// `pageNumber` as sent by clients; anything that is not a positive integer is page 1.
pub fn page_number(raw: Option<&str>) -> u64 {
    raw.and_then(|p| p.trim().parse::<u64>().ok())
        .filter(|p| *p >= 1)
        .unwrap_or(1)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn keep<T>(result: Result<T, Violation>, violations: &mut Vec<Violation>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(violation) => {
            violations.push(violation);
            None
        }
    }
}

/// Turns a create request into a validated record.
fn build_details(input: EmployeeInput, profile_picture: String) -> AppResult<EmployeeDetails> {
    let mut violations = Vec::new();

    let employee_type = non_blank(input.employee_type)
        .and_then(|raw| keep(parse_employee_type(&raw), &mut violations))
        .unwrap_or_default();
    let join_date = match non_blank(input.join_date) {
        Some(raw) => keep(parse_join_date(&raw), &mut violations).unwrap_or_else(Utc::now),
        None => Utc::now(),
    };
    let salary = keep(parse_salary(input.salary.as_deref().unwrap_or("")), &mut violations);
    let address = match non_blank(input.address) {
        Some(raw) => keep(parse_address(&raw), &mut violations).unwrap_or_default(),
        None => AddressPatch::default(),
    };
    let education = non_blank(input.education)
        .and_then(|raw| keep(parse_education(&raw), &mut violations))
        .unwrap_or_default();
    let emergency_contact = non_blank(input.emergency_contact)
        .and_then(|raw| keep(parse_emergency_contact(&raw), &mut violations))
        .flatten();

    let details = EmployeeDetails {
        first_name: non_blank(input.first_name).unwrap_or_default(),
        last_name: non_blank(input.last_name).unwrap_or_default(),
        email: non_blank(input.email).unwrap_or_default().to_lowercase(),
        phone: non_blank(input.phone).unwrap_or_default(),
        employee_type,
        department: non_blank(input.department).unwrap_or_default(),
        position: non_blank(input.position).unwrap_or_default(),
        join_date,
        salary: salary.unwrap_or_default(),
        profile_picture,
        address: address.into_address(),
        skills: input.skills.as_deref().map(parse_skills).unwrap_or_default(),
        education,
        emergency_contact,
    };

    violations.extend(validate_details(&details));
    into_result(violations)?;
    Ok(details)
}

/// Merges the fields a request actually carries into an existing record.
///
/// Text fields are only replaced by non-blank values. Numbers are applied
/// whenever present, so `salary=0` sticks. `skills` replaces the list even
/// when empty; `education=[]` and `emergencyContact={}` clear those fields.
fn apply_changes(details: &mut EmployeeDetails, input: EmployeeInput) -> AppResult<()> {
    let mut violations = Vec::new();

    let text_fields = [
        (input.first_name, &mut details.first_name),
        (input.last_name, &mut details.last_name),
        (input.phone, &mut details.phone),
        (input.department, &mut details.department),
        (input.position, &mut details.position),
    ];
    for (incoming, slot) in text_fields {
        if let Some(value) = non_blank(incoming) {
            *slot = value;
        }
    }
    if let Some(email) = non_blank(input.email) {
        details.email = email.to_lowercase();
    }
    if let Some(kind) = non_blank(input.employee_type)
        .and_then(|raw| keep(parse_employee_type(&raw), &mut violations))
    {
        details.employee_type = kind;
    }
    if let Some(join_date) =
        non_blank(input.join_date).and_then(|raw| keep(parse_join_date(&raw), &mut violations))
    {
        details.join_date = join_date;
    }
    if let Some(salary) =
        non_blank(input.salary).and_then(|raw| keep(parse_salary(&raw), &mut violations))
    {
        details.salary = salary;
    }
    if let Some(patch) =
        non_blank(input.address).and_then(|raw| keep(parse_address(&raw), &mut violations))
    {
        patch.apply_to(&mut details.address);
    }
    if let Some(skills) = input.skills {
        details.skills = parse_skills(&skills);
    }
    if let Some(education) =
        non_blank(input.education).and_then(|raw| keep(parse_education(&raw), &mut violations))
    {
        details.education = education;
    }
    if let Some(contact) = non_blank(input.emergency_contact)
        .and_then(|raw| keep(parse_emergency_contact(&raw), &mut violations))
    {
        details.emergency_contact = contact;
    }

    violations.extend(validate_details(details));
    into_result(violations)
}

/// Employee list/search/CRUD on top of a record store and an asset host.
#[derive(Clone)]
pub struct EmployeeService {
    store: Arc<dyn EmployeeStore>,
    assets: Arc<dyn AssetStore>,
}

impl EmployeeService {
    pub fn new(store: Arc<dyn EmployeeStore>, assets: Arc<dyn AssetStore>) -> Self {
        Self { store, assets }
    }

    /// Uploads a checked profile picture and returns its reference.
    pub async fn store_picture(&self, bytes: Vec<u8>, max_bytes: usize) -> AppResult<String> {
        let image: CheckedImage = assets::check_image(bytes, max_bytes)?;
        self.assets.upload(image).await
    }

    pub async fn list(&self, keyword: Option<&str>, page: u64) -> AppResult<EmployeePage> {
        let page = page.max(1);
        let filter = EmployeeFilter::keyword(keyword);

        let total = self.store.count_employees(&filter).await?;
        let employees = self
            .store
            .find_employees(&filter, EmployeeSort::NewestFirst, Some(PageWindow::for_page(page)))
            .await?;

        Ok(EmployeePage {
            employees,
            page,
            pages: total.div_ceil(PAGE_SIZE),
            total,
        })
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Employee> {
        self.store.find_employee(id).await?.ok_or_else(not_found)
    }

    /// Creates a record owned by `actor`. A picture uploaded for a request that
    /// ends up rejected is removed again.
    pub async fn create(
        &self,
        input: EmployeeInput,
        picture: Option<String>,
        actor: Uuid,
    ) -> AppResult<Employee> {
        let result = self.insert(input, picture.clone(), actor).await;
        if result.is_err() {
            if let Some(uploaded) = &picture {
                assets::discard(self.assets.as_ref(), uploaded).await;
            }
        }
        result
    }

    async fn insert(
        &self,
        input: EmployeeInput,
        picture: Option<String>,
        actor: Uuid,
    ) -> AppResult<Employee> {
        let profile_picture = picture.unwrap_or_else(|| DEFAULT_PROFILE_PICTURE.to_string());
        let details = build_details(input, profile_picture)?;

        // The store's unique constraint still decides races between concurrent creates.
        if self.store.find_employee_by_email(&details.email).await?.is_some() {
            return Err(AppError::Conflict(DUPLICATE_EMAIL.to_string()));
        }

        let employee = self
            .store
            .insert_employee(NewEmployee {
                details,
                created_by: actor,
            })
            .await
            .map_err(duplicate_email)?;

        log::info!("Created employee {} ({})", employee.id, employee.full_name());
        Ok(employee)
    }

    /// Applies a partial update. When `picture` replaces a custom image, the old
    /// one is discarded after the record is saved.
    pub async fn update(
        &self,
        id: Uuid,
        input: EmployeeInput,
        picture: Option<String>,
    ) -> AppResult<Employee> {
        match self.save_changes(id, input, picture.clone()).await {
            Ok((employee, superseded)) => {
                if let Some(old) = superseded {
                    assets::discard(self.assets.as_ref(), &old).await;
                }
                Ok(employee)
            }
            Err(err) => {
                if let Some(uploaded) = &picture {
                    assets::discard(self.assets.as_ref(), uploaded).await;
                }
                Err(err)
            }
        }
    }

    async fn save_changes(
        &self,
        id: Uuid,
        input: EmployeeInput,
        picture: Option<String>,
    ) -> AppResult<(Employee, Option<String>)> {
        let mut employee = self.get_by_id(id).await?;
        apply_changes(&mut employee.details, input)?;

        let superseded =
            picture.map(|new| std::mem::replace(&mut employee.details.profile_picture, new));

        // No pre-check against other records here; a colliding email is rejected by the store.
        let updated = self
            .store
            .update_employee(&employee)
            .await
            .map_err(duplicate_email)?;

        log::info!("Updated employee {}", updated.id);
        Ok((updated, superseded))
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let employee = self.get_by_id(id).await?;
        if !self.store.delete_employee(id).await? {
            return Err(not_found());
        }

        assets::discard(self.assets.as_ref(), &employee.details.profile_picture).await;
        log::info!("Deleted employee {}", id);
        Ok(())
    }

    pub async fn search(&self, query: Option<&str>) -> AppResult<Vec<Employee>> {
        let filter = EmployeeFilter::keyword(query);
        if filter.keyword.is_none() {
            return Err(AppError::InvalidInput("Search query is required".to_string()));
        }
        self.store
            .find_employees(&filter, EmployeeSort::Insertion, None)
            .await
    }
}
