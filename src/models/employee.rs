use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use crate::utils::validation::validate_email;

/// Marks "no custom image"; never sent to the asset host for deletion.
pub const DEFAULT_PROFILE_PICTURE: &str = "default-profile.jpg";
pub const DEFAULT_COUNTRY: &str = "India";
pub const PAGE_SIZE: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "employee_type")]
pub enum EmployeeType {
    #[default]
    #[serde(rename = "Full-time")]
    #[sqlx(rename = "Full-time")]
    FullTime,
    #[serde(rename = "Part-time")]
    #[sqlx(rename = "Part-time")]
    PartTime,
    #[serde(rename = "Contract")]
    #[sqlx(rename = "Contract")]
    Contract,
    #[serde(rename = "Intern")]
    #[sqlx(rename = "Intern")]
    Intern,
}

impl EmployeeType {
    pub const ALL: [EmployeeType; 4] = [
        EmployeeType::FullTime,
        EmployeeType::PartTime,
        EmployeeType::Contract,
        EmployeeType::Intern,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EmployeeType::FullTime => "Full-time",
            EmployeeType::PartTime => "Part-time",
            EmployeeType::Contract => "Contract",
            EmployeeType::Intern => "Intern",
        }
    }
}

impl fmt::Display for EmployeeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmployeeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EmployeeType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("`{}` is not a valid employee type", s))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[validate(length(min = 1, message = "Street address is required"))]
    pub street: String,
    #[validate(length(min = 1, message = "City is required"))]
    pub city: String,
    #[validate(length(min = 1, message = "State is required"))]
    pub state: String,
    #[validate(length(min = 1, message = "Zip code is required"))]
    pub zip_code: String,
    #[validate(length(min = 1, message = "Country is required"))]
    pub country: String,
}

/// Address fields as they arrive in a request; any subset may be present.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressPatch {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub country: Option<String>,
}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl AddressPatch {
    /// Builds a full address; absent parts stay empty so validation reports them.
    pub fn into_address(self) -> Address {
        Address {
            street: present(self.street).unwrap_or_default(),
            city: present(self.city).unwrap_or_default(),
            state: present(self.state).unwrap_or_default(),
            zip_code: present(self.zip_code).unwrap_or_default(),
            country: present(self.country).unwrap_or_else(|| DEFAULT_COUNTRY.to_string()),
        }
    }

    /// Shallow merge: only the parts carried by the patch are overwritten.
    pub fn apply_to(self, address: &mut Address) {
        if let Some(street) = present(self.street) {
            address.street = street;
        }
        if let Some(city) = present(self.city) {
            address.city = city;
        }
        if let Some(state) = present(self.state) {
            address.state = state;
        }
        if let Some(zip_code) = present(self.zip_code) {
            address.zip_code = zip_code;
        }
        if let Some(country) = present(self.country) {
            address.country = country;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Education {
    pub degree: Option<String>,
    pub institution: Option<String>,
    pub year: Option<i32>,
}

impl Education {
    pub fn is_blank(&self) -> bool {
        let empty = |v: &Option<String>| v.as_deref().map_or(true, |s| s.trim().is_empty());
        empty(&self.degree) && empty(&self.institution)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyContact {
    pub name: Option<String>,
    pub relationship: Option<String>,
    pub phone: Option<String>,
}

impl EmergencyContact {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.relationship.is_none() && self.phone.is_none()
    }
}

/// Everything about an employee that a caller may set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeDetails {
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,
    #[validate(custom = "validate_email")]
    pub email: String,
    #[validate(length(min = 1, message = "Phone number is required"))]
    pub phone: String,
    pub employee_type: EmployeeType,
    #[validate(length(min = 1, message = "Department is required"))]
    pub department: String,
    #[validate(length(min = 1, message = "Position is required"))]
    pub position: String,
    pub join_date: DateTime<Utc>,
    pub salary: f64,
    pub profile_picture: String,
    #[validate]
    pub address: Address,
    pub skills: Vec<String>,
    pub education: Vec<Education>,
    pub emergency_contact: Option<EmergencyContact>,
}

#[derive(Debug, Clone)]
pub struct NewEmployee {
    pub details: EmployeeDetails,
    pub created_by: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(flatten)]
    pub details: EmployeeDetails,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Employee {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.details.first_name, self.details.last_name)
    }

    /// Substring match used by list and search; `needle` must already be lowercase.
    pub fn matches_keyword(&self, needle: &str) -> bool {
        let d = &self.details;
        [&d.first_name, &d.last_name, &d.email, &d.department, &d.position]
            .iter()
            .any(|field| field.to_lowercase().contains(needle))
    }
}

/// Request-shaped employee fields. `None` means the field was not sent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmployeeInput {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub employee_type: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
    pub join_date: Option<String>,
    pub salary: Option<String>,
    pub address: Option<String>,
    pub skills: Option<String>,
    pub education: Option<String>,
    pub emergency_contact: Option<String>,
}

impl EmployeeInput {
    /// Records a form field by its wire name. Unknown names are reported back.
    pub fn set(&mut self, name: &str, value: String) -> bool {
        let slot = match name {
            "firstName" => &mut self.first_name,
            "lastName" => &mut self.last_name,
            "email" => &mut self.email,
            "phone" => &mut self.phone,
            "employeeType" => &mut self.employee_type,
            "department" => &mut self.department,
            "position" => &mut self.position,
            "joinDate" => &mut self.join_date,
            "salary" => &mut self.salary,
            "address" => &mut self.address,
            "skills" => &mut self.skills,
            "education" => &mut self.education,
            "emergencyContact" => &mut self.emergency_contact,
            _ => return false,
        };
        *slot = Some(value);
        true
    }
}

#[derive(Debug, Clone, Default)]
pub struct EmployeeFilter {
    /// Lowercased literal substring.
    pub keyword: Option<String>,
}

impl EmployeeFilter {
    pub fn keyword(keyword: Option<&str>) -> Self {
        let keyword = keyword
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_lowercase);
        Self { keyword }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmployeeSort {
    /// Newest `created_at` first, ties in insertion order.
    NewestFirst,
    Insertion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub offset: u64,
    pub limit: u64,
}

impl PageWindow {
    pub fn for_page(page: u64) -> Self {
        Self {
            offset: PAGE_SIZE.saturating_mul(page.saturating_sub(1)),
            limit: PAGE_SIZE,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EmployeePage {
    pub employees: Vec<Employee>,
    pub page: u64,
    pub pages: u64,
    pub total: u64,
}
