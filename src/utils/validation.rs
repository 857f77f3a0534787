//! Field-level checks for employee payloads.
//!
//! Everything here is pure: parsers turn request-shaped strings into typed
//! values or [`Violation`]s, and [`validate_details`] runs the declarative
//! rules on an assembled record. The service decides what to do with them.

use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::borrow::Cow;
use std::fmt;
use validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};

use crate::errors::AppError;
use crate::models::employee::{
    AddressPatch, Education, EmergencyContact, EmployeeDetails, EmployeeType,
};

// ASCII word characters only; `\w` alone would admit any Unicode letter.
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?-u)^\w+([.-]?\w+)*@\w+([.-]?\w+)*(\.\w{2,3})+$")
        .expect("email pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    RequiredMissing,
    EnumMismatch,
    FormatMismatch,
    TypeMismatch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub field: String,
    pub kind: ViolationKind,
    pub message: String,
}

impl Violation {
    pub fn new(field: impl Into<String>, kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn error_with_message(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::from(message));
    err
}

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() {
        return Err(error_with_message("required", "Email is required"));
    }
    if !EMAIL_RE.is_match(email) {
        return Err(error_with_message("email", "Please add a valid email"));
    }
    Ok(())
}

/// Runs the declarative rules on a fully assembled record.
pub fn validate_details(details: &EmployeeDetails) -> Vec<Violation> {
    match details.validate() {
        Ok(()) => Vec::new(),
        Err(errors) => {
            let mut violations = Vec::new();
            flatten_errors("", &errors, &mut violations);
            violations
        }
    }
}

fn flatten_errors(prefix: &str, errors: &ValidationErrors, out: &mut Vec<Violation>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };
        match kind {
            ValidationErrorsKind::Field(list) => {
                for err in list {
                    let kind = match &*err.code {
                        "length" | "required" => ViolationKind::RequiredMissing,
                        _ => ViolationKind::FormatMismatch,
                    };
                    let message = err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", path));
                    out.push(Violation::new(path.clone(), kind, message));
                }
            }
            ValidationErrorsKind::Struct(nested) => flatten_errors(&path, nested, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    flatten_errors(&format!("{}[{}]", path, index), nested, out);
                }
            }
        }
    }
}

/// Folds violations into a single `InvalidInput`, ordered by field for stable messages.
pub fn into_result(mut violations: Vec<Violation>) -> Result<(), AppError> {
    if violations.is_empty() {
        return Ok(());
    }
    violations.sort_by(|a, b| a.field.cmp(&b.field));
    let message = violations
        .iter()
        .map(|v| v.message.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    Err(AppError::InvalidInput(message))
}

pub fn parse_employee_type(raw: &str) -> Result<EmployeeType, Violation> {
    raw.trim().parse::<EmployeeType>().map_err(|_| {
        Violation::new(
            "employeeType",
            ViolationKind::EnumMismatch,
            format!(
                "Employee type must be one of: {}",
                EmployeeType::ALL.map(|t| t.as_str()).join(", ")
            ),
        )
    })
}

pub fn parse_salary(raw: &str) -> Result<f64, Violation> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(Violation::new("salary", ViolationKind::RequiredMissing, "Salary is required"));
    }
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(Violation::new("salary", ViolationKind::TypeMismatch, "Salary must be a number")),
    }
}

/// Accepts RFC 3339 instants or plain `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_join_date(raw: &str) -> Result<DateTime<Utc>, Violation> {
    let raw = raw.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Ok(instant.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| {
            Violation::new(
                "joinDate",
                ViolationKind::TypeMismatch,
                "Join date must be a valid date",
            )
        })
}

pub fn parse_skills(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|skill| !skill.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn parse_address(raw: &str) -> Result<AddressPatch, Violation> {
    serde_json::from_str(raw).map_err(|_| {
        Violation::new("address", ViolationKind::TypeMismatch, "Address must be a JSON object")
    })
}

pub fn parse_emergency_contact(raw: &str) -> Result<Option<EmergencyContact>, Violation> {
    let contact: EmergencyContact = serde_json::from_str(raw).map_err(|_| {
        Violation::new(
            "emergencyContact",
            ViolationKind::TypeMismatch,
            "Emergency contact must be a JSON object",
        )
    })?;
    let contact = EmergencyContact {
        name: trimmed(contact.name),
        relationship: trimmed(contact.relationship),
        phone: trimmed(contact.phone),
    };
    Ok(if contact.is_empty() { None } else { Some(contact) })
}

#[derive(Deserialize)]
struct EducationEntry {
    degree: Option<String>,
    institution: Option<String>,
    year: Option<Value>,
}

/// Parses the education list; entries with neither degree nor institution are dropped.
pub fn parse_education(raw: &str) -> Result<Vec<Education>, Violation> {
    let entries: Vec<EducationEntry> = serde_json::from_str(raw).map_err(|_| {
        Violation::new("education", ViolationKind::TypeMismatch, "Education must be a JSON array")
    })?;

    let mut education = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        let year = match entry.year {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.trim().is_empty() => None,
            Some(Value::String(s)) => {
                Some(s.trim().parse::<i32>().map_err(|_| year_violation(index))?)
            }
            Some(Value::Number(n)) => Some(
                n.as_i64()
                    .and_then(|y| i32::try_from(y).ok())
                    .ok_or_else(|| year_violation(index))?,
            ),
            Some(_) => return Err(year_violation(index)),
        };
        let item = Education {
            degree: trimmed(entry.degree),
            institution: trimmed(entry.institution),
            year,
        };
        if !item.is_blank() {
            education.push(item);
        }
    }
    Ok(education)
}

fn year_violation(index: usize) -> Violation {
    Violation::new(
        format!("education[{}].year", index),
        ViolationKind::TypeMismatch,
        "Education year must be a number",
    )
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
