use serde::{Deserialize, Serialize};

use lendr_core::{DomainError, DomainResult};

/// Borrower identity and contact fields copied onto requests and logs.
///
/// Name and email are required; the remaining fields are optional because
/// walk-in borrowers recorded by an admin may not have them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowerInfo {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub admission_no: Option<String>,
    pub student_class: Option<String>,
}

impl BorrowerInfo {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            phone: None,
            admission_no: None,
            student_class: None,
        }
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_admission_no(mut self, admission_no: impl Into<String>) -> Self {
        self.admission_no = Some(admission_no.into());
        self
    }

    pub fn with_student_class(mut self, student_class: impl Into<String>) -> Self {
        self.student_class = Some(student_class.into());
        self
    }

    /// Check required fields and return a trimmed copy.
    pub fn validated(&self) -> DomainResult<Self> {
        let name = self.name.trim();
        let email = self.email.trim();
        if name.is_empty() {
            return Err(DomainError::validation("borrower name is required"));
        }
        if email.is_empty() {
            return Err(DomainError::validation("borrower email is required"));
        }
        if !email.contains('@') {
            return Err(DomainError::validation(format!("borrower email '{email}' is malformed")));
        }

        Ok(Self {
            name: name.to_string(),
            email: email.to_string(),
            phone: non_blank(&self.phone),
            admission_no: non_blank(&self.admission_no),
            student_class: non_blank(&self.student_class),
        })
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
