use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distr::Alphanumeric;
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::AppError;
use crate::identity::{all_students, get_student, lookup_student, save_student};
use crate::models::Certificate;
use crate::store::Store;

const VERIFICATION_CODE_LEN: usize = 12;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Eligibility {
    Eligible,
    /// Issuance is one-shot; the existing certificate is surfaced so retried
    /// calls stay safe.
    AlreadyIssued { certificate: Certificate },
    Ineligible { reason: String },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Verification {
    pub valid: bool,
    pub certificate: Option<Certificate>,
}

pub fn check_eligibility(store: &Store, student_id: &str, course_key: &str) -> Eligibility {
    let Some(student) = lookup_student(store, student_id) else {
        return Eligibility::Ineligible {
            reason: format!("Student {} not found", student_id),
        };
    };
    let courses = store.courses();
    if !courses.contains_key(course_key) {
        return Eligibility::Ineligible {
            reason: format!("Course {} not found", course_key),
        };
    }

    if let Some(certificate) = student
        .data
        .certificates
        .iter()
        .find(|c| c.course_key == course_key)
    {
        return Eligibility::AlreadyIssued {
            certificate: certificate.clone(),
        };
    }

    let progress = student.data.course_progress(course_key);
    if progress < 100 {
        return Eligibility::Ineligible {
            reason: format!("Course progress is {}%, 100% required", progress),
        };
    }

    Eligibility::Eligible
}

fn generate_verification_code() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(VERIFICATION_CODE_LEN)
        .map(char::from)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Mints an immutable certificate for a fully-completed course. Idempotent:
/// a certificate already held for the course is returned as-is.
#[instrument(skip(store))]
pub fn issue(
    store: &Store,
    student_id: &str,
    course_key: &str,
    completion_date: Option<DateTime<Utc>>,
) -> Result<Certificate, AppError> {
    info!("Issuing certificate");
    match check_eligibility(store, student_id, course_key) {
        Eligibility::AlreadyIssued { certificate } => {
            info!(certificate_id = %certificate.id, "Certificate already issued");
            Ok(certificate)
        }
        Eligibility::Ineligible { reason } => Err(AppError::InvalidState(reason)),
        Eligibility::Eligible => {
            let mut student = get_student(store, student_id)?;
            let courses = store.courses();
            let course = courses
                .get(course_key)
                .ok_or_else(|| AppError::NotFound(format!("Course {} not found", course_key)))?;

            let now = Utc::now();
            let certificate = Certificate {
                id: Uuid::new_v4().to_string(),
                student_id: student.id.clone(),
                student_name: student.name.clone(),
                course_key: course_key.to_string(),
                course_title: course.title.clone(),
                completion_date: completion_date.unwrap_or(now),
                issued_date: now,
                verification_code: generate_verification_code(),
            };

            student.data.certificates.push(certificate.clone());
            save_student(store, &student)?;
            Ok(certificate)
        }
    }
}

/// Scans all students for a certificate with the given id and checks the
/// code exactly. The certificate is only disclosed on a full match.
#[instrument(skip(store, code))]
pub fn verify(store: &Store, certificate_id: &str, code: &str) -> Verification {
    for student in all_students(store) {
        if let Some(certificate) = student
            .data
            .certificates
            .iter()
            .find(|c| c.id == certificate_id)
        {
            if certificate.verification_code == code {
                return Verification {
                    valid: true,
                    certificate: Some(certificate.clone()),
                };
            }
            break;
        }
    }

    Verification {
        valid: false,
        certificate: None,
    }
}
