//! Single read/write path for student records. The user directory is the
//! system of record; the legacy student array is kept as a write-through
//! projection so callers holding legacy numeric ids keep resolving. No
//! operation reads one store without going through this resolver.

use tracing::{info, instrument, warn};

use crate::auth::Role;
use crate::error::AppError;
use crate::models::{LegacyStudent, Student, User};
use crate::store::Store;

fn legacy_matches(record: &LegacyStudent, id: &str) -> bool {
    // Loose match bridges numeric legacy ids and string user ids.
    record.id.to_string() == id || record.user_id == id
}

/// Looks the id up in the user directory first, then scans the legacy array.
pub fn lookup_student(store: &Store, id: &str) -> Option<Student> {
    let users = store.users();
    if let Some(user) = users.get(id) {
        if user.role == Role::Student {
            let legacy_id = store
                .students()
                .iter()
                .find(|s| s.user_id == user.id)
                .map(|s| s.id);
            return Some(Student::from_user(user, legacy_id));
        }
    }

    store
        .students()
        .iter()
        .find(|record| legacy_matches(record, id))
        .map(Student::from_legacy)
}

#[instrument(skip(store))]
pub fn get_student(store: &Store, id: &str) -> Result<Student, AppError> {
    lookup_student(store, id)
        .ok_or_else(|| AppError::NotFound(format!("Student {} not found in any store", id)))
}

/// Write-through to both stores: the user directory entry and the matching
/// legacy array entry are overlaid with the complete next state. The student
/// must exist in at least one store.
#[instrument(skip(store, student), fields(student_id = %student.id))]
pub fn save_student(store: &Store, student: &Student) -> Result<(), AppError> {
    let mut updated = false;

    let mut users = store.users();
    if let Some(user) = users.get_mut(&student.id) {
        user.name = student.name.clone();
        user.email = student.email.clone();
        user.is_email_confirmed = student.is_email_confirmed;
        user.student = Some(student.data.clone());
        store.save_users(&users);
        updated = true;
    }

    let mut students = store.students();
    if let Some(idx) = students
        .iter()
        .position(|record| legacy_matches(record, &student.id))
    {
        let record = &mut students[idx];
        record.name = student.name.clone();
        record.email = student.email.clone();
        record.is_email_confirmed = student.is_email_confirmed;
        record.data = student.data.clone();
        store.save_students(&students);
        updated = true;
    }

    if updated {
        Ok(())
    } else {
        warn!(student_id = %student.id, "Student not present in any store, nothing saved");
        Err(AppError::NotFound(format!(
            "Student {} not present in any store",
            student.id
        )))
    }
}

/// All known students: every student user, plus any legacy record whose
/// back-reference no longer resolves to a directory entry.
pub fn all_students(store: &Store) -> Vec<Student> {
    let users = store.users();
    let legacy = store.students();

    let mut students: Vec<Student> = users
        .values()
        .filter(|u| u.role == Role::Student)
        .map(|user| {
            let legacy_id = legacy.iter().find(|s| s.user_id == user.id).map(|s| s.id);
            Student::from_user(user, legacy_id)
        })
        .collect();

    for record in &legacy {
        if !users.contains_key(&record.user_id) {
            students.push(Student::from_legacy(record));
        }
    }

    students
}

pub fn get_user(store: &Store, id: &str) -> Result<User, AppError> {
    store
        .users()
        .get(id)
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
}

pub fn all_users(store: &Store) -> Vec<User> {
    store.users().into_values().collect()
}

pub fn find_user_by_email(store: &Store, email: &str) -> Option<User> {
    store.users().into_values().find(|u| u.email == email)
}

/// Appends a record directly to the legacy array, allocating the next
/// numeric id. Registration uses this to spawn the projection.
#[instrument(skip(store, record))]
pub fn push_legacy_student(store: &Store, mut record: LegacyStudent) -> LegacyStudent {
    info!("Appending legacy student record");
    let mut students = store.students();
    record.id = students.iter().map(|s| s.id).max().unwrap_or(0) + 1;
    students.push(record.clone());
    store.save_students(&students);
    record
}
