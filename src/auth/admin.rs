//! Admin operations over users and teacher approval, guarded by the acting
//! user's permissions.

use chrono::Utc;
use serde::Deserialize;
use tracing::{info, instrument};

use crate::auth::{Permission, Role};
use crate::catalog::delete_course;
use crate::error::AppError;
use crate::models::User;
use crate::store::Store;

pub fn all_teachers(store: &Store) -> Vec<User> {
    store
        .users()
        .into_values()
        .filter(|u| u.role == Role::Teacher)
        .collect()
}

pub fn pending_teachers(store: &Store) -> Vec<User> {
    all_teachers(store)
        .into_iter()
        .filter(|t| !t.is_approved_teacher())
        .collect()
}

pub fn approved_teachers(store: &Store) -> Vec<User> {
    all_teachers(store)
        .into_iter()
        .filter(|t| t.is_approved_teacher())
        .collect()
}

#[instrument(skip(store, acting), fields(acting_id = %acting.id))]
pub fn approve_teacher(store: &Store, acting: &User, teacher_id: &str) -> Result<User, AppError> {
    acting.require_permission(Permission::ApproveTeachers)?;
    info!("Approving teacher");

    let mut users = store.users();
    let user = users
        .get_mut(teacher_id)
        .filter(|u| u.role == Role::Teacher)
        .ok_or_else(|| AppError::NotFound(format!("Teacher {} not found", teacher_id)))?;

    let teacher = user.teacher.get_or_insert_with(Default::default);
    teacher.is_approved = true;
    teacher.approved_date = Some(Utc::now());
    teacher.dismissed_date = None;
    let snapshot = user.clone();

    store.save_users(&users);
    Ok(snapshot)
}

/// Removes a pending teacher application outright.
#[instrument(skip(store, acting), fields(acting_id = %acting.id))]
pub fn reject_teacher(store: &Store, acting: &User, teacher_id: &str) -> Result<(), AppError> {
    acting.require_permission(Permission::ApproveTeachers)?;
    info!("Rejecting teacher application");

    let mut users = store.users();
    let user = users
        .get(teacher_id)
        .filter(|u| u.role == Role::Teacher)
        .ok_or_else(|| AppError::NotFound(format!("Teacher {} not found", teacher_id)))?;

    if user.is_approved_teacher() {
        return Err(AppError::InvalidState(
            "Teacher is already approved; dismiss instead".to_string(),
        ));
    }

    users.remove(teacher_id);
    store.save_users(&users);
    Ok(())
}

/// Revokes an approved teacher's access without deleting the account.
#[instrument(skip(store, acting), fields(acting_id = %acting.id))]
pub fn dismiss_teacher(store: &Store, acting: &User, teacher_id: &str) -> Result<User, AppError> {
    acting.require_permission(Permission::ApproveTeachers)?;
    info!("Dismissing teacher");

    let mut users = store.users();
    let user = users
        .get_mut(teacher_id)
        .filter(|u| u.role == Role::Teacher)
        .ok_or_else(|| AppError::NotFound(format!("Teacher {} not found", teacher_id)))?;

    let teacher = user.teacher.get_or_insert_with(Default::default);
    teacher.is_approved = false;
    teacher.dismissed_date = Some(Utc::now());
    let snapshot = user.clone();

    store.save_users(&users);
    Ok(snapshot)
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub specialization: Option<String>,
    pub bio: Option<String>,
    pub level: Option<String>,
}

/// Shallow field merge into a user record. Students keep the legacy
/// projection in step for the fields it mirrors.
#[instrument(skip(store, acting, update), fields(acting_id = %acting.id))]
pub fn update_user(
    store: &Store,
    acting: &User,
    user_id: &str,
    update: UserUpdate,
) -> Result<User, AppError> {
    acting.require_permission(Permission::ManageUsers)?;
    info!("Updating user");

    let mut users = store.users();

    if let Some(email) = &update.email {
        if users.values().any(|u| u.id != user_id && &u.email == email) {
            return Err(AppError::AlreadyExists(format!(
                "Email {} is already registered",
                email
            )));
        }
    }

    let snapshot = {
        let user = users
            .get_mut(user_id)
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", user_id)))?;

        if let Some(name) = update.name {
            user.name = name;
        }
        if let Some(email) = update.email {
            user.email = email;
        }
        if let Some(specialization) = update.specialization {
            user.teacher.get_or_insert_with(Default::default).specialization = specialization;
        }
        if let Some(bio) = update.bio {
            user.teacher.get_or_insert_with(Default::default).bio = bio;
        }
        if let Some(level) = update.level {
            user.student.get_or_insert_with(Default::default).level = level;
        }
        user.updated_at = Some(Utc::now());
        user.clone()
    };
    store.save_users(&users);

    if snapshot.role == Role::Student {
        let mut students = store.students();
        if let Some(idx) = students.iter().position(|s| s.user_id == user_id) {
            students[idx].name = snapshot.name.clone();
            students[idx].email = snapshot.email.clone();
            if let Some(data) = &snapshot.student {
                students[idx].data = data.clone();
            }
            store.save_students(&students);
        }
    }

    Ok(snapshot)
}

/// Hard-deletes an account. Student deletions cascade to the legacy
/// projection; teacher deletions cascade through their courses, which in
/// turn scrub every enrolled student. Admin accounts cannot be deleted.
#[instrument(skip(store, acting), fields(acting_id = %acting.id))]
pub fn delete_user(store: &Store, acting: &User, user_id: &str) -> Result<(), AppError> {
    acting.require_permission(Permission::DeleteUsers)?;
    info!("Deleting user");

    let mut users = store.users();
    let target = users
        .get(user_id)
        .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", user_id)))?;

    if target.role == Role::Admin {
        return Err(AppError::InvalidState(
            "Admin accounts cannot be deleted".to_string(),
        ));
    }
    let role = target.role;
    users.remove(user_id);
    store.save_users(&users);

    match role {
        Role::Student => {
            let mut students = store.students();
            let n = students.len();
            students.retain(|s| s.user_id != user_id);
            if students.len() != n {
                store.save_students(&students);
            }
        }
        Role::Teacher => {
            let owned: Vec<String> = store
                .courses()
                .into_iter()
                .filter(|(_, course)| course.teacher_id == user_id)
                .map(|(key, _)| key)
                .collect();
            for course_key in owned {
                delete_course(store, &course_key)?;
            }
        }
        Role::Admin => {}
    }

    Ok(())
}
