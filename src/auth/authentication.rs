use chrono::Utc;
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::auth::Role;
use crate::auth::confirmation::create_confirmation;
use crate::error::AppError;
use crate::identity::{find_user_by_email, push_legacy_student};
use crate::models::{LegacyStudent, StudentData, TeacherData, User};
use crate::store::Store;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegistrationRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "A valid email address is required"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    pub role: Role,
    #[serde(default)]
    pub specialization: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RegistrationOutcome {
    pub user: User,
    /// Confirmation token for the email the embedder sends out of band.
    pub confirmation_token: String,
}

/// Verifies credentials against the user directory. Login is gated on email
/// confirmation (admins excepted) and, for teachers, on admin approval.
#[instrument(skip(store, password))]
pub fn authenticate(store: &Store, email: &str, password: &str) -> Result<User, AppError> {
    info!("Authenticating user");
    let user = find_user_by_email(store, email)
        .ok_or_else(|| AppError::Authentication("Invalid email or password".to_string()))?;

    let valid = match bcrypt::verify(password, &user.password) {
        Ok(valid) => valid,
        Err(_) => false,
    };
    if !valid {
        return Err(AppError::Authentication(
            "Invalid email or password".to_string(),
        ));
    }

    if user.role != Role::Admin && !user.is_email_confirmed {
        return Err(AppError::Authentication(
            "Please confirm your email address before logging in".to_string(),
        ));
    }

    if user.role == Role::Teacher && !user.is_approved_teacher() {
        return Err(AppError::Authentication(
            "Your teacher account is pending admin approval".to_string(),
        ));
    }

    info!(user_id = %user.id, role = %user.role, "Login successful");
    Ok(user)
}

/// Registers a new account. Students also spawn the legacy array projection;
/// every registration creates an email-confirmation token.
#[instrument(skip(store, request), fields(email = %request.email, role = %request.role))]
pub fn register(store: &Store, request: RegistrationRequest) -> Result<RegistrationOutcome, AppError> {
    info!("Registering new user");
    request.validate()?;

    if find_user_by_email(store, &request.email).is_some() {
        return Err(AppError::AlreadyExists(format!(
            "Email {} is already registered",
            request.email
        )));
    }

    let now = Utc::now();
    let user_id = format!("{}_{}", request.role, Uuid::new_v4().simple());
    let hashed = bcrypt::hash(&request.password, bcrypt::DEFAULT_COST)?;

    let mut user = User {
        id: user_id,
        name: request.name,
        email: request.email,
        password: hashed,
        role: request.role,
        is_email_confirmed: false,
        joined_date: now,
        email_confirmed_at: None,
        updated_at: None,
        student: None,
        teacher: None,
    };

    match request.role {
        Role::Teacher => {
            user.teacher = Some(TeacherData {
                specialization: request
                    .specialization
                    .unwrap_or_else(|| "General".to_string()),
                bio: request.bio.unwrap_or_default(),
                is_approved: false,
                approved_date: None,
                dismissed_date: None,
                courses: Vec::new(),
            });
        }
        Role::Student => {
            let data = StudentData {
                level: request.level.unwrap_or_else(|| "Beginner".to_string()),
                ..Default::default()
            };
            user.student = Some(data.clone());
            push_legacy_student(
                store,
                LegacyStudent {
                    id: 0,
                    user_id: user.id.clone(),
                    name: user.name.clone(),
                    email: user.email.clone(),
                    password: user.password.clone(),
                    is_email_confirmed: false,
                    joined_date: now,
                    data,
                },
            );
        }
        Role::Admin => {}
    }

    let mut users = store.users();
    users.insert(user.id.clone(), user.clone());
    store.save_users(&users);

    let confirmation_token = create_confirmation(store, &user.id, &user.email);
    info!(user_id = %user.id, "User registered, confirmation pending");

    Ok(RegistrationOutcome {
        user,
        confirmation_token,
    })
}
