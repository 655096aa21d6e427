use chrono::{Duration, Utc};
use rand::Rng;
use rand::distr::Alphanumeric;
use tracing::{info, instrument};

use crate::auth::Role;
use crate::error::AppError;
use crate::identity::find_user_by_email;
use crate::models::{EmailConfirmation, User};
use crate::store::Store;

pub const CONFIRMATION_TTL_HOURS: i64 = 24;
const TOKEN_LEN: usize = 24;

fn generate_token() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// Creates a single-use, time-bounded confirmation token for a user.
#[instrument(skip(store))]
pub fn create_confirmation(store: &Store, user_id: &str, email: &str) -> String {
    let mut confirmations = store.confirmations();
    let token = generate_token();
    let now = Utc::now();

    confirmations.insert(
        token.clone(),
        EmailConfirmation {
            user_id: user_id.to_string(),
            email: email.to_string(),
            token: token.clone(),
            created_at: now,
            expires_at: now + Duration::hours(CONFIRMATION_TTL_HOURS),
            is_used: false,
            confirmed_at: None,
        },
    );
    store.save_confirmations(&confirmations);

    info!(user_id = %user_id, "Email confirmation created");
    token
}

/// Consumes a confirmation token and marks the user's email as confirmed in
/// the user directory and, for students, in the legacy projection. Expiry
/// is checked here, not proactively swept.
#[instrument(skip(store, token))]
pub fn confirm_email(store: &Store, token: &str) -> Result<User, AppError> {
    info!("Confirming email");
    let now = Utc::now();

    let mut confirmations = store.confirmations();
    let (user_id, email) = {
        let confirmation = confirmations
            .get_mut(token)
            .ok_or_else(|| AppError::NotFound("Invalid confirmation token".to_string()))?;

        if confirmation.is_used {
            return Err(AppError::AlreadyUsed(
                "Confirmation token has already been used".to_string(),
            ));
        }
        if confirmation.is_expired(now) {
            return Err(AppError::Expired(
                "Confirmation token has expired".to_string(),
            ));
        }

        confirmation.is_used = true;
        confirmation.confirmed_at = Some(now);
        (confirmation.user_id.clone(), confirmation.email.clone())
    };
    store.save_confirmations(&confirmations);

    let mut users = store.users();
    let snapshot = {
        let user = users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", user_id)))?;
        user.is_email_confirmed = true;
        user.email_confirmed_at = Some(now);
        user.clone()
    };
    store.save_users(&users);

    if snapshot.role == Role::Student {
        let mut students = store.students();
        if let Some(idx) = students
            .iter()
            .position(|s| s.user_id == user_id || s.email == email)
        {
            students[idx].is_email_confirmed = true;
            store.save_students(&students);
        }
    }

    info!(user_id = %user_id, "Email confirmed");
    Ok(snapshot)
}

/// Issues a fresh token for an unconfirmed account.
#[instrument(skip(store))]
pub fn resend_confirmation(store: &Store, email: &str) -> Result<String, AppError> {
    info!("Resending email confirmation");
    let user = find_user_by_email(store, email)
        .ok_or_else(|| AppError::NotFound(format!("No user registered with email {}", email)))?;

    if user.is_email_confirmed {
        return Err(AppError::InvalidState(
            "Email is already confirmed".to_string(),
        ));
    }

    Ok(create_confirmation(store, &user.id, email))
}
