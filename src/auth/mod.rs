pub mod admin;
pub mod authentication;
pub mod confirmation;
pub mod permissions;

pub use admin::{
    UserUpdate, all_teachers, approve_teacher, approved_teachers, delete_user, dismiss_teacher,
    pending_teachers, reject_teacher, update_user,
};
pub use authentication::{RegistrationOutcome, RegistrationRequest, authenticate, register};
pub use confirmation::{confirm_email, create_confirmation, resend_confirmation};
pub use permissions::{Permission, Role};
