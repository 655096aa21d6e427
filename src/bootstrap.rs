//! First-run seeding. Guarantees an admin account exists and, on a fresh
//! store, installs a small demo catalog so the platform is usable before any
//! teacher has published anything.

use chrono::Utc;
use tracing::{info, instrument};

use crate::auth::Role;
use crate::config::AdminConfig;
use crate::error::AppError;
use crate::identity::push_legacy_student;
use crate::models::{
    Course, LegacyStudent, Lesson, Quiz, QuizQuestion, StudentData, TeacherData, User,
};
use crate::store::Store;

const DEMO_TEACHER_ID: &str = "teacher_demo";
const DEMO_STUDENT_ID: &str = "student_demo";

#[instrument(skip(store, admin))]
pub fn ensure_defaults(store: &Store, admin: &AdminConfig) -> Result<(), AppError> {
    ensure_admin(store, admin)?;
    if store.courses().is_empty() {
        seed_demo_content(store)?;
    }
    Ok(())
}

/// Creates the admin account from configuration if no admin exists yet.
fn ensure_admin(store: &Store, admin: &AdminConfig) -> Result<(), AppError> {
    let mut users = store.users();
    if users.values().any(|u| u.role == Role::Admin) {
        return Ok(());
    }

    info!(email = %admin.email, "Seeding admin account");
    let user = User {
        id: "admin_1".to_string(),
        name: admin.name.clone(),
        email: admin.email.clone(),
        password: bcrypt::hash(&admin.password, bcrypt::DEFAULT_COST)?,
        role: Role::Admin,
        is_email_confirmed: true,
        joined_date: Utc::now(),
        email_confirmed_at: Some(Utc::now()),
        updated_at: None,
        student: None,
        teacher: None,
    };
    users.insert(user.id.clone(), user);
    store.save_users(&users);
    Ok(())
}

/// Installs an approved demo teacher, a demo student and two starter courses.
fn seed_demo_content(store: &Store) -> Result<(), AppError> {
    info!("Seeding demo catalog");
    let now = Utc::now();

    let mut users = store.users();
    users.insert(
        DEMO_TEACHER_ID.to_string(),
        User {
            id: DEMO_TEACHER_ID.to_string(),
            name: "Sarah Johnson".to_string(),
            email: "teacher@stem.local".to_string(),
            password: bcrypt::hash("teacher123", bcrypt::DEFAULT_COST)?,
            role: Role::Teacher,
            is_email_confirmed: true,
            joined_date: now,
            email_confirmed_at: Some(now),
            updated_at: None,
            student: None,
            teacher: Some(TeacherData {
                specialization: "Computer Science".to_string(),
                bio: "Teaches programming fundamentals.".to_string(),
                is_approved: true,
                approved_date: Some(now),
                dismissed_date: None,
                courses: vec!["python".to_string(), "web-development".to_string()],
            }),
        },
    );

    let student_data = StudentData::default();
    users.insert(
        DEMO_STUDENT_ID.to_string(),
        User {
            id: DEMO_STUDENT_ID.to_string(),
            name: "Alex Rivera".to_string(),
            email: "student@stem.local".to_string(),
            password: bcrypt::hash("student123", bcrypt::DEFAULT_COST)?,
            role: Role::Student,
            is_email_confirmed: true,
            joined_date: now,
            email_confirmed_at: Some(now),
            updated_at: None,
            student: Some(student_data.clone()),
            teacher: None,
        },
    );
    store.save_users(&users);

    push_legacy_student(
        store,
        LegacyStudent {
            id: 0,
            user_id: DEMO_STUDENT_ID.to_string(),
            name: "Alex Rivera".to_string(),
            email: "student@stem.local".to_string(),
            password: users[DEMO_STUDENT_ID].password.clone(),
            is_email_confirmed: true,
            joined_date: now,
            data: student_data,
        },
    );

    let mut courses = store.courses();
    courses.insert("python".to_string(), python_course(now));
    courses.insert("web-development".to_string(), web_course(now));
    store.save_courses(&courses);
    Ok(())
}

fn python_course(now: chrono::DateTime<Utc>) -> Course {
    Course {
        title: "Python Programming".to_string(),
        description: "Learn Python from variables to functions.".to_string(),
        thumbnail: "🐍".to_string(),
        teacher_id: DEMO_TEACHER_ID.to_string(),
        teacher_name: "Sarah Johnson".to_string(),
        is_published: true,
        approved_date: Some(now),
        lessons: vec![
            Lesson {
                id: 1,
                title: "Variables and Types".to_string(),
                content: "Numbers, strings and booleans in Python.".to_string(),
                duration: "15 min".to_string(),
                multimedia: Vec::new(),
                quiz: Some(Quiz {
                    title: "Variables Check".to_string(),
                    passing_score: 70,
                    questions: vec![QuizQuestion {
                        id: 1,
                        question: "Which keyword creates a variable in Python?".to_string(),
                        options: vec![
                            "let".to_string(),
                            "var".to_string(),
                            "none, just assign".to_string(),
                        ],
                        correct_answer: 2,
                    }],
                }),
            },
            Lesson {
                id: 2,
                title: "Functions".to_string(),
                content: "Defining and calling functions with def.".to_string(),
                duration: "20 min".to_string(),
                multimedia: Vec::new(),
                quiz: None,
            },
        ],
    }
}

fn web_course(now: chrono::DateTime<Utc>) -> Course {
    Course {
        title: "Web Development Basics".to_string(),
        description: "HTML, CSS and a first taste of JavaScript.".to_string(),
        thumbnail: "🌐".to_string(),
        teacher_id: DEMO_TEACHER_ID.to_string(),
        teacher_name: "Sarah Johnson".to_string(),
        is_published: true,
        approved_date: Some(now),
        lessons: vec![Lesson {
            id: 1,
            title: "HTML Structure".to_string(),
            content: "Elements, tags and the document tree.".to_string(),
            duration: "18 min".to_string(),
            multimedia: Vec::new(),
            quiz: None,
        }],
    }
}
