use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::{Permission, Role};
use crate::error::AppError;

/// Composite key recorded per completed lesson, `"courseKey-lessonId"`.
pub fn lesson_key(course_key: &str, lesson_id: i64) -> String {
    format!("{}-{}", course_key, lesson_id)
}

/// One authoritative record per person, keyed by id in the user directory.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    #[serde(default)]
    pub is_email_confirmed: bool,
    pub joined_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_confirmed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student: Option<StudentData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teacher: Option<TeacherData>,
}

impl User {
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.role.has_permission(permission)
    }

    pub fn require_permission(&self, permission: Permission) -> Result<(), AppError> {
        if self.role.has_permission(permission) {
            Ok(())
        } else {
            tracing::warn!(
                user_id = %self.id,
                role = %self.role.as_str(),
                permission = ?permission,
                "Permission denied"
            );
            Err(AppError::Authorization(format!(
                "Role '{}' may not perform this action",
                self.role.as_str()
            )))
        }
    }

    pub fn is_approved_teacher(&self) -> bool {
        self.role == Role::Teacher && self.teacher.as_ref().is_some_and(|t| t.is_approved)
    }
}

/// Progress, gamification and enrollment state carried by every student.
/// Derived fields (progress percentages, completion flags, badges) are
/// recomputed from `completed_lessons` by the progress engine.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct StudentData {
    pub level: String,
    pub progress: BTreeMap<String, u8>,
    pub completed_lessons: Vec<String>,
    pub completed_courses: Vec<String>,
    pub current_lesson_index: BTreeMap<String, usize>,
    pub points: u32,
    pub badges: Vec<String>,
    pub enrolled_courses: Vec<String>,
    pub enrolled_courses_date: BTreeMap<String, DateTime<Utc>>,
    pub certificates: Vec<Certificate>,
    pub quiz_results: Vec<QuizResult>,
}

impl Default for StudentData {
    fn default() -> Self {
        Self {
            level: "Beginner".to_string(),
            progress: BTreeMap::new(),
            completed_lessons: Vec::new(),
            completed_courses: Vec::new(),
            current_lesson_index: BTreeMap::new(),
            points: 0,
            badges: Vec::new(),
            enrolled_courses: Vec::new(),
            enrolled_courses_date: BTreeMap::new(),
            certificates: Vec::new(),
            quiz_results: Vec::new(),
        }
    }
}

impl StudentData {
    pub fn is_enrolled(&self, course_key: &str) -> bool {
        self.enrolled_courses.iter().any(|c| c == course_key)
    }

    pub fn has_completed_course(&self, course_key: &str) -> bool {
        self.completed_courses.iter().any(|c| c == course_key)
    }

    pub fn has_badge(&self, badge: &str) -> bool {
        self.badges.iter().any(|b| b == badge)
    }

    pub fn course_progress(&self, course_key: &str) -> u8 {
        self.progress.get(course_key).copied().unwrap_or(0)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct TeacherData {
    pub specialization: String,
    pub bio: String,
    pub is_approved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dismissed_date: Option<DateTime<Utc>>,
    pub courses: Vec<String>,
}

/// Array-stored projection of a student, kept field-for-field equal with the
/// authoritative user record. Carries its own numeric id plus a `user_id`
/// back-reference; retained for callers that still address students by the
/// legacy numeric ids.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LegacyStudent {
    pub id: i64,
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub is_email_confirmed: bool,
    pub joined_date: DateTime<Utc>,
    #[serde(flatten)]
    pub data: StudentData,
}

/// Merged read/write view of a student, resolved from either store by the
/// identity layer. Every domain operation works on this view and persists it
/// back through `save_student`.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legacy_id: Option<i64>,
    pub name: String,
    pub email: String,
    pub is_email_confirmed: bool,
    pub joined_date: DateTime<Utc>,
    #[serde(flatten)]
    pub data: StudentData,
}

impl Student {
    pub fn from_user(user: &User, legacy_id: Option<i64>) -> Self {
        Self {
            id: user.id.clone(),
            legacy_id,
            name: user.name.clone(),
            email: user.email.clone(),
            is_email_confirmed: user.is_email_confirmed,
            joined_date: user.joined_date,
            data: user.student.clone().unwrap_or_default(),
        }
    }

    pub fn from_legacy(record: &LegacyStudent) -> Self {
        let id = if record.user_id.is_empty() {
            record.id.to_string()
        } else {
            record.user_id.clone()
        };
        Self {
            id,
            legacy_id: Some(record.id),
            name: record.name.clone(),
            email: record.email.clone(),
            is_email_confirmed: record.is_email_confirmed,
            joined_date: record.joined_date,
            data: record.data.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub title: String,
    pub description: String,
    pub thumbnail: String,
    pub teacher_id: String,
    pub teacher_name: String,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub lessons: Vec<Lesson>,
}

impl Course {
    pub fn lesson(&self, lesson_id: i64) -> Option<&Lesson> {
        self.lessons.iter().find(|l| l.id == lesson_id)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub duration: String,
    #[serde(default)]
    pub multimedia: Vec<MultimediaItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiz: Option<Quiz>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MultimediaItem {
    pub id: i64,
    #[serde(rename = "type")]
    pub media_type: String,
    pub url: String,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub title: String,
    pub passing_score: u32,
    pub questions: Vec<QuizQuestion>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub id: i64,
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
}

/// At most one result per (student, course, lesson); replaced only by a
/// strictly better score, attempts counted across all submissions.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    pub course_key: String,
    pub lesson_id: i64,
    pub score: u32,
    pub passed: bool,
    pub total_questions: u32,
    pub completed_at: DateTime<Utc>,
    pub attempts: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    pub id: String,
    pub student_id: String,
    pub student_name: String,
    pub course_key: String,
    pub course_title: String,
    pub completion_date: DateTime<Utc>,
    pub issued_date: DateTime<Utc>,
    pub verification_code: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmailConfirmation {
    pub user_id: String,
    pub email: String,
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub is_used: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmed_at: Option<DateTime<Utc>>,
}

impl EmailConfirmation {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

/// Catalog fields merged with the student's per-course state, one entry per
/// enrolled course.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EnrolledCourse {
    pub key: String,
    pub title: String,
    pub description: String,
    pub thumbnail: String,
    pub teacher_name: String,
    pub progress: u8,
    pub completed_lessons: usize,
    pub total_lessons: usize,
    pub current_lesson_index: usize,
    pub is_completed: bool,
    pub enrolled_date: DateTime<Utc>,
}

#[derive(Debug, Serialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CompletionStatus {
    pub enrolled: bool,
    pub progress: u8,
    pub completed: bool,
}

/// Derived by scanning all students, never stored. Rates are integer
/// percentages rounded to nearest.
#[derive(Debug, Serialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CourseAnalytics {
    pub total_enrolled: usize,
    pub total_completed: usize,
    pub completion_rate: u32,
    pub average_lesson_completion: u32,
    pub quiz_attempts: usize,
    pub quiz_pass_rate: u32,
    pub average_quiz_score: u32,
}

#[derive(Debug, Serialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PlatformStats {
    pub total_users: usize,
    pub total_students: usize,
    pub total_teachers: usize,
    pub total_approved_teachers: usize,
    pub total_pending_teachers: usize,
    pub total_courses: usize,
    pub total_lessons: usize,
    pub total_completed_lessons: usize,
    pub recent_students: Vec<Student>,
}
