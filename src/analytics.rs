//! Aggregates derived by scanning all students; nothing here is stored.

use tracing::{info, instrument};

use crate::auth::Role;
use crate::error::AppError;
use crate::identity::all_students;
use crate::models::{CourseAnalytics, PlatformStats, QuizResult, Student};
use crate::store::Store;

fn rate(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        0
    } else {
        ((part as f64 / whole as f64) * 100.0).round() as u32
    }
}

#[instrument(skip(store))]
pub fn course_analytics(store: &Store, course_key: &str) -> Result<CourseAnalytics, AppError> {
    info!("Computing course analytics");
    let courses = store.courses();
    let course = courses
        .get(course_key)
        .ok_or_else(|| AppError::NotFound(format!("Course {} not found", course_key)))?;
    let total_lessons = course.lessons.len();

    let students = all_students(store);
    let enrolled: Vec<&Student> = students
        .iter()
        .filter(|s| s.data.is_enrolled(course_key))
        .collect();
    let total_enrolled = enrolled.len();
    let total_completed = enrolled
        .iter()
        .filter(|s| s.data.has_completed_course(course_key))
        .count();

    let prefix = format!("{}-", course_key);
    let completed_slots: usize = enrolled
        .iter()
        .map(|s| {
            s.data
                .completed_lessons
                .iter()
                .filter(|k| k.starts_with(&prefix))
                .count()
        })
        .sum();

    let results: Vec<&QuizResult> = students
        .iter()
        .flat_map(|s| s.data.quiz_results.iter())
        .filter(|r| r.course_key == course_key)
        .collect();
    let quiz_attempts = results.iter().map(|r| r.attempts as usize).sum();
    let passed = results.iter().filter(|r| r.passed).count();
    let average_quiz_score = if results.is_empty() {
        0
    } else {
        (results.iter().map(|r| r.score as f64).sum::<f64>() / results.len() as f64).round() as u32
    };

    Ok(CourseAnalytics {
        total_enrolled,
        total_completed,
        completion_rate: rate(total_completed, total_enrolled),
        average_lesson_completion: rate(completed_slots, total_enrolled * total_lessons),
        quiz_attempts,
        quiz_pass_rate: rate(passed, results.len()),
        average_quiz_score,
    })
}

#[instrument(skip(store))]
pub fn platform_stats(store: &Store) -> PlatformStats {
    info!("Computing platform statistics");
    let users = store.users();
    let courses = store.courses();
    let students = all_students(store);

    let teachers: Vec<_> = users.values().filter(|u| u.role == Role::Teacher).collect();
    let approved = teachers.iter().filter(|t| t.is_approved_teacher()).count();

    let total_lessons = courses.values().map(|c| c.lessons.len()).sum();
    let total_completed_lessons = students
        .iter()
        .map(|s| s.data.completed_lessons.len())
        .sum();

    let mut recent = students.clone();
    recent.sort_by(|a, b| b.joined_date.cmp(&a.joined_date));
    recent.truncate(5);

    PlatformStats {
        total_users: users.len(),
        total_students: students.len(),
        total_teachers: teachers.len(),
        total_approved_teachers: approved,
        total_pending_teachers: teachers.len() - approved,
        total_courses: courses.len(),
        total_lessons,
        total_completed_lessons,
        recent_students: recent,
    }
}
