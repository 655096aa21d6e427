use chrono::Utc;
use tracing::{info, instrument};

use crate::error::AppError;
use crate::identity::{get_student, save_student};
use crate::models::QuizResult;
use crate::store::Store;

/// Records a quiz attempt for (course, lesson). Best score wins: an existing
/// result is replaced only when the new score is strictly higher; the
/// attempt counter is incremented either way. Passing a quiz does not mark
/// the lesson complete; the calling workflow decides that separately.
#[instrument(skip(store))]
pub fn record_quiz_result(
    store: &Store,
    student_id: &str,
    course_key: &str,
    lesson_id: i64,
    score: u32,
    passed: bool,
    total_questions: u32,
) -> Result<QuizResult, AppError> {
    info!("Recording quiz result");
    let mut student = get_student(store, student_id)?;
    let now = Utc::now();

    let result = match student
        .data
        .quiz_results
        .iter_mut()
        .find(|r| r.course_key == course_key && r.lesson_id == lesson_id)
    {
        Some(existing) => {
            existing.attempts += 1;
            if score > existing.score {
                existing.score = score;
                existing.passed = passed;
                existing.total_questions = total_questions;
                existing.completed_at = now;
            }
            existing.clone()
        }
        None => {
            let result = QuizResult {
                course_key: course_key.to_string(),
                lesson_id,
                score,
                passed,
                total_questions,
                completed_at: now,
                attempts: 1,
            };
            student.data.quiz_results.push(result.clone());
            result
        }
    };

    save_student(store, &student)?;
    Ok(result)
}

/// Stored best result for one (course, lesson), if any attempt was made.
pub fn quiz_result(
    store: &Store,
    student_id: &str,
    course_key: &str,
    lesson_id: i64,
) -> Result<Option<QuizResult>, AppError> {
    let student = get_student(store, student_id)?;
    Ok(student
        .data
        .quiz_results
        .iter()
        .find(|r| r.course_key == course_key && r.lesson_id == lesson_id)
        .cloned())
}
