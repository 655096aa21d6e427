//! Lesson completion and derived progress state. Progress percentages,
//! completion flags and badges are always recomputed from the authoritative
//! `completed_lessons` set, never incremented independently, so re-running
//! an operation on inconsistent prior state self-heals.

use tracing::{info, instrument};

use crate::error::AppError;
use crate::identity::{get_student, save_student};
use crate::models::{Course, Student, StudentData, lesson_key};
use crate::store::Store;

pub const LESSON_COMPLETION_POINTS: u32 = 10;
pub const COURSE_COMPLETION_POINTS: u32 = 100;
pub const COURSE_COMPLETER_BADGE: &str = "Course Completer";
pub const FAST_LEARNER_BADGE: &str = "Fast Learner";
pub const FAST_LEARNER_THRESHOLD: usize = 5;

/// Recomputes `progress[course_key]` from the completed-lesson set and the
/// course's current lesson list. Returns the new percentage.
pub(crate) fn recompute_course_progress(
    data: &mut StudentData,
    course_key: &str,
    course: &Course,
) -> u8 {
    let total = course.lessons.len();
    let completed = course
        .lessons
        .iter()
        .filter(|l| {
            let key = lesson_key(course_key, l.id);
            data.completed_lessons.contains(&key)
        })
        .count();

    let pct = if total == 0 {
        0
    } else {
        ((completed as f64 / total as f64) * 100.0).round() as u8
    };
    let pct = pct.min(100);
    data.progress.insert(course_key.to_string(), pct);
    pct
}

fn award_course_completion(data: &mut StudentData, course_key: &str) {
    if data.has_completed_course(course_key) {
        return;
    }
    data.completed_courses.push(course_key.to_string());
    data.points += COURSE_COMPLETION_POINTS;
    if !data.has_badge(COURSE_COMPLETER_BADGE) {
        data.badges.push(COURSE_COMPLETER_BADGE.to_string());
    }
}

fn first_uncompleted_index(data: &StudentData, course_key: &str, course: &Course) -> usize {
    course
        .lessons
        .iter()
        .position(|l| {
            let key = lesson_key(course_key, l.id);
            !data.completed_lessons.contains(&key)
        })
        .unwrap_or(0)
}

/// Records a lesson as completed. Idempotent: a lesson already in the
/// completed set changes nothing and awards no points. Completion of the
/// final lesson triggers the course bonus and badge; the Fast Learner badge
/// is checked against the total completed-lesson count on every call.
#[instrument(skip(store))]
pub fn complete_lesson(
    store: &Store,
    student_id: &str,
    course_key: &str,
    lesson_id: i64,
) -> Result<Student, AppError> {
    info!("Recording lesson completion");
    let mut student = get_student(store, student_id)?;
    let courses = store.courses();
    let course = courses
        .get(course_key)
        .ok_or_else(|| AppError::NotFound(format!("Course {} not found", course_key)))?;
    if course.lesson(lesson_id).is_none() {
        return Err(AppError::NotFound(format!(
            "Lesson {} not found in course {}",
            lesson_id, course_key
        )));
    }

    let key = lesson_key(course_key, lesson_id);
    if student.data.completed_lessons.contains(&key) {
        info!(lesson = %key, "Lesson already completed, no changes");
        return Ok(student);
    }

    student.data.completed_lessons.push(key);
    student.data.points += LESSON_COMPLETION_POINTS;

    let pct = recompute_course_progress(&mut student.data, course_key, course);
    if pct >= 100 {
        award_course_completion(&mut student.data, course_key);
    }

    if student.data.completed_lessons.len() >= FAST_LEARNER_THRESHOLD
        && !student.data.has_badge(FAST_LEARNER_BADGE)
    {
        student.data.badges.push(FAST_LEARNER_BADGE.to_string());
    }

    let resume = first_uncompleted_index(&student.data, course_key, course);
    student
        .data
        .current_lesson_index
        .insert(course_key.to_string(), resume);

    save_student(store, &student)?;
    Ok(student)
}

/// Writes a progress percentage directly, bypassing lesson-count derivation.
/// Used by flows that track progress externally. Clamped to 0..=100;
/// crossing 100 triggers the same completion side effects as
/// `complete_lesson`.
#[instrument(skip(store))]
pub fn set_course_progress(
    store: &Store,
    student_id: &str,
    course_key: &str,
    progress: i64,
) -> Result<u8, AppError> {
    info!("Setting course progress directly");
    let mut student = get_student(store, student_id)?;
    if !student.data.is_enrolled(course_key) {
        return Err(AppError::InvalidState(format!(
            "Not enrolled in course {}",
            course_key
        )));
    }

    let clamped = progress.clamp(0, 100) as u8;
    student.data.progress.insert(course_key.to_string(), clamped);
    if clamped >= 100 {
        award_course_completion(&mut student.data, course_key);
    }

    save_student(store, &student)?;
    Ok(clamped)
}

/// Index of the first lesson not yet completed, derived purely from current
/// state; wraps to 0 when the course is empty or fully completed. The
/// stored `current_lesson_index` is a resume hint only, never the authority.
pub fn next_lesson_index(
    store: &Store,
    student_id: &str,
    course_key: &str,
) -> Result<usize, AppError> {
    let student = get_student(store, student_id)?;
    let courses = store.courses();
    let course = courses
        .get(course_key)
        .ok_or_else(|| AppError::NotFound(format!("Course {} not found", course_key)))?;
    Ok(first_uncompleted_index(&student.data, course_key, course))
}
