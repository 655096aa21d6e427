use chrono::Utc;
use tracing::{info, instrument, warn};

use crate::error::AppError;
use crate::identity::{get_student, lookup_student, save_student};
use crate::models::{CompletionStatus, EnrolledCourse, Student, lesson_key};
use crate::store::Store;

/// Adds the course to the student's enrollment set and initializes the
/// derived per-course state in the same save.
#[instrument(skip(store))]
pub fn enroll(store: &Store, student_id: &str, course_key: &str) -> Result<Student, AppError> {
    info!("Enrolling student in course");
    let mut student = get_student(store, student_id)?;
    let courses = store.courses();
    if !courses.contains_key(course_key) {
        return Err(AppError::NotFound(format!("Course {} not found", course_key)));
    }
    if student.data.is_enrolled(course_key) {
        return Err(AppError::AlreadyExists(format!(
            "Already enrolled in course {}",
            course_key
        )));
    }

    student.data.enrolled_courses.push(course_key.to_string());
    student.data.progress.insert(course_key.to_string(), 0);
    student
        .data
        .current_lesson_index
        .insert(course_key.to_string(), 0);
    student
        .data
        .enrolled_courses_date
        .insert(course_key.to_string(), Utc::now());

    save_student(store, &student)?;
    Ok(student)
}

/// Removes the enrollment and every piece of derived per-course state in a
/// single consistent write: progress, lesson pointer, enrollment date,
/// course completion and all completed-lesson keys for the course.
#[instrument(skip(store))]
pub fn unenroll(store: &Store, student_id: &str, course_key: &str) -> Result<Student, AppError> {
    info!("Unenrolling student from course");
    let mut student = get_student(store, student_id)?;
    if !student.data.is_enrolled(course_key) {
        return Err(AppError::InvalidState(format!(
            "Not enrolled in course {}",
            course_key
        )));
    }

    let prefix = format!("{}-", course_key);
    student.data.enrolled_courses.retain(|c| c != course_key);
    student.data.progress.remove(course_key);
    student.data.current_lesson_index.remove(course_key);
    student.data.enrolled_courses_date.remove(course_key);
    student.data.completed_courses.retain(|c| c != course_key);
    student
        .data
        .completed_lessons
        .retain(|k| !k.starts_with(&prefix));

    save_student(store, &student)?;
    Ok(student)
}

/// Catalog fields merged with the student's progress for every enrolled
/// course. A courseKey whose course no longer exists is logged and skipped,
/// never an error.
#[instrument(skip(store))]
pub fn enrolled_courses_with_progress(
    store: &Store,
    student_id: &str,
) -> Result<Vec<EnrolledCourse>, AppError> {
    let student = get_student(store, student_id)?;
    let courses = store.courses();

    let mut enrolled = Vec::new();
    for course_key in &student.data.enrolled_courses {
        let Some(course) = courses.get(course_key) else {
            warn!(course_key = %course_key, "Enrolled course missing from catalog, skipping");
            continue;
        };

        let completed = course
            .lessons
            .iter()
            .filter(|l| {
                let key = lesson_key(course_key, l.id);
                student.data.completed_lessons.contains(&key)
            })
            .count();

        enrolled.push(EnrolledCourse {
            key: course_key.clone(),
            title: course.title.clone(),
            description: course.description.clone(),
            thumbnail: course.thumbnail.clone(),
            teacher_name: course.teacher_name.clone(),
            progress: student.data.course_progress(course_key),
            completed_lessons: completed,
            total_lessons: course.lessons.len(),
            current_lesson_index: student
                .data
                .current_lesson_index
                .get(course_key)
                .copied()
                .unwrap_or(0),
            is_completed: student.data.has_completed_course(course_key),
            enrolled_date: student
                .data
                .enrolled_courses_date
                .get(course_key)
                .copied()
                .unwrap_or(student.joined_date),
        });
    }

    Ok(enrolled)
}

/// Enrollment snapshot for one course. An unknown student reads as
/// not-enrolled rather than an error.
pub fn completion_status(store: &Store, student_id: &str, course_key: &str) -> CompletionStatus {
    match lookup_student(store, student_id) {
        Some(student) => CompletionStatus {
            enrolled: student.data.is_enrolled(course_key),
            progress: student.data.course_progress(course_key),
            completed: student.data.has_completed_course(course_key),
        },
        None => CompletionStatus::default(),
    }
}
