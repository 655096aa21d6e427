//! CRUD over the nested courses → lessons → {multimedia, quiz} structure.
//! Mutations load the whole courses map, apply the change and write the map
//! back. Deletes cascade into every student record (both projections) and
//! the owning teacher's course list.

use std::collections::BTreeMap;

use chrono::Utc;
use tracing::{info, instrument};

use crate::auth::Role;
use crate::error::AppError;
use crate::models::{Course, Lesson, MultimediaItem, Quiz, StudentData, lesson_key};
use crate::progress::recompute_course_progress;
use crate::store::Store;

#[derive(Debug, Clone)]
pub struct CourseDraft {
    pub title: String,
    pub description: String,
    pub thumbnail: String,
}

#[derive(Debug, Clone)]
pub struct LessonDraft {
    pub title: String,
    pub content: String,
    pub duration: String,
    pub multimedia: Vec<MultimediaItem>,
    pub quiz: Option<Quiz>,
}

#[derive(Debug, Clone)]
pub struct MultimediaDraft {
    pub media_type: String,
    pub url: String,
    pub title: String,
    pub description: String,
}

pub fn get_course(store: &Store, course_key: &str) -> Result<Course, AppError> {
    store
        .courses()
        .get(course_key)
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("Course {} not found", course_key)))
}

pub fn all_courses(store: &Store) -> BTreeMap<String, Course> {
    store.courses()
}

pub fn published_courses(store: &Store) -> BTreeMap<String, Course> {
    store
        .courses()
        .into_iter()
        .filter(|(_, course)| course.is_published)
        .collect()
}

pub fn courses_by_teacher(store: &Store, teacher_id: &str) -> BTreeMap<String, Course> {
    store
        .courses()
        .into_iter()
        .filter(|(_, course)| course.teacher_id == teacher_id)
        .collect()
}

/// Creates an unpublished course under a new key and registers the key in
/// the teacher's course list.
#[instrument(skip(store, draft))]
pub fn create_course(
    store: &Store,
    course_key: &str,
    teacher_id: &str,
    draft: CourseDraft,
) -> Result<Course, AppError> {
    info!("Creating course");
    let mut courses = store.courses();
    if courses.contains_key(course_key) {
        return Err(AppError::AlreadyExists(format!(
            "Course key {} is already in use",
            course_key
        )));
    }

    let mut users = store.users();
    let teacher = users
        .get_mut(teacher_id)
        .filter(|u| u.role == Role::Teacher)
        .ok_or_else(|| AppError::NotFound(format!("Teacher {} not found", teacher_id)))?;

    let course = Course {
        title: draft.title,
        description: draft.description,
        thumbnail: draft.thumbnail,
        teacher_id: teacher_id.to_string(),
        teacher_name: teacher.name.clone(),
        is_published: false,
        approved_date: None,
        lessons: Vec::new(),
    };

    teacher
        .teacher
        .get_or_insert_with(Default::default)
        .courses
        .push(course_key.to_string());
    store.save_users(&users);

    courses.insert(course_key.to_string(), course.clone());
    store.save_courses(&courses);
    Ok(course)
}

#[instrument(skip(store, draft))]
pub fn update_course(
    store: &Store,
    course_key: &str,
    draft: CourseDraft,
) -> Result<Course, AppError> {
    info!("Updating course");
    let mut courses = store.courses();
    let course = courses
        .get_mut(course_key)
        .ok_or_else(|| AppError::NotFound(format!("Course {} not found", course_key)))?;

    course.title = draft.title;
    course.description = draft.description;
    course.thumbnail = draft.thumbnail;
    let updated = course.clone();

    store.save_courses(&courses);
    Ok(updated)
}

#[instrument(skip(store))]
pub fn set_course_published(
    store: &Store,
    course_key: &str,
    published: bool,
) -> Result<Course, AppError> {
    info!("Changing course publication state");
    let mut courses = store.courses();
    let course = courses
        .get_mut(course_key)
        .ok_or_else(|| AppError::NotFound(format!("Course {} not found", course_key)))?;

    course.is_published = published;
    if published && course.approved_date.is_none() {
        course.approved_date = Some(Utc::now());
    }
    let updated = course.clone();

    store.save_courses(&courses);
    Ok(updated)
}

fn scrub_course_from_student(data: &mut StudentData, course_key: &str, prefix: &str) -> bool {
    let mut changed = false;

    let n = data.enrolled_courses.len();
    data.enrolled_courses.retain(|c| c != course_key);
    changed |= n != data.enrolled_courses.len();

    let n = data.completed_courses.len();
    data.completed_courses.retain(|c| c != course_key);
    changed |= n != data.completed_courses.len();

    let n = data.completed_lessons.len();
    data.completed_lessons.retain(|k| !k.starts_with(prefix));
    changed |= n != data.completed_lessons.len();

    changed |= data.progress.remove(course_key).is_some();
    changed |= data.current_lesson_index.remove(course_key).is_some();
    changed |= data.enrolled_courses_date.remove(course_key).is_some();

    changed
}

/// Deletes a course and scrubs every reference to it: enrollment, progress,
/// lesson pointers, completion state in both student projections, and the
/// key in the owning teacher's course list.
#[instrument(skip(store))]
pub fn delete_course(store: &Store, course_key: &str) -> Result<Course, AppError> {
    info!("Deleting course with cascade");
    let mut courses = store.courses();
    let removed = courses
        .remove(course_key)
        .ok_or_else(|| AppError::NotFound(format!("Course {} not found", course_key)))?;
    store.save_courses(&courses);

    let prefix = format!("{}-", course_key);

    let mut users = store.users();
    let mut changed = false;
    for user in users.values_mut() {
        if let Some(data) = user.student.as_mut() {
            changed |= scrub_course_from_student(data, course_key, &prefix);
        }
        if let Some(teacher) = user.teacher.as_mut() {
            let n = teacher.courses.len();
            teacher.courses.retain(|c| c != course_key);
            changed |= n != teacher.courses.len();
        }
    }
    if changed {
        store.save_users(&users);
    }

    let mut students = store.students();
    let mut changed = false;
    for record in &mut students {
        changed |= scrub_course_from_student(&mut record.data, course_key, &prefix);
    }
    if changed {
        store.save_students(&students);
    }

    Ok(removed)
}

fn next_id<T>(items: &[T], id_of: impl Fn(&T) -> i64) -> i64 {
    items.iter().map(id_of).max().unwrap_or(0) + 1
}

#[instrument(skip(store, draft))]
pub fn add_lesson(
    store: &Store,
    course_key: &str,
    draft: LessonDraft,
) -> Result<Lesson, AppError> {
    info!("Adding lesson");
    let mut courses = store.courses();
    let course = courses
        .get_mut(course_key)
        .ok_or_else(|| AppError::NotFound(format!("Course {} not found", course_key)))?;

    let lesson = Lesson {
        id: next_id(&course.lessons, |l| l.id),
        title: draft.title,
        content: draft.content,
        duration: draft.duration,
        multimedia: draft.multimedia,
        quiz: draft.quiz,
    };
    course.lessons.push(lesson.clone());

    store.save_courses(&courses);
    Ok(lesson)
}

#[instrument(skip(store, draft))]
pub fn update_lesson(
    store: &Store,
    course_key: &str,
    lesson_id: i64,
    draft: LessonDraft,
) -> Result<Lesson, AppError> {
    info!("Updating lesson");
    let mut courses = store.courses();
    let course = courses
        .get_mut(course_key)
        .ok_or_else(|| AppError::NotFound(format!("Course {} not found", course_key)))?;
    let lesson = course
        .lessons
        .iter_mut()
        .find(|l| l.id == lesson_id)
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "Lesson {} not found in course {}",
                lesson_id, course_key
            ))
        })?;

    lesson.title = draft.title;
    lesson.content = draft.content;
    lesson.duration = draft.duration;
    lesson.multimedia = draft.multimedia;
    lesson.quiz = draft.quiz;
    let updated = lesson.clone();

    store.save_courses(&courses);
    Ok(updated)
}

/// Removes a lesson, scrubs its completion key from every student and
/// recomputes course progress against the shortened lesson list.
#[instrument(skip(store))]
pub fn delete_lesson(store: &Store, course_key: &str, lesson_id: i64) -> Result<(), AppError> {
    info!("Deleting lesson with cascade");
    let mut courses = store.courses();
    let course = courses
        .get_mut(course_key)
        .ok_or_else(|| AppError::NotFound(format!("Course {} not found", course_key)))?;
    let n = course.lessons.len();
    course.lessons.retain(|l| l.id != lesson_id);
    if course.lessons.len() == n {
        return Err(AppError::NotFound(format!(
            "Lesson {} not found in course {}",
            lesson_id, course_key
        )));
    }
    store.save_courses(&courses);
    let course = &courses[course_key];

    let key = lesson_key(course_key, lesson_id);

    let mut users = store.users();
    let mut changed = false;
    for user in users.values_mut() {
        if let Some(data) = user.student.as_mut() {
            changed |= scrub_lesson_from_student(data, course_key, &key, course);
        }
    }
    if changed {
        store.save_users(&users);
    }

    let mut students = store.students();
    let mut changed = false;
    for record in &mut students {
        changed |= scrub_lesson_from_student(&mut record.data, course_key, &key, course);
    }
    if changed {
        store.save_students(&students);
    }

    Ok(())
}

fn scrub_lesson_from_student(
    data: &mut StudentData,
    course_key: &str,
    key: &str,
    course: &Course,
) -> bool {
    let n = data.completed_lessons.len();
    data.completed_lessons.retain(|k| k != key);
    let removed = n != data.completed_lessons.len();

    let tracked = data.progress.contains_key(course_key);
    if tracked {
        recompute_course_progress(data, course_key, course);
    }

    removed || tracked
}

#[instrument(skip(store, draft))]
pub fn add_multimedia(
    store: &Store,
    course_key: &str,
    lesson_id: i64,
    draft: MultimediaDraft,
) -> Result<MultimediaItem, AppError> {
    info!("Adding multimedia item");
    let mut courses = store.courses();
    let course = courses
        .get_mut(course_key)
        .ok_or_else(|| AppError::NotFound(format!("Course {} not found", course_key)))?;
    let lesson = course
        .lessons
        .iter_mut()
        .find(|l| l.id == lesson_id)
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "Lesson {} not found in course {}",
                lesson_id, course_key
            ))
        })?;

    let item = MultimediaItem {
        id: next_id(&lesson.multimedia, |m| m.id),
        media_type: draft.media_type,
        url: draft.url,
        title: draft.title,
        description: draft.description,
    };
    lesson.multimedia.push(item.clone());

    store.save_courses(&courses);
    Ok(item)
}

#[instrument(skip(store))]
pub fn remove_multimedia(
    store: &Store,
    course_key: &str,
    lesson_id: i64,
    item_id: i64,
) -> Result<(), AppError> {
    info!("Removing multimedia item");
    let mut courses = store.courses();
    let course = courses
        .get_mut(course_key)
        .ok_or_else(|| AppError::NotFound(format!("Course {} not found", course_key)))?;
    let lesson = course
        .lessons
        .iter_mut()
        .find(|l| l.id == lesson_id)
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "Lesson {} not found in course {}",
                lesson_id, course_key
            ))
        })?;

    let n = lesson.multimedia.len();
    lesson.multimedia.retain(|m| m.id != item_id);
    if lesson.multimedia.len() == n {
        return Err(AppError::NotFound(format!(
            "Multimedia item {} not found in lesson {}",
            item_id, lesson_id
        )));
    }

    store.save_courses(&courses);
    Ok(())
}

#[instrument(skip(store, quiz))]
pub fn set_lesson_quiz(
    store: &Store,
    course_key: &str,
    lesson_id: i64,
    quiz: Quiz,
) -> Result<(), AppError> {
    info!("Setting lesson quiz");
    update_quiz_slot(store, course_key, lesson_id, Some(quiz))
}

#[instrument(skip(store))]
pub fn remove_lesson_quiz(
    store: &Store,
    course_key: &str,
    lesson_id: i64,
) -> Result<(), AppError> {
    info!("Removing lesson quiz");
    update_quiz_slot(store, course_key, lesson_id, None)
}

fn update_quiz_slot(
    store: &Store,
    course_key: &str,
    lesson_id: i64,
    quiz: Option<Quiz>,
) -> Result<(), AppError> {
    let mut courses = store.courses();
    let course = courses
        .get_mut(course_key)
        .ok_or_else(|| AppError::NotFound(format!("Course {} not found", course_key)))?;
    let lesson = course
        .lessons
        .iter_mut()
        .find(|l| l.id == lesson_id)
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "Lesson {} not found in course {}",
                lesson_id, course_key
            ))
        })?;

    lesson.quiz = quiz;
    store.save_courses(&courses);
    Ok(())
}
