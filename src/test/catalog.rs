#[cfg(test)]
mod tests {
    use crate::catalog::{
        CourseDraft, LessonDraft, MultimediaDraft, add_lesson, add_multimedia, create_course,
        courses_by_teacher, delete_course, delete_lesson, get_course, published_courses,
        remove_lesson_quiz, remove_multimedia, set_course_published, set_lesson_quiz,
        update_course, update_lesson,
    };
    use crate::enrollment::enroll;
    use crate::error::AppError;
    use crate::models::{Quiz, QuizQuestion};
    use crate::progress::complete_lesson;
    use crate::test::utils::fixtures::TestStoreBuilder;

    fn draft(title: &str) -> CourseDraft {
        CourseDraft {
            title: title.to_string(),
            description: format!("{} description", title),
            thumbnail: "📚".to_string(),
        }
    }

    fn lesson_draft(title: &str) -> LessonDraft {
        LessonDraft {
            title: title.to_string(),
            content: format!("{} content", title),
            duration: "10 min".to_string(),
            multimedia: Vec::new(),
            quiz: None,
        }
    }

    fn sample_quiz() -> Quiz {
        Quiz {
            title: "Checkpoint".to_string(),
            passing_score: 70,
            questions: vec![QuizQuestion {
                id: 1,
                question: "2 + 2?".to_string(),
                options: vec!["3".to_string(), "4".to_string()],
                correct_answer: 1,
            }],
        }
    }

    #[test]
    fn created_course_starts_unpublished_and_registers_with_teacher() {
        let f = TestStoreBuilder::new().teacher("t1", "Taylor").build();

        let course = create_course(&f.store, "rust", "t1", draft("Rust")).expect("create failed");
        assert!(!course.is_published);
        assert_eq!(course.teacher_name, "Taylor");
        assert!(course.approved_date.is_none());

        let teacher = f.user("t1");
        assert!(
            teacher
                .teacher
                .expect("teacher data missing")
                .courses
                .contains(&"rust".to_string())
        );
        assert!(published_courses(&f.store).is_empty());
        assert_eq!(courses_by_teacher(&f.store, "t1").len(), 1);
    }

    #[test]
    fn course_keys_are_unique() {
        let f = TestStoreBuilder::new()
            .teacher("t1", "Taylor")
            .course("python", "t1", 1)
            .build();
        assert!(matches!(
            create_course(&f.store, "python", "t1", draft("Dup")),
            Err(AppError::AlreadyExists(_))
        ));
    }

    #[test]
    fn only_teachers_own_courses() {
        let f = TestStoreBuilder::new().student("s1", "Sam").build();
        assert!(matches!(
            create_course(&f.store, "rust", "s1", draft("Rust")),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn publishing_stamps_approval_once() {
        let f = TestStoreBuilder::new().teacher("t1", "Taylor").build();
        create_course(&f.store, "rust", "t1", draft("Rust")).expect("create failed");

        let published = set_course_published(&f.store, "rust", true).expect("publish failed");
        assert!(published.is_published);
        let stamp = published.approved_date.expect("approval date missing");

        set_course_published(&f.store, "rust", false).expect("unpublish failed");
        let republished = set_course_published(&f.store, "rust", true).expect("publish failed");
        assert_eq!(republished.approved_date, Some(stamp));
    }

    #[test]
    fn course_updates_preserve_lessons() {
        let f = TestStoreBuilder::new()
            .teacher("t1", "Taylor")
            .course("python", "t1", 2)
            .build();

        let updated =
            update_course(&f.store, "python", draft("Python Revised")).expect("update failed");
        assert_eq!(updated.title, "Python Revised");
        assert_eq!(updated.lessons.len(), 2);
    }

    #[test]
    fn lesson_ids_never_reuse() {
        let f = TestStoreBuilder::new()
            .teacher("t1", "Taylor")
            .course("python", "t1", 2)
            .build();

        delete_lesson(&f.store, "python", 2).expect("delete failed");
        let lesson = add_lesson(&f.store, "python", lesson_draft("Replacement"))
            .expect("add failed");
        assert_eq!(lesson.id, 2);

        let another = add_lesson(&f.store, "python", lesson_draft("Another")).expect("add failed");
        assert_eq!(another.id, 3);
    }

    #[test]
    fn lesson_update_replaces_fields() {
        let f = TestStoreBuilder::new()
            .teacher("t1", "Taylor")
            .course("python", "t1", 1)
            .build();

        let mut new_draft = lesson_draft("Rewritten");
        new_draft.quiz = Some(sample_quiz());
        let updated = update_lesson(&f.store, "python", 1, new_draft).expect("update failed");
        assert_eq!(updated.title, "Rewritten");
        assert!(updated.quiz.is_some());

        assert!(matches!(
            update_lesson(&f.store, "python", 99, lesson_draft("Nope")),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn deleting_a_course_scrubs_every_reference() {
        let f = TestStoreBuilder::new()
            .teacher("t1", "Taylor")
            .student("s1", "Sam")
            .course("python", "t1", 1)
            .course("web", "t1", 1)
            .build();
        enroll(&f.store, "s1", "python").expect("enroll failed");
        enroll(&f.store, "s1", "web").expect("enroll failed");
        complete_lesson(&f.store, "s1", "python", 1).expect("completion failed");
        let points_before = f.student("s1").data.points;

        delete_course(&f.store, "python").expect("delete failed");

        assert!(matches!(
            get_course(&f.store, "python"),
            Err(AppError::NotFound(_))
        ));

        let student = f.student("s1");
        assert!(!student.data.is_enrolled("python"));
        assert!(!student.data.has_completed_course("python"));
        assert!(!student.data.progress.contains_key("python"));
        assert!(
            student
                .data
                .completed_lessons
                .iter()
                .all(|k| !k.starts_with("python-"))
        );
        assert!(student.data.is_enrolled("web"));
        // earned points are history, not derived state
        assert_eq!(student.data.points, points_before);

        let legacy = f.legacy_record("s1");
        assert_eq!(legacy.data, student.data);

        let teacher = f.user("t1").teacher.expect("teacher data missing");
        assert!(!teacher.courses.contains(&"python".to_string()));
        assert!(teacher.courses.contains(&"web".to_string()));
    }

    #[test]
    fn deleting_a_lesson_recomputes_progress() {
        let f = TestStoreBuilder::new()
            .teacher("t1", "Taylor")
            .student("s1", "Sam")
            .course("python", "t1", 2)
            .build();
        enroll(&f.store, "s1", "python").expect("enroll failed");
        complete_lesson(&f.store, "s1", "python", 1).expect("completion failed");
        assert_eq!(f.student("s1").data.course_progress("python"), 50);

        delete_lesson(&f.store, "python", 1).expect("delete failed");

        let student = f.student("s1");
        assert!(student.data.completed_lessons.is_empty());
        assert_eq!(student.data.course_progress("python"), 0);
        assert_eq!(f.legacy_record("s1").data, student.data);
    }

    #[test]
    fn deleting_the_last_uncompleted_lesson_completes_nothing() {
        let f = TestStoreBuilder::new()
            .teacher("t1", "Taylor")
            .student("s1", "Sam")
            .course("python", "t1", 2)
            .build();
        enroll(&f.store, "s1", "python").expect("enroll failed");
        complete_lesson(&f.store, "s1", "python", 1).expect("completion failed");

        delete_lesson(&f.store, "python", 2).expect("delete failed");

        // progress recomputes to 100 but completion is only awarded by the
        // progress engine, not by catalog cascades
        let student = f.student("s1");
        assert_eq!(student.data.course_progress("python"), 100);
        assert!(!student.data.has_completed_course("python"));
    }

    #[test]
    fn multimedia_round_trip() {
        let f = TestStoreBuilder::new()
            .teacher("t1", "Taylor")
            .course("python", "t1", 1)
            .build();

        let item = add_multimedia(
            &f.store,
            "python",
            1,
            MultimediaDraft {
                media_type: "video".to_string(),
                url: "https://example.com/intro.mp4".to_string(),
                title: "Intro".to_string(),
                description: "Walkthrough".to_string(),
            },
        )
        .expect("add failed");
        assert_eq!(item.id, 1);

        let course = get_course(&f.store, "python").expect("course missing");
        assert_eq!(course.lessons[0].multimedia.len(), 1);

        remove_multimedia(&f.store, "python", 1, item.id).expect("remove failed");
        let course = get_course(&f.store, "python").expect("course missing");
        assert!(course.lessons[0].multimedia.is_empty());

        assert!(matches!(
            remove_multimedia(&f.store, "python", 1, item.id),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn quiz_slot_can_be_set_and_cleared() {
        let f = TestStoreBuilder::new()
            .teacher("t1", "Taylor")
            .course("python", "t1", 1)
            .build();

        set_lesson_quiz(&f.store, "python", 1, sample_quiz()).expect("set failed");
        let course = get_course(&f.store, "python").expect("course missing");
        assert!(course.lessons[0].quiz.is_some());

        remove_lesson_quiz(&f.store, "python", 1).expect("remove failed");
        let course = get_course(&f.store, "python").expect("course missing");
        assert!(course.lessons[0].quiz.is_none());
    }
}
