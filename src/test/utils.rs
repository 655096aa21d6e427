#[cfg(test)]
pub mod fixtures {
    use std::sync::Once;

    use chrono::Utc;
    use tracing::log::LevelFilter;

    use crate::auth::Role;
    use crate::identity;
    use crate::models::{Course, LegacyStudent, Lesson, Student, StudentData, TeacherData, User};
    use crate::store::Store;

    static INIT: Once = Once::new();
    pub static STANDARD_PASSWORD: &str = "password123";

    // Low bcrypt cost keeps the suite fast; never used outside tests.
    const TEST_BCRYPT_COST: u32 = 4;

    pub fn hash_password(password: &str) -> String {
        bcrypt::hash(password, TEST_BCRYPT_COST).expect("bcrypt hash failed")
    }

    struct TestUser {
        id: String,
        name: String,
        role: Role,
        confirmed: bool,
        approved: bool,
    }

    struct TestCourse {
        key: String,
        teacher_id: String,
        lesson_count: usize,
    }

    #[derive(Default)]
    pub struct TestStoreBuilder {
        users: Vec<TestUser>,
        courses: Vec<TestCourse>,
    }

    impl TestStoreBuilder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn student(mut self, id: &str, name: &str) -> Self {
            self.users.push(TestUser {
                id: id.to_string(),
                name: name.to_string(),
                role: Role::Student,
                confirmed: true,
                approved: false,
            });
            self
        }

        pub fn teacher(mut self, id: &str, name: &str) -> Self {
            self.users.push(TestUser {
                id: id.to_string(),
                name: name.to_string(),
                role: Role::Teacher,
                confirmed: true,
                approved: true,
            });
            self
        }

        pub fn pending_teacher(mut self, id: &str, name: &str) -> Self {
            self.users.push(TestUser {
                id: id.to_string(),
                name: name.to_string(),
                role: Role::Teacher,
                confirmed: true,
                approved: false,
            });
            self
        }

        pub fn admin(mut self, id: &str, name: &str) -> Self {
            self.users.push(TestUser {
                id: id.to_string(),
                name: name.to_string(),
                role: Role::Admin,
                confirmed: true,
                approved: false,
            });
            self
        }

        /// Published course with `lesson_count` lessons, ids starting at 1.
        pub fn course(mut self, key: &str, teacher_id: &str, lesson_count: usize) -> Self {
            self.courses.push(TestCourse {
                key: key.to_string(),
                teacher_id: teacher_id.to_string(),
                lesson_count,
            });
            self
        }

        pub fn build(self) -> TestStore {
            INIT.call_once(|| {
                let _ = env_logger::builder()
                    .filter_level(LevelFilter::Debug)
                    .is_test(true)
                    .try_init();
            });

            let store = Store::in_memory();
            let now = Utc::now();
            let password = hash_password(STANDARD_PASSWORD);

            let mut users = store.users();
            let mut legacy = store.students();
            for spec in &self.users {
                let mut user = User {
                    id: spec.id.clone(),
                    name: spec.name.clone(),
                    email: format!("{}@test.local", spec.id),
                    password: password.clone(),
                    role: spec.role,
                    is_email_confirmed: spec.confirmed,
                    joined_date: now,
                    email_confirmed_at: spec.confirmed.then_some(now),
                    updated_at: None,
                    student: None,
                    teacher: None,
                };
                match spec.role {
                    Role::Student => {
                        let data = StudentData::default();
                        user.student = Some(data.clone());
                        legacy.push(LegacyStudent {
                            id: legacy.iter().map(|s| s.id).max().unwrap_or(0) + 1,
                            user_id: user.id.clone(),
                            name: user.name.clone(),
                            email: user.email.clone(),
                            password: user.password.clone(),
                            is_email_confirmed: spec.confirmed,
                            joined_date: now,
                            data,
                        });
                    }
                    Role::Teacher => {
                        user.teacher = Some(TeacherData {
                            specialization: "Testing".to_string(),
                            bio: String::new(),
                            is_approved: spec.approved,
                            approved_date: spec.approved.then_some(now),
                            dismissed_date: None,
                            courses: self
                                .courses
                                .iter()
                                .filter(|c| c.teacher_id == spec.id)
                                .map(|c| c.key.clone())
                                .collect(),
                        });
                    }
                    Role::Admin => {}
                }
                users.insert(user.id.clone(), user);
            }
            store.save_users(&users);
            store.save_students(&legacy);

            let mut courses = store.courses();
            for spec in &self.courses {
                let teacher_name = users
                    .get(&spec.teacher_id)
                    .map(|u| u.name.clone())
                    .unwrap_or_else(|| "Unknown Teacher".to_string());
                courses.insert(
                    spec.key.clone(),
                    Course {
                        title: format!("Course {}", spec.key),
                        description: format!("Test course {}", spec.key),
                        thumbnail: "📚".to_string(),
                        teacher_id: spec.teacher_id.clone(),
                        teacher_name,
                        is_published: true,
                        approved_date: Some(now),
                        lessons: (1..=spec.lesson_count as i64)
                            .map(|id| Lesson {
                                id,
                                title: format!("Lesson {}", id),
                                content: format!("Content for lesson {}", id),
                                duration: "10 min".to_string(),
                                multimedia: Vec::new(),
                                quiz: None,
                            })
                            .collect(),
                    },
                );
            }
            store.save_courses(&courses);

            TestStore { store }
        }
    }

    pub struct TestStore {
        pub store: Store,
    }

    impl TestStore {
        pub fn student(&self, id: &str) -> Student {
            identity::get_student(&self.store, id).expect("fixture student missing")
        }

        pub fn user(&self, id: &str) -> User {
            identity::get_user(&self.store, id).expect("fixture user missing")
        }

        pub fn legacy_record(&self, user_id: &str) -> LegacyStudent {
            self.store
                .students()
                .into_iter()
                .find(|s| s.user_id == user_id)
                .expect("fixture legacy record missing")
        }
    }
}
