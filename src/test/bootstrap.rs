#[cfg(test)]
mod tests {
    use crate::auth::{Role, authenticate};
    use crate::bootstrap::ensure_defaults;
    use crate::config::AdminConfig;
    use crate::store::Store;

    fn admin_config() -> AdminConfig {
        AdminConfig {
            name: "Test Admin".to_string(),
            email: "admin@test.local".to_string(),
            password: "admin-password".to_string(),
        }
    }

    #[test]
    fn fresh_store_gets_admin_and_demo_catalog() {
        let store = Store::in_memory();
        ensure_defaults(&store, &admin_config()).expect("bootstrap failed");

        let users = store.users();
        assert!(users.values().any(|u| u.role == Role::Admin));
        assert!(users.values().any(|u| u.role == Role::Teacher));
        assert!(users.values().any(|u| u.role == Role::Student));

        let courses = store.courses();
        assert!(!courses.is_empty());
        assert!(courses.values().all(|c| c.is_published));
        assert!(courses.values().all(|c| !c.lessons.is_empty()));

        // admin can log in straight away, no confirmation loop
        let admin =
            authenticate(&store, "admin@test.local", "admin-password").expect("login failed");
        assert_eq!(admin.role, Role::Admin);
    }

    #[test]
    fn bootstrap_is_idempotent() {
        let store = Store::in_memory();
        ensure_defaults(&store, &admin_config()).expect("bootstrap failed");
        let users_before = store.users().len();
        let courses_before = store.courses().len();

        ensure_defaults(&store, &admin_config()).expect("bootstrap failed");
        assert_eq!(store.users().len(), users_before);
        assert_eq!(store.courses().len(), courses_before);
        assert_eq!(
            store
                .users()
                .values()
                .filter(|u| u.role == Role::Admin)
                .count(),
            1
        );
    }

    #[test]
    fn existing_admin_is_not_replaced() {
        let store = Store::in_memory();
        ensure_defaults(&store, &admin_config()).expect("bootstrap failed");

        let other = AdminConfig {
            name: "Other Admin".to_string(),
            email: "other@test.local".to_string(),
            password: "other-password".to_string(),
        };
        ensure_defaults(&store, &other).expect("bootstrap failed");

        assert!(store.users().values().any(|u| u.email == "admin@test.local"));
        assert!(!store.users().values().any(|u| u.email == "other@test.local"));
    }
}
