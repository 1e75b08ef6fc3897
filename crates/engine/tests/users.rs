use chrono::Utc;
use sea_orm::{ActiveModelTrait, ActiveValue, Database, DatabaseConnection};

use engine::{AuthFailure, Engine, EngineError, ProfileUpdate, SignUp, users};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

fn sign_up(name: &str, email: &str) -> SignUp {
    SignUp {
        name: name.to_string(),
        email: email.to_string(),
        username: None,
        password: "foobar".to_string(),
        password_confirmation: "foobar".to_string(),
    }
}

fn invalid_fields(err: EngineError) -> Vec<&'static str> {
    match err {
        EngineError::Invalid(errors) => errors.iter().map(|e| e.field).collect(),
        other => panic!("expected validation failure, got {other:?}"),
    }
}

/// Inserts a user row without going through password hashing.
async fn insert_user(db: &DatabaseConnection, n: usize) {
    let now = Utc::now();
    users::ActiveModel {
        id: ActiveValue::NotSet,
        name: ActiveValue::Set(format!("Person {n}")),
        email: ActiveValue::Set(format!("person-{n}@example.com")),
        username: ActiveValue::Set(Some(format!("person_{n}"))),
        encrypted_password: ActiveValue::Set("x".to_string()),
        salt: ActiveValue::Set("x".to_string()),
        admin: ActiveValue::Set(false),
        created_at: ActiveValue::Set(now),
        updated_at: ActiveValue::Set(now),
    }
    .insert(db)
    .await
    .unwrap();
}

#[tokio::test]
async fn sign_up_creates_user_with_hashed_password() {
    let (engine, _db) = engine_with_db().await;

    let user = engine
        .sign_up(sign_up("New User", "user@example.com"))
        .await
        .unwrap();

    assert_eq!(user.name, "New User");
    assert_eq!(user.email, "user@example.com");
    assert!(!user.admin);
    assert_ne!(user.encrypted_password, "foobar");
    assert!(!user.salt.is_empty());
    assert_eq!(engine.user_count().await.unwrap(), 1);
}

#[tokio::test]
async fn sign_up_without_username_gets_generated_one() {
    let (engine, _db) = engine_with_db().await;

    let user = engine
        .sign_up(sign_up("New User", "user@example.com"))
        .await
        .unwrap();

    assert_eq!(user.username, Some(format!("user{}", user.id)));
    assert_eq!(user.handle(), format!("user{}", user.id));
}

#[tokio::test]
async fn sign_up_keeps_chosen_username() {
    let (engine, _db) = engine_with_db().await;
    let mut form = sign_up("New User", "user@example.com");
    form.username = Some("  NewUser ".to_string());

    let user = engine.sign_up(form).await.unwrap();

    assert_eq!(user.username.as_deref(), Some("newuser"));
}

#[tokio::test]
async fn sign_up_reports_every_failed_field() {
    let (engine, _db) = engine_with_db().await;

    let err = engine
        .sign_up(SignUp {
            name: String::new(),
            email: String::new(),
            username: None,
            password: "foobar".to_string(),
            password_confirmation: "barfoo".to_string(),
        })
        .await
        .unwrap_err();

    assert_eq!(invalid_fields(err), vec!["name", "email", "password"]);
    assert_eq!(engine.user_count().await.unwrap(), 0);
}

#[tokio::test]
async fn sign_up_requires_password() {
    let (engine, _db) = engine_with_db().await;
    let mut form = sign_up("New User", "user@example.com");
    form.password = String::new();
    form.password_confirmation = String::new();

    let err = engine.sign_up(form).await.unwrap_err();

    assert_eq!(invalid_fields(err), vec!["password"]);
}

#[tokio::test]
async fn duplicate_email_ignores_case() {
    let (engine, _db) = engine_with_db().await;
    engine
        .sign_up(sign_up("First", "user@example.com"))
        .await
        .unwrap();

    let err = engine
        .sign_up(sign_up("Second", "USER@Example.com"))
        .await
        .unwrap_err();

    match err {
        EngineError::Invalid(errors) => {
            assert_eq!(
                errors.full_messages(),
                vec!["Email has already been taken".to_string()]
            );
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(engine.user_count().await.unwrap(), 1);
}

#[tokio::test]
async fn duplicate_username_is_rejected() {
    let (engine, _db) = engine_with_db().await;
    let mut first = sign_up("First", "first@example.com");
    first.username = Some("taken".to_string());
    engine.sign_up(first).await.unwrap();

    let mut second = sign_up("Second", "second@example.com");
    second.username = Some("Taken".to_string());
    let err = engine.sign_up(second).await.unwrap_err();

    assert_eq!(invalid_fields(err), vec!["username"]);
}

#[tokio::test]
async fn authenticate_matches_email_case_insensitively() {
    let (engine, _db) = engine_with_db().await;
    let user = engine
        .sign_up(sign_up("New User", "user@example.com"))
        .await
        .unwrap();

    let found = engine
        .authenticate("User@Example.COM", "foobar")
        .await
        .unwrap();

    assert_eq!(found.id, user.id);
}

#[tokio::test]
async fn authenticate_distinguishes_failures() {
    let (engine, _db) = engine_with_db().await;
    engine
        .sign_up(sign_up("New User", "user@example.com"))
        .await
        .unwrap();

    assert_eq!(
        engine.authenticate("user@example.com", "wrong!").await,
        Err(EngineError::Authentication(AuthFailure::BadCredentials))
    );
    assert_eq!(
        engine.authenticate("nobody@example.com", "foobar").await,
        Err(EngineError::Authentication(AuthFailure::NotFound))
    );
}

#[tokio::test]
async fn update_profile_changes_allowed_fields() {
    let (engine, _db) = engine_with_db().await;
    let user = engine
        .sign_up(sign_up("New User", "user@example.com"))
        .await
        .unwrap();

    let updated = engine
        .update_profile(
            user.id,
            ProfileUpdate {
                name: "New name".to_string(),
                email: "new@example.com".to_string(),
                username: None,
                password: "newpassword".to_string(),
                password_confirmation: "newpassword".to_string(),
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.name, "New name");
    assert_eq!(updated.email, "new@example.com");
    assert_eq!(updated.username, user.username);
    assert!(!updated.admin);
    assert!(
        engine
            .authenticate("new@example.com", "newpassword")
            .await
            .is_ok()
    );
    assert!(
        engine
            .authenticate("new@example.com", "foobar")
            .await
            .is_err()
    );
}

#[tokio::test]
async fn update_profile_with_blank_password_keeps_it() {
    let (engine, _db) = engine_with_db().await;
    let user = engine
        .sign_up(sign_up("New User", "user@example.com"))
        .await
        .unwrap();

    engine
        .update_profile(
            user.id,
            ProfileUpdate {
                name: "Renamed".to_string(),
                email: "user@example.com".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert!(
        engine
            .authenticate("user@example.com", "foobar")
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn update_profile_rejects_blank_fields_and_keeps_row() {
    let (engine, _db) = engine_with_db().await;
    let user = engine
        .sign_up(sign_up("New User", "user@example.com"))
        .await
        .unwrap();

    let err = engine
        .update_profile(user.id, ProfileUpdate::default())
        .await
        .unwrap_err();

    assert_eq!(invalid_fields(err), vec!["name", "email"]);
    assert_eq!(engine.user(user.id).await.unwrap().name, "New User");
}

#[tokio::test]
async fn update_profile_cannot_steal_another_email() {
    let (engine, _db) = engine_with_db().await;
    engine
        .sign_up(sign_up("First", "first@example.com"))
        .await
        .unwrap();
    let second = engine
        .sign_up(sign_up("Second", "second@example.com"))
        .await
        .unwrap();

    let err = engine
        .update_profile(
            second.id,
            ProfileUpdate {
                name: "Second".to_string(),
                email: "first@example.com".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

    assert_eq!(invalid_fields(err), vec!["email"]);
}

#[tokio::test]
async fn set_admin_toggles_flag() {
    let (engine, _db) = engine_with_db().await;
    let user = engine
        .sign_up(sign_up("New User", "user@example.com"))
        .await
        .unwrap();

    assert!(engine.set_admin(user.id, true).await.unwrap().admin);
    assert!(!engine.set_admin(user.id, false).await.unwrap().admin);
    assert_eq!(
        engine.set_admin(999, true).await,
        Err(EngineError::KeyNotFound("user 999".to_string()))
    );
}

#[tokio::test]
async fn list_users_paginates_by_id() {
    let (engine, db) = engine_with_db().await;
    for n in 0..31 {
        insert_user(&db, n).await;
    }

    let first = engine.list_users(1).await.unwrap();
    assert_eq!(first.items.len(), 30);
    assert_eq!(first.total_items, 31);
    assert_eq!(first.total_pages, 2);
    assert_eq!(first.previous(), None);
    assert_eq!(first.next(), Some(2));
    assert_eq!(first.items[0].name, "Person 0");

    let second = engine.list_users(2).await.unwrap();
    assert_eq!(second.items.len(), 1);
    assert_eq!(second.items[0].name, "Person 30");

    let clamped = engine.list_users(0).await.unwrap();
    assert_eq!(clamped.page, 1);
}

#[tokio::test]
async fn custom_page_size() {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .per_page(2)
        .build()
        .await
        .unwrap();
    for n in 0..5 {
        insert_user(&db, n).await;
    }

    let page = engine.list_users(3).await.unwrap();
    assert_eq!(page.per_page, 2);
    assert_eq!(page.total_pages, 3);
    assert_eq!(page.items.len(), 1);
}

#[tokio::test]
async fn missing_user_is_not_found() {
    let (engine, _db) = engine_with_db().await;
    assert_eq!(
        engine.user(42).await,
        Err(EngineError::KeyNotFound("user 42".to_string()))
    );
    assert!(engine.user_by_email("nobody@example.com").await.unwrap().is_none());
}

#[tokio::test]
async fn update_profile_keeps_generated_username() {
    let (engine, _db) = engine_with_db().await;
    let user = engine
        .sign_up(sign_up("Example", "example@example.com"))
        .await
        .unwrap();
    let handle = user.handle();

    let updated = engine
        .update_profile(
            user.id,
            ProfileUpdate {
                name: "Renamed".to_string(),
                email: "example@example.com".to_string(),
                username: Some(handle.clone()),
                ..ProfileUpdate::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.username, Some(handle));
    assert_eq!(updated.name, "Renamed");
}

#[tokio::test]
async fn page_far_past_the_end_is_empty() {
    let (engine, db) = engine_with_db().await;
    for n in 0..3 {
        insert_user(&db, n).await;
    }

    let page = engine.list_users(5).await.unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.total_items, 3);

    let page = engine.list_users(u64::MAX).await.unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.page, u64::MAX);
    assert_eq!(page.next(), None);
    assert_eq!(page.total_pages, 1);
}

#[tokio::test]
async fn unique_index_collision_is_a_validation_failure() {
    let (engine, db) = engine_with_db().await;
    // Row 1 already holds the handle the next sign-up will be given.
    let now = Utc::now();
    users::ActiveModel {
        id: ActiveValue::NotSet,
        name: ActiveValue::Set("Squatter".to_string()),
        email: ActiveValue::Set("squatter@example.com".to_string()),
        username: ActiveValue::Set(Some("user2".to_string())),
        encrypted_password: ActiveValue::Set("x".to_string()),
        salt: ActiveValue::Set("x".to_string()),
        admin: ActiveValue::Set(false),
        created_at: ActiveValue::Set(now),
        updated_at: ActiveValue::Set(now),
    }
    .insert(&db)
    .await
    .unwrap();

    let err = engine
        .sign_up(sign_up("Newcomer", "newcomer@example.com"))
        .await
        .unwrap_err();

    match err {
        EngineError::Invalid(errors) => assert_eq!(
            errors.full_messages(),
            vec!["Username has already been taken".to_string()]
        ),
        other => panic!("expected validation failure, got {other:?}"),
    }
    assert_eq!(engine.user_count().await.unwrap(), 1);
    assert!(
        engine
            .user_by_email("newcomer@example.com")
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn concurrent_sign_ups_with_one_email_admit_one() {
    let (engine, _db) = engine_with_db().await;

    let (first, second) = tokio::join!(
        engine.sign_up(sign_up("First", "shared@example.com")),
        engine.sign_up(sign_up("Second", "Shared@example.com")),
    );

    let (winner, loser) = match (first, second) {
        (Ok(user), Err(err)) | (Err(err), Ok(user)) => (user, err),
        other => panic!("expected exactly one sign-up to win, got {other:?}"),
    };
    assert_eq!(winner.email, "shared@example.com");
    assert_eq!(invalid_fields(loser), vec!["email"]);
    assert_eq!(engine.user_count().await.unwrap(), 1);
}
