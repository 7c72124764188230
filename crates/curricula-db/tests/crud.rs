//! Integration tests for entity CRUD and list filtering.
//!
//! Require a PostgreSQL at `DATABASE_URL` with migrations applied; run
//! with `cargo test -- --ignored`.

use curricula_core::{Role, UpdateModuleRequest, UpdateProgramRequest, UserRepository};
use curricula_db::test_fixtures::{
    seed_attribute, seed_module, seed_objective, seed_program, seed_user, test_database,
    unique_name,
};
use curricula_db::{
    AttributeFilter, MaterialFilter, ModuleFilter, NewMaterial, ProgramFilter, TagFilter,
};

#[tokio::test]
#[ignore]
async fn program_partial_update_keeps_absent_fields() {
    let db = test_database().await.unwrap();
    let program = seed_program(&db).await.unwrap();

    let updated = db
        .programs
        .update(
            program.program_id,
            &UpdateProgramRequest {
                description: Some("revised".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.name, program.name);
    assert_eq!(updated.version, program.version);
    assert_eq!(updated.description.as_deref(), Some("revised"));
}

#[tokio::test]
#[ignore]
async fn program_list_filters_are_substring_matches() {
    let db = test_database().await.unwrap();
    let program = seed_program(&db).await.unwrap();

    // The unique name contains the prefix; a substring of it must match.
    let needle = &program.name[..program.name.len() - 2];
    let found = db
        .programs
        .list(ProgramFilter {
            name: Some(needle.to_uppercase()),
            version: None,
        })
        .await
        .unwrap();
    assert!(found.iter().any(|p| p.program_id == program.program_id));

    let none = db
        .programs
        .list(ProgramFilter {
            name: Some(unique_name("no_such")),
            version: None,
        })
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
#[ignore]
async fn attribute_create_rejects_missing_program() {
    let db = test_database().await.unwrap();
    let err = seed_attribute(&db, i64::MAX).await.unwrap_err();
    assert!(matches!(err, curricula_db::Error::InvalidReference(_)));
}

#[tokio::test]
#[ignore]
async fn module_update_validates_new_program() {
    let db = test_database().await.unwrap();
    let program = seed_program(&db).await.unwrap();
    let module = seed_module(&db, program.program_id).await.unwrap();

    let err = db
        .modules
        .update(
            module.module_id,
            &UpdateModuleRequest {
                program_id: Some(i64::MAX),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, curricula_db::Error::InvalidReference(_)));

    // The failed update must not have touched the row.
    let fetched = db.modules.get(module.module_id).await.unwrap().unwrap();
    assert_eq!(fetched.program_id, program.program_id);
}

#[tokio::test]
#[ignore]
async fn module_list_filters_by_owner_and_name() {
    let db = test_database().await.unwrap();
    let program = seed_program(&db).await.unwrap();
    let module = seed_module(&db, program.program_id).await.unwrap();

    let found = db
        .modules
        .list(ModuleFilter {
            name: Some(module.name.clone()),
            offered_by: None,
            program_id: Some(program.program_id),
        })
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].module_id, module.module_id);
}

#[tokio::test]
#[ignore]
async fn user_roundtrip_and_role_update() {
    let db = test_database().await.unwrap();
    let user = seed_user(&db, Role::Guest).await.unwrap();

    let fetched = db
        .users
        .find_by_username(&user.username)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fetched.user_id, user.user_id);
    assert_eq!(fetched.role, Role::Guest);

    let updated = db
        .users
        .update(user.user_id, None, Some(Role::Staff))
        .await
        .unwrap();
    assert_eq!(updated.role, Role::Staff);
    assert_eq!(updated.username, user.username);
}

#[tokio::test]
#[ignore]
async fn tag_and_material_lifecycle() {
    let db = test_database().await.unwrap();
    let user = seed_user(&db, Role::Staff).await.unwrap();
    let program = seed_program(&db).await.unwrap();
    let module = seed_module(&db, program.program_id).await.unwrap();
    let tag = db
        .tags
        .create(&unique_name("tag"), user.user_id)
        .await
        .unwrap();

    let material = db
        .materials
        .create(&NewMaterial {
            title: unique_name("material"),
            description: None,
            file_path: format!("{}/{}/notes.pdf", module.name, tag.name),
            user_id: user.user_id,
            module_id: module.module_id,
            tag_id: tag.tag_id,
        })
        .await
        .unwrap();

    let listed = db
        .materials
        .list(MaterialFilter {
            module_id: Some(module.module_id),
            tag_id: Some(tag.tag_id),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].material_id, material.material_id);

    let mine = db
        .tags
        .list(TagFilter {
            user_id: Some(user.user_id),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(mine.iter().all(|t| t.user_id == user.user_id));

    let comment = db
        .comments
        .create(Some("looks good"), user.user_id, material.material_id)
        .await
        .unwrap();

    // Deleting the material cascades to its comments.
    db.materials.delete(material.material_id).await.unwrap();
    assert!(db.comments.get(comment.comment_id).await.unwrap().is_none());
}

#[tokio::test]
#[ignore]
async fn notification_delivery_and_filtering() {
    let db = test_database().await.unwrap();
    let user = seed_user(&db, Role::Staff).await.unwrap();

    let created = db
        .notifications
        .create("material 42 was updated", user.user_id)
        .await
        .unwrap();

    let found = db
        .notifications
        .list(curricula_db::NotificationFilter {
            message: Some("was updated".into()),
            user_id: Some(user.user_id),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(found
        .iter()
        .any(|n| n.notification_id == created.notification_id));

    let none = db
        .attributes
        .list(AttributeFilter {
            program_id: Some(i64::MAX),
            name: None,
        })
        .await
        .unwrap();
    assert!(none.is_empty());
}
