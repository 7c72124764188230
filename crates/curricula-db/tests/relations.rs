//! Integration tests for the relation engine.
//!
//! Require a PostgreSQL at `DATABASE_URL` with migrations applied; run
//! with `cargo test -- --ignored`.

use curricula_db::test_fixtures::{
    seed_attribute, seed_module, seed_objective, seed_observation, seed_program, test_database,
};
use curricula_db::{EdgeFilter, RelationRepository, Side, SupportItem};

#[tokio::test]
#[ignore]
async fn upsert_creates_then_overwrites_weight() {
    let db = test_database().await.unwrap();
    let program = seed_program(&db).await.unwrap();
    let attr = seed_attribute(&db, program.program_id).await.unwrap();
    let obj = seed_objective(&db, program.program_id).await.unwrap();

    let first = db
        .relations
        .upsert(attr.attribute_id, obj.objective_id, 3)
        .await
        .unwrap();
    assert!(first.created);
    assert_eq!(first.edge.weight, 3);

    let second = db
        .relations
        .upsert(attr.attribute_id, obj.objective_id, 7)
        .await
        .unwrap();
    assert!(!second.created);
    assert_eq!(second.edge.id, first.edge.id);
    assert_eq!(second.edge.weight, 7);

    // Still exactly one edge for the pair.
    let edges = db
        .relations
        .list(EdgeFilter {
            left_id: Some(attr.attribute_id),
            right_id: Some(obj.objective_id),
        })
        .await
        .unwrap();
    assert_eq!(edges.len(), 1);
}

#[tokio::test]
#[ignore]
async fn upsert_rejects_missing_references() {
    let db = test_database().await.unwrap();
    let program = seed_program(&db).await.unwrap();
    let attr = seed_attribute(&db, program.program_id).await.unwrap();

    let err = db
        .relations
        .upsert(attr.attribute_id, i64::MAX, 1)
        .await
        .unwrap_err();
    assert!(matches!(err, curricula_db::Error::InvalidReference(_)));

    let err = db.relations.upsert(i64::MAX, i64::MAX, 1).await.unwrap_err();
    assert!(matches!(err, curricula_db::Error::InvalidReference(_)));
}

#[tokio::test]
#[ignore]
async fn merge_support_set_is_additive() {
    let db = test_database().await.unwrap();
    let program = seed_program(&db).await.unwrap();
    let attr = seed_attribute(&db, program.program_id).await.unwrap();
    let obj_a = seed_objective(&db, program.program_id).await.unwrap();
    let obj_b = seed_objective(&db, program.program_id).await.unwrap();

    db.relations
        .upsert(attr.attribute_id, obj_a.objective_id, 5)
        .await
        .unwrap();

    // Merge mentioning only obj_b: obj_a's edge must survive untouched.
    let outcomes = db
        .relations
        .merge_support_set(
            Side::Left,
            attr.attribute_id,
            &[SupportItem {
                other_id: obj_b.objective_id,
                weight: None,
            }],
        )
        .await
        .unwrap();
    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].created);
    assert_eq!(outcomes[0].edge.weight, 1);

    let edges = db
        .relations
        .list(EdgeFilter {
            left_id: Some(attr.attribute_id),
            right_id: None,
        })
        .await
        .unwrap();
    assert_eq!(edges.len(), 2);
    let kept = edges
        .iter()
        .find(|e| e.right_id == obj_a.objective_id)
        .unwrap();
    assert_eq!(kept.weight, 5);
}

#[tokio::test]
#[ignore]
async fn merge_without_weight_keeps_existing_weight() {
    let db = test_database().await.unwrap();
    let program = seed_program(&db).await.unwrap();
    let attr = seed_attribute(&db, program.program_id).await.unwrap();
    let obj = seed_objective(&db, program.program_id).await.unwrap();

    db.relations
        .upsert(attr.attribute_id, obj.objective_id, 9)
        .await
        .unwrap();

    let outcomes = db
        .relations
        .merge_support_set(
            Side::Left,
            attr.attribute_id,
            &[SupportItem {
                other_id: obj.objective_id,
                weight: None,
            }],
        )
        .await
        .unwrap();
    assert!(!outcomes[0].created);
    assert_eq!(outcomes[0].edge.weight, 9);
}

#[tokio::test]
#[ignore]
async fn delete_all_for_clears_one_anchor_only() {
    let db = test_database().await.unwrap();
    let program = seed_program(&db).await.unwrap();
    let attr_a = seed_attribute(&db, program.program_id).await.unwrap();
    let attr_b = seed_attribute(&db, program.program_id).await.unwrap();
    let obj = seed_objective(&db, program.program_id).await.unwrap();

    db.relations
        .upsert(attr_a.attribute_id, obj.objective_id, 1)
        .await
        .unwrap();
    db.relations
        .upsert(attr_b.attribute_id, obj.objective_id, 1)
        .await
        .unwrap();

    let removed = db
        .relations
        .delete_all_for(Side::Left, attr_a.attribute_id)
        .await
        .unwrap();
    assert_eq!(removed, 1);

    // Clearing an anchor with no edges is a no-op success.
    let removed = db
        .relations
        .delete_all_for(Side::Left, attr_a.attribute_id)
        .await
        .unwrap();
    assert_eq!(removed, 0);

    let remaining = db
        .relations
        .list(EdgeFilter {
            left_id: None,
            right_id: Some(obj.objective_id),
        })
        .await
        .unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].left_id, attr_b.attribute_id);
}

#[tokio::test]
#[ignore]
async fn module_observation_edges_use_same_engine() {
    let db = test_database().await.unwrap();
    let program = seed_program(&db).await.unwrap();
    let attr = seed_attribute(&db, program.program_id).await.unwrap();
    let module = seed_module(&db, program.program_id).await.unwrap();
    let obs = seed_observation(&db, attr.attribute_id).await.unwrap();

    let outcome = db
        .links
        .upsert(module.module_id, obs.observation_id, 2)
        .await
        .unwrap();
    assert!(outcome.created);

    let fetched = db.links.get(outcome.edge.id).await.unwrap().unwrap();
    assert_eq!(fetched.left_id, module.module_id);
    assert_eq!(fetched.right_id, obs.observation_id);

    db.links.delete(outcome.edge.id).await.unwrap();
    let err = db.links.delete(outcome.edge.id).await.unwrap_err();
    assert!(matches!(err, curricula_db::Error::NotFound(_)));
}
