//! Reorder, restore, concurrency, and audit-history integration tests

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dynaform_core::{ColumnName, FieldDraft, FieldType, TableName, ValidationError};
use dynaform_storage::testing::{MockResolver, TestDatabase};
use dynaform_storage::{DatabaseConnection, MigrationEngine, MigrationError, SchemaExecutor};
use sea_orm::{ConnectionTrait, Statement, Value};
use uuid::Uuid;

async fn dynamic_table(engine: &MigrationEngine, form_uuid: Uuid) -> TableName {
    let form = engine
        .forms()
        .find_by_uuid(form_uuid)
        .await
        .unwrap()
        .expect("form exists");
    TableName::new(form.table_name.expect("form has a dynamic table")).unwrap()
}

async fn seed_values(
    db: &DatabaseConnection,
    table: &TableName,
    form_id: i32,
    column: &ColumnName,
    values: &[&str],
) {
    let executor = SchemaExecutor::new();
    for _ in values {
        executor
            .insert_row(db.get_connection(), table, form_id)
            .await
            .unwrap();
    }
    for (i, value) in values.iter().enumerate() {
        executor
            .update_row_value(
                db.get_connection(),
                table,
                column,
                (i as i64) + 1,
                Value::from(*value),
            )
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn test_reorder_and_rollback() {
    let test_db = TestDatabase::new().await.unwrap();
    let engine = test_db.engine();
    let form = test_db.create_form("Survey").await.unwrap();

    let a = engine
        .add_field(form.uuid, FieldDraft::new("Name", FieldType::ShortText), "tester")
        .await
        .unwrap();
    let b = engine
        .add_field(form.uuid, FieldDraft::new("Email", FieldType::Email), "tester")
        .await
        .unwrap();
    let c = engine
        .add_field(form.uuid, FieldDraft::new("Phone", FieldType::Phone), "tester")
        .await
        .unwrap();

    let reordered = engine
        .reorder_fields(form.uuid, &[c.uuid, a.uuid, b.uuid], "tester")
        .await
        .unwrap();
    let order: Vec<Uuid> = reordered.iter().map(|f| f.uuid).collect();
    assert_eq!(order, [c.uuid, a.uuid, b.uuid]);

    let history = engine.list_history(form.uuid).await.unwrap();
    let reorder_record = history.iter().find(|m| m.kind == "REORDER").unwrap();
    assert!(reorder_record.can_rollback);

    engine
        .rollback_migration(reorder_record.uuid, "tester")
        .await
        .unwrap();
    let fields = engine.fields().find_for_form(form.id).await.unwrap();
    let order: Vec<Uuid> = fields.iter().map(|f| f.uuid).collect();
    assert_eq!(order, [a.uuid, b.uuid, c.uuid]);
}

#[tokio::test]
async fn test_reorder_rejects_non_permutations() {
    let test_db = TestDatabase::new().await.unwrap();
    let engine = test_db.engine();
    let form = test_db.create_form("Survey").await.unwrap();

    let a = engine
        .add_field(form.uuid, FieldDraft::new("Name", FieldType::ShortText), "tester")
        .await
        .unwrap();
    let b = engine
        .add_field(form.uuid, FieldDraft::new("Email", FieldType::Email), "tester")
        .await
        .unwrap();

    for bad in [
        vec![a.uuid],                    // wrong length
        vec![a.uuid, a.uuid],            // duplicate
        vec![a.uuid, Uuid::new_v4()],    // stranger
    ] {
        let err = engine.reorder_fields(form.uuid, &bad, "tester").await.unwrap_err();
        assert!(matches!(
            err,
            MigrationError::Validation(ValidationError::InvalidOrdering(_))
        ));
    }

    // Orders untouched
    let fields = engine.fields().find_for_form(form.id).await.unwrap();
    let order: Vec<Uuid> = fields.iter().map(|f| f.uuid).collect();
    assert_eq!(order, [a.uuid, b.uuid]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_migrations_on_one_table_exactly_one_succeeds() {
    let test_db = TestDatabase::new().await.unwrap();

    // A deliberately slow resolver widens the in-flight window; the first
    // call serves the seeding add and stays fast
    let mut resolver = MockResolver::new();
    resolver
        .expect_resolve()
        .times(1)
        .returning(|_, _| Ok(ColumnName::new("name").unwrap()));
    resolver.expect_resolve().returning(|_, _| {
        std::thread::sleep(Duration::from_millis(200));
        Ok(ColumnName::new("email").unwrap())
    });
    let engine = test_db.engine_with_resolver(Arc::new(resolver));
    let form = test_db.create_form("Survey").await.unwrap();

    // Seed the dynamic table so both contenders target the same table
    engine
        .add_field(form.uuid, FieldDraft::new("Name", FieldType::ShortText), "tester")
        .await
        .unwrap();

    let first = {
        let engine = engine.clone();
        let form_uuid = form.uuid;
        tokio::spawn(async move {
            engine
                .add_field(form_uuid, FieldDraft::new("Email", FieldType::Email), "a")
                .await
        })
    };
    let second = {
        let engine = engine.clone();
        let form_uuid = form.uuid;
        tokio::spawn(async move {
            engine
                .add_field(form_uuid, FieldDraft::new("Email", FieldType::Email), "b")
                .await
        })
    };

    let results = [first.await.unwrap(), second.await.unwrap()];
    let ok_count = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(ok_count, 1, "exactly one contender must win");
    let loser = results.iter().find(|r| r.is_err()).unwrap();
    assert!(matches!(
        loser.as_ref().unwrap_err(),
        MigrationError::MigrationInProgress { .. } | MigrationError::DuplicateColumnName { .. }
    ));
}

#[tokio::test]
async fn test_restore_backup_after_field_recreation() {
    let test_db = TestDatabase::new().await.unwrap();
    let engine = test_db.engine();
    let form = test_db.create_form("Contact").await.unwrap();

    let field = engine
        .add_field(form.uuid, FieldDraft::new("Phone", FieldType::Phone), "tester")
        .await
        .unwrap();
    let table = dynamic_table(&engine, form.uuid).await;
    let column = ColumnName::new("phone").unwrap();
    let values = ["081-111-1111", "081-222-2222", "081-333-3333"];
    seed_values(&test_db.db, &table, form.id, &column, &values).await;

    let outcome = engine.delete_field(field.uuid, true, "tester").await.unwrap();

    // The column is gone; a bare restore is refused
    let err = engine.restore_backup(outcome.backup.uuid).await.unwrap_err();
    assert!(matches!(err, MigrationError::NotFound { kind: "column", .. }));

    // Re-create the field, then restore into the fresh column
    engine
        .add_field(form.uuid, FieldDraft::new("Phone", FieldType::Phone), "tester")
        .await
        .unwrap();
    let restored = engine.restore_backup(outcome.backup.uuid).await.unwrap();
    assert_eq!(restored, 3);

    let pairs = SchemaExecutor::new()
        .fetch_column_text(test_db.db.get_connection(), &table, &column)
        .await
        .unwrap();
    let restored_values: Vec<&str> = pairs.iter().map(|(_, v)| v.as_str()).collect();
    assert_eq!(restored_values, values);

    // A backup is single-use
    assert!(matches!(
        engine.restore_backup(outcome.backup.uuid).await.unwrap_err(),
        MigrationError::AlreadyRestored { .. }
    ));
}

#[tokio::test]
async fn test_expired_backup_cannot_be_restored() {
    let test_db = TestDatabase::new().await.unwrap();
    let engine = test_db.engine();
    let form = test_db.create_form("Contact").await.unwrap();

    let field = engine
        .add_field(form.uuid, FieldDraft::new("Phone", FieldType::Phone), "tester")
        .await
        .unwrap();
    let table = dynamic_table(&engine, form.uuid).await;
    let column = ColumnName::new("phone").unwrap();
    seed_values(&test_db.db, &table, form.id, &column, &["081-111-1111"]).await;

    let outcome = engine.delete_field(field.uuid, true, "tester").await.unwrap();

    // Age the backup past its retention window out of band
    let conn = test_db.db.get_connection();
    let yesterday = (Utc::now() - chrono::Duration::days(1)).to_rfc3339();
    conn.execute(Statement::from_string(
        conn.get_database_backend(),
        format!(
            "UPDATE field_data_backups SET expires_at = '{}' WHERE id = {}",
            yesterday, outcome.backup.id
        ),
    ))
    .await
    .unwrap();

    // Even with the column back in place, an expired backup is refused
    engine
        .add_field(form.uuid, FieldDraft::new("Phone", FieldType::Phone), "tester")
        .await
        .unwrap();
    let err = engine.restore_backup(outcome.backup.uuid).await.unwrap_err();
    assert!(matches!(err, MigrationError::ExpiredBackup { .. }));

    // Not consumed, and the fresh column stayed empty
    let backup = engine
        .backups()
        .find_by_uuid(outcome.backup.uuid)
        .await
        .unwrap()
        .unwrap();
    assert!(!backup.is_restored);
    assert_eq!(
        SchemaExecutor::new()
            .count_nonnull(test_db.db.get_connection(), &table, &column)
            .await
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn test_expired_backups_are_listed_for_the_sweep() {
    let test_db = TestDatabase::new().await.unwrap();
    let engine = test_db.engine();
    let form = test_db.create_form("Contact").await.unwrap();

    let now = Utc::now();
    let stale = dynaform_storage::seaorm::entities::field_data_backups::Model {
        id: 0,
        uuid: Uuid::new_v4(),
        form_id: form.id,
        table_name: "form_data_stale".to_string(),
        column_name: "phone".to_string(),
        field_type: "phone".to_string(),
        data: serde_json::json!([]),
        row_count: 0,
        is_restored: false,
        created_at: now - chrono::Duration::days(120),
        expires_at: now - chrono::Duration::days(30),
    };
    engine
        .backups()
        .insert_in(test_db.db.get_connection(), stale.clone())
        .await
        .unwrap();

    let expired = engine.backups().find_expired(now).await.unwrap();
    assert_eq!(expired.len(), 1);
    assert_eq!(expired[0].uuid, stale.uuid);
}

#[tokio::test]
async fn test_history_is_newest_first_and_guards_hold() {
    let test_db = TestDatabase::new().await.unwrap();
    let engine = test_db.engine();
    let form = test_db.create_form("Survey").await.unwrap();

    let field = engine
        .add_field(form.uuid, FieldDraft::new("Name", FieldType::ShortText), "tester")
        .await
        .unwrap();
    engine
        .add_field(form.uuid, FieldDraft::new("Email", FieldType::Email), "tester")
        .await
        .unwrap();
    engine
        .rename_field(field.uuid, "Full Name", "tester")
        .await
        .unwrap();

    let history = engine.list_history(form.uuid).await.unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(history[0].kind, "RENAME");
    assert_eq!(history[2].kind, "ADD");

    // Unknown ids are not-found errors, not panics
    assert!(matches!(
        engine.rollback_migration(Uuid::new_v4(), "tester").await.unwrap_err(),
        MigrationError::NotFound { kind: "migration", .. }
    ));
    assert!(matches!(
        engine.list_history(Uuid::new_v4()).await.unwrap_err(),
        MigrationError::NotFound { kind: "form", .. }
    ));
}
