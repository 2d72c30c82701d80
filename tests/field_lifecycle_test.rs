//! Field lifecycle integration tests: add, delete, backup, rollback
//!
//! Runs against an in-memory SQLite metadata store with the dynamic
//! tables living on the same connection, the default deployment shape.

use dynaform_core::{ColumnName, FieldDraft, FieldType, TableName};
use dynaform_storage::testing::TestDatabase;
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

async fn live_columns(db: &DatabaseConnection, table: &TableName) -> Vec<String> {
    SchemaExecutor::new()
        .list_columns(db.get_connection(), table)
        .await
        .unwrap()
}

/// Insert one submission row per value and fill the column
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
async fn test_add_field_creates_table_and_column() {
    let test_db = TestDatabase::new().await.unwrap();
    let engine = test_db.engine();
    let form = test_db.create_form("Feedback").await.unwrap();

    let field = engine
        .add_field(
            form.uuid,
            FieldDraft::new("Email address", FieldType::Email).required(true),
            "tester",
        )
        .await
        .unwrap();
    assert_eq!(field.column_name, "email_address");
    assert_eq!(field.display_order, 0);

    // Table was created lazily and recorded on the form
    let refreshed = engine.forms().find_by_uuid(form.uuid).await.unwrap().unwrap();
    let table_name = refreshed.table_name.expect("table name recorded");
    assert!(table_name.starts_with("form_data_"));

    // Live schema holds the system columns plus the new field column
    let table = TableName::new(table_name).unwrap();
    let columns = live_columns(&test_db.db, &table).await;
    for expected in ["id", "form_id", "submitted_by", "created_at", "email_address"] {
        assert!(columns.iter().any(|c| c == expected), "missing {expected}");
    }

    // Audited as a rollbackable ADD
    let history = engine.list_history(form.uuid).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].kind, "ADD");
    assert_eq!(history[0].status, "applied");
    assert!(history[0].can_rollback);
}

#[tokio::test]
async fn test_second_field_with_colliding_title_rejected() {
    let test_db = TestDatabase::new().await.unwrap();
    let engine = test_db.engine();
    let form = test_db.create_form("Contact").await.unwrap();

    engine
        .add_field(form.uuid, FieldDraft::new("Phone", FieldType::Phone), "tester")
        .await
        .unwrap();

    // "Phone #" slugs to the same column name
    let err = engine
        .add_field(form.uuid, FieldDraft::new("Phone #", FieldType::Phone), "tester")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        MigrationError::DuplicateColumnName { ref column } if column == "phone"
    ));

    let fields = engine.fields().find_for_form(form.id).await.unwrap();
    assert_eq!(fields.len(), 1);
}

#[tokio::test]
async fn test_unconfirmed_delete_mutates_nothing() {
    let test_db = TestDatabase::new().await.unwrap();
    let engine = test_db.engine();
    let form = test_db.create_form("Contact").await.unwrap();

    let field = engine
        .add_field(form.uuid, FieldDraft::new("Phone", FieldType::Phone), "tester")
        .await
        .unwrap();
    let table = dynamic_table(&engine, form.uuid).await;
    let column = ColumnName::new("phone").unwrap();
    seed_values(&test_db.db, &table, form.id, &column, &["081-111-1111", "081-222-2222"]).await;

    let err = engine.delete_field(field.uuid, false, "tester").await.unwrap_err();
    match err {
        MigrationError::ConfirmationRequired { column, rows_at_risk } => {
            assert_eq!(column, "phone");
            assert_eq!(rows_at_risk, 2);
        }
        other => panic!("expected ConfirmationRequired, got {other:?}"),
    }

    // Nothing changed: column, field row, history, backups
    assert!(live_columns(&test_db.db, &table).await.iter().any(|c| c == "phone"));
    assert!(engine.fields().find_by_uuid(field.uuid).await.unwrap().is_some());
    assert_eq!(engine.list_history(form.uuid).await.unwrap().len(), 1);
    assert!(engine.backups().find_by_id(1).await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_backup_rollback_round_trip() {
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
    assert_eq!(outcome.backup.row_count, 3);
    assert_eq!(outcome.migration.kind, "DELETE");
    assert_eq!(outcome.migration.backup_id, Some(outcome.backup.id));

    // Column and field row are gone
    assert!(!live_columns(&test_db.db, &table).await.iter().any(|c| c == "phone"));
    assert!(engine.fields().find_by_uuid(field.uuid).await.unwrap().is_none());

    // Rollback recreates the field and restores every value exactly
    let rollback = engine
        .rollback_migration(outcome.migration.uuid, "tester")
        .await
        .unwrap();
    assert_eq!(rollback.rows_restored, 3);

    let restored = engine.fields().find_by_uuid(field.uuid).await.unwrap().unwrap();
    assert_eq!(restored.title, "Phone");
    assert_eq!(restored.column_name, "phone");

    let pairs = SchemaExecutor::new()
        .fetch_column_text(test_db.db.get_connection(), &table, &column)
        .await
        .unwrap();
    let restored_values: Vec<&str> = pairs.iter().map(|(_, v)| v.as_str()).collect();
    assert_eq!(restored_values, values);

    // The record flipped; a second rollback is rejected
    let record = engine
        .migrations()
        .find_by_uuid(outcome.migration.uuid)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.status, "rolled_back");
    assert!(matches!(
        engine
            .rollback_migration(outcome.migration.uuid, "tester")
            .await
            .unwrap_err(),
        MigrationError::AlreadyRolledBack { .. }
    ));
}

#[tokio::test]
async fn test_failed_ddl_rolls_back_and_leaves_failed_record() {
    let test_db = TestDatabase::new().await.unwrap();
    let engine = test_db.engine();
    let form = test_db.create_form("Contact").await.unwrap();

    engine
        .add_field(form.uuid, FieldDraft::new("Phone", FieldType::Phone), "tester")
        .await
        .unwrap();
    let table = dynamic_table(&engine, form.uuid).await;

    // Break the schema out of band so the next ADD COLUMN fails
    let conn = test_db.db.get_connection();
    conn.execute(Statement::from_string(
        conn.get_database_backend(),
        format!("DROP TABLE {}", table.quoted()),
    ))
    .await
    .unwrap();

    let err = engine
        .add_field(form.uuid, FieldDraft::new("Email", FieldType::Email), "tester")
        .await
        .unwrap_err();
    assert!(matches!(err, MigrationError::Database(_)));

    // The metadata write was rolled back with the DDL
    let fields = engine.fields().find_for_form(form.id).await.unwrap();
    assert_eq!(fields.len(), 1);

    // But a failed audit record traces the attempt
    let history = engine.list_history(form.uuid).await.unwrap();
    let failed: Vec<_> = history.iter().filter(|m| m.status == "failed").collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].kind, "ADD");
    assert!(!failed[0].can_rollback);
    assert!(failed[0].error.is_some());
}
