#![cfg(feature = "sqlite")]

use sqlite_pg_compat::prelude::*;

async fn db_with_schema() -> Result<Database, SqlCompatError> {
    let db = Database::new_sqlite(SqliteOptions::in_memory()).await?;
    db.exec(
        "CREATE TABLE turmas (id TEXT PRIMARY KEY, nome TEXT NOT NULL UNIQUE);
         CREATE TABLE alunos (
             id TEXT PRIMARY KEY,
             nome_completo TEXT NOT NULL,
             turma_id TEXT NOT NULL REFERENCES turmas(id)
         );",
    )
    .await?;
    Ok(db)
}

async fn count(db: &Database, table: &str) -> Result<Option<i64>, SqlCompatError> {
    let result = db.query(&format!("SELECT COUNT(*) FROM {table}"), &[]).await?;
    Ok(result
        .first()
        .and_then(|row| row.get("count"))
        .and_then(RowValues::as_int)
        .copied())
}

#[tokio::test]
async fn body_value_is_returned() -> Result<(), Box<dyn std::error::Error>> {
    let db = db_with_schema().await?;

    let turma_id = with_transaction(&db, |db| async move {
        let turma = db
            .query(
                "INSERT INTO turmas (nome) VALUES ($1) RETURNING id",
                &[RowValues::from("1A")],
            )
            .await?;
        let turma_id = turma
            .first()
            .and_then(|row| row.get("id"))
            .cloned()
            .unwrap_or(RowValues::Null);
        db.query(
            "INSERT INTO alunos (nome_completo, turma_id) VALUES ($1, $2)",
            &[RowValues::from("Ana"), turma_id.clone()],
        )
        .await?;
        Ok::<_, SqlCompatError>(turma_id)
    })
    .await?;

    assert!(turma_id.as_text().is_some());
    assert_eq!(count(&db, "alunos").await?, Some(1));
    Ok(())
}

#[tokio::test]
async fn first_error_propagates_and_earlier_writes_stay() -> Result<(), Box<dyn std::error::Error>>
{
    let db = db_with_schema().await?;

    let err = db
        .with_transaction(|db| async move {
            db.query(
                "INSERT INTO turmas (id, nome) VALUES ($1, $2)",
                &[RowValues::from("t-1"), RowValues::from("1A")],
            )
            .await?;
            // Unknown turma: foreign key violation.
            db.query(
                "INSERT INTO alunos (nome_completo, turma_id) VALUES ($1, $2)",
                &[RowValues::from("Ana"), RowValues::from("t-404")],
            )
            .await?;
            db.query(
                "INSERT INTO turmas (id, nome) VALUES ($1, $2)",
                &[RowValues::from("t-2"), RowValues::from("1B")],
            )
            .await?;
            Ok::<_, SqlCompatError>(())
        })
        .await
        .unwrap_err();

    assert_eq!(err.constraint_violation(), Some(ConstraintViolation::ForeignKey));
    // No rollback: the first insert is kept, the statement after the failure never ran.
    assert_eq!(count(&db, "turmas").await?, Some(1));
    assert_eq!(count(&db, "alunos").await?, Some(0));
    Ok(())
}

#[tokio::test]
async fn caller_errors_pass_through_unchanged() -> Result<(), Box<dyn std::error::Error>> {
    let db = db_with_schema().await?;

    let err = with_transaction(&db, |_db| async move { Err::<(), _>("validation failed") })
        .await
        .unwrap_err();
    assert_eq!(err, "validation failed");
    Ok(())
}
