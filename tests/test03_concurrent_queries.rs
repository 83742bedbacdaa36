#![cfg(feature = "sqlite")]

use sqlite_pg_compat::prelude::*;
use tempfile::tempdir;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_inserts_each_see_their_own_row() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let path = dir.path().join("nested").join("escola.db");
    let db = Database::connect(&DatabaseConfig::embedded(path.to_string_lossy())).await?;
    assert!(path.exists(), "parent directory and file should be created");
    assert_eq!(db.database_type(), DatabaseType::Sqlite);

    db.exec(
        "CREATE TABLE presencas (
            id TEXT PRIMARY KEY,
            aluno TEXT NOT NULL,
            dia INTEGER NOT NULL
        );",
    )
    .await?;

    let mut handles = Vec::new();
    for i in 0..50_i64 {
        let db = db.clone();
        handles.push(tokio::spawn(async move {
            let aluno = format!("aluno-{i}");
            let created = db
                .query(
                    "INSERT INTO presencas (aluno, dia) VALUES ($1, $2) RETURNING aluno, dia",
                    &[RowValues::from(aluno.as_str()), RowValues::Int(i)],
                )
                .await?;
            Ok::<_, SqlCompatError>((aluno, i, created))
        }));
    }

    for handle in handles {
        let (aluno, dia, created) = handle.await??;
        assert_eq!(created.row_count, 1);
        assert_eq!(created.rows.len(), 1);
        let row = &created.rows[0];
        assert_eq!(row.get("aluno"), Some(&RowValues::Text(aluno)));
        assert_eq!(row.get("dia"), Some(&RowValues::Int(dia)));
    }

    let total = db.query("SELECT COUNT(*) FROM presencas", &[]).await?;
    assert_eq!(total.first().and_then(|r| r.get("count")), Some(&RowValues::Int(50)));
    Ok(())
}

#[test]
fn data_survives_reopening_the_file() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let path = dir.path().join("escola.db").to_string_lossy().into_owned();

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let db = Database::new_sqlite(SqliteOptions::new(path.clone())).await?;
        db.exec("CREATE TABLE turmas (id TEXT PRIMARY KEY, nome TEXT NOT NULL);")
            .await?;
        db.query("INSERT INTO turmas (nome) VALUES ($1)", &[RowValues::from("3C")])
            .await?;
        drop(db);

        let reopened = Database::new_sqlite(SqliteOptions::new(path.clone())).await?;
        let rows = reopened
            .query("SELECT nome FROM turmas WHERE nome ILIKE $1", &[RowValues::from("3c")])
            .await?;
        assert_eq!(rows.row_count, 1);
        Ok::<(), SqlCompatError>(())
    })?;
    Ok(())
}
