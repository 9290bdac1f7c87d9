//! Database schema snapshots for the instruction payload.
//!
//! The connection URL picks the driver: `mysql://` uses `SHOW TABLES` +
//! `SHOW CREATE TABLE`, `postgres://` enumerates the public schema through
//! `information_schema` and synthesizes a `CREATE TABLE` statement per table.
//! Any other scheme is simply "no schema" — the payload omits the section.
//!
//! Connection and query failures surface as [`SchemaError`] so a broken
//! fetch never masquerades as an empty schema; the sync cycle logs the
//! failure and pushes the payload without a schema block.

use sqlx::mysql::MySqlConnection;
use sqlx::postgres::PgConnection;
use sqlx::{Connection, Row};

use crate::error::SchemaError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseKind {
    MySql,
    Postgres,
}

/// Classify a connection URL by scheme. `None` means "not a supported
/// database", which is not an error at this layer.
pub fn classify(url: &str) -> Option<DatabaseKind> {
    if url.starts_with("mysql://") {
        Some(DatabaseKind::MySql)
    } else if url.starts_with("postgres://") || url.starts_with("postgresql://") {
        Some(DatabaseKind::Postgres)
    } else {
        None
    }
}

/// Fetch a textual dump of the database schema: one table definition per
/// table, each terminated with `;`, joined by blank lines. Returns `None`
/// for unsupported schemes.
pub async fn dump_schema(url: &str) -> Result<Option<String>, SchemaError> {
    match classify(url) {
        Some(DatabaseKind::MySql) => dump_mysql(url).await.map(Some),
        Some(DatabaseKind::Postgres) => dump_postgres(url).await.map(Some),
        None => Ok(None),
    }
}

async fn dump_mysql(url: &str) -> Result<String, SchemaError> {
    let mut conn = MySqlConnection::connect(url)
        .await
        .map_err(SchemaError::Connect)?;

    let rows = sqlx::query("SHOW TABLES").fetch_all(&mut conn).await?;
    let mut tables = Vec::with_capacity(rows.len());
    for row in &rows {
        tables.push(row.try_get::<String, _>(0)?);
    }

    let mut definitions = Vec::with_capacity(tables.len());
    for table in &tables {
        let row = sqlx::query(&format!(
            "SHOW CREATE TABLE `{}`",
            table.replace('`', "``")
        ))
        .fetch_one(&mut conn)
        .await?;
        // Column 0 is the table name, column 1 the DDL.
        let ddl: String = row.try_get(1)?;
        definitions.push(format!("{};", ddl));
    }

    conn.close().await.ok();
    Ok(definitions.join("\n\n"))
}

async fn dump_postgres(url: &str) -> Result<String, SchemaError> {
    let mut conn = PgConnection::connect(url)
        .await
        .map_err(SchemaError::Connect)?;

    let tables: Vec<String> = sqlx::query_scalar(
        "SELECT table_name::text FROM information_schema.tables \
         WHERE table_schema = 'public' AND table_type = 'BASE TABLE'",
    )
    .fetch_all(&mut conn)
    .await?;

    let mut definitions = Vec::with_capacity(tables.len());
    for table in &tables {
        let rows = sqlx::query(
            "SELECT column_name::text, data_type::text, is_nullable::text, column_default::text \
             FROM information_schema.columns \
             WHERE table_schema = 'public' AND table_name = $1 \
             ORDER BY ordinal_position",
        )
        .bind(table)
        .fetch_all(&mut conn)
        .await?;

        let mut columns = Vec::with_capacity(rows.len());
        for row in &rows {
            columns.push(PgColumn {
                name: row.try_get(0)?,
                data_type: row.try_get(1)?,
                nullable: row.try_get::<String, _>(2)? != "NO",
                default: row.try_get(3)?,
            });
        }

        definitions.push(render_pg_table(table, &columns));
    }

    conn.close().await.ok();
    Ok(definitions.join("\n\n"))
}

struct PgColumn {
    name: String,
    data_type: String,
    nullable: bool,
    default: Option<String>,
}

/// Render a `CREATE TABLE` statement from `information_schema.columns` rows.
fn render_pg_table(table: &str, columns: &[PgColumn]) -> String {
    let rendered: Vec<String> = columns
        .iter()
        .map(|col| {
            let mut line = format!("    {} {}", col.name, col.data_type);
            if let Some(default) = &col.default {
                line.push_str(&format!(" DEFAULT {}", default));
            }
            if !col.nullable {
                line.push_str(" NOT NULL");
            }
            line
        })
        .collect();

    format!("CREATE TABLE {} (\n{}\n);", table, rendered.join(",\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_supported_schemes() {
        assert_eq!(classify("mysql://u:p@host/db"), Some(DatabaseKind::MySql));
        assert_eq!(
            classify("postgres://u:p@host/db"),
            Some(DatabaseKind::Postgres)
        );
        assert_eq!(
            classify("postgresql://u:p@host/db"),
            Some(DatabaseKind::Postgres)
        );
    }

    #[test]
    fn test_classify_unsupported_scheme_is_absent() {
        assert_eq!(classify("redis://localhost/0"), None);
        assert_eq!(classify("sqlite::memory:"), None);
        assert_eq!(classify("not a url"), None);
    }

    #[tokio::test]
    async fn test_dump_schema_unsupported_scheme_yields_none() {
        let dump = dump_schema("redis://localhost/0").await.unwrap();
        assert!(dump.is_none());
    }

    #[test]
    fn test_render_pg_table() {
        let columns = vec![
            PgColumn {
                name: "id".to_string(),
                data_type: "integer".to_string(),
                nullable: false,
                default: Some("nextval('users_id_seq'::regclass)".to_string()),
            },
            PgColumn {
                name: "email".to_string(),
                data_type: "text".to_string(),
                nullable: true,
                default: None,
            },
        ];
        let ddl = render_pg_table("users", &columns);
        assert_eq!(
            ddl,
            "CREATE TABLE users (\n    id integer DEFAULT nextval('users_id_seq'::regclass) NOT NULL,\n    email text\n);"
        );
    }
}
