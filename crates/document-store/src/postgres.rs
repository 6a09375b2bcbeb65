use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::{
    Document, DocumentKey, DocumentQuery, DocumentStoreError, Result, Version,
    store::{DocumentStore, PutOptions, check_expected_version},
};

/// PostgreSQL-backed document store implementation.
///
/// Documents live in a single `documents` table keyed by
/// `(collection, key)` with the body stored as JSONB.
#[derive(Clone)]
pub struct PostgresDocumentStore {
    pool: PgPool,
}

impl PostgresDocumentStore {
    /// Creates a new PostgreSQL document store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_document(row: PgRow) -> Result<Document> {
        Ok(Document {
            collection: row.try_get("collection")?,
            key: DocumentKey::new(row.try_get::<String, _>("key")?),
            version: Version::new(row.try_get("version")?),
            updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
            body: row.try_get("body")?,
        })
    }
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    async fn put(&self, document: Document, options: PutOptions) -> Result<Version> {
        let mut tx = self.pool.begin().await?;

        let current: Option<i64> = sqlx::query_scalar(
            "SELECT version FROM documents WHERE collection = $1 AND key = $2 FOR UPDATE",
        )
        .bind(&document.collection)
        .bind(document.key.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        let actual = Version::new(current.unwrap_or(0));
        check_expected_version(&document.collection, &document.key, &options, actual)?;

        let version = actual.next();
        let result = sqlx::query(
            r#"
            INSERT INTO documents (collection, key, version, updated_at, body)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (collection, key) DO UPDATE SET
                version = EXCLUDED.version,
                updated_at = EXCLUDED.updated_at,
                body = EXCLUDED.body
            WHERE documents.version = $3 - 1
            "#,
        )
        .bind(&document.collection)
        .bind(document.key.as_str())
        .bind(version.as_i64())
        .bind(Utc::now())
        .bind(&document.body)
        .execute(&mut *tx)
        .await?;

        // A concurrent creator won the insert; the row lock above could not cover it
        if result.rows_affected() == 0 {
            let stored: Option<i64> = sqlx::query_scalar(
                "SELECT version FROM documents WHERE collection = $1 AND key = $2",
            )
            .bind(&document.collection)
            .bind(document.key.as_str())
            .fetch_optional(&mut *tx)
            .await?;

            metrics::counter!("document_store_conflicts_total", "collection" => document.collection.clone())
                .increment(1);
            return Err(DocumentStoreError::ConcurrencyConflict {
                collection: document.collection,
                key: document.key,
                expected: options.expected_version.unwrap_or(actual),
                actual: stored.map_or(version, Version::new),
            });
        }

        tx.commit().await?;
        Ok(version)
    }

    async fn get(&self, collection: &str, key: &DocumentKey) -> Result<Option<Document>> {
        let row: Option<PgRow> = sqlx::query(
            r#"
            SELECT collection, key, version, updated_at, body
            FROM documents
            WHERE collection = $1 AND key = $2
            "#,
        )
        .bind(collection)
        .bind(key.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_document).transpose()
    }

    async fn delete(
        &self,
        collection: &str,
        key: &DocumentKey,
        options: PutOptions,
    ) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let current: Option<i64> = sqlx::query_scalar(
            "SELECT version FROM documents WHERE collection = $1 AND key = $2 FOR UPDATE",
        )
        .bind(collection)
        .bind(key.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        check_expected_version(
            collection,
            key,
            &options,
            Version::new(current.unwrap_or(0)),
        )?;

        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND key = $2")
            .bind(collection)
            .bind(key.as_str())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn query(&self, query: DocumentQuery) -> Result<Vec<Document>> {
        let mut sql = String::from(
            "SELECT collection, key, version, updated_at, body FROM documents WHERE collection = $1",
        );
        let mut param_count = 1;

        if query.field_equals.is_some() {
            sql.push_str(&format!(
                " AND body ->> ${} = ${}",
                param_count + 1,
                param_count + 2
            ));
            param_count += 2;
        }

        sql.push_str(" ORDER BY key ASC");

        if query.limit.is_some() {
            param_count += 1;
            sql.push_str(&format!(" LIMIT ${param_count}"));
        }
        if query.offset.is_some() {
            param_count += 1;
            sql.push_str(&format!(" OFFSET ${param_count}"));
        }

        let mut sqlx_query = sqlx::query(&sql).bind(&query.collection);

        if let Some((field, value)) = &query.field_equals {
            sqlx_query = sqlx_query.bind(field).bind(value);
        }
        if let Some(limit) = query.limit {
            sqlx_query = sqlx_query.bind(limit as i64);
        }
        if let Some(offset) = query.offset {
            sqlx_query = sqlx_query.bind(offset as i64);
        }

        let rows = sqlx_query.fetch_all(&self.pool).await?;
        rows.into_iter().map(Self::row_to_document).collect()
    }

    async fn get_version(&self, collection: &str, key: &DocumentKey) -> Result<Option<Version>> {
        let version: Option<i64> = sqlx::query_scalar(
            "SELECT version FROM documents WHERE collection = $1 AND key = $2",
        )
        .bind(collection)
        .bind(key.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(version.map(Version::new))
    }
}
