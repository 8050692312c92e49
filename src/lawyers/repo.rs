use anyhow::Context;
use axum::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::{types::Json, FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Directory entry. Profile fields are free-form and flattened into the JSON view.
#[derive(Debug, Clone, Serialize)]
pub struct Lawyer {
    pub id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(flatten)]
    pub profile: Map<String, Value>,
}

#[derive(Debug, FromRow)]
struct LawyerRow {
    id: Uuid,
    profile: Json<Map<String, Value>>,
    created_at: OffsetDateTime,
}

impl From<LawyerRow> for Lawyer {
    fn from(r: LawyerRow) -> Self {
        Self {
            id: r.id,
            created_at: r.created_at,
            profile: r.profile.0,
        }
    }
}

#[async_trait]
pub trait LawyerRepo: Send + Sync {
    async fn list(&self) -> anyhow::Result<Vec<Lawyer>>;
    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Lawyer>>;
    async fn create(&self, id: Uuid, profile: Map<String, Value>) -> anyhow::Result<Lawyer>;
    /// `false` when no lawyer had this id.
    async fn delete(&self, id: Uuid) -> anyhow::Result<bool>;
}

#[derive(Clone)]
pub struct PgLawyerRepo {
    db: PgPool,
}

impl PgLawyerRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl LawyerRepo for PgLawyerRepo {
    async fn list(&self) -> anyhow::Result<Vec<Lawyer>> {
        let rows = sqlx::query_as::<_, LawyerRow>(
            r#"SELECT id, profile, created_at FROM lawyers ORDER BY created_at ASC"#,
        )
        .fetch_all(&self.db)
        .await
        .context("list lawyers")?;
        Ok(rows.into_iter().map(Lawyer::from).collect())
    }

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Lawyer>> {
        let row = sqlx::query_as::<_, LawyerRow>(
            r#"SELECT id, profile, created_at FROM lawyers WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("get lawyer")?;
        Ok(row.map(Lawyer::from))
    }

    async fn create(&self, id: Uuid, profile: Map<String, Value>) -> anyhow::Result<Lawyer> {
        let row = sqlx::query_as::<_, LawyerRow>(
            r#"
            INSERT INTO lawyers (id, profile)
            VALUES ($1, $2)
            RETURNING id, profile, created_at
            "#,
        )
        .bind(id)
        .bind(Json(profile))
        .fetch_one(&self.db)
        .await
        .context("insert lawyer")?;
        Ok(row.into())
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query(r#"DELETE FROM lawyers WHERE id = $1"#)
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete lawyer")?;
        Ok(result.rows_affected() > 0)
    }
}


#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn profile_fields_are_flattened() {
        let mut profile = Map::new();
        profile.insert("name".into(), json!("Saul"));
        profile.insert("specialty".into(), json!("criminal"));
        let lawyer = Lawyer {
            id: Uuid::nil(),
            created_at: OffsetDateTime::UNIX_EPOCH,
            profile,
        };

        let v = serde_json::to_value(&lawyer).unwrap();
        assert_eq!(v["name"], "Saul");
        assert_eq!(v["specialty"], "criminal");
        assert_eq!(v["id"], Uuid::nil().to_string());
        assert_eq!(v["created_at"], "1970-01-01T00:00:00Z");
    }
}
