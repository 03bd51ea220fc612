use shared_models::Project;
use sqlx::PgPool;

use crate::models::ProjectRequest;

const PROJECT_COLUMNS: &str =
    "id, owner_id, name, description, status, due_date, created_at, updated_at";

#[derive(Clone)]
pub struct ProjectRepository {
    pool: PgPool,
}

impl ProjectRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, owner_id: i64, req: &ProjectRequest) -> Result<Project, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            "INSERT INTO projects (owner_id, name, description, status, due_date)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {}",
            PROJECT_COLUMNS
        ))
        .bind(owner_id)
        .bind(&req.name)
        .bind(&req.description)
        .bind(&req.status)
        .bind(req.due_date)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<Project>, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            "SELECT {} FROM projects WHERE owner_id = $1 ORDER BY due_date NULLS LAST, name",
            PROJECT_COLUMNS
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn find(&self, owner_id: i64, id: i64) -> Result<Option<Project>, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            "SELECT {} FROM projects WHERE id = $1 AND owner_id = $2",
            PROJECT_COLUMNS
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn update(
        &self,
        owner_id: i64,
        id: i64,
        req: &ProjectRequest,
    ) -> Result<Option<Project>, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            "UPDATE projects
             SET name = $3, description = $4, status = $5, due_date = $6, updated_at = NOW()
             WHERE id = $1 AND owner_id = $2
             RETURNING {}",
            PROJECT_COLUMNS
        ))
        .bind(id)
        .bind(owner_id)
        .bind(&req.name)
        .bind(&req.description)
        .bind(&req.status)
        .bind(req.due_date)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn delete(&self, owner_id: i64, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
