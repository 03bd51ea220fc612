use shared_models::Task;
use sqlx::PgPool;

use crate::models::{CreateTaskRequest, UpdateTaskRequest};

const TASK_COLUMNS: &str =
    "id, owner_id, title, description, due_date, priority, done, created_at, updated_at";

#[derive(Clone)]
pub struct TaskRepository {
    pool: PgPool,
}

impl TaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, owner_id: i64, req: &CreateTaskRequest) -> Result<Task, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            "INSERT INTO tasks (owner_id, title, description, due_date, priority, done)
             VALUES ($1, $2, $3, $4, $5, false)
             RETURNING {}",
            TASK_COLUMNS
        ))
        .bind(owner_id)
        .bind(&req.title)
        .bind(&req.description)
        .bind(req.due_date)
        .bind(req.priority)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<Task>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            "SELECT {} FROM tasks WHERE owner_id = $1 ORDER BY due_date NULLS LAST, priority DESC",
            TASK_COLUMNS
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn find(&self, owner_id: i64, id: i64) -> Result<Option<Task>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            "SELECT {} FROM tasks WHERE id = $1 AND owner_id = $2",
            TASK_COLUMNS
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
        req: &UpdateTaskRequest,
    ) -> Result<Option<Task>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            "UPDATE tasks
             SET title = $3, description = $4, due_date = $5, priority = $6, done = $7,
                 updated_at = NOW()
             WHERE id = $1 AND owner_id = $2
             RETURNING {}",
            TASK_COLUMNS
        ))
        .bind(id)
        .bind(owner_id)
        .bind(&req.title)
        .bind(&req.description)
        .bind(req.due_date)
        .bind(req.priority)
        .bind(req.done)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn delete(&self, owner_id: i64, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
