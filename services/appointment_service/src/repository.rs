use shared_models::Appointment;
use sqlx::PgPool;

use crate::models::AppointmentRequest;

const APPOINTMENT_COLUMNS: &str =
    "id, owner_id, title, location, starts_at, ends_at, created_at, updated_at";

#[derive(Clone)]
pub struct AppointmentRepository {
    pool: PgPool,
}

impl AppointmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        owner_id: i64,
        req: &AppointmentRequest,
    ) -> Result<Appointment, sqlx::Error> {
        sqlx::query_as::<_, Appointment>(&format!(
            "INSERT INTO appointments (owner_id, title, location, starts_at, ends_at)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {}",
            APPOINTMENT_COLUMNS
        ))
        .bind(owner_id)
        .bind(&req.title)
        .bind(&req.location)
        .bind(req.starts_at)
        .bind(req.ends_at)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<Appointment>, sqlx::Error> {
        sqlx::query_as::<_, Appointment>(&format!(
            "SELECT {} FROM appointments WHERE owner_id = $1 ORDER BY starts_at",
            APPOINTMENT_COLUMNS
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn find(&self, owner_id: i64, id: i64) -> Result<Option<Appointment>, sqlx::Error> {
        sqlx::query_as::<_, Appointment>(&format!(
            "SELECT {} FROM appointments WHERE id = $1 AND owner_id = $2",
            APPOINTMENT_COLUMNS
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
        req: &AppointmentRequest,
    ) -> Result<Option<Appointment>, sqlx::Error> {
        sqlx::query_as::<_, Appointment>(&format!(
            "UPDATE appointments
             SET title = $3, location = $4, starts_at = $5, ends_at = $6, updated_at = NOW()
             WHERE id = $1 AND owner_id = $2
             RETURNING {}",
            APPOINTMENT_COLUMNS
        ))
        .bind(id)
        .bind(owner_id)
        .bind(&req.title)
        .bind(&req.location)
        .bind(req.starts_at)
        .bind(req.ends_at)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn delete(&self, owner_id: i64, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM appointments WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
