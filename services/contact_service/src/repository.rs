use shared_models::Contact;
use sqlx::PgPool;

use crate::models::{CreateContactRequest, UpdateContactRequest};

#[derive(Clone)]
pub struct ContactRepository {
    pool: PgPool,
}

impl ContactRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        owner_id: i64,
        req: &CreateContactRequest,
    ) -> Result<Contact, sqlx::Error> {
        sqlx::query_as::<_, Contact>(
            "INSERT INTO contacts (owner_id, first_name, last_name, email, phone, address)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING id, owner_id, first_name, last_name, email, phone, address,
                       created_at, updated_at",
        )
        .bind(owner_id)
        .bind(&req.first_name)
        .bind(&req.last_name)
        .bind(&req.email)
        .bind(&req.phone)
        .bind(&req.address)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<Contact>, sqlx::Error> {
        sqlx::query_as::<_, Contact>(
            "SELECT id, owner_id, first_name, last_name, email, phone, address,
                    created_at, updated_at
             FROM contacts WHERE owner_id = $1
             ORDER BY last_name, first_name",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn find(&self, owner_id: i64, id: i64) -> Result<Option<Contact>, sqlx::Error> {
        sqlx::query_as::<_, Contact>(
            "SELECT id, owner_id, first_name, last_name, email, phone, address,
                    created_at, updated_at
             FROM contacts WHERE id = $1 AND owner_id = $2",
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn update(
        &self,
        owner_id: i64,
        id: i64,
        req: &UpdateContactRequest,
    ) -> Result<Option<Contact>, sqlx::Error> {
        sqlx::query_as::<_, Contact>(
            "UPDATE contacts
             SET first_name = $3, last_name = $4, email = $5, phone = $6, address = $7,
                 updated_at = NOW()
             WHERE id = $1 AND owner_id = $2
             RETURNING id, owner_id, first_name, last_name, email, phone, address,
                       created_at, updated_at",
        )
        .bind(id)
        .bind(owner_id)
        .bind(&req.first_name)
        .bind(&req.last_name)
        .bind(&req.email)
        .bind(&req.phone)
        .bind(&req.address)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn delete(&self, owner_id: i64, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM contacts WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
