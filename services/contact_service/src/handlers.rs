use actix_web::{web, HttpResponse};
use shared_errors::AppError;
use shared_models::SecurityContext;
use validator::Validate;

use crate::models::{CreateContactRequest, UpdateContactRequest};
use crate::repository::ContactRepository;

pub async fn create_contact(
    body: web::Json<CreateContactRequest>,
    repo: web::Data<ContactRepository>,
    ctx: SecurityContext,
) -> Result<HttpResponse, AppError> {
    let user = ctx.require_user()?;
    body.validate()?;

    let contact = repo.create(user.id, &body).await?;
    Ok(HttpResponse::Created().json(contact))
}

pub async fn list_contacts(
    repo: web::Data<ContactRepository>,
    ctx: SecurityContext,
) -> Result<HttpResponse, AppError> {
    let user = ctx.require_user()?;
    let contacts = repo.list_by_owner(user.id).await?;
    Ok(HttpResponse::Ok().json(contacts))
}

pub async fn get_contact(
    id: web::Path<i64>,
    repo: web::Data<ContactRepository>,
    ctx: SecurityContext,
) -> Result<HttpResponse, AppError> {
    let user = ctx.require_user()?;
    let contact = repo
        .find(user.id, *id)
        .await?
        .ok_or_else(|| AppError::not_found("Contact", *id))?;
    Ok(HttpResponse::Ok().json(contact))
}

pub async fn update_contact(
    id: web::Path<i64>,
    body: web::Json<UpdateContactRequest>,
    repo: web::Data<ContactRepository>,
    ctx: SecurityContext,
) -> Result<HttpResponse, AppError> {
    let user = ctx.require_user()?;
    body.validate()?;

    let contact = repo
        .update(user.id, *id, &body)
        .await?
        .ok_or_else(|| AppError::not_found("Contact", *id))?;
    Ok(HttpResponse::Ok().json(contact))
}

pub async fn delete_contact(
    id: web::Path<i64>,
    repo: web::Data<ContactRepository>,
    ctx: SecurityContext,
) -> Result<HttpResponse, AppError> {
    let user = ctx.require_user()?;
    if repo.delete(user.id, *id).await? {
        Ok(HttpResponse::NoContent().finish())
    } else {
        Err(AppError::not_found("Contact", *id))
    }
}
