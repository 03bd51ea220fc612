use actix_web::{web, HttpResponse};
use shared_errors::AppError;
use shared_models::SecurityContext;
use validator::Validate;

use crate::models::AppointmentRequest;
use crate::repository::AppointmentRepository;

pub async fn create_appointment(
    body: web::Json<AppointmentRequest>,
    repo: web::Data<AppointmentRepository>,
    ctx: SecurityContext,
) -> Result<HttpResponse, AppError> {
    let user = ctx.require_user()?;
    body.validate()?;

    let appointment = repo.create(user.id, &body).await?;
    Ok(HttpResponse::Created().json(appointment))
}

pub async fn list_appointments(
    repo: web::Data<AppointmentRepository>,
    ctx: SecurityContext,
) -> Result<HttpResponse, AppError> {
    let user = ctx.require_user()?;
    let appointments = repo.list_by_owner(user.id).await?;
    Ok(HttpResponse::Ok().json(appointments))
}

pub async fn get_appointment(
    id: web::Path<i64>,
    repo: web::Data<AppointmentRepository>,
    ctx: SecurityContext,
) -> Result<HttpResponse, AppError> {
    let user = ctx.require_user()?;
    let appointment = repo
        .find(user.id, *id)
        .await?
        .ok_or_else(|| AppError::not_found("Appointment", *id))?;
    Ok(HttpResponse::Ok().json(appointment))
}

pub async fn update_appointment(
    id: web::Path<i64>,
    body: web::Json<AppointmentRequest>,
    repo: web::Data<AppointmentRepository>,
    ctx: SecurityContext,
) -> Result<HttpResponse, AppError> {
    let user = ctx.require_user()?;
    body.validate()?;

    let appointment = repo
        .update(user.id, *id, &body)
        .await?
        .ok_or_else(|| AppError::not_found("Appointment", *id))?;
    Ok(HttpResponse::Ok().json(appointment))
}

pub async fn delete_appointment(
    id: web::Path<i64>,
    repo: web::Data<AppointmentRepository>,
    ctx: SecurityContext,
) -> Result<HttpResponse, AppError> {
    let user = ctx.require_user()?;
    if repo.delete(user.id, *id).await? {
        Ok(HttpResponse::NoContent().finish())
    } else {
        Err(AppError::not_found("Appointment", *id))
    }
}
