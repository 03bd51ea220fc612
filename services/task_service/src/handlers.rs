use actix_web::{web, HttpResponse};
use shared_errors::AppError;
use shared_models::SecurityContext;
use validator::Validate;

use crate::models::{CreateTaskRequest, UpdateTaskRequest};
use crate::repository::TaskRepository;

pub async fn create_task(
    body: web::Json<CreateTaskRequest>,
    repo: web::Data<TaskRepository>,
    ctx: SecurityContext,
) -> Result<HttpResponse, AppError> {
    let user = ctx.require_user()?;
    body.validate()?;

    let task = repo.create(user.id, &body).await?;
    Ok(HttpResponse::Created().json(task))
}

pub async fn list_tasks(
    repo: web::Data<TaskRepository>,
    ctx: SecurityContext,
) -> Result<HttpResponse, AppError> {
    let user = ctx.require_user()?;
    let tasks = repo.list_by_owner(user.id).await?;
    Ok(HttpResponse::Ok().json(tasks))
}

pub async fn get_task(
    id: web::Path<i64>,
    repo: web::Data<TaskRepository>,
    ctx: SecurityContext,
) -> Result<HttpResponse, AppError> {
    let user = ctx.require_user()?;
    let task = repo
        .find(user.id, *id)
        .await?
        .ok_or_else(|| AppError::not_found("Task", *id))?;
    Ok(HttpResponse::Ok().json(task))
}

pub async fn update_task(
    id: web::Path<i64>,
    body: web::Json<UpdateTaskRequest>,
    repo: web::Data<TaskRepository>,
    ctx: SecurityContext,
) -> Result<HttpResponse, AppError> {
    let user = ctx.require_user()?;
    body.validate()?;

    let task = repo
        .update(user.id, *id, &body)
        .await?
        .ok_or_else(|| AppError::not_found("Task", *id))?;
    Ok(HttpResponse::Ok().json(task))
}

pub async fn delete_task(
    id: web::Path<i64>,
    repo: web::Data<TaskRepository>,
    ctx: SecurityContext,
) -> Result<HttpResponse, AppError> {
    let user = ctx.require_user()?;
    if repo.delete(user.id, *id).await? {
        Ok(HttpResponse::NoContent().finish())
    } else {
        Err(AppError::not_found("Task", *id))
    }
}
