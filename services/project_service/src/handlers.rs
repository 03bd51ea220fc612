use actix_web::{web, HttpResponse};
use shared_errors::AppError;
use shared_models::SecurityContext;
use validator::Validate;

use crate::models::ProjectRequest;
use crate::repository::ProjectRepository;

pub async fn create_project(
    body: web::Json<ProjectRequest>,
    repo: web::Data<ProjectRepository>,
    ctx: SecurityContext,
) -> Result<HttpResponse, AppError> {
    let user = ctx.require_user()?;
    body.validate()?;

    let project = repo.create(user.id, &body).await?;
    Ok(HttpResponse::Created().json(project))
}

pub async fn list_projects(
    repo: web::Data<ProjectRepository>,
    ctx: SecurityContext,
) -> Result<HttpResponse, AppError> {
    let user = ctx.require_user()?;
    let projects = repo.list_by_owner(user.id).await?;
    Ok(HttpResponse::Ok().json(projects))
}

pub async fn get_project(
    id: web::Path<i64>,
    repo: web::Data<ProjectRepository>,
    ctx: SecurityContext,
) -> Result<HttpResponse, AppError> {
    let user = ctx.require_user()?;
    let project = repo
        .find(user.id, *id)
        .await?
        .ok_or_else(|| AppError::not_found("Project", *id))?;
    Ok(HttpResponse::Ok().json(project))
}

pub async fn update_project(
    id: web::Path<i64>,
    body: web::Json<ProjectRequest>,
    repo: web::Data<ProjectRepository>,
    ctx: SecurityContext,
) -> Result<HttpResponse, AppError> {
    let user = ctx.require_user()?;
    body.validate()?;

    let project = repo
        .update(user.id, *id, &body)
        .await?
        .ok_or_else(|| AppError::not_found("Project", *id))?;
    Ok(HttpResponse::Ok().json(project))
}

pub async fn delete_project(
    id: web::Path<i64>,
    repo: web::Data<ProjectRepository>,
    ctx: SecurityContext,
) -> Result<HttpResponse, AppError> {
    let user = ctx.require_user()?;
    if repo.delete(user.id, *id).await? {
        Ok(HttpResponse::NoContent().finish())
    } else {
        Err(AppError::not_found("Project", *id))
    }
}
