use actix_web::{get, post, web, HttpResponse};
use log::info;
use serde::Deserialize;

use crate::error::{Result, ServiceError};
use crate::models::{AppState, Interest, User};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub interests: Vec<Interest>,
}

#[post("/api/users")]
pub async fn create_user(
    data: web::Data<AppState>,
    body: web::Json<CreateUserRequest>,
) -> Result<HttpResponse> {
    let req = body.into_inner();
    if req.id.trim().is_empty() {
        return Err(ServiceError::Validation("id is required".to_string()));
    }

    let user = data
        .store
        .create(User::new(req.id, req.name, req.email, req.interests))
        .await?;

    info!("Created user {}", user.id);
    Ok(HttpResponse::Created().json(user))
}

#[get("/api/users/{id}")]
pub async fn get_user(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let user_id = path.into_inner();
    let user = data
        .store
        .get(&user_id)
        .await?
        .ok_or(ServiceError::UserNotFound(user_id))?;

    Ok(HttpResponse::Ok().json(user))
}
