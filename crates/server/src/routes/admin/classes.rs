use crate::{
    dtos::{
        MessageResponse,
        class::{ClassCreate, ClassResponse, ClassUpdate, EnrollmentRequest, EnrollmentResponse},
    },
    error::ApiResult,
    extract::AdminUser,
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use database::services::{classes::ClassService, roster::RosterService};
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/admin/classes",
    responses((status = 200, description = "Every class with its roster", body = Vec<ClassResponse>)),
    security(("jwt" = [])),
    tag = "Admin"
)]
pub async fn list_classes(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> ApiResult<Json<Vec<ClassResponse>>> {
    let classes = ClassService::list(&state.db).await?;
    Ok(Json(classes.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/admin/classes",
    request_body = ClassCreate,
    responses(
        (status = 201, description = "Class created", body = ClassResponse),
        (status = 404, description = "Teacher not found"),
        (status = 409, description = "Class name already in use"),
        (status = 422, description = "Invalid capacity")
    ),
    security(("jwt" = [])),
    tag = "Admin"
)]
pub async fn create_class(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(body): Json<ClassCreate>,
) -> ApiResult<(StatusCode, Json<ClassResponse>)> {
    let class = ClassService::create(&state.db, body.into()).await?;
    Ok((StatusCode::CREATED, Json(class.into())))
}

#[utoipa::path(
    get,
    path = "/admin/classes/{id}",
    params(("id" = Uuid, Path, description = "Class id")),
    responses(
        (status = 200, description = "Class", body = ClassResponse),
        (status = 404, description = "Class not found")
    ),
    security(("jwt" = [])),
    tag = "Admin"
)]
pub async fn get_class(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ClassResponse>> {
    Ok(Json(ClassService::get(&state.db, id).await?.into()))
}

#[utoipa::path(
    put,
    path = "/admin/classes/{id}",
    params(("id" = Uuid, Path, description = "Class id")),
    request_body = ClassUpdate,
    responses(
        (status = 200, description = "Updated class", body = ClassResponse),
        (status = 404, description = "Class or teacher not found"),
        (status = 409, description = "Class name already in use"),
        (status = 422, description = "Capacity below the enrolled count")
    ),
    security(("jwt" = [])),
    tag = "Admin"
)]
pub async fn update_class(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(body): Json<ClassUpdate>,
) -> ApiResult<Json<ClassResponse>> {
    Ok(Json(ClassService::update(&state.db, id, body.into()).await?.into()))
}

/// Deletes a class together with its enrollments, assignments and records
#[utoipa::path(
    delete,
    path = "/admin/classes/{id}",
    params(("id" = Uuid, Path, description = "Class id")),
    responses(
        (status = 200, description = "Class deleted", body = MessageResponse),
        (status = 404, description = "Class not found")
    ),
    security(("jwt" = [])),
    tag = "Admin"
)]
pub async fn delete_class(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    let class = ClassService::delete(&state.db, id).await?;
    Ok(Json(MessageResponse::new(format!("Class {} deleted", class.name))))
}

/// Enrollments of a class in every status
#[utoipa::path(
    get,
    path = "/admin/classes/{id}/enrollments",
    params(("id" = Uuid, Path, description = "Class id")),
    responses(
        (status = 200, description = "Enrollments", body = Vec<EnrollmentResponse>),
        (status = 404, description = "Class not found")
    ),
    security(("jwt" = [])),
    tag = "Admin"
)]
pub async fn list_enrollments(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<EnrollmentResponse>>> {
    let enrollments = RosterService::enrollments(&state.db, id).await?;
    Ok(Json(enrollments.into_iter().map(Into::into).collect()))
}

/// Enrolls all listed students or none of them
#[utoipa::path(
    post,
    path = "/admin/classes/{id}/enrollments",
    params(("id" = Uuid, Path, description = "Class id")),
    request_body = EnrollmentRequest,
    responses(
        (status = 201, description = "Students enrolled", body = Vec<EnrollmentResponse>),
        (status = 404, description = "Class or student not found"),
        (status = 409, description = "Capacity exceeded or student already enrolled")
    ),
    security(("jwt" = [])),
    tag = "Admin"
)]
pub async fn enroll_students(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(body): Json<EnrollmentRequest>,
) -> ApiResult<(StatusCode, Json<Vec<EnrollmentResponse>>)> {
    let enrollments = RosterService::enroll(&state.db, id, &body.student_ids).await?;
    Ok((
        StatusCode::CREATED,
        Json(enrollments.into_iter().map(Into::into).collect()),
    ))
}

#[utoipa::path(
    delete,
    path = "/admin/classes/{id}/enrollments/{student_id}",
    params(
        ("id" = Uuid, Path, description = "Class id"),
        ("student_id" = Uuid, Path, description = "Student id")
    ),
    responses(
        (status = 200, description = "Enrollment dropped", body = EnrollmentResponse),
        (status = 404, description = "No active enrollment")
    ),
    security(("jwt" = [])),
    tag = "Admin"
)]
pub async fn drop_student(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path((id, student_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<EnrollmentResponse>> {
    Ok(Json(RosterService::drop_student(&state.db, id, student_id).await?.into()))
}
