use crate::{
    dtos::{
        MessageResponse,
        user::{
            ParentLinkResponse, PromotionRequest, RoleQuery, UserCreate, UserResponse, UserUpdate,
        },
    },
    error::{ApiError, ApiResult},
    extract::AdminUser,
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use database::services::{
    roster::{Promotion, RosterService},
    users::{LinkOutcome, UserService},
};
use log::info;
use models::Role;
use uuid::Uuid;

type UserList = ApiResult<Json<Vec<UserResponse>>>;
type Created = ApiResult<(StatusCode, Json<UserResponse>)>;

async fn list_role(state: &AppState, role: Role) -> UserList {
    let users = UserService::list(&state.db, Some(role)).await?;
    Ok(Json(users.into_iter().map(Into::into).collect()))
}

/// The role of the route wins over any role in the body
async fn create_role(state: &AppState, role: Role, body: UserCreate) -> Created {
    let user = UserService::register(&state.db, body.into_new_user(role)).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

async fn get_role(state: &AppState, id: Uuid, role: Role) -> ApiResult<Json<UserResponse>> {
    Ok(Json(UserService::get_with_role(&state.db, id, role).await?.into()))
}

async fn update_role(
    state: &AppState,
    id: Uuid,
    role: Option<Role>,
    body: UserUpdate,
) -> ApiResult<Json<UserResponse>> {
    Ok(Json(UserService::update(&state.db, id, role, body.into()).await?.into()))
}

async fn delete_role(
    state: &AppState,
    id: Uuid,
    role: Option<Role>,
) -> ApiResult<Json<MessageResponse>> {
    let deleted = UserService::delete(&state.db, id, role).await?;
    Ok(Json(MessageResponse::new(format!(
        "{} {} deleted",
        deleted.role, deleted.email
    ))))
}

/// Every account, optionally of one role
#[utoipa::path(
    get,
    path = "/admin/users",
    params(RoleQuery),
    responses(
        (status = 200, description = "Accounts", body = Vec<UserResponse>),
        (status = 400, description = "Unknown role")
    ),
    security(("jwt" = [])),
    tag = "Admin"
)]
pub async fn list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<RoleQuery>,
) -> UserList {
    let role = query
        .role
        .as_deref()
        .map(str::parse::<Role>)
        .transpose()
        .map_err(|err| ApiError::BadRequest(err.to_string()))?;

    let users = UserService::list(&state.db, role).await?;
    Ok(Json(users.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/admin/users/{id}",
    params(("id" = Uuid, Path, description = "Account id")),
    responses(
        (status = 200, description = "Account", body = UserResponse),
        (status = 404, description = "User not found")
    ),
    security(("jwt" = [])),
    tag = "Admin"
)]
pub async fn get_user(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<UserResponse>> {
    Ok(Json(UserService::get(&state.db, id).await?.into()))
}

#[utoipa::path(
    put,
    path = "/admin/users/{id}",
    params(("id" = Uuid, Path, description = "Account id")),
    request_body = UserUpdate,
    responses(
        (status = 200, description = "Updated account", body = UserResponse),
        (status = 404, description = "User not found"),
        (status = 409, description = "Email already registered"),
        (status = 422, description = "Field does not belong to the role")
    ),
    security(("jwt" = [])),
    tag = "Admin"
)]
pub async fn update_user(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UserUpdate>,
) -> ApiResult<Json<UserResponse>> {
    update_role(&state, id, None, body).await
}

#[utoipa::path(
    delete,
    path = "/admin/users/{id}",
    params(("id" = Uuid, Path, description = "Account id")),
    responses(
        (status = 200, description = "Account deleted", body = MessageResponse),
        (status = 404, description = "User not found"),
        (status = 409, description = "Teacher still has classes")
    ),
    security(("jwt" = [])),
    tag = "Admin"
)]
pub async fn delete_user(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    delete_role(&state, id, None).await
}

#[utoipa::path(
    get,
    path = "/admin/students",
    responses((status = 200, description = "Students", body = Vec<UserResponse>)),
    security(("jwt" = [])),
    tag = "Admin"
)]
pub async fn list_students(State(state): State<AppState>, _admin: AdminUser) -> UserList {
    list_role(&state, Role::Student).await
}

#[utoipa::path(
    post,
    path = "/admin/students",
    request_body = UserCreate,
    responses(
        (status = 201, description = "Student created", body = UserResponse),
        (status = 409, description = "Email already registered"),
        (status = 404, description = "Parent not found")
    ),
    security(("jwt" = [])),
    tag = "Admin"
)]
pub async fn create_student(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(body): Json<UserCreate>,
) -> Created {
    create_role(&state, Role::Student, body).await
}

#[utoipa::path(
    get,
    path = "/admin/students/{id}",
    params(("id" = Uuid, Path, description = "Student id")),
    responses(
        (status = 200, description = "Student", body = UserResponse),
        (status = 404, description = "Student not found")
    ),
    security(("jwt" = [])),
    tag = "Admin"
)]
pub async fn get_student(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<UserResponse>> {
    get_role(&state, id, Role::Student).await
}

#[utoipa::path(
    put,
    path = "/admin/students/{id}",
    params(("id" = Uuid, Path, description = "Student id")),
    request_body = UserUpdate,
    responses(
        (status = 200, description = "Updated student", body = UserResponse),
        (status = 404, description = "Student not found")
    ),
    security(("jwt" = [])),
    tag = "Admin"
)]
pub async fn update_student(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UserUpdate>,
) -> ApiResult<Json<UserResponse>> {
    update_role(&state, id, Some(Role::Student), body).await
}

#[utoipa::path(
    delete,
    path = "/admin/students/{id}",
    params(("id" = Uuid, Path, description = "Student id")),
    responses(
        (status = 200, description = "Student deleted", body = MessageResponse),
        (status = 404, description = "Student not found")
    ),
    security(("jwt" = [])),
    tag = "Admin"
)]
pub async fn delete_student(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    delete_role(&state, id, Some(Role::Student)).await
}

/// Moves every student of a grade and section to another, along with their class enrollments
#[utoipa::path(
    post,
    path = "/admin/students/promote",
    request_body = PromotionRequest,
    responses(
        (status = 200, description = "Promoted students", body = Vec<UserResponse>),
        (status = 404, description = "No students in the source grade and section")
    ),
    security(("jwt" = [])),
    tag = "Admin"
)]
pub async fn promote_students(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(body): Json<PromotionRequest>,
) -> UserList {
    let promotion = Promotion {
        from_grade: body.from_grade,
        from_section: body.from_section,
        to_grade: body.to_grade,
        to_section: body.to_section,
    };

    let promoted = RosterService::promote(&state.db, promotion).await?;
    Ok(Json(promoted.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/admin/teachers",
    responses((status = 200, description = "Teachers", body = Vec<UserResponse>)),
    security(("jwt" = [])),
    tag = "Admin"
)]
pub async fn list_teachers(State(state): State<AppState>, _admin: AdminUser) -> UserList {
    list_role(&state, Role::Teacher).await
}

#[utoipa::path(
    post,
    path = "/admin/teachers",
    request_body = UserCreate,
    responses(
        (status = 201, description = "Teacher created", body = UserResponse),
        (status = 409, description = "Email already registered")
    ),
    security(("jwt" = [])),
    tag = "Admin"
)]
pub async fn create_teacher(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(body): Json<UserCreate>,
) -> Created {
    create_role(&state, Role::Teacher, body).await
}

#[utoipa::path(
    get,
    path = "/admin/teachers/{id}",
    params(("id" = Uuid, Path, description = "Teacher id")),
    responses(
        (status = 200, description = "Teacher", body = UserResponse),
        (status = 404, description = "Teacher not found")
    ),
    security(("jwt" = [])),
    tag = "Admin"
)]
pub async fn get_teacher(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<UserResponse>> {
    get_role(&state, id, Role::Teacher).await
}

#[utoipa::path(
    put,
    path = "/admin/teachers/{id}",
    params(("id" = Uuid, Path, description = "Teacher id")),
    request_body = UserUpdate,
    responses(
        (status = 200, description = "Updated teacher", body = UserResponse),
        (status = 404, description = "Teacher not found")
    ),
    security(("jwt" = [])),
    tag = "Admin"
)]
pub async fn update_teacher(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UserUpdate>,
) -> ApiResult<Json<UserResponse>> {
    update_role(&state, id, Some(Role::Teacher), body).await
}

#[utoipa::path(
    delete,
    path = "/admin/teachers/{id}",
    params(("id" = Uuid, Path, description = "Teacher id")),
    responses(
        (status = 200, description = "Teacher deleted", body = MessageResponse),
        (status = 404, description = "Teacher not found"),
        (status = 409, description = "Teacher still has classes")
    ),
    security(("jwt" = [])),
    tag = "Admin"
)]
pub async fn delete_teacher(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    delete_role(&state, id, Some(Role::Teacher)).await
}

#[utoipa::path(
    get,
    path = "/admin/parents",
    responses((status = 200, description = "Parents", body = Vec<UserResponse>)),
    security(("jwt" = [])),
    tag = "Admin"
)]
pub async fn list_parents(State(state): State<AppState>, _admin: AdminUser) -> UserList {
    list_role(&state, Role::Parent).await
}

#[utoipa::path(
    post,
    path = "/admin/parents",
    request_body = UserCreate,
    responses(
        (status = 201, description = "Parent created", body = UserResponse),
        (status = 409, description = "Email already registered")
    ),
    security(("jwt" = [])),
    tag = "Admin"
)]
pub async fn create_parent(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(body): Json<UserCreate>,
) -> Created {
    create_role(&state, Role::Parent, body).await
}

#[utoipa::path(
    get,
    path = "/admin/parents/{id}",
    params(("id" = Uuid, Path, description = "Parent id")),
    responses(
        (status = 200, description = "Parent", body = UserResponse),
        (status = 404, description = "Parent not found")
    ),
    security(("jwt" = [])),
    tag = "Admin"
)]
pub async fn get_parent(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<UserResponse>> {
    get_role(&state, id, Role::Parent).await
}

#[utoipa::path(
    put,
    path = "/admin/parents/{id}",
    params(("id" = Uuid, Path, description = "Parent id")),
    request_body = UserUpdate,
    responses(
        (status = 200, description = "Updated parent", body = UserResponse),
        (status = 404, description = "Parent not found")
    ),
    security(("jwt" = [])),
    tag = "Admin"
)]
pub async fn update_parent(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UserUpdate>,
) -> ApiResult<Json<UserResponse>> {
    update_role(&state, id, Some(Role::Parent), body).await
}

/// Deletes a parent; linked students keep their accounts without a parent
#[utoipa::path(
    delete,
    path = "/admin/parents/{id}",
    params(("id" = Uuid, Path, description = "Parent id")),
    responses(
        (status = 200, description = "Parent deleted", body = MessageResponse),
        (status = 404, description = "Parent not found")
    ),
    security(("jwt" = [])),
    tag = "Admin"
)]
pub async fn delete_parent(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    delete_role(&state, id, Some(Role::Parent)).await
}

#[utoipa::path(
    get,
    path = "/admin/parents/{id}/students",
    params(("id" = Uuid, Path, description = "Parent id")),
    responses(
        (status = 200, description = "Students linked to the parent", body = Vec<UserResponse>),
        (status = 404, description = "Parent not found")
    ),
    security(("jwt" = [])),
    tag = "Admin"
)]
pub async fn parent_students(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> UserList {
    let students = UserService::parent_students(&state.db, id).await?;
    Ok(Json(students.into_iter().map(Into::into).collect()))
}

/// Links a student to a parent, replacing any previous parent
#[utoipa::path(
    post,
    path = "/admin/parents/{id}/students/{student_id}",
    params(
        ("id" = Uuid, Path, description = "Parent id"),
        ("student_id" = Uuid, Path, description = "Student id")
    ),
    responses(
        (status = 200, description = "Student linked", body = ParentLinkResponse),
        (status = 404, description = "Parent or student not found")
    ),
    security(("jwt" = [])),
    tag = "Admin"
)]
pub async fn link_student(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path((parent_id, student_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<ParentLinkResponse>> {
    let response = match UserService::link_student(&state.db, parent_id, student_id).await? {
        LinkOutcome::AlreadyLinked => ParentLinkResponse {
            message: "Student is already linked to this parent".to_string(),
            previous_parent_id: None,
        },
        LinkOutcome::Linked { previous_parent } => {
            info!("Linked student {student_id} to parent {parent_id}");
            ParentLinkResponse {
                message: "Student linked to parent".to_string(),
                previous_parent_id: previous_parent,
            }
        }
    };

    Ok(Json(response))
}

#[utoipa::path(
    delete,
    path = "/admin/parents/{id}/students/{student_id}",
    params(
        ("id" = Uuid, Path, description = "Parent id"),
        ("student_id" = Uuid, Path, description = "Student id")
    ),
    responses(
        (status = 200, description = "Student unlinked, or was not linked", body = MessageResponse),
        (status = 404, description = "Parent or student not found")
    ),
    security(("jwt" = [])),
    tag = "Admin"
)]
pub async fn unlink_student(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path((parent_id, student_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<MessageResponse>> {
    let message = if UserService::unlink_student(&state.db, parent_id, student_id).await? {
        "Student unlinked from parent"
    } else {
        "Student is not linked to this parent"
    };

    Ok(Json(MessageResponse::new(message)))
}
