use crate::{
    dtos::grade::{
        BulkGradeRequest, ClassGradeResponse, GradeComment, GradeCreate, GradeQuery,
        GradeResponse, RubricUpdate,
    },
    error::ApiResult,
    extract::TeacherUser,
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use database::services::grades::GradeService;
use uuid::Uuid;

/// One row per enrolled student with their grade for `assignment_id`, or their class-level grade
#[utoipa::path(
    get,
    path = "/teacher/classes/{id}/grades",
    params(("id" = Uuid, Path, description = "Class id"), GradeQuery),
    responses(
        (status = 200, description = "Grades of the class", body = Vec<ClassGradeResponse>),
        (status = 404, description = "Class or assignment not found")
    ),
    security(("jwt" = [])),
    tag = "Teacher"
)]
pub async fn class_grades(
    State(state): State<AppState>,
    teacher: TeacherUser,
    Path(id): Path<Uuid>,
    Query(query): Query<GradeQuery>,
) -> ApiResult<Json<Vec<ClassGradeResponse>>> {
    let rows = GradeService::class_grades(&state.db, teacher.id, id, query.assignment_id).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// Creates or replaces the grade of a student for an assignment
#[utoipa::path(
    post,
    path = "/teacher/classes/{id}/grades",
    params(("id" = Uuid, Path, description = "Class id")),
    request_body = GradeCreate,
    responses(
        (status = 200, description = "Stored grade", body = GradeResponse),
        (status = 404, description = "Class, student or assignment not found"),
        (status = 422, description = "Score out of range")
    ),
    security(("jwt" = [])),
    tag = "Teacher"
)]
pub async fn record_grade(
    State(state): State<AppState>,
    teacher: TeacherUser,
    Path(id): Path<Uuid>,
    Json(body): Json<GradeCreate>,
) -> ApiResult<Json<GradeResponse>> {
    Ok(Json(GradeService::upsert(&state.db, teacher.id, id, body.into()).await?.into()))
}

#[utoipa::path(
    post,
    path = "/teacher/classes/{id}/grades/comment",
    params(("id" = Uuid, Path, description = "Class id")),
    request_body = GradeComment,
    responses(
        (status = 200, description = "Commented grade", body = GradeResponse),
        (status = 404, description = "Grade not found")
    ),
    security(("jwt" = [])),
    tag = "Teacher"
)]
pub async fn comment_grade(
    State(state): State<AppState>,
    teacher: TeacherUser,
    Path(id): Path<Uuid>,
    Json(body): Json<GradeComment>,
) -> ApiResult<Json<GradeResponse>> {
    let grade = GradeService::comment(
        &state.db,
        teacher.id,
        id,
        body.student_id,
        body.assignment_id,
        body.comment,
    )
    .await?;

    Ok(Json(grade.into()))
}

/// Records grades across classes. Nothing is stored unless every class belongs to the caller.
#[utoipa::path(
    post,
    path = "/teacher/grades/bulk",
    request_body = BulkGradeRequest,
    responses(
        (status = 200, description = "Stored grades", body = Vec<GradeResponse>),
        (status = 404, description = "A class was not found"),
        (status = 422, description = "No grades given or score out of range")
    ),
    security(("jwt" = [])),
    tag = "Teacher"
)]
pub async fn bulk_grades(
    State(state): State<AppState>,
    teacher: TeacherUser,
    Json(body): Json<BulkGradeRequest>,
) -> ApiResult<Json<Vec<GradeResponse>>> {
    let grades = GradeService::bulk(&state.db, teacher.id, body.into()).await?;
    Ok(Json(grades.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    put,
    path = "/teacher/grades/{id}/rubric",
    params(("id" = Uuid, Path, description = "Grade id")),
    request_body = RubricUpdate,
    responses(
        (status = 200, description = "Updated grade", body = GradeResponse),
        (status = 404, description = "Grade not found")
    ),
    security(("jwt" = [])),
    tag = "Teacher"
)]
pub async fn update_rubric(
    State(state): State<AppState>,
    teacher: TeacherUser,
    Path(id): Path<Uuid>,
    Json(body): Json<RubricUpdate>,
) -> ApiResult<Json<GradeResponse>> {
    let grade = GradeService::update_rubric(&state.db, teacher.id, id, body.rubric_data).await?;
    Ok(Json(grade.into()))
}
