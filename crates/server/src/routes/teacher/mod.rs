pub mod assignments;
pub mod attendance;
pub mod classes;
pub mod grades;
pub mod profile;

use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post, put},
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(profile::get_profile).put(profile::update_profile))
        .route("/dashboard/stats", get(profile::dashboard_stats))
        .route("/activities", get(profile::activities))
        .route("/schedule", get(profile::schedule))
        .route("/classes", get(classes::list_classes))
        .route("/classes/{id}", get(classes::get_class))
        .route("/classes/{id}/students", get(classes::class_students))
        .route("/classes/{id}/stats", get(classes::class_stats))
        .route("/classes/{id}/assignments", get(assignments::class_assignments))
        .route(
            "/classes/{id}/attendance",
            get(attendance::class_attendance).post(attendance::mark_attendance),
        )
        .route(
            "/classes/{id}/grades",
            get(grades::class_grades).post(grades::record_grade),
        )
        .route("/classes/{id}/grades/comment", post(grades::comment_grade))
        .route(
            "/assignments",
            get(assignments::list_assignments).post(assignments::create_assignment),
        )
        .route(
            "/assignments/{id}",
            get(assignments::get_assignment)
                .put(assignments::update_assignment)
                .delete(assignments::delete_assignment),
        )
        .route("/assignments/{id}/submissions", get(assignments::submissions))
        .route("/attendance/{id}", put(attendance::update_attendance))
        .route("/grades/bulk", post(grades::bulk_grades))
        .route("/grades/{id}/rubric", put(grades::update_rubric))
        .route(
            "/uploads/assignments/assignments/submissions/{*path}",
            get(assignments::download_submission),
        )
}
