use crate::routes::{admin, auth, health, public, root, student, teacher};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "jwt",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// API Documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        root::root,
        health::health,
        auth::token,
        auth::register,
        auth::me,
        public::list_users,
        public::users_by_role,
        admin::stats,
        admin::users::list_users,
        admin::users::get_user,
        admin::users::update_user,
        admin::users::delete_user,
        admin::users::list_students,
        admin::users::create_student,
        admin::users::get_student,
        admin::users::update_student,
        admin::users::delete_student,
        admin::users::promote_students,
        admin::users::list_teachers,
        admin::users::create_teacher,
        admin::users::get_teacher,
        admin::users::update_teacher,
        admin::users::delete_teacher,
        admin::users::list_parents,
        admin::users::create_parent,
        admin::users::get_parent,
        admin::users::update_parent,
        admin::users::delete_parent,
        admin::users::parent_students,
        admin::users::link_student,
        admin::users::unlink_student,
        admin::classes::list_classes,
        admin::classes::create_class,
        admin::classes::get_class,
        admin::classes::update_class,
        admin::classes::delete_class,
        admin::classes::list_enrollments,
        admin::classes::enroll_students,
        admin::classes::drop_student,
        teacher::profile::get_profile,
        teacher::profile::update_profile,
        teacher::profile::dashboard_stats,
        teacher::profile::activities,
        teacher::profile::schedule,
        teacher::classes::list_classes,
        teacher::classes::get_class,
        teacher::classes::class_students,
        teacher::classes::class_stats,
        teacher::assignments::list_assignments,
        teacher::assignments::class_assignments,
        teacher::assignments::create_assignment,
        teacher::assignments::get_assignment,
        teacher::assignments::update_assignment,
        teacher::assignments::delete_assignment,
        teacher::assignments::submissions,
        teacher::assignments::download_submission,
        teacher::attendance::class_attendance,
        teacher::attendance::mark_attendance,
        teacher::attendance::update_attendance,
        teacher::grades::class_grades,
        teacher::grades::record_grade,
        teacher::grades::comment_grade,
        teacher::grades::bulk_grades,
        teacher::grades::update_rubric,
        student::profile,
        student::classes,
        student::assignments,
        student::submit_assignment,
        student::grades,
        student::attendance,
        student::schedule,
    ),
    components(schemas(crate::error::ErrorData)),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness endpoints"),
        (name = "Authentication", description = "Tokens and account registration"),
        (name = "Public", description = "Unauthenticated listings"),
        (name = "Admin", description = "Account, class and enrollment management"),
        (name = "Teacher", description = "Classes, assignments, grading and attendance"),
        (name = "Student", description = "Own classes, assignments, submissions and records"),
    ),
    info(
        title = "School Management API",
        version = "1.0.0",
        description = "Role-based school administration backend",
        license(
            name = "MIT OR Apache-2.0",
        )
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_openapi_lists_routes() {
        let doc = ApiDoc::openapi();

        for path in [
            "/auth/token",
            "/admin/classes/{id}/enrollments",
            "/teacher/classes/{id}/grades",
            "/student/assignments/{id}/submit",
            "/public/users/role/{role}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }

        let schemes = doc.components.unwrap().security_schemes;
        assert!(schemes.contains_key("jwt"));
    }
}
