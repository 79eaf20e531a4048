//! Route table for the REST API.
//!
//! Every resource lives under `/api/v1`; health probes sit at the root so
//! orchestrators can reach them without knowing the API version.

use actix_web::web;

use crate::inbound::http::error::{json_config, path_config, query_config};
use crate::inbound::http::{apps, health, projects, strings, versions};

/// Register extractor settings and every API handler.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(query_config())
        .app_data(path_config())
        .service(health::ready)
        .service(health::live)
        .service(
            web::scope("/api/v1")
                .service(projects::list_projects)
                .service(projects::create_project)
                .service(projects::get_project)
                .service(projects::update_project)
                .service(projects::delete_project)
                .service(projects::set_member_role)
                .service(projects::remove_member)
                .service(apps::create_app)
                .service(apps::get_app)
                .service(apps::update_app)
                .service(apps::delete_app)
                .service(strings::list_strings)
                .service(strings::create_string)
                .service(strings::reset_pending)
                .service(strings::update_string)
                .service(strings::delete_string)
                .service(versions::pending_changes)
                .service(versions::list_versions)
                .service(versions::publish)
                .service(versions::get_version),
        );
}
