//! Shared route tree for integration tests

#![allow(dead_code)]

use gpui::div;
use gpui_shell_router::*;
use std::sync::Arc;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn page(path: &str) -> Route {
    Route::new(path.to_string(), |_, _| div())
}

/// `/`, `/a`, `/a/:id`, `/family/:fid/person/:pid`, a mail shell and two tabs
pub fn app_routes() -> RouteConfigurationBuilder {
    RouteConfiguration::builder()
        .route(page("/"))
        .route(page("/a").name("a").child(page(":id").name("a-item")))
        .route(
            page("/family/:fid")
                .name("family")
                .child(page("person/:pid").name("person")),
        )
        .route(
            ShellRoute::new(vec![page("/inbox")
                .child(page("compose").parent_navigator_key("root"))
                .child(page(":mid"))
                .into()])
            .navigator_key("mail"),
        )
        .route(StatefulShellRoute::new(vec![
            StatefulShellBranch::new(vec![page("/feed").into()]).navigator_key("feed"),
            StatefulShellBranch::new(vec![page("/profile").child(page("edit")).into()])
                .navigator_key("profile")
                .initial_location("/profile/edit"),
        ]))
        .route(page("/login"))
        .route(Route::redirect_only("/old-login", redirect_to("/login")))
}

pub fn app_configuration() -> Arc<RouteConfiguration> {
    init_logging();
    Arc::new(app_routes().build().unwrap())
}
