use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers;
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .nest("/projects", project_routes())
        .nest("/bookings", booking_routes())
        .nest("/payments", payment_routes())
        .nest("/refunds", refund_routes())
        .nest("/webhooks", webhook_routes())
        .nest("/milestones", milestone_routes())
        .nest("/properties", property_routes())
        .nest("/notifications", notification_routes())
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::auth::register))
        .routes(routes!(handlers::auth::login))
        .routes(routes!(handlers::auth::me))
}

fn project_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::project::list_projects,
            handlers::project::create_project
        ))
        .routes(routes!(handlers::project::get_project))
        .routes(routes!(
            handlers::project::list_properties,
            handlers::project::create_property
        ))
        .routes(routes!(
            handlers::project::list_milestones,
            handlers::project::create_milestone
        ))
        .routes(routes!(handlers::project::list_updates))
}

fn booking_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::booking::create_booking,
            handlers::booking::list_bookings
        ))
        .routes(routes!(handlers::booking::get_booking))
        .routes(routes!(handlers::booking::cancel_booking))
}

fn payment_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::payment::create_payment))
        .routes(routes!(handlers::payment::get_payment))
        .routes(routes!(handlers::payment::verify_payment))
}

fn refund_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(handlers::refund::initiate_refund))
}

fn webhook_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(handlers::webhook::handle_webhook))
}

fn milestone_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::upload::verify_qr))
        .routes(routes!(handlers::upload::milestone_secure_upload))
        .layer(handlers::upload::secure_upload_body_limit())
}

fn property_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::upload::property_secure_upload))
        .layer(handlers::upload::secure_upload_body_limit())
}

fn notification_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::notification::list_notifications))
        .routes(routes!(handlers::notification::mark_read))
}
