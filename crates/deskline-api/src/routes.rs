use std::time::Duration;

use axum::Router;
use axum::middleware;
use axum::routing::{delete, get, patch, post, put};
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::guard::require_session;
use crate::handlers::{answers, auth, conversations, fields, statuses, teams, tickets, users};
use crate::state::AppState;

/// Builds the full HTTP surface. Everything except health and the login
/// endpoints sits behind [`require_session`]; `request_timeout` bounds every
/// request.
pub fn router(state: AppState, request_timeout: Duration) -> Router {
    let public_routes = Router::new()
        .route("/health", get(auth::health))
        .route("/auth/login", post(auth::login))
        .route("/auth/otp", post(auth::request_otp))
        .route("/auth/otp/verify", post(auth::verify_otp))
        .with_state(state.clone());

    let protected_routes = Router::new()
        // Session
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/auth/password", put(auth::change_password))
        // Users
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/{id}",
            get(users::get_user)
                .patch(users::update_user)
                .delete(users::delete_user),
        )
        .route("/users/{id}/team", put(users::assign_team))
        .route("/users/{id}/password", put(users::reset_password))
        // Teams
        .route("/teams", get(teams::list_teams).post(teams::create_team))
        .route(
            "/teams/{id}",
            get(teams::get_team)
                .patch(teams::update_team)
                .delete(teams::delete_team),
        )
        .route("/teams/{id}/supervisor", put(teams::set_supervisor))
        .route("/teams/{id}/default", put(teams::set_default))
        // Answer sets and answers
        .route(
            "/answer-sets",
            get(answers::list_answer_sets).post(answers::create_answer_set),
        )
        .route(
            "/answer-sets/{id}",
            get(answers::get_answer_set).delete(answers::delete_answer_set),
        )
        .route("/answer-sets/{id}/answers", post(answers::create_answer))
        .route(
            "/answers/{id}",
            patch(answers::update_answer).delete(answers::delete_answer),
        )
        // Conversations
        .route(
            "/conversations",
            get(conversations::list_conversations).post(conversations::create_conversation),
        )
        .route(
            "/conversations/{id}",
            patch(conversations::update_conversation).delete(conversations::delete_conversation),
        )
        // Ticketing
        .route(
            "/ticket-statuses",
            get(statuses::list_statuses).post(statuses::create_status),
        )
        .route(
            "/ticket-statuses/{id}",
            patch(statuses::update_status).delete(statuses::delete_status),
        )
        .route("/ticket-statuses/{id}/default", put(statuses::set_default))
        .route(
            "/ticket-fields",
            get(fields::list_fields).post(fields::create_field),
        )
        .route("/ticket-fields/{id}", delete(fields::delete_field))
        .route("/tickets", get(tickets::list_tickets).post(tickets::create_ticket))
        .route("/tickets/{id}", get(tickets::get_ticket))
        .route("/tickets/{id}/status", put(tickets::set_status))
        .route(
            "/tickets/{id}/comments",
            get(tickets::list_comments).post(tickets::add_comment),
        )
        .layer(middleware::from_fn_with_state(state.clone(), require_session))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
