//! Server-rendered pages.
//!
//! Each page is a heading and a list.

use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use tracing::error;

use super::current_user::CurrentUser;
use crate::server::AppState;
use crate::store::{Routine, WorkoutProgram};

/// GET /login
pub async fn login_page() -> Html<String> {
    render(
        "Sign in",
        "<p>Sign in through the account service to see your saved workouts.</p>".to_string(),
    )
}

/// GET /routines
pub async fn routines_page(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Response {
    match state.store.list_routines(&user.id).await {
        Ok(routines) => render("My routines", routine_list(&routines)).into_response(),
        Err(e) => {
            error!(user_id = %user.id, error = %e, "failed to load routines");
            failure_page()
        }
    }
}

/// GET /programs
pub async fn programs_page(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Response {
    match state.store.list_programs(&user.id).await {
        Ok(programs) => render("My programs", program_list(&programs)).into_response(),
        Err(e) => {
            error!(user_id = %user.id, error = %e, "failed to load programs");
            failure_page()
        }
    }
}

fn failure_page() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        render(
            "Something went wrong",
            "<p>Your workouts could not be loaded.</p>".to_string(),
        ),
    )
        .into_response()
}

fn routine_list(routines: &[Routine]) -> String {
    if routines.is_empty() {
        return "<p>No routines yet.</p>".to_string();
    }
    let items: String = routines
        .iter()
        .map(|r| {
            format!(
                "<li>{} <small>({} exercises)</small></li>",
                escape_html(&r.name),
                r.exercises.len()
            )
        })
        .collect();
    format!("<ul>{items}</ul>")
}

fn program_list(programs: &[WorkoutProgram]) -> String {
    if programs.is_empty() {
        return "<p>No programs yet.</p>".to_string();
    }
    let items: String = programs
        .iter()
        .map(|p| {
            let weeks = p
                .duration_weeks
                .map(|w| format!(" <small>({w} weeks)</small>"))
                .unwrap_or_default();
            format!("<li>{}{weeks}</li>", escape_html(&p.name))
        })
        .collect();
    format!("<ul>{items}</ul>")
}

fn render(title: &str, body: String) -> Html<String> {
    Html(format!(
        "<!doctype html><html><head><meta charset=\"utf-8\"><title>{title}</title></head>\
         <body><h1>{title}</h1>{body}</body></html>"
    ))
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
