//! HTTP request handlers.

use super::types::{ConfirmationQuery, HealthResponse, RegistrationForm};
use super::AppState;
use crate::error::PortalError;
use crate::notice::{Notice, PendingNotice};
use crate::pages::{self, Confirmation};
use crate::validate::{is_valid_email, is_valid_phone};
use axum::{
    extract::State,
    http::{header::SET_COOKIE, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Json,
};
use student_store::{NewStudent, StoreError, StudentStore};
use tracing::{error, info, warn};

/// Run a storage operation on the blocking pool.
///
/// The operation gets its own connection, released when it returns.
async fn with_store<T, F>(state: &AppState, op: F) -> Result<Result<T, StoreError>, PortalError>
where
    F: FnOnce(&StudentStore) -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    let store = state.store.clone();
    Ok(tokio::task::spawn_blocking(move || op(&store)).await?)
}

/// The message shown to the user for a storage fault.
fn fault_message(err: &StoreError) -> String {
    match err {
        StoreError::Internal(e) => e.to_string(),
        other => other.to_string(),
    }
}

/// First failed check of a trimmed registration, as a notice.
fn validation_notice(student: &NewStudent) -> Option<Notice> {
    let required = [
        &student.first_name,
        &student.last_name,
        &student.email,
        &student.phone,
        &student.course,
    ];

    if required.iter().any(|field| field.is_empty()) {
        return Some(Notice::danger("All fields are required!"));
    }

    if !is_valid_email(&student.email) {
        return Some(Notice::danger("Please enter a valid email address."));
    }

    if !is_valid_phone(&student.phone) {
        return Some(Notice::danger("Please enter a valid 10-digit phone number."));
    }

    None
}

fn form_page(mut pending: PendingNotice, notice: Notice) -> Response {
    let notices = pending.take_with([notice]);
    (pending, Html(pages::register_form(&notices))).into_response()
}

/// Home page.
pub async fn home(mut pending: PendingNotice) -> impl IntoResponse {
    let notices: Vec<Notice> = pending.take().into_iter().collect();
    (pending, Html(pages::home(&notices)))
}

/// Empty registration form.
pub async fn register_form(mut pending: PendingNotice) -> impl IntoResponse {
    let notices: Vec<Notice> = pending.take().into_iter().collect();
    (pending, Html(pages::register_form(&notices)))
}

/// Validate and store a registration.
///
/// Any failure re-renders the empty form with a notice. Success redirects to
/// the confirmation page with the notice carried in a cookie.
pub async fn register(
    State(state): State<AppState>,
    pending: PendingNotice,
    form: RegistrationForm,
) -> Result<Response, PortalError> {
    let student = form.trimmed();

    if let Some(notice) = validation_notice(&student) {
        info!(reason = %notice.message, "Registration rejected");
        return Ok(form_page(pending, notice));
    }

    let new_student = student.clone();
    let outcome = with_store(&state, move |store| store.insert(&new_student)).await?;

    match outcome {
        Ok(id) => {
            info!(id, email = %student.email, "Student registered");
            let cookie = state
                .notices
                .set_cookie(&Notice::success("Registration successful!"))?;
            let target = ConfirmationQuery::url_for(&student);
            Ok(([(SET_COOKIE, cookie)], Redirect::to(&target)).into_response())
        }
        Err(StoreError::DuplicateKey(email)) => {
            warn!(%email, "Registration with existing email");
            Ok(form_page(
                pending,
                Notice::danger("Email already registered! Please use a different email."),
            ))
        }
        Err(e) => {
            error!(error = %e, "Failed to store registration");
            Ok(form_page(
                pending,
                Notice::danger(format!("An error occurred: {}", fault_message(&e))),
            ))
        }
    }
}

/// Confirmation page built from query parameters.
///
/// Displays whatever it is given; nothing is looked up or checked.
pub async fn confirmation(
    mut pending: PendingNotice,
    query: ConfirmationQuery,
) -> impl IntoResponse {
    let details = Confirmation {
        first_name: &query.first_name,
        last_name: &query.last_name,
        email: &query.email,
        course: &query.course,
    };

    let notices: Vec<Notice> = pending.take().into_iter().collect();
    let page = pages::confirmation(&details, &notices);
    (pending, Html(page))
}

/// All registrations, newest first.
///
/// A storage fault degrades to an empty list with a notice.
pub async fn students(
    State(state): State<AppState>,
    mut pending: PendingNotice,
) -> Result<impl IntoResponse, PortalError> {
    let mut notices: Vec<Notice> = pending.take().into_iter().collect();

    let records = match with_store(&state, |store| store.list_all()).await? {
        Ok(records) => records,
        Err(e) => {
            error!(error = %e, "Failed to load students");
            notices.push(Notice::danger(format!(
                "Error loading students: {}",
                fault_message(&e)
            )));
            Vec::new()
        }
    };

    Ok((pending, Html(pages::students(&records, &notices))))
}

/// Health check endpoint.
pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, PortalError> {
    let count = with_store(&state, |store| store.count()).await?;

    if let Err(ref e) = count {
        warn!(error = %e, "Store unreachable during health check");
    }

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        store_reachable: count.is_ok(),
        registrations: count.unwrap_or(0),
    }))
}

/// Fallback for unmatched routes.
pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Html(pages::not_found()))
}
