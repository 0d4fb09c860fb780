//! Answering and adjusting plans outside of GraphQL.
//!
//! The single-field updates are posted by the gig page's widgets; the answer
//! link is followed straight from a gig email.

use askama::Template;
use axum::extract::{Extension, Form, Path};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;

use crate::error::GigoResult;
use crate::extract::CurrentUser;
use crate::models::gig::Gig;
use crate::models::plan::{Plan, PlanStatus};
use crate::state::AppState;
use crate::util::current_time;

pub fn routes() -> Router {
    Router::new()
        .route("/plan/:id/update/:val", post(update_plan))
        .route("/plan/:id/feedback/:val", post(update_plan_feedback))
        .route("/plan/:id/comment", post(update_plan_comment))
        .route("/plan/:id/section/:val", post(update_plan_section))
        .route("/plan/:id/answer/:val", get(answer_plan))
}

async fn update_plan(
    Path((id, val)): Path<(i64, i32)>,
    CurrentUser(_user): CurrentUser,
    Extension(state): Extension<AppState>,
) -> GigoResult<StatusCode> {
    let status = PlanStatus::try_from(val)?;
    Plan::update_status(id, status, current_time(), state.store.as_ref()).await?;

    Ok(StatusCode::OK)
}

async fn update_plan_feedback(
    Path((id, val)): Path<(i64, i32)>,
    CurrentUser(_user): CurrentUser,
    Extension(state): Extension<AppState>,
) -> GigoResult<StatusCode> {
    Plan::update_feedback(id, val, state.store.as_ref()).await?;

    Ok(StatusCode::OK)
}

#[derive(Deserialize)]
struct CommentForm {
    value: String,
}

async fn update_plan_comment(
    Path(id): Path<i64>,
    CurrentUser(_user): CurrentUser,
    Extension(state): Extension<AppState>,
    Form(form): Form<CommentForm>,
) -> GigoResult<StatusCode> {
    Plan::update_comment(id, form.value, state.store.as_ref()).await?;

    Ok(StatusCode::OK)
}

async fn update_plan_section(
    Path((id, val)): Path<(i64, i64)>,
    CurrentUser(_user): CurrentUser,
    Extension(state): Extension<AppState>,
) -> GigoResult<StatusCode> {
    Plan::update_section(id, val, state.store.as_ref()).await?;

    Ok(StatusCode::OK)
}

#[derive(Template)]
#[template(path = "plan/answer.html")]
struct AnswerPage {
    gig_title: String,
    answer: &'static str,
}

fn answer_text(status: PlanStatus) -> &'static str {
    match status {
        PlanStatus::NoPlan => "No answer yet",
        PlanStatus::Definitely => "You'll be there",
        PlanStatus::Probably => "You'll probably be there",
        PlanStatus::DontKnow => "You don't know yet; we'll ask again closer to the gig",
        PlanStatus::ProbablyNot => "You probably can't make it",
        PlanStatus::CantDoIt => "You can't make it",
        PlanStatus::NotInterested => "You're not interested",
    }
}

async fn answer_plan(
    Path((id, val)): Path<(i64, i32)>,
    Extension(state): Extension<AppState>,
) -> GigoResult<Html<String>> {
    let store = state.store.as_ref();
    let status = PlanStatus::try_from(val)?;
    Plan::update_status(id, status, current_time(), store).await?;
    let plan = Plan::with_id(id, store).await?;
    let gig = Gig::with_id(plan.gig, store).await?;
    tracing::info!(plan = id, status = val, "plan answered from email");

    let page = AnswerPage {
        gig_title: gig.title,
        answer: answer_text(status),
    };
    Ok(Html(page.render()?))
}
