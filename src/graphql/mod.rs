use async_graphql::http::{playground_source, GraphQLPlaygroundConfig};
use async_graphql::{EmptySubscription, Request, Response, Schema};
use axum::extract::Extension;
use axum::http::HeaderMap;
use axum::response::Html;
use axum::Json;

use crate::error::GigoResult;
use crate::extract::{get_token, GIGO_TOKEN};
use crate::graphql::mutation::MutationRoot;
use crate::graphql::query::QueryRoot;
use crate::models::member::Member;
use crate::state::AppState;

pub mod guards;
pub mod mutation;
pub mod query;

pub type GigoSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

pub fn build_schema() -> GigoSchema {
    Schema::new(QueryRoot, MutationRoot, EmptySubscription)
}

pub async fn query(
    headers: HeaderMap,
    Extension(state): Extension<AppState>,
    Json(request): Json<Request>,
) -> GigoResult<Json<Response>> {
    let user = match get_token(&headers)? {
        Some(token) => Some(Member::with_token(token, state.store.as_ref()).await?),
        None => None,
    };

    let mut request = request.data(state);
    if let Some(user) = user {
        request = request.data(user);
    }

    Ok(Json(build_schema().execute(request).await))
}

pub async fn playground(headers: HeaderMap) -> GigoResult<Html<String>> {
    let mut config = GraphQLPlaygroundConfig::new("/");
    if let Some(token) = get_token(&headers)? {
        config = config.with_header(GIGO_TOKEN, token);
    }

    Ok(Html(playground_source(config)))
}
