//! Pulling the logged-in member out of a request.

use axum::async_trait;
use axum::extract::{FromRequest, RequestParts};
use axum::http::HeaderMap;

use crate::error::{GigoError, GigoResult};
use crate::models::member::Member;
use crate::state::AppState;

/// The header carrying the member's session token
pub const GIGO_TOKEN: &str = "GIGO_TOKEN";

pub fn get_token(headers: &HeaderMap) -> GigoResult<Option<&str>> {
    headers
        .iter()
        .find_map(|(name, value)| {
            if name == GIGO_TOKEN {
                Some(value.to_str().map_err(GigoError::InvalidTokenHeader))
            } else {
                None
            }
        })
        .transpose()
}

pub fn app_state<B>(req: &RequestParts<B>) -> GigoResult<AppState> {
    req.extensions()
        .get::<AppState>()
        .cloned()
        .ok_or_else(|| GigoError::Internal("application state was not registered".to_owned()))
}

/// The member whose session token came with the request.
pub struct CurrentUser(pub Member);

#[async_trait]
impl<B: Send> FromRequest<B> for CurrentUser {
    type Rejection = GigoError;

    async fn from_request(req: &mut RequestParts<B>) -> GigoResult<Self> {
        let state = app_state(req)?;
        let token = get_token(req.headers())?.ok_or(GigoError::Unauthorized)?;

        Member::with_token(token, state.store.as_ref())
            .await
            .map(CurrentUser)
    }
}

/// A logged-in member who administers the whole site.
pub struct SuperUser(pub Member);

#[async_trait]
impl<B: Send> FromRequest<B> for SuperUser {
    type Rejection = GigoError;

    async fn from_request(req: &mut RequestParts<B>) -> GigoResult<Self> {
        let CurrentUser(member) = CurrentUser::from_request(req).await?;
        member.ensure_superuser()?;

        Ok(SuperUser(member))
    }
}
