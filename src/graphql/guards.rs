use async_graphql::{Context, Guard, Result};

use crate::models::member::Member;

pub struct LoggedIn;

#[async_trait::async_trait]
impl Guard for LoggedIn {
    async fn check(&self, ctx: &Context<'_>) -> Result<()> {
        if ctx.data_opt::<Member>().is_some() {
            Ok(())
        } else {
            Err("User must be logged in".into())
        }
    }
}

/// Only for resolvers behind the [LoggedIn] guard.
pub fn current_user<'a>(ctx: &Context<'a>) -> &'a Member {
    ctx.data_unchecked()
}
