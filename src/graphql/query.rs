use async_graphql::{Context, Object, Result, ResultExt};

use crate::graphql::guards::LoggedIn;
use crate::models::band::Band;
use crate::models::gig::Gig;
use crate::models::member::Member;
use crate::models::plan::Plan;
use crate::state::AppState;

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    pub async fn user<'c>(&self, ctx: &'c Context<'c>) -> Option<Member> {
        ctx.data_opt::<Member>().cloned()
    }

    #[graphql(guard = "LoggedIn")]
    pub async fn band(&self, ctx: &Context<'_>, id: i64) -> Result<Band> {
        let state: &AppState = ctx.data_unchecked();
        Band::with_id(id, state.store.as_ref()).await.extend()
    }

    #[graphql(guard = "LoggedIn")]
    pub async fn gig(&self, ctx: &Context<'_>, id: i64) -> Result<Gig> {
        let state: &AppState = ctx.data_unchecked();
        Gig::with_id(id, state.store.as_ref()).await.extend()
    }

    /// All gigs of a band, soonest first
    #[graphql(guard = "LoggedIn")]
    pub async fn gigs(&self, ctx: &Context<'_>, band_id: i64) -> Result<Vec<Gig>> {
        let state: &AppState = ctx.data_unchecked();
        let mut gigs = Gig::for_band(band_id, state.store.as_ref()).await.extend()?;
        gigs.sort_by_key(|gig| gig.date);

        Ok(gigs)
    }

    #[graphql(guard = "LoggedIn")]
    pub async fn plan(&self, ctx: &Context<'_>, id: i64) -> Result<Plan> {
        let state: &AppState = ctx.data_unchecked();
        Plan::with_id(id, state.store.as_ref()).await.extend()
    }

    #[graphql(guard = "LoggedIn")]
    pub async fn plans(&self, ctx: &Context<'_>, gig_id: i64) -> Result<Vec<Plan>> {
        let state: &AppState = ctx.data_unchecked();
        let gig = Gig::with_id(gig_id, state.store.as_ref()).await.extend()?;

        state.store.plans_for_gig(gig.id).await.extend()
    }
}
