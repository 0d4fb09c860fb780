use async_graphql::{Context, Object, Result, ResultExt};

use crate::email::plan::{send_emails_from_plans, GigEmailKind};
use crate::graphql::guards::{current_user, LoggedIn};
use crate::models::band::{Assoc, Band};
use crate::models::gig::{Gig, GigInput};
use crate::models::plan::{Plan, PlanStatus};
use crate::state::AppState;
use crate::util::current_time;

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    #[graphql(guard = "LoggedIn")]
    pub async fn create_gig(&self, ctx: &Context<'_>, band_id: i64, new_gig: GigInput) -> Result<Gig> {
        let state: &AppState = ctx.data_unchecked();
        Gig::create(band_id, new_gig, current_user(ctx), state.store.as_ref())
            .await
            .extend()
    }

    #[graphql(guard = "LoggedIn")]
    pub async fn update_gig(&self, ctx: &Context<'_>, id: i64, update: GigInput) -> Result<Gig> {
        let state: &AppState = ctx.data_unchecked();
        Gig::update(id, update, current_user(ctx), state.store.as_ref())
            .await
            .extend()
    }

    /// Moves a member to a new usual section, along with every plan that follows it
    #[graphql(guard = "LoggedIn")]
    pub async fn set_default_section(
        &self,
        ctx: &Context<'_>,
        assoc_id: i64,
        section_id: i64,
    ) -> Result<Assoc> {
        let state: &AppState = ctx.data_unchecked();
        let store = state.store.as_ref();
        let assoc = Assoc::with_id(assoc_id, store).await.extend()?;
        assoc
            .ensure_editable_by(current_user(ctx), store)
            .await
            .extend()?;

        Assoc::set_default_section(assoc.id, section_id, store, &state.events)
            .await
            .extend()?;
        Assoc::with_id(assoc.id, store).await.extend()
    }

    /// Emails every confirmed member about the gig, returning how many emails were queued
    #[graphql(guard = "LoggedIn")]
    pub async fn send_gig_emails(
        &self,
        ctx: &Context<'_>,
        gig_id: i64,
        kind: GigEmailKind,
    ) -> Result<usize> {
        let state: &AppState = ctx.data_unchecked();
        let store = state.store.as_ref();
        let gig = Gig::with_id(gig_id, store).await.extend()?;
        let band = Band::with_id(gig.band, store).await.extend()?;
        band.ensure_gig_editing_by(current_user(ctx), store)
            .await
            .extend()?;

        let plans = store.plans_for_gig(gig.id).await.extend()?;
        send_emails_from_plans(
            plans,
            kind,
            &state.config.base_url,
            store,
            state.tasks.as_ref(),
        )
        .await
        .extend()
    }

    #[graphql(guard = "LoggedIn")]
    pub async fn update_plan_status(
        &self,
        ctx: &Context<'_>,
        plan_id: i64,
        status: PlanStatus,
    ) -> Result<Plan> {
        let state: &AppState = ctx.data_unchecked();
        let store = state.store.as_ref();
        Plan::update_status(plan_id, status, current_time(), store)
            .await
            .extend()?;

        Plan::with_id(plan_id, store).await.extend()
    }

    #[graphql(guard = "LoggedIn")]
    pub async fn update_plan_feedback(
        &self,
        ctx: &Context<'_>,
        plan_id: i64,
        feedback_value: i32,
    ) -> Result<Plan> {
        let state: &AppState = ctx.data_unchecked();
        let store = state.store.as_ref();
        Plan::update_feedback(plan_id, feedback_value, store)
            .await
            .extend()?;

        Plan::with_id(plan_id, store).await.extend()
    }

    #[graphql(guard = "LoggedIn")]
    pub async fn update_plan_comment(
        &self,
        ctx: &Context<'_>,
        plan_id: i64,
        comment: String,
    ) -> Result<Plan> {
        let state: &AppState = ctx.data_unchecked();
        let store = state.store.as_ref();
        Plan::update_comment(plan_id, comment, store).await.extend()?;

        Plan::with_id(plan_id, store).await.extend()
    }

    /// Has the member play in a different section for just this gig
    #[graphql(guard = "LoggedIn")]
    pub async fn update_plan_section(
        &self,
        ctx: &Context<'_>,
        plan_id: i64,
        section_id: i64,
    ) -> Result<Plan> {
        let state: &AppState = ctx.data_unchecked();
        let store = state.store.as_ref();
        Plan::update_section(plan_id, section_id, store)
            .await
            .extend()?;

        Plan::with_id(plan_id, store).await.extend()
    }
}
