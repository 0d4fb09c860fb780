use async_graphql::{ComplexObject, Context, Enum, Result, SimpleObject};
use async_trait::async_trait;
use time::{Duration, OffsetDateTime};

use crate::db::Store;
use crate::error::{GigoError, GigoResult};
use crate::models::band::membership::{MembershipEvent, MembershipListener};
use crate::models::band::{Assoc, Section};
use crate::models::gig::Gig;
use crate::models::DateTime;
use crate::state::AppState;

/// A member's answer about whether they'll make it to a gig
#[derive(Clone, Copy, Debug, PartialEq, Eq, Enum, sqlx::Type)]
#[repr(i32)]
pub enum PlanStatus {
    NoPlan = 0,
    Definitely = 1,
    Probably = 2,
    DontKnow = 3,
    ProbablyNot = 4,
    CantDoIt = 5,
    NotInterested = 6,
}

impl PlanStatus {
    pub fn value(self) -> i32 {
        self as i32
    }
}

impl TryFrom<i32> for PlanStatus {
    type Error = GigoError;

    fn try_from(value: i32) -> GigoResult<Self> {
        Ok(match value {
            0 => PlanStatus::NoPlan,
            1 => PlanStatus::Definitely,
            2 => PlanStatus::Probably,
            3 => PlanStatus::DontKnow,
            4 => PlanStatus::ProbablyNot,
            5 => PlanStatus::CantDoIt,
            6 => PlanStatus::NotInterested,
            other => {
                return Err(GigoError::Validation(format!(
                    "{} is not a plan status",
                    other
                )))
            }
        })
    }
}

/// A member's plan for a gig
#[derive(SimpleObject, sqlx::FromRow, Clone, Debug, PartialEq)]
#[graphql(complex)]
pub struct Plan {
    /// The ID of the plan
    pub id: i64,
    pub gig: i64,
    /// The membership the plan was made under
    pub assoc: i64,
    pub status: PlanStatus,
    /// How the member rated the gig
    pub feedback_value: Option<i32>,
    pub comment: Option<String>,
    /// The section the member will play in at this gig
    pub section: Option<i64>,
    /// A section chosen for this gig only, overriding the member's default
    pub plan_section: Option<i64>,

    #[graphql(skip)]
    pub snooze_until: Option<OffsetDateTime>,
}

#[ComplexObject]
impl Plan {
    /// When to ask an undecided member again
    pub async fn snooze_until(&self) -> Option<DateTime> {
        self.snooze_until.map(DateTime::from)
    }

    /// The section the member is actually playing in
    pub async fn effective_section(&self, ctx: &Context<'_>) -> Result<Option<Section>> {
        let state: &AppState = ctx.data_unchecked();
        match self.plan_section.or(self.section) {
            Some(section_id) => Ok(state.store.section_with_id(section_id).await?),
            None => Ok(None),
        }
    }
}

impl Plan {
    pub async fn with_id(id: i64, store: &dyn Store) -> GigoResult<Self> {
        store
            .plan_with_id(id)
            .await?
            .ok_or_else(|| GigoError::not_found(format!("plan {}", id)))
    }

    /// Sets the plan's status, snoozing "don't know" answers until closer to the gig.
    pub async fn update_status(
        id: i64,
        status: PlanStatus,
        now: OffsetDateTime,
        store: &dyn Store,
    ) -> GigoResult<()> {
        let mut plan = Self::with_id(id, store).await?;
        plan.status = status;
        if status == PlanStatus::DontKnow {
            let gig = Gig::with_id(plan.gig, store).await?;
            if let Some(snooze_until) = snooze_until(gig.date, now) {
                plan.snooze_until = Some(snooze_until);
            }
        }

        store.save_plan(&plan).await
    }

    pub async fn update_feedback(id: i64, feedback_value: i32, store: &dyn Store) -> GigoResult<()> {
        let mut plan = Self::with_id(id, store).await?;
        plan.feedback_value = Some(feedback_value);

        store.save_plan(&plan).await
    }

    pub async fn update_comment(id: i64, comment: String, store: &dyn Store) -> GigoResult<()> {
        let mut plan = Self::with_id(id, store).await?;
        plan.comment = Some(comment);

        store.save_plan(&plan).await
    }

    pub async fn update_section(id: i64, section_id: i64, store: &dyn Store) -> GigoResult<()> {
        let mut plan = Self::with_id(id, store).await?;
        let section = Section::with_id(section_id, store).await?;
        let assoc = Assoc::with_id(plan.assoc, store).await?;
        if section.band != assoc.band {
            return Err(GigoError::Validation(format!(
                "section {} does not belong to band {}",
                section.id, assoc.band
            )));
        }
        plan.plan_section = Some(section.id);

        store.save_plan(&plan).await
    }

    /// Moves every plan of the membership that isn't overriding its section to the new default.
    pub async fn follow_default_section(
        assoc_id: i64,
        section_id: i64,
        store: &dyn Store,
    ) -> GigoResult<u64> {
        Assoc::with_id(assoc_id, store).await?;
        store
            .update_plans_default_section(assoc_id, section_id)
            .await
    }
}

/// When to re-ask a member who doesn't know yet whether they can make a gig.
///
/// Far-off gigs are asked about again in a week, gigs in the next week two
/// days beforehand, and imminent gigs not at all.
pub fn snooze_until(gig_date: OffsetDateTime, now: OffsetDateTime) -> Option<OffsetDateTime> {
    let days_away = (gig_date - now).whole_days();

    if days_away > 8 {
        Some(now + Duration::days(7))
    } else if days_away > 2 {
        Some(gig_date - Duration::days(2))
    } else {
        None
    }
}

/// Keeps plans in step with their member's default section.
pub struct PlanSectionListener;

#[async_trait]
impl MembershipListener for PlanSectionListener {
    async fn handle(&self, event: &MembershipEvent, store: &dyn Store) -> GigoResult<()> {
        match event {
            MembershipEvent::DefaultSectionChanged { assoc, section } => {
                let updated = Plan::follow_default_section(*assoc, *section, store).await?;
                tracing::debug!(assoc, section, updated, "moved plans to new default section");
            }
        }

        Ok(())
    }
}
