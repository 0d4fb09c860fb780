use async_graphql::{ComplexObject, Context, InputObject, Result, SimpleObject};
use time::OffsetDateTime;

use crate::db::Store;
use crate::error::{GigoError, GigoResult};
use crate::models::band::Band;
use crate::models::member::Member;
use crate::models::plan::Plan;
use crate::models::DateTime;
use crate::state::AppState;
use crate::util::current_time;

/// The name shown in emails when a gig has no contact
pub const UNKNOWN_CONTACT_NAME: &str = "??";

/// A performance a band has been asked to play
#[derive(SimpleObject, sqlx::FromRow, Clone, Debug, PartialEq)]
#[graphql(complex)]
pub struct Gig {
    /// The ID of the gig
    pub id: i64,
    /// The band playing the gig
    pub band: i64,
    pub title: String,
    pub details: Option<String>,
    pub setlist: Option<String>,
    pub address: Option<String>,
    /// What to wear
    pub dress: Option<String>,
    /// Whether the band is being paid
    pub paid: bool,
    /// What's happening after the gig
    pub postgig: Option<String>,
    /// Whether the gig is hidden from the public feed
    pub is_private: bool,
    pub is_archived: bool,
    /// Whether occasional members are asked to come
    pub invite_occasionals: bool,
    /// Whether the reminder email has gone out
    pub was_reminded: bool,
    pub hide_from_calendar: bool,
    pub rss_description: Option<String>,
    /// Whether members are assumed to be coming until they answer
    pub default_to_attending: bool,

    #[graphql(skip)]
    pub contact: Option<i64>,
    #[graphql(skip)]
    pub date: OffsetDateTime,
    #[graphql(skip)]
    pub setdate: Option<OffsetDateTime>,
    #[graphql(skip)]
    pub enddate: Option<OffsetDateTime>,
    #[graphql(skip)]
    pub created_date: OffsetDateTime,
}

#[ComplexObject]
impl Gig {
    /// When the gig starts
    pub async fn date(&self) -> DateTime {
        DateTime::from(self.date)
    }

    /// When the band should be set up by
    pub async fn setdate(&self) -> Option<DateTime> {
        self.setdate.map(DateTime::from)
    }

    /// When the gig ends
    pub async fn enddate(&self) -> Option<DateTime> {
        self.enddate.map(DateTime::from)
    }

    pub async fn created_date(&self) -> DateTime {
        DateTime::from(self.created_date)
    }

    /// The member to ask about the gig
    pub async fn contact(&self, ctx: &Context<'_>) -> Result<Option<Member>> {
        let state: &AppState = ctx.data_unchecked();
        Ok(self.contact_member(state.store.as_ref()).await?)
    }

    /// Every member's plan for the gig
    pub async fn plans(&self, ctx: &Context<'_>) -> Result<Vec<Plan>> {
        let state: &AppState = ctx.data_unchecked();
        Ok(state.store.plans_for_gig(self.id).await?)
    }
}

impl Gig {
    pub async fn with_id(id: i64, store: &dyn Store) -> GigoResult<Self> {
        store
            .gig_with_id(id)
            .await?
            .ok_or_else(|| GigoError::not_found(format!("gig {}", id)))
    }

    pub async fn for_band(band_id: i64, store: &dyn Store) -> GigoResult<Vec<Self>> {
        Band::with_id(band_id, store).await?;
        store.gigs_for_band(band_id).await
    }

    pub async fn create(
        band_id: i64,
        new_gig: GigInput,
        user: &Member,
        store: &dyn Store,
    ) -> GigoResult<Self> {
        let band = Band::with_id(band_id, store).await?;
        band.ensure_gig_editing_by(user, store).await?;

        let gig = store
            .insert_gig(new_gig.into_new_gig(band.id, current_time()))
            .await?;
        tracing::info!(gig = gig.id, band = band.id, "created gig {}", gig.title);

        Ok(gig)
    }

    pub async fn update(
        id: i64,
        update: GigInput,
        user: &Member,
        store: &dyn Store,
    ) -> GigoResult<Self> {
        let gig = Self::with_id(id, store).await?;
        let band = Band::with_id(gig.band, store).await?;
        band.ensure_gig_editing_by(user, store).await?;

        let mut updated = update.into_new_gig(band.id, gig.created_date);
        updated.was_reminded = gig.was_reminded;
        store.update_gig(id, &updated).await?;

        Self::with_id(id, store).await
    }

    pub async fn contact_member(&self, store: &dyn Store) -> GigoResult<Option<Member>> {
        match self.contact {
            Some(member_id) => store.member_with_id(member_id).await,
            None => Ok(None),
        }
    }
}

/// Everything needed to store a gig that hasn't been given an ID yet
#[derive(Clone, Debug, PartialEq)]
pub struct NewGig {
    pub band: i64,
    pub title: String,
    pub details: Option<String>,
    pub setlist: Option<String>,
    pub address: Option<String>,
    pub dress: Option<String>,
    pub paid: bool,
    pub postgig: Option<String>,
    pub is_private: bool,
    pub is_archived: bool,
    pub invite_occasionals: bool,
    pub was_reminded: bool,
    pub hide_from_calendar: bool,
    pub rss_description: Option<String>,
    pub default_to_attending: bool,
    pub contact: Option<i64>,
    pub date: OffsetDateTime,
    pub setdate: Option<OffsetDateTime>,
    pub enddate: Option<OffsetDateTime>,
    pub created_date: OffsetDateTime,
}

impl NewGig {
    pub fn with_id(self, id: i64) -> Gig {
        Gig {
            id,
            band: self.band,
            title: self.title,
            details: self.details,
            setlist: self.setlist,
            address: self.address,
            dress: self.dress,
            paid: self.paid,
            postgig: self.postgig,
            is_private: self.is_private,
            is_archived: self.is_archived,
            invite_occasionals: self.invite_occasionals,
            was_reminded: self.was_reminded,
            hide_from_calendar: self.hide_from_calendar,
            rss_description: self.rss_description,
            default_to_attending: self.default_to_attending,
            contact: self.contact,
            date: self.date,
            setdate: self.setdate,
            enddate: self.enddate,
            created_date: self.created_date,
        }
    }
}

/// A gig as entered by a band member
#[derive(InputObject, Clone, Debug)]
pub struct GigInput {
    pub title: String,
    pub details: Option<String>,
    pub setlist: Option<String>,
    pub address: Option<String>,
    pub dress: Option<String>,
    #[graphql(default)]
    pub paid: bool,
    pub postgig: Option<String>,
    #[graphql(default)]
    pub is_private: bool,
    #[graphql(default)]
    pub is_archived: bool,
    #[graphql(default = true)]
    pub invite_occasionals: bool,
    #[graphql(default)]
    pub hide_from_calendar: bool,
    pub rss_description: Option<String>,
    #[graphql(default)]
    pub default_to_attending: bool,
    /// The ID of the member to ask about the gig
    pub contact: Option<i64>,
    pub date: DateTime,
    pub setdate: Option<DateTime>,
    pub enddate: Option<DateTime>,
}

impl GigInput {
    pub fn into_new_gig(self, band: i64, created_date: OffsetDateTime) -> NewGig {
        NewGig {
            band,
            title: self.title,
            details: self.details,
            setlist: self.setlist,
            address: self.address,
            dress: self.dress,
            paid: self.paid,
            postgig: self.postgig,
            is_private: self.is_private,
            is_archived: self.is_archived,
            invite_occasionals: self.invite_occasionals,
            was_reminded: false,
            hide_from_calendar: self.hide_from_calendar,
            rss_description: self.rss_description,
            default_to_attending: self.default_to_attending,
            contact: self.contact,
            date: self.date.0,
            setdate: self.setdate.map(|time| time.0),
            enddate: self.enddate.map(|time| time.0),
            created_date,
        }
    }
}
