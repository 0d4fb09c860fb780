//! Persistence for bands, members, gigs and plans.
//!
//! Every get-or-create is atomic for its own record only; nothing here
//! spans several records in one transaction.

use async_trait::async_trait;

use crate::error::GigoResult;
use crate::models::band::{Assoc, Band, NewAssoc, Section};
use crate::models::gig::{Gig, NewGig};
use crate::models::member::{Member, NewMember};
use crate::models::plan::Plan;

pub mod memory;
pub mod postgres;

#[async_trait]
pub trait BandStore: Send + Sync {
    async fn band_with_id(&self, id: i64) -> GigoResult<Option<Band>>;
    /// Finds the band with exactly this name, creating it in `timezone` if there is none.
    async fn get_or_create_band(&self, name: &str, timezone: &str) -> GigoResult<(Band, bool)>;

    async fn section_with_id(&self, id: i64) -> GigoResult<Option<Section>>;
    async fn sections_for_band(&self, band: i64) -> GigoResult<Vec<Section>>;
    async fn get_or_create_section(&self, band: i64, name: &str) -> GigoResult<(Section, bool)>;

    async fn assoc_with_id(&self, id: i64) -> GigoResult<Option<Assoc>>;
    async fn assoc_for_member_in_band(&self, band: i64, member: i64) -> GigoResult<Option<Assoc>>;
    /// Existing associations are returned untouched.
    async fn get_or_create_assoc(&self, new_assoc: NewAssoc) -> GigoResult<(Assoc, bool)>;
    async fn set_assoc_default_section(&self, assoc: i64, section: i64) -> GigoResult<()>;
}

#[async_trait]
pub trait MemberStore: Send + Sync {
    async fn member_with_id(&self, id: i64) -> GigoResult<Option<Member>>;
    /// Finds the member with exactly this email, creating them if there is none.
    async fn get_or_create_member(&self, new_member: NewMember) -> GigoResult<(Member, bool)>;
    async fn member_for_session(&self, token: &str) -> GigoResult<Option<Member>>;
    async fn create_password_reset(&self, member: i64, token: &str) -> GigoResult<()>;
}

#[async_trait]
pub trait GigStore: Send + Sync {
    async fn gig_with_id(&self, id: i64) -> GigoResult<Option<Gig>>;
    async fn gigs_for_band(&self, band: i64) -> GigoResult<Vec<Gig>>;
    async fn insert_gig(&self, new_gig: NewGig) -> GigoResult<Gig>;
    /// Replaces the editable fields of the gig; the band and creation date stay.
    async fn update_gig(&self, id: i64, gig: &NewGig) -> GigoResult<()>;
}

#[async_trait]
pub trait PlanStore: Send + Sync {
    async fn plan_with_id(&self, id: i64) -> GigoResult<Option<Plan>>;
    async fn plans_for_gig(&self, gig: i64) -> GigoResult<Vec<Plan>>;
    async fn save_plan(&self, plan: &Plan) -> GigoResult<()>;
    /// Sets the section of every plan of the association without a section override.
    async fn update_plans_default_section(&self, assoc: i64, section: i64) -> GigoResult<u64>;
}

pub trait Store: BandStore + MemberStore + GigStore + PlanStore {}

impl<T: BandStore + MemberStore + GigStore + PlanStore> Store for T {}
