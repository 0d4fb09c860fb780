//! A store that keeps everything in memory, for tests and local tooling.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::db::{BandStore, GigStore, MemberStore, PlanStore};
use crate::error::{GigoError, GigoResult};
use crate::models::band::{Assoc, AssocStatus, Band, NewAssoc, Section};
use crate::models::gig::{Gig, NewGig};
use crate::models::member::{Member, NewMember};
use crate::models::plan::{Plan, PlanStatus};

#[derive(Default)]
struct Tables {
    last_id: i64,
    bands: Vec<Band>,
    members: Vec<Member>,
    sections: Vec<Section>,
    assocs: Vec<Assoc>,
    gigs: Vec<Gig>,
    plans: Vec<Plan>,
    sessions: HashMap<String, i64>,
    password_resets: HashMap<String, i64>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub async fn add_session(&self, token: &str, member: i64) {
        self.tables
            .lock()
            .await
            .sessions
            .insert(token.to_owned(), member);
    }

    pub async fn make_superuser(&self, member: i64) {
        let mut tables = self.tables.lock().await;
        if let Some(member) = tables.members.iter_mut().find(|m| m.id == member) {
            member.is_superuser = true;
        }
    }

    pub async fn set_anyone_can_create_gigs(&self, band: i64, allowed: bool) {
        let mut tables = self.tables.lock().await;
        if let Some(band) = tables.bands.iter_mut().find(|b| b.id == band) {
            band.anyone_can_create_gigs = allowed;
        }
    }

    pub async fn set_assoc_contact_preferences(
        &self,
        assoc: i64,
        status: AssocStatus,
        email_me: bool,
    ) {
        let mut tables = self.tables.lock().await;
        if let Some(assoc) = tables.assocs.iter_mut().find(|a| a.id == assoc) {
            assoc.status = status;
            assoc.email_me = email_me;
        }
    }

    /// Plans are made when members are invited to gigs, which happens outside this crate.
    pub async fn create_plan(&self, gig: i64, assoc: &Assoc) -> Plan {
        let mut tables = self.tables.lock().await;
        let plan = Plan {
            id: tables.next_id(),
            gig,
            assoc: assoc.id,
            status: PlanStatus::NoPlan,
            feedback_value: None,
            comment: None,
            section: assoc.default_section,
            plan_section: None,
            snooze_until: None,
        };
        tables.plans.push(plan.clone());

        plan
    }

    pub async fn password_resets_for(&self, member: i64) -> Vec<String> {
        self.tables
            .lock()
            .await
            .password_resets
            .iter()
            .filter(|(_, owner)| **owner == member)
            .map(|(token, _)| token.clone())
            .collect()
    }

    pub async fn counts(&self) -> RecordCounts {
        let tables = self.tables.lock().await;
        RecordCounts {
            bands: tables.bands.len(),
            members: tables.members.len(),
            sections: tables.sections.len(),
            assocs: tables.assocs.len(),
            gigs: tables.gigs.len(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecordCounts {
    pub bands: usize,
    pub members: usize,
    pub sections: usize,
    pub assocs: usize,
    pub gigs: usize,
}

#[async_trait]
impl BandStore for MemoryStore {
    async fn band_with_id(&self, id: i64) -> GigoResult<Option<Band>> {
        let tables = self.tables.lock().await;
        Ok(tables.bands.iter().find(|band| band.id == id).cloned())
    }

    async fn get_or_create_band(&self, name: &str, timezone: &str) -> GigoResult<(Band, bool)> {
        let mut tables = self.tables.lock().await;
        if let Some(band) = tables.bands.iter().find(|band| band.name == name) {
            return Ok((band.clone(), false));
        }

        let band = Band {
            id: tables.next_id(),
            name: name.to_owned(),
            timezone: timezone.to_owned(),
            anyone_can_create_gigs: false,
        };
        tables.bands.push(band.clone());

        Ok((band, true))
    }

    async fn section_with_id(&self, id: i64) -> GigoResult<Option<Section>> {
        let tables = self.tables.lock().await;
        Ok(tables.sections.iter().find(|section| section.id == id).cloned())
    }

    async fn sections_for_band(&self, band: i64) -> GigoResult<Vec<Section>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .sections
            .iter()
            .filter(|section| section.band == band)
            .cloned()
            .collect())
    }

    async fn get_or_create_section(&self, band: i64, name: &str) -> GigoResult<(Section, bool)> {
        let mut tables = self.tables.lock().await;
        if !tables.bands.iter().any(|b| b.id == band) {
            return Err(GigoError::not_found(format!("band {}", band)));
        }
        if let Some(section) = tables
            .sections
            .iter()
            .find(|section| section.band == band && section.name == name)
        {
            return Ok((section.clone(), false));
        }

        let section = Section {
            id: tables.next_id(),
            band,
            name: name.to_owned(),
        };
        tables.sections.push(section.clone());

        Ok((section, true))
    }

    async fn assoc_with_id(&self, id: i64) -> GigoResult<Option<Assoc>> {
        let tables = self.tables.lock().await;
        Ok(tables.assocs.iter().find(|assoc| assoc.id == id).cloned())
    }

    async fn assoc_for_member_in_band(&self, band: i64, member: i64) -> GigoResult<Option<Assoc>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .assocs
            .iter()
            .find(|assoc| assoc.band == band && assoc.member == member)
            .cloned())
    }

    async fn get_or_create_assoc(&self, new_assoc: NewAssoc) -> GigoResult<(Assoc, bool)> {
        let mut tables = self.tables.lock().await;
        if let Some(assoc) = tables
            .assocs
            .iter()
            .find(|assoc| assoc.band == new_assoc.band && assoc.member == new_assoc.member)
        {
            return Ok((assoc.clone(), false));
        }

        let assoc = Assoc {
            id: tables.next_id(),
            band: new_assoc.band,
            member: new_assoc.member,
            is_admin: new_assoc.is_admin,
            is_occasional: new_assoc.is_occasional,
            status: new_assoc.status,
            default_section: new_assoc.default_section,
            email_me: true,
        };
        tables.assocs.push(assoc.clone());

        Ok((assoc, true))
    }

    async fn set_assoc_default_section(&self, assoc: i64, section: i64) -> GigoResult<()> {
        let mut tables = self.tables.lock().await;
        let assoc = tables
            .assocs
            .iter_mut()
            .find(|a| a.id == assoc)
            .ok_or_else(|| GigoError::not_found(format!("association {}", assoc)))?;
        assoc.default_section = Some(section);

        Ok(())
    }
}

#[async_trait]
impl MemberStore for MemoryStore {
    async fn member_with_id(&self, id: i64) -> GigoResult<Option<Member>> {
        let tables = self.tables.lock().await;
        Ok(tables.members.iter().find(|member| member.id == id).cloned())
    }

    async fn get_or_create_member(&self, new_member: NewMember) -> GigoResult<(Member, bool)> {
        let mut tables = self.tables.lock().await;
        if let Some(member) = tables
            .members
            .iter()
            .find(|member| member.email == new_member.email)
        {
            return Ok((member.clone(), false));
        }

        let member = Member {
            id: tables.next_id(),
            email: new_member.email,
            username: new_member.username,
            go2_id: new_member.go2_id,
            is_superuser: false,
        };
        tables.members.push(member.clone());

        Ok((member, true))
    }

    async fn member_for_session(&self, token: &str) -> GigoResult<Option<Member>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .sessions
            .get(token)
            .and_then(|id| tables.members.iter().find(|member| member.id == *id))
            .cloned())
    }

    async fn create_password_reset(&self, member: i64, token: &str) -> GigoResult<()> {
        let mut tables = self.tables.lock().await;
        tables.password_resets.retain(|_, owner| *owner != member);
        tables.password_resets.insert(token.to_owned(), member);

        Ok(())
    }
}

#[async_trait]
impl GigStore for MemoryStore {
    async fn gig_with_id(&self, id: i64) -> GigoResult<Option<Gig>> {
        let tables = self.tables.lock().await;
        Ok(tables.gigs.iter().find(|gig| gig.id == id).cloned())
    }

    async fn gigs_for_band(&self, band: i64) -> GigoResult<Vec<Gig>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .gigs
            .iter()
            .filter(|gig| gig.band == band)
            .cloned()
            .collect())
    }

    async fn insert_gig(&self, new_gig: NewGig) -> GigoResult<Gig> {
        let mut tables = self.tables.lock().await;
        let gig = new_gig.with_id(tables.next_id());
        tables.gigs.push(gig.clone());

        Ok(gig)
    }

    async fn update_gig(&self, id: i64, gig: &NewGig) -> GigoResult<()> {
        let mut tables = self.tables.lock().await;
        let existing = tables
            .gigs
            .iter_mut()
            .find(|existing| existing.id == id)
            .ok_or_else(|| GigoError::not_found(format!("gig {}", id)))?;
        *existing = NewGig {
            band: existing.band,
            created_date: existing.created_date,
            ..gig.clone()
        }
        .with_id(id);

        Ok(())
    }
}

#[async_trait]
impl PlanStore for MemoryStore {
    async fn plan_with_id(&self, id: i64) -> GigoResult<Option<Plan>> {
        let tables = self.tables.lock().await;
        Ok(tables.plans.iter().find(|plan| plan.id == id).cloned())
    }

    async fn plans_for_gig(&self, gig: i64) -> GigoResult<Vec<Plan>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .plans
            .iter()
            .filter(|plan| plan.gig == gig)
            .cloned()
            .collect())
    }

    async fn save_plan(&self, plan: &Plan) -> GigoResult<()> {
        let mut tables = self.tables.lock().await;
        let existing = tables
            .plans
            .iter_mut()
            .find(|existing| existing.id == plan.id)
            .ok_or_else(|| GigoError::not_found(format!("plan {}", plan.id)))?;
        *existing = plan.clone();

        Ok(())
    }

    async fn update_plans_default_section(&self, assoc: i64, section: i64) -> GigoResult<u64> {
        let mut tables = self.tables.lock().await;
        let mut updated = 0;
        for plan in tables
            .plans
            .iter_mut()
            .filter(|plan| plan.assoc == assoc && plan.plan_section.is_none())
        {
            plan.section = Some(section);
            updated += 1;
        }

        Ok(updated)
    }
}
