use async_trait::async_trait;
use sqlx::PgPool;

use crate::db::{BandStore, GigStore, MemberStore, PlanStore};
use crate::error::GigoResult;
use crate::models::band::{Assoc, Band, NewAssoc, Section};
use crate::models::gig::{Gig, NewGig};
use crate::models::member::{Member, NewMember};
use crate::models::plan::Plan;

const BAND_FIELDS: &str = "id, name, timezone, anyone_can_create_gigs";
const MEMBER_FIELDS: &str = "id, email, username, go2_id, is_superuser";
const SECTION_FIELDS: &str = "id, band, name";
const ASSOC_FIELDS: &str =
    "id, band, member, is_admin, is_occasional, status, default_section, email_me";
const GIG_FIELDS: &str = "id, band, title, details, setlist, address, dress, paid, postgig,
    is_private, is_archived, invite_occasionals, was_reminded, hide_from_calendar,
    rss_description, default_to_attending, contact, date, setdate, enddate, created_date";
const PLAN_FIELDS: &str =
    "id, gig, assoc, status, feedback_value, comment, section, plan_section, snooze_until";

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BandStore for PgStore {
    async fn band_with_id(&self, id: i64) -> GigoResult<Option<Band>> {
        sqlx::query_as(&format!("SELECT {} FROM band WHERE id = $1", BAND_FIELDS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Into::into)
    }

    async fn get_or_create_band(&self, name: &str, timezone: &str) -> GigoResult<(Band, bool)> {
        let created: Option<Band> = sqlx::query_as(&format!(
            "INSERT INTO band (name, timezone) VALUES ($1, $2)
             ON CONFLICT (name) DO NOTHING RETURNING {}",
            BAND_FIELDS
        ))
        .bind(name)
        .bind(timezone)
        .fetch_optional(&self.pool)
        .await?;
        if let Some(band) = created {
            return Ok((band, true));
        }

        let band = sqlx::query_as(&format!("SELECT {} FROM band WHERE name = $1", BAND_FIELDS))
            .bind(name)
            .fetch_one(&self.pool)
            .await?;

        Ok((band, false))
    }

    async fn section_with_id(&self, id: i64) -> GigoResult<Option<Section>> {
        sqlx::query_as(&format!("SELECT {} FROM section WHERE id = $1", SECTION_FIELDS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Into::into)
    }

    async fn sections_for_band(&self, band: i64) -> GigoResult<Vec<Section>> {
        sqlx::query_as(&format!(
            "SELECT {} FROM section WHERE band = $1 ORDER BY name",
            SECTION_FIELDS
        ))
        .bind(band)
        .fetch_all(&self.pool)
        .await
        .map_err(Into::into)
    }

    async fn get_or_create_section(&self, band: i64, name: &str) -> GigoResult<(Section, bool)> {
        let created: Option<Section> = sqlx::query_as(&format!(
            "INSERT INTO section (band, name) VALUES ($1, $2)
             ON CONFLICT (band, name) DO NOTHING RETURNING {}",
            SECTION_FIELDS
        ))
        .bind(band)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        if let Some(section) = created {
            return Ok((section, true));
        }

        let section = sqlx::query_as(&format!(
            "SELECT {} FROM section WHERE band = $1 AND name = $2",
            SECTION_FIELDS
        ))
        .bind(band)
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Ok((section, false))
    }

    async fn assoc_with_id(&self, id: i64) -> GigoResult<Option<Assoc>> {
        sqlx::query_as(&format!("SELECT {} FROM assoc WHERE id = $1", ASSOC_FIELDS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Into::into)
    }

    async fn assoc_for_member_in_band(&self, band: i64, member: i64) -> GigoResult<Option<Assoc>> {
        sqlx::query_as(&format!(
            "SELECT {} FROM assoc WHERE band = $1 AND member = $2",
            ASSOC_FIELDS
        ))
        .bind(band)
        .bind(member)
        .fetch_optional(&self.pool)
        .await
        .map_err(Into::into)
    }

    async fn get_or_create_assoc(&self, new_assoc: NewAssoc) -> GigoResult<(Assoc, bool)> {
        let created: Option<Assoc> = sqlx::query_as(&format!(
            "INSERT INTO assoc (band, member, is_admin, is_occasional, status, default_section)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (band, member) DO NOTHING RETURNING {}",
            ASSOC_FIELDS
        ))
        .bind(new_assoc.band)
        .bind(new_assoc.member)
        .bind(new_assoc.is_admin)
        .bind(new_assoc.is_occasional)
        .bind(new_assoc.status)
        .bind(new_assoc.default_section)
        .fetch_optional(&self.pool)
        .await?;
        if let Some(assoc) = created {
            return Ok((assoc, true));
        }

        let assoc = sqlx::query_as(&format!(
            "SELECT {} FROM assoc WHERE band = $1 AND member = $2",
            ASSOC_FIELDS
        ))
        .bind(new_assoc.band)
        .bind(new_assoc.member)
        .fetch_one(&self.pool)
        .await?;

        Ok((assoc, false))
    }

    async fn set_assoc_default_section(&self, assoc: i64, section: i64) -> GigoResult<()> {
        sqlx::query("UPDATE assoc SET default_section = $1 WHERE id = $2")
            .bind(section)
            .bind(assoc)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl MemberStore for PgStore {
    async fn member_with_id(&self, id: i64) -> GigoResult<Option<Member>> {
        sqlx::query_as(&format!("SELECT {} FROM member WHERE id = $1", MEMBER_FIELDS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Into::into)
    }

    async fn get_or_create_member(&self, new_member: NewMember) -> GigoResult<(Member, bool)> {
        let created: Option<Member> = sqlx::query_as(&format!(
            "INSERT INTO member (email, username, go2_id) VALUES ($1, $2, $3)
             ON CONFLICT (email) DO NOTHING RETURNING {}",
            MEMBER_FIELDS
        ))
        .bind(&new_member.email)
        .bind(&new_member.username)
        .bind(&new_member.go2_id)
        .fetch_optional(&self.pool)
        .await?;
        if let Some(member) = created {
            return Ok((member, true));
        }

        let member = sqlx::query_as(&format!(
            "SELECT {} FROM member WHERE email = $1",
            MEMBER_FIELDS
        ))
        .bind(&new_member.email)
        .fetch_one(&self.pool)
        .await?;

        Ok((member, false))
    }

    async fn member_for_session(&self, token: &str) -> GigoResult<Option<Member>> {
        sqlx::query_as(&format!(
            "SELECT {} FROM member WHERE id = (SELECT member FROM session WHERE key = $1)",
            MEMBER_FIELDS
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(Into::into)
    }

    async fn create_password_reset(&self, member: i64, token: &str) -> GigoResult<()> {
        sqlx::query("DELETE FROM password_reset WHERE member = $1")
            .bind(member)
            .execute(&self.pool)
            .await?;
        sqlx::query("INSERT INTO password_reset (member, token) VALUES ($1, $2)")
            .bind(member)
            .bind(token)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl GigStore for PgStore {
    async fn gig_with_id(&self, id: i64) -> GigoResult<Option<Gig>> {
        sqlx::query_as(&format!("SELECT {} FROM gig WHERE id = $1", GIG_FIELDS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Into::into)
    }

    async fn gigs_for_band(&self, band: i64) -> GigoResult<Vec<Gig>> {
        sqlx::query_as(&format!(
            "SELECT {} FROM gig WHERE band = $1 ORDER BY date",
            GIG_FIELDS
        ))
        .bind(band)
        .fetch_all(&self.pool)
        .await
        .map_err(Into::into)
    }

    async fn insert_gig(&self, new_gig: NewGig) -> GigoResult<Gig> {
        sqlx::query_as(&format!(
            "INSERT INTO gig (
                band, title, details, setlist, address, dress, paid, postgig,
                is_private, is_archived, invite_occasionals, was_reminded, hide_from_calendar,
                rss_description, default_to_attending, contact, date, setdate, enddate, created_date)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                 $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
             RETURNING {}",
            GIG_FIELDS
        ))
        .bind(new_gig.band)
        .bind(&new_gig.title)
        .bind(&new_gig.details)
        .bind(&new_gig.setlist)
        .bind(&new_gig.address)
        .bind(&new_gig.dress)
        .bind(new_gig.paid)
        .bind(&new_gig.postgig)
        .bind(new_gig.is_private)
        .bind(new_gig.is_archived)
        .bind(new_gig.invite_occasionals)
        .bind(new_gig.was_reminded)
        .bind(new_gig.hide_from_calendar)
        .bind(&new_gig.rss_description)
        .bind(new_gig.default_to_attending)
        .bind(new_gig.contact)
        .bind(new_gig.date)
        .bind(new_gig.setdate)
        .bind(new_gig.enddate)
        .bind(new_gig.created_date)
        .fetch_one(&self.pool)
        .await
        .map_err(Into::into)
    }

    async fn update_gig(&self, id: i64, gig: &NewGig) -> GigoResult<()> {
        sqlx::query(
            "UPDATE gig SET
                title = $1, details = $2, setlist = $3, address = $4, dress = $5, paid = $6,
                postgig = $7, is_private = $8, is_archived = $9, invite_occasionals = $10,
                was_reminded = $11, hide_from_calendar = $12, rss_description = $13,
                default_to_attending = $14, contact = $15, date = $16, setdate = $17,
                enddate = $18
             WHERE id = $19",
        )
        .bind(&gig.title)
        .bind(&gig.details)
        .bind(&gig.setlist)
        .bind(&gig.address)
        .bind(&gig.dress)
        .bind(gig.paid)
        .bind(&gig.postgig)
        .bind(gig.is_private)
        .bind(gig.is_archived)
        .bind(gig.invite_occasionals)
        .bind(gig.was_reminded)
        .bind(gig.hide_from_calendar)
        .bind(&gig.rss_description)
        .bind(gig.default_to_attending)
        .bind(gig.contact)
        .bind(gig.date)
        .bind(gig.setdate)
        .bind(gig.enddate)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl PlanStore for PgStore {
    async fn plan_with_id(&self, id: i64) -> GigoResult<Option<Plan>> {
        sqlx::query_as(&format!("SELECT {} FROM plan WHERE id = $1", PLAN_FIELDS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Into::into)
    }

    async fn plans_for_gig(&self, gig: i64) -> GigoResult<Vec<Plan>> {
        sqlx::query_as(&format!(
            "SELECT {} FROM plan WHERE gig = $1 ORDER BY id",
            PLAN_FIELDS
        ))
        .bind(gig)
        .fetch_all(&self.pool)
        .await
        .map_err(Into::into)
    }

    async fn save_plan(&self, plan: &Plan) -> GigoResult<()> {
        sqlx::query(
            "UPDATE plan SET
                status = $1, feedback_value = $2, comment = $3, section = $4,
                plan_section = $5, snooze_until = $6
             WHERE id = $7",
        )
        .bind(plan.status)
        .bind(plan.feedback_value)
        .bind(&plan.comment)
        .bind(plan.section)
        .bind(plan.plan_section)
        .bind(plan.snooze_until)
        .bind(plan.id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_plans_default_section(&self, assoc: i64, section: i64) -> GigoResult<u64> {
        let result =
            sqlx::query("UPDATE plan SET section = $1 WHERE assoc = $2 AND plan_section IS NULL")
                .bind(section)
                .bind(assoc)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected())
    }
}
