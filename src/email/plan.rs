//! Emails asking members whether they can make a gig.

use askama::Template;
use async_graphql::Enum;
use time::format_description::FormatItem;
use time::macros::format_description;

use crate::db::Store;
use crate::email::{Email, EmailAddress, EmailMessage};
use crate::error::{GigoError, GigoResult};
use crate::models::band::{Assoc, Band};
use crate::models::gig::{Gig, UNKNOWN_CONTACT_NAME};
use crate::models::member::Member;
use crate::models::plan::{Plan, PlanStatus};
use crate::tasks::{Job, TaskQueue};
use crate::timestamp::to_local_time;

const WHEN_FORMAT: &[FormatItem<'static>] = format_description!(
    "[weekday], [month repr:long] [day padding:none], [year] at [hour repr:12 padding:none]:[minute] [period]"
);

/// Which gig email to send
#[derive(Enum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum GigEmailKind {
    NewGig,
    EditedGig,
    Reminder,
}

impl GigEmailKind {
    pub fn heading(self) -> &'static str {
        match self {
            GigEmailKind::NewGig => "New Gig",
            GigEmailKind::EditedGig => "Edited Gig",
            GigEmailKind::Reminder => "Reminder",
        }
    }
}

/// Links that answer a plan straight from the email
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfirmUrls {
    pub yes_url: String,
    pub no_url: String,
    pub snooze_url: String,
}

pub fn confirm_urls(base_url: &str, plan: &Plan) -> ConfirmUrls {
    let answer = |status: PlanStatus| {
        format!("{}/plan/{}/answer/{}", base_url, plan.id, status.value())
    };

    ConfirmUrls {
        yes_url: answer(PlanStatus::Definitely),
        no_url: answer(PlanStatus::CantDoIt),
        snooze_url: answer(PlanStatus::DontKnow),
    }
}

#[derive(Template)]
#[template(path = "email/gig-plan.html")]
pub struct GigPlanEmail<'a> {
    pub kind: GigEmailKind,
    pub gig: &'a Gig,
    pub member: &'a Member,
    /// The gig's start, written out in the band's timezone
    pub when: String,
    pub contact_name: String,
    pub contact_email: Option<String>,
    pub urls: ConfirmUrls,
}

impl<'a> Email for GigPlanEmail<'a> {
    fn subject(&self) -> String {
        format!("{}: {}", self.kind.heading(), self.gig.title)
    }

    fn address(&self) -> EmailAddress {
        EmailAddress {
            name: self.member.display_name().to_owned(),
            address: self.member.email.clone(),
        }
    }

    fn reply_to(&self) -> Option<String> {
        self.contact_email.clone()
    }
}

/// The plans whose members are confirmed in the band and want email.
pub async fn contactable_plans(
    plans: Vec<Plan>,
    store: &dyn Store,
) -> GigoResult<Vec<(Plan, Assoc)>> {
    let mut contactable = Vec::new();
    for plan in plans {
        let assoc = Assoc::with_id(plan.assoc, store).await?;
        if assoc.is_contactable() {
            contactable.push((plan, assoc));
        }
    }

    Ok(contactable)
}

pub async fn email_from_plan(
    plan: &Plan,
    assoc: &Assoc,
    kind: GigEmailKind,
    base_url: &str,
    store: &dyn Store,
) -> GigoResult<EmailMessage> {
    let gig = Gig::with_id(plan.gig, store).await?;
    let band = Band::with_id(gig.band, store).await?;
    let member = Member::with_id(assoc.member, store).await?;
    let (contact_name, contact_email) = match gig.contact_member(store).await? {
        Some(contact) => (contact.display_name().to_owned(), Some(contact.email)),
        None => (UNKNOWN_CONTACT_NAME.to_owned(), None),
    };
    let when = to_local_time(gig.date, &band.timezone)?
        .format(WHEN_FORMAT)
        .map_err(|err| GigoError::Parse(format!("gig {} date: {}", gig.id, err)))?;

    GigPlanEmail {
        kind,
        gig: &gig,
        member: &member,
        when,
        contact_name,
        contact_email,
        urls: confirm_urls(base_url, plan),
    }
    .compose()
}

/// Queues one email per contactable plan as a single batch, returning how many were queued.
pub async fn send_emails_from_plans(
    plans: Vec<Plan>,
    kind: GigEmailKind,
    base_url: &str,
    store: &dyn Store,
    tasks: &dyn TaskQueue,
) -> GigoResult<usize> {
    let mut messages = Vec::new();
    for (plan, assoc) in contactable_plans(plans, store).await? {
        messages.push(email_from_plan(&plan, &assoc, kind, base_url, store).await?);
    }

    let count = messages.len();
    if count > 0 {
        tasks.submit(Job::SendEmails(messages))?;
    }
    tracing::info!(count, ?kind, "queued gig emails");

    Ok(count)
}
