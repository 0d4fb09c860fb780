use askama::Template;

use crate::email::{Email, EmailAddress};
use crate::models::band::Band;
use crate::models::member::Member;

/// Welcomes a member brought over from the old site and asks them to set a password
#[derive(Template)]
#[template(path = "email/migrated-member.html")]
pub struct MigratedMemberEmail<'a> {
    pub member: &'a Member,
    pub band: &'a Band,
    pub reset_url: String,
}

impl<'a> Email for MigratedMemberEmail<'a> {
    fn subject(&self) -> String {
        format!("{} has moved to the new Gig-o-Matic", self.band.name)
    }

    fn address(&self) -> EmailAddress {
        EmailAddress {
            name: self.member.display_name().to_owned(),
            address: self.member.email.clone(),
        }
    }
}
