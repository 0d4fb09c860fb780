use async_graphql::{ComplexObject, Context, Enum, Result, SimpleObject};

use crate::db::Store;
use crate::error::{GigoError, GigoResult};
use crate::models::member::Member;
use crate::state::AppState;

pub mod membership;

/// The name given to a band's catch-all section
pub const NO_SECTION: &str = "No Section";

#[derive(SimpleObject, sqlx::FromRow, Clone, Debug, PartialEq)]
#[graphql(complex)]
pub struct Band {
    /// The ID of the band
    pub id: i64,
    /// The name of the band
    pub name: String,
    /// The IANA name of the timezone the band plays in
    pub timezone: String,
    /// Whether members that aren't admins can create gigs
    pub anyone_can_create_gigs: bool,
}

#[ComplexObject]
impl Band {
    /// The sections of the band
    pub async fn sections(&self, ctx: &Context<'_>) -> Result<Vec<Section>> {
        let state: &AppState = ctx.data_unchecked();
        Ok(state.store.sections_for_band(self.id).await?)
    }
}

impl Band {
    pub async fn with_id(id: i64, store: &dyn Store) -> GigoResult<Self> {
        store
            .band_with_id(id)
            .await?
            .ok_or_else(|| GigoError::not_found(format!("band {}", id)))
    }

    /// Whether the member can create and edit gigs for this band.
    pub async fn allows_gig_editing_by(&self, member: &Member, store: &dyn Store) -> GigoResult<bool> {
        if member.is_superuser || self.anyone_can_create_gigs {
            return Ok(true);
        }

        Ok(store
            .assoc_for_member_in_band(self.id, member.id)
            .await?
            .map(|assoc| assoc.is_admin)
            .unwrap_or(false))
    }

    pub async fn ensure_gig_editing_by(&self, member: &Member, store: &dyn Store) -> GigoResult<()> {
        if self.allows_gig_editing_by(member, store).await? {
            Ok(())
        } else {
            Err(GigoError::Forbidden(format!(
                "{} may not create or edit gigs for {}",
                member.email, self.name
            )))
        }
    }
}

#[derive(SimpleObject, sqlx::FromRow, Clone, Debug, PartialEq)]
pub struct Section {
    /// The ID of the section
    pub id: i64,
    /// The band the section belongs to
    pub band: i64,
    /// The name of the section
    pub name: String,
}

impl Section {
    pub async fn with_id(id: i64, store: &dyn Store) -> GigoResult<Self> {
        store
            .section_with_id(id)
            .await?
            .ok_or_else(|| GigoError::not_found(format!("section {}", id)))
    }

    /// The section to file a legacy member under; blank and "None" mean none was set.
    pub fn imported_name(raw: Option<&str>) -> &str {
        match raw {
            Some(name) if !name.is_empty() && name != "None" => name,
            _ => NO_SECTION,
        }
    }
}

/// Where a member stands with a band
#[derive(Clone, Copy, Debug, PartialEq, Eq, Enum, sqlx::Type)]
#[repr(i32)]
pub enum AssocStatus {
    NotConfirmed = 0,
    Confirmed = 1,
    Invited = 2,
    Alumni = 3,
    Pending = 4,
}

/// A member's membership in a band
#[derive(SimpleObject, sqlx::FromRow, Clone, Debug, PartialEq)]
pub struct Assoc {
    /// The ID of the association
    pub id: i64,
    pub band: i64,
    pub member: i64,
    /// Whether the member administers the band
    pub is_admin: bool,
    /// Whether the member only plays some of the time
    pub is_occasional: bool,
    pub status: AssocStatus,
    /// The section the member usually plays in
    pub default_section: Option<i64>,
    /// Whether the member wants emails about the band's gigs
    pub email_me: bool,
}

#[derive(Clone, Debug)]
pub struct NewAssoc {
    pub band: i64,
    pub member: i64,
    pub is_admin: bool,
    pub is_occasional: bool,
    pub status: AssocStatus,
    pub default_section: Option<i64>,
}

impl Assoc {
    pub async fn with_id(id: i64, store: &dyn Store) -> GigoResult<Self> {
        store
            .assoc_with_id(id)
            .await?
            .ok_or_else(|| GigoError::not_found(format!("association {}", id)))
    }

    pub fn is_contactable(&self) -> bool {
        self.status == AssocStatus::Confirmed && self.email_me
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;
    use crate::db::{BandStore, MemberStore};
    use crate::tests::mock::mock_new_member;

    #[test]
    fn blank_and_none_sections_fall_back() {
        assert_eq!(Section::imported_name(None), NO_SECTION);
        assert_eq!(Section::imported_name(Some("")), NO_SECTION);
        assert_eq!(Section::imported_name(Some("None")), NO_SECTION);
        assert_eq!(Section::imported_name(Some("Horns")), "Horns");
    }

    #[tokio::test]
    async fn only_admins_may_edit_gigs_of_closed_bands() {
        let store = MemoryStore::default();
        let (band, _) = store.get_or_create_band("Closed", "UTC").await.unwrap();
        let (admin, _) = store.get_or_create_member(mock_new_member("admin@x.com")).await.unwrap();
        let (player, _) = store.get_or_create_member(mock_new_member("player@x.com")).await.unwrap();

        for (member, is_admin) in [(&admin, true), (&player, false)] {
            store
                .get_or_create_assoc(NewAssoc {
                    band: band.id,
                    member: member.id,
                    is_admin,
                    is_occasional: false,
                    status: AssocStatus::Confirmed,
                    default_section: None,
                })
                .await
                .unwrap();
        }

        assert!(band.ensure_gig_editing_by(&admin, &store).await.is_ok());
        let error = band.ensure_gig_editing_by(&player, &store).await.unwrap_err();
        assert!(matches!(error, GigoError::Forbidden(_)));
    }
}
