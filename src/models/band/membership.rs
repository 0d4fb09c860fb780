//! Events raised when a member's standing in a band changes.

use std::sync::Arc;

use async_trait::async_trait;

use crate::db::Store;
use crate::error::{GigoError, GigoResult};
use crate::models::band::{Assoc, Section};
use crate::models::member::Member;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MembershipEvent {
    /// The section a member usually plays in was changed.
    DefaultSectionChanged { assoc: i64, section: i64 },
}

#[async_trait]
pub trait MembershipListener: Send + Sync {
    async fn handle(&self, event: &MembershipEvent, store: &dyn Store) -> GigoResult<()>;
}

/// Delivers membership events to every registered listener, in registration order.
#[derive(Default, Clone)]
pub struct EventBus {
    listeners: Vec<Arc<dyn MembershipListener>>,
}

impl EventBus {
    pub fn with_listener(mut self, listener: Arc<dyn MembershipListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    pub async fn publish(&self, event: MembershipEvent, store: &dyn Store) -> GigoResult<()> {
        tracing::debug!(?event, "publishing membership event");
        for listener in &self.listeners {
            listener.handle(&event, store).await?;
        }

        Ok(())
    }
}

impl Assoc {
    /// Members may change their own membership; band admins and superusers anyone's.
    pub async fn ensure_editable_by(&self, member: &Member, store: &dyn Store) -> GigoResult<()> {
        if member.is_superuser || member.id == self.member {
            return Ok(());
        }

        match store.assoc_for_member_in_band(self.band, member.id).await? {
            Some(own) if own.is_admin => Ok(()),
            _ => Err(GigoError::Forbidden(format!(
                "{} may not change the membership of member {}",
                member.email, self.member
            ))),
        }
    }

    pub async fn set_default_section(
        assoc_id: i64,
        section_id: i64,
        store: &dyn Store,
        events: &EventBus,
    ) -> GigoResult<()> {
        let assoc = Assoc::with_id(assoc_id, store).await?;
        let section = Section::with_id(section_id, store).await?;
        if section.band != assoc.band {
            return Err(GigoError::Validation(format!(
                "section {} does not belong to band {}",
                section.id, assoc.band
            )));
        }

        store.set_assoc_default_section(assoc.id, section.id).await?;
        events
            .publish(
                MembershipEvent::DefaultSectionChanged {
                    assoc: assoc.id,
                    section: section.id,
                },
                store,
            )
            .await
    }
}
