use async_graphql::SimpleObject;
use uuid::Uuid;

use crate::db::Store;
use crate::error::{GigoError, GigoResult};
use crate::util::current_time;

#[derive(SimpleObject, sqlx::FromRow, Clone, Debug, PartialEq)]
pub struct Member {
    /// The ID of the member
    pub id: i64,
    /// The member's email, which must be unique
    pub email: String,
    /// The name the member goes by
    pub username: String,
    /// The member's ID on the previous version of the site, if they were migrated
    pub go2_id: Option<String>,
    /// Whether the member administers the whole site
    pub is_superuser: bool,
}

#[derive(Clone, Debug)]
pub struct NewMember {
    pub email: String,
    pub username: String,
    pub go2_id: Option<String>,
}

impl Member {
    pub async fn with_id(id: i64, store: &dyn Store) -> GigoResult<Self> {
        store
            .member_with_id(id)
            .await?
            .ok_or_else(|| GigoError::not_found(format!("member {}", id)))
    }

    pub async fn with_token(token: &str, store: &dyn Store) -> GigoResult<Self> {
        store
            .member_for_session(token)
            .await?
            .ok_or(GigoError::Unauthorized)
    }

    pub fn display_name(&self) -> &str {
        &self.username
    }

    pub fn ensure_superuser(&self) -> GigoResult<()> {
        if self.is_superuser {
            Ok(())
        } else {
            Err(GigoError::Forbidden(format!(
                "{} is not a site administrator",
                self.email
            )))
        }
    }
}

pub struct PasswordReset;

impl PasswordReset {
    /// Generates and stores a one-time token for the member to set their password with.
    ///
    /// The creation time is kept in the token so that stale tokens can be rejected.
    pub async fn generate(member_id: i64, store: &dyn Store) -> GigoResult<String> {
        let token = format!("{}X{}", Uuid::new_v4(), current_time().unix_timestamp());
        store.create_password_reset(member_id, &token).await?;

        Ok(token)
    }
}
