//! Bringing over a band's gigs from a JSON export.

use serde::Deserialize;
use time::OffsetDateTime;

use crate::db::Store;
use crate::error::{GigoError, GigoResult};
use crate::migration::MigrationLog;
use crate::models::band::Band;
use crate::models::gig::NewGig;
use crate::timestamp::localize_legacy_timestamp;

#[derive(Deserialize)]
pub struct GigRecord {
    pub fields: GigFields,
}

/// A gig as the old site exported it, with its times in the band's wall-clock time
#[derive(Deserialize, Debug)]
pub struct GigFields {
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
    pub date: String,
    pub setdate: Option<String>,
    pub enddate: Option<String>,
    pub created_date: String,
}

impl GigFields {
    pub fn into_new_gig(self, band: &Band) -> GigoResult<NewGig> {
        let localize = |timestamp: &str| localize_legacy_timestamp(timestamp, &band.timezone);
        let localize_opt = |timestamp: Option<&str>| -> GigoResult<Option<OffsetDateTime>> {
            timestamp.map(localize).transpose()
        };

        Ok(NewGig {
            band: band.id,
            date: localize(&self.date)?,
            setdate: localize_opt(self.setdate.as_deref())?,
            enddate: localize_opt(self.enddate.as_deref())?,
            created_date: localize(&self.created_date)?,
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
            contact: None,
        })
    }
}

/// Creates a gig for `band_id` from every exported record.
///
/// Every record is read before any gig is saved. Importing the same export
/// twice makes two copies of each gig.
pub async fn import_gigs(paste: &str, band_id: i64, store: &dyn Store) -> GigoResult<MigrationLog> {
    let band = Band::with_id(band_id, store).await?;
    let records: Vec<GigRecord> = serde_json::from_str(paste)
        .map_err(|err| GigoError::Validation(format!("invalid gig export: {}", err)))?;

    let new_gigs = records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            record.fields.into_new_gig(&band).map_err(|err| match err {
                GigoError::Parse(reason) => {
                    GigoError::Parse(format!("record {}: {}", index + 1, reason))
                }
                other => other,
            })
        })
        .collect::<GigoResult<Vec<_>>>()?;

    let mut log = MigrationLog::new();
    for new_gig in new_gigs {
        let gig = store.insert_gig(new_gig).await?;
        log.push(format!("Imported {}", gig.title));
    }
    tracing::info!(band = band.id, gigs = log.len(), "imported gigs");

    Ok(log)
}
