//! Bringing over a band's roster from a tab-separated export.

use serde::Deserialize;

use crate::db::Store;
use crate::error::{GigoError, GigoResult};
use crate::migration::MigrationLog;
use crate::models::band::{AssocStatus, NewAssoc, Section};
use crate::models::member::NewMember;
use crate::tasks::{Job, TaskQueue};
use crate::timestamp::parse_timezone;

#[derive(Deserialize)]
struct RosterRow {
    band: String,
    email: String,
    member: String,
    #[serde(rename = "object ID")]
    object_id: String,
    section: Option<String>,
    is_admin: String,
    is_occasional: String,
}

/// One validated line of a roster export
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RosterEntry {
    pub band: String,
    pub email: String,
    pub username: String,
    pub go2_id: String,
    pub section: String,
    pub is_admin: bool,
    pub is_occasional: bool,
}

/// Reads every row of the export, failing on the first malformed one.
///
/// Rows are numbered from 1, not counting the header.
pub fn parse_roster(paste: &str) -> GigoResult<Vec<RosterEntry>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .from_reader(paste.as_bytes());

    reader
        .deserialize::<RosterRow>()
        .enumerate()
        .map(|(index, row)| {
            let number = index + 1;
            let row = row.map_err(|err| GigoError::Validation(format!("row {}: {}", number, err)))?;

            Ok(RosterEntry {
                is_admin: parse_flag(&row.is_admin, "is_admin", number)?,
                is_occasional: parse_flag(&row.is_occasional, "is_occasional", number)?,
                section: Section::imported_name(row.section.as_deref()).to_owned(),
                band: row.band,
                email: row.email,
                username: row.member,
                go2_id: row.object_id,
            })
        })
        .collect()
}

fn parse_flag(text: &str, column: &str, row: usize) -> GigoResult<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(GigoError::Validation(format!(
            "row {}: `{}` must be true or false, not `{}`",
            row, column, text
        ))),
    }
}

/// Creates whatever bands, members, sections and memberships the roster needs.
///
/// New bands are put in `timezone`; existing records are left untouched. Nothing
/// is written unless every row is valid.
pub async fn migrate_roster(
    paste: &str,
    timezone: &str,
    store: &dyn Store,
    tasks: &dyn TaskQueue,
) -> GigoResult<MigrationLog> {
    parse_timezone(timezone)?;
    let entries = parse_roster(paste)?;

    let mut log = MigrationLog::new();
    for entry in &entries {
        migrate_entry(entry, timezone, store, tasks, &mut log).await?;
    }
    tracing::info!(rows = entries.len(), "migrated band roster");

    Ok(log)
}

async fn migrate_entry(
    entry: &RosterEntry,
    timezone: &str,
    store: &dyn Store,
    tasks: &dyn TaskQueue,
    log: &mut MigrationLog,
) -> GigoResult<()> {
    let (band, band_created) = store.get_or_create_band(&entry.band, timezone).await?;
    if band_created {
        log.push(format!("Created new band {}", band.name));
    }

    let (member, member_created) = store
        .get_or_create_member(NewMember {
            email: entry.email.clone(),
            username: entry.username.clone(),
            go2_id: Some(entry.go2_id.clone()),
        })
        .await?;
    if member_created {
        tasks.submit(Job::MigratedMemberPasswordReset {
            band: band.id,
            member: member.id,
        })?;
    }

    let (section, _) = store.get_or_create_section(band.id, &entry.section).await?;
    let (_, assoc_created) = store
        .get_or_create_assoc(NewAssoc {
            band: band.id,
            member: member.id,
            is_admin: entry.is_admin,
            is_occasional: entry.is_occasional,
            status: AssocStatus::Confirmed,
            default_section: Some(section.id),
        })
        .await?;

    if assoc_created {
        let mut line = format!(
            "Associated {} ({}) with {} - {}",
            member.username, member.email, band.name, section.name
        );
        if entry.is_admin {
            line.push_str(" as band admin");
        }
        log.push(line);
    } else {
        log.push(format!(
            "{} ({}) already present in {}; skipping.",
            member.username, member.email, band.name
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::{MemoryStore, RecordCounts};
    use crate::db::{BandStore, MemberStore};
    use crate::models::band::NO_SECTION;
    use crate::tasks::RecordingTaskQueue;

    const HEADER: &str = "band\temail\tmember\tobject ID\tsection\tis_admin\tis_occasional\n";

    fn roster(rows: &[&str]) -> String {
        let mut paste = HEADER.to_owned();
        for row in rows {
            paste.push_str(row);
            paste.push('\n');
        }
        paste
    }

    #[tokio::test]
    async fn new_band_and_admin_are_created() {
        let store = MemoryStore::default();
        let tasks = RecordingTaskQueue::default();
        let paste = roster(&["bandX\talice@x.com\tAlice\t123\tHorns\ttrue\tfalse"]);

        let log = migrate_roster(&paste, "America/New_York", &store, &tasks)
            .await
            .unwrap();

        assert_eq!(
            log,
            vec![
                "Created new band bandX".to_owned(),
                "Associated Alice (alice@x.com) with bandX - Horns as band admin".to_owned(),
            ]
        );

        let (band, created) = store
            .get_or_create_band("bandX", "Europe/Paris")
            .await
            .unwrap();
        assert!(!created);
        assert_eq!(band.timezone, "America/New_York");

        let (member, _) = store
            .get_or_create_member(NewMember {
                email: "alice@x.com".to_owned(),
                username: "someone else".to_owned(),
                go2_id: None,
            })
            .await
            .unwrap();
        assert_eq!(member.username, "Alice");
        assert_eq!(member.go2_id.as_deref(), Some("123"));

        let assoc = store
            .assoc_for_member_in_band(band.id, member.id)
            .await
            .unwrap()
            .unwrap();
        assert!(assoc.is_admin);
        assert!(!assoc.is_occasional);
        assert_eq!(assoc.status, AssocStatus::Confirmed);

        assert_eq!(
            tasks.jobs(),
            vec![Job::MigratedMemberPasswordReset {
                band: band.id,
                member: member.id
            }]
        );
    }

    #[tokio::test]
    async fn running_twice_changes_nothing() {
        let store = MemoryStore::default();
        let tasks = RecordingTaskQueue::default();
        let paste = roster(&[
            "bandX\talice@x.com\tAlice\t123\tHorns\ttrue\tfalse",
            "bandX\tbob@x.com\tBob\t456\t\tfalse\tTRUE",
        ]);

        migrate_roster(&paste, "America/New_York", &store, &tasks)
            .await
            .unwrap();
        let counts = store.counts().await;
        let log = migrate_roster(&paste, "America/New_York", &store, &tasks)
            .await
            .unwrap();

        assert_eq!(
            log,
            vec![
                "Alice (alice@x.com) already present in bandX; skipping.".to_owned(),
                "Bob (bob@x.com) already present in bandX; skipping.".to_owned(),
            ]
        );
        assert_eq!(store.counts().await, counts);
        assert_eq!(
            counts,
            RecordCounts {
                bands: 1,
                members: 2,
                sections: 2,
                assocs: 2,
                gigs: 0,
            }
        );
        assert_eq!(tasks.jobs().len(), 2);
    }

    #[tokio::test]
    async fn members_without_a_section_land_in_no_section() {
        let store = MemoryStore::default();
        let tasks = RecordingTaskQueue::default();
        let paste = roster(&[
            "bandX\tbob@x.com\tBob\t456\t\tfalse\tfalse",
            "bandX\tcarol@x.com\tCarol\t789\tNone\tfalse\tfalse",
        ]);

        let log = migrate_roster(&paste, "America/New_York", &store, &tasks)
            .await
            .unwrap();

        assert_eq!(
            log[1],
            format!("Associated Bob (bob@x.com) with bandX - {}", NO_SECTION)
        );
        assert_eq!(
            log[2],
            format!("Associated Carol (carol@x.com) with bandX - {}", NO_SECTION)
        );
        assert_eq!(store.counts().await.sections, 1);
    }

    #[tokio::test]
    async fn bad_flags_abort_before_anything_is_written() {
        let store = MemoryStore::default();
        let tasks = RecordingTaskQueue::default();
        let paste = roster(&[
            "bandX\talice@x.com\tAlice\t123\tHorns\ttrue\tfalse",
            "bandX\tbob@x.com\tBob\t456\tHorns\tyes\tfalse",
        ]);

        let error = migrate_roster(&paste, "America/New_York", &store, &tasks)
            .await
            .unwrap_err();

        match error {
            GigoError::Validation(reason) => {
                assert!(reason.starts_with("row 2:"), "{}", reason);
                assert!(reason.contains("is_admin"), "{}", reason);
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(store.counts().await.bands, 0);
        assert!(tasks.jobs().is_empty());
    }

    #[tokio::test]
    async fn unknown_timezones_are_rejected() {
        let store = MemoryStore::default();
        let tasks = RecordingTaskQueue::default();
        let paste = roster(&["bandX\talice@x.com\tAlice\t123\tHorns\ttrue\tfalse"]);

        let error = migrate_roster(&paste, "Mars/Olympus_Mons", &store, &tasks)
            .await
            .unwrap_err();

        assert!(matches!(error, GigoError::UnknownTimezone(_)));
        assert_eq!(store.counts().await.bands, 0);
    }

    #[test]
    fn missing_columns_name_the_row() {
        let paste = "band\temail\tmember\nbandX\talice@x.com\tAlice\n";

        let error = parse_roster(paste).unwrap_err();
        assert!(matches!(error, GigoError::Validation(reason) if reason.starts_with("row 1:")));
    }

    #[test]
    fn flags_ignore_case() {
        let entries =
            parse_roster(&roster(&["bandX\talice@x.com\tAlice\t123\tHorns\tTrue\tFALSE"])).unwrap();

        assert!(entries[0].is_admin);
        assert!(!entries[0].is_occasional);
    }

    #[tokio::test]
    async fn concurrent_runs_share_one_band() {
        let store = MemoryStore::default();
        let tasks = RecordingTaskQueue::default();
        let first = roster(&["bandX\talice@x.com\tAlice\t123\tHorns\ttrue\tfalse"]);
        let second = roster(&["bandX\tbob@x.com\tBob\t456\tHorns\tfalse\tfalse"]);

        let (first_log, second_log) = tokio::join!(
            migrate_roster(&first, "America/New_York", &store, &tasks),
            migrate_roster(&second, "America/New_York", &store, &tasks),
        );
        let created = first_log
            .unwrap()
            .into_iter()
            .chain(second_log.unwrap())
            .filter(|line| line == "Created new band bandX")
            .count();

        assert_eq!(created, 1);
        assert_eq!(store.counts().await.bands, 1);
        assert_eq!(store.counts().await.sections, 1);
    }
}
