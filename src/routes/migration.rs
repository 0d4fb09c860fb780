//! Pages for superusers to import data from the previous version of the site.

use askama::Template;
use axum::extract::{Extension, Form};
use axum::response::Html;
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;

use crate::error::{GigoError, GigoResult};
use crate::extract::SuperUser;
use crate::migration::band::migrate_roster;
use crate::migration::gig::import_gigs;
use crate::migration::MigrationLog;
use crate::state::AppState;

const GIG_FORM_URL: &str = "/migration/gig";

pub fn routes() -> Router {
    Router::new()
        .route("/migration/band", get(band_form))
        .route("/migration/band/go", post(migrate_band))
        .route("/migration/gig", get(gig_form))
        .route("/migration/gig/go", post(migrate_gigs))
}

#[derive(Template, Default)]
#[template(path = "migration/band-form.html")]
struct BandMigrationPage {
    errors: Vec<String>,
    paste: String,
    timezone: String,
}

#[derive(Template, Default)]
#[template(path = "migration/gig-form.html")]
struct GigMigrationPage {
    errors: Vec<String>,
    paste: String,
    band_id: String,
}

#[derive(Template)]
#[template(path = "migration/results.html")]
struct MigrationResults {
    migration_messages: MigrationLog,
    return_to: &'static str,
}

#[derive(Deserialize)]
struct BandMigrationForm {
    #[serde(default)]
    paste: String,
    #[serde(default)]
    timezone: String,
}

#[derive(Deserialize)]
struct GigMigrationForm {
    #[serde(default)]
    paste: String,
    #[serde(default)]
    band_id: String,
}

/// What to tell the superuser about a failed import, if it was their input's fault.
fn form_error(error: GigoError) -> GigoResult<String> {
    match error {
        GigoError::Validation(reason) => Ok(reason),
        GigoError::Parse(reason) => Ok(format!("Couldn't read the timestamp in {}", reason)),
        GigoError::UnknownTimezone(timezone) => Ok(format!("Unknown timezone {}", timezone)),
        GigoError::NotFound(what) => Ok(format!("No {} exists", what)),
        other => Err(other),
    }
}

fn render_results(migration_messages: MigrationLog) -> GigoResult<Html<String>> {
    let results = MigrationResults {
        migration_messages,
        return_to: GIG_FORM_URL,
    };

    Ok(Html(results.render()?))
}

async fn band_form(SuperUser(_user): SuperUser) -> GigoResult<Html<String>> {
    Ok(Html(BandMigrationPage::default().render()?))
}

async fn migrate_band(
    SuperUser(user): SuperUser,
    Extension(state): Extension<AppState>,
    Form(form): Form<BandMigrationForm>,
) -> GigoResult<Html<String>> {
    let mut errors = Vec::new();
    if form.paste.trim().is_empty() {
        errors.push("Paste the exported roster".to_owned());
    }
    if form.timezone.trim().is_empty() {
        errors.push("Choose a timezone for new bands".to_owned());
    }

    if errors.is_empty() {
        tracing::info!(superuser = %user.email, "running band migration");
        match migrate_roster(
            &form.paste,
            form.timezone.trim(),
            state.store.as_ref(),
            state.tasks.as_ref(),
        )
        .await
        {
            Ok(log) => return render_results(log),
            Err(error) => errors.push(form_error(error)?),
        }
    }

    let page = BandMigrationPage {
        errors,
        paste: form.paste,
        timezone: form.timezone,
    };
    Ok(Html(page.render()?))
}

async fn gig_form(SuperUser(_user): SuperUser) -> GigoResult<Html<String>> {
    Ok(Html(GigMigrationPage::default().render()?))
}

async fn migrate_gigs(
    SuperUser(user): SuperUser,
    Extension(state): Extension<AppState>,
    Form(form): Form<GigMigrationForm>,
) -> GigoResult<Html<String>> {
    let mut errors = Vec::new();
    if form.paste.trim().is_empty() {
        errors.push("Paste the exported gigs".to_owned());
    }
    let band_id = form.band_id.trim().parse::<i64>().ok();
    if band_id.is_none() {
        errors.push(format!("`{}` is not a band ID", form.band_id));
    }

    if let (true, Some(band_id)) = (errors.is_empty(), band_id) {
        tracing::info!(superuser = %user.email, band = band_id, "running gig migration");
        match import_gigs(&form.paste, band_id, state.store.as_ref()).await {
            Ok(log) => return render_results(log),
            Err(error) => errors.push(form_error(error)?),
        }
    }

    let page = GigMigrationPage {
        errors,
        paste: form.paste,
        band_id: form.band_id,
    };
    Ok(Html(page.render()?))
}
