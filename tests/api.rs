use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use time::macros::datetime;
use time::Duration;
use tower::ServiceExt;

use gigo::config::Config;
use gigo::db::memory::MemoryStore;
use gigo::db::{BandStore, GigStore, MemberStore, PlanStore};
use gigo::models::band::membership::EventBus;
use gigo::models::band::{Assoc, AssocStatus, Band, NewAssoc};
use gigo::models::gig::{Gig, GigInput};
use gigo::models::member::{Member, NewMember};
use gigo::models::plan::{PlanSectionListener, PlanStatus};
use gigo::models::DateTime;
use gigo::routes::app;
use gigo::state::AppState;
use gigo::tasks::{Job, RecordingTaskQueue};
use gigo::util::current_time;

const ADMIN_TOKEN: &str = "admin-token";
const PLAYER_TOKEN: &str = "player-token";

struct TestApp {
    router: Router,
    store: Arc<MemoryStore>,
    tasks: Arc<RecordingTaskQueue>,
}

async fn member(store: &MemoryStore, email: &str, token: &str) -> Member {
    let (member, _) = store
        .get_or_create_member(NewMember {
            email: email.to_owned(),
            username: email.split('@').next().unwrap().to_owned(),
            go2_id: None,
        })
        .await
        .unwrap();
    store.add_session(token, member.id).await;
    member
}

async fn test_app() -> TestApp {
    let store = Arc::new(MemoryStore::default());
    let admin = member(&store, "root@gigs.example.com", ADMIN_TOKEN).await;
    store.make_superuser(admin.id).await;
    member(&store, "player@x.com", PLAYER_TOKEN).await;

    let tasks = Arc::new(RecordingTaskQueue::default());
    let state = AppState {
        store: store.clone(),
        tasks: tasks.clone(),
        events: Arc::new(EventBus::default().with_listener(Arc::new(PlanSectionListener))),
        config: Arc::new(Config::local("https://gigs.example.com")),
    };

    TestApp {
        router: app(state),
        store,
        tasks,
    }
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, String) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = hyper::body::to_bytes(response.into_body()).await.unwrap();

    (status, String::from_utf8(body.to_vec()).unwrap())
}

async fn post_form(
    router: &Router,
    uri: &str,
    token: Option<&str>,
    fields: &[(&str, &str)],
) -> (StatusCode, String) {
    let mut request = Request::post(uri).header("content-type", "application/x-www-form-urlencoded");
    if let Some(token) = token {
        request = request.header("GIGO_TOKEN", token);
    }

    let body = serde_urlencoded::to_string(fields).unwrap();

    send(router, request.body(Body::from(body)).unwrap()).await
}

async fn graphql(router: &Router, token: &str, query: &str) -> Value {
    let request = Request::post("/")
        .header("content-type", "application/json")
        .header("GIGO_TOKEN", token)
        .body(Body::from(json!({ "query": query }).to_string()))
        .unwrap();
    let (status, body) = send(router, request).await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    serde_json::from_str(&body).unwrap()
}

struct SeededGig {
    band: Band,
    assoc: Assoc,
    gig: Gig,
}

async fn seed_gig(store: &MemoryStore, member: &Member, days_out: i64) -> SeededGig {
    let (band, _) = store
        .get_or_create_band("Brass Band", "America/Chicago")
        .await
        .unwrap();
    let (section, _) = store.get_or_create_section(band.id, "Trumpets").await.unwrap();
    let (assoc, _) = store
        .get_or_create_assoc(NewAssoc {
            band: band.id,
            member: member.id,
            is_admin: false,
            is_occasional: false,
            status: AssocStatus::Confirmed,
            default_section: Some(section.id),
        })
        .await
        .unwrap();
    let input = GigInput {
        title: "Parade".to_owned(),
        details: None,
        setlist: None,
        address: None,
        dress: None,
        paid: false,
        postgig: None,
        is_private: false,
        is_archived: false,
        invite_occasionals: true,
        hide_from_calendar: false,
        rss_description: None,
        default_to_attending: false,
        contact: None,
        date: DateTime(current_time() + Duration::days(days_out)),
        setdate: None,
        enddate: None,
    };
    let gig = store
        .insert_gig(input.into_new_gig(band.id, current_time()))
        .await
        .unwrap();

    SeededGig { band, assoc, gig }
}

const ROSTER: &str = "band\temail\tmember\tobject ID\tsection\tis_admin\tis_occasional\n\
                      bandX\talice@x.com\tAlice\t123\tHorns\ttrue\tfalse\n";

#[tokio::test]
async fn band_migration_reports_what_it_did() {
    let app = test_app().await;

    let (status, body) = post_form(
        &app.router,
        "/migration/band/go",
        Some(ADMIN_TOKEN),
        &[("paste", ROSTER), ("timezone", "America/New_York")],
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Created new band bandX"), "{}", body);
    assert!(
        body.contains("Associated Alice (alice@x.com) with bandX - Horns as band admin"),
        "{}",
        body
    );
    assert_eq!(app.tasks.jobs().len(), 1);
    assert!(matches!(
        app.tasks.jobs()[0],
        Job::MigratedMemberPasswordReset { .. }
    ));

    let (_, body) = post_form(
        &app.router,
        "/migration/band/go",
        Some(ADMIN_TOKEN),
        &[("paste", ROSTER), ("timezone", "America/New_York")],
    )
    .await;
    assert!(body.contains("already present in bandX; skipping."), "{}", body);
    assert_eq!(app.tasks.jobs().len(), 1);
}

#[tokio::test]
async fn migration_pages_are_for_superusers() {
    let app = test_app().await;

    let (status, _) = send(
        &app.router,
        Request::get("/migration/band").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = post_form(
        &app.router,
        "/migration/band/go",
        Some(PLAYER_TOKEN),
        &[("paste", ROSTER), ("timezone", "America/New_York")],
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(app.store.counts().await.bands, 0);

    let (status, body) = send(
        &app.router,
        Request::get("/migration/gig")
            .header("GIGO_TOKEN", ADMIN_TOKEN)
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("name=\"band_id\""));
}

#[tokio::test]
async fn bad_migration_input_redisplays_the_form() {
    let app = test_app().await;

    let (status, body) = post_form(
        &app.router,
        "/migration/band/go",
        Some(ADMIN_TOKEN),
        &[("paste", ROSTER), ("timezone", "Mars/Base")],
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Unknown timezone Mars"), "{}", body);
    assert!(body.contains("alice@x.com"));
    assert_eq!(app.store.counts().await.bands, 0);

    let (status, body) = post_form(
        &app.router,
        "/migration/gig/go",
        Some(ADMIN_TOKEN),
        &[("paste", "[]"), ("band_id", "nope")],
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("is not a band ID"), "{}", body);
}

#[tokio::test]
async fn gig_migration_imports_into_the_band() {
    let app = test_app().await;
    let (band, _) = app
        .store
        .get_or_create_band("Brass Band", "America/New_York")
        .await
        .unwrap();
    let paste = json!([{
        "fields": {
            "title": "Parade",
            "details": null,
            "setlist": null,
            "address": null,
            "dress": null,
            "paid": false,
            "postgig": null,
            "is_private": false,
            "is_archived": false,
            "invite_occasionals": true,
            "was_reminded": false,
            "hide_from_calendar": false,
            "rss_description": null,
            "default_to_attending": false,
            "date": "2020-01-01T19:00:00+00:00",
            "setdate": null,
            "enddate": null,
            "created_date": "2019-12-01T10:00:00+00:00"
        }
    }])
    .to_string();

    let (status, body) = post_form(
        &app.router,
        "/migration/gig/go",
        Some(ADMIN_TOKEN),
        &[("paste", &paste), ("band_id", &band.id.to_string())],
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Imported Parade"), "{}", body);
    let gigs = app.store.gigs_for_band(band.id).await.unwrap();
    assert_eq!(gigs[0].date, datetime!(2020-01-01 19:00 -5));
}

#[tokio::test]
async fn plan_fields_are_updated_one_at_a_time() {
    let app = test_app().await;
    let player = Member::with_token(PLAYER_TOKEN, app.store.as_ref()).await.unwrap();
    let seeded = seed_gig(&app.store, &player, 10).await;
    let plan = app.store.create_plan(seeded.gig.id, &seeded.assoc).await;
    let (horns, _) = app
        .store
        .get_or_create_section(seeded.band.id, "Horns")
        .await
        .unwrap();

    for (uri, fields) in [
        (format!("/plan/{}/update/3", plan.id), vec![]),
        (format!("/plan/{}/feedback/2", plan.id), vec![]),
        (
            format!("/plan/{}/comment", plan.id),
            vec![("value", "running late & bringing the tuba ♪")],
        ),
        (format!("/plan/{}/section/{}", plan.id, horns.id), vec![]),
    ] {
        let (status, body) = post_form(&app.router, &uri, Some(PLAYER_TOKEN), &fields).await;
        assert_eq!(status, StatusCode::OK, "{}: {}", uri, body);
    }

    let plan = app.store.plan_with_id(plan.id).await.unwrap().unwrap();
    assert_eq!(plan.status, PlanStatus::DontKnow);
    assert!(plan.snooze_until.is_some());
    assert_eq!(plan.feedback_value, Some(2));
    assert_eq!(plan.comment.as_deref(), Some("running late & bringing the tuba ♪"));
    assert_eq!(plan.plan_section, Some(horns.id));
}

#[tokio::test]
async fn plan_updates_need_a_session_and_a_real_plan() {
    let app = test_app().await;
    let player = Member::with_token(PLAYER_TOKEN, app.store.as_ref()).await.unwrap();
    let seeded = seed_gig(&app.store, &player, 10).await;
    let plan = app.store.create_plan(seeded.gig.id, &seeded.assoc).await;

    let uri = format!("/plan/{}/update/1", plan.id);
    let (status, _) = post_form(&app.router, &uri, None, &[]).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = post_form(&app.router, "/plan/9999/update/1", Some(PLAYER_TOKEN), &[]).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["statusCode"], 404);

    let uri = format!("/plan/{}/update/9", plan.id);
    let (status, _) = post_form(&app.router, &uri, Some(PLAYER_TOKEN), &[]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let uri = format!("/plan/{}/section/9999", plan.id);
    let (status, _) = post_form(&app.router, &uri, Some(PLAYER_TOKEN), &[]).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (other_band, _) = app
        .store
        .get_or_create_band("Other Band", "UTC")
        .await
        .unwrap();
    let (fiddles, _) = app
        .store
        .get_or_create_section(other_band.id, "Fiddles")
        .await
        .unwrap();
    let uri = format!("/plan/{}/section/{}", plan.id, fiddles.id);
    let (status, _) = post_form(&app.router, &uri, Some(PLAYER_TOKEN), &[]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn answer_links_work_without_logging_in() {
    let app = test_app().await;
    let player = Member::with_token(PLAYER_TOKEN, app.store.as_ref()).await.unwrap();
    let seeded = seed_gig(&app.store, &player, 5).await;
    let plan = app.store.create_plan(seeded.gig.id, &seeded.assoc).await;

    let (status, body) = send(
        &app.router,
        Request::get(format!("/plan/{}/answer/3", plan.id))
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Parade"), "{}", body);
    let plan = app.store.plan_with_id(plan.id).await.unwrap().unwrap();
    assert_eq!(plan.status, PlanStatus::DontKnow);
    assert_eq!(plan.snooze_until, Some(seeded.gig.date - Duration::days(2)));
}

#[tokio::test]
async fn graphql_knows_who_is_asking() {
    let app = test_app().await;

    let response = graphql(&app.router, PLAYER_TOKEN, "{ user { email username } }").await;

    assert_eq!(response["data"]["user"]["email"], "player@x.com");
    assert_eq!(response["data"]["user"]["username"], "player");
}

#[tokio::test]
async fn graphql_gig_creation_is_permission_checked() {
    let app = test_app().await;
    let player = Member::with_token(PLAYER_TOKEN, app.store.as_ref()).await.unwrap();
    let seeded = seed_gig(&app.store, &player, 10).await;
    let mutation = format!(
        r#"mutation {{
            createGig(bandId: {}, newGig: {{ title: "Jam", date: "2030-06-01T19:00:00-05:00" }}) {{
                id title
            }}
        }}"#,
        seeded.band.id
    );

    let response = graphql(&app.router, PLAYER_TOKEN, &mutation).await;
    assert_eq!(response["errors"][0]["extensions"]["statusCode"], 403);

    let response = graphql(&app.router, ADMIN_TOKEN, &mutation).await;
    assert_eq!(response["data"]["createGig"]["title"], "Jam");
    assert_eq!(app.store.gigs_for_band(seeded.band.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn graphql_queues_gig_emails_for_confirmed_members() {
    let app = test_app().await;
    let player = Member::with_token(PLAYER_TOKEN, app.store.as_ref()).await.unwrap();
    let seeded = seed_gig(&app.store, &player, 10).await;
    app.store.create_plan(seeded.gig.id, &seeded.assoc).await;

    let mutation = format!(
        "mutation {{ sendGigEmails(gigId: {}, kind: REMINDER) }}",
        seeded.gig.id
    );
    let response = graphql(&app.router, ADMIN_TOKEN, &mutation).await;

    assert_eq!(response["data"]["sendGigEmails"], 1, "{}", response);
    match &app.tasks.jobs()[..] {
        [Job::SendEmails(messages)] => {
            assert_eq!(messages[0].to.address, "player@x.com");
            assert!(messages[0].body.contains("https://gigs.example.com/plan/"));
        }
        jobs => panic!("unexpected jobs {:?}", jobs),
    }
}
