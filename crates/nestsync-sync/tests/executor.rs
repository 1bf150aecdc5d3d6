//! End-to-end executor tests: a real Postgres (via `sqlx::test`) behind the
//! store, and a `wiremock` server standing in for the Graph API.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use nestsync_core::SyncMode;
use nestsync_db::{AccountInsightRow, DemographicsRow, PostInsightRow, ProfileRow};
use nestsync_meta::{MetaClient, MetaError, RateLimiter};
use nestsync_sync::{
    CredentialError, CredentialSource, ExecutorOptions, JobExecutor, PlatformAccounts, Stage,
    StageError, SyncError, TenantCredentials,
};
use serde_json::{json, Value};
use sqlx::PgPool;
use wiremock::matchers::{any, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TENANT: &str = "tenant-acme";
const IG: &str = "17841400000000001";
const AD: &str = "555000";

#[derive(Clone)]
struct StaticCredentials {
    credentials: Option<TenantCredentials>,
    calls: Arc<AtomicUsize>,
}

impl StaticCredentials {
    fn with_accounts(accounts: PlatformAccounts) -> Self {
        Self {
            credentials: Some(TenantCredentials {
                access_token: "test-token".to_owned(),
                token_expired: false,
                accounts,
            }),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn instagram_only() -> Self {
        Self::with_accounts(PlatformAccounts {
            instagram_business_account_id: Some(IG.to_owned()),
            ..PlatformAccounts::default()
        })
    }

    fn with_ads() -> Self {
        Self::with_accounts(PlatformAccounts {
            instagram_business_account_id: Some(IG.to_owned()),
            facebook_page_id: Some("page-1".to_owned()),
            ad_account_id: Some(AD.to_owned()),
        })
    }

    fn missing() -> Self {
        Self {
            credentials: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl CredentialSource for StaticCredentials {
    async fn resolve(
        &self,
        tenant_id: &str,
        _platform: &str,
    ) -> Result<TenantCredentials, CredentialError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.credentials
            .clone()
            .ok_or_else(|| CredentialError::Unavailable {
                tenant_id: tenant_id.to_owned(),
                reason: "no token on record".to_owned(),
            })
    }
}

fn executor(
    pool: &PgPool,
    server: &MockServer,
    credentials: StaticCredentials,
) -> JobExecutor<StaticCredentials> {
    executor_with_client(pool, client(server), credentials)
}

fn client(server: &MockServer) -> MetaClient {
    MetaClient::with_base_url(&server.uri(), 5, RateLimiter::new(100, 4))
        .expect("failed to build client")
}

fn executor_with_client(
    pool: &PgPool,
    client: MetaClient,
    credentials: StaticCredentials,
) -> JobExecutor<StaticCredentials> {
    JobExecutor::new(pool.clone(), client, credentials, ExecutorOptions::default())
}

fn media(id: &str, media_type: &str) -> Value {
    let timestamp = Utc::now().format("%Y-%m-%dT%H:%M:%S%z").to_string();
    json!({
        "id": id,
        "caption": format!("caption for {id}"),
        "media_type": media_type,
        "media_product_type": "FEED",
        "permalink": format!("https://instagram.com/p/{id}"),
        "timestamp": timestamp,
        "like_count": 10,
        "comments_count": 2
    })
}

fn post_insights_body() -> Value {
    json!({"data": [
        {"name": "reach", "period": "lifetime", "values": [{"value": 500}]},
        {"name": "saved", "period": "lifetime", "values": [{"value": 12}]},
        {"name": "total_interactions", "period": "lifetime", "values": [{"value": 40}]},
        {"name": "views", "period": "lifetime", "values": [{"value": 900}]}
    ]})
}

async fn mount_profile(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(format!("/{IG}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": IG,
            "username": "acme",
            "name": "Acme Co",
            "followers_count": 1200,
            "follows_count": 80,
            "media_count": 2
        })))
        .mount(server)
        .await;
}

async fn mount_media(server: &MockServer, items: Vec<Value>) {
    Mock::given(method("GET"))
        .and(path(format!("/{IG}/media")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": items})))
        .mount(server)
        .await;
}

/// Post ids in these tests all start with `p`; campaign ids with `c`.
async fn mount_post_insights(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path_regex(r"^/p[A-Za-z0-9_]*/insights$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(post_insights_body()))
        .mount(server)
        .await;
}

async fn mount_account_insights(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(format!("/{IG}/insights")))
        .and(query_param("metric", "reach,profile_views"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [
            {
                "name": "reach",
                "period": "day",
                "values": [
                    {"value": 300, "end_time": "2026-10-01T07:00:00+0000"},
                    {"value": 320, "end_time": "2026-10-02T07:00:00+0000"}
                ]
            },
            {
                "name": "profile_views",
                "period": "day",
                "total_value": {"value": 45}
            }
        ]})))
        .mount(server)
        .await;
}

async fn mount_demographics(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(format!("/{IG}/insights")))
        .and(query_param("metric", "follower_demographics"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [{
            "name": "follower_demographics",
            "period": "lifetime",
            "total_value": {"breakdowns": [
                {"dimension_keys": ["gender"], "results": [{"dimension_values": ["F"], "value": 600}]},
                {"dimension_keys": ["age"], "results": [{"dimension_values": ["25-34"], "value": 410}]},
                {"dimension_keys": ["country"], "results": [{"dimension_values": ["US"], "value": 700}]}
            ]}
        }]})))
        .mount(server)
        .await;
}

async fn mount_instagram(server: &MockServer, items: Vec<Value>) {
    mount_profile(server).await;
    mount_media(server, items).await;
    mount_post_insights(server).await;
    mount_account_insights(server).await;
    mount_demographics(server).await;
}

async fn table_count(pool: &PgPool, table: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .expect("count query failed")
}

#[sqlx::test(migrations = "../../migrations")]
async fn backfill_end_to_end(pool: PgPool) {
    let server = MockServer::start().await;
    mount_instagram(&server, vec![media("p1", "IMAGE"), media("p2", "VIDEO")]).await;

    let credentials = StaticCredentials::instagram_only();
    let calls = Arc::clone(&credentials.calls);
    let report = executor(&pool, &server, credentials)
        .execute(TENANT)
        .await
        .expect("backfill failed");

    assert!(report.success);
    assert_eq!(report.mode, SyncMode::Backfill);
    assert_eq!(report.stats.profiles, 1);
    assert_eq!(report.stats.follower_samples, 1);
    assert_eq!(report.stats.posts, 2);
    assert_eq!(report.stats.enrichment_jobs, 2);
    assert_eq!(report.stats.post_insights, 2);
    assert_eq!(report.stats.demographics, 1);
    assert_eq!(report.stats.skipped_rows, 0);
    assert!(!report.stats.posts_truncated);
    assert_eq!(
        report.stats.skipped_stages,
        vec![Stage::Campaigns, Stage::CampaignInsights]
    );
    assert_eq!(calls.load(Ordering::SeqCst), 1, "credentials resolved once");

    assert_eq!(nestsync_db::count_posts(&pool, TENANT).await.unwrap(), 2);
    assert_eq!(
        nestsync_db::count_enrichment_jobs(&pool, TENANT).await.unwrap(),
        2
    );

    let profile = nestsync_db::get_profile(&pool, TENANT, IG)
        .await
        .unwrap()
        .expect("profile row");
    assert_eq!(profile.followers_count, 1200);

    let status = nestsync_db::get_sync_status(&pool, TENANT)
        .await
        .unwrap()
        .expect("status row");
    assert!(status.backfill_completed);
    assert!(status.backfill_completed_at.is_some());
    assert!(status.backfill_error.is_none());
    let stats = status.last_run_stats.expect("stats recorded").0;
    assert_eq!(stats["posts"], json!(2));
}

#[sqlx::test(migrations = "../../migrations")]
async fn post_metrics_follow_media_type(pool: PgPool) {
    let server = MockServer::start().await;
    mount_instagram(&server, vec![media("p1", "IMAGE"), media("p2", "VIDEO")]).await;

    executor(&pool, &server, StaticCredentials::instagram_only())
        .execute(TENANT)
        .await
        .expect("backfill failed");

    let today = Utc::now().date_naive();
    let video = nestsync_db::get_post_insight(&pool, "p2", today)
        .await
        .unwrap()
        .expect("video insight");
    assert_eq!(video.views, 900);
    assert_eq!(video.reach, 500);

    // The mock answers with views for every post; stills must not store it.
    let image = nestsync_db::get_post_insight(&pool, "p1", today)
        .await
        .unwrap()
        .expect("image insight");
    assert_eq!(image.views, 0);
    assert_eq!(image.reach, 500);
    assert_eq!(image.saved, 12);
    assert_eq!(image.total_interactions, 40);
}

#[sqlx::test(migrations = "../../migrations")]
async fn demographics_prefer_age_segment(pool: PgPool) {
    let server = MockServer::start().await;
    mount_instagram(&server, vec![media("p1", "IMAGE")]).await;

    executor(&pool, &server, StaticCredentials::instagram_only())
        .execute(TENANT)
        .await
        .expect("backfill failed");

    let row = nestsync_db::get_demographics(&pool, TENANT, IG, Utc::now().date_naive())
        .await
        .unwrap()
        .expect("demographics row");
    let age_gender = row.age_gender.expect("age_gender slot").0;
    assert_eq!(age_gender[0]["dimension_values"], json!(["25-34"]));
    assert!(row.country.is_some());
    assert!(row.city.is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn account_insights_store_daily_rows(pool: PgPool) {
    let server = MockServer::start().await;
    mount_instagram(&server, vec![]).await;

    executor(&pool, &server, StaticCredentials::instagram_only())
        .execute(TENANT)
        .await
        .expect("backfill failed");

    let rows = nestsync_db::list_account_insights(&pool, TENANT).await.unwrap();
    let day = |d: &str| rows.iter().find(|r| r.date.to_string() == d);
    assert_eq!(day("2026-10-01").map(|r| r.reach), Some(300));
    assert_eq!(day("2026-10-02").map(|r| r.reach), Some(320));
    assert!(rows.iter().all(|r| r.follower_count == 1200));
    assert!(rows.iter().any(|r| r.profile_views == 45));
}

type PostValues = (String, Option<String>, String, i64, i64, Option<DateTime<Utc>>);

/// Stored values a re-run must leave unchanged. `updated_at` is excluded.
#[derive(Debug, PartialEq)]
struct StoredState {
    posts: Vec<PostValues>,
    post_insights: Vec<Option<PostInsightRow>>,
    profile: Option<ProfileRow>,
    account_insights: Vec<AccountInsightRow>,
    demographics: Option<DemographicsRow>,
    enrichment_jobs: i64,
}

async fn stored_state(pool: &PgPool) -> StoredState {
    let today = Utc::now().date_naive();
    let posts: Vec<PostValues> = sqlx::query_as(
        "SELECT id, caption, media_type, like_count, comments_count, timestamp \
         FROM instagram_posts WHERE client_id = $1 ORDER BY id",
    )
    .bind(TENANT)
    .fetch_all(pool)
    .await
    .expect("read posts");

    let mut post_insights = Vec::new();
    for post_id in ["p1", "p2"] {
        post_insights.push(
            nestsync_db::get_post_insight(pool, post_id, today)
                .await
                .expect("read post insight"),
        );
    }

    let profile = nestsync_db::get_profile(pool, TENANT, IG)
        .await
        .expect("read profile")
        .map(|mut row| {
            row.updated_at = DateTime::<Utc>::UNIX_EPOCH;
            row
        });

    StoredState {
        posts,
        post_insights,
        profile,
        account_insights: nestsync_db::list_account_insights(pool, TENANT)
            .await
            .expect("read account insights"),
        demographics: nestsync_db::get_demographics(pool, TENANT, IG, today)
            .await
            .expect("read demographics"),
        enrichment_jobs: nestsync_db::count_enrichment_jobs(pool, TENANT)
            .await
            .expect("count jobs"),
    }
}

#[sqlx::test(migrations = "../../migrations")]
async fn rerun_is_idempotent(pool: PgPool) {
    let server = MockServer::start().await;
    mount_instagram(&server, vec![media("p1", "IMAGE"), media("p2", "VIDEO")]).await;
    let executor = executor(&pool, &server, StaticCredentials::instagram_only());

    executor.execute(TENANT).await.expect("first run failed");
    let after_first = stored_state(&pool).await;
    let counts_first = [
        table_count(&pool, "instagram_posts").await,
        table_count(&pool, "instagram_post_insights").await,
        table_count(&pool, "instagram_account_insights").await,
        table_count(&pool, "instagram_audience_demographics").await,
        table_count(&pool, "instagram_follower_history").await,
    ];

    let second = executor.execute(TENANT).await.expect("second run failed");
    let after_second = stored_state(&pool).await;
    let counts_second = [
        table_count(&pool, "instagram_posts").await,
        table_count(&pool, "instagram_post_insights").await,
        table_count(&pool, "instagram_account_insights").await,
        table_count(&pool, "instagram_audience_demographics").await,
        table_count(&pool, "instagram_follower_history").await,
    ];

    assert_eq!(second.stats.enrichment_jobs, 0, "no duplicate jobs");
    assert_eq!(second.stats.follower_samples, 0, "one sample per day");
    assert_eq!(counts_second, counts_first);
    assert_eq!(after_second, after_first);

    assert_eq!(after_first.posts.len(), 2);
    assert_eq!(after_first.enrichment_jobs, 2);
    assert!(after_first.post_insights.iter().all(Option::is_some));
    assert!(after_first.profile.is_some());
    assert!(after_first.demographics.is_some());
    assert!(!after_first.account_insights.is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
async fn failing_post_insight_is_skipped(pool: PgPool) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pB/insights"))
        .respond_with(
            ResponseTemplate::new(400).set_body_string(r#"{"error":{"message":"unsupported"}}"#),
        )
        .with_priority(1)
        .mount(&server)
        .await;
    mount_instagram(
        &server,
        vec![media("pA", "IMAGE"), media("pB", "IMAGE"), media("pC", "VIDEO")],
    )
    .await;

    let report = executor(&pool, &server, StaticCredentials::instagram_only())
        .execute(TENANT)
        .await
        .expect("one bad post must not fail the run");

    assert!(report.success);
    assert_eq!(report.stats.post_insights, 2);
    assert_eq!(report.stats.skipped_rows, 1);

    let today = Utc::now().date_naive();
    assert!(nestsync_db::get_post_insight(&pool, "pA", today)
        .await
        .unwrap()
        .is_some());
    assert!(nestsync_db::get_post_insight(&pool, "pB", today)
        .await
        .unwrap()
        .is_none());
    assert!(nestsync_db::get_post_insight(&pool, "pC", today)
        .await
        .unwrap()
        .is_some());

    let status = nestsync_db::get_sync_status(&pool, TENANT)
        .await
        .unwrap()
        .expect("status row");
    assert!(status.backfill_completed);
}

#[sqlx::test(migrations = "../../migrations")]
async fn carousel_children_are_stored(pool: PgPool) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pCarousel/children"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [
            {"id": "child-1", "media_type": "IMAGE", "media_url": "https://cdn/1.jpg"},
            {"id": "child-2", "media_type": "VIDEO", "media_url": "https://cdn/2.mp4"}
        ]})))
        .expect(1)
        .mount(&server)
        .await;
    mount_instagram(
        &server,
        vec![media("pCarousel", "CAROUSEL_ALBUM"), media("p1", "IMAGE")],
    )
    .await;

    let report = executor(&pool, &server, StaticCredentials::instagram_only())
        .execute(TENANT)
        .await
        .expect("backfill failed");

    assert_eq!(report.stats.carousel_children, 2);
    let children = nestsync_db::list_post_children(&pool, "pCarousel")
        .await
        .unwrap();
    assert_eq!(children.len(), 2);
    assert!(children.iter().all(|c| c.client_id == TENANT));
}

#[sqlx::test(migrations = "../../migrations")]
async fn missing_credentials_fail_before_any_call(pool: PgPool) {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let err = executor(&pool, &server, StaticCredentials::missing())
        .execute(TENANT)
        .await
        .expect_err("run must fail without credentials");

    assert!(
        matches!(err, SyncError::CredentialUnavailable { ref tenant_id, .. } if tenant_id == TENANT),
        "got {err:?}"
    );
    assert_eq!(nestsync_db::count_posts(&pool, TENANT).await.unwrap(), 0);

    let status = nestsync_db::get_sync_status(&pool, TENANT)
        .await
        .unwrap()
        .expect("status row");
    assert!(!status.backfill_completed);
    assert!(status.backfill_started_at.is_some());
    assert!(status
        .backfill_error
        .as_deref()
        .is_some_and(|e| e.contains(TENANT)));
}

#[sqlx::test(migrations = "../../migrations")]
async fn coarse_stage_failure_aborts_run(pool: PgPool) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/{IG}")))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/{IG}/media")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(0)
        .mount(&server)
        .await;

    let err = executor(&pool, &server, StaticCredentials::instagram_only())
        .execute(TENANT)
        .await
        .expect_err("profile failure must abort");

    match &err {
        SyncError::BackfillFailed {
            stage: Stage::Profile,
            cause: StageError::Upstream(MetaError::Upstream { status, body, .. }),
        } => {
            assert_eq!(*status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("expected profile upstream failure, got {other:?}"),
    }
    assert_eq!(err.stage(), Some(Stage::Profile));

    let status = nestsync_db::get_sync_status(&pool, TENANT)
        .await
        .unwrap()
        .expect("status row");
    assert!(!status.backfill_completed);
    assert!(status.backfill_error.is_some());
}

#[sqlx::test(migrations = "../../migrations")]
async fn missing_instagram_account_is_fatal(pool: PgPool) {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let credentials = StaticCredentials::with_accounts(PlatformAccounts {
        ad_account_id: Some(AD.to_owned()),
        ..PlatformAccounts::default()
    });
    let err = executor(&pool, &server, credentials)
        .execute(TENANT)
        .await
        .expect_err("no instagram account");

    assert!(
        matches!(
            err,
            SyncError::BackfillFailed {
                stage: Stage::Profile,
                cause: StageError::MissingAccount { .. },
            }
        ),
        "got {err:?}"
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn expired_token_runs_until_upstream_rejects(pool: PgPool) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/{IG}")))
        .respond_with(ResponseTemplate::new(400).set_body_string("session has expired"))
        .expect(1)
        .mount(&server)
        .await;

    let mut credentials = StaticCredentials::instagram_only();
    if let Some(creds) = credentials.credentials.as_mut() {
        creds.token_expired = true;
    }
    let err = executor(&pool, &server, credentials)
        .execute(TENANT)
        .await
        .expect_err("upstream rejects the token");

    assert!(matches!(
        err,
        SyncError::BackfillFailed {
            stage: Stage::Profile,
            cause: StageError::Upstream(MetaError::Upstream { status: 400, .. }),
        }
    ));
}

async fn mount_campaigns(server: &MockServer, window: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/act_{AD}/campaigns")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [
            {"id": "c1", "name": "Spring", "objective": "OUTCOME_SALES", "status": "ACTIVE",
             "daily_budget": "5000"},
            {"id": "c2", "name": "Summer", "objective": "OUTCOME_TRAFFIC", "status": "PAUSED"}
        ]})))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/c1/insights"))
        .and(query_param("date_preset", window))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [
            {"date_start": "2026-10-01", "date_stop": "2026-10-01", "spend": "12.50",
             "impressions": "1000", "reach": "800", "clicks": "40", "cpc": "0.31",
             "cpm": "12.5", "ctr": "4.0",
             "actions": [
                {"action_type": "offsite_conversion.fb_pixel_purchase", "value": "3"},
                {"action_type": "link_click", "value": "40"}
             ]},
            {"date_start": "2026-10-02", "date_stop": "2026-10-02", "spend": "8",
             "impressions": "700", "reach": "600", "clicks": "21", "ctr": "3.0"}
        ]})))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/c2/insights"))
        .respond_with(ResponseTemplate::new(500).set_body_string("temporarily unavailable"))
        .mount(server)
        .await;
}

#[sqlx::test(migrations = "../../migrations")]
async fn campaigns_sync_with_ad_account(pool: PgPool) {
    let server = MockServer::start().await;
    mount_instagram(&server, vec![media("p1", "IMAGE")]).await;
    mount_campaigns(&server, "last_90d").await;

    let report = executor(&pool, &server, StaticCredentials::with_ads())
        .execute(TENANT)
        .await
        .expect("backfill failed");

    assert!(report.stats.skipped_stages.is_empty());
    assert_eq!(report.stats.campaigns, 2);
    assert_eq!(report.stats.campaign_insights, 2);
    assert_eq!(report.stats.skipped_rows, 1, "c2 insights skipped");

    let rows = nestsync_db::list_campaign_insights(&pool, "c1").await.unwrap();
    assert_eq!(rows.len(), 2);
    let first = rows
        .iter()
        .find(|r| r.date.to_string() == "2026-10-01")
        .expect("first day");
    assert_eq!(first.conversions, 3);
    assert_eq!(first.impressions, 1000);
    assert_eq!(first.date_window, "last_90d");
    assert!((first.ctr - 4.0).abs() < f64::EPSILON);
}

#[sqlx::test(migrations = "../../migrations")]
async fn incremental_run_limits_window(pool: PgPool) {
    let server = MockServer::start().await;
    mount_instagram(&server, vec![media("p1", "VIDEO")]).await;
    mount_campaigns(&server, "last_7d").await;

    let report = executor(&pool, &server, StaticCredentials::with_ads())
        .execute_with_mode(TENANT, SyncMode::Incremental)
        .await
        .expect("incremental failed");
    assert_eq!(report.mode, SyncMode::Incremental);

    let requests = server.received_requests().await.expect("recording enabled");
    let media_request = requests
        .iter()
        .find(|r| r.url.path() == format!("/{IG}/media"))
        .expect("media listing requested");
    assert!(media_request.url.query_pairs().any(|(k, _)| k == "since"));

    let status = nestsync_db::get_sync_status(&pool, TENANT)
        .await
        .unwrap()
        .expect("status row");
    assert!(status.incremental_completed_at.is_some());
    assert!(!status.backfill_completed);
    assert!(status.backfill_started_at.is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn page_cap_truncates_without_failing(pool: PgPool) {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_profile(&server).await;
    mount_post_insights(&server).await;
    mount_account_insights(&server).await;
    mount_demographics(&server).await;

    Mock::given(method("GET"))
        .and(path(format!("/{IG}/media")))
        .and(query_param("after", "cursor-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [media("p2", "IMAGE")],
            "paging": {"next": format!("{base}/{IG}/media?after=cursor-3")}
        })))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/{IG}/media")))
        .and(query_param("after", "cursor-3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .with_priority(1)
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/{IG}/media")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [media("p1", "IMAGE")],
            "paging": {"next": format!("{base}/{IG}/media?after=cursor-2")}
        })))
        .mount(&server)
        .await;

    let client = client(&server).with_max_pages(2);
    let report = executor_with_client(&pool, client, StaticCredentials::instagram_only())
        .execute(TENANT)
        .await
        .expect("truncated listing is not a failure");

    assert!(report.stats.posts_truncated);
    assert_eq!(report.stats.posts, 2);
    assert_eq!(nestsync_db::count_posts(&pool, TENANT).await.unwrap(), 2);
}
