//! # Integration Tests for ecm-api
//!
//! Drives the full engine surface over the router: dry-run readiness
//! evaluation, pack creation and the render callback, safeguard
//! behavior in pack metadata, lazy expiry, and the classification
//! dashboard.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use ecm_api::state::AppState;
use ecm_classification::{score, AssessedBy, NonComplianceRecord, RiskCategory};
use ecm_core::{
    CompanyId, ComplianceYear, EvidenceId, IncidentId, ObligationId, RemediationId, SiteId,
};
use ecm_readiness::{ObligationStatus, PermitStatus, RemediationStatus};
use ecm_safeguards::{
    IncidentDisclosureLevel, IncidentSeverity, IncidentSummary, TenderPackIncidentOptIn,
};

/// Helper: build the test app plus a handle on its state for seeding.
fn test_app() -> (axum::Router, AppState) {
    let state = AppState::new();
    (ecm_api::app(state.clone()), state)
}

/// Helper: POST a JSON body.
fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Helper: GET.
fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

/// Helper: read a response body as JSON.
async fn body_json(response: axum::http::Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn year() -> ComplianceYear {
    ComplianceYear::new(2025).unwrap()
}

/// Seed everything a regulator pack needs to pass the readiness gate
/// for one site.
fn seed_passing_site(state: &AppState, site: SiteId) {
    let assessment = score(
        site,
        year(),
        &[],
        &state.categories,
        &state.bands,
        AssessedBy::RegulatorOfficer,
    )
    .unwrap();
    state.data.seed_assessment(assessment);
    state.data.seed_permit(PermitStatus {
        site_id: site,
        reference: "EPR/AB1234".to_string(),
        active: true,
    });
}

fn generation_body(company: CompanyId, site: SiteId, pack_type: &str) -> Value {
    json!({
        "company_id": company.as_uuid(),
        "pack_type": pack_type,
        "site_ids": [site.as_uuid()],
        "compliance_year": 2025,
    })
}

fn valid_digest() -> String {
    "ab".repeat(32)
}

fn success_callback() -> Value {
    json!({
        "outcome": "succeeded",
        "file_reference": "s3://packs/out.pdf",
        "digest": valid_digest(),
    })
}

// -- Health Probes ------------------------------------------------------------

#[tokio::test]
async fn liveness_probe() {
    let (app, _) = test_app();
    let response = app.oneshot(get("/health/liveness")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn readiness_probe() {
    let (app, _) = test_app();
    let response = app.oneshot(get("/health/readiness")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// -- OpenAPI ------------------------------------------------------------------

#[tokio::test]
async fn openapi_spec_is_served() {
    let (app, _) = test_app();
    let response = app.oneshot(get("/openapi.json")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let spec = body_json(response).await;
    assert!(spec["paths"]["/v1/packs"].is_object());
    assert!(spec["paths"]["/v1/readiness/evaluate"].is_object());
}

// -- Readiness dry run --------------------------------------------------------

#[tokio::test]
async fn evaluate_readiness_reports_blocking_and_warnings() {
    let (app, state) = test_app();
    let company = CompanyId::new();
    let site = SiteId::new();

    // Permit passes, but: no classification assessment (blocking rule
    // fails) and one obligation without evidence (advisory rule fails).
    state.data.seed_permit(PermitStatus {
        site_id: site,
        reference: "EPR/XY0001".to_string(),
        active: true,
    });
    state.data.seed_obligation(ObligationStatus {
        id: ObligationId::new(),
        site_id: site,
        condition_reference: "3.1.2".to_string(),
        last_evidence_at: None,
    });

    let response = app
        .oneshot(post_json(
            "/v1/readiness/evaluate",
            generation_body(company, site, "regulator_pack"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;

    assert_eq!(body["can_generate"], json!(false));
    assert_eq!(body["blocking_failures"].as_array().unwrap().len(), 1);
    assert_eq!(
        body["blocking_failures"][0]["rule_key"],
        json!("assessment_recency")
    );
    assert_eq!(body["warnings"].as_array().unwrap().len(), 1);
    assert_eq!(body["warnings"][0]["rule_key"], json!("evidence_coverage"));
    // Non-PASS results always carry details and a recommendation.
    assert!(body["blocking_failures"][0]["details"].as_str().unwrap().len() > 0);
    assert!(body["blocking_failures"][0]["recommendation"].is_string());
}

#[tokio::test]
async fn evaluate_readiness_passes_with_seeded_data() {
    let (app, state) = test_app();
    let company = CompanyId::new();
    let site = SiteId::new();
    seed_passing_site(&state, site);

    let response = app
        .oneshot(post_json(
            "/v1/readiness/evaluate",
            generation_body(company, site, "regulator_pack"),
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["can_generate"], json!(true));
    assert_eq!(body["blocking_failures"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn evaluate_readiness_rejects_empty_site_list() {
    let (app, _) = test_app();
    let body = json!({
        "company_id": Uuid::new_v4(),
        "pack_type": "regulator_pack",
        "site_ids": [],
        "compliance_year": 2025,
    });
    let response = app
        .oneshot(post_json("/v1/readiness/evaluate", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let (app, _) = test_app();
    let request = Request::builder()
        .method("POST")
        .uri("/v1/readiness/evaluate")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// -- Pack creation ------------------------------------------------------------

#[tokio::test]
async fn blocked_creation_records_failed_pack_without_dispatch() {
    let (app, state) = test_app();
    let company = CompanyId::new();
    let site = SiteId::new();
    // Nothing seeded: blocking rules fail.

    let response = app
        .clone()
        .oneshot(post_json(
            "/v1/packs",
            generation_body(company, site, "regulator_pack"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = body_json(response).await;
    assert_eq!(body["status"], json!("FAILED"));
    assert!(state.dispatcher.is_empty());

    // The attempt is retrievable with its blocking snapshot.
    let pack_id = body["pack_id"].as_str().unwrap().to_string();
    let response = app
        .oneshot(get(&format!("/v1/packs/{pack_id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let pack = body_json(response).await;
    assert_eq!(pack["status"], json!("FAILED"));
    assert!(!pack["requested_report"]["blocking_failures"]
        .as_array()
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn full_generate_and_finalize_flow() {
    let (app, state) = test_app();
    let company = CompanyId::new();
    let site = SiteId::new();
    seed_passing_site(&state, site);

    // Create: 202, GENERATING, one render job enqueued.
    let response = app
        .clone()
        .oneshot(post_json(
            "/v1/packs",
            generation_body(company, site, "regulator_pack"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = body_json(response).await;
    assert_eq!(body["status"], json!("GENERATING"));
    assert_eq!(state.dispatcher.len(), 1);
    let pack_id = body["pack_id"].as_str().unwrap().to_string();

    // The runner reports success.
    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/v1/packs/{pack_id}/render-complete"),
            success_callback(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let pack = body_json(response).await;
    assert_eq!(pack["status"], json!("READY"));
    assert_eq!(pack["artifact"]["digest"], json!(valid_digest()));
    assert!(pack["expiry_date"].is_string());
    assert!(pack["finalization_report"]["blocking_failures"]
        .as_array()
        .unwrap()
        .is_empty());
    // Classification summary for the site is embedded.
    assert_eq!(
        pack["metadata"]["classification"][0]["band"],
        json!("A")
    );

    // A duplicate callback conflicts.
    let response = app
        .oneshot(post_json(
            &format!("/v1/packs/{pack_id}/render-complete"),
            success_callback(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn blocking_condition_mid_render_fails_finalization() {
    let (app, state) = test_app();
    let company = CompanyId::new();
    let site = SiteId::new();
    seed_passing_site(&state, site);

    let response = app
        .clone()
        .oneshot(post_json(
            "/v1/packs",
            generation_body(company, site, "regulator_pack"),
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["status"], json!("GENERATING"));
    let pack_id = body["pack_id"].as_str().unwrap().to_string();

    // While the render runs, a corrective action surfaces that is far
    // older than the 90-day limit — a blocking condition.
    state.data.seed_remediation(RemediationStatus {
        id: RemediationId::new(),
        site_id: site,
        opened_at: Utc::now() - Duration::days(200),
        due_at: None,
    });

    let response = app
        .oneshot(post_json(
            &format!("/v1/packs/{pack_id}/render-complete"),
            success_callback(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let pack = body_json(response).await;
    // The pack lands in FAILED, never READY.
    assert_eq!(pack["status"], json!("FAILED"));
    assert!(pack["failure_reason"]
        .as_str()
        .unwrap()
        .contains("remediation_age"));
    // Request-time snapshot was clear; the re-check was not.
    assert!(pack["requested_report"]["blocking_failures"]
        .as_array()
        .unwrap()
        .is_empty());
    assert!(!pack["finalization_report"]["blocking_failures"]
        .as_array()
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn render_failure_lands_in_failed() {
    let (app, state) = test_app();
    let company = CompanyId::new();
    let site = SiteId::new();
    seed_passing_site(&state, site);

    let response = app
        .clone()
        .oneshot(post_json(
            "/v1/packs",
            generation_body(company, site, "regulator_pack"),
        ))
        .await
        .unwrap();
    let pack_id = body_json(response).await["pack_id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .oneshot(post_json(
            &format!("/v1/packs/{pack_id}/render-complete"),
            json!({ "outcome": "failed", "reason": "template missing" }),
        ))
        .await
        .unwrap();
    let pack = body_json(response).await;
    assert_eq!(pack["status"], json!("FAILED"));
    assert!(pack["failure_reason"]
        .as_str()
        .unwrap()
        .contains("template missing"));
}

#[tokio::test]
async fn callback_with_invalid_digest_is_rejected() {
    let (app, state) = test_app();
    let company = CompanyId::new();
    let site = SiteId::new();
    seed_passing_site(&state, site);

    let response = app
        .clone()
        .oneshot(post_json(
            "/v1/packs",
            generation_body(company, site, "regulator_pack"),
        ))
        .await
        .unwrap();
    let pack_id = body_json(response).await["pack_id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .oneshot(post_json(
            &format!("/v1/packs/{pack_id}/render-complete"),
            json!({
                "outcome": "succeeded",
                "file_reference": "s3://packs/out.pdf",
                "digest": "NOT-HEX",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn unknown_pack_is_not_found() {
    let (app, _) = test_app();
    let response = app
        .oneshot(get(&format!("/v1/packs/{}", Uuid::new_v4())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn active_listing_excludes_failed_packs() {
    let (app, state) = test_app();
    let company = CompanyId::new();
    let blocked_site = SiteId::new();
    let good_site = SiteId::new();
    seed_passing_site(&state, good_site);

    // One blocked (FAILED) pack and one GENERATING pack.
    app.clone()
        .oneshot(post_json(
            "/v1/packs",
            generation_body(company, blocked_site, "regulator_pack"),
        ))
        .await
        .unwrap();
    app.clone()
        .oneshot(post_json(
            "/v1/packs",
            generation_body(company, good_site, "regulator_pack"),
        ))
        .await
        .unwrap();

    let response = app
        .oneshot(get(&format!("/v1/packs?company_id={}", company.as_uuid())))
        .await
        .unwrap();
    let body = body_json(response).await;
    let listing = body.as_array().unwrap();
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0]["status"], json!("GENERATING"));
}

// -- Safeguards in pack metadata ----------------------------------------------

#[tokio::test]
async fn detailed_board_pack_without_approval_downgrades_to_summary() {
    let (app, state) = test_app();
    let company = CompanyId::new();
    let site = SiteId::new();
    seed_passing_site(&state, site);

    let mut body = generation_body(company, site, "board_pack");
    body["detail_level"] = json!("detailed");

    let response = app
        .clone()
        .oneshot(post_json("/v1/packs", body))
        .await
        .unwrap();
    let created = body_json(response).await;
    // Missing approval never blocks generation.
    assert_eq!(created["status"], json!("GENERATING"));
    let pack_id = created["pack_id"].as_str().unwrap().to_string();

    let response = app
        .oneshot(post_json(
            &format!("/v1/packs/{pack_id}/render-complete"),
            success_callback(),
        ))
        .await
        .unwrap();
    let pack = body_json(response).await;
    assert_eq!(pack["status"], json!("READY"));
    assert_eq!(pack["metadata"]["detail_level"], json!("summary"));
    assert_eq!(pack["metadata"]["detail_downgraded"], json!(true));
}

#[tokio::test]
async fn tender_pack_incident_disclosure_honors_opt_in_level() {
    let (app, state) = test_app();
    let company = CompanyId::new();
    let site = SiteId::new();
    seed_passing_site(&state, site);
    state.data.seed_incident(IncidentSummary {
        id: IncidentId::new(),
        severity: IncidentSeverity::High,
        occurred_at: Utc::now() - Duration::days(30),
        description: "bund overflow".to_string(),
    });
    state.data.set_incident_opt_in(TenderPackIncidentOptIn {
        company_id: company,
        disclosure_level: IncidentDisclosureLevel::SeverityBreakdown,
        justification: "tender schedule 4".to_string(),
        recorded_by: "compliance.lead".to_string(),
        recorded_at: Utc::now(),
    });

    let mut body = generation_body(company, site, "tender_pack");
    body["include_incident_statistics"] = json!(true);

    let response = app
        .clone()
        .oneshot(post_json("/v1/packs", body))
        .await
        .unwrap();
    let pack_id = body_json(response).await["pack_id"]
        .as_str()
        .unwrap()
        .to_string();
    let response = app
        .oneshot(post_json(
            &format!("/v1/packs/{pack_id}/render-complete"),
            success_callback(),
        ))
        .await
        .unwrap();
    let pack = body_json(response).await;

    let disclosure = &pack["metadata"]["incident_disclosure"];
    assert_eq!(disclosure["total_incidents"], json!(1));
    assert_eq!(disclosure["by_severity"]["high"], json!(1));
    // Severity breakdown never carries raw incident records.
    assert!(disclosure.get("incidents").is_none());
}

#[tokio::test]
async fn tender_pack_without_opt_in_omits_incident_fields_entirely() {
    let (app, state) = test_app();
    let company = CompanyId::new();
    let site = SiteId::new();
    seed_passing_site(&state, site);
    state.data.seed_incident(IncidentSummary {
        id: IncidentId::new(),
        severity: IncidentSeverity::Critical,
        occurred_at: Utc::now() - Duration::days(10),
        description: "unpermitted discharge".to_string(),
    });

    let mut body = generation_body(company, site, "tender_pack");
    body["include_incident_statistics"] = json!(true);

    let response = app
        .clone()
        .oneshot(post_json("/v1/packs", body))
        .await
        .unwrap();
    let pack_id = body_json(response).await["pack_id"]
        .as_str()
        .unwrap()
        .to_string();
    let response = app
        .oneshot(post_json(
            &format!("/v1/packs/{pack_id}/render-complete"),
            success_callback(),
        ))
        .await
        .unwrap();
    let pack = body_json(response).await;
    assert_eq!(pack["status"], json!("READY"));
    assert!(pack["metadata"].get("incident_disclosure").is_none());
}

// -- Classification dashboard -------------------------------------------------

#[tokio::test]
async fn dashboard_aggregates_scores_and_breakdown() {
    let (app, state) = test_app();
    let company = CompanyId::new();
    let site = SiteId::new();

    let mut record = NonComplianceRecord::new(site, year(), RiskCategory::Category1, "4.2.1");
    record.evidence_ids.push(EvidenceId::new());
    let record2 = NonComplianceRecord::new(site, year(), RiskCategory::Category3, "2.1.1");
    state.data.seed_non_compliance(record.clone());
    state.data.seed_non_compliance(record2.clone());

    let assessment = score(
        site,
        year(),
        &[record, record2],
        &state.categories,
        &state.bands,
        AssessedBy::RegulatorOfficer,
    )
    .unwrap();
    state.data.seed_assessment(assessment);

    let uri = format!(
        "/v1/classification/dashboard?company_id={}&site_ids={}&compliance_year=2025",
        company.as_uuid(),
        site.as_uuid()
    );
    let response = app.oneshot(get(&uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;

    // 40 (category 1) + 10 (category 3) = 50 -> band C.
    assert_eq!(body["dashboard"]["current_score"], json!(50));
    assert_eq!(body["dashboard"]["current_band"], json!("C"));
    assert_eq!(body["dashboard"]["trend"], json!("new"));
    assert_eq!(
        body["dashboard"]["non_compliances_by_category"]["category1"],
        json!(1)
    );
    assert_eq!(
        body["dashboard"]["non_compliances_by_category"]["category3"],
        json!(1)
    );
}

#[tokio::test]
async fn dashboard_rejects_bad_site_ids() {
    let (app, _) = test_app();
    let uri = format!(
        "/v1/classification/dashboard?company_id={}&site_ids=junk&compliance_year=2025",
        Uuid::new_v4()
    );
    let response = app.oneshot(get(&uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
