//! Router behavior against an in-memory database: auth, status codes, and
//! resource flows that do not call the AI provider.

mod common;

use casewise_core::enums::ReportType;
use casewise_db::repos::report::NewReport;
use casewise_server::{ApiRequest, Method};
use common::*;
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;

fn session_cookie(set_cookie: &str) -> String {
    set_cookie
        .split(';')
        .next()
        .expect("cookie pair")
        .to_string()
}

#[tokio::test]
async fn health_is_public() {
    let state = state_with(config()).await;
    let body = expect(&get(&state, "/api/health").await, 200);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], true);
    assert_eq!(body["ai_configured"], false);
}

#[tokio::test]
async fn login_flow_guards_api_routes() {
    let state = state_with(config()).await;

    let resp = get(&state, "/api/cases").await;
    assert_eq!(expect(&resp, 401)["error"]["code"], "unauthorized");

    let wrong = post(&state, "/api/auth/login", &json!({"password": "nope"})).await;
    expect(&wrong, 401);
    assert!(wrong.header("Set-Cookie").is_none());

    let ok = post(&state, "/api/auth/login", &json!({"password": PASSWORD})).await;
    let body = expect(&ok, 200);
    assert_eq!(body["authenticated"], true);
    assert!(body["expires_at"].is_string());
    let set_cookie = ok.header("Set-Cookie").unwrap().to_string();
    assert!(set_cookie.starts_with("casewise_session="));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("Max-Age=43200"));
    let cookie = session_cookie(&set_cookie);

    let authed = send(
        &state,
        ApiRequest::new(Method::Get, "/api/cases").with_header("Cookie", &cookie),
    )
    .await;
    assert_eq!(expect(&authed, 200), json!([]));

    let status = send(
        &state,
        ApiRequest::new(Method::Get, "/api/auth/session").with_header("Cookie", &cookie),
    )
    .await;
    assert_eq!(expect(&status, 200)["authenticated"], true);

    let logout = send(
        &state,
        ApiRequest::new(Method::Post, "/api/auth/logout").with_header("Cookie", &cookie),
    )
    .await;
    assert_eq!(logout.status, 204);
    assert!(logout.header("Set-Cookie").unwrap().contains("Max-Age=0"));

    let after = send(
        &state,
        ApiRequest::new(Method::Get, "/api/cases").with_header("Cookie", &cookie),
    )
    .await;
    expect(&after, 401);
    let status = send(
        &state,
        ApiRequest::new(Method::Get, "/api/auth/session").with_header("Cookie", &cookie),
    )
    .await;
    assert_eq!(expect(&status, 200)["authenticated"], false);
}

#[tokio::test]
async fn forged_cookie_is_rejected() {
    let state = state_with(config()).await;
    let resp = send(
        &state,
        ApiRequest::new(Method::Get, "/api/cases")
            .with_header("Cookie", "casewise_session=deadbeef"),
    )
    .await;
    expect(&resp, 401);
}

#[rstest]
#[case(Method::Put, "/api/cases", 405)]
#[case(Method::Delete, "/api/health", 405)]
#[case(Method::Get, "/api/reports/rpt-1/finalize", 405)]
#[case(Method::Get, "/api/widgets", 404)]
#[case(Method::Get, "/index.html", 404)]
#[case(Method::Patch, "/api/interactions/int-1/summary/sections/two", 404)]
#[tokio::test]
async fn unrouted_requests(#[case] method: Method, #[case] target: &str, #[case] status: u16) {
    let state = open_state().await;
    let resp = send(&state, ApiRequest::new(method, target).with_json(&json!({}))).await;
    expect(&resp, status);
}

#[tokio::test]
async fn case_crud_and_validation() {
    let state = open_state().await;

    let missing = post(&state, "/api/cases", &json!({"worker_name": "Dana"})).await;
    let body = expect(&missing, 400);
    assert!(
        body["error"]["details"]
            .as_array()
            .unwrap()
            .iter()
            .any(|d| d.as_str().unwrap().contains("claim_number"))
    );

    let blank = post(
        &state,
        "/api/cases",
        &json!({"worker_name": "   ", "claim_number": "WC-1"}),
    )
    .await;
    expect(&blank, 400);

    let bad_json = send(
        &state,
        ApiRequest::new(Method::Post, "/api/cases").with_body("{not json"),
    )
    .await;
    expect(&bad_json, 400);

    let id = create_case(&state, "WC-2024-0117").await;
    let dup = post(
        &state,
        "/api/cases",
        &json!({"worker_name": "Someone Else", "claim_number": "WC-2024-0117"}),
    )
    .await;
    expect(&dup, 409);

    let case = expect(&get(&state, &format!("/api/cases/{id}")).await, 200);
    assert_eq!(case["status"], "open");
    assert_eq!(case["injury_date"], "2024-03-02");

    let updated = patch(
        &state,
        &format!("/api/cases/{id}"),
        &json!({"employer": "Northside Logistics", "insurer": null}),
    )
    .await;
    let updated = expect(&updated, 200);
    assert_eq!(updated["employer"], "Northside Logistics");
    assert!(updated["insurer"].is_null());

    let found = expect(&get(&state, "/api/cases?q=shoulder").await, 200);
    assert_eq!(found.as_array().unwrap().len(), 1);
    let none = expect(&get(&state, "/api/cases?status=closed").await, 200);
    assert_eq!(none, json!([]));
    expect(&get(&state, "/api/cases?status=paused").await, 400);

    let gone = expect(&delete(&state, &format!("/api/cases/{id}")).await, 200);
    assert_eq!(gone, json!({"id": id, "deleted": true}));
    expect(&get(&state, &format!("/api/cases/{id}")).await, 404);
}

#[tokio::test]
async fn case_updates_normalize_like_creates() {
    let state = open_state().await;
    create_case(&state, "C-1").await;
    let second = create_case(&state, "C-2").await;
    let target = format!("/api/cases/{second}");

    let padded = patch(&state, &target, &json!({"claim_number": " C-1 "})).await;
    assert_eq!(expect(&padded, 409)["error"]["code"], "conflict");

    let renamed = patch(
        &state,
        &target,
        &json!({"worker_name": "  Sam Ortiz ", "claim_number": " C-3 "}),
    )
    .await;
    let renamed = expect(&renamed, 200);
    assert_eq!(renamed["worker_name"], "Sam Ortiz");
    assert_eq!(renamed["claim_number"], "C-3");

    let future = patch(&state, &target, &json!({"injury_date": "2999-01-01"})).await;
    expect(&future, 400);
    let long_insurer = "x".repeat(201);
    expect(
        &patch(&state, &target, &json!({"insurer": long_insurer})).await,
        400,
    );
    let case = expect(&get(&state, &target).await, 200);
    assert_eq!(case["injury_date"], "2024-03-02");
    assert_eq!(case["insurer"], "Allianz");
}

#[tokio::test]
async fn case_status_machine() {
    let state = open_state().await;
    let id = create_case(&state, "WC-STATUS").await;
    let target = format!("/api/cases/{id}/status");

    let invalid = post(&state, &target, &json!({"status": "on_hold"})).await;
    assert_eq!(expect(&invalid, 409)["error"]["code"], "conflict");

    let active = post(&state, &target, &json!({"status": "active"})).await;
    assert_eq!(expect(&active, 200)["status"], "active");
    let held = post(
        &state,
        &target,
        &json!({"status": "on_hold", "reason": "Surgery scheduled"}),
    )
    .await;
    assert_eq!(expect(&held, 200)["status"], "on_hold");

    let audit = expect(
        &get(
            &state,
            &format!("/api/audit?entity_id={id}&action=status_changed"),
        )
        .await,
        200,
    );
    let entries = audit.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["detail"]["to"], "on_hold");
    assert_eq!(entries[0]["detail"]["reason"], "Surgery scheduled");
}

#[tokio::test]
async fn participants_and_links_stay_within_a_case() {
    let state = open_state().await;
    let case_a = create_case(&state, "WC-A").await;
    let case_b = create_case(&state, "WC-B").await;
    let gp = create_participant(&state, &case_a, "gp", "Dr Natarajan").await;
    let other = create_participant(&state, &case_b, "employer", "Mia Chen").await;

    let listed = expect(
        &get(&state, &format!("/api/cases/{case_a}/participants")).await,
        200,
    );
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let cross = post(
        &state,
        "/api/interactions",
        &json!({
            "case_id": case_a,
            "interaction_type": "meeting",
            "subject": "Case conference",
            "participant_ids": [other]
        }),
    )
    .await;
    expect(&cross, 400);

    let interaction = create_interaction(&state, &case_a, Some("Discussed hours.")).await;
    let link_target = format!("/api/interactions/{interaction}/participants/{gp}");
    let linked = expect(&post_empty(&state, &link_target).await, 200);
    assert_eq!(linked["participant_ids"], json!([gp]));
    let again = expect(&post_empty(&state, &link_target).await, 200);
    assert_eq!(again["participant_ids"], json!([gp]));

    let wrong_case = post_empty(
        &state,
        &format!("/api/interactions/{interaction}/participants/{other}"),
    )
    .await;
    expect(&wrong_case, 400);

    let unlinked = expect(&delete(&state, &link_target).await, 200);
    assert_eq!(unlinked["participant_ids"], json!([]));
    expect(&delete(&state, &link_target).await, 404);

    let renamed = patch(
        &state,
        &format!("/api/participants/{gp}"),
        &json!({"organisation": "Harbour Medical"}),
    )
    .await;
    assert_eq!(expect(&renamed, 200)["organisation"], "Harbour Medical");
    expect(&delete(&state, &format!("/api/participants/{gp}")).await, 200);
    expect(&get(&state, &format!("/api/participants/{gp}")).await, 404);
}

#[tokio::test]
async fn interaction_listing_filters() {
    let state = open_state().await;
    let case_id = create_case(&state, "WC-LIST").await;
    create_interaction(&state, &case_id, Some("Physio reports good progress")).await;
    create_interaction(&state, &case_id, Some("Employer offered light duties")).await;

    let all = expect(
        &get(&state, &format!("/api/interactions?case_id={case_id}")).await,
        200,
    );
    assert_eq!(all.as_array().unwrap().len(), 2);

    let limited = expect(
        &get(&state, &format!("/api/interactions?case_id={case_id}&limit=1")).await,
        200,
    );
    assert_eq!(limited.as_array().unwrap().len(), 1);

    let searched = expect(&get(&state, "/api/interactions?q=physio").await, 200);
    assert_eq!(searched.as_array().unwrap().len(), 1);

    let emails = expect(&get(&state, "/api/interactions?type=email").await, 200);
    assert_eq!(emails, json!([]));
}

#[tokio::test]
async fn summary_sections_round_trip() {
    let state = open_state().await;
    let case_id = create_case(&state, "WC-SUM").await;
    let id = create_interaction(&state, &case_id, Some("notes")).await;
    let base = format!("/api/interactions/{id}/summary");

    let empty = expect(&get(&state, &base).await, 200);
    assert!(empty["markdown"].is_null());
    assert_eq!(empty["sections"], json!([]));

    let replaced = put(
        &state,
        &base,
        &json!({"summary": "## Key Points\n- Keen to return\n- Sleeping better\n\n## Actions\n- Call GP"}),
    )
    .await;
    let replaced = expect(&replaced, 200);
    assert_eq!(replaced["sections"].as_array().unwrap().len(), 2);
    assert_eq!(replaced["sections"][0]["heading"], "Key Points");
    assert_eq!(replaced["sections"][0]["kind"], "list");

    let edited = patch(
        &state,
        &format!("{base}/sections/1"),
        &json!({"add_item": "Book case conference"}),
    )
    .await;
    let edited = expect(&edited, 200);
    assert_eq!(
        edited["sections"][1]["items"],
        json!(["Call GP", "Book case conference"])
    );

    let created = post(
        &state,
        &format!("{base}/sections"),
        &json!({"heading": "Follow-up", "items": ["Review in two weeks"]}),
    )
    .await;
    let created = expect(&created, 201);
    assert_eq!(created["sections"].as_array().unwrap().len(), 3);
    assert!(
        created["markdown"]
            .as_str()
            .unwrap()
            .contains("## Follow-up\n- Review in two weeks")
    );

    let removed = expect(&delete(&state, &format!("{base}/sections/0")).await, 200);
    assert_eq!(removed["sections"][0]["heading"], "Actions");

    expect(
        &patch(&state, &format!("{base}/sections/9"), &json!({"text": "x"})).await,
        404,
    );
    expect(
        &patch(
            &state,
            &format!("{base}/sections/0"),
            &json!({"text": "x", "items": ["y"]}),
        )
        .await,
        400,
    );

    let stored = expect(&get(&state, &format!("/api/interactions/{id}")).await, 200);
    assert!(
        stored["ai_summary"]
            .as_str()
            .unwrap()
            .starts_with("## Actions\n- Call GP")
    );

    let cleared = expect(&put(&state, &base, &json!({"summary": "  "})).await, 200);
    assert!(cleared["markdown"].is_null());
}

#[tokio::test]
async fn tasks_overdue_and_transitions() {
    let state = open_state().await;
    let case_id = create_case(&state, "WC-TASK").await;

    let late = post(
        &state,
        "/api/tasks",
        &json!({"case_id": case_id, "description": "Chase certificate", "due_date": "2001-01-01"}),
    )
    .await;
    let late_id = expect(&late, 201)["id"].as_str().unwrap().to_string();
    let future = post(
        &state,
        "/api/tasks",
        &json!({"case_id": case_id, "description": "Review plan", "due_date": "2999-01-01"}),
    )
    .await;
    expect(&future, 201);

    let overdue = expect(&get(&state, "/api/tasks?overdue=true").await, 200);
    let overdue = overdue.as_array().unwrap();
    assert_eq!(overdue.len(), 1);
    assert_eq!(overdue[0]["id"], late_id.as_str());

    let status = format!("/api/tasks/{late_id}/status");
    expect(&post(&state, &status, &json!({"status": "blocked"})).await, 409);
    let done = expect(&post(&state, &status, &json!({"status": "done"})).await, 200);
    assert_eq!(done["status"], "done");
    assert!(done["completed_at"].is_string());
    expect(&post(&state, &status, &json!({"status": "open"})).await, 409);

    let overview = expect(
        &get(&state, &format!("/api/cases/{case_id}/overview")).await,
        200,
    );
    assert_eq!(overview["open_tasks"].as_array().unwrap().len(), 1);
    assert_eq!(overview["overdue_tasks"], 0);

    let other_case = create_case(&state, "WC-TASK-2").await;
    let stranger = create_participant(&state, &other_case, "lawyer", "J. Ortiz").await;
    let bad_assign = post(
        &state,
        "/api/tasks",
        &json!({"case_id": case_id, "description": "Call lawyer", "assigned_participant_id": stranger}),
    )
    .await;
    expect(&bad_assign, 400);
}

#[tokio::test]
async fn final_reports_are_immutable() {
    let state = open_state().await;
    let case_id = create_case(&state, "WC-RPT").await;
    let report = state
        .service
        .create_report(&NewReport {
            case_id: &case_id,
            report_type: ReportType::ProgressReport,
            title: "Progress Report",
            content: "## Summary of Progress\nSteady.",
            generated: None,
        })
        .await
        .unwrap();
    let target = format!("/api/reports/{}", report.id);

    let edited = expect(
        &patch(&state, &target, &json!({"content": "## Summary of Progress\nBetter."})).await,
        200,
    );
    assert_eq!(edited["content"], "## Summary of Progress\nBetter.");

    let finalized = expect(&post_empty(&state, &format!("{target}/finalize")).await, 200);
    assert_eq!(finalized["status"], "final");
    assert!(finalized["finalized_at"].is_string());

    expect(&patch(&state, &target, &json!({"title": "New"})).await, 409);
    expect(&post_empty(&state, &format!("{target}/finalize")).await, 409);
    expect(&delete(&state, &target).await, 409);

    let listed = expect(
        &get(&state, &format!("/api/reports?case_id={case_id}&status=final")).await,
        200,
    );
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn ai_routes_answer_503_when_unconfigured() {
    let state = open_state().await;
    let case_id = create_case(&state, "WC-NOAI").await;
    let interaction = create_interaction(&state, &case_id, Some("notes")).await;

    let resp = post_empty(&state, &format!("/api/interactions/{interaction}/summarize")).await;
    assert_eq!(expect(&resp, 503)["error"]["code"], "service_unavailable");
    expect(
        &post_empty(&state, &format!("/api/cases/{case_id}/capacity-summary")).await,
        503,
    );
    expect(
        &post(
            &state,
            "/api/reports/generate",
            &json!({"case_id": case_id, "report_type": "rtw_plan"}),
        )
        .await,
        503,
    );
}

#[tokio::test]
async fn schemas_are_served() {
    let state = open_state().await;
    let list = expect(&get(&state, "/api/schemas").await, 200);
    assert!(
        list["schemas"]
            .as_array()
            .unwrap()
            .iter()
            .any(|s| s == "create_case_request")
    );
    let schema = expect(&get(&state, "/api/schemas/case").await, 200);
    assert!(schema["properties"]["claim_number"].is_object());
    expect(&get(&state, "/api/schemas/bogus").await, 404);
}

#[tokio::test]
async fn audit_trail_records_mutations() {
    let state = open_state().await;
    let case_id = create_case(&state, "WC-AUDIT").await;
    patch(
        &state,
        &format!("/api/cases/{case_id}"),
        &json!({"rtw_goal": "Full duties"}),
    )
    .await;

    let entries = expect(
        &get(&state, &format!("/api/audit?entity_type=case&entity_id={case_id}")).await,
        200,
    );
    let actions: Vec<&str> = entries
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["action"].as_str().unwrap())
        .collect();
    assert_eq!(actions, vec!["updated", "created"]);
    expect(&get(&state, "/api/audit?action=exploded").await, 400);
}
