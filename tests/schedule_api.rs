use std::sync::Arc;

use actix_web::{App, http::StatusCode, middleware::from_fn, test, web, web::Data};
use serde_json::{Value, json};

use agency_desk::{
    auth::{
        jwt::{Subject, generate_access_token},
        middleware::auth_middleware,
    },
    config::Config,
    documents::AgentDocumentService,
    model::role::Role,
    routes,
    scheduling::ScheduleService,
    store::InMemoryStore,
};

const SECRET: &str = "integration-secret";

fn token(role: Role, employee_id: Option<u64>) -> String {
    let subject = Subject {
        user_id: 1,
        username: "tester".into(),
        role: role.id(),
        employee_id,
    };
    format!(
        "Bearer {}",
        generate_access_token(&subject, SECRET, 300).unwrap()
    )
}

fn manager() -> String {
    token(Role::Manager, None)
}

macro_rules! app {
    ($store:expr) => {
        test::init_service(
            App::new()
                .app_data(Data::new(Config::for_tests(SECRET)))
                .app_data(Data::from($store.clone()))
                .app_data(Data::new(ScheduleService::new($store.clone(), $store.clone())))
                .app_data(Data::new(AgentDocumentService::new(
                    $store.clone(),
                    $store.clone(),
                )))
                .service(
                    web::scope("/api")
                        .wrap(from_fn(auth_middleware))
                        .configure(routes::document_routes::<InMemoryStore>),
                ),
        )
        .await
    };
}

fn store() -> Arc<InMemoryStore> {
    Arc::new(InMemoryStore::new().with_employee(7).with_pickup_point(3))
}

fn week() -> Value {
    json!({
        "employee_id": 7,
        "pickup_point_id": 3,
        "start_date": "2024-01-01",
        "end_date": "2024-01-07"
    })
}

fn shift(date: &str, start: &str, end: &str) -> Value {
    json!({ "employee_id": 7, "date": date, "start_time": start, "end_time": end })
}

#[actix_web::test]
async fn back_to_back_shifts_are_approved_together() {
    let store = store();
    let app = app!(store);

    let req = test::TestRequest::post()
        .uri("/api/schedules")
        .insert_header(("Authorization", manager()))
        .set_json(week())
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(created["status"], "draft");
    let id = created["id"].as_u64().unwrap();

    for (start, end) in [("09:00:00", "13:00:00"), ("13:00:00", "17:00:00")] {
        let req = test::TestRequest::post()
            .uri(&format!("/api/schedules/{id}/shifts"))
            .insert_header(("Authorization", manager()))
            .set_json(shift("2024-01-01", start, end))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let req = test::TestRequest::get()
        .uri(&format!("/api/schedules/{id}/conflicts"))
        .insert_header(("Authorization", manager()))
        .to_request();
    let report: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(report["conflict_free"], true);

    let req = test::TestRequest::put()
        .uri(&format!("/api/schedules/{id}/approve"))
        .insert_header(("Authorization", manager()))
        .to_request();
    let approved: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(approved["status"], "approved");
    let shifts = approved["shifts"].as_array().unwrap();
    assert_eq!(shifts.len(), 2);
    assert!(shifts.iter().all(|s| s["is_approved"] == true));

    let req = test::TestRequest::get()
        .uri(&format!(
            "/api/change-log?document_type=work_schedule&document_id={id}"
        ))
        .insert_header(("Authorization", manager()))
        .to_request();
    let log: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(log["total"], 4);
    let newest = &log["data"][0];
    assert_eq!(newest["action"], "update");
    assert_eq!(newest["previous_data"]["status"], "draft");
    assert_eq!(newest["new_data"]["status"], "approved");
}

#[actix_web::test]
async fn overlapping_shift_is_a_conflict() {
    let store = store();
    let app = app!(store);

    let req = test::TestRequest::post()
        .uri("/api/schedules")
        .insert_header(("Authorization", manager()))
        .set_json(week())
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let id = created["id"].as_u64().unwrap();

    let req = test::TestRequest::post()
        .uri(&format!("/api/schedules/{id}/shifts"))
        .insert_header(("Authorization", manager()))
        .set_json(shift("2024-01-01", "09:00:00", "14:00:00"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let req = test::TestRequest::post()
        .uri(&format!("/api/schedules/{id}/shifts"))
        .insert_header(("Authorization", manager()))
        .set_json(shift("2024-01-01", "13:00:00", "17:00:00"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["conflict"]["first"]["id"].is_u64());
    assert!(body["conflict"]["second"]["id"].is_null());
}

#[actix_web::test]
async fn pairwise_check_treats_touching_ranges_as_free() {
    let store = store();
    let app = app!(store);

    let check = |second_start: &str| {
        test::TestRequest::post()
            .uri("/api/shifts/conflict-check")
            .insert_header(("Authorization", manager()))
            .set_json(json!({
                "first": { "date": "2024-01-01", "start_time": "09:00:00", "end_time": "13:00:00" },
                "second": { "date": "2024-01-01", "start_time": second_start, "end_time": "17:00:00" }
            }))
            .to_request()
    };

    let touching: Value = test::call_and_read_body_json(&app, check("13:00:00")).await;
    assert_eq!(touching["conflicting"], false);
    let overlapping: Value = test::call_and_read_body_json(&app, check("12:59:00")).await;
    assert_eq!(overlapping["conflicting"], true);
}

#[actix_web::test]
async fn missing_and_unknown_are_reported() {
    let store = store();
    let app = app!(store);

    let req = test::TestRequest::put()
        .uri("/api/schedules/999/approve")
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::put()
        .uri("/api/schedules/999/approve")
        .insert_header(("Authorization", manager()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "schedule 999 not found");
}

#[actix_web::test]
async fn employees_cannot_decide_and_only_see_their_own_schedules() {
    let store = store();
    store.add_employee(8);
    let app = app!(store);

    let req = test::TestRequest::post()
        .uri("/api/schedules")
        .insert_header(("Authorization", manager()))
        .set_json(week())
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let id = created["id"].as_u64().unwrap();

    let req = test::TestRequest::put()
        .uri(&format!("/api/schedules/{id}/approve"))
        .insert_header(("Authorization", token(Role::Employee, Some(7))))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::get()
        .uri(&format!("/api/schedules/{id}"))
        .insert_header(("Authorization", token(Role::Employee, Some(8))))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::get()
        .uri(&format!("/api/schedules/{id}/conflicts"))
        .insert_header(("Authorization", token(Role::Employee, Some(8))))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::get()
        .uri(&format!("/api/schedules/{id}/conflicts"))
        .insert_header(("Authorization", token(Role::Employee, Some(7))))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::put()
        .uri(&format!("/api/schedules/{id}/submit"))
        .insert_header(("Authorization", token(Role::Employee, Some(7))))
        .to_request();
    let submitted: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(submitted["status"], "on_approval");

    let req = test::TestRequest::get()
        .uri("/api/schedules")
        .insert_header(("Authorization", token(Role::Employee, Some(8))))
        .to_request();
    let listed: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listed["total"], 0);
}

#[actix_web::test]
async fn agent_documents_drive_the_agent_book() {
    let store = store();
    let app = app!(store);
    let admin = token(Role::Admin, None);

    let req = test::TestRequest::post()
        .uri("/api/agent-documents")
        .insert_header(("Authorization", manager()))
        .set_json(json!({ "action": "create", "data": {
            "name": "North", "description": null,
            "email": "north@agency.example", "phone_number": "+70000000001"
        }}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::post()
        .uri("/api/agent-documents")
        .insert_header(("Authorization", admin.clone()))
        .set_json(json!({ "action": "create", "data": {
            "name": "North", "description": null,
            "email": "north@agency.example", "phone_number": "+70000000001"
        }}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let document: Value = test::read_body_json(resp).await;
    let agent_id = document["agent_id"].as_u64().unwrap();

    let req = test::TestRequest::get()
        .uri(&format!("/api/agents/{agent_id}"))
        .insert_header(("Authorization", manager()))
        .to_request();
    let agent: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(agent["name"], "North");

    let req = test::TestRequest::post()
        .uri("/api/agent-documents")
        .insert_header(("Authorization", admin))
        .set_json(json!({ "action": "update", "data": {
            "name": "North", "description": null,
            "email": "north@agency.example", "phone_number": "+70000000001"
        }}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get()
        .uri("/api/change-log?document_type=agent_document")
        .insert_header(("Authorization", manager()))
        .to_request();
    let log: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(log["total"], 1);
    assert_eq!(log["data"][0]["action"], "create");
    assert!(log["data"][0]["previous_data"].is_null());
}

#[actix_web::test]
async fn page_past_the_end_is_empty() {
    let store = store();
    let app = app!(store);

    for uri in [
        "/api/change-log?page=4294967295&per_page=100",
        "/api/schedules?page=4294967295&per_page=100",
    ] {
        let req = test::TestRequest::get()
            .uri(uri)
            .insert_header(("Authorization", manager()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"].as_array().map(Vec::len), Some(0));
    }
}
