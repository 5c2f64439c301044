use actix_web::{http::StatusCode, test};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use serial_test::serial;

use hrdesk::database::models::{LeaveType, LedgerAllocationInput, LedgerReason, UserRole};

mod common;

#[actix_web::test]
#[serial]
async fn register_login_and_me_round_trip() {
    let ctx = common::TestContext::new().await.unwrap();
    let company_id = ctx.seed_company("Acme").await.unwrap();
    let app = test::init_service(common::build_app(&ctx)).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/register")
        .set_json(json!({
            "companyId": company_id,
            "loginId": "alice",
            "email": "alice@acme.test",
            "name": "Alice",
            "password": "correct horse battery staple",
            "role": "EMPLOYEE"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], json!(true));
    assert!(body["data"]["token"].as_str().is_some());
    // The password hash never leaves the server
    assert!(body["data"]["user"].get("passwordHash").is_none());

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .set_json(json!({
            "email": "alice@acme.test",
            "password": "correct horse battery staple"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    let token = body["data"]["token"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri("/api/v1/auth/me")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["email"], json!("alice@acme.test"));
}

#[actix_web::test]
#[serial]
async fn duplicate_registration_conflicts() {
    let ctx = common::TestContext::new().await.unwrap();
    let company_id = ctx.seed_company("Acme").await.unwrap();
    ctx.seed_user(company_id, "Alice", "alice@acme.test", UserRole::Employee)
        .await
        .unwrap();
    let app = test::init_service(common::build_app(&ctx)).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/register")
        .set_json(json!({
            "companyId": company_id,
            "loginId": "alice2",
            "email": "alice@acme.test",
            "name": "Alice Again",
            "password": "hunter2hunter2",
            "role": "EMPLOYEE"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
#[serial]
async fn wrong_password_is_unauthorized() {
    let ctx = common::TestContext::new().await.unwrap();
    let company_id = ctx.seed_company("Acme").await.unwrap();
    ctx.seed_user(company_id, "Alice", "alice@acme.test", UserRole::Employee)
        .await
        .unwrap();
    let app = test::init_service(common::build_app(&ctx)).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .set_json(json!({
            "email": "alice@acme.test",
            "password": "not the password"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
#[serial]
async fn protected_routes_require_a_token() {
    let ctx = common::TestContext::new().await.unwrap();
    let app = test::init_service(common::build_app(&ctx)).await;

    for uri in [
        "/api/v1/auth/me",
        "/api/v1/attendance/status",
        "/api/v1/leave/balance",
    ] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "uri {}", uri);
    }
}

#[actix_web::test]
#[serial]
async fn double_check_in_over_http_is_409() {
    let ctx = common::TestContext::new().await.unwrap();
    let company_id = ctx.seed_company("Acme").await.unwrap();
    let user = ctx
        .seed_user(company_id, "Alice", "alice@acme.test", UserRole::Employee)
        .await
        .unwrap();
    let token = ctx.auth.generate_token(&user).unwrap();
    let app = test::init_service(common::build_app(&ctx)).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/attendance/check-in")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(json!({}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let req = test::TestRequest::post()
        .uri("/api/v1/attendance/check-in")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(json!({}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["message"], json!("Already checked in today"));
}

#[actix_web::test]
#[serial]
async fn insufficient_balance_returns_guidance() {
    let ctx = common::TestContext::new().await.unwrap();
    let company_id = ctx.seed_company("Acme").await.unwrap();
    let user = ctx
        .seed_user(company_id, "Alice", "alice@acme.test", UserRole::Employee)
        .await
        .unwrap();
    let token = ctx.auth.generate_token(&user).unwrap();
    let app = test::init_service(common::build_app(&ctx)).await;

    // No PAID balance was ever allocated
    let req = test::TestRequest::post()
        .uri("/api/v1/leave")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(json!({
            "leaveType": "PAID",
            "startDate": "2031-07-01",
            "endDate": "2031-07-03"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["data"]["availableBalance"], json!(0));
    assert_eq!(body["data"]["requestedDays"], json!(3));
    assert_eq!(body["data"]["suggestedLeaveType"], json!("UNPAID"));
}

#[actix_web::test]
#[serial]
async fn hr_routes_reject_employees() {
    let ctx = common::TestContext::new().await.unwrap();
    let company_id = ctx.seed_company("Acme").await.unwrap();
    let user = ctx
        .seed_user(company_id, "Alice", "alice@acme.test", UserRole::Employee)
        .await
        .unwrap();
    let token = ctx.auth.generate_token(&user).unwrap();
    let app = test::init_service(common::build_app(&ctx)).await;

    for uri in ["/api/v1/leave/ledger", "/api/v1/leave/employees"] {
        let req = test::TestRequest::get()
            .uri(uri)
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN, "uri {}", uri);
    }
}

#[actix_web::test]
#[serial]
async fn leave_approval_flow_over_http() {
    let ctx = common::TestContext::new().await.unwrap();
    let company_id = ctx.seed_company("Acme").await.unwrap();
    let hr = ctx
        .seed_user(company_id, "Hilda", "hilda@acme.test", UserRole::Hr)
        .await
        .unwrap();
    let employee = ctx
        .seed_user(company_id, "Alice", "alice@acme.test", UserRole::Employee)
        .await
        .unwrap();
    ctx.leave
        .allocate(
            &common::claims_for(&hr),
            LedgerAllocationInput {
                user_ids: vec![employee.id],
                leave_type: LeaveType::Paid,
                change: 10,
                reason: LedgerReason::Accrual,
            },
        )
        .await
        .unwrap();

    let hr_token = ctx.auth.generate_token(&hr).unwrap();
    let employee_token = ctx.auth.generate_token(&employee).unwrap();
    let app = test::init_service(common::build_app(&ctx)).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/leave")
        .insert_header(("Authorization", format!("Bearer {}", employee_token)))
        .set_json(json!({
            "leaveType": "PAID",
            "startDate": "2031-07-01",
            "endDate": "2031-07-02",
            "remarks": "Family trip"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    let request_id = body["data"]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/leave/{}/approve", request_id))
        .insert_header(("Authorization", format!("Bearer {}", hr_token)))
        .set_json(json!({ "adminComment": "Approved, enjoy" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["status"], json!("APPROVED"));

    // The employee's HR-visible ledger is off limits, but their balance
    // reflects the deduction
    let req = test::TestRequest::get()
        .uri("/api/v1/leave/balance?type=PAID")
        .insert_header(("Authorization", format!("Bearer {}", employee_token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"][0]["balance"], json!(8));
    assert_eq!(body["data"][0]["availableBalance"], json!(8));
}
