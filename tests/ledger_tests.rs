use pretty_assertions::assert_eq;

use hrdesk::database::models::{LeaveType, LedgerAllocationInput, LedgerReason, User, UserRole};
use hrdesk::error::AppError;

mod common;

async fn setup() -> (common::TestContext, User, User) {
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
    (ctx, hr, employee)
}

fn allocation(user_ids: Vec<uuid::Uuid>, change: i64) -> LedgerAllocationInput {
    LedgerAllocationInput {
        user_ids,
        leave_type: LeaveType::Paid,
        change,
        reason: LedgerReason::ManualAdjustment,
    }
}

#[actix_web::test]
async fn balance_is_the_sum_of_all_entries() {
    let (ctx, hr, employee) = setup().await;
    let hr_claims = common::claims_for(&hr);

    ctx.leave
        .allocate(&hr_claims, allocation(vec![employee.id], 20))
        .await
        .unwrap();
    ctx.leave
        .allocate(&hr_claims, allocation(vec![employee.id], -3))
        .await
        .unwrap();

    let balance = ctx.ledger.balance(employee.id, LeaveType::Paid).await.unwrap();
    assert_eq!(balance, 17);
}

#[actix_web::test]
async fn allocation_requires_hr() {
    let (ctx, _hr, employee) = setup().await;

    let err = ctx
        .leave
        .allocate(
            &common::claims_for(&employee),
            allocation(vec![employee.id], 5),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)), "got {:?}", err);
}

#[actix_web::test]
async fn allocation_rejects_bad_input() {
    let (ctx, hr, employee) = setup().await;
    let hr_claims = common::claims_for(&hr);

    // No targets
    let err = ctx
        .leave
        .allocate(&hr_claims, allocation(vec![], 5))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)), "got {:?}", err);

    // Zero change
    let err = ctx
        .leave
        .allocate(&hr_claims, allocation(vec![employee.id], 0))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)), "got {:?}", err);

    // Untracked type
    let err = ctx
        .leave
        .allocate(
            &hr_claims,
            LedgerAllocationInput {
                user_ids: vec![employee.id],
                leave_type: LeaveType::Unpaid,
                change: 5,
                reason: LedgerReason::Accrual,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)), "got {:?}", err);

    // Reason reserved for the approval path
    let err = ctx
        .leave
        .allocate(
            &hr_claims,
            LedgerAllocationInput {
                user_ids: vec![employee.id],
                leave_type: LeaveType::Paid,
                change: -2,
                reason: LedgerReason::LeaveApproved,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)), "got {:?}", err);
}

#[actix_web::test]
async fn allocation_rejects_targets_outside_the_company() {
    let (ctx, hr, employee) = setup().await;
    let other_company = ctx.seed_company("Globex").await.unwrap();
    let outsider = ctx
        .seed_user(other_company, "Eve", "eve@globex.test", UserRole::Employee)
        .await
        .unwrap();

    let hr_claims = common::claims_for(&hr);

    let err = ctx
        .leave
        .allocate(&hr_claims, allocation(vec![employee.id, outsider.id], 5))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)), "got {:?}", err);

    // HR users are not allocation targets either
    let err = ctx
        .leave
        .allocate(&hr_claims, allocation(vec![hr.id], 5))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)), "got {:?}", err);

    // Nothing was written for the valid target in the failed batch
    let balance = ctx.ledger.balance(employee.id, LeaveType::Paid).await.unwrap();
    assert_eq!(balance, 0);
}

#[actix_web::test]
async fn batch_allocation_writes_one_entry_per_employee() {
    let (ctx, hr, employee) = setup().await;
    let bob = ctx
        .seed_user(employee.company_id, "Bob", "bob@acme.test", UserRole::Employee)
        .await
        .unwrap();

    let entries = ctx
        .leave
        .allocate(
            &common::claims_for(&hr),
            allocation(vec![employee.id, bob.id], 12),
        )
        .await
        .unwrap();
    assert_eq!(entries.len(), 2);

    for user in [&employee, &bob] {
        let balance = ctx.ledger.balance(user.id, LeaveType::Paid).await.unwrap();
        assert_eq!(balance, 12);
    }
}

#[actix_web::test]
async fn ledger_feed_is_hr_only_and_filterable() {
    let (ctx, hr, employee) = setup().await;
    let bob = ctx
        .seed_user(employee.company_id, "Bob", "bob@acme.test", UserRole::Employee)
        .await
        .unwrap();
    let hr_claims = common::claims_for(&hr);

    ctx.leave
        .allocate(&hr_claims, allocation(vec![employee.id, bob.id], 10))
        .await
        .unwrap();
    ctx.leave
        .allocate(
            &hr_claims,
            LedgerAllocationInput {
                user_ids: vec![employee.id],
                leave_type: LeaveType::Sick,
                change: 5,
                reason: LedgerReason::Accrual,
            },
        )
        .await
        .unwrap();

    let err = ctx
        .leave
        .ledger_entries(&common::claims_for(&employee), None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)), "got {:?}", err);

    let all = ctx.leave.ledger_entries(&hr_claims, None, None).await.unwrap();
    assert_eq!(all.len(), 3);
    assert!(all.iter().any(|e| e.employee_name == "Bob"));

    let alices = ctx
        .leave
        .ledger_entries(&hr_claims, Some(employee.id), None)
        .await
        .unwrap();
    assert_eq!(alices.len(), 2);

    let sick = ctx
        .leave
        .ledger_entries(&hr_claims, None, Some(LeaveType::Sick))
        .await
        .unwrap();
    assert_eq!(sick.len(), 1);
    assert_eq!(sick[0].change, 5);
}

#[actix_web::test]
async fn employee_listing_is_hr_only_and_sorted_by_name() {
    let (ctx, hr, employee) = setup().await;
    ctx.seed_user(employee.company_id, "Bob", "bob@acme.test", UserRole::Employee)
        .await
        .unwrap();

    let err = ctx
        .leave
        .employees(&common::claims_for(&employee))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)), "got {:?}", err);

    let employees = ctx.leave.employees(&common::claims_for(&hr)).await.unwrap();
    let names: Vec<_> = employees.iter().map(|e| e.name.clone()).collect();
    assert_eq!(names, vec!["Alice".to_string(), "Bob".to_string()]);
}
