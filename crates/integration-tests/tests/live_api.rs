//! Workflows against a running server.
//!
//! Ignored by default. See the crate docs for the environment these need.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use chrono::Utc;
use rust_decimal::Decimal;
use secrecy::SecretString;

use envanter_client::ApiClient;
use envanter_core::export::ExportKind;
use envanter_core::models::{
    BudgetSpend, CompleteCount, CountedQuantity, MaterialDetails, MovementFilter, NewBudget,
    NewMaterial, NewMaterialRequest, NewMovement, NewOrder, NewOrderLine, NewStockCount,
    NewSupplier, NewUser, SupplierDetails, UserUpdate,
};
use envanter_core::{
    Category, CountStatus, MaterialCode, MovementDirection, NotificationKind, OrderStatus,
    Priority, Quantity, RequestStatus, StockStatus, SupplierCode, Unit, UserRole,
};
use envanter_integration_tests::{TestContext, unique_code};

fn new_material(code: &MaterialCode, opening_stock: i64) -> NewMaterial {
    NewMaterial {
        code: code.clone(),
        opening_stock,
        details: MaterialDetails {
            name: format!("Test malzemesi {code}"),
            category: Category::Other,
            unit: Unit::Piece,
            min_level: 5,
            max_level: 50,
            location: "Ana Depo".to_owned(),
            shelf: String::new(),
            barcode: String::new(),
            unit_price: "12.50".parse().unwrap(),
        },
    }
}

fn movement(code: &MaterialCode, direction: MovementDirection, quantity: i64) -> NewMovement {
    NewMovement {
        material_code: code.clone(),
        direction,
        quantity: Quantity::new(quantity).unwrap(),
        counterparty: "Entegrasyon".to_owned(),
        note: String::new(),
        order_no: None,
        approved_by: String::new(),
    }
}

#[tokio::test]
#[ignore = "needs a running server"]
async fn test_health() {
    let ctx = TestContext::new().await;
    ctx.client.health().await.unwrap();
    assert_eq!(ctx.client.me().await.unwrap().username, ctx.username);
    ctx.finish().await.unwrap();
}

#[tokio::test]
#[ignore = "needs a running server"]
async fn test_movements_drive_stock() {
    let ctx = TestContext::new().await;
    let code = MaterialCode::parse(&unique_code("MK")).unwrap();

    let created = ctx.client.create_material(&new_material(&code, 20)).await.unwrap();
    assert_eq!(created.current_stock, 20);
    assert_eq!(created.status, StockStatus::Normal);

    ctx.client
        .record_movement(&movement(&code, MovementDirection::Out, 16))
        .await
        .unwrap();
    let after = ctx.client.material(&code).await.unwrap();
    assert_eq!(after.current_stock, 4);
    assert_eq!(after.status, StockStatus::Critical);

    // Taking more than is left is refused and changes nothing
    let err = ctx
        .client
        .record_movement(&movement(&code, MovementDirection::Out, 5))
        .await
        .unwrap_err();
    assert!(err.status().is_some_and(|s| s.is_client_error()), "{err}");
    assert_eq!(ctx.client.material(&code).await.unwrap().current_stock, 4);

    // The ledger holds the opening entry and the issue
    let filter = MovementFilter {
        material_code: Some(code.clone()),
        direction: None,
    };
    let movements = ctx.client.movements(&filter).await.unwrap();
    assert_eq!(movements.len(), 2);
    assert_eq!(movements.iter().map(|m| m.delta()).sum::<i64>(), 4);

    // Codes are never reused, even after archiving
    ctx.client.delete_material(&code).await.unwrap();
    assert!(ctx.client.material(&code).await.unwrap_err().is_not_found());
    let err = ctx
        .client
        .create_material(&new_material(&code, 0))
        .await
        .unwrap_err();
    assert!(err.is_conflict(), "{err}");

    ctx.finish().await.unwrap();
}

#[tokio::test]
#[ignore = "needs a running server"]
async fn test_request_review() {
    let ctx = TestContext::new().await;
    let code = MaterialCode::parse(&unique_code("MK")).unwrap();
    ctx.client.create_material(&new_material(&code, 10)).await.unwrap();

    let new_request = NewMaterialRequest {
        material_code: code.clone(),
        material_name: String::new(),
        quantity: Quantity::new(3).unwrap(),
        priority: Priority::High,
        note: "toplantı odası".to_owned(),
        requester: String::new(),
        department: "İdari İşler".to_owned(),
    };
    let request = ctx.client.create_request(&new_request).await.unwrap();
    assert_eq!(request.status, RequestStatus::Pending);
    assert!(!request.material_name.is_empty());

    let approved = ctx.client.approve_request(&request.number, "").await.unwrap();
    assert_eq!(approved.status, RequestStatus::Approved);
    assert!(approved.reviewed_at.is_some());

    let err = ctx
        .client
        .reject_request(&request.number, "", "geç kaldı")
        .await
        .unwrap_err();
    assert!(err.is_conflict(), "{err}");

    ctx.client.delete_material(&code).await.unwrap();
    ctx.finish().await.unwrap();
}

#[tokio::test]
#[ignore = "needs a running server"]
async fn test_order_lifecycle() {
    let ctx = TestContext::new().await;
    let supplier_code = SupplierCode::parse(&unique_code("TED")).unwrap();
    ctx.client
        .create_supplier(&NewSupplier {
            code: supplier_code.clone(),
            details: SupplierDetails {
                name: format!("Tedarikçi {supplier_code}"),
                contact_person: String::new(),
                phone: String::new(),
                email: String::new(),
                address: String::new(),
                category: "Test".to_owned(),
                rating: envanter_core::models::Rating::default(),
                notes: String::new(),
                active: true,
            },
        })
        .await
        .unwrap();

    let line = |code: &str, quantity: i64, price: &str| NewOrderLine {
        material_code: MaterialCode::parse(code).unwrap(),
        material_name: String::new(),
        quantity: Quantity::new(quantity).unwrap(),
        unit_price: price.parse().unwrap(),
    };
    let order = ctx
        .client
        .create_order(&NewOrder {
            supplier_code: supplier_code.clone(),
            supplier_name: String::new(),
            lines: vec![line("MK0001", 4, "45.50"), line("MK0002", 2, "10.00")],
            notes: String::new(),
            created_by: String::new(),
        })
        .await
        .unwrap();
    assert_eq!(order.total, "202.00".parse::<Decimal>().unwrap());
    assert_eq!(order.status, OrderStatus::AwaitingApproval);

    // Skipping a step is refused
    let err = ctx
        .client
        .update_order_status(&order.number, OrderStatus::Delivered, "")
        .await
        .unwrap_err();
    assert!(err.is_conflict(), "{err}");

    let mut current = order;
    while let Some(next) = current.next_status() {
        current = ctx
            .client
            .update_order_status(&current.number, next, "")
            .await
            .unwrap();
        assert_eq!(current.status, next);
    }
    assert!(current.delivered_at.is_some());

    ctx.client.delete_supplier(&supplier_code).await.unwrap();
    ctx.finish().await.unwrap();
}

#[tokio::test]
#[ignore = "needs a running server"]
async fn test_bulk_delete_counts_successes() {
    let ctx = TestContext::new().await;
    let mut codes = Vec::new();
    for _ in 0..3 {
        let code = MaterialCode::parse(&unique_code("MK")).unwrap();
        ctx.client.create_material(&new_material(&code, 0)).await.unwrap();
        codes.push(code);
    }
    codes.push(MaterialCode::parse(&unique_code("YOK")).unwrap());

    let report = ctx.client.bulk_delete_materials(&codes).await;
    assert_eq!(report.success_count(), 3);
    assert_eq!(report.failed.len(), 1);
    assert!(report.failed[0].1.is_not_found());

    ctx.finish().await.unwrap();
}

#[tokio::test]
#[ignore = "needs a running server"]
async fn test_exports_are_rectangular() {
    let ctx = TestContext::new().await;
    for kind in ExportKind::ALL {
        let table = ctx.client.export(kind).await.unwrap();
        assert_eq!(table.filename, kind.filename());
        assert!(table.is_rectangular(), "{kind}");
    }
    ctx.finish().await.unwrap();
}

fn new_request(code: &MaterialCode, quantity: i64) -> NewMaterialRequest {
    NewMaterialRequest {
        material_code: code.clone(),
        material_name: String::new(),
        quantity: Quantity::new(quantity).unwrap(),
        priority: Priority::Normal,
        note: String::new(),
        requester: String::new(),
        department: "İdari İşler".to_owned(),
    }
}

#[tokio::test]
#[ignore = "needs a running server"]
async fn test_overdraw_is_refused() {
    let ctx = TestContext::new().await;
    let code = MaterialCode::parse(&unique_code("MK")).unwrap();
    ctx.client.create_material(&new_material(&code, 3)).await.unwrap();

    let err = ctx
        .client
        .record_movement(&movement(&code, MovementDirection::Out, 4))
        .await
        .unwrap_err();
    assert!(err.is_conflict(), "{err}");

    // Nothing was written: stock and ledger are as created
    assert_eq!(ctx.client.material(&code).await.unwrap().current_stock, 3);
    let filter = MovementFilter {
        material_code: Some(code.clone()),
        direction: Some(MovementDirection::Out),
    };
    assert!(ctx.client.movements(&filter).await.unwrap().is_empty());

    // Taking exactly what is left is fine
    ctx.client
        .record_movement(&movement(&code, MovementDirection::Out, 3))
        .await
        .unwrap();
    let emptied = ctx.client.material(&code).await.unwrap();
    assert_eq!(emptied.current_stock, 0);
    assert_eq!(emptied.status, StockStatus::Critical);

    ctx.client.delete_material(&code).await.unwrap();
    ctx.finish().await.unwrap();
}

#[tokio::test]
#[ignore = "needs a running server"]
async fn test_concurrent_approvals_apply_once() {
    let ctx = TestContext::new().await;
    let code = MaterialCode::parse(&unique_code("MK")).unwrap();
    ctx.client.create_material(&new_material(&code, 10)).await.unwrap();
    let request = ctx.client.create_request(&new_request(&code, 2)).await.unwrap();

    let (first, second) = tokio::join!(
        ctx.client.approve_request(&request.number, ""),
        ctx.client.approve_request(&request.number, ""),
    );
    let (approved, refused): (Vec<_>, Vec<_>) = [first, second].into_iter().partition(Result::is_ok);
    assert_eq!(approved.len(), 1);
    assert_eq!(refused.len(), 1);
    let err = refused.into_iter().next().unwrap().unwrap_err();
    assert!(err.is_conflict(), "{err}");

    let stored = ctx.client.request(&request.number).await.unwrap();
    assert_eq!(stored.status, RequestStatus::Approved);

    ctx.client.delete_material(&code).await.unwrap();
    ctx.finish().await.unwrap();
}

#[tokio::test]
#[ignore = "needs a running server"]
async fn test_count_records_differences_without_adjusting_stock() {
    let ctx = TestContext::new().await;
    let short = MaterialCode::parse(&unique_code("MK")).unwrap();
    let exact = MaterialCode::parse(&unique_code("MK")).unwrap();
    ctx.client.create_material(&new_material(&short, 20)).await.unwrap();
    ctx.client.create_material(&new_material(&exact, 8)).await.unwrap();

    let planned = ctx
        .client
        .create_stock_count(&NewStockCount {
            location: None,
            planned_date: Utc::now().date_naive(),
            note: "entegrasyon sayımı".to_owned(),
            material_codes: vec![short.clone(), exact.clone()],
            created_by: String::new(),
        })
        .await
        .unwrap();
    assert_eq!(planned.status, CountStatus::Planned);
    assert_eq!(planned.lines.len(), 2);
    assert!(planned.lines.iter().all(|l| l.counted.is_none()));

    // Completing before starting is refused
    let err = ctx
        .client
        .complete_stock_count(&planned.number, "", &CompleteCount::default())
        .await
        .unwrap_err();
    assert!(err.is_conflict(), "{err}");

    let started = ctx.client.start_stock_count(&planned.number).await.unwrap();
    assert_eq!(started.status, CountStatus::InProgress);

    let counted = CompleteCount {
        counted: vec![
            CountedQuantity {
                material_code: short.clone(),
                counted: 17,
            },
            CountedQuantity {
                material_code: exact.clone(),
                counted: 8,
            },
        ],
    };
    let completed = ctx
        .client
        .complete_stock_count(&planned.number, "", &counted)
        .await
        .unwrap();
    assert_eq!(completed.status, CountStatus::Completed);
    assert!(completed.completed_at.is_some());

    let discrepancies: Vec<_> = completed.discrepancies().collect();
    assert_eq!(discrepancies.len(), 1);
    assert_eq!(discrepancies[0].material_code, short);
    assert_eq!(discrepancies[0].expected, 20);
    assert_eq!(discrepancies[0].difference, Some(-3));

    // The count is a record only; stock still follows the ledger
    assert_eq!(ctx.client.material(&short).await.unwrap().current_stock, 20);
    assert_eq!(ctx.client.material(&exact).await.unwrap().current_stock, 8);

    let err = ctx
        .client
        .complete_stock_count(&planned.number, "", &counted)
        .await
        .unwrap_err();
    assert!(err.is_conflict(), "{err}");

    ctx.client.delete_material(&short).await.unwrap();
    ctx.client.delete_material(&exact).await.unwrap();
    ctx.finish().await.unwrap();
}

#[tokio::test]
#[ignore = "needs a running server"]
async fn test_critical_movement_notifies_admins() {
    let ctx = TestContext::new().await;
    let code = MaterialCode::parse(&unique_code("MK")).unwrap();
    let material = ctx.client.create_material(&new_material(&code, 12)).await.unwrap();
    let unread_before = ctx.client.unread_notifications().await.unwrap();

    ctx.client
        .record_movement(&movement(&code, MovementDirection::Out, 10))
        .await
        .unwrap();

    let title = format!("{} kritik stok seviyesinde", material.name);
    let notifications = ctx.client.notifications().await.unwrap();
    let raised = notifications
        .iter()
        .find(|n| n.kind == NotificationKind::CriticalStock && n.title == title)
        .unwrap();
    assert!(!raised.read);
    assert!(ctx.client.unread_notifications().await.unwrap() > unread_before);

    ctx.client.mark_notification_read(raised.id).await.unwrap();
    let notifications = ctx.client.notifications().await.unwrap();
    assert!(notifications.iter().any(|n| n.id == raised.id && n.read));

    ctx.client.delete_material(&code).await.unwrap();
    ctx.finish().await.unwrap();
}

#[tokio::test]
#[ignore = "needs a running server"]
async fn test_budget_spend_accumulates() {
    let ctx = TestContext::new().await;
    // A far-off year keeps the shared database's current budgets untouched
    let year = 2099;
    let limits = NewBudget {
        year,
        category: Category::Technical,
        monthly_limit: Decimal::from(100),
        annual_limit: Decimal::from(1200),
    };
    ctx.client.set_budget(&limits).await.unwrap();

    let spend = |amount: i64| BudgetSpend {
        year,
        category: Category::Technical,
        amount: Decimal::from(amount),
    };
    let first = ctx.client.record_spend(&spend(200)).await.unwrap();
    let second = ctx.client.record_spend(&spend(300)).await.unwrap();
    assert_eq!(second.used, first.used + Decimal::from(300));
    assert_eq!(second.remaining, second.annual_limit - second.used);

    let summary = ctx.client.budget(Some(year)).await.unwrap();
    let technical = summary
        .categories
        .iter()
        .find(|b| b.category == Category::Technical)
        .unwrap();
    assert_eq!(technical.used, second.used);

    // Spending needs limits set first
    let unbudgeted = BudgetSpend {
        year: 2098,
        category: Category::Other,
        amount: Decimal::from(10),
    };
    let err = ctx.client.record_spend(&unbudgeted).await.unwrap_err();
    assert!(err.is_not_found(), "{err}");

    ctx.finish().await.unwrap();
}

#[tokio::test]
#[ignore = "needs a running server"]
async fn test_user_update_closes_their_sessions() {
    let ctx = TestContext::new().await;
    let username = unique_code("US").to_lowercase();
    let password = format!("{username}-parola");
    ctx.client
        .create_user(&NewUser {
            username: username.clone(),
            full_name: "Entegrasyon Kullanıcısı".to_owned(),
            email: String::new(),
            department: "Depo".to_owned(),
            role: UserRole::Manager,
            active: true,
            password: password.clone(),
        })
        .await
        .unwrap();

    let other = ApiClient::new(ctx.client.config().clone()).unwrap();
    let signed_in = other
        .login(&username, &SecretString::from(password.clone()))
        .await
        .unwrap();
    assert_eq!(signed_in.role, UserRole::Manager);

    let demoted = ctx
        .client
        .update_user(
            &username,
            &UserUpdate {
                full_name: "Entegrasyon Kullanıcısı".to_owned(),
                email: String::new(),
                department: "Depo".to_owned(),
                role: UserRole::User,
                active: false,
            },
        )
        .await
        .unwrap();
    assert_eq!(demoted.role, UserRole::User);
    assert!(!demoted.active);

    // The old session no longer carries the old role
    let err = other.me().await.unwrap_err();
    assert!(err.is_unauthorized(), "{err}");

    // Deactivated users cannot sign in again
    let err = other
        .login(&username, &SecretString::from(password))
        .await
        .unwrap_err();
    assert!(err.is_unauthorized(), "{err}");

    ctx.finish().await.unwrap();
}
