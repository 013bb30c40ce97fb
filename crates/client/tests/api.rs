//! `ApiClient` and `Dashboard` against a mock HTTP server.

#![allow(clippy::unwrap_used)]

use httpmock::prelude::*;
use secrecy::SecretString;
use serde_json::{Value, json};

use envanter_client::{ApiClient, ClientConfig, ClientError, Dashboard, Page};
use envanter_core::models::{BudgetSpend, MaterialFilter};
use envanter_core::{Category, MaterialCode, OrderNo, OrderStatus, RequestNo};

const TOKEN: &str = "tok-123";

fn client(server: &MockServer) -> ApiClient {
    ApiClient::new(ClientConfig::new(&server.url("/api")).unwrap()).unwrap()
}

fn user_json(role: &str) -> Value {
    json!({
        "username": "ayse",
        "ad_soyad": "Ayşe Yılmaz",
        "email": "ayse@example.com",
        "departman": "İdari İşler",
        "rol": role,
        "aktif": true
    })
}

fn material_json(code: &str, stock: i64, status: &str) -> Value {
    json!({
        "kod": code,
        "ad": "A4 Kağıt",
        "kategori": "Kırtasiye",
        "birim": "Paket",
        "mevcut_stok": stock,
        "min_seviye": 10,
        "max_seviye": 100,
        "konum": "DEPO-A",
        "raf": "R1",
        "barkod": "869000000001",
        "birim_fiyat": "45.50",
        "durum": status
    })
}

fn order_json(status: &str) -> Value {
    json!({
        "siparis_no": "SIP000001",
        "tarih": "2026-10-01T09:00:00Z",
        "tedarikci_kodu": "TED001",
        "tedarikci_adi": "Ofis Dünyası",
        "kalemler": [
            {"malzeme_kodu": "MLZ001", "malzeme_adi": "A4 Kağıt", "miktar": 4, "birim_fiyat": "45.50", "toplam": "182.00"}
        ],
        "notlar": "",
        "toplam_tutar": "182.00",
        "durum": status,
        "olusturan": "Ayşe Yılmaz",
        "onaylayan": ""
    })
}

fn notification_json(id: i64, read: bool) -> Value {
    json!({
        "id": id,
        "tarih": "2026-10-03T08:00:00Z",
        "kullanici": "Yönetici",
        "tip": "Sistem",
        "baslik": "Yeni talep oluşturuldu",
        "mesaj": "TLP000001 - A4 Kağıt (10 adet)",
        "link": "/requests",
        "okundu": read
    })
}

async fn signed_in(server: &MockServer, role: &str) -> ApiClient {
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/auth/login");
            then.status(200)
                .json_body(json!({ "user": user_json(role), "token": TOKEN }));
        })
        .await;
    let client = client(server);
    client
        .login("ayse", &SecretString::from("parola123"))
        .await
        .unwrap();
    client
}

#[tokio::test]
async fn test_login_stores_token_for_later_calls() {
    let server = MockServer::start_async().await;
    let client = signed_in(&server, "Yönetici").await;
    assert!(client.has_token().await);

    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/materials/critical")
                .header("authorization", format!("Bearer {TOKEN}"));
            then.status(200)
                .json_body(json!([material_json("MLZ001", 4, "Kritik")]));
        })
        .await;

    let critical = client.critical_materials().await.unwrap();
    mock.assert_async().await;
    assert_eq!(critical.len(), 1);
    assert!(critical.iter().all(envanter_core::models::Material::is_critical));
}

#[tokio::test]
async fn test_calls_without_session_fail_locally() {
    let server = MockServer::start_async().await;
    let client = client(&server);

    let err = client.dashboard().await.unwrap_err();
    assert!(matches!(err, ClientError::NotSignedIn));
    assert!(err.is_unauthorized());
}

#[tokio::test]
async fn test_wrong_password_is_unauthorized() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/auth/login");
            then.status(401)
                .json_body(json!({ "detail": "Unauthorized: Invalid username or password" }));
        })
        .await;

    let err = client(&server)
        .login("ayse", &SecretString::from("wrong"))
        .await
        .unwrap_err();
    assert!(err.is_unauthorized());
    assert!(err.to_string().contains("Invalid username or password"));
}

#[tokio::test]
async fn test_filter_is_sent_as_query() {
    let server = MockServer::start_async().await;
    let client = signed_in(&server, "Kullanıcı").await;

    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/materials")
                .query_param("kategori", "Kırtasiye")
                .query_param("arama", "kağıt");
            then.status(200)
                .json_body(json!([material_json("MLZ001", 40, "Normal")]));
        })
        .await;

    let filter = MaterialFilter {
        category: Some(Category::Stationery),
        status: None,
        search: Some("kağıt".to_string()),
    };
    let materials = client.materials(&filter).await.unwrap();
    mock.assert_async().await;
    assert_eq!(materials[0].current_stock, 40);
}

#[tokio::test]
async fn test_inconsistent_status_is_rejected() {
    let server = MockServer::start_async().await;
    let client = signed_in(&server, "Kullanıcı").await;

    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/materials/MLZ001");
            then.status(200)
                .json_body(material_json("MLZ001", 4, "Normal"));
        })
        .await;

    let err = client
        .material(&MaterialCode::parse("MLZ001").unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Validation(_)));
}

#[tokio::test]
async fn test_unknown_enum_label_is_a_decode_error() {
    let server = MockServer::start_async().await;
    let client = signed_in(&server, "Kullanıcı").await;

    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/orders/SIP000001");
            then.status(200).json_body(order_json("İptal"));
        })
        .await;

    let err = client
        .order(&OrderNo::parse("SIP000001").unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Decode(_)));
}

#[tokio::test]
async fn test_order_status_update_sends_target_and_approver() {
    let server = MockServer::start_async().await;
    let client = signed_in(&server, "Yönetici").await;

    let mock = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path("/api/orders/SIP000001/status")
                .query_param("durum", "Onaylandı")
                .query_param("onaylayan", "Ayşe Yılmaz");
            then.status(200).json_body(order_json("Onaylandı"));
        })
        .await;

    let order = client
        .update_order_status(
            &OrderNo::parse("SIP000001").unwrap(),
            OrderStatus::Approved,
            "Ayşe Yılmaz",
        )
        .await
        .unwrap();
    mock.assert_async().await;
    assert_eq!(order.status, OrderStatus::Approved);
}

#[tokio::test]
async fn test_conflict_is_reported() {
    let server = MockServer::start_async().await;
    let client = signed_in(&server, "Yönetici").await;

    server
        .mock_async(|when, then| {
            when.method(PUT).path("/api/requests/TLP000003/approve");
            then.status(409)
                .json_body(json!({ "detail": "Conflict: request TLP000003 is already Onaylandı" }));
        })
        .await;

    let err = client
        .approve_request(&RequestNo::parse("TLP000003").unwrap(), "Ayşe")
        .await
        .unwrap_err();
    assert!(err.is_conflict());
}

#[tokio::test]
async fn test_blank_rejection_reason_is_not_sent() {
    let server = MockServer::start_async().await;
    let client = signed_in(&server, "Yönetici").await;

    let mock = server
        .mock_async(|when, then| {
            when.method(PUT).path("/api/requests/TLP000003/reject");
            then.status(200);
        })
        .await;

    let err = client
        .reject_request(&RequestNo::parse("TLP000003").unwrap(), "Ayşe", "   ")
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Validation(_)));
    mock.assert_hits_async(0).await;
}

#[tokio::test]
async fn test_bulk_delete_counts_successes() {
    let server = MockServer::start_async().await;
    let client = signed_in(&server, "Kullanıcı").await;

    for code in ["MLZ001", "MLZ003"] {
        server
            .mock_async(|when, then| {
                when.method(DELETE).path(format!("/api/materials/{code}"));
                then.status(200).json_body(json!({ "message": "Malzeme silindi" }));
            })
            .await;
    }
    server
        .mock_async(|when, then| {
            when.method(DELETE).path("/api/materials/MLZ002");
            then.status(404).json_body(json!({ "detail": "Not found" }));
        })
        .await;

    let codes: Vec<MaterialCode> = ["MLZ001", "MLZ002", "MLZ003"]
        .into_iter()
        .map(|c| MaterialCode::parse(c).unwrap())
        .collect();
    let report = client.bulk_delete_materials(&codes).await;

    assert_eq!(report.success_count(), 2);
    assert_eq!(report.failed.len(), 1);
    assert!(report.failed.iter().all(|(code, e)| code.as_str() == "MLZ002" && e.is_not_found()));
}

#[tokio::test]
async fn test_dashboard_refresh_tolerates_failures() {
    let server = MockServer::start_async().await;
    let client = signed_in(&server, "Yönetici").await;

    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/dashboard");
            then.status(200).json_body(json!({
                "toplam_malzeme": 1,
                "toplam_stok_degeri": "182.00",
                "kritik_stok_sayisi": 1,
                "bekleyen_talep_sayisi": 1,
                "bekleyen_siparis_sayisi": 1,
                "kategori_dagilimi": { "Kırtasiye": 1 },
                "aylik_harcama": "1250.00",
                "butce_durumu": {
                    "toplam": "60000.00",
                    "kullanilan": "15000.00",
                    "kalan": "45000.00",
                    "oran": "25.00"
                }
            }));
        })
        .await;
    for path in ["/api/materials", "/api/materials/critical"] {
        server
            .mock_async(|when, then| {
                when.method(GET).path(path);
                then.status(200)
                    .json_body(json!([material_json("MLZ001", 4, "Kritik")]));
            })
            .await;
    }
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/requests");
            then.status(200).json_body(json!([{
                "talep_no": "TLP000001",
                "tarih": "2026-10-02T10:00:00Z",
                "malzeme_kodu": "MLZ001",
                "malzeme_adi": "A4 Kağıt",
                "miktar": 10,
                "oncelik": "Yüksek",
                "talep_eden": "Mehmet",
                "departman": "Muhasebe",
                "durum": "Beklemede"
            }]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/orders");
            then.status(200).json_body(json!([order_json("Onay Bekliyor")]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/notifications");
            then.status(200).json_body(json!([
                notification_json(2, false),
                notification_json(1, true)
            ]));
        })
        .await;
    // movements and suppliers are not mocked and answer 404.

    let mut dashboard = Dashboard::new(client);
    let failures = dashboard.navigate(Page::Orders).await;

    // navigate only refetches for a signed-in dashboard; sign in through it.
    assert!(failures.is_empty());
    let failures = dashboard
        .login("ayse", &SecretString::from("parola123"))
        .await
        .unwrap();

    assert_eq!(failures.len(), 2);
    assert!(failures.iter().all(ClientError::is_not_found));
    assert_eq!(dashboard.page(), Page::Orders);
    assert_eq!(dashboard.data().stats.as_ref().unwrap().critical_count, 1);
    assert!(dashboard.data().movements.is_empty());
    assert_eq!(dashboard.pending_request_count(), 1);
    assert_eq!(dashboard.unread_notification_count(), 1);
    assert_eq!(
        dashboard.data().stats.as_ref().unwrap().budget.ratio.to_string(),
        "25.00"
    );
    assert!(dashboard.can_review());

    let order = dashboard.data().orders.first().unwrap().clone();
    let action = dashboard.next_order_action(&order).unwrap();
    assert_eq!(action.target, OrderStatus::Approved);

    let line = dashboard
        .order_line_for(
            &MaterialCode::parse("MLZ001").unwrap(),
            envanter_core::Quantity::new(3).unwrap(),
        )
        .unwrap();
    assert_eq!(line.material_name, "A4 Kağıt");
    assert_eq!(line.unit_price.to_string(), "45.50");
}

#[tokio::test]
async fn test_budget_spend_is_sent_as_query() {
    let server = MockServer::start_async().await;
    let client = signed_in(&server, "Yönetici").await;

    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/budget/update")
                .query_param("yil", "2026")
                .query_param("kategori", "Mutfak")
                .query_param("harcama", "1500.50");
            then.status(200).json_body(json!({
                "yil": 2026,
                "kategori": "Mutfak",
                "aylik_limit": "2000.00",
                "yillik_limit": "24000.00",
                "kullanilan": "25500.50",
                "kalan": "-1500.50"
            }));
        })
        .await;

    let spend = BudgetSpend {
        year: 2026,
        category: Category::Kitchen,
        amount: "1500.50".parse().unwrap(),
    };
    let budget = client.record_spend(&spend).await.unwrap();

    mock.assert_async().await;
    assert_eq!(budget.overrun().unwrap().to_string(), "1500.50");
}

#[tokio::test]
async fn test_zero_spend_is_not_sent() {
    let server = MockServer::start_async().await;
    let client = signed_in(&server, "Admin").await;

    let spend = BudgetSpend {
        year: 2026,
        category: Category::Technical,
        amount: rust_decimal::Decimal::ZERO,
    };
    let err = client.record_spend(&spend).await.unwrap_err();
    assert!(matches!(err, ClientError::Validation(_)));
}

#[tokio::test]
async fn test_unread_count_and_mark_read() {
    let server = MockServer::start_async().await;
    let client = signed_in(&server, "Kullanıcı").await;

    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/notifications/unread/count");
            then.status(200).json_body(json!({ "count": 3 }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(PUT).path("/api/notifications/99/read");
            then.status(404).json_body(json!({ "detail": "Not found: Bildirim bulunamadı" }));
        })
        .await;

    assert_eq!(client.unread_notifications().await.unwrap(), 3);
    let err = client
        .mark_notification_read(envanter_core::NotificationId::new(99))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}
