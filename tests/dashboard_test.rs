mod common;

use chrono::{Duration, Timelike, Utc};
use common::{AuthHelper, TestApiClient, TestApp, TestUser};
use reqwest::Method;
use rust_decimal_macros::dec;
use serde_json::json;
use sweet_swirls::client::{
    dashboard::RECENT_WASTE_LIMIT,
    pages::{greeting, DashboardPage, PageState},
};

#[tokio::test]
async fn dashboard_summarizes_the_day() {
    let app = TestApp::spawn().await;
    let admin = TestApiClient::new(&app, TestUser::Admin).await;
    let shop = admin.location("Main Shop").await;
    let freezer = admin.location("Freezer A").await;
    let vanilla = admin.item_by_sku("VAN-BASE-001").await;
    let chocolate = admin.item_by_sku("CHOC-BASE-001").await;
    let water = admin.item_by_sku("WATER-001").await;
    let caramel = admin.item_by_sku("CAR-SWIRL-001").await;

    let session = admin.start_session(shop.id).await;
    admin.add_line(session.id, &vanilla, dec!(4)).await;
    admin.add_line(session.id, &chocolate, dec!(20)).await;
    admin.add_line(session.id, &water, dec!(2)).await;
    admin.close_session(session.id).await;

    let batch = admin.create_batch(&caramel, freezer.id, dec!(3)).await;
    admin.create_request(&vanilla, shop.id).await;

    for _ in 0..RECENT_WASTE_LIMIT + 2 {
        let response = admin
            .raw(
                Method::POST,
                "/production/waste",
                Some(json!({ "itemId": water.id, "quantity": 1, "unit": "cases", "reason": "ACCIDENT" })),
            )
            .await;
        assert!(response.status().is_success());
    }

    let auth = AuthHelper::new(&app).login_as(TestUser::TeamMember).await;
    let now = Utc::now().fixed_offset();
    let data = auth.api().get_dashboard_data(now).await.unwrap();

    let below_par = auth.api().below_par(None).await.unwrap();
    assert_eq!(data.low_stock_items.len(), below_par.len());
    assert_eq!(data.low_stock_items.len(), 3);
    assert!(data.low_stock_items.iter().all(|s| s.item.is_some() && s.location.is_some()));
    assert!(!data.low_stock_items.iter().any(|s| s.item_id == chocolate.id));

    assert_eq!(data.open_requests.len(), 1);
    assert_eq!(data.todays_batches.len(), 1);
    assert_eq!(data.todays_batches[0].id, batch.id);
    assert_eq!(data.recent_waste.len(), RECENT_WASTE_LIMIT);

    // Sem mudanças no servidor, o painel não muda
    let again = auth.api().get_dashboard_data(now).await.unwrap();
    assert_eq!(again, data);

    // Visto de dois dias à frente, o lote já não é de hoje
    let later = auth.api().get_dashboard_data(now + Duration::days(2)).await.unwrap();
    assert!(later.todays_batches.is_empty());
    assert_eq!(later.low_stock_items, data.low_stock_items);
}

#[tokio::test]
async fn dashboard_page_greets_the_user() {
    let app = TestApp::spawn().await;
    let auth = AuthHelper::new(&app).login_as(TestUser::ShiftLead).await;
    let name = auth.user().unwrap().name;

    let now = Utc::now().fixed_offset();
    let mut page = DashboardPage::new(auth.api().clone());
    page.load(now).await;

    let data = page.state.data().expect("dashboard loaded");
    assert!(data.low_stock_items.is_empty());
    assert!(data.open_requests.is_empty());
    assert_eq!(page.headline(now), format!("{}, {}", greeting(now.hour()), name));
}

#[tokio::test]
async fn dashboard_without_a_session_redirects_to_login() {
    let app = TestApp::spawn().await;
    let mut page = DashboardPage::new(app.client());
    page.load(Utc::now().fixed_offset()).await;
    assert_eq!(page.state, PageState::RedirectToLogin);
}
