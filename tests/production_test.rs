mod common;

use chrono::{Duration, Utc};
use common::{AuthHelper, TestApiClient, TestApp, TestUser};
use reqwest::{Method, StatusCode};
use rust_decimal_macros::dec;
use serde_json::json;
use sweet_swirls::{
    client::pages::{request_actions, ActionError, ProductionPage, WastePage},
    models::production::{
        BatchStatus, CreateBatchRequest, CreateProductionRequestRequest, Priority, RecordWasteRequest,
        RequestStatus, WasteReason,
    },
};

fn is_lot_code(code: &str) -> bool {
    let Some((date, seq)) = code.split_once('-') else {
        return false;
    };
    date.len() == 8
        && seq.len() == 3
        && date.chars().all(|c| c.is_ascii_digit())
        && seq.chars().all(|c| c.is_ascii_digit())
}

#[tokio::test]
async fn request_moves_through_its_lifecycle() {
    let app = TestApp::spawn().await;
    let seeder = TestApiClient::new(&app, TestUser::Admin).await;
    let shop = seeder.location("Main Shop").await;
    let vanilla = seeder.item_by_sku("VAN-BASE-001").await;
    let now = Utc::now();

    let shift = AuthHelper::new(&app).login_as(TestUser::ShiftLead).await;
    let mut page = ProductionPage::new(shift.api().clone());
    page.load().await;
    assert!(!page.can_manage());

    let form = CreateProductionRequestRequest {
        product_item_id: vanilla.id,
        location_id: shop.id,
        needed_by: now + Duration::days(1),
        target_quantity: dec!(5),
        unit: "gallons".into(),
        priority: Priority::High,
        reason: "Weekend rush".into(),
    };
    let request = page.create_request(&form, now).await.unwrap();
    assert_eq!(request.status, RequestStatus::Open);
    assert_eq!(request.requested_by, shift.user().unwrap().id);
    assert_eq!(
        request_actions(&request),
        vec![RequestStatus::InProgress, RequestStatus::Archived]
    );

    // Quem não gerencia a produção não move o pedido
    let err = page.transition_request(request.id, RequestStatus::InProgress).await.unwrap_err();
    assert!(matches!(err, ActionError::Failed(message) if message.contains("permission")));

    let lead = AuthHelper::new(&app).login_as(TestUser::ProductionLead).await;
    let mut page = ProductionPage::new(lead.api().clone());
    page.load().await;
    assert!(page.can_manage());

    let started = page.transition_request(request.id, RequestStatus::InProgress).await.unwrap();
    assert_eq!(started.status, RequestStatus::InProgress);

    // Não dá para voltar para OPEN
    let err = page.transition_request(request.id, RequestStatus::Open).await.unwrap_err();
    assert_eq!(err, ActionError::Failed("Cannot move from IN_PROGRESS to OPEN".into()));

    let completed = page.transition_request(request.id, RequestStatus::Completed).await.unwrap();
    assert_eq!(completed.status, RequestStatus::Completed);
    assert_eq!(request_actions(&completed), vec![RequestStatus::Archived]);

    let archived = page.transition_request(request.id, RequestStatus::Archived).await.unwrap();
    assert_eq!(archived.status, RequestStatus::Archived);
    assert!(request_actions(&archived).is_empty());
    assert_eq!(
        page.state.data().unwrap().requests.iter().find(|r| r.id == request.id).unwrap().status,
        RequestStatus::Archived
    );

    let err = page.delete_request(request.id).await.unwrap_err();
    assert_eq!(err, ActionError::Failed("Only open requests can be deleted".into()));
}

#[tokio::test]
async fn past_needed_by_dates_are_rejected_before_sending() {
    let app = TestApp::spawn().await;
    let seeder = TestApiClient::new(&app, TestUser::Admin).await;
    let shop = seeder.location("Main Shop").await;
    let vanilla = seeder.item_by_sku("VAN-BASE-001").await;
    let now = Utc::now();

    let lead = AuthHelper::new(&app).login_as(TestUser::ProductionLead).await;
    let mut page = ProductionPage::new(lead.api().clone());
    page.load().await;

    let form = CreateProductionRequestRequest {
        product_item_id: vanilla.id,
        location_id: shop.id,
        needed_by: now - Duration::hours(1),
        target_quantity: dec!(5),
        unit: "gallons".into(),
        priority: Priority::Normal,
        reason: "Restock".into(),
    };
    let Err(ActionError::Form(errors)) = page.create_request(&form, now).await else {
        panic!("expected form errors");
    };
    assert_eq!(errors.get("neededBy"), Some("Needed-by date must be in the future."));
    assert!(lead.api().list_requests(None, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn open_requests_can_be_deleted_and_overdue_ones_are_listed() {
    let app = TestApp::spawn().await;
    let seeder = TestApiClient::new(&app, TestUser::ShiftLead).await;
    let shop = seeder.location("Main Shop").await;
    let chocolate = seeder.item_by_sku("CHOC-BASE-001").await;
    let request = seeder.create_request(&chocolate, shop.id).await;

    // Pedido já vencido, criado direto na API
    let late = seeder
        .raw(
            Method::POST,
            "/production/requests",
            Some(json!({
                "productItemId": chocolate.id,
                "locationId": shop.id,
                "neededBy": Utc::now() - Duration::hours(3),
                "targetQuantity": 2,
                "unit": "gallons",
                "reason": "Forgot yesterday",
            })),
        )
        .await;
    assert_eq!(late.status(), StatusCode::CREATED);

    let lead = AuthHelper::new(&app).login_as(TestUser::ProductionLead).await;
    let overdue = lead.api().overdue_requests().await.unwrap();
    assert_eq!(overdue.len(), 1);
    assert_eq!(overdue[0].reason, "Forgot yesterday");
    assert_eq!(overdue[0].priority, Priority::Normal);

    let open = lead.api().list_requests(Some(RequestStatus::Open), Some(shop.id)).await.unwrap();
    assert_eq!(open.len(), 2);

    lead.api().delete_request(request.id).await.unwrap();
    let err = lead.api().get_request(request.id).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn batches_move_stock_in_and_out_of_storage() {
    let app = TestApp::spawn().await;
    let seeder = TestApiClient::new(&app, TestUser::Admin).await;
    let freezer = seeder.location("Freezer A").await;
    let shop = seeder.location("Main Shop").await;
    let vanilla = seeder.item_by_sku("VAN-BASE-001").await;

    let lead = AuthHelper::new(&app).login_as(TestUser::ProductionLead).await;
    let mut page = ProductionPage::new(lead.api().clone());
    page.load().await;
    assert!(page.can_record_batches());

    let form = CreateBatchRequest {
        product_item_id: vanilla.id,
        quantity_made: dec!(12),
        unit: "gallons".into(),
        storage_location_id: freezer.id,
        notes: None,
    };
    let first = page.create_batch(&form).await.unwrap();
    assert_eq!(first.status, BatchStatus::InProgress);
    assert!(is_lot_code(&first.lot_code), "{}", first.lot_code);
    assert!(first.lot_code.ends_with("-001"));
    assert_eq!(seeder.stock_of(vanilla.id, freezer.id).await, dec!(12));

    let second = page.create_batch(&CreateBatchRequest { quantity_made: dec!(3), ..form.clone() }).await.unwrap();
    assert!(second.lot_code.ends_with("-002"));
    assert_eq!(&second.lot_code[..8], &first.lot_code[..8]);
    assert_eq!(seeder.stock_of(vanilla.id, freezer.id).await, dec!(15));

    // Lotes não ficam na loja
    let err = page
        .create_batch(&CreateBatchRequest { storage_location_id: shop.id, ..form.clone() })
        .await
        .unwrap_err();
    assert!(matches!(err, ActionError::Failed(_)));
    let response = seeder
        .raw(
            Method::POST,
            "/production/batches",
            Some(json!({
                "productItemId": vanilla.id,
                "quantityMade": 1,
                "unit": "gallons",
                "storageLocationId": shop.id,
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Esgotar exige lote concluído
    let err = page.run_out_batch(first.id).await.unwrap_err();
    assert!(matches!(err, ActionError::Failed(_)));

    let completed = page.complete_batch(first.id).await.unwrap();
    assert_eq!(completed.status, BatchStatus::Completed);
    assert!(completed.finished_at.is_some());

    let run_out = page.run_out_batch(first.id).await.unwrap();
    assert_eq!(run_out.status, BatchStatus::RunOut);
    assert_eq!(seeder.stock_of(vanilla.id, freezer.id).await, dec!(3));
}

#[tokio::test]
async fn shift_leads_cannot_record_batches() {
    let app = TestApp::spawn().await;
    let shift = TestApiClient::new(&app, TestUser::ShiftLead).await;
    let freezer = shift.location("Freezer B").await;
    let vanilla = shift.item_by_sku("VAN-BASE-001").await;

    let response = shift
        .raw(
            Method::POST,
            "/production/batches",
            Some(json!({
                "productItemId": vanilla.id,
                "quantityMade": 4,
                "unit": "gallons",
                "storageLocationId": freezer.id,
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let auth = AuthHelper::new(&app).login_as(TestUser::ShiftLead).await;
    let page = ProductionPage::new(auth.api().clone());
    assert!(!page.can_record_batches());
}

#[tokio::test]
async fn waste_reduces_batch_stock_until_the_batch_runs_out() {
    let app = TestApp::spawn().await;
    let admin = TestApiClient::new(&app, TestUser::Admin).await;
    let freezer = admin.location("Freezer A").await;
    let chocolate = admin.item_by_sku("CHOC-BASE-001").await;

    let batch = admin.create_batch(&chocolate, freezer.id, dec!(10)).await;
    let spent = admin.create_batch(&chocolate, freezer.id, dec!(2)).await;
    admin.complete_batch(spent.id).await;
    admin.run_out(spent.id).await;
    assert_eq!(admin.stock_of(chocolate.id, freezer.id).await, dec!(10));

    let shift = AuthHelper::new(&app).login_as(TestUser::ShiftLead).await;
    let mut page = WastePage::new(shift.api().clone());
    page.load().await;
    let selectable: Vec<_> = page.selectable_batches().iter().map(|b| b.id).collect();
    assert_eq!(selectable, vec![batch.id]);

    let form = RecordWasteRequest {
        batch_id: Some(batch.id),
        item_id: chocolate.id,
        quantity: dec!(1.5),
        unit: "gallons".into(),
        reason: WasteReason::TemperatureExcursion,
        notes: Some("Freezer door left open".into()),
    };
    let event = page.record(&form).await.unwrap();
    assert_eq!(event.batch_id, Some(batch.id));
    assert_eq!(page.state.data().unwrap().events.len(), 1);
    assert_eq!(admin.stock_of(chocolate.id, freezer.id).await, dec!(8.5));

    let err = page
        .record(&RecordWasteRequest { batch_id: Some(spent.id), ..form.clone() })
        .await
        .unwrap_err();
    assert_eq!(err, ActionError::Failed("Cannot record waste for run out batch".into()));

    // Quantidade zero nem sai do cliente
    let Err(ActionError::Form(errors)) = page.record(&RecordWasteRequest { quantity: dec!(0), ..form }).await else {
        panic!("expected form errors");
    };
    assert!(errors.get("quantity").is_some());

    let history = shift.api().batch_waste(batch.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].reason, WasteReason::TemperatureExcursion);
}

#[tokio::test]
async fn waste_without_a_batch_leaves_stock_alone() {
    let app = TestApp::spawn().await;
    let admin = TestApiClient::new(&app, TestUser::Admin).await;
    let shop = admin.location("Main Shop").await;
    let chips = admin.item_by_sku("CHOC-CHIP-001").await;
    admin.count_stock(shop.id, &chips, dec!(6)).await;

    let response = admin
        .raw(
            Method::POST,
            "/production/waste",
            Some(json!({
                "itemId": chips.id,
                "quantity": 1,
                "unit": chips.unit,
                "reason": "ACCIDENT",
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(admin.stock_of(chips.id, shop.id).await, dec!(6));

    let team = TestApiClient::new(&app, TestUser::TeamMember).await;
    let response = team
        .raw(
            Method::POST,
            "/production/waste",
            Some(json!({ "itemId": chips.id, "quantity": 1, "unit": chips.unit, "reason": "SPOILAGE" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
