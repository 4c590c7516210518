//! Demo dataset
//!
//! Seeds the in-memory repositories with a small Lagos operation: three
//! DAs, a warehouse across every stock-health band, and orders parked at
//! each stage of the delivery lifecycle. Bearer tokens for one user per
//! role are fixed so the dashboard can be driven straight away; they are
//! printed to the log on startup.

use chrono::{Duration, Utc};

use crate::app::hash_token;
use crate::domain::entities::{
    FlagSubject, FraudReason, FraudSeverity, LineItem, NewDeliveryAgent, NewDeliveryOrder,
    NewFraudFlag, NewPayment, NewProductStock, NewStockReturn, NewUser, PaymentChannel,
    PaymentMethod, ReturnReason, Role, Sku,
};
use crate::domain::ports::{
    AgentRepository, DeliveryRepository, FraudFlagRepository, PaymentRepository, ReturnRepository,
    StockRepository, UserRepository,
};
use crate::error::DomainError;

pub const DEMO_ADMIN_TOKEN: &str = "fl-demo-admin";
pub const DEMO_SUPERVISOR_TOKEN: &str = "fl-demo-supervisor";
pub const DEMO_OFFICER_TOKEN: &str = "fl-demo-officer";
pub const DEMO_DA_TOKEN: &str = "fl-demo-da";
/// OTP on the seeded out-for-delivery order
pub const DEMO_OTP: &str = "123456";

/// Populate every repository with the demo operation
#[allow(clippy::too_many_arguments)]
pub async fn seed_demo(
    users: &dyn UserRepository,
    agents: &dyn AgentRepository,
    stocks: &dyn StockRepository,
    deliveries: &dyn DeliveryRepository,
    payments: &dyn PaymentRepository,
    flags: &dyn FraudFlagRepository,
    returns: &dyn ReturnRepository,
) -> Result<(), DomainError> {
    let now = Utc::now();

    // Delivery agents
    let emeka = agents
        .create(&NewDeliveryAgent {
            name: "Emeka Obi".to_string(),
            phone: "08031112233".to_string(),
            territory: "Surulere".to_string(),
        })
        .await?;
    let aisha = agents
        .create(&NewDeliveryAgent {
            name: "Aisha Bello".to_string(),
            phone: "08052223344".to_string(),
            territory: "Ikeja".to_string(),
        })
        .await?;
    let yusuf = agents
        .create(&NewDeliveryAgent {
            name: "Yusuf Danladi".to_string(),
            phone: "07013334455".to_string(),
            territory: "Yaba".to_string(),
        })
        .await?;

    // Staff and the DA login
    let admin = users
        .create(&NewUser {
            name: "Funke Alade".to_string(),
            phone: Some("08091234567".to_string()),
            role: Role::Admin,
            da_id: None,
            token_hash: hash_token(DEMO_ADMIN_TOKEN),
        })
        .await?;
    let supervisor = users
        .create(&NewUser {
            name: "Ngozi Eze".to_string(),
            phone: Some("08081234567".to_string()),
            role: Role::Supervisor,
            da_id: None,
            token_hash: hash_token(DEMO_SUPERVISOR_TOKEN),
        })
        .await?;
    users
        .create(&NewUser {
            name: "Tunde Bakare".to_string(),
            phone: Some("09071234567".to_string()),
            role: Role::InventoryOfficer,
            da_id: None,
            token_hash: hash_token(DEMO_OFFICER_TOKEN),
        })
        .await?;
    users
        .create(&NewUser {
            name: "Emeka Obi".to_string(),
            phone: Some(emeka.phone.clone()),
            role: Role::DeliveryAgent,
            da_id: Some(emeka.id),
            token_hash: hash_token(DEMO_DA_TOKEN),
        })
        .await?;

    // Warehouse: one SKU per stock-health band
    let water = Sku::from("SKU-BEV-001");
    let cola = Sku::from("SKU-BEV-002");
    let detergent = Sku::from("SKU-HHG-001");
    let noodles = Sku::from("SKU-FD-001");
    let oil = Sku::from("SKU-FD-002");

    stocks
        .create_product(&NewProductStock {
            sku: water.clone(),
            name: "Bottled Water 75cl (x12)".to_string(),
            category: "Beverages".to_string(),
            unit_price_kobo: 180_000,
            warehouse_qty: 340,
            reorder_level: 100,
        })
        .await?;
    stocks
        .create_product(&NewProductStock {
            sku: cola.clone(),
            name: "Cola 50cl (x24)".to_string(),
            category: "Beverages".to_string(),
            unit_price_kobo: 620_000,
            warehouse_qty: 72,
            reorder_level: 80,
        })
        .await?;
    stocks
        .create_product(&NewProductStock {
            sku: detergent.clone(),
            name: "Detergent 900g".to_string(),
            category: "Household".to_string(),
            unit_price_kobo: 145_000,
            warehouse_qty: 18,
            reorder_level: 60,
        })
        .await?;
    stocks
        .create_product(&NewProductStock {
            sku: noodles.clone(),
            name: "Instant Noodles (x40)".to_string(),
            category: "Food".to_string(),
            unit_price_kobo: 780_000,
            warehouse_qty: 0,
            reorder_level: 40,
        })
        .await?;
    stocks
        .create_product(&NewProductStock {
            sku: oil.clone(),
            name: "Vegetable Oil 3L".to_string(),
            category: "Food".to_string(),
            unit_price_kobo: 510_000,
            warehouse_qty: 150,
            reorder_level: 50,
        })
        .await?;

    // Consignments in the field
    stocks.transfer_to_da(&emeka.id, &water, 40).await?;
    stocks.transfer_to_da(&emeka.id, &oil, 12).await?;
    stocks.transfer_to_da(&aisha.id, &water, 25).await?;
    stocks.transfer_to_da(&aisha.id, &cola, 10).await?;
    stocks.transfer_to_da(&yusuf.id, &detergent, 8).await?;

    // Orders at every lifecycle stage.
    // Emeka: one waiting for dispatch, one on the road (OTP 123456).
    deliveries
        .create(
            &NewDeliveryOrder {
                da_id: emeka.id,
                customer_name: "Mrs. Adeyemi".to_string(),
                customer_phone: "08034445566".to_string(),
                customer_address: "14 Bode Thomas St, Surulere".to_string(),
                items: vec![line(&water, 6, 180_000)],
                payment_method: PaymentMethod::PayOnDelivery,
            },
            6 * 180_000,
        )
        .await?;

    let on_the_road = deliveries
        .create(
            &NewDeliveryOrder {
                da_id: emeka.id,
                customer_name: "Mr. Adio".to_string(),
                customer_phone: "08055556677".to_string(),
                customer_address: "3 Ogunlana Dr, Surulere".to_string(),
                items: vec![line(&oil, 2, 510_000)],
                payment_method: PaymentMethod::PayOnDelivery,
            },
            2 * 510_000,
        )
        .await?;
    deliveries
        .dispatch(&on_the_road.id, &hash_token(DEMO_OTP), now - Duration::hours(2))
        .await?;

    // Aisha: delivered and fully approvable, plus an already-approved one.
    let approvable = deliveries
        .create(
            &NewDeliveryOrder {
                da_id: aisha.id,
                customer_name: "Chief Balogun".to_string(),
                customer_phone: "08066667788".to_string(),
                customer_address: "22 Allen Ave, Ikeja".to_string(),
                items: vec![line(&water, 10, 180_000), line(&cola, 2, 620_000)],
                payment_method: PaymentMethod::PayOnDelivery,
            },
            10 * 180_000 + 2 * 620_000,
        )
        .await?;
    deliveries
        .dispatch(&approvable.id, &hash_token("998877"), now - Duration::hours(20))
        .await?;
    deliveries
        .mark_delivered(&approvable.id, now - Duration::hours(10))
        .await?;
    deliveries
        .set_proof_photo(&approvable.id, "photos/do-1003-door.jpg")
        .await?;
    let approvable_payment = payments
        .create(&NewPayment {
            order_id: approvable.id,
            da_id: aisha.id,
            amount_kobo: approvable.amount_kobo,
            channel: PaymentChannel::MoniepointTransfer,
            reference: Some("MP-SEED000001".to_string()),
        })
        .await?;
    payments
        .confirm(&approvable_payment.id, &supervisor.id, now - Duration::hours(9))
        .await?;

    let done = deliveries
        .create(
            &NewDeliveryOrder {
                da_id: aisha.id,
                customer_name: "Hajia Mohammed".to_string(),
                customer_phone: "07077778899".to_string(),
                customer_address: "8 Awolowo Way, Ikeja".to_string(),
                items: vec![line(&water, 5, 180_000)],
                payment_method: PaymentMethod::Prepaid,
            },
            5 * 180_000,
        )
        .await?;
    payments
        .create_confirmed(
            &NewPayment {
                order_id: done.id,
                da_id: aisha.id,
                amount_kobo: done.amount_kobo,
                channel: PaymentChannel::MoniepointTransfer,
                reference: Some("MP-SEED000002".to_string()),
            },
            now - Duration::days(2),
        )
        .await?;
    deliveries
        .dispatch(&done.id, &hash_token("112233"), now - Duration::days(2))
        .await?;
    deliveries
        .mark_delivered(&done.id, now - Duration::days(2) + Duration::hours(5))
        .await?;
    deliveries
        .set_proof_photo(&done.id, "photos/do-1004-gate.jpg")
        .await?;
    deliveries
        .approve(&done.id, &supervisor.id, now - Duration::days(1), true)
        .await?;
    stocks.adjust_holding(&aisha.id, &water, -5).await?;

    // Yusuf: one rejected, one failed attempt, and an open flag holding
    // his remaining approvals.
    let rejected = deliveries
        .create(
            &NewDeliveryOrder {
                da_id: yusuf.id,
                customer_name: "Mr. Nwosu".to_string(),
                customer_phone: "08188889900".to_string(),
                customer_address: "5 Herbert Macaulay Way, Yaba".to_string(),
                items: vec![line(&detergent, 3, 145_000)],
                payment_method: PaymentMethod::PayOnDelivery,
            },
            3 * 145_000,
        )
        .await?;
    deliveries
        .dispatch(&rejected.id, &hash_token("445566"), now - Duration::days(3))
        .await?;
    deliveries
        .mark_delivered(&rejected.id, now - Duration::days(3) + Duration::hours(26))
        .await?;
    deliveries
        .reject(
            &rejected.id,
            &admin.id,
            now - Duration::days(2),
            "no proof photo and customer disputes the handover",
        )
        .await?;

    let failed = deliveries
        .create(
            &NewDeliveryOrder {
                da_id: yusuf.id,
                customer_name: "Ms. Johnson".to_string(),
                customer_phone: "09011223344".to_string(),
                customer_address: "19 Montgomery Rd, Yaba".to_string(),
                items: vec![line(&detergent, 2, 145_000)],
                payment_method: PaymentMethod::PayOnDelivery,
            },
            2 * 145_000,
        )
        .await?;
    deliveries
        .dispatch(&failed.id, &hash_token("778899"), now - Duration::days(1))
        .await?;
    deliveries
        .fail(
            &failed.id,
            now - Duration::hours(20),
            Some("customer unreachable after three visits"),
        )
        .await?;

    flags
        .create(&NewFraudFlag {
            subject: FlagSubject::Agent(yusuf.id),
            da_id: yusuf.id,
            reason: FraudReason::ManualReport,
            severity: FraudSeverity::Low,
            detail: "depot count short by two cartons after his last pickup".to_string(),
            raised_by: Some(supervisor.id),
        })
        .await?;

    // A return claim waiting at the warehouse gate
    returns
        .create(&NewStockReturn {
            da_id: emeka.id,
            sku: water.clone(),
            claimed_qty: 5,
            reason: ReturnReason::Unsold,
            note: Some("area flooded, half the route skipped".to_string()),
        })
        .await?;

    tracing::info!(
        admin = DEMO_ADMIN_TOKEN,
        supervisor = DEMO_SUPERVISOR_TOKEN,
        officer = DEMO_OFFICER_TOKEN,
        da = DEMO_DA_TOKEN,
        "Demo data seeded; bearer tokens listed above"
    );
    Ok(())
}

fn line(sku: &Sku, qty: i64, unit_price_kobo: i64) -> LineItem {
    LineItem {
        sku: sku.clone(),
        qty,
        unit_price_kobo,
    }
}
