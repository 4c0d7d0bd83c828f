//! Client demo walking through rate, product, sale and order flows against a
//! locally started server.
//!
//! Run with: cargo run -p inventory-app --example client_demo --no-default-features --features sqlite

use std::net::SocketAddr;
use std::sync::Arc;

use tempfile::tempdir;
use tokio::net::TcpListener;

use inventory_client::InventoryClient;
use inventory_hex::{
    InventoryService, PriceCacheUpdater, RateService,
    inbound::HttpServer,
    outbound::{DEFAULT_RATE_POINTER, HttpRateSource},
};
use inventory_repo::build_repo;
use inventory_types::{
    CreateCustomerRequest, CreateOrderRequest, CreateProductRequest, CreateSaleRequest,
    CreateSupplierRequest, CurrencyCode, LineItemRequest, OrderPriority, OrderStatus, Rate,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    // Find an available port
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr: SocketAddr = listener.local_addr()?;
    let port = addr.port();
    drop(listener);

    // Use a temp file-backed SQLite DB
    let tmp = tempdir()?;
    let db_path = tmp.path().join("inventory.db");
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

    println!("🚀 Starting server on port {port}...");
    println!("   Database: {db_url}");

    let repo = Arc::new(build_repo(&db_url).await?);

    // Nothing listens on port 9, so every refresh exercises the fallback path
    let source = HttpRateSource::new("http://127.0.0.1:9/rate", DEFAULT_RATE_POINTER)?;
    let rates = Arc::new(RateService::new(source, repo.clone(), Rate::default()));
    let price_cache = PriceCacheUpdater::spawn(repo.clone(), rates.subscribe());
    let inventory = InventoryService::new(repo, rates.subscribe());

    let server = HttpServer::new(rates, inventory);
    let server_addr = format!("127.0.0.1:{port}");
    let server_task = tokio::spawn(async move {
        if let Err(err) = server.run(&server_addr, std::future::pending()).await {
            eprintln!("server error: {err}");
        }
    });

    // Wait for server to start
    tokio::time::sleep(std::time::Duration::from_millis(500)).await;

    let client = InventoryClient::new(format!("http://127.0.0.1:{port}"));

    // ─────────────────────────────────────────────────────────────────────────
    // Exchange rate
    // ─────────────────────────────────────────────────────────────────────────

    println!("✅ Server health: {}", client.health().await?);

    let current = client.current_rate().await?;
    println!("✅ Initial rate: {} ({})", current.rate, current.source);

    let rejected = client.set_rate(0.0).await;
    println!("✅ Zero rate rejected: {}", rejected.is_err());

    let manual = client.set_rate(38.75).await?;
    println!("✅ Manual rate: {} ({})", manual.rate, manual.source);

    let refreshed = client.refresh_rate().await?;
    println!(
        "✅ Refresh with source down: {} ({})",
        refreshed.rate, refreshed.source
    );

    let converted = client.convert(2500, CurrencyCode::USD, CurrencyCode::VES).await?;
    println!(
        "✅ $25.00 = {} VES cents at {}",
        converted.converted, converted.rate
    );

    // ─────────────────────────────────────────────────────────────────────────
    // Products & sales
    // ─────────────────────────────────────────────────────────────────────────

    let product = client
        .create_product(&CreateProductRequest {
            name: "Harina PAN 1kg".into(),
            description: None,
            category_id: None,
            price_usd: 150,
            cost_usd: 90,
            stock: 40,
            stock_min: Some(5),
            stock_max: None,
            barcode: Some("7591002100019".into()),
            image_url: None,
        })
        .await?;
    let product_id = product.product.id;
    println!(
        "✅ Created product {} at {} / {}",
        product.product.name, product.product.price_usd, product.price_local
    );

    let customer = client
        .create_customer(&CreateCustomerRequest {
            name: "María Pérez".into(),
            document_id: Some("V-12345678".into()),
            phone: None,
            email: None,
            address: None,
        })
        .await?;
    println!("✅ Registered customer {}", customer.name);

    let sale = client
        .create_sale(&CreateSaleRequest {
            lines: vec![LineItemRequest {
                product_id,
                quantity: 3,
                unit_price_usd: None,
            }],
            discount_usd: 0,
            customer_id: Some(customer.id),
            customer: None,
            payment_method: Some("Efectivo".into()),
            notes: None,
        })
        .await?;
    println!(
        "✅ Sale {}: {} / {}",
        sale.sale.id, sale.total_usd, sale.total_local
    );

    client.set_rate(42.0).await?;
    let sale = client.get_sale(sale.sale.id).await?;
    let product = client.get_product(product_id).await?;
    println!(
        "✅ After rate change: sale still {}, product now {}",
        sale.total_local, product.price_local
    );

    // ─────────────────────────────────────────────────────────────────────────
    // Purchase orders
    // ─────────────────────────────────────────────────────────────────────────

    let supplier = client
        .create_supplier(&CreateSupplierRequest {
            name: "Distribuidora Caracas".into(),
            phone: None,
            email: None,
            address: Some("Av. Urdaneta, Caracas".into()),
        })
        .await?;

    let order = client
        .create_order(&CreateOrderRequest {
            supplier_id: supplier.id,
            lines: vec![LineItemRequest {
                product_id,
                quantity: 24,
                unit_price_usd: Some(90),
            }],
            priority: OrderPriority::High,
            notes: None,
            expected_delivery: None,
        })
        .await?;
    println!("✅ Order {} placed ({})", order.order.id, order.order.status);

    let order = client
        .update_order_status(order.order.id, OrderStatus::Received)
        .await?;
    let product = client.get_product(product_id).await?;
    println!(
        "✅ Order received at rate {}: stock now {}",
        order.applied_rate, product.product.stock
    );

    // ─────────────────────────────────────────────────────────────────────────
    // Reports
    // ─────────────────────────────────────────────────────────────────────────

    let movements = client.stock_movements(Some(product_id), Some(10)).await?;
    println!("✅ Stock ledger for {}:", product.product.name);
    for movement in movements {
        println!(
            "   {:+} {} {}",
            movement.quantity,
            movement.kind,
            movement.notes.unwrap_or_default()
        );
    }

    let summary = client.inventory_summary().await?;
    println!(
        "✅ Summary: {} products, stock worth {}",
        summary.active_products, summary.stock_value_usd
    );

    let csv = client.export_products_csv().await?;
    println!("✅ CSV export:\n{csv}");

    let history = client.rate_history(Some(5)).await?;
    println!("✅ Last {} rates:", history.len());
    for record in history {
        println!("   {} {} active={}", record.rate, record.source, record.active);
    }

    server_task.abort();
    price_cache.shutdown().await;
    Ok(())
}
