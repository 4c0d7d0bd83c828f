//! InventoryService unit tests.

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Arc;

    use tokio::sync::watch;

    use inventory_types::{
        AppError, CreateCategoryRequest, CreateCustomerRequest, CreateOrderRequest,
        CreateProductRequest, CreateSaleRequest, CreateSupplierRequest, CurrentRate, CustomerId,
        LineItemRequest, MovementKind, MovementQuery, OrderPriority, OrderStatus, ProductFilter,
        ProductId, ProductView, QuoteRequest, Rate, RateSource, SaleStatus,
        StockAdjustmentRequest, StockMovement, SupplierId, UpdateCategoryRequest, UpdateCustomerRequest,
        UpdateOrderStatusRequest, UpdateProductRequest, UpdateSupplierRequest,
    };

    use crate::InventoryService;
    use crate::mocks::MockRepo;

    struct Fixture {
        service: InventoryService<MockRepo>,
        repo: Arc<MockRepo>,
        rates: watch::Sender<CurrentRate>,
    }

    impl Fixture {
        fn new() -> Self {
            let repo = Arc::new(MockRepo::default());
            let (rates, rx) = watch::channel(CurrentRate::initial(rate(36.5)));
            Self {
                service: InventoryService::new(repo.clone(), rx),
                repo,
                rates,
            }
        }

        fn set_rate(&self, value: f64) {
            self.rates.send_replace(CurrentRate {
                rate: rate(value),
                source: RateSource::Manual,
                observed_at: chrono::Utc::now(),
            });
        }

        async fn product(&self, name: &str, price_usd: i64, stock: i32) -> ProductView {
            self.service
                .create_product(product_request(name, price_usd, stock))
                .await
                .unwrap()
        }

        fn stock_of(&self, id: ProductId) -> i32 {
            self.repo.product(id).unwrap().stock
        }
    }

    fn rate(value: f64) -> Rate {
        Rate::new(value).unwrap()
    }

    fn product_request(name: &str, price_usd: i64, stock: i32) -> CreateProductRequest {
        CreateProductRequest {
            name: name.to_string(),
            description: None,
            category_id: None,
            price_usd,
            cost_usd: price_usd / 2,
            stock,
            stock_min: Some(5),
            stock_max: None,
            barcode: None,
            image_url: None,
        }
    }

    fn line(product_id: ProductId, quantity: i32) -> LineItemRequest {
        LineItemRequest {
            product_id,
            quantity,
            unit_price_usd: None,
        }
    }

    fn customer_request(name: &str) -> CreateCustomerRequest {
        CreateCustomerRequest {
            name: name.to_string(),
            document_id: None,
            phone: None,
            email: None,
            address: None,
        }
    }

    fn order_request(supplier_id: SupplierId, lines: Vec<LineItemRequest>) -> CreateOrderRequest {
        CreateOrderRequest {
            supplier_id,
            lines,
            priority: OrderPriority::default(),
            notes: None,
            expected_delivery: None,
        }
    }

    async fn ledger(fx: &Fixture, id: ProductId) -> Vec<StockMovement> {
        fx.service
            .list_stock_movements(&MovementQuery {
                product_id: Some(id),
                limit: None,
            })
            .await
            .unwrap()
    }

    fn sale_request(lines: Vec<LineItemRequest>) -> CreateSaleRequest {
        CreateSaleRequest {
            lines,
            discount_usd: 0,
            customer_id: None,
            customer: None,
            payment_method: None,
            notes: None,
        }
    }

    async fn supplier(fx: &Fixture) -> SupplierId {
        fx.service
            .create_supplier(CreateSupplierRequest {
                name: "Distribuidora".into(),
                phone: None,
                email: None,
                address: None,
            })
            .await
            .unwrap()
            .id
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Products
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_create_product_caches_local_price() {
        let fx = Fixture::new();
        let view = fx.product("Harina PAN", 150, 10).await;

        assert_eq!(view.price_local.minor_units(), 5475);
        assert_eq!(view.product.cached_price_local.minor_units(), 5475);
        assert_eq!(view.product.cached_rate.value(), 36.5);
    }

    #[tokio::test]
    async fn test_create_product_empty_name_fails() {
        let fx = Fixture::new();
        let result = fx.service.create_product(product_request("  ", 100, 1)).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_get_product_not_found() {
        let fx = Fixture::new();
        let result = fx.service.get_product(ProductId::new()).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_listing_uses_current_rate() {
        let fx = Fixture::new();
        fx.product("Café", 1000, 10).await;

        fx.set_rate(40.0);

        let products = fx.service.list_products(&ProductFilter::default()).await.unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].price_local.minor_units(), 40000);
        assert_eq!(products[0].rate.value(), 40.0);
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive_and_skips_inactive() {
        let fx = Fixture::new();
        fx.product("Harina de Maíz", 150, 10).await;
        let gone = fx.product("Harina de Trigo", 150, 10).await;
        fx.product("Arroz", 120, 10).await;
        fx.service.deactivate_product(gone.product.id).await.unwrap();

        let found = fx.service.search_products("HARINA").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].product.name, "Harina de Maíz");

        let all = fx
            .service
            .list_products(&ProductFilter {
                include_inactive: true,
                ..ProductFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn test_update_product_recaches_price() {
        let fx = Fixture::new();
        let view = fx.product("Aceite", 300, 10).await;
        fx.set_rate(40.0);

        let updated = fx
            .service
            .update_product(
                view.product.id,
                UpdateProductRequest {
                    price_usd: Some(350),
                    ..UpdateProductRequest::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.product.price_usd.minor_units(), 350);
        assert_eq!(updated.product.cached_price_local.minor_units(), 14000);
        assert_eq!(updated.product.cached_rate.value(), 40.0);
    }

    #[tokio::test]
    async fn test_adjust_stock() {
        let fx = Fixture::new();
        let view = fx.product("Azúcar", 200, 3).await;
        let id = view.product.id;

        let zero = fx
            .service
            .adjust_stock(id, StockAdjustmentRequest { delta: 0, reason: None })
            .await;
        assert!(matches!(zero, Err(AppError::BadRequest(_))));

        let below = fx
            .service
            .adjust_stock(id, StockAdjustmentRequest { delta: -4, reason: None })
            .await;
        assert!(matches!(below, Err(AppError::Conflict(_))));
        assert_eq!(fx.stock_of(id), 3);

        let added = fx
            .service
            .adjust_stock(
                id,
                StockAdjustmentRequest {
                    delta: 7,
                    reason: Some("reposición".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(added.product.stock, 10);
    }

    #[tokio::test]
    async fn test_adjust_stock_writes_ledger() {
        let fx = Fixture::new();
        let view = fx.product("Caraotas", 200, 3).await;
        let id = view.product.id;

        let rejected = fx
            .service
            .adjust_stock(id, StockAdjustmentRequest { delta: -9, reason: None })
            .await;
        assert!(rejected.is_err());
        assert!(ledger(&fx, id).await.is_empty());

        fx.service
            .adjust_stock(
                id,
                StockAdjustmentRequest {
                    delta: -1,
                    reason: Some("merma".into()),
                },
            )
            .await
            .unwrap();

        let entries = ledger(&fx, id).await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, MovementKind::Adjustment);
        assert_eq!(entries[0].quantity, -1);
        assert_eq!(
            entries[0].notes.as_deref(),
            Some("Manual stock adjustment: -1 (merma)")
        );
    }

    #[tokio::test]
    async fn test_list_stock_movements_checks_query() {
        let fx = Fixture::new();

        let zero = fx
            .service
            .list_stock_movements(&MovementQuery {
                product_id: None,
                limit: Some(0),
            })
            .await;
        assert!(matches!(zero, Err(AppError::BadRequest(_))));

        let unknown = fx
            .service
            .list_stock_movements(&MovementQuery {
                product_id: Some(ProductId::new()),
                limit: None,
            })
            .await;
        assert!(matches!(unknown, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_low_stock_products() {
        let fx = Fixture::new();
        fx.product("Leche", 250, 2).await;
        fx.product("Pasta", 180, 50).await;

        let low = fx.service.low_stock_products().await.unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].product.name, "Leche");
        assert!(low[0].low_stock);
    }

    #[tokio::test]
    async fn test_duplicate_category_fails() {
        let fx = Fixture::new();
        let req = CreateCategoryRequest {
            name: "Bebidas".into(),
            description: None,
            icon: None,
        };
        fx.service.create_category(req.clone()).await.unwrap();
        let result = fx.service.create_category(req).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_update_and_delete_category() {
        let fx = Fixture::new();
        let category = fx
            .service
            .create_category(CreateCategoryRequest {
                name: "Limpieza".into(),
                description: None,
                icon: None,
            })
            .await
            .unwrap();
        let mut req = product_request("Cloro", 120, 5);
        req.category_id = Some(category.id);
        let product = fx.service.create_product(req).await.unwrap();

        let renamed = fx
            .service
            .update_category(
                category.id,
                UpdateCategoryRequest {
                    name: Some("Hogar".into()),
                    ..UpdateCategoryRequest::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.name, "Hogar");

        let blank = fx
            .service
            .update_category(
                category.id,
                UpdateCategoryRequest {
                    name: Some(" ".into()),
                    ..UpdateCategoryRequest::default()
                },
            )
            .await;
        assert!(matches!(blank, Err(AppError::BadRequest(_))));

        fx.service.delete_category(category.id).await.unwrap();
        assert!(fx.service.list_categories().await.unwrap().is_empty());
        assert!(fx.repo.product(product.product.id).unwrap().category_id.is_none());

        let again = fx.service.delete_category(category.id).await;
        assert!(matches!(again, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_deactivated_supplier_is_hidden_and_refuses_orders() {
        let fx = Fixture::new();
        let supplier_id = supplier(&fx).await;
        let view = fx.product("Detergente", 400, 0).await;

        let updated = fx
            .service
            .update_supplier(
                supplier_id,
                UpdateSupplierRequest {
                    phone: Some("0212-5551234".into()),
                    ..UpdateSupplierRequest::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.phone.as_deref(), Some("0212-5551234"));

        let bad_email = fx
            .service
            .update_supplier(
                supplier_id,
                UpdateSupplierRequest {
                    email: Some("ventas".into()),
                    ..UpdateSupplierRequest::default()
                },
            )
            .await;
        assert!(matches!(bad_email, Err(AppError::BadRequest(_))));

        let deactivated = fx.service.deactivate_supplier(supplier_id).await.unwrap();
        assert!(!deactivated.active);
        assert!(fx.service.list_suppliers().await.unwrap().is_empty());
        assert!(!fx.service.get_supplier(supplier_id).await.unwrap().active);

        let order = fx
            .service
            .create_order(order_request(supplier_id, vec![line(view.product.id, 1)]))
            .await;
        assert!(matches!(order, Err(AppError::BadRequest(_))));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Customers
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_customer_lifecycle() {
        let fx = Fixture::new();
        let pedro = fx.service.create_customer(customer_request("Pedro")).await.unwrap();
        fx.service.create_customer(customer_request("Ana")).await.unwrap();

        let mut invalid = customer_request("Luis");
        invalid.email = Some("luis.example.com".into());
        let result = fx.service.create_customer(invalid).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));

        let updated = fx
            .service
            .update_customer(
                pedro.id,
                UpdateCustomerRequest {
                    document_id: Some("V-20111222".into()),
                    ..UpdateCustomerRequest::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.document_id.as_deref(), Some("V-20111222"));

        let names: Vec<String> = fx
            .service
            .list_customers()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, ["Ana", "Pedro"]);

        fx.service.deactivate_customer(pedro.id).await.unwrap();
        assert_eq!(fx.service.list_customers().await.unwrap().len(), 1);
        assert!(!fx.service.get_customer(pedro.id).await.unwrap().active);

        let missing = fx.service.get_customer(CustomerId::new()).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Sales
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_quote_uses_current_rate() {
        let fx = Fixture::new();
        let view = fx.product("Queso", 500, 10).await;
        fx.set_rate(40.0);

        let quote = fx
            .service
            .quote_sale(QuoteRequest {
                lines: vec![line(view.product.id, 2)],
            })
            .await
            .unwrap();

        assert_eq!(quote.total_usd.minor_units(), 1000);
        assert_eq!(quote.total_local.minor_units(), 40000);
        assert_eq!(fx.stock_of(view.product.id), 10);
    }

    #[tokio::test]
    async fn test_create_sale_freezes_rate_and_takes_stock() {
        let fx = Fixture::new();
        let view = fx.product("Jamón", 1000, 10).await;
        let id = view.product.id;

        let sale = fx
            .service
            .create_sale(sale_request(vec![line(id, 3)]))
            .await
            .unwrap();
        assert_eq!(sale.total_local.minor_units(), 109500);
        assert_eq!(sale.sale.status, SaleStatus::Completed);
        assert_eq!(fx.stock_of(id), 7);

        fx.set_rate(40.0);

        let fetched = fx.service.get_sale(sale.sale.id).await.unwrap();
        assert_eq!(fetched.sale.rate.value(), 36.5);
        assert_eq!(fetched.total_local.minor_units(), 109500);
    }

    #[tokio::test]
    async fn test_create_sale_insufficient_stock_sums_repeated_lines() {
        let fx = Fixture::new();
        let view = fx.product("Mantequilla", 400, 4).await;
        let id = view.product.id;

        let result = fx
            .service
            .create_sale(sale_request(vec![line(id, 3), line(id, 2)]))
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
        assert_eq!(fx.stock_of(id), 4);
        assert!(fx.service.list_sales().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_sale_rejects_inactive_and_unknown_products() {
        let fx = Fixture::new();
        let view = fx.product("Descontinuado", 100, 10).await;
        fx.service.deactivate_product(view.product.id).await.unwrap();

        let inactive = fx
            .service
            .create_sale(sale_request(vec![line(view.product.id, 1)]))
            .await;
        assert!(matches!(inactive, Err(AppError::BadRequest(_))));

        let unknown = fx
            .service
            .create_sale(sale_request(vec![line(ProductId::new(), 1)]))
            .await;
        assert!(matches!(unknown, Err(AppError::BadRequest(_))));

        let empty = fx.service.create_sale(sale_request(vec![])).await;
        assert!(matches!(empty, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_failed_stock_movement_does_not_undo_sale() {
        let fx = Fixture::new();
        let ok = fx.product("Pan", 100, 10).await;
        let broken = fx.product("Galletas", 100, 10).await;
        fx.repo
            .broken_stock
            .lock()
            .unwrap()
            .push(broken.product.id);

        let sale = fx
            .service
            .create_sale(sale_request(vec![
                line(ok.product.id, 1),
                line(broken.product.id, 1),
            ]))
            .await
            .unwrap();

        assert_eq!(sale.priced_lines.len(), 2);
        assert_eq!(fx.stock_of(ok.product.id), 9);
        assert_eq!(fx.stock_of(broken.product.id), 10);
    }

    #[tokio::test]
    async fn test_cancel_sale_restocks_once() {
        let fx = Fixture::new();
        let view = fx.product("Refresco", 150, 5).await;
        let id = view.product.id;
        let sale = fx
            .service
            .create_sale(sale_request(vec![line(id, 2)]))
            .await
            .unwrap();
        assert_eq!(fx.stock_of(id), 3);

        let cancelled = fx.service.cancel_sale(sale.sale.id).await.unwrap();
        assert_eq!(cancelled.sale.status, SaleStatus::Cancelled);
        assert_eq!(fx.stock_of(id), 5);

        let again = fx.service.cancel_sale(sale.sale.id).await;
        assert!(matches!(again, Err(AppError::Conflict(_))));
        assert_eq!(fx.stock_of(id), 5);
    }

    #[tokio::test]
    async fn test_sale_links_registered_customer() {
        let fx = Fixture::new();
        let view = fx.product("Chocolate", 300, 10).await;
        let customer = fx.service.create_customer(customer_request("Rosa")).await.unwrap();

        let mut req = sale_request(vec![line(view.product.id, 1)]);
        req.customer_id = Some(customer.id);
        let sale = fx.service.create_sale(req).await.unwrap();
        assert_eq!(sale.sale.customer_id, Some(customer.id));
        assert_eq!(sale.sale.customer.as_deref(), Some("Rosa"));

        fx.service.deactivate_customer(customer.id).await.unwrap();
        let mut req = sale_request(vec![line(view.product.id, 1)]);
        req.customer_id = Some(customer.id);
        let inactive = fx.service.create_sale(req).await;
        assert!(matches!(inactive, Err(AppError::BadRequest(_))));

        let mut req = sale_request(vec![line(view.product.id, 1)]);
        req.customer_id = Some(CustomerId::new());
        let unknown = fx.service.create_sale(req).await;
        assert!(matches!(unknown, Err(AppError::BadRequest(_))));
        assert_eq!(fx.stock_of(view.product.id), 9);
    }

    #[tokio::test]
    async fn test_sale_and_cancellation_are_in_ledger() {
        let fx = Fixture::new();
        let view = fx.product("Galletas", 100, 8).await;
        let id = view.product.id;
        let sale = fx
            .service
            .create_sale(sale_request(vec![line(id, 3)]))
            .await
            .unwrap();
        fx.service.cancel_sale(sale.sale.id).await.unwrap();

        let entries = ledger(&fx, id).await;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].kind, MovementKind::SaleCancellation);
        assert_eq!(entries[0].quantity, 3);
        assert_eq!(entries[1].kind, MovementKind::Sale);
        assert_eq!(entries[1].quantity, -3);
        assert_eq!(
            entries[1].notes.as_deref(),
            Some(format!("Sale {}", sale.sale.id).as_str())
        );
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Purchase orders
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_create_order_requires_supplier() {
        let fx = Fixture::new();
        let view = fx.product("Atún", 300, 0).await;

        let result = fx
            .service
            .create_order(CreateOrderRequest {
                supplier_id: SupplierId::new(),
                lines: vec![line(view.product.id, 5)],
                priority: OrderPriority::default(),
                notes: None,
                expected_delivery: None,
            })
            .await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_order_lifecycle_freezes_rate_and_receives_stock_once() {
        let fx = Fixture::new();
        let supplier_id = supplier(&fx).await;
        let view = fx.product("Sardinas", 2000, 0).await;
        let id = view.product.id;

        let order = fx
            .service
            .create_order(CreateOrderRequest {
                supplier_id,
                lines: vec![line(id, 1)],
                priority: OrderPriority::Urgent,
                notes: None,
                expected_delivery: None,
            })
            .await
            .unwrap();
        // Priced at cost: $10.00
        assert_eq!(order.total_usd.minor_units(), 1000);
        assert_eq!(order.total_local.minor_units(), 36500);
        assert!(!order.rate_frozen);

        fx.set_rate(40.0);
        let draft = fx.service.get_order(order.order.id).await.unwrap();
        assert_eq!(draft.total_local.minor_units(), 40000);

        let received = fx
            .service
            .update_order_status(
                order.order.id,
                UpdateOrderStatusRequest {
                    status: OrderStatus::Received,
                },
            )
            .await
            .unwrap();
        assert!(received.rate_frozen);
        assert_eq!(received.applied_rate.value(), 40.0);
        assert_eq!(fx.stock_of(id), 1);

        fx.set_rate(45.0);
        let paid = fx
            .service
            .update_order_status(
                order.order.id,
                UpdateOrderStatusRequest {
                    status: OrderStatus::PaidReceived,
                },
            )
            .await
            .unwrap();
        assert_eq!(paid.applied_rate.value(), 40.0);
        assert_eq!(paid.total_local.minor_units(), 40000);
        assert_eq!(fx.stock_of(id), 1);

        let entries = ledger(&fx, id).await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, MovementKind::Purchase);
        assert_eq!(entries[0].quantity, 1);
    }

    #[tokio::test]
    async fn test_invalid_order_transition_is_conflict() {
        let fx = Fixture::new();
        let supplier_id = supplier(&fx).await;
        let view = fx.product("Aceitunas", 500, 0).await;
        let order = fx
            .service
            .create_order(CreateOrderRequest {
                supplier_id,
                lines: vec![line(view.product.id, 1)],
                priority: OrderPriority::default(),
                notes: None,
                expected_delivery: None,
            })
            .await
            .unwrap();

        fx.service
            .update_order_status(
                order.order.id,
                UpdateOrderStatusRequest {
                    status: OrderStatus::Cancelled,
                },
            )
            .await
            .unwrap();

        let result = fx
            .service
            .update_order_status(
                order.order.id,
                UpdateOrderStatusRequest {
                    status: OrderStatus::Received,
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
        assert_eq!(fx.stock_of(view.product.id), 0);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Reports
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_inventory_summary() {
        let fx = Fixture::new();
        let a = fx.product("Cereal", 500, 10).await;
        fx.product("Avena", 300, 0).await;
        fx.service
            .create_sale(sale_request(vec![line(a.product.id, 2)]))
            .await
            .unwrap();
        fx.set_rate(40.0);

        let summary = fx.service.inventory_summary().await.unwrap();
        assert_eq!(summary.active_products, 2);
        assert_eq!(summary.out_of_stock_products, 1);
        assert_eq!(summary.low_stock_products, 1);
        assert_eq!(summary.total_units, 8);
        assert_eq!(summary.stock_value_usd.minor_units(), 4000);
        assert_eq!(summary.stock_value_local.minor_units(), 160000);
        assert_eq!(summary.completed_sales, 1);
        assert_eq!(summary.sales_total_usd.minor_units(), 1000);
        assert_eq!(summary.sales_total_local.minor_units(), 36500);
        assert_eq!(summary.rate.rate.value(), 40.0);
    }

    #[tokio::test]
    async fn test_export_csv() {
        let fx = Fixture::new();
        let category = fx
            .service
            .create_category(CreateCategoryRequest {
                name: "Víveres".into(),
                description: None,
                icon: None,
            })
            .await
            .unwrap();
        let mut req = product_request("Harina, precocida", 150, 12);
        req.category_id = Some(category.id);
        fx.service.create_product(req).await.unwrap();

        let csv = fx.service.export_products_csv().await.unwrap();
        let mut rows = csv.lines();
        assert_eq!(
            rows.next().unwrap(),
            "ID,Name,Description,Category,Price USD,Price VES,Stock,Min Stock,Max Stock,Barcode,Status,Created"
        );
        let row = rows.next().unwrap();
        assert!(row.contains("\"Harina, precocida\""));
        assert!(row.contains(",Víveres,1.50,54.75,12,5,100,,Active,"));
        assert!(rows.next().is_none());
    }
}
