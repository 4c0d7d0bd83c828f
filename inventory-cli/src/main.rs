//! Inventory CLI
//!
//! Command-line interface for the Inventory API.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;

use inventory_client::InventoryClient;
use inventory_types::{
    CreateCustomerRequest, CreateOrderRequest, CreateProductRequest, CreateSaleRequest,
    CurrencyCode, CustomerId, LineItemRequest, Money, OrderId, OrderPriority, OrderStatus,
    ProductFilter, ProductId, QuoteRequest, SaleId, SupplierId, USD,
};

#[derive(Parser)]
#[command(name = "inventory")]
#[command(author, version, about = "Inventory API CLI client", long_about = None)]
struct Cli {
    /// Base URL of the Inventory API
    #[arg(
        long,
        env = "INVENTORY_API_URL",
        default_value = "http://localhost:3000"
    )]
    api_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Exchange rate operations
    Rate {
        #[command(subcommand)]
        action: RateCommands,
    },
    /// Product operations
    Product {
        #[command(subcommand)]
        action: ProductCommands,
    },
    /// Sale operations
    Sale {
        #[command(subcommand)]
        action: SaleCommands,
    },
    /// Purchase order operations
    Order {
        #[command(subcommand)]
        action: OrderCommands,
    },
    /// Customer operations
    Customer {
        #[command(subcommand)]
        action: CustomerCommands,
    },
    /// Check API health
    Health,
}

#[derive(Subcommand)]
enum RateCommands {
    /// Show the rate in force
    Current,
    /// Refresh from the external source
    Refresh,
    /// Set the rate by hand
    Set {
        /// Local-currency units per US dollar
        rate: f64,
    },
    /// Show recent rate history
    History {
        #[arg(long, default_value = "10")]
        limit: i64,
    },
    /// Convert an amount at the current rate
    Convert {
        /// Amount in decimal units (e.g. 12.50)
        amount: f64,
        /// Source currency (USD, VES)
        #[arg(long, default_value = "USD")]
        from: String,
        /// Target currency (USD, VES)
        #[arg(long, default_value = "VES")]
        to: String,
    },
}

#[derive(Subcommand)]
enum ProductCommands {
    /// List active products
    List {
        /// Match on name, description or barcode
        #[arg(long)]
        search: Option<String>,
        /// Only products at or below their minimum stock
        #[arg(long)]
        low_stock: bool,
        #[arg(long)]
        include_inactive: bool,
    },
    /// Create a product
    Create {
        name: String,
        /// Price in dollars (e.g. 1.50)
        #[arg(long)]
        price: f64,
        /// Cost in dollars
        #[arg(long, default_value = "0")]
        cost: f64,
        #[arg(long, default_value = "0")]
        stock: i32,
        #[arg(long)]
        stock_min: Option<i32>,
        #[arg(long)]
        barcode: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Adjust stock up or down
    Stock {
        /// Product ID (UUID)
        id: String,
        /// Positive to add, negative to remove
        #[arg(long, allow_hyphen_values = true)]
        delta: i32,
        #[arg(long)]
        reason: Option<String>,
    },
    /// Show the stock ledger, newest first
    Movements {
        /// Only this product (UUID)
        #[arg(long)]
        product: Option<String>,
        #[arg(long, default_value = "50")]
        limit: i64,
    },
    /// Export the catalog as CSV
    Export {
        /// Write to this file instead of stdout
        #[arg(long, short)]
        output: Option<std::path::PathBuf>,
    },
}

#[derive(Subcommand)]
enum SaleCommands {
    /// Price a cart without recording a sale
    Quote {
        /// Line as PRODUCT_ID:QUANTITY (repeatable)
        #[arg(long = "line", required = true)]
        lines: Vec<String>,
    },
    /// Record a sale
    Create {
        /// Line as PRODUCT_ID:QUANTITY (repeatable)
        #[arg(long = "line", required = true)]
        lines: Vec<String>,
        /// Discount in dollars
        #[arg(long, default_value = "0")]
        discount: f64,
        #[arg(long)]
        customer: Option<String>,
        /// Registered customer ID (UUID)
        #[arg(long)]
        customer_id: Option<String>,
        #[arg(long)]
        payment_method: Option<String>,
    },
    /// List sales
    List,
    /// Cancel a sale and restock its lines
    Cancel {
        /// Sale ID (UUID)
        id: String,
    },
}

#[derive(Subcommand)]
enum OrderCommands {
    /// Place a purchase order
    Create {
        /// Supplier ID (UUID)
        #[arg(long)]
        supplier: String,
        /// Line as PRODUCT_ID:QUANTITY (repeatable)
        #[arg(long = "line", required = true)]
        lines: Vec<String>,
        /// low, normal, high or urgent
        #[arg(long, default_value = "normal")]
        priority: String,
        /// Expected delivery date (YYYY-MM-DD)
        #[arg(long)]
        expected: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Move an order to a new status
    Status {
        /// Order ID (UUID)
        id: String,
        /// pending, received, paid_received or cancelled
        status: String,
    },
    /// List purchase orders
    List,
}

#[derive(Subcommand)]
enum CustomerCommands {
    /// List active customers
    List,
    /// Register a customer
    Create {
        name: String,
        /// Cédula or RIF
        #[arg(long)]
        document: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        address: Option<String>,
    },
    /// Deactivate a customer
    Deactivate {
        /// Customer ID (UUID)
        id: String,
    },
}

fn parse_id<T: std::str::FromStr>(s: &str, what: &str) -> Result<T> {
    s.parse()
        .map_err(|_| anyhow::anyhow!("Invalid {} ID: {}", what, s))
}

fn parse_currency(s: &str) -> Result<CurrencyCode> {
    s.parse().map_err(anyhow::Error::msg)
}

/// Parses `PRODUCT_ID:QUANTITY`.
fn parse_line(s: &str) -> Result<LineItemRequest> {
    let (id, quantity) = s
        .split_once(':')
        .with_context(|| format!("Line must be PRODUCT_ID:QUANTITY, got {}", s))?;
    let quantity: i32 = quantity
        .trim()
        .parse()
        .with_context(|| format!("Invalid quantity in line {}", s))?;
    Ok(LineItemRequest {
        product_id: parse_id::<ProductId>(id.trim(), "product")?,
        quantity,
        unit_price_usd: None,
    })
}

fn parse_lines(lines: &[String]) -> Result<Vec<LineItemRequest>> {
    lines.iter().map(|line| parse_line(line)).collect()
}

fn cents(dollars: f64) -> i64 {
    Money::<USD>::from_decimal(dollars).minor_units()
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let client = InventoryClient::new(&cli.api_url);

    match cli.command {
        Commands::Health => {
            let healthy = client.health().await?;
            if healthy {
                println!("✓ API is healthy");
            } else {
                println!("✗ API is not healthy");
                std::process::exit(1);
            }
        }

        Commands::Rate { action } => match action {
            RateCommands::Current => print_json(&client.current_rate().await?)?,
            RateCommands::Refresh => print_json(&client.refresh_rate().await?)?,
            RateCommands::Set { rate } => print_json(&client.set_rate(rate).await?)?,
            RateCommands::History { limit } => {
                print_json(&client.rate_history(Some(limit)).await?)?
            }
            RateCommands::Convert { amount, from, to } => {
                let from = parse_currency(&from)?;
                let to = parse_currency(&to)?;
                let minor = (amount * from.minor_units_per_major() as f64).round() as i64;
                print_json(&client.convert(minor, from, to).await?)?;
            }
        },

        Commands::Product { action } => match action {
            ProductCommands::List {
                search,
                low_stock,
                include_inactive,
            } => {
                let filter = ProductFilter {
                    search,
                    category_id: None,
                    low_stock_only: low_stock,
                    include_inactive,
                };
                print_json(&client.list_products(&filter).await?)?;
            }
            ProductCommands::Create {
                name,
                price,
                cost,
                stock,
                stock_min,
                barcode,
                description,
            } => {
                let req = CreateProductRequest {
                    name,
                    description,
                    category_id: None,
                    price_usd: cents(price),
                    cost_usd: cents(cost),
                    stock,
                    stock_min,
                    stock_max: None,
                    barcode,
                    image_url: None,
                };
                print_json(&client.create_product(&req).await?)?;
            }
            ProductCommands::Stock { id, delta, reason } => {
                let product_id: ProductId = parse_id(&id, "product")?;
                print_json(&client.adjust_stock(product_id, delta, reason).await?)?;
            }
            ProductCommands::Movements { product, limit } => {
                let product_id = product
                    .map(|id| parse_id::<ProductId>(&id, "product"))
                    .transpose()?;
                print_json(&client.stock_movements(product_id, Some(limit)).await?)?;
            }
            ProductCommands::Export { output } => {
                let csv = client.export_products_csv().await?;
                match output {
                    Some(path) => {
                        std::fs::write(&path, csv)
                            .with_context(|| format!("Writing {}", path.display()))?;
                        println!("✓ Exported to {}", path.display());
                    }
                    None => print!("{}", csv),
                }
            }
        },

        Commands::Sale { action } => match action {
            SaleCommands::Quote { lines } => {
                let req = QuoteRequest {
                    lines: parse_lines(&lines)?,
                };
                print_json(&client.quote_sale(&req).await?)?;
            }
            SaleCommands::Create {
                lines,
                discount,
                customer,
                customer_id,
                payment_method,
            } => {
                let req = CreateSaleRequest {
                    lines: parse_lines(&lines)?,
                    discount_usd: cents(discount),
                    customer_id: customer_id
                        .map(|id| parse_id::<CustomerId>(&id, "customer"))
                        .transpose()?,
                    customer,
                    payment_method,
                    notes: None,
                };
                print_json(&client.create_sale(&req).await?)?;
            }
            SaleCommands::List => print_json(&client.list_sales().await?)?,
            SaleCommands::Cancel { id } => {
                let sale_id: SaleId = parse_id(&id, "sale")?;
                print_json(&client.cancel_sale(sale_id).await?)?;
            }
        },

        Commands::Order { action } => match action {
            OrderCommands::Create {
                supplier,
                lines,
                priority,
                expected,
                notes,
            } => {
                let priority: OrderPriority = priority.parse().map_err(anyhow::Error::msg)?;
                let expected_delivery = expected
                    .map(|date| NaiveDate::parse_from_str(&date, "%Y-%m-%d"))
                    .transpose()
                    .context("Expected delivery must be YYYY-MM-DD")?;
                let req = CreateOrderRequest {
                    supplier_id: parse_id::<SupplierId>(&supplier, "supplier")?,
                    lines: parse_lines(&lines)?,
                    priority,
                    notes,
                    expected_delivery,
                };
                print_json(&client.create_order(&req).await?)?;
            }
            OrderCommands::Status { id, status } => {
                let order_id: OrderId = parse_id(&id, "order")?;
                let status: OrderStatus = status.parse().map_err(anyhow::Error::msg)?;
                print_json(&client.update_order_status(order_id, status).await?)?;
            }
            OrderCommands::List => print_json(&client.list_orders().await?)?,
        },

        Commands::Customer { action } => match action {
            CustomerCommands::List => print_json(&client.list_customers().await?)?,
            CustomerCommands::Create {
                name,
                document,
                phone,
                email,
                address,
            } => {
                let req = CreateCustomerRequest {
                    name,
                    document_id: document,
                    phone,
                    email,
                    address,
                };
                print_json(&client.create_customer(&req).await?)?;
            }
            CustomerCommands::Deactivate { id } => {
                let customer_id: CustomerId = parse_id(&id, "customer")?;
                print_json(&client.deactivate_customer(customer_id).await?)?;
            }
        },
    }

    Ok(())
}
