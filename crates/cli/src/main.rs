//! Lumina CLI - catalog browsing, local cart and product management.
//!
//! # Usage
//!
//! ```bash
//! # Browse the catalog like the storefront grid
//! lumina-cli catalog list --search luna --category manillas --sort price_asc
//!
//! # Inspect or empty the local cart
//! lumina-cli cart show --priced
//! lumina-cli cart clear --dir .lumina
//!
//! # Manage products (needs LUMINA_ADMIN_EMAIL / LUMINA_ADMIN_PASSWORD)
//! lumina-cli admin products list
//! lumina-cli admin products save --name "Manilla Luna" --category manillas --base-price 45000 \
//!     --sizes "S, 0
//! M, 2000" --image luna.webp
//! lumina-cli admin products delete --id 6a1f...
//! ```
//!
//! # Commands
//!
//! - `catalog list` - Filtered and sorted product grid
//! - `cart show|clear` - The cart slot the storefront persists
//! - `admin products list|save|delete` - Authenticated product management

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use lumina_admin::products::ProductForm;
use lumina_core::listing::{ListingFilters, SortKey};

mod commands;

#[derive(Parser)]
#[command(name = "lumina-cli")]
#[command(author, version, about = "Lumina CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse the catalog
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
    /// Inspect the local cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Manage the catalog as an admin
    Admin {
        #[command(subcommand)]
        target: AdminTarget,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// List products as the storefront grid shows them
    List {
        /// Text to look for in name, description and category
        #[arg(short, long)]
        search: Option<String>,

        /// Exact category
        #[arg(short, long)]
        category: Option<String>,

        /// Only featured products
        #[arg(short, long)]
        featured: bool,

        /// Highest "from" price to include
        #[arg(long)]
        max_price: Option<f64>,

        /// `featured_recent`, `price_asc`, `price_desc`, `name_asc` or `name_desc`
        #[arg(long, default_value = "featured_recent")]
        sort: String,
    },
}

#[derive(Args)]
struct CartDir {
    /// Directory holding the cart slot
    #[arg(long, env = "STOREFRONT_CART_DIR", default_value = ".lumina")]
    dir: PathBuf,
}

#[derive(Subcommand)]
enum CartAction {
    /// Print the cart
    Show {
        #[command(flatten)]
        dir: CartDir,

        /// Fetch the catalog and print prices and totals
        #[arg(long)]
        priced: bool,
    },
    /// Empty the cart
    Clear {
        #[command(flatten)]
        dir: CartDir,
    },
}

#[derive(Subcommand)]
enum AdminTarget {
    /// Product management
    Products {
        #[command(subcommand)]
        action: ProductAction,
    },
}

#[derive(Subcommand)]
enum ProductAction {
    /// List products with their sizes and "from" prices
    List,
    /// Create a product, or update one with --id
    Save(SaveArgs),
    /// Delete a product and its sizes
    Delete {
        #[arg(long)]
        id: String,
    },
}

#[derive(Args)]
struct SaveArgs {
    /// Product to update; omit to create
    #[arg(long)]
    id: Option<String>,

    #[arg(long)]
    name: String,

    #[arg(long)]
    category: String,

    #[arg(long, default_value = "")]
    description: String,

    /// Whole pesos
    #[arg(long)]
    base_price: String,

    /// Percent, 0-100
    #[arg(long, default_value = "0")]
    discount: String,

    #[arg(long)]
    featured: bool,

    /// Comma-separated colors
    #[arg(long, default_value = "")]
    colors: String,

    /// One `label, extra` per line
    #[arg(long, default_value = "")]
    sizes: String,

    /// Image file to upload
    #[arg(long)]
    image: Option<PathBuf>,
}

impl SaveArgs {
    fn form(&self) -> ProductForm {
        ProductForm {
            name: self.name.clone(),
            category: self.category.clone(),
            description: self.description.clone(),
            base_price: self.base_price.clone(),
            discount: self.discount.clone(),
            featured: self.featured,
            colors: self.colors.clone(),
            sizes: self.sizes.clone(),
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Catalog { action } => match action {
            CatalogAction::List {
                search,
                category,
                featured,
                max_price,
                sort,
            } => {
                let filters = ListingFilters {
                    text: search.unwrap_or_default(),
                    category: category.unwrap_or_default(),
                    featured_only: featured,
                    price_ceiling: max_price.filter(|p| p.is_finite()),
                };
                commands::catalog::list(&filters, SortKey::parse_or_default(&sort)).await?;
            }
        },
        Commands::Cart { action } => match action {
            CartAction::Show { dir, priced } => commands::cart::show(&dir.dir, priced).await?,
            CartAction::Clear { dir } => commands::cart::clear(&dir.dir)?,
        },
        Commands::Admin { target } => match target {
            AdminTarget::Products { action } => match action {
                ProductAction::List => commands::admin::list().await?,
                ProductAction::Save(args) => {
                    commands::admin::save(args.id.clone(), &args.form(), args.image.as_deref())
                        .await?;
                }
                ProductAction::Delete { id } => commands::admin::delete(&id).await?,
            },
        },
    }
    Ok(())
}
