use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use growth_projector::api::{
    self, DEFAULT_AMOUNT, DEFAULT_DAYS, DEFAULT_PRODUCT, SimulatePayload,
};
use growth_projector::core::{DEFAULT_MAX_CHART_POINTS, ProductCatalog};
use growth_projector::report::Report;

#[derive(Parser, Debug)]
#[command(
    name = "growth-projector",
    about = "Ideal vs realistic investment growth projections"
)]
struct Cli {
    /// JSON product catalog replacing the built-in products
    #[arg(long, global = true, env = "GROWTH_PRODUCTS")]
    products: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one projection and print it
    Project(ProjectArgs),
    /// Serve the projection API over HTTP
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum DepositFrequency {
    None,
    Daily,
    Weekly,
    Monthly,
}

impl DepositFrequency {
    fn interval_days(self) -> u32 {
        match self {
            DepositFrequency::None => 0,
            DepositFrequency::Daily => 1,
            DepositFrequency::Weekly => 7,
            DepositFrequency::Monthly => 30,
        }
    }
}

#[derive(Args, Debug)]
struct ProjectArgs {
    #[arg(long, default_value = DEFAULT_PRODUCT)]
    product: String,
    #[arg(long, default_value_t = DEFAULT_AMOUNT)]
    amount: f64,
    #[arg(long, default_value_t = DEFAULT_DAYS)]
    days: u32,
    #[arg(long, default_value_t = 0.0, help = "Top-up added at each deposit")]
    deposits: f64,
    #[arg(long, value_enum, default_value_t = DepositFrequency::None)]
    frequency: DepositFrequency,
    #[arg(long, default_value_t = DEFAULT_MAX_CHART_POINTS)]
    max_chart_points: u32,
    #[arg(long, help = "Seed for a reproducible realistic path")]
    seed: Option<u64>,
    #[arg(long, help = "Print the full result as JSON")]
    json: bool,
}

impl From<&ProjectArgs> for SimulatePayload {
    fn from(args: &ProjectArgs) -> Self {
        SimulatePayload {
            product: Some(args.product.clone()),
            amount: Some(args.amount),
            days: Some(args.days),
            deposits: Some(args.deposits),
            frequency: Some(args.frequency.interval_days()),
            max_chart_points: Some(args.max_chart_points),
            seed: args.seed,
            daily_rate: None,
            volatility: None,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let catalog = ProductCatalog::load_or_default(cli.products.as_deref())
        .context("failed to load product catalog")?;

    match cli.command {
        Command::Project(args) => {
            let request = api::resolve_request(&catalog, SimulatePayload::from(&args))?;
            let response = api::build_simulate_response(request)?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                print!(
                    "{}",
                    Report::new(&response.product, &response.params, &response.result)
                );
            }
        }
        Command::Serve { port } => {
            api::run_http_server(port, catalog)
                .await
                .context("HTTP server failed")?;
        }
    }

    Ok(())
}
