use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use predictive_inventory::{
    config::{self, AppConfig},
    db,
    services::{
        enhancement,
        forecasting::{
            DemandPredictionResponse, InventoryOptimizationReport, ReorderAlertReport,
            StockoutReport,
        },
        ForecastingService,
    },
};
use serde::Serialize;
use uuid::Uuid;

#[derive(Parser)]
#[command(
    name = "inventory-cli",
    about = "Run demand forecasts and stock reports against the database",
    version
)]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON"
    )]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Forecast demand for one product and persist the forecast
    Predict(PredictArgs),
    /// Forecast every active product of a vendor and list needed changes
    Optimize(OptimizeArgs),
    /// List products at or below their minimum stock level
    Alerts(VendorArgs),
    /// List products projected to run out within the window
    Stockouts(StockoutArgs),
}

#[derive(Args)]
struct PredictArgs {
    #[arg(long)]
    product_id: Uuid,
    #[arg(long)]
    vendor_id: Uuid,
    /// Days to forecast (defaults to the configured horizon)
    #[arg(long)]
    horizon: Option<u32>,
}

#[derive(Args)]
struct OptimizeArgs {
    #[arg(long)]
    vendor_id: Uuid,
    /// Days to forecast (defaults to the configured horizon)
    #[arg(long)]
    horizon: Option<u32>,
}

#[derive(Args)]
struct VendorArgs {
    #[arg(long)]
    vendor_id: Uuid,
}

#[derive(Args)]
struct StockoutArgs {
    #[arg(long)]
    vendor_id: Uuid,
    /// Stockout window in days (defaults to the configured horizon)
    #[arg(long)]
    days: Option<u32>,
}

struct CliContext {
    config: AppConfig,
    forecasting: ForecastingService,
}

impl CliContext {
    async fn initialize() -> Result<Self> {
        let config = config::load_config().context("failed to load application config")?;
        config::init_tracing(config.log_level(), config.log_json);

        let db_pool = db::establish_connection_from_app_config(&config)
            .await
            .context("failed to connect to database")?;

        let forecasting = ForecastingService::new(
            Arc::new(db_pool),
            enhancement::from_config(&config.enhancement),
            config.forecasting.clone(),
        );

        Ok(Self {
            config,
            forecasting,
        })
    }

    fn horizon_or_default(&self, requested: Option<u32>) -> u32 {
        requested.unwrap_or(self.config.forecasting.default_horizon_days)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let context = CliContext::initialize().await?;

    match cli.command {
        Commands::Predict(args) => {
            let horizon = context.horizon_or_default(args.horizon);
            let response = context
                .forecasting
                .predict_demand(args.product_id, args.vendor_id, horizon)
                .await
                .context("failed to predict demand")?;
            output(&response, cli.json, render_prediction)?;
        }
        Commands::Optimize(args) => {
            let horizon = context.horizon_or_default(args.horizon);
            let report = context
                .forecasting
                .optimize_inventory(args.vendor_id, horizon)
                .await
                .context("failed to optimize inventory")?;
            output(&report, cli.json, render_optimization)?;
        }
        Commands::Alerts(args) => {
            let report = context
                .forecasting
                .generate_reorder_alerts(args.vendor_id)
                .await
                .context("failed to generate reorder alerts")?;
            output(&report, cli.json, render_alerts)?;
        }
        Commands::Stockouts(args) => {
            let days = context.horizon_or_default(args.days);
            let report = context
                .forecasting
                .forecast_stockouts(args.vendor_id, days)
                .await
                .context("failed to forecast stockouts")?;
            output(&report, cli.json, render_stockouts)?;
        }
    }

    Ok(())
}

fn output<T: Serialize>(value: &T, json: bool, render: fn(&T)) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        render(value);
    }
    Ok(())
}

fn render_prediction(response: &DemandPredictionResponse) {
    let p = &response.prediction;
    println!(
        "Product {} • {} units over {} days • confidence {:.2}{}",
        p.product_id,
        p.predicted_demand,
        p.prediction_horizon_days,
        p.confidence_score,
        if response.ai_enhanced { " • AI enhanced" } else { "" }
    );
    println!(
        "  stock {} • safety {} • reorder point {:.1} • recommended {:.1} • action {}",
        response.current_stock,
        p.safety_stock,
        p.reorder_point,
        p.recommended_stock_level,
        response.recommended_action
    );
    if let Some(insights) = &response.ai_insights {
        println!("  insights: {}", insights);
    }
}

fn render_optimization(report: &InventoryOptimizationReport) {
    println!(
        "{} of {} products forecast • urgent {} • plan {} • reduce {} • monitor {}",
        report.optimized_products,
        report.total_products,
        report.summary.urgent_reorder,
        report.summary.plan_reorder,
        report.summary.reduce_ordering,
        report.summary.monitor
    );
    for o in &report.optimizations {
        println!(
            "- {} ({}) • stock {} • recommended {:.1} • order {} • {}",
            o.product_name,
            o.sku,
            o.current_stock,
            o.recommended_stock_level,
            o.suggested_order_quantity,
            o.recommended_action
        );
    }
}

fn render_alerts(report: &ReorderAlertReport) {
    println!("{} reorder alerts", report.alerts_count);
    for a in &report.alerts {
        println!(
            "- {} • urgency {:.2} • stock {} / min {} • order {}",
            a.product_name.as_deref().unwrap_or("<unknown product>"),
            a.urgency_score,
            a.current_stock,
            a.minimum_stock_level,
            a.suggested_order_quantity
        );
    }
}

fn render_stockouts(report: &StockoutReport) {
    println!(
        "{} products analyzed over {} days • {} high risk",
        report.products_analyzed, report.forecast_period_days, report.high_risk_products
    );
    for f in &report.forecasts {
        println!(
            "- {} • {:.1} days left • {} risk • {:.2} units/day",
            f.product_name.as_deref().unwrap_or("<unknown product>"),
            f.days_until_stockout,
            f.stockout_risk,
            f.daily_demand
        );
    }
}
