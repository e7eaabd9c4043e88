use clap::Parser;
use fdo_ledger_proxy::domain::ports::LedgerClient;
use fdo_ledger_proxy::utils::{logger, validation::Validate};
use fdo_ledger_proxy::{
    Args, DiMiddleware, HttpLedgerClient, MiddlewareChain, ProxyConfig, ProxyState, To2Middleware,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match ProxyConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 初始化日誌
    if config.logging.format == "json" {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting fdo-ledger-proxy");
    tracing::info!("📁 Loaded configuration from: {}", args.config);
    args.apply_overrides(&mut config);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }

    let ledger = match HttpLedgerClient::new(&config.ledger) {
        Ok(ledger) => ledger,
        Err(e) => {
            tracing::error!("❌ Ledger client setup failed: {}", e);
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };
    tracing::info!(
        product = ledger.is_product_configured(),
        commissioning = ledger.is_commissioning_configured(),
        "🔗 Ledger endpoints"
    );

    let commissioning_enabled = ledger.is_commissioning_configured();
    let product_enabled = config.product_passport_enabled();
    let ledger: Arc<dyn LedgerClient> = Arc::new(ledger);

    let di = DiMiddleware::new(Some(ledger.clone()), product_enabled)
        .with_max_body_bytes(config.server.max_body_bytes);
    if !di.product_passport_enabled() {
        tracing::info!("DI product passport lookup disabled");
    }
    let to2 = To2Middleware::new(
        commissioning_enabled.then(|| ledger.clone()),
        config.to2.owner_id.clone(),
    )
    .with_deployed_location(config.to2.deployed_location.clone());

    let chain = MiddlewareChain::new()
        .with(Arc::new(di))
        .with(Arc::new(to2));
    tracing::info!("🧩 Middleware chain: {:?}", chain.names());

    let state = ProxyState::new(&config.server.backend, chain, config.server.max_body_bytes)?;
    let listener = tokio::net::TcpListener::bind(&config.server.listen).await?;
    tracing::info!(
        "📡 Listening on {} → backend {}",
        listener.local_addr()?,
        state.backend()
    );

    fdo_ledger_proxy::core::proxy::serve(listener, state, async {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("🛑 Shutdown requested");
    })
    .await?;

    tracing::info!("✅ Proxy stopped");
    Ok(())
}
