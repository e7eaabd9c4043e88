use axum::extract::Query;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use clap::Parser;
use fdo_ledger_proxy::domain::model::{
    CommissioningCreateRequest, PassportAgent, PassportMetadata, ProductItemPassport,
    ProductItemRecord, SchemaVersion,
};
use fdo_ledger_proxy::utils::logger;
use std::collections::HashMap;
use std::future::IntoFuture;

#[derive(Parser)]
#[command(name = "mock-ledger")]
#[command(about = "Local stand-in for the passport ledger service")]
struct Args {
    /// Address for the product item passport endpoint
    #[arg(long, default_value = "127.0.0.1:8443")]
    product_listen: String,

    /// Address for the commissioning passport endpoint
    #[arg(long, default_value = "127.0.0.1:8000")]
    commissioning_listen: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn router() -> Router {
    Router::new()
        .route("/product_item/", get(product_item))
        .route(
            "/create-commissioning-passport",
            post(create_commissioning_passport),
        )
}

async fn product_item(Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
    let Some(uuid) = params.get("uuid").filter(|u| !u.is_empty()) else {
        return (StatusCode::BAD_REQUEST, "Missing uuid parameter").into_response();
    };

    let now = chrono::Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or_default()
        .to_string();

    let passport = ProductItemPassport {
        schema_version: SchemaVersion::Text("1.0".to_string()),
        uuid: uuid.clone(),
        records: vec![
            ProductItemRecord {
                uuid: "record1".to_string(),
                signature: "mock-record-signature-1".to_string(),
                descriptor: "MANUFACTURING".to_string(),
            },
            ProductItemRecord {
                uuid: "record2".to_string(),
                signature: "mock-record-signature-2".to_string(),
                descriptor: "CERTIFICATION".to_string(),
            },
        ],
        metadata: PassportMetadata {
            version: "1.0".to_string(),
            creation_time: now,
            board_sn: "mock-board-sn".to_string(),
        },
        agent: PassportAgent {
            uuid: "mock-passport-service".to_string(),
            signature: "mock-agent-signature".to_string(),
        },
        signature: "mock-signature-12345".to_string(),
    };

    tracing::info!(uuid = %uuid, "Served product item passport");
    Json(passport).into_response()
}

async fn create_commissioning_passport(body: axum::body::Bytes) -> impl IntoResponse {
    let req: CommissioningCreateRequest = match serde_json::from_slice(&body) {
        Ok(req) => req,
        Err(_) => return (StatusCode::BAD_REQUEST, "Invalid JSON").into_response(),
    };

    if req.controller_uuid.is_empty() {
        return (StatusCode::BAD_REQUEST, "Missing controller_uuid").into_response();
    }

    tracing::info!(
        controller_uuid = %req.controller_uuid,
        deployed_location = %req.deployed_location,
        "Created commissioning passport"
    );

    let id = format!(
        "commissioning-{}-{}",
        req.controller_uuid,
        chrono::Utc::now().timestamp()
    );
    (
        StatusCode::CREATED,
        Json(serde_json::json!({
            "status": "success",
            "message": "Commissioning passport created",
            "id": id,
        })),
    )
        .into_response()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    let product = tokio::net::TcpListener::bind(&args.product_listen).await?;
    let commissioning = tokio::net::TcpListener::bind(&args.commissioning_listen).await?;
    tracing::info!(
        "🚀 Mock ledger on {} (product) and {} (commissioning)",
        product.local_addr()?,
        commissioning.local_addr()?
    );

    let (product_result, commissioning_result) = tokio::join!(
        axum::serve(product, router()).into_future(),
        axum::serve(commissioning, router()).into_future(),
    );
    product_result?;
    commissioning_result?;
    Ok(())
}
