//! AWS Lambda handler for pricing incapacity claims
//!
//! Accepts a claim (or an array of claims) as JSON and returns the
//! calculation result. The rate table is loaded once per cold start from
//! `RATES_PATH` (default `data/rates.csv`).
//!
//! Supports Lambda Function URLs for direct HTTP access.

use incapacity_benefits::{
    claim::{parse_claim_json, parse_claims_json},
    rates::DEFAULT_RATES_PATH,
    BenefitCalculator, CalculationConfig, CalculationResult,
};
use lambda_http::{run, service_fn, Body, Error, Request, Response};
use serde::Serialize;
use std::sync::Arc;

/// Result for one claim of a batch request
#[derive(Debug, Serialize)]
pub struct BatchEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claim_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<CalculationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Response wrapper
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ClaimResponse {
    Single(CalculationResult),
    Batch(Vec<BatchEntry>),
}

fn error_response(status: u16, message: &str) -> Result<Response<Body>, Error> {
    let body = serde_json::json!({ "error": message }).to_string();
    Ok(Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(Body::Text(body))?)
}

fn json_response(body: &ClaimResponse) -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(200)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "POST, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type")
        .body(Body::Text(serde_json::to_string(body)?))?)
}

/// Lambda handler function
async fn handler(calculator: Arc<BenefitCalculator>, event: Request) -> Result<Response<Body>, Error> {
    // Handle CORS preflight
    if event.method().as_str() == "OPTIONS" {
        return Ok(Response::builder()
            .status(200)
            .header("Access-Control-Allow-Origin", "*")
            .header("Access-Control-Allow-Methods", "POST, OPTIONS")
            .header("Access-Control-Allow-Headers", "Content-Type")
            .body(Body::Empty)?);
    }

    let body_str = match event.body() {
        Body::Text(s) => s.clone(),
        Body::Binary(b) => String::from_utf8_lossy(b).to_string(),
        Body::Empty => return error_response(400, "Empty request body"),
    };

    let start = std::time::Instant::now();

    let response = if body_str.trim_start().starts_with('[') {
        let claims = match parse_claims_json(&body_str) {
            Ok(c) => c,
            Err(e) => return error_response(400, &e.to_string()),
        };
        let entries = calculator
            .compute_batch(&claims)
            .into_iter()
            .zip(claims)
            .map(|(outcome, claim)| match outcome {
                Ok(result) => BatchEntry {
                    claim_id: claim.claim_id,
                    result: Some(result),
                    error: None,
                },
                Err(e) => BatchEntry {
                    claim_id: claim.claim_id,
                    result: None,
                    error: Some(e.to_string()),
                },
            })
            .collect();
        ClaimResponse::Batch(entries)
    } else {
        let claim = match parse_claim_json(&body_str) {
            Ok(c) => c,
            Err(e) => return error_response(400, &e.to_string()),
        };
        match calculator.compute_claim(&claim) {
            Ok(result) => ClaimResponse::Single(result),
            Err(e) => return error_response(422, &e.to_string()),
        }
    };

    log::info!("Request priced in {:?}", start.elapsed());
    json_response(&response)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();

    let rates_path = std::env::var("RATES_PATH").unwrap_or_else(|_| DEFAULT_RATES_PATH.to_string());
    let table = incapacity_benefits::rates::load_rate_table(&rates_path)?;
    log::info!("Loaded {} rate periods from {}", table.periods().len(), rates_path);

    let calculator = Arc::new(BenefitCalculator::with_config(table, CalculationConfig::from_env()));
    run(service_fn(move |event: Request| {
        let calculator = Arc::clone(&calculator);
        async move { handler(calculator, event).await }
    }))
    .await
}
