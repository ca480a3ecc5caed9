//! WebAssembly module for the Inventory Management Platform
//!
//! Provides client-side computation for:
//! - Stock status badges
//! - Sale totals shown before submitting
//! - Refill quantities on the fulfillment form
//! - Request payload validation

use rust_decimal::Decimal;
use std::str::FromStr;
use wasm_bindgen::prelude::*;

use shared::{RequestKind, RequestPayload, StockStatus};

/// Classify a product's stock level (`in_stock`, `low_stock`, `out_of_stock`)
#[wasm_bindgen]
pub fn classify_stock_status(quantity: i32, min_threshold: i32) -> String {
    StockStatus::classify(quantity, min_threshold)
        .as_str()
        .to_string()
}

/// Human-readable stock label
#[wasm_bindgen]
pub fn stock_status_label(quantity: i32, min_threshold: i32) -> String {
    StockStatus::classify(quantity, min_threshold).to_string()
}

/// Total for a sale; price is a decimal string to avoid float rounding
#[wasm_bindgen]
pub fn calculate_sale_total(price: &str, quantity: i32) -> Result<String, JsValue> {
    sale_total(price, quantity).map_err(|e| JsValue::from_str(&e))
}

/// Quantity a refill will be fulfilled with; `undefined` if neither amount is usable
#[wasm_bindgen]
pub fn effective_refill_quantity(requested: i32, added: Option<i32>) -> Option<i32> {
    shared::effective_refill_quantity(requested, added.map(i64::from))
}

/// Validate a request payload before submitting it.
///
/// Resolves to the request type, or rejects with the message the server
/// would return.
#[wasm_bindgen]
pub fn validate_request_payload(payload_json: &str) -> Result<String, JsValue> {
    check_request_payload(payload_json)
        .map(str::to_string)
        .map_err(|e| JsValue::from_str(&e))
}

fn sale_total(price: &str, quantity: i32) -> Result<String, String> {
    let price = Decimal::from_str(price.trim()).map_err(|_| "Invalid price".to_string())?;
    if price < Decimal::ZERO {
        return Err("Price cannot be negative".to_string());
    }
    if quantity < 1 {
        return Err("Quantity must be at least 1".to_string());
    }
    shared::sale_total(price, quantity)
        .map(|total| total.to_string())
        .ok_or_else(|| "Sale total out of range".to_string())
}

fn check_request_payload(payload_json: &str) -> Result<&'static str, String> {
    let payload: RequestPayload =
        serde_json::from_str(payload_json).map_err(|e| format!("Invalid request JSON: {}", e))?;

    RequestKind::from_payload(&payload)
        .map(|kind| kind.type_name())
        .map_err(|e| e.message)
}
