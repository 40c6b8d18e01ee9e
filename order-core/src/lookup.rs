// The engine never prices parts itself. It asks a `PricingLookup` and rounds
// the answer up to whole currency units.

use std::future::Future;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::LookupError;
use crate::model::PartSize;

// field names follow the wire format
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRequest {
    #[serde(rename = "width")]
    pub width_mm: u32,
    #[serde(rename = "height")]
    pub height_mm: u32,
    pub part_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parts_list: Option<Vec<PartSize>>,
}

impl PriceRequest {
    pub fn single(width_mm: u32, height_mm: u32) -> Self {
        PriceRequest {
            width_mm,
            height_mm,
            part_count: 1,
            parts_list: None,
        }
    }

    pub fn merged(width_mm: u32, height_mm: u32, parts: Vec<PartSize>) -> Self {
        PriceRequest {
            width_mm,
            height_mm,
            part_count: u32::try_from(parts.len()).unwrap_or(u32::MAX),
            parts_list: Some(parts),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceResponse {
    pub price: f64,
}

/// Async capability that turns geometry into a price.
pub trait PricingLookup {
    fn lookup(
        &self,
        request: &PriceRequest,
    ) -> impl Future<Output = Result<PriceResponse, LookupError>>;
}

impl<T: PricingLookup + ?Sized> PricingLookup for &T {
    fn lookup(
        &self,
        request: &PriceRequest,
    ) -> impl Future<Output = Result<PriceResponse, LookupError>> {
        (**self).lookup(request)
    }
}

/// Prices in-process with [`quote_core::price`].
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalPricing;

impl LocalPricing {
    pub fn quote(&self, request: &PriceRequest) -> Result<PriceResponse, LookupError> {
        if request.width_mm == 0 || request.height_mm == 0 {
            return Err(LookupError::MissingDimensions {
                width: request.width_mm,
                height: request.height_mm,
            });
        }
        let price = quote_core::price(
            f64::from(request.width_mm),
            f64::from(request.height_mm),
            request.part_count.max(1),
        );
        debug!(
            width = request.width_mm,
            height = request.height_mm,
            part_count = request.part_count,
            price,
            "quoted locally"
        );
        Ok(PriceResponse { price })
    }
}

impl PricingLookup for LocalPricing {
    async fn lookup(&self, request: &PriceRequest) -> Result<PriceResponse, LookupError> {
        self.quote(request)
    }
}

/// Largest price accepted for a single part.
pub const MAX_PART_PRICE: u64 = 1_000_000_000_000;

/// Whole currency units charged for a response.
pub fn settle_price(response: PriceResponse) -> Result<u64, LookupError> {
    let p = response.price;
    if !p.is_finite() || p < 0.0 {
        return Err(LookupError::Malformed(format!("price {p} is not billable")));
    }
    let units = p.ceil();
    // exact in f64, so the cast below cannot saturate
    if units > MAX_PART_PRICE as f64 {
        return Err(LookupError::Malformed(format!("price {p} is out of range")));
    }
    Ok(units as u64)
}

/// Parse a remote authority's response body.
pub fn parse_price_response(body: &str) -> Result<PriceResponse, LookupError> {
    serde_json::from_str(body).map_err(|e| LookupError::Malformed(e.to_string()))
}
