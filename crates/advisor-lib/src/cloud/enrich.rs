//! In-place enrichment of SKU records with quota and price data

use crate::models::{ComputeUsage, PriceInfo, QuotaInfo, RetailPrice, SkuRecord};

/// Attach family quota to each SKU. SKUs whose family has no usage line keep `None`.
pub fn enrich_with_quotas(skus: &mut [SkuRecord], usages: &[ComputeUsage]) {
    for sku in skus.iter_mut() {
        sku.quota = usages
            .iter()
            .find(|u| u.family.eq_ignore_ascii_case(&sku.family))
            .map(|u| QuotaInfo::new(u.limit, u.used));
    }
}

/// Attach hourly prices to each SKU. Prices in another currency are ignored.
pub fn enrich_with_prices(skus: &mut [SkuRecord], prices: &[RetailPrice], currency: &str) {
    for sku in skus.iter_mut() {
        sku.pricing = prices
            .iter()
            .find(|p| p.sku.eq_ignore_ascii_case(&sku.name) && p.currency.eq_ignore_ascii_case(currency))
            .map(|p| PriceInfo {
                paygo: p.paygo,
                spot: p.spot,
                currency: p.currency.clone(),
            });
    }
}
