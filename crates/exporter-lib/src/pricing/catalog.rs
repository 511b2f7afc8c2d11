//! On-demand catalog normalization
//!
//! Extracts a flat pricing record from the deeply nested per-offer
//! catalog payload (product attributes plus pricing terms keyed by
//! opaque term and dimension identifiers). Deserialization is
//! schema-typed; term and dimension maps are `BTreeMap`s, so offers are
//! visited in lexicographic key order and the first complete offer wins,
//! which makes extraction deterministic when a payload carries several
//! nested offers.

use crate::errors::ParseError;
use crate::models::OnDemandCatalogEntry;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct RawCatalogPayload {
    product: RawProduct,
    #[serde(default)]
    terms: RawTerms,
}

#[derive(Debug, Deserialize)]
struct RawProduct {
    #[serde(default)]
    attributes: RawAttributes,
}

#[derive(Debug, Default, Deserialize)]
struct RawAttributes {
    #[serde(rename = "instanceType", default)]
    instance_type: String,
    #[serde(default)]
    vcpu: String,
    #[serde(default)]
    memory: String,
}

#[derive(Debug, Default, Deserialize)]
struct RawTerms {
    #[serde(rename = "OnDemand", default)]
    on_demand: BTreeMap<String, RawTermOffer>,
}

#[derive(Debug, Deserialize)]
struct RawTermOffer {
    #[serde(rename = "priceDimensions", default)]
    price_dimensions: BTreeMap<String, RawPriceDimension>,
}

#[derive(Debug, Deserialize)]
struct RawPriceDimension {
    #[serde(default)]
    unit: String,
    #[serde(default)]
    description: String,
    #[serde(rename = "pricePerUnit", default)]
    price_per_unit: BTreeMap<String, String>,
}

/// Outcome of normalizing one catalog page
#[derive(Debug, Default)]
pub struct NormalizationResult {
    pub entries: Vec<OnDemandCatalogEntry>,
    /// Payloads dropped as malformed or offer-less
    pub skipped: usize,
}

/// Normalize a page of raw catalog payloads, skipping bad records
pub fn normalize_catalog_page(payloads: &[serde_json::Value]) -> NormalizationResult {
    let mut result = NormalizationResult::default();

    for payload in payloads {
        match normalize_catalog_entry(payload) {
            Ok(entry) => result.entries.push(entry),
            Err(err) => {
                result.skipped += 1;
                debug!(error = %err, "Skipping catalog payload");
            }
        }
    }

    result
}

/// Normalize one nested catalog payload into a flat on-demand entry
pub fn normalize_catalog_entry(
    payload: &serde_json::Value,
) -> Result<OnDemandCatalogEntry, ParseError> {
    let raw: RawCatalogPayload = serde_json::from_value(payload.clone())
        .map_err(|e| ParseError::MalformedPayload(e.to_string()))?;

    let attributes = raw.product.attributes;

    let vcpu_count = attributes
        .vcpu
        .trim()
        .parse::<u32>()
        .map_err(|_| ParseError::InvalidNumber {
            field: "vcpu",
            value: attributes.vcpu.clone(),
        })?;

    // Memory strings look like "1 GiB"; only the leading numeral is
    // meaningful, the unit token is discarded.
    let memory_token = attributes
        .memory
        .split_whitespace()
        .next()
        .unwrap_or_default();
    let memory_gib = memory_token
        .parse::<f64>()
        .map_err(|_| ParseError::InvalidNumber {
            field: "memory",
            value: attributes.memory.clone(),
        })?;

    let (price_per_hour, unit, description) = first_complete_offer(&raw.terms)?;

    Ok(OnDemandCatalogEntry {
        instance_type: attributes.instance_type,
        vcpu: attributes.vcpu,
        memory: attributes.memory,
        vcpu_count,
        memory_gib,
        price_per_hour,
        unit,
        description,
    })
}

/// Walk the nested on-demand offers in key order and return the first one
/// with a parsable USD price
fn first_complete_offer(terms: &RawTerms) -> Result<(f64, String, String), ParseError> {
    for offer in terms.on_demand.values() {
        for dimension in offer.price_dimensions.values() {
            let Some(raw_price) = dimension.price_per_unit.get("USD") else {
                continue;
            };
            if let Ok(price) = raw_price.trim().parse::<f64>() {
                return Ok((price, dimension.unit.clone(), dimension.description.clone()));
            }
        }
    }

    Err(ParseError::MissingOffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(vcpu: &str, memory: &str, price: &str) -> serde_json::Value {
        json!({
            "product": {
                "attributes": {
                    "instanceType": "t2.micro",
                    "vcpu": vcpu,
                    "memory": memory
                }
            },
            "terms": {
                "OnDemand": {
                    "T1": {
                        "priceDimensions": {
                            "T1.D1": {
                                "unit": "Hrs",
                                "description": "$0.0126 per On Demand Linux t2.micro Instance Hour",
                                "pricePerUnit": { "USD": price }
                            }
                        }
                    }
                }
            }
        })
    }

    #[test]
    fn test_normalizes_nested_payload() {
        let entry = normalize_catalog_entry(&payload("1", "1 GiB", "0.0126")).unwrap();

        assert_eq!(entry.instance_type, "t2.micro");
        assert_eq!(entry.vcpu_count, 1);
        assert!((entry.memory_gib - 1.0).abs() < 1e-12);
        assert!((entry.price_per_hour - 0.0126).abs() < 1e-12);
        assert_eq!(entry.unit, "Hrs");
        assert_eq!(entry.memory, "1 GiB");
    }

    #[test]
    fn test_memory_unit_token_is_discarded() {
        let entry = normalize_catalog_entry(&payload("8", "32 GiB", "0.4")).unwrap();
        assert!((entry.memory_gib - 32.0).abs() < 1e-12);
    }

    #[test]
    fn test_multiple_offers_tie_break_is_lexicographic() {
        let value = json!({
            "product": {
                "attributes": { "instanceType": "m5.large", "vcpu": "2", "memory": "8 GiB" }
            },
            "terms": {
                "OnDemand": {
                    "ZZZ": {
                        "priceDimensions": {
                            "ZZZ.1": { "unit": "Hrs", "pricePerUnit": { "USD": "0.200" } }
                        }
                    },
                    "AAA": {
                        "priceDimensions": {
                            "AAA.2": { "unit": "Hrs", "pricePerUnit": { "USD": "0.100" } },
                            "AAA.1": { "unit": "Hrs", "pricePerUnit": { "USD": "0.050" } }
                        }
                    }
                }
            }
        });

        // Smallest term key first ("AAA"), then smallest dimension key
        // within it ("AAA.1"), regardless of payload ordering.
        let entry = normalize_catalog_entry(&value).unwrap();
        assert!((entry.price_per_hour - 0.050).abs() < 1e-12);
    }

    #[test]
    fn test_offer_without_parsable_price_is_passed_over() {
        let value = json!({
            "product": {
                "attributes": { "instanceType": "m5.large", "vcpu": "2", "memory": "8 GiB" }
            },
            "terms": {
                "OnDemand": {
                    "AAA": {
                        "priceDimensions": {
                            "AAA.1": { "unit": "Hrs", "pricePerUnit": { "USD": "n/a" } }
                        }
                    },
                    "BBB": {
                        "priceDimensions": {
                            "BBB.1": { "unit": "Hrs", "pricePerUnit": { "USD": "0.096" } }
                        }
                    }
                }
            }
        });

        let entry = normalize_catalog_entry(&value).unwrap();
        assert!((entry.price_per_hour - 0.096).abs() < 1e-12);
    }

    #[test]
    fn test_missing_offer_is_an_error() {
        let value = json!({
            "product": {
                "attributes": { "instanceType": "m5.large", "vcpu": "2", "memory": "8 GiB" }
            },
            "terms": { "OnDemand": {} }
        });

        assert_eq!(
            normalize_catalog_entry(&value).unwrap_err(),
            ParseError::MissingOffer
        );
    }

    #[test]
    fn test_malformed_payload_skipped_batch_continues() {
        let payloads = vec![
            json!({ "unexpected": "shape" }),
            payload("1", "1 GiB", "0.0126"),
            json!({
                "product": { "attributes": { "instanceType": "x", "vcpu": "??", "memory": "1 GiB" } },
                "terms": { "OnDemand": {} }
            }),
        ];

        let result = normalize_catalog_page(&payloads);

        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.skipped, 2);
    }
}
