//! Spot price aggregation
//!
//! Groups raw spot price observations by (instance type, availability
//! zone) and computes the arithmetic mean per group. Observations whose
//! price field does not parse are dropped and counted; a bad record never
//! aborts the batch.

use crate::models::{PriceObservation, SpotAggregate};
use std::collections::HashMap;
use tracing::debug;

/// Outcome of one aggregation pass
#[derive(Debug, Default)]
pub struct AggregationResult {
    pub aggregates: Vec<SpotAggregate>,
    /// Observations dropped because their price did not parse
    pub skipped: usize,
}

/// Aggregate spot price observations into per-(instance type, AZ) means.
///
/// Ordering of the output is unspecified; consumers treat it as a set.
/// A group always has at least one member by construction.
pub fn aggregate_spot_prices(observations: &[PriceObservation]) -> AggregationResult {
    let mut groups: HashMap<(String, String), Vec<f64>> = HashMap::new();
    let mut skipped = 0usize;

    for obs in observations {
        match obs.price.trim().parse::<f64>() {
            Ok(price) => {
                groups
                    .entry((obs.instance_type.clone(), obs.az.clone()))
                    .or_default()
                    .push(price);
            }
            Err(_) => {
                skipped += 1;
                debug!(
                    instance_type = %obs.instance_type,
                    az = %obs.az,
                    price = %obs.price,
                    "Dropping spot observation with unparsable price"
                );
            }
        }
    }

    let aggregates = groups
        .into_iter()
        .map(|((instance_type, az), prices)| {
            let mean_price = prices.iter().sum::<f64>() / prices.len() as f64;
            SpotAggregate {
                instance_type,
                az,
                mean_price,
            }
        })
        .collect();

    AggregationResult { aggregates, skipped }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(instance_type: &str, az: &str, price: &str) -> PriceObservation {
        PriceObservation {
            instance_type: instance_type.to_string(),
            az: az.to_string(),
            price: price.to_string(),
            timestamp: 0,
        }
    }

    #[test]
    fn test_groups_by_instance_type_and_az() {
        let observations = vec![
            obs("t2.micro", "us-east-1a", "0.01"),
            obs("t2.micro", "us-east-1a", "0.02"),
            obs("t2.micro", "us-east-1b", "0.03"),
        ];

        let result = aggregate_spot_prices(&observations);

        assert_eq!(result.aggregates.len(), 2);
        assert_eq!(result.skipped, 0);

        let mean_for = |az: &str| {
            result
                .aggregates
                .iter()
                .find(|a| a.az == az)
                .map(|a| a.mean_price)
                .unwrap()
        };
        assert!((mean_for("us-east-1a") - 0.015).abs() < 1e-12);
        assert!((mean_for("us-east-1b") - 0.03).abs() < 1e-12);
    }

    #[test]
    fn test_unparsable_price_is_dropped_not_fatal() {
        let observations = vec![
            obs("t2.micro", "us-east-1a", "0.01"),
            obs("t2.micro", "us-east-1a", "not-a-price"),
            obs("t2.micro", "us-east-1a", "0.03"),
        ];

        let result = aggregate_spot_prices(&observations);

        assert_eq!(result.skipped, 1);
        assert_eq!(result.aggregates.len(), 1);
        assert!((result.aggregates[0].mean_price - 0.02).abs() < 1e-12);
    }

    #[test]
    fn test_empty_input_produces_no_groups() {
        let result = aggregate_spot_prices(&[]);
        assert!(result.aggregates.is_empty());
        assert_eq!(result.skipped, 0);
    }

    #[test]
    fn test_whitespace_tolerant_parse() {
        let observations = vec![obs("m5.large", "eu-west-1a", " 0.045 ")];
        let result = aggregate_spot_prices(&observations);
        assert_eq!(result.aggregates.len(), 1);
        assert!((result.aggregates[0].mean_price - 0.045).abs() < 1e-12);
    }
}
