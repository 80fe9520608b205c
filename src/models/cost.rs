use serde::{Deserialize, Serialize};

/// The three derived figures read back from the costing form.
///
/// Zero means "not computed yet" to the target application, so a summary is
/// only valid when every figure is strictly positive. A genuinely zero-cost
/// configuration is indistinguishable from an unfinished one.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostSummary {
    pub cost_per_unit: f64,
    pub total_labour_cost: f64,
    pub overhead_cost_per_job: f64,
}

impl CostSummary {
    pub fn new(cost_per_unit: f64, total_labour_cost: f64, overhead_cost_per_job: f64) -> Self {
        Self {
            cost_per_unit,
            total_labour_cost,
            overhead_cost_per_job,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.values().iter().all(|v| *v > 0.0)
    }

    /// True when at least one figure has been computed
    pub fn any_positive(&self) -> bool {
        self.values().iter().any(|v| *v > 0.0)
    }

    pub fn values(&self) -> [f64; 3] {
        [self.cost_per_unit, self.total_labour_cost, self.overhead_cost_per_job]
    }
}

/// Parse a sanitized figure; anything unparsable or negative reads as zero
pub fn parse_figure(raw: &str) -> f64 {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validity_requires_all_positive() {
        assert!(CostSummary::new(2.35, 40.10, 12.00).is_valid());
        assert!(!CostSummary::new(2.35, 0.0, 12.00).is_valid());
        assert!(!CostSummary::default().is_valid());
        assert!(CostSummary::new(0.0, 0.0, 1.0).any_positive());
    }

    #[test]
    fn figures_parse_leniently() {
        assert_eq!(parse_figure("40.10"), 40.10);
        assert_eq!(parse_figure(""), 0.0);
        assert_eq!(parse_figure("1.2.3"), 0.0);
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(CostSummary::new(1.0, 2.0, 3.0)).unwrap();
        assert_eq!(json["costPerUnit"], 1.0);
        assert_eq!(json["totalLabourCost"], 2.0);
        assert_eq!(json["overheadCostPerJob"], 3.0);
    }
}
