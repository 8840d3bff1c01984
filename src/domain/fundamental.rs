//! Fundamental metrics, thresholds and the pass/fail scorer.

/// Fallback values used when a provider cannot supply a field. Units follow
/// the provider: ROE and the growth rates in percent, cash flow in 1e8 CNY.
pub const DEFAULT_ROE: f64 = 15.0;
pub const DEFAULT_REVENUE_GROWTH: f64 = 10.0;
pub const DEFAULT_PROFIT_GROWTH: f64 = 15.0;
pub const DEFAULT_CASH_FLOW: f64 = 1.0;

/// A single point-in-time fundamental record. One snapshot is applied to
/// every day of a run; there is no fundamental time series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FundamentalSnapshot {
    pub roe: f64,
    pub revenue_growth: f64,
    pub profit_growth: f64,
    pub cash_flow: f64,
}

impl Default for FundamentalSnapshot {
    fn default() -> Self {
        Self {
            roe: DEFAULT_ROE,
            revenue_growth: DEFAULT_REVENUE_GROWTH,
            profit_growth: DEFAULT_PROFIT_GROWTH,
            cash_flow: DEFAULT_CASH_FLOW,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FundamentalThresholds {
    pub min_roe: f64,
    pub min_revenue_growth: f64,
    pub min_profit_growth: f64,
    pub min_cash_flow: f64,
}

impl Default for FundamentalThresholds {
    fn default() -> Self {
        Self {
            min_roe: 15.0,
            min_revenue_growth: 10.0,
            min_profit_growth: 15.0,
            min_cash_flow: 1.0,
        }
    }
}

/// Sub-scores are 0 or 1; the overall score is their mean, so it lands in
/// {0, 1/3, 2/3, 1}. `excluded` is an advisory hard filter: true when any
/// single metric misses its threshold. It is logged, never enforced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FundamentalAssessment {
    pub roe_score: f64,
    pub growth_score: f64,
    pub cash_flow_score: f64,
    pub overall_score: f64,
    pub excluded: bool,
}

pub fn assess(
    snapshot: &FundamentalSnapshot,
    thresholds: &FundamentalThresholds,
) -> FundamentalAssessment {
    let roe_score = if snapshot.roe >= thresholds.min_roe {
        1.0
    } else {
        0.0
    };
    // Growth passes only when revenue and profit growth both clear.
    let growth_score = if snapshot.revenue_growth >= thresholds.min_revenue_growth
        && snapshot.profit_growth >= thresholds.min_profit_growth
    {
        1.0
    } else {
        0.0
    };
    let cash_flow_score = if snapshot.cash_flow >= thresholds.min_cash_flow {
        1.0
    } else {
        0.0
    };

    let excluded = snapshot.roe < thresholds.min_roe
        || snapshot.revenue_growth < thresholds.min_revenue_growth
        || snapshot.profit_growth < thresholds.min_profit_growth
        || snapshot.cash_flow < thresholds.min_cash_flow;

    FundamentalAssessment {
        roe_score,
        growth_score,
        cash_flow_score,
        overall_score: (roe_score + growth_score + cash_flow_score) / 3.0,
        excluded,
    }
}
