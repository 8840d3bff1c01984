//! Position sizing strategies.

/// Closed set of sizing strategies, selected once at configuration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizingMethod {
    Kelly,
    RiskParity,
    Fixed,
}

impl SizingMethod {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "kelly" => Some(SizingMethod::Kelly),
            "risk_parity" => Some(SizingMethod::RiskParity),
            "fixed" => Some(SizingMethod::Fixed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SizingMethod::Kelly => "kelly",
            SizingMethod::RiskParity => "risk_parity",
            SizingMethod::Fixed => "fixed",
        }
    }
}

/// Trade statistics and risk budget fed into the sizing formulas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizingParams {
    pub win_rate: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub risk_per_trade: f64,
}

impl Default for SizingParams {
    fn default() -> Self {
        Self {
            win_rate: 0.5,
            avg_win: 0.1,
            avg_loss: 0.05,
            risk_per_trade: 0.02,
        }
    }
}

/// Currency amount to commit to a position.
///
/// Kelly:       `(win_rate*avg_win - (1-win_rate)*avg_loss) / avg_win`,
///              clamped to [0.1, 0.9]; the fraction falls back to 0.1 when
///              `avg_loss == 0` instead of evaluating the formula.
/// Risk parity: `capital * risk_per_trade / avg_loss` (validation keeps
///              `avg_loss` above zero for this method).
/// Fixed:       `0.5 * capital` regardless of inputs.
pub fn position_amount(method: SizingMethod, params: &SizingParams, capital: f64) -> f64 {
    match method {
        SizingMethod::Kelly => {
            let fraction = if params.avg_loss == 0.0 {
                0.1
            } else {
                let kelly = (params.win_rate * params.avg_win
                    - (1.0 - params.win_rate) * params.avg_loss)
                    / params.avg_win;
                kelly.clamp(0.1, 0.9)
            };
            fraction * capital
        }
        SizingMethod::RiskParity => capital * params.risk_per_trade / params.avg_loss,
        SizingMethod::Fixed => 0.5 * capital,
    }
}

/// Position fraction of capital, clamped to `[0, max_position]`. Every
/// sizing path flows through this clamp before a position is opened.
pub fn position_fraction(
    method: SizingMethod,
    params: &SizingParams,
    capital: f64,
    max_position: f64,
) -> f64 {
    let amount = position_amount(method, params, capital);
    (amount / capital).clamp(0.0, max_position)
}
