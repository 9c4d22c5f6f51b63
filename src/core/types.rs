use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_CHART_POINTS: u32 = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationParams {
    pub principal: f64,
    pub daily_rate: f64,
    pub volatility: f64,
    pub duration_days: u32,
    pub deposit_amount: f64,
    /// Zero disables recurring deposits whatever `deposit_amount` says.
    pub deposit_interval_days: u32,
    pub max_chart_points: u32,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            principal: 1_000.0,
            daily_rate: 0.0004,
            volatility: 0.002,
            duration_days: 90,
            deposit_amount: 0.0,
            deposit_interval_days: 0,
            max_chart_points: DEFAULT_MAX_CHART_POINTS,
        }
    }
}

impl SimulationParams {
    pub fn deposits_enabled(&self) -> bool {
        self.deposit_interval_days > 0
    }

    /// Number of deposits landing inside the simulated window.
    pub fn deposit_count(&self) -> u32 {
        if self.deposits_enabled() {
            self.duration_days / self.deposit_interval_days
        } else {
            0
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DayPoint {
    pub day: u32,
    pub amount: f64,
}

impl DayPoint {
    pub fn new(day: u32, amount: f64) -> Self {
        Self { day, amount }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesResult {
    pub final_amount: f64,
    pub total_gain: f64,
    pub return_rate: f64,
    pub series: Vec<DayPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RealisticResult {
    #[serde(flatten)]
    pub summary: SeriesResult,
    pub worst_day: DayPoint,
    pub best_day: DayPoint,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct Difference {
    pub amount: f64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionResult {
    pub ideal: SeriesResult,
    pub real: RealisticResult,
    pub difference: Difference,
    pub total_contributions: f64,
    /// Set when a non-finite amount had to be reset to the principal.
    pub numeric_anomaly: bool,
}
