mod engine;
mod error;
mod products;
mod types;

pub use engine::{
    chart_interval, estimated_final_amount, project, project_seeded, project_with_rng,
};
pub use error::ProjectionError;
pub use products::{CatalogError, Product, ProductCatalog};
pub use types::{
    DEFAULT_MAX_CHART_POINTS, DayPoint, Difference, ProjectionResult, RealisticResult,
    SeriesResult, SimulationParams,
};
