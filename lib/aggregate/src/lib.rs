//! # Pantry Aggregate
//!
//! Turns matched ingredient observations into one reference profile per
//! taxonomy entry.
//!
//! ```text
//!  Table ─► Observation ─► (score filter) ─► Reshaper ─► UnitTable ─► ReferenceAggregator
//!                                                                            │
//!                                   TabularProjector / dashboard rows ◄──────┘
//! ```
//!
//! | Property type    | Reference value | Dispersion                  |
//! |------------------|-----------------|-----------------------------|
//! | `score`          | mean            | Σ\|v − ref\| / (n − 1)        |
//! | `macro_nutrient` | median          | Σ\|v − ref\| / (n − 1)        |
//! | `allergen`       | median of 0/1   | Σ\|v − ref\| / (n − 1)        |
//!
//! A single-observation group always has a deviation of 0.

pub mod aggregate;
pub mod error;
pub mod observation;
pub mod project;
pub mod properties;
pub mod reshape;
pub mod schema;
pub mod units;

pub use aggregate::{
    group_stats, mean, mean_absolute_deviation, median, AggregationPlan, GroupStats, ReferenceAggregator,
    ReferenceProfile, DEFAULT_DATA_SOURCE, DEFAULT_MATCH_THRESHOLD,
};
pub use error::{AggregateError, Result};
pub use observation::{EntityId, EntityKey, Observation, Quantity};
pub use project::{
    dashboard_rows, AllergenLabels, DashboardRow, EntityCatalogue, EntityDescriptor, PropertyValue, TabularProfile,
    TabularProjector,
};
pub use properties::{fill_properties, lookup_properties, FillValue, PropertyFill, PropertySource, ReferenceValueRow};
pub use reshape::{LongRecord, Measurement, Reshaper};
pub use schema::PropertyType;
pub use units::{UnitConversion, UnitTable};
