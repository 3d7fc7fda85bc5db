//! # Pantry API
//!
//! Transport-agnostic request/response bodies and the [`IngredientService`]
//! behind the two endpoints:
//!
//! - match: `{"ingredients": [..]}` → `{"response": [{ingredient, id, score}, ..]}`
//! - property fill: `{"ingredient_ids": [..]}` → `{"response": [{id, has_data, energy, .., lupin}, ..]}`
//!
//! Responses always have one entry per input element.

pub mod error;
pub mod model;
pub mod service;

pub use error::{Result, ServiceError};
pub use model::{parse_body, MatchEntry, MatchRequest, MatchResponse, PropertiesRequest, PropertiesResponse};
pub use service::IngredientService;
