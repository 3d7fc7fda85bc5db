//! Endpoint request and response bodies.

use crate::error::{Result, ServiceError};
use pantry_aggregate::PropertyFill;
use pantry_core::round::{round_to, RESPONSE_SCORE_DECIMALS};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRequest {
    pub ingredients: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchEntry {
    pub ingredient: String,
    pub id: i64,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResponse {
    pub response: Vec<MatchEntry>,
}

impl MatchResponse {
    /// Zip the raw inputs with their matches. All three sequences must have
    /// the same length; scores are re-rounded to 4 decimals.
    pub fn build(ingredients: &[String], ids: &[i64], scores: &[f64]) -> Result<Self> {
        for (len, context) in [(ids.len(), "matched ids"), (scores.len(), "matched scores")] {
            if len != ingredients.len() {
                return Err(pantry_core::Error::LengthMismatch {
                    context,
                    expected: ingredients.len(),
                    actual: len,
                }
                .into());
            }
        }

        let response = ingredients
            .iter()
            .zip(ids)
            .zip(scores)
            .map(|((ingredient, id), score)| MatchEntry {
                ingredient: ingredient.clone(),
                id: *id,
                score: round_to(*score, RESPONSE_SCORE_DECIMALS),
            })
            .collect();
        Ok(Self { response })
    }
}

/// Ids arrive as JSON values so a batch with one unconvertible element can
/// be rejected as a whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertiesRequest {
    pub ingredient_ids: Vec<Value>,
}

impl PropertiesRequest {
    #[must_use]
    pub fn from_ids(ids: &[i64]) -> Self {
        Self {
            ingredient_ids: ids.iter().map(|id| Value::from(*id)).collect(),
        }
    }

    /// Integers, whole floats and integer strings convert; anything else
    /// fails the batch.
    pub fn ids(&self) -> Result<Vec<i64>> {
        self.ingredient_ids.iter().map(to_id).collect()
    }
}

fn to_id(value: &Value) -> Result<i64> {
    let invalid = || -> ServiceError {
        pantry_core::Error::InvalidId {
            value: value.to_string(),
        }
        .into()
    };
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Ok(i);
            }
            match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(f as i64),
                _ => Err(invalid()),
            }
        }
        Value::String(s) => s.trim().parse::<i64>().map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertiesResponse {
    pub response: Vec<PropertyFill>,
}

/// Parse a JSON body into a request type.
pub fn parse_body<T: for<'de> Deserialize<'de>>(body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| ServiceError::InvalidRequest(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_match_response_zips_inputs() {
        let inputs = vec!["Crab BB X1kg".to_string(), "Aubergines".to_string()];
        let resp = MatchResponse::build(&inputs, &[1, 7], &[0.987654, 0.5]).unwrap();
        assert_eq!(resp.response[0].ingredient, "Crab BB X1kg");
        assert_eq!(resp.response[0].score, 0.9877);
        assert_eq!(resp.response[1].id, 7);
    }

    #[test]
    fn test_match_response_length_mismatch() {
        let inputs = vec!["a".to_string(), "b".to_string()];
        let err = MatchResponse::build(&inputs, &[1], &[0.5, 0.5]).unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Core(pantry_core::Error::LengthMismatch { expected: 2, actual: 1, .. })
        ));
    }

    #[test]
    fn test_ids_convert() {
        let req: PropertiesRequest = parse_body(r#"{"ingredient_ids": [1, "66", 117.0, " 631 "]}"#).unwrap();
        assert_eq!(req.ids().unwrap(), vec![1, 66, 117, 631]);
    }

    #[test]
    fn test_bad_id_fails_batch() {
        let req = PropertiesRequest {
            ingredient_ids: vec![json!(1), json!("crab"), json!(3)],
        };
        assert!(matches!(
            req.ids(),
            Err(ServiceError::Core(pantry_core::Error::InvalidId { .. }))
        ));
        let req = PropertiesRequest {
            ingredient_ids: vec![json!(1.5)],
        };
        assert!(req.ids().is_err());
    }

    #[test]
    fn test_match_request_requires_strings() {
        assert!(parse_body::<MatchRequest>(r#"{"ingredients": "crab"}"#).is_err());
        assert!(parse_body::<MatchRequest>(r#"{"ingredients": ["crab", 3]}"#).is_err());
        let req: MatchRequest = parse_body(r#"{"ingredients": ["crab", ""]}"#).unwrap();
        assert_eq!(req.ingredients.len(), 2);
    }
}
