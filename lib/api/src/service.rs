//! Match and property-fill endpoints, independent of transport.

use crate::error::Result;
use crate::model::{MatchRequest, MatchResponse, PropertiesRequest, PropertiesResponse};
use pantry_aggregate::{lookup_properties, PropertySource};
use pantry_core::{Embedder, ReferenceContext};
use std::sync::Arc;
use tracing::info;

pub struct IngredientService {
    context: Arc<ReferenceContext>,
    embedder: Arc<dyn Embedder>,
    properties: Arc<dyn PropertySource>,
}

impl IngredientService {
    pub fn new(context: Arc<ReferenceContext>, embedder: Arc<dyn Embedder>, properties: Arc<dyn PropertySource>) -> Self {
        Self {
            context,
            embedder,
            properties,
        }
    }

    #[must_use]
    pub fn context(&self) -> &ReferenceContext {
        &self.context
    }

    /// One entry per input string, in input order. An empty request gets an
    /// empty response.
    pub fn match_ingredients(&self, request: &MatchRequest) -> Result<MatchResponse> {
        if request.ingredients.is_empty() {
            return Ok(MatchResponse { response: Vec::new() });
        }

        let results = self.context.match_texts(self.embedder.as_ref(), &request.ingredients)?;
        let (ids, scores): (Vec<i64>, Vec<f64>) = results.iter().map(|m| (m.taxonomy_id, m.score)).unzip();

        info!(ingredients = request.ingredients.len(), "Matched ingredients");
        MatchResponse::build(&request.ingredients, &ids, &scores)
    }

    /// One object per requested id, duplicates and order preserved.
    pub fn fill_properties(&self, request: &PropertiesRequest) -> Result<PropertiesResponse> {
        let ids = request.ids()?;
        let response = lookup_properties(self.properties.as_ref(), &ids)?;

        info!(
            ids = ids.len(),
            with_data = response.iter().filter(|f| f.has_data).count(),
            "Filled properties"
        );
        Ok(PropertiesResponse { response })
    }

    /// Reload taxonomy vectors and stopwords. Waits for in-flight matches.
    pub fn reload(&self) -> Result<()> {
        Ok(self.context.reload()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pantry_aggregate::{PropertyType, ReferenceValueRow};
    use pantry_core::{HashEmbedder, ReferenceLoader, TaxonomyRow};
    use std::collections::BTreeSet;

    const DIM: usize = 128;

    struct Fixture {
        embedder: HashEmbedder,
    }

    impl ReferenceLoader for Fixture {
        fn load_taxonomy(&self) -> pantry_core::Result<Vec<TaxonomyRow>> {
            Ok(["crab", "lobster", "crabs", "aubergine", "avocado"]
                .iter()
                .zip([1, 2, 1, 3, 4])
                .enumerate()
                .map(|(i, (name, id))| TaxonomyRow {
                    row_id: i as i64,
                    taxonomy_id: id,
                    vector: self.embedder.embed_one(name),
                })
                .collect())
        }

        fn load_stopwords(&self) -> pantry_core::Result<Vec<String>> {
            Ok(vec!["bb".into(), "x".into(), "kg".into()])
        }
    }

    impl PropertySource for Fixture {
        fn fetch(&self, ids: &BTreeSet<i64>) -> pantry_core::Result<Vec<ReferenceValueRow>> {
            let rows = vec![
                ReferenceValueRow {
                    taxonomy_id: 1,
                    property_type: PropertyType::MacroNutrient,
                    property: "protein".into(),
                    reference_value: 18.1,
                },
                ReferenceValueRow {
                    taxonomy_id: 1,
                    property_type: PropertyType::Allergen,
                    property: "crustaceans".into(),
                    reference_value: 1.0,
                },
            ];
            Ok(rows.into_iter().filter(|r| ids.contains(&r.taxonomy_id)).collect())
        }
    }

    fn service() -> IngredientService {
        let embedder = HashEmbedder::new(DIM).unwrap();
        let context = ReferenceContext::load(Box::new(Fixture { embedder }), Some(DIM)).unwrap();
        IngredientService::new(Arc::new(context), Arc::new(embedder), Arc::new(Fixture { embedder }))
    }

    #[test]
    fn test_match_keeps_raw_inputs() {
        let req = MatchRequest {
            ingredients: vec!["Crab BB X1kg".into(), "Aubergine".into(), "Crab BB X1kg".into()],
        };
        let resp = service().match_ingredients(&req).unwrap();
        assert_eq!(resp.response.len(), 3);
        assert_eq!(resp.response[0].ingredient, "Crab BB X1kg");
        assert_eq!(resp.response[0].id, 1);
        assert!(resp.response[0].score > 0.9);
        assert_eq!(resp.response[1].id, 3);
        assert_eq!(resp.response[0], resp.response[2]);
    }

    #[test]
    fn test_empty_match_request() {
        let resp = service().match_ingredients(&MatchRequest { ingredients: vec![] }).unwrap();
        assert!(resp.response.is_empty());
    }

    #[test]
    fn test_fill_properties() {
        let resp = service().fill_properties(&PropertiesRequest::from_ids(&[1, 9, 1])).unwrap();
        assert_eq!(resp.response.len(), 3);
        assert!(resp.response[0].has_data);
        assert!(!resp.response[1].has_data);
        assert_eq!(resp.response[0], resp.response[2]);

        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["response"][0]["crustaceans"], true);
        assert_eq!(json["response"][0]["protein"], 18.1);
        assert!(json["response"][1]["protein"].is_null());
    }

    #[test]
    fn test_reload() {
        let svc = service();
        svc.reload().unwrap();
        assert_eq!(svc.context().read().index.len(), 5);
    }
}
