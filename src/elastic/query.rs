//! Search request body builders.
//!
//! Pure functions from retrieval parameters to the JSON bodies the engine
//! expects. Kept free of I/O so the exact request shapes can be asserted
//! in tests.

use serde_json::{json, Map, Value};

/// Build a lexical (BM25) search body.
///
/// All clauses land under `bool.must`, so filters and keyword phrases
/// restrict the match instead of merely boosting it:
/// one exact `term` clause per metadata filter entry, one `match_phrase`
/// clause per required keyword, and a final full-text `match` clause for
/// the query itself.
///
/// Filter clauses are emitted in sorted field order, so equal inputs
/// always produce byte-identical bodies.
pub fn bm25_query(query: &str, k: usize, filter: &Map<String, Value>, keywords: &[String]) -> Value {
    let mut must: Vec<Value> = Vec::new();
    for (field, value) in filter {
        must.push(json!({
            "term": { (format!("metadata.{}.keyword", field)): term_value(value) }
        }));
    }
    for keyword in keywords {
        must.push(json!({ "match_phrase": { "text": keyword } }));
    }
    must.push(json!({ "match": { "text": query } }));

    json!({
        "query": { "bool": { "must": must } },
        "size": k,
    })
}

/// Build an approximate nearest-neighbour search body over a dense
/// vector field. Only `text` and `metadata` are requested back; the
/// stored vectors never travel with the hits.
pub fn knn_query(query_vector: &[f32], k: usize, num_candidates: usize, field: &str) -> Value {
    json!({
        "knn": {
            "field": field,
            "query_vector": query_vector,
            "k": k,
            "num_candidates": num_candidates,
        },
        "size": k,
        "_source": ["text", "metadata"],
    })
}

/// Build a body matching every document in the index, capped at `size`.
pub fn match_all_query(size: usize) -> Value {
    json!({
        "query": { "match_all": {} },
        "size": size,
    })
}

/// Filter values are compared against `keyword` subfields, which hold
/// strings. Non-string scalars are stringified the way they were typed
/// (42 becomes "42").
fn term_value(value: &Value) -> String {
    match value.as_str() {
        Some(s) => s.to_string(),
        None => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(entries: &[(&str, Value)]) -> Map<String, Value> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn bm25_body_with_no_filters_is_a_single_match_clause() {
        let body = bm25_query("how do transformers work", 4, &Map::new(), &[]);
        assert_eq!(
            body,
            json!({
                "query": { "bool": { "must": [
                    { "match": { "text": "how do transformers work" } }
                ] } },
                "size": 4,
            })
        );
    }

    #[test]
    fn bm25_body_orders_filters_then_keywords_then_query() {
        let filter = filter(&[("category", json!("manual"))]);
        let keywords = vec!["installation".to_string()];
        let body = bm25_query("setup steps", 3, &filter, &keywords);
        assert_eq!(
            body,
            json!({
                "query": { "bool": { "must": [
                    { "term": { "metadata.category.keyword": "manual" } },
                    { "match_phrase": { "text": "installation" } },
                    { "match": { "text": "setup steps" } }
                ] } },
                "size": 3,
            })
        );
    }

    #[test]
    fn bm25_filter_clauses_come_out_in_sorted_field_order() {
        let filter = filter(&[("year", json!(2024)), ("author", json!("kim"))]);
        let body = bm25_query("q", 1, &filter, &[]);
        let must = body["query"]["bool"]["must"].as_array().unwrap();
        assert_eq!(
            must[0],
            json!({ "term": { "metadata.author.keyword": "kim" } })
        );
        assert_eq!(must[1], json!({ "term": { "metadata.year.keyword": "2024" } }));
    }

    #[test]
    fn knn_body_carries_vector_and_source_projection() {
        let body = knn_query(&[0.25, -0.5], 3, 50, "vector");
        assert_eq!(
            body,
            json!({
                "knn": {
                    "field": "vector",
                    "query_vector": [0.25, -0.5],
                    "k": 3,
                    "num_candidates": 50,
                },
                "size": 3,
                "_source": ["text", "metadata"],
            })
        );
    }

    #[test]
    fn match_all_body_caps_at_size() {
        let body = match_all_query(1000);
        assert_eq!(body, json!({ "query": { "match_all": {} }, "size": 1000 }));
    }
}
