use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use serde::{Deserialize, Serialize};
use warp::Filter;
use warp::reply::Json;

use crate::adapters::record_store::{medication_metric, metric_name};
use crate::adapters::{DatasetAdapter, RecordStoreAdapter};
use crate::sofa::{CatecholamineAgent, OrganScores};
use crate::storage::{Record, StorageEngine};

#[derive(Debug, Serialize, Deserialize)]
pub struct ObservationRequest {
    pub patient_id: String,
    pub measurement: String,
    pub value: f64,
    pub effective_time: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MedicationRequest {
    pub patient_id: String,
    pub agent: String,
    pub dosage: f64,
    pub effective_time: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SofaScoreResponse {
    pub patient_id: String,
    pub time: i64,
    pub scores: OrganScores,
    pub total: u8,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub data: Option<serde_json::Value>,
}

impl ApiResponse {
    fn success(message: impl Into<String>, data: Option<serde_json::Value>) -> Self {
        ApiResponse {
            status: "success".to_string(),
            message: message.into(),
            data,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        ApiResponse {
            status: "error".to_string(),
            message: message.into(),
            data: None,
        }
    }
}

pub struct RestApi {
    storage: Arc<StorageEngine>,
    adapter: Arc<RecordStoreAdapter>,
}

impl RestApi {
    pub fn new(storage: Arc<StorageEngine>, adapter: Arc<RecordStoreAdapter>) -> Self {
        RestApi { storage, adapter }
    }

    pub fn routes(&self) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
        self.post_observation()
            .or(self.post_medication())
            .or(self.get_sofa_score())
    }

    fn post_observation(&self) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
        let storage = Arc::clone(&self.storage);

        warp::path!("observation")
            .and(warp::post())
            .and(warp::body::json())
            .and_then(move |request: ObservationRequest| {
                let storage = Arc::clone(&storage);
                async move {
                    let timestamp = match parse_timestamp(&request.effective_time) {
                        Ok(ts) => ts,
                        Err(_) => {
                            return Ok::<Json, Infallible>(warp::reply::json(&ApiResponse::error(
                                "Invalid timestamp format",
                            )));
                        }
                    };

                    let record = Record {
                        timestamp,
                        metric_name: metric_name(&request.patient_id, &request.measurement),
                        value: request.value,
                    };

                    let response = match storage.insert(record) {
                        Ok(()) => ApiResponse::success(
                            "Observation stored",
                            Some(serde_json::to_value(&request).unwrap()),
                        ),
                        Err(err) => {
                            ApiResponse::error(format!("Failed to store observation: {}", err))
                        }
                    };
                    Ok::<Json, Infallible>(warp::reply::json(&response))
                }
            })
    }

    fn post_medication(&self) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
        let storage = Arc::clone(&self.storage);

        warp::path!("medication")
            .and(warp::post())
            .and(warp::body::json())
            .and_then(move |request: MedicationRequest| {
                let storage = Arc::clone(&storage);
                async move {
                    let timestamp = match parse_timestamp(&request.effective_time) {
                        Ok(ts) => ts,
                        Err(_) => {
                            return Ok::<Json, Infallible>(warp::reply::json(&ApiResponse::error(
                                "Invalid timestamp format",
                            )));
                        }
                    };

                    // Agents outside the SOFA vocabulary land on `other`
                    // and are ignored by the cardiovascular sub-score
                    let agent = CatecholamineAgent::from_code(&request.agent);
                    let record = Record {
                        timestamp,
                        metric_name: medication_metric(&request.patient_id, agent),
                        value: request.dosage,
                    };

                    let response = match storage.insert(record) {
                        Ok(()) => ApiResponse::success(
                            "Medication stored",
                            Some(serde_json::to_value(&request).unwrap()),
                        ),
                        Err(err) => {
                            ApiResponse::error(format!("Failed to store medication: {}", err))
                        }
                    };
                    Ok::<Json, Infallible>(warp::reply::json(&response))
                }
            })
    }

    fn get_sofa_score(&self) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
        let adapter = Arc::clone(&self.adapter);

        warp::path!("sofa")
            .and(warp::get())
            .and(warp::query::<HashMap<String, String>>())
            .and_then(move |params: HashMap<String, String>| {
                let adapter = Arc::clone(&adapter);
                async move {
                    let (patient_id, time) = match (params.get("patient"), params.get("time")) {
                        (Some(patient_id), Some(time)) => (patient_id, time),
                        _ => {
                            return Ok::<Json, Infallible>(warp::reply::json(&ApiResponse::error(
                                "Missing patient or time query parameter",
                            )));
                        }
                    };

                    let timestamp = match parse_timestamp(time) {
                        Ok(ts) => ts,
                        Err(_) => {
                            return Ok::<Json, Infallible>(warp::reply::json(&ApiResponse::error(
                                "Invalid timestamp format",
                            )));
                        }
                    };

                    let response = match adapter.condition(patient_id, timestamp) {
                        Ok(condition) => {
                            let scores = OrganScores::of(condition);
                            let score = SofaScoreResponse {
                                patient_id: patient_id.clone(),
                                time: timestamp,
                                total: scores.total(),
                                scores,
                            };
                            ApiResponse::success(
                                "SOFA score computed",
                                Some(serde_json::to_value(&score).unwrap()),
                            )
                        }
                        Err(err) => ApiResponse::error(format!("Failed to score patient: {}", err)),
                    };
                    Ok::<Json, Infallible>(warp::reply::json(&response))
                }
            })
    }
}

// Helper function to parse RFC3339 timestamps to epoch seconds
fn parse_timestamp(iso_time: &str) -> Result<i64, chrono::ParseError> {
    Ok(chrono::DateTime::parse_from_rfc3339(iso_time)?.timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::record_store;
    use crate::config::Config;
    use pretty_assertions::assert_eq;

    fn api() -> RestApi {
        let config = Config::default();
        let storage = Arc::new(StorageEngine::new(&config));
        let adapter = Arc::new(RecordStoreAdapter::new(
            Arc::clone(&storage),
            config.adapter.lookback(),
        ));
        RestApi::new(storage, adapter)
    }

    #[tokio::test]
    async fn ingest_and_score_round_trip() {
        let api = api();
        let routes = api.routes();

        let observations = [
            (record_store::MEAN_ARTERIAL_PRESSURE, 50.0),
            (record_store::PLATELETS, 100.0),
            (record_store::CREATININE, 3.3),
            (record_store::BILIRUBIN, 6.1),
            (record_store::GLASGOW_COMA_SCALE, 7.0),
            (record_store::PAO2, 150.0),
            (record_store::MECHANICAL_VENTILATION, 1.0),
        ];
        for (measurement, value) in observations {
            let resp = warp::test::request()
                .method("POST")
                .path("/observation")
                .json(&ObservationRequest {
                    patient_id: "p1".to_string(),
                    measurement: measurement.to_string(),
                    value,
                    effective_time: "2021-03-01T10:00:00Z".to_string(),
                })
                .reply(&routes)
                .await;
            assert_eq!(resp.status(), 200);
        }

        let resp = warp::test::request()
            .method("POST")
            .path("/medication")
            .json(&MedicationRequest {
                patient_id: "p1".to_string(),
                agent: "epinephrine".to_string(),
                dosage: 0.5,
                effective_time: "2021-03-01T10:30:00Z".to_string(),
            })
            .reply(&routes)
            .await;
        assert_eq!(resp.status(), 200);

        let resp = warp::test::request()
            .method("GET")
            .path("/sofa?patient=p1&time=2021-03-01T12:00:00Z")
            .reply(&routes)
            .await;
        assert_eq!(resp.status(), 200);

        let body: ApiResponse = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(body.status, "success");
        let data = body.data.unwrap();
        assert_eq!(data["total"], 16);
        assert_eq!(data["scores"]["cardiovascular"], 4);
        assert_eq!(data["scores"]["respiratory"], 3);
    }

    #[tokio::test]
    async fn scoring_an_uncharted_patient_reports_an_error() {
        let api = api();
        let routes = api.routes();

        let resp = warp::test::request()
            .method("GET")
            .path("/sofa?patient=ghost&time=2021-03-01T12:00:00Z")
            .reply(&routes)
            .await;
        assert_eq!(resp.status(), 200);

        let body: ApiResponse = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(body.status, "error");
        assert!(body.message.contains("mean_arterial_pressure"));
    }

    #[tokio::test]
    async fn invalid_timestamps_are_rejected() {
        let api = api();
        let routes = api.routes();

        let resp = warp::test::request()
            .method("GET")
            .path("/sofa?patient=p1&time=yesterday")
            .reply(&routes)
            .await;

        let body: ApiResponse = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(body.status, "error");
        assert_eq!(body.message, "Invalid timestamp format");
    }
}
