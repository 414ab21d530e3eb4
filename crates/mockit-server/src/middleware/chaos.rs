//! Chaos monkey: fail a share of requests before they reach a route.

use super::{Flow, Middleware};
use crate::config::{parse_status, ChaosMonkeyConfig, Settings};
use crate::response::{json_response, VALUE_CHAOS, X_MOCKIT_FAULT};
use async_trait::async_trait;
use hyper::http::request::Parts;
use hyper::StatusCode;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub enum ChaosDecision {
    Pass,
    Fault { status: StatusCode },
}

/// Roll for a fault. Unparsable candidate statuses are ignored; with none
/// left the fault is a 500.
pub fn decide_fault(config: &ChaosMonkeyConfig, rng: &mut impl Rng) -> ChaosDecision {
    let probability = if config.probability.is_nan() {
        0.0
    } else {
        config.probability.clamp(0.0, 1.0)
    };

    if rng.gen::<f64>() >= probability {
        return ChaosDecision::Pass;
    }

    let candidates: Vec<StatusCode> = config
        .status_codes
        .iter()
        .filter_map(|code| parse_status(code))
        .collect();
    let status = candidates
        .choose(rng)
        .copied()
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    ChaosDecision::Fault { status }
}

pub struct ChaosMonkey;

#[async_trait]
impl Middleware for ChaosMonkey {
    fn name(&self) -> &'static str {
        "chaos-monkey"
    }

    async fn before(&self, head: &Parts, settings: &Settings) -> Flow {
        let Some(config) = settings.active_chaos() else {
            return Flow::Continue;
        };

        // ThreadRng is not Send; keep it out of the future's state
        let decision = decide_fault(&config, &mut rand::thread_rng());

        match decision {
            ChaosDecision::Pass => Flow::Continue,
            ChaosDecision::Fault { status } => {
                debug!(
                    method = %head.method,
                    path = %head.uri.path(),
                    status = status.as_u16(),
                    "Chaos monkey injected a fault"
                );
                let mut response = json_response(
                    status,
                    &serde_json::json!({
                        "error": "Chaos monkey injected a failure",
                        "status": status.as_u16(),
                    }),
                );
                response
                    .headers_mut()
                    .insert(X_MOCKIT_FAULT.clone(), VALUE_CHAOS.clone());
                Flow::Respond(response)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::Request;
    use serde_json::json;

    fn config(probability: f64, codes: &[&str]) -> ChaosMonkeyConfig {
        ChaosMonkeyConfig {
            probability,
            status_codes: codes.iter().map(|c| c.to_string()).collect(),
        }
    }

    #[test]
    fn test_always_faults_at_probability_one() {
        let mut rng = rand::thread_rng();
        let cfg = config(1.0, &["503"]);
        for _ in 0..100 {
            assert_eq!(
                decide_fault(&cfg, &mut rng),
                ChaosDecision::Fault {
                    status: StatusCode::SERVICE_UNAVAILABLE
                }
            );
        }
    }

    #[test]
    fn test_never_faults_at_probability_zero() {
        let mut rng = rand::thread_rng();
        let cfg = config(0.0, &["503"]);
        for _ in 0..100 {
            assert_eq!(decide_fault(&cfg, &mut rng), ChaosDecision::Pass);
        }
    }

    #[test]
    fn test_out_of_range_probability_is_clamped() {
        let mut rng = rand::thread_rng();
        assert_ne!(decide_fault(&config(7.5, &[]), &mut rng), ChaosDecision::Pass);
        assert_eq!(decide_fault(&config(-1.0, &[]), &mut rng), ChaosDecision::Pass);
        assert_eq!(decide_fault(&config(f64::NAN, &[]), &mut rng), ChaosDecision::Pass);
    }

    #[test]
    fn test_fault_rate_tracks_probability() {
        let mut rng = rand::thread_rng();
        let cfg = config(0.3, &["500"]);
        let iterations = 10_000;
        let faults = (0..iterations)
            .filter(|_| decide_fault(&cfg, &mut rng) != ChaosDecision::Pass)
            .count();
        let rate = faults as f64 / iterations as f64;
        assert!((rate - 0.3).abs() < 0.05, "Expected ~0.3, got {rate}");
    }

    #[test]
    fn test_status_picked_from_valid_candidates() {
        let mut rng = rand::thread_rng();
        let cfg = config(1.0, &["nope", "502", "504"]);
        for _ in 0..50 {
            match decide_fault(&cfg, &mut rng) {
                ChaosDecision::Fault { status } => assert!(
                    status == StatusCode::BAD_GATEWAY || status == StatusCode::GATEWAY_TIMEOUT
                ),
                ChaosDecision::Pass => panic!("expected fault"),
            }
        }
    }

    #[test]
    fn test_defaults_to_500_without_candidates() {
        let mut rng = rand::thread_rng();
        assert_eq!(
            decide_fault(&config(1.0, &[]), &mut rng),
            ChaosDecision::Fault {
                status: StatusCode::INTERNAL_SERVER_ERROR
            }
        );
    }

    #[tokio::test]
    async fn test_middleware_short_circuits() {
        let settings: Settings = serde_json::from_value(json!({
            "features": {"chaosMonkey": true},
            "chaosMonkey": {"probability": 1.0, "statusCodes": ["503"]}
        }))
        .unwrap();
        let head = Request::builder().uri("/users").body(()).unwrap().into_parts().0;

        match ChaosMonkey.before(&head, &settings).await {
            Flow::Respond(response) => {
                assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
                assert_eq!(response.headers().get(&X_MOCKIT_FAULT).unwrap(), "chaos");
            }
            Flow::Continue => panic!("expected chaos fault"),
        }
    }

    #[tokio::test]
    async fn test_middleware_passes_when_disabled() {
        let settings: Settings = serde_json::from_value(json!({
            "features": {"chaosMonkey": false},
            "chaosMonkey": {"probability": 1.0}
        }))
        .unwrap();
        let head = Request::builder().uri("/users").body(()).unwrap().into_parts().0;
        assert!(matches!(
            ChaosMonkey.before(&head, &settings).await,
            Flow::Continue
        ));
    }
}
