//! Donation-bag prediction
//!
//! Each request loads the pipeline fresh from disk, builds a one-row frame
//! from the six form fields and runs preprocessor then regressor.

use crate::dataset::{DOORS_IN_ROUTE, NEIGHBOURHOOD, ROUTE, ROUTES_COMPLETED, STAKE, TIME_SPENT};
use crate::error::{Error, Result};
use crate::model::{FieldValue, InputFrame, Pipeline};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::Path;

/// Columns in the order the pipeline was fitted on
pub const FEATURE_COLUMNS: [&str; 6] = [
    NEIGHBOURHOOD,
    ROUTE,
    ROUTES_COMPLETED,
    DOORS_IN_ROUTE,
    TIME_SPENT,
    STAKE,
];

/// Bounds and default of one slider input
#[derive(Debug, Clone)]
pub struct Slider {
    pub label: &'static str,
    pub name: &'static str,
    pub range: RangeInclusive<i64>,
    pub default: i64,
}

pub const ROUTES_COMPLETED_SLIDER: Slider = Slider {
    label: ROUTES_COMPLETED,
    name: "routes_completed",
    range: 1..=10,
    default: 5,
};

pub const TIME_SPENT_SLIDER: Slider = Slider {
    label: TIME_SPENT,
    name: "time_spent",
    range: 10..=300,
    default: 60,
};

pub const DOORS_IN_ROUTE_SLIDER: Slider = Slider {
    label: DOORS_IN_ROUTE,
    name: "doors_in_route",
    range: 10..=500,
    default: 100,
};

impl Slider {
    fn parse(&self, raw: &str) -> Result<i64> {
        let value: i64 = raw.trim().parse().map_err(|_| {
            Error::input(format!("{} must be a whole number, got '{}'", self.label, raw))
        })?;
        if !self.range.contains(&value) {
            return Err(Error::input(format!(
                "{} must be between {} and {}, got {}",
                self.label,
                self.range.start(),
                self.range.end(),
                value
            )));
        }
        Ok(value)
    }
}

/// Raw form submission; numbers stay strings until validated
///
/// Slider fields accept a string (urlencoded forms) or a JSON number.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionForm {
    pub neighbourhood: String,
    pub stake: String,
    pub route: String,
    #[serde(deserialize_with = "slider_text")]
    pub routes_completed: String,
    #[serde(deserialize_with = "slider_text")]
    pub time_spent: String,
    #[serde(deserialize_with = "slider_text")]
    pub doors_in_route: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SliderValue {
    Int(i64),
    Float(f64),
    Text(String),
}

fn slider_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match SliderValue::deserialize(deserializer)? {
        SliderValue::Int(n) => n.to_string(),
        SliderValue::Float(x) => x.to_string(),
        SliderValue::Text(s) => s,
    })
}

impl PredictionForm {
    /// Build a form from decoded key/value pairs, leaving absent fields empty
    ///
    /// Used to echo a partial submission back into the form.
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        let mut form = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "neighbourhood" => &mut form.neighbourhood,
                "stake" => &mut form.stake,
                "route" => &mut form.route,
                "routes_completed" => &mut form.routes_completed,
                "time_spent" => &mut form.time_spent,
                "doors_in_route" => &mut form.doors_in_route,
                _ => continue,
            };
            *slot = value.clone();
        }
        form
    }
}

/// A validated prediction request
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRequest {
    pub neighbourhood: String,
    pub stake: String,
    pub route: String,
    pub routes_completed: i64,
    pub time_spent: i64,
    pub doors_in_route: i64,
}

impl PredictionRequest {
    /// Validate a form submission against the slider bounds
    pub fn from_form(form: &PredictionForm) -> Result<Self> {
        Ok(Self {
            neighbourhood: form.neighbourhood.clone(),
            stake: form.stake.clone(),
            route: form.route.clone(),
            routes_completed: ROUTES_COMPLETED_SLIDER.parse(&form.routes_completed)?,
            time_spent: TIME_SPENT_SLIDER.parse(&form.time_spent)?,
            doors_in_route: DOORS_IN_ROUTE_SLIDER.parse(&form.doors_in_route)?,
        })
    }

    /// Parse an urlencoded body; a missing field is an input error
    pub fn from_urlencoded(body: &str) -> Result<Self> {
        let form: PredictionForm = serde_urlencoded::from_str(body)
            .map_err(|e| Error::input(format!("malformed form submission: {}", e)))?;
        Self::from_form(&form)
    }

    /// One-row frame with the columns in fitted order
    pub fn to_frame(&self) -> InputFrame {
        let values = [
            FieldValue::Text(self.neighbourhood.clone()),
            FieldValue::Text(self.route.clone()),
            FieldValue::Number(self.routes_completed as f64),
            FieldValue::Number(self.doors_in_route as f64),
            FieldValue::Number(self.time_spent as f64),
            FieldValue::Text(self.stake.clone()),
        ];
        InputFrame::new(
            FEATURE_COLUMNS
                .iter()
                .map(|c| c.to_string())
                .zip(values)
                .collect(),
        )
    }
}

/// Load the pipeline and predict for one request
pub fn invoke(model_path: &Path, request: &PredictionRequest) -> Result<f64> {
    let pipeline = Pipeline::load(model_path)?;
    pipeline.check_schema(&FEATURE_COLUMNS)?;
    let value = pipeline.predict(&request.to_frame())?;
    if !value.is_finite() {
        return Err(Error::Model(format!("regressor produced {}", value)));
    }
    Ok(value)
}

/// Result shown under the Predict button
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PredictionOutcome {
    Success { prediction: f64 },
    InputError { detail: String },
    Failure { detail: String },
}

impl PredictionOutcome {
    pub fn from_result(result: Result<f64>) -> Self {
        match result {
            Ok(prediction) => PredictionOutcome::Success { prediction },
            Err(e) if e.is_input() => PredictionOutcome::InputError {
                detail: e.to_string(),
            },
            Err(e) => PredictionOutcome::Failure {
                detail: e.to_string(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, PredictionOutcome::Success { .. })
    }

    /// Text shown to the user
    pub fn message(&self) -> String {
        match self {
            PredictionOutcome::Success { prediction } => {
                format!("Predicted Donation Bags: {:.2}", prediction)
            }
            PredictionOutcome::InputError { detail } => format!("Input error: {}", detail),
            PredictionOutcome::Failure { detail } => format!("An error occurred: {}", detail),
        }
    }
}

/// Validate, predict and classify the outcome; never fails
pub fn run(model_path: &Path, request: Result<PredictionRequest>) -> PredictionOutcome {
    let outcome = PredictionOutcome::from_result(request.and_then(|r| invoke(model_path, &r)));
    match &outcome {
        PredictionOutcome::Success { prediction } => {
            tracing::info!(prediction = *prediction, "prediction served")
        }
        PredictionOutcome::InputError { detail } => {
            tracing::info!(%detail, "prediction rejected input")
        }
        PredictionOutcome::Failure { detail } => {
            tracing::warn!(%detail, "prediction failed")
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::linear_model_json;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn model_dir() -> (TempDir, std::path::PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, linear_model_json()).unwrap();
        (dir, path)
    }

    fn form(neighbourhood: &str, stake: &str, route: &str) -> PredictionForm {
        PredictionForm {
            neighbourhood: neighbourhood.to_string(),
            stake: stake.to_string(),
            route: route.to_string(),
            routes_completed: "5".to_string(),
            time_spent: "60".to_string(),
            doors_in_route: "100".to_string(),
        }
    }

    #[test]
    fn test_frame_column_order() {
        let request = PredictionRequest::from_form(&form("WOODBEND", "X", "R1")).unwrap();
        let frame = request.to_frame();
        let columns: Vec<&str> = frame.column_names().collect();
        assert_eq!(
            columns,
            vec![
                "Neighbourhood",
                "New Route Number/Name",
                "Routes Completed",
                "Doors in Route",
                "Time Spent",
                "Stake"
            ]
        );
        assert_eq!(frame.get("Time Spent"), Some(&FieldValue::Number(60.0)));
        assert_eq!(frame.get("Doors in Route"), Some(&FieldValue::Number(100.0)));
    }

    #[test]
    fn test_example_prediction_message() {
        let (_dir, path) = model_dir();
        let request = PredictionRequest::from_form(&form("WOODBEND", "X", "R1"));
        let outcome = run(&path, request);
        assert!(outcome.is_success());
        assert_eq!(outcome.message(), "Predicted Donation Bags: 11.75");
    }

    #[test]
    fn test_unseen_category_is_input_error() {
        let (_dir, path) = model_dir();
        for (n, s, r) in [("NOWHERE", "X", "R1"), ("WOODBEND", "Z", "R1"), ("WOODBEND", "X", "R9")] {
            let outcome = run(&path, PredictionRequest::from_form(&form(n, s, r)));
            assert!(
                matches!(outcome, PredictionOutcome::InputError { .. }),
                "expected input error for ({}, {}, {})",
                n,
                s,
                r
            );
            assert!(outcome.message().starts_with("Input error: "));
        }
    }

    #[test]
    fn test_out_of_range_slider_is_input_error() {
        let mut f = form("WOODBEND", "X", "R1");
        f.routes_completed = "11".to_string();
        let err = PredictionRequest::from_form(&f).unwrap_err();
        assert!(err.is_input());
        assert!(err.to_string().contains("between 1 and 10"));

        let mut f = form("WOODBEND", "X", "R1");
        f.time_spent = "9".to_string();
        assert!(PredictionRequest::from_form(&f).is_err());
    }

    #[test]
    fn test_non_numeric_slider_is_input_error() {
        let mut f = form("WOODBEND", "X", "R1");
        f.doors_in_route = "lots".to_string();
        let err = PredictionRequest::from_form(&f).unwrap_err();
        assert!(err.is_input());
        assert!(err.to_string().contains("Doors in Route"));
    }

    #[test]
    fn test_from_urlencoded() {
        let body = "neighbourhood=WOODBEND&stake=X&route=R1&routes_completed=5&time_spent=60&doors_in_route=100";
        let request = PredictionRequest::from_urlencoded(body).unwrap();
        assert_eq!(request.neighbourhood, "WOODBEND");
        assert_eq!(request.doors_in_route, 100);

        let spaced = "neighbourhood=TERWILLEGAR+PARK+&stake=X&route=R1&routes_completed=5&time_spent=60&doors_in_route=100";
        let request = PredictionRequest::from_urlencoded(spaced).unwrap();
        assert_eq!(request.neighbourhood, "TERWILLEGAR PARK ");
    }

    #[test]
    fn test_json_sliders_accept_numbers_or_strings() {
        let numeric: PredictionForm = serde_json::from_str(
            r#"{"neighbourhood":"WOODBEND","stake":"X","route":"R1",
                "routes_completed":5,"time_spent":60.0,"doors_in_route":"100"}"#,
        )
        .unwrap();
        assert_eq!(numeric, form("WOODBEND", "X", "R1"));

        let fractional: PredictionForm = serde_json::from_str(
            r#"{"neighbourhood":"WOODBEND","stake":"X","route":"R1",
                "routes_completed":5.5,"time_spent":60,"doors_in_route":100}"#,
        )
        .unwrap();
        assert!(PredictionRequest::from_form(&fractional).unwrap_err().is_input());
    }

    #[test]
    fn test_form_from_partial_pairs() {
        let pairs = vec![
            ("neighbourhood".to_string(), "DEVON".to_string()),
            ("stake".to_string(), "Y".to_string()),
            ("unrelated".to_string(), "1".to_string()),
        ];
        let form = PredictionForm::from_pairs(&pairs);
        assert_eq!(form.neighbourhood, "DEVON");
        assert_eq!(form.stake, "Y");
        assert!(form.route.is_empty());
        assert!(form.doors_in_route.is_empty());
    }

    #[test]
    fn test_from_urlencoded_missing_field() {
        let err = PredictionRequest::from_urlencoded("neighbourhood=WOODBEND").unwrap_err();
        assert!(err.is_input());
        assert!(err.to_string().contains("malformed"));
    }

    #[test]
    fn test_missing_model_is_generic_failure() {
        let dir = TempDir::new().unwrap();
        let outcome = run(
            &dir.path().join("model.json"),
            PredictionRequest::from_form(&form("WOODBEND", "X", "R1")),
        );
        assert!(matches!(outcome, PredictionOutcome::Failure { .. }));
        assert!(outcome.message().starts_with("An error occurred: "));
    }

    #[test]
    fn test_schema_drift_is_generic_failure() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(
            &path,
            linear_model_json().replace("New Route Number/Name", "Route"),
        )
        .unwrap();
        let outcome = run(&path, PredictionRequest::from_form(&form("WOODBEND", "X", "R1")));
        assert!(matches!(outcome, PredictionOutcome::Failure { .. }));
        assert!(outcome.message().contains("schema mismatch"));
    }

    #[test]
    fn test_model_reloaded_per_request() {
        let (_dir, path) = model_dir();
        let request = PredictionRequest::from_form(&form("WOODBEND", "X", "R1")).unwrap();
        assert_eq!(invoke(&path, &request).unwrap(), 11.75);

        std::fs::write(&path, linear_model_json().replace("10.0", "20.0")).unwrap();
        assert_eq!(invoke(&path, &request).unwrap(), 21.75);
    }

    #[test]
    fn test_outcome_serializes_with_status() {
        let json = serde_json::to_string(&PredictionOutcome::Success { prediction: 1.5 }).unwrap();
        assert!(json.contains("\"status\":\"success\""));
        assert!(json.contains("\"prediction\":1.5"));
    }

    proptest! {
        #[test]
        fn prop_in_bound_inputs_predict_finite(
            neighbourhood in prop::sample::select(vec!["WOODBEND", "DEVON"]),
            stake in prop::sample::select(vec!["X", "Y"]),
            route in prop::sample::select(vec!["R1", "R2"]),
            routes_completed in 1i64..=10,
            time_spent in 10i64..=300,
            doors_in_route in 10i64..=500,
        ) {
            let (_dir, path) = model_dir();
            let request = PredictionRequest {
                neighbourhood: neighbourhood.to_string(),
                stake: stake.to_string(),
                route: route.to_string(),
                routes_completed,
                time_spent,
                doors_in_route,
            };
            let value = invoke(&path, &request).unwrap();
            prop_assert!(value.is_finite());

            let outcome = PredictionOutcome::Success { prediction: value };
            let message = outcome.message();
            let digits = message.trim_start_matches("Predicted Donation Bags: ");
            let decimals = digits.split('.').nth(1).unwrap_or("");
            prop_assert_eq!(decimals.len(), 2);
        }
    }
}
