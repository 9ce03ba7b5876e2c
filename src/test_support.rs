//! Shared fixtures for unit tests

use crate::model::{FieldValue, InputFrame};

/// Linear pipeline over the six form columns.
///
/// One-hot: Neighbourhood [WOODBEND, DEVON], route [R1, R2], Stake [X, Y].
/// Scaled: Routes Completed (5, 2), Doors in Route (100, 50), Time Spent (60, 30).
pub fn linear_model_json() -> String {
    r#"{
  "features": ["Neighbourhood", "New Route Number/Name", "Routes Completed",
               "Doors in Route", "Time Spent", "Stake"],
  "preprocessor": {
    "transformers": [
      {"kind": "one_hot",
       "columns": ["Neighbourhood", "New Route Number/Name", "Stake"],
       "categories": [["WOODBEND", "DEVON"], ["R1", "R2"], ["X", "Y"]],
       "handle_unknown": "error"},
      {"kind": "standard_scaler",
       "columns": ["Routes Completed", "Doors in Route", "Time Spent"],
       "mean": [5.0, 100.0, 60.0],
       "scale": [2.0, 50.0, 30.0]}
    ],
    "remainder": "drop"
  },
  "regressor": {
    "kind": "linear",
    "coefficients": [1.0, -1.0, 0.5, 0.75, 0.25, -0.25, 2.0, 1.5, 3.0],
    "intercept": 10.0
  }
}"#
    .to_string()
}

/// Dataset whose options line up with `linear_model_json`, plus one route the model never saw
pub const SAMPLE_CSV: &str = "\
Neighbourhood,Stake,New Route Number/Name,Routes Completed,Doors in Route,Time Spent
WOODBEND,X,R1,5,120,60
DEVON,Y,R2,3,80,45
WOODBEND,Y,R9,2,60,30
";

pub fn sample_frame(
    neighbourhood: &str,
    stake: &str,
    route: &str,
    routes_completed: f64,
    time_spent: f64,
    doors_in_route: f64,
) -> InputFrame {
    InputFrame::new(vec![
        ("Neighbourhood".to_string(), FieldValue::Text(neighbourhood.to_string())),
        ("New Route Number/Name".to_string(), FieldValue::Text(route.to_string())),
        ("Routes Completed".to_string(), FieldValue::Number(routes_completed)),
        ("Doors in Route".to_string(), FieldValue::Number(doors_in_route)),
        ("Time Spent".to_string(), FieldValue::Number(time_spent)),
        ("Stake".to_string(), FieldValue::Text(stake.to_string())),
    ])
}

/// Write the linear model, sample dataset, map and logo into `dir`
pub fn write_assets(dir: &std::path::Path) -> crate::Config {
    let mut config = crate::Config::default();
    config.assets.dataset = dir.join("data.csv");
    config.assets.model = dir.join("model.json");
    config.assets.cluster_map = dir.join("cluster_map.html");
    config.assets.logo = dir.join("logo.png");

    std::fs::write(&config.assets.dataset, SAMPLE_CSV).unwrap();
    std::fs::write(&config.assets.model, linear_model_json()).unwrap();
    std::fs::write(
        &config.assets.cluster_map,
        "<html><body><div id=\"map\">clusters & \"pins\"</div></body></html>",
    )
    .unwrap();
    std::fs::write(&config.assets.logo, [0x89, b'P', b'N', b'G']).unwrap();
    config
}
