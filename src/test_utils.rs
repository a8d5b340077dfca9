use crate::models::*;

use serde_json::json;
use time::macros::datetime;

/// Create a RawNodeSample as returned by HydroCron, with every property a string.
pub(crate) fn get_test_raw_sample() -> RawNodeSample {
    let value = json!({
        "node_q": "3",
        "p_dist_out": "2180371.0",
        "wse": "155.40462",
        "width": "-999999999999.0",
        "area_total": "-999999999999.0",
        "wse_units": "m",
        "width_units": "m",
        "area_total_units": "m^2",
        "p_dist_out_units": "m",
        "time_str": "2024-01-15T20:04:41Z",
        "datetime": "2024-01-15T20:04:41Z",
    });
    match value {
        serde_json::Value::Object(raw) => raw,
        _ => unreachable!(),
    }
}

/// Create a valid NodeSample with the given distance from outlet and water surface elevation.
pub(crate) fn get_test_sample(p_dist_out: f64, wse: f64) -> NodeSample {
    NodeSample {
        node_q: 3,
        p_dist_out,
        wse,
        width: 100.0,
        area_total: 1000.0,
        wse_units: "m".to_string(),
        width_units: "m".to_string(),
        area_total_units: "m^2".to_string(),
        p_dist_out_units: "m".to_string(),
        time_str: "2024-01-15T20:04:41Z".to_string(),
        datetime: datetime!(2024-01-15 20:04:41 UTC),
    }
}
