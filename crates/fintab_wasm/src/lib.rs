use wasm_bindgen::prelude::*;
use fintab_core::autotab::{compute_auto_tab as core_auto_tab, AutoTabInput, ParentBody};
use fintab_core::geometry::{merge_intervals, FinSpan, RingInterval};
use fintab_core::search_pattern;
use fintab_core::tab_span::compute_tab_span as core_tab_span;
use nalgebra::DVector;
use serde_wasm_bindgen::{from_value, to_value};

mod search;

pub use search::WasmSearchRunner;

fn js_error(context: &str, err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&format!("{}: {}", context, err))
}

fn parse_rings(rings: JsValue) -> Result<Vec<RingInterval>, JsValue> {
    let rings: Vec<RingInterval> = from_value(rings).map_err(|e| js_error("Invalid rings", e))?;
    for (i, ring) in rings.iter().enumerate() {
        ring.validate()
            .map_err(|e| js_error(&format!("Invalid ring at index {}", i), e))?;
    }
    Ok(rings)
}

#[wasm_bindgen]
pub fn merge_ring_intervals(rings: JsValue) -> Result<JsValue, JsValue> {
    let rings = parse_rings(rings)?;
    to_value(&merge_intervals(&rings)).map_err(|e| js_error("Serialization error", e))
}

/// Returns `{ offset, length, placement }` for a fin root chord among support rings.
#[wasm_bindgen]
pub fn compute_tab_span(rings: JsValue, fin: JsValue) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let rings = parse_rings(rings)?;
    let fin: FinSpan = from_value(fin).map_err(|e| js_error("Invalid fin span", e))?;
    fin.validate().map_err(|e| js_error("Invalid fin span", e))?;

    to_value(&core_tab_span(&rings, &fin)).map_err(|e| js_error("Serialization error", e))
}

#[wasm_bindgen]
pub fn compute_auto_tab(input: JsValue, parent: JsValue) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let input: AutoTabInput = from_value(input).map_err(|e| js_error("Invalid auto tab input", e))?;
    let parent: ParentBody = from_value(parent).map_err(|e| js_error("Invalid parent body", e))?;
    let tab = core_auto_tab(&input, &parent).map_err(|e| js_error("Auto tab failed", e))?;

    to_value(&tab).map_err(|e| js_error("Serialization error", e))
}

/// Unit coordinate directions, flattened row by row.
#[wasm_bindgen]
pub fn square_pattern(dim: u32) -> Result<Vec<f64>, JsValue> {
    let pattern = search_pattern::square(dim as usize).map_err(|e| js_error("Invalid pattern", e))?;
    Ok(flatten(&pattern))
}

/// Regular simplex vertices (origin vertex omitted), flattened row by row.
#[wasm_bindgen]
pub fn regular_simplex(dim: u32) -> Result<Vec<f64>, JsValue> {
    let pattern =
        search_pattern::regular_simplex(dim as usize).map_err(|e| js_error("Invalid pattern", e))?;
    Ok(flatten(&pattern))
}

fn flatten(points: &[DVector<f64>]) -> Vec<f64> {
    points.iter().flat_map(|p| p.iter().copied()).collect()
}
