//! Captured input state and answer checking.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::QuestionKind;

/// One input control's current state, as reported by the overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum InputField {
    Text {
        name: String,
        value: String,
    },
    Checkbox {
        name: String,
        row: usize,
        col: usize,
        checked: bool,
    },
    MatrixCell {
        name: String,
        row: usize,
        col: usize,
        value: String,
    },
}

impl InputField {
    pub fn name(&self) -> &str {
        match self {
            InputField::Text { name, .. }
            | InputField::Checkbox { name, .. }
            | InputField::MatrixCell { name, .. } => name,
        }
    }
}

/// Build the answer payload for a question of `kind` from its inputs.
///
/// Fields that do not belong to `kind` are ignored.
pub fn serialize_inputs(kind: QuestionKind, fields: &[InputField]) -> Value {
    let map = match kind {
        QuestionKind::FreeText => serialize_free_text(fields),
        QuestionKind::CheckboxGrid => serialize_grid(fields, checkbox_cell, Value::Bool(false)),
        QuestionKind::Matrix => serialize_grid(fields, matrix_cell, Value::String(String::new())),
    };
    Value::Object(map)
}

type Cell<'a> = (&'a str, usize, usize, Value);

fn checkbox_cell(field: &InputField) -> Option<Cell<'_>> {
    match field {
        InputField::Checkbox {
            name,
            row,
            col,
            checked,
        } => Some((name.as_str(), *row, *col, Value::Bool(*checked))),
        _ => None,
    }
}

fn matrix_cell(field: &InputField) -> Option<Cell<'_>> {
    match field {
        InputField::MatrixCell {
            name,
            row,
            col,
            value,
        } => Some((name.as_str(), *row, *col, Value::String(value.trim().to_string()))),
        _ => None,
    }
}

fn serialize_free_text(fields: &[InputField]) -> Map<String, Value> {
    fields
        .iter()
        .filter_map(|field| match field {
            InputField::Text { name, value } => {
                Some((name.clone(), Value::String(value.trim().to_string())))
            }
            _ => None,
        })
        .collect()
}

fn serialize_grid(
    fields: &[InputField],
    cell: for<'a> fn(&'a InputField) -> Option<Cell<'a>>,
    blank: Value,
) -> Map<String, Value> {
    let mut grids: BTreeMap<&str, BTreeMap<(usize, usize), Value>> = BTreeMap::new();
    for (name, row, col, value) in fields.iter().filter_map(cell) {
        grids.entry(name).or_default().insert((row, col), value);
    }

    grids
        .into_iter()
        .map(|(name, cells)| {
            let rows = cells.keys().map(|(r, _)| r + 1).max().unwrap_or(0);
            let cols = cells.keys().map(|(_, c)| c + 1).max().unwrap_or(0);
            let grid = (0..rows)
                .map(|r| {
                    Value::Array(
                        (0..cols)
                            .map(|c| cells.get(&(r, c)).cloned().unwrap_or_else(|| blank.clone()))
                            .collect(),
                    )
                })
                .collect();
            (name.to_string(), Value::Array(grid))
        })
        .collect()
}

/// Strict deep equality; arrays are order-sensitive and objects must have
/// the same key set. `None` accepts anything.
pub fn is_correct(expected: Option<&Value>, data: &Value) -> bool {
    match expected {
        None | Some(Value::Null) => true,
        Some(expected) => expected == data,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn text(name: &str, value: &str) -> InputField {
        InputField::Text {
            name: name.into(),
            value: value.into(),
        }
    }

    #[test]
    fn free_text_is_keyed_by_name() {
        let data = serialize_inputs(
            QuestionKind::FreeText,
            &[text("answer", " 4 "), text("units", "cm")],
        );
        assert_eq!(data, json!({"answer": "4", "units": "cm"}));
    }

    #[test]
    fn checkbox_grid_fills_unchecked_cells() {
        let cb = |row, col, checked| InputField::Checkbox {
            name: "grid".into(),
            row,
            col,
            checked,
        };
        let data = serialize_inputs(
            QuestionKind::CheckboxGrid,
            &[cb(0, 0, true), cb(1, 1, true), cb(0, 1, false)],
        );
        assert_eq!(data, json!({"grid": [[true, false], [false, true]]}));
    }

    #[test]
    fn matrix_rows_in_order() {
        let cell = |row, col, value: &str| InputField::MatrixCell {
            name: "m".into(),
            row,
            col,
            value: value.into(),
        };
        let data = serialize_inputs(
            QuestionKind::Matrix,
            &[cell(1, 0, "3"), cell(0, 0, "1"), cell(0, 1, "2")],
        );
        assert_eq!(data, json!({"m": [["1", "2"], ["3", ""]]}));
    }

    #[test]
    fn correctness_is_strict() {
        let expected = json!({"answer": "4"});
        assert!(is_correct(Some(&expected), &json!({"answer": "4"})));
        assert!(!is_correct(Some(&expected), &json!({"answer": 4})));
        assert!(!is_correct(Some(&expected), &json!({"answer": "4", "extra": ""})));
        assert!(!is_correct(Some(&json!([1, 2])), &json!([2, 1])));
        assert!(is_correct(None, &json!({"anything": true})));
    }
}
