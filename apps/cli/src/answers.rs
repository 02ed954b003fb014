//! Canned answers for unattended runs.

use serde_json::Value;
use socrates_core::{InputField, Question, QuestionKind};

const DEFAULT_FIELD: &str = "answer";

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Inputs whose serialization equals the question's `correctData`.
pub fn correct_inputs(question: &Question) -> Vec<InputField> {
    let Some(Value::Object(expected)) = &question.correct_data else {
        return Vec::new();
    };

    let mut fields = Vec::new();
    for (name, value) in expected {
        match question.kind {
            QuestionKind::FreeText => fields.push(InputField::Text {
                name: name.clone(),
                value: cell_text(value),
            }),
            QuestionKind::CheckboxGrid | QuestionKind::Matrix => {
                let rows = value.as_array().into_iter().flatten().enumerate();
                for (row, cells) in rows {
                    for (col, cell) in cells.as_array().into_iter().flatten().enumerate() {
                        fields.push(match question.kind {
                            QuestionKind::CheckboxGrid => InputField::Checkbox {
                                name: name.clone(),
                                row,
                                col,
                                checked: cell.as_bool().unwrap_or(false),
                            },
                            _ => InputField::MatrixCell {
                                name: name.clone(),
                                row,
                                col,
                                value: cell_text(cell),
                            },
                        });
                    }
                }
            }
        }
    }
    fields
}

/// The correct inputs with one control spoiled.
pub fn wrong_inputs(question: &Question) -> Vec<InputField> {
    let mut fields = correct_inputs(question);
    match fields.first_mut() {
        Some(InputField::Text { value, .. }) | Some(InputField::MatrixCell { value, .. }) => {
            value.push_str(" (not quite)");
        }
        Some(InputField::Checkbox { checked, .. }) => *checked = !*checked,
        None => fields.push(InputField::Text {
            name: DEFAULT_FIELD.to_string(),
            value: "no idea".to_string(),
        }),
    }
    fields
}

/// Text controls to prompt for, empty when the question is a grid.
pub fn text_field_names(question: &Question) -> Vec<String> {
    if question.kind != QuestionKind::FreeText {
        return Vec::new();
    }
    match &question.correct_data {
        Some(Value::Object(expected)) if !expected.is_empty() => expected.keys().cloned().collect(),
        _ => vec![DEFAULT_FIELD.to_string()],
    }
}
