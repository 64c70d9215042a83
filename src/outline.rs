//! Scenario outline expansion
//!
//! An outline's steps are templates. For each body row of each Examples
//! table, every `<column>` placeholder is replaced by that row's value,
//! in the step text and in data table cells alike. Templates are never
//! mutated, so each row starts from the pristine text.

use gherkin::Step;

/// Replace `<key>` placeholders with the paired values
///
/// Keys are applied in order, each replacing every occurrence. Text
/// referencing a column the table does not have is left as written.
pub fn substitute(text: &str, keys: &[String], values: &[String]) -> String {
    let mut replaced = text.to_string();
    for (key, value) in keys.iter().zip(values) {
        replaced = replaced.replace(&format!("<{key}>"), value);
    }
    replaced
}

/// Materialize one step template against an example row
pub fn materialize_step(template: &Step, keys: &[String], values: &[String]) -> Step {
    let mut step = template.clone();
    step.value = substitute(&template.value, keys, values);

    if let Some(table) = step.table.as_mut() {
        for row in table.rows.iter_mut() {
            for cell in row.iter_mut() {
                *cell = substitute(cell, keys, values);
            }
        }
    }

    step
}

/// Materialize a whole step sequence against an example row
pub fn materialize_steps(templates: &[Step], keys: &[String], values: &[String]) -> Vec<Step> {
    templates
        .iter()
        .map(|template| materialize_step(template, keys, values))
        .collect()
}
