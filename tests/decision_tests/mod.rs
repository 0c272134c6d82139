mod hit_policy_test;
mod table_test;

use handan::{Column, DecisionTable, HitPolicy, Rule};

/// One input column bound to `input`, one output column, rules as `(cell, output)` pairs
/// named `r1`, `r2`, ...
pub fn single_input_table(policy: HitPolicy, input: &str, rules: &[(&str, &str)]) -> DecisionTable {
    DecisionTable::new(
        "scenario",
        policy,
        vec![Column::input(input)],
        vec![Column::output("decision")],
        rules
            .iter()
            .enumerate()
            .map(|(i, (cell, output))| Rule::new(format!("r{}", i + 1), [*cell], [*output]))
            .collect(),
    )
    .unwrap()
}
