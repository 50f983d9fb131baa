//! Condition sequence evaluation for ABAC policies.
//!
//! Composition is a strict left-to-right fold with no operator precedence:
//! `A or B and C` evaluates as `(A or B) and C`. The combining operator for
//! a condition is the last non-empty `logic_op` seen on the conditions
//! before it, defaulting to `and`; the final condition's `logic_op` never
//! takes effect.
use crate::model::{AbacPolicy, LOGIC_AND, PolicyCondition};
use regex::Regex;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Request-scoped operands a policy is evaluated against.
pub(crate) struct EvaluationContext<'a> {
    pub user_attributes: HashMap<String, String>,
    pub object_attributes: HashMap<String, String>,
    pub environment_attributes: HashMap<String, String>,
    /// Reserved; always empty in the current engine.
    pub action_attributes: HashMap<String, String>,
    pub subject: &'a str,
    pub object: &'a str,
    pub action: &'a str,
}

/// Whether the policy's condition sequence matches the context.
/// A policy with no conditions never matches.
pub(crate) fn policy_matches(policy: &AbacPolicy, ctx: &EvaluationContext<'_>) -> bool {
    let Some((first, rest)) = policy.conditions.split_first() else {
        return false;
    };

    let mut result = evaluate_condition(first, ctx);
    let mut op = LOGIC_AND;
    if !first.logic_op.is_empty() {
        op = first.logic_op.as_str();
    }
    for condition in rest {
        let value = evaluate_condition(condition, ctx);
        result = if op == LOGIC_AND {
            result && value
        } else {
            result || value
        };
        if !condition.logic_op.is_empty() {
            op = condition.logic_op.as_str();
        }
    }
    result
}

fn evaluate_condition(condition: &PolicyCondition, ctx: &EvaluationContext<'_>) -> bool {
    let actual = match condition.condition_type.as_str() {
        "user" => lookup(&ctx.user_attributes, &condition.field),
        "object" => lookup(&ctx.object_attributes, &condition.field),
        "environment" => lookup(&ctx.environment_attributes, &condition.field),
        "action" => {
            if condition.field == "action" {
                ctx.action
            } else {
                lookup(&ctx.action_attributes, &condition.field)
            }
        }
        "subject" => {
            if condition.field == "subject" {
                ctx.subject
            } else {
                ""
            }
        }
        "resource" => {
            if condition.field == "object" {
                ctx.object
            } else {
                ""
            }
        }
        _ => return false,
    };
    evaluate_operator(actual, &condition.operator, &condition.value)
}

fn lookup<'a>(attributes: &'a HashMap<String, String>, field: &str) -> &'a str {
    attributes.get(field).map(String::as_str).unwrap_or("")
}

fn evaluate_operator(actual: &str, operator: &str, expected: &str) -> bool {
    match operator {
        "eq" => actual == expected,
        "ne" => actual != expected,
        "gt" => compare_values(actual, expected) == Ordering::Greater,
        "gte" => compare_values(actual, expected) != Ordering::Less,
        "lt" => compare_values(actual, expected) == Ordering::Less,
        "lte" => compare_values(actual, expected) != Ordering::Greater,
        "in" => expected.split(',').any(|item| item.trim() == actual),
        "contains" => actual.contains(expected),
        "startswith" => actual.starts_with(expected),
        "endswith" => actual.ends_with(expected),
        "regex" => Regex::new(expected)
            .map(|pattern| pattern.is_match(actual))
            .unwrap_or(false),
        _ => false,
    }
}

/// Numeric comparison when both sides parse as floats, lexicographic
/// string comparison otherwise.
fn compare_values(actual: &str, expected: &str) -> Ordering {
    match (actual.parse::<f64>(), expected.parse::<f64>()) {
        (Ok(left), Ok(right)) => left.partial_cmp(&right).unwrap_or(Ordering::Equal),
        _ => actual.cmp(expected),
    }
}
