//! Evaluates sanitized filter objects against stored JSON documents.
//!
//! Field predicates follow document-database conventions: dotted paths reach into
//! nested objects and arrays, a field holding an array matches when any element
//! does, and ordering comparisons only hold between values of the same kind.
//!
//! A query is compiled once with [`compile`]: every operator argument is checked
//! and every regex is built before the first document is looked at, so matching
//! itself cannot fail.

use anyhow::{anyhow, bail, Result};
use regex::{Regex, RegexBuilder};
use serde_json::{Map, Value};
use std::cmp::Ordering;

const REGEX_SIZE_LIMIT: usize = 1 << 20;

/// A query the matcher cannot evaluate: malformed operator arguments or a bad regex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidQuery(pub String);

impl std::fmt::Display for InvalidQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invalid filter: {}", self.0)
    }
}

impl std::error::Error for InvalidQuery {}

/// A validated query, ready to be matched against any number of documents.
#[derive(Debug)]
pub struct CompiledQuery {
    clauses: Vec<Clause>,
}

#[derive(Debug)]
enum Clause {
    And(Vec<CompiledQuery>),
    Or(Vec<CompiledQuery>),
    Nor(Vec<CompiledQuery>),
    Field { path: String, predicate: Predicate },
}

#[derive(Debug)]
enum Predicate {
    Equals(Value),
    Operators(Vec<Op>),
}

#[derive(Debug)]
enum Op {
    Eq(Value),
    Ne(Value),
    Compare(Value, fn(Ordering) -> bool),
    In(Vec<Value>),
    Nin(Vec<Value>),
    Exists(bool),
    Type(Vec<TypeName>),
    All(Vec<Value>),
    ElemMatch(ElemMatch),
    Size(u64),
    Regex(Regex),
    Mod { divisor: i64, remainder: i64 },
    Not(Vec<Op>),
}

#[derive(Debug)]
enum ElemMatch {
    Element(Vec<Op>),
    Document(CompiledQuery),
}

#[derive(Debug, Clone, Copy)]
enum TypeName {
    String,
    Number,
    Int,
    Double,
    Bool,
    Object,
    Array,
    Null,
}

/// Validates `query` and builds its regexes.
///
/// Errors are always [`InvalidQuery`].
pub fn compile(query: &Map<String, Value>) -> Result<CompiledQuery> {
    compile_query(query).map_err(|e| InvalidQuery(e.to_string()).into())
}

impl CompiledQuery {
    /// Returns whether `doc` satisfies every top-level clause.
    pub fn matches(&self, doc: &Value) -> bool {
        self.clauses.iter().all(|clause| clause.matches(doc))
    }
}

impl Clause {
    fn matches(&self, doc: &Value) -> bool {
        match self {
            Clause::And(queries) => queries.iter().all(|query| query.matches(doc)),
            Clause::Or(queries) => queries.iter().any(|query| query.matches(doc)),
            Clause::Nor(queries) => !queries.iter().any(|query| query.matches(doc)),
            Clause::Field { path, predicate } => {
                let candidates = resolve(doc, path);
                match predicate {
                    Predicate::Equals(target) => equals_any(&candidates, target),
                    Predicate::Operators(ops) => all_ops_match(ops, &candidates),
                }
            }
        }
    }
}

fn compile_query(query: &Map<String, Value>) -> Result<CompiledQuery> {
    let clauses = query
        .iter()
        .map(|(key, condition)| {
            Ok(match key.as_str() {
                "$and" => Clause::And(compile_clauses(condition, key)?),
                "$or" => Clause::Or(compile_clauses(condition, key)?),
                "$nor" => Clause::Nor(compile_clauses(condition, key)?),
                operator if operator.starts_with('$') => {
                    bail!("Operator {} cannot be used at the top level", operator)
                }
                path => Clause::Field {
                    path: path.to_string(),
                    predicate: compile_predicate(condition)?,
                },
            })
        })
        .collect::<Result<_>>()?;
    Ok(CompiledQuery { clauses })
}

fn compile_clauses(value: &Value, operator: &str) -> Result<Vec<CompiledQuery>> {
    let items = value
        .as_array()
        .ok_or_else(|| anyhow!("{} expects an array of filters", operator))?;
    if items.is_empty() {
        bail!("{} expects a non-empty array", operator);
    }
    items
        .iter()
        .map(|item| {
            let item = item
                .as_object()
                .ok_or_else(|| anyhow!("{} expects an array of filters", operator))?;
            compile_query(item)
        })
        .collect()
}

/// Whether an object is an operator expression. Mixing operators and plain
/// fields in one object is an error whatever the key order.
fn is_operator_object(map: &Map<String, Value>) -> Result<bool> {
    let operators = map.keys().filter(|key| key.starts_with('$')).count();
    if operators > 0 && operators < map.len() {
        bail!("Cannot mix operators and fields in one expression");
    }
    Ok(operators > 0)
}

fn compile_predicate(condition: &Value) -> Result<Predicate> {
    match condition.as_object() {
        Some(map) if is_operator_object(map)? => Ok(Predicate::Operators(compile_ops(map)?)),
        _ => Ok(Predicate::Equals(condition.clone())),
    }
}

fn compile_ops(operators: &Map<String, Value>) -> Result<Vec<Op>> {
    let mut ops = Vec::with_capacity(operators.len());
    for (operator, argument) in operators {
        let op = match operator.as_str() {
            "$eq" => Op::Eq(argument.clone()),
            "$ne" => Op::Ne(argument.clone()),
            "$gt" => Op::Compare(argument.clone(), |o| o == Ordering::Greater),
            "$gte" => Op::Compare(argument.clone(), |o| o != Ordering::Less),
            "$lt" => Op::Compare(argument.clone(), |o| o == Ordering::Less),
            "$lte" => Op::Compare(argument.clone(), |o| o != Ordering::Greater),
            "$in" => Op::In(array_argument(argument, operator)?),
            "$nin" => Op::Nin(array_argument(argument, operator)?),
            "$exists" => Op::Exists(
                argument
                    .as_bool()
                    .ok_or_else(|| anyhow!("$exists expects a boolean"))?,
            ),
            "$type" => Op::Type(type_names(argument)?),
            "$all" => Op::All(array_argument(argument, operator)?),
            "$elemMatch" => Op::ElemMatch(compile_elem_match(argument)?),
            "$size" => Op::Size(
                argument
                    .as_u64()
                    .ok_or_else(|| anyhow!("$size expects a non-negative integer"))?,
            ),
            "$regex" => Op::Regex(compile_regex(argument, operators.get("$options"))?),
            "$options" => {
                if !operators.contains_key("$regex") {
                    bail!("$options requires $regex");
                }
                continue;
            }
            "$mod" => compile_mod(argument)?,
            "$not" => {
                let inner = argument
                    .as_object()
                    .filter(|map| !map.is_empty())
                    .ok_or_else(|| anyhow!("$not expects an operator expression"))?;
                if !is_operator_object(inner)? {
                    bail!("$not expects an operator expression");
                }
                Op::Not(compile_ops(inner)?)
            }
            other => bail!("Unsupported operator {}", other),
        };
        ops.push(op);
    }
    Ok(ops)
}

fn array_argument(argument: &Value, operator: &str) -> Result<Vec<Value>> {
    argument
        .as_array()
        .cloned()
        .ok_or_else(|| anyhow!("{} expects an array", operator))
}

fn type_name(name: &str) -> Result<TypeName> {
    Ok(match name {
        "string" => TypeName::String,
        "number" => TypeName::Number,
        "int" | "long" => TypeName::Int,
        "double" => TypeName::Double,
        "bool" => TypeName::Bool,
        "object" => TypeName::Object,
        "array" => TypeName::Array,
        "null" => TypeName::Null,
        other => bail!("Unknown $type {}", other),
    })
}

fn type_names(argument: &Value) -> Result<Vec<TypeName>> {
    match argument {
        Value::String(name) => Ok(vec![type_name(name)?]),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .ok_or_else(|| anyhow!("$type expects type names"))
                    .and_then(type_name)
            })
            .collect(),
        _ => bail!("$type expects a type name or an array of names"),
    }
}

fn compile_elem_match(argument: &Value) -> Result<ElemMatch> {
    let condition = argument
        .as_object()
        .ok_or_else(|| anyhow!("$elemMatch expects an object"))?;
    let logical = condition
        .keys()
        .any(|key| matches!(key.as_str(), "$and" | "$or" | "$nor"));
    if !logical && is_operator_object(condition)? {
        Ok(ElemMatch::Element(compile_ops(condition)?))
    } else {
        Ok(ElemMatch::Document(compile_query(condition)?))
    }
}

fn compile_regex(pattern: &Value, options: Option<&Value>) -> Result<Regex> {
    let pattern = pattern
        .as_str()
        .ok_or_else(|| anyhow!("$regex expects a string pattern"))?;
    let options = match options {
        None => "",
        Some(Value::String(options)) => options.as_str(),
        Some(_) => bail!("$options expects a string"),
    };
    let mut builder = RegexBuilder::new(pattern);
    builder.size_limit(REGEX_SIZE_LIMIT);
    for flag in options.chars() {
        match flag {
            'i' => builder.case_insensitive(true),
            'm' => builder.multi_line(true),
            's' => builder.dot_matches_new_line(true),
            'x' => builder.ignore_whitespace(true),
            other => bail!("Unsupported regex option {}", other),
        };
    }
    builder
        .build()
        .map_err(|e| anyhow!("Invalid regex {:?}: {}", pattern, e))
}

fn compile_mod(argument: &Value) -> Result<Op> {
    let (divisor, remainder) = match argument.as_array().map(Vec::as_slice) {
        Some([divisor, remainder]) => (
            divisor
                .as_f64()
                .ok_or_else(|| anyhow!("$mod expects [divisor, remainder]"))? as i64,
            remainder
                .as_f64()
                .ok_or_else(|| anyhow!("$mod expects [divisor, remainder]"))? as i64,
        ),
        _ => bail!("$mod expects [divisor, remainder]"),
    };
    if divisor == 0 {
        bail!("$mod divisor cannot be zero");
    }
    Ok(Op::Mod { divisor, remainder })
}

/// Values reachable by a dotted path. Empty means the field is missing.
fn resolve<'a>(doc: &'a Value, path: &str) -> Vec<&'a Value> {
    let mut current = vec![doc];
    for segment in path.split('.') {
        let mut next = Vec::new();
        for value in current {
            match value {
                Value::Object(map) => next.extend(map.get(segment)),
                Value::Array(items) => match segment.parse::<usize>() {
                    Ok(index) => next.extend(items.get(index)),
                    Err(_) => next.extend(
                        items
                            .iter()
                            .filter_map(|item| item.as_object()?.get(segment)),
                    ),
                },
                _ => {}
            }
        }
        current = next;
    }
    current
}

fn all_ops_match(ops: &[Op], candidates: &[&Value]) -> bool {
    ops.iter().all(|op| op.matches(candidates))
}

impl Op {
    fn matches(&self, candidates: &[&Value]) -> bool {
        match self {
            Op::Eq(target) => equals_any(candidates, target),
            Op::Ne(target) => !equals_any(candidates, target),
            Op::Compare(target, accept) => expand(candidates)
                .into_iter()
                .any(|value| compare(value, target).is_some_and(accept)),
            Op::In(list) => list.iter().any(|target| equals_any(candidates, target)),
            Op::Nin(list) => !list.iter().any(|target| equals_any(candidates, target)),
            Op::Exists(wanted) => candidates.is_empty() != *wanted,
            Op::Type(names) => expand(candidates)
                .into_iter()
                .any(|value| names.iter().any(|name| name.matches(value))),
            Op::All(required) => {
                !required.is_empty()
                    && candidates.iter().any(|value| {
                        value.as_array().is_some_and(|items| {
                            required
                                .iter()
                                .all(|target| items.iter().any(|item| values_equal(item, target)))
                        })
                    })
            }
            Op::ElemMatch(condition) => candidates
                .iter()
                .filter_map(|value| value.as_array())
                .flatten()
                .any(|item| match condition {
                    ElemMatch::Element(ops) => all_ops_match(ops, &[item]),
                    ElemMatch::Document(query) => item.is_object() && query.matches(item),
                }),
            Op::Size(size) => candidates
                .iter()
                .any(|value| value.as_array().is_some_and(|items| items.len() as u64 == *size)),
            Op::Regex(regex) => expand(candidates)
                .into_iter()
                .any(|value| value.as_str().is_some_and(|text| regex.is_match(text))),
            Op::Mod { divisor, remainder } => expand(candidates).into_iter().any(|value| {
                value
                    .as_f64()
                    .is_some_and(|number| (number as i64) % divisor == *remainder)
            }),
            Op::Not(ops) => !all_ops_match(ops, candidates),
        }
    }
}

impl TypeName {
    fn matches(self, value: &Value) -> bool {
        match self {
            TypeName::String => value.is_string(),
            TypeName::Number => value.is_number(),
            TypeName::Int => value.is_i64() || value.is_u64(),
            TypeName::Double => value.is_f64(),
            TypeName::Bool => value.is_boolean(),
            TypeName::Object => value.is_object(),
            TypeName::Array => value.is_array(),
            TypeName::Null => value.is_null(),
        }
    }
}

/// Candidates plus the elements of any array candidate.
fn expand<'a>(candidates: &[&'a Value]) -> Vec<&'a Value> {
    let mut expanded = Vec::with_capacity(candidates.len());
    for &value in candidates {
        expanded.push(value);
        if let Value::Array(items) = value {
            expanded.extend(items.iter());
        }
    }
    expanded
}

fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => left == right,
    }
}

fn equals_any(candidates: &[&Value], target: &Value) -> bool {
    if candidates.is_empty() {
        return target.is_null();
    }
    expand(candidates)
        .into_iter()
        .any(|value| values_equal(value, target))
}

fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

#[cfg(test)]
mod tests;
