//! Reading the engine's strategy dump.
//!
//! The engine's output schema is an external contract. Every assumption about
//! it lives in this module so an engine upgrade touches nothing else.
//!
//! Accepted shapes, as JSON on stdout (progress lines before the document are
//! skipped):
//!
//! ```json
//! {"node_type": "action_node", "player": 1, "actions": ["CHECK", "BET 5"],
//!  "strategy": {"strategy": {"AhAd": [0.25, 0.75]}},
//!  "childrens": {"CHECK": {"node_type": "chance_node", "dealcards": {"7c": {...}}}}}
//! ```
//!
//! or the same tree wrapped as `{"strategy": <tree>, "exploitability": 0.28,
//! "iterations": 120}`.

use crate::invoker::RawEngineOutput;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

pub const ROOT_PATH: &str = "root";

/// Allowed drift of a hand's action probabilities from 1. The engine prints
/// rounded decimals.
const DISTRIBUTION_TOLERANCE: f64 = 1e-3;

/// Action distribution reported at one point of the solved tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionNode {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player: Option<u8>,
    /// Mean probability of each action across the hands at this node.
    pub actions: BTreeMap<String, f64>,
    /// Per-hand distribution, keyed by combo then action.
    pub hands: BTreeMap<String, BTreeMap<String, f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveResult {
    /// Decision nodes keyed by path, e.g. `root` or `root:CHECK:7c`.
    pub nodes: BTreeMap<String, DecisionNode>,
    /// Exploitability reported by the engine.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub convergence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iterations: Option<u32>,
    /// Wall-clock seconds the engine ran for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub computation_time: Option<f64>,
}

impl SolveResult {
    pub fn root(&self) -> Option<&DecisionNode> {
        self.nodes.get(ROOT_PATH)
    }
}

/// The engine exited cleanly but its output could not be interpreted.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("engine produced no output")]
    Empty,
    #[error("engine output is not a JSON document: {0}")]
    NotJson(String),
    #[error("malformed node at `{path}`: {reason}")]
    MalformedNode { path: String, reason: String },
    #[error("engine output contains no decision nodes")]
    NoDecisionNodes,
}

fn malformed(path: &str, reason: impl Into<String>) -> ParseError {
    ParseError::MalformedNode {
        path: path.to_string(),
        reason: reason.into(),
    }
}

pub fn translate(raw: &RawEngineOutput) -> Result<SolveResult, ParseError> {
    let document = locate_document(&raw.stdout)?;

    let (tree, convergence, iterations) = match document.get("node_type") {
        Some(_) => (&document, None, None),
        None => {
            let tree = document
                .get("strategy")
                .filter(|v| v.get("node_type").is_some())
                .ok_or_else(|| malformed(ROOT_PATH, "missing `node_type`"))?;
            let convergence = document.get("exploitability").and_then(Value::as_f64);
            let iterations = document
                .get("iterations")
                .and_then(Value::as_u64)
                .and_then(|n| u32::try_from(n).ok());
            (tree, convergence, iterations)
        }
    };

    let mut nodes = BTreeMap::new();
    walk(tree, ROOT_PATH.to_string(), &mut nodes)?;
    if nodes.is_empty() {
        return Err(ParseError::NoDecisionNodes);
    }

    Ok(SolveResult {
        nodes,
        convergence,
        iterations,
        computation_time: Some(raw.elapsed.as_secs_f64()),
    })
}

fn locate_document(stdout: &str) -> Result<Value, ParseError> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Err(ParseError::Empty);
    }
    let first_err = match serde_json::from_str::<Value>(trimmed) {
        Ok(value) if value.is_object() => return Ok(value),
        Ok(_) => "top-level value is not an object".to_string(),
        Err(err) => err.to_string(),
    };

    let mut offset = 0;
    for line in stdout.split_inclusive('\n') {
        if line.trim_start().starts_with('{') {
            return match serde_json::from_str::<Value>(stdout[offset..].trim()) {
                Ok(value) if value.is_object() => Ok(value),
                Ok(_) => Err(ParseError::NotJson("top-level value is not an object".into())),
                Err(err) => Err(ParseError::NotJson(err.to_string())),
            };
        }
        offset += line.len();
    }
    Err(ParseError::NotJson(first_err))
}

fn walk(
    value: &Value,
    path: String,
    nodes: &mut BTreeMap<String, DecisionNode>,
) -> Result<(), ParseError> {
    let node = value
        .as_object()
        .ok_or_else(|| malformed(&path, "expected an object"))?;
    let node_type = node
        .get("node_type")
        .and_then(Value::as_str)
        .ok_or_else(|| malformed(&path, "missing `node_type`"))?;

    match node_type {
        "action_node" => {
            let actions = read_actions(node, &path)?;
            if let Some(decision) = read_decision(node, &actions, &path)? {
                nodes.insert(path.clone(), decision);
            }
            let children = node.get("childrens").or_else(|| node.get("children"));
            walk_children(children, &path, nodes)
        }
        "chance_node" => walk_children(node.get("dealcards"), &path, nodes),
        "terminal_node" | "showdown_node" => Ok(()),
        other => Err(malformed(&path, format!("unknown node_type `{other}`"))),
    }
}

fn walk_children(
    children: Option<&Value>,
    path: &str,
    nodes: &mut BTreeMap<String, DecisionNode>,
) -> Result<(), ParseError> {
    let Some(children) = children else {
        return Ok(());
    };
    let children = children
        .as_object()
        .ok_or_else(|| malformed(path, "children must be an object"))?;
    for (edge, child) in children {
        walk(child, format!("{path}:{edge}"), nodes)?;
    }
    Ok(())
}

fn read_actions(node: &Map<String, Value>, path: &str) -> Result<Vec<String>, ParseError> {
    let actions = node
        .get("actions")
        .and_then(Value::as_array)
        .ok_or_else(|| malformed(path, "action node without `actions`"))?;
    actions
        .iter()
        .map(|a| {
            a.as_str()
                .map(str::to_string)
                .ok_or_else(|| malformed(path, "actions must be strings"))
        })
        .collect()
}

fn read_decision(
    node: &Map<String, Value>,
    actions: &[String],
    path: &str,
) -> Result<Option<DecisionNode>, ParseError> {
    let Some(per_hand) = node
        .get("strategy")
        .and_then(|s| s.get("strategy"))
        .and_then(Value::as_object)
    else {
        return Ok(None);
    };
    if per_hand.is_empty() || actions.is_empty() {
        return Ok(None);
    }

    let mut hands = BTreeMap::new();
    let mut totals = vec![0.0; actions.len()];
    for (combo, probs) in per_hand {
        let probs = probs
            .as_array()
            .ok_or_else(|| malformed(path, format!("strategy for {combo} is not a list")))?;
        if probs.len() != actions.len() {
            return Err(malformed(
                path,
                format!(
                    "strategy for {combo} has {} entries for {} actions",
                    probs.len(),
                    actions.len()
                ),
            ));
        }
        let mut dist = BTreeMap::new();
        let mut sum = 0.0;
        for (i, p) in probs.iter().enumerate() {
            let p = p
                .as_f64()
                .filter(|p| (0.0..=1.0).contains(p))
                .ok_or_else(|| malformed(path, format!("bad probability for {combo}")))?;
            sum += p;
            totals[i] += p;
            dist.insert(actions[i].clone(), p);
        }
        if (sum - 1.0).abs() > DISTRIBUTION_TOLERANCE {
            return Err(malformed(
                path,
                format!("strategy for {combo} sums to {sum}, not 1"),
            ));
        }
        hands.insert(combo.clone(), dist);
    }

    let count = hands.len() as f64;
    let actions = actions
        .iter()
        .zip(totals)
        .map(|(action, total)| (action.clone(), total / count))
        .collect();

    Ok(Some(DecisionNode {
        player: node
            .get("player")
            .and_then(Value::as_u64)
            .and_then(|p| u8::try_from(p).ok()),
        actions,
        hands,
    }))
}
