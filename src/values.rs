//! Conversions between the nested value object exchanged with the REST
//! service and the flat, dotted control names of a form.

use std::fmt;

use serde_json::{Map, Value};

/// Value of a scalar slot that was superseded by a nested section.
pub const SENTINEL: &str = "-";

/// A control name split into its segments.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub struct DottedPath(Vec<String>);

impl DottedPath {
  pub fn root() -> Self {
    Self::default()
  }

  pub fn parse(name: &str) -> Self {
    Self(name.split('.').map(String::from).collect())
  }

  pub fn child(&self, segment: &str) -> Self {
    let mut segments = self.0.clone();
    segments.push(segment.to_string());
    Self(segments)
  }

  pub fn segments(&self) -> &[String] {
    &self.0
  }
}

impl fmt::Display for DottedPath {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0.join("."))
  }
}

/// What may happen to an existing slot when a longer path passes through it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotPolicy {
  Descend,
  Replace,
  Reject,
}

pub fn slot_policy(existing: Option<&Value>) -> SlotPolicy {
  match existing {
    None => SlotPolicy::Replace,
    Some(Value::Object(_)) => SlotPolicy::Descend,
    Some(Value::String(s)) if s == SENTINEL => SlotPolicy::Replace,
    Some(_) => SlotPolicy::Reject,
  }
}

/// Inserts `value` under the dotted `key`, creating intermediate objects.
///
/// Returns `false` when an existing scalar on the way blocked the insertion.
pub fn insert_dotted(values: &mut Map<String, Value>, key: &str, value: Value) -> bool {
  insert_path(values, DottedPath::parse(key).segments(), value)
}

pub fn insert_path(values: &mut Map<String, Value>, segments: &[String], value: Value) -> bool {
  match segments {
    [] => false,
    [last] => {
      values.insert(last.clone(), value);
      true
    },
    [first, rest @ ..] => {
      match slot_policy(values.get(first)) {
        SlotPolicy::Descend => {},
        SlotPolicy::Replace => {
          values.insert(first.clone(), Value::Object(Map::new()));
        },
        SlotPolicy::Reject => {
          log::debug!("dropping '{}': '{}' already holds a value", segments.join("."), first);
          return false;
        },
      }
      match values.get_mut(first) {
        Some(Value::Object(child)) => insert_path(child, rest, value),
        _ => false,
      }
    },
  }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Node<'a> {
  Scalar(&'a Value),
  Branch,
}

/// Visits every entry of `values` depth first, parents before children.
pub fn walk<F>(values: &Value, prefix: &DottedPath, visit: &mut F)
where
  F: FnMut(&DottedPath, Node<'_>),
{
  match values {
    Value::Object(map) => {
      for (key, value) in map {
        walk_entry(prefix.child(key), value, visit);
      }
    },
    Value::Array(items) => {
      for (index, value) in items.iter().enumerate() {
        walk_entry(prefix.child(&index.to_string()), value, visit);
      }
    },
    _ => {},
  }
}

fn walk_entry<F>(path: DottedPath, value: &Value, visit: &mut F)
where
  F: FnMut(&DottedPath, Node<'_>),
{
  match value {
    Value::Object(_) | Value::Array(_) => {
      visit(&path, Node::Branch);
      walk(value, &path, visit);
    },
    scalar => visit(&path, Node::Scalar(scalar)),
  }
}

pub fn truthy(value: &Value) -> bool {
  match value {
    Value::Null => false,
    Value::Bool(b) => *b,
    Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
    Value::String(s) => !s.is_empty(),
    Value::Array(_) | Value::Object(_) => true,
  }
}

/// Text a scalar shows in an input.
pub fn scalar_text(value: &Value) -> String {
  match value {
    Value::Null => String::new(),
    Value::String(s) => s.clone(),
    other => other.to_string(),
  }
}

/// Parses the leading integer of `text`, ignoring whatever follows it.
pub fn parse_leading_int(text: &str) -> Option<i64> {
  let text = text.trim_start();
  let (sign, digits) = match text.strip_prefix('-') {
    Some(rest) => (-1, rest),
    None => (1, text.strip_prefix('+').unwrap_or(text)),
  };
  let end = digits.find(|c: char| !c.is_ascii_digit()).unwrap_or(digits.len());
  digits[..end].parse::<i64>().ok().map(|n| sign * n)
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;
  use serde_json::json;

  use super::*;

  fn object(value: Value) -> Map<String, Value> {
    match value {
      Value::Object(map) => map,
      _ => panic!("expected an object"),
    }
  }

  #[test]
  fn single_segment_assigns_directly() {
    let mut values = object(json!({ "a": { "b": 1 } }));
    assert!(insert_dotted(&mut values, "a", json!("flat")));
    assert_eq!(Value::Object(values), json!({ "a": "flat" }));
  }

  #[test]
  fn nested_objects_are_created_on_demand() {
    let mut values = Map::new();
    insert_dotted(&mut values, "eth0.ipv4.address", json!("10.0.0.1"));
    insert_dotted(&mut values, "eth0.ipv4.mask", json!("255.0.0.0"));
    insert_dotted(&mut values, "eth0.mtu", json!(1500));

    assert_eq!(
      Value::Object(values),
      json!({ "eth0": { "ipv4": { "address": "10.0.0.1", "mask": "255.0.0.0" }, "mtu": 1500 } })
    );
  }

  #[test]
  fn sentinel_slot_is_replaced_by_nested_object() {
    let mut values = object(json!({ "wifi": "-" }));
    assert!(insert_dotted(&mut values, "wifi.ssid", json!("home")));
    assert_eq!(Value::Object(values), json!({ "wifi": { "ssid": "home" } }));
  }

  #[test]
  fn explicit_scalar_is_never_clobbered_by_a_longer_path() {
    for scalar in [json!(true), json!("on"), json!(0), Value::Null] {
      let mut values = Map::new();
      values.insert("wifi".into(), scalar.clone());
      assert!(!insert_dotted(&mut values, "wifi.ssid", json!("home")));
      assert_eq!(values.get("wifi"), Some(&scalar));
    }
  }

  #[test]
  fn slot_policy_covers_every_shape() {
    assert_eq!(slot_policy(None), SlotPolicy::Replace);
    assert_eq!(slot_policy(Some(&json!({}))), SlotPolicy::Descend);
    assert_eq!(slot_policy(Some(&json!("-"))), SlotPolicy::Replace);
    assert_eq!(slot_policy(Some(&json!("--"))), SlotPolicy::Reject);
    assert_eq!(slot_policy(Some(&json!([1]))), SlotPolicy::Reject);
  }

  #[test]
  fn walk_visits_parents_before_children_in_order() {
    let values = json!({ "b": 1, "a": { "y": true, "x": [ "p", "q" ] } });
    let mut seen = vec![];
    walk(&values, &DottedPath::root(), &mut |path, node| {
      let tag = match node {
        Node::Scalar(value) => scalar_text(value),
        Node::Branch => "{}".to_string(),
      };
      seen.push(format!("{path}={tag}"));
    });

    assert_eq!(seen, vec!["b=1", "a={}", "a.y=true", "a.x={}", "a.x.0=p", "a.x.1=q"]);
  }

  #[test]
  fn leading_integer_parse() {
    assert_eq!(parse_leading_int("42"), Some(42));
    assert_eq!(parse_leading_int("  -7px"), Some(-7));
    assert_eq!(parse_leading_int("+3"), Some(3));
    assert_eq!(parse_leading_int("abc"), None);
    assert_eq!(parse_leading_int(""), None);
  }

  #[test]
  fn truthiness_follows_loose_rules() {
    assert!(truthy(&json!(true)));
    assert!(truthy(&json!("no")));
    assert!(truthy(&json!(2)));
    assert!(!truthy(&json!(0)));
    assert!(!truthy(&json!("")));
    assert!(!truthy(&Value::Null));
  }
}
