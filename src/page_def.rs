use std::{fmt, marker::PhantomData};

use serde::{
  de::{self, MapAccess, Visitor},
  Deserialize, Deserializer,
};
use serde_json::Value;
use thiserror::Error;

pub const INCOMPLETE_PAGE_DEF: &str = "incomplete pageDef: one or more mandatory field is missing";

/// Pattern for dotted IPv4 addresses.
pub const DOTTED_IP4_PATTERN: &str = r"[0-9][0-9]{0,2}\.[0-9][0-9]{0,2}\.[0-9][0-9]{0,2}\.[0-9][0-9]{0,2}";

/// Named patterns a field may refer to as `pattern: "@name"`.
const NAMED_PATTERNS: [(&str, &str); 1] = [("dottedIP4", DOTTED_IP4_PATTERN)];

/// Expands a `@name` pattern reference; anything else is returned as written.
pub fn resolve_pattern(pattern: &str) -> String {
  pattern
    .strip_prefix('@')
    .and_then(|name| NAMED_PATTERNS.iter().find(|(known, _)| *known == name))
    .map_or(pattern, |(_, expanded)| *expanded)
    .to_string()
}

#[derive(Debug, Error)]
pub enum SchemaError {
  #[error("{} (missing: {})", INCOMPLETE_PAGE_DEF, .0.join(", "))]
  MissingKeys(Vec<String>),
  #[error("{INCOMPLETE_PAGE_DEF} (page definition is not an object)")]
  NotAnObject,
  #[error("invalid page definition: {0}")]
  Invalid(#[from] serde_json::Error),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
  #[default]
  Directory,
  Form,
}

impl PageKind {
  pub fn required_keys(&self) -> &'static [&'static str] {
    match self {
      PageKind::Directory => &["resource", "title", "entries"],
      PageKind::Form => &["name", "resource", "title", "fields"],
    }
  }
}

/// A mapping that keeps the order its keys were written in.
///
/// Re-assigning a key keeps its first position, like a JavaScript object.
#[derive(Debug, Clone, PartialEq)]
pub struct Ordered<V>(pub Vec<(String, V)>);

impl<V> Default for Ordered<V> {
  fn default() -> Self {
    Self(Vec::new())
  }
}

impl<V> Ordered<V> {
  pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
    self.0.iter().map(|(key, value)| (key.as_str(), value))
  }

  pub fn get(&self, key: &str) -> Option<&V> {
    self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn insert(&mut self, key: impl Into<String>, value: V) {
    let key = key.into();
    match self.0.iter_mut().find(|(k, _)| *k == key) {
      Some(slot) => slot.1 = value,
      None => self.0.push((key, value)),
    }
  }
}

impl<V> FromIterator<(String, V)> for Ordered<V> {
  fn from_iter<T: IntoIterator<Item = (String, V)>>(iter: T) -> Self {
    let mut ordered = Ordered::default();
    for (key, value) in iter {
      ordered.insert(key, value);
    }
    ordered
  }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for Ordered<V> {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    struct OrderedVisitor<V>(PhantomData<V>);

    impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedVisitor<V> {
      type Value = Ordered<V>;

      fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a mapping")
      }

      fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut ordered = Ordered::default();
        while let Some((key, value)) = map.next_entry::<String, V>()? {
          ordered.insert(key, value);
        }
        Ok(ordered)
      }
    }

    deserializer.deserialize_map(OrderedVisitor(PhantomData))
  }
}

pub type Fields = Ordered<FieldDef>;

#[derive(Debug, Clone, Deserialize)]
pub struct FieldDef {
  #[serde(flatten)]
  pub kind: FieldKind,
  #[serde(default)]
  pub desc: String,
  #[serde(default)]
  pub required: bool,
  #[serde(default)]
  pub events: Ordered<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldKind {
  Text(InputHints),
  Number(InputHints),
  Password(InputHints),
  Checkbox {
    #[serde(default)]
    defval: Option<Value>,
  },
  Select {
    #[serde(default)]
    options: Ordered<String>,
    #[serde(default)]
    defval: Option<Value>,
  },
  Section {
    #[serde(default)]
    fields: Option<Fields>,
    #[serde(default)]
    value: Option<Box<FieldDef>>,
  },
}

impl FieldKind {
  pub fn type_name(&self) -> &'static str {
    match self {
      FieldKind::Text(_) => "text",
      FieldKind::Number(_) => "number",
      FieldKind::Password(_) => "password",
      FieldKind::Checkbox { .. } => "checkbox",
      FieldKind::Select { .. } => "select",
      FieldKind::Section { .. } => "section",
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct InputHints {
  #[serde(default)]
  pub defval: Option<Value>,
  #[serde(default)]
  pub pattern: Option<String>,
  #[serde(default, deserialize_with = "number_or_numeric_string")]
  pub min: Option<f64>,
  #[serde(default, deserialize_with = "number_or_numeric_string")]
  pub max: Option<f64>,
  #[serde(default)]
  pub size: Option<u16>,
}

/// Bounds may be written as numbers or as strings holding one, like HTML
/// attributes.
fn number_or_numeric_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
  match Option::<Value>::deserialize(deserializer)? {
    None | Some(Value::Null) => Ok(None),
    Some(Value::Number(number)) => Ok(number.as_f64()),
    Some(Value::String(text)) if text.trim().is_empty() => Ok(None),
    Some(Value::String(text)) => {
      text.trim().parse::<f64>().map(Some).map_err(|_| de::Error::custom(format!("'{text}' is not a number")))
    },
    Some(other) => Err(de::Error::custom(format!("expected a number, found {other}"))),
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DirEntry {
  pub name: String,
  #[serde(default)]
  pub desc: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryDef {
  #[serde(default)]
  pub name: String,
  pub resource: String,
  pub title: String,
  pub entries: Vec<DirEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FormDef {
  pub name: String,
  pub resource: String,
  pub title: String,
  pub fields: Fields,
}

#[derive(Debug, Clone)]
pub enum PageDefinition {
  Directory(DirectoryDef),
  Form(FormDef),
}

impl PageDefinition {
  /// Checks the keys `kind` requires before decoding the typed definition.
  pub fn from_value(kind: PageKind, value: Value) -> Result<Self, SchemaError> {
    let object = value.as_object().ok_or(SchemaError::NotAnObject)?;
    let missing = kind
      .required_keys()
      .iter()
      .filter(|key| !object.contains_key(**key))
      .map(|key| key.to_string())
      .collect::<Vec<_>>();
    if !missing.is_empty() {
      return Err(SchemaError::MissingKeys(missing));
    }

    Ok(match kind {
      PageKind::Directory => PageDefinition::Directory(serde_json::from_value(value)?),
      PageKind::Form => PageDefinition::Form(serde_json::from_value(value)?),
    })
  }

  pub fn kind(&self) -> PageKind {
    match self {
      PageDefinition::Directory(_) => PageKind::Directory,
      PageDefinition::Form(_) => PageKind::Form,
    }
  }

  pub fn title(&self) -> &str {
    match self {
      PageDefinition::Directory(def) => &def.title,
      PageDefinition::Form(def) => &def.title,
    }
  }

  pub fn resource(&self) -> &str {
    match self {
      PageDefinition::Directory(def) => &def.resource,
      PageDefinition::Form(def) => &def.resource,
    }
  }
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;
  use serde_json::json;

  use super::*;

  #[test]
  fn form_fields_keep_declaration_order() {
    let source = json5::from_str::<Value>(
      r#"{
        name: "net", resource: "/x/y/net", title: "Net",
        fields: {
          zeta: { type: "text", desc: "last letter" },
          alpha: { type: "number", min: 1, max: 10 },
          mid: { type: "checkbox", defval: true },
        },
      }"#,
    )
    .unwrap();

    let PageDefinition::Form(form) = PageDefinition::from_value(PageKind::Form, source).unwrap() else { panic!("expected a form") };
    let names = form.fields.iter().map(|(name, _)| name).collect::<Vec<_>>();
    assert_eq!(names, vec!["zeta", "alpha", "mid"]);

    let (_, alpha) = form.fields.0[1].clone();
    let FieldKind::Number(hints) = alpha.kind else { panic!("expected a number field") };
    assert_eq!(hints.min, Some(1.0));
    assert_eq!(hints.max, Some(10.0));
  }

  #[test]
  fn nested_sections_and_inline_values_decode() {
    let value = json!({
      "name": "wifi",
      "resource": "/x/net/wifi",
      "title": "WiFi",
      "fields": {
        "radio": {
          "type": "section",
          "value": { "type": "checkbox", "events": { "change": "enable:radio.ssid" } },
          "fields": { "ssid": { "type": "text", "required": true } }
        },
        "mode": { "type": "select", "options": { "b": "802.11b", "a": "802.11a" }, "defval": "a" }
      }
    });

    let PageDefinition::Form(form) = PageDefinition::from_value(PageKind::Form, value).unwrap() else {
      panic!("expected a form")
    };
    let radio = form.fields.get("radio").unwrap();
    let FieldKind::Section { fields: Some(children), value: Some(inline) } = &radio.kind else {
      panic!("expected a section with an inline value")
    };
    assert_eq!(inline.kind.type_name(), "checkbox");
    assert_eq!(inline.events.get("change").map(String::as_str), Some("enable:radio.ssid"));
    assert!(children.get("ssid").unwrap().required);

    let FieldKind::Select { options, .. } = &form.fields.get("mode").unwrap().kind else {
      panic!("expected a select")
    };
    assert_eq!(options.iter().map(|(value, _)| value).collect::<Vec<_>>(), vec!["b", "a"]);
  }

  #[test]
  fn missing_required_keys_are_reported() {
    let value = json!({ "resource": "/x/y", "title": "Y" });
    let err = PageDefinition::from_value(PageKind::Directory, value).unwrap_err();

    assert!(matches!(&err, SchemaError::MissingKeys(keys) if keys == &vec!["entries".to_string()]));
    assert!(err.to_string().starts_with(INCOMPLETE_PAGE_DEF));
  }

  #[test]
  fn unknown_field_type_is_a_schema_error() {
    let value = json!({
      "name": "n", "resource": "/x/y/n", "title": "N",
      "fields": { "when": { "type": "date" } }
    });
    let err = PageDefinition::from_value(PageKind::Form, value).unwrap_err();
    assert!(matches!(err, SchemaError::Invalid(_)));
  }

  #[test]
  fn bounds_accept_numeric_strings() {
    let value = json!({
      "name": "n", "resource": "/x/y/n", "title": "N",
      "fields": {
        "channel": { "type": "number", "min": "1", "max": 13 },
        "mtu": { "type": "number", "min": "" }
      }
    });
    let PageDefinition::Form(form) = PageDefinition::from_value(PageKind::Form, value).unwrap() else {
      panic!("expected a form")
    };
    let FieldKind::Number(channel) = &form.fields.get("channel").unwrap().kind else { panic!("expected a number") };
    assert_eq!((channel.min, channel.max), (Some(1.0), Some(13.0)));
    let FieldKind::Number(mtu) = &form.fields.get("mtu").unwrap().kind else { panic!("expected a number") };
    assert_eq!(mtu.min, None);

    let bad = json!({
      "name": "n", "resource": "/x/y/n", "title": "N",
      "fields": { "channel": { "type": "number", "max": "lots" } }
    });
    assert!(matches!(PageDefinition::from_value(PageKind::Form, bad).unwrap_err(), SchemaError::Invalid(_)));
  }

  #[test]
  fn named_patterns_expand() {
    assert_eq!(resolve_pattern("@dottedIP4"), DOTTED_IP4_PATTERN);
    assert_eq!(resolve_pattern("@unknown"), "@unknown");
    assert_eq!(resolve_pattern("[a-z]+"), "[a-z]+");
  }

  #[test]
  fn reassigned_keys_keep_their_first_position() {
    let ordered: Ordered<u8> = [("a".to_string(), 1), ("b".to_string(), 2), ("a".to_string(), 3)].into_iter().collect();
    assert_eq!(ordered.0, vec![("a".to_string(), 3), ("b".to_string(), 2)]);
  }
}
