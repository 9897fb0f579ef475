//! Attribute schema resolver.
//!
//! Each node kind maps to a static list of field descriptors. The editing
//! surface works on typed [`FieldValue`]s hydrated from the stored attribute
//! map; on submit they are normalized back into bare JSON values.

use crate::models::{Attributes, NodeKind};
use serde_json::Value;
use std::collections::BTreeMap;
use strum::{Display, EnumIter};
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct SelectOption {
    pub value: &'static str,
    pub label: &'static str,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FieldKind {
    Text,
    MultilineText,
    Select(&'static [SelectOption]),
    Boolean,
    /// A nested object, e.g. a button's navigation target.
    Group(&'static [FieldDescriptor]),
    /// An ordered list of objects edited as keyed rows.
    List(&'static [FieldDescriptor]),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct FieldDescriptor {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldDescriptor {
    const fn new(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            label,
            kind,
            required: false,
        }
    }

    const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Value a blank form starts with.
    pub fn empty_value(&self) -> FieldValue {
        match self.kind {
            FieldKind::Text | FieldKind::MultilineText => FieldValue::Text(String::new()),
            FieldKind::Select(_) => FieldValue::Choice(None),
            FieldKind::Boolean => FieldValue::Flag(false),
            FieldKind::Group(fields) => FieldValue::Group(blank(fields)),
            FieldKind::List(_) => FieldValue::Rows(RowSet::default()),
        }
    }
}

const fn text(name: &'static str) -> FieldDescriptor {
    FieldDescriptor::new(name, name, FieldKind::Text)
}

const fn opt(value: &'static str) -> SelectOption {
    SelectOption { value, label: value }
}

const DIRECTION: &[SelectOption] = &[opt("row"), opt("column")];
const ALIGN: &[SelectOption] = &[opt("start"), opt("center"), opt("end")];
const JUSTIFY: &[SelectOption] = &[opt("start"), opt("center"), opt("end"), opt("between")];
const BUTTON_KIND: &[SelectOption] = &[opt("button"), opt("submit")];
const BUTTON_ACTION: &[SelectOption] = &[opt("navigate")];
const BUTTON_VARIANT: &[SelectOption] = &[opt("primary"), opt("secondary"), opt("ghost")];
const ROW_ACTION: &[SelectOption] = &[
    SelectOption { value: "navigate", label: "Navigate" },
    SelectOption { value: "delete", label: "Delete" },
];

const CONTAINER_FIELDS: &[FieldDescriptor] = &[
    text("flex"),
    FieldDescriptor::new("direction", "direction", FieldKind::Select(DIRECTION)),
    text("padding"),
    text("gap"),
    FieldDescriptor::new("align", "align", FieldKind::Select(ALIGN)),
    FieldDescriptor::new("justify", "justify", FieldKind::Select(JUSTIFY)),
    text("width"),
    text("minWidth"),
    text("maxWidth"),
    text("height"),
    text("minHeight"),
    text("maxHeight"),
];

const TEXT_FIELDS: &[FieldDescriptor] =
    &[FieldDescriptor::new("text", "text", FieldKind::MultilineText)];

const HEADING_FIELDS: &[FieldDescriptor] = &[text("text")];

const NAV_TARGET_FIELDS: &[FieldDescriptor] = &[
    text("route"),
    FieldDescriptor::new("isExternal", "external route?", FieldKind::Boolean),
];

const BUTTON_FIELDS: &[FieldDescriptor] = &[
    text("label"),
    FieldDescriptor::new("alternativeLabel", "alternative label", FieldKind::Text),
    FieldDescriptor::new("buttonKind", "type", FieldKind::Select(BUTTON_KIND)),
    FieldDescriptor::new("action", "action", FieldKind::Select(BUTTON_ACTION)),
    FieldDescriptor::new("to", "navigation target", FieldKind::Group(NAV_TARGET_FIELDS)),
];

const FORM_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("flex", "Flex 1?", FieldKind::Boolean),
    FieldDescriptor::new("referenceId", "reference id", FieldKind::Text),
    FieldDescriptor::new("createRoute", "create route", FieldKind::Text),
    FieldDescriptor::new("updateRoute", "update route", FieldKind::Text),
    FieldDescriptor::new("getRoute", "get route", FieldKind::Text),
];

const TEXT_INPUT_FIELDS: &[FieldDescriptor] = &[text("name"), text("label"), text("placeholder")];

const TABLE_BUTTON_ROW: &[FieldDescriptor] = &[
    text("label"),
    FieldDescriptor::new("variant", "variant", FieldKind::Select(BUTTON_VARIANT)),
    text("route"),
];

const TABLE_HEADER_ROW: &[FieldDescriptor] = &[
    text("label"),
    FieldDescriptor::new("dataIndex", "data index", FieldKind::Text),
];

const TABLE_ACTION_ROW: &[FieldDescriptor] = &[
    text("label"),
    FieldDescriptor::new("action", "action", FieldKind::Select(ROW_ACTION)),
    text("route"),
    text("title"),
    text("description"),
];

const TABLE_ROUTE: FieldDescriptor = text("route").required();
const TABLE_SEARCH: FieldDescriptor = FieldDescriptor::new("search", "Search", FieldKind::Boolean);
const TABLE_BUTTONS: FieldDescriptor =
    FieldDescriptor::new("buttons", "buttons", FieldKind::List(TABLE_BUTTON_ROW));
const TABLE_HEADERS: FieldDescriptor =
    FieldDescriptor::new("headers", "headers", FieldKind::List(TABLE_HEADER_ROW));
const TABLE_ACTIONS: FieldDescriptor =
    FieldDescriptor::new("actions", "actions", FieldKind::List(TABLE_ACTION_ROW));

const TABLE_FIELDS: &[FieldDescriptor] =
    &[TABLE_ROUTE, TABLE_SEARCH, TABLE_BUTTONS, TABLE_HEADERS, TABLE_ACTIONS];

/// Editable fields for a node kind, in display order.
pub(crate) fn resolve_schema(kind: &NodeKind) -> &'static [FieldDescriptor] {
    match kind {
        NodeKind::Container => CONTAINER_FIELDS,
        NodeKind::Text => TEXT_FIELDS,
        NodeKind::Heading => HEADING_FIELDS,
        NodeKind::Button => BUTTON_FIELDS,
        NodeKind::Table => TABLE_FIELDS,
        NodeKind::Form => FORM_FIELDS,
        NodeKind::TextInput => TEXT_INPUT_FIELDS,
        NodeKind::Outlet | NodeKind::Unknown(_) => &[],
    }
}

/// Tabs of the table editor; each edits a slice of the table schema.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub(crate) enum TableTab {
    Details,
    Buttons,
    Headers,
    Actions,
}

impl TableTab {
    pub fn fields(self) -> &'static [FieldDescriptor] {
        const DETAILS: &[FieldDescriptor] = &[TABLE_ROUTE, TABLE_SEARCH];
        const BUTTONS: &[FieldDescriptor] = &[TABLE_BUTTONS];
        const HEADERS: &[FieldDescriptor] = &[TABLE_HEADERS];
        const ACTIONS: &[FieldDescriptor] = &[TABLE_ACTIONS];
        match self {
            TableTab::Details => DETAILS,
            TableTab::Buttons => BUTTONS,
            TableTab::Headers => HEADERS,
            TableTab::Actions => ACTIONS,
        }
    }
}

/// An enum field as the editing surface sees it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Choice {
    Known(SelectOption),
    /// A stored value outside the option set; kept so it survives a save.
    Raw(String),
}

impl Choice {
    pub fn value(&self) -> &str {
        match self {
            Choice::Known(o) => o.value,
            Choice::Raw(v) => v,
        }
    }
}

pub(crate) fn hydrate_choice(options: &[SelectOption], raw: &str) -> Choice {
    options
        .iter()
        .find(|o| o.value == raw)
        .map(|o| Choice::Known(*o))
        .unwrap_or_else(|| Choice::Raw(raw.to_string()))
}

pub(crate) fn persist_choice(choice: &Choice) -> String {
    choice.value().to_string()
}

pub(crate) type FormValues = BTreeMap<String, FieldValue>;

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum FieldValue {
    Text(String),
    Flag(bool),
    Choice(Option<Choice>),
    Group(FormValues),
    Rows(RowSet),
}

/// One row of a list attribute. `key` is a client-side identity only and
/// never reaches the stored attributes.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Row {
    pub key: String,
    pub values: FormValues,
}

#[derive(Clone, Debug, PartialEq, Default)]
pub(crate) struct RowSet {
    rows: Vec<Row>,
}

impl RowSet {
    fn hydrate(fields: &[FieldDescriptor], stored: Option<&Value>) -> Self {
        let rows = stored
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .map(|item| Row {
                        key: new_row_key(),
                        values: hydrate_object(fields, item.as_object()),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Self { rows }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Append a blank row and return its key.
    pub fn add_row(&mut self, fields: &[FieldDescriptor]) -> String {
        let key = new_row_key();
        self.rows.push(Row {
            key: key.clone(),
            values: blank(fields),
        });
        key
    }

    pub fn remove_row(&mut self, key: &str) -> bool {
        let before = self.rows.len();
        self.rows.retain(|r| r.key != key);
        self.rows.len() != before
    }

    pub fn set_field(&mut self, key: &str, name: &str, value: FieldValue) -> bool {
        match self.rows.iter_mut().find(|r| r.key == key) {
            Some(row) => {
                row.values.insert(name.to_string(), value);
                true
            }
            None => false,
        }
    }
}

fn new_row_key() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub(crate) enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },
    #[error("{field} expects a {expected} value")]
    WrongShape { field: String, expected: &'static str },
}

impl ValidationError {
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field } | ValidationError::WrongShape { field, .. } => {
                field
            }
        }
    }
}

/// Field-level errors keyed by path (`route`, `to.route`, `buttons.<row key>.label`).
#[derive(Clone, Debug, PartialEq, Eq, Default, Error)]
#[error("{} field(s) failed validation", .0.len())]
pub(crate) struct ValidationErrors(pub Vec<ValidationError>);

impl ValidationErrors {
    pub fn for_field(&self, path: &str) -> Option<&ValidationError> {
        self.0.iter().find(|e| e.field() == path)
    }
}

/// A blank form for `fields`.
pub(crate) fn blank(fields: &[FieldDescriptor]) -> FormValues {
    fields
        .iter()
        .map(|f| (f.name.to_string(), f.empty_value()))
        .collect()
}

/// Stored attributes to editing values.
pub(crate) fn hydrate(fields: &[FieldDescriptor], attributes: &Attributes) -> FormValues {
    hydrate_object(fields, Some(attributes))
}

fn hydrate_object(fields: &[FieldDescriptor], stored: Option<&Attributes>) -> FormValues {
    fields
        .iter()
        .map(|f| {
            let raw = stored.and_then(|m| m.get(f.name));
            (f.name.to_string(), hydrate_field(f, raw))
        })
        .collect()
}

fn hydrate_field(field: &FieldDescriptor, raw: Option<&Value>) -> FieldValue {
    match field.kind {
        FieldKind::Text | FieldKind::MultilineText => FieldValue::Text(match raw {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            _ => String::new(),
        }),
        FieldKind::Boolean => FieldValue::Flag(match raw {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s == "true",
            _ => false,
        }),
        FieldKind::Select(options) => {
            let stored = match raw {
                Some(Value::String(s)) => Some(s.as_str()),
                // Older editors persisted the whole option object.
                Some(Value::Object(o)) => o.get("value").and_then(Value::as_str),
                _ => None,
            };
            FieldValue::Choice(stored.map(|s| hydrate_choice(options, s)))
        }
        FieldKind::Group(fields) => FieldValue::Group(hydrate_object(fields, raw.and_then(Value::as_object))),
        FieldKind::List(fields) => FieldValue::Rows(RowSet::hydrate(fields, raw)),
    }
}

/// Editing values to stored attributes. Every field in `fields` is written;
/// missing values count as empty.
pub(crate) fn normalize(
    fields: &[FieldDescriptor],
    values: &FormValues,
) -> Result<Attributes, ValidationErrors> {
    let mut errors = Vec::new();
    let out = normalize_object(fields, values, "", &mut errors);
    if errors.is_empty() {
        Ok(out)
    } else {
        Err(ValidationErrors(errors))
    }
}

/// Overlay the normalized form on `existing`, keeping keys the schema does not know.
pub(crate) fn merge_attributes(
    existing: &Attributes,
    fields: &[FieldDescriptor],
    values: &FormValues,
) -> Result<Attributes, ValidationErrors> {
    let mut merged = existing.clone();
    merged.extend(normalize(fields, values)?);
    Ok(merged)
}

fn normalize_object(
    fields: &[FieldDescriptor],
    values: &FormValues,
    prefix: &str,
    errors: &mut Vec<ValidationError>,
) -> Attributes {
    let mut out = Attributes::new();
    for field in fields {
        let path = format!("{prefix}{}", field.name);
        let empty = field.empty_value();
        let value = values.get(field.name).unwrap_or(&empty);
        if let Some(v) = normalize_field(field, value, &path, errors) {
            out.insert(field.name.to_string(), v);
        }
    }
    out
}

fn normalize_field(
    field: &FieldDescriptor,
    value: &FieldValue,
    path: &str,
    errors: &mut Vec<ValidationError>,
) -> Option<Value> {
    let wrong_shape = |expected: &'static str, errors: &mut Vec<ValidationError>| {
        errors.push(ValidationError::WrongShape {
            field: path.to_string(),
            expected,
        });
        None
    };

    match (field.kind, value) {
        (FieldKind::Text | FieldKind::MultilineText, FieldValue::Text(s)) => {
            if field.required && s.trim().is_empty() {
                errors.push(ValidationError::Required {
                    field: path.to_string(),
                });
            }
            Some(Value::String(s.clone()))
        }
        (FieldKind::Boolean, FieldValue::Flag(b)) => Some(Value::Bool(*b)),
        (FieldKind::Select(_), FieldValue::Choice(choice)) => match choice {
            Some(c) => Some(Value::String(persist_choice(c))),
            None => {
                if field.required {
                    errors.push(ValidationError::Required {
                        field: path.to_string(),
                    });
                }
                Some(Value::Null)
            }
        },
        (FieldKind::Group(fields), FieldValue::Group(inner)) => Some(Value::Object(
            normalize_object(fields, inner, &format!("{path}."), errors),
        )),
        (FieldKind::List(fields), FieldValue::Rows(rows)) => Some(Value::Array(
            rows.rows()
                .iter()
                .map(|row| {
                    Value::Object(normalize_object(
                        fields,
                        &row.values,
                        &format!("{path}.{}.", row.key),
                        errors,
                    ))
                })
                .collect(),
        )),
        (FieldKind::Text | FieldKind::MultilineText, _) => wrong_shape("text", errors),
        (FieldKind::Boolean, _) => wrong_shape("boolean", errors),
        (FieldKind::Select(_), _) => wrong_shape("choice", errors),
        (FieldKind::Group(_), _) => wrong_shape("group", errors),
        (FieldKind::List(_), _) => wrong_shape("list", errors),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attrs(v: Value) -> Attributes {
        v.as_object().cloned().expect("object")
    }

    fn select_fields(fields: &'static [FieldDescriptor], out: &mut Vec<&'static [SelectOption]>) {
        for f in fields {
            match f.kind {
                FieldKind::Select(options) => out.push(options),
                FieldKind::Group(inner) | FieldKind::List(inner) => select_fields(inner, out),
                _ => {}
            }
        }
    }

    #[test]
    fn test_schema_per_kind() {
        let names = |kind: NodeKind| -> Vec<&'static str> {
            resolve_schema(&kind).iter().map(|f| f.name).collect()
        };
        assert_eq!(names(NodeKind::Text), vec!["text"]);
        assert_eq!(resolve_schema(&NodeKind::Text)[0].kind, FieldKind::MultilineText);
        assert_eq!(names(NodeKind::TextInput), vec!["name", "label", "placeholder"]);
        assert_eq!(
            names(NodeKind::Table),
            vec!["route", "search", "buttons", "headers", "actions"]
        );
        assert!(resolve_schema(&NodeKind::Outlet).is_empty());
        assert!(resolve_schema(&NodeKind::Unknown("card".to_string())).is_empty());
        assert_eq!(names(NodeKind::Container).len(), 12);

        let to = resolve_schema(&NodeKind::Button)
            .iter()
            .find(|f| f.name == "to")
            .expect("button navigation target");
        assert_eq!(to.kind, FieldKind::Group(NAV_TARGET_FIELDS));
    }

    #[test]
    fn test_table_tabs_cover_table_schema() {
        use strum::IntoEnumIterator;
        let from_tabs: Vec<&str> = TableTab::iter()
            .flat_map(|t| t.fields().iter().map(|f| f.name))
            .collect();
        let full: Vec<&str> = resolve_schema(&NodeKind::Table).iter().map(|f| f.name).collect();
        assert_eq!(from_tabs, full);
        assert_eq!(TableTab::Headers.to_string(), "headers");
    }

    #[test]
    fn test_enum_fields_round_trip() {
        let mut all = Vec::new();
        for kind in NodeKind::CREATABLE {
            select_fields(resolve_schema(&kind), &mut all);
        }
        assert!(!all.is_empty());

        for options in all {
            for o in options {
                let persisted = o.value.to_string();
                let hydrated = hydrate_choice(options, &persisted);
                assert_eq!(hydrated, Choice::Known(*o));
                let again = persist_choice(&hydrated);
                assert_eq!(again, persisted);
                assert_eq!(persist_choice(&hydrate_choice(options, &again)), persisted);
            }

            let legacy = hydrate_choice(options, "legacy-value");
            assert_eq!(legacy, Choice::Raw("legacy-value".to_string()));
            assert_eq!(persist_choice(&legacy), "legacy-value");
        }
    }

    #[test]
    fn test_hydrate_then_normalize_keeps_stored_values() {
        let fields = resolve_schema(&NodeKind::Button);
        let stored = attrs(json!({
            "label": "Save",
            "alternativeLabel": "",
            "buttonKind": "submit",
            "action": "teleport",
            "to": {"route": "/users", "isExternal": true}
        }));

        let values = hydrate(fields, &stored);
        assert_eq!(
            values.get("buttonKind"),
            Some(&FieldValue::Choice(Some(Choice::Known(opt("submit")))))
        );
        assert_eq!(
            values.get("action"),
            Some(&FieldValue::Choice(Some(Choice::Raw("teleport".to_string()))))
        );

        let out = normalize(fields, &values).expect("valid");
        assert_eq!(Value::Object(out), Value::Object(stored));
    }

    #[test]
    fn test_hydrate_accepts_legacy_shapes() {
        let values = hydrate(
            resolve_schema(&NodeKind::Container),
            &attrs(json!({"flex": 1, "direction": {"value": "column", "label": "column"}})),
        );
        assert_eq!(values.get("flex"), Some(&FieldValue::Text("1".to_string())));
        assert_eq!(
            values.get("direction"),
            Some(&FieldValue::Choice(Some(Choice::Known(opt("column")))))
        );
        assert_eq!(values.get("padding"), Some(&FieldValue::Text(String::new())));
    }

    #[test]
    fn test_required_table_route() {
        let fields = TableTab::Details.fields();
        let mut values = blank(fields);
        let err = normalize(fields, &values).expect_err("route is required");
        assert_eq!(
            err.for_field("route"),
            Some(&ValidationError::Required {
                field: "route".to_string()
            })
        );

        values.insert("route".to_string(), FieldValue::Text("/api/users".to_string()));
        let out = normalize(fields, &values).expect("valid");
        assert_eq!(out.get("route"), Some(&json!("/api/users")));
        assert_eq!(out.get("search"), Some(&json!(false)));
    }

    #[test]
    fn test_wrong_shape_is_reported_with_path() {
        let fields = resolve_schema(&NodeKind::Button);
        let mut values = blank(fields);
        let mut to = blank(NAV_TARGET_FIELDS);
        to.insert("isExternal".to_string(), FieldValue::Text("yes".to_string()));
        values.insert("to".to_string(), FieldValue::Group(to));

        let err = normalize(fields, &values).expect_err("shape mismatch");
        assert_eq!(
            err.0,
            vec![ValidationError::WrongShape {
                field: "to.isExternal".to_string(),
                expected: "boolean"
            }]
        );
    }

    #[test]
    fn test_rows_keep_order_and_drop_keys() {
        let fields = TableTab::Headers.fields();
        let stored = attrs(json!({
            "headers": [
                {"label": "Name", "dataIndex": "name"},
                {"label": "Email", "dataIndex": "email"}
            ]
        }));
        let mut values = hydrate(fields, &stored);
        let Some(FieldValue::Rows(rows)) = values.get_mut("headers") else {
            panic!("headers should hydrate as rows");
        };
        assert_eq!(rows.rows().len(), 2);
        assert_ne!(rows.rows()[0].key, rows.rows()[1].key);

        let first = rows.rows()[0].key.clone();
        let added = rows.add_row(TABLE_HEADER_ROW);
        assert!(rows.set_field(&added, "label", FieldValue::Text("Role".to_string())));
        assert!(rows.set_field(&added, "dataIndex", FieldValue::Text("role".to_string())));
        assert!(rows.remove_row(&first));
        assert!(!rows.remove_row(&first));

        let out = normalize(fields, &values).expect("valid");
        assert_eq!(
            out.get("headers"),
            Some(&json!([
                {"label": "Email", "dataIndex": "email"},
                {"label": "Role", "dataIndex": "role"}
            ]))
        );
    }

    #[test]
    fn test_merge_keeps_unknown_keys() {
        let existing = attrs(json!({"text": "old", "legacyColor": "red"}));
        let fields = resolve_schema(&NodeKind::Heading);
        let mut values = hydrate(fields, &existing);
        values.insert("text".to_string(), FieldValue::Text("new".to_string()));

        let merged = merge_attributes(&existing, fields, &values).expect("valid");
        assert_eq!(Value::Object(merged), json!({"text": "new", "legacyColor": "red"}));
    }
}
