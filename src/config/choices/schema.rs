use anyhow::{Context, Result, anyhow, bail};
use schemars::Schema;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    Number,
    Boolean,
    Array,
}

/// Flattened description of one estimator parameter.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: String,
    pub title: String,
    pub description: Option<String>,
    pub required: bool,
    pub kind: FieldKind,
    pub default: Option<Value>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Lists the `params` fields of the branch tagged `kind_key` in a tagged
/// enum schema.
pub fn parameter_specs(root: &Schema, kind_key: &str) -> Result<Vec<FieldSpec>> {
    let root_obj = root.as_object().context("root schema is not an object")?;

    let branches = root_obj
        .get("oneOf")
        .or_else(|| root_obj.get("anyOf"))
        .and_then(Value::as_array)
        .context("missing oneOf/anyOf")?;

    let branch = branches
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|b| b.get("properties").and_then(Value::as_object))
        .find(|props| tag_matches(props, kind_key))
        .ok_or_else(|| anyhow!("no branch found for type={kind_key}"))?;

    let Some(params) = branch.get("params").and_then(Value::as_object) else {
        return Ok(vec![]);
    };
    let params = resolve_ref(root_obj, params)
        .with_context(|| format!("unresolvable params $ref for {kind_key}"))?;
    let Some(props) = params.get("properties").and_then(Value::as_object) else {
        return Ok(vec![]);
    };

    let required: Vec<&str> = params
        .get("required")
        .and_then(Value::as_array)
        .map(|a| a.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let mut out = Vec::with_capacity(props.len());
    for (name, field) in props {
        let field = field
            .as_object()
            .with_context(|| format!("field schema for '{name}' is not an object"))?;
        let field = resolve_ref(root_obj, field)
            .ok_or_else(|| anyhow!("failed to resolve field $ref for '{name}'"))?;

        let Some(kind) = field_kind(field.get("type")) else {
            bail!("field '{name}' has no supported type");
        };

        out.push(FieldSpec {
            name: name.clone(),
            title: field
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or(name)
                .to_string(),
            description: field
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string),
            required: required.contains(&name.as_str()),
            kind,
            default: field.get("default").cloned(),
            min: field
                .get("minimum")
                .or_else(|| field.get("exclusiveMinimum"))
                .and_then(Value::as_f64),
            max: field
                .get("maximum")
                .or_else(|| field.get("exclusiveMaximum"))
                .and_then(Value::as_f64),
        });
    }
    Ok(out)
}

fn tag_matches(props: &Map<String, Value>, kind_key: &str) -> bool {
    let Some(tag) = props.get("type").and_then(Value::as_object) else {
        return false;
    };
    if tag.get("const").and_then(Value::as_str) == Some(kind_key) {
        return true;
    }
    matches!(
        tag.get("enum").and_then(Value::as_array).map(Vec::as_slice),
        Some([only]) if only.as_str() == Some(kind_key)
    )
}

/// Follows a local `#/...` reference; objects without `$ref` resolve to themselves.
fn resolve_ref<'a>(
    root: &'a Map<String, Value>,
    obj: &'a Map<String, Value>,
) -> Option<&'a Map<String, Value>> {
    let Some(Value::String(r)) = obj.get("$ref") else {
        return Some(obj);
    };
    let mut cur = root;
    for seg in r.strip_prefix("#/")?.split('/') {
        let seg = seg.replace("~1", "/").replace("~0", "~");
        cur = cur.get(&seg)?.as_object()?;
    }
    Some(cur)
}

fn field_kind(ty: Option<&Value>) -> Option<FieldKind> {
    let named = |s: &str| match s {
        "integer" => Some(FieldKind::Integer),
        "number" => Some(FieldKind::Number),
        "boolean" => Some(FieldKind::Boolean),
        "array" => Some(FieldKind::Array),
        _ => None,
    };
    match ty {
        Some(Value::String(s)) => named(s),
        // Option<T> shows up as ["T", "null"]
        Some(Value::Array(arr)) => arr.iter().filter_map(Value::as_str).find_map(named),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::choices::{Choice, EstimatorChoice};

    fn spec<'a>(specs: &'a [FieldSpec], name: &str) -> &'a FieldSpec {
        specs.iter().find(|s| s.name == name).unwrap()
    }

    #[test]
    fn ema_fields_are_described() {
        let root = EstimatorChoice::schema();
        let specs = parameter_specs(&root, "ema").unwrap();
        assert_eq!(specs.len(), 3);

        let rate = spec(&specs, "decay_rate");
        assert_eq!(rate.kind, FieldKind::Number);
        assert_eq!(rate.title, "Decay rate");
        assert_eq!(rate.min, Some(0.0));
        assert_eq!(rate.max, Some(1.0));
        assert_eq!(rate.default.as_ref().and_then(Value::as_f64), Some(0.025));

        let dim = spec(&specs, "dimension");
        assert_eq!(dim.kind, FieldKind::Integer);
        assert_eq!(dim.min, Some(1.0));

        assert_eq!(spec(&specs, "bootstrap_count").kind, FieldKind::Integer);
    }

    #[test]
    fn partial_moment_target_is_array() {
        let root = EstimatorChoice::schema();
        let specs = parameter_specs(&root, "partial-moment").unwrap();
        let target = spec(&specs, "target");
        assert_eq!(target.kind, FieldKind::Array);
        assert!(!target.required);
    }

    #[test]
    fn unknown_kind_is_an_error() {
        let root = EstimatorChoice::schema();
        let err = parameter_specs(&root, "garch").unwrap_err();
        assert!(err.to_string().contains("garch"));
    }
}
