//! Bucket policy generation and override merging

use serde_json::{Map, Value, json};

/// Public-read policy applied to every website bucket
pub fn default_policy(bucket: &str) -> Value {
    json!({
        "Version": "2012-10-17",
        "Statement": [
            {
                "Sid": "PublicReadGetObject",
                "Effect": "Allow",
                "Principal": { "AWS": "*" },
                "Action": ["s3:GetObject"],
                "Resource": [format!("arn:aws:s3:::{bucket}/*")]
            }
        ]
    })
}

/// Deep-merge `overrides` into `base`.
///
/// Objects merge key by key and the override wins on conflicts. Arrays of
/// objects (e.g. `Statement`) merge element-wise with extra override
/// elements appended. Any other array is replaced as a whole.
pub fn merge_policy(base: &Value, overrides: &Value) -> Value {
    match (base, overrides) {
        (Value::Object(base), Value::Object(overrides)) => {
            let mut merged: Map<String, Value> = base.clone();
            for (key, value) in overrides {
                let next = match merged.get(key) {
                    Some(existing) => merge_policy(existing, value),
                    None => value.clone(),
                };
                merged.insert(key.clone(), next);
            }
            Value::Object(merged)
        }
        (Value::Array(base), Value::Array(overrides))
            if all_objects(base) && all_objects(overrides) =>
        {
            let mut merged = Vec::with_capacity(base.len().max(overrides.len()));
            for i in 0..base.len().max(overrides.len()) {
                match (base.get(i), overrides.get(i)) {
                    (Some(b), Some(o)) => merged.push(merge_policy(b, o)),
                    (Some(v), None) | (None, Some(v)) => merged.push(v.clone()),
                    (None, None) => {}
                }
            }
            Value::Array(merged)
        }
        (_, overrides) => overrides.clone(),
    }
}

fn all_objects(values: &[Value]) -> bool {
    !values.is_empty() && values.iter().all(Value::is_object)
}

/// Policy actually written to the bucket
pub fn effective_policy(bucket: &str, overrides: Option<&Value>) -> Value {
    let base = default_policy(bucket);
    match overrides {
        Some(overrides) => merge_policy(&base, overrides),
        None => base,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_shape() {
        let policy = default_policy("my-site");
        assert_eq!(policy["Version"], "2012-10-17");
        let statement = &policy["Statement"][0];
        assert_eq!(statement["Sid"], "PublicReadGetObject");
        assert_eq!(statement["Principal"]["AWS"], "*");
        assert_eq!(statement["Resource"][0], "arn:aws:s3:::my-site/*");
    }

    #[test]
    fn test_statement_override_keeps_other_fields() {
        let merged = effective_policy("my-site", Some(&json!({"Statement": [{"Principal": "*"}]})));
        let statement = &merged["Statement"][0];
        assert_eq!(statement["Principal"], "*");
        assert_eq!(statement["Sid"], "PublicReadGetObject");
        assert_eq!(statement["Effect"], "Allow");
        assert_eq!(statement["Action"], json!(["s3:GetObject"]));
        assert_eq!(merged["Statement"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_scalar_arrays_are_replaced() {
        let merged = effective_policy(
            "my-site",
            Some(&json!({"Statement": [{"Action": ["s3:GetObject", "s3:ListBucket"]}]})),
        );
        assert_eq!(
            merged["Statement"][0]["Action"],
            json!(["s3:GetObject", "s3:ListBucket"])
        );
    }

    #[test]
    fn test_extra_statements_are_appended() {
        let merged = effective_policy(
            "my-site",
            Some(&json!({"Statement": [{}, {"Sid": "Deny", "Effect": "Deny"}]})),
        );
        let statements = merged["Statement"].as_array().unwrap();
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0]["Sid"], "PublicReadGetObject");
        assert_eq!(statements[1]["Sid"], "Deny");
    }

    #[test]
    fn test_top_level_scalar_override() {
        let merged = effective_policy("my-site", Some(&json!({"Version": "2008-10-17"})));
        assert_eq!(merged["Version"], "2008-10-17");
        assert!(merged["Statement"].is_array());
    }
}
