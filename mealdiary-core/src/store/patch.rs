use serde_json::Value;

/// Merges `partial` into `target`, recursing where both sides are objects.
///
/// Non-object values in `partial` replace what is in `target`.
pub fn merge_json(target: &mut Value, partial: Value) {
    match (target, partial) {
        (Value::Object(target), Value::Object(partial)) => {
            for (key, value) in partial {
                let nested = value.is_object() && target.get(&key).is_some_and(Value::is_object);
                if !nested {
                    target.insert(key, value);
                } else if let Some(existing) = target.get_mut(&key) {
                    merge_json(existing, value);
                }
            }
        }
        (target, partial) => *target = partial,
    }
}

/// Replaces top-level fields of `target` with those of `patch`.
pub fn apply_update(target: &mut Value, patch: Value) {
    match (target, patch) {
        (Value::Object(target), Value::Object(patch)) => {
            for (key, value) in patch {
                target.insert(key, value);
            }
        }
        (target, patch) => *target = patch,
    }
}
