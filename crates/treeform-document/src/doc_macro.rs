/// Builds a [`Value`](crate::Value) from JSON-like literal syntax.
///
/// Map keys are string literals. Negative numbers and other multi-token
/// expressions must be parenthesized so they stay a single token tree.
///
/// ```
/// use treeform_document::{doc, Value};
///
/// let value = doc!({
///     "name": "Alice",
///     "age": 30,
///     "offset": (-4),
///     "tags": ["a", "b"],
///     "manager": null,
/// });
/// assert_eq!(value.get("age"), Some(&Value::from(30)));
/// assert!(value.get("manager").unwrap().is_null());
/// ```
#[macro_export]
macro_rules! doc {
    (null) => {
        $crate::Value::Null
    };
    ([ $($elem:tt),* $(,)? ]) => {
        $crate::Value::Array(::std::vec![ $( $crate::doc!($elem) ),* ])
    };
    ({ $($key:literal : $value:tt),* $(,)? }) => {{
        #[allow(unused_mut)]
        let mut map = $crate::Map::new();
        $(
            map.insert(::std::string::String::from($key), $crate::doc!($value));
        )*
        $crate::Value::Map(map)
    }};
    (( $inner:expr )) => {
        $crate::Value::from($inner)
    };
    ($other:expr) => {
        $crate::Value::from($other)
    };
}

#[cfg(test)]
mod tests {
    use crate::{Map, Value};

    #[test]
    fn test_scalars() {
        assert_eq!(doc!(null), Value::Null);
        assert_eq!(doc!(true), Value::Bool(true));
        assert_eq!(doc!("hi"), Value::Text("hi".to_string()));
        assert_eq!(doc!(-3), Value::from(-3));
    }

    #[test]
    fn test_parenthesized_values() {
        let offset = 4;
        let value = doc!({ "offset": (-offset), "items": [(1 + 1)] });
        assert_eq!(value.get("offset"), Some(&Value::from(-4)));
        assert_eq!(value.get("items"), Some(&Value::Array(vec![Value::from(2)])));
    }

    #[test]
    fn test_nested() {
        let value = doc!({ "a": [1, { "b": null }], "c": {} });
        let mut inner = Map::new();
        inner.insert("b".to_string(), Value::Null);
        let mut expected = Map::new();
        expected.insert(
            "a".to_string(),
            Value::Array(vec![Value::from(1), Value::Map(inner)]),
        );
        expected.insert("c".to_string(), Value::Map(Map::new()));
        assert_eq!(value, Value::Map(expected));
    }
}
