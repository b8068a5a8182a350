use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;

use crate::interpreter::ast_walk::Value;

// {"type": ..., "value": ...}. A pair chain is flattened: "value" holds the
// elements and an improper chain adds its last cdr as "tail".
impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let fields = match self {
            Value::Empty => 1,
            Value::Pair(_) if !self.is_list() => 3,
            _ => 2,
        };
        let mut state = serializer.serialize_struct("Value", fields)?;
        match self {
            Value::Pair(_) => {
                state.serialize_field("type", "pair")?;
                let mut iter = self.iter();
                let items: Vec<&Value> = iter.by_ref().collect();
                state.serialize_field("value", &items)?;
                match iter.tail() {
                    Value::Empty => state.skip_field("tail")?,
                    tail => state.serialize_field("tail", tail)?,
                }
            }
            Value::Integer(i) => {
                state.serialize_field("type", "integer")?;
                state.serialize_field("value", i)?;
            }
            Value::Text(bytes) => {
                state.serialize_field("type", "text")?;
                state.serialize_field("value", &String::from_utf8_lossy(bytes))?;
            }
            Value::Symbol(name) => {
                state.serialize_field("type", "symbol")?;
                state.serialize_field("value", &**name)?;
            }
            Value::Boolean(b) => {
                state.serialize_field("type", "boolean")?;
                state.serialize_field("value", b)?;
            }
            Value::Empty => state.serialize_field("type", "empty")?,
            Value::Closure(closure) => {
                state.serialize_field("type", "closure")?;
                let params: Vec<&str> = closure.params.iter().map(|p| &**p).collect();
                state.serialize_field("value", &params)?;
            }
            Value::Primitive(primitive) => {
                state.serialize_field("type", "primitive")?;
                state.serialize_field("value", primitive.name)?;
            }
        }
        state.end()
    }
}

pub fn to_json(value: &Value) -> Result<String, serde_json::Error> { serde_json::to_string(value) }

pub fn to_json_pretty(value: &Value) -> Result<String, serde_json::Error> { serde_json::to_string_pretty(value) }
