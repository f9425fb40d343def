use super::VisitMut;
use crate::value::{Object, Value};

/// Recursively visit all [Object]s mutably, parents before children
pub trait VisitObjectsMut {
    fn visit_objects_mut(&mut self, visitor: &mut dyn VisitMut<Object>);
}

impl VisitObjectsMut for Value {
    fn visit_objects_mut(&mut self, visitor: &mut dyn VisitMut<Object>) {
        walk(self, None, visitor);
    }
}

impl VisitObjectsMut for Object {
    fn visit_objects_mut(&mut self, visitor: &mut dyn VisitMut<Object>) {
        walk_object(self, None, visitor);
    }
}

fn walk(value: &mut Value, inherited: Option<&str>, visitor: &mut dyn VisitMut<Object>) {
    match value {
        Value::Array(items) => {
            for item in items {
                walk(item, inherited, visitor);
            }
        }
        Value::Object(object) => walk_object(object, inherited, visitor),
        _ => {}
    }
}

fn walk_object(object: &mut Object, inherited: Option<&str>, visitor: &mut dyn VisitMut<Object>) {
    let own_type = object
        .get("type")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .map(str::to_owned);
    let current = own_type.as_deref().or(inherited);

    visitor.visit_mut(current, object);

    for child in object.values_mut() {
        walk(child, current, visitor);
    }
}
