//! visitor pattern helpers
mod visit_objects;
pub use visit_objects::VisitObjectsMut;

/// Visitor that visits is subjects mutably
///
/// `resource_type` is the `type` of the object itself, or the nearest ancestor's when the object has none.
pub trait VisitMut<T> {
    fn visit_mut(&mut self, resource_type: Option<&str>, value: &mut T);
}

// blanket impl for FnMut
impl<T, F> VisitMut<T> for F
where
    F: FnMut(Option<&str>, &mut T),
{
    fn visit_mut(&mut self, resource_type: Option<&str>, value: &mut T) {
        self(resource_type, value)
    }
}
