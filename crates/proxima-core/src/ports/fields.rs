use crate::models::FieldDescriptor;

/// Port for custom field metadata
pub trait FieldResolver: Send + Sync {
    /// Find a field by its handle
    fn field_by_handle(&self, handle: &str) -> Option<FieldDescriptor>;
}

impl<T: FieldResolver + ?Sized> FieldResolver for Box<T> {
    fn field_by_handle(&self, handle: &str) -> Option<FieldDescriptor> {
        (**self).field_by_handle(handle)
    }
}
