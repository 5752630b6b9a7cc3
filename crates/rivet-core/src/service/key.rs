use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identifies a service contract in a registry.
///
/// Produced once per distinct type with [`ServiceKey::of`].  Equality and
/// hashing use the [`TypeId`] only; the type name is carried for logs and
/// error messages.
#[derive(Clone, Copy)]
pub struct ServiceKey {
    id: TypeId,
    name: &'static str,
}

impl ServiceKey {
    /// Returns the key for service contract `T`.
    ///
    /// `T` may be unsized, so `ServiceKey::of::<dyn GreetingService>()` and
    /// `ServiceKey::of::<EnglishGreeting>()` are two different keys.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Returns the underlying [`TypeId`].
    pub fn type_id(&self) -> TypeId {
        self.id
    }

    /// Returns the contract's type name.
    pub fn type_name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for ServiceKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ServiceKey {}

impl Hash for ServiceKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ServiceKey").field(&self.name).finish()
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
