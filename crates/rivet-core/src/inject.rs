//! Field injection.
//!
//! A type opts in by deriving [`Injectable`](macro@crate::Injectable) and
//! marking `Option<Arc<T>>` fields with `#[inject]`:
//!
//! ```rust,ignore
//! #[derive(Default, Injectable)]
//! struct WelcomePlugin {
//!     #[inject]
//!     greeting: Option<Arc<dyn GreetingService>>,
//!     #[inject(optional)]
//!     events: Option<Arc<EventBus>>,
//!     visits: u32, // left alone
//! }
//!
//! let mut plugin = WelcomePlugin::default();
//! Injector::new(registry).inject(&mut plugin)?;
//! ```
//!
//! The derive produces a static table of [`InjectionPoint`]s plus a
//! field-setter, so no runtime reflection is involved.

use std::sync::Arc;

use tracing::trace;

use crate::error::InjectionError;
use crate::service::{ServiceArc, ServiceKey, ServiceRegistry};

/// One injectable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InjectionPoint {
    /// Field name.
    pub field: &'static str,
    /// Service contract the field holds.
    pub service: ServiceKey,
    /// Whether a missing service fails injection.
    pub required: bool,
}

impl InjectionPoint {
    pub const fn new(field: &'static str, service: ServiceKey, required: bool) -> Self {
        Self {
            field,
            service,
            required,
        }
    }
}

/// A value whose marked fields can be filled from a registry.
///
/// Usually derived. Hand-written impls must keep `injection_points` in a
/// stable order and make `inject_field` return `false` for unknown fields
/// or values of the wrong type.
pub trait Injectable {
    /// Marked fields, in declaration order.
    fn injection_points(&self) -> Vec<InjectionPoint>;

    /// Stores `service` (an erased `Arc<T>`) into `field`.
    fn inject_field(&mut self, field: &str, service: &ServiceArc) -> bool;
}

/// Populates [`Injectable`] targets from a registry.
#[derive(Clone)]
pub struct Injector {
    registry: Arc<dyn ServiceRegistry>,
}

impl Injector {
    pub fn new(registry: Arc<dyn ServiceRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<dyn ServiceRegistry> {
        &self.registry
    }

    /// Fills every marked field of `target` in declaration order.
    ///
    /// Stops at the first required field whose service is missing. Fields
    /// assigned before that point keep their values. `T` may be a trait
    /// object such as `dyn Injectable` or any trait that extends it.
    pub fn inject<T>(&self, target: &mut T) -> Result<(), InjectionError>
    where
        T: Injectable + ?Sized,
    {
        for point in target.injection_points() {
            let Some(service) = self.registry.lookup(point.service) else {
                if point.required {
                    return Err(InjectionError::MissingService {
                        field: point.field,
                        service: point.service.type_name(),
                    });
                }
                trace!(field = point.field, service = %point.service, "Optional service absent");
                continue;
            };

            if !target.inject_field(point.field, &service) {
                return Err(InjectionError::Assignment {
                    field: point.field,
                    service: point.service.type_name(),
                });
            }
            trace!(field = point.field, service = %point.service, "Injected service");
        }
        Ok(())
    }
}

impl std::fmt::Debug for Injector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Injector").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Injectable;
    use crate::service::{DefaultServiceRegistry, ServiceRegistryExt};

    trait Greeting: Send + Sync {
        fn greet(&self) -> &'static str;
    }

    struct English;
    impl Greeting for English {
        fn greet(&self) -> &'static str {
            "hello"
        }
    }

    struct Clock;

    #[derive(Default, Injectable)]
    struct Target {
        #[inject]
        greeting: Option<Arc<dyn Greeting>>,
        #[inject(optional)]
        clock: Option<Arc<Clock>>,
        untouched: u32,
    }

    #[derive(Default, Injectable)]
    struct TwoRequired {
        #[inject]
        greeting: Option<Arc<dyn Greeting>>,
        #[inject(required = true)]
        clock: Option<Arc<Clock>>,
    }

    #[derive(Injectable)]
    struct Nothing;

    fn registry() -> Arc<dyn ServiceRegistry> {
        Arc::new(DefaultServiceRegistry::new())
    }

    #[test]
    fn test_points_follow_declaration_order() {
        let points = Target::default().injection_points();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].field, "greeting");
        assert_eq!(points[0].service, ServiceKey::of::<dyn Greeting>());
        assert!(points[0].required);
        assert_eq!(points[1].field, "clock");
        assert!(!points[1].required);
    }

    #[test]
    fn test_injects_present_services() {
        let registry = registry();
        registry.register::<dyn Greeting>(Arc::new(English));
        registry.register(Arc::new(Clock));

        let mut target = Target::default();
        Injector::new(registry).inject(&mut target).unwrap();

        assert_eq!(target.greeting.unwrap().greet(), "hello");
        assert!(target.clock.is_some());
        assert_eq!(target.untouched, 0);
    }

    #[test]
    fn test_optional_absent_left_none() {
        let registry = registry();
        registry.register::<dyn Greeting>(Arc::new(English));

        let mut target = Target::default();
        Injector::new(registry).inject(&mut target).unwrap();
        assert!(target.greeting.is_some());
        assert!(target.clock.is_none());
    }

    #[test]
    fn test_required_absent_fails_with_field_and_type() {
        let mut target = Target::default();
        let err = Injector::new(registry()).inject(&mut target).unwrap_err();

        match err {
            InjectionError::MissingService { field, service } => {
                assert_eq!(field, "greeting");
                assert!(service.contains("Greeting"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_no_rollback_of_earlier_fields() {
        let registry = registry();
        registry.register::<dyn Greeting>(Arc::new(English));

        let mut target = TwoRequired::default();
        let err = Injector::new(registry).inject(&mut target).unwrap_err();

        assert!(matches!(err, InjectionError::MissingService { field: "clock", .. }));
        assert!(target.greeting.is_some());
    }

    #[test]
    fn test_unit_struct_has_no_points() {
        let mut nothing = Nothing;
        assert!(nothing.injection_points().is_empty());
        Injector::new(registry()).inject(&mut nothing).unwrap();
    }

    struct Refuses;

    impl Injectable for Refuses {
        fn injection_points(&self) -> Vec<InjectionPoint> {
            vec![InjectionPoint::new("slot", ServiceKey::of::<Clock>(), true)]
        }

        fn inject_field(&mut self, _field: &str, _service: &ServiceArc) -> bool {
            false
        }
    }

    #[test]
    fn test_refused_assignment_is_reported() {
        let registry = registry();
        registry.register(Arc::new(Clock));

        let err = Injector::new(registry).inject(&mut Refuses).unwrap_err();
        assert!(matches!(err, InjectionError::Assignment { field: "slot", .. }));
    }
}
