use std::sync::Arc;

/// A zero-argument factory that lazily produces a service instance.
///
/// Registries invoke a provider on first lookup and cache what it returns;
/// returning `None` means "not available yet" and nothing is cached, so the
/// provider may be asked again on a later lookup.
///
/// Implemented for every `Fn() -> Option<Arc<T>>` closure:
///
/// ```rust,ignore
/// registry.register_provider::<PluginConfig, _>(move || {
///     let configs = global.get::<ConfigService>()?;
///     configs.for_plugin(&plugin_id).ok()
/// });
/// ```
pub trait ServiceProvider<T: ?Sized>: Send + Sync {
    /// Produces the service instance, or `None` if it cannot be built now.
    fn provide(&self) -> Option<Arc<T>>;
}

impl<T, F> ServiceProvider<T> for F
where
    T: ?Sized,
    F: Fn() -> Option<Arc<T>> + Send + Sync,
{
    fn provide(&self) -> Option<Arc<T>> {
        self()
    }
}
