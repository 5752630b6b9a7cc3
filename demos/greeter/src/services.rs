//! Contracts shared between the host and the demo plugins.

/// Registered globally by the host; plugins may shadow it in their scope.
pub trait GreetingService: Send + Sync {
    fn greet(&self, name: &str) -> String;
}

pub struct DefaultGreetingService;

impl GreetingService for DefaultGreetingService {
    fn greet(&self, name: &str) -> String {
        format!("Hello, {name}!")
    }
}

/// Extension point: something that can say hello.
pub trait Greeter: Send + Sync {
    fn greet(&self) -> String;
}

/// Published on the host event bus whenever a greeter runs.
#[derive(Debug, Clone)]
pub struct Greeted {
    pub by: String,
    pub message: String,
}
