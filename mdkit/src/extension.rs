use std::sync::Arc;

use crate::environment::EnvironmentBuilder;

/// A bundle of rules registered together.
///
/// Registration is deferred: `register` runs once, when the environment
/// freezes, and receives the builder through which the extension adds its
/// parsers, renderers, delimiter processors, listeners and further
/// extensions.
pub trait Extension: Send + Sync {
  fn register(&self, environment: &mut EnvironmentBuilder);

  /// Name used in log messages.
  fn name(&self) -> &str {
    std::any::type_name::<Self>()
  }
}

impl<T: Extension + ?Sized> Extension for Arc<T> {
  fn register(&self, environment: &mut EnvironmentBuilder) {
    (**self).register(environment);
  }

  fn name(&self) -> &str {
    (**self).name()
  }
}

impl<T: Extension + ?Sized> Extension for Box<T> {
  fn register(&self, environment: &mut EnvironmentBuilder) {
    (**self).register(environment);
  }

  fn name(&self) -> &str {
    (**self).name()
  }
}
