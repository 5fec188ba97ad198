//! The document node model as seen by the environment.
//!
//! The environment never inspects nodes. It only needs a class identifier to
//! pick renderers, and an ancestry relation so a renderer registered for a
//! general class also handles its more specific subclasses.
use std::{any::Any, borrow::Cow, collections::HashMap, fmt};

/// Identifies the class of a document node, used as the renderer dispatch
/// key.
///
/// The set is open: extensions introduce their own classes next to the ones
/// the core grammar defines.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(Cow<'static, str>);

impl ClassId {
  #[must_use]
  pub const fn from_static(name: &'static str) -> Self {
    Self(Cow::Borrowed(name))
  }

  /// Class identifier derived from a Rust type name.
  #[must_use]
  pub fn of<T: ?Sized>() -> Self {
    Self::from_static(std::any::type_name::<T>())
  }

  #[must_use]
  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl From<&'static str> for ClassId {
  fn from(name: &'static str) -> Self {
    Self::from_static(name)
  }
}

impl From<String> for ClassId {
  fn from(name: String) -> Self {
    Self(Cow::Owned(name))
  }
}

impl fmt::Display for ClassId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// A node of the parsed document.
pub trait Node: fmt::Debug + Send + Sync + 'static {
  fn class_id(&self) -> ClassId;

  /// Access the concrete node, so renderers can downcast.
  fn as_any(&self) -> &dyn Any;
}

/// Answers "is `class` a kind of `ancestor`?" for renderer lookups.
///
/// Implementations must be reflexive: every class is a kind of itself.
pub trait ClassHierarchy: Send + Sync {
  fn is_a(&self, class: &ClassId, ancestor: &ClassId) -> bool;
}

/// Flat hierarchy: a class is only a kind of itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactClass;

impl ClassHierarchy for ExactClass {
  fn is_a(&self, class: &ClassId, ancestor: &ClassId) -> bool {
    class == ancestor
  }
}

/// Hierarchy built from explicit child to parent links.
///
/// # Examples
///
/// ```
/// use mdkit::{ClassHierarchy, ClassId, ClassTree};
///
/// let tree = ClassTree::new()
///   .with_parent("fenced_code", "code_block")
///   .with_parent("code_block", "block");
///
/// assert!(tree.is_a(&"fenced_code".into(), &"block".into()));
/// assert!(!tree.is_a(&"block".into(), &"code_block".into()));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ClassTree {
  parents: HashMap<ClassId, ClassId>,
}

impl ClassTree {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  #[must_use]
  pub fn with_parent(
    mut self,
    class: impl Into<ClassId>,
    parent: impl Into<ClassId>,
  ) -> Self {
    self.insert(class, parent);
    self
  }

  /// Record `parent` as the direct parent of `class`, replacing any previous
  /// parent.
  pub fn insert(&mut self, class: impl Into<ClassId>, parent: impl Into<ClassId>) {
    self.parents.insert(class.into(), parent.into());
  }

  /// Iterate over the ancestors of `class`, nearest first, excluding `class`
  /// itself.
  pub fn ancestors<'a>(
    &'a self,
    class: &'a ClassId,
  ) -> impl Iterator<Item = &'a ClassId> + 'a {
    // A cycle in the links would otherwise loop forever.
    let limit = self.parents.len();
    std::iter::successors(self.parents.get(class), |current| {
      self.parents.get(*current)
    })
    .take(limit)
  }
}

impl ClassHierarchy for ClassTree {
  fn is_a(&self, class: &ClassId, ancestor: &ClassId) -> bool {
    class == ancestor || self.ancestors(class).any(|a| a == ancestor)
  }
}
