#![allow(clippy::unwrap_used, reason = "Fine in tests")]
use std::sync::{
  Arc,
  atomic::{AtomicUsize, Ordering},
};

use mdkit::{
  BlockParser,
  BlockRenderer,
  Characters,
  ClassId,
  ConfigView,
  Configuration,
  ConfigurationAware,
  Cursor,
  DelimiterProcessor,
  Environment,
  EnvironmentAware,
  EnvironmentRef,
  Event,
  EventListener,
  Injectable,
  InlineParser,
  InlineRenderer,
  ListenerResult,
  Node,
  Propagation,
};
use serde_json::json;

#[derive(Debug, Default)]
struct Counters {
  environment:          AtomicUsize,
  configuration:        AtomicUsize,
  upgraded_during_init: AtomicUsize,
}

/// Implements every rule kind, recording what it was injected with.
struct Injected {
  counters:    Arc<Counters>,
  environment: EnvironmentRef,
  greeting:    Option<String>,
}

impl Injected {
  fn new(counters: &Arc<Counters>) -> Self {
    Self {
      counters:    Arc::clone(counters),
      environment: EnvironmentRef::default(),
      greeting:    None,
    }
  }
}

impl Injectable for Injected {
  fn as_environment_aware(&mut self) -> Option<&mut dyn EnvironmentAware> {
    Some(self)
  }

  fn as_configuration_aware(&mut self) -> Option<&mut dyn ConfigurationAware> {
    Some(self)
  }
}

impl EnvironmentAware for Injected {
  fn set_environment(&mut self, environment: EnvironmentRef) {
    self.counters.environment.fetch_add(1, Ordering::SeqCst);
    if environment.upgrade().is_some() {
      self
        .counters
        .upgraded_during_init
        .fetch_add(1, Ordering::SeqCst);
    }
    self.environment = environment;
  }
}

impl ConfigurationAware for Injected {
  fn set_configuration(&mut self, config: ConfigView) {
    self.counters.configuration.fetch_add(1, Ordering::SeqCst);
    self.greeting = config
      .get("greeting")
      .and_then(serde_json::Value::as_str)
      .map(str::to_owned);
  }
}

#[derive(Debug)]
struct Greeting(String);

impl Node for Greeting {
  fn class_id(&self) -> ClassId {
    ClassId::from_static("greeting")
  }

  fn as_any(&self) -> &dyn std::any::Any {
    self
  }
}

impl BlockParser for Injected {
  fn parse(&self, cursor: &mut Cursor<'_>) -> Option<Box<dyn Node>> {
    // Only matches when the environment it was injected with is alive and
    // knows the delimiter processor registered next to it.
    let environment = self.environment.upgrade()?;
    environment.delimiter_processors().get('~')?;
    cursor.eat("hello").then(|| {
      Box::new(Greeting(self.greeting.clone().unwrap_or_default()))
        as Box<dyn Node>
    })
  }
}

impl InlineParser for Injected {
  fn characters(&self) -> Characters {
    Characters::one('h')
  }

  fn parse(&self, cursor: &mut Cursor<'_>) -> Option<Box<dyn Node>> {
    BlockParser::parse(self, cursor)
  }
}

impl BlockRenderer for Injected {
  fn render(&self, node: &dyn Node) -> Option<String> {
    let greeting = node.as_any().downcast_ref::<Greeting>()?;
    Some(format!("<p>{}</p>", greeting.0))
  }
}

impl InlineRenderer for Injected {
  fn render(&self, node: &dyn Node) -> Option<String> {
    let greeting = node.as_any().downcast_ref::<Greeting>()?;
    Some(format!("<em>{}</em>", greeting.0))
  }
}

impl DelimiterProcessor for Injected {
  fn opening_character(&self) -> char {
    '~'
  }

  fn delimiter_use(&self, _opener_len: usize, _closer_len: usize) -> usize {
    2
  }
}

#[derive(Debug)]
struct Ping;

impl Event for Ping {}

impl EventListener<Ping> for Injected {
  fn handle(&self, _event: &mut Ping) -> ListenerResult {
    Ok(if self.greeting.is_some() {
      Propagation::Stop
    } else {
      Propagation::Continue
    })
  }
}

fn environment(counters: &Arc<Counters>) -> Environment {
  let config = Configuration::try_from(json!({ "greeting": "hi" })).unwrap();
  let mut environment = Environment::with_config(config);
  environment
    .add_block_parser(Injected::new(counters), 0)
    .unwrap()
    .add_inline_parser(Injected::new(counters), 0)
    .unwrap()
    .add_delimiter_processor(Injected::new(counters))
    .unwrap()
    .add_block_renderer("greeting", Injected::new(counters), 0)
    .unwrap()
    .add_inline_renderer("greeting", Injected::new(counters), 0)
    .unwrap()
    .add_event_listener_object::<Ping, _>(Injected::new(counters), 0)
    .unwrap();
  environment
}

#[test]
fn test_every_rule_is_injected_exactly_once() {
  let counters = Arc::new(Counters::default());
  let environment = environment(&counters);

  assert_eq!(counters.environment.load(Ordering::SeqCst), 0);

  let _ = environment.get_block_parsers();
  let _ = environment.get_delimiter_processors();
  environment.dispatch(&mut Ping).unwrap();
  environment.freeze();

  assert_eq!(counters.environment.load(Ordering::SeqCst), 6);
  assert_eq!(counters.configuration.load(Ordering::SeqCst), 6);
  assert_eq!(counters.upgraded_during_init.load(Ordering::SeqCst), 0);
}

#[test]
fn test_injected_rules_see_environment_and_config() {
  let counters = Arc::new(Counters::default());
  let environment = environment(&counters);

  let mut cursor = Cursor::new("hello world");
  let node = environment.parse_block_start(&mut cursor).unwrap();
  assert_eq!(cursor.rest(), " world");
  assert_eq!(environment.render_block(&*node).unwrap(), "<p>hi</p>");
  assert_eq!(environment.render_inline(&*node).unwrap(), "<em>hi</em>");

  assert_eq!(environment.dispatch(&mut Ping).unwrap(), Propagation::Stop);
}

#[test]
fn test_environment_ref_does_not_keep_environment_alive() {
  let counters = Arc::new(Counters::default());
  let environment = environment(&counters);
  let handle = Arc::downgrade(&environment.freeze());

  // The rules hold references to the frozen environment, yet the owning
  // environment is the only strong one.
  assert!(handle.upgrade().is_some());

  drop(environment);
  assert!(handle.upgrade().is_none());
}
