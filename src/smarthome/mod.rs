//! Smart home device-control surface
//!
//! Directive classification, endpoint discovery, and protocol envelopes for
//! roller shutters and the two whole-home scenes.

pub mod catalog;
pub mod directive;
pub mod resolver;
pub mod response;
mod router;

pub use directive::{Directive, DirectiveEnvelope, DirectiveKind, ShutterAction};
pub use resolver::{resolve, EndpointDescriptor, SceneTrigger, CLOSE_ALL_ENDPOINT_ID, OPEN_ALL_ENDPOINT_ID};
pub use response::{ErrorType, ResponseEnvelope};
pub use router::{RouteOutcome, SmartHomeRouter};
