//! Audience targeting: evaluates targeting rules against request
//! attributes (query parameters and UTM tags) and picks which page
//! components a visitor sees.

pub mod error;
pub mod request;
pub mod resolver;
pub mod rules;

pub use error::{TargetingError, TargetingResult};
pub use request::{RequestAttributes, UtmTag};
pub use resolver::{
    components_for_audience, match_variant, resolve, AudienceResolver, AudienceTargeting,
    AudienceVariant, PageResolution, Resolution,
};
pub use rules::{MatchType, ParameterType, TargetingRule};
