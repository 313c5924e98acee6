//! Rule sets and first-match-wins resolution.
//!
//! Resolution consumes an unclassified [`Entity`] and yields a
//! [`Classified`] one, so a file can only be relocated after it has been
//! resolved, and is resolved at most once.

use crate::entity::Entity;
use crate::error::RuleError;
use crate::predicate::{PredicateInvocation, evaluate_all};
use crate::template::DestinationTemplate;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
enum RuleBody {
    Valid {
        conditions: Vec<PredicateInvocation>,
        destination: DestinationTemplate,
    },
    Defective(String),
}

/// A list of predicate invocations paired with a destination template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    name: String,
    body: RuleBody,
}

impl Rule {
    pub fn new(
        name: impl Into<String>,
        conditions: Vec<PredicateInvocation>,
        destination: impl Into<DestinationTemplate>,
    ) -> Self {
        Self {
            name: name.into(),
            body: RuleBody::Valid {
                conditions,
                destination: destination.into(),
            },
        }
    }

    /// A rule whose configuration entry is malformed. It never matches and
    /// reports `reason` every time it is evaluated.
    pub fn defective(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body: RuleBody::Defective(reason.into()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn conditions(&self) -> Option<&[PredicateInvocation]> {
        match &self.body {
            RuleBody::Valid { conditions, .. } => Some(conditions),
            RuleBody::Defective(_) => None,
        }
    }

    pub fn destination(&self) -> Option<&DestinationTemplate> {
        match &self.body {
            RuleBody::Valid { destination, .. } => Some(destination),
            RuleBody::Defective(_) => None,
        }
    }

    /// Whether every condition of this rule holds for `entity`.
    pub fn matches(&self, entity: &Entity) -> Result<bool, RuleError> {
        match &self.body {
            RuleBody::Valid { conditions, .. } => evaluate_all(entity, conditions),
            RuleBody::Defective(reason) => Err(RuleError::ConfigurationDefect {
                rule: self.name.clone(),
                reason: reason.clone(),
            }),
        }
    }
}

/// Ordered rules plus an optional default destination.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    pub rules: Vec<Rule>,
    /// Destination for files no rule matches; `None` leaves them in place.
    pub default_destination: Option<DestinationTemplate>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>, default_destination: Option<DestinationTemplate>) -> Self {
        Self {
            rules,
            default_destination,
        }
    }
}

/// Where resolution sent a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// The named rule matched first.
    Matched {
        rule: String,
        template: DestinationTemplate,
    },
    /// No rule matched; the rule set's default applies.
    Default(DestinationTemplate),
    /// No rule matched and there is no default: the file stays put.
    Unmatched,
}

impl Destination {
    /// The template to expand at relocation time, if the file moves at all.
    pub fn template(&self) -> Option<&DestinationTemplate> {
        match self {
            Destination::Matched { template, .. } | Destination::Default(template) => {
                Some(template)
            }
            Destination::Unmatched => None,
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::Matched { rule, template } => write!(f, "{} (rule '{}')", template, rule),
            Destination::Default(template) => write!(f, "{} (default)", template),
            Destination::Unmatched => f.write_str("left in place"),
        }
    }
}

/// An entity that has been through resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    entity: Entity,
    destination: Destination,
}

impl Classified {
    pub fn entity(&self) -> &Entity {
        &self.entity
    }

    pub fn destination(&self) -> &Destination {
        &self.destination
    }
}

/// A rule that could not be evaluated for a given file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleDiagnostic {
    pub rule: String,
    pub error: RuleError,
}

impl fmt::Display for RuleDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rule '{}': {}", self.rule, self.error)
    }
}

/// The result of resolving one entity.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub classified: Classified,
    /// Rules skipped because they were malformed or failed to evaluate.
    pub diagnostics: Vec<RuleDiagnostic>,
}

/// Resolves the destination of `entity` against `rule_set`.
///
/// Rules are tried in order and the first whose conditions all hold wins;
/// later rules are not evaluated. A rule that errors counts as not
/// matching and is reported in [`Resolution::diagnostics`]. Without a match
/// the default destination applies, or the file is left in place when
/// there is none.
pub fn resolve(entity: Entity, rule_set: &RuleSet) -> Resolution {
    let mut diagnostics = Vec::new();

    for rule in &rule_set.rules {
        match rule.matches(&entity) {
            Ok(true) => {
                log::debug!("[classify] {} matches rule '{}'", entity.name(), rule.name());
                if let Some(template) = rule.destination() {
                    let destination = Destination::Matched {
                        rule: rule.name().to_string(),
                        template: template.clone(),
                    };
                    return Resolution {
                        classified: Classified {
                            entity,
                            destination,
                        },
                        diagnostics,
                    };
                }
            }
            Ok(false) => {}
            Err(error) => {
                log::error!(
                    "[classify] rule '{}' skipped for {}: {}",
                    rule.name(),
                    entity.name(),
                    error
                );
                diagnostics.push(RuleDiagnostic {
                    rule: rule.name().to_string(),
                    error,
                });
            }
        }
    }

    let destination = match &rule_set.default_destination {
        Some(template) => {
            log::warn!(
                "[classify] {} doesn't meet any criteria, using default destination",
                entity.name()
            );
            Destination::Default(template.clone())
        }
        None => {
            log::debug!("[classify] {} doesn't meet any criteria", entity.name());
            Destination::Unmatched
        }
    };

    Resolution {
        classified: Classified {
            entity,
            destination,
        },
        diagnostics,
    }
}
