//! Per-device calibration rules.
//!
//! A rule list is ordered: the first rule whose masks all match the
//! device wins.  A rule with no masks matches every device and is expected
//! to sit at the end of the list as the default.
//!
//! Masks are regular expressions searched for anywhere in the field, not
//! full-string comparisons.  Anchor them with `^…$` when an exact match is
//! wanted.

use crate::command::DeviceId;
use log::{debug, error, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Upper bound on per-device entries kept by caches keyed on [`DeviceId`].
///
/// Device ids arrive over the command socket, so nothing else limits how
/// many distinct ones are seen.
pub const MAX_TRACKED_DEVICES: usize = 64;

/// How one scroll axis of a device maps onto switch direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisMode {
    /// Keep the natural sign of the event.
    #[default]
    Direct,
    /// Flip the sign.
    Inverted,
    /// Ignore the axis entirely.
    Disabled,
}

impl AxisMode {
    /// Multiplier applied to a raw delta on this axis.
    pub fn sign(self) -> f64 {
        match self {
            AxisMode::Direct => 1.0,
            AxisMode::Inverted => -1.0,
            AxisMode::Disabled => 0.0,
        }
    }

    /// Signed unit for a discrete step whose natural sign is `natural`.
    pub fn unit(self, natural: i32) -> i32 {
        match self {
            AxisMode::Direct => natural,
            AxisMode::Inverted => -natural,
            AxisMode::Disabled => 0,
        }
    }
}

/// A device rule as written in the configuration file.
///
/// Masks are plain strings here; [`compile_rules`] turns them into
/// [`DeviceRule`]s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceRuleConfig {
    /// Regular expression tested against the device name.
    pub name_mask: Option<String>,
    /// Regular expression tested against the vendor id.
    pub vendor_mask: Option<String>,
    /// Regular expression tested against the product id.
    pub product_mask: Option<String>,
    /// Horizontal axis mapping.  Default: `direct`.
    pub horizontal: AxisMode,
    /// Vertical axis mapping.  Default: `direct`.
    pub vertical: AxisMode,
    /// Accumulated continuous delta needed for one step.  Default: `1.0`.
    pub resistance: f64,
}

impl Default for DeviceRuleConfig {
    fn default() -> Self {
        Self {
            name_mask: None,
            vendor_mask: None,
            product_mask: None,
            horizontal: AxisMode::Direct,
            vertical: AxisMode::Direct,
            resistance: 1.0,
        }
    }
}

/// A compiled calibration rule.
#[derive(Debug, Clone)]
pub struct DeviceRule {
    pub name_mask: Option<Regex>,
    pub vendor_mask: Option<Regex>,
    pub product_mask: Option<Regex>,
    pub horizontal: AxisMode,
    pub vertical: AxisMode,
    pub resistance: f64,
}

impl DeviceRule {
    /// A maskless rule that matches every device.
    pub fn wildcard(horizontal: AxisMode, vertical: AxisMode, resistance: f64) -> Self {
        Self {
            name_mask: None,
            vendor_mask: None,
            product_mask: None,
            horizontal,
            vertical,
            resistance,
        }
    }

    /// Compile the masks of a configured rule.
    pub fn compile(config: &DeviceRuleConfig) -> Result<Self, regex::Error> {
        let mask = |m: &Option<String>| m.as_deref().map(Regex::new).transpose();
        Ok(Self {
            name_mask: mask(&config.name_mask)?,
            vendor_mask: mask(&config.vendor_mask)?,
            product_mask: mask(&config.product_mask)?,
            horizontal: config.horizontal,
            vertical: config.vertical,
            resistance: config.resistance,
        })
    }

    /// `true` if the rule defines no mask at all.
    pub fn is_wildcard(&self) -> bool {
        self.name_mask.is_none() && self.vendor_mask.is_none() && self.product_mask.is_none()
    }

    /// `true` if every mask the rule defines matches the device.
    pub fn matches(&self, device: &DeviceId) -> bool {
        let test = |mask: &Option<Regex>, field: &str| {
            mask.as_ref().map_or(true, |re| re.is_match(field))
        };
        test(&self.name_mask, &device.name)
            && test(&self.vendor_mask, &device.vendor_id)
            && test(&self.product_mask, &device.product_id)
    }

    /// `true` if a continuous delta can ever produce a step with this rule.
    pub fn has_valid_resistance(&self) -> bool {
        self.resistance > 0.0 && self.resistance.is_finite()
    }
}

/// Compile a configured rule list.
///
/// Rules with invalid masks are dropped.  Problems that leave the list
/// usable but degraded (no default rule, a non-positive resistance, a
/// fully-disabled default) are only reported.
pub fn compile_rules(label: &str, configs: &[DeviceRuleConfig]) -> Vec<DeviceRule> {
    let mut rules = Vec::with_capacity(configs.len());
    for (i, config) in configs.iter().enumerate() {
        match DeviceRule::compile(config) {
            Ok(rule) => {
                if !rule.has_valid_resistance() {
                    warn!(
                        "{}: device rule #{} has resistance {}; \
                         devices it matches will never switch",
                        label, i, rule.resistance
                    );
                }
                rules.push(rule);
            }
            Err(e) => error!("{}: dropping device rule #{}: {}", label, i, e),
        }
    }
    match rules.last() {
        Some(last) if last.is_wildcard() => {
            if last.horizontal == AxisMode::Disabled && last.vertical == AxisMode::Disabled {
                warn!("{}: default device rule disables both axes", label);
            }
        }
        _ => warn!(
            "{}: no default device rule at the end of the list; unmatched devices will not switch",
            label
        ),
    }
    rules
}

/// Returned when no rule matches a device.
#[derive(Debug, thiserror::Error)]
#[error("no device rule matches {0}")]
pub struct ResolveError(pub DeviceId);

/// Resolves devices against one rule list, caching by device.
///
/// The cache is keyed by the full [`DeviceId`] and is dropped as a whole
/// whenever the rule list is replaced, or when it would grow past
/// [`MAX_TRACKED_DEVICES`].
#[derive(Debug, Default)]
pub struct DeviceProfileResolver {
    rules: Vec<DeviceRule>,
    cache: HashMap<DeviceId, Option<usize>>,
}

impl DeviceProfileResolver {
    pub fn new(rules: Vec<DeviceRule>) -> Self {
        Self {
            rules,
            cache: HashMap::new(),
        }
    }

    /// Replace the rule list and invalidate the cache.
    pub fn set_rules(&mut self, rules: Vec<DeviceRule>) {
        self.rules = rules;
        self.cache.clear();
    }

    /// Number of devices with a cached resolution.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Effective rule for `device`.
    pub fn resolve(&mut self, device: &DeviceId) -> Result<&DeviceRule, ResolveError> {
        if self.cache.len() >= MAX_TRACKED_DEVICES && !self.cache.contains_key(device) {
            debug!("{} devices cached, starting over", self.cache.len());
            self.cache.clear();
        }
        let rules = &self.rules;
        let index = *self.cache.entry(device.clone()).or_insert_with(|| {
            let found = rules.iter().position(|r| r.matches(device));
            debug!("device {} resolved to rule {:?}", device, found);
            found
        });
        index
            .and_then(|i| self.rules.get(i))
            .ok_or_else(|| ResolveError(device.clone()))
    }
}
