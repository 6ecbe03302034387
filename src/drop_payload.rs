//! Palette drop protocol.
//!
//! A palette entry offers a JSON payload under [`MIME_TYPE`]:
//!
//! ```json
//! {"title": "Logic Control", "features": ["If", "While Loop"],
//!  "grad": ["#1e3a8a", "#2563eb"], "preset": "While Loop"}
//! ```
//!
//! The title picks the node kind (a kind name, a display name, or one of the
//! legacy palette group titles); without a usable title the preset or first
//! feature picks it when exactly one kind offers that feature. `preset`
//! becomes the initial feature when the kind offers it, and `grad` colours
//! the node. Missing or mistyped fields
//! fall back to the kind's defaults; only an unresolvable title is an error.

use crate::config::theme::{StyleResolver, FALLBACK_COLOR};
use crate::error::{EditorError, Result};
use crate::graph::{KindRegistry, NodeKind, Parameters, SELECTION_KEY};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

pub const MIME_TYPE: &str = "application/x-module-card";

/// Gradient used when neither the payload nor the theme supplies one.
pub const DEFAULT_GRADIENT: (&str, &str) = ("#45a049", "#4CAF50");

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DropPayload {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grad: Option<[String; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,
}

/// What a resolved drop creates.
#[derive(Clone)]
pub struct DropPlan {
    pub kind: Arc<dyn NodeKind>,
    pub overrides: Parameters,
    pub gradient: (String, String),
}

impl std::fmt::Debug for DropPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DropPlan")
            .field("kind", &self.kind.name())
            .field("overrides", &self.overrides)
            .field("gradient", &self.gradient)
            .finish()
    }
}

impl DropPayload {
    /// Payload a palette entry offers for `kind`.
    pub fn for_kind(kind: &dyn NodeKind, style: &dyn StyleResolver) -> Self {
        let (start, end) = style.gradient_pair(kind.category(), DEFAULT_GRADIENT);
        Self {
            title: kind.display_name().to_string(),
            features: kind.features(),
            grad: Some([start, end]),
            preset: kind.default_feature(),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_default()
    }

    /// Strict parse. Any malformed field is an error.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| EditorError::MalformedDropPayload(e.to_string()))
    }

    /// Field-by-field parse: a field of the wrong type is dropped and logged
    /// instead of rejecting the whole payload. Fails only when the bytes are
    /// not a JSON object.
    pub fn parse_lenient(bytes: &[u8]) -> Result<Self> {
        if let Ok(payload) = Self::parse(bytes) {
            return Ok(payload);
        }
        let value: Value = serde_json::from_slice(bytes)
            .map_err(|e| EditorError::MalformedDropPayload(e.to_string()))?;
        let Value::Object(map) = value else {
            return Err(EditorError::MalformedDropPayload(
                "payload is not an object".to_string(),
            ));
        };

        let mut payload = Self::default();
        for (key, value) in map {
            let ok = match key.as_str() {
                "title" => value.as_str().map(|s| payload.title = s.to_string()).is_some(),
                "features" => serde_json::from_value(value)
                    .map(|f| payload.features = f)
                    .is_ok(),
                "grad" => serde_json::from_value(value)
                    .map(|g| payload.grad = Some(g))
                    .is_ok(),
                "preset" => match value {
                    Value::String(s) => {
                        payload.preset = Some(s);
                        true
                    }
                    Value::Null => true,
                    _ => false,
                },
                _ => true,
            };
            if !ok {
                tracing::warn!("Drop payload field '{}' malformed, using default", key);
            }
        }
        Ok(payload)
    }

    /// Pick the kind this payload creates: by title, then by the legacy
    /// group titles, then by the preset or first feature when exactly one
    /// kind offers it.
    pub fn resolve_kind(&self, registry: &KindRegistry) -> Result<Arc<dyn NodeKind>> {
        if let Some(kind) = registry.find_by_title(&self.title) {
            return Ok(kind);
        }
        let hint = self
            .preset
            .as_deref()
            .filter(|p| !p.is_empty())
            .or_else(|| self.features.first().map(String::as_str));
        match self.title.trim() {
            "Logic Control" => {
                let name = match hint {
                    Some("While Loop" | "While" | "For") => "while_loop",
                    _ => "if",
                };
                return registry.get(name);
            }
            "Condition" => return registry.get("comparison"),
            _ => {}
        }
        hint.and_then(|hint| unique_kind_for(registry, hint))
            .ok_or_else(|| EditorError::UnknownKind(self.title.clone()))
    }

    /// Feature to select on creation: the preset, or else the first payload
    /// feature the kind offers.
    fn initial_feature(&self, kind: &dyn NodeKind) -> Option<String> {
        let offered = kind.features();
        if let Some(preset) = self.preset.as_deref().filter(|p| !p.is_empty()) {
            if offered.iter().any(|f| f == preset) {
                return Some(preset.to_string());
            }
            // Legacy group presets ("If", "While Loop") name the kind, not a feature.
            if !kind.display_name().eq_ignore_ascii_case(preset) {
                tracing::warn!("Preset '{}' not offered by {}, using default", preset, kind.name());
            }
            return None;
        }
        self.features
            .iter()
            .find(|f| offered.contains(*f))
            .cloned()
    }

    /// Resolve kind, initial feature and gradient.
    pub fn plan(&self, registry: &KindRegistry, style: &dyn StyleResolver) -> Result<DropPlan> {
        let kind = self.resolve_kind(registry)?;

        let mut overrides = Parameters::new();
        if let Some(feature) = self.initial_feature(kind.as_ref()) {
            overrides.set(SELECTION_KEY, feature.as_str());
        }

        let gradient = match &self.grad {
            Some([start, end]) if !start.is_empty() && !end.is_empty() => {
                (start.clone(), end.clone())
            }
            _ => {
                let fallback = style.gradient_pair(kind.category(), DEFAULT_GRADIENT);
                if fallback.0.is_empty() {
                    (FALLBACK_COLOR.to_string(), FALLBACK_COLOR.to_string())
                } else {
                    fallback
                }
            }
        };

        Ok(DropPlan {
            kind,
            overrides,
            gradient,
        })
    }
}

/// The only kind whose name, display name or feature list matches `hint`.
fn unique_kind_for(registry: &KindRegistry, hint: &str) -> Option<Arc<dyn NodeKind>> {
    let mut matches = registry.iter().filter(|kind| {
        kind.name() == hint
            || kind.display_name().eq_ignore_ascii_case(hint)
            || kind.features().iter().any(|f| f == hint)
    });
    let first = matches.next()?;
    match matches.next() {
        None => Some(first.clone()),
        Some(_) => {
            tracing::debug!("Drop hint '{}' matches several kinds", hint);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Theme;

    fn plan(json: &str) -> Result<DropPlan> {
        let payload = DropPayload::parse_lenient(json.as_bytes())?;
        payload.plan(&KindRegistry::with_builtins(), &Theme::default())
    }

    #[test]
    fn test_legacy_logic_control() {
        let p = plan(r#"{"title":"Logic Control","features":["If","While Loop"],"preset":"While Loop"}"#)
            .unwrap();
        assert_eq!(p.kind.name(), "while_loop");
        assert!(p.overrides.get(SELECTION_KEY).is_none());

        let p = plan(r#"{"title":"Logic Control","preset":"If"}"#).unwrap();
        assert_eq!(p.kind.name(), "if");
    }

    #[test]
    fn test_legacy_title_resolves_through_features() {
        let p = plan(r#"{"title":"Logic Control","features":["While Loop"]}"#).unwrap();
        assert_eq!(p.kind.name(), "while_loop");

        let p = plan(r#"{"title":"Logic Control","features":["If","While Loop"]}"#).unwrap();
        assert_eq!(p.kind.name(), "if");
    }

    #[test]
    fn test_features_identify_kind_without_title() {
        let p = plan(r#"{"features":["Read IMU"]}"#).unwrap();
        assert_eq!(p.kind.name(), "sensor_input");
        assert_eq!(p.overrides.text(SELECTION_KEY), "Read IMU");

        // "Stop" is both an action feature and the stop kind.
        assert!(matches!(
            plan(r#"{"title":"","features":["Stop"]}"#),
            Err(EditorError::UnknownKind(_))
        ));
    }

    #[test]
    fn test_action_preset_applied() {
        let p = plan(
            r##"{"title":"Action Execution","features":["Stand","Stop"],"grad":["#111111","#222222"],"preset":"Stop"}"##,
        )
        .unwrap();
        assert_eq!(p.kind.name(), "action_execution");
        assert_eq!(p.overrides.text(SELECTION_KEY), "Stop");
        assert_eq!(p.gradient, ("#111111".to_string(), "#222222".to_string()));
    }

    #[test]
    fn test_missing_grad_uses_theme() {
        let p = plan(r#"{"title":"Condition"}"#).unwrap();
        assert_eq!(p.kind.name(), "comparison");
        let expected = Theme::default().gradient_pair("condition", DEFAULT_GRADIENT);
        assert_eq!(p.gradient, expected);
    }

    #[test]
    fn test_malformed_fields_fall_back() {
        let p = plan(r#"{"title":"Sensor Input","features":42,"grad":"red","preset":7}"#).unwrap();
        assert_eq!(p.kind.name(), "sensor_input");
        assert!(p.overrides.get(SELECTION_KEY).is_none());
    }

    #[test]
    fn test_unknown_preset_ignored() {
        let p = plan(r#"{"title":"Sensor Input","preset":"Read Minds"}"#).unwrap();
        assert!(p.overrides.get(SELECTION_KEY).is_none());
    }

    #[test]
    fn test_unresolvable() {
        assert!(matches!(
            DropPayload::parse_lenient(b"not json"),
            Err(EditorError::MalformedDropPayload(_))
        ));
        assert!(matches!(
            DropPayload::parse_lenient(b"[1, 2]"),
            Err(EditorError::MalformedDropPayload(_))
        ));
        assert!(matches!(plan(r#"{"title":"Teleporter"}"#), Err(EditorError::UnknownKind(_))));
    }

    #[test]
    fn test_for_kind_round_trip() {
        let registry = KindRegistry::with_builtins();
        let kind = registry.get("sensor_input").unwrap();
        let payload = DropPayload::for_kind(kind.as_ref(), &Theme::default());
        assert_eq!(payload.title, "Sensor Input");
        assert_eq!(payload.preset.as_deref(), Some("Read IMU"));
        let parsed = DropPayload::parse(&payload.to_bytes()).unwrap();
        assert_eq!(parsed, payload);
    }
}
