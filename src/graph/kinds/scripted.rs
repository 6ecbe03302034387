//! Scripted node kinds loaded from TOML definition files.
//!
//! Third parties extend the palette by dropping `*.toml` files into the custom
//! kinds directory. Files whose name starts with `_` are ignored.
//!
//! ## Definition format
//!
//! ```toml
//! name = "blink_led"
//! display_name = "Blink LED"
//! description = "Toggle the status LED"
//! category = "action"
//! inputs = ["in"]
//! outputs = ["out"]
//! code = "robot.blink({times})"
//!
//! [defaults]
//! times = 3
//!
//! # Optional Rhai body for `execute`. `inputs` and `params` are maps;
//! # the script returns a map keyed by output slot.
//! script = '''
//! #{ out: params.times * 2 }
//! '''
//! ```

use crate::error::{EditorError, Result, ResultExt};
use crate::graph::kind::{NodeKind, SlotValues};
use crate::graph::layout::{even_layout, NodeLayout, DEFAULT_NODE_SIZE};
use crate::graph::port::PortDescriptor;
use crate::graph::value::{ParamValue, Parameters};
use crate::robot::RobotModel;
use rhai::{Array, Dynamic, Engine, Scope, AST};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;

fn default_category() -> String {
    "custom".to_string()
}

/// On-disk definition of a scripted kind.
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptedKindDef {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub inputs: Vec<String>,
    #[serde(default)]
    pub outputs: Vec<String>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub defaults: toml::Table,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub script: Option<String>,
}

/// A node kind backed by a `ScriptedKindDef` and an optional Rhai script.
pub struct ScriptedKind {
    def: ScriptedKindDef,
    display_name: String,
    defaults: Parameters,
    engine: Engine,
    compiled: Option<AST>,
}

impl std::fmt::Debug for ScriptedKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedKind")
            .field("name", &self.def.name)
            .field("has_script", &self.compiled.is_some())
            .finish()
    }
}

fn sandboxed_engine() -> Engine {
    let mut engine = Engine::new();
    engine.set_max_expr_depths(64, 64);
    engine.set_max_call_levels(32);
    engine.set_max_operations(10_000);
    engine.set_max_string_size(10_000);
    engine.set_max_array_size(1_000);
    engine.set_max_map_size(1_000);
    engine
}

impl ScriptedKind {
    /// Validate a definition and compile its script.
    pub fn from_def(def: ScriptedKindDef) -> Result<Self> {
        if def.name.trim().is_empty() {
            return Err(EditorError::Config("kind name must not be empty".to_string()));
        }
        let mut seen = HashSet::new();
        for slot in def.inputs.iter().chain(def.outputs.iter()) {
            if !seen.insert(slot.as_str()) {
                return Err(EditorError::Config(format!(
                    "kind '{}' declares slot '{}' twice",
                    def.name, slot
                )));
            }
        }

        let mut defaults = Parameters::new();
        for (key, value) in &def.defaults {
            let value = ParamValue::from_toml(value).ok_or_else(|| {
                EditorError::Config(format!("default '{}' of kind '{}' is a table", key, def.name))
            })?;
            defaults.set(key, value);
        }

        let engine = sandboxed_engine();
        let compiled = match def.script.as_deref().map(str::trim) {
            Some(src) if !src.is_empty() => Some(
                engine
                    .compile(src)
                    .map_err(|e| EditorError::Script(format!("Compile error: {}", e)))
                    .with_context(|| format!("kind '{}'", def.name))?,
            ),
            _ => None,
        };

        let display_name = def.display_name.clone().unwrap_or_else(|| def.name.clone());
        Ok(Self {
            def,
            display_name,
            defaults,
            engine,
            compiled,
        })
    }

    /// Load one definition file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(EditorError::from)
            .with_context(|| format!("reading {}", path.display()))?;
        let def: ScriptedKindDef = toml::from_str(&content)
            .map_err(|e| EditorError::Config(e.to_string()))
            .with_context(|| format!("parsing {}", path.display()))?;
        Self::from_def(def)
    }

    pub fn has_script(&self) -> bool {
        self.compiled.is_some()
    }

    /// Substitute `{param}` placeholders in the code template. Unknown
    /// placeholders are left as written.
    fn render_template(&self, params: &Parameters) -> String {
        let template = &self.def.code;
        let mut out = String::with_capacity(template.len());
        let mut rest = template.as_str();
        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            match after.find('}') {
                Some(close) if !after[..close].contains('{') => {
                    let key = &after[..close];
                    match params.get(key) {
                        Some(value) => out.push_str(&value.to_string()),
                        None => {
                            out.push('{');
                            out.push_str(key);
                            out.push('}');
                        }
                    }
                    rest = &after[close + 1..];
                }
                _ => {
                    out.push('{');
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        out
    }
}

/// Scan `dir` for kind definitions, in file-name order. Broken files are
/// logged and skipped.
pub fn discover(dir: &Path) -> Vec<ScriptedKind> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("Cannot read custom kinds directory {:?}: {}", dir, e);
            return Vec::new();
        }
    };

    let mut paths: Vec<_> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("toml"))
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .map(|n| !n.starts_with('_'))
                .unwrap_or(false)
        })
        .collect();
    paths.sort();

    paths
        .into_iter()
        .filter_map(|path| match ScriptedKind::load(&path) {
            Ok(kind) => {
                tracing::debug!("Loaded custom kind '{}' from {:?}", kind.def.name, path);
                Some(kind)
            }
            Err(e) => {
                tracing::warn!("Skipping custom kind file {:?}: {}", path, e);
                None
            }
        })
        .collect()
}

fn json_to_dynamic(value: &Value) -> Dynamic {
    match value {
        Value::Null => Dynamic::UNIT,
        Value::Bool(b) => Dynamic::from(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Dynamic::from(i),
            None => Dynamic::from(n.as_f64().unwrap_or(0.0)),
        },
        Value::String(s) => Dynamic::from(s.clone()),
        Value::Array(items) => Dynamic::from(items.iter().map(json_to_dynamic).collect::<Array>()),
        Value::Object(map) => {
            let mut out = rhai::Map::new();
            for (k, v) in map {
                out.insert(k.as_str().into(), json_to_dynamic(v));
            }
            Dynamic::from(out)
        }
    }
}

fn dynamic_to_json(value: Dynamic) -> Value {
    if value.is_unit() {
        return Value::Null;
    }
    if let Ok(b) = value.as_bool() {
        return Value::Bool(b);
    }
    if let Ok(i) = value.as_int() {
        return Value::from(i);
    }
    if let Ok(f) = value.as_float() {
        return Value::from(f);
    }
    if value.is_string() {
        return Value::String(value.into_string().unwrap_or_default());
    }
    if value.is_array() {
        let items = value.try_cast::<Array>().unwrap_or_default();
        return Value::Array(items.into_iter().map(dynamic_to_json).collect());
    }
    if value.is_map() {
        let map = value.try_cast::<rhai::Map>().unwrap_or_default();
        return Value::Object(
            map.into_iter()
                .map(|(k, v)| (k.to_string(), dynamic_to_json(v)))
                .collect(),
        );
    }
    Value::String(value.to_string())
}

fn params_to_map(params: &Parameters) -> rhai::Map {
    let mut map = rhai::Map::new();
    for (k, v) in params.iter() {
        map.insert(k.as_str().into(), json_to_dynamic(&v.to_json()));
    }
    map
}

impl NodeKind for ScriptedKind {
    fn name(&self) -> &str {
        &self.def.name
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn description(&self) -> &str {
        &self.def.description
    }

    fn category(&self) -> &str {
        &self.def.category
    }

    fn default_parameters(&self) -> Parameters {
        self.defaults.clone()
    }

    fn ports(&self, _params: &Parameters) -> Vec<PortDescriptor> {
        self.def
            .inputs
            .iter()
            .map(PortDescriptor::input)
            .chain(self.def.outputs.iter().map(PortDescriptor::output))
            .collect()
    }

    fn features(&self) -> Vec<String> {
        self.def.features.clone()
    }

    fn layout(&self, params: &Parameters) -> NodeLayout {
        even_layout(DEFAULT_NODE_SIZE.x, &self.ports(params))
    }

    fn execute(
        &self,
        params: &Parameters,
        inputs: &SlotValues,
        _robot: Option<&mut dyn RobotModel>,
    ) -> Result<SlotValues> {
        let Some(ast) = self.compiled.as_ref() else {
            return Ok(self
                .def
                .outputs
                .iter()
                .map(|slot| (slot.clone(), Value::Null))
                .collect());
        };

        let mut input_map = rhai::Map::new();
        for (k, v) in inputs {
            input_map.insert(k.as_str().into(), json_to_dynamic(v));
        }

        let mut scope = Scope::new();
        scope.push("inputs", input_map);
        scope.push("params", params_to_map(params));

        let result = self
            .engine
            .eval_ast_with_scope::<Dynamic>(&mut scope, ast)
            .with_context(|| format!("executing kind '{}'", self.def.name))?;

        let map = result.try_cast::<rhai::Map>().ok_or_else(|| {
            EditorError::Script(format!(
                "script of kind '{}' must return a map of outputs",
                self.def.name
            ))
        })?;

        Ok(map
            .into_iter()
            .map(|(k, v)| (k.to_string(), dynamic_to_json(v)))
            .collect())
    }

    fn to_code(&self, params: &Parameters) -> String {
        if self.def.code.trim().is_empty() {
            return format!("# {}", self.display_name);
        }
        self.render_template(params)
    }
}
