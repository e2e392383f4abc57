//! Per-task plugin options table.
//!
//! Conventional defaults for each known plugin are deep-merged with the
//! user's slot. Order is fixed and significant: it is the order plugins run
//! in. Plugins the user configured but the table does not know are appended
//! after the known ones, in config order.

use std::path::Path;

use indexmap::IndexMap;
use posy_config::{NormalizedConfig, PluginOptions, PluginSlot, merge_values};
use serde_json::{Map, Value, json};

/// Resolved plugin name -> slot, in execution order.
pub type PluginTable = IndexMap<String, PluginSlot>;

/// Everything the table depends on besides the config itself.
#[derive(Debug, Clone)]
pub struct TableInput<'a> {
    pub config: &'a NormalizedConfig,
    pub root_dir: &'a Path,
    pub title: &'a str,
    pub has_vue: bool,
    pub has_ts: bool,
    pub minify: bool,
    pub bundle_node_modules: bool,
    /// Rendered banner text, possibly empty
    pub banner: &'a str,
    pub production: bool,
}

pub fn plugin_table(input: &TableInput<'_>) -> PluginTable {
    let config = input.config;
    let babel = &config.babel;
    let mut table = PluginTable::new();

    table.insert(
        "progress".into(),
        configured(config, "progress", json!({ "title": input.title })),
    );
    for name in ["url", "svgr", "json", "hashbang"] {
        table.insert(name.into(), configured(config, name, json!({})));
    }

    let externals = serde_json::to_value(&config.externals).unwrap_or(Value::Array(Vec::new()));
    table.insert(
        "node-resolve".into(),
        configured(
            config,
            "node-resolve",
            json!({
                "rootDir": input.root_dir.to_string_lossy(),
                "bundleNodeModules": input.bundle_node_modules,
                "externals": externals,
                "browser": config.output.target.as_deref() == Some("browser"),
            }),
        ),
    );

    let mut postcss = Map::new();
    if let Some(extract) = config.output.extract_css {
        postcss.insert("extract".into(), Value::Bool(extract));
    }
    table.insert(
        "postcss".into(),
        configured(config, "postcss", Value::Object(postcss)),
    );

    table.insert(
        "vue".into(),
        gated(
            config,
            "vue",
            input.has_vue,
            json!({ "css": false, "isProduction": input.production }),
        ),
    );
    table.insert(
        "typescript2".into(),
        gated(
            config,
            "typescript2",
            input.has_ts,
            json!({
                "objectHashIgnoreUnknownHack": true,
                "tsconfigOverride": { "compilerOptions": { "module": "esnext" } },
            }),
        ),
    );

    let mut babel_defaults = json!({
        "exclude": "node_modules/**",
        "extensions": [".js", ".jsx", ".mjs", ".ts", ".tsx", ".vue"],
        "presetOptions": babel.to_value(),
    });
    if let Some(babelrc) = babel.babelrc() {
        babel_defaults["babelrc"] = babelrc.clone();
    }
    if let Some(config_file) = babel.config_file() {
        babel_defaults["configFile"] = config_file.clone();
    }
    table.insert("babel".into(), configured(config, "babel", babel_defaults));

    table.insert(
        "buble".into(),
        gated(
            config,
            "buble",
            babel.minimal(),
            json!({
                "exclude": "node_modules/**",
                "include": "**/*.{js,mjs,jsx,ts,tsx,vue}",
                "transforms": {
                    "modules": false,
                    "dangerousForOf": true,
                    "dangerousTaggedTemplateString": true,
                },
            }),
        ),
    );

    table.insert(
        "strip".into(),
        gated(
            config,
            "strip",
            false,
            json!({ "functions": ["console.log"] }),
        ),
    );

    let src = input.root_dir.join("src");
    table.insert(
        "alias".into(),
        configured(
            config,
            "alias",
            json!({ "entries": { "@": src.to_string_lossy() } }),
        ),
    );

    table.insert("commonjs".into(), commonjs(config));
    table.insert("replace".into(), replace(config));

    if input.minify && !config.plugin_disabled("terser") {
        let mut terser = user_options(config, "terser");
        merge_values(
            &mut terser,
            &json!({ "output": { "preamble": input.banner } }),
        );
        table.insert("terser".into(), into_slot(terser));
    }

    for (name, slot) in &config.plugins {
        if !table.contains_key(name) {
            table.insert(name.clone(), slot.clone());
        }
    }

    table
}

/// Disabled if the user wrote `false`, otherwise defaults merged with the
/// user's options.
fn configured(config: &NormalizedConfig, name: &str, defaults: Value) -> PluginSlot {
    match config.plugin(name) {
        Some(PluginSlot::Disabled) => PluginSlot::Disabled,
        Some(PluginSlot::Enabled(user)) => merged(defaults, user),
        None => merged(defaults, &PluginOptions::new()),
    }
}

/// Like [`configured`], but only on when `flag` holds or the user enabled it.
fn gated(config: &NormalizedConfig, name: &str, flag: bool, defaults: Value) -> PluginSlot {
    if flag || config.plugin_enabled(name) {
        configured(config, name, defaults)
    } else {
        PluginSlot::Disabled
    }
}

fn merged(mut defaults: Value, user: &PluginOptions) -> PluginSlot {
    merge_values(&mut defaults, &Value::Object(user.clone()));
    into_slot(defaults)
}

fn into_slot(value: Value) -> PluginSlot {
    match value {
        Value::Object(options) => PluginSlot::Enabled(options),
        _ => PluginSlot::enabled(),
    }
}

fn user_options(config: &NormalizedConfig, name: &str) -> Value {
    config
        .plugin(name)
        .and_then(PluginSlot::to_value)
        .unwrap_or_else(|| json!({}))
}

/// Externals by name are added to the user's `ignore` list so dynamic
/// requires of them stay untouched.
fn commonjs(config: &NormalizedConfig) -> PluginSlot {
    if config.plugin_disabled("commonjs") {
        return PluginSlot::Disabled;
    }
    let mut options = user_options(config, "commonjs");
    let mut ignore: Vec<Value> = options
        .get("ignore")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    for name in config.externals.iter().filter_map(|e| e.as_name()) {
        let name = Value::String(name.to_string());
        if !ignore.contains(&name) {
            ignore.push(name);
        }
    }
    options["ignore"] = Value::Array(ignore);
    into_slot(options)
}

/// `process.env.NAME` constants from `env`, overlaid with the user's own
/// replacement values. Off when there is nothing to replace.
fn replace(config: &NormalizedConfig) -> PluginSlot {
    if config.plugin_disabled("replace") {
        return PluginSlot::Disabled;
    }
    let mut options = user_options(config, "replace");

    let mut values = Map::new();
    for (name, value) in &config.env {
        let literal = serde_json::to_string(value).unwrap_or_else(|_| "null".to_string());
        values.insert(format!("process.env.{name}"), Value::String(literal));
    }
    if let Some(Value::Object(user_values)) = options.get("values") {
        for (key, value) in user_values {
            values.insert(key.clone(), value.clone());
        }
    }

    if values.is_empty() {
        return PluginSlot::Disabled;
    }
    options["values"] = Value::Object(values);
    into_slot(options)
}
