//! Per-task engine configuration: plugin tables, naming and hooks.

mod helpers;

use std::borrow::Cow;
use std::sync::Arc;

use async_trait::async_trait;
use helpers::{MockEngine, create_project, test_bundler, test_options, write_file};
use posy_bundler::{
    Bundler, DependencyRegistry, Error, FailureOrigin, Plugin, ResolveError, RunOptions,
    factory_fn,
};
use posy_config::{Config, ConfigSource, EngineFormat, PluginSlot};
use pretty_assertions::assert_eq;
use serde_json::json;

struct Inline(&'static str);

#[async_trait]
impl Plugin for Inline {
    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed(self.0)
    }
}

#[tokio::test]
async fn default_pipeline_runs_plugins_in_convention_order() {
    let project = create_project();
    let engine = MockEngine::new();
    let bundler = test_bundler(&project, Config::default(), &engine);

    bundler.run(RunOptions::default()).await.expect("run");

    let analyzed = engine.analyzed();
    assert_eq!(analyzed.len(), 1);
    assert_eq!(
        analyzed[0].plugins,
        vec![
            "progress",
            "@rollup/plugin-url",
            "@svgr/rollup",
            "@rollup/plugin-json",
            "rollup-plugin-hashbang",
            "node-resolve",
            "rollup-plugin-postcss",
            "babel",
            "@rollup/plugin-alias",
            "@rollup/plugin-commonjs",
            "record-bundle",
        ]
    );
}

#[tokio::test]
async fn typescript_entry_enables_typescript2() {
    let project = create_project();
    write_file(&project, "src/index.ts", "export const a: number = 1;\n");
    let engine = MockEngine::new();
    let bundler = test_bundler(&project, Config::default().with_input("src/index.ts"), &engine);

    bundler.run(RunOptions::default()).await.expect("run");

    let plugins = &engine.analyzed()[0].plugins;
    let ts = plugins.iter().position(|p| p == "rollup-plugin-typescript2");
    let babel = plugins.iter().position(|p| p == "babel");
    assert!(ts.is_some() && ts < babel, "typescript2 runs before babel: {plugins:?}");
}

#[tokio::test]
async fn minified_umd_gets_terser_with_banner_preamble() {
    let project = create_project();
    let engine = MockEngine::new();
    let config = Config::from_value(json!({
        "banner": true,
        "output": { "format": ["umd", "umd-min"], "moduleName": "Demo" },
    }))
    .expect("config");
    let bundler = test_bundler(&project, config, &engine);

    bundler.run(RunOptions::default()).await.expect("run");

    let analyzed = engine.analyzed();
    let outputs = engine.outputs();
    assert!(analyzed[0].package_options("rollup-plugin-terser").is_none());

    let banner = &outputs[1].banner;
    assert!(banner.starts_with("/*!\n * demo v1.2.3\n * (c) "));
    assert!(banner.contains(" Jane\n * Released under the MIT License.\n */"));
    assert_eq!(
        analyzed[1].package_options("rollup-plugin-terser"),
        Some(&json!({ "output": { "preamble": banner } }))
    );

    assert_eq!(outputs[0].entry_file_names, "[name].umd.js");
    assert_eq!(outputs[1].entry_file_names, "[name].umd.min.js");
    assert!(!outputs[0].sourcemap);
    assert!(outputs[1].sourcemap);
    assert_eq!(outputs[1].format, EngineFormat::Umd);
    assert_eq!(outputs[1].name.as_deref(), Some("Demo"));
}

#[tokio::test]
async fn output_names_follow_format_defaults_and_templates() {
    let project = create_project();
    let engine = MockEngine::new();
    let config = Config::default().with_formats(["cjs", "esm"]);
    let bundler = test_bundler(&project, config, &engine);
    bundler.run(RunOptions::default()).await.expect("run");

    let names: Vec<_> = engine
        .outputs()
        .into_iter()
        .map(|o| o.entry_file_names)
        .collect();
    assert_eq!(names, vec!["[name].js", "[name].esm.js"]);
    assert_eq!(engine.outputs()[0].dir, project.path().join("dist"));

    let engine = MockEngine::new();
    let config = Config::from_value(json!({ "output": { "fileName": "[name][min].mjs" } }))
        .expect("config")
        .with_formats(["esm-min"]);
    let bundler = test_bundler(&project, config, &engine);
    bundler.run(RunOptions::default()).await.expect("run");
    assert_eq!(engine.outputs()[0].entry_file_names, "[name].min.mjs");
}

#[tokio::test]
async fn globals_become_externals_and_env_becomes_replacements() {
    let project = create_project();
    let engine = MockEngine::new();
    let config = Config::from_value(json!({
        "globals": { "jquery": "$", "./local": "Local" },
    }))
    .expect("config")
    .with_env("NODE_ENV", "production");
    let bundler = test_bundler(&project, config, &engine);

    bundler.run(RunOptions::default()).await.expect("run");

    let analyzed = &engine.analyzed()[0];
    assert_eq!(analyzed.external, vec!["jquery"]);
    assert_eq!(
        analyzed.package_options("@rollup/plugin-replace"),
        Some(&json!({ "values": { "process.env.NODE_ENV": "\"production\"" } }))
    );
}

#[tokio::test]
async fn explicit_false_removes_a_plugin() {
    let project = create_project();
    let engine = MockEngine::new();
    let config = Config::default()
        .with_plugin("json", PluginSlot::Disabled)
        .with_plugin("progress", PluginSlot::Disabled);
    let bundler = test_bundler(&project, config, &engine);

    bundler.run(RunOptions::default()).await.expect("run");

    let plugins = &engine.analyzed()[0].plugins;
    assert!(!plugins.iter().any(|p| p == "@rollup/plugin-json"));
    assert!(!plugins.iter().any(|p| p == "progress"));
}

#[tokio::test]
async fn resolve_overrides_and_registry_factories_are_used() {
    let project = create_project();
    let engine = MockEngine::new();

    let mut registry = DependencyRegistry::with_defaults();
    registry.register(
        "@rollup/plugin-url",
        factory_fn(|_| Ok(Arc::new(Inline("native-url")))),
    );
    let options = test_options(&project)
        .registry(registry)
        .resolve_plugin("json", factory_fn(|_| Ok(Arc::new(Inline("my-json")))))
        .resolve_plugin("extra", factory_fn(|_| Ok(Arc::new(Inline("extra")))));
    let config = Config::default().with_plugin("extra", PluginSlot::enabled());
    let bundler = Bundler::new(config, options, Arc::new(engine.clone())).expect("bundler");

    bundler.run(RunOptions::default()).await.expect("run");

    let plugins = &engine.analyzed()[0].plugins;
    assert_eq!(plugins[1], "native-url");
    assert_eq!(plugins[3], "my-json");
    assert_eq!(plugins[plugins.len() - 2], "extra");
    assert_eq!(plugins[plugins.len() - 1], "record-bundle");
}

#[tokio::test]
async fn vue_sources_enable_the_bundled_vue_plugin() {
    let project = create_project();
    write_file(&project, "src/App.vue", "<template><div /></template>\n");
    let engine = MockEngine::new();
    let bundler = test_bundler(&project, Config::default().with_input("src/App.vue"), &engine);

    bundler.run(RunOptions::default()).await.expect("run");

    let analyzed = engine.analyzed();
    let plugins = &analyzed[0].plugins;
    let vue = plugins.iter().position(|p| p == "rollup-plugin-vue");
    let babel = plugins.iter().position(|p| p == "babel");
    assert!(vue.is_some() && vue < babel, "vue runs before babel: {plugins:?}");
    assert_eq!(
        analyzed[0].package_options("rollup-plugin-vue"),
        Some(&json!({ "css": false, "isProduction": true }))
    );
}

#[tokio::test]
async fn missing_project_plugin_fails_the_task() {
    let project = create_project();
    let engine = MockEngine::new();
    let config = Config::default().with_plugin("graphql", PluginSlot::enabled());
    let bundler = test_bundler(&project, config, &engine);

    let err = bundler.run(RunOptions::default()).await.err().expect("run fails");
    let Error::Bundle(failure) = &err else {
        panic!("expected a task failure, got {err:?}");
    };
    assert_eq!(failure.origin, FailureOrigin::Pipeline);
    assert_eq!(failure.title, "Bundle src/index.js in cjs format");
    assert!(matches!(
        failure.source.as_ref(),
        Error::Resolve(ResolveError::NotFound { name, .. }) if name == "graphql"
    ));
    assert!(engine.analyzed().is_empty());

    std::fs::create_dir_all(project.path().join("node_modules/rollup-plugin-graphql"))
        .expect("install plugin");
    bundler.run(RunOptions::default()).await.expect("run");
    let plugins = &engine.analyzed()[0].plugins;
    assert_eq!(plugins[plugins.len() - 2], "rollup-plugin-graphql");
}

#[tokio::test]
async fn config_hooks_shape_each_task() {
    let project = create_project();
    let engine = MockEngine::new();
    let config = Config::default()
        .with_formats(["cjs", "esm"])
        .with_extend_config(|mut config, ctx| {
            if ctx.format.as_str() == "esm" {
                config.output.module_name = Some("FromHook".into());
            }
            config
        });
    let options = test_options(&project).extend_engine_config(|mut engine_config| {
        engine_config.output.sourcemap_exclude_sources = true;
        engine_config
    });
    let bundler = Bundler::new(config, options, Arc::new(engine.clone())).expect("bundler");

    bundler.run(RunOptions::default()).await.expect("run");

    let outputs = engine.outputs();
    assert_eq!(outputs[0].name, None);
    assert_eq!(outputs[1].name.as_deref(), Some("FromHook"));
    assert!(outputs.iter().all(|o| o.sourcemap_exclude_sources));
}

#[tokio::test]
async fn project_config_file_is_layered_under_programmatic_config() {
    let project = create_project();
    write_file(
        &project,
        "posy.config.json",
        r#"{ "output": { "format": "esm,umd", "dir": "lib" } }"#,
    );
    let engine = MockEngine::new();
    let options = test_options(&project).config_file(ConfigSource::Auto);

    let bundler = Bundler::new(Config::default(), options.clone(), Arc::new(engine.clone()))
        .expect("bundler");
    assert_eq!(
        bundler.config_path(),
        Some(project.path().join("posy.config.json").as_path())
    );
    let titles: Vec<_> = bundler.tasks().into_iter().map(|t| t.title).collect();
    assert_eq!(
        titles,
        vec![
            "Bundle src/index.js in esm format",
            "Bundle src/index.js in umd format",
        ]
    );

    let bundler = Bundler::new(
        Config::default().with_formats(["cjs"]),
        options,
        Arc::new(engine.clone()),
    )
    .expect("bundler");
    let tasks = bundler.tasks();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].format.as_str(), "cjs");
    assert_eq!(bundler.config().output.dir, project.path().join("lib"));
}
