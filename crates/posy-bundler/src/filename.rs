//! Output filename templates.

use posy_config::{EngineFormat, FileNameContext, NormalizedConfig};

/// Default template for an engine format.
pub fn default_file_name(format: &EngineFormat) -> String {
    match format {
        EngineFormat::Cjs => "[name][min][ext]".to_string(),
        other => format!("[name].{other}[min][ext]"),
    }
}

/// The entry filename template for one task.
///
/// A configured filename function wins over `output.fileName`, which wins
/// over the format default. `[min]` becomes `min_placeholder` and `[ext]`
/// becomes `.js`.
pub fn entry_file_name(
    config: &NormalizedConfig,
    format: &EngineFormat,
    minify: bool,
    min_placeholder: &str,
) -> String {
    let default = default_file_name(format);
    let template = match (&config.hooks.file_name, &config.output.file_name) {
        (Some(hook), _) => hook(
            &FileNameContext {
                format: format.clone(),
                minify,
            },
            &default,
        ),
        (None, Some(file_name)) => file_name.clone(),
        (None, None) => default,
    };
    template
        .replacen("[min]", min_placeholder, 1)
        .replacen("[ext]", ".js", 1)
}
