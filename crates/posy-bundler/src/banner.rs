//! Banner comment rendering.

use chrono::Datelike;
use posy_config::{Author, Banner, BannerFields};
use serde_json::Value;

/// Render the banner placed at the top of every output file.
///
/// `true` builds a license comment from `package.json`; an object does the
/// same with its fields taking precedence; a string is used verbatim.
pub fn render_banner(banner: Option<&Banner>, package: &Value) -> String {
    match banner {
        None | Some(Banner::Toggle(false)) => String::new(),
        Some(Banner::Text(text)) => text.clone(),
        Some(Banner::Toggle(true)) => license_comment(&BannerFields::default(), package),
        Some(Banner::Fields(fields)) => license_comment(fields, package),
    }
}

fn license_comment(fields: &BannerFields, package: &Value) -> String {
    let from_package = |key: &str| package.get(key).and_then(Value::as_str).map(str::to_string);

    let name = fields.name.clone().or_else(|| from_package("name")).unwrap_or_default();
    let version = fields
        .version
        .clone()
        .or_else(|| from_package("version"))
        .unwrap_or_default();
    let license = fields.license.clone().or_else(|| from_package("license"));
    let author = fields
        .author
        .clone()
        .or_else(|| package.get("author").cloned().and_then(|a| serde_json::from_value(a).ok()));
    let year = match &fields.year {
        Some(Value::String(year)) => year.clone(),
        Some(Value::Number(year)) => year.to_string(),
        _ => chrono::Local::now().year().to_string(),
    };

    let mut comment = format!("/*!\n * {name} v{version}\n * (c) {year}");
    if let Some(author) = author.as_ref().map(author_text).filter(|a| !a.is_empty()) {
        comment.push(' ');
        comment.push_str(&author);
    }
    comment.push('\n');
    if let Some(license) = license {
        comment.push_str(&format!(" * Released under the {license} License.\n"));
    }
    comment.push_str(" */");
    comment
}

/// `name <email> (url)`, omitting the parts that are missing.
fn author_text(author: &Author) -> String {
    match author {
        Author::Text(text) => text.clone(),
        Author::Person { name, email, url } => {
            let mut text = name.clone();
            if let Some(email) = email {
                text.push_str(&format!(" <{email}>"));
            }
            if let Some(url) = url {
                text.push_str(&format!(" ({url})"));
            }
            text
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn package() -> Value {
        json!({
            "name": "posy-demo",
            "version": "1.2.3",
            "license": "MIT",
            "author": { "name": "Jo", "email": "jo@example.com" }
        })
    }

    #[test]
    fn unset_or_false_renders_nothing() {
        assert_eq!(render_banner(None, &package()), "");
        assert_eq!(render_banner(Some(&Banner::Toggle(false)), &package()), "");
    }

    #[test]
    fn text_is_verbatim() {
        let banner = Banner::Text("/* hi */".into());
        assert_eq!(render_banner(Some(&banner), &package()), "/* hi */");
    }

    #[test]
    fn true_uses_package_metadata() {
        let banner = Banner::Fields(BannerFields {
            year: Some(json!(2020)),
            ..Default::default()
        });
        assert_eq!(
            render_banner(Some(&banner), &package()),
            "/*!\n * posy-demo v1.2.3\n * (c) 2020 Jo <jo@example.com>\n * Released under the MIT License.\n */"
        );
    }

    #[test]
    fn fields_override_package() {
        let banner = Banner::Fields(BannerFields {
            name: Some("other".into()),
            author: Some(Author::Text("Team".into())),
            license: None,
            version: Some("9.0.0".into()),
            year: Some(json!("2019-2024")),
        });
        let rendered = render_banner(Some(&banner), &json!({ "name": "ignored" }));
        assert_eq!(rendered, "/*!\n * other v9.0.0\n * (c) 2019-2024 Team\n */");
    }

    #[test]
    fn missing_year_falls_back_to_current() {
        let rendered = render_banner(Some(&Banner::Toggle(true)), &package());
        let year = chrono::Local::now().year().to_string();
        assert!(rendered.contains(&format!("(c) {year} Jo")));
    }
}
