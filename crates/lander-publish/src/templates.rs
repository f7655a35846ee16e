//! Bootstrap script and offline launcher rendering.

use lander_config::ConfigSnapshot;
use lander_store::STORAGE_KEY;
use minijinja::{context, Environment};

/// Global the bootstrap script assigns the embedded configuration to.
pub const BOOTSTRAP_GLOBAL: &str = "__LANDING_CONFIG__";

const BOOTSTRAP_TEMPLATE: &str = r#"<script id="lander-bootstrap">
(function() {
  var config = {{ config }};
  try {
    var raw = JSON.stringify(config);
    window.localStorage.setItem({{ key }}, raw);
    window.sessionStorage.setItem({{ key }}, raw);
  } catch (e) {}
  window.{{ global }} = config;
})();
</script>"#;

/// Files written next to the bundle so it can be served without lander.
pub const LAUNCHER_FILES: [&str; 3] = [
    "README-OFFLINE.txt",
    "start-windows.bat",
    "start-mac-linux.sh",
];

const README_TEMPLATE: &str = r#"To use the landing page builder:

- Install Node.js: https://nodejs.org/en/download
- Run start-windows.bat (Windows) or start-mac-linux.sh (macOS/Linux) in this folder
- Open the URL shown in the terminal, then {{ editor }} to edit your landing page
- Click 'Publish ZIP' when finished
- Deploy the downloaded ZIP to any static host (e.g. Netlify)
"#;

const WINDOWS_TEMPLATE: &str = "@echo off\r\ncd /d \"%~dp0\"\r\nnpx --yes serve \"{{ site }}\"\r\n";

const UNIX_TEMPLATE: &str = r#"#!/usr/bin/env bash
cd "$(dirname "$0")"
npx --yes serve "{{ site }}"
"#;

/// Template engine for the scripts injected into published pages and the
/// launchers shipped with a bundle.
pub struct TemplateEngine {
    env: Environment<'static>,
}

impl TemplateEngine {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_keep_trailing_newline(true);

        env.add_template_owned("bootstrap".to_string(), BOOTSTRAP_TEMPLATE.to_string())
            .expect("Failed to add bootstrap template");

        let launchers = [README_TEMPLATE, WINDOWS_TEMPLATE, UNIX_TEMPLATE];
        for (name, source) in LAUNCHER_FILES.into_iter().zip(launchers) {
            env.add_template_owned(name.to_string(), source.to_string())
                .expect("Failed to add launcher template");
        }

        Self { env }
    }

    /// Render the launcher `name` (one of [`LAUNCHER_FILES`]) for a bundle in
    /// the directory `site` whose editor document is `editor`.
    pub fn launcher(
        &self,
        name: &str,
        site: &str,
        editor: &str,
    ) -> Result<String, minijinja::Error> {
        self.env.get_template(name)?.render(context! {
            site => site,
            editor => editor,
        })
    }

    /// Render the script that seeds storage and the global binding with `config`
    /// before any page script runs.
    pub fn bootstrap_script(&self, config: &ConfigSnapshot) -> Result<String, minijinja::Error> {
        let json = serde_json::to_string(config).map_err(|e| {
            minijinja::Error::new(minijinja::ErrorKind::InvalidOperation, e.to_string())
        })?;

        self.env.get_template("bootstrap")?.render(context! {
            config => script_safe(&json),
            key => script_safe(&format!("\"{}\"", STORAGE_KEY)),
            global => BOOTSTRAP_GLOBAL,
        })
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Escape a JSON document for inclusion inside an inline `<script>`.
///
/// The characters that could end the element or a JS string literal only ever
/// occur inside JSON strings, where their `\u` escapes are equivalent.
fn script_safe(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    for c in json.chars() {
        match c {
            '<' => out.push_str("\\u003c"),
            '>' => out.push_str("\\u003e"),
            '&' => out.push_str("\\u0026"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn embedded_json(script: &str) -> &str {
        let start = script.find("var config = ").unwrap() + "var config = ".len();
        let end = start + script[start..].find(";\n").unwrap();
        &script[start..end]
    }

    #[test]
    fn embeds_config_that_parses_back() {
        let engine = TemplateEngine::new();
        let config = ConfigSnapshot::default();

        let script = engine.bootstrap_script(&config).unwrap();
        let parsed: ConfigSnapshot = serde_json::from_str(embedded_json(&script)).unwrap();

        assert_eq!(parsed, config);
        assert!(script.contains(&format!("window.{} = config;", BOOTSTRAP_GLOBAL)));
        assert!(script.contains(r#"localStorage.setItem("landing-config", raw)"#));
    }

    #[test]
    fn launchers_serve_the_bundle_directory() {
        let engine = TemplateEngine::new();

        let unix = engine
            .launcher("start-mac-linux.sh", "site", "editor.html")
            .unwrap();
        let windows = engine
            .launcher("start-windows.bat", "site", "editor.html")
            .unwrap();
        let readme = engine
            .launcher("README-OFFLINE.txt", "site", "editor.html")
            .unwrap();

        assert_eq!(
            unix,
            "#!/usr/bin/env bash\ncd \"$(dirname \"$0\")\"\nnpx --yes serve \"site\"\n"
        );
        assert!(windows.starts_with("@echo off\r\n"));
        assert!(windows.ends_with("npx --yes serve \"site\"\r\n"));
        assert!(readme.contains("then editor.html to edit"));
    }

    #[test]
    fn unknown_launcher_is_an_error() {
        let engine = TemplateEngine::new();
        assert!(engine.launcher("start.ps1", "site", "editor.html").is_err());
    }

    #[test]
    fn closing_tags_in_content_cannot_break_out() {
        let engine = TemplateEngine::new();
        let mut config = ConfigSnapshot::default();
        config.hero.headline = "</script><script>alert(1)</script>\u{2028}".to_string();

        let script = engine.bootstrap_script(&config).unwrap();
        let json = embedded_json(&script);

        assert!(!json.contains("</script>"));
        assert!(!json.contains('\u{2028}'));
        let parsed: ConfigSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.hero.headline, config.hero.headline);
    }
}
