//! `{{placeholder}}` substitution

use anyhow::Result;
use std::collections::BTreeMap;

/// Values available to templates
#[derive(Debug, Clone, Default)]
pub struct RenderContext {
    values: BTreeMap<String, String>,
}

impl RenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn extend<I>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.values.extend(pairs);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

/// Replace every `{{ name }}` in `template`.
///
/// An unknown name is an error so a typo in a template cannot reach a
/// generated build file. An unterminated `{{` is copied verbatim.
pub fn render(template: &str, ctx: &RenderContext) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        let Some(len) = rest[start + 2..].find("}}") else {
            break;
        };
        let name = rest[start + 2..start + 2 + len].trim();
        let value = ctx
            .get(name)
            .ok_or_else(|| anyhow::anyhow!("Unknown template placeholder '{{{{{}}}}}'", name))?;

        out.push_str(&rest[..start]);
        out.push_str(value);
        rest = &rest[start + 2 + len + 2..];
    }

    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_substitutes_values() {
        let ctx = RenderContext::new()
            .with("package", "com.example.app")
            .with("versions.kotlin", "1.9.22");
        let out = render(
            "namespace = \"{{package}}\"\nkotlin = \"{{ versions.kotlin }}\"\n",
            &ctx,
        )
        .unwrap();
        assert_eq!(out, "namespace = \"com.example.app\"\nkotlin = \"1.9.22\"\n");
    }

    #[test]
    fn test_kotlin_string_templates_untouched() {
        let ctx = RenderContext::new();
        let src = "println(\"${project.name}\")\n";
        assert_eq!(render(src, &ctx).unwrap(), src);
    }

    #[test]
    fn test_unknown_placeholder_is_error() {
        let err = render("{{nope}}", &RenderContext::new()).unwrap_err();
        assert!(err.to_string().contains("{{nope}}"));
    }

    #[test]
    fn test_unterminated_placeholder_copied() {
        let ctx = RenderContext::new().with("a", "1");
        assert_eq!(render("{{a}} {{b", &ctx).unwrap(), "1 {{b");
    }
}
