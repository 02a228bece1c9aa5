//! Trigger rendering.
//!
//! Each dialect has a template under `templates/triggers/`. Templates refer
//! to trigger attributes as `{{ .Name }}`, `{{ .ActionTime }}`,
//! `{{ .Event }}`, `{{ .For }}`, `{{ .Body }}` and `{{ .Table }}`.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use oxide_orm::{Trigger, TriggerEvent, TriggerFor, TriggerTime};

use crate::error::{LoadError, Result};

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*\.([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").unwrap());

/// Returns the trigger template for `dialect`.
///
/// # Errors
///
/// Returns [`LoadError::TemplateNotFound`] if `dialect` has no template.
pub fn template(dialect: &str) -> Result<&'static str> {
    match dialect {
        "mysql" => Ok(include_str!("../templates/triggers/mysql.tmpl")),
        "postgres" => Ok(include_str!("../templates/triggers/postgres.tmpl")),
        "sqlite" => Ok(include_str!("../templates/triggers/sqlite.tmpl")),
        "sqlserver" => Ok(include_str!("../templates/triggers/sqlserver.tmpl")),
        other => Err(LoadError::TemplateNotFound(other.to_string())),
    }
}

/// Values a template can refer to.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct TriggerContext<'a> {
    name: &'a str,
    action_time: TriggerTime,
    event: TriggerEvent,
    #[serde(rename = "For")]
    for_each: TriggerFor,
    body: &'a str,
    table: &'a str,
}

/// Renders `trigger` on `table` with the template of `dialect`.
///
/// # Errors
///
/// Returns an error if `dialect` has no template or rendering fails.
pub fn render(trigger: &Trigger, table: &str, dialect: &str) -> Result<String> {
    render_template(template(dialect)?, trigger, table)
}

/// Renders `trigger` on `table` with an explicit template.
///
/// # Errors
///
/// Returns [`LoadError::Render`] if the template refers to an unknown field
/// or leaves an action unclosed.
pub fn render_template(template: &str, trigger: &Trigger, table: &str) -> Result<String> {
    let fail = |message: String| LoadError::Render {
        trigger: trigger.name.clone(),
        message,
    };

    let context = serde_json::to_value(TriggerContext {
        name: &trigger.name,
        action_time: trigger.action_time,
        event: trigger.event,
        for_each: trigger.for_each,
        body: &trigger.body,
        table,
    })?;

    let mut out = String::with_capacity(template.len() + trigger.body.len());
    let mut last = 0;
    for caps in PLACEHOLDER.captures_iter(template) {
        let (Some(whole), Some(field)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let text = &template[last..whole.start()];
        if text.contains("{{") {
            return Err(fail("unclosed action".to_string()));
        }
        out.push_str(text);

        let value = context
            .get(field.as_str())
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| fail(format!("can't evaluate field {}", field.as_str())))?;
        out.push_str(value);
        last = whole.end();
    }

    let rest = &template[last..];
    if rest.contains("{{") {
        return Err(fail("unclosed action".to_string()));
    }
    out.push_str(rest);

    Ok(out.trim_end().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn audit() -> Trigger {
        Trigger::new(
            "user_audit",
            TriggerTime::After,
            TriggerEvent::Insert,
            "INSERT INTO user_audit (name) VALUES (NEW.name)",
        )
    }

    #[test]
    fn test_render_mysql() {
        assert_eq!(
            render(&audit(), "users", "mysql").unwrap(),
            "CREATE TRIGGER `user_audit` AFTER INSERT ON `users` FOR EACH ROW \
             INSERT INTO user_audit (name) VALUES (NEW.name)"
        );
    }

    #[test]
    fn test_render_sqlite() {
        assert_eq!(
            render(&audit(), "users", "sqlite").unwrap(),
            "CREATE TRIGGER `user_audit` AFTER INSERT ON `users` FOR EACH ROW\n\
             BEGIN\n  INSERT INTO user_audit (name) VALUES (NEW.name);\nEND"
        );
    }

    #[test]
    fn test_render_postgres_defines_function() {
        let sql = render(&audit(), "users", "postgres").unwrap();
        assert!(sql.starts_with(r#"CREATE OR REPLACE FUNCTION "user_audit_func"()"#));
        assert!(sql.ends_with(
            r#"CREATE TRIGGER "user_audit" AFTER INSERT ON "users" FOR EACH ROW EXECUTE FUNCTION "user_audit_func"()"#
        ));
    }

    #[test]
    fn test_render_sqlserver() {
        let trigger = Trigger::new("t", TriggerTime::InsteadOf, TriggerEvent::Delete, "SELECT 1");
        assert_eq!(
            render(&trigger, "pets", "sqlserver").unwrap(),
            "CREATE TRIGGER \"t\" ON \"pets\" INSTEAD OF DELETE AS\nBEGIN\n  SELECT 1;\nEND"
        );
    }

    #[test]
    fn test_unknown_dialect() {
        let err = render(&audit(), "users", "oracle").unwrap_err();
        assert!(matches!(err, LoadError::TemplateNotFound(ref d) if d == "oracle"));
    }

    #[test]
    fn test_unknown_field() {
        let err = render_template("CREATE TRIGGER {{ .Nope }}", &audit(), "users").unwrap_err();
        assert_eq!(
            err.to_string(),
            "failed to render trigger \"user_audit\": can't evaluate field Nope"
        );
    }

    #[test]
    fn test_unclosed_action() {
        let err = render_template("CREATE TRIGGER {{ .Name", &audit(), "users").unwrap_err();
        assert!(matches!(err, LoadError::Render { .. }));
    }
}
