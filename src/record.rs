//! The ingested record ("run") and its field accessors.
//!
//! A run is one measurement reported by the browser extension. The
//! schema binds columns to record fields through the [`Field`] enum,
//! so the emitters never touch struct members directly.

use serde::{Deserialize, Serialize};

/// One telemetry run reported by the extension.
///
/// The JSON wire shape uses camelCase names (`statusCode`,
/// `errorMessage`, ...). Unknown members are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Run {
    pub score: i64,
    pub status_code: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub plugin_version: String,
    pub plugin_name: String,
    pub extension_version: String,
    pub browser_version: String,
    pub browser_name: String,
    pub path: String,
    pub url: String,
}

/// The closed set of record fields a schema column may bind to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Score,
    StatusCode,
    ErrorMessage,
    PluginVersion,
    PluginName,
    ExtensionVersion,
    BrowserVersion,
    BrowserName,
    Path,
    Url,
}

/// A scalar field value borrowed from a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value<'a> {
    Int(i64),
    Text(&'a str),
}

impl Run {
    /// Look up a field value. `None` means the field is absent
    /// (only `errorMessage` can be).
    pub fn value(&self, field: Field) -> Option<Value<'_>> {
        match field {
            Field::Score => Some(Value::Int(self.score)),
            Field::StatusCode => Some(Value::Int(self.status_code)),
            Field::ErrorMessage => self.error_message.as_deref().map(Value::Text),
            Field::PluginVersion => Some(Value::Text(&self.plugin_version)),
            Field::PluginName => Some(Value::Text(&self.plugin_name)),
            Field::ExtensionVersion => Some(Value::Text(&self.extension_version)),
            Field::BrowserVersion => Some(Value::Text(&self.browser_version)),
            Field::BrowserName => Some(Value::Text(&self.browser_name)),
            Field::Path => Some(Value::Text(&self.path)),
            Field::Url => Some(Value::Text(&self.url)),
        }
    }

    /// Two fixture runs used by the `--mariadb-insert-test-run`
    /// admin command.
    pub fn fixtures() -> Vec<Run> {
        let first = Run {
            score: 10,
            status_code: 200,
            error_message: Some("IT'S A TEST :)".to_string()),
            plugin_version: "t1.23.415".to_string(),
            plugin_name: "DBTest".to_string(),
            extension_version: "0.0.1".to_string(),
            browser_version: "t1.234".to_string(),
            browser_name: "TestBrowser".to_string(),
            path: "/db/test".to_string(),
            url: "https://testdb.aau.dk".to_string(),
        };
        let second = Run {
            error_message: None,
            ..first.clone()
        };
        vec![first, second]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_camel_case_body() {
        let json = r#"{
            "score": 42,
            "statusCode": 200,
            "errorMessage": "boom",
            "pluginVersion": "1.0",
            "pluginName": "p",
            "extensionVersion": "0.0.1",
            "browserVersion": "99",
            "browserName": "b",
            "path": "/",
            "url": "https://example.org"
        }"#;
        let run: Run = serde_json::from_str(json).unwrap();
        assert_eq!(run.score, 42);
        assert_eq!(run.status_code, 200);
        assert_eq!(run.error_message.as_deref(), Some("boom"));
    }

    #[test]
    fn test_error_message_is_optional() {
        let json = r#"{
            "score": 1,
            "statusCode": 404,
            "pluginVersion": "1.0",
            "pluginName": "p",
            "extensionVersion": "0.0.1",
            "browserVersion": "99",
            "browserName": "b",
            "path": "/",
            "url": "https://example.org"
        }"#;
        let run: Run = serde_json::from_str(json).unwrap();
        assert_eq!(run.error_message, None);
        assert_eq!(run.value(Field::ErrorMessage), None);
    }

    #[test]
    fn test_unknown_member_rejected() {
        let json = r#"{
            "score": 1,
            "statusCode": 404,
            "pluginVersion": "1.0",
            "pluginName": "p",
            "extensionVersion": "0.0.1",
            "browserVersion": "99",
            "browserName": "b",
            "path": "/",
            "url": "https://example.org",
            "extra": true
        }"#;
        assert!(serde_json::from_str::<Run>(json).is_err());
    }

    #[test]
    fn test_value_accessor() {
        let run = Run::fixtures().remove(0);
        assert_eq!(run.value(Field::Score), Some(Value::Int(10)));
        assert_eq!(run.value(Field::PluginName), Some(Value::Text("DBTest")));
    }

    #[test]
    fn test_fixtures_differ_only_in_error_message() {
        let fixtures = Run::fixtures();
        assert_eq!(fixtures.len(), 2);
        assert!(fixtures[0].error_message.is_some());
        assert!(fixtures[1].error_message.is_none());
        assert_eq!(fixtures[0].plugin_name, fixtures[1].plugin_name);
    }
}
