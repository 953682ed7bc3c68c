//! Environment variables derived from an execution request.
//!
//! Commands receive their arguments, options and caller identity as
//! `COG_*` variables. This layer always has the highest precedence.

use relay_messages::{ExecutionRequest, Room};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

/// Flat environment handed to a command.
pub type Env = BTreeMap<String, String>;

/// Render a JSON value as an environment variable value.
///
/// Strings are used verbatim, null becomes empty and everything else is
/// written as compact JSON.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Variable name carrying the option `name`.
pub fn option_var(name: &str) -> String {
    format!("COG_OPT_{}", name.to_ascii_uppercase().replace('-', "_"))
}

/// Build the `COG_*` variables for a parsed request.
///
/// Option names are folded onto variable names, so distinct options such as
/// `dry-run` and `dry_run` can land on the same variable. Options are applied
/// in sorted name order and the later one wins; each clash is logged.
pub fn request_env(request: &ExecutionRequest) -> Env {
    let mut env = Env::new();

    env.insert("COG_BUNDLE".into(), request.bundle_name().to_string());
    env.insert("COG_COMMAND".into(), request.command_name().to_string());
    env.insert("COG_PIPELINE_ID".into(), request.pipeline_id().to_string());
    env.insert("COG_INVOCATION_ID".into(), request.invocation_id.clone());
    env.insert("COG_INVOCATION_STEP".into(), request.invocation_step.clone());

    env.insert("COG_ARGC".into(), request.args.len().to_string());
    for (index, arg) in request.args.iter().enumerate() {
        env.insert(format!("COG_ARGV_{}", index), render_value(arg));
    }

    let mut names: Vec<&String> = request.options.keys().collect();
    names.sort();
    let opts = names
        .iter()
        .map(|name| name.as_str())
        .collect::<Vec<_>>()
        .join(",");
    env.insert("COG_OPTS".into(), opts);
    for name in names {
        let var = option_var(name);
        let value = &request.options[name];
        if let Value::Array(items) = value {
            let count = items.len().to_string();
            insert_option_var(&mut env, name, format!("{}_COUNT", var), count);
            for (index, item) in items.iter().enumerate() {
                insert_option_var(&mut env, name, format!("{}_{}", var, index), render_value(item));
            }
        }
        insert_option_var(&mut env, name, var, render_value(value));
    }

    env.insert("COG_CHAT_HANDLE".into(), request.requestor.handle.clone());
    env.insert("COG_CHAT_PROVIDER".into(), request.requestor.provider.clone());
    env.insert("COG_ROOM".into(), request.room.name().to_string());
    env.insert("COG_USER".into(), request.user.username.clone());
    env.insert("COG_SERVICE_TOKEN".into(), request.service_token.clone());
    env.insert("COG_SERVICES_ROOT".into(), request.services_root.clone());

    env
}

fn insert_option_var(env: &mut Env, option: &str, var: String, value: String) {
    if let Some(previous) = env.insert(var.clone(), value) {
        warn!(
            option,
            var = %var,
            previous = %previous,
            "Option overwrites a variable set by another option"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parsed_request() -> ExecutionRequest {
        let mut req = ExecutionRequest::from_json(
            &json!({
                "command": "operable:echo",
                "reply_to": "/bot/pipelines/p-42/reply",
                "invocation_id": "inv-7",
                "invocation_step": "first",
                "args": ["hello", 3, null, {"k": "v"}],
                "options": {"dry-run": true, "tags": ["a", "b"], "name": "web"},
                "requestor": {"id": 99, "handle": "pat", "provider": "hipchat"},
                "user": {"username": "pdoe"},
                "room": {"name": "ops"},
                "service_token": "svc-token",
                "services_root": "http://svc"
            })
            .to_string(),
        )
        .unwrap();
        req.parse().unwrap();
        req
    }

    #[test]
    fn test_render_value() {
        assert_eq!(render_value(&json!("text")), "text");
        assert_eq!(render_value(&json!(12)), "12");
        assert_eq!(render_value(&json!(1.5)), "1.5");
        assert_eq!(render_value(&json!(false)), "false");
        assert_eq!(render_value(&Value::Null), "");
        assert_eq!(render_value(&json!({"a": [1, 2]})), r#"{"a":[1,2]}"#);
    }

    #[test]
    fn test_option_var() {
        assert_eq!(option_var("verbose"), "COG_OPT_VERBOSE");
        assert_eq!(option_var("dry-run"), "COG_OPT_DRY_RUN");
    }

    #[test]
    fn test_request_env_identity_and_routing() {
        let env = request_env(&parsed_request());

        assert_eq!(env["COG_BUNDLE"], "operable");
        assert_eq!(env["COG_COMMAND"], "echo");
        assert_eq!(env["COG_PIPELINE_ID"], "p-42");
        assert_eq!(env["COG_INVOCATION_ID"], "inv-7");
        assert_eq!(env["COG_INVOCATION_STEP"], "first");
        assert_eq!(env["COG_CHAT_HANDLE"], "pat");
        assert_eq!(env["COG_CHAT_PROVIDER"], "hipchat");
        assert_eq!(env["COG_ROOM"], "ops");
        assert_eq!(env["COG_USER"], "pdoe");
        assert_eq!(env["COG_SERVICE_TOKEN"], "svc-token");
        assert_eq!(env["COG_SERVICES_ROOT"], "http://svc");
    }

    #[test]
    fn test_request_env_positional_args() {
        let env = request_env(&parsed_request());

        assert_eq!(env["COG_ARGC"], "4");
        assert_eq!(env["COG_ARGV_0"], "hello");
        assert_eq!(env["COG_ARGV_1"], "3");
        assert_eq!(env["COG_ARGV_2"], "");
        assert_eq!(env["COG_ARGV_3"], r#"{"k":"v"}"#);
        assert!(!env.contains_key("COG_ARGV_4"));
    }

    #[test]
    fn test_request_env_options() {
        let env = request_env(&parsed_request());

        assert_eq!(env["COG_OPTS"], "dry-run,name,tags");
        assert_eq!(env["COG_OPT_DRY_RUN"], "true");
        assert_eq!(env["COG_OPT_NAME"], "web");
        assert_eq!(env["COG_OPT_TAGS"], r#"["a","b"]"#);
        assert_eq!(env["COG_OPT_TAGS_COUNT"], "2");
        assert_eq!(env["COG_OPT_TAGS_0"], "a");
        assert_eq!(env["COG_OPT_TAGS_1"], "b");
    }

    #[test]
    fn test_colliding_option_names_later_wins() {
        let mut req = ExecutionRequest::from_json(
            &json!({
                "command": "a:b",
                "reply_to": "w/x/y/z",
                "options": {
                    "dry-run": "first",
                    "dry_run": "second",
                    "tags": ["a", "b"],
                    "tags_0": "scalar"
                }
            })
            .to_string(),
        )
        .unwrap();
        req.parse().unwrap();
        let env = request_env(&req);

        assert_eq!(env["COG_OPTS"], "dry-run,dry_run,tags,tags_0");
        assert_eq!(env["COG_OPT_DRY_RUN"], "second");
        assert_eq!(env["COG_OPT_TAGS_0"], "scalar");
        assert_eq!(env["COG_OPT_TAGS_1"], "b");
        assert_eq!(env["COG_OPT_TAGS_COUNT"], "2");
    }

    #[test]
    fn test_request_env_without_options() {
        let mut req = ExecutionRequest::default();
        req.command = "a:b".to_string();
        req.reply_to = "w/x/y/z".to_string();
        req.parse().unwrap();
        let env = request_env(&req);

        assert_eq!(env["COG_ARGC"], "0");
        assert_eq!(env["COG_OPTS"], "");
        assert!(!env.keys().any(|k| k.starts_with("COG_OPT_")));
    }
}
