/// envelope structs exchanged with the supervisor and the validator that
/// guards every inbound message.
///
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// the only inbound message type a worker accepts
pub const TASK_ASSIGNMENT: &str = "task_assignment";
/// the type tag on every reply
pub const TASK_RESULT: &str = "task_result";

pub const REQUIRED_FIELDS: [&str; 6] = [
    "message_id",
    "sender",
    "recipient",
    "type",
    "task",
    "timestamp",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskParameters {
    pub dependency: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_patterns: Option<Vec<String>>,
}

impl TaskParameters {
    pub fn new(dependency: &str, version: &str, search_patterns: Option<Vec<String>>) -> Self {
        TaskParameters {
            dependency: dependency.to_string(),
            version: version.to_string(),
            search_patterns,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub name: String,
    pub parameters: TaskParameters,
}

/// an inbound task assignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub message_id: Value,
    pub sender: String,
    pub recipient: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub task: Task,
    pub timestamp: Value,
}

/// the reply sent back to the original sender
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyEnvelope {
    pub message_id: Value,
    pub sender: String,
    pub recipient: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub result: Value,
    pub timestamp: String,
}

impl ReplyEnvelope {
    /// build the task_result reply for `request`, sent from `worker_id`
    pub fn reply_to(request: &Envelope, worker_id: &str, result: Value) -> ReplyEnvelope {
        ReplyEnvelope {
            message_id: request.message_id.clone(),
            sender: worker_id.to_string(),
            recipient: request.sender.clone(),
            kind: TASK_RESULT.to_string(),
            result,
            timestamp: now_rfc3339(),
        }
    }
}

pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// the structured error result returned whenever a task cannot produce a payload
pub fn error_result(message: &str) -> Value {
    serde_json::json!({
        "status": "error",
        "message": message,
    })
}

/// Check a raw message for structural and semantic well-formedness.
///
/// Checks run in order and stop at the first failure; the error string is a
/// human readable reason naming the offending field.
pub fn validate(message: &Value) -> Result<(), String> {
    let msg = match message.as_object() {
        Some(m) => m,
        None => return Err("message must be a json object".to_string()),
    };

    for field in REQUIRED_FIELDS.iter() {
        if !msg.contains_key(*field) {
            return Err(format!("missing required field: {}", field));
        }
    }

    for field in ["sender", "recipient"] {
        if !msg[field].is_string() {
            return Err(format!("{} must be a string", field));
        }
    }

    match msg.get("type").and_then(Value::as_str) {
        Some(TASK_ASSIGNMENT) => (),
        _ => {
            return Err(format!("unsupported message type: {}", msg["type"]));
        }
    }

    let task = match msg.get("task").and_then(Value::as_object) {
        Some(t) => t,
        None => return Err("task must be an object".to_string()),
    };

    if !task.contains_key("name") || !task.contains_key("parameters") {
        return Err("task must contain 'name' and 'parameters'".to_string());
    }

    if !task["name"].is_string() {
        return Err("task.name must be a string".to_string());
    }

    let params = match task.get("parameters").and_then(Value::as_object) {
        Some(p) => p,
        None => return Err("task.parameters must be an object".to_string()),
    };

    if !params.contains_key("dependency") || !params.contains_key("version") {
        return Err("task.parameters must contain 'dependency' and 'version'".to_string());
    }

    for field in ["dependency", "version"] {
        if !params[field].is_string() {
            return Err(format!("task.parameters.{} must be a string", field));
        }
    }

    match params.get("search_patterns") {
        None | Some(Value::Null) => Ok(()),
        Some(Value::Array(list)) if list.iter().all(Value::is_string) => Ok(()),
        Some(Value::Array(_)) => Err("search_patterns must contain only strings".to_string()),
        Some(_) => Err("search_patterns must be a list or null".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_message() -> Value {
        json!({
            "message_id": "task123",
            "sender": "SupervisorAgent_Main",
            "recipient": "WorkerAgent_Dependency",
            "type": "task_assignment",
            "task": {
                "name": "dependency_health_check",
                "parameters": {
                    "dependency": "axios",
                    "version": "^1.5.0",
                    "search_patterns": ["*.js"]
                }
            },
            "timestamp": "2025-11-13T12:00:00Z"
        })
    }

    #[test]
    fn accepts_valid_message() {
        assert!(validate(&valid_message()).is_ok());

        let mut msg = valid_message();
        msg["task"]["parameters"]["search_patterns"] = Value::Null;
        assert!(validate(&msg).is_ok());

        msg["task"]["parameters"]
            .as_object_mut()
            .unwrap()
            .remove("search_patterns");
        assert!(validate(&msg).is_ok());
    }

    #[test]
    fn each_missing_field_is_named() {
        for field in REQUIRED_FIELDS.iter() {
            let mut msg = valid_message();
            msg.as_object_mut().unwrap().remove(*field);
            let reason = validate(&msg).unwrap_err();
            assert!(reason.contains(field), "reason '{}' should name {}", reason, field);
        }
    }

    #[test]
    fn rejects_other_types() {
        let mut msg = valid_message();
        msg["type"] = json!("status_request");
        let reason = validate(&msg).unwrap_err();
        assert!(reason.contains("unsupported"));
        assert!(reason.contains("status_request"));
    }

    #[test]
    fn rejects_bad_task_shapes() {
        let mut msg = valid_message();
        msg["task"] = json!("scan axios");
        assert_eq!(validate(&msg).unwrap_err(), "task must be an object");

        let mut msg = valid_message();
        msg["task"].as_object_mut().unwrap().remove("name");
        assert!(validate(&msg).unwrap_err().contains("name"));

        let mut msg = valid_message();
        msg["task"]["parameters"] = json!(["axios"]);
        assert!(validate(&msg).unwrap_err().contains("parameters"));
    }

    #[test]
    fn missing_version_names_dependency_and_version() {
        let mut msg = valid_message();
        msg["task"]["parameters"]
            .as_object_mut()
            .unwrap()
            .remove("version");
        let reason = validate(&msg).unwrap_err();
        assert!(reason.contains("dependency"));
        assert!(reason.contains("version"));
    }

    #[test]
    fn search_patterns_must_be_a_list() {
        let mut msg = valid_message();
        msg["task"]["parameters"]["search_patterns"] = json!("*.js");
        assert!(validate(&msg).unwrap_err().contains("search_patterns"));
    }

    #[test]
    fn rejects_wrong_field_types() {
        let cases = [
            ("/sender", json!(7), "sender"),
            ("/recipient", json!(["a"]), "recipient"),
            ("/task/name", json!(null), "task.name"),
            ("/task/parameters/dependency", json!(42), "dependency"),
            ("/task/parameters/version", json!(1.5), "version"),
            ("/task/parameters/search_patterns", json!([1]), "search_patterns"),
        ];

        for (pointer, value, field) in cases.iter() {
            let mut msg = valid_message();
            *msg.pointer_mut(pointer).unwrap() = value.clone();
            let reason = validate(&msg).unwrap_err();
            assert!(reason.contains(field), "reason '{}' should name {}", reason, field);
        }
    }

    #[test]
    fn timestamp_is_not_interpreted() {
        let mut msg = valid_message();
        msg["timestamp"] = json!(1_731_499_200);
        assert!(validate(&msg).is_ok());

        let envelope: Envelope = serde_json::from_value(msg).unwrap();
        assert_eq!(envelope.timestamp, json!(1_731_499_200));
    }

    #[test]
    fn rejects_non_objects() {
        assert!(validate(&json!([1, 2, 3])).is_err());
    }

    #[test]
    fn reply_echoes_request() {
        let request: Envelope = serde_json::from_value(valid_message()).unwrap();
        let reply = ReplyEnvelope::reply_to(&request, "WorkerAgent_Dependency", json!({"ok": true}));

        assert_eq!(reply.message_id, json!("task123"));
        assert_eq!(reply.recipient, "SupervisorAgent_Main");
        assert_eq!(reply.sender, "WorkerAgent_Dependency");
        assert_eq!(reply.kind, TASK_RESULT);

        let js = serde_json::to_value(&reply).unwrap();
        assert_eq!(js["type"], json!("task_result"));
    }
}
