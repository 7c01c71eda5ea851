//! Typed action declarations and the strict parser boundary.
//!
//! Agents declare actions inside a fenced ` ```actions ` block containing a
//! JSON array. The block is schema-checked here with serde before anything
//! reaches the orchestrator's mutation logic, so prompt-format drift cannot
//! leak into world-state transitions. A missing block means zero actions; a
//! present but syntactically broken block is a malformed response and feeds
//! the adapter's retry policy.

use serde::{Deserialize, Serialize};

use sandtable_geo::Position;

use crate::world::Posture;

/// An action declared by a commander. Validation (ownership, reachability)
/// happens in the orchestrator; this type only fixes the schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeclaredAction {
    /// Move a unit toward a destination position.
    MoveUnit { unit_id: String, to: Position },

    /// Engage a hostile unit within weapon range.
    Engage { unit_id: String, target_id: String },

    /// Change a unit's operating posture.
    SetPosture { unit_id: String, posture: Posture },

    /// Restore strength to a friendly unit.
    Reinforce { unit_id: String, amount: f64 },
}

impl DeclaredAction {
    /// The id of the unit this action operates on.
    pub fn unit_id(&self) -> &str {
        match self {
            DeclaredAction::MoveUnit { unit_id, .. }
            | DeclaredAction::Engage { unit_id, .. }
            | DeclaredAction::SetPosture { unit_id, .. }
            | DeclaredAction::Reinforce { unit_id, .. } => unit_id,
        }
    }
}

/// Extract the fenced ` ```actions ` block from agent output, if present.
fn actions_block(content: &str) -> Option<&str> {
    let start_tag = "```actions";
    let start = content.find(start_tag)?;
    let body = &content[start + start_tag.len()..];
    let end = body.find("```")?;
    Some(body[..end].trim())
}

/// Parse declared actions out of free-text agent output.
///
/// Returns `Ok(vec![])` when no actions block is present (a purely
/// qualitative turn is legitimate). Returns `Err` with a parse detail when a
/// block exists but is not a valid JSON array of action objects.
pub fn parse_actions(content: &str) -> Result<Vec<DeclaredAction>, String> {
    let Some(block) = actions_block(content) else {
        return Ok(Vec::new());
    };
    serde_json::from_str::<Vec<DeclaredAction>>(block)
        .map_err(|e| format!("invalid actions block: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_actions_absent_block_is_empty() {
        let actions = parse_actions("I will hold position and observe.").unwrap();
        assert!(actions.is_empty());
    }

    #[test]
    fn test_parse_actions_move_and_engage() {
        let content = r#"
### RECOMMENDED ACTION
Reposition the destroyers and engage the bomber wing.

```actions
[
  {"type": "move_unit", "unit_id": "blue_naval_1", "to": {"lat": 24.3, "lon": 119.8, "grid_ref": "TS-2500"}},
  {"type": "engage", "unit_id": "blue_air_1", "target_id": "red_air_2"}
]
```
"#;
        let actions = parse_actions(content).unwrap();
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].unit_id(), "blue_naval_1");
        assert!(matches!(actions[1], DeclaredAction::Engage { .. }));
    }

    #[test]
    fn test_parse_actions_set_posture_roundtrip() {
        let action = DeclaredAction::SetPosture {
            unit_id: "red_naval_2".to_string(),
            posture: Posture::Offensive,
        };
        let json = serde_json::to_string(&action).unwrap();
        assert!(json.contains("\"set_posture\""));
        let back: DeclaredAction = serde_json::from_str(&json).unwrap();
        assert_eq!(action, back);
    }

    #[test]
    fn test_parse_actions_malformed_block_is_error() {
        let content = "```actions\n[{\"type\": \"move_unit\", \"unit_id\": }]\n```";
        let err = parse_actions(content).unwrap_err();
        assert!(err.contains("invalid actions block"));
    }

    #[test]
    fn test_parse_actions_unknown_type_is_error() {
        let content = "```actions\n[{\"type\": \"launch_nukes\", \"unit_id\": \"x\"}]\n```";
        assert!(parse_actions(content).is_err());
    }

    #[test]
    fn test_parse_actions_preserves_declaration_order() {
        let content = r#"```actions
[
  {"type": "set_posture", "unit_id": "a", "posture": "defensive"},
  {"type": "set_posture", "unit_id": "b", "posture": "offensive"},
  {"type": "set_posture", "unit_id": "c", "posture": "patrol"}
]
```"#;
        let actions = parse_actions(content).unwrap();
        let ids: Vec<&str> = actions.iter().map(|a| a.unit_id()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }
}
