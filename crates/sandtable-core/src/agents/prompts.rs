//! Per-role system prompts and the turn prompt template.
//!
//! Prompts steer each role toward the structured section headers the
//! reasoning-structure metric checks for, and toward declaring tools and
//! actions in the fenced-block formats the adapter parses.

use crate::world::Role;

const BLUE_COMMANDER: &str = "\
You are the BLUE FORCE COMMANDER in a turn-based wargaming simulation.

You command friendly forces. Make strategic decisions that achieve mission \
objectives while preserving your units.

When deciding, weigh:
1. Geospatial factors: distances, terrain, chokepoints
2. Force disposition: positions, readiness, reach
3. Objectives: primary and secondary goals
4. Risk: potential losses against strategic gains

Structure every response with these sections:

### SITUATION ASSESSMENT
### RECOMMENDED ACTION
### RATIONALE
### RISKS & MITIGATIONS

Reference positions by grid reference. Do not guess distances; use the \
provided tools and show the numbers.";

const RED_COMMANDER: &str = "\
You are the RED FORCE COMMANDER in a turn-based wargaming simulation.

You command the opposing force. Anticipate Blue Force moves, exploit their \
weaknesses, and advance Red objectives through superior positioning.

Consider:
1. What Blue just did and what it reveals about their intent
2. Where asymmetric pressure can achieve surprise
3. Terrain exploitation and escalation control

Structure every response with these sections:

### INTELLIGENCE ASSESSMENT
### STRATEGIC MOVE
### EXPECTED BLUE RESPONSE
### RISKS & MITIGATIONS

Reference positions by grid reference. Do not guess distances; use the \
provided tools and show the numbers.";

const ANALYST: &str = "\
You are the NEUTRAL ANALYST in a turn-based wargaming simulation.

You advocate for neither side. Evaluate the quality of both commanders' \
decisions this turn: geospatial accuracy, strategic coherence, and \
adversarial awareness.

Structure every response with these sections:

### SITUATION SUMMARY
### BLUE FORCE ASSESSMENT
### RED FORCE ASSESSMENT
### STRATEGIC BALANCE

Verify any distance a commander claimed using the provided tools before \
grading it.";

const TOOL_INSTRUCTIONS: &str = "

## Tools

Request a geospatial calculation by emitting a fenced block:

```tool
{\"tool\": \"distance\", \"args\": {\"from\": {\"lat\": 25.0, \"lon\": 121.5}, \"to\": {\"lat\": 24.5, \"lon\": 118.1}}}
```

Available tools: `distance` (km + bearing between two positions), `bearing`, \
`transit_time` (args: distance_km, speed_kmh), `terrain` (args: lat, lon). \
Tool results are returned to you before you finalize your response.";

const ACTION_INSTRUCTIONS: &str = "

## Actions

Declare the concrete orders for this turn as a fenced JSON array:

```actions
[
  {\"type\": \"move_unit\", \"unit_id\": \"blue_naval_1\", \"to\": {\"lat\": 24.3, \"lon\": 119.8, \"grid_ref\": \"TS-2500\"}},
  {\"type\": \"engage\", \"unit_id\": \"blue_air_1\", \"target_id\": \"red_air_2\"},
  {\"type\": \"set_posture\", \"unit_id\": \"blue_sub_1\", \"posture\": \"offensive\"}
]
```

Action types: `move_unit`, `engage`, `set_posture` (defensive/offensive/patrol), \
`reinforce` (amount up to 25). Only your own units. Omit the block if you \
issue no orders this turn.";

/// Full system prompt for a role.
pub fn system_prompt(role: Role) -> String {
    let base = match role {
        Role::BlueCommander => BLUE_COMMANDER,
        Role::RedCommander => RED_COMMANDER,
        Role::Analyst => ANALYST,
    };
    match role {
        // The analyst observes; it gets tools but declares no actions.
        Role::Analyst => format!("{base}{TOOL_INSTRUCTIONS}"),
        _ => format!("{base}{TOOL_INSTRUCTIONS}{ACTION_INSTRUCTIONS}"),
    }
}

/// Per-turn user prompt: current state plus the role's task for this turn.
pub fn turn_prompt(turn: u32, max_turns: u32, world_view: &str, history: &str, task: &str) -> String {
    format!(
        "## Turn {turn} of {max_turns}\n\n\
         ### Current State\n{world_view}\n\n\
         ### Recent History\n{history}\n\n\
         ### Your Task This Turn\n{task}\n"
    )
}

/// The standing per-role task line.
pub fn role_task(role: Role) -> &'static str {
    match role {
        Role::BlueCommander => {
            "Assess the situation and issue Blue Force orders for this turn."
        }
        Role::RedCommander => {
            "Counter Blue Force's latest move and advance Red Force objectives."
        }
        Role::Analyst => {
            "Evaluate both commanders' decisions this turn and assess the strategic balance."
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commander_prompts_include_tool_and_action_blocks() {
        for role in [Role::BlueCommander, Role::RedCommander] {
            let prompt = system_prompt(role);
            assert!(prompt.contains("```tool"));
            assert!(prompt.contains("```actions"));
        }
    }

    #[test]
    fn test_analyst_prompt_has_tools_but_no_actions() {
        let prompt = system_prompt(Role::Analyst);
        assert!(prompt.contains("```tool"));
        assert!(!prompt.contains("```actions"));
    }

    #[test]
    fn test_turn_prompt_interpolates() {
        let prompt = turn_prompt(2, 5, "state here", "history here", "task here");
        assert!(prompt.contains("Turn 2 of 5"));
        assert!(prompt.contains("state here"));
        assert!(prompt.contains("task here"));
    }
}
