//! 프롬프트 및 응답 스키마
//!
//! 각 호출은 `responseMimeType: application/json` + `responseSchema`로
//! 출력 형태를 고정합니다.

use serde_json::{json, Value};

use crate::models::{Classification, SuggestionCategory};

const EXPERT_PREAMBLE: &str = "You are a Minecraft Bedrock Edition expert. The JSON may be an entity behavior, an item, a block, a loot table or a recipe definition.";

fn detected_type_schema() -> Value {
    let tags: Vec<&str> = Classification::ALL.iter().map(|c| c.as_str()).collect();
    json!({ "type": "STRING", "enum": tags })
}

fn stats_properties() -> Value {
    let number = || json!({ "type": "NUMBER" });
    json!({
        "health": number(),
        "speed": number(),
        "attack": number(),
        "richness": number(),
        "complexity": number(),
        "efficiency": number(),
        "power": number(),
    })
}

fn fenced(document: &str) -> String {
    format!("```json\n{}\n```", document)
}

pub fn modify_prompt(document: &str, instruction: &str) -> String {
    format!(
        r#"Current Minecraft Bedrock JSON:
{doc}

User Instruction: {instruction}

{preamble}

Rules:
1. Identify the root type (minecraft:entity, minecraft:item, minecraft:block, a loot table or a recipe).
2. Modify the JSON according to the instruction while adhering to the official Minecraft Bedrock schema for that type.
3. Maintain proper format_version.
4. If adding components, ensure they are valid for the specific root type (e.g., don't add "minecraft:movement" to an item).
5. Ensure logical consistency across the file.
6. Return the complete file in updatedJson, not a fragment."#,
        doc = fenced(document),
        instruction = instruction.trim(),
        preamble = EXPERT_PREAMBLE,
    )
}

pub fn modify_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "updatedJson": { "type": "STRING", "description": "The full modified JSON content as a string." },
            "explanation": { "type": "STRING", "description": "A brief explanation of what was changed." },
            "detectedType": detected_type_schema(),
            "stats": { "type": "OBJECT", "properties": stats_properties() }
        },
        "required": ["updatedJson", "explanation"]
    })
}

pub fn analyze_prompt(document: &str) -> String {
    format!(
        r#"{preamble}
Analyze the following file for a human developer.
1. Identify its type.
2. Write a short professional overview of its purpose.
3. Group its key properties into a few titled sections (e.g. Combat, Movement, Drops, Crafting), each with concise bullet items and an optional single-word icon hint.

{doc}"#,
        preamble = EXPERT_PREAMBLE,
        doc = fenced(document),
    )
}

pub fn analyze_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "overview": { "type": "STRING" },
            "detectedType": detected_type_schema(),
            "sections": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "header": { "type": "STRING" },
                        "items": { "type": "ARRAY", "items": { "type": "STRING" } },
                        "icon": { "type": "STRING" }
                    },
                    "required": ["header", "items"]
                }
            }
        },
        "required": ["overview", "detectedType", "sections"]
    })
}

pub fn stats_prompt(document: &str) -> String {
    format!(
        r#"{preamble}
Rate the following file on a 0-100 scale. Only include the metrics that make sense for its type:
- entity: health, speed, attack
- loot_table: richness
- recipe: complexity, efficiency
- block / item: power, complexity

{doc}"#,
        preamble = EXPERT_PREAMBLE,
        doc = fenced(document),
    )
}

pub fn stats_schema() -> Value {
    json!({ "type": "OBJECT", "properties": stats_properties() })
}

pub fn suggest_prompt(document: &str) -> String {
    format!(
        r#"{preamble}
Suggest 12 to 16 elements that could be added to the following file. Only suggest elements that are valid for its type and not already present. Give each a name (the exact Bedrock identifier when one exists), a one-sentence description, a category and optionally a short JSON example.

{doc}"#,
        preamble = EXPERT_PREAMBLE,
        doc = fenced(document),
    )
}

pub fn suggest_schema() -> Value {
    let categories: Vec<&str> = SuggestionCategory::ALL.iter().map(|c| c.as_str()).collect();
    json!({
        "type": "OBJECT",
        "properties": {
            "items": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "name": { "type": "STRING" },
                        "description": { "type": "STRING" },
                        "category": { "type": "STRING", "enum": categories },
                        "example": { "type": "STRING" }
                    },
                    "required": ["name", "description", "category"]
                }
            }
        },
        "required": ["items"]
    })
}

pub fn presets_prompt(element_name: &str) -> String {
    format!(
        r#"{preamble}
The user wants to add "{name}" to a Bedrock file. Propose 4 to 6 typical configurations as short presets. Each preset has a short button label and a value that fully describes the configuration in plain words. Also write one short question prompting the user for a custom configuration."#,
        preamble = EXPERT_PREAMBLE,
        name = element_name.trim(),
    )
}

pub fn presets_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "presets": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "label": { "type": "STRING" },
                        "value": { "type": "STRING" }
                    },
                    "required": ["label", "value"]
                }
            },
            "suggestedPrompt": { "type": "STRING" }
        },
        "required": ["presets", "suggestedPrompt"]
    })
}
