use crate::llm::FunctionSpec;

const INTRO: &str = "You are errand, a dispatcher that turns a task into exactly one function call.";
const RULES_HEADER: &str = "Rules:";
const RULES: &[&str] = &[
    "Call exactly one of the functions listed above. Never invent functions.",
    "Copy file paths exactly as they appear in the task.",
    "Leave out optional arguments unless the task asks for something other than the default.",
    "The task may be written in any language. Choose the function by meaning, not wording.",
];

/// System prompt for function selection. The functions are also sent as
/// structured tools; listing them here helps weaker models choose.
pub fn build_select_system_prompt(functions: &[FunctionSpec]) -> String {
    let mut functions_desc = String::new();
    for function in functions {
        functions_desc.push_str(&format!("- {}: {}\n", function.name, function.description));
    }

    let rules = RULES
        .iter()
        .map(|rule| format!("- {}", rule))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "{intro}\n\nAvailable functions:\n{functions_desc}\n{rules_header}\n{rules}\n",
        intro = INTRO,
        functions_desc = functions_desc,
        rules_header = RULES_HEADER,
        rules = rules
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str, description: &str) -> FunctionSpec {
        FunctionSpec {
            name: name.to_string(),
            description: description.to_string(),
            parameters: serde_json::json!({"type": "object"}),
        }
    }

    #[test]
    fn prompt_includes_function_list() {
        let prompt = build_select_system_prompt(&[
            spec("sort_contacts_file", "sort contacts"),
            spec("calculate_ticket_sales", "sum ticket sales"),
        ]);
        assert!(prompt.contains("- sort_contacts_file: sort contacts"));
        assert!(prompt.contains("- calculate_ticket_sales: sum ticket sales"));
    }

    #[test]
    fn prompt_includes_rules() {
        let prompt = build_select_system_prompt(&[]);
        for rule in RULES {
            assert!(prompt.contains(rule));
        }
    }

    #[test]
    fn prompt_has_no_markdown_fences() {
        let prompt = build_select_system_prompt(&[spec("a", "b")]);
        assert!(!prompt.contains("```"));
    }
}
