//! Prompt catalog: classification and per-category evaluation prompts, each
//! with a reduced-complexity variant for the single parse-failure retry.

use crate::domain::model::{Category, ProjectType};

const CLASSIFICATION_JSON_SHAPE: &str = r#"```json
{
    "project_type": "painkiller|vitamin|balanced",
    "confidence": <number between 0.0 and 1.0>,
    "painkiller_score": <number between 0.0 and 1.0>,
    "vitamin_score": <number between 0.0 and 1.0>,
    "reasoning": "<why this archetype fits the project>"
}
```"#;

const EVALUATION_JSON_SHAPE: &str = r#"```json
{
    "score": <number between 1 and 10>,
    "reasoning": "<detailed justification a veteran judge would accept>",
    "suggestions": ["<improvement 1>", "<improvement 2>", "<improvement 3>"],
    "sub_scores": {"<criterion>": <number between 1 and 10>}
}
```"#;

pub fn classification_system_prompt() -> String {
    format!(
        "You are a startup analyst. Classify the hackathon project into exactly one archetype:\n\n\
         - painkiller: relieves an acute, costly problem its users must solve\n\
         - vitamin: a nice-to-have that delights and engages but is not urgent\n\
         - balanced: carries meaningful elements of both\n\n\
         Important: respond ONLY with the JSON below. Do not include any other text.\n\n{}",
        CLASSIFICATION_JSON_SHAPE
    )
}

pub fn classification_user_prompt(bundle_text: &str) -> String {
    format!(
        "Classify the following project materials:\n\n{}\n\nRespond in JSON format only.",
        bundle_text
    )
}

/// System line paired with the reduced-complexity retry prompts.
pub fn simplified_system_prompt() -> &'static str {
    "Respond with a single JSON object and nothing else."
}

pub fn simplified_classification_prompt(bundle_text: &str) -> String {
    format!(
        "The previous response could not be parsed. Based on the project materials below, \
         return exactly one JSON object with the keys project_type (the archetype: painkiller, \
         vitamin or balanced), confidence, painkiller_score, vitamin_score and reasoning. \
         No other text.\n\n{}",
        bundle_text
    )
}

pub fn evaluation_system_prompt(category: Category, project_type: ProjectType) -> String {
    let painkiller = painkiller_criteria(category);
    let vitamin = vitamin_criteria(category);

    let (lens_instruction, criteria) = match project_type {
        ProjectType::PainKiller => (
            format!(
                "This project was classified as a PainKiller, so judge its {} against the pain-killer criteria.",
                category.label()
            ),
            bullet_list(painkiller),
        ),
        ProjectType::Vitamin => (
            format!(
                "This project was classified as a Vitamin, so judge its {} against the vitamin criteria.",
                category.label()
            ),
            bullet_list(vitamin),
        ),
        ProjectType::Balanced => (
            format!(
                "This project was classified as Balanced, so apply both criteria sets to its {} with equal weight.",
                category.label()
            ),
            format!("{}\n{}", bullet_list(painkiller), bullet_list(vitamin)),
        ),
    };

    format!(
        "You are an expert evaluator of {label}. The project has already been classified as \
         {ptype}; assess its {label} accordingly.\n\n{lens}\n\nEvaluation criteria:\n{criteria}\n\n\
         Method:\n1. Rate each criterion from 1 to 10.\n2. Weigh the criteria according to the \
         {ptype} classification.\n\n\
         Important: respond ONLY with the JSON below. Do not include any other text.\n\n{shape}",
        label = category.label(),
        ptype = project_type,
        lens = lens_instruction,
        criteria = criteria,
        shape = EVALUATION_JSON_SHAPE
    )
}

pub fn evaluation_user_prompt(
    category: Category,
    project_info: &str,
    project_type: ProjectType,
) -> String {
    format!(
        "Score the project on {label}:\n\n\
         **Project classification**: {ptype} type\n\
         **Project information**: {info}\n\n\
         Take the existing {ptype} classification into account and respond in JSON format only.",
        label = category.label(),
        ptype = project_type,
        info = project_info
    )
}

pub fn simplified_evaluation_prompt(category: Category, project_info: &str) -> String {
    format!(
        "The previous response could not be parsed. Score the project on {} again: return \
         exactly one JSON object with the keys score, reasoning and suggestions. No other \
         text.\n\n{}",
        category.label(),
        project_info
    )
}

fn bullet_list(items: &[&str]) -> String {
    items
        .iter()
        .map(|item| format!("- {}", item))
        .collect::<Vec<_>>()
        .join("\n")
}

fn painkiller_criteria(category: Category) -> &'static [&'static str] {
    match category {
        Category::BusinessValue => &[
            "How acute is the problem being solved, and what does working around it cost today?",
            "Willingness to pay: would customers budget for this immediately?",
            "Is there a direct, defensible monetization path?",
        ],
        Category::TechnicalFeasibility => &[
            "Can the core solution ship reliably with today's technology stack?",
            "Robustness under real workloads: failure modes, recovery, operations",
            "Integration cost with the systems the problem lives in",
        ],
        Category::Innovation => &[
            "Does the approach remove the pain in a fundamentally better way than existing workarounds?",
            "Novelty of the mechanism, not just the packaging",
            "Defensibility: how hard is the core insight to copy?",
        ],
        Category::Accessibility => &[
            "Can affected users adopt it with near-zero onboarding?",
            "Does it lower barriers for users currently excluded from a critical workflow?",
            "Assistive-technology coverage of the core flows",
        ],
        Category::CostAnalysis => &[
            "Cost of the problem today versus the cost of running this solution",
            "Infrastructure and inference spend at realistic load",
            "Payback period for the buyer",
        ],
        Category::NetworkEffect => &[
            "Does each new participant reduce pain for existing ones (data, coverage, liquidity)?",
            "Switching costs created once a workflow depends on it",
            "Critical mass required before the pain relief materializes",
        ],
        Category::SocialImpact => &[
            "Severity and scale of the societal problem addressed",
            "Evidence the affected population would actually adopt the remedy",
            "Measurable harm reduction per unit of deployment",
        ],
        Category::Sustainability => &[
            "Can the team keep operating this once hackathon resources disappear?",
            "Resource footprint relative to the status quo it replaces",
            "Dependence on subsidized pricing or fragile third parties",
        ],
        Category::UserEngagement => &[
            "Frequency of the pain: does the user return because they must?",
            "Time-to-value on first use",
            "Retention driven by the job to be done, not novelty",
        ],
    }
}

fn vitamin_criteria(category: Category) -> &'static [&'static str] {
    match category {
        Category::BusinessValue => &[
            "Does the product create new value or delight beyond an existing workflow?",
            "Brand and differentiation upside in a crowded market",
            "Potential to expand spend once users are hooked",
        ],
        Category::TechnicalFeasibility => &[
            "Polish of the implementation and the user experience",
            "Headroom for rapid iteration on engagement features",
            "Creative use of the platform beyond the minimum viable path",
        ],
        Category::Innovation => &[
            "Surprise and delight factor relative to incumbents",
            "A fresh interaction or business model the market has not seen",
            "Creativity in recombining existing building blocks",
        ],
        Category::Accessibility => &[
            "Inclusive design touches that broaden casual reach",
            "Localization and low-bandwidth friendliness",
            "Clarity of the experience for newcomers",
        ],
        Category::CostAnalysis => &[
            "Marginal cost of serving one more delighted user",
            "Efficiency headroom as engagement scales",
            "Transparency about the trade-off between polish and spend",
        ],
        Category::NetworkEffect => &[
            "Virality: do users naturally invite others?",
            "Community and content loops that compound engagement",
            "Cross-side effects between creators and consumers",
        ],
        Category::SocialImpact => &[
            "Positive-sum cultural or community benefits",
            "Awareness and behavior-change potential",
            "Alignment with long-term public-good goals",
        ],
        Category::Sustainability => &[
            "A long-term engagement loop that keeps the product alive",
            "Graceful cost curve as usage grows",
            "Roadmap realism beyond the demo",
        ],
        Category::UserEngagement => &[
            "Habit-forming loops and session depth",
            "Emotional pull of the experience",
            "Shareability and identity value for the user",
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_painkiller_lens_selects_painkiller_criteria() {
        let prompt = evaluation_system_prompt(Category::BusinessValue, ProjectType::PainKiller);
        assert!(prompt.contains("pain-killer criteria"));
        assert!(prompt.contains("Willingness to pay"));
        assert!(!prompt.contains("Brand and differentiation"));
    }

    #[test]
    fn test_balanced_lens_includes_both_criteria_sets() {
        let prompt = evaluation_system_prompt(Category::Innovation, ProjectType::Balanced);
        assert!(prompt.contains("equal weight"));
        assert!(prompt.contains("Novelty of the mechanism"));
        assert!(prompt.contains("Surprise and delight"));
    }

    #[test]
    fn test_evaluation_user_prompt_names_the_category() {
        let prompt =
            evaluation_user_prompt(Category::CostAnalysis, "demo project", ProjectType::Vitamin);
        assert!(prompt.starts_with("Score the project on Cost Analysis"));
        assert!(prompt.contains("vitamin"));
        assert!(prompt.contains("demo project"));
    }

    #[test]
    fn test_classification_prompts_describe_the_archetypes() {
        let system = classification_system_prompt();
        assert!(system.contains("archetype"));
        assert!(system.contains("painkiller_score"));

        let simplified = simplified_classification_prompt("materials");
        assert!(simplified.contains("archetype"));
        assert!(simplified.contains("materials"));
    }

    #[test]
    fn test_every_category_has_both_lenses() {
        for category in Category::ALL {
            assert_eq!(painkiller_criteria(category).len(), 3);
            assert_eq!(vitamin_criteria(category).len(), 3);
        }
    }
}
