/// Keyword-based skill suggestions for new tasks
///
/// A task posted without skills gets tagged from its text: each vocabulary
/// skill has a keyword list, and a skill is suggested when any of its keywords
/// occurs as a substring of the lowercased description and title.

/// Keyword table, in vocabulary order
const SKILL_KEYWORDS: [(&str, &[&str]); 10] = [
    ("Heavy Lifting", &["heavy", "carry", "move", "lift", "boxes"]),
    ("Tech Help", &["computer", "tech", "phone", "email", "software", "internet"]),
    ("Gardening", &["garden", "plant", "weed", "mow", "lawn", "flower"]),
    ("Transportation", &["drive", "transport", "pickup", "delivery", "grocery"]),
    ("Cleaning", &["clean", "sweep", "mop", "tidy", "organize", "sort", "litter"]),
    ("Cooking", &["cook", "meal", "food", "bake", "kitchen"]),
    ("Tutoring", &["teach", "tutor", "lesson", "homework", "learn"]),
    ("Pet Care", &["dog", "cat", "pet", "walk", "feed", "animal"]),
    ("Repairs", &["fix", "repair", "plumb", "electric", "paint", "faucet"]),
    ("Arts & Crafts", &["art", "craft", "paint", "draw", "mural", "creative"]),
];

/// Suggests skills for a task from its title and description
///
/// Matching is case-insensitive substring search, so "Painting" hits both
/// Repairs and Arts & Crafts and "cart" hits Arts & Crafts. Results follow
/// vocabulary order; no text means no suggestions.
pub fn suggest_skills(title: &str, description: &str) -> Vec<String> {
    let text = format!("{} {}", description, title).to_lowercase();

    SKILL_KEYWORDS
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|keyword| text.contains(keyword)))
        .map(|(skill, _)| skill.to_string())
        .collect()
}
