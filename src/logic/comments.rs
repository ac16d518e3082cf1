//! General comments text: the externally generated summary followed by the
//! Big Four paragraph, foliar guidance and nutrient antagonism notes.

use crate::models::nutrient::{Element, Nutrient, NutrientStatus};
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Mulder's chart: excess of the key element suppresses uptake of each listed one.
pub const ANTAGONISMS: &[(Element, &[Element])] = &[
    (
        Element::Nitrogen,
        &[Element::Potassium, Element::Copper, Element::Boron],
    ),
    (
        Element::Phosphorus,
        &[
            Element::Zinc,
            Element::Iron,
            Element::Copper,
            Element::Potassium,
            Element::Calcium,
        ],
    ),
    (
        Element::Potassium,
        &[
            Element::Magnesium,
            Element::Calcium,
            Element::Boron,
            Element::Nitrogen,
            Element::Phosphorus,
        ],
    ),
    (
        Element::Calcium,
        &[
            Element::Magnesium,
            Element::Potassium,
            Element::Iron,
            Element::Manganese,
            Element::Zinc,
            Element::Boron,
            Element::Phosphorus,
            Element::Sulphur,
        ],
    ),
    (Element::Magnesium, &[Element::Calcium, Element::Potassium]),
    (
        Element::Zinc,
        &[Element::Iron, Element::Copper, Element::Phosphorus],
    ),
    (
        Element::Copper,
        &[
            Element::Nitrogen,
            Element::Phosphorus,
            Element::Manganese,
            Element::Iron,
            Element::Sulphur,
        ],
    ),
    (
        Element::Iron,
        &[
            Element::Manganese,
            Element::Zinc,
            Element::Copper,
            Element::Phosphorus,
            Element::Calcium,
        ],
    ),
    (
        Element::Manganese,
        &[Element::Iron, Element::Copper, Element::Calcium],
    ),
    (
        Element::Boron,
        &[Element::Nitrogen, Element::Potassium, Element::Calcium],
    ),
    (
        Element::Sulphur,
        &[Element::Copper, Element::Molybdenum, Element::Calcium],
    ),
    (Element::Molybdenum, &[Element::Sulphur]),
];

/// Calcium, Magnesium, Phosphorus and Boron, kept at luxury levels on a leaf test.
pub const BIG_FOUR: [Element; 4] = [
    Element::Calcium,
    Element::Magnesium,
    Element::Phosphorus,
    Element::Boron,
];

const BIG_FOUR_INTRO: &str = "We have found that it is remarkably productive to try to maintain \"luxury levels\" of 4 minerals on a leaf test (The Big four). \"Luxury\", refers to the top end of the acceptable range. The Big Four include Calcium (Ca), Magnesium (Mg), Phosphorus (P), and Boron (B).";

const NO_BIG_FOUR_DEFICIENCY: &str =
    "You do not have any deficiency in any of the nutrients of the big four.";

const CLOSING: &str = "Balanced nutrition is key to optimal plant health. Addressing these nutrient imbalances will help your crop reach its full potential.";

pub fn antagonized_by(element: Element) -> Option<&'static [Element]> {
    ANTAGONISMS
        .iter()
        .find(|(key, _)| *key == element)
        .map(|(_, list)| *list)
}

/// Resolve free-form nutrient names, dropping unknowns and repeats.
pub fn resolve_names<S: AsRef<str>>(names: &[S]) -> Vec<Element> {
    let mut elements = Vec::new();
    for element in names.iter().filter_map(|n| Element::resolve(n.as_ref())) {
        if !elements.contains(&element) {
            elements.push(element);
        }
    }
    elements
}

/// "A", "A and B", "A, B and C"
fn join_sentence(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}

/// One sentence per excess element found in the antagonism table, in input order.
pub fn antagonism(excess: &[Element]) -> Vec<String> {
    excess
        .iter()
        .filter_map(|element| {
            let suppressed = antagonized_by(*element)?;
            let list = suppressed
                .iter()
                .map(Element::labelled)
                .collect::<Vec<_>>()
                .join(", ");
            Some(format!("{} can shut down {}", element.labelled(), list))
        })
        .collect()
}

pub fn big_four_deficient(deficient: &[Element]) -> Vec<Element> {
    BIG_FOUR
        .iter()
        .copied()
        .filter(|e| deficient.contains(e))
        .collect()
}

/// Foliar spray advice for deficient Big Four elements.
pub fn foliar_guidance(big_four: &[Element]) -> Option<String> {
    let names: Vec<String> = big_four.iter().map(Element::labelled).collect();
    match names.len() {
        0 => None,
        1 => Some(format!("{} should be foliar sprayed", names[0])),
        _ => Some(format!("{} need to be foliar sprayed", join_sentence(&names))),
    }
}

pub fn big_four_paragraph(deficient: &[Element]) -> String {
    let big_four = big_four_deficient(deficient);
    match foliar_guidance(&big_four) {
        None => format!("{} {}", BIG_FOUR_INTRO, NO_BIG_FOUR_DEFICIENCY),
        Some(guidance) => format!(
            "{} Here, you are deficient in {} of the nutrients of the big four. In this case, {} to bypass issues in the soil.",
            BIG_FOUR_INTRO,
            big_four.len(),
            guidance
        ),
    }
}

/// `None` when no excess element has antagonists.
pub fn excess_block(excess: &[Element]) -> Option<String> {
    let antagonists: Vec<Element> = excess
        .iter()
        .copied()
        .filter(|e| antagonized_by(*e).is_some())
        .collect();
    if antagonists.is_empty() {
        return None;
    }
    let names = antagonists
        .iter()
        .map(Element::labelled)
        .collect::<Vec<_>>()
        .join(", ");
    let bullets = antagonism(&antagonists)
        .into_iter()
        .map(|line| format!("- {}", line))
        .collect::<Vec<_>>()
        .join("\n");
    Some(format!(
        "Your excess of {} can shut down several nutrients.\nYour nutrient antagonism is summarized as following:\n{}",
        names, bullets
    ))
}

/// Remove `**bold**` markers the text service sometimes returns.
pub fn strip_markdown_bold(text: &str) -> String {
    static BOLD: OnceLock<Regex> = OnceLock::new();
    BOLD.get_or_init(|| Regex::new(r"\*\*(.*?)\*\*").expect("bold pattern is valid"))
        .replace_all(text, "$1")
        .into_owned()
}

/// Summary first (omitted when blank), then the template paragraphs,
/// separated by blank lines.
pub fn compose(summary: &str, deficient: &[Element], excess: &[Element]) -> String {
    let summary = strip_markdown_bold(summary.trim());
    let mut parts = Vec::new();
    if !summary.is_empty() {
        parts.push(summary);
    }
    parts.push(big_four_paragraph(deficient));
    if let Some(block) = excess_block(excess) {
        parts.push(block);
    }
    parts.push(CLOSING.to_string());
    parts.join("\n\n")
}

/// Status buckets sent to the comment generation service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommentInputs {
    pub deficient: Vec<String>,
    pub optimal: Vec<String>,
    pub excess: Vec<String>,
}

impl CommentInputs {
    pub fn deficient_elements(&self) -> Vec<Element> {
        resolve_names(&self.deficient)
    }

    pub fn excess_elements(&self) -> Vec<Element> {
        resolve_names(&self.excess)
    }
}

/// Bucket nutrients with a usable ideal by status, naming them by element
/// where one resolves. Repeats are dropped.
pub fn classify_for_comments<'a>(nutrients: impl IntoIterator<Item = &'a Nutrient>) -> CommentInputs {
    let mut inputs = CommentInputs::default();
    for nutrient in nutrients {
        if nutrient.target().is_none() {
            continue;
        }
        let name = nutrient
            .element
            .map(|e| e.as_str().to_string())
            .unwrap_or_else(|| nutrient.name.clone());
        let bucket = match nutrient.status {
            NutrientStatus::Low => &mut inputs.deficient,
            NutrientStatus::Optimal => &mut inputs.optimal,
            NutrientStatus::High => &mut inputs.excess,
        };
        if !bucket.contains(&name) {
            bucket.push(name);
        }
    }
    inputs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn antagonism_sentence_format() {
        let lines = antagonism(&[Element::Nitrogen]);
        assert_eq!(
            lines,
            vec!["Nitrogen (N) can shut down Potassium (K), Copper (Cu), Boron (B)"]
        );
    }

    #[test]
    fn antagonism_keeps_input_order_and_skips_unknown() {
        let lines = antagonism(&[Element::Molybdenum, Element::Sodium, Element::Magnesium]);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Molybdenum (Mo)"));
        assert!(lines[1].starts_with("Magnesium (Mg)"));
        assert_eq!(antagonism(&[Element::Sodium]), Vec::<String>::new());
    }

    #[test]
    fn table_covers_twelve_elements() {
        assert_eq!(ANTAGONISMS.len(), 12);
        assert_eq!(antagonized_by(Element::Calcium).unwrap().len(), 8);
        assert!(antagonized_by(Element::Silicon).is_none());
    }

    #[test]
    fn foliar_guidance_grammar() {
        assert_eq!(foliar_guidance(&[]), None);
        assert_eq!(
            foliar_guidance(&[Element::Boron]).unwrap(),
            "Boron (B) should be foliar sprayed"
        );
        assert_eq!(
            foliar_guidance(&[Element::Calcium, Element::Magnesium, Element::Boron]).unwrap(),
            "Calcium (Ca), Magnesium (Mg) and Boron (B) need to be foliar sprayed"
        );
    }

    #[test]
    fn big_four_paragraph_counts_deficiencies() {
        let none = big_four_paragraph(&[Element::Zinc]);
        assert!(none.ends_with(NO_BIG_FOUR_DEFICIENCY));

        let two = big_four_paragraph(&[Element::Boron, Element::Zinc, Element::Calcium]);
        assert!(two.contains("deficient in 2 of the nutrients"));
        assert!(two.contains("Calcium (Ca) and Boron (B) need to be foliar sprayed to bypass"));
    }

    #[test]
    fn excess_block_lists_antagonisms() {
        assert!(excess_block(&[]).is_none());
        assert!(excess_block(&[Element::Sodium]).is_none());

        let block = excess_block(&[Element::Potassium, Element::Sodium, Element::Iron]).unwrap();
        let lines: Vec<&str> = block.lines().collect();
        assert_eq!(
            lines[0],
            "Your excess of Potassium (K), Iron (Fe) can shut down several nutrients."
        );
        assert_eq!(lines[1], "Your nutrient antagonism is summarized as following:");
        assert!(lines[2].starts_with("- Potassium (K) can shut down Magnesium (Mg)"));
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn compose_puts_summary_first() {
        let text = compose(
            "  Soil is **well** balanced.  ",
            &[Element::Magnesium],
            &[Element::Calcium],
        );
        let paragraphs: Vec<&str> = text.split("\n\n").collect();
        assert_eq!(paragraphs[0], "Soil is well balanced.");
        assert!(paragraphs[1].starts_with("We have found"));
        assert!(paragraphs[1].contains("Magnesium (Mg) should be foliar sprayed"));
        assert!(paragraphs[2].starts_with("Your excess of Calcium (Ca)"));
        assert_eq!(paragraphs[3], CLOSING);
    }

    #[test]
    fn compose_omits_blank_summary() {
        let text = compose("   ", &[], &[]);
        assert!(text.starts_with("We have found"));
        assert_eq!(text.split("\n\n").count(), 2);
    }

    #[test]
    fn classify_buckets_by_status() {
        let nutrients = vec![
            Nutrient::new("Calcium (Mehlich III)", 500.0, 1500.0, "ppm"),
            Nutrient::new("Calcium (KCl)", 500.0, 1500.0, "ppm"),
            Nutrient::new("Potassium (Mehlich III)", 400.0, 200.0, "ppm"),
            Nutrient::new("Zinc (DTPA)", 6.0, 6.0, "ppm"),
            Nutrient::new("Paramagnetism", 50.0, 0.0, "µCGS"),
        ];
        let inputs = classify_for_comments(&nutrients);
        assert_eq!(inputs.deficient, vec!["Calcium"]);
        assert_eq!(inputs.excess, vec!["Potassium"]);
        assert_eq!(inputs.optimal, vec!["Zinc"]);
        assert_eq!(inputs.deficient_elements(), vec![Element::Calcium]);
    }

    #[test]
    fn resolve_names_accepts_labels() {
        let elements = resolve_names(&["Ca - Calcium", "calcium", "sulfur", "Mystery"]);
        assert_eq!(elements, vec![Element::Calcium, Element::Sulphur]);
    }
}
