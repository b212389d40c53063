use super::aggregations::WcagTreeResult;

pub const CSV_HEADER: &str = "principle,guidelineId,criterionId,occurrences";

/// Long-form CSV of a WCAG tree, one row per criterion.
///
/// Rows follow the tree's insertion order. A missing or empty tree yields
/// the header alone. Output always ends with a single newline.
pub fn to_csv_wcag_flat(result: Option<&WcagTreeResult>) -> String {
    let mut lines = vec![CSV_HEADER.to_string()];

    if let Some(result) = result {
        for (principle, principle_node) in result.tree.iter() {
            for (guideline_id, guideline_node) in principle_node.guidelines.iter() {
                for (criterion_id, occurrences) in guideline_node.criteria.iter() {
                    lines.push(format!(
                        "{principle},{guideline_id},{criterion_id},{occurrences}"
                    ));
                }
            }
        }
    }

    let mut csv = lines.join("\n");
    csv.push('\n');
    csv
}
