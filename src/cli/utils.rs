use std::path::Path;

use serde::Serialize;

use crate::cli::OutputFormat;
use crate::hierarchy::{BuildReport, Forest, HierarchyBuilder, HierarchyNode};
use crate::source::{EmployeeSource, FileEmployeeSource};

/// Reads a JSON or YAML staff file and builds its forest.
pub async fn load_forest(path: &Path) -> anyhow::Result<(Forest, BuildReport)> {
    let source = FileEmployeeSource::new(path)?;
    let records = source.fetch_employees().await?;
    Ok(HierarchyBuilder::build_with_report(&records)?)
}

/// Data-quality findings go to stderr so stdout stays parseable.
pub fn warn_findings(report: &BuildReport) {
    for cycle in &report.cycles {
        let ids: Vec<_> = cycle.iter().map(|id| id.as_str()).collect();
        eprintln!("warning: manager cycle broken at [{}]", ids.join(", "));
    }
    for id in &report.dangling {
        eprintln!("warning: employee {} reports to an unknown manager", id);
    }
}

pub fn output_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Output a success message in the appropriate format
pub fn output_success<T: Serialize>(output_format: &OutputFormat, message: &str, data: &T) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => output_json(data),
        OutputFormat::Text => {
            println!("✓ {}", message);
            Ok(())
        }
    }
}

/// One line per employee, indented by level.
pub fn render_tree(forest: &Forest) -> String {
    let mut out = String::new();
    let mut stack: Vec<&HierarchyNode> = forest.roots().iter().rev().collect();
    while let Some(node) = stack.pop() {
        render_line(node, &mut out);
        stack.extend(node.children.iter().rev());
    }
    out
}

fn render_line(node: &HierarchyNode, out: &mut String) {
    out.push_str(&"  ".repeat(node.level as usize));
    out.push_str(&node.name);
    match (node.title.is_empty(), node.department.is_empty()) {
        (false, false) => out.push_str(&format!(" - {}, {}", node.title, node.department)),
        (false, true) => out.push_str(&format!(" - {}", node.title)),
        (true, false) => out.push_str(&format!(" - {}", node.department)),
        (true, true) => {}
    }
    out.push_str(&format!(" [{}]\n", node.id));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EmployeeRecord;

    #[test]
    fn test_render_tree_indents_by_level() {
        let forest = HierarchyBuilder::build(&[
            EmployeeRecord::new(1, "Ada").with_title("CEO").with_department("Exec"),
            EmployeeRecord::new(2, "Bo").with_manager(1).with_department("Eng"),
            EmployeeRecord::new(3, "Cy").with_manager(2),
        ])
        .unwrap();

        assert_eq!(
            render_tree(&forest),
            "Ada - CEO, Exec [1]\n  Bo - Eng [2]\n    Cy [3]\n"
        );
    }

    #[test]
    fn test_render_tree_handles_deep_chains() {
        const DEPTH: i64 = 4_000;
        let records: Vec<_> = (0..DEPTH)
            .map(|n| match n {
                0 => EmployeeRecord::new(n, "E"),
                _ => EmployeeRecord::new(n, "E").with_manager(n - 1),
            })
            .collect();
        let forest = HierarchyBuilder::build(&records).unwrap();

        let text = std::thread::Builder::new()
            .stack_size(128 * 1024)
            .spawn(move || render_tree(&forest))
            .unwrap()
            .join()
            .unwrap();

        assert_eq!(text.lines().count(), DEPTH as usize);
        let last = text.lines().last().unwrap();
        assert_eq!(last.len() - last.trim_start().len(), 2 * (DEPTH as usize - 1));
    }

    #[tokio::test]
    async fn test_load_forest_from_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("staff.yaml");
        std::fs::write(&path, "- id: 1\n  name: Ada\n- id: 2\n  name: Bo\n  managerId: 9\n").unwrap();

        let (forest, report) = load_forest(&path).await.unwrap();
        assert_eq!(forest.roots().len(), 2);
        assert_eq!(report.dangling.len(), 1);
    }
}
