use pg_health::framework::core::diagnostic::{Diagnostic, ExecutionTopology, Staticness};
use pg_health::framework::core::registry;

use crate::cli::display::{new_table, Message};

use super::{RoutineFailure, RoutineSuccess};

pub fn list_diagnostics(json: bool) -> Result<RoutineSuccess, RoutineFailure> {
    let diagnostics = registry::all();
    if json {
        let rendered = serde_json::to_string_pretty(diagnostics).map_err(|e| {
            RoutineFailure::new(
                Message {
                    action: "List".to_string(),
                    details: "Failed to render diagnostics as JSON".to_string(),
                },
                e,
            )
        })?;
        println!("{rendered}");
        return Ok(RoutineSuccess::silent());
    }

    println!("{}", render_table(diagnostics));
    Ok(RoutineSuccess::success(Message {
        action: "List".to_string(),
        details: format!("{} diagnostics available", diagnostics.len()),
    }))
}

fn render_table(diagnostics: &[Diagnostic]) -> String {
    let mut table = new_table(["Name", "Result type", "Kind", "Runs on", "Merge"]);
    for diagnostic in diagnostics {
        table.add_row(vec![
            diagnostic.name().to_string(),
            diagnostic.result_type().label().to_string(),
            match diagnostic.staticness() {
                Staticness::Static => "static",
                Staticness::Runtime => "runtime",
            }
            .to_string(),
            match diagnostic.topology() {
                ExecutionTopology::OnPrimary => "primary",
                ExecutionTopology::AcrossCluster => "all hosts",
            }
            .to_string(),
            diagnostic
                .merge_strategy()
                .map(|merge| merge.as_str())
                .unwrap_or("-")
                .to_string(),
        ]);
    }
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_lists_every_diagnostic() {
        let rendered = render_table(registry::all());
        for diagnostic in registry::all() {
            assert!(rendered.contains(diagnostic.name()), "{diagnostic} missing");
        }
        assert!(rendered.contains("intersection"));
        assert!(rendered.contains("union"));
    }
}
