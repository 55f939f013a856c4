//! Text and JSON rendering of a resolution outcome.

use std::fmt::Write;

use propsight_common::Provenance;
use propsight_molecules::{ResolutionOutcome, ResolvedCompound};

const RULE_WIDTH: usize = 50;

pub fn render_text(compound: &ResolvedCompound) -> String {
    let rule = "-".repeat(RULE_WIDTH);
    let mut out = String::new();

    let header = match compound.provenance {
        Provenance::Database => format!("Found in PubChem for {}", compound.structure),
        Provenance::Predicted => format!("Not found in PubChem, predicted for {}", compound.structure),
    };
    let _ = writeln!(out, "{}", header);
    let _ = writeln!(out, "{}", compound.display_name.text());
    let _ = writeln!(out, "{}", rule);
    for (key, value) in compound.record.iter() {
        let _ = writeln!(out, "{}: {}", key, value);
    }
    let _ = writeln!(out, "{}", rule);
    out
}

pub fn render_json(outcome: &ResolutionOutcome, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(outcome)
    } else {
        serde_json::to_string(outcome)
    }
}
