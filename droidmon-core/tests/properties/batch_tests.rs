//! Property-based tests for command batching
//!
//! A rendered batch, executed by a shell, prints every section marker
//! followed by that query's output. Demultiplexing such a response must
//! recover each query's text exactly, whatever the query printed.

use droidmon_core::batch::{CommandBatch, demux, section_marker};
use proptest::prelude::*;

/// Strategy for a valid section id
fn arb_section_id() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,7}"
}

/// Strategy for one line of query output that is not itself a marker
fn arb_output_line() -> impl Strategy<Value = String> {
    "[ -~]{0,40}".prop_filter("must not look like a marker", |l| {
        !(l.starts_with("____") && l.ends_with("____") && l.len() > 8)
    })
}

/// Strategy for a set of distinct sections with their output lines
fn arb_sections() -> impl Strategy<Value = Vec<(String, Vec<String>)>> {
    prop::collection::btree_map(
        arb_section_id(),
        prop::collection::vec(arb_output_line(), 0..6),
        1..6,
    )
    .prop_map(|m| m.into_iter().collect())
}

/// Simulates what a shell prints for a rendered batch
fn simulate_response(sections: &[(String, Vec<String>)]) -> String {
    let mut out = String::new();
    for (id, lines) in sections {
        out.push_str(&section_marker(id));
        out.push('\n');
        for line in lines {
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Every section's text is recovered exactly, in any marker order
    #[test]
    fn prop_demux_recovers_every_section(sections in arb_sections()) {
        let mut batch = CommandBatch::new("prop");
        for (id, _) in &sections {
            batch.push(id, "true").expect("distinct valid ids");
        }

        let response = simulate_response(&sections);
        let map = batch.demux(&response);

        prop_assert_eq!(map.len(), sections.len());
        for (id, lines) in &sections {
            let expected: String = lines.iter().map(|l| format!("{l}\n")).collect();
            prop_assert_eq!(map.text(id), expected.as_str());
        }
    }

    /// Noise before the first marker never leaks into a section
    #[test]
    fn prop_leading_noise_is_dropped(
        noise in prop::collection::vec(arb_output_line(), 0..4),
        sections in arb_sections(),
    ) {
        let mut response: String = noise.iter().map(|l| format!("{l}\n")).collect();
        response.push_str(&simulate_response(&sections));
        let map = demux(&response);
        prop_assert_eq!(map.len(), sections.len());
    }

    /// Rendering mentions every marker once, in insertion order
    #[test]
    fn prop_render_orders_markers(sections in arb_sections()) {
        let mut batch = CommandBatch::new("prop");
        for (id, _) in &sections {
            batch.push(id, "true").expect("distinct valid ids");
        }
        let rendered = batch.render();
        let positions: Vec<usize> = sections
            .iter()
            .map(|(id, _)| {
                rendered
                    .find(&format!("echo {}", section_marker(id)))
                    .expect("marker rendered")
            })
            .collect();
        prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    /// A duplicate id is always rejected
    #[test]
    fn prop_duplicate_id_rejected(id in arb_section_id()) {
        let batch = CommandBatch::new("prop").with_command(&id, "true").expect("valid id");
        prop_assert!(batch.with_command(&id, "true").is_err());
    }
}
