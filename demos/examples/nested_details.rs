// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Nested disclosures: an inner one opening grows the outer one.
//!
//! The outer disclosure is open and holds a closed inner disclosure. Opening
//! the inner one dispatches content updates that bubble to the outer
//! controller, which re-measures its content through its mirror and
//! republishes `--details-content-height`.
//!
//! Run:
//! - `cargo run -p understory_disclosure_demos --example nested_details`

use tracing_subscriber::EnvFilter;
use understory_disclosure::headless::{Element, Stage};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut stage = Stage::new();
    let (outer, inner) = {
        let mut doc = stage.host().document_mut();
        let outer = doc.insert_details(None, 40.0, true);
        let inner = doc.insert_details(Some(outer.content), 40.0, false);
        doc.insert(Some(inner.content), Element::block(100.0));
        (outer.details, inner.details)
    };

    let (Ok(outer_controller), Ok(inner_controller)) = (stage.attach(outer), stage.attach(inner))
    else {
        eprintln!("details elements are missing their summary or content");
        return;
    };

    let report = |stage: &Stage, label: &str| {
        let doc = stage.host().document();
        println!(
            "{label:<14} outer {:<7} content {:>6.1}px ({:?})  inner {:<7} {:>6.1}px",
            outer_controller.state(),
            outer_controller.heights().content,
            doc.computed_style(outer, "--details-content-height"),
            inner_controller.state(),
            doc.outer_height(inner),
        );
    };

    report(&stage, "attached");
    stage.open(inner);
    report(&stage, "opening inner");
    stage.finish_animations();
    report(&stage, "inner open");

    stage.close(inner);
    stage.finish_animations();
    report(&stage, "inner closed");
}
