// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rapid toggling: later requests supersede earlier ones mid-flight.
//!
//! A closed disclosure is opened, closed halfway through, then opened again.
//! Every reversal starts from the height reached so far, and at most one
//! animation is ever live on the element.
//!
//! Run:
//! - `cargo run -p understory_disclosure_demos --example rapid_toggle`
//! - `RUST_LOG=understory_disclosure=trace cargo run -p understory_disclosure_demos --example rapid_toggle`

use tracing_subscriber::EnvFilter;
use understory_disclosure::headless::{Element, FRAME_STEP, Stage};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut stage = Stage::new();
    let details = {
        let mut doc = stage.host().document_mut();
        let parts = doc.insert_details(None, 40.0, false);
        doc.set_style(parts.details, "--details-open-duration", "300ms");
        doc.set_style(parts.details, "--details-close-duration", "300ms");
        doc.insert(Some(parts.content), Element::block(200.0));
        parts.details
    };
    let Ok(controller) = stage.attach(details) else {
        eprintln!("details element is missing its summary or content");
        return;
    };
    println!("attached: {:?}", controller.heights());

    let mut frame = 0_u32;
    let mut step = |stage: &mut Stage, frames: u32| {
        for _ in 0..frames {
            stage.frame(FRAME_STEP);
            frame += 1;
            println!(
                "frame {frame:>3}: {:<8} {:>6.1}px",
                controller.state(),
                stage.host().document().outer_height(details),
            );
        }
    };

    stage.open(details);
    step(&mut stage, 8);

    println!("-- close requested");
    stage.close(details);
    step(&mut stage, 5);

    println!("-- open requested");
    stage.open(details);
    stage.finish_animations();

    println!(
        "settled: {} at {}px, {} animations started, at most {} live",
        controller.state(),
        stage.host().document().outer_height(details),
        stage.host().started_animations().len(),
        stage.host().max_live_animations(details),
    );
}
