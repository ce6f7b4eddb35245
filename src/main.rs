/*
 * Node Field
 *
 * An ambient backdrop: softly pulsing nodes drift across the window, emit
 * ripples of expanding rings, and link up with nearby nodes through fading
 * lines. Parameters are read from nodefield.toml when present.
 *
 * Set RUST_LOG=nodefield=debug to see spawn steps and tick summaries.
 */

use tracing_subscriber::EnvFilter;

use nodefield::app::{model, update};

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    nannou::app(model).update(update).run();
}
