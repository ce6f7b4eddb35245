/*
 * Application Module
 *
 * This module defines the nannou model for the node field viewer.
 * It loads the parameters, opens a window, drives the field's timers from
 * nannou's update loop and restarts the field whenever the window resizes.
 */

use nannou::prelude::*;
use std::path::PathBuf;

use crate::controller::NodeField;
use crate::params::{SimulationParams, DEFAULT_CONFIG_PATH};
use crate::renderer;
use crate::scene::SceneSlot;
use crate::world::Bounds;

/// Environment variable naming an alternative parameter file
pub const CONFIG_ENV: &str = "NODEFIELD_CONFIG";

// Main model for the application
pub struct Model {
    pub field: NodeField,
    pub scene: SceneSlot,
}

// Initialize the model
pub fn model(app: &App) -> Model {
    let params = load_params();

    // Get the primary monitor's dimensions
    let (window_width, window_height) = match app.primary_monitor() {
        Some(monitor) => {
            let size = monitor.size();
            (size.width as f32 * 0.8, size.height as f32 * 0.8)
        }
        None => (1280.0, 800.0),
    };

    let window_id = app
        .new_window()
        .title("Node Field")
        .size(window_width as u32, window_height as u32)
        .view(renderer::view)
        .resized(resized)
        .build()
        .expect("failed to create the main window");

    let rect = app
        .window(window_id)
        .map(|window| window.rect())
        .unwrap_or_else(|| Rect::from_w_h(window_width, window_height));

    let mut field = NodeField::with_system_clock(params, Bounds::from_size(rect.w(), rect.h()));
    field.start();

    Model { field, scene: SceneSlot::default() }
}

fn load_params() -> SimulationParams {
    let path = std::env::var_os(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    if !path.exists() {
        tracing::info!(path = %path.display(), "no parameter file, using defaults");
        return SimulationParams::default();
    }

    match SimulationParams::from_file(&path) {
        Ok(params) => {
            tracing::info!(path = %path.display(), "loaded parameters");
            params
        }
        Err(err) => {
            tracing::error!(error = %err, "falling back to default parameters");
            SimulationParams::default()
        }
    }
}

// Fire whatever ticks and spawn steps are due
pub fn update(_app: &App, model: &mut Model, _update: Update) {
    model.field.pump(&mut model.scene);
}

// A new window size means a new world; the field starts over
pub fn resized(_app: &App, model: &mut Model, size: Vec2) {
    tracing::debug!(width = size.x, height = size.y, "window resized");
    model.field.set_bounds(Bounds::from_size(size.x, size.y));
    model.field.restart();
}
