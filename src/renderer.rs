/*
 * Renderer Module
 *
 * This module draws the latest Scene with nannou: connection lines first,
 * then filled nodes with their expanding rings on top. The scene's fade
 * fractions are multiplied by the configured opacities here.
 *
 * nannou's window coordinates are centred on the origin like the world, so
 * world positions are drawn as they are.
 */

use nannou::prelude::*;

use crate::app::Model;
use crate::params::SimulationParams;
use crate::scene::Scene;

#[inline]
fn color(rgb: [u8; 3], alpha: f32) -> Rgba {
    rgba(
        rgb[0] as f32 / 255.0,
        rgb[1] as f32 / 255.0,
        rgb[2] as f32 / 255.0,
        alpha.clamp(0.0, 1.0),
    )
}

// Render the model
pub fn view(app: &App, model: &Model, frame: Frame) {
    let draw = app.draw();
    let params = model.field.params();

    draw.background().color(color(params.background, 1.0));

    if let Some(scene) = model.scene.latest() {
        draw_scene(&draw, scene, params);
    }

    draw.to_frame(app, &frame).unwrap();
}

pub fn draw_scene(draw: &Draw, scene: &Scene, params: &SimulationParams) {
    for line in &scene.connections {
        draw.line()
            .start(pt2(line.from.0, line.from.1))
            .end(pt2(line.to.0, line.to.1))
            .weight(1.0)
            .color(color(params.connection.color, line.fade * params.connection.opacity));
    }

    for node in &scene.nodes {
        draw.ellipse()
            .xy(pt2(node.x, node.y))
            .radius(node.radius)
            .color(color(params.node.color, node.fade * params.node.opacity));

        for ring in &node.rings {
            draw.ellipse()
                .xy(pt2(node.x, node.y))
                .radius(ring.radius)
                .no_fill()
                .stroke(color(params.wave.color, ring.fade * params.wave.opacity))
                .stroke_weight(1.0);
        }
    }
}
