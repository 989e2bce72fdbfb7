//! Orthographic camera with zoom.

use macroquad::prelude::*;

/// Zoomable orthographic camera over a fixed-size world window.
///
/// World origin sits at the bottom-left of the screen at zoom 1.0; the view
/// matrix recentres it so zoom scales around the screen centre.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Visible width in meters at zoom 1.0.
    pub width_meters: f32,
    /// Visible height in meters at zoom 1.0.
    pub height_meters: f32,
    /// Scale of the visible window; 1.0 shows exactly `width_meters`.
    pub zoom: f32,
    /// Floor that `zoom` is clamped to.
    pub min_zoom: f32,
}

impl Camera {
    /// Height follows the screen's pixel aspect ratio.
    pub fn new(screen_width_px: u32, screen_height_px: u32, width_meters: f32, min_zoom: f32) -> Self {
        let pixels_to_meters = width_meters / screen_width_px.max(1) as f32;
        Camera {
            width_meters,
            height_meters: screen_height_px.max(1) as f32 * pixels_to_meters,
            zoom: 1.0,
            min_zoom,
        }
    }

    /// Set the zoom, clamped to `min_zoom`.
    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = zoom.max(self.min_zoom);
    }

    /// Step zoom down while `zoom_in` is held, up while `zoom_out` is held.
    pub fn apply_zoom_input(&mut self, zoom_in: bool, zoom_out: bool, step: f32) {
        let mut zoom = self.zoom;
        if zoom_in {
            zoom -= step;
        }
        if zoom_out {
            zoom += step;
        }
        self.set_zoom(zoom);
    }

    /// World position of the screen centre at zoom 1.0.
    pub fn screen_center(&self) -> Vec2 {
        vec2(self.width_meters / 2.0, self.height_meters / 2.0)
    }

    /// Orthographic projection centred on the origin, scaled by zoom.
    pub fn projection_matrix(&self) -> Mat4 {
        let half_w = self.width_meters / 2.0 * self.zoom;
        let half_h = self.height_meters / 2.0 * self.zoom;
        Mat4::orthographic_rh_gl(-half_w, half_w, -half_h, half_h, -1.0, 1.0)
    }

    /// Moves the screen centre to the origin.
    pub fn view_matrix(&self) -> Mat4 {
        let center = self.screen_center();
        Mat4::from_translation(vec3(-center.x, -center.y, 0.0))
    }

    /// `projection * view`, the `u_VP` uniform.
    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}
